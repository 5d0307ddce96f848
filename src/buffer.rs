//! Blocking stream over a protocol handler.
use std::{
    fmt, io,
    sync::Arc,
    time::Duration,
};
use tokio::runtime::{Builder, Runtime};

use crate::{
    error::Error,
    handler::Handler,
    http::StatusCode,
    log,
    option::{MaxRedirects, OptionSet, ReadTimeout},
    registry::{self, Registry},
    url::{IntoUrl, Url},
};

const BUFFER_SIZE: usize = 8 * 1024;

/// Blocking, protocol agnostic stream over a URL.
///
/// The scheme of the URL selects the [`Handler`] from the [`Registry`]. Every blocking operation
/// is raced against [`ReadTimeout`], a timeout tears the connection down.
///
/// Failures are returned and also recorded, [`error`] reports the last one until the next
/// [`open`] or [`close`]. A read of zero bytes is the end of stream.
///
/// Blocking operations drive their own runtime, they must not be called from within an
/// asynchronous context.
///
/// # Example
///
/// ```no_run
/// use std::io::Read;
/// use urlstream::StreamBuf;
///
/// let mut stream = StreamBuf::new();
/// stream.open("http://example.com/")?;
/// println!("{}", stream.content_type());
///
/// let mut body = String::new();
/// stream.read_to_string(&mut body)?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
///
/// [`error`]: StreamBuf::error
/// [`open`]: StreamBuf::open
/// [`close`]: StreamBuf::close
pub struct StreamBuf {
    // dropped before the runtime
    handler: Option<Box<dyn Handler>>,
    runtime: Option<Runtime>,
    registry: Arc<Registry>,
    options: OptionSet,
    url: Option<Url>,
    error: Option<Error>,
    buffer: Box<[u8]>,
    pos: usize,
    filled: usize,
}

impl Default for StreamBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamBuf {
    /// Create new closed [`StreamBuf`] using the built in handlers.
    pub fn new() -> Self {
        Self::with_registry(registry::global())
    }

    /// Create new closed [`StreamBuf`] resolving schemes with `registry`.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self {
            handler: None,
            runtime: None,
            registry,
            options: OptionSet::new(),
            url: None,
            error: None,
            buffer: Box::default(),
            pos: 0,
            filled: 0,
        }
    }

    // ===== Open / Close =====

    /// Open `url`.
    ///
    /// An open stream is closed first, as if by [`close`][StreamBuf::close].
    ///
    /// Redirects are followed up to [`MaxRedirects`]. A non success final status returns
    /// [`Error::Http`], but the stream stays open so the response body can still be read.
    pub fn open(&mut self, url: impl IntoUrl) -> Result<(), Error> {
        self.close();

        let mut url = match url.into_url() {
            Ok(url) => url,
            Err(err) => return Err(self.fail(err.into())),
        };
        let max_redirects = self.options.get_option::<MaxRedirects>().0;
        let mut redirects = 0;

        loop {
            let result = self.open_once(&url);

            if let Err(Error::Http(status)) = &result {
                if status.is_redirect() && redirects < max_redirects {
                    let next = self
                        .handler
                        .as_deref()
                        .and_then(Handler::location)
                        .map(|location| url.join(location));

                    if let Some(Ok(next)) = next {
                        log::info!("{status}, redirecting to {next}");
                        self.handler = None;
                        url = next;
                        redirects += 1;
                        continue;
                    }
                }
            }

            self.url = Some(url);
            return result.map_err(|err| self.fail(err));
        }
    }

    /// Set `options` then open `url`.
    pub fn open_with(&mut self, url: impl IntoUrl, options: &OptionSet) -> Result<(), Error> {
        self.options.set_options(options);
        self.open(url)
    }

    fn open_once(&mut self, url: &Url) -> Result<(), Error> {
        let mut handler = self.registry.create(url.scheme())?;
        let timeout = self.read_timeout();
        let runtime = runtime(&mut self.runtime)?;

        let result = runtime.block_on(deadline(timeout, handler.open(url, &self.options)));

        match result {
            Ok(()) => {
                self.handler = Some(handler);
                Ok(())
            }
            // keep the error response readable
            Err(Error::Http(status)) if handler.is_open() => {
                self.handler = Some(handler);
                Err(Error::Http(status))
            }
            Err(err) => {
                log::debug!("failed to open {url}: {err}");
                Err(err)
            }
        }
    }

    /// Close the stream and reset the recorded error.
    ///
    /// Closing a closed stream is a no-op.
    pub fn close(&mut self) {
        if let Some(mut handler) = self.handler.take() {
            handler.close();
        }
        self.url = None;
        self.error = None;
        self.pos = 0;
        self.filled = 0;
    }

    /// Returns `true` if a handler is open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.handler.is_some()
    }

    // ===== Read =====

    /// Read content into `buf`.
    ///
    /// Returns `Ok(0)` at the end of stream. On failure, including a timeout, the stream is
    /// closed and the error is recorded.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.pos < self.filled {
            let buffered = &self.buffer[self.pos..self.filled];
            let read = buffered.len().min(buf.len());
            buf[..read].copy_from_slice(&buffered[..read]);
            self.pos += read;
            return Ok(read);
        }
        self.read_handler(buf)
    }

    fn read_handler(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let timeout = self.read_timeout();
        let Some(handler) = self.handler.as_mut() else {
            return Err(self.fail(Error::NotOpen));
        };
        let runtime = runtime(&mut self.runtime)?;

        let result = runtime.block_on(deadline(
            timeout,
            std::future::poll_fn(|cx| handler.poll_read(cx, buf)),
        ));

        result.map_err(|err| {
            if err.is_timeout() {
                log::debug!("read timed out after {timeout:?}");
            }
            self.handler = None;
            self.fail(err)
        })
    }

    fn fail(&mut self, err: Error) -> Error {
        self.error = Some(err.clone());
        err
    }

    // ===== Metadata =====

    /// Returns the last recorded error.
    #[inline]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns the final URL after redirects.
    #[inline]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Returns the media type, empty if unknown.
    pub fn content_type(&self) -> &str {
        self.handler
            .as_deref()
            .and_then(Handler::content_type)
            .unwrap_or_default()
    }

    /// Returns the content size, if known.
    pub fn content_length(&self) -> Option<u64> {
        self.handler.as_deref().and_then(Handler::content_length)
    }

    /// Returns the raw header block, empty if the scheme has no headers.
    pub fn headers(&self) -> &str {
        self.handler.as_deref().map(Handler::headers).unwrap_or_default()
    }

    /// Returns a header value, repeated fields are joined by `", "`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.handler.as_deref()?.header(name)
    }

    /// Returns the response status.
    pub fn status(&self) -> Option<StatusCode> {
        self.handler.as_deref().and_then(Handler::status)
    }

    // ===== Options =====

    /// Returns the deadline of each blocking operation, zero is no deadline.
    pub fn read_timeout(&self) -> Duration {
        self.options.get_option::<ReadTimeout>().0
    }

    /// Set the deadline of subsequent blocking operations, zero disables it.
    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.options.set_option(ReadTimeout(timeout));
    }

    /// Set an option used by subsequent operations.
    pub fn set_option<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.options.set_option(value);
    }

    /// Returns an option value, or its default if not set.
    pub fn get_option<T: Clone + Default + Send + Sync + 'static>(&self) -> T {
        self.options.get_option()
    }

    /// Set every option of `options`.
    pub fn set_options(&mut self, options: &OptionSet) {
        self.options.set_options(options);
    }

    /// Returns the option set.
    #[inline]
    pub fn options(&self) -> &OptionSet {
        &self.options
    }
}

/// Returns the runtime, building it on first use.
fn runtime(runtime: &mut Option<Runtime>) -> Result<&Runtime, Error> {
    let rt = match runtime.take() {
        Some(rt) => rt,
        None => Builder::new_current_thread().enable_io().enable_time().build()?,
    };
    Ok(runtime.insert(rt))
}

/// Race `future` against `timeout`, zero waits indefinitely.
///
/// The future is polled before the timer, and the loser is dropped before this returns.
async fn deadline<F, T>(timeout: Duration, future: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    if timeout.is_zero() {
        return future.await;
    }
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_elapsed) => Err(Error::TimedOut),
    }
}

// ===== std::io =====

impl io::Read for StreamBuf {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        StreamBuf::read(self, buf).map_err(Into::into)
    }
}

impl io::BufRead for StreamBuf {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.filled {
            let mut buffer = std::mem::take(&mut self.buffer);
            if buffer.is_empty() {
                buffer = vec![0; BUFFER_SIZE].into_boxed_slice();
            }
            let result = self.read_handler(&mut buffer);
            self.buffer = buffer;
            self.pos = 0;
            self.filled = 0;
            self.filled = result?;
        }
        Ok(&self.buffer[self.pos..self.filled])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.filled);
    }
}

impl fmt::Debug for StreamBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StreamBuf")
            .field("url", &self.url)
            .field("handler", &self.handler)
            .field("error", &self.error)
            .field("options", &self.options)
            .field("buffered", &(self.filled - self.pos))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::io::{BufRead, Read};

    use super::*;

    #[test]
    fn test_closed_stream() {
        let mut stream = StreamBuf::new();
        assert!(!stream.is_open());
        stream.close();
        stream.close();
        assert!(stream.error().is_none());

        let mut buf = [0u8; 16];
        assert_eq!(stream.read(&mut buf), Err(Error::NotOpen));
        assert_eq!(stream.error(), Some(&Error::NotOpen));

        let err = Read::read(&mut stream, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        // metadata of a closed stream is empty
        assert_eq!(stream.content_type(), "");
        assert_eq!(stream.content_length(), None);
        assert_eq!(stream.headers(), "");
        assert_eq!(stream.status(), None);

        stream.close();
        assert!(stream.error().is_none());
    }

    #[test]
    fn test_open_failures() {
        let mut stream = StreamBuf::new();
        let err = stream.open("gopher://example.com/").unwrap_err();
        assert_eq!(err, Error::UnsupportedScheme("gopher".into()));
        assert_eq!(stream.error(), Some(&err));
        assert!(!stream.is_open());

        let err = stream.open("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(stream.url().is_none());
    }

    #[test]
    fn test_read_timeout_option() {
        let mut stream = StreamBuf::new();
        assert_eq!(stream.read_timeout(), Duration::from_secs(300));

        stream.set_read_timeout(Duration::from_millis(250));
        assert_eq!(stream.read_timeout(), Duration::from_millis(250));
        assert_eq!(
            stream.get_option::<ReadTimeout>(),
            ReadTimeout(Duration::from_millis(250))
        );

        stream.set_option(ReadTimeout(Duration::ZERO));
        assert_eq!(stream.read_timeout(), Duration::ZERO);
    }

    #[test]
    fn test_deadline() {
        let rt = Builder::new_current_thread().enable_time().build().unwrap();

        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(1)
        };
        assert_eq!(rt.block_on(deadline(Duration::from_millis(20), slow)), Err(Error::TimedOut));

        let ready = async { Ok(2) };
        assert_eq!(rt.block_on(deadline(Duration::from_millis(20), ready)), Ok(2));

        let no_deadline = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(3)
        };
        assert_eq!(rt.block_on(deadline(Duration::ZERO, no_deadline)), Ok(3));
    }

    #[test]
    fn test_buf_read_on_file() {
        let path = std::env::temp_dir().join(format!("urlstream-buffer-{}.txt", std::process::id()));
        std::fs::write(&path, "first\nsecond\n").unwrap();

        let mut stream = StreamBuf::new();
        stream.open(format!("file://{}", path.display())).unwrap();

        let mut line = String::new();
        stream.read_line(&mut line).unwrap();
        assert_eq!(line, "first\n");

        // buffered bytes are served before reading the handler again
        let mut rest = [0u8; 3];
        assert_eq!(stream.read(&mut rest), Ok(3));
        assert_eq!(&rest, b"sec");

        let mut tail = String::new();
        stream.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "ond\n");
        assert!(stream.error().is_none());

        std::fs::remove_file(&path).unwrap();
    }
}
