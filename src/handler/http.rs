use bytes::BytesMut;
use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, ReadBuf};

use super::{
    BoxFuture, Handler,
    transport::{self, Transport},
};
use crate::{
    common::ParseResult,
    error::Error,
    http::{BodyDecoder, Coding, HeadParser, ResponseHead, StatusCode, request},
    log,
    option::{OptionSet, Proxy, TlsVerify, UserAgent},
    url::{Url, UrlError},
};

/// Minimum spare capacity of the read buffer before each read.
const READ_CHUNK: usize = 8 * 1024;

/// `http` and `https` scheme handler.
///
/// One request per connection, the server is asked to close the connection after the response.
#[derive(Debug)]
pub struct HttpHandler {
    secure: bool,
    conn: Option<Connection>,
    head: Option<ResponseHead>,
    content_length: Option<u64>,
}

#[derive(Debug)]
struct Connection {
    io: Transport,
    read_buffer: BytesMut,
    decoder: BodyDecoder,
    /// Transport reported end of file.
    eof: bool,
}

impl HttpHandler {
    /// Create new closed `http` handler.
    #[inline]
    pub const fn plain() -> Self {
        Self::new(false)
    }

    /// Create new closed `https` handler.
    #[inline]
    pub const fn tls() -> Self {
        Self::new(true)
    }

    const fn new(secure: bool) -> Self {
        Self {
            secure,
            conn: None,
            head: None,
            content_length: None,
        }
    }
}

impl Handler for HttpHandler {
    fn open<'a>(&'a mut self, url: &'a Url, options: &'a OptionSet) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            self.close();

            let mut io = connect(self.secure, url, options).await?;

            // plain http through a proxy sends the absolute url
            let absolute = !self.secure && options.get::<Proxy>().is_some_and(|e| e.0.is_some());
            let mut write_buffer = BytesMut::new();
            request::write_get(
                &mut write_buffer,
                url,
                absolute,
                &options.get_option::<UserAgent>().0,
            );
            io.write_all(&write_buffer).await?;
            io.flush().await?;
            log::debug!("GET {url}");

            let mut read_buffer = BytesMut::with_capacity(READ_CHUNK);
            let head = loop {
                let head = read_head(&mut io, &mut read_buffer).await?;
                if !head.status.is_informational() {
                    break head;
                }
                log::trace!("skipping interim response {}", head.status);
            };
            log::debug!("{} {url}", head.status);

            let decoder = BodyDecoder::new(head.status, &head.headers)?;
            self.content_length = match decoder.coding() {
                Coding::ContentLength(len) => Some(*len),
                Coding::Eof if !head.status.is_bodyless() => Some(0),
                _ => None,
            };

            let status = head.status;
            self.head = Some(head);
            self.conn = Some(Connection {
                io,
                read_buffer,
                decoder,
                eof: false,
            });

            if status.is_success() {
                Ok(())
            } else {
                Err(Error::Http(status))
            }
        })
    }

    fn poll_read(&mut self, cx: &mut Context, buf: &mut [u8]) -> Poll<Result<usize, Error>> {
        let Some(conn) = self.conn.as_mut() else {
            return Poll::Ready(Err(Error::NotOpen));
        };
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        loop {
            match conn.decoder.decode(&mut conn.read_buffer, buf.len()) {
                Poll::Ready(Some(Ok(data))) => {
                    buf[..data.len()].copy_from_slice(&data);
                    return Poll::Ready(Ok(data.len()));
                }
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Err(err.into())),
                Poll::Ready(None) => return Poll::Ready(Ok(0)),
                Poll::Pending => {}
            }

            if conn.eof {
                if conn.decoder.on_eof() {
                    return Poll::Ready(Ok(0));
                }
                log::debug!("connection closed before end of body");
                return Poll::Ready(Err(Error::ConnectionReset));
            }

            let read = ready!(poll_fill(&mut conn.io, &mut conn.read_buffer, cx))?;
            if read == 0 {
                conn.eof = true;
            }
        }
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn close(&mut self) {
        if self.conn.take().is_some() {
            log::trace!("connection closed");
        }
        self.head = None;
        self.content_length = None;
    }

    fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn headers(&self) -> &str {
        self.head.as_ref().map(|e| e.headers.raw()).unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.head.as_ref()?.headers.get(name)
    }

    fn status(&self) -> Option<StatusCode> {
        self.head.as_ref().map(|e| e.status)
    }

    fn location(&self) -> Option<&str> {
        let head = self.head.as_ref()?;
        if head.status.is_redirect() {
            head.headers.get("location")
        } else {
            None
        }
    }
}

/// Establish the transport to the origin, or through the configured proxy.
async fn connect(secure: bool, url: &Url, options: &OptionSet) -> Result<Transport, Error> {
    let Some(port) = url.port_or_default() else {
        return Err(Error::UnsupportedScheme(url.scheme().to_owned()));
    };
    if url.hostname().is_empty() {
        return Err(Error::InvalidUrl(UrlError::Incomplete));
    }
    let verify = options.get_option::<TlsVerify>().0;

    match options.get_option::<Proxy>().0 {
        None => {
            log::trace!("connecting to {}:{port}", url.hostname());
            let io = transport::connect(url.hostname(), port).await?;
            if secure {
                transport::handshake(io, url.hostname(), verify).await
            } else {
                Ok(Transport::Plain(io))
            }
        }
        Some(proxy) => {
            let proxy_port = proxy.port_or_default().unwrap_or(80);
            log::trace!("connecting to proxy {}:{proxy_port}", proxy.hostname());
            let mut io = transport::connect(proxy.hostname(), proxy_port).await?;
            if secure {
                tunnel(&mut io, url.hostname(), port).await?;
                transport::handshake(io, url.hostname(), verify).await
            } else {
                Ok(Transport::Plain(io))
            }
        }
    }
}

/// Read until a complete response head is received.
async fn read_head<IO>(io: &mut IO, buffer: &mut BytesMut) -> Result<ResponseHead, Error>
where
    IO: AsyncRead + Unpin,
{
    let mut parser = HeadParser::new();
    loop {
        match parser.parse(buffer) {
            ParseResult::Ok(head) => return Ok(head),
            ParseResult::Err(err) => return Err(err.into()),
            ParseResult::Pending => {}
        }
        buffer.reserve(READ_CHUNK);
        if io.read_buf(buffer).await? == 0 {
            log::debug!("connection closed before end of response head");
            return Err(Error::ConnectionReset);
        }
    }
}

/// Open a `CONNECT` tunnel through a proxy.
async fn tunnel<IO>(io: &mut IO, hostname: &str, port: u16) -> Result<(), Error>
where
    IO: AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::new();
    request::write_connect(&mut buffer, hostname, port);
    io.write_all(&buffer).await?;
    io.flush().await?;

    buffer.clear();
    let head = read_head(io, &mut buffer).await?;
    if !head.status.is_success() {
        log::warning!("proxy refused tunnel to {hostname}:{port}: {}", head.status);
        return Err(Error::Http(head.status));
    }
    Ok(())
}

/// Read from `io` into the spare capacity of `buffer`.
fn poll_fill(
    io: &mut Transport,
    buffer: &mut BytesMut,
    cx: &mut Context,
) -> Poll<io::Result<usize>> {
    buffer.reserve(READ_CHUNK);

    let mut buf = ReadBuf::uninit(buffer.spare_capacity_mut());
    ready!(Pin::new(io).poll_read(cx, &mut buf))?;
    let read = buf.filled().len();

    // SAFETY: `ReadBuf` guarantees the filled part is initialized
    unsafe { buffer.set_len(buffer.len() + read) };
    Poll::Ready(Ok(read))
}
