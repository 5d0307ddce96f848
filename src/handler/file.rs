use std::{
    path::PathBuf,
    pin::Pin,
    task::{Context, Poll, ready},
};
use tokio::{
    fs::File,
    io::{AsyncRead, ReadBuf},
};

use super::{BoxFuture, Handler};
use crate::{error::Error, log, option::OptionSet, url::Url};

/// `file` scheme handler.
#[derive(Debug, Default)]
pub struct FileHandler {
    file: Option<File>,
    len: Option<u64>,
}

impl FileHandler {
    /// Create new closed [`FileHandler`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            file: None,
            len: None,
        }
    }
}

/// Local path of a `file` url.
///
/// An empty or `localhost` host is ignored, any other host is the leading path segment.
fn file_path(url: &Url) -> PathBuf {
    let path = url.decoded_path();
    match url.host() {
        "" | "localhost" => PathBuf::from(path.into_owned()),
        host => PathBuf::from(format!("{host}{path}")),
    }
}

impl Handler for FileHandler {
    fn open<'a>(&'a mut self, url: &'a Url, _: &'a OptionSet) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            self.close();

            let path = file_path(url);
            log::debug!("open {}", path.display());

            let file = File::open(&path).await?;
            let metadata = file.metadata().await?;
            self.len = metadata.is_file().then(|| metadata.len());
            self.file = Some(file);
            Ok(())
        })
    }

    fn poll_read(&mut self, cx: &mut Context, buf: &mut [u8]) -> Poll<Result<usize, Error>> {
        let Some(file) = self.file.as_mut() else {
            return Poll::Ready(Err(Error::NotOpen));
        };
        let mut buf = ReadBuf::new(buf);
        ready!(Pin::new(file).poll_read(cx, &mut buf))?;
        Poll::Ready(Ok(buf.filled().len()))
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn close(&mut self) {
        self.file = None;
        self.len = None;
    }

    fn content_length(&self) -> Option<u64> {
        self.len
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_path() {
        macro_rules! test {
            ($url:literal, $path:literal) => {
                let url = Url::parse($url).unwrap();
                assert_eq!(file_path(&url), PathBuf::from($path), "{}", $url);
            };
        }

        test!("file:///tmp/data.txt", "/tmp/data.txt");
        test!("file://localhost/tmp/data.txt", "/tmp/data.txt");
        test!("file:///tmp/with%20space.txt", "/tmp/with space.txt");
        test!("file://data.txt", "data.txt");
        test!("file://dir/data.txt", "dir/data.txt");
        test!("file:relative.txt", "relative.txt");
    }
}
