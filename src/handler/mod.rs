//! Scheme specific protocol handlers.
//!
//! A [`Handler`] owns at most one connection, or file. [`open`] performs the whole exchange up to
//! the start of the content, then [`poll_read`] yields the content until end of stream.
//!
//! Deadlines are not the handler concern, the caller races every future and poll against its
//! own timer and drops the handler when the timer wins.
//!
//! [`open`]: Handler::open
//! [`poll_read`]: Handler::poll_read
use std::{
    pin::Pin,
    task::{Context, Poll},
};

use crate::{error::Error, http::StatusCode, option::OptionSet, url::Url};

mod file;
mod http;
mod transport;

pub use file::FileHandler;
pub use http::HttpHandler;

/// An owned dynamically typed [`Future`] that is [`Send`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Protocol handler of a single scheme.
///
/// Metadata accessors return `None` or empty when the scheme does not have the concept.
pub trait Handler: Send {
    /// Open `url` and perform the request.
    ///
    /// A previously opened resource is closed first.
    fn open<'a>(&'a mut self, url: &'a Url, options: &'a OptionSet) -> BoxFuture<'a, Result<(), Error>>;

    /// Attempt to read content into `buf`.
    ///
    /// Returns `Ok(0)` at the end of stream.
    fn poll_read(&mut self, cx: &mut Context, buf: &mut [u8]) -> Poll<Result<usize, Error>>;

    /// Returns `true` if a resource is open.
    fn is_open(&self) -> bool;

    /// Release the underlying resource, no-op if already closed.
    fn close(&mut self);

    /// Returns the media type of the content.
    fn content_type(&self) -> Option<&str> {
        None
    }

    /// Returns the declared or known size of the content.
    fn content_length(&self) -> Option<u64> {
        None
    }

    /// Returns the raw header block.
    fn headers(&self) -> &str {
        ""
    }

    /// Returns the value of a header field.
    fn header(&self, name: &str) -> Option<&str> {
        let _ = name;
        None
    }

    /// Returns the response status.
    fn status(&self) -> Option<StatusCode> {
        None
    }

    /// Returns the redirect target, if the response is a redirect.
    fn location(&self) -> Option<&str> {
        None
    }
}

impl std::fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("is_open", &self.is_open())
            .field("status", &self.status())
            .finish()
    }
}
