//! Protocol Agnostic URL Streams
//!
//! [`StreamBuf`] opens a URL with the [`Handler`] registered for its scheme, then reads the
//! content like a file. Built in schemes are `file`, `http` and `https`.
#![warn(missing_debug_implementations)]

mod common;
mod log;

pub mod url;
pub mod option;
pub mod error;
pub mod http;
pub mod handler;
pub mod registry;
pub mod buffer;

pub use buffer::StreamBuf;
pub use error::Error;
pub use handler::Handler;
pub use option::OptionSet;
pub use registry::Registry;
pub use url::{IntoUrl, Url};
