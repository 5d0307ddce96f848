//! HTTP/1.0 client protocol.
//!
//! Only what a `GET` client needs: request head encoding, incremental response head parsing and
//! message body decoding.
mod status;
mod version;
mod error;
mod chunked;
mod body;

pub mod parser;
pub(crate) mod request;

pub use status::StatusCode;
pub use version::Version;
pub use error::ProtoError;
pub use chunked::ChunkedDecoder;
pub use body::{BodyDecoder, Coding, content_length};
#[doc(inline)]
pub use parser::{HeadParser, Headers, ResponseHead};
