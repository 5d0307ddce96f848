//! Error taxonomy shared by every handler.
//!
//! End of stream is not an error, it is reported as a zero length read.
use std::io;

use crate::http::{ProtoError, StatusCode};
use crate::url::UrlError;

/// An error that can occur when opening or reading a stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// No handler registered for the scheme.
    UnsupportedScheme(String),
    /// URL cannot be parsed.
    InvalidUrl(UrlError),
    /// Host name cannot be resolved.
    NameResolution,
    /// Remote refused the connection.
    ConnectionRefused,
    /// Connection closed or reset before the exchange completed.
    ConnectionReset,
    /// Operation did not complete within the read timeout.
    TimedOut,
    /// Response does not follow the protocol.
    Malformed(ProtoError),
    /// Server responded with a non success status.
    Http(StatusCode),
    /// TLS configuration or handshake failure.
    Tls(String),
    /// Operation attempted on a closed stream.
    NotOpen,
    /// Other I/O failure.
    Io(io::ErrorKind),
}

impl Error {
    /// Returns `true` if the operation timed out.
    #[inline]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// Returns the status code if this is an HTTP status error.
    #[inline]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(status) => Some(*status),
            _ => None,
        }
    }

    const fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::UnsupportedScheme(_) | Self::InvalidUrl(_) => io::ErrorKind::InvalidInput,
            Self::ConnectionRefused => io::ErrorKind::ConnectionRefused,
            Self::ConnectionReset => io::ErrorKind::ConnectionReset,
            Self::TimedOut => io::ErrorKind::TimedOut,
            Self::Malformed(_) | Self::Tls(_) => io::ErrorKind::InvalidData,
            Self::NotOpen => io::ErrorKind::NotConnected,
            Self::Io(kind) => *kind,
            Self::NameResolution | Self::Http(_) => io::ErrorKind::Other,
        }
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::UnsupportedScheme(scheme) => write!(f, "unsupported scheme `{scheme}`"),
            Self::InvalidUrl(err) => std::fmt::Display::fmt(err, f),
            Self::NameResolution => f.write_str("name resolution failed"),
            Self::ConnectionRefused => f.write_str("connection refused"),
            Self::ConnectionReset => f.write_str("connection reset"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Malformed(err) => write!(f, "malformed response: {err}"),
            Self::Http(status) => write!(f, "http status: {status}"),
            Self::Tls(msg) => write!(f, "tls error: {msg}"),
            Self::NotOpen => f.write_str("stream is not open"),
            Self::Io(kind) => write!(f, "io error: {kind}"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Self::ConnectionReset,
            io::ErrorKind::TimedOut => Self::TimedOut,
            kind => Self::Io(kind),
        }
    }
}

impl From<Error> for io::Error {
    #[inline]
    fn from(value: Error) -> Self {
        io::Error::new(value.io_kind(), value)
    }
}

impl From<UrlError> for Error {
    #[inline]
    fn from(value: UrlError) -> Self {
        Self::InvalidUrl(value)
    }
}

impl From<ProtoError> for Error {
    #[inline]
    fn from(value: ProtoError) -> Self {
        Self::Malformed(value)
    }
}

#[test]
fn test_io_classification() {
    let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
    assert_eq!(Error::from(refused), Error::ConnectionRefused);

    let eof = io::Error::from(io::ErrorKind::UnexpectedEof);
    assert_eq!(Error::from(eof), Error::ConnectionReset);

    let denied = io::Error::from(io::ErrorKind::PermissionDenied);
    assert_eq!(Error::from(denied), Error::Io(io::ErrorKind::PermissionDenied));

    let io = io::Error::from(Error::TimedOut);
    assert_eq!(io.kind(), io::ErrorKind::TimedOut);
    assert_eq!(io.to_string(), "timed out");
    assert!(io.get_ref().is_some_and(|err| err.is::<Error>()));
}
