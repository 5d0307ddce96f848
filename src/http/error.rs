/// Malformed HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtoError {
    /// Line have invalid separator.
    InvalidSeparator,
    /// Status line is not `HTTP/<version> <code> <reason>`.
    InvalidStatusLine,
    /// Unsupported version.
    UnsupportedVersion,
    /// Status code is not three digits.
    InvalidStatus,
    /// Invalid header field.
    InvalidHeader,
    /// Response head exceeds the size limit.
    TooLarge,
    /// Invalid or conflicting `Content-Length` values.
    InvalidContentLength,
    /// Both `Content-Length` and `Transfer-Encoding` are present.
    InvalidCodings,
    /// Unknown or unsupported `Transfer-Encoding` codings.
    UnknownCodings,
    /// Chunked format is invalid.
    InvalidChunked,
    /// Chunk length is too large.
    ChunkTooLarge,
    /// Chunked trailer exceeds the size limit.
    TrailerTooLarge,
}

impl ProtoError {
    const fn message(&self) -> &'static str {
        match self {
            Self::InvalidSeparator => "invalid separator",
            Self::InvalidStatusLine => "invalid status line",
            Self::UnsupportedVersion => "unsupported version",
            Self::InvalidStatus => "invalid status code",
            Self::InvalidHeader => "invalid header",
            Self::TooLarge => "response head too large",
            Self::InvalidContentLength => "invalid content length",
            Self::InvalidCodings => "invalid message body codings",
            Self::UnknownCodings => "unknown or unsupported message body codings",
            Self::InvalidChunked => "invalid chunked format",
            Self::ChunkTooLarge => "chunk too large",
            Self::TrailerTooLarge => "chunked trailer too large",
        }
    }
}

impl std::error::Error for ProtoError {}

impl std::fmt::Display for ProtoError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
