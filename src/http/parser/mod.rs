//! HTTP/1 response head parser.
//!
//! [`parse_status_line`] works on chunked bytes, given any length of bytes, the parser will find
//! the next separator and advance the bytes past it. If the separator is not found, the parser
//! returns [`ParseResult::Pending`] and leaves the bytes untouched, where more bytes is required
//! to complete parsing.
//!
//! [`parse_header`] works the same way. Additionally, if the parser encounter an empty line it
//! returns [`ParseResult::Ok(None)`] denoting the end of header fields.
//!
//! [`HeadParser`] drives both across multiple reads until the whole head is received.
//!
//! [`ParseResult::Ok(None)`]: crate::common::ParseResult::Ok
use bytes::{Buf, BytesMut};

use super::{ProtoError, StatusCode, Version};
use crate::common::{ParseResult, ready};

#[cfg(test)]
mod test;

/// Maximum size of a response head, status line included.
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

const VERSION_SIZE: usize = b"HTTP/1.1".len();

/// Split a line terminated by `\r\n` or a bare `\n`, the separator is discarded.
fn split_line(bytes: &mut BytesMut) -> ParseResult<BytesMut, ProtoError> {
    let Some(at) = bytes.iter().position(|e| matches!(e, b'\r' | b'\n')) else {
        return ParseResult::Pending;
    };
    let crlf = match (bytes[at], bytes.get(at + 1)) {
        (b'\n', _) => 1,
        (b'\r', Some(b'\n')) => 2,
        (b'\r', None) => return ParseResult::Pending,
        _ => return ParseResult::Err(ProtoError::InvalidSeparator),
    };
    let line = bytes.split_to(at);
    bytes.advance(crlf);
    ParseResult::Ok(line)
}

// ===== Status Line =====

/// Response status line.
#[derive(Debug)]
pub struct StatusLine {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
}

/// Parse response status line, e.g: `HTTP/1.1 200 OK`.
pub fn parse_status_line(bytes: &mut BytesMut) -> ParseResult<StatusLine, ProtoError> {
    use ParseResult as Result;

    let line = ready!(split_line(bytes));

    let Some((version, rest)) = line.split_first_chunk::<VERSION_SIZE>() else {
        return Result::Err(ProtoError::InvalidStatusLine);
    };
    if !version.starts_with(b"HTTP/") {
        return Result::Err(ProtoError::InvalidStatusLine);
    }
    let Some(version) = Version::from_bytes(version) else {
        return Result::Err(ProtoError::UnsupportedVersion);
    };

    let Some((b' ', rest)) = rest.split_first() else {
        return Result::Err(ProtoError::InvalidStatusLine);
    };

    let Some((code, rest)) = rest.split_first_chunk::<3>() else {
        return Result::Err(ProtoError::InvalidStatus);
    };
    if !code.iter().all(u8::is_ascii_digit) {
        return Result::Err(ProtoError::InvalidStatus);
    }
    let code = code.iter().fold(0u16, |acc, e| acc * 10 + (e - b'0') as u16);
    let Some(status) = StatusCode::from_u16(code) else {
        return Result::Err(ProtoError::InvalidStatus);
    };

    // reason phrase may be empty or omitted entirely
    let reason = match rest.split_first() {
        None => String::new(),
        Some((b' ', reason)) => String::from_utf8_lossy(reason).into_owned(),
        Some(_) => return Result::Err(ProtoError::InvalidStatus),
    };

    Result::Ok(StatusLine {
        version,
        status,
        reason,
    })
}

// ===== Header =====

/// Single header field.
#[derive(Debug)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Parse a single header field.
///
/// Returns `Ok(None)` on the empty line that terminates the head.
pub fn parse_header(bytes: &mut BytesMut) -> ParseResult<Option<Header>, ProtoError> {
    use ParseResult as Result;

    match bytes.first() {
        None => return Result::Pending,
        Some(b'\n') => {
            bytes.advance(1);
            return Result::Ok(None);
        }
        Some(b'\r') => match bytes.get(1) {
            Some(b'\n') => {
                bytes.advance(2);
                return Result::Ok(None);
            }
            Some(_) => return Result::Err(ProtoError::InvalidSeparator),
            None => return Result::Pending,
        },
        Some(_) => {}
    }

    let mut line = ready!(split_line(bytes));

    let Some(colon) = line.iter().position(|e| *e == b':') else {
        return Result::Err(ProtoError::InvalidHeader);
    };
    let name = line.split_to(colon);
    line.advance(1);

    if name.is_empty() || !name.iter().all(|e| is_token(*e)) {
        return Result::Err(ProtoError::InvalidHeader);
    }

    let value = line.trim_ascii();

    Result::Ok(Some(Header {
        // token is a subset of ascii
        name: name.iter().map(|e| *e as char).collect(),
        value: String::from_utf8_lossy(value).into_owned(),
    }))
}

/// `tchar` as in [rfc9110](https://www.rfc-editor.org/rfc/rfc9110#name-tokens).
const fn is_token(byte: u8) -> bool {
    matches!(
        byte,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
            | b'`' | b'|' | b'~'
    ) || byte.is_ascii_alphanumeric()
}

// ===== Headers =====

/// Received header fields.
///
/// Lookup is case insensitive. Repeated fields are combined into one value separated by `", "`.
#[derive(Clone, Debug, Default)]
pub struct Headers {
    fields: Vec<(String, String)>,
    raw: String,
}

impl Headers {
    /// Create new empty [`Headers`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            fields: Vec::new(),
            raw: String::new(),
        }
    }

    /// Returns the number of distinct field names.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field has been received.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the combined value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the header block, one `name: value` per `\r\n` terminated line, in received
    /// order.
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Append a field.
    pub fn append(&mut self, header: Header) {
        self.raw.push_str(&header.name);
        self.raw.push_str(": ");
        self.raw.push_str(&header.value);
        self.raw.push_str("\r\n");

        match self.fields.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(&header.name)) {
            Some((_, value)) => {
                value.push_str(", ");
                value.push_str(&header.value);
            }
            None => self.fields.push((header.name, header.value)),
        }
    }
}

// ===== Head =====

/// Complete response head.
#[derive(Debug)]
pub struct ResponseHead {
    pub version: Version,
    pub status: StatusCode,
    pub reason: String,
    pub headers: Headers,
}

/// Incremental response head parser.
///
/// Progress is kept across calls, so [`HeadParser::parse`] can be called again after each read
/// until it stops returning [`ParseResult::Pending`].
#[derive(Debug, Default)]
pub struct HeadParser {
    line: Option<StatusLine>,
    headers: Headers,
    consumed: usize,
}

impl HeadParser {
    /// Create new [`HeadParser`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            line: None,
            headers: Headers::new(),
            consumed: 0,
        }
    }

    /// Parse the head from `bytes`, consumed bytes are advanced.
    ///
    /// Bytes after the head, the start of the message body, are left in `bytes`.
    pub fn parse(&mut self, bytes: &mut BytesMut) -> ParseResult<ResponseHead, ProtoError> {
        loop {
            let before = bytes.len();

            let result = if self.line.is_none() {
                parse_status_line(bytes).map(|line| {
                    self.line = Some(line);
                    true
                })
            } else {
                parse_header(bytes).map(|header| match header {
                    Some(header) => {
                        self.headers.append(header);
                        true
                    }
                    None => false,
                })
            };

            self.consumed += before - bytes.len();
            if self.consumed > MAX_HEAD_SIZE {
                return ParseResult::Err(ProtoError::TooLarge);
            }

            match result {
                ParseResult::Ok(true) => continue,
                ParseResult::Ok(false) => break,
                ParseResult::Pending if self.consumed + bytes.len() > MAX_HEAD_SIZE => {
                    return ParseResult::Err(ProtoError::TooLarge);
                }
                ParseResult::Pending => return ParseResult::Pending,
                ParseResult::Err(err) => return ParseResult::Err(err),
            }
        }

        let Some(line) = self.line.take() else {
            return ParseResult::Err(ProtoError::InvalidStatusLine);
        };
        self.consumed = 0;

        ParseResult::Ok(ResponseHead {
            version: line.version,
            status: line.status,
            reason: line.reason,
            headers: std::mem::take(&mut self.headers),
        })
    }
}
