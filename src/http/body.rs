// rfc-editor.org/rfc/rfc9112.html#name-message-body-length
//
// Content-Length
// Transfer-Encoding - chunked only
// neither - delimited by connection close

use std::task::Poll;
use bytes::BytesMut;

use super::chunked::ChunkedDecoder;
use super::parser::Headers;
use super::{ProtoError, StatusCode};

/// Message body framing of a response.
#[derive(Clone, Debug)]
pub enum Coding {
    /// Remaining bytes of a `Content-Length` body.
    ContentLength(u64),
    /// `Transfer-Encoding: chunked` body.
    Chunked(ChunkedDecoder),
    /// Body ends when the server closes the connection.
    CloseDelimited,
    /// Body completely received.
    Eof,
}

/// Response message body decoder.
#[derive(Debug)]
pub struct BodyDecoder {
    coding: Coding,
}

impl BodyDecoder {
    /// Determine body framing from response status and headers.
    pub fn new(status: StatusCode, headers: &Headers) -> Result<Self, ProtoError> {
        if status.is_bodyless() {
            return Ok(Self { coding: Coding::Eof });
        }

        let content_length = content_length(headers)?;
        let chunked = match headers.get("transfer-encoding") {
            None => false,
            Some(codings) => {
                // TODO: support compressed transfer-encodings
                let ok = codings.split(',').all(|e| e.trim().eq_ignore_ascii_case("chunked"));
                if !ok {
                    return Err(ProtoError::UnknownCodings);
                }
                true
            }
        };

        let coding = match (content_length, chunked) {
            (None, false) => Coding::CloseDelimited,
            (None, true) => Coding::Chunked(ChunkedDecoder::new()),
            (Some(0), false) => Coding::Eof,
            (Some(len), false) => Coding::ContentLength(len),
            (Some(_), true) => return Err(ProtoError::InvalidCodings),
        };
        Ok(Self { coding })
    }

    #[inline]
    pub const fn coding(&self) -> &Coding {
        &self.coding
    }

    /// Returns `true` if the body is completely received.
    #[inline]
    pub const fn is_eof(&self) -> bool {
        match &self.coding {
            Coding::Eof => true,
            Coding::Chunked(decoder) => decoder.is_eof(),
            _ => false,
        }
    }

    /// Decode at most `limit` bytes of body from `buffer`.
    ///
    /// Returns `Poll::Pending` if more data read is required, and `None` at the end of body.
    pub fn decode(
        &mut self,
        buffer: &mut BytesMut,
        limit: usize,
    ) -> Poll<Option<Result<BytesMut, ProtoError>>> {
        match &mut self.coding {
            Coding::Eof => Poll::Ready(None),
            Coding::Chunked(decoder) => decoder.decode(buffer, limit),
            Coding::ContentLength(remaining_mut) => {
                if buffer.is_empty() {
                    return Poll::Pending;
                }
                #[allow(clippy::cast_possible_truncation, reason = "cnt <= buffer.len()")]
                let cnt = (*remaining_mut).min(buffer.len() as u64).min(limit as u64) as usize;
                *remaining_mut -= cnt as u64;
                if *remaining_mut == 0 {
                    self.coding = Coding::Eof;
                }
                Poll::Ready(Some(Ok(buffer.split_to(cnt))))
            }
            Coding::CloseDelimited => {
                if buffer.is_empty() {
                    return Poll::Pending;
                }
                let cnt = buffer.len().min(limit);
                Poll::Ready(Some(Ok(buffer.split_to(cnt))))
            }
        }
    }

    /// Notify that the connection is closed by the server.
    ///
    /// Returns `false` if the body is not complete.
    pub fn on_eof(&mut self) -> bool {
        match self.coding {
            Coding::CloseDelimited | Coding::Eof => {
                self.coding = Coding::Eof;
                true
            }
            _ => self.is_eof(),
        }
    }
}

/// Parse `Content-Length`, repeated values must be identical.
pub fn content_length(headers: &Headers) -> Result<Option<u64>, ProtoError> {
    let Some(value) = headers.get("content-length") else {
        return Ok(None);
    };

    let mut length = None;
    for value in value.split(',') {
        let value = value.trim();
        if value.is_empty() || !value.bytes().all(|e| e.is_ascii_digit()) {
            return Err(ProtoError::InvalidContentLength);
        }
        let Ok(value) = value.parse::<u64>() else {
            return Err(ProtoError::InvalidContentLength);
        };
        match length {
            Some(length) if length != value => return Err(ProtoError::InvalidContentLength),
            _ => length = Some(value),
        }
    }
    Ok(length)
}
