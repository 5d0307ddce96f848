use std::{num::NonZeroU64, task::Poll};
use bytes::{Buf, BytesMut};

use super::ProtoError;
use super::parser::parse_header;
use crate::common::ParseResult;

const MAX_CHUNK_SIZE: u64 = u64::MAX >> 1;
/// Chunk size digits, enough for [`MAX_CHUNK_SIZE`] with leading zeros.
const MAX_SIZE_DIGITS: usize = 16;
/// Chunk size line including extensions.
const MAX_SIZE_LINE: usize = 4 * 1024;
/// Total trailer section.
const MAX_TRAILER_SIZE: usize = 16 * 1024;

/// `Transfer-Encoding: chunked` decoder.
#[derive(Clone, Debug)]
pub struct ChunkedDecoder {
    phase: Phase,
}

#[derive(Clone, Debug)]
enum Phase {
    /// `<hex>[;ext]\r\n`
    Size,
    /// Remaining data of current chunk.
    Data(NonZeroU64),
    /// `\r\n` after chunk data.
    DataEnd,
    /// Trailer fields after the last chunk, ignored, with bytes consumed so far.
    Trailer(usize),
    Eof,
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedDecoder {
    #[inline]
    pub const fn new() -> Self {
        Self { phase: Phase::Size }
    }

    #[inline]
    pub const fn is_eof(&self) -> bool {
        matches!(self.phase, Phase::Eof)
    }

    /// Decode at most `limit` bytes of chunk data.
    ///
    /// Returns `Poll::Pending` if more data read is required, and `None` once the last chunk and
    /// the trailer is consumed. Returned data is never empty.
    pub fn decode(
        &mut self,
        buffer: &mut BytesMut,
        limit: usize,
    ) -> Poll<Option<Result<BytesMut, ProtoError>>> {
        debug_assert!(limit != 0);

        loop {
            match &mut self.phase {
                Phase::Size => {
                    let Some(digits_len) = buffer.iter().position(|e| !e.is_ascii_hexdigit())
                    else {
                        if buffer.len() > MAX_SIZE_DIGITS {
                            return Poll::Ready(Some(Err(ProtoError::InvalidChunked)));
                        }
                        return Poll::Pending;
                    };
                    if digits_len > MAX_SIZE_DIGITS {
                        return Poll::Ready(Some(Err(ProtoError::InvalidChunked)));
                    }
                    // SAFETY: `is_ascii_hexdigit` is subset of ASCII
                    let digits = unsafe { std::str::from_utf8_unchecked(&buffer[..digits_len]) };
                    let Ok(chunk_len) = u64::from_str_radix(digits, 16) else {
                        return Poll::Ready(Some(Err(ProtoError::InvalidChunked)));
                    };
                    if chunk_len > MAX_CHUNK_SIZE {
                        return Poll::Ready(Some(Err(ProtoError::ChunkTooLarge)));
                    }

                    // extension / CRLF delimiter
                    let trailing = match buffer[digits_len] {
                        b'\r' => match buffer.get(digits_len + 1) {
                            Some(b'\n') => 2,
                            Some(_) => return Poll::Ready(Some(Err(ProtoError::InvalidChunked))),
                            None => return Poll::Pending,
                        },
                        b'\n' => 1,
                        b';' | b' ' | b'\t' => {
                            match buffer[digits_len..].iter().position(|&e| e == b'\n') {
                                // trailing is index of '\n', therefore `+ 1` to include the '\n'
                                Some(trailing) if digits_len + trailing < MAX_SIZE_LINE => {
                                    trailing + 1
                                }
                                Some(_) => {
                                    return Poll::Ready(Some(Err(ProtoError::InvalidChunked)));
                                }
                                None if buffer.len() >= MAX_SIZE_LINE => {
                                    return Poll::Ready(Some(Err(ProtoError::InvalidChunked)));
                                }
                                None => return Poll::Pending,
                            }
                        }
                        _ => return Poll::Ready(Some(Err(ProtoError::InvalidChunked))),
                    };
                    buffer.advance(digits_len + trailing);

                    self.phase = match NonZeroU64::new(chunk_len) {
                        Some(len) => Phase::Data(len),
                        None => Phase::Trailer(0),
                    };
                }
                Phase::Data(remaining) => {
                    if buffer.is_empty() {
                        return Poll::Pending;
                    }
                    let remaining = remaining.get();

                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "cnt <= buffer.len() which is usize"
                    )]
                    let cnt = remaining.min(buffer.len() as u64).min(limit as u64) as usize;

                    self.phase = match NonZeroU64::new(remaining - cnt as u64) {
                        Some(leftover) => Phase::Data(leftover),
                        None => Phase::DataEnd,
                    };
                    return Poll::Ready(Some(Ok(buffer.split_to(cnt))));
                }
                Phase::DataEnd => {
                    let adv = match (buffer.first(), buffer.get(1)) {
                        (Some(b'\n'), _) => 1,
                        (Some(b'\r'), Some(b'\n')) => 2,
                        (None, _) | (Some(b'\r'), None) => return Poll::Pending,
                        _ => return Poll::Ready(Some(Err(ProtoError::InvalidChunked))),
                    };
                    buffer.advance(adv);
                    self.phase = Phase::Size;
                }
                Phase::Trailer(consumed) => {
                    let before = buffer.len();
                    match parse_header(buffer) {
                        ParseResult::Ok(Some(_)) => {
                            *consumed += before - buffer.len();
                            if *consumed > MAX_TRAILER_SIZE {
                                return Poll::Ready(Some(Err(ProtoError::TrailerTooLarge)));
                            }
                        }
                        ParseResult::Ok(None) => {
                            self.phase = Phase::Eof;
                            return Poll::Ready(None);
                        }
                        ParseResult::Pending if *consumed + before > MAX_TRAILER_SIZE => {
                            return Poll::Ready(Some(Err(ProtoError::TrailerTooLarge)));
                        }
                        ParseResult::Pending => return Poll::Pending,
                        ParseResult::Err(_) => {
                            return Poll::Ready(Some(Err(ProtoError::InvalidChunked)));
                        }
                    }
                }
                Phase::Eof => return Poll::Ready(None),
            }
        }
    }
}
