/// Result of an incremental parse over a read buffer.
#[derive(Debug)]
pub enum ParseResult<T, E> {
    /// Bytes is not sufficient for parsing, more IO read is required.
    Pending,
    /// Parse success.
    Ok(T),
    /// Parse failed.
    Err(E),
}

impl<T, E> ParseResult<T, E> {
    /// Returns `true` if the parse result is [`Pending`].
    ///
    /// [`Pending`]: ParseResult::Pending
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Maps a [`ParseResult<T, E>`] to [`ParseResult<U, E>`] by applying a function to the
    /// contained [`Ok`] value.
    ///
    /// [`Ok`]: ParseResult::Ok
    #[inline]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ParseResult<U, E> {
        match self {
            ParseResult::Pending => ParseResult::Pending,
            ParseResult::Ok(ok) => ParseResult::Ok(f(ok)),
            ParseResult::Err(err) => ParseResult::Err(err),
        }
    }
}

/// Unwrap [`ParseResult::Ok`], or return early from the enclosing parser.
macro_rules! ready {
    ($e:expr) => {
        match $e {
            $crate::common::ParseResult::Ok(ok) => ok,
            $crate::common::ParseResult::Pending => return $crate::common::ParseResult::Pending,
            $crate::common::ParseResult::Err(err) => {
                return $crate::common::ParseResult::Err(err.into());
            }
        }
    };
}

pub(crate) use ready;
