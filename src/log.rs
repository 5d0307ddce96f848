//! Logging macros, compiled out unless the `log` feature is enabled.
#![allow(unused, reason = "logger")]

macro_rules! trace {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        ::log::trace!(target: "urlstream", $($tt)*);
    };
}

macro_rules! debug {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        ::log::debug!(target: "urlstream", $($tt)*);
    };
}

macro_rules! info {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        ::log::info!(target: "urlstream", $($tt)*);
    };
}

macro_rules! warning {
    ($($tt:tt)*) => {
        #[cfg(feature = "log")]
        ::log::warn!(target: "urlstream", $($tt)*);
    };
}

pub(crate) use {trace, debug, info, warning};
