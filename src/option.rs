//! Stream options.
//!
//! [`OptionSet`] is keyed by type. Each recognised option is a newtype whose [`Default`] is the
//! value used when the option is not set, so reading an option never fails.
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    hash::{BuildHasherDefault, Hasher},
    time::Duration,
};

use crate::url::Url;

// ===== Options =====

/// Deadline of every blocking operation, zero waits indefinitely.
///
/// Default to 300 seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadTimeout(pub Duration);

impl Default for ReadTimeout {
    fn default() -> Self {
        Self(Duration::from_secs(300))
    }
}

/// `User-Agent` sent with http requests, empty sends no header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserAgent(pub String);

/// Http proxy used for `http` and `https` streams.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Proxy(pub Option<Url>);

/// Verify the server certificate of `https` streams.
///
/// Default to `true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TlsVerify(pub bool);

impl Default for TlsVerify {
    fn default() -> Self {
        Self(true)
    }
}

/// Maximum number of redirects followed by [`StreamBuf::open`].
///
/// Default to 5, zero disables redirects.
///
/// [`StreamBuf::open`]: crate::StreamBuf::open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxRedirects(pub usize);

impl Default for MaxRedirects {
    fn default() -> Self {
        Self(5)
    }
}

// ===== OptionSet =====

#[derive(Default)]
struct NoopHasher(u64);

impl Hasher for NoopHasher {
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    fn write(&mut self, _: &[u8]) {
        unreachable!("TypeId calls write_u64");
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

type AnyMap = HashMap<TypeId, Box<dyn AnyClone + Send + Sync>, BuildHasherDefault<NoopHasher>>;

/// Typed option set.
///
/// Handlers read the options they recognise and ignore the rest.
#[derive(Clone, Default)]
pub struct OptionSet {
    map: Option<AnyMap>,
}

impl OptionSet {
    /// Create new empty [`OptionSet`].
    ///
    /// This function does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self { map: None }
    }

    /// Returns the number of options set.
    pub fn len(&self) -> usize {
        self.map.as_ref().map(HashMap::len).unwrap_or_default()
    }

    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the option if set.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .as_ref()
            .and_then(|map| map.get(&TypeId::of::<T>()))
            .and_then(|ok| (**ok).as_any().downcast_ref())
    }

    /// Returns the option value, or its default if not set.
    pub fn get_option<T: Clone + Default + Send + Sync + 'static>(&self) -> T {
        self.get::<T>().cloned().unwrap_or_default()
    }

    /// Set an option, returning the previous value.
    pub fn set_option<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .get_or_insert_default()
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|ok| ok.into_any().downcast().map(|e| *e).ok())
    }

    /// Set every option of `other`, overriding existing ones.
    pub fn set_options(&mut self, other: &OptionSet) {
        let Some(other) = other.map.as_ref() else {
            return;
        };
        let map = self.map.get_or_insert_default();
        for (id, value) in other {
            map.insert(*id, value.clone());
        }
    }

    /// Removes and returns the option if it was set.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.map
            .as_mut()
            .and_then(|map| map.remove(&TypeId::of::<T>()))
            .and_then(|ok| ok.into_any().downcast().map(|e| *e).ok())
    }
}

impl fmt::Debug for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OptionSet")
            .field("length", &self.len())
            .finish()
    }
}

// ===== AnyClone =====

trait AnyClone {
    fn clone_box(&self) -> Box<dyn AnyClone + Send + Sync>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Clone + Send + Sync + 'static> AnyClone for T {
    fn clone_box(&self) -> Box<dyn AnyClone + Send + Sync> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Clone for Box<dyn AnyClone + Send + Sync> {
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_option_set() {
        let mut options = OptionSet::new();
        assert!(options.is_empty());

        // unset options yield their default
        assert_eq!(options.get_option::<ReadTimeout>(), ReadTimeout(Duration::from_secs(300)));
        assert_eq!(options.get_option::<TlsVerify>(), TlsVerify(true));
        assert_eq!(options.get_option::<MaxRedirects>(), MaxRedirects(5));
        assert_eq!(options.get_option::<UserAgent>(), UserAgent::default());
        assert_eq!(options.get_option::<Proxy>(), Proxy(None));
        assert!(options.get::<ReadTimeout>().is_none());

        options.set_option(ReadTimeout(Duration::from_millis(1500)));
        options.set_option(UserAgent("fetch/1.0".into()));
        assert_eq!(options.len(), 2);
        assert_eq!(options.get_option::<ReadTimeout>().0, Duration::from_millis(1500));

        let previous = options.set_option(ReadTimeout(Duration::ZERO));
        assert_eq!(previous, Some(ReadTimeout(Duration::from_millis(1500))));

        let snapshot = options.clone();
        assert_eq!(options.remove::<UserAgent>(), Some(UserAgent("fetch/1.0".into())));
        assert_eq!(options.get_option::<UserAgent>().0, "");

        // clone still has it
        assert_eq!(snapshot.get::<UserAgent>().map(|e| e.0.as_str()), Some("fetch/1.0"));
    }

    #[test]
    fn test_set_options() {
        let mut base = OptionSet::new();
        base.set_option(TlsVerify(false));
        base.set_option(MaxRedirects(1));

        let mut other = OptionSet::new();
        other.set_option(MaxRedirects(0));
        other.set_option(UserAgent("ua".into()));

        base.set_options(&other);
        assert_eq!(base.len(), 3);
        assert_eq!(base.get_option::<TlsVerify>(), TlsVerify(false));
        assert_eq!(base.get_option::<MaxRedirects>(), MaxRedirects(0));
        assert_eq!(base.get_option::<UserAgent>().0, "ua");

        base.set_options(&OptionSet::new());
        assert_eq!(base.len(), 3);
    }
}
