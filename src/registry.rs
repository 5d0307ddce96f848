//! Scheme to handler factory table.
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock},
};

use crate::{
    error::Error,
    handler::{FileHandler, Handler, HttpHandler},
};

/// Constructor of a fresh, closed handler.
pub type Factory = Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>;

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::with_builtins()));

/// Returns the process wide registry of the built in `file`, `http` and `https` handlers.
///
/// The table is immutable once initialized. To add schemes, build a [`Registry`] and pass it to
/// [`StreamBuf::with_registry`].
///
/// [`StreamBuf::with_registry`]: crate::StreamBuf::with_registry
pub fn global() -> Arc<Registry> {
    GLOBAL.clone()
}

/// Handler registry.
///
/// Schemes are matched case insensitively, registering a scheme twice replaces the previous
/// factory.
#[derive(Clone, Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// Create new empty [`Registry`].
    #[inline]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create new [`Registry`] with the built in `file`, `http` and `https` handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("file", || Box::new(FileHandler::new()));
        registry.register("http", || Box::new(HttpHandler::plain()));
        registry.register("https", || Box::new(HttpHandler::tls()));
        registry
    }

    /// Register a handler factory for `scheme`.
    pub fn register<F>(&mut self, scheme: &str, factory: F)
    where
        F: Fn() -> Box<dyn Handler> + Send + Sync + 'static,
    {
        self.factories
            .insert(scheme.to_ascii_lowercase(), Arc::new(factory));
    }

    /// Returns `true` if `scheme` has a registered factory.
    pub fn contains(&self, scheme: &str) -> bool {
        self.factories.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Construct a new handler for `scheme`.
    pub fn create(&self, scheme: &str) -> Result<Box<dyn Handler>, Error> {
        match self.factories.get(&scheme.to_ascii_lowercase()) {
            Some(factory) => Ok(factory()),
            None => Err(Error::UnsupportedScheme(scheme.to_owned())),
        }
    }

    /// Returns an iterator over registered schemes.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut schemes = self.schemes().collect::<Vec<_>>();
        schemes.sort_unstable();
        f.debug_struct("Registry")
            .field("schemes", &schemes)
            .finish()
    }
}
