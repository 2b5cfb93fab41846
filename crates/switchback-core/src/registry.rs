#![forbid(unsafe_code)]

//! The scheme-scoped intent registry.
//!
//! [`IntentCtx`] maps string keys to intentions plus a generated
//! [`Identifier`]. Reads run concurrently, writes exclusively; no reader
//! ever observes a partially applied write, and a failed lookup never
//! mutates.
//!
//! Registries are plain values. Construct one per concern and share it via
//! `Arc`, as the hub in `switchback-router` does. Nothing here is
//! process-global.

use std::collections::HashMap;
use std::fmt;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::address;
use crate::error::IntentError;
use crate::payload::Payload;

/// Stable handle for one registration. Interceptors key off
/// [`absolute`](Self::absolute), which embeds the scheme, the key, and a
/// per-registry serial so re-registrations get fresh handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    path: String,
    absolute: String,
}

impl Identifier {
    /// The key this identifier was minted for.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The globally unique form: `{scheme}:{path}#{serial}`.
    #[must_use]
    pub fn absolute(&self) -> &str {
        &self.absolute
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.absolute)
    }
}

struct Entry<T> {
    intention: T,
    id: Identifier,
}

/// A thread-safe key → intention registry bound to one URL scheme.
pub struct IntentCtx<T> {
    scheme: String,
    entries: RwLock<HashMap<String, Entry<T>>>,
    serial: AtomicU64,
}

impl<T> IntentCtx<T> {
    #[must_use]
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            entries: RwLock::new(HashMap::new()),
            serial: AtomicU64::new(0),
        }
    }

    /// The scheme URL lookups must carry to resolve against this registry.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Insert or overwrite the intention under `key`. Overwriting retires
    /// the old entry's identifier; the returned one is freshly minted.
    pub fn register(&self, key: impl Into<String>, intention: T) -> Identifier {
        let key = key.into();
        let id = self.mint(&key);
        let mut entries = self.write();
        entries.insert(
            key,
            Entry {
                intention,
                id: id.clone(),
            },
        );
        id
    }

    /// Remove and return the intention under `key`. Missing keys return
    /// `None`; unregistering twice is not an error.
    pub fn unregister(&self, key: &str) -> Option<T> {
        self.write().remove(key).map(|entry| entry.intention)
    }

    /// The identifier minted for `key`, if registered.
    #[must_use]
    pub fn identifier_for(&self, key: &str) -> Option<Identifier> {
        self.read().get(key).map(|entry| entry.id.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn mint(&self, path: &str) -> Identifier {
        let serial = self.serial.fetch_add(1, Ordering::Relaxed) + 1;
        Identifier {
            path: path.to_string(),
            absolute: format!("{}:{}#{}", self.scheme, path, serial),
        }
    }

    // A poisoned lock still holds coherent state: these operations never
    // leave the map mid-edit. Keep serving it.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> IntentCtx<T> {
    /// Fetch the intention registered under `key`.
    pub fn fetch(&self, key: &str) -> Result<T, IntentError> {
        self.read()
            .get(key)
            .map(|entry| entry.intention.clone())
            .ok_or_else(|| IntentError::InvalidPath {
                path: key.to_string(),
            })
    }

    /// Resolve a URL against this registry: parse, check the scheme, look
    /// up host+path as the key, and fold the query into a payload.
    pub fn fetch_url(&self, raw: &str) -> Result<(T, Option<Payload>), IntentError> {
        let parts = address::parse(raw)?;
        if parts.scheme != self.scheme {
            return Err(IntentError::InvalidScheme {
                scheme: parts.scheme,
                expected: self.scheme.clone(),
            });
        }
        let intention = self.fetch(&parts.key)?;
        Ok((intention, parts.params))
    }
}

impl<T> fmt::Debug for IntentCtx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentCtx")
            .field("scheme", &self.scheme)
            .field("len", &self.len())
            .finish()
    }
}
