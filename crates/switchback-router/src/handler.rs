#![forbid(unsafe_code)]

//! The background-action intent.
//!
//! A [`Handler`] carries no destination: it is a registered closure plus a
//! payload and an execution affinity. Main-affinity handlers run on the
//! director's pump, ordered with routing work; background handlers run on a
//! spawned thread immediately.

use std::fmt;
use std::sync::Arc;

use switchback_core::{HandlerAffinity, Identifier, IntentError, Payload, address};

use crate::hub::Hub;

/// A registered action closure.
pub type HandlerFn = Arc<dyn Fn(Option<&Payload>) + Send + Sync>;

/// One action intent: what to run, with what input, and where.
pub struct Handler {
    pub(crate) intention: HandlerFn,
    pub(crate) input: Option<Payload>,
    pub(crate) affinity: HandlerAffinity,
    pub(crate) identifier: Option<Identifier>,
}

impl Handler {
    #[must_use]
    pub fn new(intention: HandlerFn) -> Self {
        Self {
            intention,
            input: None,
            affinity: HandlerAffinity::Main,
            identifier: None,
        }
    }

    /// Resolve a registered key against the hub's handler registry.
    pub fn from_key(hub: &Hub, key: &str) -> Result<Self, IntentError> {
        let intention = hub.handlers().fetch(key)?;
        let identifier = hub.handlers().identifier_for(key);
        let mut handler = Self::new(intention);
        handler.identifier = identifier;
        Ok(handler)
    }

    /// Resolve an intent address like `handler://sync/session?force=1`.
    pub fn from_url(hub: &Hub, url: &str) -> Result<Self, IntentError> {
        let parts = address::parse(url)?;
        let handlers = hub.handlers();
        if parts.scheme != handlers.scheme() {
            return Err(IntentError::InvalidScheme {
                scheme: parts.scheme,
                expected: handlers.scheme().to_string(),
            });
        }
        let intention = handlers.fetch(&parts.key)?;
        let identifier = handlers.identifier_for(&parts.key);
        let mut handler = Self::new(intention);
        handler.input = parts.params;
        handler.identifier = identifier;
        Ok(handler)
    }

    #[must_use]
    pub fn with_input(mut self, input: Payload) -> Self {
        self.input = Some(input);
        self
    }

    #[must_use]
    pub fn with_affinity(mut self, affinity: HandlerAffinity) -> Self {
        self.affinity = affinity;
        self
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.identifier = Some(identifier);
        self
    }

    #[must_use]
    pub fn affinity(&self) -> HandlerAffinity {
        self.affinity
    }

    #[must_use]
    pub fn input(&self) -> Option<&Payload> {
        self.input.as_ref()
    }

    pub fn input_mut(&mut self) -> &mut Option<Payload> {
        &mut self.input
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("input", &self.input)
            .field("affinity", &self.affinity)
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn from_url_resolves_and_carries_params() {
        let hub = Hub::new();
        let hits = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&hits);
        let f: HandlerFn = Arc::new(move |input| {
            if input.and_then(|p| p.get_str("force")) == Some("1") {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        hub.handlers().register("sync/session", f);

        let handler = Handler::from_url(&hub, "handler://sync/session?force=1").unwrap();
        (handler.intention)(handler.input());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn foreign_scheme_is_rejected() {
        let hub = Hub::new();
        let f: HandlerFn = Arc::new(|_| {});
        hub.handlers().register("sync/session", f);
        let err = Handler::from_url(&hub, "route://sync/session").unwrap_err();
        assert!(matches!(err, IntentError::InvalidScheme { .. }));
    }

    #[test]
    fn default_affinity_is_main() {
        let f: HandlerFn = Arc::new(|_| {});
        assert_eq!(Handler::new(f).affinity(), HandlerAffinity::Main);
    }
}
