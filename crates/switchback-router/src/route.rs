#![forbid(unsafe_code)]

//! The screen-routing intent.
//!
//! A [`Route`] names a destination (by deferred factory), carries its input
//! payload, and says how it should reach the stage. Build one per call
//! site, refine it with chained calls, and hand it to
//! [`DirectorHandle::submit`](crate::DirectorHandle::submit); the value is
//! consumed and its completion fires at most once.

use std::fmt;
use std::sync::Arc;

use switchback_core::{Identifier, IntentError, Payload, RouteConfig, address};
use switchback_stage::{Screen, ScreenId};
use switchback_transition::Transition;

use crate::hub::Hub;

/// Deferred constructor for a destination screen. Receives the route's
/// payload so factories can pick a variant before assignment runs.
pub type ScreenFactory = Arc<dyn Fn(Option<&Payload>) -> Box<dyn Screen> + Send + Sync>;

/// One navigation intent: where to go, how, and from where.
pub struct Route {
    pub(crate) factory: ScreenFactory,
    pub(crate) input: Option<Payload>,
    pub(crate) config: RouteConfig,
    pub(crate) executor: Option<ScreenId>,
    pub(crate) transition: Option<Transition>,
    pub(crate) identifier: Option<Identifier>,
}

impl Route {
    /// A route around an explicit factory, outside any registry.
    #[must_use]
    pub fn new(factory: ScreenFactory) -> Self {
        Self {
            factory,
            input: None,
            config: RouteConfig::Auto,
            executor: None,
            transition: None,
            identifier: None,
        }
    }

    /// A route that default-constructs `S`. Payload still lands through
    /// [`Screen::assign`].
    #[must_use]
    pub fn to_screen<S: Screen + Default>() -> Self {
        let factory: ScreenFactory = Arc::new(|_| Box::new(S::default()));
        Self::new(factory)
    }

    /// Resolve a registered key against the hub's route registry.
    pub fn from_key(hub: &Hub, key: &str) -> Result<Self, IntentError> {
        let factory = hub.routes().fetch(key)?;
        let identifier = hub.routes().identifier_for(key);
        let mut route = Self::new(factory);
        route.identifier = identifier;
        Ok(route)
    }

    /// Resolve an intent address like `route://shop/detail?item=42`. Query
    /// items become the route's input payload.
    pub fn from_url(hub: &Hub, url: &str) -> Result<Self, IntentError> {
        let parts = address::parse(url)?;
        let routes = hub.routes();
        if parts.scheme != routes.scheme() {
            return Err(IntentError::InvalidScheme {
                scheme: parts.scheme,
                expected: routes.scheme().to_string(),
            });
        }
        let factory = routes.fetch(&parts.key)?;
        let identifier = routes.identifier_for(&parts.key);
        let mut route = Self::new(factory);
        route.input = parts.params;
        route.identifier = identifier;
        Ok(route)
    }

    /// Replace the input payload.
    #[must_use]
    pub fn with_input(mut self, input: Payload) -> Self {
        self.input = Some(input);
        self
    }

    /// Pick the strategy explicitly; the default is [`RouteConfig::Auto`].
    #[must_use]
    pub fn with_config(mut self, config: RouteConfig) -> Self {
        self.config = config;
        self
    }

    /// Act from this screen instead of the resolved active screen.
    #[must_use]
    pub fn with_executor(mut self, executor: ScreenId) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Attach a custom transition for the animated phase pair.
    #[must_use]
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Key the route for interceptor lookup when it was not built from a
    /// registry.
    #[must_use]
    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.identifier = Some(identifier);
        self
    }

    #[must_use]
    pub fn config(&self) -> RouteConfig {
        self.config
    }

    #[must_use]
    pub fn input(&self) -> Option<&Payload> {
        self.input.as_ref()
    }

    pub fn input_mut(&mut self) -> &mut Option<Payload> {
        &mut self.input
    }

    #[must_use]
    pub fn executor(&self) -> Option<ScreenId> {
        self.executor
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    /// Interceptors may retarget a route entirely.
    pub fn set_config(&mut self, config: RouteConfig) {
        self.config = config;
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("input", &self.input)
            .field("config", &self.config)
            .field("executor", &self.executor)
            .field("transition", &self.transition)
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchback_core::Value;

    #[derive(Default)]
    struct Detail;
    impl Screen for Detail {}

    #[test]
    fn builders_chain_and_stick() {
        let route = Route::to_screen::<Detail>()
            .with_input(Payload::new().with("item", Value::from(42)))
            .with_config(RouteConfig::AsChild);
        assert_eq!(route.config(), RouteConfig::AsChild);
        assert_eq!(route.input().and_then(|p| p.get("item")), Some(&Value::from(42)));
        assert!(route.identifier().is_none());
    }

    #[test]
    fn from_key_carries_the_registry_identifier() {
        let hub = Hub::new();
        let id = hub.register_screen::<Detail>("shop/detail");
        let route = Route::from_key(&hub, "shop/detail").unwrap();
        assert_eq!(route.identifier(), Some(&id));
    }

    #[test]
    fn from_url_folds_the_query_into_input() {
        let hub = Hub::new();
        hub.register_screen::<Detail>("shop/detail");
        let route = Route::from_url(&hub, "route://shop/detail?item=42&item=7").unwrap();
        assert_eq!(route.input().and_then(|p| p.get_str("item")), Some("7"));
    }

    #[test]
    fn from_url_rejects_a_foreign_scheme() {
        let hub = Hub::new();
        hub.register_screen::<Detail>("shop/detail");
        let err = Route::from_url(&hub, "handler://shop/detail").unwrap_err();
        assert!(matches!(err, IntentError::InvalidScheme { .. }));
    }

    #[test]
    fn from_key_misses_with_invalid_path() {
        let hub = Hub::new();
        let err = Route::from_key(&hub, "absent").unwrap_err();
        assert_eq!(err, IntentError::InvalidPath { path: "absent".into() });
    }
}
