#![forbid(unsafe_code)]

//! The registry hub.
//!
//! Three scheme-scoped registries under one roof: routes (screen
//! factories), handlers (action closures), and interceptors (submission
//! gates). A hub is a plain value: construct one per app or per test and
//! share it behind `Arc`. [`Hub::global`] exists for hosts that want a
//! process-wide default, but explicit instances are the primary API.

use std::fmt;
use std::sync::{Arc, OnceLock};

use switchback_core::{Identifier, IntentCtx, Payload};
use switchback_stage::Screen;

use crate::handler::HandlerFn;
use crate::interceptor::InterceptFn;
use crate::route::ScreenFactory;

static GLOBAL: OnceLock<Hub> = OnceLock::new();

/// Route, handler, and interceptor registries for one app.
pub struct Hub {
    routes: IntentCtx<ScreenFactory>,
    handlers: IntentCtx<HandlerFn>,
    interceptors: IntentCtx<InterceptFn>,
}

impl Hub {
    /// A hub with the conventional schemes `route`, `handler`, and
    /// `interceptor`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_schemes("route", "handler", "interceptor")
    }

    #[must_use]
    pub fn with_schemes(routes: &str, handlers: &str, interceptors: &str) -> Self {
        Self {
            routes: IntentCtx::new(routes),
            handlers: IntentCtx::new(handlers),
            interceptors: IntentCtx::new(interceptors),
        }
    }

    /// The opt-in process-wide hub, created on first use.
    pub fn global() -> &'static Hub {
        GLOBAL.get_or_init(Hub::new)
    }

    #[must_use]
    pub fn routes(&self) -> &IntentCtx<ScreenFactory> {
        &self.routes
    }

    #[must_use]
    pub fn handlers(&self) -> &IntentCtx<HandlerFn> {
        &self.handlers
    }

    #[must_use]
    pub fn interceptors(&self) -> &IntentCtx<InterceptFn> {
        &self.interceptors
    }

    /// Register a default-constructible screen type under `key`. The
    /// stored factory ignores input; payload still lands through
    /// [`Screen::assign`] after construction.
    pub fn register_screen<S: Screen + Default>(&self, key: impl Into<String>) -> Identifier {
        let factory: ScreenFactory = Arc::new(|_: Option<&Payload>| Box::new(S::default()));
        self.routes.register(key, factory)
    }

    /// Register a factory that builds from the route's payload.
    pub fn register_factory(&self, key: impl Into<String>, factory: ScreenFactory) -> Identifier {
        self.routes.register(key, factory)
    }

    /// Register an action closure under `key`.
    pub fn register_handler(&self, key: impl Into<String>, handler: HandlerFn) -> Identifier {
        self.handlers.register(key, handler)
    }

    /// Guard the intent registered as `target` with `gate`. The gate is
    /// keyed by the target's absolute identifier, so re-registering the
    /// target sheds it.
    pub fn intercept(&self, target: &Identifier, gate: InterceptFn) -> Identifier {
        self.interceptors.register(target.absolute(), gate)
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("routes", &self.routes)
            .field("handlers", &self.handlers)
            .field("interceptors", &self.interceptors)
            .finish()
    }
}
