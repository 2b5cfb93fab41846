#![forbid(unsafe_code)]

//! The submission gate.
//!
//! An interceptor is registered under the *absolute* identifier of the
//! intent it guards, so a re-registered route silently sheds its old gates.
//! The gate runs synchronously at submit time, before anything is queued:
//! it may rewrite the intent in place, and returning `false` aborts the
//! submission with no queueing, no stage mutation, and no completion.

use std::sync::Arc;

use tracing::debug;

use switchback_core::{Identifier, IntentCtx, Payload};

use crate::handler::Handler;
use crate::route::Route;

/// The mutable view a gate receives. Closed on purpose: intents are not an
/// open set, and the gate never downcasts.
pub enum Intercepted<'a> {
    Route(&'a mut Route),
    Handler(&'a mut Handler),
}

impl Intercepted<'_> {
    /// The payload of either intent kind, for gates that only care about
    /// input.
    pub fn input_mut(&mut self) -> &mut Option<Payload> {
        match self {
            Self::Route(route) => route.input_mut(),
            Self::Handler(handler) => handler.input_mut(),
        }
    }

    pub fn route_mut(&mut self) -> Option<&mut Route> {
        match self {
            Self::Route(route) => Some(route),
            Self::Handler(_) => None,
        }
    }

    pub fn handler_mut(&mut self) -> Option<&mut Handler> {
        match self {
            Self::Route(_) => None,
            Self::Handler(handler) => Some(handler),
        }
    }
}

/// A gate closure: `true` lets the submission proceed.
pub type InterceptFn = Arc<dyn Fn(&mut Intercepted<'_>) -> bool + Send + Sync>;

/// Run the gate registered for `identifier`, if any. Unkeyed intents and
/// absent gates always pass.
pub(crate) fn gate(
    registry: &IntentCtx<InterceptFn>,
    identifier: Option<&Identifier>,
    intent: &mut Intercepted<'_>,
) -> bool {
    let Some(id) = identifier else {
        return true;
    };
    let Ok(intercept) = registry.fetch(id.absolute()) else {
        return true;
    };
    let allowed = intercept(intent);
    if !allowed {
        debug!(%id, "interceptor vetoed the submission");
    }
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchback_core::Value;
    use switchback_stage::Screen;

    #[derive(Default)]
    struct Login;
    impl Screen for Login {}

    fn registry() -> IntentCtx<InterceptFn> {
        IntentCtx::new("interceptor")
    }

    #[test]
    fn absent_gate_allows() {
        let registry = registry();
        let mut route = Route::to_screen::<Login>();
        let mut view = Intercepted::Route(&mut route);
        assert!(gate(&registry, None, &mut view));
    }

    #[test]
    fn gate_may_veto() {
        let registry = registry();
        let routes: IntentCtx<u8> = IntentCtx::new("route");
        let id = routes.register("auth/login", 0);
        let deny: InterceptFn = Arc::new(|_| false);
        registry.register(id.absolute(), deny);

        let mut route = Route::to_screen::<Login>().with_identifier(id.clone());
        let mut view = Intercepted::Route(&mut route);
        assert!(!gate(&registry, Some(&id), &mut view));
    }

    #[test]
    fn gate_may_rewrite_the_input() {
        let registry = registry();
        let routes: IntentCtx<u8> = IntentCtx::new("route");
        let id = routes.register("auth/login", 0);
        let stamp: InterceptFn = Arc::new(|intent| {
            let input = intent.input_mut().get_or_insert_with(Payload::new);
            input.set("audited", Value::from(true));
            true
        });
        registry.register(id.absolute(), stamp);

        let mut route = Route::to_screen::<Login>().with_identifier(id.clone());
        let mut view = Intercepted::Route(&mut route);
        assert!(gate(&registry, Some(&id), &mut view));
        assert_eq!(
            route.input().and_then(|p| p.get("audited")),
            Some(&Value::from(true))
        );
    }

    #[test]
    fn stale_gates_die_with_reregistration() {
        let registry = registry();
        let routes: IntentCtx<u8> = IntentCtx::new("route");
        let old = routes.register("auth/login", 0);
        let deny: InterceptFn = Arc::new(|_| false);
        registry.register(old.absolute(), deny);

        // Re-registering mints a fresh identifier; the old gate no longer
        // matches.
        let fresh = routes.register("auth/login", 1);
        let mut route = Route::to_screen::<Login>().with_identifier(fresh.clone());
        let mut view = Intercepted::Route(&mut route);
        assert!(gate(&registry, Some(&fresh), &mut view));
    }
}
