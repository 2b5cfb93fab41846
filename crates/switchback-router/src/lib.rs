#![forbid(unsafe_code)]

//! Intent submission and routing for Switchback.
//!
//! Call sites build a [`Route`] (a screen to reach) or a [`Handler`] (an
//! action to run), optionally resolved from the [`Hub`] registries by key
//! or URL, and submit it through a [`DirectorHandle`]. Submission gates
//! the intent through registered interceptors synchronously; what
//! survives lands on the [`Director`]'s queue and is dispatched on its
//! next tick.
//!
//! The director is the single owner of the stage, the virtual clock, and
//! every transition run. Routing strategies (push, present, switch,
//! popup, embed) mutate stage structure immediately; their animated
//! commits and rollbacks wait for the run to finish.

mod director;
mod engine;
mod handler;
mod hub;
mod interceptor;
mod route;

pub use director::{CompletionFn, Director, DirectorHandle};
pub use handler::{Handler, HandlerFn};
pub use hub::Hub;
pub use interceptor::{InterceptFn, Intercepted};
pub use route::{Route, ScreenFactory};
