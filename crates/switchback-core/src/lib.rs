#![forbid(unsafe_code)]

//! Core vocabulary for Switchback: typed errors, ordered payloads, URL
//! addressing, the thread-safe intent registry, and route configuration.
//!
//! Everything in this crate is platform-free. The stage, transition, and
//! router crates build on these types without widening their invariants:
//! a registry lookup that fails here has not mutated anything anywhere.

pub mod address;
pub mod config;
pub mod error;
pub mod payload;
pub mod registry;

pub use address::UrlParts;
pub use config::{
    HandlerAffinity, PopupOptions, PopupPlacement, PresentOptions, PresentStyle, PushOptions,
    RouteConfig, SwitchOptions,
};
pub use error::IntentError;
pub use payload::{Payload, Value};
pub use registry::{Identifier, IntentCtx};
