#![forbid(unsafe_code)]

//! The screen contract.
//!
//! Destinations implement [`Screen`]. Every hook has a default, so a unit
//! struct is already a valid screen; richer screens opt into payload
//! assignment, routing preferences, transition capabilities, and lifecycle
//! notifications by overriding the hooks they care about. Capabilities are
//! ordinary trait methods: the engine never downcasts to discover them.

use std::any::Any;

use switchback_core::{RouteConfig, Value};

use kurbo::Rect;

/// A routable destination mounted on the [`Stage`](crate::Stage).
pub trait Screen: Any {
    /// Explicit property assignment for payload injection. Return `true`
    /// when the key was accepted; unclaimed keys are dropped with a trace.
    fn assign(&mut self, key: &str, value: &Value) -> bool {
        let _ = (key, value);
        false
    }

    /// Routing preference consulted only when the caller submitted
    /// [`RouteConfig::Auto`]. An explicit caller config always wins.
    fn preferred_config(&self) -> Option<RouteConfig> {
        None
    }

    /// Value handed to the opposite side when a transition run starts.
    fn handoff_param(&self) -> Option<Value> {
        None
    }

    /// Receives the opposite side's handoff before the first sample of a
    /// transition run.
    fn transition_will_begin(&mut self, param: Option<&Value>) {
        let _ = param;
    }

    /// Source rectangles for reveal and morph transitions, in stage
    /// coordinates. Empty means the capability is absent.
    fn source_frames(&self) -> Vec<Rect> {
        Vec::new()
    }

    /// Destination rectangle overrides for morph transitions. `None` lets
    /// the animator pair sources with the incoming screen's own frames.
    fn fixed_dest_frames(&self) -> Option<Vec<Rect>> {
        None
    }

    /// Veto for interactive pop gestures while this screen is on top.
    fn resists_interactive_pop(&self) -> bool {
        false
    }

    // ---- lifecycle ----

    fn will_appear(&mut self, animated: bool) {
        let _ = animated;
    }

    fn did_appear(&mut self, animated: bool) {
        let _ = animated;
    }

    fn will_disappear(&mut self, animated: bool) {
        let _ = animated;
    }

    fn did_disappear(&mut self, animated: bool) {
        let _ = animated;
    }
}

impl dyn Screen {
    /// The concrete type behind this screen.
    #[must_use]
    pub fn concrete_type(&self) -> std::any::TypeId {
        let any: &dyn Any = self;
        any.type_id()
    }

    #[must_use]
    pub fn is<T: Screen>(&self) -> bool {
        self.concrete_type() == std::any::TypeId::of::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Screen>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Screen>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = self;
        any.downcast_mut::<T>()
    }
}

/// Content for synthesized containers (nav shells, edge hosts, popup
/// hosts). Carries no behavior of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellScreen;

impl Screen for ShellScreen {}
