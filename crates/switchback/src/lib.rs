#![forbid(unsafe_code)]

//! Switchback public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage.
//!
//! The shape of an app: mount a root into the [`Director`]'s [`Stage`],
//! register screens and handlers on its [`Hub`], submit [`Route`]s and
//! [`Handler`]s through [`DirectorHandle`]s, and feed the director wall
//! time from the host loop via [`Director::tick`].

use std::fmt;

// --- Core re-exports --------------------------------------------------------

pub use switchback_core::{
    HandlerAffinity, Identifier, IntentCtx, IntentError, Payload, PopupOptions, PopupPlacement,
    PresentOptions, PresentStyle, PushOptions, RouteConfig, SwitchOptions, UrlParts, Value,
};

// --- Stage re-exports -------------------------------------------------------

pub use switchback_stage::{
    Screen, ScreenId, ScreenKind, ScreenNode, ShellScreen, Stage, StackRewrite, StageError,
    Surface,
};

// --- Transition re-exports --------------------------------------------------

pub use switchback_transition::{
    AssociatedMorph, FlipOver, InteractiveController, Pan, PanPhase, PhaseContext, PopupReveal,
    RingReveal, RunStatus, SwipeDirection, SystemSlide, Transition, TransitionAnimator,
    TransitionLife, TransitionPhase, TransitionRun,
};

// --- Router re-exports ------------------------------------------------------

pub use switchback_router::{
    CompletionFn, Director, DirectorHandle, Handler, HandlerFn, Hub, InterceptFn, Intercepted,
    Route, ScreenFactory,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for switchback apps.
#[derive(Debug)]
pub enum Error {
    /// Registry or address resolution failure.
    Intent(IntentError),
    /// Structural stage operation failure.
    Stage(StageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intent(err) => write!(f, "{err}"),
            Self::Stage(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<IntentError> for Error {
    fn from(err: IntentError) -> Self {
        Self::Intent(err)
    }
}

impl From<StageError> for Error {
    fn from(err: StageError) -> Self {
        Self::Stage(err)
    }
}

/// Standard result type for switchback APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Director, DirectorHandle, Error, Handler, Hub, Payload, Result, Route, RouteConfig,
        Screen, ScreenId, Stage, Transition, Value,
    };

    pub use crate::{core, router, stage, transition};
}

pub use switchback_core as core;
pub use switchback_router as router;
pub use switchback_stage as stage;
pub use switchback_transition as transition;

pub use kurbo;
