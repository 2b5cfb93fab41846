#![forbid(unsafe_code)]

//! The transition state machine.
//!
//! One shared mechanism drives every transition: an animator contributes
//! eased property [tracks](track) for a phase, a [`TransitionRun`] samples
//! them against a media-timing [clock](clock), and an optional
//! [`InteractiveController`] scrubs that clock by gesture percent. Concrete
//! animators only describe choreography; they never see gestures, percent,
//! or time.
//!
//! Runs are phase-scoped: a forward run plays the appearance, a backward
//! run the disappearance, each with a fresh clock. A transition value is
//! single-use per phase; once both phases ran it is consumed.

pub mod animators;
pub mod clock;
pub mod easing;
pub mod gesture;
pub mod interactive;
pub mod machine;
pub mod track;

pub use clock::TransitionClock;
pub use gesture::{Pan, PanPhase, SwipeDirection};
pub use interactive::InteractiveController;
pub use machine::{
    DEFAULT_DURATION, FAKE_PUSH_DURATION, PhaseContext, POPUP_DURATION, RunStatus,
    SYSTEM_DURATION, Transition, TransitionAnimator, TransitionLife, TransitionPhase,
    TransitionRun,
};
pub use track::{Track, TrackKind, TrackTarget};

pub use animators::{
    AssociatedMorph, CoveredStyle, FlipOver, PopupReveal, RingReveal, SlideAxis, SystemSlide,
};
