#![forbid(unsafe_code)]

//! Stock animators.
//!
//! Each animator is pure choreography: it emits property tracks for a
//! phase and never touches time, percent, or gestures. [`SystemSlide`]
//! reproduces the platform push/present slides, [`FlipOver`] plays a
//! two-half Y-axis flip, [`RingReveal`] grows a circular mask out of a
//! tapped frame, [`AssociatedMorph`] flies shared elements between
//! screens, and [`PopupReveal`] pairs a backdrop dim with a placement
//! entrance.

mod flip;
mod morph;
mod popup;
mod reveal;
mod slide;

pub use flip::FlipOver;
pub use morph::AssociatedMorph;
pub use popup::{DIM_ALPHA, PopupReveal};
pub use reveal::RingReveal;
pub use slide::{CoveredStyle, SlideAxis, SystemSlide};
