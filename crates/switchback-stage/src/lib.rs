#![forbid(unsafe_code)]

//! The owned screen hierarchy Switchback routes against.
//!
//! The hierarchy is headless: screens are user types behind the
//! [`Screen`] trait, mounted into an arena [`Stage`] as plain screens,
//! nav stacks, tab racks, edge-swipe hosts, or popup hosts. Each node
//! carries a [`Surface`] (frame, transform, alpha, mask) that transitions
//! animate, and the explicit per-node state the routing engine needs
//! (removal marks, bottom-bar flags, presentation links).
//!
//! Consistency rules live in [`Stage::validate`]; resolution walks
//! ([`resolve`]) are iterative and bounded.

pub mod resolve;
pub mod rewrite;
pub mod screen;
pub mod surface;
pub mod tree;

pub use rewrite::StackRewrite;
pub use screen::{Screen, ShellScreen};
pub use surface::Surface;
pub use tree::{ScreenId, ScreenKind, ScreenNode, Stage, StageError};
