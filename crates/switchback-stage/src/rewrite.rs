#![forbid(unsafe_code)]

//! Stack rewriting around a push.
//!
//! Rewrite flags mark existing entries for removal; the push lands first and
//! the stack is then rebuilt without animation by filtering the marks
//! ([`Stage::rebuild_stack`]). Flag priority is fixed and exclusive:
//! clear-top beats single-top beats root-top beats clear-last.

use std::any::TypeId;

use tracing::debug;

use switchback_core::PushOptions;

use crate::tree::{ScreenId, Stage, StageError};

/// What a push does to the entries already on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackRewrite {
    #[default]
    None,
    /// Drop every existing entry.
    ClearTop,
    /// Drop entries with the incoming screen's concrete type.
    SingleTop,
    /// Keep only the root entry.
    RootTop,
    /// Drop the entry that was on top before the push.
    ClearLast,
}

impl From<PushOptions> for StackRewrite {
    fn from(opts: PushOptions) -> Self {
        if opts.contains(PushOptions::CLEAR_TOP) {
            Self::ClearTop
        } else if opts.contains(PushOptions::SINGLE_TOP) {
            Self::SingleTop
        } else if opts.contains(PushOptions::ROOT_TOP) {
            Self::RootTop
        } else if opts.contains(PushOptions::CLEAR_LAST) {
            Self::ClearLast
        } else {
            Self::None
        }
    }
}

/// Mark entries of `nav` ahead of pushing a screen of type `incoming`.
/// Marks only; nothing is removed until the stack is rebuilt.
pub fn mark_stack(
    stage: &mut Stage,
    nav: ScreenId,
    rewrite: StackRewrite,
    incoming: TypeId,
) -> Result<(), StageError> {
    let stack = stage.nav_stack(nav)?.to_vec();
    let marks: Vec<ScreenId> = match rewrite {
        StackRewrite::None => Vec::new(),
        StackRewrite::ClearTop => stack,
        StackRewrite::SingleTop => stack
            .into_iter()
            .filter(|&id| stage.screen_type(id) == Some(incoming))
            .collect(),
        StackRewrite::RootTop => stack.into_iter().skip(1).collect(),
        StackRewrite::ClearLast => stack.last().copied().into_iter().collect(),
    };
    if !marks.is_empty() {
        debug!(nav = %nav, ?rewrite, count = marks.len(), "marking stack entries for removal");
    }
    for id in marks {
        stage.mark_for_removal(id, true)?;
    }
    Ok(())
}
