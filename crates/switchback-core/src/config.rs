#![forbid(unsafe_code)]

//! Route configuration: how a destination reaches the stage.
//!
//! `Auto` defers the decision to the engine (push when the executor lives
//! in a nav stack, present otherwise), optionally overridden by the
//! destination's own preference. Stack-rewrite flag priority is fixed:
//! `CLEAR_TOP` over `SINGLE_TOP` over `ROOT_TOP` over `CLEAR_LAST`.

use bitflags::bitflags;

bitflags! {
    /// Options for modal presentation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PresentOptions: u8 {
        /// Suppress the presentation animation.
        const CANCEL_ANIMATION = 1 << 0;
        /// Wrap the destination in a synthesized nav shell (carrying a
        /// back affordance) before presenting.
        const WRAP_NAV = 1 << 1;
        /// Present inside an edge-swipe host styled like a push: forces a
        /// horizontal slide and an interactive edge dismiss.
        const FAKE_PUSH = 1 << 2;
    }
}

bitflags! {
    /// Options for pushing onto a nav stack.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PushOptions: u8 {
        /// Suppress the push animation.
        const CANCEL_ANIMATION = 1 << 0;
        /// Drop every existing entry; the pushed screen becomes the stack.
        const CLEAR_TOP = 1 << 1;
        /// Drop existing entries of the pushed screen's concrete type.
        const SINGLE_TOP = 1 << 2;
        /// Keep only the root entry beneath the pushed screen.
        const ROOT_TOP = 1 << 3;
        /// Drop the entry that was on top before the push.
        const CLEAR_LAST = 1 << 4;
    }
}

bitflags! {
    /// Options for switching to an already-mounted screen.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SwitchOptions: u8 {
        /// Suppress the one animated dismissal a switch may perform.
        const CANCEL_ANIMATION = 1 << 0;
        /// Search ancestor-ward from the executor (reversed sibling order)
        /// instead of from the window root.
        const NEAREST = 1 << 1;
    }
}

bitflags! {
    /// Options for popup overlays.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PopupOptions: u8 {
        /// Suppress the show/dismiss animation.
        const CANCEL_ANIMATION = 1 << 0;
        /// Blur the backdrop instead of plain dimming.
        const DIM_BLUR = 1 << 1;
        /// Pin the content to the bottom edge.
        const CONTENT_BOTTOM = 1 << 2;
        /// Pin the content to the top edge.
        const CONTENT_TOP = 1 << 3;
    }
}

/// Where popup content lands. `CONTENT_BOTTOM` wins when both edge flags
/// are set; neither flag means centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupPlacement {
    Center,
    Top,
    Bottom,
}

impl PopupOptions {
    #[must_use]
    pub fn placement(self) -> PopupPlacement {
        if self.contains(Self::CONTENT_BOTTOM) {
            PopupPlacement::Bottom
        } else if self.contains(Self::CONTENT_TOP) {
            PopupPlacement::Top
        } else {
            PopupPlacement::Center
        }
    }
}

/// Modal presentation style recorded on the presented node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentStyle {
    #[default]
    FullScreen,
    /// Full-screen without unloading what it covers.
    OverFullScreen,
    Sheet,
}

/// How a routed destination reaches the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteConfig {
    /// Let the engine decide: push when the executor is, or is embedded
    /// under, a nav stack; present full-screen otherwise.
    #[default]
    Auto,
    Present(PresentOptions, PresentStyle),
    Push(PushOptions),
    Switch(SwitchOptions),
    Popup(PopupOptions),
    /// Embed synchronously as a child of the executor. No animation.
    AsChild,
}

impl RouteConfig {
    /// True when the variant suppresses its animation.
    #[must_use]
    pub fn animation_cancelled(&self) -> bool {
        match self {
            Self::Auto | Self::AsChild => false,
            Self::Present(opts, _) => opts.contains(PresentOptions::CANCEL_ANIMATION),
            Self::Push(opts) => opts.contains(PushOptions::CANCEL_ANIMATION),
            Self::Switch(opts) => opts.contains(SwitchOptions::CANCEL_ANIMATION),
            Self::Popup(opts) => opts.contains(PopupOptions::CANCEL_ANIMATION),
        }
    }
}

/// Where a handler closure runs when its intent is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerAffinity {
    /// On the director's pump, ordered with routing work.
    #[default]
    Main,
    /// On a spawned background thread, immediately.
    Background,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_auto() {
        assert_eq!(RouteConfig::default(), RouteConfig::Auto);
    }

    #[test]
    fn placement_prefers_bottom() {
        let both = PopupOptions::CONTENT_BOTTOM | PopupOptions::CONTENT_TOP;
        assert_eq!(both.placement(), PopupPlacement::Bottom);
        assert_eq!(
            PopupOptions::CONTENT_TOP.placement(),
            PopupPlacement::Top
        );
        assert_eq!(PopupOptions::empty().placement(), PopupPlacement::Center);
    }

    #[test]
    fn animation_cancel_is_per_variant() {
        assert!(
            RouteConfig::Push(PushOptions::CANCEL_ANIMATION | PushOptions::CLEAR_TOP)
                .animation_cancelled()
        );
        assert!(!RouteConfig::Push(PushOptions::CLEAR_TOP).animation_cancelled());
        assert!(!RouteConfig::Auto.animation_cancelled());
    }
}
