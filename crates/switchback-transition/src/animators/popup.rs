#![forbid(unsafe_code)]

//! Popup choreography: the host backdrop dims while the content enters
//! according to its placement. The run targets the content screen; the
//! dim lives on the popup host wrapping it.

use kurbo::Vec2;

use switchback_core::PopupPlacement;
use switchback_stage::{ScreenId, Stage};

use crate::easing::{ease_in, ease_out};
use crate::machine::{PhaseContext, TransitionAnimator, TransitionPhase};
use crate::track::{Track, TrackKind, TrackTarget};

/// Backdrop opacity while a popup is up.
pub const DIM_ALPHA: f64 = 0.6;

#[derive(Debug, Clone, Copy)]
pub struct PopupReveal {
    placement: PopupPlacement,
}

impl PopupReveal {
    #[must_use]
    pub fn new(placement: PopupPlacement) -> Self {
        Self { placement }
    }

    fn host_of(stage: &Stage, content: ScreenId) -> Option<ScreenId> {
        stage.parent(content)
    }

    fn entrance(&self, ctx: &PhaseContext<'_>) -> Vec<TrackKind> {
        match self.placement {
            PopupPlacement::Center => vec![
                TrackKind::Alpha { from: 0.0, to: 1.0 },
                TrackKind::Scale {
                    from: Vec2::new(1.12, 1.12),
                    to: Vec2::new(1.0, 1.0),
                },
            ],
            PopupPlacement::Top => vec![TrackKind::TranslationY {
                from: -ctx.container.height(),
                to: 0.0,
            }],
            PopupPlacement::Bottom => vec![TrackKind::TranslationY {
                from: ctx.container.height(),
                to: 0.0,
            }],
        }
    }

    fn exit(&self, ctx: &PhaseContext<'_>) -> Vec<TrackKind> {
        match self.placement {
            PopupPlacement::Center => vec![TrackKind::Alpha { from: 1.0, to: 0.0 }],
            PopupPlacement::Top => vec![TrackKind::TranslationY {
                from: 0.0,
                to: -ctx.container.height(),
            }],
            PopupPlacement::Bottom => vec![TrackKind::TranslationY {
                from: 0.0,
                to: ctx.container.height(),
            }],
        }
    }
}

impl TransitionAnimator for PopupReveal {
    fn present(&mut self, ctx: &mut PhaseContext<'_>) {
        if let Some(host) = Self::host_of(ctx.stage, ctx.to) {
            ctx.add_track(Track::new(
                TrackTarget::Screen(host),
                TrackKind::Alpha {
                    from: 0.0,
                    to: DIM_ALPHA,
                },
                ease_out,
            ));
        }
        for kind in self.entrance(ctx) {
            ctx.add_track(Track::new(TrackTarget::Screen(ctx.to), kind, ease_out));
        }
    }

    fn dismiss(&mut self, ctx: &mut PhaseContext<'_>) {
        if let Some(host) = Self::host_of(ctx.stage, ctx.from) {
            ctx.add_track(Track::new(
                TrackTarget::Screen(host),
                TrackKind::Alpha {
                    from: DIM_ALPHA,
                    to: 0.0,
                },
                ease_in,
            ));
        }
        for kind in self.exit(ctx) {
            ctx.add_track(Track::new(TrackTarget::Screen(ctx.from), kind, ease_in));
        }
    }

    fn cleanup(&mut self, ctx: &mut PhaseContext<'_>, cancelled: bool) {
        for id in [ctx.from, ctx.to] {
            if let Some(surface) = ctx.stage.surface_mut(id) {
                surface.reset_transients();
                surface.alpha = 1.0;
                surface.hidden = false;
            }
        }
        // Forward landed or backward rewound: the popup is still up and
        // the backdrop keeps its dim.
        let (content, up) = match ctx.phase {
            TransitionPhase::Forward => (ctx.to, !cancelled),
            TransitionPhase::Backward => (ctx.from, cancelled),
        };
        if let Some(host) = Self::host_of(ctx.stage, content) {
            if let Some(surface) = ctx.stage.surface_mut(host) {
                surface.reset_transients();
                surface.hidden = false;
                surface.alpha = if up { DIM_ALPHA } else { 1.0 };
            }
        }
    }
}
