#![forbid(unsafe_code)]

//! Shared-element morph: paired frames fly between two screens on proxy
//! surfaces while the screens cross-fade underneath.
//!
//! The anchoring screen reports where its shared elements rest
//! ([`source_frames`]) and the presented screen reports where they land
//! ([`fixed_dest_frames`]). When either side reports nothing, or the
//! counts disagree, the morph degrades to a plain cross-fade.
//!
//! [`source_frames`]: switchback_stage::Screen::source_frames
//! [`fixed_dest_frames`]: switchback_stage::Screen::fixed_dest_frames

use kurbo::Rect;
use tracing::debug;

use switchback_stage::{ScreenId, Surface};

use crate::easing::{ease_in, ease_in_out, ease_out};
use crate::machine::{PhaseContext, TransitionAnimator};
use crate::track::{Track, TrackKind, TrackTarget};

#[derive(Debug, Clone, Copy, Default)]
pub struct AssociatedMorph;

impl AssociatedMorph {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn rests(ctx: &PhaseContext<'_>, id: ScreenId) -> Vec<Rect> {
        ctx.stage
            .screen(id)
            .map(|s| s.source_frames())
            .unwrap_or_default()
    }

    fn landings(ctx: &PhaseContext<'_>, id: ScreenId) -> Option<Vec<Rect>> {
        ctx.stage.screen(id).and_then(|s| s.fixed_dest_frames())
    }

    fn pairs(sources: Vec<Rect>, dests: Vec<Rect>) -> Option<Vec<(Rect, Rect)>> {
        if sources.is_empty() || sources.len() != dests.len() {
            return None;
        }
        Some(sources.into_iter().zip(dests).collect())
    }

    fn fly(ctx: &mut PhaseContext<'_>, pairs: Vec<(Rect, Rect)>) {
        for (source, dest) in pairs {
            let proxy = ctx.add_proxy(Surface::new(source));
            ctx.add_track(Track::new(
                proxy,
                TrackKind::Frame {
                    from: source,
                    to: dest,
                },
                ease_in_out,
            ));
        }
    }
}

impl TransitionAnimator for AssociatedMorph {
    fn present(&mut self, ctx: &mut PhaseContext<'_>) {
        let sources = Self::rests(ctx, ctx.from);
        let dests = Self::landings(ctx, ctx.to).unwrap_or_default();
        let fade_in = Track::new(
            TrackTarget::Screen(ctx.to),
            TrackKind::Alpha { from: 0.0, to: 1.0 },
            ease_in,
        );
        match Self::pairs(sources, dests) {
            Some(pairs) => {
                Self::fly(ctx, pairs);
                // Content appears once the elements are most of the way.
                ctx.add_track(fade_in.windowed(0.5, 1.0));
            }
            None => {
                debug!("no shared frames to morph, cross-fading instead");
                ctx.add_track(fade_in);
            }
        }
    }

    fn dismiss(&mut self, ctx: &mut PhaseContext<'_>) {
        let dests = Self::rests(ctx, ctx.to);
        let sources = Self::landings(ctx, ctx.from).unwrap_or_default();
        let fade_out = Track::new(
            TrackTarget::Screen(ctx.from),
            TrackKind::Alpha { from: 1.0, to: 0.0 },
            ease_out,
        );
        match Self::pairs(sources, dests) {
            Some(pairs) => {
                Self::fly(ctx, pairs);
                ctx.add_track(fade_out.windowed(0.0, 0.5));
            }
            None => {
                debug!("no shared frames to morph, cross-fading instead");
                ctx.add_track(fade_out);
            }
        }
    }
}
