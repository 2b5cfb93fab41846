#![forbid(unsafe_code)]

//! Circular reveal: the incoming screen grows out of a ring seeded by the
//! outgoing screen's tap frame and swallows the container.

use kurbo::{Circle, Point, Rect};
use tracing::debug;

use switchback_stage::ScreenId;

use crate::easing::{ease_in, ease_out};
use crate::machine::{PhaseContext, TransitionAnimator};
use crate::track::{Track, TrackKind, TrackTarget};

#[derive(Debug, Clone, Copy, Default)]
pub struct RingReveal;

impl RingReveal {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Ring inscribed in the first reported frame. `None` means the
    /// seeding screen offers nothing to grow out of and the phase
    /// completes outright.
    fn seed(ctx: &PhaseContext<'_>, reporter: ScreenId) -> Option<Circle> {
        let frames = ctx
            .stage
            .screen(reporter)
            .map(|s| s.source_frames())
            .unwrap_or_default();
        frames.first().map(|frame| {
            let radius = frame.width().min(frame.height()) / 2.0;
            Circle::new(frame.center(), radius)
        })
    }

    fn cover(container: Rect, center: Point) -> Circle {
        let corners = [
            Point::new(container.x0, container.y0),
            Point::new(container.x1, container.y0),
            Point::new(container.x0, container.y1),
            Point::new(container.x1, container.y1),
        ];
        let radius = corners
            .iter()
            .map(|corner| center.distance(*corner))
            .fold(0.0_f64, f64::max);
        Circle::new(center, radius)
    }
}

impl TransitionAnimator for RingReveal {
    fn present(&mut self, ctx: &mut PhaseContext<'_>) {
        let Some(seed) = Self::seed(ctx, ctx.from) else {
            debug!("no seed frame for the ring, completing outright");
            ctx.complete_now();
            return;
        };
        let cover = Self::cover(ctx.container, seed.center);
        ctx.add_track(Track::new(
            TrackTarget::Screen(ctx.to),
            TrackKind::Mask {
                from: seed,
                to: cover,
            },
            ease_out,
        ));
    }

    fn dismiss(&mut self, ctx: &mut PhaseContext<'_>) {
        // The revealed screen reported the seed on the way in; shrink back
        // onto it.
        let Some(seed) = Self::seed(ctx, ctx.to) else {
            debug!("no seed frame for the ring, completing outright");
            ctx.complete_now();
            return;
        };
        let cover = Self::cover(ctx.container, seed.center);
        ctx.add_track(Track::new(
            TrackTarget::Screen(ctx.from),
            TrackKind::Mask {
                from: cover,
                to: seed,
            },
            ease_in,
        ));
    }
}
