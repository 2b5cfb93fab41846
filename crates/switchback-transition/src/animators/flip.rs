#![forbid(unsafe_code)]

//! Two-half flip around the vertical axis: the outgoing screen rotates
//! edge-on, then the incoming screen rotates out of the edge. Exactly one
//! side is visible at any point.

use std::f64::consts::FRAC_PI_2;

use crate::easing::{ease_in, ease_out};
use crate::machine::{PhaseContext, TransitionAnimator};
use crate::track::{Track, TrackKind, TrackTarget};

#[derive(Debug, Clone, Copy, Default)]
pub struct FlipOver;

impl FlipOver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn halves(ctx: &mut PhaseContext<'_>, leaving: TrackTarget, arriving: TrackTarget, sign: f64) {
        ctx.add_track(
            Track::new(
                leaving,
                TrackKind::RotationY {
                    from: 0.0,
                    to: sign * FRAC_PI_2,
                },
                ease_in,
            )
            .windowed(0.0, 0.5),
        );
        ctx.add_track(Track::new(
            leaving,
            TrackKind::Hidden {
                at: 0.5,
                before: false,
                after: true,
            },
            ease_in,
        ));
        ctx.add_track(Track::new(
            arriving,
            TrackKind::Hidden {
                at: 0.5,
                before: true,
                after: false,
            },
            ease_out,
        ));
        ctx.add_track(
            Track::new(
                arriving,
                TrackKind::RotationY {
                    from: -sign * FRAC_PI_2,
                    to: 0.0,
                },
                ease_out,
            )
            .windowed(0.5, 1.0),
        );
    }
}

impl TransitionAnimator for FlipOver {
    fn present(&mut self, ctx: &mut PhaseContext<'_>) {
        let (from, to) = (TrackTarget::Screen(ctx.from), TrackTarget::Screen(ctx.to));
        Self::halves(ctx, from, to, -1.0);
    }

    fn dismiss(&mut self, ctx: &mut PhaseContext<'_>) {
        let (from, to) = (TrackTarget::Screen(ctx.from), TrackTarget::Screen(ctx.to));
        Self::halves(ctx, from, to, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Transition, TransitionPhase};
    use kurbo::Rect;
    use switchback_stage::{ShellScreen, Stage};

    #[test]
    fn exactly_one_side_shows_per_half() {
        let mut stage = Stage::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let a = stage.insert(Box::new(ShellScreen));
        let b = stage.insert(Box::new(ShellScreen));
        let mut t = Transition::new(FlipOver::new()).with_duration(1.0);
        let mut run = t.begin(&mut stage, TransitionPhase::Forward, a, b, 0.0, false);

        let _ = run.advance(&mut stage, 0.25);
        assert!(!stage.surface(a).unwrap().hidden);
        assert!(stage.surface(b).unwrap().hidden);
        assert!(stage.surface(a).unwrap().rotation_y < 0.0, "outgoing folds toward -pi/2");

        let _ = run.advance(&mut stage, 0.75);
        assert!(stage.surface(a).unwrap().hidden);
        assert!(!stage.surface(b).unwrap().hidden);
        assert!(stage.surface(b).unwrap().rotation_y > 0.0, "incoming unfolds from +pi/2");

        let _ = run.advance(&mut stage, 1.0);
        assert_eq!(stage.surface(b).unwrap().rotation_y, 0.0);
    }
}
