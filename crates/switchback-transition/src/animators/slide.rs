#![forbid(unsafe_code)]

//! The platform slide: incoming screen slides in from one edge while the
//! covered screen yields underneath.

use crate::easing::ease_in_out;
use crate::machine::{PhaseContext, TransitionAnimator};
use crate::track::{Track, TrackKind, TrackTarget};

use kurbo::Vec2;

/// Edge the incoming screen enters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideAxis {
    /// Enters from the trailing edge, exits the same way. Push/pop.
    Horizontal,
    /// Enters from the bottom edge. Present/dismiss.
    Vertical,
}

/// What the covered screen does while something slides over it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoveredStyle {
    /// Stays put.
    Hold,
    /// Shifts by this fraction of the container extent along the axis.
    /// Negative shifts against the entrance direction.
    Translate(f64),
    /// Settles at this uniform scale.
    Zoom(f64),
}

/// Stock push/present choreography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSlide {
    axis: SlideAxis,
    covered: CoveredStyle,
}

impl SystemSlide {
    /// Navigation push: enter from the trailing edge, covered screen
    /// parallaxes away by 0.28 of the width.
    #[must_use]
    pub fn horizontal() -> Self {
        Self {
            axis: SlideAxis::Horizontal,
            covered: CoveredStyle::Translate(-0.28),
        }
    }

    /// Modal present: enter from the bottom, covered screen holds.
    #[must_use]
    pub fn vertical() -> Self {
        Self {
            axis: SlideAxis::Vertical,
            covered: CoveredStyle::Hold,
        }
    }

    /// Sheet present: enter from the bottom, covered screen recedes.
    #[must_use]
    pub fn sheet() -> Self {
        Self {
            axis: SlideAxis::Vertical,
            covered: CoveredStyle::Zoom(0.92),
        }
    }

    #[must_use]
    pub fn with_covered(mut self, covered: CoveredStyle) -> Self {
        self.covered = covered;
        self
    }

    fn extent(&self, ctx: &PhaseContext<'_>) -> f64 {
        match self.axis {
            SlideAxis::Horizontal => ctx.container.width(),
            SlideAxis::Vertical => ctx.container.height(),
        }
    }

    fn slide_kind(&self, from: f64, to: f64) -> TrackKind {
        match self.axis {
            SlideAxis::Horizontal => TrackKind::TranslationX { from, to },
            SlideAxis::Vertical => TrackKind::TranslationY { from, to },
        }
    }

    fn covered_kind(&self, extent: f64, entering: bool) -> Option<TrackKind> {
        match self.covered {
            CoveredStyle::Hold => None,
            CoveredStyle::Translate(fraction) => {
                let shifted = fraction * extent;
                let (from, to) = if entering { (0.0, shifted) } else { (shifted, 0.0) };
                Some(self.slide_kind(from, to))
            }
            CoveredStyle::Zoom(scale) => {
                let rest = Vec2::new(1.0, 1.0);
                let shrunk = Vec2::new(scale, scale);
                let (from, to) = if entering { (rest, shrunk) } else { (shrunk, rest) };
                Some(TrackKind::Scale { from, to })
            }
        }
    }
}

impl TransitionAnimator for SystemSlide {
    fn present(&mut self, ctx: &mut PhaseContext<'_>) {
        let extent = self.extent(ctx);
        ctx.add_track(Track::new(
            TrackTarget::Screen(ctx.to),
            self.slide_kind(extent, 0.0),
            ease_in_out,
        ));
        if let Some(kind) = self.covered_kind(extent, true) {
            ctx.add_track(Track::new(TrackTarget::Screen(ctx.from), kind, ease_in_out));
        }
    }

    fn dismiss(&mut self, ctx: &mut PhaseContext<'_>) {
        let extent = self.extent(ctx);
        ctx.add_track(Track::new(
            TrackTarget::Screen(ctx.from),
            self.slide_kind(0.0, extent),
            ease_in_out,
        ));
        if let Some(kind) = self.covered_kind(extent, false) {
            ctx.add_track(Track::new(TrackTarget::Screen(ctx.to), kind, ease_in_out));
        }
    }
}
