#![forbid(unsafe_code)]

//! Pan gestures mapped to completion percent.

use kurbo::{Rect, Vec2};

/// Lifecycle of a pan gesture as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanPhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// One pan gesture sample: phase plus cumulative translation in stage
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pan {
    pub phase: PanPhase,
    pub translation: Vec2,
}

impl Pan {
    #[must_use]
    pub fn new(phase: PanPhase, translation: Vec2) -> Self {
        Self { phase, translation }
    }
}

/// Gesture travel direction that drives a backward phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl SwipeDirection {
    #[must_use]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftToRight | Self::RightToLeft)
    }

    /// Signed projection of a translation onto this direction. Travel
    /// against the direction is negative.
    #[must_use]
    pub fn raw_projection(self, translation: Vec2) -> f64 {
        match self {
            Self::LeftToRight => translation.x,
            Self::RightToLeft => -translation.x,
            Self::TopToBottom => translation.y,
            Self::BottomToTop => -translation.y,
        }
    }

    /// Projection with negative travel clamped to zero.
    #[must_use]
    pub fn project(self, translation: Vec2) -> f64 {
        self.raw_projection(translation).max(0.0)
    }

    /// The container extent that normalizes projections for this
    /// direction.
    #[must_use]
    pub fn reference_length(self, container: Rect) -> f64 {
        if self.is_horizontal() {
            container.width()
        } else {
            container.height()
        }
    }
}

/// Completion percent for a translation in `container`.
///
/// # Panics
///
/// The container must have extent along the swipe axis.
#[must_use]
pub fn percent_for(direction: SwipeDirection, translation: Vec2, container: Rect) -> f64 {
    let reference = direction.reference_length(container);
    assert!(
        reference > 0.0,
        "container has no extent along the swipe axis"
    );
    direction.project(translation) / reference
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: Rect = Rect::new(0.0, 0.0, 400.0, 800.0);

    #[test]
    fn projections_follow_their_axis() {
        let t = Vec2::new(100.0, -40.0);
        assert_eq!(SwipeDirection::LeftToRight.project(t), 100.0);
        assert_eq!(SwipeDirection::RightToLeft.project(t), 0.0);
        assert_eq!(SwipeDirection::TopToBottom.project(t), 0.0);
        assert_eq!(SwipeDirection::BottomToTop.project(t), 40.0);
    }

    #[test]
    fn raw_projection_keeps_the_sign() {
        let t = Vec2::new(-25.0, 0.0);
        assert_eq!(SwipeDirection::LeftToRight.raw_projection(t), -25.0);
        assert_eq!(SwipeDirection::RightToLeft.raw_projection(t), 25.0);
    }

    #[test]
    fn percent_normalizes_by_the_axis_extent() {
        let percent = percent_for(
            SwipeDirection::LeftToRight,
            Vec2::new(100.0, 0.0),
            CONTAINER,
        );
        assert!((percent - 0.25).abs() < 1e-12);
        let vertical = percent_for(
            SwipeDirection::TopToBottom,
            Vec2::new(0.0, 200.0),
            CONTAINER,
        );
        assert!((vertical - 0.25).abs() < 1e-12);
    }

    #[test]
    fn negative_travel_reads_as_zero_percent() {
        let percent = percent_for(
            SwipeDirection::LeftToRight,
            Vec2::new(-300.0, 0.0),
            CONTAINER,
        );
        assert_eq!(percent, 0.0);
    }

    #[test]
    #[should_panic(expected = "no extent")]
    fn zero_extent_containers_are_rejected() {
        let _ = percent_for(
            SwipeDirection::LeftToRight,
            Vec2::new(10.0, 0.0),
            Rect::new(0.0, 0.0, 0.0, 800.0),
        );
    }
}
