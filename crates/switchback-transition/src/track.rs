#![forbid(unsafe_code)]

//! Eased property tracks.
//!
//! A track drives one surface property from one value to another across a
//! window of run progress. Animators emit tracks; the run samples them.
//! Progress outside the window clamps to the window's ends, so tracks hold
//! their boundary values before and after their window.

use kurbo::{Circle, Rect, Vec2};

use switchback_stage::{ScreenId, Surface};

use crate::easing::EasingFn;

/// What a track animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTarget {
    /// A mounted screen's surface.
    Screen(ScreenId),
    /// A transient proxy surface owned by the run.
    Proxy(usize),
}

/// The property a track drives, with typed endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackKind {
    Alpha { from: f64, to: f64 },
    TranslationX { from: f64, to: f64 },
    TranslationY { from: f64, to: f64 },
    Scale { from: Vec2, to: Vec2 },
    RotationY { from: f64, to: f64 },
    Frame { from: Rect, to: Rect },
    Mask { from: Circle, to: Circle },
    /// Visibility flips at a point in the window instead of lerping.
    Hidden { at: f64, before: bool, after: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub target: TrackTarget,
    pub kind: TrackKind,
    pub easing: EasingFn,
    /// The sub-interval of run progress this track occupies.
    pub window: (f64, f64),
}

impl Track {
    #[must_use]
    pub fn new(target: TrackTarget, kind: TrackKind, easing: EasingFn) -> Self {
        Self {
            target,
            kind,
            easing,
            window: (0.0, 1.0),
        }
    }

    #[must_use]
    pub fn windowed(mut self, start: f64, end: f64) -> Self {
        self.window = (start, end);
        self
    }

    /// Sample at `progress` (whole-run fraction) into `surface`.
    pub fn apply(&self, progress: f64, surface: &mut Surface) {
        let (start, end) = self.window;
        let span = (end - start).max(f64::EPSILON);
        let local = ((progress - start) / span).clamp(0.0, 1.0);
        let t = (self.easing)(local);
        match &self.kind {
            TrackKind::Alpha { from, to } => surface.alpha = lerp(*from, *to, t),
            TrackKind::TranslationX { from, to } => {
                surface.translation.x = lerp(*from, *to, t);
            }
            TrackKind::TranslationY { from, to } => {
                surface.translation.y = lerp(*from, *to, t);
            }
            TrackKind::Scale { from, to } => {
                surface.scale = Vec2::new(lerp(from.x, to.x, t), lerp(from.y, to.y, t));
            }
            TrackKind::RotationY { from, to } => {
                surface.rotation_y = lerp(*from, *to, t);
            }
            TrackKind::Frame { from, to } => surface.frame = lerp_rect(*from, *to, t),
            TrackKind::Mask { from, to } => surface.mask = Some(lerp_circle(*from, *to, t)),
            TrackKind::Hidden { at, before, after } => {
                surface.hidden = if local < *at { *before } else { *after };
            }
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_rect(a: Rect, b: Rect, t: f64) -> Rect {
    Rect::new(
        lerp(a.x0, b.x0, t),
        lerp(a.y0, b.y0, t),
        lerp(a.x1, b.x1, t),
        lerp(a.y1, b.y1, t),
    )
}

fn lerp_circle(a: Circle, b: Circle, t: f64) -> Circle {
    Circle::new(a.center.lerp(b.center, t), lerp(a.radius, b.radius, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::linear;

    fn surface() -> Surface {
        Surface::new(Rect::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn alpha_lerps_across_full_window() {
        let track = Track::new(
            TrackTarget::Proxy(0),
            TrackKind::Alpha { from: 0.0, to: 1.0 },
            linear,
        );
        let mut s = surface();
        track.apply(0.25, &mut s);
        assert!((s.alpha - 0.25).abs() < 1e-12);
        track.apply(2.0, &mut s);
        assert_eq!(s.alpha, 1.0);
    }

    #[test]
    fn windowed_track_clamps_outside_its_window() {
        let track = Track::new(
            TrackTarget::Proxy(0),
            TrackKind::TranslationX {
                from: 100.0,
                to: 0.0,
            },
            linear,
        )
        .windowed(0.5, 1.0);
        let mut s = surface();
        track.apply(0.2, &mut s);
        assert_eq!(s.translation.x, 100.0, "holds start before window");
        track.apply(0.75, &mut s);
        assert_eq!(s.translation.x, 50.0);
        track.apply(1.0, &mut s);
        assert_eq!(s.translation.x, 0.0);
    }

    #[test]
    fn hidden_flips_at_the_threshold() {
        let track = Track::new(
            TrackTarget::Proxy(0),
            TrackKind::Hidden {
                at: 1.0,
                before: true,
                after: false,
            },
            linear,
        )
        .windowed(0.0, 0.5);
        let mut s = surface();
        track.apply(0.2, &mut s);
        assert!(s.hidden);
        track.apply(0.5, &mut s);
        assert!(!s.hidden, "visible once the window completes");
        track.apply(0.9, &mut s);
        assert!(!s.hidden);
    }

    #[test]
    fn frame_and_mask_lerp_componentwise() {
        let frame = Track::new(
            TrackTarget::Proxy(0),
            TrackKind::Frame {
                from: Rect::new(0.0, 0.0, 10.0, 10.0),
                to: Rect::new(100.0, 100.0, 120.0, 120.0),
            },
            linear,
        );
        let mut s = surface();
        frame.apply(0.5, &mut s);
        assert_eq!(s.frame, Rect::new(50.0, 50.0, 65.0, 65.0));

        let mask = Track::new(
            TrackTarget::Proxy(0),
            TrackKind::Mask {
                from: Circle::new((0.0, 0.0), 1.0),
                to: Circle::new((10.0, 0.0), 5.0),
            },
            linear,
        );
        mask.apply(0.5, &mut s);
        let circle = s.mask.expect("mask set");
        assert_eq!(circle.center.x, 5.0);
        assert_eq!(circle.radius, 3.0);
    }
}
