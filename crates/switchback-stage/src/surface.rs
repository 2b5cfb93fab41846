#![forbid(unsafe_code)]

//! Per-screen geometry that transitions animate.

use kurbo::{Circle, Point, Rect, Size, Vec2};

/// The animatable state of one mounted screen.
///
/// `frame` is the laid-out rectangle in stage coordinates; everything else
/// is transient transition state layered on top of it. A surface at rest
/// has identity transform, full alpha, and no mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub frame: Rect,
    /// Offset in points, applied to the frame's center.
    pub translation: Vec2,
    /// Scale about the frame's center.
    pub scale: Vec2,
    pub alpha: f64,
    /// Page-flip rotation about the vertical axis, radians.
    pub rotation_y: f64,
    pub hidden: bool,
    /// Circular reveal mask, stage coordinates. `None` means unmasked.
    pub mask: Option<Circle>,
}

impl Surface {
    #[must_use]
    pub fn new(frame: Rect) -> Self {
        Self {
            frame,
            translation: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            alpha: 1.0,
            rotation_y: 0.0,
            hidden: false,
            mask: None,
        }
    }

    /// Drop transform and mask state, keeping frame, alpha, and visibility.
    pub fn reset_transients(&mut self) {
        self.translation = Vec2::ZERO;
        self.scale = Vec2::new(1.0, 1.0);
        self.rotation_y = 0.0;
        self.mask = None;
    }

    /// True at identity transform, full alpha, unmasked, visible.
    #[must_use]
    pub fn at_rest(&self) -> bool {
        self.translation == Vec2::ZERO
            && self.scale == Vec2::new(1.0, 1.0)
            && self.rotation_y == 0.0
            && self.alpha == 1.0
            && !self.hidden
            && self.mask.is_none()
    }

    /// The frame after translation and scale, in stage coordinates.
    #[must_use]
    pub fn visible_frame(&self) -> Rect {
        let center: Point = self.frame.center() + self.translation;
        let size = Size::new(
            self.frame.width() * self.scale.x,
            self.frame.height() * self.scale.y,
        );
        Rect::from_center_size(center, size)
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(Rect::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_is_at_rest() {
        let s = Surface::new(Rect::new(0.0, 0.0, 100.0, 200.0));
        assert!(s.at_rest());
        assert_eq!(s.visible_frame(), s.frame);
    }

    #[test]
    fn translation_moves_the_visible_frame() {
        let mut s = Surface::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        s.translation = Vec2::new(50.0, 0.0);
        let moved = s.visible_frame();
        assert_eq!(moved.center().x, 100.0);
        assert_eq!(moved.width(), 100.0);
    }

    #[test]
    fn scale_is_about_the_center() {
        let mut s = Surface::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        s.scale = Vec2::new(0.5, 0.5);
        let shrunk = s.visible_frame();
        assert_eq!(shrunk.center(), Point::new(50.0, 50.0));
        assert_eq!(shrunk.width(), 50.0);
    }

    #[test]
    fn reset_transients_keeps_alpha_and_visibility() {
        let mut s = Surface::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        s.translation = Vec2::new(5.0, 5.0);
        s.rotation_y = 1.0;
        s.mask = Some(Circle::new((5.0, 5.0), 1.0));
        s.alpha = 0.4;
        s.hidden = true;
        s.reset_transients();
        assert_eq!(s.translation, Vec2::ZERO);
        assert_eq!(s.rotation_y, 0.0);
        assert!(s.mask.is_none());
        assert_eq!(s.alpha, 0.4);
        assert!(s.hidden);
    }
}
