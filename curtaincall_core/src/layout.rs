// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pure positioning math for the floating buttons.
//!
//! Floating buttons are anchored at the center of their container. Their
//! placement is an offset from that anchor, so every function here maps
//! `(offset, sizes, rects)` to a new offset and touches no state.

use kurbo::{Rect, Size, Vec2};

use crate::error::GeometryError;

/// A layout snapshot taken by the backend when an interaction happens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// The button panel's bounding box in viewport coordinates, if it has one.
    pub container: Option<Rect>,
    /// Viewport size in CSS pixels.
    pub viewport: Size,
    /// Layout size of the floating button being positioned (may be zero
    /// before first layout).
    pub button: Size,
    /// The original "Yes" button's bounding box, if it has one.
    pub yes_button: Option<Rect>,
}

impl Geometry {
    /// The container rect, or [`GeometryError::ContainerMissing`].
    pub fn container(&self) -> Result<Rect, GeometryError> {
        match self.container {
            Some(rect) if rect.width() > 0.0 || rect.height() > 0.0 => Ok(rect),
            _ => Err(GeometryError::ContainerMissing),
        }
    }

    /// The button size, substituting `fallback` for an unlaid-out axis.
    #[must_use]
    pub fn button_or(&self, fallback: f64) -> Size {
        let w = if self.button.width > 0.0 {
            self.button.width
        } else {
            fallback
        };
        let h = if self.button.height > 0.0 {
            self.button.height
        } else {
            fallback
        };
        Size::new(w, h)
    }
}

/// Clamps an anchor-relative offset so the button stays inside the safe
/// rectangle of the viewport.
///
/// The safe rectangle keeps the button's center at least half its size plus
/// `margin` away from every viewport edge. When the viewport is too small to
/// have a safe rectangle the lower bound wins, keeping the button's top-left
/// corner on screen.
#[must_use]
pub fn clamp_offset(
    desired: Vec2,
    button: Size,
    container: Rect,
    viewport: Size,
    margin: f64,
) -> Vec2 {
    let anchor = container.center();
    let absolute = anchor + desired;

    let min_x = button.width / 2.0 + margin;
    let max_x = viewport.width - button.width / 2.0 - margin;
    let min_y = button.height / 2.0 + margin;
    let max_y = viewport.height - button.height / 2.0 - margin;

    let x = absolute.x.min(max_x).max(min_x);
    let y = absolute.y.min(max_y).max(min_y);

    Vec2::new(x - anchor.x, y - anchor.y)
}

/// The vertical offset that puts the converted "Yes" button level with the
/// original "Yes" button.
///
/// Both buttons share the panel as container; the offset is measured from
/// the panel's vertical center, where floating buttons are anchored.
#[must_use]
pub fn converted_yes_offset(original_yes: Rect, container: Rect, button_height: f64) -> Vec2 {
    let target_y = original_yes.y0 - container.y0;
    let center_y = container.height() / 2.0 - button_height / 2.0;
    Vec2::new(0.0, target_y - center_y)
}

/// One evasive step: `distance` along `angle` (radians) from `current`.
#[must_use]
pub fn step_offset(current: Vec2, angle: f64, distance: f64) -> Vec2 {
    current + Vec2::from_angle(angle) * distance
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARGIN: f64 = 20.0;

    fn assert_in_safe_rect(offset: Vec2, button: Size, container: Rect, viewport: Size) {
        let p = container.center() + offset;
        let (hw, hh) = (button.width / 2.0, button.height / 2.0);
        assert!(
            p.x >= hw + MARGIN - 1e-9 && p.x <= viewport.width - hw - MARGIN + 1e-9,
            "x {} outside safe range for viewport {}",
            p.x,
            viewport.width
        );
        assert!(
            p.y >= hh + MARGIN - 1e-9 && p.y <= viewport.height - hh - MARGIN + 1e-9,
            "y {} outside safe range for viewport {}",
            p.y,
            viewport.height
        );
    }

    #[test]
    fn offsets_inside_safe_rect_are_unchanged() {
        let container = Rect::new(100.0, 300.0, 500.0, 400.0);
        let viewport = Size::new(800.0, 600.0);
        let button = Size::new(90.0, 90.0);
        let desired = Vec2::new(50.0, -40.0);
        let out = clamp_offset(desired, button, container, viewport, MARGIN);
        assert_eq!(out, desired, "already safe");
    }

    #[test]
    fn far_offsets_land_inside_safe_rect() {
        let container = Rect::new(100.0, 300.0, 500.0, 400.0);
        let viewport = Size::new(800.0, 600.0);
        let button = Size::new(90.0, 60.0);
        let extremes = [
            Vec2::new(1e9, 1e9),
            Vec2::new(-1e9, 1e9),
            Vec2::new(1e9, -1e9),
            Vec2::new(-1e9, -1e9),
            Vec2::new(0.0, 5_000.0),
            Vec2::new(-3_000.0, 0.0),
        ];
        for desired in extremes {
            let out = clamp_offset(desired, button, container, viewport, MARGIN);
            assert_in_safe_rect(out, button, container, viewport);
        }
    }

    #[test]
    fn clamped_to_exact_edges() {
        let container = Rect::new(0.0, 0.0, 400.0, 200.0);
        let viewport = Size::new(400.0, 800.0);
        let button = Size::new(100.0, 100.0);
        let out = clamp_offset(
            Vec2::new(10_000.0, -10_000.0),
            button,
            container,
            viewport,
            MARGIN,
        );
        let p = container.center() + out;
        assert_eq!(p.x, 400.0 - 50.0 - MARGIN, "right edge");
        assert_eq!(p.y, 50.0 + MARGIN, "top edge");
    }

    #[test]
    fn repeated_steps_never_escape() {
        let container = Rect::new(40.0, 200.0, 340.0, 320.0);
        let viewport = Size::new(380.0, 640.0);
        let button = Size::new(90.0, 90.0);
        let mut offset = Vec2::ZERO;
        for i in 0_u32..200 {
            let angle = f64::from(i) * 0.7;
            offset = clamp_offset(
                step_offset(offset, angle, 150.0),
                button,
                container,
                viewport,
                MARGIN,
            );
            assert_in_safe_rect(offset, button, container, viewport);
        }
    }

    #[test]
    fn step_moves_fixed_distance() {
        let out = step_offset(Vec2::new(10.0, 10.0), 0.0, 150.0);
        assert!((out.x - 160.0).abs() < 1e-9, "x along angle 0");
        assert!((out.y - 10.0).abs() < 1e-9, "y unchanged");
        let moved = step_offset(Vec2::ZERO, 1.234, 150.0);
        assert!((moved.hypot() - 150.0).abs() < 1e-9, "fixed distance");
    }

    #[test]
    fn converted_yes_aligns_with_original() {
        let container = Rect::new(0.0, 400.0, 300.0, 500.0);
        let yes = Rect::new(20.0, 410.0, 110.0, 500.0);
        let offset = converted_yes_offset(yes, container, 90.0);
        // target 10 from the top, center line at 50 - 45 = 5.
        assert_eq!(offset, Vec2::new(0.0, 5.0), "vertical only");
    }

    #[test]
    fn missing_container_is_an_error() {
        let geometry = Geometry {
            container: None,
            viewport: Size::new(800.0, 600.0),
            button: Size::ZERO,
            yes_button: None,
        };
        assert_eq!(
            geometry.container(),
            Err(GeometryError::ContainerMissing),
            "detached"
        );
        let collapsed = Geometry {
            container: Some(Rect::ZERO),
            ..geometry
        };
        assert_eq!(
            collapsed.container(),
            Err(GeometryError::ContainerMissing),
            "zero-size box"
        );
        assert_eq!(
            geometry.button_or(90.0),
            Size::new(90.0, 90.0),
            "fallback size"
        );
    }
}
