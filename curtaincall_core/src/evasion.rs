// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The evasive "No" button.
//!
//! One handler serves every interaction, keyed by the current
//! [`EvasionState`]:
//!
//! ```text
//!   Static ──first hover/touch──► Dynamic ──move #threshold──► Converted
//! ```
//!
//! The first interaction hides the static button and spawns a floating one
//! at the center of the button panel. Every interaction, the first included,
//! counts one move and plays the "No" cue. Below the threshold the floating
//! button steps a fixed distance in the caller-supplied direction and is
//! clamped into the viewport's safe rectangle. At the threshold it is
//! replaced by a "Yes" button aligned with the original one.
//!
//! The direction is an input so the state machine stays deterministic; the
//! web backend draws it uniformly from `[0, 2π)`.

use kurbo::Vec2;

use crate::config::PresentationConfig;
use crate::layout::{Geometry, clamp_offset, converted_yes_offset, step_offset};
use crate::media::{Channel, MediaElement, MediaSet};
use crate::stage::{ButtonId, ButtonPlacement, Stage};
use crate::trace::{EvasionAction, EvasionEvent, Tracer};

/// Which button variant is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvasionState {
    /// The original button in the panel's flow layout.
    Static,
    /// A free-floating replacement that moves away.
    Dynamic,
    /// Replaced by a "Yes" button. Terminal.
    Converted,
}

/// Counters and offset of the evasive button.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButtonEvasionState {
    /// Interactions so far; strictly increasing until conversion.
    pub move_count: u32,
    /// Offset of the floating button from the panel center.
    pub offset: Vec2,
    /// Set once, at the threshold.
    pub converted: bool,
}

/// The "No" button state machine.
#[derive(Clone, Debug)]
pub struct EvasiveButton {
    state: EvasionState,
    evasion: ButtonEvasionState,
    threshold: u32,
    step: f64,
    margin: f64,
    fallback_size: f64,
    converted_offset: Vec2,
    converted_scale: f64,
}

impl EvasiveButton {
    /// Creates a button in the static state.
    #[must_use]
    pub fn new(config: &PresentationConfig) -> Self {
        Self {
            state: EvasionState::Static,
            evasion: ButtonEvasionState {
                move_count: 0,
                offset: Vec2::ZERO,
                converted: false,
            },
            threshold: config.move_threshold,
            step: config.step_distance,
            margin: config.edge_margin,
            fallback_size: config.fallback_button_size,
            converted_offset: Vec2::ZERO,
            converted_scale: 1.0,
        }
    }

    /// Handles a hover or touch on whichever "No" button is live.
    ///
    /// `angle` is the step direction in radians. Without a container the
    /// interaction is skipped and nothing changes.
    pub fn on_interaction<M: MediaElement, S: Stage>(
        &mut self,
        angle: f64,
        geometry: &Geometry,
        media: &mut MediaSet<M>,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> EvasionAction {
        if self.state == EvasionState::Converted {
            return EvasionAction::Converted;
        }
        let Ok(container) = geometry.container() else {
            return self.emit(EvasionAction::GeometryUnavailable, tracer);
        };

        if self.state == EvasionState::Static {
            self.state = EvasionState::Dynamic;
            stage.set_button_visible(ButtonId::StaticNo, false);
            stage.spawn_button(ButtonId::DynamicNo);
            stage.place_button(ButtonId::DynamicNo, ButtonPlacement::ANCHORED);
            self.emit(EvasionAction::Spawned, tracer);
        }

        self.evasion.move_count += 1;
        media.play_cue(Channel::NoCue);

        if self.evasion.move_count >= self.threshold {
            self.state = EvasionState::Converted;
            self.evasion.converted = true;
            stage.set_button_visible(ButtonId::DynamicNo, false);
            stage.spawn_button(ButtonId::ConvertedYes);
            // `geometry` measured the "No"; the new button has its own size.
            self.align_converted(&stage.geometry(ButtonId::ConvertedYes));
            stage.place_button(ButtonId::ConvertedYes, self.converted_placement());
            return self.emit(EvasionAction::Converted, tracer);
        }

        let button = geometry.button_or(self.fallback_size);
        let desired = step_offset(self.evasion.offset, angle, self.step);
        self.evasion.offset =
            clamp_offset(desired, button, container, geometry.viewport, self.margin);
        stage.place_button(ButtonId::DynamicNo, ButtonPlacement::at(self.evasion.offset));
        self.emit(EvasionAction::Moved, tracer)
    }

    /// Re-clamps the floating "No" or re-aligns the converted "Yes".
    pub fn on_layout_change<S: Stage>(
        &mut self,
        geometry: &Geometry,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> Option<EvasionAction> {
        if self.state == EvasionState::Static {
            return None;
        }
        let Ok(container) = geometry.container() else {
            return Some(self.emit(EvasionAction::GeometryUnavailable, tracer));
        };
        match self.state {
            EvasionState::Dynamic => {
                let button = geometry.button_or(self.fallback_size);
                self.evasion.offset = clamp_offset(
                    self.evasion.offset,
                    button,
                    container,
                    geometry.viewport,
                    self.margin,
                );
                stage.place_button(ButtonId::DynamicNo, ButtonPlacement::at(self.evasion.offset));
            }
            EvasionState::Converted => {
                self.align_converted(geometry);
                stage.place_button(ButtonId::ConvertedYes, self.converted_placement());
            }
            EvasionState::Static => {}
        }
        Some(self.emit(EvasionAction::Repositioned, tracer))
    }

    /// Grows the converted "Yes" in place, keeping its alignment.
    pub fn scale_converted<S: Stage>(&mut self, scale: f64, stage: &mut S) {
        if self.state != EvasionState::Converted {
            return;
        }
        self.converted_scale = scale;
        stage.place_button(ButtonId::ConvertedYes, self.converted_placement());
    }

    fn align_converted(&mut self, geometry: &Geometry) {
        // A missing original "Yes" leaves the converted one centered.
        if let (Ok(container), Some(yes)) = (geometry.container(), geometry.yes_button) {
            let height = geometry.button_or(self.fallback_size).height;
            self.converted_offset = converted_yes_offset(yes, container, height);
        }
    }

    fn converted_placement(&self) -> ButtonPlacement {
        ButtonPlacement {
            offset: self.converted_offset,
            scale: self.converted_scale,
        }
    }

    fn emit(&self, action: EvasionAction, tracer: &mut Tracer<'_>) -> EvasionAction {
        let offset = match self.state {
            EvasionState::Converted => self.converted_offset,
            _ => self.evasion.offset,
        };
        tracer.evasion(&EvasionEvent {
            move_count: self.evasion.move_count,
            action,
            offset,
        });
        action
    }

    /// The live variant.
    #[must_use]
    pub const fn state(&self) -> EvasionState {
        self.state
    }

    /// Counters and offset.
    #[must_use]
    pub const fn evasion(&self) -> &ButtonEvasionState {
        &self.evasion
    }

    /// The floating button whose size matters for the next placement.
    #[must_use]
    pub const fn floating(&self) -> ButtonId {
        match self.state {
            EvasionState::Static | EvasionState::Dynamic => ButtonId::DynamicNo,
            EvasionState::Converted => ButtonId::ConvertedYes,
        }
    }

    /// Offset of the converted "Yes" from the panel center.
    #[must_use]
    pub const fn converted_offset(&self) -> Vec2 {
        self.converted_offset
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size};

    use super::*;
    use crate::testing::{RecordingStage, fake_media_set};

    fn geometry() -> Geometry {
        Geometry {
            container: Some(Rect::new(0.0, 400.0, 300.0, 500.0)),
            viewport: Size::new(300.0, 700.0),
            button: Size::new(90.0, 90.0),
            yes_button: Some(Rect::new(20.0, 410.0, 110.0, 500.0)),
        }
    }

    fn button() -> EvasiveButton {
        EvasiveButton::new(&PresentationConfig::canonical())
    }

    fn stage() -> RecordingStage {
        RecordingStage {
            layout: Some(geometry()),
            ..RecordingStage::default()
        }
    }

    #[test]
    fn first_interaction_spawns_dynamic_button() {
        let mut media = fake_media_set();
        let mut stage = RecordingStage::default();
        let mut b = button();
        let action = b.on_interaction(0.0, &geometry(), &mut media, &mut stage, &mut Tracer::none());
        assert_eq!(action, EvasionAction::Moved, "first interaction also moves");
        assert_eq!(b.state(), EvasionState::Dynamic, "dynamic");
        assert_eq!(stage.button_visible(ButtonId::StaticNo), Some(false), "static hidden");
        assert_eq!(stage.spawn_count(ButtonId::DynamicNo), 1, "spawned once");
        assert_eq!(b.evasion().move_count, 1, "counted");
        assert_eq!(media.no_cue.play_requests, 1, "cue played");

        b.on_interaction(1.0, &geometry(), &mut media, &mut stage, &mut Tracer::none());
        assert_eq!(stage.spawn_count(ButtonId::DynamicNo), 1, "not respawned");
        assert_eq!(media.no_cue.play_requests, 2, "cue per interaction");
    }

    #[test]
    fn moves_stay_in_safe_rect() {
        let mut media = fake_media_set();
        let mut stage = RecordingStage::default();
        let mut b = button();
        let g = geometry();
        let container = g.container.unwrap_or(Rect::ZERO);
        for i in 0_u32..19 {
            b.on_interaction(f64::from(i) * 2.1, &g, &mut media, &mut stage, &mut Tracer::none());
            let p = container.center() + b.evasion().offset;
            assert!(p.x >= 65.0 && p.x <= 235.0, "x {} in safe range", p.x);
            assert!(p.y >= 65.0 && p.y <= 635.0, "y {} in safe range", p.y);
            assert_eq!(
                stage.placement(ButtonId::DynamicNo),
                Some(ButtonPlacement::at(b.evasion().offset)),
                "placement follows offset"
            );
        }
    }

    #[test]
    fn converts_exactly_at_threshold() {
        let mut media = fake_media_set();
        let mut stage = stage();
        let mut b = button();
        let g = geometry();
        for _ in 0..19 {
            b.on_interaction(0.5, &g, &mut media, &mut stage, &mut Tracer::none());
        }
        assert_eq!(b.state(), EvasionState::Dynamic, "19 does not convert");
        assert!(!b.evasion().converted, "not converted");

        let action = b.on_interaction(0.5, &g, &mut media, &mut stage, &mut Tracer::none());
        assert_eq!(action, EvasionAction::Converted, "20 converts");
        assert!(b.evasion().converted, "flag set");
        assert_eq!(stage.button_visible(ButtonId::DynamicNo), Some(false), "no hidden");
        assert_eq!(stage.spawn_count(ButtonId::ConvertedYes), 1, "yes spawned");
        assert_eq!(
            stage.placement(ButtonId::ConvertedYes),
            Some(ButtonPlacement::at(Vec2::new(0.0, 5.0))),
            "aligned with original yes"
        );

        let after = b.on_interaction(0.5, &g, &mut media, &mut stage, &mut Tracer::none());
        assert_eq!(after, EvasionAction::Converted, "terminal");
        assert_eq!(b.evasion().move_count, 20, "count frozen");
        assert_eq!(media.no_cue.play_requests, 20, "no cue after conversion");
    }

    #[test]
    fn missing_container_is_a_no_op() {
        let mut media = fake_media_set();
        let mut stage = RecordingStage::default();
        let mut b = button();
        let g = Geometry {
            container: None,
            ..geometry()
        };
        let action = b.on_interaction(0.0, &g, &mut media, &mut stage, &mut Tracer::none());
        assert_eq!(action, EvasionAction::GeometryUnavailable, "skipped");
        assert_eq!(b.state(), EvasionState::Static, "unchanged");
        assert_eq!(b.evasion().move_count, 0, "not counted");
        assert!(stage.log.is_empty(), "no commands");
    }

    #[test]
    fn layout_change_reclamps_and_realigns() {
        let mut media = fake_media_set();
        let mut stage = stage();
        let mut b = button();
        let t = &mut Tracer::none();
        assert_eq!(b.on_layout_change(&geometry(), &mut stage, t), None, "static ignores");

        b.on_interaction(0.0, &geometry(), &mut media, &mut stage, t);
        let narrow = Geometry {
            viewport: Size::new(200.0, 700.0),
            ..geometry()
        };
        b.on_layout_change(&narrow, &mut stage, t);
        let p = narrow.container.unwrap_or(Rect::ZERO).center() + b.evasion().offset;
        assert!(p.x <= 200.0 - 45.0 - 20.0 + 1e-9, "re-clamped to {}", p.x);

        for _ in 0..19 {
            b.on_interaction(0.0, &geometry(), &mut media, &mut stage, t);
        }
        let moved = Geometry {
            container: Some(Rect::new(0.0, 300.0, 300.0, 400.0)),
            yes_button: Some(Rect::new(20.0, 330.0, 110.0, 420.0)),
            ..geometry()
        };
        let action = b.on_layout_change(&moved, &mut stage, t);
        assert_eq!(action, Some(EvasionAction::Repositioned), "repositioned");
        assert_eq!(
            b.converted_offset(),
            Vec2::new(0.0, 25.0),
            "recomputed from new geometry"
        );
    }

    #[test]
    fn converted_yes_aligns_with_its_own_height() {
        let mut media = fake_media_set();
        let mut stage = stage();
        stage.sizes.push((ButtonId::ConvertedYes, Size::new(120.0, 60.0)));
        let mut b = button();
        for _ in 0..20 {
            b.on_interaction(0.0, &geometry(), &mut media, &mut stage, &mut Tracer::none());
        }
        // Top of the original "Yes" is 10 px into a 100 px panel.
        assert_eq!(
            stage.placement(ButtonId::ConvertedYes),
            Some(ButtonPlacement::at(Vec2::new(0.0, -10.0))),
            "centered 60 px button moved up to the original's top"
        );
    }

    #[test]
    fn scaling_keeps_alignment() {
        let mut media = fake_media_set();
        let mut stage = stage();
        let mut b = button();
        b.scale_converted(2.0, &mut stage);
        assert!(stage.log.is_empty(), "ignored before conversion");
        for _ in 0..20 {
            b.on_interaction(0.0, &geometry(), &mut media, &mut stage, &mut Tracer::none());
        }
        b.scale_converted(1.15, &mut stage);
        assert_eq!(
            stage.placement(ButtonId::ConvertedYes),
            Some(ButtonPlacement {
                offset: Vec2::new(0.0, 5.0),
                scale: 1.15,
            }),
            "translate then scale"
        );
    }
}
