// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The escalating "Yes" confirmation.
//!
//! Each click on a live "Yes" button counts, plays the "Yes" cue and, below
//! the threshold, grows the clicked button and escalates the prompt. The
//! click that reaches the threshold accepts: final cue, final message and
//! image, `final` class on the letter window, button panel hidden, final
//! text shown. Acceptance is terminal.

use alloc::string::String;

use crate::config::{ConfirmationConfig, PromptStyle};
use crate::media::{Channel, MediaElement, MediaSet};
use crate::stage::{Stage, Surface};
use crate::trace::{ConfirmationAction, ConfirmationEvent, Tracer};

/// Counter and terminal flag of the confirmation sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct YesConfirmationState {
    /// Clicks counted so far.
    pub click_count: u32,
    /// Set once, at the threshold.
    pub accepted: bool,
}

/// What a click did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfirmationOutcome {
    /// The prompt escalated; the clicked button should be drawn at `scale`.
    Escalated {
        /// New uniform scale of the clicked button.
        scale: f64,
    },
    /// The sequence finished.
    Accepted,
    /// Already accepted; nothing happened.
    Ignored,
}

/// Prompt text shown after `click_count` clicks, below the threshold.
#[must_use]
pub fn prompt_for(style: PromptStyle, click_count: u32) -> String {
    match style {
        PromptStyle::Phrases(phrases) => {
            let index = click_count.saturating_sub(1) as usize;
            // Short lists repeat the last phrase.
            let last = phrases.len().saturating_sub(1);
            phrases
                .get(index.min(last))
                .copied()
                .unwrap_or_default()
                .into()
        }
        PromptStyle::QuestionMarks { base } => {
            let mut text = String::from(base);
            for _ in 0..click_count {
                text.push('?');
            }
            text
        }
    }
}

/// The "Yes" click sequence.
#[derive(Clone, Debug)]
pub struct YesConfirmation {
    state: YesConfirmationState,
    config: ConfirmationConfig,
    final_cue_volume: f64,
}

impl YesConfirmation {
    /// Creates the sequence with no clicks counted.
    #[must_use]
    pub fn new(config: ConfirmationConfig, final_cue_volume: f64) -> Self {
        Self {
            state: YesConfirmationState::default(),
            config,
            final_cue_volume,
        }
    }

    /// Handles a click on any live "Yes" button.
    ///
    /// On escalation the caller places the clicked button at the returned
    /// scale, since only it knows which button was clicked.
    pub fn on_click<M: MediaElement, S: Stage>(
        &mut self,
        media: &mut MediaSet<M>,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> ConfirmationOutcome {
        if self.state.accepted {
            self.emit(ConfirmationAction::Ignored, 1.0, tracer);
            return ConfirmationOutcome::Ignored;
        }

        self.state.click_count += 1;
        media.play_cue(Channel::YesCue);

        if self.state.click_count < self.config.threshold {
            let scale = 1.0 + f64::from(self.state.click_count) * self.config.scale_step;
            let prompt = prompt_for(self.config.prompts, self.state.click_count);
            stage.set_text(Surface::Prompt, &prompt);
            self.emit(ConfirmationAction::Escalated, scale, tracer);
            return ConfirmationOutcome::Escalated { scale };
        }

        self.state.accepted = true;
        media.final_cue.set_volume(self.final_cue_volume);
        media.play_cue(Channel::FinalCue);
        stage.set_text(Surface::Prompt, self.config.final_message);
        stage.set_image(Surface::LetterImage, self.config.final_image);
        stage.add_class(Surface::LetterWindow, "final");
        stage.set_visible(Surface::ButtonPanel, false);
        stage.set_visible(Surface::FinalText, true);
        self.emit(ConfirmationAction::Accepted, 1.0, tracer);
        ConfirmationOutcome::Accepted
    }

    fn emit(&self, action: ConfirmationAction, scale: f64, tracer: &mut Tracer<'_>) {
        tracer.confirmation(&ConfirmationEvent {
            click_count: self.state.click_count,
            action,
            scale,
        });
    }

    /// Counter and terminal flag.
    #[must_use]
    pub const fn state(&self) -> YesConfirmationState {
        self.state
    }

    /// Whether the sequence finished.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.state.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ESCALATING_PHRASES, PresentationConfig};
    use crate::testing::{RecordingStage, fake_media_set};

    fn sequence(config: &PresentationConfig) -> YesConfirmation {
        YesConfirmation::new(config.confirmation, config.final_cue_volume)
    }

    #[test]
    fn phrases_escalate_until_threshold() {
        let config = PresentationConfig::canonical();
        let mut media = fake_media_set();
        let mut stage = RecordingStage::default();
        let mut yes = sequence(&config);
        let t = &mut Tracer::none();

        for n in 1..10_u32 {
            let outcome = yes.on_click(&mut media, &mut stage, t);
            let expected = 1.0 + f64::from(n) * 0.15;
            assert!(
                matches!(outcome, ConfirmationOutcome::Escalated { scale } if (scale - expected).abs() < 1e-9),
                "click {n} escalates to {expected}, got {outcome:?}"
            );
            assert_eq!(
                stage.text(Surface::Prompt),
                Some(ESCALATING_PHRASES[n as usize - 1]),
                "phrase for click {n}"
            );
        }
        assert!(!yes.is_accepted(), "ninth click does not finalize");
        assert_eq!(stage.visible(Surface::ButtonPanel), None, "panel untouched");

        assert_eq!(
            yes.on_click(&mut media, &mut stage, t),
            ConfirmationOutcome::Accepted,
            "tenth click finalizes"
        );
        assert_eq!(
            stage.text(Surface::Prompt),
            Some("Yippeeee! Valentine na kita Taly"),
            "final message"
        );
        assert_eq!(stage.image(Surface::LetterImage), Some("capy_happy.gif"), "image swapped");
        assert!(stage.has_class(Surface::LetterWindow, "final"), "final class");
        assert_eq!(stage.visible(Surface::ButtonPanel), Some(false), "panel hidden");
        assert_eq!(stage.visible(Surface::FinalText), Some(true), "final text shown");
        assert_eq!(media.final_cue.play_requests, 1, "final cue");
        assert_eq!(media.final_cue.volume, 0.1, "final cue volume");
        assert_eq!(media.yes_cue.play_requests, 10, "yes cue per click");
    }

    #[test]
    fn question_mark_variant_finalizes_at_six() {
        let config = PresentationConfig::question_marks();
        let mut media = fake_media_set();
        let mut stage = RecordingStage::default();
        let mut yes = sequence(&config);
        let t = &mut Tracer::none();
        for _ in 0..5 {
            yes.on_click(&mut media, &mut stage, t);
        }
        assert_eq!(stage.text(Surface::Prompt), Some("Sure?????"), "five marks");
        assert!(!yes.is_accepted(), "fifth click escalates");
        assert_eq!(
            yes.on_click(&mut media, &mut stage, t),
            ConfirmationOutcome::Accepted,
            "sixth click finalizes"
        );
    }

    #[test]
    fn acceptance_is_terminal() {
        let config = PresentationConfig::question_marks();
        let mut media = fake_media_set();
        let mut stage = RecordingStage::default();
        let mut yes = sequence(&config);
        let t = &mut Tracer::none();
        for _ in 0..6 {
            yes.on_click(&mut media, &mut stage, t);
        }
        let log_len = stage.log.len();
        assert_eq!(
            yes.on_click(&mut media, &mut stage, t),
            ConfirmationOutcome::Ignored,
            "ignored"
        );
        assert_eq!(stage.log.len(), log_len, "no stage commands");
        assert_eq!(yes.state().click_count, 6, "count frozen");
        assert_eq!(media.yes_cue.play_requests, 6, "no cue");
    }

    #[test]
    fn prompt_text() {
        let marks = PromptStyle::QuestionMarks { base: "Sure" };
        assert_eq!(prompt_for(marks, 1), "Sure?", "one mark");
        assert_eq!(prompt_for(marks, 3), "Sure???", "three marks");
        let phrases = PromptStyle::Phrases(&["a", "b"]);
        assert_eq!(prompt_for(phrases, 1), "a", "first phrase");
        assert_eq!(prompt_for(phrases, 7), "b", "clamped to last");
    }
}
