// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session configuration.
//!
//! Every threshold, delay and level used by the state machines is named
//! once here. [`PresentationConfig::canonical`] is the shipped sequence;
//! [`PresentationConfig::question_marks`] is the shorter confirmation variant.

use crate::error::ConfigError;
use crate::time::{Duration, Timebase};

/// Prompts shown while the viewer keeps clicking "Yes".
pub const ESCALATING_PHRASES: &[&str] = &[
    "Sure?",
    "Really sure?",
    "Are you certain? \u{1f97a}",
    "Pwease? \u{1f97a}\u{1f449}\u{1f448}",
    "Pretty sure?",
    "Super duper sure?",
    "100% sure? \u{1f495}",
    "Absolutely certain?",
    "Pinky promise sure?",
    "With your whole heart sure?",
];

/// How the prompt text escalates before acceptance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptStyle {
    /// Click `n` shows `phrases[n - 1]`.
    Phrases(&'static [&'static str]),
    /// Click `n` shows `base` followed by `n` question marks.
    QuestionMarks {
        /// The phrase the question marks are appended to.
        base: &'static str,
    },
}

/// The "Yes" confirmation sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfirmationConfig {
    /// Click number that accepts (terminal).
    pub threshold: u32,
    /// Escalating prompt text.
    pub prompts: PromptStyle,
    /// Scale added to the clicked button per click.
    pub scale_step: f64,
    /// Prompt shown on acceptance.
    pub final_message: &'static str,
    /// Letter image shown on acceptance.
    pub final_image: &'static str,
}

/// All constants of one session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresentationConfig {
    /// Minimum time the curtain stays down.
    pub curtain_delay_ms: u64,
    /// How long to wait for the video before attempting recovery.
    pub video_timeout_ms: u64,
    /// How long a cache-busted reload is given before proceeding anyway.
    pub recovery_window_ms: u64,
    /// Cadence of the decoded-readiness polling check.
    pub ready_poll_ms: u64,
    /// Pause between the curtain rising and the countdown starting.
    pub pre_countdown_delay_ms: u64,
    /// Nominal length of the countdown media.
    pub countdown_duration_ms: u64,
    /// Extra slack before the fallback timer ends the countdown.
    pub fallback_grace_ms: u64,
    /// Cadence of the drift check.
    pub drift_check_ms: u64,
    /// Maximum tolerated `|video - audio|` before the video is re-seeked.
    pub drift_tolerance_seconds: f64,
    /// Length of the countdown fade-out, ending at the nominal end.
    pub fade_out_ms: u64,
    /// Sampling interval of the fade-out.
    pub fade_out_tick_ms: u64,
    /// Length of the background music fade-in.
    pub fade_in_ms: u64,
    /// Sampling interval of the fade-in.
    pub fade_in_tick_ms: u64,
    /// Base volume of the countdown audio.
    pub countdown_volume: f64,
    /// Music volume before the letter phase.
    pub music_initial_volume: f64,
    /// Music volume reached by the fade-in.
    pub music_target_volume: f64,
    /// Initial volume of the "No" cue and final cue.
    pub cue_volume: f64,
    /// Final cue volume at acceptance.
    pub final_cue_volume: f64,
    /// Delay before the letter window opens after the envelope is clicked.
    pub letter_open_delay_ms: u64,
    /// Interaction number that converts the "No" button.
    pub move_threshold: u32,
    /// Distance of each evasive step, in CSS pixels.
    pub step_distance: f64,
    /// Distance kept from every viewport edge, in CSS pixels.
    pub edge_margin: f64,
    /// Button size assumed when layout reports zero.
    pub fallback_button_size: f64,
    /// Delay before re-layout after an orientation or fullscreen change.
    pub layout_settle_ms: u64,
    /// The confirmation sequence.
    pub confirmation: ConfirmationConfig,
}

impl PresentationConfig {
    /// The shipped sequence: ten escalating phrases before acceptance.
    #[must_use]
    pub const fn canonical() -> Self {
        Self {
            curtain_delay_ms: 3000,
            video_timeout_ms: 8000,
            recovery_window_ms: 3000,
            ready_poll_ms: 200,
            pre_countdown_delay_ms: 500,
            countdown_duration_ms: 76_000,
            fallback_grace_ms: 500,
            drift_check_ms: 500,
            drift_tolerance_seconds: 0.5,
            fade_out_ms: 2000,
            fade_out_tick_ms: 200,
            fade_in_ms: 2000,
            fade_in_tick_ms: 50,
            countdown_volume: 0.5,
            music_initial_volume: 0.05,
            music_target_volume: 0.025,
            cue_volume: 0.3,
            final_cue_volume: 0.1,
            letter_open_delay_ms: 50,
            move_threshold: 20,
            step_distance: 150.0,
            edge_margin: 20.0,
            fallback_button_size: 90.0,
            layout_settle_ms: 100,
            confirmation: ConfirmationConfig {
                threshold: 10,
                prompts: PromptStyle::Phrases(ESCALATING_PHRASES),
                scale_step: 0.15,
                final_message: "Yippeeee! Valentine na kita Taly",
                final_image: "capy_happy.gif",
            },
        }
    }

    /// The shorter variant: six clicks, one more question mark per click.
    #[must_use]
    pub const fn question_marks() -> Self {
        let mut cfg = Self::canonical();
        cfg.confirmation.threshold = 6;
        cfg.confirmation.prompts = PromptStyle::QuestionMarks { base: "Sure" };
        cfg
    }

    /// Checks that the configuration describes a sequence that can finish.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_threshold == 0 {
            return Err(ConfigError::ZeroMoveThreshold);
        }
        let confirmation = &self.confirmation;
        if confirmation.threshold == 0 {
            return Err(ConfigError::ZeroClickThreshold);
        }
        if let PromptStyle::Phrases(phrases) = confirmation.prompts {
            let needed = confirmation.threshold - 1;
            if phrases.len() < needed as usize {
                return Err(ConfigError::TooFewPhrases {
                    needed,
                    provided: phrases.len(),
                });
            }
        }
        if self.fade_out_ms > self.countdown_duration_ms {
            return Err(ConfigError::FadeLongerThanCountdown);
        }
        let levels = [
            self.drift_tolerance_seconds,
            self.countdown_volume,
            self.music_initial_volume,
            self.music_target_volume,
            self.cue_volume,
            self.final_cue_volume,
            self.step_distance,
            self.edge_margin,
            self.fallback_button_size,
            confirmation.scale_step,
        ];
        if levels.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::InvalidLevel);
        }
        let intervals = [
            self.ready_poll_ms,
            self.drift_check_ms,
            self.fade_out_tick_ms,
            self.fade_in_tick_ms,
        ];
        if intervals.contains(&0) {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// Converts a millisecond field to ticks.
    #[inline]
    #[must_use]
    pub const fn ticks(ms: u64, timebase: Timebase) -> Duration {
        Duration::from_millis(ms, timebase)
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert_eq!(PresentationConfig::canonical().validate(), Ok(()), "canonical");
        assert_eq!(
            PresentationConfig::question_marks().validate(),
            Ok(()),
            "question marks"
        );
    }

    #[test]
    fn question_marks_only_changes_confirmation() {
        let canonical = PresentationConfig::canonical();
        let variant = PresentationConfig::question_marks();
        assert_eq!(variant.confirmation.threshold, 6, "six clicks");
        assert_eq!(variant.move_threshold, canonical.move_threshold, "moves");
        assert_eq!(
            variant.countdown_duration_ms, canonical.countdown_duration_ms,
            "countdown"
        );
    }

    #[test]
    fn short_phrase_list_is_rejected() {
        let mut cfg = PresentationConfig::canonical();
        cfg.confirmation.prompts = PromptStyle::Phrases(&["only one"]);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::TooFewPhrases {
                needed: 9,
                provided: 1
            }),
            "nine phrases needed for ten clicks"
        );
    }

    #[test]
    fn degenerate_values_are_rejected() {
        let mut cfg = PresentationConfig::canonical();
        cfg.move_threshold = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMoveThreshold), "moves");

        let mut cfg = PresentationConfig::canonical();
        cfg.fade_out_ms = cfg.countdown_duration_ms + 1;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::FadeLongerThanCountdown),
            "fade"
        );

        let mut cfg = PresentationConfig::canonical();
        cfg.drift_tolerance_seconds = f64::NAN;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidLevel), "nan");

        let mut cfg = PresentationConfig::canonical();
        cfg.fade_in_tick_ms = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroInterval), "tick");
    }
}
