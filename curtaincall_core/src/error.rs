// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types at the core's seams.
//!
//! None of these reach the viewer. Playback rejections and geometry failures
//! are recovered locally and reported through the [`trace`](crate::trace)
//! events; configuration errors are returned to whoever builds the session.

use alloc::string::String;
use core::fmt;

use crate::media::Channel;

/// A media element refused to start playing.
///
/// Reported by the backend when the promise returned by `play()` rejects
/// (autoplay policy, decode failure, element removed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayRejected {
    /// The element that refused.
    pub channel: Channel,
    /// Backend-provided reason, for logs only.
    pub reason: String,
}

impl fmt::Display for PlayRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} playback rejected: {}", self.channel, self.reason)
    }
}

impl core::error::Error for PlayRejected {}

/// A geometry query could not be answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryError {
    /// The button container is detached, hidden, or has no layout box.
    ContainerMissing,
    /// The button whose position is needed has no layout box.
    ButtonMissing,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerMissing => f.write_str("button container has no layout box"),
            Self::ButtonMissing => f.write_str("reference button has no layout box"),
        }
    }
}

impl core::error::Error for GeometryError {}

/// A [`PresentationConfig`](crate::config::PresentationConfig) failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The evasion move threshold is zero.
    ZeroMoveThreshold,
    /// The confirmation click threshold is zero.
    ZeroClickThreshold,
    /// The escalating phrase list cannot cover every click before the threshold.
    TooFewPhrases {
        /// Phrases needed (`threshold - 1`).
        needed: u32,
        /// Phrases provided.
        provided: usize,
    },
    /// The countdown fade-out is longer than the countdown itself.
    FadeLongerThanCountdown,
    /// A volume or tolerance is negative or not finite.
    InvalidLevel,
    /// A sampling interval is zero.
    ZeroInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMoveThreshold => f.write_str("move threshold must be at least 1"),
            Self::ZeroClickThreshold => f.write_str("click threshold must be at least 1"),
            Self::TooFewPhrases { needed, provided } => {
                write!(f, "need {needed} escalation phrases, got {provided}")
            }
            Self::FadeLongerThanCountdown => {
                f.write_str("fade-out must not be longer than the countdown")
            }
            Self::InvalidLevel => f.write_str("volumes and tolerances must be finite and >= 0"),
            Self::ZeroInterval => f.write_str("sampling intervals must be non-zero"),
        }
    }
}

impl core::error::Error for ConfigError {}
