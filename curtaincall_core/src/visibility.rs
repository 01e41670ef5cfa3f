// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pausing and resyncing the countdown across page visibility changes.
//!
//! Hidden pages throttle timers and may suspend decoding, so the countdown
//! is paused in place while hidden. On return the video is moved to the
//! audio's position before either resumes. Resume failures are traced and
//! otherwise ignored.

use crate::error::PlayRejected;
use crate::media::{Channel, MediaElement, MediaSet};
use crate::time::HostTime;
use crate::trace::{PlaybackAction, PlaybackEvent, Tracer, VisibilityAction, VisibilityEvent};

/// Reacts to visibility changes while the countdown runs.
#[derive(Clone, Debug, Default)]
pub struct VisibilityRecovery {
    paused: bool,
    resume_video: bool,
    resume_audio: bool,
    resumes: u32,
}

impl VisibilityRecovery {
    /// Creates an idle handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a visibility change.
    ///
    /// `countdown_active` is whether the countdown started and has not ended;
    /// outside that window the change is ignored.
    pub fn on_change<M: MediaElement>(
        &mut self,
        hidden: bool,
        countdown_active: bool,
        now: HostTime,
        media: &mut MediaSet<M>,
        tracer: &mut Tracer<'_>,
    ) -> VisibilityAction {
        let action = if !countdown_active {
            VisibilityAction::Ignored
        } else if hidden {
            media.video.pause();
            media.countdown_audio.pause();
            self.paused = true;
            VisibilityAction::Paused
        } else {
            let audio_time = media.countdown_audio.current_time();
            media.video.set_current_time(audio_time);
            media.video.request_play();
            media.countdown_audio.request_play();
            self.paused = false;
            self.resume_video = true;
            self.resume_audio = true;
            self.resumes += 1;
            VisibilityAction::Resumed
        };
        tracer.visibility(&VisibilityEvent {
            at: now,
            hidden,
            action,
        });
        action
    }

    /// Consumes the settlement of a resume request.
    ///
    /// Returns `false` if no resume was pending for `channel`.
    pub fn on_play_settled(
        &mut self,
        channel: Channel,
        result: Result<(), PlayRejected>,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let pending = match channel {
            Channel::CountdownVideo => &mut self.resume_video,
            Channel::CountdownAudio => &mut self.resume_audio,
            _ => return false,
        };
        if !*pending {
            return false;
        }
        *pending = false;
        let action = match result {
            Ok(()) => PlaybackAction::Started,
            Err(_) => PlaybackAction::Rejected,
        };
        tracer.playback(&PlaybackEvent {
            at: now,
            channel,
            action,
        });
        true
    }

    /// Whether the countdown is currently paused for visibility.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// How many times playback was resumed.
    #[must_use]
    pub const fn resumes(&self) -> u32 {
        self.resumes
    }
}
