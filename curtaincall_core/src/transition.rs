// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The one-way hand-off from the countdown to the letter phase.
//!
//! [`PhaseTransition::fire`] swaps the countdown for the envelope and starts
//! the background music at zero volume, ramping it up to a low target. Only
//! once the ramp completes are the countdown elements paused and the video
//! rewound, so the cut is never audible.
//!
//! If the music start is rejected, one retry is deferred to the next
//! pointer gesture.

use crate::config::PresentationConfig;
use crate::error::PlayRejected;
use crate::media::{Channel, MediaElement, MediaSet};
use crate::stage::{Stage, Surface};
use crate::time::{Duration, HostTime, Timebase};
use crate::timer::{Ramp, RampTicker, take_due};
use crate::trace::{PhaseChange, PhaseEvent, PlaybackAction, PlaybackEvent, Tracer};

/// Which part of the sequence is on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// The curtain is down or rising.
    Curtain,
    /// The countdown is playing.
    Countdown,
    /// The envelope is waiting to be opened.
    Envelope,
    /// The letter is open.
    Letter,
}

/// Music start retry state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MusicRetry {
    /// No rejection seen.
    Idle,
    /// Rejected; waiting for a gesture.
    Deferred,
    /// The one retry has been spent.
    Spent,
}

/// Performs the countdown → envelope → letter progression.
#[derive(Clone, Debug)]
pub struct PhaseTransition {
    fired: bool,
    letter_shown: bool,
    fade_duration: Duration,
    fade_tick: Duration,
    music_target: f64,
    letter_open_delay: Duration,
    fade: Option<RampTicker>,
    letter_open_at: Option<HostTime>,
    retry: MusicRetry,
    parked: bool,
}

impl PhaseTransition {
    /// Creates an unfired transition.
    #[must_use]
    pub fn new(config: &PresentationConfig, timebase: Timebase) -> Self {
        Self {
            fired: false,
            letter_shown: false,
            fade_duration: Duration::from_millis(config.fade_in_ms, timebase),
            fade_tick: Duration::from_millis(config.fade_in_tick_ms, timebase),
            music_target: config.music_target_volume,
            letter_open_delay: Duration::from_millis(config.letter_open_delay_ms, timebase),
            fade: None,
            letter_open_at: None,
            retry: MusicRetry::Idle,
            parked: false,
        }
    }

    /// Hides the countdown, shows the envelope and starts the music fade-in.
    ///
    /// Returns `false` if it already fired.
    pub fn fire<M: MediaElement, S: Stage>(
        &mut self,
        now: HostTime,
        media: &mut MediaSet<M>,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;

        stage.set_visible(Surface::Countdown, false);
        stage.set_visible(Surface::Envelope, true);

        media.music.set_muted(false);
        media.music.set_volume(0.0);
        media.music.request_play();
        tracer.playback(&PlaybackEvent {
            at: now,
            channel: Channel::Music,
            action: PlaybackAction::Requested,
        });

        let ramp = Ramp::new(now, self.fade_duration, 0.0, self.music_target);
        self.fade = Some(RampTicker::new(ramp, self.fade_tick));
        tracer.phase(&PhaseEvent {
            at: now,
            change: PhaseChange::EnvelopeShown,
        });
        true
    }

    /// Handles the music start outcome.
    pub fn on_play_settled(
        &mut self,
        result: Result<(), PlayRejected>,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        let action = match result {
            Ok(()) => PlaybackAction::Started,
            Err(_) => PlaybackAction::Rejected,
        };
        tracer.playback(&PlaybackEvent {
            at: now,
            channel: Channel::Music,
            action,
        });
        if action == PlaybackAction::Rejected && self.retry == MusicRetry::Idle {
            self.retry = MusicRetry::Deferred;
            tracer.phase(&PhaseEvent {
                at: now,
                change: PhaseChange::MusicDeferred,
            });
        }
    }

    /// Spends the deferred music retry, if one is waiting.
    pub fn on_pointer_down<M: MediaElement>(
        &mut self,
        now: HostTime,
        media: &mut MediaSet<M>,
        tracer: &mut Tracer<'_>,
    ) {
        if self.retry != MusicRetry::Deferred {
            return;
        }
        self.retry = MusicRetry::Spent;
        media.music.request_play();
        tracer.phase(&PhaseEvent {
            at: now,
            change: PhaseChange::MusicRetried,
        });
    }

    /// Replaces the envelope with the letter; the window opens shortly after.
    ///
    /// Only meaningful once, after the transition fired.
    pub fn on_envelope_click<S: Stage>(
        &mut self,
        now: HostTime,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if !self.fired || self.letter_shown {
            return false;
        }
        self.letter_shown = true;
        stage.set_visible(Surface::Envelope, false);
        stage.set_visible(Surface::Letter, true);
        self.letter_open_at = Some(now.saturating_add(self.letter_open_delay));
        tracer.phase(&PhaseEvent {
            at: now,
            change: PhaseChange::LetterShown,
        });
        true
    }

    /// Advances the music fade-in and the letter opening.
    pub fn poll<M: MediaElement, S: Stage>(
        &mut self,
        now: HostTime,
        media: &mut MediaSet<M>,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) {
        if let Some(sample) = self.fade.as_mut().and_then(|f| f.sample(now)) {
            media.music.set_volume(sample.value);
            if sample.complete {
                self.fade = None;
                self.parked = true;
                media.countdown_audio.pause();
                media.video.pause();
                media.video.set_current_time(0.0);
                tracer.phase(&PhaseEvent {
                    at: now,
                    change: PhaseChange::MusicFadeComplete,
                });
            }
        }

        if take_due(&mut self.letter_open_at, now) {
            stage.add_class(Surface::LetterWindow, "open");
            tracer.phase(&PhaseEvent {
                at: now,
                change: PhaseChange::LetterOpened,
            });
        }
    }

    /// Whether the transition has fired.
    #[must_use]
    pub const fn has_fired(&self) -> bool {
        self.fired
    }

    /// Whether the countdown media has been paused and rewound.
    #[must_use]
    pub const fn countdown_parked(&self) -> bool {
        self.parked
    }

    /// Whether a music retry is waiting for a gesture.
    #[must_use]
    pub fn music_deferred(&self) -> bool {
        self.retry == MusicRetry::Deferred
    }

    /// The phase this transition has reached; `Countdown` before firing.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match (self.fired, self.letter_shown) {
            (false, _) => Phase::Countdown,
            (true, false) => Phase::Envelope,
            (true, true) => Phase::Letter,
        }
    }

    /// Number of armed timers.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        usize::from(self.fade.is_some()) + usize::from(self.letter_open_at.is_some())
    }
}
