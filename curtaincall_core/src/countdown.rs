// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronized countdown playback.
//!
//! [`CountdownSynchronizer`] owns the [`PlaybackSession`] of the countdown
//! video and its soundtrack. It starts both from zero, keeps the video
//! locked to the audio clock, fades both out before the end and reports a
//! single [`EndCause`] when the countdown is over.
//!
//! ## Timers
//!
//! | Timer            | Kind      | Armed                          | Cleared         |
//! |------------------|-----------|--------------------------------|-----------------|
//! | drift check      | periodic  | both plays started             | termination     |
//! | fade-out start   | one-shot  | `start`, at `duration - fade`  | fires / term.   |
//! | fade-out ramp    | periodic  | fade-out start                 | complete / term.|
//! | end fallback     | one-shot  | `start`, at `duration + grace` | termination     |
//! | failure fallback | one-shot  | first rejected play            | termination     |
//!
//! Termination is guarded by a single flag: [`terminate`] returns `true` the
//! first time only, and leaves no timer armed.
//!
//! [`terminate`]: CountdownSynchronizer::terminate

use crate::config::PresentationConfig;
use crate::error::PlayRejected;
use crate::media::{Channel, MediaElement, MediaSet};
use crate::time::{Duration, HostTime, Timebase};
use crate::timer::{Interval, Ramp, RampTicker, take_due};
use crate::trace::{
    CountdownEndEvent, DriftEvent, EndCause, PlaybackAction, PlaybackEvent, Tracer,
};

/// Whether the video must be forced to the audio clock.
///
/// Corrects only when the drift is strictly greater than `tolerance`.
#[must_use]
pub fn needs_correction(video_time: f64, audio_time: f64, tolerance: f64) -> bool {
    (video_time - audio_time).abs() > tolerance
}

/// Per-channel result of the start request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StartState {
    Pending,
    Started,
    Rejected,
}

/// The live state of one countdown run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackSession {
    /// When playback was requested.
    pub started_at: HostTime,
    /// Set exactly once, at termination.
    pub ended: bool,
    /// What ended the countdown; set together with `ended`.
    pub end_cause: Option<EndCause>,
    /// Drift the loop tolerates, in seconds.
    pub drift_tolerance_seconds: f64,
    video: StartState,
    audio: StartState,
}

/// Drives the countdown video and audio as one clock.
#[derive(Clone, Debug)]
pub struct CountdownSynchronizer {
    session: Option<PlaybackSession>,
    duration: Duration,
    grace: Duration,
    fade_duration: Duration,
    fade_tick: Duration,
    drift_period: Duration,
    drift_tolerance: f64,
    countdown_volume: f64,
    drift: Option<Interval>,
    fade_at: Option<HostTime>,
    fade: Option<RampTicker>,
    end_fallback_at: Option<HostTime>,
    failure_fallback_at: Option<HostTime>,
    corrections: u32,
}

impl CountdownSynchronizer {
    /// Creates an idle synchronizer.
    #[must_use]
    pub fn new(config: &PresentationConfig, timebase: Timebase) -> Self {
        Self {
            session: None,
            duration: Duration::from_millis(config.countdown_duration_ms, timebase),
            grace: Duration::from_millis(config.fallback_grace_ms, timebase),
            fade_duration: Duration::from_millis(config.fade_out_ms, timebase),
            fade_tick: Duration::from_millis(config.fade_out_tick_ms, timebase),
            drift_period: Duration::from_millis(config.drift_check_ms, timebase),
            drift_tolerance: config.drift_tolerance_seconds,
            countdown_volume: config.countdown_volume,
            drift: None,
            fade_at: None,
            fade: None,
            end_fallback_at: None,
            failure_fallback_at: None,
            corrections: 0,
        }
    }

    /// Rewinds both elements and requests playback.
    ///
    /// Single-shot: returns `false` and does nothing if already started.
    pub fn start<M: MediaElement>(
        &mut self,
        now: HostTime,
        media: &mut MediaSet<M>,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.session.is_some() {
            return false;
        }
        self.session = Some(PlaybackSession {
            started_at: now,
            ended: false,
            end_cause: None,
            drift_tolerance_seconds: self.drift_tolerance,
            video: StartState::Pending,
            audio: StartState::Pending,
        });

        media.video.set_current_time(0.0);
        media.countdown_audio.set_current_time(0.0);
        media.video.request_play();
        media.countdown_audio.request_play();
        for channel in [Channel::CountdownVideo, Channel::CountdownAudio] {
            tracer.playback(&PlaybackEvent {
                at: now,
                channel,
                action: PlaybackAction::Requested,
            });
        }

        let fade_offset = self.duration.saturating_sub(self.fade_duration);
        self.fade_at = Some(now.saturating_add(fade_offset));
        self.end_fallback_at = Some(now.saturating_add(self.duration + self.grace));
        true
    }

    /// Records the outcome of a start request for the video or audio.
    ///
    /// A rejection arms the failure fallback one full countdown from `now`.
    /// Drift correction starts once both channels have started.
    ///
    /// A start aborted by the page hiding before `play()` settles is a
    /// rejection like any other. Visibility recovery may resume playback
    /// later, but drift correction stays off for the rest of this run and
    /// the failure fallback still ends it.
    ///
    /// Returns `false` if no start request was pending for `channel`, so the
    /// caller can route the settlement elsewhere.
    pub fn on_play_settled(
        &mut self,
        channel: Channel,
        result: Result<(), PlayRejected>,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.ended {
            return false;
        }
        let slot = match channel {
            Channel::CountdownVideo => &mut session.video,
            Channel::CountdownAudio => &mut session.audio,
            _ => return false,
        };
        if *slot != StartState::Pending {
            return false;
        }

        match result {
            Ok(()) => {
                *slot = StartState::Started;
                tracer.playback(&PlaybackEvent {
                    at: now,
                    channel,
                    action: PlaybackAction::Started,
                });
            }
            Err(_) => {
                *slot = StartState::Rejected;
                tracer.playback(&PlaybackEvent {
                    at: now,
                    channel,
                    action: PlaybackAction::Rejected,
                });
                if self.failure_fallback_at.is_none() {
                    self.failure_fallback_at = Some(now.saturating_add(self.duration));
                    tracer.playback(&PlaybackEvent {
                        at: now,
                        channel,
                        action: PlaybackAction::FallbackArmed,
                    });
                }
            }
        }

        if session.video == StartState::Started && session.audio == StartState::Started {
            self.drift = Some(Interval::starting_at(now, self.drift_period));
            tracer.playback(&PlaybackEvent {
                at: now,
                channel: Channel::CountdownAudio,
                action: PlaybackAction::SyncStarted,
            });
        }
        true
    }

    /// Maps an `ended` signal to an end cause while the countdown is active.
    #[must_use]
    pub fn on_ended(&self, channel: Channel) -> Option<EndCause> {
        if !self.is_active() {
            return None;
        }
        match channel {
            Channel::CountdownAudio => Some(EndCause::AudioEnded),
            Channel::CountdownVideo => Some(EndCause::VideoEnded),
            _ => None,
        }
    }

    /// Runs due drift checks and fade samples and checks the fallbacks.
    ///
    /// Returns the end cause when a fallback fires; the caller then calls
    /// [`terminate`](Self::terminate).
    pub fn poll<M: MediaElement>(
        &mut self,
        now: HostTime,
        media: &mut MediaSet<M>,
        tracer: &mut Tracer<'_>,
    ) -> Option<EndCause> {
        if !self.is_active() {
            return None;
        }

        if let Some(drift) = self.drift.as_mut()
            && drift.fire(now)
            && !media.video.is_paused()
            && !media.countdown_audio.is_paused()
        {
            let video_time = media.video.current_time();
            let audio_time = media.countdown_audio.current_time();
            let corrected = needs_correction(video_time, audio_time, self.drift_tolerance);
            if corrected {
                media.video.set_current_time(audio_time);
                self.corrections += 1;
            }
            tracer.drift(&DriftEvent {
                at: now,
                video_time,
                audio_time,
                corrected,
            });
        }

        if take_due(&mut self.fade_at, now) {
            let ramp = Ramp::new(now, self.fade_duration, 1.0, 0.0);
            self.fade = Some(RampTicker::new(ramp, self.fade_tick));
        }
        if let Some(sample) = self.fade.as_mut().and_then(|f| f.sample(now)) {
            media
                .countdown_audio
                .set_volume(self.countdown_volume * sample.value);
            media.video.set_opacity(sample.value);
            if sample.complete {
                self.fade = None;
            }
        }

        if take_due(&mut self.failure_fallback_at, now) {
            return Some(EndCause::PlaybackFailure);
        }
        if take_due(&mut self.end_fallback_at, now) {
            return Some(EndCause::FallbackTimer);
        }
        None
    }

    /// Ends the countdown and clears every timer.
    ///
    /// Returns `true` the first time only; later calls change nothing.
    pub fn terminate(&mut self, now: HostTime, cause: EndCause, tracer: &mut Tracer<'_>) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.ended {
            return false;
        }
        session.ended = true;
        session.end_cause = Some(cause);
        self.drift = None;
        self.fade_at = None;
        self.fade = None;
        self.end_fallback_at = None;
        self.failure_fallback_at = None;
        tracer.countdown_end(&CountdownEndEvent { at: now, cause });
        true
    }

    /// Whether playback was started and has not ended.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some_and(|s| !s.ended)
    }

    /// Whether termination has happened.
    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.session.is_some_and(|s| s.ended)
    }

    /// What ended the countdown, once it has ended.
    #[must_use]
    pub fn end_cause(&self) -> Option<EndCause> {
        self.session.and_then(|s| s.end_cause)
    }

    /// The current session, if started.
    #[must_use]
    pub const fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Whether the drift loop is running.
    #[must_use]
    pub const fn is_syncing(&self) -> bool {
        self.drift.is_some()
    }

    /// How many times the video was forced to the audio clock.
    #[must_use]
    pub const fn corrections(&self) -> u32 {
        self.corrections
    }

    /// Number of armed timers.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        usize::from(self.drift.is_some())
            + usize::from(self.fade_at.is_some())
            + usize::from(self.fade.is_some())
            + usize::from(self.end_fallback_at.is_some())
            + usize::from(self.failure_fallback_at.is_some())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString as _;

    use super::*;
    use crate::testing::{FakeMedia, fake_media_set};

    const TB: Timebase = Timebase::MICROS;

    fn ms(v: u64) -> HostTime {
        HostTime(v * 1000)
    }

    fn synchronizer() -> CountdownSynchronizer {
        CountdownSynchronizer::new(&PresentationConfig::canonical(), TB)
    }

    fn started(media: &mut MediaSet<FakeMedia>, t: &mut Tracer<'_>) -> CountdownSynchronizer {
        let mut s = synchronizer();
        assert!(s.start(ms(0), media, t), "first start");
        s.on_play_settled(Channel::CountdownVideo, Ok(()), ms(10), t);
        s.on_play_settled(Channel::CountdownAudio, Ok(()), ms(10), t);
        s
    }

    fn rejected(channel: Channel) -> Result<(), PlayRejected> {
        Err(PlayRejected {
            channel,
            reason: "NotAllowedError".to_string(),
        })
    }

    #[test]
    fn drift_threshold_is_strict() {
        assert!(!needs_correction(10.0, 10.0, 0.5), "in sync");
        assert!(!needs_correction(10.5, 10.0, 0.5), "exactly at tolerance");
        assert!(!needs_correction(9.5, 10.0, 0.5), "exactly at tolerance, behind");
        assert!(needs_correction(10.500_001, 10.0, 0.5), "just over");
        assert!(needs_correction(8.0, 10.0, 0.5), "far behind");
    }

    #[test]
    fn start_is_single_shot() {
        let mut media = fake_media_set();
        media.video.time = 12.0;
        media.countdown_audio.time = 12.0;
        let t = &mut Tracer::none();
        let mut s = synchronizer();
        assert!(s.start(ms(0), &mut media, t), "starts");
        assert_eq!(media.video.time, 0.0, "video rewound");
        assert_eq!(media.countdown_audio.time, 0.0, "audio rewound");
        assert_eq!(media.video.play_requests, 1, "video requested");
        assert_eq!(media.countdown_audio.play_requests, 1, "audio requested");
        assert!(!s.start(ms(5), &mut media, t), "re-entry is a no-op");
        assert_eq!(media.video.play_requests, 1, "no second request");
    }

    #[test]
    fn drift_loop_forces_video_to_audio() {
        let mut media = fake_media_set();
        let t = &mut Tracer::none();
        let mut s = started(&mut media, t);
        assert!(s.is_syncing(), "both started");

        media.video.time = 4.0;
        media.countdown_audio.time = 4.4;
        s.poll(ms(510), &mut media, t);
        assert_eq!(media.video.time, 4.0, "within tolerance");

        media.countdown_audio.time = 5.0;
        s.poll(ms(1_010), &mut media, t);
        assert_eq!(media.video.time, 5.0, "forced to audio clock");
        assert_eq!(s.corrections(), 1, "one correction");
    }

    #[test]
    fn drift_skips_samples_while_paused() {
        let mut media = fake_media_set();
        let t = &mut Tracer::none();
        let mut s = started(&mut media, t);
        media.video.time = 1.0;
        media.countdown_audio.time = 9.0;
        media.video.paused = true;
        s.poll(ms(510), &mut media, t);
        assert_eq!(media.video.time, 1.0, "skipped while paused");
        assert!(s.is_syncing(), "loop survives the pause");

        media.video.paused = false;
        s.poll(ms(1_010), &mut media, t);
        assert_eq!(media.video.time, 9.0, "resumes correcting");
    }

    #[test]
    fn rejection_arms_failure_fallback() {
        let mut media = fake_media_set();
        let t = &mut Tracer::none();
        let mut s = synchronizer();
        s.start(ms(0), &mut media, t);
        s.on_play_settled(Channel::CountdownVideo, Ok(()), ms(10), t);
        s.on_play_settled(
            Channel::CountdownAudio,
            rejected(Channel::CountdownAudio),
            ms(20),
            t,
        );
        assert!(!s.is_syncing(), "no drift loop without both");
        assert_eq!(s.poll(ms(76_019), &mut media, t), None, "not yet");
        assert_eq!(
            s.poll(ms(76_020), &mut media, t),
            Some(EndCause::PlaybackFailure),
            "fallback one countdown after rejection"
        );
    }

    #[test]
    fn aborted_start_leaves_drift_correction_off() {
        let mut media = fake_media_set();
        let t = &mut Tracer::none();
        let mut s = synchronizer();
        s.start(ms(0), &mut media, t);
        let aborted = Err(PlayRejected {
            channel: Channel::CountdownVideo,
            reason: "AbortError".to_string(),
        });
        assert!(
            s.on_play_settled(Channel::CountdownVideo, aborted, ms(10), t),
            "abort consumed as the start result"
        );
        s.on_play_settled(Channel::CountdownAudio, Ok(()), ms(10), t);
        assert!(
            !s.on_play_settled(Channel::CountdownVideo, Ok(()), ms(5_000), t),
            "a later resume is not a start"
        );
        assert!(!s.is_syncing(), "no drift loop for this run");

        media.video.paused = false;
        media.countdown_audio.paused = false;
        media.video.time = 3.0;
        media.countdown_audio.time = 5.0;
        s.poll(ms(5_500), &mut media, t);
        assert_eq!(media.video.time, 3.0, "drift left uncorrected");
        assert_eq!(
            s.poll(ms(76_010), &mut media, t),
            Some(EndCause::PlaybackFailure),
            "failure fallback still ends the run"
        );
    }

    #[test]
    fn end_fallback_fires_after_grace() {
        let mut media = fake_media_set();
        let t = &mut Tracer::none();
        let mut s = started(&mut media, t);
        assert_eq!(s.poll(ms(76_499), &mut media, t), None, "inside grace");
        assert_eq!(
            s.poll(ms(76_500), &mut media, t),
            Some(EndCause::FallbackTimer),
            "duration plus grace"
        );
    }

    #[test]
    fn fade_out_ramps_volume_and_opacity() {
        let mut media = fake_media_set();
        media.countdown_audio.volume = 0.5;
        let t = &mut Tracer::none();
        let mut s = started(&mut media, t);
        s.poll(ms(74_000), &mut media, t);
        assert_eq!(media.countdown_audio.volume, 0.5, "fade armed, not sampled");

        s.poll(ms(75_000), &mut media, t);
        assert!(
            (media.countdown_audio.volume - 0.25).abs() < 1e-9,
            "halfway volume {}",
            media.countdown_audio.volume
        );
        assert!((media.video.opacity - 0.5).abs() < 1e-9, "halfway opacity");

        s.poll(ms(76_000), &mut media, t);
        assert_eq!(media.countdown_audio.volume, 0.0, "silent at end");
        assert_eq!(media.video.opacity, 0.0, "clamped to zero");
    }

    #[test]
    fn termination_is_idempotent_and_clears_timers() {
        let mut media = fake_media_set();
        let t = &mut Tracer::none();
        let mut s = started(&mut media, t);
        s.poll(ms(74_100), &mut media, t);
        assert!(s.active_timers() >= 2, "drift and fade running");

        assert_eq!(s.on_ended(Channel::CountdownAudio), Some(EndCause::AudioEnded), "audio end");
        assert!(s.terminate(ms(74_200), EndCause::AudioEnded, t), "first call");
        assert_eq!(s.active_timers(), 0, "all cleared");
        assert!(!s.terminate(ms(74_300), EndCause::FallbackTimer, t), "second call");
        assert_eq!(s.active_timers(), 0, "still cleared");
        assert_eq!(s.end_cause(), Some(EndCause::AudioEnded), "first cause kept");
        assert_eq!(s.on_ended(Channel::CountdownVideo), None, "ended ignored after");
        assert_eq!(s.poll(ms(80_000), &mut media, t), None, "fallback cleared");
    }

    #[test]
    fn settlements_after_termination_are_ignored() {
        let mut media = fake_media_set();
        let t = &mut Tracer::none();
        let mut s = synchronizer();
        s.start(ms(0), &mut media, t);
        s.terminate(ms(5), EndCause::VideoEnded, t);
        s.on_play_settled(
            Channel::CountdownVideo,
            rejected(Channel::CountdownVideo),
            ms(6),
            t,
        );
        assert_eq!(s.active_timers(), 0, "no fallback armed after end");
    }
}
