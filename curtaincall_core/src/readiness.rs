// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Media readiness gate.
//!
//! [`ReadinessGate`] decides when the countdown video is playable. After
//! issuing `load()` it races three signals (`loadedmetadata`, `canplay`,
//! `canplaythrough`) and a periodic decoded-readiness poll against a timeout.
//! If the timeout wins it runs one recovery: the source is reloaded with a
//! cache-busting query parameter and given a fixed window to become
//! playable.
//!
//! The gate never fails. It resolves exactly once, to a
//! [`ReadinessOutcome`] that tells the caller how confident it may be, and
//! every timer and signal subscription is dropped on every resolving path.
//!
//! ```text
//!   Unloaded ──begin──► Loading ──signal/poll──► Ready
//!                          │
//!                       timeout
//!                          ▼
//!                  RecoveryAttempted ──canplay──► Ready
//!                          │
//!                     window elapsed
//!                          ▼
//!                       TimedOut
//! ```

use crate::config::PresentationConfig;
use crate::media::{MediaElement, MediaEvent, cache_busted};
use crate::time::{Duration, HostTime, Timebase};
use crate::timer::{Interval, take_due};
use crate::trace::{ReadinessEvent, ReadinessReason, Tracer};

/// Where the gate is in its lifecycle.
///
/// Transitions are monotonic in declaration order, except that
/// `RecoveryAttempted` may still reach `Ready`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadinessState {
    /// `begin` has not been called.
    Unloaded,
    /// Waiting for a readiness signal, the poll, or the timeout.
    Loading,
    /// The video is (believed) playable.
    Ready,
    /// The timeout elapsed and a cache-busted reload is in flight.
    RecoveryAttempted,
    /// The recovery window elapsed without the video becoming playable.
    TimedOut,
}

/// How the gate resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadinessOutcome {
    /// Playable before the timeout.
    Ready,
    /// Playable after the cache-busted reload.
    Recovered,
    /// Not known to be playable; the caller proceeds anyway.
    BestEffort,
}

impl ReadinessOutcome {
    /// Whether the video was seen to become playable.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::Recovered)
    }
}

/// Timeout-bounded readiness detection with one recovery attempt.
#[derive(Clone, Debug)]
pub struct ReadinessGate {
    state: ReadinessState,
    outcome: Option<ReadinessOutcome>,
    timebase: Timebase,
    timeout: Duration,
    recovery_window: Duration,
    poll_period: Duration,
    timeout_at: Option<HostTime>,
    poll: Option<Interval>,
    recovery_deadline: Option<HostTime>,
    listening: bool,
    recovery_attempts: u32,
}

impl ReadinessGate {
    /// Creates an idle gate.
    #[must_use]
    pub fn new(config: &PresentationConfig, timebase: Timebase) -> Self {
        Self {
            state: ReadinessState::Unloaded,
            outcome: None,
            timebase,
            timeout: Duration::from_millis(config.video_timeout_ms, timebase),
            recovery_window: Duration::from_millis(config.recovery_window_ms, timebase),
            poll_period: Duration::from_millis(config.ready_poll_ms, timebase),
            timeout_at: None,
            poll: None,
            recovery_deadline: None,
            listening: false,
            recovery_attempts: 0,
        }
    }

    /// Issues `load()` and starts racing the readiness signals.
    ///
    /// Returns the outcome immediately if the video is already playable.
    /// Calling this more than once is a no-op.
    pub fn begin<M: MediaElement>(
        &mut self,
        now: HostTime,
        video: &mut M,
        tracer: &mut Tracer<'_>,
    ) -> Option<ReadinessOutcome> {
        if self.state != ReadinessState::Unloaded {
            return None;
        }
        video.load();
        self.state = ReadinessState::Loading;
        emit(tracer, now, ReadinessReason::LoadStarted, video);

        if video.ready_state().is_playable() {
            emit(tracer, now, ReadinessReason::AlreadyPlayable, video);
            return self.resolve(ReadinessState::Ready, ReadinessOutcome::Ready);
        }

        self.timeout_at = Some(now.saturating_add(self.timeout));
        self.poll = Some(Interval::starting_at(now, self.poll_period));
        self.listening = true;
        None
    }

    /// Feeds a media signal from the video element.
    pub fn on_media_event<M: MediaElement>(
        &mut self,
        event: MediaEvent,
        now: HostTime,
        video: &M,
        tracer: &mut Tracer<'_>,
    ) -> Option<ReadinessOutcome> {
        if !self.listening {
            return None;
        }
        match (self.state, event) {
            (
                ReadinessState::Loading,
                MediaEvent::LoadedMetadata | MediaEvent::CanPlay | MediaEvent::CanPlayThrough,
            ) => {
                emit(tracer, now, ReadinessReason::Signal, video);
                self.resolve(ReadinessState::Ready, ReadinessOutcome::Ready)
            }
            (ReadinessState::RecoveryAttempted, MediaEvent::CanPlay) => {
                emit(tracer, now, ReadinessReason::Recovered, video);
                self.resolve(ReadinessState::Ready, ReadinessOutcome::Recovered)
            }
            _ => None,
        }
    }

    /// Advances the poll, the timeout and the recovery window.
    pub fn poll<M: MediaElement>(
        &mut self,
        now: HostTime,
        video: &mut M,
        tracer: &mut Tracer<'_>,
    ) -> Option<ReadinessOutcome> {
        match self.state {
            ReadinessState::Loading => {
                let poll_due = self.poll.as_mut().is_some_and(|p| p.fire(now));
                if poll_due && video.ready_state().is_playable() {
                    emit(tracer, now, ReadinessReason::Poll, video);
                    return self.resolve(ReadinessState::Ready, ReadinessOutcome::Ready);
                }
                if take_due(&mut self.timeout_at, now) {
                    self.recover(now, video, tracer);
                }
                None
            }
            ReadinessState::RecoveryAttempted => {
                if take_due(&mut self.recovery_deadline, now) {
                    emit(tracer, now, ReadinessReason::RecoveryWindowElapsed, video);
                    return self.resolve(ReadinessState::TimedOut, ReadinessOutcome::BestEffort);
                }
                None
            }
            ReadinessState::Unloaded | ReadinessState::Ready | ReadinessState::TimedOut => None,
        }
    }

    /// Reloads the video with a cache-busted source and opens the recovery window.
    fn recover<M: MediaElement>(&mut self, now: HostTime, video: &mut M, tracer: &mut Tracer<'_>) {
        self.poll = None;
        self.timeout_at = None;
        self.recovery_attempts += 1;

        video.pause();
        video.set_current_time(0.0);
        if let Some(src) = video.source() {
            video.set_source(&cache_busted(&src, now.to_millis(self.timebase)));
        }
        video.load();

        self.state = ReadinessState::RecoveryAttempted;
        self.recovery_deadline = Some(now.saturating_add(self.recovery_window));
        emit(tracer, now, ReadinessReason::TimedOutRecovering, video);
    }

    fn resolve(
        &mut self,
        state: ReadinessState,
        outcome: ReadinessOutcome,
    ) -> Option<ReadinessOutcome> {
        self.state = state;
        self.timeout_at = None;
        self.poll = None;
        self.recovery_deadline = None;
        self.listening = false;
        self.outcome = Some(outcome);
        Some(outcome)
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ReadinessState {
        self.state
    }

    /// The resolved outcome, once there is one.
    #[must_use]
    pub const fn outcome(&self) -> Option<ReadinessOutcome> {
        self.outcome
    }

    /// How many recovery reloads were issued (0 or 1).
    #[must_use]
    pub const fn recovery_attempts(&self) -> u32 {
        self.recovery_attempts
    }

    /// Pending timers plus the signal subscription.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        usize::from(self.timeout_at.is_some())
            + usize::from(self.poll.is_some())
            + usize::from(self.recovery_deadline.is_some())
            + usize::from(self.listening)
    }
}

fn emit<M: MediaElement>(
    tracer: &mut Tracer<'_>,
    at: HostTime,
    reason: ReadinessReason,
    video: &M,
) {
    tracer.readiness(&ReadinessEvent {
        at,
        reason,
        ready_state: video.ready_state(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ReadyState;
    use crate::testing::FakeMedia;

    const TB: Timebase = Timebase::MICROS;

    fn ms(v: u64) -> HostTime {
        HostTime(v * 1000)
    }

    fn gate() -> ReadinessGate {
        ReadinessGate::new(&PresentationConfig::canonical(), TB)
    }

    #[test]
    fn already_playable_resolves_immediately() {
        let mut video = FakeMedia::with_source("v.mp4");
        video.ready = ReadyState::HaveEnoughData;
        let mut g = gate();
        let out = g.begin(ms(0), &mut video, &mut Tracer::none());
        assert_eq!(out, Some(ReadinessOutcome::Ready), "short-circuit");
        assert_eq!(video.loads, 1, "load issued first");
        assert_eq!(g.active_timers(), 0, "nothing pending");
    }

    #[test]
    fn any_signal_resolves_once() {
        let mut video = FakeMedia::with_source("v.mp4");
        let mut g = gate();
        let t = &mut Tracer::none();
        assert_eq!(g.begin(ms(0), &mut video, t), None, "pending");
        assert_eq!(g.active_timers(), 3, "timeout, poll, listener");

        let out = g.on_media_event(MediaEvent::LoadedMetadata, ms(100), &video, t);
        assert_eq!(out, Some(ReadinessOutcome::Ready), "metadata wins");
        assert_eq!(g.active_timers(), 0, "all cleared");

        let again = g.on_media_event(MediaEvent::CanPlay, ms(110), &video, t);
        assert_eq!(again, None, "resolves exactly once");
        assert_eq!(g.poll(ms(9_000), &mut video, t), None, "timeout cleared");
        assert_eq!(g.recovery_attempts(), 0, "no recovery");
    }

    #[test]
    fn poll_detects_decoded_readiness() {
        let mut video = FakeMedia::with_source("v.mp4");
        let mut g = gate();
        let t = &mut Tracer::none();
        g.begin(ms(0), &mut video, t);
        assert_eq!(g.poll(ms(200), &mut video, t), None, "not ready yet");
        video.ready = ReadyState::HaveCurrentData;
        assert_eq!(g.poll(ms(300), &mut video, t), None, "between polls");
        assert_eq!(
            g.poll(ms(400), &mut video, t),
            Some(ReadinessOutcome::Ready),
            "poll sample"
        );
        assert_eq!(g.state(), ReadinessState::Ready, "ready");
    }

    #[test]
    fn timeout_triggers_single_cache_busted_recovery() {
        let mut video = FakeMedia::with_source("v.mp4");
        let mut g = gate();
        let t = &mut Tracer::none();
        g.begin(ms(0), &mut video, t);
        video.time = 3.0;

        assert_eq!(g.poll(ms(7_999), &mut video, t), None, "before timeout");
        assert_eq!(g.recovery_attempts(), 0, "not yet");
        assert_eq!(g.poll(ms(8_000), &mut video, t), None, "recovery pending");
        assert_eq!(g.state(), ReadinessState::RecoveryAttempted, "recovering");
        assert_eq!(g.recovery_attempts(), 1, "one attempt");
        assert_eq!(video.src.as_deref(), Some("v.mp4?t=8000"), "cache-busted");
        assert_eq!(video.loads, 2, "reloaded");
        assert!(video.paused, "paused for reload");
        assert_eq!(video.time, 0.0, "rewound");

        // Initial signals no longer count once recovery started.
        assert_eq!(
            g.on_media_event(MediaEvent::LoadedMetadata, ms(9_000), &video, t),
            None,
            "only canplay resolves recovery"
        );
        assert_eq!(
            g.on_media_event(MediaEvent::CanPlay, ms(10_000), &video, t),
            Some(ReadinessOutcome::Recovered),
            "recovered"
        );
        assert_eq!(g.state(), ReadinessState::Ready, "recovery -> ready");
        assert_eq!(g.active_timers(), 0, "recovery window cleared");
        assert_eq!(g.poll(ms(20_000), &mut video, t), None, "stays resolved");
        assert_eq!(g.recovery_attempts(), 1, "exactly once");
    }

    #[test]
    fn recovery_window_elapses_best_effort() {
        let mut video = FakeMedia::with_source("v.mp4");
        let mut g = gate();
        let t = &mut Tracer::none();
        g.begin(ms(0), &mut video, t);
        g.poll(ms(8_000), &mut video, t);
        assert_eq!(g.poll(ms(10_999), &mut video, t), None, "window open");
        assert_eq!(
            g.poll(ms(11_000), &mut video, t),
            Some(ReadinessOutcome::BestEffort),
            "proceeds anyway"
        );
        assert_eq!(g.state(), ReadinessState::TimedOut, "timed out");
        assert_eq!(g.active_timers(), 0, "nothing dangling");
        assert!(!g.outcome().is_some_and(ReadinessOutcome::is_ready), "not ready");
    }

    #[test]
    fn recovery_without_source_still_reloads() {
        let mut video = FakeMedia::default();
        let mut g = gate();
        let t = &mut Tracer::none();
        g.begin(ms(0), &mut video, t);
        g.poll(ms(8_000), &mut video, t);
        assert_eq!(video.src, None, "no source to bust");
        assert_eq!(video.loads, 2, "load still issued");
    }
}
