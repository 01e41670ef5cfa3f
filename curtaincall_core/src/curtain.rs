// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The curtain reveal.
//!
//! The curtain rises once both a minimum delay has elapsed and the
//! [readiness gate](crate::readiness) has resolved, in either order. The two
//! conditions are tracked as independent flags and joined, so there is no
//! race between them: whichever arrives second raises the curtain.
//!
//! ```text
//!                 delay elapsed
//!   Holding ─────────────────────► AwaitingMedia ───┐
//!      │                                            │ readiness
//!      │ readiness                                  ▼
//!      └──────────────────────► AwaitingDelay ──► Raised
//!                                     delay elapsed
//! ```

use crate::media::{MediaElement, MediaSet};
use crate::readiness::ReadinessOutcome;
use crate::stage::{Stage, Surface};
use crate::time::{Duration, HostTime};
use crate::timer::take_due;
use crate::trace::{CurtainEvent, CurtainStage, Tracer};

/// Status text while readiness is pending.
pub const LOADING_TEXT: &str = "Loading video...";
/// Status text when the video became playable.
pub const READY_TEXT: &str = "Ready! Opening...";
/// Status text when proceeding without confirmed readiness.
pub const PROCEEDING_TEXT: &str = "Proceeding...";

/// Joins the minimum delay with media readiness and raises the curtain once.
#[derive(Clone, Debug)]
pub struct CurtainController {
    delay: Duration,
    delay_at: Option<HostTime>,
    min_delay_elapsed: bool,
    media_ready: Option<ReadinessOutcome>,
    raised_at: Option<HostTime>,
    stage: CurtainStage,
    started: bool,
}

impl CurtainController {
    /// Creates a controller with the given minimum delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            delay_at: None,
            min_delay_elapsed: false,
            media_ready: None,
            raised_at: None,
            stage: CurtainStage::Holding,
            started: false,
        }
    }

    /// Starts the minimum delay and shows the loading text.
    pub fn begin<S: Stage>(&mut self, now: HostTime, stage: &mut S, tracer: &mut Tracer<'_>) {
        if self.started {
            return;
        }
        self.started = true;
        self.delay_at = Some(now.saturating_add(self.delay));
        stage.set_text(Surface::LoadingIndicator, LOADING_TEXT);
        self.enter(now, CurtainStage::Holding, tracer);
    }

    /// Checks the minimum delay. Returns `true` if the curtain rose.
    pub fn poll<M: MediaElement, S: Stage>(
        &mut self,
        now: HostTime,
        media: &mut MediaSet<M>,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if !take_due(&mut self.delay_at, now) {
            return false;
        }
        self.min_delay_elapsed = true;
        if self.media_ready.is_none() {
            self.enter(now, CurtainStage::AwaitingMedia, tracer);
            return false;
        }
        self.raise(now, media, stage, tracer)
    }

    /// Records the readiness outcome. Returns `true` if the curtain rose.
    pub fn on_readiness<M: MediaElement, S: Stage>(
        &mut self,
        outcome: ReadinessOutcome,
        now: HostTime,
        media: &mut MediaSet<M>,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.media_ready.is_some() {
            return false;
        }
        self.media_ready = Some(outcome);
        let text = if outcome.is_ready() {
            READY_TEXT
        } else {
            PROCEEDING_TEXT
        };
        stage.set_text(Surface::LoadingIndicator, text);
        if !self.min_delay_elapsed {
            self.enter(now, CurtainStage::AwaitingDelay, tracer);
            return false;
        }
        self.raise(now, media, stage, tracer)
    }

    fn raise<M: MediaElement, S: Stage>(
        &mut self,
        now: HostTime,
        media: &mut MediaSet<M>,
        stage: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.raised_at.is_some() {
            return false;
        }
        self.raised_at = Some(now);
        stage.add_class(Surface::Curtain, "raised");
        media.countdown_audio.set_muted(false);
        media.yes_cue.set_muted(false);
        media.final_cue.set_muted(false);
        media.no_cue.set_muted(false);
        self.enter(now, CurtainStage::Raised, tracer);
        true
    }

    fn enter(&mut self, at: HostTime, stage: CurtainStage, tracer: &mut Tracer<'_>) {
        self.stage = stage;
        tracer.curtain(&CurtainEvent { at, stage });
    }

    /// The current stage.
    #[must_use]
    pub const fn stage(&self) -> CurtainStage {
        self.stage
    }

    /// When the curtain rose, if it has.
    #[must_use]
    pub const fn raised_at(&self) -> Option<HostTime> {
        self.raised_at
    }

    /// Whether the curtain is up.
    #[must_use]
    pub const fn is_raised(&self) -> bool {
        self.raised_at.is_some()
    }

    /// Pending timers (the minimum delay).
    #[must_use]
    pub fn active_timers(&self) -> usize {
        usize::from(self.delay_at.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingStage, fake_media_set};
    use crate::time::Timebase;

    const TB: Timebase = Timebase::MICROS;

    fn ms(v: u64) -> HostTime {
        HostTime(v * 1000)
    }

    fn controller() -> CurtainController {
        CurtainController::new(Duration::from_millis(3000, TB))
    }

    #[test]
    fn readiness_first_then_delay() {
        let mut media = fake_media_set();
        media.countdown_audio.muted = true;
        let mut stage = RecordingStage::default();
        let t = &mut Tracer::none();
        let mut c = controller();
        c.begin(ms(0), &mut stage, t);
        assert_eq!(stage.text(Surface::LoadingIndicator), Some(LOADING_TEXT), "loading");

        let rose = c.on_readiness(ReadinessOutcome::Ready, ms(500), &mut media, &mut stage, t);
        assert!(!rose, "delay still pending");
        assert_eq!(c.stage(), CurtainStage::AwaitingDelay, "awaiting delay");
        assert_eq!(stage.text(Surface::LoadingIndicator), Some(READY_TEXT), "ready text");

        assert!(!c.poll(ms(2_999), &mut media, &mut stage, t), "too early");
        assert!(c.poll(ms(3_000), &mut media, &mut stage, t), "rises on delay");
        assert!(stage.has_class(Surface::Curtain, "raised"), "raised class");
        assert!(!media.countdown_audio.muted, "countdown audio unmuted");
        assert_eq!(c.raised_at(), Some(ms(3_000)), "raise time");
    }

    #[test]
    fn delay_first_then_readiness() {
        let mut media = fake_media_set();
        let mut stage = RecordingStage::default();
        let t = &mut Tracer::none();
        let mut c = controller();
        c.begin(ms(0), &mut stage, t);
        assert!(!c.poll(ms(3_000), &mut media, &mut stage, t), "media pending");
        assert_eq!(c.stage(), CurtainStage::AwaitingMedia, "awaiting media");
        assert!(!stage.has_class(Surface::Curtain, "raised"), "still down");

        let rose = c.on_readiness(
            ReadinessOutcome::BestEffort,
            ms(11_000),
            &mut media,
            &mut stage,
            t,
        );
        assert!(rose, "rises on readiness");
        assert_eq!(
            stage.text(Surface::LoadingIndicator),
            Some(PROCEEDING_TEXT),
            "degraded text"
        );
        assert_eq!(c.active_timers(), 0, "delay consumed");
    }

    #[test]
    fn rises_exactly_once() {
        let mut media = fake_media_set();
        let mut stage = RecordingStage::default();
        let t = &mut Tracer::none();
        let mut c = controller();
        c.begin(ms(0), &mut stage, t);
        c.begin(ms(10), &mut stage, t);
        c.on_readiness(ReadinessOutcome::Ready, ms(0), &mut media, &mut stage, t);
        c.on_readiness(ReadinessOutcome::Recovered, ms(1), &mut media, &mut stage, t);
        c.poll(ms(3_000), &mut media, &mut stage, t);
        c.poll(ms(6_000), &mut media, &mut stage, t);
        assert_eq!(stage.class_count(Surface::Curtain, "raised"), 1, "one raise");
        assert_eq!(c.raised_at(), Some(ms(3_000)), "second begin ignored");
    }
}
