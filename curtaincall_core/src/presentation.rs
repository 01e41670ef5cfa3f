// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The session orchestrator.
//!
//! [`Presentation`] owns the media set, the stage and every state machine,
//! and is the only type a backend talks to. The backend forwards platform
//! events (`on_*`) as they happen and calls [`poll`](Presentation::poll) at a
//! fixed cadence; every timer in the session is a deadline checked there.
//!
//! ## Ordering
//!
//! - The curtain rises only after both the minimum delay and readiness.
//! - The countdown starts a short delay after the curtain rose, and never
//!   before.
//! - The phase transition fires only from a started countdown, exactly once.
//! - The "No" and "Yes" buttons respond only once the letter is shown.

use kurbo::Vec2;

use crate::confirm::{ConfirmationOutcome, YesConfirmation};
use crate::config::PresentationConfig;
use crate::countdown::CountdownSynchronizer;
use crate::curtain::CurtainController;
use crate::error::{ConfigError, PlayRejected};
use crate::evasion::EvasiveButton;
use crate::media::{Channel, MediaElement, MediaEvent, MediaSet};
use crate::readiness::{ReadinessGate, ReadinessOutcome};
use crate::stage::{ButtonId, ButtonPlacement, Stage};
use crate::time::{Duration, HostTime, Timebase};
use crate::timer::take_due;
use crate::trace::{EndCause, EvasionAction, PlaybackAction, PlaybackEvent, Tracer};
use crate::transition::{Phase, PhaseTransition};
use crate::visibility::VisibilityRecovery;

/// Why the layout may have changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutCause {
    /// The viewport was resized; re-layout immediately.
    Resize,
    /// The device rotated; re-layout once the layout settles.
    Orientation,
    /// Fullscreen was entered or left; re-layout once the layout settles.
    Fullscreen,
}

/// One complete session.
#[derive(Debug)]
pub struct Presentation<M, S> {
    config: PresentationConfig,
    media: MediaSet<M>,
    stage: S,
    gate: ReadinessGate,
    curtain: CurtainController,
    countdown: CountdownSynchronizer,
    visibility: VisibilityRecovery,
    transition: PhaseTransition,
    evasion: EvasiveButton,
    confirmation: YesConfirmation,
    pre_countdown: Duration,
    layout_settle: Duration,
    countdown_at: Option<HostTime>,
    layout_at: Option<HostTime>,
    started: bool,
}

impl<M: MediaElement, S: Stage> Presentation<M, S> {
    /// Builds a session after validating `config`.
    pub fn new(
        config: PresentationConfig,
        timebase: Timebase,
        media: MediaSet<M>,
        stage: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gate: ReadinessGate::new(&config, timebase),
            curtain: CurtainController::new(Duration::from_millis(
                config.curtain_delay_ms,
                timebase,
            )),
            countdown: CountdownSynchronizer::new(&config, timebase),
            visibility: VisibilityRecovery::new(),
            transition: PhaseTransition::new(&config, timebase),
            evasion: EvasiveButton::new(&config),
            confirmation: YesConfirmation::new(config.confirmation, config.final_cue_volume),
            pre_countdown: Duration::from_millis(config.pre_countdown_delay_ms, timebase),
            layout_settle: Duration::from_millis(config.layout_settle_ms, timebase),
            countdown_at: None,
            layout_at: None,
            started: false,
            config,
            media,
            stage,
        })
    }

    /// Sets the initial audio levels, lowers the curtain and starts loading.
    ///
    /// Calling this more than once is a no-op.
    pub fn start(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        if self.started {
            return;
        }
        self.started = true;

        let media = &mut self.media;
        media.music.set_volume(self.config.music_initial_volume);
        media.music.set_muted(true);
        media.countdown_audio.set_volume(self.config.countdown_volume);
        media.countdown_audio.set_muted(true);
        media.yes_cue.set_muted(true);
        media.final_cue.set_volume(self.config.cue_volume);
        media.final_cue.set_muted(true);
        media.no_cue.set_volume(self.config.cue_volume);
        media.no_cue.set_muted(true);

        self.curtain.begin(now, &mut self.stage, tracer);
        if let Some(outcome) = self.gate.begin(now, &mut self.media.video, tracer) {
            self.on_readiness(outcome, now, tracer);
        }
    }

    /// Advances every timer to `now`.
    pub fn poll(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        if let Some(outcome) = self.gate.poll(now, &mut self.media.video, tracer) {
            self.on_readiness(outcome, now, tracer);
        }
        if self
            .curtain
            .poll(now, &mut self.media, &mut self.stage, tracer)
        {
            self.schedule_countdown(now);
        }
        if take_due(&mut self.countdown_at, now) {
            self.countdown.start(now, &mut self.media, tracer);
        }
        if let Some(cause) = self.countdown.poll(now, &mut self.media, tracer) {
            self.end_countdown(cause, now, tracer);
        }
        self.transition
            .poll(now, &mut self.media, &mut self.stage, tracer);
        if take_due(&mut self.layout_at, now) {
            self.relayout(tracer);
        }
    }

    /// Forwards a media element signal.
    pub fn on_media_event(
        &mut self,
        channel: Channel,
        event: MediaEvent,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        if event == MediaEvent::Ended {
            if let Some(cause) = self.countdown.on_ended(channel) {
                self.end_countdown(cause, now, tracer);
            }
            return;
        }
        if channel == Channel::CountdownVideo
            && let Some(outcome) = self
                .gate
                .on_media_event(event, now, &self.media.video, tracer)
        {
            self.on_readiness(outcome, now, tracer);
        }
    }

    /// Forwards the outcome of an earlier `request_play`.
    pub fn on_play_settled(
        &mut self,
        channel: Channel,
        result: Result<(), PlayRejected>,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        match channel {
            Channel::CountdownVideo | Channel::CountdownAudio => {
                if !self
                    .countdown
                    .on_play_settled(channel, result.clone(), now, tracer)
                {
                    self.visibility
                        .on_play_settled(channel, result, now, tracer);
                }
            }
            Channel::Music => self.transition.on_play_settled(result, now, tracer),
            Channel::YesCue | Channel::FinalCue | Channel::NoCue => {
                if result.is_err() {
                    tracer.playback(&PlaybackEvent {
                        at: now,
                        channel,
                        action: PlaybackAction::Rejected,
                    });
                }
            }
        }
    }

    /// Forwards a page visibility change.
    pub fn on_visibility_change(&mut self, hidden: bool, now: HostTime, tracer: &mut Tracer<'_>) {
        self.visibility.on_change(
            hidden,
            self.countdown.is_active(),
            now,
            &mut self.media,
            tracer,
        );
    }

    /// Any pointer press on the page.
    pub fn on_pointer_down(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.transition
            .on_pointer_down(now, &mut self.media, tracer);
    }

    /// A click on the envelope.
    pub fn on_envelope_click(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.transition
            .on_envelope_click(now, &mut self.stage, tracer);
    }

    /// A hover or touch on the live "No" button; `angle` is the step
    /// direction in radians.
    pub fn on_no_interaction(
        &mut self,
        angle: f64,
        tracer: &mut Tracer<'_>,
    ) -> Option<EvasionAction> {
        if self.phase() != Phase::Letter || self.confirmation.is_accepted() {
            return None;
        }
        let geometry = self.stage.geometry(self.evasion.floating());
        Some(self.evasion.on_interaction(
            angle,
            &geometry,
            &mut self.media,
            &mut self.stage,
            tracer,
        ))
    }

    /// A click on a "Yes" button (the original or the converted one).
    pub fn on_yes_click(
        &mut self,
        button: ButtonId,
        tracer: &mut Tracer<'_>,
    ) -> Option<ConfirmationOutcome> {
        if self.phase() != Phase::Letter {
            return None;
        }
        let outcome = self
            .confirmation
            .on_click(&mut self.media, &mut self.stage, tracer);
        if let ConfirmationOutcome::Escalated { scale } = outcome {
            match button {
                ButtonId::ConvertedYes => self.evasion.scale_converted(scale, &mut self.stage),
                _ => self.stage.place_button(
                    ButtonId::Yes,
                    ButtonPlacement {
                        offset: Vec2::ZERO,
                        scale,
                    },
                ),
            }
        }
        Some(outcome)
    }

    /// The viewport, orientation or fullscreen state changed.
    pub fn on_layout_change(&mut self, cause: LayoutCause, now: HostTime, tracer: &mut Tracer<'_>) {
        match cause {
            LayoutCause::Resize => self.relayout(tracer),
            LayoutCause::Orientation | LayoutCause::Fullscreen => {
                self.layout_at = Some(now.saturating_add(self.layout_settle));
            }
        }
    }

    fn on_readiness(&mut self, outcome: ReadinessOutcome, now: HostTime, tracer: &mut Tracer<'_>) {
        if self
            .curtain
            .on_readiness(outcome, now, &mut self.media, &mut self.stage, tracer)
        {
            self.schedule_countdown(now);
        }
    }

    fn schedule_countdown(&mut self, now: HostTime) {
        self.countdown_at = Some(now.saturating_add(self.pre_countdown));
    }

    fn end_countdown(&mut self, cause: EndCause, now: HostTime, tracer: &mut Tracer<'_>) {
        if self.countdown.terminate(now, cause, tracer) {
            self.transition
                .fire(now, &mut self.media, &mut self.stage, tracer);
        }
    }

    fn relayout(&mut self, tracer: &mut Tracer<'_>) {
        let geometry = self.stage.geometry(self.evasion.floating());
        self.evasion
            .on_layout_change(&geometry, &mut self.stage, tracer);
    }

    /// The phase on screen.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.transition.has_fired() {
            self.transition.phase()
        } else if self.countdown.session().is_some() {
            Phase::Countdown
        } else {
            Phase::Curtain
        }
    }

    /// Armed timers across every component.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        self.gate.active_timers()
            + self.curtain.active_timers()
            + self.countdown.active_timers()
            + self.transition.active_timers()
            + usize::from(self.countdown_at.is_some())
            + usize::from(self.layout_at.is_some())
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &PresentationConfig {
        &self.config
    }

    /// The media elements.
    #[must_use]
    pub const fn media(&self) -> &MediaSet<M> {
        &self.media
    }

    /// Mutable access to the media elements.
    pub fn media_mut(&mut self) -> &mut MediaSet<M> {
        &mut self.media
    }

    /// The stage.
    #[must_use]
    pub const fn stage(&self) -> &S {
        &self.stage
    }

    /// Mutable access to the stage.
    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    /// The readiness gate.
    #[must_use]
    pub const fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// The curtain.
    #[must_use]
    pub const fn curtain(&self) -> &CurtainController {
        &self.curtain
    }

    /// The countdown synchronizer.
    #[must_use]
    pub const fn countdown(&self) -> &CountdownSynchronizer {
        &self.countdown
    }

    /// The phase transition.
    #[must_use]
    pub const fn transition(&self) -> &PhaseTransition {
        &self.transition
    }

    /// The visibility handler.
    #[must_use]
    pub const fn visibility(&self) -> &VisibilityRecovery {
        &self.visibility
    }

    /// The "No" button.
    #[must_use]
    pub const fn evasion(&self) -> &EvasiveButton {
        &self.evasion
    }

    /// The "Yes" sequence.
    #[must_use]
    pub const fn confirmation(&self) -> &YesConfirmation {
        &self.confirmation
    }
}
