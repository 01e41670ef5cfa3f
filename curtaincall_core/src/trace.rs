// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for a session.
//!
//! This module provides a [`TraceSink`] trait with one method per session
//! event. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing. When **on**,
//! each method performs a single `Option` branch before dispatching.
//!
//! Every event carries the host time it happened at and a [`Severity`] so
//! console-style sinks can route it without knowing the event's meaning.

use kurbo::Vec2;

use crate::media::{Channel, ReadyState};
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How loudly a sink should report an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Routine progress.
    Info,
    /// Degraded but recovered.
    Warn,
    /// A failure the session worked around.
    Error,
}

/// Why the readiness gate changed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadinessReason {
    /// `load()` was issued.
    LoadStarted,
    /// Already playable right after `load()`.
    AlreadyPlayable,
    /// One of the readiness signals fired.
    Signal,
    /// The decoded-readiness poll saw a playable state.
    Poll,
    /// The timeout elapsed; a cache-busted reload was issued.
    TimedOutRecovering,
    /// The reload became playable inside the recovery window.
    Recovered,
    /// The recovery window elapsed; proceeding best-effort.
    RecoveryWindowElapsed,
}

/// Which named stage of the curtain sequence was entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CurtainStage {
    /// Waiting for the minimum delay and media readiness.
    Holding,
    /// The minimum delay has elapsed; readiness still pending.
    AwaitingMedia,
    /// Readiness resolved; the minimum delay still pending.
    AwaitingDelay,
    /// The curtain is up.
    Raised,
}

/// What happened to a playback request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackAction {
    /// `play()` was requested.
    Requested,
    /// The element started playing.
    Started,
    /// The element refused to play.
    Rejected,
    /// A fallback end-of-countdown timer was armed after a rejection.
    FallbackArmed,
    /// Drift correction began.
    SyncStarted,
}

/// What ended the countdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndCause {
    /// The countdown audio emitted `ended`.
    AudioEnded,
    /// The countdown video emitted `ended`.
    VideoEnded,
    /// The nominal-duration-plus-grace timer fired.
    FallbackTimer,
    /// A rejected start's nominal-duration timer fired.
    PlaybackFailure,
}

/// A phase-level change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseChange {
    /// The envelope replaced the countdown.
    EnvelopeShown,
    /// The music fade-in finished and the countdown media was parked.
    MusicFadeComplete,
    /// Music autoplay was rejected; retry deferred to the next gesture.
    MusicDeferred,
    /// The deferred music start was retried on a gesture.
    MusicRetried,
    /// The letter replaced the envelope.
    LetterShown,
    /// The letter window animated open.
    LetterOpened,
}

/// What the visibility handler did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisibilityAction {
    /// Countdown not active; nothing to do.
    Ignored,
    /// Both elements paused in place.
    Paused,
    /// Video re-seeked to the audio clock and both resumed.
    Resumed,
}

/// What the evasive button did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvasionAction {
    /// The static button was swapped for a floating one.
    Spawned,
    /// The floating button moved.
    Moved,
    /// The floating button became a "Yes" button.
    Converted,
    /// A layout change re-clamped or re-aligned a floating button.
    Repositioned,
    /// Layout was unavailable; the interaction was skipped.
    GeometryUnavailable,
}

/// What a "Yes" click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfirmationAction {
    /// Prompt escalated and button grew.
    Escalated,
    /// Terminal acceptance.
    Accepted,
    /// Click after acceptance; ignored.
    Ignored,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the readiness gate changes state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadinessEvent {
    /// When it happened.
    pub at: HostTime,
    /// Why it happened.
    pub reason: ReadinessReason,
    /// The video's ready state at that moment.
    pub ready_state: ReadyState,
}

/// Emitted when the curtain sequence enters a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurtainEvent {
    /// When it happened.
    pub at: HostTime,
    /// The stage entered.
    pub stage: CurtainStage,
}

/// Emitted for playback requests and their outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackEvent {
    /// When it happened.
    pub at: HostTime,
    /// Which element.
    pub channel: Channel,
    /// What happened.
    pub action: PlaybackAction,
}

/// Emitted on every drift check that ran.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriftEvent {
    /// When it happened.
    pub at: HostTime,
    /// Video position in seconds before any correction.
    pub video_time: f64,
    /// Audio position in seconds (the reference clock).
    pub audio_time: f64,
    /// Whether the video was re-seeked.
    pub corrected: bool,
}

/// Emitted once when the countdown terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountdownEndEvent {
    /// When it happened.
    pub at: HostTime,
    /// The trigger that won.
    pub cause: EndCause,
}

/// Emitted on phase-level changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseEvent {
    /// When it happened.
    pub at: HostTime,
    /// What changed.
    pub change: PhaseChange,
}

/// Emitted for every visibility change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityEvent {
    /// When it happened.
    pub at: HostTime,
    /// Whether the page became hidden.
    pub hidden: bool,
    /// What the handler did.
    pub action: VisibilityAction,
}

/// Emitted for every evasive-button interaction or re-layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvasionEvent {
    /// Interaction count after this event.
    pub move_count: u32,
    /// What happened.
    pub action: EvasionAction,
    /// The button's offset from its anchor after this event.
    pub offset: Vec2,
}

/// Emitted for every "Yes" click.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfirmationEvent {
    /// Click count after this event.
    pub click_count: u32,
    /// What happened.
    pub action: ConfirmationAction,
    /// Scale applied to the clicked button.
    pub scale: f64,
}

impl ReadinessEvent {
    /// Severity for console-style sinks.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self.reason {
            ReadinessReason::TimedOutRecovering => Severity::Error,
            ReadinessReason::RecoveryWindowElapsed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl PlaybackEvent {
    /// Severity for console-style sinks.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self.action {
            PlaybackAction::Rejected => Severity::Error,
            PlaybackAction::FallbackArmed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl PhaseEvent {
    /// Severity for console-style sinks.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self.change {
            PhaseChange::MusicDeferred => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl EvasionEvent {
    /// Severity for console-style sinks.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self.action {
            EvasionAction::GeometryUnavailable => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a session.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when the readiness gate changes state.
    fn on_readiness(&mut self, e: &ReadinessEvent) {
        _ = e;
    }

    /// Called when the curtain sequence enters a stage.
    fn on_curtain(&mut self, e: &CurtainEvent) {
        _ = e;
    }

    /// Called for playback requests and outcomes.
    fn on_playback(&mut self, e: &PlaybackEvent) {
        _ = e;
    }

    /// Called after every drift check.
    fn on_drift(&mut self, e: &DriftEvent) {
        _ = e;
    }

    /// Called once when the countdown ends.
    fn on_countdown_end(&mut self, e: &CountdownEndEvent) {
        _ = e;
    }

    /// Called on phase-level changes.
    fn on_phase(&mut self, e: &PhaseEvent) {
        _ = e;
    }

    /// Called on visibility changes.
    fn on_visibility(&mut self, e: &VisibilityEvent) {
        _ = e;
    }

    /// Called on evasive-button interactions.
    fn on_evasion(&mut self, e: &EvasionEvent) {
        _ = e;
    }

    /// Called on "Yes" clicks.
    fn on_confirmation(&mut self, e: &ConfirmationEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($(#[$doc:meta])* $name:ident, $method:ident, $event:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$event) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    dispatch!(
        /// Emits a [`ReadinessEvent`].
        readiness, on_readiness, ReadinessEvent
    );
    dispatch!(
        /// Emits a [`CurtainEvent`].
        curtain, on_curtain, CurtainEvent
    );
    dispatch!(
        /// Emits a [`PlaybackEvent`].
        playback, on_playback, PlaybackEvent
    );
    dispatch!(
        /// Emits a [`DriftEvent`].
        drift, on_drift, DriftEvent
    );
    dispatch!(
        /// Emits a [`CountdownEndEvent`].
        countdown_end, on_countdown_end, CountdownEndEvent
    );
    dispatch!(
        /// Emits a [`PhaseEvent`].
        phase, on_phase, PhaseEvent
    );
    dispatch!(
        /// Emits a [`VisibilityEvent`].
        visibility, on_visibility, VisibilityEvent
    );
    dispatch!(
        /// Emits an [`EvasionEvent`].
        evasion, on_evasion, EvasionEvent
    );
    dispatch!(
        /// Emits a [`ConfirmationEvent`].
        confirmation, on_confirmation, ConfirmationEvent
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities() {
        let timeout = ReadinessEvent {
            at: HostTime(0),
            reason: ReadinessReason::TimedOutRecovering,
            ready_state: ReadyState::HaveNothing,
        };
        assert_eq!(timeout.severity(), Severity::Error, "timeout is an error");
        let rejected = PlaybackEvent {
            at: HostTime(0),
            channel: Channel::Music,
            action: PlaybackAction::Rejected,
        };
        assert_eq!(rejected.severity(), Severity::Error, "rejection");
        let deferred = PhaseEvent {
            at: HostTime(0),
            change: PhaseChange::MusicDeferred,
        };
        assert_eq!(deferred.severity(), Severity::Warn, "deferred music");
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.curtain(&CurtainEvent {
            at: HostTime(1),
            stage: CurtainStage::Raised,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            stages: Vec<CurtainStage>,
        }
        impl TraceSink for RecordingSink {
            fn on_curtain(&mut self, e: &CurtainEvent) {
                self.stages.push(e.stage);
            }
        }

        let mut sink = RecordingSink { stages: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.curtain(&CurtainEvent {
            at: HostTime(1),
            stage: CurtainStage::Raised,
        });
        drop(tracer);
        assert_eq!(sink.stages, &[CurtainStage::Raised], "dispatched once");
    }
}
