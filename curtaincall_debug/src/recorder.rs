// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Enumerations are stored as their index in a fixed table; floats as their
//! IEEE-754 bits.

use kurbo::Vec2;

use curtaincall_core::media::{Channel, ReadyState};
use curtaincall_core::time::HostTime;
use curtaincall_core::trace::{
    ConfirmationAction, ConfirmationEvent, CountdownEndEvent, CurtainEvent, CurtainStage,
    DriftEvent, EndCause, EvasionAction, EvasionEvent, PhaseChange, PhaseEvent, PlaybackAction,
    PlaybackEvent, ReadinessEvent, ReadinessReason, TraceSink, VisibilityAction, VisibilityEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_READINESS: u8 = 1;
const TAG_CURTAIN: u8 = 2;
const TAG_PLAYBACK: u8 = 3;
const TAG_DRIFT: u8 = 4;
const TAG_COUNTDOWN_END: u8 = 5;
const TAG_PHASE: u8 = 6;
const TAG_VISIBILITY: u8 = 7;
const TAG_EVASION: u8 = 8;
const TAG_CONFIRMATION: u8 = 9;

// ---------------------------------------------------------------------------
// Enum tables (append only)
// ---------------------------------------------------------------------------

const READINESS_REASONS: [ReadinessReason; 7] = [
    ReadinessReason::LoadStarted,
    ReadinessReason::AlreadyPlayable,
    ReadinessReason::Signal,
    ReadinessReason::Poll,
    ReadinessReason::TimedOutRecovering,
    ReadinessReason::Recovered,
    ReadinessReason::RecoveryWindowElapsed,
];

const READY_STATES: [ReadyState; 5] = [
    ReadyState::HaveNothing,
    ReadyState::HaveMetadata,
    ReadyState::HaveCurrentData,
    ReadyState::HaveFutureData,
    ReadyState::HaveEnoughData,
];

const CURTAIN_STAGES: [CurtainStage; 4] = [
    CurtainStage::Holding,
    CurtainStage::AwaitingMedia,
    CurtainStage::AwaitingDelay,
    CurtainStage::Raised,
];

const PLAYBACK_ACTIONS: [PlaybackAction; 5] = [
    PlaybackAction::Requested,
    PlaybackAction::Started,
    PlaybackAction::Rejected,
    PlaybackAction::FallbackArmed,
    PlaybackAction::SyncStarted,
];

const END_CAUSES: [EndCause; 4] = [
    EndCause::AudioEnded,
    EndCause::VideoEnded,
    EndCause::FallbackTimer,
    EndCause::PlaybackFailure,
];

const PHASE_CHANGES: [PhaseChange; 6] = [
    PhaseChange::EnvelopeShown,
    PhaseChange::MusicFadeComplete,
    PhaseChange::MusicDeferred,
    PhaseChange::MusicRetried,
    PhaseChange::LetterShown,
    PhaseChange::LetterOpened,
];

const VISIBILITY_ACTIONS: [VisibilityAction; 3] = [
    VisibilityAction::Ignored,
    VisibilityAction::Paused,
    VisibilityAction::Resumed,
];

const EVASION_ACTIONS: [EvasionAction; 5] = [
    EvasionAction::Spawned,
    EvasionAction::Moved,
    EvasionAction::Converted,
    EvasionAction::Repositioned,
    EvasionAction::GeometryUnavailable,
];

const CONFIRMATION_ACTIONS: [ConfirmationAction; 3] = [
    ConfirmationAction::Escalated,
    ConfirmationAction::Accepted,
    ConfirmationAction::Ignored,
];

fn index_of<T: PartialEq>(table: &[T], value: &T) -> u8 {
    let idx = table.iter().position(|v| v == value).unwrap_or(0);
    #[expect(
        clippy::cast_possible_truncation,
        reason = "every table has fewer than 256 entries"
    )]
    let idx = idx as u8;
    idx
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_time(&mut self, t: HostTime) {
        self.write_u64(t.ticks());
    }

    fn write_enum<T: PartialEq>(&mut self, table: &[T], value: &T) {
        self.write_u8(index_of(table, value));
    }
}

impl TraceSink for RecorderSink {
    fn on_readiness(&mut self, e: &ReadinessEvent) {
        self.write_u8(TAG_READINESS);
        self.write_time(e.at);
        self.write_enum(&READINESS_REASONS, &e.reason);
        self.write_enum(&READY_STATES, &e.ready_state);
    }

    fn on_curtain(&mut self, e: &CurtainEvent) {
        self.write_u8(TAG_CURTAIN);
        self.write_time(e.at);
        self.write_enum(&CURTAIN_STAGES, &e.stage);
    }

    fn on_playback(&mut self, e: &PlaybackEvent) {
        self.write_u8(TAG_PLAYBACK);
        self.write_time(e.at);
        self.write_enum(&Channel::ALL, &e.channel);
        self.write_enum(&PLAYBACK_ACTIONS, &e.action);
    }

    fn on_drift(&mut self, e: &DriftEvent) {
        self.write_u8(TAG_DRIFT);
        self.write_time(e.at);
        self.write_f64(e.video_time);
        self.write_f64(e.audio_time);
        self.write_u8(u8::from(e.corrected));
    }

    fn on_countdown_end(&mut self, e: &CountdownEndEvent) {
        self.write_u8(TAG_COUNTDOWN_END);
        self.write_time(e.at);
        self.write_enum(&END_CAUSES, &e.cause);
    }

    fn on_phase(&mut self, e: &PhaseEvent) {
        self.write_u8(TAG_PHASE);
        self.write_time(e.at);
        self.write_enum(&PHASE_CHANGES, &e.change);
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.write_u8(TAG_VISIBILITY);
        self.write_time(e.at);
        self.write_u8(u8::from(e.hidden));
        self.write_enum(&VISIBILITY_ACTIONS, &e.action);
    }

    fn on_evasion(&mut self, e: &EvasionEvent) {
        self.write_u8(TAG_EVASION);
        self.write_u32(e.move_count);
        self.write_enum(&EVASION_ACTIONS, &e.action);
        self.write_f64(e.offset.x);
        self.write_f64(e.offset.y);
    }

    fn on_confirmation(&mut self, e: &ConfirmationEvent) {
        self.write_u8(TAG_CONFIRMATION);
        self.write_u32(e.click_count);
        self.write_enum(&CONFIRMATION_ACTIONS, &e.action);
        self.write_f64(e.scale);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`ReadinessEvent`].
    Readiness(ReadinessEvent),
    /// A [`CurtainEvent`].
    Curtain(CurtainEvent),
    /// A [`PlaybackEvent`].
    Playback(PlaybackEvent),
    /// A [`DriftEvent`].
    Drift(DriftEvent),
    /// A [`CountdownEndEvent`].
    CountdownEnd(CountdownEndEvent),
    /// A [`PhaseEvent`].
    Phase(PhaseEvent),
    /// A [`VisibilityEvent`].
    Visibility(VisibilityEvent),
    /// An [`EvasionEvent`].
    Evasion(EvasionEvent),
    /// A [`ConfirmationEvent`].
    Confirmation(ConfirmationEvent),
}

impl RecordedEvent {
    /// The host time the event carries, if it carries one.
    ///
    /// Interaction events are not timestamped.
    #[must_use]
    pub fn at(&self) -> Option<HostTime> {
        match self {
            Self::Readiness(e) => Some(e.at),
            Self::Curtain(e) => Some(e.at),
            Self::Playback(e) => Some(e.at),
            Self::Drift(e) => Some(e.at),
            Self::CountdownEnd(e) => Some(e.at),
            Self::Phase(e) => Some(e.at),
            Self::Visibility(e) => Some(e.at),
            Self::Evasion(_) | Self::Confirmation(_) => None,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    /// Unknown indices stop decoding.
    fn read_enum<T: Copy>(&mut self, table: &[T]) -> Option<T> {
        table.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_readiness(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Readiness(ReadinessEvent {
            at: self.read_time()?,
            reason: self.read_enum(&READINESS_REASONS)?,
            ready_state: self.read_enum(&READY_STATES)?,
        }))
    }

    fn decode_curtain(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Curtain(CurtainEvent {
            at: self.read_time()?,
            stage: self.read_enum(&CURTAIN_STAGES)?,
        }))
    }

    fn decode_playback(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Playback(PlaybackEvent {
            at: self.read_time()?,
            channel: self.read_enum(&Channel::ALL)?,
            action: self.read_enum(&PLAYBACK_ACTIONS)?,
        }))
    }

    fn decode_drift(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Drift(DriftEvent {
            at: self.read_time()?,
            video_time: self.read_f64()?,
            audio_time: self.read_f64()?,
            corrected: self.read_bool()?,
        }))
    }

    fn decode_countdown_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CountdownEnd(CountdownEndEvent {
            at: self.read_time()?,
            cause: self.read_enum(&END_CAUSES)?,
        }))
    }

    fn decode_phase(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Phase(PhaseEvent {
            at: self.read_time()?,
            change: self.read_enum(&PHASE_CHANGES)?,
        }))
    }

    fn decode_visibility(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Visibility(VisibilityEvent {
            at: self.read_time()?,
            hidden: self.read_bool()?,
            action: self.read_enum(&VISIBILITY_ACTIONS)?,
        }))
    }

    fn decode_evasion(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Evasion(EvasionEvent {
            move_count: self.read_u32()?,
            action: self.read_enum(&EVASION_ACTIONS)?,
            offset: Vec2::new(self.read_f64()?, self.read_f64()?),
        }))
    }

    fn decode_confirmation(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Confirmation(ConfirmationEvent {
            click_count: self.read_u32()?,
            action: self.read_enum(&CONFIRMATION_ACTIONS)?,
            scale: self.read_f64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_READINESS => self.decode_readiness(),
            TAG_CURTAIN => self.decode_curtain(),
            TAG_PLAYBACK => self.decode_playback(),
            TAG_DRIFT => self.decode_drift(),
            TAG_COUNTDOWN_END => self.decode_countdown_end(),
            TAG_PHASE => self.decode_phase(),
            TAG_VISIBILITY => self.decode_visibility(),
            TAG_EVASION => self.decode_evasion(),
            TAG_CONFIRMATION => self.decode_confirmation(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use curtaincall_core::config::PresentationConfig;
    use curtaincall_core::media::MediaEvent;
    use curtaincall_core::presentation::Presentation;
    use curtaincall_core::testing::{RecordingStage, fake_media_set};
    use curtaincall_core::time::Timebase;
    use curtaincall_core::trace::Tracer;

    fn ms(v: u64) -> HostTime {
        HostTime(v * 1000)
    }

    #[test]
    fn drift_keeps_float_bits() {
        let mut rec = RecorderSink::new();
        let orig = DriftEvent {
            at: ms(4_000),
            video_time: 0.1 + 0.2,
            audio_time: -0.0,
            corrected: true,
        };
        rec.on_drift(&orig);
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, [RecordedEvent::Drift(orig)], "exact round trip");
        match &events[0] {
            RecordedEvent::Drift(e) => {
                assert!(e.audio_time.is_sign_negative(), "negative zero kept");
            }
            other => panic!("expected Drift, got {other:?}"),
        }
    }

    #[test]
    fn untimed_events_have_no_timestamp() {
        let mut rec = RecorderSink::new();
        rec.on_evasion(&EvasionEvent {
            move_count: 3,
            action: EvasionAction::Moved,
            offset: Vec2::new(-12.0, 40.5),
        });
        rec.on_phase(&PhaseEvent {
            at: ms(5),
            change: PhaseChange::LetterOpened,
        });
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2, "both decoded");
        assert_eq!(events[0].at(), None, "evasion is untimed");
        assert_eq!(events[1].at(), Some(ms(5)), "phase is timed");
    }

    #[test]
    fn truncated_and_unknown_input_stops() {
        let mut rec = RecorderSink::new();
        rec.on_curtain(&CurtainEvent {
            at: ms(1),
            stage: CurtainStage::Raised,
        });
        let bytes = rec.into_bytes();
        assert_eq!(
            decode(&bytes[..bytes.len() - 1]).count(),
            0,
            "partial record dropped"
        );
        let mut bad = bytes.clone();
        *bad.last_mut().unwrap() = 200;
        assert_eq!(decode(&bad).count(), 0, "unknown enum index stops");
        assert_eq!(decode(&[42]).count(), 0, "unknown tag stops");
        assert_eq!(decode(&[]).count(), 0, "empty buffer");
    }

    #[test]
    fn records_a_whole_session() {
        let mut rec = RecorderSink::new();
        {
            let t = &mut Tracer::new(&mut rec);
            let mut session = Presentation::new(
                PresentationConfig::canonical(),
                Timebase::MICROS,
                fake_media_set(),
                RecordingStage::default(),
            )
            .unwrap();
            session.media_mut().video.ready = ReadyState::HaveEnoughData;
            session.start(ms(0), t);
            let mut at = 0;
            while at <= 3_500 {
                session.poll(ms(at), t);
                at += 50;
            }
            session.on_media_event(Channel::CountdownAudio, MediaEvent::Ended, ms(4_000), t);
            session.on_envelope_click(ms(4_100), t);
            session.poll(ms(4_150), t);
        }

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert!(
            matches!(
                events.first(),
                Some(RecordedEvent::Curtain(CurtainEvent {
                    stage: CurtainStage::Holding,
                    ..
                }))
            ),
            "curtain holds first: {events:?}"
        );
        let ends: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::CountdownEnd(e) => Some(e.cause),
                _ => None,
            })
            .collect();
        assert_eq!(ends, [EndCause::AudioEnded], "one end");
        assert!(
            events.iter().any(|e| matches!(
                e,
                RecordedEvent::Phase(PhaseEvent {
                    change: PhaseChange::LetterOpened,
                    ..
                })
            )),
            "letter opened"
        );
        let mut last = HostTime(0);
        for e in &events {
            if let Some(at) = e.at() {
                assert!(at >= last, "timestamps are monotonic");
                last = at;
            }
        }
    }
}
