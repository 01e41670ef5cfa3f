// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to milliseconds using a [`Timebase`].

use std::io::Write;

use curtaincall_core::time::{HostTime, Timebase};
use curtaincall_core::trace::{
    ConfirmationEvent, CountdownEndEvent, CurtainEvent, DriftEvent, EvasionEvent, PhaseEvent,
    PlaybackEvent, ReadinessEvent, Severity, TraceSink, VisibilityEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    quiet_drift: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("quiet_drift", &self.quiet_drift)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::new(Box::new(std::io::stderr()), timebase)
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self::with_writer(writer, timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            quiet_drift: false,
        }
    }

    /// Only print drift checks that corrected the video.
    #[must_use]
    pub fn quiet_drift(mut self) -> Self {
        self.quiet_drift = true;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ms(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1_000_000.0
    }
}

fn level(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "",
        Severity::Warn => " WARN",
        Severity::Error => " ERROR",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_readiness(&mut self, e: &ReadinessEvent) {
        let _ = writeln!(
            self.writer,
            "[readiness{}] {:?} at {:.1}ms ready_state={:?}",
            level(e.severity()),
            e.reason,
            self.ms(e.at),
            e.ready_state,
        );
    }

    fn on_curtain(&mut self, e: &CurtainEvent) {
        let _ = writeln!(
            self.writer,
            "[curtain] {:?} at {:.1}ms",
            e.stage,
            self.ms(e.at)
        );
    }

    fn on_playback(&mut self, e: &PlaybackEvent) {
        let _ = writeln!(
            self.writer,
            "[playback{}] {:?} {:?} at {:.1}ms",
            level(e.severity()),
            e.channel,
            e.action,
            self.ms(e.at),
        );
    }

    fn on_drift(&mut self, e: &DriftEvent) {
        if self.quiet_drift && !e.corrected {
            return;
        }
        let fixed = if e.corrected { " corrected" } else { "" };
        let _ = writeln!(
            self.writer,
            "[drift] at {:.1}ms video={:.3}s audio={:.3}s delta={:+.1}ms{fixed}",
            self.ms(e.at),
            e.video_time,
            e.audio_time,
            (e.video_time - e.audio_time) * 1000.0,
        );
    }

    fn on_countdown_end(&mut self, e: &CountdownEndEvent) {
        let _ = writeln!(
            self.writer,
            "[countdown:end] {:?} at {:.1}ms",
            e.cause,
            self.ms(e.at)
        );
    }

    fn on_phase(&mut self, e: &PhaseEvent) {
        let _ = writeln!(
            self.writer,
            "[phase{}] {:?} at {:.1}ms",
            level(e.severity()),
            e.change,
            self.ms(e.at),
        );
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        let _ = writeln!(
            self.writer,
            "[visibility] hidden={} {:?} at {:.1}ms",
            e.hidden,
            e.action,
            self.ms(e.at),
        );
    }

    fn on_evasion(&mut self, e: &EvasionEvent) {
        let _ = writeln!(
            self.writer,
            "[evasion{}] #{} {:?} offset=({:.1}, {:.1})",
            level(e.severity()),
            e.move_count,
            e.action,
            e.offset.x,
            e.offset.y,
        );
    }

    fn on_confirmation(&mut self, e: &ConfirmationEvent) {
        let _ = writeln!(
            self.writer,
            "[confirm] #{} {:?} scale={:.2}",
            e.click_count, e.action, e.scale,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curtaincall_core::media::ReadyState;
    use curtaincall_core::trace::{CurtainStage, ReadinessReason};

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_curtain() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MICROS);
        sink.on_curtain(&CurtainEvent {
            at: HostTime(3_000_000),
            stage: CurtainStage::Raised,
        });
        let output = output(sink);
        assert!(output.contains("[curtain]"), "got: {output}");
        assert!(output.contains("Raised at 3000.0ms"), "got: {output}");
    }

    #[test]
    fn severity_is_marked() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MICROS);
        sink.on_readiness(&ReadinessEvent {
            at: HostTime(8_000_000),
            reason: ReadinessReason::TimedOutRecovering,
            ready_state: ReadyState::HaveNothing,
        });
        let output = output(sink);
        assert!(output.starts_with("[readiness ERROR]"), "got: {output}");
    }

    #[test]
    fn quiet_drift_skips_clean_checks() {
        let mut sink =
            PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MICROS).quiet_drift();
        let mut check = DriftEvent {
            at: HostTime(4_000_000),
            video_time: 10.0,
            audio_time: 10.05,
            corrected: false,
        };
        sink.on_drift(&check);
        check.video_time = 9.0;
        check.corrected = true;
        sink.on_drift(&check);
        let output = output(sink);
        assert_eq!(output.lines().count(), 1, "got: {output}");
        assert!(output.contains("delta=-1050.0ms corrected"), "got: {output}");
    }
}
