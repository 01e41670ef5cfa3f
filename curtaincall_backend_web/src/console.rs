// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser console trace sink.

use alloc::format;
use alloc::string::String;

use wasm_bindgen::JsValue;
use web_sys::console;

use curtaincall_core::time::{HostTime, Timebase};
use curtaincall_core::trace::{
    ConfirmationEvent, CountdownEndEvent, CurtainEvent, DriftEvent, EvasionEvent, PhaseEvent,
    PlaybackEvent, ReadinessEvent, Severity, TraceSink, VisibilityEvent,
};

/// Writes one console line per trace event, routed to `console.log`,
/// `console.warn` or `console.error` by [`Severity`].
///
/// Drift checks are only logged when they corrected something.
#[derive(Clone, Copy, Debug)]
pub struct ConsoleSink {
    timebase: Timebase,
}

impl ConsoleSink {
    /// Creates a sink that stamps events in milliseconds using `timebase`.
    #[must_use]
    pub fn new(timebase: Timebase) -> Self {
        Self { timebase }
    }

    fn emit(&self, severity: Severity, at: Option<HostTime>, message: String) {
        let line = match at {
            Some(at) => format!("[curtaincall {}ms] {message}", at.to_millis(self.timebase)),
            None => format!("[curtaincall] {message}"),
        };
        let value = JsValue::from_str(&line);
        match severity {
            Severity::Info => console::log_1(&value),
            Severity::Warn => console::warn_1(&value),
            Severity::Error => console::error_1(&value),
        }
    }
}

impl TraceSink for ConsoleSink {
    fn on_readiness(&mut self, e: &ReadinessEvent) {
        self.emit(
            e.severity(),
            Some(e.at),
            format!("video {:?} (readyState {:?})", e.reason, e.ready_state),
        );
    }

    fn on_curtain(&mut self, e: &CurtainEvent) {
        self.emit(Severity::Info, Some(e.at), format!("curtain {:?}", e.stage));
    }

    fn on_playback(&mut self, e: &PlaybackEvent) {
        self.emit(
            e.severity(),
            Some(e.at),
            format!("{:?} {:?}", e.channel, e.action),
        );
    }

    fn on_drift(&mut self, e: &DriftEvent) {
        if e.corrected {
            self.emit(
                Severity::Info,
                Some(e.at),
                format!(
                    "resynced video {:.3}s -> {:.3}s",
                    e.video_time, e.audio_time
                ),
            );
        }
    }

    fn on_countdown_end(&mut self, e: &CountdownEndEvent) {
        self.emit(
            Severity::Info,
            Some(e.at),
            format!("countdown ended ({:?})", e.cause),
        );
    }

    fn on_phase(&mut self, e: &PhaseEvent) {
        self.emit(e.severity(), Some(e.at), format!("{:?}", e.change));
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        let state = if e.hidden { "hidden" } else { "visible" };
        self.emit(
            Severity::Info,
            Some(e.at),
            format!("page {state}: {:?}", e.action),
        );
    }

    fn on_evasion(&mut self, e: &EvasionEvent) {
        self.emit(
            e.severity(),
            None,
            format!(
                "no button {:?} #{} at ({:.0}, {:.0})",
                e.action, e.move_count, e.offset.x, e.offset.y
            ),
        );
    }

    fn on_confirmation(&mut self, e: &ConfirmationEvent) {
        self.emit(
            Severity::Info,
            None,
            format!("yes {:?} #{} scale {:.2}", e.action, e.click_count, e.scale),
        );
    }
}
