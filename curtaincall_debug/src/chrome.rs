// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! The curtain is drawn as a span from `Holding` to `Raised`, drift as a
//! counter track, and everything else as instant events. Each media channel
//! gets its own thread row.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use curtaincall_core::media::Channel;
use curtaincall_core::time::Timebase;
use curtaincall_core::trace::CurtainStage;

use crate::recorder::{RecordedEvent, decode};

const TID_SESSION: u32 = 0;
const TID_INTERACTION: u32 = 1;

/// Thread row of a media channel; rows 0 and 1 are the session and
/// interactions.
fn channel_tid(channel: Channel) -> u32 {
    let idx = Channel::ALL
        .iter()
        .position(|c| *c == channel)
        .unwrap_or(0);
    #[expect(
        clippy::cast_possible_truncation,
        reason = "there are six channels"
    )]
    let idx = idx as u32;
    2 + idx
}

fn instant(name: String, cat: &str, ts: f64, tid: u32, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
/// Interaction events carry no timestamp of their own and are placed at the
/// most recent timed event.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        if let Some(at) = recorded.at() {
            last_ts = ticks_to_us(at.ticks(), timebase);
        }
        let ts = last_ts;
        match recorded {
            RecordedEvent::Readiness(e) => events.push(instant(
                format!("{:?}", e.reason),
                "Readiness",
                ts,
                channel_tid(Channel::CountdownVideo),
                json!({ "ready_state": format!("{:?}", e.ready_state) }),
            )),
            RecordedEvent::Curtain(e) => match e.stage {
                CurtainStage::Holding => events.push(json!({
                    "ph": "B",
                    "name": "Curtain",
                    "cat": "Curtain",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_SESSION,
                })),
                CurtainStage::Raised => events.push(json!({
                    "ph": "E",
                    "name": "Curtain",
                    "cat": "Curtain",
                    "ts": ts,
                    "pid": 0,
                    "tid": TID_SESSION,
                })),
                stage => events.push(instant(
                    format!("{stage:?}"),
                    "Curtain",
                    ts,
                    TID_SESSION,
                    json!({}),
                )),
            },
            RecordedEvent::Playback(e) => events.push(instant(
                format!("{:?}", e.action),
                "Playback",
                ts,
                channel_tid(e.channel),
                json!({ "channel": format!("{:?}", e.channel) }),
            )),
            RecordedEvent::Drift(e) => events.push(json!({
                "ph": "C",
                "name": "Drift",
                "cat": "Sync",
                "ts": ts,
                "pid": 0,
                "tid": TID_SESSION,
                "args": {
                    "delta_ms": (e.video_time - e.audio_time) * 1000.0,
                    "corrected": u8::from(e.corrected),
                }
            })),
            RecordedEvent::CountdownEnd(e) => events.push(json!({
                "ph": "i",
                "name": "CountdownEnd",
                "cat": "Sync",
                "ts": ts,
                "pid": 0,
                "tid": TID_SESSION,
                "s": "g",
                "args": { "cause": format!("{:?}", e.cause) }
            })),
            RecordedEvent::Phase(e) => events.push(instant(
                format!("{:?}", e.change),
                "Phase",
                ts,
                TID_SESSION,
                json!({}),
            )),
            RecordedEvent::Visibility(e) => events.push(instant(
                format!("{:?}", e.action),
                "Visibility",
                ts,
                TID_SESSION,
                json!({ "hidden": e.hidden }),
            )),
            RecordedEvent::Evasion(e) => events.push(instant(
                format!("No{:?}", e.action),
                "Interaction",
                ts,
                TID_INTERACTION,
                json!({
                    "move_count": e.move_count,
                    "x": e.offset.x,
                    "y": e.offset.y,
                }),
            )),
            RecordedEvent::Confirmation(e) => events.push(instant(
                format!("Yes{:?}", e.action),
                "Interaction",
                ts,
                TID_INTERACTION,
                json!({
                    "click_count": e.click_count,
                    "scale": e.scale,
                }),
            )),
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use curtaincall_core::time::HostTime;
    use curtaincall_core::trace::{
        CurtainEvent, DriftEvent, EvasionAction, EvasionEvent, PlaybackAction, PlaybackEvent,
        TraceSink,
    };
    use kurbo::Vec2;

    fn parse(bytes: &[u8]) -> Vec<Value> {
        let mut out = Vec::new();
        export(bytes, Timebase::MICROS, &mut out).unwrap();
        serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap()
    }

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_curtain(&CurtainEvent {
            at: HostTime(0),
            stage: CurtainStage::Holding,
        });
        rec.on_curtain(&CurtainEvent {
            at: HostTime(3_000_000),
            stage: CurtainStage::Raised,
        });
        rec.on_playback(&PlaybackEvent {
            at: HostTime(3_500_000),
            channel: Channel::CountdownAudio,
            action: PlaybackAction::Requested,
        });
        rec.on_drift(&DriftEvent {
            at: HostTime(4_000_000),
            video_time: 1.5,
            audio_time: 1.0,
            corrected: true,
        });

        let parsed = parse(rec.as_bytes());
        assert_eq!(parsed.len(), 4, "one object per event");
        assert_eq!(parsed[0]["ph"], "B", "curtain span opens");
        assert_eq!(parsed[1]["ph"], "E", "curtain span closes");
        assert_eq!(parsed[1]["ts"], 3_000_000.0, "microseconds");
        assert_eq!(parsed[2]["name"], "Requested", "playback instant");
        assert_eq!(parsed[2]["tid"], 3, "countdown audio row");
        assert_eq!(parsed[3]["ph"], "C", "drift counter");
        assert_eq!(parsed[3]["args"]["delta_ms"], 500.0, "drift in ms");
    }

    #[test]
    fn interactions_inherit_last_timestamp() {
        let mut rec = RecorderSink::new();
        rec.on_curtain(&CurtainEvent {
            at: HostTime(2_000),
            stage: CurtainStage::AwaitingMedia,
        });
        rec.on_evasion(&EvasionEvent {
            move_count: 1,
            action: EvasionAction::Spawned,
            offset: Vec2::ZERO,
        });
        let parsed = parse(rec.as_bytes());
        assert_eq!(parsed[1]["name"], "NoSpawned", "evasion instant");
        assert_eq!(parsed[1]["ts"], parsed[0]["ts"], "placed at last timed event");
    }

    #[test]
    fn export_empty_recording() {
        assert!(parse(&[]).is_empty(), "empty array");
    }
}
