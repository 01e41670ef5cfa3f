// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated letter-page session that exercises the tracing and diagnostics
//! pipeline.
//!
//! Drives one [`Presentation`] over the core's test doubles through a slow
//! video load, a drifting countdown, a hidden tab, a blocked music start and
//! the full letter interaction, recording events to both a
//! [`PrettyPrintSink`](curtaincall_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](curtaincall_debug::recorder::RecorderSink), then exports
//! a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use kurbo::{Rect, Size};

use curtaincall_core::config::PresentationConfig;
use curtaincall_core::error::PlayRejected;
use curtaincall_core::layout::Geometry;
use curtaincall_core::media::{Channel, MediaEvent, ReadyState};
use curtaincall_core::presentation::{LayoutCause, Presentation};
use curtaincall_core::stage::ButtonId;
use curtaincall_core::testing::{FakeMedia, RecordingStage, fake_media_set};
use curtaincall_core::time::{HostTime, Timebase};
use curtaincall_core::trace::{
    ConfirmationEvent, CountdownEndEvent, CurtainEvent, DriftEvent, EvasionEvent, PhaseEvent,
    PlaybackEvent, ReadinessEvent, TraceSink, Tracer, VisibilityEvent,
};

use curtaincall_debug::pretty::PrettyPrintSink;
use curtaincall_debug::recorder::RecorderSink;

const TIMEBASE: Timebase = Timebase::MICROS;
const TICK_MS: u64 = 50;

type Session = Presentation<FakeMedia, RecordingStage>;

/// Forwards every event to both sinks.
struct Tee<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

macro_rules! tee {
    ($($method:ident: $event:ty),* $(,)?) => {
        impl TraceSink for Tee<'_> {
            $(
                fn $method(&mut self, e: &$event) {
                    self.pretty.$method(e);
                    self.recorder.$method(e);
                }
            )*
        }
    };
}

tee!(
    on_readiness: ReadinessEvent,
    on_curtain: CurtainEvent,
    on_playback: PlaybackEvent,
    on_drift: DriftEvent,
    on_countdown_end: CountdownEndEvent,
    on_phase: PhaseEvent,
    on_visibility: VisibilityEvent,
    on_evasion: EvasionEvent,
    on_confirmation: ConfirmationEvent,
);

fn ms(v: u64) -> HostTime {
    HostTime(v * 1000)
}

/// Polls every tick from `from` to `to`, advancing both countdown clocks in
/// step when they are playing. `video_rate` skews the video clock.
fn run(s: &mut Session, from: u64, to: u64, video_rate: f64, t: &mut Tracer<'_>) {
    let step = TICK_MS as f64 / 1000.0;
    let mut at = from;
    while at <= to {
        let media = s.media_mut();
        if !media.countdown_audio.paused {
            media.countdown_audio.time += step;
        }
        if !media.video.paused {
            media.video.time += step * video_rate;
        }
        s.poll(ms(at), t);
        at += TICK_MS;
    }
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()), TIMEBASE).quiet_drift();
    let mut recorder = RecorderSink::new();

    // -- session -----------------------------------------------------------
    let stage = RecordingStage {
        layout: Some(Geometry {
            container: Some(Rect::new(40.0, 520.0, 440.0, 640.0)),
            viewport: Size::new(480.0, 860.0),
            button: Size::new(90.0, 90.0),
            yes_button: Some(Rect::new(80.0, 535.0, 170.0, 625.0)),
        }),
        ..RecordingStage::default()
    };
    let mut media = fake_media_set();
    media.video = FakeMedia::with_source("countdown.mp4");
    let Ok(mut session) =
        Presentation::new(PresentationConfig::canonical(), TIMEBASE, media, stage)
    else {
        eprintln!("canonical configuration rejected");
        return;
    };

    {
        let mut tee = Tee {
            pretty: &mut pretty,
            recorder: &mut recorder,
        };
        let t = &mut Tracer::new(&mut tee);

        // 1. Slow network: nothing arrives until the cache-busted reload.
        session.start(ms(0), t);
        run(&mut session, 0, 9_000, 1.0, t);
        session.media_mut().video.ready = ReadyState::HaveEnoughData;
        session.on_media_event(Channel::CountdownVideo, MediaEvent::CanPlay, ms(9_020), t);

        // 2. Countdown with a video clock running 30% fast.
        run(&mut session, 9_050, 9_550, 1.0, t);
        session.on_play_settled(Channel::CountdownVideo, Ok(()), ms(9_560), t);
        session.on_play_settled(Channel::CountdownAudio, Ok(()), ms(9_560), t);
        run(&mut session, 9_600, 30_000, 1.3, t);

        // 3. Tab hidden for ten seconds.
        session.on_visibility_change(true, ms(30_010), t);
        run(&mut session, 30_050, 40_000, 1.0, t);
        session.on_visibility_change(false, ms(40_010), t);
        session.on_play_settled(Channel::CountdownVideo, Ok(()), ms(40_020), t);
        session.on_play_settled(Channel::CountdownAudio, Ok(()), ms(40_020), t);
        run(&mut session, 40_050, 60_000, 1.0, t);

        // 4. Soundtrack ends; autoplay blocks the music until a click.
        session.on_media_event(Channel::CountdownAudio, MediaEvent::Ended, ms(60_020), t);
        let blocked = Err(PlayRejected {
            channel: Channel::Music,
            reason: "NotAllowedError".to_string(),
        });
        session.on_play_settled(Channel::Music, blocked, ms(60_030), t);
        run(&mut session, 60_050, 63_000, 1.0, t);
        session.on_pointer_down(ms(63_010), t);
        session.on_envelope_click(ms(63_010), t);
        run(&mut session, 63_050, 63_100, 1.0, t);

        // 5. The "No" button runs away until it gives up.
        let mut angle = 0.3;
        for _ in 0..20 {
            let _ = session.on_no_interaction(angle, t);
            angle += 1.7;
        }
        session.on_layout_change(LayoutCause::Orientation, ms(64_000), t);
        run(&mut session, 64_050, 64_100, 1.0, t);

        // 6. "Yes" until accepted.
        let _ = session.on_yes_click(ButtonId::Yes, t);
        for _ in 0..9 {
            let _ = session.on_yes_click(ButtonId::ConvertedYes, t);
        }
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = match File::create(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("failed to create {path}: {err}");
            return;
        }
    };
    let mut writer = BufWriter::new(file);
    if let Err(err) = curtaincall_debug::chrome::export(recorder.as_bytes(), TIMEBASE, &mut writer)
    {
        eprintln!("failed to write Chrome trace: {err}");
        return;
    }

    println!(
        "Wrote {path} ({} bytes recorded, {} stage commands)",
        recorder.as_bytes().len(),
        session.stage().log.len()
    );
}
