// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The letter page: curtain, countdown, envelope and letter.
//!
//! Binds the page's existing elements (see [`DomStage::bind`] for the ids it
//! expects), forwards DOM events into one [`Presentation`] and polls it every
//! 50 ms. Trace events go to the browser console.
//!
//! Build with: `wasm-pack build --target web demos/letter_page`
//! Then serve the page that loads the generated module.

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::ToString as _;
use core::cell::RefCell;

use curtaincall_backend_web::{
    ConsoleSink, DomStage, HtmlMedia, PlaySettlements, TickLoop, button_from_event,
    media_event_from_type, now, random_angle, timebase,
};
use curtaincall_core::config::PresentationConfig;
use curtaincall_core::media::{Channel, MediaSet};
use curtaincall_core::presentation::{LayoutCause, Presentation};
use curtaincall_core::stage::ButtonId;
use curtaincall_core::time::HostTime;
use curtaincall_core::trace::Tracer;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, EventTarget, HtmlMediaElement};

const TICK_MS: i32 = 50;

type Session = Presentation<HtmlMedia, DomStage>;

struct PageState {
    session: Session,
    console: ConsoleSink,
}

type Shared = Rc<RefCell<PageState>>;

/// Runs `f` against the session with a console tracer.
///
/// Events dispatched while the session is already borrowed are dropped.
fn with_session(state: &Shared, f: impl FnOnce(&mut Session, &mut Tracer<'_>)) {
    let Ok(mut page) = state.try_borrow_mut() else {
        return;
    };
    let PageState { session, console } = &mut *page;
    let mut tracer = Tracer::new(console);
    f(session, &mut tracer);
}

fn media_element(
    document: &Document,
    id: &str,
    channel: Channel,
    settlements: &PlaySettlements,
) -> Result<HtmlMedia, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&alloc::format!("missing #{id}")))?
        .dyn_into::<HtmlMediaElement>()
        .map_err(|_| JsValue::from_str(&alloc::format!("#{id} is not a media element")))?;
    Ok(HtmlMedia::new(element, channel, settlements.clone()))
}

fn listen(
    target: &EventTarget,
    types: &[&str],
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut(_)>);
    for event_type in types {
        target.add_event_listener_with_callback(event_type, cb.as_ref().unchecked_ref())?;
    }
    cb.forget();
    Ok(())
}

/// Entry point for the letter page.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let settlements = PlaySettlements::new();
    let media = MediaSet {
        video: media_element(
            &document,
            "countdown-video",
            Channel::CountdownVideo,
            &settlements,
        )?,
        countdown_audio: media_element(
            &document,
            "countdownAudio",
            Channel::CountdownAudio,
            &settlements,
        )?,
        music: media_element(&document, "bgMusic", Channel::Music, &settlements)?,
        yes_cue: media_element(&document, "yesSound", Channel::YesCue, &settlements)?,
        final_cue: media_element(&document, "yesSound2", Channel::FinalCue, &settlements)?,
        no_cue: media_element(&document, "noSound", Channel::NoCue, &settlements)?,
    };
    let video = media.video.element().clone();
    let countdown_audio = media.countdown_audio.element().clone();

    let stage = DomStage::bind(window.clone(), document.clone())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let envelope = stage.envelope().clone();
    let panel = stage.button_panel().clone();

    let timebase = timebase();
    let session = Presentation::new(PresentationConfig::canonical(), timebase, media, stage)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let state = Rc::new(RefCell::new(PageState {
        session,
        console: ConsoleSink::new(timebase),
    }));

    bind_media(&state, &video, Channel::CountdownVideo)?;
    bind_media(&state, &countdown_audio, Channel::CountdownAudio)?;
    bind_page(&state, &window, &document)?;
    bind_letter(&state, &envelope, &panel)?;

    with_session(&state, |s, t| s.start(now(), t));

    let tick_state = Rc::clone(&state);
    let ticks = TickLoop::new(
        move |at| on_tick(&tick_state, &settlements, at),
        TICK_MS,
    );
    ticks.start();
    core::mem::forget(ticks);

    Ok(())
}

fn bind_media(state: &Shared, element: &HtmlMediaElement, channel: Channel) -> Result<(), JsValue> {
    let media_state = Rc::clone(state);
    listen(
        element,
        &["loadedmetadata", "canplay", "canplaythrough", "ended"],
        move |event: Event| {
            if let Some(signal) = media_event_from_type(&event.type_()) {
                with_session(&media_state, |s, t| {
                    s.on_media_event(channel, signal, now(), t);
                });
            }
        },
    )
}

fn bind_page(
    state: &Shared,
    window: &web_sys::Window,
    document: &Document,
) -> Result<(), JsValue> {
    let visibility_state = Rc::clone(state);
    let doc = document.clone();
    listen(document, &["visibilitychange"], move |_event: Event| {
        let hidden = doc.hidden();
        with_session(&visibility_state, |s, t| {
            s.on_visibility_change(hidden, now(), t);
        });
    })?;

    let gesture_state = Rc::clone(state);
    listen(document, &["click"], move |_event: Event| {
        with_session(&gesture_state, |s, t| s.on_pointer_down(now(), t));
    })?;

    let window_target: &EventTarget = window;
    let document_target: &EventTarget = document;
    for (target, event_type, cause) in [
        (window_target, "resize", LayoutCause::Resize),
        (window_target, "orientationchange", LayoutCause::Orientation),
        (document_target, "fullscreenchange", LayoutCause::Fullscreen),
    ] {
        let layout_state = Rc::clone(state);
        listen(target, &[event_type], move |_event: Event| {
            with_session(&layout_state, |s, t| s.on_layout_change(cause, now(), t));
        })?;
    }

    Ok(())
}

fn bind_letter(
    state: &Shared,
    envelope: &web_sys::HtmlElement,
    panel: &web_sys::HtmlElement,
) -> Result<(), JsValue> {
    let envelope_state = Rc::clone(state);
    listen(envelope, &["click"], move |_event: Event| {
        with_session(&envelope_state, |s, t| s.on_envelope_click(now(), t));
    })?;

    // Buttons are created and replaced at runtime, so listen on the panel.
    let hover_state = Rc::clone(state);
    listen(panel, &["mouseover"], move |event: Event| {
        if let Some(ButtonId::StaticNo | ButtonId::DynamicNo) = button_from_event(&event) {
            with_session(&hover_state, |s, t| {
                let _ = s.on_no_interaction(random_angle(), t);
            });
        }
    })?;

    let touch_state = Rc::clone(state);
    listen(panel, &["touchstart"], move |event: Event| {
        if let Some(ButtonId::StaticNo | ButtonId::DynamicNo) = button_from_event(&event) {
            event.prevent_default();
            with_session(&touch_state, |s, t| {
                let _ = s.on_no_interaction(random_angle(), t);
            });
        }
    })?;

    let click_state = Rc::clone(state);
    listen(panel, &["click"], move |event: Event| {
        if let Some(button @ (ButtonId::Yes | ButtonId::ConvertedYes)) = button_from_event(&event)
        {
            with_session(&click_state, |s, t| {
                let _ = s.on_yes_click(button, t);
            });
        }
    })?;

    Ok(())
}

fn on_tick(state: &Shared, settlements: &PlaySettlements, at: HostTime) {
    with_session(state, |s, t| {
        for settlement in settlements.drain() {
            s.on_play_settled(settlement.channel, settlement.result, at, t);
        }
        s.poll(at, t);
    });
}
