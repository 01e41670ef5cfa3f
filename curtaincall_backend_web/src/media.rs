// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `HTMLMediaElement` adapter.
//!
//! `play()` returns a promise. [`HtmlMedia::request_play`] spawns a task that
//! awaits it and pushes the outcome onto a shared [`PlaySettlements`] queue;
//! the tick callback drains the queue into the session before polling, so
//! the state machines only ever see settlements on the tick.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::{String, ToString as _};
use alloc::vec::Vec;
use core::cell::RefCell;

use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlMediaElement;

use curtaincall_core::error::PlayRejected;
use curtaincall_core::media::{Channel, MediaElement, MediaEvent, ReadyState};

/// The outcome of one `play()` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaySettlement {
    /// The element that was asked to play.
    pub channel: Channel,
    /// Whether it started.
    pub result: Result<(), PlayRejected>,
}

/// A shared FIFO of play outcomes.
///
/// Cloning shares the queue.
#[derive(Clone, Debug, Default)]
pub struct PlaySettlements {
    queue: Rc<RefCell<VecDeque<PlaySettlement>>>,
}

impl PlaySettlements {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome.
    pub fn push(&self, channel: Channel, result: Result<(), PlayRejected>) {
        self.queue
            .borrow_mut()
            .push_back(PlaySettlement { channel, result });
    }

    /// Removes and returns every queued outcome, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<PlaySettlement> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Number of queued outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

/// Maps a DOM event type to the media signal the session reacts to.
#[must_use]
pub fn media_event_from_type(event_type: &str) -> Option<MediaEvent> {
    match event_type {
        "loadedmetadata" => Some(MediaEvent::LoadedMetadata),
        "canplay" => Some(MediaEvent::CanPlay),
        "canplaythrough" => Some(MediaEvent::CanPlayThrough),
        "ended" => Some(MediaEvent::Ended),
        _ => None,
    }
}

/// The `name` of a rejection (`NotAllowedError`, `AbortError`, ...), or its
/// string form for non-`Error` values.
fn rejection_reason(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.name());
    }
    value.as_string().unwrap_or_else(|| "unknown".to_string())
}

/// A [`MediaElement`] backed by an `<audio>` or `<video>` element.
pub struct HtmlMedia {
    element: HtmlMediaElement,
    channel: Channel,
    settlements: PlaySettlements,
}

impl core::fmt::Debug for HtmlMedia {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HtmlMedia")
            .field("element", &"HtmlMediaElement")
            .field("channel", &self.channel)
            .field("pending", &self.settlements.len())
            .finish()
    }
}

impl HtmlMedia {
    /// Wraps `element`, reporting `play()` outcomes for `channel` to
    /// `settlements`.
    #[must_use]
    pub fn new(element: HtmlMediaElement, channel: Channel, settlements: PlaySettlements) -> Self {
        Self {
            element,
            channel,
            settlements,
        }
    }

    /// The wrapped element, for listener registration.
    #[must_use]
    pub fn element(&self) -> &HtmlMediaElement {
        &self.element
    }

    /// The channel this element plays on.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl MediaElement for HtmlMedia {
    fn load(&mut self) {
        self.element.load();
    }

    fn request_play(&mut self) {
        let channel = self.channel;
        let settlements = self.settlements.clone();
        match self.element.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                let result = JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|err| PlayRejected {
                        channel,
                        reason: rejection_reason(&err),
                    });
                settlements.push(channel, result);
            }),
            Err(err) => settlements.push(
                channel,
                Err(PlayRejected {
                    channel,
                    reason: rejection_reason(&err),
                }),
            ),
        }
    }

    fn pause(&mut self) {
        let _ = self.element.pause();
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn set_volume(&mut self, volume: f64) {
        self.element.set_volume(volume.clamp(0.0, 1.0));
    }

    fn set_muted(&mut self, muted: bool) {
        self.element.set_muted(muted);
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_dom(self.element.ready_state())
    }

    fn source(&self) -> Option<String> {
        let current = self.element.current_src();
        if !current.is_empty() {
            return Some(current);
        }
        self.element
            .query_selector("source")
            .ok()
            .flatten()
            .and_then(|source| source.get_attribute("src"))
    }

    fn set_source(&mut self, url: &str) {
        // Prefer the <source> child; `src` would override it.
        match self.element.query_selector("source") {
            Ok(Some(source)) => {
                let _ = source.set_attribute("src", url);
            }
            _ => self.element.set_src(url),
        }
    }

    fn set_opacity(&mut self, opacity: f64) {
        let _ = self
            .element
            .style()
            .set_property("opacity", &alloc::format!("{opacity}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types() {
        assert_eq!(
            media_event_from_type("canplay"),
            Some(MediaEvent::CanPlay),
            "canplay"
        );
        assert_eq!(
            media_event_from_type("ended"),
            Some(MediaEvent::Ended),
            "ended"
        );
        assert_eq!(media_event_from_type("timeupdate"), None, "not tracked");
    }

    #[test]
    fn settlements_drain_in_order() {
        let queue = PlaySettlements::new();
        let shared = queue.clone();
        shared.push(Channel::CountdownVideo, Ok(()));
        shared.push(
            Channel::Music,
            Err(PlayRejected {
                channel: Channel::Music,
                reason: "NotAllowedError".to_string(),
            }),
        );
        assert_eq!(queue.len(), 2, "shared between clones");
        let drained = queue.drain();
        assert_eq!(drained[0].channel, Channel::CountdownVideo, "oldest first");
        assert!(drained[1].result.is_err(), "rejection kept");
        assert!(queue.is_empty(), "drained");
    }
}
