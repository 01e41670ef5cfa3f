// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles for the capability traits.
//!
//! [`FakeMedia`] is a media element whose clock and readiness the test
//! controls directly. [`RecordingStage`] logs every command, answers
//! "what is the current state of surface X" queries and reports whatever
//! geometry the test installed. A [`CallLog`] shared by several fakes
//! records the order of calls across elements.

use alloc::rc::Rc;
use alloc::string::{String, ToString as _};
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Size;

use crate::layout::Geometry;
use crate::media::{Channel, MediaElement, MediaSet, ReadyState};
use crate::stage::{ButtonId, ButtonPlacement, Stage, Surface};

/// A transport call received by a [`FakeMedia`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MediaCall {
    /// `load`
    Load,
    /// `request_play`
    Play,
    /// `pause`
    Pause,
    /// `set_current_time`
    Seek(f64),
}

/// Transport calls of several fakes, in arrival order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallLog(Rc<RefCell<Vec<(Channel, MediaCall)>>>);

impl CallLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(Channel, MediaCall)> {
        self.0.borrow().clone()
    }

    /// Index of the first `call` on `channel`, if any.
    #[must_use]
    pub fn position(&self, channel: Channel, call: MediaCall) -> Option<usize> {
        self.0.borrow().iter().position(|c| *c == (channel, call))
    }

    /// Forgets every call so far.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, channel: Channel, call: MediaCall) {
        self.0.borrow_mut().push((channel, call));
    }
}

/// A media element with a test-controlled clock.
#[derive(Clone, Debug, PartialEq)]
pub struct FakeMedia {
    /// Whether the element is paused.
    pub paused: bool,
    /// Position in seconds.
    pub time: f64,
    /// Volume.
    pub volume: f64,
    /// Muted flag.
    pub muted: bool,
    /// Opacity (video only).
    pub opacity: f64,
    /// Readiness reported to the core.
    pub ready: ReadyState,
    /// Current source URL.
    pub src: Option<String>,
    /// Number of `load()` calls.
    pub loads: u32,
    /// Number of `request_play()` calls.
    pub play_requests: u32,
    /// Every `set_current_time` value, in order.
    pub seeks: Vec<f64>,
    /// Shared log this fake reports its transport calls to.
    pub log: Option<(Channel, CallLog)>,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            paused: true,
            time: 0.0,
            volume: 1.0,
            muted: false,
            opacity: 1.0,
            ready: ReadyState::HaveNothing,
            src: None,
            loads: 0,
            play_requests: 0,
            seeks: Vec::new(),
            log: None,
        }
    }
}

impl FakeMedia {
    /// A fake with the given source URL.
    #[must_use]
    pub fn with_source(src: &str) -> Self {
        Self {
            src: Some(src.to_string()),
            ..Self::default()
        }
    }

    fn note(&self, call: MediaCall) {
        if let Some((channel, log)) = &self.log {
            log.push(*channel, call);
        }
    }
}

impl MediaElement for FakeMedia {
    fn load(&mut self) {
        self.loads += 1;
        self.note(MediaCall::Load);
    }

    fn request_play(&mut self) {
        self.play_requests += 1;
        self.paused = false;
        self.note(MediaCall::Play);
    }

    fn pause(&mut self) {
        self.paused = true;
        self.note(MediaCall::Pause);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.time = seconds;
        self.seeks.push(seconds);
        self.note(MediaCall::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn source(&self) -> Option<String> {
        self.src.clone()
    }

    fn set_source(&mut self, url: &str) {
        self.src = Some(url.to_string());
    }

    fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }
}

/// A full set of fakes; the video has a source so recovery can cache-bust it.
#[must_use]
pub fn fake_media_set() -> MediaSet<FakeMedia> {
    MediaSet {
        video: FakeMedia::with_source("countdown.mp4"),
        countdown_audio: FakeMedia::with_source("countdown.mp3"),
        music: FakeMedia::with_source("music.mp3"),
        yes_cue: FakeMedia::with_source("yes.mp3"),
        final_cue: FakeMedia::with_source("yes2.mp3"),
        no_cue: FakeMedia::with_source("no.mp3"),
    }
}

/// [`fake_media_set`] with every element reporting to `log`.
#[must_use]
pub fn logged_media_set(log: &CallLog) -> MediaSet<FakeMedia> {
    let mut media = fake_media_set();
    for channel in Channel::ALL {
        media.get_mut(channel).log = Some((channel, log.clone()));
    }
    media
}

/// One command received by a [`RecordingStage`].
#[derive(Clone, Debug, PartialEq)]
pub enum StageCommand {
    /// `set_visible`
    Visible(Surface, bool),
    /// `set_text`
    Text(Surface, String),
    /// `set_image`
    Image(Surface, String),
    /// `add_class`
    Class(Surface, String),
    /// `spawn_button`
    Spawn(ButtonId),
    /// `set_button_visible`
    ButtonVisible(ButtonId, bool),
    /// `place_button`
    Place(ButtonId, ButtonPlacement),
}

/// A [`Stage`] that records every command.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingStage {
    /// Commands in arrival order.
    pub log: Vec<StageCommand>,
    /// Geometry reported to the core; `None` reports a detached panel.
    pub layout: Option<Geometry>,
    /// Per-button sizes that override `layout.button` when measured.
    pub sizes: Vec<(ButtonId, Size)>,
}

impl RecordingStage {
    /// The last visibility set for `surface`, if any.
    #[must_use]
    pub fn visible(&self, surface: Surface) -> Option<bool> {
        self.log.iter().rev().find_map(|c| match c {
            StageCommand::Visible(s, v) if *s == surface => Some(*v),
            _ => None,
        })
    }

    /// The last text set for `surface`, if any.
    #[must_use]
    pub fn text(&self, surface: Surface) -> Option<&str> {
        self.log.iter().rev().find_map(|c| match c {
            StageCommand::Text(s, t) if *s == surface => Some(t.as_str()),
            _ => None,
        })
    }

    /// The last image set for `surface`, if any.
    #[must_use]
    pub fn image(&self, surface: Surface) -> Option<&str> {
        self.log.iter().rev().find_map(|c| match c {
            StageCommand::Image(s, src) if *s == surface => Some(src.as_str()),
            _ => None,
        })
    }

    /// Whether `class` was ever added to `surface`.
    #[must_use]
    pub fn has_class(&self, surface: Surface, class: &str) -> bool {
        self.log
            .iter()
            .any(|c| matches!(c, StageCommand::Class(s, k) if *s == surface && k == class))
    }

    /// How many times `class` was added to `surface`.
    #[must_use]
    pub fn class_count(&self, surface: Surface, class: &str) -> usize {
        self.log
            .iter()
            .filter(|c| matches!(c, StageCommand::Class(s, k) if *s == surface && k == class))
            .count()
    }

    /// How many times `button` was spawned.
    #[must_use]
    pub fn spawn_count(&self, button: ButtonId) -> usize {
        self.log
            .iter()
            .filter(|c| matches!(c, StageCommand::Spawn(b) if *b == button))
            .count()
    }

    /// The last visibility set for `button`, if any.
    #[must_use]
    pub fn button_visible(&self, button: ButtonId) -> Option<bool> {
        self.log.iter().rev().find_map(|c| match c {
            StageCommand::ButtonVisible(b, v) if *b == button => Some(*v),
            _ => None,
        })
    }

    /// The last placement of `button`, if any.
    #[must_use]
    pub fn placement(&self, button: ButtonId) -> Option<ButtonPlacement> {
        self.log.iter().rev().find_map(|c| match c {
            StageCommand::Place(b, p) if *b == button => Some(*p),
            _ => None,
        })
    }
}

impl Stage for RecordingStage {
    fn set_visible(&mut self, surface: Surface, visible: bool) {
        self.log.push(StageCommand::Visible(surface, visible));
    }

    fn set_text(&mut self, surface: Surface, text: &str) {
        self.log.push(StageCommand::Text(surface, text.to_string()));
    }

    fn set_image(&mut self, surface: Surface, src: &str) {
        self.log.push(StageCommand::Image(surface, src.to_string()));
    }

    fn add_class(&mut self, surface: Surface, class: &str) {
        self.log.push(StageCommand::Class(surface, class.to_string()));
    }

    fn spawn_button(&mut self, button: ButtonId) {
        self.log.push(StageCommand::Spawn(button));
    }

    fn set_button_visible(&mut self, button: ButtonId, visible: bool) {
        self.log.push(StageCommand::ButtonVisible(button, visible));
    }

    fn place_button(&mut self, button: ButtonId, placement: ButtonPlacement) {
        self.log.push(StageCommand::Place(button, placement));
    }

    fn geometry(&self, floating: ButtonId) -> Geometry {
        let mut geometry = self.layout.unwrap_or(Geometry {
            container: None,
            viewport: Size::ZERO,
            button: Size::ZERO,
            yes_button: None,
        });
        if let Some((_, size)) = self.sizes.iter().find(|(b, _)| *b == floating) {
            geometry.button = *size;
        }
        geometry
    }
}
