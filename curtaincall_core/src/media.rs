// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Media capability surface.
//!
//! The state machines treat every audio/video element as an opaque
//! controllable clock: they can load it, ask it to play, pause it, read and
//! seek its position and set its level. Buffering is hidden behind
//! [`ReadyState`] and the [`MediaEvent`] signals.
//!
//! Starting playback is asynchronous on every real platform. The core calls
//! [`MediaElement::request_play`] and the backend later reports the outcome
//! through [`Presentation::on_play_settled`](crate::presentation::Presentation::on_play_settled).

use alloc::string::String;

/// How much of the media is decoded, mirroring `HTMLMediaElement.readyState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    /// No information is available.
    HaveNothing,
    /// Duration and dimensions are known.
    HaveMetadata,
    /// The current frame is decoded.
    HaveCurrentData,
    /// Enough is decoded to advance a little.
    HaveFutureData,
    /// Playback can run to the end without stalling.
    HaveEnoughData,
}

impl ReadyState {
    /// Converts the numeric DOM value; out-of-range values saturate.
    #[must_use]
    pub const fn from_dom(value: u16) -> Self {
        match value {
            0 => Self::HaveNothing,
            1 => Self::HaveMetadata,
            2 => Self::HaveCurrentData,
            3 => Self::HaveFutureData,
            _ => Self::HaveEnoughData,
        }
    }

    /// Whether the element can show a frame (`readyState >= 2`).
    #[must_use]
    pub const fn is_playable(self) -> bool {
        matches!(
            self,
            Self::HaveCurrentData | Self::HaveFutureData | Self::HaveEnoughData
        )
    }
}

/// Signals a media element emits that the core reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    /// `loadedmetadata`
    LoadedMetadata,
    /// `canplay`
    CanPlay,
    /// `canplaythrough`
    CanPlayThrough,
    /// `ended`
    Ended,
}

/// Identifies one of the session's media elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The countdown video.
    CountdownVideo,
    /// The countdown soundtrack; the reference clock during the countdown.
    CountdownAudio,
    /// Background music for the letter phase.
    Music,
    /// Cue played on every "Yes" click.
    YesCue,
    /// Cue played on acceptance.
    FinalCue,
    /// Cue played on every "No" evasion.
    NoCue,
}

impl Channel {
    /// Every channel, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::CountdownVideo,
        Self::CountdownAudio,
        Self::Music,
        Self::YesCue,
        Self::FinalCue,
        Self::NoCue,
    ];
}

/// A controllable media element.
pub trait MediaElement {
    /// Starts (re)loading the current source.
    fn load(&mut self);

    /// Asks the element to start playing.
    ///
    /// The outcome arrives later through the session's `on_play_settled`.
    fn request_play(&mut self);

    /// Pauses without changing the position.
    fn pause(&mut self);

    /// Whether the element is paused.
    fn is_paused(&self) -> bool;

    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Seeks to a position in seconds.
    fn set_current_time(&mut self, seconds: f64);

    /// Sets the volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f64);

    /// Mutes or unmutes.
    fn set_muted(&mut self, muted: bool);

    /// Current decode readiness.
    fn ready_state(&self) -> ReadyState;

    /// The current source URL, if any.
    fn source(&self) -> Option<String>;

    /// Replaces the source URL. Does not load.
    fn set_source(&mut self, url: &str);

    /// Sets the visual opacity of the element; audio-only elements ignore it.
    fn set_opacity(&mut self, opacity: f64) {
        _ = opacity;
    }
}

/// The six media elements of a session.
#[derive(Debug)]
pub struct MediaSet<M> {
    /// Countdown video.
    pub video: M,
    /// Countdown soundtrack.
    pub countdown_audio: M,
    /// Background music.
    pub music: M,
    /// "Yes" cue.
    pub yes_cue: M,
    /// Acceptance cue.
    pub final_cue: M,
    /// "No" cue.
    pub no_cue: M,
}

impl<M: MediaElement> MediaSet<M> {
    /// Returns the element for `channel`.
    pub fn get_mut(&mut self, channel: Channel) -> &mut M {
        match channel {
            Channel::CountdownVideo => &mut self.video,
            Channel::CountdownAudio => &mut self.countdown_audio,
            Channel::Music => &mut self.music,
            Channel::YesCue => &mut self.yes_cue,
            Channel::FinalCue => &mut self.final_cue,
            Channel::NoCue => &mut self.no_cue,
        }
    }

    /// Rewinds a cue to the start and plays it.
    pub fn play_cue(&mut self, channel: Channel) {
        let cue = self.get_mut(channel);
        cue.set_current_time(0.0);
        cue.request_play();
    }
}

/// Appends a cache-busting `t` query parameter to `url`.
#[must_use]
pub fn cache_busted(url: &str, stamp: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    alloc::format!("{url}{separator}t={stamp}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_from_dom() {
        assert_eq!(ReadyState::from_dom(0), ReadyState::HaveNothing, "0");
        assert_eq!(ReadyState::from_dom(2), ReadyState::HaveCurrentData, "2");
        assert_eq!(ReadyState::from_dom(9), ReadyState::HaveEnoughData, "saturates");
        assert!(!ReadyState::HaveMetadata.is_playable(), "metadata only");
        assert!(ReadyState::HaveCurrentData.is_playable(), "current data");
    }

    #[test]
    fn cache_bust_picks_separator() {
        assert_eq!(
            cache_busted("countdown.mp4", 42),
            "countdown.mp4?t=42",
            "plain url"
        );
        assert_eq!(
            cache_busted("countdown.mp4?v=2", 42),
            "countdown.mp4?v=2&t=42",
            "existing query"
        );
    }
}
