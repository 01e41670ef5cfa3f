// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for the visual surfaces.
//!
//! Curtaincall splits platform work into *backend* crates. Each backend
//! provides:
//!
//! - **Tick source**: calls [`Presentation::poll`] at a fixed cadence. This
//!   is backend-specific and not abstracted by a trait.
//! - **Time**: `now() -> HostTime` and `timebase() -> Timebase` free
//!   functions reading the platform's monotonic clock.
//! - **Media**: one [`MediaElement`] implementation per element kind.
//! - **Stage**: implements [`Stage`] to apply show/hide/text/image/placement
//!   commands to native surfaces (e.g. DOM nodes).
//! - **Geometry**: [`Stage::geometry`] answers layout queries as a
//!   [`Geometry`] snapshot.
//!
//! The core issues imperative commands only. Nothing the stage displays is
//! ever read back, except geometry.
//!
//! [`Presentation::poll`]: crate::presentation::Presentation::poll
//! [`MediaElement`]: crate::media::MediaElement

use kurbo::Vec2;

use crate::layout::Geometry;

/// A fixed surface of the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The overlay concealing the countdown.
    Curtain,
    /// Status text on the curtain.
    LoadingIndicator,
    /// The countdown overlay (video and its frame).
    Countdown,
    /// The closed envelope.
    Envelope,
    /// The letter container.
    Letter,
    /// The letter window that animates open.
    LetterWindow,
    /// The prompt title inside the letter.
    Prompt,
    /// The letter illustration.
    LetterImage,
    /// The panel holding the "Yes" and "No" buttons.
    ButtonPanel,
    /// Text revealed on acceptance.
    FinalText,
}

/// A button the core positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonId {
    /// The original "Yes" button in the panel's flow layout.
    Yes,
    /// The original "No" button in the panel's flow layout.
    StaticNo,
    /// The free-floating "No" button created on first interaction.
    DynamicNo,
    /// The "Yes" button that replaces the "No" button on conversion.
    ConvertedYes,
}

/// Where a button sits relative to its layout anchor, and how large it is.
///
/// Floating buttons are anchored at their container's center; flow buttons
/// at their own flow position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButtonPlacement {
    /// Offset from the anchor, in CSS pixels.
    pub offset: Vec2,
    /// Uniform scale applied after the offset.
    pub scale: f64,
}

impl ButtonPlacement {
    /// No offset, unit scale.
    pub const ANCHORED: Self = Self {
        offset: Vec2::ZERO,
        scale: 1.0,
    };

    /// An offset with unit scale.
    #[must_use]
    pub const fn at(offset: Vec2) -> Self {
        Self { offset, scale: 1.0 }
    }
}

/// Applies the core's commands to a platform-native presentation.
///
/// The DOM backend implements this over page elements; tests use a
/// recording double.
pub trait Stage {
    /// Shows or hides a surface.
    fn set_visible(&mut self, surface: Surface, visible: bool);

    /// Replaces a surface's text content.
    fn set_text(&mut self, surface: Surface, text: &str);

    /// Replaces a surface's image source.
    fn set_image(&mut self, surface: Surface, src: &str);

    /// Adds a state class (`raised`, `open`, `final`).
    fn add_class(&mut self, surface: Surface, class: &str);

    /// Creates a floating button inside the button panel.
    ///
    /// Only [`ButtonId::DynamicNo`] and [`ButtonId::ConvertedYes`] are ever
    /// spawned, each at most once.
    fn spawn_button(&mut self, button: ButtonId);

    /// Shows or hides a button.
    fn set_button_visible(&mut self, button: ButtonId, visible: bool);

    /// Moves and scales a button, animating if the platform supports it.
    fn place_button(&mut self, button: ButtonId, placement: ButtonPlacement);

    /// Measures the button panel, the viewport, the original "Yes" button
    /// and `floating`.
    ///
    /// A button that does not exist yet measures as zero size.
    fn geometry(&self, floating: ButtonId) -> Geometry;
}
