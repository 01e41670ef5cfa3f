// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for curtaincall.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`TickLoop`]: `setInterval` tick source
//! - [`HtmlMedia`]: [`MediaElement`] over `HTMLMediaElement`, with `play()`
//!   outcomes queued in [`PlaySettlements`]
//! - [`DomStage`]: [`Stage`] over the page's elements
//! - [`ConsoleSink`]: trace events on the browser console

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "browser bindings are only reachable on wasm32")
)]

extern crate alloc;

mod console;
mod media;
mod stage;
mod tick;

pub use console::ConsoleSink;
pub use curtaincall_core::media::MediaElement;
pub use curtaincall_core::stage::Stage;
pub use media::{HtmlMedia, PlaySettlement, PlaySettlements, media_event_from_type};
pub use stage::{BindError, DomStage, button_from_event, classify_button};
pub use tick::TickLoop;

use core::f64::consts::TAU;

use curtaincall_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    let ms = tick::performance_now();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

/// A uniformly random direction in `[0, 2π)` from `Math.random()`.
#[must_use]
pub fn random_angle() -> f64 {
    js_sys::Math::random() * TAU
}
