// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick-driven state machines for a scripted reveal-and-letter page.
//!
//! `curtaincall_core` models one fixed session: a curtain that rises once
//! the countdown video is ready, a countdown video and soundtrack kept in
//! lockstep, a one-way hand-off to an envelope and letter, an evasive "No"
//! button and an escalating "Yes" confirmation. It is `no_std` compatible
//! (with `alloc`) and has no platform dependency: media elements and page
//! surfaces are reached through the [`MediaElement`](media::MediaElement)
//! and [`Stage`](stage::Stage) traits.
//!
//! # Architecture
//!
//! Nothing in the core owns a platform timer or awaits a future. A backend
//! forwards platform events and polls the session at a fixed cadence:
//!
//! ```text
//!   Backend (tick source, DOM events, play() settlements)
//!       │
//!       ▼
//!   Presentation::poll / on_* ──► ReadinessGate ──► CurtainController
//!                                                        │ raised
//!                 ┌──────────────────────────────────────┘
//!                 ▼
//!   CountdownSynchronizer ──ended/fallback──► PhaseTransition
//!       ▲                                          │ letter shown
//!   VisibilityRecovery                             ▼
//!                               EvasiveButton, YesConfirmation
//!       │
//!       ▼
//!   MediaElement / Stage commands
//! ```
//!
//! **[`presentation`]**: The orchestrator that owns every component and
//! enforces their ordering.
//!
//! **[`readiness`]**: Timeout-bounded readiness detection with one
//! cache-busted reload.
//!
//! **[`curtain`]**: Joins the minimum delay with readiness and raises the
//! curtain once.
//!
//! **[`countdown`]**: Synchronized playback, drift correction, fade-out and
//! idempotent termination.
//!
//! **[`visibility`]**: Pause on hide, resync on show.
//!
//! **[`transition`]**: Countdown to envelope to letter, with the music
//! fade-in.
//!
//! **[`evasion`]** and **[`layout`]**: The "No" button state machine and its
//! pure clamping math.
//!
//! **[`confirm`]**: The "Yes" click sequence.
//!
//! **[`time`]** and **[`timer`]**: Host ticks, deadlines, intervals and
//! linear ramps.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `testing` (disabled by default): Exposes the `testing` module doubles to
//!   downstream crates.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod confirm;
pub mod countdown;
pub mod curtain;
pub mod error;
pub mod evasion;
pub mod layout;
pub mod media;
pub mod presentation;
pub mod readiness;
pub mod stage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod time;
pub mod timer;
pub mod trace;
pub mod transition;
pub mod visibility;
