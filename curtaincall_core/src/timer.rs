// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick-driven timers and linear ramps.
//!
//! Components never own a platform timer. A one-shot timer is an
//! `Option<HostTime>` deadline, and a periodic timer is an [`Interval`]; both
//! are checked from the component's `poll(now)`. Clearing a timer means
//! dropping it back to `None`, which is what makes leak-freedom observable via
//! each component's `active_timers()`.

use crate::time::{Duration, HostTime};

/// Returns `true` and clears `slot` if its deadline has been reached.
///
/// This is the one-shot timer primitive: it fires at most once.
#[inline]
pub fn take_due(slot: &mut Option<HostTime>, now: HostTime) -> bool {
    match *slot {
        Some(deadline) if now >= deadline => {
            *slot = None;
            true
        }
        _ => false,
    }
}

/// A periodic timer sampled from `poll`.
///
/// Missed periods are coalesced: a late poll fires once and schedules the
/// next sample one period after `now`, never a burst of catch-up samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    next: HostTime,
    period: Duration,
}

impl Interval {
    /// Creates an interval whose first sample is one period after `start`.
    #[must_use]
    pub fn starting_at(start: HostTime, period: Duration) -> Self {
        Self {
            next: start.saturating_add(period),
            period,
        }
    }

    /// Returns `true` if a sample is due at `now`, advancing the schedule.
    pub fn fire(&mut self, now: HostTime) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now.saturating_add(self.period);
        true
    }

    /// The host time of the next sample.
    #[must_use]
    pub const fn next(&self) -> HostTime {
        self.next
    }
}

/// A linear ramp from one value to another over a fixed window.
///
/// Used for the countdown fade-out (volume and opacity) and the background
/// music fade-in. Values are clamped to `to` once the window has elapsed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    start: HostTime,
    duration: Duration,
    from: f64,
    to: f64,
}

impl Ramp {
    /// Creates a ramp that begins at `start`.
    #[must_use]
    pub const fn new(start: HostTime, duration: Duration, from: f64, to: f64) -> Self {
        Self {
            start,
            duration,
            from,
            to,
        }
    }

    /// Progress through the window in `[0, 1]`.
    ///
    /// A zero-length ramp is complete immediately.
    #[must_use]
    pub fn progress(&self, now: HostTime) -> f64 {
        if self.duration == Duration::ZERO {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start).ticks() as f64;
        (elapsed / self.duration.ticks() as f64).clamp(0.0, 1.0)
    }

    /// The ramp's value at `now`.
    #[must_use]
    pub fn value_at(&self, now: HostTime) -> f64 {
        let p = self.progress(now);
        if p >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * p
    }

    /// Returns `true` once the full window has elapsed.
    #[must_use]
    pub fn is_complete(&self, now: HostTime) -> bool {
        self.progress(now) >= 1.0
    }
}

/// A [`Ramp`] sampled at a fixed tick interval.
///
/// Each due sample yields the ramp value; the final sample is exactly the
/// ramp's end value and marks the ticker finished.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RampTicker {
    ramp: Ramp,
    ticks: Interval,
}

/// One sample of a [`RampTicker`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RampSample {
    /// The ramp value at the sample time.
    pub value: f64,
    /// Whether this was the last sample.
    pub complete: bool,
}

impl RampTicker {
    /// Starts sampling `ramp` every `tick` from the ramp's start time.
    #[must_use]
    pub fn new(ramp: Ramp, tick: Duration) -> Self {
        Self {
            ramp,
            ticks: Interval::starting_at(ramp.start, tick),
        }
    }

    /// Returns a sample if one is due at `now`.
    pub fn sample(&mut self, now: HostTime) -> Option<RampSample> {
        if !self.ticks.fire(now) {
            return None;
        }
        Some(RampSample {
            value: self.ramp.value_at(now),
            complete: self.ramp.is_complete(now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_due_fires_once() {
        let mut slot = Some(HostTime(100));
        assert!(!take_due(&mut slot, HostTime(99)), "not yet due");
        assert!(take_due(&mut slot, HostTime(150)), "due");
        assert!(slot.is_none(), "cleared after firing");
        assert!(!take_due(&mut slot, HostTime(200)), "never fires twice");
    }

    #[test]
    fn interval_coalesces_late_polls() {
        let mut iv = Interval::starting_at(HostTime(0), Duration(500));
        assert!(!iv.fire(HostTime(499)), "first sample after one period");
        assert!(iv.fire(HostTime(500)), "first sample");
        assert!(iv.fire(HostTime(5_000)), "late poll fires once");
        assert_eq!(iv.next(), HostTime(5_500), "rescheduled from now");
        assert!(!iv.fire(HostTime(5_001)), "no burst");
    }

    #[test]
    fn ramp_is_linear_and_clamped() {
        let ramp = Ramp::new(HostTime(1000), Duration(2000), 0.0, 0.025);
        assert!((ramp.value_at(HostTime(1000)) - 0.0).abs() < 1e-12, "start");
        assert!(
            (ramp.value_at(HostTime(2000)) - 0.0125).abs() < 1e-12,
            "midpoint"
        );
        assert_eq!(ramp.value_at(HostTime(9000)), 0.025, "clamped at end");
        assert!(!ramp.is_complete(HostTime(2999)), "not complete early");
        assert!(ramp.is_complete(HostTime(3000)), "complete at end");
    }

    #[test]
    fn falling_ramp_reaches_zero_exactly() {
        let ramp = Ramp::new(HostTime(0), Duration(2000), 0.5, 0.0);
        assert_eq!(ramp.value_at(HostTime(2000)), 0.0, "exact end value");
        assert!(
            (ramp.value_at(HostTime(500)) - 0.375).abs() < 1e-12,
            "quarter way"
        );
    }

    #[test]
    fn zero_length_ramp_is_complete() {
        let ramp = Ramp::new(HostTime(10), Duration::ZERO, 1.0, 0.0);
        assert!(ramp.is_complete(HostTime(10)), "complete immediately");
        assert_eq!(ramp.value_at(HostTime(10)), 0.0, "end value");
    }

    #[test]
    fn ticker_samples_until_complete() {
        let ramp = Ramp::new(HostTime(0), Duration(200), 0.0, 1.0);
        let mut ticker = RampTicker::new(ramp, Duration(50));
        assert_eq!(ticker.sample(HostTime(10)), None, "first tick at 50");
        let s = ticker.sample(HostTime(50)).expect("tick at 50");
        assert!(!s.complete, "not complete at 50");
        assert!((s.value - 0.25).abs() < 1e-12, "value at 50");
        let last = ticker.sample(HostTime(200)).expect("tick at 200");
        assert!(last.complete, "complete at 200");
        assert_eq!(last.value, 1.0, "end value");
    }
}
