// Copyright 2026 the Curtaincall Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setInterval` tick source.
//!
//! [`TickLoop`] calls back at a fixed cadence with the current
//! `performance.now()` converted to microsecond [`HostTime`] ticks. The
//! session's timers are all multiples of 50 ms, so an interval rather than
//! `requestAnimationFrame` keeps them firing while the page is hidden (at
//! whatever rate the browser throttles to).
//!
//! [`HostTime`]: curtaincall_core::time::HostTime

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use curtaincall_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods; avoids
// fetching (and unwrapping) the Window object on every tick.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setInterval")]
    fn set_interval(callback: &JsValue, millis: i32) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    fn clear_interval(id: i32);
}

/// A `setInterval` loop that emits the current [`HostTime`] on every tick.
///
/// Create with [`TickLoop::new`], then call [`start`](Self::start). The
/// interval is cleared by [`stop`](Self::stop) or when the `TickLoop` is
/// dropped.
pub struct TickLoop {
    inner: Rc<TickInner>,
}

type TickClosure = Closure<dyn FnMut()>;

struct TickInner {
    /// The JS closure registered with `setInterval`.
    closure: RefCell<Option<TickClosure>>,

    /// The user-supplied callback.
    callback: RefCell<Box<dyn FnMut(HostTime)>>,

    /// Interval period in milliseconds.
    period_ms: i32,

    /// Ticks delivered so far.
    tick_counter: Cell<u64>,

    running: Cell<bool>,

    /// The ID returned by `setInterval`, used when stopping.
    interval_id: Cell<i32>,
}

impl TickLoop {
    /// Creates a loop with the given period that is **not yet running**.
    pub fn new(callback: impl FnMut(HostTime) + 'static, period_ms: i32) -> Self {
        Self {
            inner: Rc::new(TickInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                period_ms,
                tick_counter: Cell::new(0),
                running: Cell::new(false),
                interval_id: Cell::new(0),
            }),
        }
    }

    /// Starts the interval.
    ///
    /// If already running, this is a no-op.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        if self.inner.closure.borrow().is_none() {
            let inner = Rc::downgrade(&self.inner);
            let closure = Closure::wrap(Box::new(move || {
                let Some(inner) = inner.upgrade() else {
                    return;
                };
                if !inner.running.get() {
                    return;
                }
                inner.tick_counter.set(inner.tick_counter.get() + 1);
                inner.callback.borrow_mut()(crate::now());
            }) as Box<dyn FnMut()>);
            *self.inner.closure.borrow_mut() = Some(closure);
        }

        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = set_interval(closure.as_ref().unchecked_ref(), self.inner.period_ms);
            self.inner.interval_id.set(id);
        }
    }

    /// Stops the interval. Can be restarted with [`start`](Self::start).
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        clear_interval(self.inner.interval_id.get());
    }

    /// Returns `true` if the loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.stop();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickLoop")
            .field("running", &self.inner.running.get())
            .field("period_ms", &self.inner.period_ms)
            .field("tick_counter", &self.inner.tick_counter.get())
            .finish()
    }
}
