use tracing::warn;

pub(crate) type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerId(pub(crate) i32);

/// One-shot timers, shaped after `setTimeout`/`clearTimeout`.
pub(crate) trait Timer: Send + Sync {
    /// Schedule `callback` after `delay_ms`. Returns `None` if nothing was scheduled.
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Option<TimerId>;

    /// Cancel a pending timer. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

/// `window.setTimeout` backed timer.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserTimer;

#[cfg(target_arch = "wasm32")]
impl Timer for BrowserTimer {
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Option<TimerId> {
        use wasm_bindgen::JsCast;

        let Some(win) = web_sys::window() else {
            warn!("no window; timer dropped");
            return None;
        };

        let cb = wasm_bindgen::closure::Closure::once_into_js(move || callback());
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        match win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            delay,
        ) {
            Ok(tid) => Some(TimerId(tid)),
            Err(e) => {
                warn!(?e, "setTimeout failed");
                None
            }
        }
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(id.0);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Timer for BrowserTimer {
    fn set_timeout(&self, _delay_ms: u32, _callback: TimerCallback) -> Option<TimerId> {
        warn!("browser timers are unavailable on this target; timer dropped");
        None
    }

    fn clear_timeout(&self, _id: TimerId) {}
}

/// Virtual-clock timer for tests. Nothing fires until [`ManualTimer::advance`].
#[cfg(test)]
#[derive(Default)]
pub(crate) struct ManualTimer {
    inner: std::sync::Mutex<ManualInner>,
}

#[cfg(test)]
#[derive(Default)]
struct ManualInner {
    now_ms: u64,
    next_id: i32,
    /// (deadline, id) -> callback; ordered by deadline then scheduling order.
    pending: std::collections::BTreeMap<(u64, i32), TimerCallback>,
}

#[cfg(test)]
impl ManualTimer {
    pub(crate) fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub(crate) fn now_ms(&self) -> u64 {
        crate::util::lock(&self.inner).now_ms
    }

    pub(crate) fn pending(&self) -> usize {
        crate::util::lock(&self.inner).pending.len()
    }

    /// Move the clock forward, firing due callbacks in deadline order.
    /// Callbacks may schedule further timers; those fire too if they fall due.
    pub(crate) fn advance(&self, ms: u64) {
        let target = self.now_ms() + ms;
        loop {
            let due = {
                let mut inner = crate::util::lock(&self.inner);
                let key = inner
                    .pending
                    .keys()
                    .next()
                    .copied()
                    .filter(|(deadline, _)| *deadline <= target);
                key.and_then(|k| {
                    inner.now_ms = k.0;
                    inner.pending.remove(&k)
                })
            };
            match due {
                Some(cb) => cb(),
                None => break,
            }
        }
        crate::util::lock(&self.inner).now_ms = target;
    }
}

#[cfg(test)]
impl Timer for ManualTimer {
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> Option<TimerId> {
        let mut inner = crate::util::lock(&self.inner);
        inner.next_id += 1;
        let id = inner.next_id;
        let deadline = inner.now_ms + u64::from(delay_ms);
        inner.pending.insert((deadline, id), callback);
        Some(TimerId(id))
    }

    fn clear_timeout(&self, id: TimerId) {
        crate::util::lock(&self.inner)
            .pending
            .retain(|(_, pending_id), _| *pending_id != id.0);
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_browser_timer_schedules_and_clears() {
        let id = BrowserTimer
            .set_timeout(10_000, Box::new(|| {}))
            .expect("window should be available");
        BrowserTimer.clear_timeout(id);
    }
}
