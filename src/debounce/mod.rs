use crate::timer::{Timer, TimerId};
use crate::util::lock;
use std::sync::{Arc, Mutex};

pub(crate) const DEFAULT_DEBOUNCE_MS: u32 = 500;

type Action<A> = Box<dyn FnMut(A) + Send + 'static>;

/// Coalesces bursts of calls into one delayed invocation.
///
/// Every [`call`](Debouncer::call) restarts the quiet period. When it elapses,
/// the action runs once with the arguments of the last call. Actions that
/// persist shared state should read it when they run, not when they are
/// scheduled.
pub(crate) struct Debouncer<A: Send + 'static> {
    timer: Arc<dyn Timer>,
    delay_ms: u32,
    shared: Arc<Shared<A>>,
}

struct Shared<A> {
    action: Mutex<Action<A>>,
    pending: Mutex<Option<(TimerId, A)>>,
}

impl<A: Send + 'static> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            timer: Arc::clone(&self.timer),
            delay_ms: self.delay_ms,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new(
        timer: Arc<dyn Timer>,
        delay_ms: u32,
        action: impl FnMut(A) + Send + 'static,
    ) -> Self {
        Self {
            timer,
            delay_ms,
            shared: Arc::new(Shared {
                action: Mutex::new(Box::new(action)),
                pending: Mutex::new(None),
            }),
        }
    }

    pub fn call(&self, args: A) {
        if let Some((id, _)) = lock(&self.shared.pending).take() {
            self.timer.clear_timeout(id);
        }

        let shared = Arc::clone(&self.shared);
        let scheduled = self.timer.set_timeout(
            self.delay_ms,
            Box::new(move || Self::fire(&shared)),
        );

        match scheduled {
            Some(id) => *lock(&self.shared.pending) = Some((id, args)),
            // No timer available: degrade to an immediate call.
            None => Self::run(&self.shared, args),
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.shared.pending).is_some()
    }

    /// Drop the pending invocation, if any.
    pub fn cancel(&self) {
        if let Some((id, _)) = lock(&self.shared.pending).take() {
            self.timer.clear_timeout(id);
        }
    }

    /// Run the pending invocation now. Returns `false` if nothing was pending.
    pub fn flush(&self) -> bool {
        let Some((id, args)) = lock(&self.shared.pending).take() else {
            return false;
        };
        self.timer.clear_timeout(id);
        Self::run(&self.shared, args);
        true
    }

    fn fire(shared: &Shared<A>) {
        let Some((_, args)) = lock(&shared.pending).take() else {
            return;
        };
        Self::run(shared, args);
    }

    fn run(shared: &Shared<A>, args: A) {
        let mut action = lock(&shared.action);
        (*action)(args);
    }
}
