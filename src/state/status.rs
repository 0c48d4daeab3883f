use crate::timer::{Timer, TimerId};
use crate::util::lock;
use std::sync::{Arc, Mutex};

/// How long a status message stays visible.
pub(crate) const STATUS_LIFETIME_MS: u32 = 2000;

pub(crate) const MSG_CREATED: &str = "Note successfully created!";
pub(crate) const MSG_CREATE_FAILED: &str = "Error creating note.";
pub(crate) const MSG_UPDATE_FAILED: &str = "Error updating note.";
pub(crate) const MSG_DELETED: &str = "Note successfully deleted!";
pub(crate) const MSG_DELETE_FAILED: &str = "Error deleting note.";
pub(crate) const MSG_LOAD_FAILED: &str = "Error loading notes.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

type StatusListener = Arc<dyn Fn(Option<StatusMessage>) + Send + Sync>;

#[derive(Default)]
struct BannerState {
    current: Option<StatusMessage>,
    expiry: Option<TimerId>,
    /// Bumped on every show/clear so a late expiry never hides a newer message.
    generation: u64,
}

/// Single transient status line.
#[derive(Clone)]
pub(crate) struct StatusBanner {
    timer: Arc<dyn Timer>,
    state: Arc<Mutex<BannerState>>,
    listeners: Arc<Mutex<Vec<StatusListener>>>,
}

impl StatusBanner {
    pub fn new(timer: Arc<dyn Timer>) -> Self {
        Self {
            timer,
            state: Arc::new(Mutex::new(BannerState::default())),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn current(&self) -> Option<StatusMessage> {
        lock(&self.state).current.clone()
    }

    pub fn subscribe(&self, f: impl Fn(Option<StatusMessage>) + Send + Sync + 'static) {
        lock(&self.listeners).push(Arc::new(f));
    }

    pub fn success(&self, text: &str) {
        self.show(StatusKind::Success, text);
    }

    pub fn error(&self, text: &str) {
        self.show(StatusKind::Error, text);
    }

    pub fn show(&self, kind: StatusKind, text: &str) {
        let message = StatusMessage {
            kind,
            text: text.to_string(),
        };

        let (generation, stale) = {
            let mut st = lock(&self.state);
            st.generation += 1;
            st.current = Some(message.clone());
            (st.generation, st.expiry.take())
        };
        if let Some(id) = stale {
            self.timer.clear_timeout(id);
        }

        let banner = self.clone();
        let expiry = self.timer.set_timeout(
            STATUS_LIFETIME_MS,
            Box::new(move || banner.expire(generation)),
        );
        {
            let mut st = lock(&self.state);
            if st.generation == generation {
                st.expiry = expiry;
            }
        }

        self.notify(Some(message));
    }

    pub fn clear(&self) {
        let (had_message, stale) = {
            let mut st = lock(&self.state);
            st.generation += 1;
            (st.current.take().is_some(), st.expiry.take())
        };
        if let Some(id) = stale {
            self.timer.clear_timeout(id);
        }
        if had_message {
            self.notify(None);
        }
    }

    fn expire(&self, generation: u64) {
        {
            let mut st = lock(&self.state);
            if st.generation != generation {
                return;
            }
            st.current = None;
            st.expiry = None;
        }
        self.notify(None);
    }

    fn notify(&self, message: Option<StatusMessage>) {
        let listeners = lock(&self.listeners).clone();
        for f in listeners {
            f(message.clone());
        }
    }
}
