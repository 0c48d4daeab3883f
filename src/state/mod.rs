pub(crate) mod notes;
pub(crate) mod status;
pub(crate) mod users;

#[cfg(test)]
pub(crate) mod fake;

use crate::api::ApiClient;
use crate::models::{Note, User};
use crate::timer::{BrowserTimer, Timer};
use leptos::prelude::*;
use leptos::task::spawn_local;
use notes::NoteCollection;
use status::StatusMessage;
use std::sync::Arc;
use users::UserDirectory;

/// Application-wide stores plus the signals that let the view react to them.
///
/// The stores own the data. The signals only carry change notifications
/// (version counters) or mirror the status line.
#[derive(Clone)]
pub(crate) struct AppState {
    pub timer: Arc<dyn Timer>,
    pub notes: NoteCollection<ApiClient>,
    pub users: UserDirectory<ApiClient>,

    /// Bumped after every change to the note working set.
    pub notes_version: RwSignal<u64>,
    pub users_version: RwSignal<u64>,
    pub status: RwSignal<Option<StatusMessage>>,
}

impl AppState {
    pub fn new() -> Self {
        let timer: Arc<dyn Timer> = Arc::new(BrowserTimer);
        let client = ApiClient::from_env();

        let notes = NoteCollection::new(client.clone(), Arc::clone(&timer));
        let users = UserDirectory::new(client);

        let notes_version = RwSignal::new(0u64);
        let users_version = RwSignal::new(0u64);
        let status = RwSignal::new(None);

        notes.subscribe(move || notes_version.update(|v| *v += 1));
        notes.status().subscribe(move |m| status.set(m));
        users.subscribe(move || users_version.update(|v| *v += 1));

        Self {
            timer,
            notes,
            users,
            notes_version,
            users_version,
            status,
        }
    }

    /// Initial fetch of notes and users.
    pub fn start(&self) {
        let notes = self.notes.clone();
        spawn_local(async move { notes.load().await });

        let users = self.users.clone();
        spawn_local(async move { users.init().await });
    }

    /// Working set, tracked.
    pub fn notes_tracked(&self) -> Vec<Note> {
        self.notes_version.track();
        self.notes.notes()
    }

    pub fn note_tracked(&self, id: i64) -> Option<Note> {
        self.notes_version.track();
        self.notes.get(id)
    }

    pub fn users_tracked(&self) -> Arc<Vec<User>> {
        self.users_version.track();
        self.users.users()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
