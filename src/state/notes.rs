use crate::api::{ApiResult, NoteGateway};
use crate::models::{Note, Point};
use crate::state::status::{
    StatusBanner, MSG_CREATED, MSG_CREATE_FAILED, MSG_DELETED, MSG_DELETE_FAILED,
    MSG_LOAD_FAILED, MSG_UPDATE_FAILED,
};
use crate::timer::Timer;
use crate::util::{lock, note_timestamp};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub(crate) const DEFAULT_TITLE: &str = "Untitled";
pub(crate) const DEFAULT_CONTENT: &str = "Double click to edit";
pub(crate) const DEFAULT_POSITION: Point = Point::new(100.0, 100.0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct UpdateOptions {
    /// Persist with `deleted = true` and drop the note locally once stored.
    pub soft_delete: bool,
    /// Reload the working set after a successful write.
    pub refresh: bool,
}

type ChangeListener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct WorkingSet {
    notes: Vec<Note>,

    /// Ids the store holds as soft-deleted. Never handed out again.
    retired: BTreeSet<i64>,
}

struct Inner<G> {
    gateway: G,
    set: Mutex<WorkingSet>,
    status: StatusBanner,
    listeners: Mutex<Vec<ChangeListener>>,
}

/// Local working set of live notes, kept in step with the remote store.
///
/// Every mutation goes through the gateway first (except deletes, which are
/// optimistic) and reports its outcome on the shared [`StatusBanner`].
/// Listeners registered with [`subscribe`](NoteCollection::subscribe) run after
/// every change to the working set.
pub(crate) struct NoteCollection<G> {
    inner: Arc<Inner<G>>,
}

impl<G> Clone for NoteCollection<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: NoteGateway> NoteCollection<G> {
    pub fn new(gateway: G, timer: Arc<dyn Timer>) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                set: Mutex::new(WorkingSet::default()),
                status: StatusBanner::new(timer),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn notes(&self) -> Vec<Note> {
        lock(&self.inner.set).notes.clone()
    }

    pub fn get(&self, id: i64) -> Option<Note> {
        lock(&self.inner.set).notes.iter().find(|n| n.id == id).cloned()
    }

    pub fn status(&self) -> &StatusBanner {
        &self.inner.status
    }

    pub fn subscribe(&self, f: impl Fn() + Send + Sync + 'static) {
        lock(&self.inner.listeners).push(Arc::new(f));
    }

    /// One past the highest id seen, live or retired.
    pub fn next_id(&self) -> i64 {
        let set = lock(&self.inner.set);
        let live = set.notes.iter().map(|n| n.id).max();
        let retired = set.retired.last().copied();
        live.max(retired).map_or(1, |max| max + 1)
    }

    /// Replace the working set with the store's non-deleted notes.
    ///
    /// A record whose body can't be decoded is kept as an empty placeholder so
    /// its id stays reserved. A failed fetch leaves the working set untouched.
    pub async fn load(&self) {
        let envelopes = match self.inner.gateway.list_notes().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "loading notes failed");
                self.inner.status.error(MSG_LOAD_FAILED);
                return;
            }
        };

        let mut notes = Vec::with_capacity(envelopes.len());
        let mut retired = BTreeSet::new();
        let mut malformed = 0usize;
        for env in &envelopes {
            match env.unwrap_note() {
                Ok(note) if note.deleted => {
                    retired.insert(note.id);
                }
                Ok(note) => notes.push(note),
                Err(e) => {
                    warn!(id = env.id, error = %e, "unreadable note body");
                    malformed += 1;
                    notes.push(Note::placeholder(env.id));
                }
            }
        }

        debug!(live = notes.len(), retired = retired.len(), "notes loaded");
        {
            let mut set = lock(&self.inner.set);
            set.notes = notes;
            set.retired = retired;
        }
        if malformed > 0 {
            self.inner.status.error(MSG_LOAD_FAILED);
        }
        self.notify();
    }

    pub async fn refresh(&self) {
        self.load().await;
    }

    /// Persist a fresh default note. Returns its id once the store accepted it.
    pub async fn create(&self) -> Option<i64> {
        let note = Note {
            id: self.next_id(),
            x: DEFAULT_POSITION.x,
            y: DEFAULT_POSITION.y,
            title: DEFAULT_TITLE.to_string(),
            content: DEFAULT_CONTENT.to_string(),
            date: note_timestamp(),
            ..Default::default()
        };

        match self.inner.gateway.create_note(&note).await {
            Ok(()) => {
                info!(id = note.id, "note created");
                self.inner.status.success(MSG_CREATED);
                self.refresh().await;
                Some(note.id)
            }
            Err(e) => {
                warn!(id = note.id, error = %e, "creating note failed");
                self.inner.status.error(MSG_CREATE_FAILED);
                None
            }
        }
    }

    /// Write `note` through to the store, stamping its modification date.
    ///
    /// The local copy only changes once the store accepted the write.
    pub async fn update(&self, mut note: Note, options: UpdateOptions) -> bool {
        note.date = note_timestamp();
        note.deleted = options.soft_delete;

        if let Err(e) = self.inner.gateway.update_note(&note).await {
            warn!(id = note.id, error = %e, "updating note failed");
            self.inner.status.error(MSG_UPDATE_FAILED);
            return false;
        }

        {
            let mut set = lock(&self.inner.set);
            if options.soft_delete {
                set.notes.retain(|n| n.id != note.id);
                set.retired.insert(note.id);
            } else if let Some(slot) = set.notes.iter_mut().find(|n| n.id == note.id) {
                *slot = note;
            }
        }
        self.inner.status.clear();
        self.notify();

        if options.refresh {
            self.refresh().await;
        }
        true
    }

    /// Remove the note at once, then persist the soft delete.
    ///
    /// If the store rejects it the working set is reloaded, which brings the
    /// note back.
    pub async fn delete(&self, note: &Note) -> bool {
        let removed = {
            let mut set = lock(&self.inner.set);
            let before = set.notes.len();
            set.notes.retain(|n| n.id != note.id);
            set.notes.len() != before
        };
        if removed {
            self.notify();
        }

        let mut tombstone = note.clone();
        tombstone.deleted = true;
        tombstone.date = note_timestamp();

        match self.inner.gateway.update_note(&tombstone).await {
            Ok(()) => {
                info!(id = note.id, "note deleted");
                lock(&self.inner.set).retired.insert(note.id);
                self.inner.status.success(MSG_DELETED);
                true
            }
            Err(e) => {
                warn!(id = note.id, error = %e, "deleting note failed");
                self.inner.status.error(MSG_DELETE_FAILED);
                self.refresh().await;
                false
            }
        }
    }

    /// Reposition a note locally without touching the store.
    pub fn move_local(&self, id: i64, position: Point) -> bool {
        let moved = {
            let mut set = lock(&self.inner.set);
            match set.notes.iter_mut().find(|n| n.id == id) {
                Some(note) => {
                    note.set_position(position);
                    true
                }
                None => false,
            }
        };
        if moved {
            self.notify();
        }
        moved
    }

    /// Persist the current local position of a note after a drag.
    pub async fn commit_position(&self, id: i64) -> bool {
        let Some(note) = self.get(id) else {
            debug!(id, "drag ended on a note that is gone; nothing to save");
            return false;
        };
        self.update(note, UpdateOptions::default()).await
    }

    /// Read one note straight from the store, bypassing the working set.
    pub async fn fetch_one(&self, id: i64) -> ApiResult<Note> {
        self.inner.gateway.get_note(id).await?.unwrap_note()
    }

    fn notify(&self) {
        let listeners = lock(&self.inner.listeners).clone();
        for f in listeners {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorKind;
    use crate::state::fake::FakeStore;
    use crate::state::status::StatusKind;
    use crate::timer::ManualTimer;
    use futures::executor::block_on;

    fn note(id: i64, title: &str) -> Note {
        Note {
            id,
            x: 10.0 * id as f64,
            y: 20.0,
            title: title.to_string(),
            content: format!("content {id}"),
            date: "01/01/2026 - 09:00".to_string(),
            ..Default::default()
        }
    }

    fn collection(store: &FakeStore) -> (NoteCollection<FakeStore>, Arc<ManualTimer>) {
        let timer = ManualTimer::new();
        (NoteCollection::new(store.clone(), timer.clone()), timer)
    }

    fn ids(c: &NoteCollection<FakeStore>) -> Vec<i64> {
        c.notes().iter().map(|n| n.id).collect()
    }

    fn status_of(c: &NoteCollection<FakeStore>) -> Option<(StatusKind, String)> {
        c.status().current().map(|m| (m.kind, m.text))
    }

    #[test]
    fn test_load_skips_soft_deleted_notes() {
        let mut gone = note(2, "gone");
        gone.deleted = true;
        let store = FakeStore::with_notes(&[note(1, "a"), gone, note(3, "c")]);
        let (c, _) = collection(&store);

        block_on(c.load());
        assert_eq!(ids(&c), vec![1, 3]);
        assert!(c.notes().iter().all(|n| !n.deleted));
        assert_eq!(status_of(&c), None);
    }

    #[test]
    fn test_load_keeps_placeholder_for_unreadable_body() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        store.put_raw(2, "{broken");
        let (c, _) = collection(&store);

        block_on(c.load());
        assert_eq!(ids(&c), vec![1, 2]);
        assert_eq!(c.get(2), Some(Note::placeholder(2)));
        assert_eq!(
            status_of(&c),
            Some((StatusKind::Error, MSG_LOAD_FAILED.to_string()))
        );
    }

    #[test]
    fn test_load_accepts_null_fields() {
        let store = FakeStore::default();
        store.put_raw(1, r#"{"x":5,"y":5,"title":null,"content":"hello"}"#);
        let (c, _) = collection(&store);

        block_on(c.load());
        let loaded = c.get(1).expect("note should load");
        assert_eq!((loaded.x, loaded.y), (5.0, 5.0));
        assert_eq!(loaded.title, "");
        assert_eq!(loaded.content, "hello");
        assert_eq!(status_of(&c), None);
    }

    #[test]
    fn test_load_failure_keeps_working_set() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        store.fail_reads(true);
        block_on(c.load());
        assert_eq!(ids(&c), vec![1]);
        assert_eq!(
            status_of(&c),
            Some((StatusKind::Error, MSG_LOAD_FAILED.to_string()))
        );
    }

    #[test]
    fn test_creates_from_empty_get_sequential_ids() {
        let store = FakeStore::default();
        let (c, _) = collection(&store);
        block_on(c.load());

        for expected in 1..=4 {
            assert_eq!(block_on(c.create()), Some(expected));
        }
        assert_eq!(ids(&c), vec![1, 2, 3, 4]);
        assert_eq!(store.ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_create_uses_defaults_and_reports_success() {
        let store = FakeStore::default();
        let (c, timer) = collection(&store);

        let id = block_on(c.create()).expect("create should succeed");
        let created = c.get(id).expect("created note is loaded");
        assert_eq!(created.title, DEFAULT_TITLE);
        assert_eq!(created.content, DEFAULT_CONTENT);
        assert_eq!(created.position(), DEFAULT_POSITION);
        assert!(!created.deleted);
        assert_eq!(
            status_of(&c),
            Some((StatusKind::Success, MSG_CREATED.to_string()))
        );

        timer.advance(2000);
        assert_eq!(status_of(&c), None);
    }

    #[test]
    fn test_create_failure_leaves_collection_alone() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        store.fail_writes(true);
        assert_eq!(block_on(c.create()), None);
        assert_eq!(ids(&c), vec![1]);
        assert_eq!(store.ids(), vec![1]);
        assert_eq!(
            status_of(&c),
            Some((StatusKind::Error, MSG_CREATE_FAILED.to_string()))
        );
    }

    #[test]
    fn test_next_id_skips_retired_ids() {
        let mut gone = note(5, "gone");
        gone.deleted = true;
        let store = FakeStore::with_notes(&[note(1, "a"), note(2, "b"), gone]);
        let (c, _) = collection(&store);
        block_on(c.load());

        assert_eq!(c.next_id(), 6);
        assert_eq!(block_on(c.create()), Some(6));
        assert!(store.stored(5).expect("tombstone kept").deleted);
    }

    #[test]
    fn test_update_replaces_in_place_and_stamps_date() {
        let store = FakeStore::with_notes(&[note(1, "a"), note(2, "b")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        let mut edited = c.get(2).expect("note 2");
        edited.title = "renamed".to_string();
        assert!(block_on(c.update(edited, UpdateOptions::default())));

        assert_eq!(ids(&c), vec![1, 2]);
        let local = c.get(2).expect("note 2");
        assert_eq!(local.title, "renamed");
        assert_ne!(local.date, "01/01/2026 - 09:00");
        assert_eq!(store.stored(2).expect("stored").title, "renamed");
        assert_eq!(status_of(&c), None);
    }

    #[test]
    fn test_update_failure_keeps_local_copy() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        store.fail_writes(true);
        let mut edited = c.get(1).expect("note 1");
        edited.title = "lost".to_string();
        assert!(!block_on(c.update(edited, UpdateOptions::default())));

        assert_eq!(c.get(1).expect("note 1").title, "a");
        assert_eq!(
            status_of(&c),
            Some((StatusKind::Error, MSG_UPDATE_FAILED.to_string()))
        );
    }

    #[test]
    fn test_update_is_idempotent() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        let mut edited = c.get(1).expect("note 1");
        edited.content = "same".to_string();
        block_on(c.update(edited.clone(), UpdateOptions::default()));
        let once = store.stored(1).expect("stored");
        block_on(c.update(edited, UpdateOptions::default()));
        let twice = store.stored(1).expect("stored");

        assert_eq!(Note { date: String::new(), ..once }, Note { date: String::new(), ..twice });
        assert_eq!(ids(&c), vec![1]);
    }

    #[test]
    fn test_persisted_note_loads_back_unchanged() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        let mut edited = c.get(1).expect("note 1");
        edited.styles.bold = true;
        edited.set_position(Point::new(42.0, 17.5));
        block_on(c.update(edited, UpdateOptions::default()));
        let written = c.get(1).expect("note 1");

        let (fresh, _) = collection(&store);
        block_on(fresh.load());
        assert_eq!(fresh.get(1), Some(written));
    }

    #[test]
    fn test_update_with_refresh_reloads() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());
        store.put(&note(9, "from elsewhere"));

        let edited = c.get(1).expect("note 1");
        block_on(c.update(
            edited,
            UpdateOptions {
                refresh: true,
                ..Default::default()
            },
        ));
        assert_eq!(ids(&c), vec![1, 9]);
    }

    #[test]
    fn test_soft_delete_update_drops_note() {
        let store = FakeStore::with_notes(&[note(1, "a"), note(2, "b")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        let target = c.get(1).expect("note 1");
        block_on(c.update(
            target,
            UpdateOptions {
                soft_delete: true,
                ..Default::default()
            },
        ));
        assert_eq!(ids(&c), vec![2]);
        assert!(store.stored(1).expect("stored").deleted);
    }

    #[test]
    fn test_delete_is_optimistic_and_persists_flag() {
        let store = FakeStore::with_notes(&[note(1, "a"), note(2, "b")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let (s, watched) = (seen.clone(), c.clone());
        c.subscribe(move || s.lock().unwrap().push(watched.notes().len()));

        let target = c.get(1).expect("note 1");
        assert!(block_on(c.delete(&target)));

        assert_eq!(seen.lock().unwrap().first(), Some(&1));
        assert_eq!(ids(&c), vec![2]);
        assert!(store.stored(1).expect("stored").deleted);
        assert_eq!(
            status_of(&c),
            Some((StatusKind::Success, MSG_DELETED.to_string()))
        );

        block_on(c.load());
        assert_eq!(ids(&c), vec![2]);
        assert_eq!(c.next_id(), 3);
    }

    #[test]
    fn test_delete_failure_restores_note() {
        let store = FakeStore::with_notes(&[note(1, "a"), note(2, "b")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let (s, watched) = (seen.clone(), c.clone());
        c.subscribe(move || s.lock().unwrap().push(watched.notes().len()));

        store.fail_writes(true);
        let target = c.get(1).expect("note 1");
        assert!(!block_on(c.delete(&target)));

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(ids(&c), vec![1, 2]);
        assert_eq!(
            status_of(&c),
            Some((StatusKind::Error, MSG_DELETE_FAILED.to_string()))
        );
    }

    #[test]
    fn test_move_local_does_not_write() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        assert!(c.move_local(1, Point::new(300.0, 250.0)));
        assert!(!c.move_local(42, Point::new(0.0, 0.0)));
        assert_eq!(c.get(1).expect("note 1").position(), Point::new(300.0, 250.0));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_commit_position_persists_moved_note() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        c.move_local(1, Point::new(55.0, 66.0));
        assert!(block_on(c.commit_position(1)));
        assert_eq!(store.stored(1).expect("stored").position(), Point::new(55.0, 66.0));
    }

    #[test]
    fn test_commit_position_skips_missing_note() {
        let store = FakeStore::with_notes(&[note(1, "a")]);
        let (c, _) = collection(&store);
        block_on(c.load());

        assert!(!block_on(c.commit_position(7)));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_fetch_one() {
        let store = FakeStore::with_notes(&[note(4, "single")]);
        let (c, _) = collection(&store);

        assert_eq!(block_on(c.fetch_one(4)).expect("found").title, "single");
        let err = block_on(c.fetch_one(5)).expect_err("missing");
        assert_eq!(err.kind, ApiErrorKind::NotFound);
    }
}
