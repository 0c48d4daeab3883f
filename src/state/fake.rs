//! In-memory stand-ins for the remote note store and user directory.

use crate::api::{ApiError, ApiErrorKind, ApiResult, NoteEnvelope, NoteGateway, UserSource};
use crate::models::{Note, User};
use crate::util::lock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeInner {
    records: Mutex<BTreeMap<i64, String>>,
    users: Mutex<Vec<User>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    user_fetches: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeStore(Arc<FakeInner>);

fn network_down() -> ApiError {
    ApiError {
        kind: ApiErrorKind::Network,
        message: "connection refused".to_string(),
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError {
        kind: ApiErrorKind::NotFound,
        message: format!("no note {id}"),
    }
}

impl FakeStore {
    pub fn with_notes(notes: &[Note]) -> Self {
        let store = Self::default();
        for note in notes {
            store.put(note);
        }
        store
    }

    pub fn put(&self, note: &Note) {
        let env = NoteEnvelope::wrap(note).expect("note should encode");
        lock(&self.0.records).insert(env.id, env.body);
    }

    pub fn put_raw(&self, id: i64, body: &str) {
        lock(&self.0.records).insert(id, body.to_string());
    }

    /// Decoded record as currently stored.
    pub fn stored(&self, id: i64) -> Option<Note> {
        let body = lock(&self.0.records).get(&id).cloned()?;
        NoteEnvelope { id, body }.unwrap_note().ok()
    }

    pub fn ids(&self) -> Vec<i64> {
        lock(&self.0.records).keys().copied().collect()
    }

    pub fn set_users(&self, users: Vec<User>) {
        *lock(&self.0.users) = users;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.0.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.0.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Write attempts, successful or not.
    pub fn writes(&self) -> usize {
        self.0.writes.load(Ordering::SeqCst)
    }

    pub fn user_fetches(&self) -> usize {
        self.0.user_fetches.load(Ordering::SeqCst)
    }

    fn begin_write(&self) -> ApiResult<()> {
        self.0.writes.fetch_add(1, Ordering::SeqCst);
        if self.0.fail_writes.load(Ordering::SeqCst) {
            return Err(network_down());
        }
        Ok(())
    }
}

impl NoteGateway for FakeStore {
    async fn list_notes(&self) -> ApiResult<Vec<NoteEnvelope>> {
        if self.0.fail_reads.load(Ordering::SeqCst) {
            return Err(network_down());
        }
        Ok(lock(&self.0.records)
            .iter()
            .map(|(id, body)| NoteEnvelope {
                id: *id,
                body: body.clone(),
            })
            .collect())
    }

    async fn get_note(&self, id: i64) -> ApiResult<NoteEnvelope> {
        if self.0.fail_reads.load(Ordering::SeqCst) {
            return Err(network_down());
        }
        let body = lock(&self.0.records)
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))?;
        Ok(NoteEnvelope { id, body })
    }

    async fn create_note(&self, note: &Note) -> ApiResult<()> {
        self.begin_write()?;
        self.put(note);
        Ok(())
    }

    async fn update_note(&self, note: &Note) -> ApiResult<()> {
        self.begin_write()?;
        if !lock(&self.0.records).contains_key(&note.id) {
            return Err(not_found(note.id));
        }
        self.put(note);
        Ok(())
    }
}

impl UserSource for FakeStore {
    async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.0.user_fetches.fetch_add(1, Ordering::SeqCst);
        if self.0.fail_reads.load(Ordering::SeqCst) {
            return Err(network_down());
        }
        Ok(lock(&self.0.users).clone())
    }
}
