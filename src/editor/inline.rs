use crate::api::NoteGateway;
use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE_MS};
use crate::models::Note;
use crate::state::notes::NoteCollection;
use crate::timer::Timer;
use crate::util::lock;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Fields edited in place on a card and not yet saved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct PendingFields {
    title: Option<String>,
    content: Option<String>,
}

impl PendingFields {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    fn apply_to(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
    }
}

/// Debounced saving of a card's in-place title and content edits.
///
/// Only the edited fields are remembered. When the quiet period ends they are
/// written over the note as it is in the working set at that moment, so a
/// drag or another field edit in between is kept.
pub(crate) struct InlineEdits {
    pending: Arc<Mutex<PendingFields>>,
    commit: Debouncer<()>,
}

impl InlineEdits {
    pub fn new<G: NoteGateway + Send + Sync + 'static>(
        note_id: i64,
        notes: NoteCollection<G>,
        timer: Arc<dyn Timer>,
        save: impl Fn(Note) + Send + 'static,
    ) -> Self {
        let pending = Arc::new(Mutex::new(PendingFields::default()));
        let fields = Arc::clone(&pending);
        let commit = Debouncer::new(timer, DEFAULT_DEBOUNCE_MS, move |()| {
            let edits = std::mem::take(&mut *lock(&fields));
            if edits.is_empty() {
                return;
            }
            let Some(mut note) = notes.get(note_id) else {
                debug!(note_id, "inline edit for a note that is gone; dropped");
                return;
            };
            edits.apply_to(&mut note);
            save(note);
        });
        Self { pending, commit }
    }

    pub fn set_title(&self, title: String) {
        lock(&self.pending).title = Some(title);
        self.commit.call(());
    }

    pub fn set_content(&self, content: String) {
        lock(&self.pending).content = Some(content);
        self.commit.call(());
    }

    /// Save pending edits now, e.g. when the card goes away.
    pub fn flush(&self) -> bool {
        self.commit.flush()
    }
}
