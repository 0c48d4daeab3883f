use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE_MS};
use crate::mentions::{insert_mention, KeyOutcome, MentionEngine, MentionKey};
use crate::models::{Note, NoteStyles, StyleChange, User};
use crate::timer::Timer;
use crate::util::lock;
use rand::Rng;
use std::sync::{Arc, Mutex};

/// The editable part of a note.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NoteDraft {
    pub title: String,
    pub content: String,
    pub styles: NoteStyles,
}

impl NoteDraft {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            styles: note.styles,
        }
    }

    /// `note` with this draft's fields written over it.
    pub fn apply_to(&self, note: &Note) -> Note {
        Note {
            title: self.title.clone(),
            content: self.content.clone(),
            styles: self.styles,
            ..note.clone()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EditorKeyOutcome {
    /// Let the text field handle the key.
    Ignored,
    /// Swallowed by the mention dropdown.
    Handled,
    /// A mention was inserted; move the caret to this byte index.
    Inserted { cursor: usize },
    /// Everything is saved and the editor should close.
    Close,
}

type SaveFn = Arc<dyn Fn(NoteDraft) + Send + Sync>;

/// State behind the card editor modal.
///
/// Title, content and style edits all feed the same draft and the same
/// debounced save, so a pause in typing persists all three together.
pub(crate) struct EditorSession<R> {
    draft: Arc<Mutex<NoteDraft>>,
    mentions: MentionEngine<R>,
    autosave: Debouncer<()>,
    on_save: SaveFn,
}

impl<R: Rng> EditorSession<R> {
    pub fn new(
        note: &Note,
        timer: Arc<dyn Timer>,
        rng: R,
        on_save: impl Fn(NoteDraft) + Send + Sync + 'static,
    ) -> Self {
        let draft = Arc::new(Mutex::new(NoteDraft::from_note(note)));
        let on_save: SaveFn = Arc::new(on_save);

        let (d, save) = (Arc::clone(&draft), Arc::clone(&on_save));
        let autosave = Debouncer::new(timer, DEFAULT_DEBOUNCE_MS, move |()| {
            let snapshot = lock(&d).clone();
            save(snapshot);
        });

        Self {
            draft,
            mentions: MentionEngine::new(rng),
            autosave,
            on_save,
        }
    }

    pub fn draft(&self) -> NoteDraft {
        lock(&self.draft).clone()
    }

    /// A debounced save is waiting for the typing pause to end.
    pub fn is_saving(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn mention_results(&self) -> &[User] {
        self.mentions.results()
    }

    pub fn selected_mention(&self) -> Option<usize> {
        self.mentions.selected_index()
    }

    pub fn set_title(&mut self, title: String) {
        lock(&self.draft).title = title;
        self.autosave.call(());
    }

    /// `cursor` is a byte index into `content`.
    pub fn set_content(&mut self, users: &[User], content: String, cursor: usize) {
        self.mentions.on_text_changed(users, &content, cursor);
        lock(&self.draft).content = content;
        self.autosave.call(());
    }

    pub fn set_style(&mut self, change: StyleChange) {
        lock(&self.draft).styles.apply(change);
        self.autosave.call(());
    }

    /// Insert `@username ` over the mention ending at `cursor`.
    /// Returns the caret position after the insertion.
    pub fn select_mention(&mut self, username: &str, cursor: usize) -> usize {
        let new_cursor = {
            let mut draft = lock(&self.draft);
            let (content, new_cursor) = insert_mention(&draft.content, username, cursor);
            draft.content = content;
            new_cursor
        };
        self.mentions.clear();
        self.autosave.call(());
        new_cursor
    }

    pub fn key_down(&mut self, key: &str, cursor: usize) -> EditorKeyOutcome {
        let Some(key) = MentionKey::from_key(key) else {
            return EditorKeyOutcome::Ignored;
        };

        match (key, self.mentions.on_key(key)) {
            (MentionKey::Escape, KeyOutcome::Commit(user)) => {
                self.select_mention(&user.username, cursor);
                self.save_now();
                EditorKeyOutcome::Close
            }
            (_, KeyOutcome::Commit(user)) => EditorKeyOutcome::Inserted {
                cursor: self.select_mention(&user.username, cursor),
            },
            (_, KeyOutcome::Handled) => EditorKeyOutcome::Handled,
            (MentionKey::Escape, KeyOutcome::Ignored) => {
                self.save_now();
                EditorKeyOutcome::Close
            }
            (_, KeyOutcome::Ignored) => EditorKeyOutcome::Ignored,
        }
    }

    /// Focus left a field: persist right away.
    pub fn blur(&mut self) {
        self.save_now();
    }

    /// Closing without Escape: run any pending save.
    pub fn close(&mut self) {
        self.mentions.clear();
        self.autosave.flush();
    }

    fn save_now(&self) {
        self.autosave.cancel();
        (self.on_save)(self.draft());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{user, Alignment};
    use crate::timer::ManualTimer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Harness {
        timer: Arc<ManualTimer>,
        saves: Arc<Mutex<Vec<NoteDraft>>>,
        session: EditorSession<StdRng>,
    }

    fn harness(content: &str) -> Harness {
        let note = Note {
            id: 1,
            title: "Untitled".to_string(),
            content: content.to_string(),
            ..Default::default()
        };
        let timer = ManualTimer::new();
        let saves = Arc::new(Mutex::new(Vec::new()));
        let s = saves.clone();
        let session = EditorSession::new(&note, timer.clone(), StdRng::seed_from_u64(5), move |d| {
            s.lock().unwrap().push(d)
        });
        Harness {
            timer,
            saves,
            session,
        }
    }

    fn directory() -> Vec<User> {
        vec![user("alice"), user("bob"), user("alfred")]
    }

    #[test]
    fn test_typing_burst_saves_once_with_latest_title() {
        let mut h = harness("");
        for title in ["G", "Gr", "Gro", "Groc", "Groceries"] {
            h.session.set_title(title.to_string());
            h.timer.advance(20);
        }
        assert!(h.session.is_saving());
        assert!(h.saves.lock().unwrap().is_empty());

        h.timer.advance(500);
        let saves = h.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].title, "Groceries");
        assert!(!h.session.is_saving());
    }

    #[test]
    fn test_title_content_and_style_persist_together() {
        let mut h = harness("");
        let users = directory();
        h.session.set_title("Plan".to_string());
        h.session.set_content(&users, "step one".to_string(), 8);
        h.session.set_style(StyleChange::Bold(true));
        h.session.set_style(StyleChange::Alignment(Alignment::Center));
        h.timer.advance(500);

        let saves = h.saves.lock().unwrap();
        assert_eq!(
            *saves,
            vec![NoteDraft {
                title: "Plan".to_string(),
                content: "step one".to_string(),
                styles: NoteStyles {
                    bold: true,
                    alignment: Alignment::Center,
                    ..Default::default()
                },
            }]
        );
    }

    #[test]
    fn test_enter_inserts_selected_mention() {
        let mut h = harness("");
        h.session.set_content(&directory(), "hi @al".to_string(), 6);
        assert_eq!(h.session.mention_results().len(), 2);

        assert_eq!(h.session.key_down("ArrowDown", 6), EditorKeyOutcome::Handled);
        assert_eq!(h.session.selected_mention(), Some(0));
        assert_eq!(
            h.session.key_down("Enter", 6),
            EditorKeyOutcome::Inserted { cursor: 10 }
        );
        assert_eq!(h.session.draft().content, "hi @alice ");
        assert!(h.session.mention_results().is_empty());

        h.timer.advance(500);
        assert_eq!(h.saves.lock().unwrap().last().map(|d| d.content.clone()), Some("hi @alice ".to_string()));
    }

    #[test]
    fn test_clicked_mention_is_inserted() {
        let mut h = harness("");
        h.session.set_content(&directory(), "ping @b tail".to_string(), 7);
        assert_eq!(h.session.select_mention("bob", 7), 10);
        assert_eq!(h.session.draft().content, "ping @bob  tail");
    }

    #[test]
    fn test_escape_without_results_saves_and_closes() {
        let mut h = harness("note");
        h.session.set_title("Edited".to_string());
        assert_eq!(h.session.key_down("Escape", 0), EditorKeyOutcome::Close);

        h.timer.advance(1000);
        let saves = h.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].title, "Edited");
    }

    #[test]
    fn test_escape_with_selection_commits_then_closes() {
        let mut h = harness("");
        h.session.set_content(&directory(), "@bo".to_string(), 3);
        h.session.key_down("ArrowDown", 3);
        assert_eq!(h.session.key_down("Escape", 3), EditorKeyOutcome::Close);

        h.timer.advance(1000);
        let saves = h.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].content, "@bob ");
    }

    #[test]
    fn test_escape_with_unselected_results_closes_too() {
        let mut h = harness("");
        h.session.set_content(&directory(), "@a".to_string(), 2);
        assert_eq!(h.session.key_down("Escape", 2), EditorKeyOutcome::Close);
        assert_eq!(h.saves.lock().unwrap()[0].content, "@a");
    }

    #[test]
    fn test_blur_saves_immediately() {
        let mut h = harness("");
        h.session.set_title("x".to_string());
        h.session.blur();
        assert_eq!(h.saves.lock().unwrap().len(), 1);
        h.timer.advance(1000);
        assert_eq!(h.saves.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_close_flushes_pending_save_only() {
        let mut h = harness("");
        h.session.close();
        assert!(h.saves.lock().unwrap().is_empty());

        h.session.set_style(StyleChange::Italic(true));
        h.session.close();
        assert_eq!(h.saves.lock().unwrap().len(), 1);
        assert!(h.saves.lock().unwrap()[0].styles.italic);
    }

    #[test]
    fn test_other_keys_pass_through() {
        let mut h = harness("");
        assert_eq!(h.session.key_down("a", 0), EditorKeyOutcome::Ignored);
        assert_eq!(h.session.key_down("Enter", 0), EditorKeyOutcome::Ignored);
    }

    #[test]
    fn test_draft_apply_to_keeps_position_and_id() {
        let note = Note {
            id: 3,
            x: 40.0,
            y: 50.0,
            title: "old".to_string(),
            ..Default::default()
        };
        let mut draft = NoteDraft::from_note(&note);
        draft.title = "new".to_string();
        let out = draft.apply_to(&note);
        assert_eq!((out.id, out.x, out.y), (3, 40.0, 50.0));
        assert_eq!(out.title, "new");
    }
}
