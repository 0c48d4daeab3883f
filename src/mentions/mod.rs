//! `@username` detection, suggestion and insertion for note text.

use crate::models::User;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Most suggestions shown at once.
pub(crate) const MAX_RESULTS: usize = 5;

/// An unfinished mention touching the end of the typed text.
static OPEN_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]*)$").expect("invalid open mention regex"));

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z0-9_]+").expect("invalid mention regex"));

/// Clamp a byte index to the text and round down to a char boundary.
fn floor_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// The mention being typed right before `cursor` (a byte index), if any.
///
/// Returns the byte offset of its `@` and the word characters typed after it.
pub(crate) fn detect_mention(text: &str, cursor: usize) -> Option<(usize, &str)> {
    let before = &text[..floor_boundary(text, cursor)];
    let caps = OPEN_MENTION.captures(before)?;
    let at = caps.get(0)?.start();
    let token = caps.get(1).map_or("", |m| m.as_str());
    Some((at, token))
}

/// Suggestions for `token`.
///
/// An empty token yields a random sample, otherwise the first users whose
/// username contains the token, ignoring case, in directory order.
pub(crate) fn filter_users<R: Rng + ?Sized>(users: &[User], token: &str, rng: &mut R) -> Vec<User> {
    if token.is_empty() {
        let mut pool = users.to_vec();
        pool.shuffle(rng);
        pool.truncate(MAX_RESULTS);
        return pool;
    }

    let needle = token.to_lowercase();
    users
        .iter()
        .filter(|u| u.username.to_lowercase().contains(&needle))
        .take(MAX_RESULTS)
        .cloned()
        .collect()
}

/// Replace the mention ending at `cursor` with `@username `.
///
/// Returns the new text and the byte index right after the inserted space.
/// Text after the cursor is kept. Without an `@` before the cursor the text
/// comes back unchanged.
pub(crate) fn insert_mention(text: &str, username: &str, cursor: usize) -> (String, usize) {
    let cursor = floor_boundary(text, cursor);
    let (before, after) = text.split_at(cursor);
    let Some(at) = before.rfind('@') else {
        return (text.to_string(), cursor);
    };

    let mut out = String::with_capacity(text.len() + username.len() + 2);
    out.push_str(&before[..at]);
    out.push('@');
    out.push_str(username);
    out.push(' ');
    let new_cursor = out.len();
    out.push_str(after);
    (out, new_cursor)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MentionToken {
    Text(String),
    /// Username without the leading `@`.
    Mention(String),
}

/// Split text into plain runs and `@username` mentions for rendering.
pub(crate) fn parse_mention_tokens(input: &str) -> Vec<MentionToken> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in MENTION.find_iter(input) {
        if m.start() > last {
            out.push(MentionToken::Text(input[last..m.start()].to_string()));
        }
        out.push(MentionToken::Mention(m.as_str()[1..].to_string()));
        last = m.end();
    }
    if last < input.len() {
        out.push(MentionToken::Text(input[last..].to_string()));
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MentionKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

impl MentionKey {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Self::ArrowUp),
            "ArrowDown" => Some(Self::ArrowDown),
            "Enter" => Some(Self::Enter),
            "Escape" => Some(Self::Escape),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum KeyOutcome {
    /// Not a mention key, or no suggestions: the caller handles it.
    Ignored,
    /// Consumed by the dropdown; suppress the default action.
    Handled,
    /// Insert this user at the cursor.
    Commit(User),
}

/// Suggestion list plus keyboard selection for one text field.
#[derive(Debug)]
pub(crate) struct MentionEngine<R> {
    rng: R,
    results: Vec<User>,
    selected: Option<usize>,
}

impl<R: Rng> MentionEngine<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            results: Vec::new(),
            selected: None,
        }
    }

    pub fn results(&self) -> &[User] {
        &self.results
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.selected = None;
    }

    /// Recompute suggestions after an edit. Selection always resets.
    pub fn on_text_changed(&mut self, users: &[User], text: &str, cursor: usize) {
        self.selected = None;
        self.results = match detect_mention(text, cursor) {
            Some((_, token)) => filter_users(users, token, &mut self.rng),
            None => Vec::new(),
        };
    }

    pub fn on_key(&mut self, key: MentionKey) -> KeyOutcome {
        let n = self.results.len();
        if n == 0 {
            return KeyOutcome::Ignored;
        }

        match key {
            MentionKey::ArrowDown => {
                self.selected = Some(self.selected.map_or(0, |i| (i + 1) % n));
                KeyOutcome::Handled
            }
            MentionKey::ArrowUp => {
                self.selected = Some(self.selected.map_or(n - 1, |i| (i + n - 1) % n));
                KeyOutcome::Handled
            }
            MentionKey::Enter => match self.take_selected() {
                Some(user) => KeyOutcome::Commit(user),
                None => KeyOutcome::Handled,
            },
            MentionKey::Escape => match self.take_selected() {
                Some(user) => KeyOutcome::Commit(user),
                None => {
                    self.clear();
                    KeyOutcome::Ignored
                }
            },
        }
    }

    fn take_selected(&mut self) -> Option<User> {
        let user = self.selected.and_then(|i| self.results.get(i)).cloned()?;
        self.clear();
        Some(user)
    }
}
