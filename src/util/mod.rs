use chrono::{DateTime, Local, TimeZone};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Format used for a note's `date` field, e.g. `16/10/2026 - 14:05`.
const NOTE_DATE_FORMAT: &str = "%d/%m/%Y - %H:%M";

pub(crate) fn format_note_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(NOTE_DATE_FORMAT).to_string()
}

/// Human-readable last-modified stamp in local time.
pub(crate) fn note_timestamp() -> String {
    format_note_date(&Local::now())
}

/// Lock a mutex, ignoring poisoning.
///
/// All state behind these mutexes is plain data that stays consistent even
/// if a listener panicked mid-notification.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Browser text controls report caret positions in UTF-16 code units.
pub(crate) fn utf16_to_byte_idx(s: &str, pos_utf16: u32) -> usize {
    if pos_utf16 == 0 {
        return 0;
    }
    let mut acc: u32 = 0;
    for (i, ch) in s.char_indices() {
        let w = ch.len_utf16() as u32;
        if acc + w > pos_utf16 {
            return i;
        }
        acc += w;
        if acc == pos_utf16 {
            return i + ch.len_utf8();
        }
    }
    s.len()
}

pub(crate) fn byte_idx_to_utf16(s: &str, byte_idx: usize) -> u32 {
    let mut idx = byte_idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    s[..idx].encode_utf16().count() as u32
}
