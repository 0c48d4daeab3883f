use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Canvas coordinates, in CSS pixels relative to the canvas' top-left corner.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

/// Text formatting for a whole note. Keys missing from stored data default
/// to off / left-aligned.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct NoteStyles {
    #[serde(deserialize_with = "null_as_default")]
    pub bold: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub italic: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub underline: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub alignment: Alignment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StyleChange {
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Alignment(Alignment),
}

impl NoteStyles {
    pub fn apply(&mut self, change: StyleChange) {
        match change {
            StyleChange::Bold(v) => self.bold = v,
            StyleChange::Italic(v) => self.italic = v,
            StyleChange::Underline(v) => self.underline = v,
            StyleChange::Alignment(a) => self.alignment = a,
        }
    }
}

/// A note card as stored (JSON-encoded) inside the remote store's envelope.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub(crate) struct Note {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub x: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub y: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,

    /// Last-modified stamp, `dd/mm/yyyy - HH:MM`.
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,

    /// Soft-delete flag. Never set on notes in the local working set.
    #[serde(deserialize_with = "null_as_default")]
    pub deleted: bool,

    #[serde(deserialize_with = "null_as_default")]
    pub styles: NoteStyles,
}

impl Note {
    /// Stand-in for a stored record whose body could not be read.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct UserLocation {
    pub city: String,
}

/// Directory user, read-only.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct User {
    pub username: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub location: UserLocation,
}

impl User {
    pub fn display_name(&self) -> String {
        [&self.title, &self.first_name, &self.last_name]
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
pub(crate) fn user(username: &str) -> User {
    User {
        username: username.to_string(),
        title: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        gender: String::new(),
        location: UserLocation::default(),
    }
}
