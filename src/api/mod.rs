use crate::models::{Note, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub(crate) const DEFAULT_NOTES_URL: &str = "https://challenge.surfe.com/prendnotes/notes";
pub(crate) const DEFAULT_USERS_URL: &str = "https://challenge.surfe.com/users";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Http,
    NotFound,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    pub(crate) fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        let kind = if status == reqwest::StatusCode::NOT_FOUND {
            ApiErrorKind::NotFound
        } else {
            ApiErrorKind::Http
        };

        Self {
            kind,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub notes_url: String,
    pub users_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        Self {
            notes_url: read_env_key(&["NOTES_API_URL", "notes_api_url"])
                .unwrap_or_else(|| DEFAULT_NOTES_URL.to_string()),
            users_url: read_env_key(&["USERS_API_URL", "users_api_url"])
                .unwrap_or_else(|| DEFAULT_USERS_URL.to_string()),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up the first present string key on `window.ENV`.
#[cfg(target_arch = "wasm32")]
fn read_env_key(keys: &[&str]) -> Option<String> {
    let env = web_sys::window()?.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }

    keys.iter().find_map(|key| {
        js_sys::Reflect::get(&env, &(*key).into())
            .ok()
            .and_then(|v| v.as_string())
            .filter(|s| !s.trim().is_empty())
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn read_env_key(_keys: &[&str]) -> Option<String> {
    None
}

/// Wire shape of a stored note: the note itself travels JSON-encoded in `body`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NoteEnvelope {
    pub id: i64,
    pub body: String,
}

impl NoteEnvelope {
    pub fn wrap(note: &Note) -> ApiResult<Self> {
        Ok(Self {
            id: note.id,
            body: serde_json::to_string(note).map_err(ApiError::parse)?,
        })
    }

    /// Decode the embedded note. The envelope id is authoritative.
    pub fn unwrap_note(&self) -> ApiResult<Note> {
        let mut note: Note = serde_json::from_str(&self.body).map_err(ApiError::parse)?;
        note.id = self.id;
        Ok(note)
    }
}

/// Remote note store.
pub(crate) trait NoteGateway {
    async fn list_notes(&self) -> ApiResult<Vec<NoteEnvelope>>;
    async fn get_note(&self, id: i64) -> ApiResult<NoteEnvelope>;
    async fn create_note(&self, note: &Note) -> ApiResult<()>;
    async fn update_note(&self, note: &Note) -> ApiResult<()>;
}

/// Remote user directory.
pub(crate) trait UserSource {
    async fn list_users(&self) -> ApiResult<Vec<User>>;
}

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) notes_url: String,
    pub(crate) users_url: String,
}

impl ApiClient {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            notes_url: config.notes_url.trim_end_matches('/').to_string(),
            users_url: config.users_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new())
    }

    pub(crate) fn note_url(&self, id: i64) -> String {
        format!("{}/{}", self.notes_url, id)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(url: &str, ctx: &str) -> ApiResult<T> {
        debug!(%url, "GET");
        let res = reqwest::Client::new()
            .get(url)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%url, %status, "{ctx} failed");
            Err(ApiError::http(status, body, ctx))
        }
    }

    async fn send_envelope(
        &self,
        method: reqwest::Method,
        url: String,
        note: &Note,
        ctx: &str,
    ) -> ApiResult<()> {
        let envelope = NoteEnvelope::wrap(note)?;
        debug!(%url, %method, id = note.id, "sending note");

        let res = reqwest::Client::new()
            .request(method, url.as_str())
            .json(&envelope)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%url, %status, id = note.id, "{ctx} failed");
            Err(ApiError::http(status, body, ctx))
        }
    }
}

impl NoteGateway for ApiClient {
    async fn list_notes(&self) -> ApiResult<Vec<NoteEnvelope>> {
        Self::get_json(&self.notes_url, "Failed to fetch notes").await
    }

    async fn get_note(&self, id: i64) -> ApiResult<NoteEnvelope> {
        Self::get_json(&self.note_url(id), "Failed to load note").await
    }

    async fn create_note(&self, note: &Note) -> ApiResult<()> {
        self.send_envelope(
            reqwest::Method::POST,
            self.notes_url.clone(),
            note,
            "Failed to save note",
        )
        .await
    }

    async fn update_note(&self, note: &Note) -> ApiResult<()> {
        self.send_envelope(
            reqwest::Method::PUT,
            self.note_url(note.id),
            note,
            "Failed to update note",
        )
        .await
    }
}

impl UserSource for ApiClient {
    async fn list_users(&self) -> ApiResult<Vec<User>> {
        Self::get_json(&self.users_url, "Failed to fetch users").await
    }
}
