//! Whole-document persistence for sessions, history and bank-level notes.
//!
//! Each collection is one logical document: callers load it, mutate it in
//! memory and save it back in full. `FileStore` keeps one base64-wrapped JSON
//! file per collection under the data directory; `MemoryStore` is the
//! in-process double used by tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, instrument};

use crate::domain::{HistoryRecord, NotesDoc, SessionMap};
use crate::error::StoreError;

const SESSIONS_FILE: &str = "sessions.b64";
const HISTORY_FILE: &str = "history.b64";
const NOTES_FILE: &str = "notes.b64";

/// Load/save contract for the three persisted collections.
///
/// Loading a collection that was never saved yields its empty default.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load_sessions(&self) -> Result<SessionMap, StoreError>;
    async fn save_sessions(&self, sessions: &SessionMap) -> Result<(), StoreError>;

    /// History is kept most-recent-first.
    async fn load_history(&self) -> Result<Vec<HistoryRecord>, StoreError>;
    async fn save_history(&self, history: &[HistoryRecord]) -> Result<(), StoreError>;

    async fn load_notes(&self) -> Result<NotesDoc, StoreError>;
    async fn save_notes(&self, notes: &NotesDoc) -> Result<(), StoreError>;
}

/// File-backed store: `<data_dir>/{sessions,history,notes}.b64`.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create the data directory and seed empty documents that do not exist yet.
    #[instrument(level = "info", skip_all, fields(dir = %dir.as_ref().display()))]
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        let store = Self { dir };

        if !store.path(SESSIONS_FILE).exists() {
            store.save_sessions(&SessionMap::new()).await?;
        }
        if !store.path(HISTORY_FILE).exists() {
            store.save_history(&[]).await?;
        }
        if !store.path(NOTES_FILE).exists() {
            store.save_notes(&NotesDoc::new()).await?;
        }
        info!(target: "quizdesk_backend", dir = %store.dir.display(), "Data directory ready");
        Ok(store)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    async fn read_doc<T>(&self, file: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(file);
        match tokio::fs::read(&path).await {
            Ok(bytes) => decode_doc(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_doc<T>(&self, file: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path(file);
        let tmp = path.with_extension("b64.tmp");
        let encoded = encode_doc(value)?;
        tokio::fs::write(&tmp, &encoded).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(target: "quizdesk_backend", path = %path.display(), bytes = encoded.len(), "Document saved");
        Ok(())
    }
}

/// Base64 text -> JSON document. Empty content means "no document yet".
pub fn decode_doc<T>(bytes: &[u8]) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    let trimmed = bytes.trim_ascii();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    let raw = STANDARD.decode(trimmed)?;
    Ok(serde_json::from_slice(&raw)?)
}

/// JSON document -> base64 text.
pub fn encode_doc<T>(value: &T) -> Result<Vec<u8>, StoreError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_vec_pretty(value)?;
    Ok(STANDARD.encode(raw).into_bytes())
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load_sessions(&self) -> Result<SessionMap, StoreError> {
        self.read_doc(SESSIONS_FILE).await
    }

    async fn save_sessions(&self, sessions: &SessionMap) -> Result<(), StoreError> {
        self.write_doc(SESSIONS_FILE, sessions).await
    }

    async fn load_history(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        self.read_doc(HISTORY_FILE).await
    }

    async fn save_history(&self, history: &[HistoryRecord]) -> Result<(), StoreError> {
        self.write_doc(HISTORY_FILE, history).await
    }

    async fn load_notes(&self) -> Result<NotesDoc, StoreError> {
        self.read_doc(NOTES_FILE).await
    }

    async fn save_notes(&self, notes: &NotesDoc) -> Result<(), StoreError> {
        self.write_doc(NOTES_FILE, notes).await
    }
}

/// In-memory store used by the engine and router tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: tokio::sync::Mutex<SessionMap>,
    history: tokio::sync::Mutex<Vec<HistoryRecord>>,
    notes: tokio::sync::Mutex<NotesDoc>,
}

#[cfg(test)]
impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load_sessions(&self) -> Result<SessionMap, StoreError> {
        Ok(self.sessions.lock().await.clone())
    }

    async fn save_sessions(&self, sessions: &SessionMap) -> Result<(), StoreError> {
        *self.sessions.lock().await = sessions.clone();
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self.history.lock().await.clone())
    }

    async fn save_history(&self, history: &[HistoryRecord]) -> Result<(), StoreError> {
        *self.history.lock().await = history.to_vec();
        Ok(())
    }

    async fn load_notes(&self) -> Result<NotesDoc, StoreError> {
        Ok(self.notes.lock().await.clone())
    }

    async fn save_notes(&self, notes: &NotesDoc) -> Result<(), StoreError> {
        *self.notes.lock().await = notes.clone();
        Ok(())
    }
}
