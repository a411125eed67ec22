//! Document persistence and the active selection.
//!
//! [`DocumentStore`] is the sole owner of the document collection and of the
//! active document id. Every mutation writes the full snapshot through to the
//! [`Storage`] backend before returning. Storage failures never reach the
//! caller of a mutation: the in-memory collection stays authoritative and the
//! store reports [`StorageStatus::Degraded`] until the next successful write.

mod export;
mod import;
mod storage;
mod types;

pub use export::{DirectoryExport, ExportSink, ExportedFile, suggested_file_name};
pub use import::{FileSource, ImportState, ImportedText, PendingImport, TextSource, decode_text};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use types::Document;

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::StoreError;

/// Storage key holding the serialized document collection.
pub const FILES_KEY: &str = "markdown-files";
/// Storage key holding the active document id (empty string for none).
pub const ACTIVE_KEY: &str = "active-file-id";
/// Content given to newly created documents.
pub const PLACEHOLDER_CONTENT: &str = "# New document";

const DEFAULT_NAME_PREFIX: &str = "Untitled-";

/// Notification sent to subscribers after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The active document changed identity or content.
    ActiveContentChanged { id: String, content: String },
    /// No document is active any more.
    ActiveCleared,
    /// Collection membership or metadata changed without touching the
    /// active document's content.
    DocumentsChanged,
}

/// Health of the persistence backend for this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageStatus {
    Healthy,
    /// The last read or write failed; edits live only in memory.
    Degraded(String),
}

pub struct DocumentStore<S: Storage> {
    storage: S,
    documents: Vec<Document>,
    active_id: Option<String>,
    status: StorageStatus,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl<S: Storage> DocumentStore<S> {
    /// Restore the persisted snapshot from `storage`.
    ///
    /// Unreadable or unparsable state counts as no saved state. An empty
    /// collection gets one default document, which is selected and persisted.
    pub fn load(storage: S) -> Self {
        let mut store = Self {
            storage,
            documents: Vec::new(),
            active_id: None,
            status: StorageStatus::Healthy,
            subscribers: Vec::new(),
        };

        store.documents = store.read_documents();
        let saved_active = store.read_active();

        if store.documents.is_empty() {
            if matches!(store.status, StorageStatus::Degraded(_)) {
                // Saved state exists but is unreadable; leave it until the next edit.
                let name = store.next_default_name();
                store.insert_active(name, PLACEHOLDER_CONTENT.to_string());
            } else {
                store.create();
            }
            return store;
        }

        store.active_id = match saved_active {
            Some(id) if store.get(&id).is_some() => Some(id),
            Some(id) => {
                tracing::warn!(%id, "saved active document no longer exists, selecting first");
                store.first_id()
            }
            None => store.first_id(),
        };
        tracing::debug!(
            documents = store.documents.len(),
            active = ?store.active_id,
            "loaded document store"
        );
        store
    }

    fn read_documents(&mut self) -> Vec<Document> {
        let raw = match self.storage.get(FILES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read saved documents");
                self.status = StorageStatus::Degraded(err.to_string());
                return Vec::new();
            }
        };
        let parsed: Vec<Document> = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(error = %err, "saved documents are corrupt, starting fresh");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        parsed
            .into_iter()
            .filter(|doc| {
                let fresh = seen.insert(doc.id().to_string());
                if !fresh {
                    tracing::warn!(id = doc.id(), "dropping duplicate document id");
                }
                fresh
            })
            .collect()
    }

    fn read_active(&mut self) -> Option<String> {
        match self.storage.get(ACTIVE_KEY) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "could not read saved active document");
                self.status = StorageStatus::Degraded(err.to_string());
                None
            }
        }
    }

    /// Write the full snapshot to storage.
    ///
    /// # Errors
    /// Returns [`StoreError::StorageUnavailable`] if either entry could not be
    /// written. The store is marked degraded until a later write succeeds.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let result = self.write_snapshot();
        match &result {
            Ok(()) => {
                if let StorageStatus::Degraded(_) = self.status {
                    tracing::info!("storage recovered, snapshot resynchronized");
                }
                self.status = StorageStatus::Healthy;
            }
            Err(err) => self.status = StorageStatus::Degraded(err.to_string()),
        }
        result
    }

    fn write_snapshot(&mut self) -> Result<(), StoreError> {
        let files = serde_json::to_string(&self.documents).map_err(crate::error::StorageError::from)?;
        self.storage.set(FILES_KEY, &files)?;
        self.storage
            .set(ACTIVE_KEY, self.active_id.as_deref().unwrap_or_default())?;
        Ok(())
    }

    // Mutations keep going when storage is down; the session stays editable.
    fn persist_or_warn(&mut self) {
        if let Err(err) = self.persist() {
            tracing::warn!(error = %err, "snapshot not persisted, continuing in memory");
        }
    }

    /// Receive a [`StoreEvent`] after every mutation.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: &StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn emit_active(&mut self) {
        let event = self.active().map_or(StoreEvent::ActiveCleared, |doc| {
            StoreEvent::ActiveContentChanged {
                id: doc.id().to_string(),
                content: doc.content().to_string(),
            }
        });
        self.emit(&event);
    }

    /// Append a blank document, select it, and return it.
    pub fn create(&mut self) -> Document {
        let name = self.next_default_name();
        self.push_active(name, PLACEHOLDER_CONTENT.to_string())
    }

    /// Like [`create`](Self::create) with caller-supplied name and content.
    pub fn import_text(&mut self, name: impl Into<String>, content: impl Into<String>) -> Document {
        self.push_active(name.into(), content.into())
    }

    /// Wait for `pending` and commit it as a new active document.
    ///
    /// # Errors
    /// Returns [`StoreError::ReadError`] if the source could not be read or
    /// decoded; no document is created in that case.
    pub fn import_pending(&mut self, pending: PendingImport) -> Result<Document, StoreError> {
        let imported = pending.wait()?;
        Ok(self.import_text(imported.name, imported.content))
    }

    fn push_active(&mut self, name: String, content: String) -> Document {
        let doc = self.insert_active(name, content);
        self.persist_or_warn();
        self.emit_active();
        doc
    }

    fn insert_active(&mut self, name: String, content: String) -> Document {
        let now = types::now();
        let id = self.next_id(now.timestamp_millis());
        let doc = Document::new(id.clone(), name, content, now);
        self.documents.push(doc.clone());
        self.active_id = Some(id);
        doc
    }

    /// Select `id`, or clear the selection with `None`.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidReference`] if `id` is not in the
    /// collection; the selection is left unchanged.
    pub fn set_active(&mut self, id: Option<&str>) -> Result<(), StoreError> {
        if let Some(id) = id {
            if self.get(id).is_none() {
                return Err(StoreError::InvalidReference(id.to_string()));
            }
        }
        self.active_id = id.map(ToString::to_string);
        self.persist_or_warn();
        self.emit_active();
        Ok(())
    }

    /// Rename `id`. Returns false (and does nothing) if it does not exist.
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> bool {
        let Some(doc) = self.get_mut(id) else {
            return false;
        };
        doc.set_name(name.into(), types::now());
        self.persist_or_warn();
        self.emit(&StoreEvent::DocumentsChanged);
        true
    }

    /// Replace the content of `id`. Returns false (and does nothing) if it
    /// does not exist.
    pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> bool {
        let Some(doc) = self.get_mut(id) else {
            return false;
        };
        doc.set_content(content.into(), types::now());
        self.persist_or_warn();
        if self.active_id.as_deref() == Some(id) {
            self.emit_active();
        } else {
            self.emit(&StoreEvent::DocumentsChanged);
        }
        true
    }

    /// Remove `id`. If it was active, the selection moves to the document now
    /// at the same index, else the new last document, else none.
    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.documents.remove(index);

        let was_active = self.active_id.as_deref() == Some(id);
        if was_active {
            let next = index.min(self.documents.len().saturating_sub(1));
            self.active_id = self.documents.get(next).map(|doc| doc.id().to_string());
            tracing::debug!(removed = id, active = ?self.active_id, "repaired active selection");
        }
        self.persist_or_warn();
        if was_active {
            self.emit_active();
        } else {
            self.emit(&StoreEvent::DocumentsChanged);
        }
        true
    }

    /// Raw text and suggested file name of `id` for the save collaborator.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if `id` is not in the collection.
    pub fn export_text(&self, id: &str) -> Result<ExportedFile, StoreError> {
        self.get(id)
            .map(|doc| ExportedFile::new(doc.name(), doc.content()))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id() == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|doc| doc.id() == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|doc| doc.id() == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The active document, if the selection resolves.
    pub fn active(&self) -> Option<&Document> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub const fn storage_status(&self) -> &StorageStatus {
        &self.status
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn first_id(&self) -> Option<String> {
        self.documents.first().map(|doc| doc.id().to_string())
    }

    // Ids are creation instants in epoch milliseconds, bumped past collisions.
    fn next_id(&self, millis: i64) -> String {
        let mut candidate = millis;
        loop {
            let id = candidate.to_string();
            if self.get(&id).is_none() {
                return id;
            }
            candidate += 1;
        }
    }

    fn next_default_name(&self) -> String {
        let mut n = self.documents.len() + 1;
        loop {
            let name = format!("{DEFAULT_NAME_PREFIX}{n}");
            if !self.documents.iter().any(|doc| doc.name() == name) {
                return name;
            }
            n += 1;
        }
    }
}
