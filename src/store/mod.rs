pub mod queries;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::models::Reservation;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reservation file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("reservation file is malformed: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// One element of the persisted array. Anything that does not read as a
/// reservation is carried as raw JSON and written back in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Entry {
    Reservation(Reservation),
    Opaque(serde_json::Value),
}

/// The reservation list as stored, including entries that could not be read.
/// Mutations only ever see and touch the readable reservations.
#[derive(Debug, Default)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Reservation(r) => Some(r),
            Entry::Opaque(_) => None,
        })
    }

    pub fn reservations_mut(&mut self) -> impl Iterator<Item = &mut Reservation> {
        self.entries.iter_mut().filter_map(|e| match e {
            Entry::Reservation(r) => Some(r),
            Entry::Opaque(_) => None,
        })
    }

    pub fn push(&mut self, reservation: Reservation) {
        self.entries.push(Entry::Reservation(reservation));
    }

    /// Keeps the reservations for which `keep` holds. Unreadable entries are
    /// always kept.
    pub fn retain(&mut self, mut keep: impl FnMut(&Reservation) -> bool) {
        self.entries.retain(|e| match e {
            Entry::Reservation(r) => keep(r),
            Entry::Opaque(_) => true,
        });
    }

    pub fn unreadable(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Opaque(_)))
            .count()
    }
}

/// The whole reservation list persisted as one JSON document.
///
/// Every mutation is a load → modify → save sequence; `update` runs that
/// sequence under a process-wide lock so concurrent requests cannot lose
/// each other's writes.
pub struct ReservationStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReservationStore {
    /// Opens the store, provisioning an empty document if none exists. An
    /// existing document is not parsed here.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };
        if !store.path.exists() {
            tracing::info!(path = %store.path.display(), "reservation file missing, creating empty list");
            store.save(&[])?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        let entries = match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Vec::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "reservation file missing, creating empty list");
                self.save(&[])?;
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let document = Document { entries };
        let unreadable = document.unreadable();
        if unreadable > 0 {
            tracing::warn!(unreadable, path = %self.path.display(), "reservation file has unreadable entries, leaving them as is");
        }
        Ok(document)
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        self.write_json(&document.entries)
    }

    /// The readable reservations, in stored order.
    pub fn load(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.read_document()?.reservations().cloned().collect())
    }

    /// Overwrites the document with `reservations`.
    pub fn save(&self, reservations: &[Reservation]) -> Result<(), StoreError> {
        self.write_json(reservations)
    }

    /// The new content is written to a sibling temp file and renamed into
    /// place.
    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(value)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Runs `f` against the current document and persists the result, all
    /// inside the store's critical section. The document is only written
    /// back when `changed(&outcome)` holds.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut Document) -> T,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut document = self.read_document()?;
        let outcome = f(&mut document);
        if changed(&outcome) {
            self.write_document(&document)?;
        }
        Ok(outcome)
    }

    /// A consistent snapshot, taken under the same lock as writers.
    pub fn snapshot(&self) -> Result<Vec<Reservation>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.load()
    }
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}
