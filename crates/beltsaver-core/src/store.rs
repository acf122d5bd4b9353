//! Persistence of completed diagnoses.
//!
//! Callers receive a [`DiagnosisStore`] explicitly; nothing in this crate
//! reaches for a global client. Two backends are provided:
//! - [`MemoryDiagnosisStore`]: process-local, for tests and one-shot runs
//! - [`FileDiagnosisStore`]: one JSON file per owner under a data directory

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DiagnosisResult, DiagnosticInput, StoreError};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Opaque identifier of the user who owns a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagnosisId(pub uuid::Uuid);

impl DiagnosisId {
    pub fn new() -> Self {
        DiagnosisId(uuid::Uuid::new_v4())
    }

    /// First 8 characters, enough to pick a record out of a history listing.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for DiagnosisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for DiagnosisId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(DiagnosisId)
            .map_err(|_| StoreError::InvalidId(s.to_string()))
    }
}

impl std::fmt::Display for DiagnosisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted run: the answers, the diagnosis they produced, and the
/// identity the store assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredDiagnosis {
    pub id: DiagnosisId,
    pub owner: OwnerId,
    pub input: DiagnosticInput,
    pub result: DiagnosisResult,
    pub created_at: DateTime<Utc>,
}

/// Diagnosis history, scoped per owner.
///
/// Guarantees:
/// - `insert` assigns a fresh id and the current UTC time.
/// - `list_recent` only returns the owner's records, newest first.
/// - `delete` only removes a record the owner created.
#[async_trait]
pub trait DiagnosisStore: Send + Sync {
    async fn insert(
        &self,
        owner: &OwnerId,
        input: DiagnosticInput,
        result: DiagnosisResult,
    ) -> StoreResult<StoredDiagnosis>;

    async fn list_recent(&self, owner: &OwnerId, limit: usize) -> StoreResult<Vec<StoredDiagnosis>>;

    /// Returns `NotFound` for unknown ids and `NotOwner` when the record
    /// belongs to someone else.
    async fn delete(&self, owner: &OwnerId, id: &DiagnosisId) -> StoreResult<()>;
}

fn new_record(owner: &OwnerId, input: DiagnosticInput, result: DiagnosisResult) -> StoredDiagnosis {
    StoredDiagnosis {
        id: DiagnosisId::new(),
        owner: owner.clone(),
        input,
        result,
        created_at: Utc::now(),
    }
}

fn newest_first(records: &mut [StoredDiagnosis]) {
    // Stable sort: records inserted within the same tick keep reverse-insertion order
    records.reverse();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// ---------------------------------------------------------------------------
// MemoryDiagnosisStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryDiagnosisStore {
    records: Mutex<Vec<StoredDiagnosis>>,
}

impl MemoryDiagnosisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DiagnosisStore for MemoryDiagnosisStore {
    async fn insert(
        &self,
        owner: &OwnerId,
        input: DiagnosticInput,
        result: DiagnosisResult,
    ) -> StoreResult<StoredDiagnosis> {
        let record = new_record(owner, input, result);
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_recent(&self, owner: &OwnerId, limit: usize) -> StoreResult<Vec<StoredDiagnosis>> {
        let mut mine: Vec<StoredDiagnosis> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.owner == owner)
            .cloned()
            .collect();
        newest_first(&mut mine);
        mine.truncate(limit);
        Ok(mine)
    }

    async fn delete(&self, owner: &OwnerId, id: &DiagnosisId) -> StoreResult<()> {
        let mut records = self.records.lock().unwrap();
        let idx = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        if &records[idx].owner != owner {
            return Err(StoreError::NotOwner { id: id.to_string() });
        }
        records.remove(idx);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileDiagnosisStore
// ---------------------------------------------------------------------------

/// Stores each owner's history as `<root>/<owner>.json`.
///
/// Writes go to a uniquely named temp file that is renamed into place, so a
/// crash mid-write leaves the previous history intact.
///
/// Single-process only. The read-modify-write of an owner file is serialised
/// by an in-process lock, so two processes saving for the same owner at once
/// can lose one of the updates.
#[derive(Debug)]
pub struct FileDiagnosisStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FileDiagnosisStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store rooted at `~/.beltsaver/diagnoses/`.
    pub fn default_location() -> Self {
        Self::new(crate::data_dir().join("diagnoses"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_path(&self, owner: &OwnerId) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(owner)))
    }

    fn read_owner(&self, owner: &OwnerId) -> StoreResult<Vec<StoredDiagnosis>> {
        let path = self.owner_path(owner);
        if !path.exists() {
            return Ok(vec![]);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_owner(&self, owner: &OwnerId, records: &[StoredDiagnosis]) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;
        let stem = file_stem(owner);
        let tmp = self
            .root
            .join(format!(".{}.{}.json.tmp", stem, uuid::Uuid::new_v4().simple()));
        let path = self.owner_path(owner);
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Find which owner file holds `id`, if any.
    fn find_owner_of(&self, id: &DiagnosisId) -> StoreResult<Option<OwnerId>> {
        if !self.root.exists() {
            return Ok(None);
        }
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let raw = fs::read_to_string(&path)?;
            let records: Vec<StoredDiagnosis> = match serde_json::from_str(&raw) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable history file");
                    continue;
                }
            };
            if let Some(r) = records.iter().find(|r| &r.id == id) {
                return Ok(Some(r.owner.clone()));
            }
        }
        Ok(None)
    }
}

/// Map an owner id onto a file stem that cannot escape the store root.
fn file_stem(owner: &OwnerId) -> String {
    let stem: String = owner
        .0
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

#[async_trait]
impl DiagnosisStore for FileDiagnosisStore {
    async fn insert(
        &self,
        owner: &OwnerId,
        input: DiagnosticInput,
        result: DiagnosisResult,
    ) -> StoreResult<StoredDiagnosis> {
        let _guard = self.lock.lock().unwrap();
        let mut records = self.read_owner(owner)?;
        let record = new_record(owner, input, result);
        records.push(record.clone());
        self.write_owner(owner, &records)?;
        tracing::debug!(id = %record.id, owner = %owner, "diagnosis saved");
        Ok(record)
    }

    async fn list_recent(&self, owner: &OwnerId, limit: usize) -> StoreResult<Vec<StoredDiagnosis>> {
        let _guard = self.lock.lock().unwrap();
        // Sanitised stems can collide, so filter on the stored owner too
        let mut mine: Vec<StoredDiagnosis> = self
            .read_owner(owner)?
            .into_iter()
            .filter(|r| &r.owner == owner)
            .collect();
        newest_first(&mut mine);
        mine.truncate(limit);
        Ok(mine)
    }

    async fn delete(&self, owner: &OwnerId, id: &DiagnosisId) -> StoreResult<()> {
        let _guard = self.lock.lock().unwrap();
        let mut records = self.read_owner(owner)?;
        match records.iter().position(|r| &r.id == id && &r.owner == owner) {
            Some(idx) => {
                records.remove(idx);
                self.write_owner(owner, &records)?;
                tracing::debug!(id = %id, owner = %owner, "diagnosis deleted");
                Ok(())
            }
            None => match self.find_owner_of(id)? {
                Some(_) => Err(StoreError::NotOwner { id: id.to_string() }),
                None => Err(StoreError::NotFound { id: id.to_string() }),
            },
        }
    }
}
