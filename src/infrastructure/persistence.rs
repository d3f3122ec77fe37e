use crate::domain::{EyeColor, HairColor, Record, SkinColor};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type RecordId = u64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("storage file is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

/// A submitted report as persisted. Optional columns hold `None` when the
/// form field was left blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub submitted_by: String,
    pub full_name: String,
    pub national_id: String,
    pub photo_url: Option<String>,
    pub mother_name: String,
    pub father_name: Option<String>,
    pub younger_sibling: Option<String>,
    pub older_sibling: Option<String>,
    pub phone: String,
    pub birth_city: String,
    pub birth_state: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub spouse: Option<String>,
    pub children: Vec<String>,
    pub skin_color: SkinColor,
    pub hair_color: HairColor,
    pub eye_color: EyeColor,
    pub height: String,
    pub weight: String,
    pub notes: Option<String>,
    pub created_on: NaiveDate,
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl StoredRecord {
    /// Flattens a form record into its stored shape. Blank child slots are
    /// dropped.
    pub fn from_record(id: RecordId, submitted_by: &str, record: &Record, created_on: NaiveDate) -> Self {
        Self {
            id,
            submitted_by: submitted_by.to_string(),
            full_name: record.full_name.trim().to_string(),
            national_id: record.national_id.clone(),
            photo_url: record.photo.as_ref().map(|p| p.preview().to_string()),
            mother_name: record.mother_name.trim().to_string(),
            father_name: optional(&record.father_name),
            younger_sibling: optional(&record.younger_sibling),
            older_sibling: optional(&record.older_sibling),
            phone: record.phone.clone(),
            birth_city: record.birth_city.trim().to_string(),
            birth_state: record.birth_state.trim().to_string(),
            street: record.street.trim().to_string(),
            neighborhood: record.neighborhood.trim().to_string(),
            city: record.city.trim().to_string(),
            state: record.state.trim().to_string(),
            spouse: optional(&record.spouse),
            children: record
                .children()
                .iter()
                .map(String::as_str)
                .filter_map(optional)
                .collect(),
            skin_color: record.skin_color,
            hair_color: record.hair_color,
            eye_color: record.eye_color,
            height: record.height.trim().to_string(),
            weight: record.weight.trim().to_string(),
            notes: optional(&record.notes),
            created_on,
        }
    }
}

/// The latest search outcome for a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSearchResult {
    pub record_id: RecordId,
    pub found: bool,
    pub payload: serde_json::Value,
    pub queried_on: NaiveDate,
}

/// Storage used by the record gateway.
pub trait RecordStore {
    /// Persists a new record, assigning its id through `build`.
    fn insert(&self, build: &mut dyn FnMut(RecordId) -> StoredRecord) -> Result<StoredRecord, StoreError>;

    fn all(&self) -> Result<Vec<StoredRecord>, StoreError>;

    fn get(&self, id: RecordId) -> Result<Option<StoredRecord>, StoreError>;

    /// Replaces any earlier result for the same record.
    fn put_search_result(&self, result: StoredSearchResult) -> Result<(), StoreError>;

    fn search_result(&self, record_id: RecordId) -> Result<Option<StoredSearchResult>, StoreError>;

    /// Cheap readability check used by the health report.
    fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: RecordId,
    records: Vec<StoredRecord>,
    search_results: Vec<StoredSearchResult>,
}

/// Keeps every record in one pretty-printed JSON file, read and rewritten on
/// each call.
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    path: PathBuf,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreFile, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StoreFile {
                next_id: 1,
                ..StoreFile::default()
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, data: &StoreFile) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl RecordStore for JsonRecordStore {
    fn insert(&self, build: &mut dyn FnMut(RecordId) -> StoredRecord) -> Result<StoredRecord, StoreError> {
        let mut data = self.read()?;
        let id = data.next_id.max(1);
        let record = build(id);
        data.next_id = id + 1;
        data.records.push(record.clone());
        self.write(&data)?;
        Ok(record)
    }

    fn all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.read()?.records)
    }

    fn get(&self, id: RecordId) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self.read()?.records.into_iter().find(|r| r.id == id))
    }

    fn put_search_result(&self, result: StoredSearchResult) -> Result<(), StoreError> {
        let mut data = self.read()?;
        data.search_results.retain(|r| r.record_id != result.record_id);
        data.search_results.push(result);
        self.write(&data)
    }

    fn search_result(&self, record_id: RecordId) -> Result<Option<StoredSearchResult>, StoreError> {
        Ok(self
            .read()?
            .search_results
            .into_iter()
            .find(|r| r.record_id == record_id))
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}
