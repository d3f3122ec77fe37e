//! Record submission and retrieval, with the session checks the operator
//! screens and the CLI share.

use super::credentials::verify_secret;
use super::persistence::{RecordId, RecordStore, StoreError, StoredRecord, StoredSearchResult};
use crate::domain::{Choice, Field, FormValidator, Record, SearchResult};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("authentication required")]
    AuthRequired,

    #[error("record is incomplete: {}", join_fields(.fields))]
    ValidationFailed { fields: Vec<Field> },

    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("wrong secret for download")]
    Unauthorized,

    #[error("storage error: {0}")]
    Storage(String),
}

fn join_fields(fields: &[Field]) -> String {
    fields.iter().map(|f| f.code()).collect::<Vec<_>>().join(", ")
}

impl From<StoreError> for GatewayError {
    fn from(e: StoreError) -> Self {
        GatewayError::Storage(e.to_string())
    }
}

/// Who is calling the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identifier: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identifier.is_some()
    }

    fn require(&self) -> Result<&str, GatewayError> {
        self.identifier().ok_or(GatewayError::AuthRequired)
    }
}

/// Where the gated download can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetLocator {
    pub path: PathBuf,
    pub file_name: String,
}

impl AssetLocator {
    const PLACEHOLDER: &'static str = "This file stands in for the sigma-search Android package.\n";

    /// Writes a placeholder file when nothing is at the asset path yet.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        if !self.path.exists() {
            fs::write(&self.path, Self::PLACEHOLDER)?;
        }
        Ok(())
    }
}

/// Secret-protected download.
#[derive(Debug, Clone)]
pub struct AssetGate {
    secret_hash: Option<String>,
    locator: AssetLocator,
}

impl AssetGate {
    /// `secret_hash` of `None` refuses every request.
    pub fn new(secret_hash: Option<String>, locator: AssetLocator) -> Self {
        Self { secret_hash, locator }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Functional,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub last_updated: DateTime<Utc>,
    pub components: BTreeMap<String, ComponentStatus>,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: RecordId,
    full_name: &'a str,
    national_id: &'a str,
    mother_name: &'a str,
    father_name: &'a str,
    phone: &'a str,
    birth_place: String,
    address: String,
    spouse: &'a str,
    children: String,
    skin_color: &'a str,
    hair_color: &'a str,
    eye_color: &'a str,
    height: &'a str,
    weight: &'a str,
    notes: &'a str,
    created_on: String,
}

impl<'a> From<&'a StoredRecord> for CsvRow<'a> {
    fn from(r: &'a StoredRecord) -> Self {
        Self {
            id: r.id,
            full_name: &r.full_name,
            national_id: &r.national_id,
            mother_name: &r.mother_name,
            father_name: r.father_name.as_deref().unwrap_or(""),
            phone: &r.phone,
            birth_place: format!("{}/{}", r.birth_city, r.birth_state),
            address: format!("{} - {}, {}/{}", r.street, r.neighborhood, r.city, r.state),
            spouse: r.spouse.as_deref().unwrap_or(""),
            children: r.children.join("; "),
            skin_color: r.skin_color.label(),
            hair_color: r.hair_color.label(),
            eye_color: r.eye_color.label(),
            height: &r.height,
            weight: &r.weight,
            notes: r.notes.as_deref().unwrap_or(""),
            created_on: r.created_on.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Front door to the record store.
pub struct RecordGateway {
    store: Box<dyn RecordStore>,
    asset: AssetGate,
}

impl RecordGateway {
    pub fn new(store: Box<dyn RecordStore>, asset: AssetGate) -> Self {
        Self { store, asset }
    }

    /// Stores a completed record and returns its id.
    pub fn submit(&self, session: &Session, record: &Record) -> Result<RecordId, GatewayError> {
        let user = session.require()?;
        let check = FormValidator::check(record);
        if !check.is_valid() {
            return Err(GatewayError::ValidationFailed {
                fields: check.error_fields(),
            });
        }

        let today = Local::now().date_naive();
        let stored = self
            .store
            .insert(&mut |id| StoredRecord::from_record(id, user, record, today))?;
        tracing::info!(id = stored.id, user, "record stored");
        Ok(stored.id)
    }

    /// Every stored record, ordered by name.
    pub fn list(&self, session: &Session) -> Result<Vec<StoredRecord>, GatewayError> {
        session.require()?;
        let mut records = self.store.all()?;
        records.sort_by(|a, b| {
            a.full_name
                .to_lowercase()
                .cmp(&b.full_name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        Ok(records)
    }

    pub fn fetch(&self, session: &Session, id: RecordId) -> Result<StoredRecord, GatewayError> {
        session.require()?;
        self.store.get(id)?.ok_or(GatewayError::NotFound(id))
    }

    /// Links a stored record to the outcome of its latest search.
    pub fn record_search_result(
        &self,
        session: &Session,
        id: RecordId,
        result: &SearchResult,
    ) -> Result<(), GatewayError> {
        session.require()?;
        if self.store.get(id)?.is_none() {
            return Err(GatewayError::NotFound(id));
        }
        let payload =
            serde_json::to_value(result).map_err(|e| GatewayError::Storage(e.to_string()))?;
        self.store.put_search_result(StoredSearchResult {
            record_id: id,
            found: result.found,
            payload,
            queried_on: Local::now().date_naive(),
        })?;
        tracing::info!(id, found = result.found, "search result stored");
        Ok(())
    }

    pub fn latest_search_result(
        &self,
        session: &Session,
        id: RecordId,
    ) -> Result<Option<StoredSearchResult>, GatewayError> {
        session.require()?;
        Ok(self.store.search_result(id)?)
    }

    /// Hands out the download location when `secret` matches.
    pub fn request_asset(&self, secret: &str) -> Result<AssetLocator, GatewayError> {
        match &self.asset.secret_hash {
            Some(hash) if verify_secret(secret, hash) => Ok(self.asset.locator.clone()),
            _ => {
                tracing::warn!("asset download refused");
                Err(GatewayError::Unauthorized)
            }
        }
    }

    pub fn health(&self) -> HealthReport {
        let database = match self.store.ping() {
            Ok(()) => ComponentStatus::Functional,
            Err(e) => {
                tracing::warn!(error = %e, "store unreadable");
                ComponentStatus::Degraded
            }
        };
        let components = BTreeMap::from([
            ("authentication".to_string(), ComponentStatus::Functional),
            ("database".to_string(), database),
            ("searchEngine".to_string(), ComponentStatus::Functional),
        ]);
        HealthReport {
            status: "online".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            last_updated: Utc::now(),
            components,
        }
    }

    /// Writes every stored record to a CSV file, returning the row count.
    pub fn export_csv(&self, session: &Session, path: &Path) -> Result<usize, GatewayError> {
        let records = self.list(session)?;
        let mut writer =
            csv::Writer::from_path(path).map_err(|e| GatewayError::Storage(e.to_string()))?;
        for record in &records {
            writer
                .serialize(CsvRow::from(record))
                .map_err(|e| GatewayError::Storage(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| GatewayError::Storage(e.to_string()))?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EyeColor, FixedFoundSource, HairColor, SearchBackend, SimulatedSearch, SkinColor};
    use crate::infrastructure::{hash_secret, JsonRecordStore};
    use chrono::NaiveDate;
    use tempfile::{tempdir, TempDir};

    fn gateway(dir: &TempDir) -> RecordGateway {
        let store = JsonRecordStore::new(dir.path().join("records.json"));
        let locator = AssetLocator {
            path: dir.path().join("app.apk"),
            file_name: "sigma-search.apk".to_string(),
        };
        let gate = AssetGate::new(Some(hash_secret("AVANTE").unwrap()), locator);
        RecordGateway::new(Box::new(store), gate)
    }

    fn complete(name: &str) -> Record {
        let mut record = Record::default();
        record.full_name = name.into();
        record.mother_name = "Maria".into();
        record.skin_color = SkinColor::Negra;
        record.hair_color = HairColor::Preto;
        record.eye_color = EyeColor::Preto;
        record.set_children(vec!["Ana".into(), "Bia".into()]);
        record
    }

    #[test]
    fn test_anonymous_session_is_rejected() {
        let dir = tempdir().unwrap();
        let gw = gateway(&dir);
        let anon = Session::anonymous();
        assert!(matches!(gw.submit(&anon, &complete("X")), Err(GatewayError::AuthRequired)));
        assert!(matches!(gw.list(&anon), Err(GatewayError::AuthRequired)));
        assert!(matches!(gw.fetch(&anon, 1), Err(GatewayError::AuthRequired)));
    }

    #[test]
    fn test_submit_rejects_incomplete_record() {
        let dir = tempdir().unwrap();
        let gw = gateway(&dir);
        let session = Session::authenticated("Sigma");
        let mut record = complete("X");
        record.mother_name.clear();
        match gw.submit(&session, &record) {
            Err(GatewayError::ValidationFailed { fields }) => {
                assert_eq!(fields, vec![Field::MotherName]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_submit_list_fetch() {
        let dir = tempdir().unwrap();
        let gw = gateway(&dir);
        let session = Session::authenticated("Sigma");

        let zeca = gw.submit(&session, &complete("Zeca")).unwrap();
        let ana = gw.submit(&session, &complete("ana")).unwrap();

        let names: Vec<String> = gw.list(&session).unwrap().into_iter().map(|r| r.full_name).collect();
        assert_eq!(names, vec!["ana".to_string(), "Zeca".to_string()]);

        let fetched = gw.fetch(&session, zeca).unwrap();
        assert_eq!(fetched.full_name, "Zeca");
        assert_eq!(fetched.submitted_by, "Sigma");
        assert_ne!(zeca, ana);
        assert!(matches!(gw.fetch(&session, 99), Err(GatewayError::NotFound(99))));
    }

    #[test]
    fn test_search_result_link() {
        let dir = tempdir().unwrap();
        let gw = gateway(&dir);
        let session = Session::authenticated("Sigma");
        let record = complete("Rui");
        let id = gw.submit(&session, &record).unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let result = SimulatedSearch::new(FixedFoundSource(true)).search(&record, today);
        gw.record_search_result(&session, id, &result).unwrap();

        let stored = gw.latest_search_result(&session, id).unwrap().unwrap();
        assert!(stored.found);
        assert_eq!(stored.payload["subject"]["name"], "Rui");
        assert!(matches!(
            gw.record_search_result(&session, 42, &result),
            Err(GatewayError::NotFound(42))
        ));
    }

    #[test]
    fn test_request_asset() {
        let dir = tempdir().unwrap();
        let gw = gateway(&dir);
        let locator = gw.request_asset("AVANTE").unwrap();
        assert_eq!(locator.file_name, "sigma-search.apk");
        locator.ensure_exists().unwrap();
        assert!(locator.path.exists());
        assert!(matches!(gw.request_asset("nope"), Err(GatewayError::Unauthorized)));
    }

    #[test]
    fn test_disabled_asset_gate() {
        let dir = tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path().join("records.json"));
        let locator = AssetLocator {
            path: dir.path().join("app.apk"),
            file_name: "a.apk".to_string(),
        };
        let gw = RecordGateway::new(Box::new(store), AssetGate::new(None, locator));
        assert!(matches!(gw.request_asset(""), Err(GatewayError::Unauthorized)));
    }

    #[test]
    fn test_health_reports_degraded_store() {
        let dir = tempdir().unwrap();
        let gw = gateway(&dir);
        let report = gw.health();
        assert_eq!(report.status, "online");
        assert_eq!(report.components["database"], ComponentStatus::Functional);

        fs::write(dir.path().join("records.json"), "garbage").unwrap();
        let report = gw.health();
        assert_eq!(report.components["database"], ComponentStatus::Degraded);
        assert_eq!(report.components["searchEngine"], ComponentStatus::Functional);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("lastUpdated").is_some());
        assert_eq!(json["components"]["database"], "degraded");
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let gw = gateway(&dir);
        let session = Session::authenticated("Sigma");
        gw.submit(&session, &complete("Bia")).unwrap();
        gw.submit(&session, &complete("Ana")).unwrap();

        let out = dir.path().join("export.csv");
        assert_eq!(gw.export_csv(&session, &out).unwrap(), 2);

        let content = fs::read_to_string(&out).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("id,full_name,national_id"));
        assert!(lines.next().unwrap().contains("Ana"));
        assert!(content.contains("Ana; Bia"));
        assert!(matches!(
            gw.export_csv(&Session::anonymous(), &out),
            Err(GatewayError::AuthRequired)
        ));
    }
}
