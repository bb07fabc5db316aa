use crate::domain::document::{decode_record, encode_record};
use crate::domain::model::{
    ensure_unique_doses, ClinicCode, NewVaccinationRecord, RecordPatch, VaccinationRecord,
};
use crate::domain::ports::{CodeStore, RecordStore};
use crate::utils::error::{ChronicleError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// On-disk layout: vaccination documents keyed by record id, plus the
/// clinic codes keyed by code id.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    vaccinations: BTreeMap<String, Value>,
    #[serde(default, rename = "clinicCodes", skip_serializing_if = "BTreeMap::is_empty")]
    clinic_codes: BTreeMap<String, ClinicCode>,
}

/// Record store backed by a single JSON file. Every call reads the file and
/// every write rewrites it. Clones share the same lock.
#[derive(Debug, Clone)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn load(&self) -> Result<StoreFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(StoreFile::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, file: &StoreFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let data = serde_json::to_vec_pretty(file)?;
        // Replace the file in one step so a failed write leaves the old one.
        let staging = self.staging_path();
        tokio::fs::write(&staging, data).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        tracing::debug!("Wrote {} records to {}", file.vaccinations.len(), self.path.display());
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }

    /// Decodes only the documents owned by one of `child_ids`, so a broken
    /// document never blocks other children.
    fn decode_for_children(
        file: &StoreFile,
        child_ids: &HashSet<&str>,
    ) -> Result<Vec<VaccinationRecord>> {
        file.vaccinations
            .iter()
            .filter(|(_, doc)| {
                doc.get("childId")
                    .and_then(Value::as_str)
                    .is_some_and(|child_id| child_ids.contains(child_id))
            })
            .map(|(id, doc)| decode_record(id, doc))
            .collect()
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn create_records(&self, records: Vec<NewVaccinationRecord>) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let children: HashSet<&str> = records.iter().map(|r| r.child_id.as_str()).collect();
        let existing = Self::decode_for_children(&file, &children)?;
        ensure_unique_doses(existing.iter().map(|r| r.dose_key()), &records)?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = uuid::Uuid::new_v4().simple().to_string();
            let document = encode_record(&record.into_record(id.clone()))?;
            file.vaccinations.insert(id.clone(), document);
            ids.push(id);
        }

        self.save(&file).await?;
        Ok(ids)
    }

    async fn get_records_by_child(&self, child_id: &str) -> Result<Vec<VaccinationRecord>> {
        let _guard = self.lock.lock().await;
        let file = self.load().await?;
        Self::decode_for_children(&file, &HashSet::from([child_id]))
    }

    async fn get_record(&self, id: &str) -> Result<Option<VaccinationRecord>> {
        let _guard = self.lock.lock().await;
        let file = self.load().await?;
        file.vaccinations
            .get(id)
            .map(|doc| decode_record(id, doc))
            .transpose()
    }

    async fn update_record(&self, id: &str, patch: &RecordPatch) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let document = file
            .vaccinations
            .get(id)
            .ok_or_else(|| ChronicleError::record_not_found(id))?;

        let mut record = decode_record(id, document)?;
        patch.apply_to(&mut record);
        file.vaccinations.insert(id.to_string(), encode_record(&record)?);

        self.save(&file).await
    }
}

#[async_trait]
impl CodeStore for JsonFileRecordStore {
    async fn insert_code(&self, child_id: &str, created_at: DateTime<Utc>) -> Result<ClinicCode> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let code = ClinicCode::new(uuid::Uuid::new_v4().simple().to_string(), child_id, created_at);
        file.clinic_codes.insert(code.id.clone(), code.clone());
        self.save(&file).await?;
        Ok(code)
    }

    async fn get_code(&self, id: &str) -> Result<Option<ClinicCode>> {
        let _guard = self.lock.lock().await;
        let file = self.load().await?;
        Ok(file.clinic_codes.get(id).cloned())
    }

    async fn redeem_code(&self, id: &str, scanned_by: &str, at: DateTime<Utc>) -> Result<ClinicCode> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let code = file
            .clinic_codes
            .get_mut(id)
            .ok_or_else(|| ChronicleError::code_not_found(id))?;
        code.redeem(scanned_by, at)?;
        let redeemed = code.clone();
        self.save(&file).await?;
        Ok(redeemed)
    }
}
