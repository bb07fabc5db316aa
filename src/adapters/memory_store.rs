use crate::domain::model::{
    ensure_unique_doses, ClinicCode, NewVaccinationRecord, RecordPatch, VaccinationRecord,
};
use crate::domain::ports::{CodeStore, RecordStore};
use crate::utils::error::{ChronicleError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local record and clinic code store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<BTreeMap<String, VaccinationRecord>>>,
    codes: Arc<RwLock<BTreeMap<String, ClinicCode>>>,
    next_id: Arc<AtomicU64>,
    next_code: Arc<AtomicU64>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn allocate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("rec-{:04}", n)
    }
}

#[async_trait]
impl CodeStore for InMemoryRecordStore {
    async fn insert_code(&self, child_id: &str, created_at: DateTime<Utc>) -> Result<ClinicCode> {
        let n = self.next_code.fetch_add(1, Ordering::Relaxed) + 1;
        let code = ClinicCode::new(format!("code-{:04}", n), child_id, created_at);
        self.codes.write().await.insert(code.id.clone(), code.clone());
        Ok(code)
    }

    async fn get_code(&self, id: &str) -> Result<Option<ClinicCode>> {
        Ok(self.codes.read().await.get(id).cloned())
    }

    async fn redeem_code(&self, id: &str, scanned_by: &str, at: DateTime<Utc>) -> Result<ClinicCode> {
        let mut codes = self.codes.write().await;
        let code = codes
            .get_mut(id)
            .ok_or_else(|| ChronicleError::code_not_found(id))?;
        code.redeem(scanned_by, at)?;
        Ok(code.clone())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create_records(&self, records: Vec<NewVaccinationRecord>) -> Result<Vec<String>> {
        let mut stored = self.records.write().await;
        ensure_unique_doses(stored.values().map(|r| r.dose_key()), &records)?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = self.allocate_id();
            stored.insert(id.clone(), record.into_record(id.clone()));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn get_records_by_child(&self, child_id: &str) -> Result<Vec<VaccinationRecord>> {
        let stored = self.records.read().await;
        Ok(stored
            .values()
            .filter(|r| r.child_id == child_id)
            .cloned()
            .collect())
    }

    async fn get_record(&self, id: &str) -> Result<Option<VaccinationRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update_record(&self, id: &str, patch: &RecordPatch) -> Result<()> {
        let mut stored = self.records.write().await;
        let record = stored
            .get_mut(id)
            .ok_or_else(|| ChronicleError::record_not_found(id))?;
        patch.apply_to(record);
        Ok(())
    }
}
