use crate::domain::model::{
    ActingUser, ClinicCode, NewVaccinationRecord, RecordPatch, StatusChangeEvent, VaccinationRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence of vaccination records. Last write wins; implementations must
/// store field values exactly as given.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persists the records and returns their ids in input order.
    async fn create_records(&self, records: Vec<NewVaccinationRecord>) -> Result<Vec<String>>;
    async fn get_records_by_child(&self, child_id: &str) -> Result<Vec<VaccinationRecord>>;
    async fn get_record(&self, id: &str) -> Result<Option<VaccinationRecord>>;
    async fn update_record(&self, id: &str, patch: &RecordPatch) -> Result<()>;
}

/// Storage for single-use clinic codes.
#[async_trait]
pub trait CodeStore: Send + Sync {
    async fn insert_code(&self, child_id: &str, created_at: DateTime<Utc>) -> Result<ClinicCode>;
    async fn get_code(&self, id: &str) -> Result<Option<ClinicCode>>;
    /// Marks the code used and returns it. The check and the write happen
    /// under one lock, so a code is redeemed at most once.
    async fn redeem_code(&self, id: &str, scanned_by: &str, at: DateTime<Utc>) -> Result<ClinicCode>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        event: &StatusChangeEvent,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait IdentityProvider: Send + Sync {
    fn acting_user(&self, user_id: &str) -> Result<ActingUser>;
}
