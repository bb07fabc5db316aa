use crate::utils::error::{ChronicleError, Result};
use crate::utils::validation::Validate;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Ages are in days since birth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeSchedule {
    pub min_age: u32,
    pub max_age: u32,
    pub ideal_age: u32,
}

/// A catalog entry. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaccine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub age_schedule: AgeSchedule,
    pub doses: u32,
    /// Days between doses. Required when `doses > 1`.
    #[serde(default)]
    pub interval: Option<u32>,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub side_effects: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationStatus {
    Scheduled,
    Ongoing,
    Completed,
    Missed,
    Overdue,
}

impl VaccinationStatus {
    pub const ALL: [VaccinationStatus; 5] = [
        VaccinationStatus::Scheduled,
        VaccinationStatus::Ongoing,
        VaccinationStatus::Completed,
        VaccinationStatus::Missed,
        VaccinationStatus::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VaccinationStatus::Scheduled => "scheduled",
            VaccinationStatus::Ongoing => "ongoing",
            VaccinationStatus::Completed => "completed",
            VaccinationStatus::Missed => "missed",
            VaccinationStatus::Overdue => "overdue",
        }
    }

    /// Every state may move to every other state, so data-entry mistakes
    /// (e.g. completed -> scheduled) can be corrected.
    pub fn can_transition_to(self, _next: VaccinationStatus) -> bool {
        true
    }

    /// Whether entering this state stamps the acting worker on the record.
    pub fn records_administrator(self) -> bool {
        matches!(
            self,
            VaccinationStatus::Ongoing | VaccinationStatus::Completed
        )
    }
}

impl fmt::Display for VaccinationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaccinationStatus {
    type Err = ChronicleError;

    fn from_str(s: &str) -> Result<Self> {
        VaccinationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ChronicleError::validation(format!("unknown vaccination status '{}'", s)))
    }
}

/// One dose produced by the schedule generator, before it belongs to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub vaccine_id: String,
    pub vaccine_name: String,
    pub dose_number: u32,
    pub scheduled_date: DateTime<Utc>,
    pub status: VaccinationStatus,
}

impl ScheduleEntry {
    pub fn into_new_record(self, child_id: &str, now: DateTime<Utc>) -> NewVaccinationRecord {
        NewVaccinationRecord {
            child_id: child_id.to_string(),
            vaccine_id: self.vaccine_id,
            vaccine_name: self.vaccine_name,
            dose_number: self.dose_number,
            scheduled_date: self.scheduled_date,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A record as handed to the store for creation. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVaccinationRecord {
    pub child_id: String,
    pub vaccine_id: String,
    pub vaccine_name: String,
    pub dose_number: u32,
    pub scheduled_date: DateTime<Utc>,
    pub status: VaccinationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewVaccinationRecord {
    pub fn dose_key(&self) -> DoseKey {
        DoseKey::new(&self.child_id, &self.vaccine_id, self.dose_number)
    }

    pub fn into_record(self, id: String) -> VaccinationRecord {
        VaccinationRecord {
            id,
            child_id: self.child_id,
            vaccine_id: self.vaccine_id,
            vaccine_name: self.vaccine_name,
            dose_number: self.dose_number,
            scheduled_date: self.scheduled_date,
            administered_date: None,
            administered_by: None,
            administered_by_name: None,
            healthcare_worker_id: None,
            location: None,
            batch_number: None,
            notes: None,
            side_effects_reported: None,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationRecord {
    pub id: String,
    pub child_id: String,
    pub vaccine_id: String,
    pub vaccine_name: String,
    pub dose_number: u32,
    pub scheduled_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administered_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administered_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcare_worker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effects_reported: Option<Vec<String>>,
    pub status: VaccinationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VaccinationRecord {
    pub fn dose_key(&self) -> DoseKey {
        DoseKey::new(&self.child_id, &self.vaccine_id, self.dose_number)
    }
}

/// Partial update applied by the store. `None` leaves the stored field as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VaccinationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administered_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administered_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administered_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcare_worker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effects_reported: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

impl RecordPatch {
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            status: None,
            administered_date: None,
            administered_by: None,
            administered_by_name: None,
            healthcare_worker_id: None,
            location: None,
            batch_number: None,
            notes: None,
            side_effects_reported: None,
            updated_at,
        }
    }

    pub fn apply_to(&self, record: &mut VaccinationRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(date) = self.administered_date {
            record.administered_date = Some(date);
        }
        if let Some(by) = &self.administered_by {
            record.administered_by = Some(by.clone());
        }
        if let Some(name) = &self.administered_by_name {
            record.administered_by_name = Some(name.clone());
        }
        if let Some(worker) = &self.healthcare_worker_id {
            record.healthcare_worker_id = Some(worker.clone());
        }
        if let Some(location) = &self.location {
            record.location = Some(location.clone());
        }
        if let Some(batch) = &self.batch_number {
            record.batch_number = Some(batch.clone());
        }
        if let Some(notes) = &self.notes {
            record.notes = Some(notes.clone());
        }
        if let Some(effects) = &self.side_effects_reported {
            record.side_effects_reported = Some(effects.clone());
        }
        record.updated_at = self.updated_at;
    }
}

/// Identity of a dose: at most one record per key may exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DoseKey {
    pub child_id: String,
    pub vaccine_id: String,
    pub dose_number: u32,
}

impl DoseKey {
    pub fn new(child_id: &str, vaccine_id: &str, dose_number: u32) -> Self {
        Self {
            child_id: child_id.to_string(),
            vaccine_id: vaccine_id.to_string(),
            dose_number,
        }
    }
}

impl fmt::Display for DoseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "child {} / {} dose {}",
            self.child_id, self.vaccine_id, self.dose_number
        )
    }
}

/// Rejects a batch that repeats a dose, either within itself or against `existing`.
pub fn ensure_unique_doses<I>(existing: I, new_records: &[NewVaccinationRecord]) -> Result<()>
where
    I: IntoIterator<Item = DoseKey>,
{
    let mut seen: HashSet<DoseKey> = existing.into_iter().collect();
    for record in new_records {
        let key = record.dose_key();
        if !seen.insert(key.clone()) {
            return Err(ChronicleError::validation(format!(
                "duplicate vaccination record for {}",
                key
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    HealthcareWorker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

impl ActingUser {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
        }
    }

    pub fn is_healthcare_worker(&self) -> bool {
        self.role == Role::HealthcareWorker
    }
}

/// Details captured when a dose is given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionDetails {
    pub location: Option<String>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub side_effects_reported: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeEvent {
    pub record_id: String,
    pub child_id: String,
    pub new_status: VaccinationStatus,
    pub acting_user_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub parent_id: String,
    pub parent_name: String,
    pub parent_contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_record_number: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromStr for Gender {
    type Err = ChronicleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            other => Err(ChronicleError::validation(format!("unknown gender '{}'", other))),
        }
    }
}

impl Validate for Child {
    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() || self.name.trim().is_empty() {
            return Err(ChronicleError::validation(
                "a child profile needs an id and a name",
            ));
        }
        Ok(())
    }
}

impl Child {
    /// A profile with no parent contact details or medical notes yet.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        date_of_birth: NaiveDate,
        gender: Gender,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date_of_birth,
            gender,
            parent_id: String::new(),
            parent_name: String::new(),
            parent_contact: String::new(),
            medical_record_number: None,
            allergies: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn age_description(&self, today: NaiveDate) -> String {
        age_description(self.date_of_birth, today)
    }
}

/// Human readable age: days for the first two months, then months, then years.
pub fn age_description(date_of_birth: NaiveDate, today: NaiveDate) -> String {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }

    if years <= 0 {
        let months = (today.year() - date_of_birth.year()) * 12 + today.month() as i32
            - date_of_birth.month() as i32;
        if months <= 1 {
            let days = (today - date_of_birth).num_days().max(0);
            return format!("{} days", days);
        }
        return format!("{} months", months);
    }

    if years == 1 {
        "1 year".to_string()
    } else {
        format!("{} years", years)
    }
}

/// Single-use code a parent brings to the clinic. Scanning it checks the
/// child in and completes the next scheduled dose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicCode {
    pub id: String,
    pub child_id: String,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_by: Option<String>,
}

impl ClinicCode {
    pub fn new(id: String, child_id: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            child_id: child_id.to_string(),
            is_used: false,
            created_at,
            used_at: None,
            scanned_by: None,
        }
    }

    /// Marks the code used by `scanned_by`. Fails if it was used before.
    pub fn redeem(&mut self, scanned_by: &str, at: DateTime<Utc>) -> Result<()> {
        if self.is_used {
            return Err(ChronicleError::validation(format!(
                "clinic code {} has already been used",
                self.id
            )));
        }
        self.is_used = true;
        self.used_at = Some(at);
        self.scanned_by = Some(scanned_by.to_string());
        Ok(())
    }
}
