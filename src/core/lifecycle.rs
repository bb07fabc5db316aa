use crate::core::catalog::VaccineCatalog;
use crate::core::filters::{self, RecordFilter};
use crate::core::schedule::generate_schedule;
use crate::core::stats::{self, VaccinationStats, DEFAULT_UPCOMING_WINDOW_DAYS};
use crate::domain::model::{
    ensure_unique_doses, ActingUser, Child, CompletionDetails, NewVaccinationRecord, RecordPatch,
    StatusChangeEvent, VaccinationRecord, VaccinationStatus,
};
use crate::domain::ports::{Clock, Notifier, RecordStore};
use crate::utils::error::{ChronicleError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Builds the patch for moving a record into `new_status`.
///
/// `ongoing` and `completed` stamp the acting worker; only `completed` stamps
/// the administered date. Other states touch nothing but `updated_at` and the
/// status, so earlier administration details stay on the record.
pub fn transition_patch(
    new_status: VaccinationStatus,
    actor: &ActingUser,
    now: DateTime<Utc>,
) -> RecordPatch {
    let mut patch = RecordPatch::touch(now);
    patch.status = Some(new_status);

    if new_status.records_administrator() {
        patch.administered_by = Some(actor.display_name.clone());
        patch.administered_by_name = Some(actor.display_name.clone());
        patch.healthcare_worker_id = Some(actor.id.clone());
    }
    if new_status == VaccinationStatus::Completed {
        patch.administered_date = Some(now);
    }

    patch
}

pub(crate) fn authorize(actor: &ActingUser, action: &str) -> Result<()> {
    if actor.is_healthcare_worker() {
        return Ok(());
    }
    Err(ChronicleError::PermissionError {
        user_id: actor.id.clone(),
        reason: format!("only healthcare workers may {}", action),
    })
}

/// Creates schedules for children and moves their records through statuses.
pub struct LifecycleEngine<S: RecordStore, N: Notifier, C: Clock> {
    store: S,
    notifier: N,
    clock: C,
    catalog: Arc<VaccineCatalog>,
    upcoming_window: Duration,
}

impl<S: RecordStore, N: Notifier, C: Clock> LifecycleEngine<S, N, C> {
    pub fn new(store: S, notifier: N, clock: C, catalog: Arc<VaccineCatalog>) -> Self {
        Self {
            store,
            notifier,
            clock,
            catalog,
            upcoming_window: stats::upcoming_window(DEFAULT_UPCOMING_WINDOW_DAYS),
        }
    }

    pub fn with_upcoming_window_days(mut self, days: u32) -> Self {
        self.upcoming_window = stats::upcoming_window(days);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &VaccineCatalog {
        &self.catalog
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Registers a child from their profile. The date of birth may not lie
    /// after today.
    pub async fn register_profile(&self, child: &Child) -> Result<Vec<String>> {
        child.validate()?;
        let today = self.clock.now().date_naive();
        if child.date_of_birth > today {
            return Err(ChronicleError::validation(format!(
                "date of birth {} of child {} is in the future",
                child.date_of_birth, child.id
            )));
        }

        tracing::debug!(
            child_id = %child.id,
            "Registering {}, aged {}",
            child.name,
            child.age_description(today)
        );
        self.register_child(&child.id, child.date_of_birth).await
    }

    /// Generates and persists the full schedule for a newly registered child.
    /// Returns the ids of the created records.
    pub async fn register_child(&self, child_id: &str, date_of_birth: NaiveDate) -> Result<Vec<String>> {
        validation::validate_non_empty_string("child_id", child_id)?;

        let now = self.clock.now();
        let entries = generate_schedule(date_of_birth, self.catalog.vaccines())?;

        let drafts: Vec<NewVaccinationRecord> = entries
            .into_iter()
            .map(|entry| entry.into_new_record(child_id, now))
            .collect();
        for draft in &drafts {
            self.catalog.validate_dose(&draft.vaccine_id, draft.dose_number)?;
        }

        let existing = self.store.get_records_by_child(child_id).await?;
        ensure_unique_doses(existing.iter().map(|r| r.dose_key()), &drafts)?;

        let count = drafts.len();
        let ids = self.store.create_records(drafts).await?;
        tracing::info!(
            child_id,
            "Created vaccination schedule with {} doses (born {})",
            count,
            date_of_birth
        );
        Ok(ids)
    }

    /// All records of a child, soonest first.
    pub async fn records_for_child(&self, child_id: &str) -> Result<Vec<VaccinationRecord>> {
        let records = self.store.get_records_by_child(child_id).await?;
        tracing::debug!(child_id, "Fetched {} vaccination records", records.len());
        Ok(filters::sorted_by_schedule(&records))
    }

    /// Records of a child matching `filter`, soonest first.
    pub async fn find_records(
        &self,
        child_id: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<VaccinationRecord>> {
        let records = self.store.get_records_by_child(child_id).await?;
        Ok(filter.apply(&records))
    }

    pub async fn apply_status_change(
        &self,
        record_id: &str,
        new_status: VaccinationStatus,
        actor: &ActingUser,
    ) -> Result<VaccinationRecord> {
        let now = self.clock.now();
        let patch = transition_patch(new_status, actor, now);
        self.commit(record_id, patch, actor, "change vaccination status")
            .await
    }

    /// Completes a dose and stores where and how it was given.
    pub async fn mark_complete(
        &self,
        record_id: &str,
        actor: &ActingUser,
        details: CompletionDetails,
    ) -> Result<VaccinationRecord> {
        let now = self.clock.now();
        let mut patch = transition_patch(VaccinationStatus::Completed, actor, now);
        patch.location = details.location;
        patch.batch_number = details.batch_number;
        patch.notes = details.notes;
        if !details.side_effects_reported.is_empty() {
            patch.side_effects_reported = Some(details.side_effects_reported);
        }
        self.commit(record_id, patch, actor, "complete vaccinations")
            .await
    }

    /// Completes the earliest scheduled dose of a child, e.g. after the
    /// child's card was scanned at a clinic. `None` if nothing is scheduled.
    pub async fn complete_next_scheduled(
        &self,
        child_id: &str,
        actor: &ActingUser,
    ) -> Result<Option<VaccinationRecord>> {
        authorize(actor, "complete vaccinations")?;

        let records = self.records_for_child(child_id).await?;
        let Some(next) = records
            .into_iter()
            .find(|r| r.status == VaccinationStatus::Scheduled)
        else {
            tracing::info!(child_id, "No scheduled vaccination left to complete");
            return Ok(None);
        };

        self.apply_status_change(&next.id, VaccinationStatus::Completed, actor)
            .await
            .map(Some)
    }

    pub async fn stats(&self, child_id: &str) -> Result<VaccinationStats> {
        let records = self.store.get_records_by_child(child_id).await?;
        Ok(stats::aggregate_with_window(
            &records,
            self.clock.now(),
            self.upcoming_window,
        ))
    }

    /// Statistics for several children at once, keyed by child id. Children
    /// without records get empty statistics.
    pub async fn stats_by_child(
        &self,
        child_ids: &[String],
    ) -> Result<BTreeMap<String, VaccinationStats>> {
        self.stats_by_child_at(child_ids, self.clock.now()).await
    }

    /// Like [`Self::stats_by_child`], evaluated as of `at`.
    pub async fn stats_by_child_at(
        &self,
        child_ids: &[String],
        at: DateTime<Utc>,
    ) -> Result<BTreeMap<String, VaccinationStats>> {
        let unique: BTreeSet<&String> = child_ids.iter().collect();
        let mut records = Vec::new();
        for child_id in &unique {
            records.extend(self.store.get_records_by_child(child_id).await?);
        }

        let mut by_child = stats::aggregate_by_child(&records, at, self.upcoming_window);
        for child_id in unique {
            by_child.entry(child_id.clone()).or_default();
        }
        Ok(by_child)
    }

    pub async fn upcoming(&self, child_id: &str) -> Result<Vec<VaccinationRecord>> {
        let records = self.store.get_records_by_child(child_id).await?;
        Ok(stats::upcoming_records(
            &records,
            self.clock.now(),
            self.upcoming_window,
        ))
    }

    async fn commit(
        &self,
        record_id: &str,
        patch: RecordPatch,
        actor: &ActingUser,
        action: &str,
    ) -> Result<VaccinationRecord> {
        authorize(actor, action)?;

        let mut record = self
            .store
            .get_record(record_id)
            .await?
            .ok_or_else(|| ChronicleError::record_not_found(record_id))?;

        let new_status = patch.status.unwrap_or(record.status);
        if !record.status.can_transition_to(new_status) {
            return Err(ChronicleError::validation(format!(
                "cannot move record {} from {} to {}",
                record_id, record.status, new_status
            )));
        }

        self.store.update_record(record_id, &patch).await?;
        let previous = record.status;
        patch.apply_to(&mut record);

        tracing::info!(
            record_id,
            child_id = %record.child_id,
            actor = %actor.id,
            "Vaccination status {} -> {}",
            previous,
            new_status
        );

        let event = StatusChangeEvent {
            record_id: record.id.clone(),
            child_id: record.child_id.clone(),
            new_status,
            acting_user_id: actor.id.clone(),
            timestamp: patch.updated_at,
        };
        if let Err(e) = self.notifier.notify(&event).await {
            tracing::warn!(record_id, "Status change notification failed: {}", e);
        }

        Ok(record)
    }
}
