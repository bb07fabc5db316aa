use crate::domain::model::{VaccinationRecord, VaccinationStatus};
use chrono::{Datelike, NaiveDate};

/// Records ordered by scheduled date, then vaccine and dose.
pub fn sorted_by_schedule(records: &[VaccinationRecord]) -> Vec<VaccinationRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        a.scheduled_date
            .cmp(&b.scheduled_date)
            .then_with(|| a.vaccine_id.cmp(&b.vaccine_id))
            .then_with(|| a.dose_number.cmp(&b.dose_number))
    });
    sorted
}

pub fn by_status(records: &[VaccinationRecord], status: VaccinationStatus) -> Vec<VaccinationRecord> {
    let matching: Vec<VaccinationRecord> = records
        .iter()
        .filter(|r| r.status == status)
        .cloned()
        .collect();
    sorted_by_schedule(&matching)
}

/// Doses scheduled in the given calendar month (1-12).
pub fn by_month(records: &[VaccinationRecord], year: i32, month: u32) -> Vec<VaccinationRecord> {
    let matching: Vec<VaccinationRecord> = records
        .iter()
        .filter(|r| r.scheduled_date.year() == year && r.scheduled_date.month() == month)
        .cloned()
        .collect();
    sorted_by_schedule(&matching)
}

pub fn by_date(records: &[VaccinationRecord], date: NaiveDate) -> Vec<VaccinationRecord> {
    let matching: Vec<VaccinationRecord> = records
        .iter()
        .filter(|r| r.scheduled_date.date_naive() == date)
        .cloned()
        .collect();
    sorted_by_schedule(&matching)
}

/// Criteria for narrowing a child's records. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub status: Option<VaccinationStatus>,
    /// Year and calendar month.
    pub month: Option<(i32, u32)>,
    pub date: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.month.is_none() && self.date.is_none()
    }

    pub fn apply(&self, records: &[VaccinationRecord]) -> Vec<VaccinationRecord> {
        let mut matching = sorted_by_schedule(records);
        if let Some(status) = self.status {
            matching = by_status(&matching, status);
        }
        if let Some((year, month)) = self.month {
            matching = by_month(&matching, year, month);
        }
        if let Some(date) = self.date {
            matching = by_date(&matching, date);
        }
        matching
    }
}
