//! Counts over a snapshot of records.
//!
//! Two notions of "overdue" are reported side by side. `overdue` is computed
//! from dates: a `scheduled` dose whose date has passed. `persisted_overdue`
//! counts records whose stored status is literally `overdue`. Neither is
//! derived from the other.

use crate::domain::model::{VaccinationRecord, VaccinationStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_UPCOMING_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VaccinationStats {
    pub completed: usize,
    pub upcoming: usize,
    pub overdue: usize,
    pub persisted_overdue: usize,
    pub ongoing: usize,
    pub missed: usize,
    pub total: usize,
}

impl VaccinationStats {
    pub fn completion_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

pub fn upcoming_window(days: u32) -> Duration {
    Duration::days(i64::from(days))
}

/// Scheduled, and due within `[now, now + window]`.
pub fn is_upcoming(record: &VaccinationRecord, now: DateTime<Utc>, window: Duration) -> bool {
    record.status == VaccinationStatus::Scheduled
        && record.scheduled_date >= now
        && record.scheduled_date <= now + window
}

/// Scheduled, and due before `now`.
pub fn is_overdue_by_date(record: &VaccinationRecord, now: DateTime<Utc>) -> bool {
    record.status == VaccinationStatus::Scheduled && record.scheduled_date < now
}

pub fn aggregate(records: &[VaccinationRecord], now: DateTime<Utc>) -> VaccinationStats {
    aggregate_with_window(records, now, upcoming_window(DEFAULT_UPCOMING_WINDOW_DAYS))
}

pub fn aggregate_with_window(
    records: &[VaccinationRecord],
    now: DateTime<Utc>,
    window: Duration,
) -> VaccinationStats {
    let mut stats = VaccinationStats {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        match record.status {
            VaccinationStatus::Completed => stats.completed += 1,
            VaccinationStatus::Ongoing => stats.ongoing += 1,
            VaccinationStatus::Missed => stats.missed += 1,
            VaccinationStatus::Overdue => stats.persisted_overdue += 1,
            VaccinationStatus::Scheduled => {
                if is_overdue_by_date(record, now) {
                    stats.overdue += 1;
                } else if is_upcoming(record, now, window) {
                    stats.upcoming += 1;
                }
            }
        }
    }

    stats
}

/// Per-child statistics for a mixed record set, keyed by child id.
pub fn aggregate_by_child(
    records: &[VaccinationRecord],
    now: DateTime<Utc>,
    window: Duration,
) -> BTreeMap<String, VaccinationStats> {
    let mut grouped: BTreeMap<String, Vec<VaccinationRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.child_id.clone())
            .or_default()
            .push(record.clone());
    }

    grouped
        .into_iter()
        .map(|(child_id, child_records)| {
            let stats = aggregate_with_window(&child_records, now, window);
            (child_id, stats)
        })
        .collect()
}

/// The upcoming doses, soonest first.
pub fn upcoming_records(
    records: &[VaccinationRecord],
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<VaccinationRecord> {
    let mut upcoming: Vec<VaccinationRecord> = records
        .iter()
        .filter(|r| is_upcoming(r, now, window))
        .cloned()
        .collect();
    upcoming.sort_by_key(|r| r.scheduled_date);
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::NewVaccinationRecord;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn record(id: &str, child: &str, status: VaccinationStatus, offset_days: i64) -> VaccinationRecord {
        NewVaccinationRecord {
            child_id: child.to_string(),
            vaccine_id: id.to_string(),
            vaccine_name: id.to_string(),
            dose_number: 1,
            scheduled_date: now() + Duration::days(offset_days),
            status,
            created_at: now(),
            updated_at: now(),
        }
        .into_record(id.to_string())
    }

    #[test]
    fn test_ten_days_late_is_overdue_not_upcoming() {
        let records = vec![record("a", "c1", VaccinationStatus::Scheduled, -10)];
        let stats = aggregate(&records, now());
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.upcoming, 0);
        assert_eq!(stats.total, 1);
    }

    #[test]
    fn test_window_boundaries() {
        let records = vec![
            record("today", "c1", VaccinationStatus::Scheduled, 0),
            record("edge", "c1", VaccinationStatus::Scheduled, 30),
            record("beyond", "c1", VaccinationStatus::Scheduled, 31),
        ];
        let stats = aggregate(&records, now());
        assert_eq!(stats.upcoming, 2);
        assert_eq!(stats.overdue, 0);
    }

    #[test]
    fn test_both_overdue_notions_are_kept_apart() {
        let records = vec![
            record("late", "c1", VaccinationStatus::Scheduled, -3),
            record("marked", "c1", VaccinationStatus::Overdue, 20),
            record("done", "c1", VaccinationStatus::Completed, -40),
            record("gone", "c1", VaccinationStatus::Missed, -40),
            record("now", "c1", VaccinationStatus::Ongoing, 0),
        ];
        let stats = aggregate(&records, now());
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.persisted_overdue, 1);
        assert_eq!(stats.upcoming, 0);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.missed, 1);
        assert_eq!(stats.ongoing, 1);
        assert_eq!(stats.total, 5);
        assert!((stats.completion_percentage() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_set() {
        let stats = aggregate(&[], now());
        assert_eq!(stats, VaccinationStats::default());
        assert_eq!(stats.completion_percentage(), 0.0);
    }

    #[test]
    fn test_aggregate_by_child() {
        let records = vec![
            record("a", "c1", VaccinationStatus::Completed, -5),
            record("b", "c2", VaccinationStatus::Scheduled, 5),
            record("c", "c2", VaccinationStatus::Scheduled, -5),
        ];
        let by_child = aggregate_by_child(&records, now(), upcoming_window(30));
        assert_eq!(by_child.len(), 2);
        assert_eq!(by_child["c1"].completed, 1);
        assert_eq!(by_child["c2"].upcoming, 1);
        assert_eq!(by_child["c2"].overdue, 1);
    }

    #[test]
    fn test_upcoming_records_sorted() {
        let records = vec![
            record("later", "c1", VaccinationStatus::Scheduled, 20),
            record("sooner", "c1", VaccinationStatus::Scheduled, 2),
            record("done", "c1", VaccinationStatus::Completed, 1),
        ];
        let upcoming = upcoming_records(&records, now(), upcoming_window(30));
        let ids: Vec<&str> = upcoming.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["sooner", "later"]);
    }
}
