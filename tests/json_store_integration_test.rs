use chrono::{NaiveDate, TimeZone, Utc};
use kidcare_chronicle::adapters::export;
use kidcare_chronicle::domain::ports::RecordStore;
use kidcare_chronicle::{
    ActingUser, ChronicleConfig, FixedClock, JsonFileRecordStore, LifecycleEngine, Role,
    TracingNotifier, VaccinationStatus,
};
use std::sync::Arc;
use tempfile::TempDir;

fn engine_for(
    path: &std::path::Path,
    config: &ChronicleConfig,
) -> LifecycleEngine<JsonFileRecordStore, TracingNotifier, FixedClock> {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    LifecycleEngine::new(
        JsonFileRecordStore::new(path),
        TracingNotifier,
        clock,
        Arc::new(config.catalog().unwrap()),
    )
    .with_upcoming_window_days(config.upcoming_window_days())
}

#[tokio::test]
async fn test_end_to_end_with_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("records.json");
    let config = ChronicleConfig::default();

    let engine = engine_for(&path, &config);
    let dob = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let ids = engine.register_child("child-1", dob).await.unwrap();
    assert_eq!(ids.len(), 18);
    assert!(path.exists());

    let worker = ActingUser::new("hw-1", "Nurse Joy", Role::HealthcareWorker);
    let next = engine
        .complete_next_scheduled("child-1", &worker)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.vaccine_id, "bcg");

    // A second engine over the same file sees the change.
    let reopened = engine_for(&path, &config);
    let records = reopened.records_for_child("child-1").await.unwrap();
    let bcg = records.iter().find(|r| r.vaccine_id == "bcg").unwrap();
    assert_eq!(bcg.status, VaccinationStatus::Completed);
    assert_eq!(bcg.healthcare_worker_id.as_deref(), Some("hw-1"));

    let stats = reopened.stats("child-1").await.unwrap();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.total, 18);
}

#[tokio::test]
async fn test_stored_documents_use_document_field_names() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("records.json");
    let engine = engine_for(&path, &ChronicleConfig::default());

    let dob = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let ids = engine.register_child("child-1", dob).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let document = &raw["vaccinations"][&ids[0]];
    assert_eq!(document["childId"], "child-1");
    assert_eq!(document["status"], "scheduled");
    assert!(document.get("id").is_none());
    assert!(document.get("administeredDate").is_none());
}

#[tokio::test]
async fn test_configured_catalog_and_export() {
    let config = ChronicleConfig::from_toml_str(
        r#"
[schedule]
upcoming_window_days = 60

[[vaccines]]
id = "mmr"
name = "MMR"
doses = 2
interval = 90
age_schedule = { min_age = 365, max_age = 730, ideal_age = 365 }
"#,
    )
    .unwrap();

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("records.json");
    let engine = engine_for(&path, &config);

    let dob = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    engine.register_child("child-9", dob).await.unwrap();

    let records = engine.records_for_child("child-9").await.unwrap();
    assert_eq!(records.len(), 2);

    // Dose 1 falls on 2024-01-01 00:00, before the clock's 09:00, so it is
    // already late. Dose 2 (2024-03-31) is past the 60 day window.
    let stats = engine.stats("child-9").await.unwrap();
    assert_eq!(stats.overdue, 1);
    assert_eq!(stats.upcoming, 0);

    let csv = export::records_to_csv(&records).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("child-9,MMR,1,2024-01-01,scheduled"));
    assert!(csv.contains("child-9,MMR,2,2024-03-31,scheduled"));

    assert!(engine.store().get_record("unknown").await.unwrap().is_none());
}
