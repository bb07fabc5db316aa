use crate::domain::model::VaccinationRecord;
use crate::utils::error::{ChronicleError, Result};
use serde::Serialize;
use std::io::Write;

/// One CSV row per record, with dates as plain `YYYY-MM-DD`.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    child_id: &'a str,
    vaccine: &'a str,
    dose: u32,
    scheduled_date: String,
    status: &'a str,
    administered_date: String,
    administered_by: &'a str,
    location: &'a str,
    batch_number: &'a str,
    notes: &'a str,
}

impl<'a> From<&'a VaccinationRecord> for ExportRow<'a> {
    fn from(record: &'a VaccinationRecord) -> Self {
        Self {
            child_id: &record.child_id,
            vaccine: &record.vaccine_name,
            dose: record.dose_number,
            scheduled_date: record.scheduled_date.format("%Y-%m-%d").to_string(),
            status: record.status.as_str(),
            administered_date: record
                .administered_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            administered_by: record
                .administered_by_name
                .as_deref()
                .or(record.administered_by.as_deref())
                .unwrap_or(""),
            location: record.location.as_deref().unwrap_or(""),
            batch_number: record.batch_number.as_deref().unwrap_or(""),
            notes: record.notes.as_deref().unwrap_or(""),
        }
    }
}

pub fn write_records_csv<W: Write>(records: &[VaccinationRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(ExportRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn records_to_csv(records: &[VaccinationRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_records_csv(records, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ChronicleError::StorageError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{NewVaccinationRecord, VaccinationStatus};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_csv_export() {
        let at = Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap();
        let mut record = NewVaccinationRecord {
            child_id: "c1".to_string(),
            vaccine_id: "dtp".to_string(),
            vaccine_name: "DTP".to_string(),
            dose_number: 1,
            scheduled_date: at,
            status: VaccinationStatus::Completed,
            created_at: at,
            updated_at: at,
        }
        .into_record("rec-1".to_string());
        record.administered_date = Some(at);
        record.administered_by_name = Some("Nurse Joy".to_string());
        record.notes = Some("left arm, no reaction".to_string());

        let csv = records_to_csv(&[record]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "child_id,vaccine,dose,scheduled_date,status,administered_date,administered_by,location,batch_number,notes"
        );
        assert_eq!(
            lines.next().unwrap(),
            "c1,DTP,1,2024-02-15,completed,2024-02-15,Nurse Joy,,,\"left arm, no reaction\""
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_export_is_empty() {
        assert_eq!(records_to_csv(&[]).unwrap(), "");
    }
}
