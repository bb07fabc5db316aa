use crate::domain::model::{ScheduleEntry, VaccinationStatus, Vaccine};
use crate::utils::error::{ChronicleError, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// Derives every dose for a child born on `date_of_birth`.
///
/// Entries come out in catalog order, then dose order. Dose `n` falls on
/// `ideal_age + interval * (n - 1)` days after birth, at midnight UTC. The
/// result depends only on the inputs.
pub fn generate_schedule(date_of_birth: NaiveDate, vaccines: &[Vaccine]) -> Result<Vec<ScheduleEntry>> {
    let mut entries = Vec::with_capacity(vaccines.iter().map(|v| v.doses as usize).sum());

    for vaccine in vaccines {
        if vaccine.doses == 0 {
            return Err(ChronicleError::configuration(format!(
                "vaccine '{}' has no doses",
                vaccine.id
            )));
        }

        for dose_number in 1..=vaccine.doses {
            let offset = dose_offset_days(vaccine, dose_number)?;
            entries.push(ScheduleEntry {
                vaccine_id: vaccine.id.clone(),
                vaccine_name: vaccine.name.clone(),
                dose_number,
                scheduled_date: scheduled_date(date_of_birth, offset, &vaccine.id)?,
                status: VaccinationStatus::Scheduled,
            });
        }
    }

    tracing::debug!(
        "Generated {} scheduled doses from {} vaccines for birth date {}",
        entries.len(),
        vaccines.len(),
        date_of_birth
    );

    Ok(entries)
}

/// Days after birth at which `dose_number` is due.
pub fn dose_offset_days(vaccine: &Vaccine, dose_number: u32) -> Result<u64> {
    let ideal = u64::from(vaccine.age_schedule.ideal_age);
    if dose_number <= 1 {
        return Ok(ideal);
    }

    let interval = vaccine.interval.ok_or_else(|| {
        ChronicleError::configuration(format!(
            "vaccine '{}' has {} doses but no interval",
            vaccine.id, vaccine.doses
        ))
    })?;

    Ok(ideal + u64::from(interval) * u64::from(dose_number - 1))
}

fn scheduled_date(date_of_birth: NaiveDate, offset: u64, vaccine_id: &str) -> Result<DateTime<Utc>> {
    date_of_birth
        .checked_add_days(Days::new(offset))
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| {
            ChronicleError::configuration(format!(
                "schedule for '{}' overflows the calendar ({} days)",
                vaccine_id, offset
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::VaccineCatalog;
    use crate::domain::model::AgeSchedule;

    fn dob() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn single(id: &str, ideal_age: u32, doses: u32, interval: Option<u32>) -> Vaccine {
        Vaccine {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            age_schedule: AgeSchedule {
                min_age: 0,
                max_age: 1000,
                ideal_age,
            },
            doses,
            interval,
            mandatory: true,
            side_effects: vec![],
        }
    }

    #[test]
    fn test_bcg_single_dose() {
        let entries = generate_schedule(dob(), &[single("bcg", 1, 1, None)]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].scheduled_date.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(entries[0].status, VaccinationStatus::Scheduled);
    }

    #[test]
    fn test_dtp_doses_follow_interval() {
        let entries = generate_schedule(dob(), &[single("dtp", 45, 5, Some(30))]).unwrap();
        let offsets: Vec<i64> = entries
            .iter()
            .map(|e| (e.scheduled_date.date_naive() - dob()).num_days())
            .collect();
        assert_eq!(offsets, vec![45, 75, 105, 135, 165]);
        let doses: Vec<u32> = entries.iter().map(|e| e.dose_number).collect();
        assert_eq!(doses, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_missing_interval_is_configuration_error() {
        let err = generate_schedule(dob(), &[single("polio", 45, 4, None)]).unwrap_err();
        assert!(matches!(err, ChronicleError::ConfigurationError { .. }));
    }

    #[test]
    fn test_zero_doses_is_configuration_error() {
        assert!(generate_schedule(dob(), &[single("x", 1, 0, None)]).is_err());
    }

    #[test]
    fn test_standard_catalog_order_and_size() {
        let catalog = VaccineCatalog::standard();
        let entries = generate_schedule(dob(), catalog.vaccines()).unwrap();
        assert_eq!(entries.len(), catalog.total_doses());
        assert_eq!(entries[0].vaccine_id, "bcg");
        assert_eq!(entries.last().unwrap().vaccine_id, "mmr");
        assert_eq!(entries.last().unwrap().dose_number, 2);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let catalog = VaccineCatalog::standard();
        let first = generate_schedule(dob(), catalog.vaccines()).unwrap();
        let second = generate_schedule(dob(), catalog.vaccines()).unwrap();
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}
