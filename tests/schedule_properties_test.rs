use chrono::{Days, NaiveDate};
use kidcare_chronicle::domain::model::AgeSchedule;
use kidcare_chronicle::{generate_schedule, ChronicleError, Vaccine, VaccineCatalog};

fn birth_dates() -> Vec<NaiveDate> {
    vec![
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        NaiveDate::from_ymd_opt(2019, 7, 15).unwrap(),
    ]
}

#[test]
fn test_every_dose_lands_on_its_offset() {
    let catalog = VaccineCatalog::standard();

    for dob in birth_dates() {
        let entries = generate_schedule(dob, catalog.vaccines()).unwrap();
        assert_eq!(entries.len(), catalog.total_doses());

        for vaccine in catalog.vaccines() {
            let doses: Vec<_> = entries.iter().filter(|e| e.vaccine_id == vaccine.id).collect();
            assert_eq!(doses.len() as u32, vaccine.doses);

            for (i, entry) in doses.iter().enumerate() {
                let dose_number = i as u32 + 1;
                assert_eq!(entry.dose_number, dose_number);

                let offset = vaccine.age_schedule.ideal_age
                    + vaccine.interval.unwrap_or(0) * (dose_number - 1);
                let expected = dob.checked_add_days(Days::new(u64::from(offset))).unwrap();
                assert_eq!(entry.scheduled_date.date_naive(), expected);
            }
        }
    }
}

#[test]
fn test_same_inputs_give_identical_output() {
    let catalog = VaccineCatalog::standard();
    for dob in birth_dates() {
        let first = generate_schedule(dob, catalog.vaccines()).unwrap();
        let second = generate_schedule(dob, catalog.vaccines()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn test_any_multi_dose_vaccine_without_interval_fails() {
    for doses in 2..=6 {
        let vaccine = Vaccine {
            id: "rotavirus".to_string(),
            name: "Rotavirus".to_string(),
            description: String::new(),
            age_schedule: AgeSchedule {
                min_age: 42,
                max_age: 240,
                ideal_age: 60,
            },
            doses,
            interval: None,
            mandatory: false,
            side_effects: vec![],
        };
        let dob = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = generate_schedule(dob, &[vaccine]).unwrap_err();
        assert!(matches!(err, ChronicleError::ConfigurationError { .. }));
    }
}
