use crate::domain::model::{AgeSchedule, Vaccine};
use crate::utils::error::{ChronicleError, Result};
use crate::utils::validation::{self, Validate};

/// Read-only vaccine reference table, in schedule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaccineCatalog {
    vaccines: Vec<Vaccine>,
}

impl VaccineCatalog {
    /// Builds a catalog, rejecting malformed entries.
    pub fn new(vaccines: Vec<Vaccine>) -> Result<Self> {
        if vaccines.is_empty() {
            return Err(ChronicleError::configuration("vaccine catalog is empty"));
        }
        validation::validate_unique("vaccines.id", vaccines.iter().map(|v| v.id.as_str()))?;
        for vaccine in &vaccines {
            vaccine.validate()?;
        }
        Ok(Self { vaccines })
    }

    /// The standard childhood schedule.
    pub fn standard() -> Self {
        Self {
            vaccines: standard_vaccines(),
        }
    }

    pub fn vaccines(&self) -> &[Vaccine] {
        &self.vaccines
    }

    pub fn get(&self, vaccine_id: &str) -> Option<&Vaccine> {
        self.vaccines.iter().find(|v| v.id == vaccine_id)
    }

    pub fn len(&self) -> usize {
        self.vaccines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaccines.is_empty()
    }

    /// Total number of doses across the catalog.
    pub fn total_doses(&self) -> usize {
        self.vaccines.iter().map(|v| v.doses as usize).sum()
    }

    /// Checks that `dose_number` exists for the vaccine.
    pub fn validate_dose(&self, vaccine_id: &str, dose_number: u32) -> Result<()> {
        let vaccine = self.get(vaccine_id).ok_or_else(|| {
            ChronicleError::validation(format!("unknown vaccine '{}'", vaccine_id))
        })?;
        if dose_number == 0 || dose_number > vaccine.doses {
            return Err(ChronicleError::validation(format!(
                "dose {} out of range for {} (1..={})",
                dose_number, vaccine.id, vaccine.doses
            )));
        }
        Ok(())
    }
}

impl Default for VaccineCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Validate for Vaccine {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("vaccines.id", &self.id)?;
        validation::validate_non_empty_string("vaccines.name", &self.name)?;
        validation::validate_positive_number("vaccines.doses", self.doses, 1)?;

        if self.doses > 1 {
            match self.interval {
                None => {
                    return Err(ChronicleError::configuration(format!(
                        "vaccine '{}' has {} doses but no interval",
                        self.id, self.doses
                    )))
                }
                Some(interval) => {
                    validation::validate_positive_number("vaccines.interval", interval, 1)?
                }
            }
        }

        let ages = &self.age_schedule;
        if ages.min_age > ages.max_age {
            return Err(ChronicleError::configuration(format!(
                "vaccine '{}' has min_age {} above max_age {}",
                self.id, ages.min_age, ages.max_age
            )));
        }
        validation::validate_range(
            "vaccines.age_schedule.ideal_age",
            ages.ideal_age,
            ages.min_age,
            ages.max_age,
        )
    }
}

fn vaccine(
    id: &str,
    name: &str,
    description: &str,
    ages: (u32, u32, u32),
    doses: u32,
    interval: Option<u32>,
    side_effects: &[&str],
) -> Vaccine {
    Vaccine {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        age_schedule: AgeSchedule {
            min_age: ages.0,
            max_age: ages.1,
            ideal_age: ages.2,
        },
        doses,
        interval,
        mandatory: true,
        side_effects: side_effects.iter().map(|s| s.to_string()).collect(),
    }
}

fn standard_vaccines() -> Vec<Vaccine> {
    vec![
        vaccine(
            "bcg",
            "BCG",
            "Bacillus Calmette-Guérin vaccine for tuberculosis",
            (0, 365, 1),
            1,
            None,
            &["Mild swelling at injection site", "Small scar formation"],
        ),
        vaccine(
            "hepatitis-b",
            "Hepatitis B",
            "Hepatitis B vaccine",
            (0, 1095, 1),
            3,
            Some(30),
            &["Soreness at injection site", "Mild fever"],
        ),
        vaccine(
            "dtp",
            "DTP",
            "Diphtheria, Tetanus, and Pertussis vaccine",
            (42, 365, 45),
            5,
            Some(30),
            &["Mild fever", "Irritability", "Swelling at injection site"],
        ),
        vaccine(
            "polio",
            "Polio (OPV/IPV)",
            "Oral Polio Vaccine / Inactivated Polio Vaccine",
            (42, 365, 45),
            4,
            Some(30),
            &["Mild fever", "Fatigue"],
        ),
        vaccine(
            "hib",
            "Hib",
            "Haemophilus influenzae type b vaccine",
            (42, 365, 45),
            3,
            Some(60),
            &["Mild fever", "Swelling at injection site"],
        ),
        vaccine(
            "mmr",
            "MMR",
            "Measles, Mumps, and Rubella vaccine",
            (365, 730, 365),
            2,
            Some(90),
            &["Mild fever", "Rash", "Temporary joint pain"],
        ),
    ]
}
