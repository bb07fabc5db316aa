use crate::adapters::identity::StaticDirectory;
use crate::core::catalog::VaccineCatalog;
use crate::core::stats::DEFAULT_UPCOMING_WINDOW_DAYS;
use crate::domain::model::{ActingUser, Vaccine};
use crate::utils::error::{ChronicleError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_STORE_PATH: &str = "./kidcare-records.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChronicleConfig {
    #[serde(default)]
    pub store: StoreConfig,
    pub schedule: Option<ScheduleConfig>,
    pub logging: Option<LoggingConfig>,
    /// Replaces the standard catalog when present.
    pub vaccines: Option<Vec<Vaccine>>,
    #[serde(default)]
    pub users: Vec<ActingUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub upcoming_window_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

impl ChronicleConfig {
    /// Loads and parses a TOML file. Call `validate` before use.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value; unknown names stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ChronicleError::configuration(format!("bad substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("store.path", &self.store.path)?;

        if let Some(days) = self.schedule.as_ref().and_then(|s| s.upcoming_window_days) {
            validation::validate_range("schedule.upcoming_window_days", days, 1, 366)?;
        }

        validation::validate_unique("users.id", self.users.iter().map(|u| u.id.as_str()))?;
        for user in &self.users {
            validation::validate_non_empty_string("users.id", &user.id)?;
            validation::validate_non_empty_string("users.display_name", &user.display_name)?;
        }

        self.catalog().map(|_| ())
    }

    pub fn store_path(&self) -> &str {
        &self.store.path
    }

    pub fn upcoming_window_days(&self) -> u32 {
        self.schedule
            .as_ref()
            .and_then(|s| s.upcoming_window_days)
            .unwrap_or(DEFAULT_UPCOMING_WINDOW_DAYS)
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }

    /// The configured catalog, or the standard one.
    pub fn catalog(&self) -> Result<VaccineCatalog> {
        match &self.vaccines {
            Some(vaccines) => VaccineCatalog::new(vaccines.clone()),
            None => Ok(VaccineCatalog::standard()),
        }
    }

    pub fn directory(&self) -> StaticDirectory {
        StaticDirectory::new(self.users.clone())
    }
}

impl Validate for ChronicleConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Role;
    use crate::domain::ports::IdentityProvider;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[store]
path = "./data/records.json"

[schedule]
upcoming_window_days = 14

[logging]
json = true

[[users]]
id = "hw-1"
display_name = "Nurse Joy"
role = "healthcare_worker"

[[users]]
id = "p-1"
display_name = "Ada"
role = "parent"

[[vaccines]]
id = "bcg"
name = "BCG"
doses = 1
mandatory = true
age_schedule = { min_age = 0, max_age = 365, ideal_age = 1 }

[[vaccines]]
id = "dtp"
name = "DTP"
doses = 3
interval = 30
age_schedule = { min_age = 42, max_age = 365, ideal_age = 45 }
side_effects = ["Mild fever"]
"#;

    #[test]
    fn test_parse_full_config() {
        let config = ChronicleConfig::from_toml_str(FULL_CONFIG).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.store_path(), "./data/records.json");
        assert_eq!(config.upcoming_window_days(), 14);
        assert!(config.json_logs());

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("dtp").unwrap().interval, Some(30));

        let directory = config.directory();
        assert_eq!(
            directory.acting_user("hw-1").unwrap().role,
            Role::HealthcareWorker
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ChronicleConfig::from_toml_str("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.store_path(), DEFAULT_STORE_PATH);
        assert_eq!(config.upcoming_window_days(), 30);
        assert!(!config.json_logs());
        assert_eq!(config.catalog().unwrap(), VaccineCatalog::standard());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("KIDCARE_TEST_STORE", "/tmp/kidcare.json");

        let config = ChronicleConfig::from_toml_str(
            r#"
[store]
path = "${KIDCARE_TEST_STORE}"
"#,
        )
        .unwrap();
        assert_eq!(config.store_path(), "/tmp/kidcare.json");

        std::env::remove_var("KIDCARE_TEST_STORE");
    }

    #[test]
    fn test_catalog_without_interval_fails_validation() {
        let config = ChronicleConfig::from_toml_str(
            r#"
[[vaccines]]
id = "polio"
name = "Polio"
doses = 4
age_schedule = { min_age = 42, max_age = 365, ideal_age = 45 }
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ChronicleError::ConfigurationError { .. }));
    }

    #[test]
    fn test_window_out_of_range() {
        let config = ChronicleConfig::from_toml_str(
            r#"
[schedule]
upcoming_window_days = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = ChronicleConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.users.len(), 2);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = ChronicleConfig::from_toml_str(
            r#"
[[users]]
id = "x"
display_name = "X"
role = "admin"
"#,
        );
        assert!(matches!(result, Err(ChronicleError::TomlError(_))));
    }
}
