pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, Command};

pub use adapters::{
    ChannelNotifier, FixedClock, InMemoryRecordStore, JsonFileRecordStore, StaticDirectory,
    SystemClock, TracingNotifier,
};
pub use config::ChronicleConfig;
pub use crate::core::{
    catalog::VaccineCatalog, check_in::CheckInDesk, filters::RecordFilter,
    lifecycle::LifecycleEngine, schedule::generate_schedule, stats::VaccinationStats,
};
pub use domain::model::{
    ActingUser, Child, ClinicCode, Gender, Role, VaccinationRecord, VaccinationStatus, Vaccine,
};
pub use utils::error::{ChronicleError, Result};
