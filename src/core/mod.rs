pub mod catalog;
pub mod check_in;
pub mod filters;
pub mod lifecycle;
pub mod schedule;
pub mod stats;

pub use crate::domain::model::{
    ActingUser, Child, ClinicCode, CompletionDetails, Role, ScheduleEntry, StatusChangeEvent,
    VaccinationRecord, VaccinationStatus, Vaccine,
};
pub use crate::domain::ports::{Clock, CodeStore, IdentityProvider, Notifier, RecordStore};
pub use crate::utils::error::Result;
pub use catalog::VaccineCatalog;
pub use check_in::{CheckInDesk, CodeRedemption};
pub use filters::RecordFilter;
pub use lifecycle::LifecycleEngine;
pub use stats::VaccinationStats;
