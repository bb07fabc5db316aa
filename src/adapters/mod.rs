// Adapters layer: concrete implementations of the domain ports, plus export.

pub mod clock;
pub mod export;
pub mod identity;
pub mod json_store;
pub mod memory_store;
pub mod notifier;

pub use clock::{FixedClock, SystemClock};
pub use identity::StaticDirectory;
pub use json_store::JsonFileRecordStore;
pub use memory_store::InMemoryRecordStore;
pub use notifier::{ChannelNotifier, TracingNotifier};
