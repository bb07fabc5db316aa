// Domain layer: records, catalog entries and the ports the core talks through.

pub mod document;
pub mod model;
pub mod ports;
