mod architecture;

pub(crate) use architecture::dedup_services;
pub use architecture::{ArchitectureRecord, Component, ParsingStatus, RawPage};
