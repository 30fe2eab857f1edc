//! `poaudit-audit`: address audit engine.
//!
//! Pure engine crate: receives pre-loaded facility tables and voter records,
//! returns classified records. No CLI or file IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod reference;

pub use aggregate::RunTally;
pub use classify::{classify, classify_batch};
pub use config::AuditConfig;
pub use error::AuditError;
pub use model::{ClassifiedRecord, FacilityRecord, FacilityTable, MatchReason, VoterRecord};
pub use normalize::CityAliases;
pub use reference::FacilityIndex;
