//! Encounter access: the typed view and date/time resolution

pub mod datetime;
pub mod view;

pub use datetime::{days_between, has_procedure_in_window, DayWindow};
pub use view::{DiagnosisEntry, EncounterView, PoaStatus, ProcedureEntry};
