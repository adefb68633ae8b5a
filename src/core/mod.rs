//! Business logic for the install wizard.

/// Administrator account management against the reconciled schema
pub mod admin;
/// The install state machine orchestrating every wizard action
pub mod installer;

pub use installer::{AdminSummary, InstallStage, Installer};
