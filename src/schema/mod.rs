//! Schema inspection and reconciliation.
//!
//! The server declares the tables it expects as static entity descriptors.
//! The inspector compares them against the live catalog without mutating
//! anything; the reconciler creates only what is missing, additively, and
//! never drops, renames or retypes existing columns.

/// Static descriptors for expected tables and columns
pub mod descriptor;
/// Read-only comparison of descriptors against the live catalog
pub mod inspector;
/// Additive-only schema mutation driven by inspection results
pub mod reconciler;
/// Lookup of raw table-creation scripts by table name
pub mod scripts;

pub use descriptor::{ColumnKind, EntityDescriptor, FieldDescriptor, TableStatus};
pub use scripts::ScriptCatalog;
