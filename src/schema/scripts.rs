//! Lookup of raw table-creation scripts by table name.
//!
//! Deployments ship `<table>.sql` files in the install directory; during
//! development they live under the source tree instead, so the catalog
//! searches the primary directory first and falls back to the development
//! path. Absence in both is fatal for the table being created.

use crate::errors::{Error, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Resolves `table name -> raw creation script`.
#[derive(Debug, Clone)]
pub struct ScriptCatalog {
    primary: PathBuf,
    fallback: PathBuf,
}

impl ScriptCatalog {
    /// Creates a catalog searching `primary` first, then `fallback`.
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
        }
    }

    /// Returns the creation script for `table`, or
    /// [`Error::MissingScript`] when neither directory has it.
    pub fn create_script(&self, table: &str) -> Result<String> {
        let file = format!("{table}.sql");
        let mut searched = Vec::with_capacity(2);

        for dir in [&self.primary, &self.fallback] {
            let path = dir.join(&file);
            if path.is_file() {
                debug!(table, path = %path.display(), "resolved creation script");
                return Ok(fs::read_to_string(&path)?);
            }
            searched.push(path);
        }

        Err(Error::MissingScript {
            table: table.to_string(),
            searched,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn resolves_from_primary_directory_first() {
        let primary = tempfile::tempdir().unwrap();
        let fallback = tempfile::tempdir().unwrap();
        fs::write(primary.path().join("user.sql"), "CREATE TABLE user_primary (id int)").unwrap();
        fs::write(fallback.path().join("user.sql"), "CREATE TABLE user_fallback (id int)").unwrap();

        let catalog = ScriptCatalog::new(primary.path(), fallback.path());
        let script = catalog.create_script("user").unwrap();
        assert!(script.contains("user_primary"));
    }

    #[test]
    fn falls_back_to_development_directory() {
        let primary = tempfile::tempdir().unwrap();
        let fallback = tempfile::tempdir().unwrap();
        fs::write(fallback.path().join("user.sql"), "CREATE TABLE \"user\" (id int)").unwrap();

        let catalog = ScriptCatalog::new(primary.path(), fallback.path());
        assert!(catalog.create_script("user").is_ok());
    }

    #[test]
    fn absent_in_both_directories_is_fatal() {
        let primary = tempfile::tempdir().unwrap();
        let fallback = tempfile::tempdir().unwrap();

        let catalog = ScriptCatalog::new(primary.path(), fallback.path());
        let err = catalog.create_script("user").unwrap_err();
        match err {
            Error::MissingScript { table, searched } => {
                assert_eq!(table, "user");
                assert_eq!(searched.len(), 2);
            }
            other => panic!("expected MissingScript, got {other:?}"),
        }
    }
}
