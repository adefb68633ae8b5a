//! Unified error types for the installation subsystem.
//!
//! Every failure an installer action can produce is one of these variants,
//! so the boundary can map each kind to a structured, user-facing response
//! instead of surfacing internal faults.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A table together with the columns it is missing, as reported when the
/// `finish` action finds the schema incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingColumns {
    /// Storage name of the incomplete (or absent) table
    pub table: String,
    /// Storage names of the columns that do not exist yet
    pub columns: Vec<String>,
}

impl fmt::Display for MissingColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            write!(f, "{} (table missing)", self.table)
        } else {
            write!(f, "{} is missing columns [{}]", self.table, self.columns.join(", "))
        }
    }
}

/// All failure kinds produced by installer actions
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input: bad port string, bad username pattern, short password
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of what was malformed
        message: String,
    },

    /// An account with the requested username already exists
    #[error("An account named '{username}' already exists")]
    Conflict {
        /// The username that collided
        username: String,
    },

    /// The database could not be opened or pinged
    #[error("Cannot reach the database: {source}")]
    Connectivity {
        /// Underlying driver error
        #[source]
        source: sea_orm::DbErr,
    },

    /// A DDL statement failed while reconciling one table
    #[error("Schema reconciliation failed for table '{table}': {source}")]
    Reconciliation {
        /// Table whose reconciliation aborted
        table: String,
        /// Underlying driver error
        #[source]
        source: sea_orm::DbErr,
    },

    /// The schema is not complete enough to finish installation
    #[error("Schema is incomplete: {}", .tables.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    IncompleteSchema {
        /// Every failing table with its missing column names
        tables: Vec<MissingColumns>,
    },

    /// No administrator account exists yet
    #[error("At least one administrator account must be configured before finishing installation")]
    MissingAdmin,

    /// No account with the given username exists
    #[error("No account named '{username}' exists")]
    NotFound {
        /// The username that was looked up
        username: String,
    },

    /// The password did not match the stored hash
    #[error("Username or password is incorrect")]
    Authentication,

    /// The account exists and the credentials match, but it is not an administrator
    #[error("Account '{username}' is not an administrator")]
    Authorization {
        /// The non-administrator username
        username: String,
    },

    /// No creation script could be found for a table
    #[error("No creation script for table '{table}'; searched {searched:?}")]
    MissingScript {
        /// Table whose script was requested
        table: String,
        /// Paths that were checked, in order
        searched: Vec<PathBuf>,
    },

    /// Failure building or serializing installation configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Unexpected database error outside the typed kinds above
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error reading scripts or writing configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Password hashing or verification failed internally
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

// Convenience `Result` type
/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;
