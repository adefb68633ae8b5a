//! Installation configuration persisted when the wizard finishes.

/// Durable configuration store trait and TOML-backed implementation
pub mod store;

pub use store::{ConfigStore, TomlConfigStore};

use crate::db::ConnectionParams;
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// Connection settings persisted on successful finish.
///
/// Written exactly once, by the `finish` action, after every precondition has
/// passed. The running server reads this at its next startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationConfig {
    /// Database host name or address
    pub db_host: String,
    /// Database port, absent when the driver default applies
    pub db_port: Option<u16>,
    /// Schema (database) name the server was installed into
    pub db_schema: String,
    /// Database account name
    pub db_username: String,
    /// Database account password
    pub db_password: String,
}

impl InstallationConfig {
    /// Builds the durable configuration from the parameters the operator
    /// submitted with the `finish` action.
    pub fn from_params(params: &ConnectionParams) -> Result<Self> {
        Ok(Self {
            db_host: params.host.clone(),
            db_port: params.validate()?,
            db_schema: params.schema_name.clone(),
            db_username: params.username.clone(),
            db_password: params.password.clone(),
        })
    }
}
