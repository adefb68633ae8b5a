//! Database connection handling for installer actions.

/// Connection parameters, the provider trait and the MySQL factory
pub mod connection;

pub use connection::{ConnectionParams, ConnectionProvider, MysqlConnectionFactory};
