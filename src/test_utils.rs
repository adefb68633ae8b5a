//! Shared test utilities for the installation subsystem.
//!
//! Tests run against in-memory `SQLite`. Installer-level tests need the same
//! database to survive across the per-action connection scoping, so
//! [`SharedSqliteProvider`] hands out connections to a named shared-cache
//! in-memory database and keeps an anchor connection alive for the fixture's
//! lifetime.

use crate::{
    config::{ConfigStore, InstallationConfig},
    db::{ConnectionParams, ConnectionProvider},
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema, Set, Statement};
use sea_orm::ActiveModelTrait;
use std::sync::Mutex;
use uuid::Uuid;

/// Initializes tracing for test debugging when `RUST_LOG` is set; safe to
/// call from any number of tests.
pub fn init_test_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Creates an in-memory `SQLite` database with the user table initialized
/// from the entity definition. Standard setup for account tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = Database::connect("sqlite::memory:").await?;
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    db.execute(builder.build(&schema.create_table_from_entity(User)))
        .await?;
    Ok(db)
}

/// Creates an in-memory `SQLite` database with no tables at all, for
/// inspector and reconciler tests that build their own schema.
pub async fn setup_empty_db() -> Result<DatabaseConnection> {
    Database::connect("sqlite::memory:").await.map_err(Into::into)
}

/// Executes one raw SQL statement; shorthand for schema fixtures.
pub async fn raw_sql(db: &DatabaseConnection, sql: &str) -> Result<()> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        sql.to_string(),
    ))
    .await?;
    Ok(())
}

/// Inserts a non-administrator account with a real bcrypt hash, for
/// authorization tests.
pub async fn create_plain_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model> {
    let now = Utc::now();
    let account = user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(username.to_string()),
        password_hash: Set(bcrypt::hash(password, bcrypt::DEFAULT_COST)?),
        role: Set(user::UserRole::User),
        status: Set(user::UserStatus::Ok),
        storage_quota: Set(0),
        sort_key: Set(now.timestamp_millis()),
        created_at: Set(now),
        updated_at: Set(now),
        last_access_at: Set(now),
    };
    account.insert(db).await.map_err(Into::into)
}

/// Connection parameters with dummy values; the test provider ignores
/// everything but validation.
pub fn test_params() -> ConnectionParams {
    ConnectionParams {
        host: "localhost".to_string(),
        port: Some("3306".to_string()),
        schema_name: "vault_test".to_string(),
        username: "root".to_string(),
        password: "secret".to_string(),
    }
}

/// Connection provider over a named shared-cache in-memory `SQLite`
/// database. Every `connect` call returns a fresh scoped connection to the
/// same database; the anchor connection keeps it alive between calls.
pub struct SharedSqliteProvider {
    url: String,
    _anchor: DatabaseConnection,
}

impl SharedSqliteProvider {
    /// Creates a provider backed by a fresh uniquely named database.
    pub async fn new() -> Result<Self> {
        init_test_tracing();
        let url = format!(
            "sqlite:file:test_{}?mode=memory&cache=shared",
            Uuid::new_v4().simple()
        );
        let anchor = Database::connect(&url).await?;
        Ok(Self {
            url,
            _anchor: anchor,
        })
    }

    /// Opens an extra connection for test fixtures that seed schema or data
    /// outside the installer's actions.
    pub async fn open(&self) -> Result<DatabaseConnection> {
        Database::connect(&self.url).await.map_err(Into::into)
    }
}

impl ConnectionProvider for SharedSqliteProvider {
    fn connect(
        &self,
        params: &ConnectionParams,
    ) -> impl Future<Output = Result<DatabaseConnection>> + Send {
        async move {
            params.validate()?;
            Database::connect(&self.url)
                .await
                .map_err(|source| Error::Connectivity { source })
        }
    }
}

/// In-memory config store recording what `finish` persisted.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    saved: Mutex<Option<InstallationConfig>>,
}

impl MemoryConfigStore {
    /// Returns the persisted configuration, if `finish` has succeeded.
    #[allow(clippy::unwrap_used)]
    pub fn saved(&self) -> Option<InstallationConfig> {
        self.saved.lock().unwrap().clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn persist(&self, config: &InstallationConfig) -> Result<()> {
        #[allow(clippy::unwrap_used)]
        let mut saved = self.saved.lock().unwrap();
        *saved = Some(config.clone());
        Ok(())
    }
}
