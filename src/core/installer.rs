//! The install state machine.
//!
//! One [`Installer`] instance backs the whole wizard. Every action validates
//! its inputs first, opens one scoped database connection through the
//! configured [`ConnectionProvider`], does its work, and closes the handle on
//! every exit path. Intermediate actions may be repeated in any order since
//! each one re-derives fresh state; only `finish` enforces preconditions.

use crate::{
    config::{ConfigStore, InstallationConfig},
    core::admin,
    db::{ConnectionParams, ConnectionProvider},
    entities::user,
    errors::{Error, MissingColumns, Result},
    schema::{EntityDescriptor, ScriptCatalog, TableStatus, inspector, reconciler},
    state::InstalledFlag,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, instrument, warn};

/// Last wizard action that completed successfully.
///
/// Recorded for observability only: the wizard is driven by a single
/// operator who may repeat or reorder intermediate actions freely, so no
/// sequencing is enforced between these states. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstallStage {
    /// No action has completed yet
    NotStarted,
    /// Database connectivity was verified
    ConnectivityVerified,
    /// The schema was inspected
    SchemaChecked,
    /// The schema was reconciled
    SchemaReconciled,
    /// An admin action (list/create/validate) completed
    AdminChecked,
    /// Installation finished; the installed flag is set
    Finished,
}

/// Hash-free view of an administrator account for boundary responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSummary {
    /// Opaque unique identifier
    pub id: String,
    /// Login name
    pub username: String,
    /// Privilege level
    pub role: user::UserRole,
    /// Account status
    pub status: user::UserStatus,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for AdminSummary {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

/// Orchestrates the install wizard's actions.
pub struct Installer<P> {
    provider: P,
    descriptors: Vec<EntityDescriptor>,
    scripts: Option<ScriptCatalog>,
    config_store: Arc<dyn ConfigStore>,
    flag: InstalledFlag,
    stage: Mutex<InstallStage>,
}

impl<P: ConnectionProvider> Installer<P> {
    /// Creates an installer over the given collaborators.
    ///
    /// Fails with a validation error when two descriptors declare the same
    /// table name.
    pub fn new(
        provider: P,
        descriptors: Vec<EntityDescriptor>,
        scripts: Option<ScriptCatalog>,
        config_store: Arc<dyn ConfigStore>,
        flag: InstalledFlag,
    ) -> Result<Self> {
        let mut seen = HashSet::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            if !seen.insert(descriptor.table_name.as_str()) {
                return Err(Error::Validation {
                    message: format!(
                        "duplicate entity descriptor for table '{}'",
                        descriptor.table_name
                    ),
                });
            }
        }

        Ok(Self {
            provider,
            descriptors,
            scripts,
            config_store,
            flag,
            stage: Mutex::new(InstallStage::NotStarted),
        })
    }

    /// Last successfully completed stage.
    pub fn stage(&self) -> InstallStage {
        *self.stage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle to the installed flag shared with request gating.
    pub fn installed_flag(&self) -> InstalledFlag {
        self.flag.clone()
    }

    fn advance(&self, next: InstallStage) {
        let mut stage = self.stage.lock().unwrap_or_else(PoisonError::into_inner);
        if *stage != InstallStage::Finished {
            *stage = next;
        }
    }

    /// Opens a scoped connection after fail-fast input validation.
    async fn open(&self, params: &ConnectionParams) -> Result<DatabaseConnection> {
        params.validate()?;
        self.provider.connect(params).await
    }

    /// Verifies that the database is reachable.
    #[instrument(skip_all)]
    pub async fn verify(&self, params: &ConnectionParams) -> Result<()> {
        let db = self.open(params).await?;
        release(db).await;
        self.advance(InstallStage::ConnectivityVerified);
        Ok(())
    }

    /// Reports the status of every expected table, in declaration order.
    #[instrument(skip_all)]
    pub async fn list_schema_status(&self, params: &ConnectionParams) -> Result<Vec<TableStatus>> {
        let db = self.open(params).await?;
        let outcome = inspector::inspect(&db, &self.descriptors).await;
        release(db).await;
        let statuses = outcome?;
        self.advance(InstallStage::SchemaChecked);
        Ok(statuses)
    }

    /// Creates missing tables and columns, returning post-reconciliation
    /// status for every expected table.
    #[instrument(skip_all)]
    pub async fn reconcile_schema(&self, params: &ConnectionParams) -> Result<Vec<TableStatus>> {
        let db = self.open(params).await?;
        let outcome = reconciler::reconcile(&db, &self.descriptors, self.scripts.as_ref()).await;
        release(db).await;
        let statuses = outcome?;
        self.advance(InstallStage::SchemaReconciled);
        Ok(statuses)
    }

    /// Lists up to ten existing administrator accounts.
    #[instrument(skip_all)]
    pub async fn list_admins(&self, params: &ConnectionParams) -> Result<Vec<AdminSummary>> {
        let db = self.open(params).await?;
        let outcome = admin::list_administrators(&db).await;
        release(db).await;
        let admins = outcome?;
        self.advance(InstallStage::AdminChecked);
        Ok(admins.into_iter().map(AdminSummary::from).collect())
    }

    /// Creates the initial administrator account.
    #[instrument(skip_all)]
    pub async fn create_admin(
        &self,
        params: &ConnectionParams,
        admin_username: &str,
        admin_password: &str,
    ) -> Result<AdminSummary> {
        let db = self.open(params).await?;
        let outcome = admin::create_administrator(&db, admin_username, admin_password).await;
        release(db).await;
        let created = outcome?;
        self.advance(InstallStage::AdminChecked);
        Ok(AdminSummary::from(created))
    }

    /// Validates that an existing account is an administrator with the given
    /// credentials.
    #[instrument(skip_all)]
    pub async fn validate_admin(
        &self,
        params: &ConnectionParams,
        admin_username: &str,
        admin_password: &str,
    ) -> Result<AdminSummary> {
        let db = self.open(params).await?;
        let outcome = admin::validate_credentials(&db, admin_username, admin_password).await;
        release(db).await;
        let account = outcome?;
        self.advance(InstallStage::AdminChecked);
        Ok(AdminSummary::from(account))
    }

    /// Finishes installation.
    ///
    /// Preconditions, checked in order against fresh state: the database is
    /// reachable, every expected table exists with no missing columns, and at
    /// least one administrator account exists. On success the connection
    /// parameters are persisted durably and the installed flag is set; this
    /// transition is one-way for the process lifetime.
    #[instrument(skip_all)]
    pub async fn finish(&self, params: &ConnectionParams) -> Result<()> {
        let config = InstallationConfig::from_params(params)?;

        let db = self.open(params).await?;
        let outcome = self.finish_preconditions(&db).await;
        release(db).await;
        outcome?;

        self.config_store.persist(&config)?;
        self.flag.mark_installed();
        self.advance(InstallStage::Finished);
        info!("installation finished");
        Ok(())
    }

    async fn finish_preconditions(&self, db: &DatabaseConnection) -> Result<()> {
        let statuses = inspector::inspect(db, &self.descriptors).await?;
        let incomplete: Vec<MissingColumns> = statuses
            .iter()
            .filter(|s| !s.exists || !s.missing_fields.is_empty())
            .map(|s| MissingColumns {
                table: s.name.clone(),
                columns: s.missing_fields.clone(),
            })
            .collect();
        if !incomplete.is_empty() {
            return Err(Error::IncompleteSchema { tables: incomplete });
        }

        if admin::count_administrators(db).await? == 0 {
            return Err(Error::MissingAdmin);
        }

        Ok(())
    }
}

/// Closes a scoped connection, logging instead of failing: the action's own
/// outcome must not be masked by a close error.
async fn release(db: DatabaseConnection) {
    if let Err(err) = db.close().await {
        warn!(error = %err, "failed to close installer database connection");
    }
}
