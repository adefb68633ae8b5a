//! Read-only comparison of expected descriptors against the live catalog.
//!
//! Status is computed fresh on every call; nothing here mutates the schema.
//! Table and column existence come from the backend's own catalog:
//! `sqlite_master` / `pragma_table_info` on SQLite, `information_schema` on
//! MySQL and Postgres.

use crate::errors::Result;
use crate::schema::descriptor::{EntityDescriptor, TableStatus};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use std::collections::HashSet;
use tracing::debug;

/// Compares every descriptor against the live schema, in input order.
pub async fn inspect<C>(db: &C, descriptors: &[EntityDescriptor]) -> Result<Vec<TableStatus>>
where
    C: ConnectionTrait,
{
    let mut statuses = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        statuses.push(inspect_one(db, descriptor).await?);
    }
    Ok(statuses)
}

/// Compares a single descriptor against the live schema.
pub async fn inspect_one<C>(db: &C, descriptor: &EntityDescriptor) -> Result<TableStatus>
where
    C: ConnectionTrait,
{
    let all_fields: Vec<String> = descriptor
        .fields
        .iter()
        .map(|f| f.storage_name.clone())
        .collect();

    if !table_exists(db, &descriptor.table_name).await? {
        let missing_fields: Vec<String> = descriptor
            .persisted_fields()
            .map(|f| f.storage_name.clone())
            .collect();
        return Ok(TableStatus {
            name: descriptor.table_name.clone(),
            exists: false,
            all_fields,
            missing_fields,
        });
    }

    let live = live_column_names(db, &descriptor.table_name).await?;
    let missing_fields: Vec<String> = descriptor
        .persisted_fields()
        .filter(|f| !live.contains(&f.storage_name))
        .map(|f| f.storage_name.clone())
        .collect();

    debug!(
        table = %descriptor.table_name,
        missing = missing_fields.len(),
        "inspected table"
    );

    Ok(TableStatus {
        name: descriptor.table_name.clone(),
        exists: true,
        all_fields,
        missing_fields,
    })
}

/// Queries the catalog for a table's existence by name.
pub async fn table_exists<C>(db: &C, table: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    let stmt = match backend {
        DatabaseBackend::Sqlite => Statement::from_sql_and_values(
            backend,
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            [table.into()],
        ),
        DatabaseBackend::MySql => Statement::from_sql_and_values(
            backend,
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?",
            [table.into()],
        ),
        DatabaseBackend::Postgres => Statement::from_sql_and_values(
            backend,
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1",
            [table.into()],
        ),
    };

    Ok(db.query_one(stmt).await?.is_some())
}

/// Queries the catalog for a table's live column names.
async fn live_column_names<C>(db: &C, table: &str) -> Result<HashSet<String>>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    let (stmt, column) = match backend {
        DatabaseBackend::Sqlite => (
            Statement::from_sql_and_values(
                backend,
                "SELECT name FROM pragma_table_info(?)",
                [table.into()],
            ),
            "name",
        ),
        DatabaseBackend::MySql => (
            Statement::from_sql_and_values(
                backend,
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_schema = DATABASE() AND table_name = ?",
                [table.into()],
            ),
            "column_name",
        ),
        DatabaseBackend::Postgres => (
            Statement::from_sql_and_values(
                backend,
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = $1",
                [table.into()],
            ),
            "column_name",
        ),
    };

    let rows = db.query_all(stmt).await?;
    let mut names = HashSet::with_capacity(rows.len());
    for row in rows {
        names.insert(row.try_get::<String>("", column)?);
    }
    Ok(names)
}
