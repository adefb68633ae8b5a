//! Additive-only schema reconciliation.
//!
//! For each descriptor in order: create the table if it is absent, otherwise
//! add each missing persisted column. Existing tables, rows and column types
//! are never touched, so a descriptor whose table already matches is a no-op
//! and the whole operation is safe to repeat. Reconciliation is sequential
//! and not transactional across descriptors: a DDL failure aborts the failing
//! descriptor and surfaces it, while earlier descriptors stay reconciled.

use crate::errors::{Error, Result};
use crate::schema::descriptor::{ColumnKind, EntityDescriptor, FieldDescriptor, TableStatus};
use crate::schema::inspector;
use crate::schema::scripts::ScriptCatalog;
use sea_orm::sea_query::{Alias, ColumnDef, Table};
use sea_orm::{ConnectionTrait, Statement};
use tracing::{debug, info};

/// Brings the live schema in line with the descriptors and returns the
/// post-reconciliation status for each, in input order.
///
/// When a script catalog is supplied, table creation runs the raw script for
/// that table (and a missing script is fatal for that descriptor); without a
/// catalog the descriptor's own field list drives `CREATE TABLE`.
pub async fn reconcile<C>(
    db: &C,
    descriptors: &[EntityDescriptor],
    scripts: Option<&ScriptCatalog>,
) -> Result<Vec<TableStatus>>
where
    C: ConnectionTrait,
{
    for descriptor in descriptors {
        let status = inspector::inspect_one(db, descriptor).await?;
        if !status.exists {
            create_table(db, descriptor, scripts).await?;
            info!(table = %descriptor.table_name, "created table");

            // A stale creation script may declare fewer columns than the
            // descriptor; top the fresh table up in the same pass.
            let created = inspector::inspect_one(db, descriptor).await?;
            if !created.missing_fields.is_empty() {
                add_missing_columns(db, descriptor, &created.missing_fields).await?;
                info!(
                    table = %descriptor.table_name,
                    columns = created.missing_fields.len(),
                    "added columns absent from creation script"
                );
            }
        } else if !status.missing_fields.is_empty() {
            add_missing_columns(db, descriptor, &status.missing_fields).await?;
            info!(
                table = %descriptor.table_name,
                columns = status.missing_fields.len(),
                "added missing columns"
            );
        } else {
            debug!(table = %descriptor.table_name, "table already complete");
        }
    }

    // Re-derive status so callers can confirm success without a second call.
    inspector::inspect(db, descriptors).await
}

async fn create_table<C>(
    db: &C,
    descriptor: &EntityDescriptor,
    scripts: Option<&ScriptCatalog>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();

    let stmt = match scripts {
        Some(catalog) => {
            let script = catalog.create_script(&descriptor.table_name)?;
            Statement::from_string(backend, script)
        }
        None => {
            let mut create = Table::create();
            create
                .table(Alias::new(descriptor.table_name.as_str()))
                .if_not_exists();
            for field in descriptor.persisted_fields() {
                create.col(column_def(field, false));
            }
            backend.build(&create)
        }
    };

    db.execute(stmt).await.map_err(|source| Error::Reconciliation {
        table: descriptor.table_name.clone(),
        source,
    })?;
    Ok(())
}

async fn add_missing_columns<C>(
    db: &C,
    descriptor: &EntityDescriptor,
    missing: &[String],
) -> Result<()>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();

    for storage_name in missing {
        let Some(field) = descriptor
            .persisted_fields()
            .find(|f| &f.storage_name == storage_name)
        else {
            continue;
        };

        let mut alter = Table::alter();
        alter
            .table(Alias::new(descriptor.table_name.as_str()))
            .add_column(column_def(field, true));

        db.execute(backend.build(&alter))
            .await
            .map_err(|source| Error::Reconciliation {
                table: descriptor.table_name.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Builds the column definition for a field. Columns added to an existing
/// table are forced nullable so rows already present stay valid.
fn column_def(field: &FieldDescriptor, for_alter: bool) -> ColumnDef {
    let mut def = ColumnDef::new(Alias::new(field.storage_name.as_str()));
    match field.kind {
        ColumnKind::Uuid => def.string_len(36),
        ColumnKind::String => def.string_len(255),
        ColumnKind::Text => def.text(),
        ColumnKind::Integer => def.integer(),
        ColumnKind::BigInteger => def.big_integer(),
        ColumnKind::Boolean => def.boolean(),
        ColumnKind::Timestamp => def.timestamp_with_time_zone(),
    };

    if field.primary_key && !for_alter {
        def.primary_key();
    }
    if field.nullable || for_alter {
        def.null();
    } else {
        def.not_null();
    }
    def
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::schema::descriptor::ColumnKind;
    use crate::test_utils::{raw_sql, setup_empty_db};
    use std::fs;

    fn user_descriptor() -> EntityDescriptor {
        EntityDescriptor::new(
            "user",
            vec![
                FieldDescriptor::persisted("id", ColumnKind::Uuid).primary_key(),
                FieldDescriptor::persisted("username", ColumnKind::String),
                FieldDescriptor::persisted("sort", ColumnKind::BigInteger),
            ],
        )
    }

    #[tokio::test]
    async fn creates_absent_table_from_descriptor() -> Result<()> {
        let db = setup_empty_db().await?;

        let statuses = reconcile(&db, &[user_descriptor()], None).await?;

        assert!(statuses[0].exists);
        assert!(statuses[0].missing_fields.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn adds_only_missing_columns_and_preserves_rows() -> Result<()> {
        let db = setup_empty_db().await?;
        raw_sql(&db, "CREATE TABLE \"user\" (id varchar(36) PRIMARY KEY, username varchar(255))")
            .await?;
        raw_sql(&db, "INSERT INTO \"user\" (id, username) VALUES ('u1', 'root')").await?;

        let statuses = reconcile(&db, &[user_descriptor()], None).await?;
        assert!(statuses[0].missing_fields.is_empty());

        // The pre-existing row and its column data are untouched
        let row = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                "SELECT username FROM \"user\" WHERE id = 'u1'".to_string(),
            ))
            .await?
            .unwrap();
        assert_eq!(row.try_get::<String>("", "username")?, "root");
        Ok(())
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() -> Result<()> {
        let db = setup_empty_db().await?;
        let descriptors = [user_descriptor()];

        let first = reconcile(&db, &descriptors, None).await?;
        let second = reconcile(&db, &descriptors, None).await?;

        assert_eq!(first, second);
        assert!(second[0].missing_fields.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn uses_creation_script_when_catalog_is_configured() -> Result<()> {
        let db = setup_empty_db().await?;
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("user.sql"),
            "CREATE TABLE \"user\" (id varchar(36) PRIMARY KEY, username varchar(255), sort bigint)",
        )
        .unwrap();
        let catalog = ScriptCatalog::new(dir.path(), dir.path().join("dev"));

        let statuses = reconcile(&db, &[user_descriptor()], Some(&catalog)).await?;
        assert!(statuses[0].exists);
        assert!(statuses[0].missing_fields.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn stale_script_is_topped_up_in_the_same_pass() -> Result<()> {
        let db = setup_empty_db().await?;
        let dir = tempfile::tempdir().unwrap();
        // Script predates the "sort" column.
        fs::write(
            dir.path().join("user.sql"),
            "CREATE TABLE \"user\" (id varchar(36) PRIMARY KEY, username varchar(255))",
        )
        .unwrap();
        let catalog = ScriptCatalog::new(dir.path(), dir.path().join("dev"));

        let statuses = reconcile(&db, &[user_descriptor()], Some(&catalog)).await?;
        assert!(statuses[0].exists);
        assert!(statuses[0].missing_fields.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_script_aborts_that_descriptor() -> Result<()> {
        let db = setup_empty_db().await?;
        let dir = tempfile::tempdir().unwrap();
        let catalog = ScriptCatalog::new(dir.path(), dir.path().join("dev"));

        let err = reconcile(&db, &[user_descriptor()], Some(&catalog))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingScript { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn failure_leaves_earlier_descriptors_reconciled() -> Result<()> {
        let db = setup_empty_db().await?;
        let dir = tempfile::tempdir().unwrap();
        // Script for the first table only; the second descriptor fails.
        fs::write(
            dir.path().join("user.sql"),
            "CREATE TABLE \"user\" (id varchar(36) PRIMARY KEY, username varchar(255), sort bigint)",
        )
        .unwrap();
        let catalog = ScriptCatalog::new(dir.path(), dir.path().join("dev"));

        let descriptors = [
            user_descriptor(),
            EntityDescriptor::new(
                "preference",
                vec![FieldDescriptor::persisted("id", ColumnKind::Uuid).primary_key()],
            ),
        ];

        let err = reconcile(&db, &descriptors, Some(&catalog)).await.unwrap_err();
        assert!(matches!(err, Error::MissingScript { .. }));

        // The first table was created and stays created
        assert!(inspector::table_exists(&db, "user").await?);
        assert!(!inspector::table_exists(&db, "preference").await?);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_script_surfaces_reconciliation_error() -> Result<()> {
        let db = setup_empty_db().await?;
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("user.sql"), "CREATE TABL broken (").unwrap();
        let catalog = ScriptCatalog::new(dir.path(), dir.path().join("dev"));

        let err = reconcile(&db, &[user_descriptor()], Some(&catalog))
            .await
            .unwrap_err();
        match err {
            Error::Reconciliation { table, source: _ } => assert_eq!(table, "user"),
            other => panic!("expected Reconciliation, got {other:?}"),
        }
        Ok(())
    }
}
