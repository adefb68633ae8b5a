//! Statically declared entity descriptors.
//!
//! Each descriptor names a table the server expects and the columns it
//! expects in it. The set is declared once at startup and consumed uniformly
//! by the inspector and reconciler; there is no runtime reflection over
//! entity structs.

use serde::Serialize;

/// Storage type of an expected column, mapped per backend at DDL time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// UUID stored as a 36-character string
    Uuid,
    /// Short string, VARCHAR(255)
    String,
    /// Unbounded text
    Text,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInteger,
    /// Boolean
    Boolean,
    /// Timestamp with time zone
    Timestamp,
}

/// A column an entity expects to exist.
///
/// Only persisted ("normal") fields participate in schema comparison;
/// computed fields are part of the entity's model but never of its table.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Logical field name on the entity
    pub name: String,
    /// Column name in storage
    pub storage_name: String,
    /// Storage type used when the reconciler has to create the column
    pub kind: ColumnKind,
    /// Whether the field is backed by a column at all
    pub persisted: bool,
    /// Whether the column is the table's primary key
    pub primary_key: bool,
    /// Whether the column accepts NULL
    pub nullable: bool,
}

impl FieldDescriptor {
    /// Declares a persisted field whose storage name equals its logical name.
    #[must_use]
    pub fn persisted(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            storage_name: name.to_string(),
            kind,
            persisted: true,
            primary_key: false,
            nullable: false,
        }
    }

    /// Declares a computed field with no backing column.
    #[must_use]
    pub fn computed(name: &str) -> Self {
        Self {
            name: name.to_string(),
            storage_name: name.to_string(),
            kind: ColumnKind::Text,
            persisted: false,
            primary_key: false,
            nullable: true,
        }
    }

    /// Overrides the storage name when it differs from the logical name.
    #[must_use]
    pub fn stored_as(mut self, storage_name: &str) -> Self {
        self.storage_name = storage_name.to_string();
        self
    }

    /// Marks the field as the table's primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A table the server expects, with its ordered expected columns.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// Storage name of the table
    pub table_name: String,
    /// Expected fields, in declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    /// Creates a descriptor for `table_name` with the given fields.
    #[must_use]
    pub fn new(table_name: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            table_name: table_name.to_string(),
            fields,
        }
    }

    /// Fields that are backed by a column.
    pub fn persisted_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.persisted)
    }
}

/// Comparison result for one descriptor against the live catalog.
///
/// `missing_fields` is always a subset of `all_fields`; when the table does
/// not exist it contains every persisted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    /// Table storage name
    pub name: String,
    /// Whether the table exists in the live schema
    pub exists: bool,
    /// Storage names of every declared field
    pub all_fields: Vec<String>,
    /// Storage names of persisted fields with no live column
    pub missing_fields: Vec<String>,
}

/// The full set of tables the vault server expects after installation.
///
/// Declared statically, once; table names must be unique across the set
/// (validated when the installer is constructed).
#[must_use]
pub fn expected_entities() -> Vec<EntityDescriptor> {
    vec![
        EntityDescriptor::new(
            "user",
            vec![
                FieldDescriptor::persisted("id", ColumnKind::Uuid).primary_key(),
                FieldDescriptor::persisted("username", ColumnKind::String),
                FieldDescriptor::persisted("password_hash", ColumnKind::String),
                FieldDescriptor::persisted("role", ColumnKind::String),
                FieldDescriptor::persisted("status", ColumnKind::String),
                FieldDescriptor::persisted("storage_quota", ColumnKind::BigInteger),
                FieldDescriptor::persisted("sort_key", ColumnKind::BigInteger),
                FieldDescriptor::persisted("created_at", ColumnKind::Timestamp),
                FieldDescriptor::persisted("updated_at", ColumnKind::Timestamp),
                FieldDescriptor::persisted("last_access_at", ColumnKind::Timestamp),
                // Derived at request time from the matter table, never stored
                FieldDescriptor::computed("space_used"),
            ],
        ),
        EntityDescriptor::new(
            "session",
            vec![
                FieldDescriptor::persisted("id", ColumnKind::Uuid).primary_key(),
                FieldDescriptor::persisted("user_id", ColumnKind::Uuid),
                FieldDescriptor::persisted("ip", ColumnKind::String),
                FieldDescriptor::persisted("expire_at", ColumnKind::Timestamp),
                FieldDescriptor::persisted("created_at", ColumnKind::Timestamp),
            ],
        ),
        EntityDescriptor::new(
            "preference",
            vec![
                FieldDescriptor::persisted("id", ColumnKind::Uuid).primary_key(),
                FieldDescriptor::persisted("name", ColumnKind::String),
                FieldDescriptor::persisted("value", ColumnKind::Text).nullable(),
                FieldDescriptor::persisted("updated_at", ColumnKind::Timestamp),
            ],
        ),
    ]
}
