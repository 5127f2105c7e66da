use rusqlite::Connection;
use std::env;

use crate::{Error, Result};

/// Environment variable holding the database path
pub const DB_PATH_ENV: &str = "PARCEL_DB_PATH";

/// Database path used when nothing is configured
pub const DEFAULT_DB_PATH: &str = "tracker.db";

const IN_MEMORY_PATH: &str = ":memory:";

/// Schema definition for the SQLite database
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    /// Render the schema as an idempotent DDL batch.
    pub fn to_sql(&self) -> String {
        self.tables
            .iter()
            .map(TableDefinition::to_sql)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    fn to_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ColumnDefinition::to_sql)
            .collect::<Vec<_>>()
            .join(",\n    ");
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.name, columns
        );
        for index in &self.indexes {
            sql.push('\n');
            sql.push_str(&index.to_sql(&self.name));
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
    pub default_value: Option<DefaultValue>,
}

impl ColumnDefinition {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            constraints: Vec::new(),
            default_value: None,
        }
    }

    pub fn with_constraint(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_default(mut self, default_value: DefaultValue) -> Self {
        self.default_value = Some(default_value);
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type.as_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.as_sql());
        }
        if let Some(default_value) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default_value.to_sql());
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Text,
}

impl DataType {
    fn as_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnConstraint {
    PrimaryKey,
    /// Only valid on an `INTEGER PRIMARY KEY` column
    AutoIncrement,
    NotNull,
}

impl ColumnConstraint {
    fn as_sql(self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::AutoIncrement => "AUTOINCREMENT",
            ColumnConstraint::NotNull => "NOT NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    Text(String),
}

impl DefaultValue {
    fn to_sql(&self) -> String {
        match self {
            DefaultValue::Text(value) => format!("'{}'", value.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexDefinition {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }

    fn to_sql(&self, table: &str) -> String {
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {}({});",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            table,
            self.columns.join(", ")
        )
    }
}

/// The `parcel` table.
///
/// `number` is an autoincrement rowid so identifiers of deleted parcels are
/// never handed out again.
pub fn parcel_schema() -> Schema {
    Schema::new().add_table(
        TableDefinition::new("parcel")
            .with_column(
                ColumnDefinition::new("number", DataType::Integer)
                    .with_constraint(ColumnConstraint::PrimaryKey)
                    .with_constraint(ColumnConstraint::AutoIncrement),
            )
            .with_column(
                ColumnDefinition::new("client", DataType::Integer)
                    .with_constraint(ColumnConstraint::NotNull),
            )
            .with_column(
                ColumnDefinition::new("status", DataType::Text)
                    .with_constraint(ColumnConstraint::NotNull)
                    .with_default(DefaultValue::Text("registered".to_string())),
            )
            .with_column(
                ColumnDefinition::new("address", DataType::Text)
                    .with_constraint(ColumnConstraint::NotNull),
            )
            .with_column(
                ColumnDefinition::new("created_at", DataType::Text)
                    .with_constraint(ColumnConstraint::NotNull),
            )
            .with_index(IndexDefinition::new("idx_parcel_client", &["client"])),
    )
}

/// SQLite configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteConfig {
    /// Path to the SQLite database file, or `:memory:`
    pub db_path: String,
    /// Schema applied when the database is opened
    pub schema: Schema,
}

impl SqliteConfig {
    /// Create a new SQLite config with path and schema
    pub fn new(db_path: impl Into<String>, schema: Schema) -> Self {
        Self {
            db_path: db_path.into(),
            schema,
        }
    }

    /// In-memory database with the parcel schema
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_PATH, parcel_schema())
    }

    /// Read the database path from `PARCEL_DB_PATH`, falling back to
    /// `tracker.db`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_value(env::var(DB_PATH_ENV))
    }

    /// Build a config from an already read `PARCEL_DB_PATH` lookup.
    pub fn from_env_value(value: std::result::Result<String, env::VarError>) -> Result<Self> {
        let db_path = match value {
            Ok(path) => path,
            Err(env::VarError::NotPresent) => DEFAULT_DB_PATH.to_string(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(Error::config(format!("{DB_PATH_ENV} is not valid UTF-8")))
            }
        };
        let config = Self::new(db_path, parcel_schema());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.db_path.trim().is_empty() {
            return Err(Error::config("database path cannot be empty"));
        }
        if self.schema.tables.is_empty() {
            return Err(Error::config("schema has no tables"));
        }
        Ok(())
    }

    fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY_PATH
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH, parcel_schema())
    }
}

/// Open the configured database and apply its schema.
///
/// The caller owns the returned connection and decides when to close it.
pub fn open(config: &SqliteConfig) -> Result<Connection> {
    config.validate()?;
    tracing::info!("opening sqlite database at path: {}", config.db_path);

    let opened = if config.is_in_memory() {
        Connection::open_in_memory()
    } else {
        Connection::open(&config.db_path)
    };
    let conn = opened.map_err(|source| Error::Open {
        path: config.db_path.clone(),
        source,
    })?;

    initialize_schema(&conn, &config.schema)?;
    Ok(conn)
}

/// Apply `schema` to `conn`. Safe to run against an existing database.
pub fn initialize_schema(conn: &Connection, schema: &Schema) -> Result<()> {
    let sql = schema.to_sql();
    tracing::debug!("initializing schema:\n{}", sql);
    conn.execute_batch(&sql)?;
    tracing::info!("schema ready ({} tables)", schema.tables.len());
    Ok(())
}
