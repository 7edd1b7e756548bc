//! Live column list of the member table.
//!
//! Every statement is built against the columns the store reports at query
//! time. The same list is the allow-list for caller-supplied field names.

use diesel::QueryableByName;
use diesel::sql_types::Text;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::{AppError, AppResult, DatabaseErrorConverter};

/// `json_build_array` accepts at most this many arguments.
pub const MAX_COLUMNS: usize = 100;

const COLUMNS_QUERY: &str = "SELECT column_name::text AS column_name, \
     data_type::text AS data_type, \
     udt_schema::text AS udt_schema, \
     udt_name::text AS udt_name \
     FROM information_schema.columns \
     WHERE table_schema::text = $1 AND table_name::text = $2 \
     ORDER BY ordinal_position";

/// How a column's JSON rendering maps onto a member value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    Boolean,
    /// `timestamp with time zone`
    Timestamp,
    /// `timestamp without time zone`, read as UTC
    NaiveTimestamp,
    Other,
}

impl ColumnKind {
    /// Classifies an `information_schema.columns.data_type` value.
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type {
            "smallint" | "integer" | "bigint" => ColumnKind::Integer,
            "boolean" => ColumnKind::Boolean,
            "timestamp with time zone" => ColumnKind::Timestamp,
            "timestamp without time zone" => ColumnKind::NaiveTimestamp,
            "text" | "character varying" | "character" => ColumnKind::Text,
            _ => ColumnKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    /// Schema of the column's underlying type, e.g. `pg_catalog`
    pub udt_schema: String,
    /// Underlying type name, e.g. `int8` or `varchar`
    pub udt_name: String,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        data_type: &str,
        udt_schema: impl Into<String>,
        udt_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::from_data_type(data_type),
            udt_schema: udt_schema.into(),
            udt_name: udt_name.into(),
        }
    }
}

#[derive(QueryableByName)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
    #[diesel(sql_type = Text)]
    udt_schema: String,
    #[diesel(sql_type = Text)]
    udt_name: String,
}

/// Columns of one table in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    schema: String,
    table: String,
    columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(schema: impl Into<String>, table: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            columns,
        }
    }

    /// Reads the table's columns from `information_schema`.
    ///
    /// A table with no visible columns is reported as missing.
    pub async fn load(conn: &mut AsyncPgConnection, schema: &str, table: &str) -> AppResult<Self> {
        let rows: Vec<ColumnRow> = diesel::sql_query(COLUMNS_QUERY)
            .bind::<Text, _>(schema)
            .bind::<Text, _>(table)
            .load(conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "load table schema"))?;

        if rows.is_empty() {
            return Err(AppError::query(
                "load table schema",
                format!("table \"{}\".\"{}\" does not exist", schema, table),
            ));
        }

        if rows.len() > MAX_COLUMNS {
            return Err(AppError::query(
                "load table schema",
                format!(
                    "table \"{}\".\"{}\" has {} columns; at most {} are supported",
                    schema,
                    table,
                    rows.len(),
                    MAX_COLUMNS
                ),
            ));
        }

        let columns = rows
            .into_iter()
            .map(|row| Column::new(row.column_name, &row.data_type, row.udt_schema, row.udt_name))
            .collect();

        Ok(Self::new(schema, table, columns))
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Looks up a caller-supplied field name, rejecting names the table lacks.
    pub fn require_column(&self, name: &str) -> AppResult<&Column> {
        self.column(name)
            .ok_or_else(|| AppError::validation(name, format!("unknown column '{}'", name)))
    }
}
