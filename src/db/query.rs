//! Parameterized statements over the member table.
//!
//! Identifiers come from the live schema and are always quoted; values are
//! always bound as text parameters and cast by the store to the column type.

use std::fmt::Write as _;
use std::sync::OnceLock;

use diesel::QueryableByName;
use diesel::pg::Pg;
use diesel::query_builder::{AstPass, Query, QueryFragment, QueryId};
use diesel::result::QueryResult;
use diesel::sql_types::{Json, Nullable, Text, Untyped};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use regex::Regex;

use crate::db::schema::{Column, ColumnKind, TableSchema};
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{FieldMap, ID_FIELD, NewMemberRecord};

/// PostgreSQL truncates identifiers longer than this many bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Column alias carrying each row's JSON array.
const ROW_ALIAS: &str = "member_row";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

/// Whether `name` is a plain SQL identifier that needs no escaping.
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && identifier_pattern().is_match(name)
}

/// Rejects field names that are not plain identifiers.
pub fn validate_identifier(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::validation("fields", "field names must not be empty"));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(AppError::validation(
            name,
            format!("field name exceeds {} bytes", MAX_IDENTIFIER_LEN),
        ));
    }
    if !identifier_pattern().is_match(name) {
        return Err(AppError::validation(
            name,
            "field names may only contain letters, digits and underscores",
        ));
    }
    Ok(())
}

/// Double-quotes an identifier, doubling any embedded quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Sql(String),
    Bind(Option<String>),
}

/// A statement with its bound parameters.
///
/// Rendered by diesel with `$1..$n` placeholders in bind order; the parameters
/// travel separately from the SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statement {
    parts: Vec<Part>,
}

impl Statement {
    fn push_sql(&mut self, sql: &str) -> &mut Self {
        match self.parts.last_mut() {
            Some(Part::Sql(existing)) => existing.push_str(sql),
            _ => self.parts.push(Part::Sql(sql.to_string())),
        }
        self
    }

    fn push_bind(&mut self, value: Option<String>) -> &mut Self {
        self.parts.push(Part::Bind(value));
        self
    }

    /// Pushes `CAST($n AS "udt_schema"."udt_name")` for a value bound to `column`.
    fn push_cast_bind(&mut self, column: &Column, value: Option<String>) -> &mut Self {
        self.push_sql("CAST(");
        self.push_bind(value);
        let cast = format!(
            " AS {}.{})",
            quote_ident(&column.udt_schema),
            quote_ident(&column.udt_name)
        );
        self.push_sql(&cast)
    }

    /// SQL text with `$n` placeholders, as sent to the store.
    pub fn sql(&self) -> String {
        let mut sql = String::new();
        let mut index = 0;
        for part in &self.parts {
            match part {
                Part::Sql(text) => sql.push_str(text),
                Part::Bind(_) => {
                    index += 1;
                    let _ = write!(sql, "${}", index);
                }
            }
        }
        sql
    }

    /// Bound parameters in placeholder order; `None` is SQL `NULL`.
    pub fn params(&self) -> Vec<Option<&str>> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Bind(value) => Some(value.as_deref()),
                Part::Sql(_) => None,
            })
            .collect()
    }

    /// Runs a row-returning statement, yielding each row's JSON array.
    pub async fn fetch_rows(
        self,
        conn: &mut AsyncPgConnection,
        operation: &str,
    ) -> AppResult<Vec<serde_json::Value>> {
        let rows: Vec<JsonRow> = RunQueryDsl::load(self, conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, operation))?;
        Ok(rows.into_iter().map(|row| row.member_row).collect())
    }

    /// Runs a statement that returns no rows, yielding the affected row count.
    pub async fn run(self, conn: &mut AsyncPgConnection, operation: &str) -> AppResult<usize> {
        RunQueryDsl::execute(self, conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, operation))
    }
}

impl QueryFragment<Pg> for Statement {
    fn walk_ast<'b>(&'b self, mut out: AstPass<'_, 'b, Pg>) -> QueryResult<()> {
        // Shapes vary per column set; keep them out of the prepared statement cache.
        out.unsafe_to_cache_prepared();
        for part in &self.parts {
            match part {
                Part::Sql(sql) => out.push_sql(sql),
                Part::Bind(value) => out.push_bind_param::<Nullable<Text>, _>(value)?,
            }
        }
        Ok(())
    }
}

impl QueryId for Statement {
    type QueryId = ();
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl Query for Statement {
    type SqlType = Untyped;
}

#[derive(QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = Json)]
    member_row: serde_json::Value,
}

/// Builds statements for one table from its live column list.
pub struct QueryBuilder<'a> {
    schema: &'a TableSchema,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a TableSchema) -> Self {
        Self { schema }
    }

    fn table(&self) -> String {
        format!(
            "{}.{}",
            quote_ident(self.schema.schema_name()),
            quote_ident(self.schema.table_name())
        )
    }

    /// `json_build_array("c1", "c2", ...)` over every column in ordinal order.
    ///
    /// Columns without a native member type are read as `"c"::text`, so values
    /// such as `numeric` keep the store's exact rendering.
    fn row_expression(&self) -> String {
        let columns: Vec<String> = self
            .schema
            .columns()
            .iter()
            .map(|column| match column.kind {
                ColumnKind::Other => format!("{}::text", quote_ident(&column.name)),
                _ => quote_ident(&column.name),
            })
            .collect();
        format!("json_build_array({})", columns.join(", "))
    }

    fn select_prefix(&self) -> String {
        format!(
            "SELECT {} AS {} FROM {}",
            self.row_expression(),
            quote_ident(ROW_ALIAS),
            self.table()
        )
    }

    /// Every row, no parameters.
    pub fn select_all(&self) -> Statement {
        let mut statement = Statement::default();
        statement.push_sql(&self.select_prefix());
        statement
    }

    /// The row whose `id` equals the bound parameter.
    pub fn select_by_id(&self, id: i64) -> AppResult<Statement> {
        self.schema.column(ID_FIELD).ok_or_else(|| {
            AppError::query(
                "find member",
                format!("table has no \"{}\" column", ID_FIELD),
            )
        })?;

        let mut statement = Statement::default();
        statement
            .push_sql(&self.select_prefix())
            .push_sql(&format!(" WHERE {} = CAST(", quote_ident(ID_FIELD)))
            .push_bind(Some(id.to_string()))
            .push_sql(" AS bigint)");
        Ok(statement)
    }

    /// Inserts the given fields and returns the stored row.
    ///
    /// Field names must be plain identifiers naming columns of the table.
    pub fn insert(&self, fields: &FieldMap) -> AppResult<Statement> {
        if fields.is_empty() {
            return Err(AppError::validation(
                "fields",
                "at least one field is required",
            ));
        }

        let mut targets = Vec::with_capacity(fields.len());
        for (name, value) in fields.iter() {
            validate_identifier(name)?;
            let column = self.schema.require_column(name)?;
            targets.push((column, value.to_bind_text()));
        }

        let column_list: Vec<String> = targets.iter().map(|(c, _)| quote_ident(&c.name)).collect();

        let mut statement = Statement::default();
        statement.push_sql(&format!(
            "INSERT INTO {} ({}) VALUES (",
            self.table(),
            column_list.join(", ")
        ));
        for (index, (column, value)) in targets.into_iter().enumerate() {
            if index > 0 {
                statement.push_sql(", ");
            }
            statement.push_cast_bind(column, value);
        }
        statement.push_sql(&format!(
            ") RETURNING {} AS {}",
            self.row_expression(),
            quote_ident(ROW_ALIAS)
        ));
        Ok(statement)
    }

    /// Inserts every record in one statement with `timestamp_column` set to `NOW()`.
    ///
    /// Returns no rows; reading the batch back is a separate statement.
    pub fn bulk_insert(
        &self,
        records: &[NewMemberRecord],
        timestamp_column: &str,
    ) -> AppResult<Statement> {
        if records.is_empty() {
            return Err(AppError::validation(
                "members",
                "at least one member is required",
            ));
        }

        let columns = NewMemberRecord::COLUMNS
            .iter()
            .map(|name| self.require_table_column(name))
            .collect::<AppResult<Vec<&Column>>>()?;
        let timestamp = self.require_table_column(timestamp_column)?;

        let mut column_list: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
        column_list.push(quote_ident(&timestamp.name));

        let mut statement = Statement::default();
        statement.push_sql(&format!(
            "INSERT INTO {} ({}) VALUES ",
            self.table(),
            column_list.join(", ")
        ));
        for (row, record) in records.iter().enumerate() {
            statement.push_sql(if row == 0 { "(" } else { ", (" });
            for (column, value) in columns.iter().zip(record.values()) {
                statement.push_cast_bind(column, Some(value.to_string()));
                statement.push_sql(", ");
            }
            statement.push_sql("NOW())");
        }
        Ok(statement)
    }

    /// The `limit` most recent rows by `timestamp_column`, newest first.
    pub fn select_recent(&self, timestamp_column: &str, limit: usize) -> AppResult<Statement> {
        let timestamp = self.require_table_column(timestamp_column)?;

        let mut statement = Statement::default();
        statement
            .push_sql(&self.select_prefix())
            .push_sql(&format!(
                " ORDER BY {} DESC LIMIT CAST(",
                quote_ident(&timestamp.name)
            ))
            .push_bind(Some(limit.to_string()))
            .push_sql(" AS bigint)");
        Ok(statement)
    }

    /// Columns named by configuration rather than by the caller; a missing one
    /// is a store/config mismatch, not a bad request.
    fn require_table_column(&self, name: &str) -> AppResult<&'a Column> {
        self.schema.column(name).ok_or_else(|| {
            AppError::query(
                "build statement",
                format!(
                    "column \"{}\" does not exist in {}",
                    name,
                    self.schema.table_name()
                ),
            )
        })
    }
}
