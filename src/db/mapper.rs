//! Row-to-member conversion.

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use serde_json::Value;

use crate::db::schema::{Column, ColumnKind, TableSchema};
use crate::error::{AppError, AppResult};
use crate::models::{FieldMap, Member, MemberValue};

/// Zips each row's values with the table's column names, in column order.
///
/// A row whose shape disagrees with the schema means the store returned a
/// malformed result; that is reported as [`AppError::Internal`] and ends the
/// operation.
pub struct RecordMapper;

impl RecordMapper {
    pub fn map_rows(schema: &TableSchema, rows: Vec<Value>) -> AppResult<Vec<Member>> {
        rows.into_iter()
            .map(|row| Self::map_row(schema, row))
            .collect()
    }

    /// Single-record form: no row maps to `None`.
    pub fn map_optional(schema: &TableSchema, rows: Vec<Value>) -> AppResult<Option<Member>> {
        rows.into_iter()
            .next()
            .map(|row| Self::map_row(schema, row))
            .transpose()
    }

    pub fn map_row(schema: &TableSchema, row: Value) -> AppResult<Member> {
        let Value::Array(values) = row else {
            return Err(invariant_violation(format!(
                "expected a JSON array row, got {}",
                json_type(&row)
            )));
        };

        let columns = schema.columns();
        if values.len() != columns.len() {
            return Err(invariant_violation(format!(
                "row has {} values but table has {} columns",
                values.len(),
                columns.len()
            )));
        }

        let mut fields = FieldMap::new();
        for (column, value) in columns.iter().zip(values) {
            fields.insert(column.name.clone(), Self::convert(column, value)?);
        }
        Ok(Member::new(fields))
    }

    fn convert(column: &Column, value: Value) -> AppResult<MemberValue> {
        if value.is_null() {
            return Ok(MemberValue::Null);
        }

        let converted = match (column.kind, value) {
            (ColumnKind::Integer, Value::Number(n)) => n.as_i64().map(MemberValue::Integer),
            (ColumnKind::Boolean, Value::Bool(b)) => Some(MemberValue::Boolean(b)),
            (ColumnKind::Text, Value::String(s)) => Some(MemberValue::Text(s)),
            (ColumnKind::Timestamp, Value::String(s)) => {
                s.parse::<Timestamp>().ok().map(MemberValue::Timestamp)
            }
            (ColumnKind::NaiveTimestamp, Value::String(s)) => s
                .parse::<DateTime>()
                .ok()
                .and_then(|dt| dt.to_zoned(TimeZone::UTC).ok())
                .map(|zoned| MemberValue::Timestamp(zoned.timestamp())),
            // Selected as `::text`, so the store's own rendering arrives here
            (ColumnKind::Other, Value::String(s)) => Some(MemberValue::Text(s)),
            (kind, other) => {
                return Err(invariant_violation(format!(
                    "column \"{}\" ({:?}) holds unexpected {}",
                    column.name,
                    kind,
                    json_type(&other)
                )));
            }
        };

        converted.ok_or_else(|| {
            invariant_violation(format!(
                "column \"{}\" holds a value that cannot be read as {:?}",
                column.name, column.kind
            ))
        })
    }
}

fn invariant_violation(message: String) -> AppError {
    tracing::error!(reason = %message, "Malformed result from store");
    AppError::internal(message)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
