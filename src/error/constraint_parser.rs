use std::sync::OnceLock;

use diesel::result::DatabaseErrorKind;
use regex::Regex;

/// Utility for turning PostgreSQL rejection messages into short, caller-safe
/// reasons.
///
/// Only the first line of a store message is ever surfaced; `DETAIL` lines may
/// echo other rows' values and are mined for the offending key instead.
pub struct ConstraintParser;

/// Compiled regex patterns for constraint parsing, cached for performance
struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
}

impl RegexPatterns {
    fn new() -> Self {
        Self {
            // Matches "Key (field)=(value)" pattern in PostgreSQL messages
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").expect("valid key/value regex"),
            // Matches column names in quotes
            column_name: Regex::new(r#"column "([^"]+)""#).expect("valid column regex"),
        }
    }
}

static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

impl ConstraintParser {
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(RegexPatterns::new)
    }

    /// Builds a one-line reason for a store rejection.
    ///
    /// # Arguments
    /// * `kind` - Diesel's classification of the database error
    /// * `message` - The full database error message
    /// * `constraint_name` - Violated constraint, when the store reports one
    /// * `column_name` - Offending column, when the store reports one
    pub fn describe(
        kind: &DatabaseErrorKind,
        message: &str,
        constraint_name: Option<&str>,
        column_name: Option<&str>,
    ) -> String {
        let column = column_name
            .map(str::to_string)
            .or_else(|| Self::extract_column_from_message(message));

        match kind {
            DatabaseErrorKind::UniqueViolation => match Self::extract_key_value_from_message(message) {
                Some((field, _)) => format!("a member with the same {} already exists", field),
                None => match constraint_name {
                    Some(name) => format!("unique constraint \"{}\" violated", name),
                    None => "unique constraint violated".to_string(),
                },
            },
            DatabaseErrorKind::NotNullViolation => match column {
                Some(column) => format!("{} is required", column),
                None => "a required field is missing".to_string(),
            },
            DatabaseErrorKind::ForeignKeyViolation => {
                match Self::extract_key_value_from_message(message) {
                    Some((field, value)) => {
                        format!("{} references a missing row (value '{}')", field, value)
                    }
                    None => "foreign key constraint violated".to_string(),
                }
            }
            DatabaseErrorKind::CheckViolation => match constraint_name {
                Some(name) => format!("check constraint \"{}\" failed", name),
                None => "check constraint failed".to_string(),
            },
            _ => Self::first_line(message).to_string(),
        }
    }

    /// Extracts `(field, value)` from a "Key (field)=(value)" detail line.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        Self::patterns()
            .key_value
            .captures(message)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
    }

    /// Extracts a quoted column name, e.g. from
    /// `null value in column "grade" violates not-null constraint`.
    pub fn extract_column_from_message(message: &str) -> Option<String> {
        Self::patterns()
            .column_name
            .captures(message)
            .map(|caps| caps[1].to_string())
    }

    /// The first non-empty line of a store message, without the `DETAIL`/`HINT` tail.
    pub fn first_line(message: &str) -> &str {
        message
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("database error")
    }
}
