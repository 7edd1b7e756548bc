//! Data access plumbing for the member table.
//!
//! Provides async PostgreSQL connection pooling using diesel_async with bb8,
//! live schema introspection, statement building and row mapping.

pub mod mapper;
mod pool;
pub mod provider;
pub mod query;
pub mod schema;

pub use mapper::RecordMapper;
pub use pool::{AsyncDbPool, create_pool};
pub use provider::{ConnectionHandle, ConnectionProvider};
pub use query::{QueryBuilder, Statement, is_valid_identifier, quote_ident, validate_identifier};
pub use schema::{Column, ColumnKind, TableSchema};
