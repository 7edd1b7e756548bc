//! Repository layer for data access operations.
//!
//! Provides async CRUD operations for the member table.

mod member_repo;

pub use member_repo::{MemberRepository, MemberStore};

use std::sync::Arc;

use crate::config::MembersConfig;
use crate::db::ConnectionProvider;

/// Aggregates all repositories for convenient access.
///
/// Stores are held behind `Arc<dyn MemberStore>` so tests can substitute an
/// in-memory implementation. Cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub members: Arc<dyn MemberStore>,
}

impl Repositories {
    /// Creates the PostgreSQL-backed repositories.
    ///
    /// # Arguments
    /// * `provider` - Connection provider over the shared pool
    /// * `table` - Location of the member table
    pub fn new(provider: ConnectionProvider, table: MembersConfig) -> Self {
        Self {
            members: Arc::new(MemberRepository::new(provider, table)),
        }
    }

    /// Wraps an existing store.
    pub fn from_store(members: Arc<dyn MemberStore>) -> Self {
        Self { members }
    }
}
