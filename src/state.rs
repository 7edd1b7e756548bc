//! Application state for Axum web framework.
//!
//! Contains shared services that are accessible across all request handlers.

use std::sync::Arc;

use crate::config::MembersConfig;
use crate::db::ConnectionProvider;
use crate::repositories::{MemberStore, Repositories};
use crate::services::Services;

/// Application state containing all shared services.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since services share their stores through `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
}

impl AppState {
    /// Creates a new AppState backed by PostgreSQL.
    ///
    /// # Arguments
    /// * `provider` - Connection provider over the shared pool
    /// * `members` - Location of the member table and batch limits
    pub fn new(provider: ConnectionProvider, members: &MembersConfig) -> Self {
        let repos = Repositories::new(provider, members.clone());
        Self {
            services: Services::new(repos),
        }
    }

    /// Creates an AppState over an arbitrary member store.
    pub fn from_store(store: Arc<dyn MemberStore>) -> Self {
        Self {
            services: Services::new(Repositories::from_store(store)),
        }
    }
}
