//! Member service for business logic operations.
//!
//! Thin layer over a [`MemberStore`]. Request checks such as empty payloads
//! and the batch limit belong to the store contract, so they run identically
//! whichever store backs the service.

use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{Member, NewMemberRecord, NewMemberRequest};
use crate::repositories::MemberStore;

/// Member service for handling member-related business logic.
///
/// Cloning is cheap since the store is held behind an `Arc`.
#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn MemberStore>,
}

impl MemberService {
    pub fn new(store: Arc<dyn MemberStore>) -> Self {
        Self { store }
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        self.store.list_all().await
    }

    /// The member if found, or `NotFound`.
    pub async fn get_member(&self, id: i64) -> AppResult<Member> {
        self.store.get_by_id(id).await
    }

    pub async fn create_member(&self, request: NewMemberRequest) -> AppResult<Member> {
        self.store.create(request).await
    }

    /// The most recent rows after the insert, as many as were requested.
    pub async fn bulk_create(&self, records: Vec<NewMemberRecord>) -> AppResult<Vec<Member>> {
        self.store.bulk_create(records).await
    }

    /// Whether the store currently accepts statements.
    ///
    /// Failures are logged and reported as `false`.
    pub async fn database_connected(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}
