//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories and handlers.

mod member_service;

pub use member_service::MemberService;

use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since stores are shared through `Arc`.
#[derive(Clone)]
pub struct Services {
    pub members: MemberService,
}

impl Services {
    /// Creates a new Services instance from Repositories.
    pub fn new(repos: Repositories) -> Self {
        Self {
            members: MemberService::new(repos.members),
        }
    }
}
