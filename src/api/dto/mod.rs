//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `member` - Member envelopes and the bulk request
//! - `health` - Health check response
//! - `error` - Common error response

mod error;
mod health;
mod member;

pub use error::ErrorResponse;
pub use health::HealthResponse;
pub use member::{BulkCreateRequest, BulkCreatedResponse, MemberListResponse, MemberResponse};
