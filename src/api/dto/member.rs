//! Member envelopes and request bodies.
//!
//! Members are open-shaped (their keys are the table's columns), so the
//! OpenAPI schema describes them as plain objects.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Member, NewMemberRecord};

/// `GET /members` response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberListResponse {
    pub success: bool,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Member>,
    pub count: usize,
}

impl From<Vec<Member>> for MemberListResponse {
    fn from(members: Vec<Member>) -> Self {
        Self {
            success: true,
            count: members.len(),
            data: members,
        }
    }
}

/// Single-member response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub data: Member,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            success: true,
            data: member,
        }
    }
}

/// `POST /members/bulk` request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkCreateRequest {
    #[validate(length(min = 1, message = "at least one member is required"), nested)]
    pub members: Vec<NewMemberRecord>,
}

/// `POST /members/bulk` response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "success": true,
    "message": "2 new members were added",
    "data": [
        {"id": 7, "name": "Kim", "grade": "Manager", "gender": "male", "created_at": "2024-03-01T09:30:00Z"},
        {"id": 8, "name": "Lee", "grade": "Staff", "gender": "female", "created_at": "2024-03-01T09:30:00Z"}
    ]
}))]
pub struct BulkCreatedResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Member>,
}

impl BulkCreatedResponse {
    /// `requested` is the batch size, which may differ from what the
    /// read-back returned.
    pub fn new(requested: usize, members: Vec<Member>) -> Self {
        Self {
            success: true,
            message: format!("{} new members were added", requested),
            data: members,
        }
    }
}
