//! Member request handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::MEMBER_TAG;
use crate::api::dto::{
    BulkCreateRequest, BulkCreatedResponse, ErrorResponse, MemberListResponse, MemberResponse,
};
use crate::error::{AppError, AppResult};
use crate::models::{ID_FIELD, NewMemberRequest};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Creates member-related routes.
///
/// Routes:
/// - GET  /members       - List all members
/// - POST /members       - Create a member
/// - POST /members/bulk  - Create several members
/// - GET  /members/{id}  - Get member by ID
pub fn member_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_members, create_member))
        .routes(routes!(bulk_create_members))
        .routes(routes!(get_member))
}

/// GET /members - List all members
#[utoipa::path(
    get,
    path = "/members",
    tag = MEMBER_TAG,
    responses(
        (status = 200, description = "All members", body = MemberListResponse),
        (status = 500, description = "Store unavailable or query failed", body = ErrorResponse)
    )
)]
async fn list_members(State(state): State<AppState>) -> AppResult<Json<MemberListResponse>> {
    let members = state.services.members.list_members().await?;
    Ok(Json(MemberListResponse::from(members)))
}

/// GET /members/{id} - Get member by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = MEMBER_TAG,
    params(
        ("id" = i64, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member found", body = MemberResponse),
        (status = 404, description = "No member with this ID, including non-integer IDs", body = ErrorResponse)
    )
)]
async fn get_member(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<MemberResponse>> {
    // Only integer IDs name a member; anything else is an unknown resource.
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| AppError::not_found("member", ID_FIELD, &raw_id))?;
    let member = state.services.members.get_member(id).await?;
    Ok(Json(MemberResponse::from(member)))
}

/// POST /members - Create a member
///
/// The body maps column names to values; unknown columns are rejected.
#[utoipa::path(
    post,
    path = "/members",
    tag = MEMBER_TAG,
    request_body(
        content = Object,
        description = "Column values for the new member",
        example = json!({"name": "Kim", "grade": "Manager", "gender": "male"})
    ),
    responses(
        (status = 201, description = "Member created", body = MemberResponse),
        (status = 400, description = "Missing, empty or invalid body", body = ErrorResponse),
        (status = 500, description = "Store rejected the member", body = ErrorResponse)
    )
)]
async fn create_member(
    State(state): State<AppState>,
    payload: Result<Json<NewMemberRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MemberResponse>)> {
    let Json(request) = payload?;
    let member = state.services.members.create_member(request).await?;
    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

/// POST /members/bulk - Create several members at once
///
/// The response lists the most recently created members, which under
/// concurrent inserts may include rows from other requests.
#[utoipa::path(
    post,
    path = "/members/bulk",
    tag = MEMBER_TAG,
    request_body = BulkCreateRequest,
    responses(
        (status = 201, description = "Members created", body = BulkCreatedResponse),
        (status = 400, description = "Invalid batch", body = ErrorResponse),
        (status = 500, description = "Store rejected the batch", body = ErrorResponse)
    )
)]
async fn bulk_create_members(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<BulkCreateRequest>,
) -> AppResult<(StatusCode, Json<BulkCreatedResponse>)> {
    let requested = request.members.len();
    let members = state.services.members.bulk_create(request.members).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkCreatedResponse::new(requested, members)),
    ))
}
