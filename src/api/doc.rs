use utoipa::OpenApi;

pub const MEMBER_TAG: &str = "Members";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Members API",
        description = "CRUD access to the members table",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::models::NewMemberRecord,
        )
    ),
    tags(
        (name = MEMBER_TAG, description = "Member endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
