//! HTTP-level tests against an in-memory member store.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use jiff::Timestamp;
use serde_json::{Value, json};
use tower::ServiceExt;

use members_api::api::routes::create_router;
use members_api::error::{AppError, AppResult};
use members_api::models::{
    FieldMap, ID_FIELD, Member, MemberValue, NewMemberRecord, NewMemberRequest,
};
use members_api::repositories::MemberStore;
use members_api::state::AppState;

const COLUMNS: [&str; 5] = ["id", "name", "grade", "gender", "created_at"];

/// Largest batch the in-memory store accepts.
const MAX_BATCH_SIZE: usize = 3;

/// Behaves like a members table with the usual five columns, enforcing the
/// same request checks as the PostgreSQL repository.
#[derive(Default)]
struct InMemoryStore {
    rows: Mutex<Vec<Member>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    fn offline() -> Self {
        let store = Self::default();
        store.offline.store(true, Ordering::SeqCst);
        store
    }

    fn check_online(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Connection {
                source: anyhow::anyhow!("connection refused"),
            });
        }
        Ok(())
    }

    fn insert(&self, values: &FieldMap) -> Member {
        let mut rows = self.rows.lock().unwrap();
        let mut fields = FieldMap::new();
        for column in COLUMNS {
            let value = match column {
                ID_FIELD => MemberValue::Integer(rows.len() as i64 + 1),
                "created_at" => MemberValue::Timestamp(Timestamp::now()),
                _ => values.get(column).cloned().unwrap_or(MemberValue::Null),
            };
            fields.insert(column, value);
        }
        let member = Member::new(fields);
        rows.push(member.clone());
        member
    }
}

#[async_trait]
impl MemberStore for InMemoryStore {
    async fn list_all(&self) -> AppResult<Vec<Member>> {
        self.check_online()?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Member> {
        self.check_online()?;
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id() == Some(id))
            .cloned()
            .ok_or_else(|| AppError::not_found("member", ID_FIELD, id))
    }

    async fn create(&self, request: NewMemberRequest) -> AppResult<Member> {
        if request.is_empty() {
            return Err(AppError::validation("fields", "at least one field is required"));
        }
        self.check_online()?;
        if let Some(unknown) = request.fields().names().find(|n| !COLUMNS.contains(n)) {
            return Err(AppError::validation(
                unknown,
                format!("unknown column '{}'", unknown),
            ));
        }
        Ok(self.insert(request.fields()))
    }

    async fn bulk_create(&self, records: Vec<NewMemberRecord>) -> AppResult<Vec<Member>> {
        if records.is_empty() || records.len() > MAX_BATCH_SIZE {
            return Err(AppError::validation(
                "members",
                format!("between 1 and {} members can be created at once", MAX_BATCH_SIZE),
            ));
        }
        self.check_online()?;
        let mut created = Vec::new();
        for record in &records {
            let mut values = FieldMap::new();
            for (column, value) in NewMemberRecord::COLUMNS.iter().zip(record.values()) {
                values.insert(*column, value);
            }
            created.push(self.insert(&values));
        }
        Ok(created)
    }

    async fn ping(&self) -> AppResult<()> {
        self.check_online()
    }
}

fn app_with(store: InMemoryStore) -> Router {
    create_router(AppState::from_store(Arc::new(store)))
}

fn app() -> Router {
    app_with(InMemoryStore::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_database_connected() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "API is running", "database_connected": true})
    );
}

#[tokio::test]
async fn health_is_ok_when_database_is_down() {
    let (status, body) = send(&app_with(InMemoryStore::offline()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database_connected"], false);
}

#[tokio::test]
async fn list_empty_table() {
    let (status, body) = send(&app(), get("/members")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": [], "count": 0}));
}

#[tokio::test]
async fn list_unreachable_store_is_500_not_empty_list() {
    let (status, body) = send(&app_with(InMemoryStore::offline()), get("/members")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "DATABASE_UNAVAILABLE");
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let app = app();
    let (status, created) = send(
        &app,
        post_json("/members", json!({"name": "Kim", "grade": "Manager", "gender": "male"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["name"], "Kim");

    let id = created["data"]["id"].as_i64().unwrap();
    let (status, fetched) = send(&app, get(&format!("/members/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], created["data"]);
}

#[tokio::test]
async fn member_keys_follow_column_order() {
    let app = app();
    send(
        &app,
        post_json("/members", json!({"gender": "female", "name": "Lee", "grade": "Staff"})),
    )
    .await;

    let response = app.clone().oneshot(get("/members")).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    let positions: Vec<usize> = COLUMNS
        .iter()
        .map(|c| text.find(&format!("\"{}\":", c)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
}

#[tokio::test]
async fn get_missing_member_is_404() {
    let (status, body) = send(&app(), get("/members/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Member not found");
}

#[tokio::test]
async fn get_with_non_integer_id_is_404() {
    for uri in ["/members/abc", "/members/1.5", "/members/99999999999999999999"] {
        let (status, body) = send(&app(), get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["error"], "Member not found");
    }
}

#[tokio::test]
async fn create_with_empty_body_is_400() {
    let (status, body) = send(&app(), post_json("/members", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_without_body_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/members")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn create_with_malformed_json_is_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/members")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let (status, _) = send(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_with_unknown_column_is_400_and_inserts_nothing() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json("/members", json!({"name": "Kim", "nickname": "K"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "nickname");

    let (_, list) = send(&app, get("/members")).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn bulk_create_reports_requested_count() {
    let app = app();
    let (status, body) = send(
        &app,
        post_json(
            "/members/bulk",
            json!({"members": [
                {"name": "Kim", "grade": "Manager", "gender": "male"},
                {"name": "Lee", "grade": "Staff", "gender": "female"}
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "2 new members were added");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, list) = send(&app, get("/members")).await;
    assert_eq!(list["count"], 2);
}

#[tokio::test]
async fn bulk_create_invalid_record_names_path() {
    let (status, body) = send(
        &app(),
        post_json(
            "/members/bulk",
            json!({"members": [
                {"name": "Kim", "grade": "Manager", "gender": "male"},
                {"name": "Lee", "grade": "", "gender": "female"}
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "members[1].grade");
}

#[tokio::test]
async fn bulk_create_over_batch_limit_is_400() {
    let record = json!({"name": "Kim", "grade": "Manager", "gender": "male"});
    let (status, body) = send(
        &app(),
        post_json("/members/bulk", json!({"members": [record, record, record, record]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "members");
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let (status, body) = send(&app(), get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn openapi_document_lists_member_routes() {
    let (status, body) = send(&app(), get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().unwrap();
    for path in ["/members", "/members/{id}", "/members/bulk", "/health"] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
}
