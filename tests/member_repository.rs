//! PostgreSQL-backed repository tests.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`. Each test
//! creates its own uniquely named table and drops it afterwards.

use std::collections::HashSet;

use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use members_api::config::{DatabaseConfig, MembersConfig};
use members_api::db::ConnectionProvider;
use members_api::error::AppError;
use members_api::models::{MemberValue, NewMemberRecord, NewMemberRequest};
use members_api::repositories::{MemberRepository, MemberStore};

struct TestTable {
    url: String,
    name: String,
}

impl TestTable {
    async fn create() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let name = format!("members_test_{}", Uuid::new_v4().simple());

        let mut conn = AsyncPgConnection::establish(&url).await.unwrap();
        diesel::sql_query(format!(
            "CREATE TABLE \"{}\" (\
                id BIGSERIAL PRIMARY KEY, \
                name VARCHAR(255) NOT NULL, \
                grade VARCHAR(255), \
                gender VARCHAR(255), \
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
            name
        ))
        .execute(&mut conn)
        .await
        .unwrap();

        Self { url, name }
    }

    fn repository(&self) -> MemberRepository {
        let database = DatabaseConfig {
            url: self.url.clone(),
            max_connections: 4,
            ..DatabaseConfig::default()
        };
        let table = MembersConfig {
            table: self.name.clone(),
            ..MembersConfig::default()
        };
        MemberRepository::new(ConnectionProvider::from_config(&database), table)
    }

    async fn drop_table(self) {
        let mut conn = AsyncPgConnection::establish(&self.url).await.unwrap();
        diesel::sql_query(format!("DROP TABLE IF EXISTS \"{}\"", self.name))
            .execute(&mut conn)
            .await
            .unwrap();
    }
}

fn kim() -> NewMemberRequest {
    [("name", "Kim"), ("grade", "Manager"), ("gender", "male")]
        .into_iter()
        .collect()
}

fn record(name: &str) -> NewMemberRecord {
    NewMemberRecord {
        name: name.to_string(),
        grade: "Staff".to_string(),
        gender: "female".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn empty_table_lists_nothing() {
    let table = TestTable::create().await;
    let members = table.repository().list_all().await.unwrap();
    assert!(members.is_empty());
    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_returns_supplied_fields_and_defaults() {
    let table = TestTable::create().await;
    let repo = table.repository();

    let member = repo.create(kim()).await.unwrap();
    assert_eq!(member.id(), Some(1));
    assert_eq!(member.get("name"), Some(&MemberValue::from("Kim")));
    assert_eq!(member.get("grade"), Some(&MemberValue::from("Manager")));
    assert_eq!(member.get("gender"), Some(&MemberValue::from("male")));
    assert!(matches!(member.get("created_at"), Some(MemberValue::Timestamp(_))));

    let names: Vec<&str> = member.field_names().collect();
    assert_eq!(names, vec!["id", "name", "grade", "gender", "created_at"]);

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_then_get_by_id_matches() {
    let table = TestTable::create().await;
    let repo = table.repository();

    let created = repo.create(kim()).await.unwrap();
    let fetched = repo.get_by_id(created.id().unwrap()).await.unwrap();
    assert_eq!(fetched, created);

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn get_by_unknown_id_is_not_found() {
    let table = TestTable::create().await;
    let result = table.repository().get_by_id(424242).await;
    assert!(matches!(result, Err(AppError::NotFound { .. })));
    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_empty_request_mutates_nothing() {
    let table = TestTable::create().await;
    let repo = table.repository();

    let result = repo.create(NewMemberRequest::default()).await;
    assert!(matches!(result, Err(AppError::Validation { .. })));
    assert!(repo.list_all().await.unwrap().is_empty());

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_unknown_column_is_rejected_before_insert() {
    let table = TestTable::create().await;
    let repo = table.repository();

    let request: NewMemberRequest = [("name", "Kim"), ("nickname", "K")].into_iter().collect();
    let result = repo.create(request).await;
    assert!(matches!(result, Err(AppError::Validation { ref field, .. }) if field == "nickname"));
    assert!(repo.list_all().await.unwrap().is_empty());

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_constraint_violation_is_query_error() {
    let table = TestTable::create().await;
    let repo = table.repository();

    // name is NOT NULL
    let request: NewMemberRequest = [("grade", "Staff")].into_iter().collect();
    let result = repo.create(request).await;
    assert!(matches!(result, Err(AppError::Query { .. })));
    assert!(repo.list_all().await.unwrap().is_empty());

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn list_all_rows_share_shape() {
    let table = TestTable::create().await;
    let repo = table.repository();

    repo.create(kim()).await.unwrap();
    repo.create([("name", "Lee")].into_iter().collect())
        .await
        .unwrap();

    let members = repo.list_all().await.unwrap();
    assert_eq!(members.len(), 2);
    let first: Vec<&str> = members[0].field_names().collect();
    for member in &members {
        assert_eq!(member.field_names().collect::<Vec<_>>(), first);
    }
    assert!(members[1].get("grade").unwrap().is_null());

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn bulk_create_reads_back_batch() {
    let table = TestTable::create().await;
    let repo = table.repository();

    let created = repo
        .bulk_create(vec![record("Kim"), record("Lee"), record("Park")])
        .await
        .unwrap();
    assert_eq!(created.len(), 3);
    assert_eq!(repo.list_all().await.unwrap().len(), 3);

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn concurrent_bulk_creates_read_back_subset_of_inserted_rows() {
    let table = TestTable::create().await;
    let repo = table.repository();

    let batch = |prefix: &str| -> Vec<NewMemberRecord> {
        (0..4).map(|i| record(&format!("{}{}", prefix, i))).collect()
    };
    let (first, second) = tokio::join!(repo.bulk_create(batch("a")), repo.bulk_create(batch("b")));
    let (first, second) = (first.unwrap(), second.unwrap());

    // The read-back is a separate statement: each side sees at most its batch
    // size, but not necessarily its own rows.
    assert!(first.len() <= 4);
    assert!(second.len() <= 4);

    let inserted: HashSet<i64> = repo
        .list_all()
        .await
        .unwrap()
        .iter()
        .filter_map(|m| m.id())
        .collect();
    assert_eq!(inserted.len(), 8);
    for member in first.iter().chain(second.iter()) {
        assert!(inserted.contains(&member.id().unwrap()));
    }

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn missing_table_is_query_error() {
    let table = TestTable::create().await;
    let database = DatabaseConfig {
        url: table.url.clone(),
        ..DatabaseConfig::default()
    };
    let repo = MemberRepository::new(
        ConnectionProvider::from_config(&database),
        MembersConfig {
            table: "no_such_members_table".to_string(),
            ..MembersConfig::default()
        },
    );

    assert!(matches!(repo.list_all().await, Err(AppError::Query { .. })));
    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn instant_shaped_text_is_stored_as_sent() {
    let table = TestTable::create().await;
    let repo = table.repository();
    let sent = "2024-03-01T09:30:00.000+09:00";

    let created = repo
        .create([("name", sent)].into_iter().collect())
        .await
        .unwrap();
    assert_eq!(created.get("name"), Some(&MemberValue::Text(sent.to_string())));

    let fetched = repo.get_by_id(created.id().unwrap()).await.unwrap();
    assert_eq!(fetched.get("name"), Some(&MemberValue::Text(sent.to_string())));

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn numeric_column_keeps_full_precision() {
    let table = TestTable::create().await;
    let mut conn = AsyncPgConnection::establish(&table.url).await.unwrap();
    diesel::sql_query(format!(
        "ALTER TABLE \"{}\" ADD COLUMN dues NUMERIC(30, 2)",
        table.name
    ))
    .execute(&mut conn)
    .await
    .unwrap();

    let repo = table.repository();
    let created = repo
        .create(
            [("name", "Kim"), ("dues", "12345678901234567890.10")]
                .into_iter()
                .collect(),
        )
        .await
        .unwrap();
    let fetched = repo.get_by_id(created.id().unwrap()).await.unwrap();
    assert_eq!(
        fetched.get("dues"),
        Some(&MemberValue::from("12345678901234567890.10"))
    );

    table.drop_table().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn server_cancels_statements_past_the_timeout() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let provider = ConnectionProvider::from_config(&DatabaseConfig {
        url,
        statement_timeout: 1,
        ..DatabaseConfig::default()
    });

    let mut conn = provider.acquire().await.unwrap();
    let result = diesel::sql_query("SELECT pg_sleep(3)")
        .execute(&mut *conn)
        .await;

    let error = result.unwrap_err().to_string();
    assert!(error.contains("statement timeout"), "{}", error);
}
