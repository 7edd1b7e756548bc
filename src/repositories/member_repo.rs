//! Member repository for async database operations.
//!
//! Every operation acquires one connection, introspects the member table on
//! it, runs its statement(s) under the statement timeout and releases the
//! connection when the handle leaves scope.

use async_trait::async_trait;
use diesel_async::AsyncPgConnection;
use validator::Validate;

use crate::config::MembersConfig;
use crate::db::{ConnectionProvider, QueryBuilder, RecordMapper, TableSchema};
use crate::error::{AppError, AppResult};
use crate::models::{ID_FIELD, Member, NewMemberRecord, NewMemberRequest};

/// Data-access contract for members.
///
/// Implemented by [`MemberRepository`] over PostgreSQL; the HTTP tests use an
/// in-memory implementation.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Every member, each with the table's current column set and order.
    ///
    /// An unreachable store is an error, never an empty list.
    async fn list_all(&self) -> AppResult<Vec<Member>>;

    /// The member with `id`, or [`AppError::NotFound`].
    async fn get_by_id(&self, id: i64) -> AppResult<Member>;

    /// Inserts one member and returns the stored row, including
    /// server-assigned defaults.
    async fn create(&self, request: NewMemberRequest) -> AppResult<Member>;

    /// Inserts all records in one statement, then reads back the
    /// `records.len()` most recent rows.
    ///
    /// The read-back is a separate statement: a concurrent insert between the
    /// two can make it report another caller's rows or miss some of these.
    async fn bulk_create(&self, records: Vec<NewMemberRecord>) -> AppResult<Vec<Member>>;

    /// Succeeds when a connection can be acquired and accepts a statement.
    async fn ping(&self) -> AppResult<()>;
}

/// PostgreSQL-backed member store.
///
/// Cloning is cheap; the provider wraps an `Arc`-based pool.
#[derive(Clone)]
pub struct MemberRepository {
    provider: ConnectionProvider,
    table: MembersConfig,
}

impl MemberRepository {
    pub fn new(provider: ConnectionProvider, table: MembersConfig) -> Self {
        Self { provider, table }
    }

    /// Column allow-list of the configured table, read live.
    pub async fn describe_table(&self) -> AppResult<TableSchema> {
        let mut conn = self.provider.acquire().await?;
        self.provider
            .within("describe table", self.load_schema(&mut conn))
            .await
    }

    async fn load_schema(&self, conn: &mut AsyncPgConnection) -> AppResult<TableSchema> {
        TableSchema::load(conn, &self.table.schema, &self.table.table).await
    }

    async fn list_on(&self, conn: &mut AsyncPgConnection) -> AppResult<Vec<Member>> {
        let schema = self.load_schema(conn).await?;
        let rows = QueryBuilder::new(&schema)
            .select_all()
            .fetch_rows(conn, "list members")
            .await?;
        RecordMapper::map_rows(&schema, rows)
    }

    async fn find_on(&self, conn: &mut AsyncPgConnection, id: i64) -> AppResult<Option<Member>> {
        let schema = self.load_schema(conn).await?;
        let rows = QueryBuilder::new(&schema)
            .select_by_id(id)?
            .fetch_rows(conn, "find member")
            .await?;
        RecordMapper::map_optional(&schema, rows)
    }

    async fn create_on(
        &self,
        conn: &mut AsyncPgConnection,
        request: &NewMemberRequest,
    ) -> AppResult<Member> {
        let schema = self.load_schema(conn).await?;
        let statement = QueryBuilder::new(&schema).insert(request.fields())?;
        let rows = statement.fetch_rows(conn, "create member").await?;
        RecordMapper::map_optional(&schema, rows)?.ok_or_else(|| {
            AppError::internal("insert returned no row")
        })
    }

    async fn bulk_create_on(
        &self,
        conn: &mut AsyncPgConnection,
        records: &[NewMemberRecord],
    ) -> AppResult<Vec<Member>> {
        let schema = self.load_schema(conn).await?;
        let builder = QueryBuilder::new(&schema);
        let timestamp_column = &self.table.timestamp_column;

        let inserted = builder
            .bulk_insert(records, timestamp_column)?
            .run(conn, "bulk create members")
            .await?;
        tracing::debug!(inserted, "Bulk insert committed");

        let rows = builder
            .select_recent(timestamp_column, records.len())?
            .fetch_rows(conn, "read back members")
            .await?;
        RecordMapper::map_rows(&schema, rows)
    }
}

/// Validates each record, naming the offending one as `members[i].field`.
fn validate_records(records: &[NewMemberRecord], max_batch_size: usize) -> AppResult<()> {
    if records.is_empty() {
        return Err(AppError::validation(
            "members",
            "at least one member is required",
        ));
    }
    if records.len() > max_batch_size {
        return Err(AppError::validation(
            "members",
            format!("at most {} members can be created at once", max_batch_size),
        ));
    }
    for (index, record) in records.iter().enumerate() {
        record.validate().map_err(|errors| match AppError::from(errors) {
            AppError::Validation { field, reason } => {
                AppError::validation(format!("members[{}].{}", index, field), reason)
            }
            other => other,
        })?;
    }
    Ok(())
}

#[async_trait]
impl MemberStore for MemberRepository {
    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> AppResult<Vec<Member>> {
        let mut conn = self.provider.acquire().await?;
        let members = self
            .provider
            .within("list members", self.list_on(&mut conn))
            .await?;
        tracing::debug!(count = members.len(), "Listed members");
        Ok(members)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> AppResult<Member> {
        let mut conn = self.provider.acquire().await?;
        self.provider
            .within("find member", self.find_on(&mut conn, id))
            .await?
            .ok_or_else(|| AppError::not_found("member", ID_FIELD, id))
    }

    #[tracing::instrument(skip(self, request), fields(field_count = request.len()))]
    async fn create(&self, request: NewMemberRequest) -> AppResult<Member> {
        if request.is_empty() {
            return Err(AppError::validation(
                "fields",
                "at least one field is required",
            ));
        }

        let mut conn = self.provider.acquire().await?;
        let member = self
            .provider
            .within("create member", self.create_on(&mut conn, &request))
            .await?;
        tracing::info!(member_id = ?member.id(), "Member created");
        Ok(member)
    }

    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_create(&self, records: Vec<NewMemberRecord>) -> AppResult<Vec<Member>> {
        validate_records(&records, self.table.max_batch_size)?;

        let mut conn = self.provider.acquire().await?;
        let members = self
            .provider
            .within("bulk create members", self.bulk_create_on(&mut conn, &records))
            .await?;
        tracing::info!(
            requested = records.len(),
            read_back = members.len(),
            "Bulk member insert finished"
        );
        Ok(members)
    }

    async fn ping(&self) -> AppResult<()> {
        self.provider.ping().await
    }
}
