//! Check command handler
//!
//! Connects to the configured database and prints the member table's live
//! column list, so a deployment can be verified before it serves traffic.

use crate::config::Settings;
use crate::db::ConnectionProvider;
use crate::error::AppResult;
use crate::repositories::{MemberRepository, MemberStore};

/// Handler for the check command
pub struct CheckCommandHandler {
    config: Settings,
}

impl CheckCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Ping the store, then describe the member table.
    ///
    /// # Errors
    /// - Connection errors when the store is unreachable
    /// - Query errors when the member table does not exist
    pub async fn execute(&self) -> AppResult<()> {
        println!("Connecting to {}", self.config.database.redacted_url());

        let provider = ConnectionProvider::from_config(&self.config.database);
        let repository = MemberRepository::new(provider, self.config.members.clone());

        repository.ping().await?;
        println!("✓ Database connection established");

        let schema = repository.describe_table().await?;
        println!(
            "✓ Table \"{}\".\"{}\" has {} columns:",
            schema.schema_name(),
            schema.table_name(),
            schema.columns().len()
        );
        for column in schema.columns() {
            println!(
                "    {:<32} {}.{} ({:?})",
                column.name, column.udt_schema, column.udt_name, column.kind
            );
        }

        if schema.column(&self.config.members.timestamp_column).is_none() {
            println!(
                "! Timestamp column \"{}\" is missing; bulk create will fail",
                self.config.members.timestamp_column
            );
        }
        Ok(())
    }
}
