use clap::Parser;

use members_api::cli::{
    Cli, execute_command, init_logger_from_settings, load_and_merge_config, should_start_server,
};
use members_api::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_and_merge_config(&cli)?;
    init_logger_from_settings(&settings)?;

    if should_start_server(&cli) {
        return Server::new(settings).run().await;
    }

    execute_command(&cli, settings).await.map_err(|e| {
        tracing::error!(error = %e, "Command failed");
        anyhow::anyhow!(e)
    })
}
