use anyhow::Result;
use clap::Parser;
use evg_activate::cli::{run, Cli};
use evg_activate::logging::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::info!(verbose = cli.verbose, "CLI arguments parsed, invoking run");

    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = ?e, "CLI exited with error"),
    }
    result.map(|_| ())
}
