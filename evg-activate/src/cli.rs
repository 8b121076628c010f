///
/// This module implements the CLI interface for evg-activate: flag parsing and
/// the `run` entrypoint that wires configuration, the Evergreen client and the
/// activation rules together.
///
/// All activation logic (expansions model, API contract, which tasks to switch
/// on) lives in the [`evg-activate-core`] crate. This module is strictly glue.
///
/// ## How To Use
/// - For command-line users: run the `evg-activate` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`],
///   or [`run_with_api`] to supply your own [`EvergreenApi`].
///
/// [`evg-activate-core`]: ../../evg-activate-core/
use crate::client::{EvergreenClient, RetryConfig};
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::Parser;
use evg_activate_core::activate::{activate_task, ActivationReport};
use evg_activate_core::contract::EvergreenApi;
use evg_activate_core::expansions::EvgExpansions;
use std::path::{Path, PathBuf};

pub const EVG_CONFIG_FILE: &str = "./.evergreen.yml";

/// Activate the associated generated executions based in the running build.
///
/// The `--expansion-file` should contain all the configuration needed to
/// locate the generated tasks.
#[derive(Parser, Debug)]
#[clap(
    name = "evg-activate",
    version,
    about = "Activate generated Evergreen tasks in the running build"
)]
pub struct Cli {
    /// Location of expansions file generated by evergreen.
    #[clap(long)]
    pub expansion_file: PathBuf,

    /// Location of evergreen configuration file.
    #[clap(long, default_value = EVG_CONFIG_FILE)]
    pub evergreen_config: PathBuf,

    /// Enable verbose logging.
    #[clap(long)]
    pub verbose: bool,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<ActivationReport> {
    tracing::info!(
        expansion_file = ?cli.expansion_file,
        evergreen_config = ?cli.evergreen_config,
        "Starting task activation"
    );

    let expansions = load_expansions(&cli.expansion_file)?;
    let evg_config = load_config(&cli.evergreen_config)?;
    let evg_api = EvergreenClient::new(&evg_config, RetryConfig::default())
        .context("Failed to construct Evergreen client")?;

    run_with_api(&expansions, &evg_api).await
}

/// Run activation against an already constructed API handle.
pub async fn run_with_api<A>(expansions: &EvgExpansions, evg_api: &A) -> Result<ActivationReport>
where
    A: EvergreenApi + ?Sized,
{
    match activate_task(expansions, evg_api).await {
        Ok(report) => {
            tracing::info!(
                activated = report.activated.len(),
                skipped_build_variants = ?report.skipped_build_variants,
                "Task activation complete"
            );
            tracing::debug!(?report, "Activation report");
            Ok(report)
        }
        Err(e) => {
            tracing::error!(error = %e, "Task activation failed");
            Err(anyhow::Error::new(e).context("Task activation failed"))
        }
    }
}

fn load_expansions(path: &Path) -> Result<EvgExpansions> {
    EvgExpansions::from_yaml_file(path)
        .with_context(|| format!("Failed to load expansions from {}", path.display()))
}
