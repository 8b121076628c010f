//! Activation rules: decide which generated tasks to switch on and do it.
//!
//! Two cases are handled:
//!   - the generator task is `burn_in_tags`: for every configured base build
//!     variant, find the `<variant>-required` build in the version and
//!     activate its `burn_in_tests` tasks. A variant with no such build is
//!     skipped; it usually means there was nothing to burn in.
//!   - any other generator task: activate the tasks in the running build whose
//!     display name matches the generated task name.
//!
//! # Error Handling
//! Remote failures return immediately. Tasks activated before the failure stay
//! activated; there is no rollback.
//!
//! # Navigation
//! - Main entrypoint: [`activate_task`]
//! - Output: [`ActivationReport`]

use tracing::{debug, info, warn};

use crate::contract::EvergreenApi;
use crate::error::EvergreenError;
use crate::expansions::EvgExpansions;

/// Generator task name that triggers burn-in activation.
pub const BURN_IN_TAGS: &str = "burn_in_tags";
/// Display name of the burn-in task activated in each burn-in build.
pub const BURN_IN_TESTS: &str = "burn_in_tests";
/// Suffix appended to a base build variant to name its burn-in variant.
pub const REQUIRED_SUFFIX: &str = "-required";

/// What an activation run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub activated: Vec<ActivatedTask>,
    /// Burn-in build variants absent from the version.
    pub skipped_build_variants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedTask {
    pub task_id: String,
    pub display_name: String,
    pub build_id: String,
}

/// Activate the generated task(s) described by `expansions`.
pub async fn activate_task<A>(
    expansions: &EvgExpansions,
    evg_api: &A,
) -> Result<ActivationReport, EvergreenError>
where
    A: EvergreenApi + ?Sized,
{
    let mut report = ActivationReport::default();

    if expansions.task() == BURN_IN_TAGS {
        info!(
            version_id = %expansions.version_id,
            "[ACTIVATE] Activating burn_in_tests in burn_in_tags build variants"
        );
        let version = evg_api.version_by_id(&expansions.version_id).await?;
        let build_variants = version.build_variants_map();

        for base_build_variant in expansions.burn_in_tag_buildvariants_list() {
            let build_variant = format!("{base_build_variant}{REQUIRED_SUFFIX}");
            let Some(build_id) = build_variants.get(build_variant.as_str()) else {
                warn!(
                    build_variant = %build_variant,
                    "It is likely nothing to burn_in, so burn_in_tags build variant was not generated. Skipping..."
                );
                report.skipped_build_variants.push(build_variant);
                continue;
            };

            activate_matching_tasks(evg_api, build_id, BURN_IN_TESTS, &mut report).await?;
        }
    } else {
        activate_matching_tasks(evg_api, &expansions.build_id, expansions.task(), &mut report)
            .await?;
    }

    info!(
        activated = report.activated.len(),
        skipped = report.skipped_build_variants.len(),
        "[ACTIVATE] Activation finished"
    );
    Ok(report)
}

/// Activate every task in `build_id` whose display name is `display_name`.
async fn activate_matching_tasks<A>(
    evg_api: &A,
    build_id: &str,
    display_name: &str,
    report: &mut ActivationReport,
) -> Result<(), EvergreenError>
where
    A: EvergreenApi + ?Sized,
{
    let tasks = evg_api.tasks_by_build(build_id).await?;
    debug!(build_id, task_count = tasks.len(), "Listed tasks in build");

    for task in tasks.iter().filter(|t| t.display_name == display_name) {
        info!(
            task_id = %task.task_id,
            task_name = %task.display_name,
            "Activating task"
        );
        evg_api.configure_task(&task.task_id, true).await?;
        report.activated.push(ActivatedTask {
            task_id: task.task_id.clone(),
            display_name: task.display_name.clone(),
            build_id: build_id.to_string(),
        });
    }
    Ok(())
}
