//! # contract: the slice of the Evergreen REST API this tool consumes
//!
//! This module defines the [`EvergreenApi`] trait and the plain data types it
//! returns. Only three calls are needed: fetch a version, list the tasks of a
//! build and flip a task's activation flag.
//!
//! ## Interface & Extensibility
//! - The CLI crate implements the trait over HTTP with retries.
//! - All methods are async and return [`EvergreenError`] on failure.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; `MockEvergreenApi` is exported
//!   under the `test-export-mocks` feature so integration tests and
//!   dependents can script API responses.

use std::collections::HashMap;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::EvergreenError;

/// A task as returned by `GET /rest/v2/builds/{build_id}/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub display_name: String,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub build_id: Option<String>,
    #[serde(default)]
    pub build_variant: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of a version's `build_variants_status` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildVariantStatus {
    pub build_variant: String,
    pub build_id: String,
}

/// A version as returned by `GET /rest/v2/versions/{version_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version_id: String,
    #[serde(default)]
    pub build_variants_status: Vec<BuildVariantStatus>,
}

impl Version {
    /// Map of build variant name to the id of its build in this version.
    pub fn build_variants_map(&self) -> HashMap<&str, &str> {
        self.build_variants_status
            .iter()
            .map(|bvs| (bvs.build_variant.as_str(), bvs.build_id.as_str()))
            .collect()
    }
}

/// Read/update access to an Evergreen deployment.
///
/// Implemented by the HTTP client in the CLI crate and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait EvergreenApi: Send + Sync {
    /// Fetch a version by its id.
    async fn version_by_id(&self, version_id: &str) -> Result<Version, EvergreenError>;

    /// List every task belonging to a build, across all result pages.
    async fn tasks_by_build(&self, build_id: &str) -> Result<Vec<Task>, EvergreenError>;

    /// Set the activation flag of a task.
    ///
    /// Setting a flag to the value it already holds is not an error.
    async fn configure_task(&self, task_id: &str, activated: bool) -> Result<(), EvergreenError>;
}
