//! # expansions: the Evergreen expansions file
//!
//! Evergreen writes a YAML file of key/value "expansions" for every running
//! task. This module reads the handful of keys needed to locate the build and
//! task to activate and ignores the rest.
//!
//! Required keys: `build_id`, `version_id`, `task_name`.
//! Optional key: `burn_in_tag_buildvariants`, a whitespace separated list of
//! base build variant names.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::ExpansionsError;
use crate::taskname::remove_gen_suffix;

/// Evergreen expansions file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvgExpansions {
    /// ID of build being run.
    pub build_id: String,
    /// ID of version being run.
    pub version_id: String,
    /// Name of task creating the generated configuration.
    pub task_name: String,
    /// Buildvariants to run burn_in_tags on.
    pub burn_in_tag_buildvariants: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExpansions {
    build_id: Option<String>,
    version_id: Option<String>,
    task_name: Option<String>,
    #[serde(default)]
    burn_in_tag_buildvariants: Option<String>,
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ExpansionsError> {
    match value {
        None => Err(ExpansionsError::Invalid {
            field,
            reason: "is missing".to_string(),
        }),
        Some(v) if v.trim().is_empty() => Err(ExpansionsError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        }),
        Some(v) => Ok(v),
    }
}

impl EvgExpansions {
    /// Read the expansions from the given YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ExpansionsError> {
        let path_ref = path.as_ref();
        info!(expansion_file = ?path_ref, "Loading expansions from file");

        let content = fs::read_to_string(path_ref).map_err(|e| {
            error!(error = ?e, expansion_file = ?path_ref, "Failed to read expansions file");
            ExpansionsError::Read {
                path: path_ref.to_path_buf(),
                source: e,
            }
        })?;

        let expansions = Self::from_yaml_str(&content)?;
        expansions.trace_loaded();
        Ok(expansions)
    }

    /// Parse expansions from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ExpansionsError> {
        let raw: RawExpansions = serde_yaml::from_str(content).map_err(|e| {
            error!(error = %e, "Failed to parse expansions YAML");
            ExpansionsError::Parse(e)
        })?;

        Ok(EvgExpansions {
            build_id: required("build_id", raw.build_id)?,
            version_id: required("version_id", raw.version_id)?,
            task_name: required("task_name", raw.task_name)?,
            burn_in_tag_buildvariants: raw.burn_in_tag_buildvariants,
        })
    }

    /// The task being generated, i.e. `task_name` without its `_gen` suffix.
    pub fn task(&self) -> &str {
        remove_gen_suffix(&self.task_name)
    }

    /// The list of burn_in_tags base buildvariants; empty when unset.
    pub fn burn_in_tag_buildvariants_list(&self) -> Vec<&str> {
        self.burn_in_tag_buildvariants
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn trace_loaded(&self) {
        info!(
            build_id = %self.build_id,
            version_id = %self.version_id,
            task_name = %self.task_name,
            task = %self.task(),
            "Loaded expansions"
        );
        debug!(?self, "Expansions loaded (full debug)");
    }
}
