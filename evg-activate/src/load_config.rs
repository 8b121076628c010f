/// `load_config` module: loads the Evergreen client configuration file and
/// injects credentials from the environment.
///
/// The file is the `.evergreen.yml` the Evergreen CLI and agents write:
///
/// ```yaml
/// api_server_host: https://evergreen.mongodb.com/api
/// user: jane.doe
/// api_key: 0123abcd
/// ```
///
/// Unknown keys are ignored. `EVERGREEN_API_SERVER_HOST`, `EVERGREEN_USER` and
/// `EVERGREEN_API_KEY` take precedence over the file when set.
///
/// # Errors
/// A missing or unparsable file is an error; all errors are `anyhow::Error`
/// and surface at the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_API_SERVER_HOST: &str = "https://evergreen.mongodb.com/api";

pub const ENV_API_SERVER_HOST: &str = "EVERGREEN_API_SERVER_HOST";
pub const ENV_USER: &str = "EVERGREEN_USER";
pub const ENV_API_KEY: &str = "EVERGREEN_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvergreenConfig {
    pub api_server_host: String,
    pub user: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEvergreenConfig {
    #[serde(default)]
    api_server_host: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Loads the Evergreen config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EvergreenConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading Evergreen configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read Evergreen config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawEvergreenConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse Evergreen config YAML: {e}"));
        }
    };

    let api_server_host = env_override(ENV_API_SERVER_HOST)
        .or(raw.api_server_host)
        .unwrap_or_else(|| DEFAULT_API_SERVER_HOST.to_string())
        .trim_end_matches('/')
        .to_string();
    let user = env_override(ENV_USER).or(raw.user);
    let api_key = env_override(ENV_API_KEY).or(raw.api_key);

    info!(
        api_server_host = %api_server_host,
        user = user.as_deref().unwrap_or("<anonymous>"),
        api_key_set = api_key.is_some(),
        "Evergreen config loaded"
    );

    Ok(EvergreenConfig {
        api_server_host,
        user,
        api_key,
    })
}
