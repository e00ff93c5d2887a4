/// `load_config` module: loads the optional static YAML config file for the CLI.
///
/// The file holds defaults only (no secrets). Command-line flags take
/// precedence over it; the access token for the photo service is always
/// read from the environment by [`crate::photos::GooglePhotosClient`].
///
/// Accepted keys:
///
/// ```yaml
/// ledger_path: /home/me/.photobatch-ledger
/// request_auth: "user:pass"
/// request_headers:
///   - "X-Api-Key: abc"
/// api_base_url: https://photoslibrary.googleapis.com
/// ```
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
    #[serde(default)]
    pub request_auth: Option<String>,
    #[serde(default)]
    pub request_headers: Vec<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

/// Loads a static YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file deserializes to `null`, which means "no overrides".
    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str::<FileConfig>(&config_content) {
        Ok(conf) => {
            info!(
                config_path = ?path_ref,
                ledger_path = ?conf.ledger_path,
                request_headers = conf.request_headers.len(),
                "Parsed config YAML successfully"
            );
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
