//! `load_config` module: reads the YAML configuration file and turns it into the
//! core [`BuildHookConfig`].
//!
//! Two shapes are accepted:
//!
//! ```yaml
//! website_build:
//!   enabled: true
//!   url: https://api.example.com/build_hooks/abc
//!   authorization: "Bearer ..."
//!   content: '{"trigger":"cms"}'
//! ```
//!
//! or the single-URL form, which always POSTs an empty body:
//!
//! ```yaml
//! front_end_build_hook: https://api.example.com/build_hooks/abc
//! ```
//!
//! Secrets can be kept out of the file: `REBUILD_HOOK_URL` and
//! `REBUILD_HOOK_AUTHORIZATION` override the file values when set.

use anyhow::Result;
use rebuild_hook_core::config::BuildHookConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

pub const URL_ENV: &str = "REBUILD_HOOK_URL";
pub const AUTHORIZATION_ENV: &str = "REBUILD_HOOK_AUTHORIZATION";

/// Which of the accepted shapes the file used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigShape {
    WebsiteBuild,
    FrontEndBuildHook,
}

#[derive(Debug)]
pub struct CliConfig {
    pub shape: ConfigShape,
    pub website_build: BuildHookConfig,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    website_build: Option<BuildHookConfig>,
    #[serde(default)]
    front_end_build_hook: Option<String>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
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

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let (shape, mut website_build) = match (raw.website_build, raw.front_end_build_hook) {
        (Some(structured), legacy) => {
            if legacy.is_some() {
                warn!("Both website_build and front_end_build_hook are set; using website_build");
            }
            (ConfigShape::WebsiteBuild, structured)
        }
        (None, Some(url)) => (
            ConfigShape::FrontEndBuildHook,
            BuildHookConfig::front_end_build_hook(url),
        ),
        (None, None) => {
            error!(config_path = ?path_ref, "Config has no build hook section");
            anyhow::bail!(
                "Config {:?} must contain a `website_build` section or a `front_end_build_hook` url",
                path_ref
            );
        }
    };

    if let Ok(url) = std::env::var(URL_ENV) {
        info!(env = URL_ENV, "Build hook url taken from environment");
        website_build.url = url;
    }
    if let Ok(authorization) = std::env::var(AUTHORIZATION_ENV) {
        info!(env = AUTHORIZATION_ENV, "Build hook authorization taken from environment");
        website_build.authorization = Some(authorization);
    }

    Ok(CliConfig {
        shape,
        website_build,
    })
}
