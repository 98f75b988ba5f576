//! Session configuration for the CLI: defaults, then the TOML file, then
//! command-line and environment overrides.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use ember_eye_core::SessionConfiguration;

pub fn parse(text: &str) -> Result<SessionConfiguration> {
    toml::from_str(text).context("invalid configuration file")
}

pub fn load(path: Option<&Path>, service_url: Option<&str>) -> Result<SessionConfiguration> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("unable to read configuration from {}", path.display()))?;
            log::info!("configuration loaded from {}", path.display());
            parse(&text)?
        }
        None => SessionConfiguration::default(),
    };

    if let Some(url) = service_url {
        config.service_url = url.to_string();
    }

    if let Err(e) = config.validate() {
        bail!("invalid configuration: {}", e);
    }
    Ok(config)
}
