mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./dvremux.toml",
        "~/.config/dvremux/config.toml",
        "/etc/dvremux/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config
        .dovi
        .to_dovi_config()
        .context("Invalid [dovi] section")?;

    if config.remux.max_moov_size == 0 {
        anyhow::bail!("remux.max_moov_size cannot be 0");
    }

    if config.remux.unknown_boxes == dvremux_mp4::UnknownBoxPolicy::Skip {
        tracing::warn!("unknown_boxes = \"skip\" produces invalid files when unknown boxes are present");
    }

    Ok(())
}
