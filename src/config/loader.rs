use std::path::Path;

use anyhow::{Context, Result};

use super::types::Config;

/// Name of the optional config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".ralphdock.yaml";

/// Load config from a `.ralphdock.yaml` file in the given directory.
pub fn load_file(dir: &Path) -> Result<Option<Config>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    // An empty file is valid and means "all defaults".
    if contents.trim().is_empty() {
        return Ok(Some(Config::default()));
    }
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("invalid config in {}", path.display()))?;
    Ok(Some(config))
}

/// Config from `dir`, or the defaults when there is no config file.
pub fn load(dir: &Path) -> Result<Config> {
    Ok(load_file(dir)?.unwrap_or_default())
}
