use serde::{Deserialize, Serialize};

use crate::provision::{
    DEFAULT_CONTAINER_NAME, DEFAULT_IMAGE, DEFAULT_VOLUME_NAME, ProvisionError,
    ProvisioningRequest,
};

/// Marketplace and plugin passed through verbatim to the follow-up instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plugins {
    pub marketplace: String,
    pub plugin: String,
}

impl Default for Plugins {
    fn default() -> Self {
        Self {
            marketplace: "tzachbon/smart-ralph".to_string(),
            plugin: "ralph-specum@smart-ralph".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub container_name: String,
    pub image: String,
    pub volume_name: String,
    pub plugins: Plugins,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            volume_name: DEFAULT_VOLUME_NAME.to_string(),
            plugins: Plugins::default(),
        }
    }
}

/// Values from flags or environment variables; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub container_name: Option<String>,
    pub image: Option<String>,
    pub volume_name: Option<String>,
}

impl Config {
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(name) = overrides.container_name {
            self.container_name = name;
        }
        if let Some(image) = overrides.image {
            self.image = image;
        }
        if let Some(volume) = overrides.volume_name {
            self.volume_name = volume;
        }
        self
    }

    pub fn request(&self) -> Result<ProvisioningRequest, ProvisionError> {
        ProvisioningRequest::new(&self.container_name, &self.image, &self.volume_name)
    }
}
