use serde::Serialize;
use thiserror::Error;

use crate::docker::{ContainerSpec, DockerError};

pub const DEFAULT_CONTAINER_NAME: &str = "claude-code-ralph";
pub const DEFAULT_IMAGE: &str = "node:20-bookworm";
pub const DEFAULT_VOLUME_NAME: &str = "claude-code-data";

/// Mount point of the volume and working directory of the container.
pub const WORK_DIR: &str = "/workspace";

/// The desired end state for one invocation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningRequest {
    container_name: String,
    image_reference: String,
    volume_name: String,
    work_dir: String,
}

impl ProvisioningRequest {
    /// Validate names against Docker's rules (`[a-zA-Z0-9][a-zA-Z0-9_.-]+`,
    /// so at least two characters).
    pub fn new(
        container_name: impl Into<String>,
        image_reference: impl Into<String>,
        volume_name: impl Into<String>,
    ) -> Result<Self, ProvisionError> {
        let container_name = container_name.into();
        let image_reference = image_reference.into();
        let volume_name = volume_name.into();

        validate_name("container", &container_name)?;
        validate_name("volume", &volume_name)?;
        if image_reference.trim().is_empty() || image_reference.contains(char::is_whitespace) {
            return Err(ProvisionError::InvalidName {
                kind: "image",
                value: image_reference,
            });
        }

        Ok(Self {
            container_name,
            image_reference,
            volume_name,
            work_dir: WORK_DIR.to_string(),
        })
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn image_reference(&self) -> &str {
        &self.image_reference
    }

    pub fn volume_name(&self) -> &str {
        &self.volume_name
    }

    pub fn work_dir(&self) -> &str {
        &self.work_dir
    }

    pub fn container_spec(&self) -> ContainerSpec {
        ContainerSpec::new(
            &self.container_name,
            &self.image_reference,
            &self.volume_name,
            &self.work_dir,
        )
    }
}

impl Default for ProvisioningRequest {
    fn default() -> Self {
        Self {
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            image_reference: DEFAULT_IMAGE.to_string(),
            volume_name: DEFAULT_VOLUME_NAME.to_string(),
            work_dir: WORK_DIR.to_string(),
        }
    }
}

fn validate_name(kind: &'static str, value: &str) -> Result<(), ProvisionError> {
    let mut chars = value.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && !chars.as_str().is_empty()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ProvisionError::InvalidName {
            kind,
            value: value.to_string(),
        })
    }
}

/// What to do with a container that already holds the configured name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingAction {
    Reuse,
    Recreate,
}

/// How the container in the outcome came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContainerDisposition {
    Created,
    Recreated,
    Reused { was_running: bool },
}

impl ContainerDisposition {
    pub fn is_new(self) -> bool {
        !matches!(self, Self::Reused { .. })
    }
}

/// Result of looking for the developer CLI inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CliProbe {
    Detected { path: String },
    Missing,
}

impl CliProbe {
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected { .. })
    }
}

/// Result of the best-effort setup script. Failure never fails provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuxiliaryOutcome {
    Completed { output: String },
    Failed { reason: String },
}

/// Summary of a successful `provision` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningOutcome {
    pub container_name: String,
    pub volume_name: String,
    pub work_dir: String,
    pub image: String,
    pub disposition: ContainerDisposition,
    pub volume_created: bool,
    pub cli: CliProbe,
    pub auxiliary: AuxiliaryOutcome,
    /// Differences between a reused container and the request.
    pub drift: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid {kind} name '{value}'")]
    InvalidName { kind: &'static str, value: String },

    #[error("docker is not available")]
    EnvironmentUnavailable(#[source] DockerError),

    #[error("failed to query {what}")]
    Query {
        what: String,
        #[source]
        source: DockerError,
    },

    #[error("failed to create volume '{name}'")]
    VolumeCreationFailed {
        name: String,
        #[source]
        source: DockerError,
    },

    #[error("failed to create container '{name}'")]
    ContainerCreationFailed {
        name: String,
        #[source]
        source: DockerError,
    },

    #[error("failed to start container '{name}'")]
    ContainerStartFailed {
        name: String,
        #[source]
        source: DockerError,
    },

    #[error("failed to remove container '{name}'")]
    ContainerRemovalFailed {
        name: String,
        #[source]
        source: DockerError,
    },

    #[error("failed to remove volume '{name}'")]
    VolumeRemovalFailed {
        name: String,
        #[source]
        source: DockerError,
    },
}
