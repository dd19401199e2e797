use serde::Serialize;

use crate::docker::{ContainerState, DockerEnvironment, find_container};

use super::orchestrator::detect_drift;
use super::types::{ProvisionError, ProvisioningRequest};

/// Read-only snapshot of the resources a request refers to.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentStatus {
    pub container_name: String,
    pub volume_name: String,
    pub volume_exists: bool,
    pub container: Option<ContainerState>,
    pub drift: Vec<String>,
}

impl EnvironmentStatus {
    pub fn container_running(&self) -> bool {
        self.container.as_ref().is_some_and(|c| c.running)
    }
}

/// Query Docker without changing anything.
pub fn status<E>(request: &ProvisioningRequest, env: &E) -> Result<EnvironmentStatus, ProvisionError>
where
    E: DockerEnvironment + ?Sized,
{
    env.ensure_available()
        .map_err(ProvisionError::EnvironmentUnavailable)?;

    let volume = request.volume_name();
    let volume_exists = env
        .volume_exists(volume)
        .map_err(|source| ProvisionError::Query {
            what: format!("volume '{volume}'"),
            source,
        })?;

    let name = request.container_name();
    let container = find_container(env, name)
        .map_err(|source| ProvisionError::Query {
            what: format!("container '{name}'"),
            source,
        })?;
    let drift = container
        .as_ref()
        .map(|state| detect_drift(request, state))
        .unwrap_or_default();

    Ok(EnvironmentStatus {
        container_name: name.to_string(),
        volume_name: volume.to_string(),
        volume_exists,
        container,
        drift,
    })
}
