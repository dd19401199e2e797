use serde::Serialize;
use tracing::info;

use crate::docker::{DockerEnvironment, DockerError, find_container};

use super::types::{ProvisionError, ProvisioningRequest};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownOutcome {
    pub container_removed: bool,
    pub volume_removed: bool,
}

/// Stop and remove the container. The volume is only removed when
/// `remove_volume` is set. Missing resources are skipped, so running this
/// twice is harmless.
pub fn teardown<E>(
    request: &ProvisioningRequest,
    env: &E,
    remove_volume: bool,
) -> Result<TeardownOutcome, ProvisionError>
where
    E: DockerEnvironment + ?Sized,
{
    env.ensure_available()
        .map_err(ProvisionError::EnvironmentUnavailable)?;

    let mut outcome = TeardownOutcome::default();
    let name = request.container_name();

    let existing = find_container(env, name)
        .map_err(|source| ProvisionError::Query {
            what: format!("container '{name}'"),
            source,
        })?;
    if let Some(state) = existing {
        let removal = |source: DockerError| ProvisionError::ContainerRemovalFailed {
            name: name.to_string(),
            source,
        };
        if state.running {
            info!(container = name, "stopping container");
            env.stop_container(name).map_err(removal)?;
        }
        info!(container = name, "removing container");
        env.remove_container(name).map_err(removal)?;
        outcome.container_removed = true;
    }

    if remove_volume {
        let volume = request.volume_name();
        let exists = env
            .volume_exists(volume)
            .map_err(|source| ProvisionError::Query {
                what: format!("volume '{volume}'"),
                source,
            })?;
        if exists {
            info!(volume, "removing volume");
            env.remove_volume(volume)
                .map_err(|source| ProvisionError::VolumeRemovalFailed {
                    name: volume.to_string(),
                    source,
                })?;
            outcome.volume_removed = true;
        }
    }

    Ok(outcome)
}
