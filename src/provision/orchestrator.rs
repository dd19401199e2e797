use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::docker::{ContainerState, DockerEnvironment, DockerError, commands, find_container};

use super::auxiliary::run_setup_script;
use super::types::{
    CliProbe, ContainerDisposition, ExistingAction, ProvisionError, ProvisioningOutcome,
    ProvisioningRequest,
};

/// Grace period after a container start before anything is exec'd into it.
pub const READINESS_DELAY: Duration = Duration::from_secs(2);

/// Binary looked up inside the container by the advisory probe.
pub const CLI_BINARY: &str = "claude";

/// Bring Docker to the requested state: the volume exists and a container
/// with that volume mounted at the work dir is running.
///
/// `decide` is consulted only when a container already holds the name.
/// Safe to re-run from any partial state; nothing is rolled back on error.
pub fn provision<E, F>(
    request: &ProvisioningRequest,
    env: &E,
    decide: F,
) -> Result<ProvisioningOutcome, ProvisionError>
where
    E: DockerEnvironment + ?Sized,
    F: FnOnce(&ContainerState) -> ExistingAction,
{
    run_inner(request, env, decide, READINESS_DELAY)
}

pub(crate) fn run_inner<E, F>(
    request: &ProvisioningRequest,
    env: &E,
    decide: F,
    readiness_delay: Duration,
) -> Result<ProvisioningOutcome, ProvisionError>
where
    E: DockerEnvironment + ?Sized,
    F: FnOnce(&ContainerState) -> ExistingAction,
{
    let name = request.container_name();

    env.ensure_available()
        .map_err(ProvisionError::EnvironmentUnavailable)?;
    debug!("docker is available");

    // ── Existing container ───────────────────────────────────────────
    let existing = find_container(env, name)
        .map_err(|source| ProvisionError::Query {
            what: format!("container '{name}'"),
            source,
        })?;

    let mut reused: Option<bool> = None;
    let mut recreated = false;
    let mut started = false;
    let mut drift = Vec::new();

    if let Some(state) = existing {
        match decide(&state) {
            ExistingAction::Recreate => {
                info!(container = name, "removing existing container");
                remove_existing(env, &state)?;
                recreated = true;
            }
            ExistingAction::Reuse => {
                drift = detect_drift(request, &state);
                for d in &drift {
                    warn!(container = name, "reused container differs from configuration: {d}");
                }
                if !state.running {
                    info!(container = name, "starting existing container");
                    env.start_container(name)
                        .map_err(|source| ProvisionError::ContainerStartFailed {
                            name: name.to_string(),
                            source,
                        })?;
                    started = true;
                } else {
                    info!(container = name, "reusing running container");
                }
                reused = Some(state.running);
            }
        }
    }

    // ── Volume ───────────────────────────────────────────────────────
    let volume_created = ensure_volume(request, env)?;

    // ── New container ────────────────────────────────────────────────
    let disposition = match reused {
        Some(was_running) => ContainerDisposition::Reused { was_running },
        None => {
            info!(
                container = name,
                image = request.image_reference(),
                volume = request.volume_name(),
                "creating container"
            );
            env.run_container(&request.container_spec())
                .map_err(|source| ProvisionError::ContainerCreationFailed {
                    name: name.to_string(),
                    source,
                })?;
            started = true;
            if recreated {
                ContainerDisposition::Recreated
            } else {
                ContainerDisposition::Created
            }
        }
    };

    if started {
        debug!(?readiness_delay, "waiting for container to settle");
        thread::sleep(readiness_delay);
    }

    // ── Advisory probe and best-effort setup ─────────────────────────
    let cli = probe_cli(request, env);
    let auxiliary = run_setup_script(request, env);

    Ok(ProvisioningOutcome {
        container_name: name.to_string(),
        volume_name: request.volume_name().to_string(),
        work_dir: request.work_dir().to_string(),
        image: request.image_reference().to_string(),
        disposition,
        volume_created,
        cli,
        auxiliary,
        drift,
    })
}

fn remove_existing<E>(env: &E, state: &ContainerState) -> Result<(), ProvisionError>
where
    E: DockerEnvironment + ?Sized,
{
    let removal = |source: DockerError| ProvisionError::ContainerRemovalFailed {
        name: state.name.clone(),
        source,
    };
    if state.running {
        env.stop_container(&state.name).map_err(removal)?;
    }
    env.remove_container(&state.name).map_err(removal)
}

/// Create the volume when absent. Returns whether it was created.
pub(crate) fn ensure_volume<E>(
    request: &ProvisioningRequest,
    env: &E,
) -> Result<bool, ProvisionError>
where
    E: DockerEnvironment + ?Sized,
{
    let volume = request.volume_name();
    let exists = env
        .volume_exists(volume)
        .map_err(|source| ProvisionError::Query {
            what: format!("volume '{volume}'"),
            source,
        })?;
    if exists {
        info!(volume, "volume already exists, leaving it untouched");
        return Ok(false);
    }

    info!(volume, "creating volume");
    env.create_volume(volume)
        .map_err(|source| ProvisionError::VolumeCreationFailed {
            name: volume.to_string(),
            source,
        })?;
    Ok(true)
}

/// Differences between a container we are about to reuse and the request.
pub fn detect_drift(request: &ProvisioningRequest, state: &ContainerState) -> Vec<String> {
    let mut drift = Vec::new();
    if state.image != request.image_reference() {
        drift.push(format!(
            "image is {} (configured {})",
            state.image,
            request.image_reference()
        ));
    }
    if !state.has_volume_at(request.volume_name(), request.work_dir()) {
        let actual = state
            .mount_at(request.work_dir())
            .map(|m| m.source.as_str())
            .unwrap_or("nothing");
        drift.push(format!(
            "{} has {} mounted (configured volume {})",
            request.work_dir(),
            actual,
            request.volume_name()
        ));
    }
    if state.working_dir != request.work_dir() {
        drift.push(format!(
            "working directory is {} (configured {})",
            if state.working_dir.is_empty() {
                "unset"
            } else {
                state.working_dir.as_str()
            },
            request.work_dir()
        ));
    }
    drift
}

/// Look for the developer CLI inside the container. Anything short of a
/// clean hit counts as missing.
pub fn probe_cli<E>(request: &ProvisioningRequest, env: &E) -> CliProbe
where
    E: DockerEnvironment + ?Sized,
{
    let command = commands::shell(&format!("command -v {CLI_BINARY}"));
    match env.exec(request.container_name(), &command) {
        Ok(out) if out.success() && !out.stdout.trim().is_empty() => {
            let path = out.stdout.trim().to_string();
            info!(%path, "{CLI_BINARY} is installed");
            CliProbe::Detected { path }
        }
        Ok(out) => {
            info!("{CLI_BINARY} is not installed yet");
            debug!(reason = %out.failure_reason(), "probe result");
            CliProbe::Missing
        }
        Err(e) => {
            debug!(error = %e, "probe inconclusive");
            CliProbe::Missing
        }
    }
}
