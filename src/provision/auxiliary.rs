use std::io::Write;

use anyhow::{Context, Result, bail};
use include_dir::{Dir, include_dir};
use tracing::{info, warn};

use crate::docker::DockerEnvironment;

use super::types::{AuxiliaryOutcome, ProvisioningRequest};

static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

/// Name of the bundled script under `assets/`.
pub const SETUP_SCRIPT: &str = "container-setup.sh";

/// Where the script is copied inside the container.
pub const CONTAINER_SCRIPT_PATH: &str = "/tmp/ralphdock-setup.sh";

/// Copy the bundled setup script into the container and run it.
///
/// Every failure is logged and returned as [`AuxiliaryOutcome::Failed`].
pub fn run_setup_script<E>(request: &ProvisioningRequest, env: &E) -> AuxiliaryOutcome
where
    E: DockerEnvironment + ?Sized,
{
    match try_setup(request, env) {
        Ok(output) => {
            info!(container = request.container_name(), "setup script completed");
            AuxiliaryOutcome::Completed { output }
        }
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(container = request.container_name(), "setup script skipped: {reason}");
            AuxiliaryOutcome::Failed { reason }
        }
    }
}

fn try_setup<E>(request: &ProvisioningRequest, env: &E) -> Result<String>
where
    E: DockerEnvironment + ?Sized,
{
    let script = ASSETS
        .get_file(SETUP_SCRIPT)
        .with_context(|| format!("bundled script {SETUP_SCRIPT} is missing"))?;

    // Held until the copy finishes; removed on drop.
    let mut staged = tempfile::Builder::new()
        .prefix("ralphdock-")
        .suffix(".sh")
        .tempfile()
        .context("failed to stage script on the host")?;
    staged
        .write_all(script.contents())
        .context("failed to stage script on the host")?;
    staged.flush().context("failed to stage script on the host")?;

    let name = request.container_name();
    env.copy_into(name, staged.path(), CONTAINER_SCRIPT_PATH)
        .with_context(|| format!("failed to copy script into {name}"))?;

    let command = vec![
        "sh".to_string(),
        CONTAINER_SCRIPT_PATH.to_string(),
        request.work_dir().to_string(),
    ];
    let output = env
        .exec(name, &command)
        .with_context(|| format!("failed to run script in {name}"))?;
    if !output.success() {
        bail!("setup script failed ({})", output.failure_reason());
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::ExecOutput;
    use crate::docker::memory::{Call, FailPoint, MemoryDocker};

    fn running_env() -> (ProvisioningRequest, MemoryDocker) {
        let req = ProvisioningRequest::new("c1", "img:tag", "v1").unwrap();
        let env = MemoryDocker::new().with_volume("v1", &[]);
        env.run_container(&req.container_spec()).unwrap();
        env.clear_calls();
        (req, env)
    }

    #[test]
    fn bundled_script_is_embedded() {
        let script = ASSETS.get_file(SETUP_SCRIPT).unwrap();
        assert!(script.contents_utf8().unwrap().starts_with("#!/bin/sh"));
    }

    #[test]
    fn copies_then_runs_script_with_work_dir() {
        let (req, env) = running_env();
        let env = env.on_exec(|_| ExecOutput {
            code: Some(0),
            stdout: "Container environment:\n".into(),
            stderr: String::new(),
        });

        let outcome = run_setup_script(&req, &env);
        assert_eq!(
            outcome,
            AuxiliaryOutcome::Completed {
                output: "Container environment:\n".into()
            }
        );
        assert_eq!(
            env.calls(),
            vec![
                Call::Copy("c1".into(), CONTAINER_SCRIPT_PATH.into()),
                Call::Exec(
                    "c1".into(),
                    vec!["sh".into(), CONTAINER_SCRIPT_PATH.into(), "/workspace".into()]
                ),
            ]
        );
    }

    #[test]
    fn copy_failure_is_recorded_not_raised() {
        let (req, env) = running_env();
        let env = env.failing(FailPoint::Copy);
        match run_setup_script(&req, &env) {
            AuxiliaryOutcome::Failed { reason } => {
                assert!(reason.starts_with("failed to copy script into c1: "), "{reason}");
                assert!(reason.contains("injected Copy"), "{reason}");
            }
            other => panic!("expected Failed, got: {other:?}"),
        }
        // The script is never run when the copy fails.
        assert!(!env.calls().iter().any(|c| matches!(c, Call::Exec(..))));
    }

    #[test]
    fn non_zero_exit_is_recorded() {
        let (req, env) = running_env();
        let env = env.on_exec(|_| ExecOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "work directory /workspace is not writable".into(),
        });
        match run_setup_script(&req, &env) {
            AuxiliaryOutcome::Failed { reason } => {
                assert!(reason.contains("exit 1"));
                assert!(reason.contains("not writable"));
            }
            other => panic!("expected Failed, got: {other:?}"),
        }
    }
}
