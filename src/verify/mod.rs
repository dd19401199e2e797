//! Health checks for a provisioned environment, run black-box through the
//! same Docker interface the provisioner uses.

mod types;

pub use types::{CheckResult, CheckStatus, Summary, VerifyReport};

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::docker::{ContainerState, DockerEnvironment, commands, find_container};
use crate::provision::{CLI_BINARY, CliProbe, ProvisioningRequest, probe_cli};

/// Check names, in the order they run.
pub const CHECKS: [&str; 8] = [
    "docker",
    "volume",
    "container",
    "mount",
    "workdir",
    "persistence",
    "node",
    CLI_BINARY,
];

/// File written and read back by the persistence check.
const MARKER_FILE: &str = ".ralphdock-check";

#[derive(Default)]
struct Checks(Vec<CheckResult>);

impl Checks {
    fn push(&mut self, name: &str, status: CheckStatus, detail: impl Into<String>) {
        let detail = detail.into();
        debug!(check = name, status = status.as_str(), %detail);
        self.0.push(CheckResult {
            name: name.to_string(),
            status,
            detail,
        });
    }

    fn pass(&mut self, name: &str, detail: impl Into<String>) {
        self.push(name, CheckStatus::Pass, detail);
    }

    fn fail(&mut self, name: &str, detail: impl Into<String>) {
        self.push(name, CheckStatus::Fail, detail);
    }

    fn warn(&mut self, name: &str, detail: impl Into<String>) {
        self.push(name, CheckStatus::Warn, detail);
    }

    /// Mark every check not yet recorded as skipped.
    fn skip_remaining(&mut self, reason: &str) {
        for name in CHECKS.iter().skip(self.0.len()) {
            self.push(name, CheckStatus::Skip, reason);
        }
    }
}

/// Run every check against the environment `request` describes.
///
/// Never fails: problems are reported as failed checks. A missing daemon
/// skips everything else; a container that is not running skips the
/// in-container checks.
pub fn verify<E>(request: &ProvisioningRequest, env: &E) -> VerifyReport
where
    E: DockerEnvironment + ?Sized,
{
    let mut checks = Checks::default();
    run_checks(request, env, &mut checks);

    let results = checks.0;
    let count = |status: CheckStatus| results.iter().filter(|c| c.status == status).count();
    let summary = Summary {
        total: results.len(),
        passed: count(CheckStatus::Pass),
        failed: count(CheckStatus::Fail),
        warned: count(CheckStatus::Warn),
        skipped: count(CheckStatus::Skip),
    };

    VerifyReport {
        container_name: request.container_name().to_string(),
        volume_name: request.volume_name().to_string(),
        checks: results,
        summary,
    }
}

fn run_checks<E>(request: &ProvisioningRequest, env: &E, checks: &mut Checks)
where
    E: DockerEnvironment + ?Sized,
{
    if let Err(e) = env.ensure_available() {
        checks.fail("docker", e.to_string());
        checks.skip_remaining("docker is not available");
        return;
    }
    checks.pass("docker", "daemon is reachable");

    let volume = request.volume_name();
    match env.volume_exists(volume) {
        Ok(true) => checks.pass("volume", format!("volume {volume} exists")),
        Ok(false) => checks.fail("volume", format!("volume {volume} does not exist")),
        Err(e) => checks.fail("volume", e.to_string()),
    }

    let name = request.container_name();
    let state = match find_container(env, name) {
        Ok(Some(state)) if state.running => {
            checks.pass("container", format!("{name} is running ({})", state.image));
            state
        }
        Ok(Some(state)) => {
            checks.fail("container", format!("{name} exists but is {}", state.status));
            checks.skip_remaining("container is not running");
            return;
        }
        Ok(None) => {
            checks.fail("container", format!("{name} does not exist"));
            checks.skip_remaining("container does not exist");
            return;
        }
        Err(e) => {
            checks.fail("container", e.to_string());
            checks.skip_remaining("container state is unknown");
            return;
        }
    };

    check_mount(request, &state, checks);
    check_persistence(request, env, checks);

    match env.exec(name, &["node".to_string(), "--version".to_string()]) {
        Ok(out) if out.success() => checks.pass("node", out.stdout.trim()),
        Ok(out) => checks.warn("node", format!("node unavailable ({})", out.failure_reason())),
        Err(e) => checks.warn("node", e.to_string()),
    }

    match probe_cli(request, env) {
        CliProbe::Detected { path } => checks.pass(CLI_BINARY, path),
        CliProbe::Missing => checks.warn(CLI_BINARY, format!("{CLI_BINARY} is not installed yet")),
    }
}

fn check_mount(request: &ProvisioningRequest, state: &ContainerState, checks: &mut Checks) {
    let work_dir = request.work_dir();
    let volume = request.volume_name();
    if state.has_volume_at(volume, work_dir) {
        checks.pass("mount", format!("{volume} is mounted at {work_dir}"));
    } else {
        let actual = state
            .mount_at(work_dir)
            .map(|m| format!("{} ({})", m.source, m.kind))
            .unwrap_or_else(|| "nothing".to_string());
        checks.fail("mount", format!("expected {volume} at {work_dir}, found {actual}"));
    }

    if state.working_dir == work_dir {
        checks.pass("workdir", format!("working directory is {work_dir}"));
    } else {
        checks.fail(
            "workdir",
            format!("working directory is {:?}, expected {work_dir}", state.working_dir),
        );
    }
}

/// Write a unique marker under the work dir, read it back, then remove it.
fn check_persistence<E>(request: &ProvisioningRequest, env: &E, checks: &mut Checks)
where
    E: DockerEnvironment + ?Sized,
{
    let token = marker_token();
    let path = format!("{}/{MARKER_FILE}", request.work_dir());
    let script = persistence_script(&token, &path);

    match env.exec(request.container_name(), &commands::shell(&script)) {
        Ok(out) if out.success() && out.stdout == token => {
            checks.pass("persistence", format!("{} is writable", request.work_dir()))
        }
        Ok(out) if out.success() => checks.fail(
            "persistence",
            format!("read back {:?}, expected {token:?}", out.stdout),
        ),
        Ok(out) => checks.fail("persistence", out.failure_reason()),
        Err(e) => checks.fail("persistence", e.to_string()),
    }
}

fn persistence_script(token: &str, path: &str) -> String {
    let token = shell_words::quote(token);
    let path = shell_words::quote(path);
    format!("printf %s {token} > {path} && cat {path} && rm -f {path}")
}

fn marker_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("ralphdock-{}-{nanos}", std::process::id())
}
