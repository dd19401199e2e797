use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tracing::debug;

use super::commands;
use super::inspect::{is_not_found, parse_container_inspect};
use super::types::{ContainerSpec, ContainerState, DockerError, ExecOutput};

/// The slice of Docker the provisioning workflow is allowed to touch.
///
/// Every call blocks until Docker has answered. Implementations must not
/// cache state between calls; the daemon is the only source of truth.
pub trait DockerEnvironment {
    /// Fail unless the CLI is installed and the daemon answers.
    fn ensure_available(&self) -> Result<(), DockerError>;

    fn volume_exists(&self, name: &str) -> Result<bool, DockerError>;
    fn create_volume(&self, name: &str) -> Result<(), DockerError>;
    fn remove_volume(&self, name: &str) -> Result<(), DockerError>;

    /// `None` when no container holds `name`, whatever its run state.
    /// Use [`find_container`] to look a container up by name.
    fn inspect_container(&self, name: &str) -> Result<Option<ContainerState>, DockerError>;
    /// Create and start a container in one step.
    fn run_container(&self, spec: &ContainerSpec) -> Result<(), DockerError>;
    fn start_container(&self, name: &str) -> Result<(), DockerError>;
    fn stop_container(&self, name: &str) -> Result<(), DockerError>;
    fn remove_container(&self, name: &str) -> Result<(), DockerError>;

    /// Run `command` inside the container. A non-zero exit is reported in the
    /// returned output, not as an error.
    fn exec(&self, name: &str, command: &[String]) -> Result<ExecOutput, DockerError>;
    fn copy_into(&self, name: &str, source: &Path, destination: &str) -> Result<(), DockerError>;
}

/// Look up the container named exactly `name`.
///
/// Docker resolves an inspect target by ID, then by name, then by ID prefix,
/// so whatever comes back under a different name counts as absent.
pub fn find_container<E>(env: &E, name: &str) -> Result<Option<ContainerState>, DockerError>
where
    E: DockerEnvironment + ?Sized,
{
    Ok(env.inspect_container(name)?.filter(|state| named(state, name)))
}

fn named(state: &ContainerState, name: &str) -> bool {
    if state.name != name {
        debug!(requested = name, found = %state.name, "ignoring container matched by ID");
        return false;
    }
    true
}

/// [`DockerEnvironment`] backed by the `docker` binary on PATH.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: OsString,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use a different binary (e.g. a `podman` shim or an absolute path).
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn output<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<Output, DockerError> {
        let command = display(args);
        debug!(command = %command, "docker");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DockerError::NotInstalled(e),
                _ => DockerError::Io(e),
            })
    }

    /// Run and require a zero exit status.
    fn checked<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<Output, DockerError> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(command_failed(args, &output));
        }
        Ok(output)
    }
}

/// Shell-quoted rendering of an argument list for logs and errors.
fn display<S: AsRef<OsStr>>(args: &[S]) -> String {
    shell_words::join(args.iter().map(|arg| arg.as_ref().to_string_lossy()))
}

fn command_failed<S: AsRef<OsStr>>(args: &[S], output: &Output) -> DockerError {
    DockerError::CommandFailed {
        command: display(args),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

impl DockerEnvironment for DockerCli {
    fn ensure_available(&self) -> Result<(), DockerError> {
        let output = self.output(&commands::version_args())?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(DockerError::DaemonUnreachable(reason));
        }
        Ok(())
    }

    fn volume_exists(&self, name: &str) -> Result<bool, DockerError> {
        let args = commands::volume_inspect_args(name);
        let output = self.output(&args)?;
        if output.status.success() {
            return Ok(true);
        }
        if is_not_found(&String::from_utf8_lossy(&output.stderr)) {
            return Ok(false);
        }
        Err(command_failed(&args, &output))
    }

    fn create_volume(&self, name: &str) -> Result<(), DockerError> {
        self.checked(&commands::volume_create_args(name))?;
        Ok(())
    }

    fn remove_volume(&self, name: &str) -> Result<(), DockerError> {
        self.checked(&commands::volume_remove_args(name))?;
        Ok(())
    }

    fn inspect_container(&self, name: &str) -> Result<Option<ContainerState>, DockerError> {
        let args = commands::container_inspect_args(name);
        let output = self.output(&args)?;
        if !output.status.success() {
            if is_not_found(&String::from_utf8_lossy(&output.stderr)) {
                return Ok(None);
            }
            return Err(command_failed(&args, &output));
        }
        let state = parse_container_inspect(&String::from_utf8_lossy(&output.stdout)).map_err(
            |source| DockerError::Parse {
                command: display(&args),
                source,
            },
        )?;
        Ok(state.filter(|state| named(state, name)))
    }

    fn run_container(&self, spec: &ContainerSpec) -> Result<(), DockerError> {
        self.checked(&commands::run_args(spec))?;
        Ok(())
    }

    fn start_container(&self, name: &str) -> Result<(), DockerError> {
        self.checked(&commands::start_args(name))?;
        Ok(())
    }

    fn stop_container(&self, name: &str) -> Result<(), DockerError> {
        self.checked(&commands::stop_args(name))?;
        Ok(())
    }

    fn remove_container(&self, name: &str) -> Result<(), DockerError> {
        self.checked(&commands::remove_args(name))?;
        Ok(())
    }

    fn exec(&self, name: &str, command: &[String]) -> Result<ExecOutput, DockerError> {
        let output = self.output(&commands::exec_args(name, command))?;
        Ok(ExecOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn copy_into(&self, name: &str, source: &Path, destination: &str) -> Result<(), DockerError> {
        self.checked(&commands::copy_args(source, name, destination))?;
        Ok(())
    }
}
