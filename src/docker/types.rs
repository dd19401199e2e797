use serde::Serialize;
use thiserror::Error;

/// Network mode every provisioned container is started with.
pub const NETWORK_MODE: &str = "host";

/// Entry command that keeps a container alive for later `docker exec` use.
pub const KEEP_ALIVE: [&str; 2] = ["sleep", "infinity"];

/// Failures talking to the Docker CLI.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("failed to invoke `docker`; is it installed and on PATH?")]
    NotInstalled(#[source] std::io::Error),

    #[error("docker daemon is not reachable: {0}")]
    DaemonUnreachable(String),

    #[error("`docker {command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from `docker {command}`")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything needed to create a fresh container with `docker run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub volume: String,
    pub work_dir: String,
    pub network: String,
    pub command: Vec<String>,
}

impl ContainerSpec {
    /// A detached container with `volume` mounted at `work_dir`, kept alive
    /// by a no-op long-running process.
    pub fn new(name: &str, image: &str, volume: &str, work_dir: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            volume: volume.to_string(),
            work_dir: work_dir.to_string(),
            network: NETWORK_MODE.to_string(),
            command: KEEP_ALIVE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A mount as reported by `docker container inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mount {
    /// `volume` or `bind`.
    pub kind: String,
    /// Volume name for named volumes, host path for bind mounts.
    pub source: String,
    pub destination: String,
}

/// Observed state of an existing container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerState {
    pub name: String,
    pub running: bool,
    pub status: String,
    pub image: String,
    pub working_dir: String,
    pub mounts: Vec<Mount>,
}

impl ContainerState {
    pub fn mount_at(&self, destination: &str) -> Option<&Mount> {
        self.mounts.iter().find(|m| m.destination == destination)
    }

    /// True when the named volume (not a bind mount) sits at `destination`.
    pub fn has_volume_at(&self, volume: &str, destination: &str) -> bool {
        self.mount_at(destination)
            .is_some_and(|m| m.kind == "volume" && m.source == volume)
    }
}

/// Captured result of a command run inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short description of a failed run for diagnostics.
    pub fn failure_reason(&self) -> String {
        let code = match self.code {
            Some(c) => format!("exit {c}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            code
        } else {
            format!("{code}: {stderr}")
        }
    }
}
