// In-memory Docker used by the unit tests: records every call and lets a
// test inject failures or script exec responses.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::engine::DockerEnvironment;
use super::types::{ContainerSpec, ContainerState, DockerError, ExecOutput, Mount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    VolumeExists(String),
    CreateVolume(String),
    RemoveVolume(String),
    Inspect(String),
    Run(String),
    Start(String),
    Stop(String),
    Remove(String),
    Exec(String, Vec<String>),
    Copy(String, String),
}

impl Call {
    /// Calls that change Docker state or the container filesystem.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::VolumeExists(_) | Call::Inspect(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailPoint {
    CreateVolume,
    Run,
    Start,
    Remove,
    Exec,
    Copy,
}

type ExecHandler = Box<dyn Fn(&[String]) -> ExecOutput>;

pub struct MemoryDocker {
    available: bool,
    /// Volume name to the files stored in it.
    volumes: RefCell<BTreeMap<String, BTreeSet<String>>>,
    containers: RefCell<BTreeMap<String, ContainerState>>,
    /// Inspect targets that resolve to a differently named container, the
    /// way Docker matches an ID prefix.
    aliases: BTreeMap<String, String>,
    calls: RefCell<Vec<Call>>,
    failures: BTreeSet<FailPoint>,
    exec_handler: ExecHandler,
}

impl MemoryDocker {
    pub fn new() -> Self {
        Self {
            available: true,
            volumes: RefCell::default(),
            containers: RefCell::default(),
            aliases: BTreeMap::new(),
            calls: RefCell::default(),
            failures: BTreeSet::new(),
            exec_handler: Box::new(|_| ExecOutput {
                code: Some(0),
                ..ExecOutput::default()
            }),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn failing(mut self, point: FailPoint) -> Self {
        self.failures.insert(point);
        self
    }

    pub fn on_exec(mut self, handler: impl Fn(&[String]) -> ExecOutput + 'static) -> Self {
        self.exec_handler = Box::new(handler);
        self
    }

    pub fn with_volume(self, name: &str, files: &[&str]) -> Self {
        self.volumes.borrow_mut().insert(
            name.to_string(),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn with_container(self, state: ContainerState) -> Self {
        self.containers
            .borrow_mut()
            .insert(state.name.clone(), state);
        self
    }

    pub fn with_alias(mut self, query: &str, container: &str) -> Self {
        self.aliases.insert(query.to_string(), container.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn volume_files(&self, name: &str) -> Option<BTreeSet<String>> {
        self.volumes.borrow().get(name).cloned()
    }

    pub fn container(&self, name: &str) -> Option<ContainerState> {
        self.containers.borrow().get(name).cloned()
    }

    pub fn container_count(&self) -> usize {
        self.containers.borrow().len()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn check(&self, point: FailPoint, command: &str) -> Result<(), DockerError> {
        if self.failures.contains(&point) {
            return Err(DockerError::CommandFailed {
                command: command.to_string(),
                status: "exit status: 1".into(),
                stderr: format!("injected {point:?} failure"),
            });
        }
        Ok(())
    }

    fn set_running(&self, name: &str, running: bool) -> Result<(), DockerError> {
        let mut containers = self.containers.borrow_mut();
        let state = containers
            .get_mut(name)
            .ok_or_else(|| no_such_container(name))?;
        state.running = running;
        state.status = if running { "running" } else { "exited" }.into();
        Ok(())
    }
}

fn no_such_container(name: &str) -> DockerError {
    DockerError::CommandFailed {
        command: format!("container {name}"),
        status: "exit status: 1".into(),
        stderr: format!("Error: No such container: {name}"),
    }
}

impl DockerEnvironment for MemoryDocker {
    fn ensure_available(&self) -> Result<(), DockerError> {
        if self.available {
            Ok(())
        } else {
            Err(DockerError::DaemonUnreachable(
                "Cannot connect to the Docker daemon".into(),
            ))
        }
    }

    fn volume_exists(&self, name: &str) -> Result<bool, DockerError> {
        self.record(Call::VolumeExists(name.into()));
        Ok(self.volumes.borrow().contains_key(name))
    }

    fn create_volume(&self, name: &str) -> Result<(), DockerError> {
        self.record(Call::CreateVolume(name.into()));
        self.check(FailPoint::CreateVolume, "volume create")?;
        self.volumes
            .borrow_mut()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    fn remove_volume(&self, name: &str) -> Result<(), DockerError> {
        self.record(Call::RemoveVolume(name.into()));
        let in_use = self
            .containers
            .borrow()
            .values()
            .any(|c| c.mounts.iter().any(|m| m.source == name));
        if in_use {
            return Err(DockerError::CommandFailed {
                command: format!("volume rm {name}"),
                status: "exit status: 1".into(),
                stderr: "volume is in use".into(),
            });
        }
        self.volumes.borrow_mut().remove(name);
        Ok(())
    }

    fn inspect_container(&self, name: &str) -> Result<Option<ContainerState>, DockerError> {
        self.record(Call::Inspect(name.into()));
        let containers = self.containers.borrow();
        let state = containers
            .get(name)
            .or_else(|| self.aliases.get(name).and_then(|target| containers.get(target)));
        Ok(state.cloned())
    }

    fn run_container(&self, spec: &ContainerSpec) -> Result<(), DockerError> {
        self.record(Call::Run(spec.name.clone()));
        self.check(FailPoint::Run, "run")?;
        if self.containers.borrow().contains_key(&spec.name) {
            return Err(DockerError::CommandFailed {
                command: "run".into(),
                status: "exit status: 125".into(),
                stderr: format!("Conflict. The container name \"/{}\" is already in use", spec.name),
            });
        }
        if !self.volumes.borrow().contains_key(&spec.volume) {
            return Err(DockerError::CommandFailed {
                command: "run".into(),
                status: "exit status: 125".into(),
                stderr: format!("volume {} was not created first", spec.volume),
            });
        }
        let state = ContainerState {
            name: spec.name.clone(),
            running: true,
            status: "running".into(),
            image: spec.image.clone(),
            working_dir: spec.work_dir.clone(),
            mounts: vec![Mount {
                kind: "volume".into(),
                source: spec.volume.clone(),
                destination: spec.work_dir.clone(),
            }],
        };
        self.containers
            .borrow_mut()
            .insert(spec.name.clone(), state);
        Ok(())
    }

    fn start_container(&self, name: &str) -> Result<(), DockerError> {
        self.record(Call::Start(name.into()));
        self.check(FailPoint::Start, "start")?;
        self.set_running(name, true)
    }

    fn stop_container(&self, name: &str) -> Result<(), DockerError> {
        self.record(Call::Stop(name.into()));
        self.set_running(name, false)
    }

    fn remove_container(&self, name: &str) -> Result<(), DockerError> {
        self.record(Call::Remove(name.into()));
        self.check(FailPoint::Remove, "rm")?;
        let mut containers = self.containers.borrow_mut();
        let running = match containers.get(name) {
            Some(c) => c.running,
            None => return Err(no_such_container(name)),
        };
        if running {
            return Err(DockerError::CommandFailed {
                command: format!("rm {name}"),
                status: "exit status: 1".into(),
                stderr: "cannot remove a running container".into(),
            });
        }
        containers.remove(name);
        Ok(())
    }

    fn exec(&self, name: &str, command: &[String]) -> Result<ExecOutput, DockerError> {
        self.record(Call::Exec(name.into(), command.to_vec()));
        self.check(FailPoint::Exec, "exec")?;
        match self.containers.borrow().get(name) {
            Some(c) if c.running => Ok((self.exec_handler)(command)),
            _ => Ok(ExecOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: format!("Error response from daemon: container {name} is not running"),
            }),
        }
    }

    fn copy_into(&self, name: &str, _source: &Path, destination: &str) -> Result<(), DockerError> {
        self.record(Call::Copy(name.into(), destination.into()));
        self.check(FailPoint::Copy, "cp")
    }
}
