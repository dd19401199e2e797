use std::ffi::OsString;
use std::path::Path;

use super::types::ContainerSpec;

/// `docker version` limited to the server field, so it fails when the daemon is down.
pub fn version_args() -> Vec<String> {
    vec![
        "version".into(),
        "--format".into(),
        "{{.Server.Version}}".into(),
    ]
}

pub fn volume_inspect_args(name: &str) -> Vec<String> {
    vec!["volume".into(), "inspect".into(), name.into()]
}

pub fn volume_create_args(name: &str) -> Vec<String> {
    vec!["volume".into(), "create".into(), name.into()]
}

pub fn volume_remove_args(name: &str) -> Vec<String> {
    vec!["volume".into(), "rm".into(), name.into()]
}

pub fn container_inspect_args(name: &str) -> Vec<String> {
    vec!["container".into(), "inspect".into(), name.into()]
}

/// Build a detached `docker run` for a long-lived container.
pub fn run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        spec.name.clone(),
        "--network".into(),
        spec.network.clone(),
        "-v".into(),
        format!("{}:{}", spec.volume, spec.work_dir),
        "-w".into(),
        spec.work_dir.clone(),
        spec.image.clone(),
    ];
    args.extend(spec.command.iter().cloned());
    args
}

pub fn start_args(name: &str) -> Vec<String> {
    vec!["start".into(), name.into()]
}

pub fn stop_args(name: &str) -> Vec<String> {
    vec!["stop".into(), name.into()]
}

pub fn remove_args(name: &str) -> Vec<String> {
    vec!["rm".into(), name.into()]
}

pub fn exec_args(name: &str, command: &[String]) -> Vec<String> {
    let mut args = vec!["exec".into(), name.into()];
    args.extend(command.iter().cloned());
    args
}

/// The host path is passed through as-is; it need not be valid UTF-8.
pub fn copy_args(source: &Path, name: &str, destination: &str) -> Vec<OsString> {
    vec![
        "cp".into(),
        source.as_os_str().to_owned(),
        format!("{name}:{destination}").into(),
    ]
}

/// Wrap a shell snippet so it runs through `sh -c` inside the container.
pub fn shell(script: &str) -> Vec<String> {
    vec!["sh".into(), "-c".into(), script.into()]
}
