// Docker access: argument building, inspect parsing, and the CLI-backed environment.

pub mod commands;
pub mod engine;
mod inspect;
pub mod types;

#[cfg(test)]
pub(crate) mod memory;

pub use engine::{DockerCli, DockerEnvironment, find_container};
pub use inspect::parse_container_inspect;
pub use types::{ContainerSpec, ContainerState, DockerError, ExecOutput, Mount};
