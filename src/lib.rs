//! Provision a long-lived Docker container for Claude Code.
//!
//! The [`provision`] module holds the idempotent workflow: make sure a named
//! volume exists, create or reuse a container with that volume mounted at
//! `/workspace`, probe it for the `claude` CLI, and run a best-effort setup
//! script. Docker itself is reached through [`docker::DockerEnvironment`].

pub mod config;
pub mod docker;
pub mod instructions;
pub mod provision;
pub mod verify;
