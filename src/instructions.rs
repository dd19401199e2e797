use serde::Serialize;

use crate::config::Plugins;
use crate::provision::{CLI_BINARY, CliProbe, ProvisioningRequest};

/// npm package providing the developer CLI.
pub const CLI_PACKAGE: &str = "@anthropic-ai/claude-code";

/// One thing for the user to do next, with the command that does it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub title: String,
    pub command: String,
}

impl Step {
    fn new(title: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            command: command.into(),
        }
    }
}

/// Steps to get from a provisioned container to a working plugin setup.
///
/// The install step is included unless the probe saw the CLI. Marketplace
/// and plugin identifiers are passed through untouched.
pub fn follow_up(
    request: &ProvisioningRequest,
    plugins: &Plugins,
    cli: Option<&CliProbe>,
) -> Vec<Step> {
    let container = request.container_name();
    let mut steps = vec![Step::new(
        "Open a shell in the container",
        format!("docker exec -it {container} bash"),
    )];

    if !cli.is_some_and(CliProbe::is_detected) {
        steps.push(Step::new(
            "Install Claude Code",
            format!("npm install -g {CLI_PACKAGE}"),
        ));
    }

    steps.push(Step::new(
        "Start Claude Code in the workspace",
        format!("cd {} && {CLI_BINARY}", request.work_dir()),
    ));
    steps.push(Step::new(
        "Add the plugin marketplace (inside Claude Code)",
        format!("/plugin marketplace add {}", plugins.marketplace),
    ));
    steps.push(Step::new(
        "Install the plugin (inside Claude Code)",
        format!("/plugin install {}", plugins.plugin),
    ));
    steps.push(Step::new(
        "Stop the container when you are done",
        format!("docker stop {container}"),
    ));
    steps
}
