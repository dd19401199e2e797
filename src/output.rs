// Human-readable rendering of outcomes and reports, plus `--json` output.

use anyhow::Result;
use crossterm::style::Stylize;
use serde::Serialize;

use ralphdock::instructions::Step;
use ralphdock::provision::{
    AuxiliaryOutcome, CliProbe, ContainerDisposition, EnvironmentStatus, ProvisioningOutcome,
    TeardownOutcome,
};
use ralphdock::verify::{CheckStatus, VerifyReport};

fn ok(msg: impl std::fmt::Display) -> String {
    format!("{} {msg}", "✓".green())
}

fn warn(msg: impl std::fmt::Display) -> String {
    format!("{} {msg}", "⚠".yellow())
}

fn fail(msg: impl std::fmt::Display) -> String {
    format!("{} {msg}", "✗".red())
}

fn info(msg: impl std::fmt::Display) -> String {
    format!("{} {msg}", "•".dark_grey())
}

pub fn outcome_lines(outcome: &ProvisioningOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    let name = &outcome.container_name;

    lines.push(match outcome.disposition {
        ContainerDisposition::Created => ok(format!("Created container {name}")),
        ContainerDisposition::Recreated => ok(format!("Recreated container {name}")),
        ContainerDisposition::Reused { was_running: true } => {
            ok(format!("Reusing running container {name}"))
        }
        ContainerDisposition::Reused { was_running: false } => {
            ok(format!("Started existing container {name}"))
        }
    });
    for d in &outcome.drift {
        lines.push(warn(format!("Existing container differs from configuration: {d}")));
    }

    lines.push(if outcome.volume_created {
        ok(format!("Created volume {}", outcome.volume_name))
    } else {
        ok(format!("Using existing volume {}", outcome.volume_name))
    });
    lines.push(info(format!(
        "{} is mounted at {}",
        outcome.volume_name, outcome.work_dir
    )));

    lines.push(match &outcome.cli {
        CliProbe::Detected { path } => ok(format!("Claude Code is installed ({path})")),
        CliProbe::Missing => info("Claude Code is not installed yet"),
    });

    match &outcome.auxiliary {
        AuxiliaryOutcome::Completed { output } => {
            lines.extend(output.lines().map(|l| format!("  {l}")));
        }
        AuxiliaryOutcome::Failed { reason } => {
            lines.push(warn(format!("Setup script did not complete: {reason}")));
        }
    }
    lines
}

pub fn status_lines(status: &EnvironmentStatus) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(if status.volume_exists {
        ok(format!("Volume {} exists", status.volume_name))
    } else {
        fail(format!("Volume {} does not exist", status.volume_name))
    });

    match &status.container {
        Some(c) if c.running => lines.push(ok(format!("Container {} is running ({})", c.name, c.image))),
        Some(c) => lines.push(warn(format!("Container {} is {}", c.name, c.status))),
        None => lines.push(fail(format!(
            "Container {} does not exist",
            status.container_name
        ))),
    }
    for d in &status.drift {
        lines.push(warn(d));
    }
    lines
}

pub fn verify_lines(report: &VerifyReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .checks
        .iter()
        .map(|c| {
            let msg = format!("{:<12} {}", c.name, c.detail);
            match c.status {
                CheckStatus::Pass => ok(msg),
                CheckStatus::Fail => fail(msg),
                CheckStatus::Warn => warn(msg),
                CheckStatus::Skip => info(msg),
            }
        })
        .collect();

    let s = &report.summary;
    lines.push(String::new());
    lines.push(format!(
        "{} checks: {} passed, {} failed, {} warnings, {} skipped",
        s.total, s.passed, s.failed, s.warned, s.skipped
    ));
    lines
}

pub fn teardown_lines(outcome: &TeardownOutcome, container: &str, volume: &str) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(if outcome.container_removed {
        ok(format!("Removed container {container}"))
    } else {
        info(format!("No container named {container}"))
    });
    lines.push(if outcome.volume_removed {
        ok(format!("Removed volume {volume}"))
    } else {
        info(format!("Volume {volume} kept"))
    });
    lines
}

pub fn instruction_lines(steps: &[Step]) -> Vec<String> {
    let mut lines = vec![String::new(), "Next steps:".bold().to_string()];
    for (i, step) in steps.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, step.title));
        lines.push(format!("       {}", step.command.as_str().cyan()));
    }
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
