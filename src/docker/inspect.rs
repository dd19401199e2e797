use serde::Deserialize;

use super::types::{ContainerState, Mount};

// Subset of the `docker container inspect` document we rely on.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContainer {
    name: String,
    state: RawState,
    config: RawConfig,
    #[serde(default)]
    mounts: Vec<RawMount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawState {
    running: bool,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawConfig {
    image: String,
    #[serde(default)]
    working_dir: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMount {
    #[serde(rename = "Type", default)]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    source: String,
    destination: String,
}

/// Parse `docker container inspect` output into the first container's state.
///
/// Docker prefixes container names with `/`; the prefix is stripped. Named
/// volumes are reported by volume name, everything else by host path.
pub fn parse_container_inspect(json: &str) -> Result<Option<ContainerState>, serde_json::Error> {
    let containers: Vec<RawContainer> = serde_json::from_str(json)?;
    Ok(containers.into_iter().next().map(into_state))
}

fn into_state(raw: RawContainer) -> ContainerState {
    let mounts = raw
        .mounts
        .into_iter()
        .map(|m| {
            let source = match (m.kind.as_str(), m.name) {
                ("volume", Some(name)) => name,
                _ => m.source,
            };
            Mount {
                kind: m.kind,
                source,
                destination: m.destination,
            }
        })
        .collect();

    ContainerState {
        name: raw.name.trim_start_matches('/').to_string(),
        running: raw.state.running,
        status: raw.state.status,
        image: raw.config.image,
        working_dir: raw.config.working_dir,
        mounts,
    }
}

/// True when Docker's stderr says the object simply does not exist.
pub fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("no such container")
        || lower.contains("no such volume")
        || lower.contains("no such object")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
      {
        "Id": "3f1c",
        "Name": "/claude-code-ralph",
        "State": { "Status": "running", "Running": true, "Pid": 4242 },
        "Config": {
          "Image": "node:20-bookworm",
          "WorkingDir": "/workspace",
          "Cmd": ["sleep", "infinity"]
        },
        "Mounts": [
          {
            "Type": "volume",
            "Name": "claude-code-data",
            "Source": "/var/lib/docker/volumes/claude-code-data/_data",
            "Destination": "/workspace",
            "RW": true
          },
          {
            "Type": "bind",
            "Source": "/home/dev/.gitconfig",
            "Destination": "/root/.gitconfig",
            "RW": false
          }
        ]
      }
    ]"#;

    #[test]
    fn parses_running_container() {
        let state = parse_container_inspect(SAMPLE).unwrap().unwrap();
        assert_eq!(state.name, "claude-code-ralph");
        assert!(state.running);
        assert_eq!(state.status, "running");
        assert_eq!(state.image, "node:20-bookworm");
        assert_eq!(state.working_dir, "/workspace");
    }

    #[test]
    fn named_volumes_report_volume_name() {
        let state = parse_container_inspect(SAMPLE).unwrap().unwrap();
        assert!(state.has_volume_at("claude-code-data", "/workspace"));
        let bind = state.mount_at("/root/.gitconfig").unwrap();
        assert_eq!(bind.kind, "bind");
        assert_eq!(bind.source, "/home/dev/.gitconfig");
    }

    #[test]
    fn missing_mounts_default_to_empty() {
        let json = r#"[{"Name":"/c1","State":{"Running":false,"Status":"exited"},"Config":{"Image":"img"}}]"#;
        let state = parse_container_inspect(json).unwrap().unwrap();
        assert!(!state.running);
        assert!(state.mounts.is_empty());
        assert!(state.working_dir.is_empty());
    }

    #[test]
    fn empty_array_is_none() {
        assert!(parse_container_inspect("[]").unwrap().is_none());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_container_inspect("not json").is_err());
    }

    #[test]
    fn recognises_not_found_messages() {
        assert!(is_not_found("Error: No such container: c1"));
        assert!(is_not_found(
            "Error response from daemon: get v1: no such volume"
        ));
        assert!(is_not_found("Error: No such object: c1"));
        assert!(!is_not_found("permission denied while trying to connect"));
    }
}
