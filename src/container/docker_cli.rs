use super::process::{run_bounded, truncate_utf8, CommandOutput, CommandRequest};
use super::{
    ContainerError, ContainerFilter, ContainerId, ContainerInfo, ContainerRuntime, ContainerSpec,
    MANAGED_LABEL,
};
use crate::config::ContainerRuntimeSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Drives the `docker` command line. Each call spawns one child process
/// bounded by the configured command timeout.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
    env: BTreeMap<String, String>,
    timeout: Duration,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            env: BTreeMap::new(),
            timeout,
        }
    }

    pub fn from_settings(settings: &ContainerRuntimeSettings) -> Self {
        let mut cli = Self::new(settings.binary.clone(), settings.command_timeout());
        if let Some(host) = settings.docker_host.as_ref() {
            cli.env.insert("DOCKER_HOST".to_string(), host.clone());
        }
        cli
    }

    fn exec(
        &self,
        operation: &str,
        args: Vec<String>,
        timeout: Duration,
    ) -> Result<CommandOutput, ContainerError> {
        run_bounded(&CommandRequest {
            binary: &self.binary,
            operation,
            args,
            env: &self.env,
            timeout,
        })
    }

    fn exec_checked(
        &self,
        operation: &str,
        args: Vec<String>,
        timeout: Duration,
        handle: Option<&ContainerId>,
    ) -> Result<CommandOutput, ContainerError> {
        let output = self.exec(operation, args, timeout)?;
        if output.success() {
            return Ok(output);
        }
        if let Some(handle) = handle {
            if output.stderr.contains("No such container") || output.stderr.contains("No such object")
            {
                return Err(ContainerError::NotFound {
                    handle: handle.to_string(),
                });
            }
        }
        Err(ContainerError::CommandFailed {
            operation: operation.to_string(),
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

pub fn run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--detach".to_string(),
        "--name".to_string(),
        spec.name.clone(),
    ];
    for (key, value) in &spec.labels {
        args.push("--label".to_string());
        args.push(format!("{key}={value}"));
    }
    for port in &spec.ports {
        args.push("--publish".to_string());
        args.push(format!("{}:{}/tcp", port.host_port, port.container_port));
    }
    for volume in &spec.volumes {
        let mode = if volume.read_only { "ro" } else { "rw" };
        args.push("--volume".to_string());
        args.push(format!(
            "{}:{}:{mode}",
            volume.host_path.display(),
            volume.container_path
        ));
    }
    for (key, value) in &spec.env {
        args.push("--env".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

fn list_args(filter: ContainerFilter) -> Vec<String> {
    let mut args = vec![
        "ps".to_string(),
        "--no-trunc".to_string(),
        "--filter".to_string(),
        format!("label={MANAGED_LABEL}=true"),
    ];
    match filter {
        ContainerFilter::All => args.push("--all".to_string()),
        ContainerFilter::Running => {
            args.push("--filter".to_string());
            args.push("status=running".to_string());
        }
    }
    args.push("--format".to_string());
    args.push("{{json .}}".to_string());
    args
}

#[derive(Debug, Deserialize)]
struct PsLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names", default)]
    names: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Labels", default)]
    labels: String,
    #[serde(rename = "Ports", default)]
    ports: String,
}

pub fn parse_ps_output(stdout: &str) -> Result<Vec<ContainerInfo>, ContainerError> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let parsed: PsLine =
                serde_json::from_str(line).map_err(|err| ContainerError::Parse {
                    operation: "ps".to_string(),
                    reason: err.to_string(),
                })?;
            Ok(ContainerInfo {
                id: parsed.id,
                name: parsed.names,
                status: parsed.state,
                image: parsed.image,
                labels: parse_label_list(&parsed.labels),
                ports: parse_port_list(&parsed.ports),
            })
        })
        .collect()
}

fn parse_label_list(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Parses `0.0.0.0:8080->8089/tcp, :::8080->8089/tcp` style bindings.
fn parse_port_list(raw: &str) -> BTreeMap<u16, u16> {
    let mut ports = BTreeMap::new();
    for binding in raw.split(',').map(str::trim) {
        let Some((host, container)) = binding.split_once("->") else {
            continue;
        };
        let host_port = host.rsplit(':').next().and_then(|p| p.parse::<u16>().ok());
        let container_port = container
            .split('/')
            .next()
            .and_then(|p| p.parse::<u16>().ok());
        if let (Some(host_port), Some(container_port)) = (host_port, container_port) {
            ports.entry(container_port).or_insert(host_port);
        }
    }
    ports
}

#[derive(Debug, Deserialize)]
struct InspectDocument {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "State")]
    state: InspectState,
    #[serde(rename = "Config", default)]
    config: Option<InspectConfig>,
    #[serde(rename = "NetworkSettings", default)]
    network: Option<InspectNetwork>,
}

#[derive(Debug, Deserialize)]
struct InspectState {
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Debug, Deserialize, Default)]
struct InspectConfig {
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Labels", default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize, Default)]
struct InspectNetwork {
    #[serde(rename = "Ports", default)]
    ports: Option<BTreeMap<String, Option<Vec<InspectHostBinding>>>>,
}

#[derive(Debug, Deserialize)]
struct InspectHostBinding {
    #[serde(rename = "HostPort", default)]
    host_port: String,
}

pub fn parse_inspect_output(stdout: &str) -> Result<ContainerInfo, ContainerError> {
    let parse_error = |reason: String| ContainerError::Parse {
        operation: "inspect".to_string(),
        reason,
    };
    let mut documents: Vec<InspectDocument> =
        serde_json::from_str(stdout.trim()).map_err(|err| parse_error(err.to_string()))?;
    if documents.is_empty() {
        return Err(parse_error("inspect returned no objects".to_string()));
    }
    let document = documents.swap_remove(0);
    let config = document.config.unwrap_or_default();

    let mut ports = BTreeMap::new();
    let bindings = document
        .network
        .and_then(|network| network.ports)
        .unwrap_or_default();
    for (container, hosts) in bindings {
        let Some(container_port) = container
            .split('/')
            .next()
            .and_then(|p| p.parse::<u16>().ok())
        else {
            continue;
        };
        let host_port = hosts
            .unwrap_or_default()
            .iter()
            .find_map(|binding| binding.host_port.parse::<u16>().ok());
        if let Some(host_port) = host_port {
            ports.insert(container_port, host_port);
        }
    }

    Ok(ContainerInfo {
        id: document.id,
        name: document.name.trim_start_matches('/').to_string(),
        status: document.state.status,
        image: config.image,
        labels: config.labels.unwrap_or_default(),
        ports,
    })
}

impl ContainerRuntime for DockerCli {
    fn list(&self, filter: ContainerFilter) -> Result<Vec<ContainerInfo>, ContainerError> {
        let output = self.exec_checked("ps", list_args(filter), self.timeout, None)?;
        parse_ps_output(&output.stdout)
    }

    fn run(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let output = self.exec_checked("run", run_args(spec), self.timeout, None)?;
        let id = output.stdout.trim();
        if id.is_empty() {
            return Err(ContainerError::Parse {
                operation: "run".to_string(),
                reason: "runtime returned an empty container id".to_string(),
            });
        }
        Ok(ContainerId::new(id))
    }

    fn inspect(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let args = vec!["inspect".to_string(), id.to_string()];
        let output = self.exec_checked("inspect", args, self.timeout, Some(id))?;
        parse_inspect_output(&output.stdout)
    }

    fn stop(&self, id: &ContainerId, grace: Duration) -> Result<(), ContainerError> {
        let args = vec![
            "stop".to_string(),
            "--time".to_string(),
            grace.as_secs().to_string(),
            id.to_string(),
        ];
        self.exec_checked("stop", args, self.timeout + grace, Some(id))?;
        Ok(())
    }

    fn remove(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let mut args = vec!["rm".to_string()];
        if force {
            args.push("--force".to_string());
        }
        args.push(id.to_string());
        self.exec_checked("rm", args, self.timeout, Some(id))?;
        Ok(())
    }

    fn logs(&self, id: &ContainerId, max_bytes: usize) -> Result<String, ContainerError> {
        let args = vec!["logs".to_string(), id.to_string()];
        let output = self.exec_checked("logs", args, self.timeout, Some(id))?;
        let combined = format!("{}{}", output.stdout, output.stderr);
        Ok(truncate_utf8(&combined, max_bytes).to_string())
    }
}
