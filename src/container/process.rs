use super::ContainerError;
use std::collections::BTreeMap;
use std::io::{BufReader, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CommandRequest<'a> {
    pub binary: &'a str,
    pub operation: &'a str,
    pub args: Vec<String>,
    pub env: &'a BTreeMap<String, String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs one runtime command to completion, killing it once `timeout` elapses.
pub fn run_bounded(request: &CommandRequest<'_>) -> Result<CommandOutput, ContainerError> {
    let mut command = Command::new(request.binary);
    command
        .args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in request.env {
        command.env(key, value);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ContainerError::MissingBinary {
                binary: request.binary.to_string(),
            })
        }
        Err(source) => {
            return Err(ContainerError::Spawn {
                binary: request.binary.to_string(),
                source,
            })
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || read_pipe(stdout));
    let stderr_reader = thread::spawn(move || read_pipe(stderr));

    let start = Instant::now();
    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > request.timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_reader.join();
                    let _ = stderr_reader.join();
                    return Err(ContainerError::Timeout {
                        operation: request.operation.to_string(),
                        timeout_ms: request.timeout.as_millis() as u64,
                    });
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(source) => {
                return Err(ContainerError::Spawn {
                    binary: request.binary.to_string(),
                    source,
                })
            }
        }
    };

    Ok(CommandOutput {
        exit_code: exit_status.code().unwrap_or(-1),
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
    })
}

fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let Some(pipe) = pipe else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = BufReader::new(pipe).read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Cuts `text` to at most `max_bytes` without splitting a character.
pub fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
