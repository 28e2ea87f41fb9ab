use crate::app::cli::console_help_lines;
use crate::app::command_support::{write_output_file, CommandFailure};
use crate::orchestration::{RunEngine, StartIntent};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const CONSOLE_EXIT_COMMANDS: &[&str] = &["exit", "quit"];
const CONSOLE_PROMPT: &str = "loadrun> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start(StartIntent),
    Stop { run_id: String },
    Active,
    Completed,
    ClearAll,
    Report { run_id: String },
    Archive { run_id: String, out: Option<PathBuf> },
    Containers,
    Help,
    Exit,
}

pub fn parse_console_command(line: &str) -> Result<ConsoleCommand, CommandFailure> {
    let words = line.split_whitespace().collect::<Vec<_>>();
    let Some((verb, args)) = words.split_first() else {
        return Err(CommandFailure::usage("empty command"));
    };
    if CONSOLE_EXIT_COMMANDS.contains(verb) {
        return Ok(ConsoleCommand::Exit);
    }
    match (*verb, args) {
        ("start", [project, scenario, rest @ ..]) => {
            let mut intent = StartIntent::new(*project, *scenario);
            let mut flags = rest.iter();
            while let Some(flag) = flags.next() {
                match *flag {
                    "--interactive" => intent.interactive = true,
                    "--token" => {
                        let token = flags
                            .next()
                            .ok_or_else(|| CommandFailure::usage("--token requires a value"))?;
                        intent.auth_token = token.to_string();
                    }
                    other => {
                        return Err(CommandFailure::usage(format!(
                            "unknown start option `{other}`"
                        )))
                    }
                }
            }
            Ok(ConsoleCommand::Start(intent))
        }
        ("start", _) => Err(CommandFailure::usage(
            "usage: start <project> <scenario> [--interactive] [--token <t>]",
        )),
        ("stop", [run_id]) => Ok(ConsoleCommand::Stop {
            run_id: run_id.to_string(),
        }),
        ("report", [run_id]) => Ok(ConsoleCommand::Report {
            run_id: run_id.to_string(),
        }),
        ("archive", [run_id]) => Ok(ConsoleCommand::Archive {
            run_id: run_id.to_string(),
            out: None,
        }),
        ("archive", [run_id, out]) => Ok(ConsoleCommand::Archive {
            run_id: run_id.to_string(),
            out: Some(PathBuf::from(out)),
        }),
        ("active", []) => Ok(ConsoleCommand::Active),
        ("completed", []) => Ok(ConsoleCommand::Completed),
        ("clear-all", []) => Ok(ConsoleCommand::ClearAll),
        ("containers", []) => Ok(ConsoleCommand::Containers),
        ("help", []) => Ok(ConsoleCommand::Help),
        ("stop" | "report" | "archive" | "active" | "completed" | "clear-all" | "containers"
        | "help", _) => Err(CommandFailure::usage(format!(
            "wrong arguments for `{verb}`; type `help`"
        ))),
        _ => Err(CommandFailure::usage(format!("unknown command `{verb}`"))),
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, CommandFailure> {
    serde_json::to_value(value).map_err(|e| CommandFailure::new("internal", e.to_string()))
}

/// Runs one command against the engine. `Exit` yields `Value::Null`.
pub fn execute_console_command(
    engine: &RunEngine,
    command: ConsoleCommand,
) -> Result<Value, CommandFailure> {
    match command {
        ConsoleCommand::Start(intent) => encode(&engine.start_run(&intent)?),
        ConsoleCommand::Stop { run_id } => encode(&engine.stop_run(&run_id)),
        ConsoleCommand::Active => encode(&engine.list_active()),
        ConsoleCommand::Completed => encode(&engine.list_completed()?),
        ConsoleCommand::ClearAll => encode(&engine.clear_all()?),
        ConsoleCommand::Report { run_id } => {
            let html = engine.report_html(&run_id)?;
            Ok(json!({ "run_id": run_id, "html": html }))
        }
        ConsoleCommand::Archive { run_id, out } => {
            let (file_name, bytes) = engine.archive(&run_id)?;
            let path = out.unwrap_or_else(|| PathBuf::from(&file_name));
            write_output_file(&path, &bytes).map_err(|e| CommandFailure::new("internal", e))?;
            Ok(json!({
                "run_id": run_id,
                "path": path.display().to_string(),
                "bytes": bytes.len(),
            }))
        }
        ConsoleCommand::Containers => encode(&engine.list_containers()?),
        ConsoleCommand::Help => Ok(json!({ "help": console_help_lines() })),
        ConsoleCommand::Exit => Ok(Value::Null),
    }
}

pub fn run_console_session_stdio(engine: &RunEngine) -> Result<String, String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    run_console_session(engine, &mut input, &mut output)
}

/// Line-oriented console. Every command prints one JSON line; failures are
/// printed as JSON too and never end the session.
pub fn run_console_session<R: BufRead, W: Write>(
    engine: &RunEngine,
    input: &mut R,
    output: &mut W,
) -> Result<String, String> {
    let mut handled = 0_usize;
    loop {
        write!(output, "{CONSOLE_PROMPT}")
            .and_then(|_| output.flush())
            .map_err(|e| format!("failed to write console prompt: {e}"))?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| format!("failed to read console input: {e}"))?;
        if read == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = parse_console_command(line).and_then(|command| {
            if command == ConsoleCommand::Exit {
                return Ok(None);
            }
            execute_console_command(engine, command).map(Some)
        });
        let rendered = match result {
            Ok(None) => break,
            Ok(Some(value)) => value.to_string(),
            Err(failure) => {
                serde_json::to_string(&failure).unwrap_or_else(|_| failure.to_string())
            }
        };
        handled += 1;
        writeln!(output, "{rendered}")
            .and_then(|_| output.flush())
            .map_err(|e| format!("failed to write console output: {e}"))?;
    }
    Ok(format!("console ended\ncommands={handled}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_parses_flags_in_any_order() {
        let parsed = parse_console_command("start shop stress --token abc --interactive")
            .expect("parse");
        assert_eq!(
            parsed,
            ConsoleCommand::Start(
                StartIntent::new("shop", "stress")
                    .auth_token("abc")
                    .interactive(true)
            )
        );
    }

    #[test]
    fn malformed_commands_are_usage_errors() {
        for line in ["start shop", "stop", "archive a b c", "frobnicate", "start a b --x"] {
            let err = parse_console_command(line).expect_err(line);
            assert_eq!(err.kind, "usage", "{line}");
        }
        assert_eq!(parse_console_command("quit").expect("quit"), ConsoleCommand::Exit);
    }
}
