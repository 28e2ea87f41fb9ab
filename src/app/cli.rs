#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Console,
    Completed,
    Report,
    Archive,
    Containers,
    ClearAll,
    Config,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "console" => CliVerb::Console,
        "completed" => CliVerb::Completed,
        "report" => CliVerb::Report,
        "archive" => CliVerb::Archive,
        "containers" => CliVerb::Containers,
        "clear-all" => CliVerb::ClearAll,
        "config" => CliVerb::Config,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Usage: loadrun [--config <path>] <command> [args]".to_string(),
        String::new(),
        "Commands:".to_string(),
        "  console                              Open the run console on stdin/stdout".to_string(),
        "  completed                            List finished runs, newest first".to_string(),
        "  report <run_id>                      Print the stored HTML report of a run"
            .to_string(),
        "  archive <run_id> [--out <path>]      Zip a run's result files".to_string(),
        "  containers                           List managed worker containers".to_string(),
        "  clear-all                            Remove every managed worker container"
            .to_string(),
        "  config show|validate                 Print or check the loaded configuration"
            .to_string(),
        "  config set <file>                    Validate a file and store it as the configuration"
            .to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

pub fn console_help_lines() -> Vec<String> {
    vec![
        "Console commands:".to_string(),
        "  start <project> <scenario> [--interactive] [--token <t>]".to_string(),
        "  stop <run_id>".to_string(),
        "  active".to_string(),
        "  completed".to_string(),
        "  clear-all".to_string(),
        "  report <run_id>".to_string(),
        "  archive <run_id> [<out>]".to_string(),
        "  containers".to_string(),
        "  help".to_string(),
        "  exit | quit".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    let mut lines = cli_help_lines();
    lines.push(String::new());
    lines.extend(console_help_lines());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_map_to_commands() {
        assert_eq!(parse_cli_verb("console"), CliVerb::Console);
        assert_eq!(parse_cli_verb("clear-all"), CliVerb::ClearAll);
        assert_eq!(parse_cli_verb("-h"), CliVerb::Help);
        assert_eq!(parse_cli_verb("start"), CliVerb::Unknown);
    }

    #[test]
    fn help_lists_one_shot_and_console_commands() {
        let help = help_text();
        assert!(help.contains("archive <run_id> [--out <path>]"));
        assert!(help.contains("start <project> <scenario>"));
    }
}
