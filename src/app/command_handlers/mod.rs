use crate::app::cli::{help_text, parse_cli_verb, CliVerb};
use crate::app::command_support::split_global_options;

pub mod config;
pub mod console;
pub mod containers;
pub mod results;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let (options, args) = split_global_options(args)?;
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Console => console::cmd_console(&options, &args[1..]),
        CliVerb::Completed => results::cmd_completed(&options, &args[1..]),
        CliVerb::Report => results::cmd_report(&options, &args[1..]),
        CliVerb::Archive => results::cmd_archive(&options, &args[1..]),
        CliVerb::Containers => containers::cmd_containers(&options, &args[1..]),
        CliVerb::ClearAll => containers::cmd_clear_all(&options, &args[1..]),
        CliVerb::Config => config::cmd_config(&options, &args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
