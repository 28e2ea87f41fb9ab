use crate::app::command_support::{build_engine, GlobalOptions};
use crate::app::console::run_console_session_stdio;

pub fn cmd_console(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    if !args.is_empty() {
        return Err("usage: console".to_string());
    }
    let engine = build_engine(options)?;
    run_console_session_stdio(&engine)
}
