use crate::app::command_support::{build_engine, to_json, GlobalOptions};

pub fn cmd_containers(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    if !args.is_empty() {
        return Err("usage: containers".to_string());
    }
    let engine = build_engine(options)?;
    let containers = engine.list_containers().map_err(|e| e.to_string())?;
    to_json(&containers)
}

/// A fresh process has no registered runs, so this only purges containers.
pub fn cmd_clear_all(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    if !args.is_empty() {
        return Err("usage: clear-all".to_string());
    }
    let engine = build_engine(options)?;
    let summary = engine.clear_all().map_err(|e| e.to_string())?;
    to_json(&summary)
}
