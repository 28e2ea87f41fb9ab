use crate::app::command_support::{build_engine, to_json, write_output_file, GlobalOptions};
use std::path::PathBuf;

pub fn cmd_completed(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    if !args.is_empty() {
        return Err("usage: completed".to_string());
    }
    let engine = build_engine(options)?;
    let runs = engine.list_completed().map_err(|e| e.to_string())?;
    to_json(&runs)
}

pub fn cmd_report(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    let [run_id] = args else {
        return Err("usage: report <run_id>".to_string());
    };
    let engine = build_engine(options)?;
    engine.report_html(run_id).map_err(|e| e.to_string())
}

pub fn cmd_archive(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    let (run_id, out) = match args {
        [run_id] => (run_id, None),
        [run_id, flag, path] if flag == "--out" => (run_id, Some(PathBuf::from(path))),
        _ => return Err("usage: archive <run_id> [--out <path>]".to_string()),
    };
    let engine = build_engine(options)?;
    let (file_name, bytes) = engine.archive(run_id).map_err(|e| e.to_string())?;
    let path = out.unwrap_or_else(|| PathBuf::from(file_name));
    write_output_file(&path, &bytes)?;
    Ok(format!(
        "archive written\nrun_id={run_id}\npath={}\nbytes={}",
        path.display(),
        bytes.len()
    ))
}
