use super::time::now_secs;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn append_engine_log(log_path: &Path, level: &str, event: &str, message: &str) {
    let payload = serde_json::json!({
        "timestamp": now_secs(),
        "level": level,
        "event": event,
        "message": message,
    });

    let Ok(line) = serde_json::to_string(&payload) else {
        return;
    };

    if let Some(parent) = log_path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(mut file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    else {
        return;
    };
    let _ = writeln!(file, "{line}");
}
