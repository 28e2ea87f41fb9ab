mod support;

use loadrun::app::console::run_console_session;
use serde_json::Value;
use std::io::Cursor;
use support::harness;

fn session_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .split("loadrun> ")
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| serde_json::from_str(chunk).expect("json line"))
        .collect()
}

#[test]
fn console_session_runs_commands_and_reports_failures_inline() {
    let h = harness(false);
    let script = "start shop stress --token t1\nstart shop stress\n\nactive\nfrobnicate\nstart blog x\ncompleted\nexit\nactive\n";
    let mut input = Cursor::new(script.as_bytes().to_vec());
    let mut output = Vec::new();

    let summary = run_console_session(&h.engine, &mut input, &mut output).expect("session");
    assert_eq!(summary, "console ended\ncommands=6");

    let lines = session_lines(&output);
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0]["status"], "started");
    assert_eq!(lines[1]["status"], "running");
    assert_eq!(lines[1]["run_id"], lines[0]["run_id"]);

    let active = lines[2].as_array().expect("active list");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["run_id"], lines[0]["run_id"]);
    assert_eq!(active[0]["status"], "running");

    assert_eq!(lines[3]["error"], "usage");
    assert_eq!(lines[4]["error"], "validation");
    assert_eq!(lines[5].as_array().expect("completed").len(), 1);
}

#[test]
fn console_stop_and_archive_round_out_a_run() {
    let h = harness(false);
    let started = h
        .engine
        .start_run(&loadrun::orchestration::StartIntent::new("shop", "stress"))
        .expect("start");
    let results_dir = h
        .engine
        .paths()
        .results_root()
        .join("shop/stress")
        .join(&started.run_id);
    std::fs::write(results_dir.join("stats_stats.csv"), "Name,Count\n").expect("csv");
    let out = h.dir.path().join("out/run.zip");

    let script = format!(
        "stop {id}\narchive {id} {out}\nreport {id}\n",
        id = started.run_id,
        out = out.display()
    );
    let mut input = Cursor::new(script.into_bytes());
    let mut output = Vec::new();
    run_console_session(&h.engine, &mut input, &mut output).expect("session");

    let lines = session_lines(&output);
    assert_eq!(lines[0]["status"], "stopped");
    assert_eq!(lines[0]["message"], "Success");
    assert_eq!(lines[1]["path"], out.display().to_string());
    assert!(out.is_file());
    assert_eq!(lines[2]["error"], "not_found");
}
