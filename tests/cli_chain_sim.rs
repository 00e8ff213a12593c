use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "ccsim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

/// One agent, 2h service, 1 min patience, 24 calls a day: half of them abandon.
fn overloaded_model(sub_days: u32) -> String {
    let profile = vec!["1"; 24].join(", ");
    format!(
        r#"{{
    "name": "overloaded",
    "sub_days": {sub_days},
    "agents": 1,
    "callers": [
        {{
            "name": "A",
            "fresh_calls_mean": 24,
            "arrival_profile": [{profile}],
            "wait_tolerance_secs": 60,
            "service_secs": 7200
        }}
    ]
}}"#
    )
}

fn read_json(path: &Path) -> Value {
    let raw = fs::read_to_string(path).expect("read json");
    serde_json::from_str(&raw).expect("parse json")
}

fn arrivals_of(stats: &Value, name: &str) -> Vec<u64> {
    stats["customer_types"]
        .as_array()
        .expect("customer_types")
        .iter()
        .find(|c| c["name"] == name)
        .expect("customer type")["arrivals"]
        .as_array()
        .expect("arrivals")
        .iter()
        .map(|v| v.as_u64().expect("count"))
        .collect()
}

fn chain_sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_chain_sim"))
        .args(args)
        .args(["--quiet", "--poll-ms", "1"])
        .output()
        .expect("run chain_sim")
}

#[test]
fn chain_sim_runs_a_two_day_chain_document() {
    let dir = unique_temp_dir("chain-doc");
    write_file(&dir, "m.json", &overloaded_model(2));
    let chain = write_file(
        &dir,
        "chain.json",
        &format!(
            r#"{{
    "base_folder": {base:?},
    "days": [
        {{ "model": "m.json", "statistics": "day1.json" }},
        {{
            "statistics": "day2.json",
            "carryover": {{ "kind": "per_type", "rules": [ {{ "customer_type": "A", "probability": 0.5 }} ] }}
        }}
    ]
}}"#,
            base = dir.to_str().unwrap()
        ),
    );

    let output = chain_sim(&["--chain", chain.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "chain_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("day 1/2"), "stdout={stdout}");
    assert!(stdout.contains("day 2/2"), "stdout={stdout}");
    assert!(stdout.contains("chain simulation done"), "stdout={stdout}");

    let day1 = read_json(&dir.join("day1.json"));
    assert_eq!(arrivals_of(&day1, "A"), vec![24, 24]);
    let day2 = read_json(&dir.join("day2.json"));
    assert_eq!(arrivals_of(&day2, "A"), vec![30, 30]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn chain_sim_single_day_mode_uses_day0_statistics() {
    let dir = unique_temp_dir("chain-single");
    let model = write_file(&dir, "m.json", &overloaded_model(1));
    let seed = dir.join("seed.json");
    let out = dir.join("out.json");

    let output = Command::new(env!("CARGO_BIN_EXE_day_sim"))
        .args([
            "--model",
            model.to_str().unwrap(),
            "--out",
            seed.to_str().unwrap(),
            "--quiet",
        ])
        .output()
        .expect("run day_sim");
    assert!(
        output.status.success(),
        "day_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = chain_sim(&[
        "--model",
        model.to_str().unwrap(),
        "--day0-stats",
        seed.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--carryover",
        "A=1",
    ]);
    assert!(
        output.status.success(),
        "chain_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(arrivals_of(&read_json(&out), "A"), vec![36]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn chain_sim_writes_the_day_log() {
    let dir = unique_temp_dir("chain-log");
    let model = write_file(&dir, "m.json", &overloaded_model(3));
    let out = dir.join("out.json");
    let log = dir.join("chain.log");

    let output = chain_sim(&[
        "--model",
        model.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--log",
        log.to_str().unwrap(),
        "--single-sub-day-when-logging",
    ]);
    assert!(
        output.status.success(),
        "chain_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let text = fs::read_to_string(&log).expect("read log");
    assert!(text.contains("day 1/1"), "log={text}");
    assert!(text.contains("chain completed"), "log={text}");
    assert_eq!(read_json(&out)["sub_days"], 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn chain_sim_reports_a_missing_model() {
    let dir = unique_temp_dir("chain-missing");
    let chain = write_file(
        &dir,
        "chain.json",
        &format!(
            r#"{{ "base_folder": {base:?}, "days": [ {{ "model": "nope.json" }} ] }}"#,
            base = dir.to_str().unwrap()
        ),
    );
    let output = chain_sim(&["--chain", chain.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr={stderr}");
    assert!(stderr.contains("day 1"), "stderr={stderr}");
    assert!(stderr.contains("does not exist"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn chain_sim_rejects_bad_carryover_arguments() {
    let dir = unique_temp_dir("chain-args");
    let model = write_file(&dir, "m.json", &overloaded_model(1));
    for bad in ["A=1.5", "A", "=0.5", "A=x"] {
        let output = chain_sim(&["--model", model.to_str().unwrap(), "--carryover", bad]);
        assert!(!output.status.success(), "accepted --carryover {bad}");
    }
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn chain_sim_time_limit_cancels_a_long_chain() {
    let dir = unique_temp_dir("chain-limit");
    // 100k customers per sub-day on one agent keeps the engine busy far
    // longer than the limit.
    let model = overloaded_model(10).replace("\"fresh_calls_mean\": 24", "\"fresh_calls_mean\": 100000");
    let model = write_file(&dir, "m.json", &model);
    let out = dir.join("out.json");

    let output = chain_sim(&[
        "--model",
        model.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--time-limit-secs",
        "0",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("chain stopped"), "stderr={stderr}");
    assert!(!out.exists());

    let bad = chain_sim(&["--model", model.to_str().unwrap(), "--time-limit-secs", "-1"]);
    assert!(!bad.status.success());

    let _ = fs::remove_dir_all(&dir);
}
