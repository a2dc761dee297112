use std::path::Path;
use std::process::Command;

use serde_json::{json, Value};
use tempfile::TempDir;

fn run_cli(args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_bfcl-results");
    Command::new(exe).args(args).output().expect("run bfcl-results")
}

fn parse_json_stdout(out: &std::process::Output) -> Value {
    serde_json::from_slice(&out.stdout).expect("parse stdout JSON")
}

fn write_jsonl(path: &Path, lines: &[Value]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    let mut text = String::new();
    for line in lines {
        text.push_str(&line.to_string());
        text.push('\n');
    }
    std::fs::write(path, text).expect("write file");
}

/// Lay down one run's result+score pair for a category, nested under a
/// model subdirectory as the harness produces them.
fn write_run(root: &Path, run: &str, category: &str, ids: &[&str], failing: &[(&str, &str)]) {
    let result_lines: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "prompt": [{"role": "user", "content": "call the function"}],
                "model_result_decoded": [format!("f(x='{id}')")],
            })
        })
        .collect();
    let total = ids.len() as u64;
    let correct = total - failing.len() as u64;
    let mut score_lines = vec![json!({
        "accuracy": if total == 0 { 0.0 } else { correct as f64 / total as f64 },
        "correct_count": correct,
        "total_count": total,
    })];
    for (id, error_type) in failing {
        score_lines.push(json!({
            "id": id,
            "valid": false,
            "error": {"error_type": error_type, "error_message": "wrong output"},
            "possible_answer": [format!("g(x='{id}')")],
        }));
    }

    let file = format!("BFCL_v4_{category}");
    write_jsonl(
        &root
            .join(format!("result-{run}"))
            .join("gpt-test")
            .join(format!("{file}_result.json")),
        &result_lines,
    );
    write_jsonl(
        &root
            .join(format!("score-{run}"))
            .join("gpt-test")
            .join(format!("{file}_score.json")),
        &score_lines,
    );
}

fn read_listing(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).expect("read listing")).expect("parse listing")
}

#[test]
fn categorize_classifies_and_writes_sorted_listings() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let ids = ["t_0", "t_1", "t_2"];
    write_run(root, "a", "multi_turn", &ids, &[("t_2", "multi_turn:force_terminated")]);
    write_run(
        root,
        "b",
        "multi_turn",
        &ids,
        &[
            ("t_1", "multi_turn:wrong_call"),
            ("t_2", "multi_turn:force_terminated"),
        ],
    );

    let out = run_cli(&["categorize", "--root", root.to_str().unwrap()]);
    assert_eq!(
        out.status.code(),
        Some(0),
        "stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );

    assert_eq!(
        read_listing(&root.join("stable_tests.json")),
        json!({"multi_turn": ["t_0"]})
    );
    assert_eq!(
        read_listing(&root.join("flaky_tests.json")),
        json!({"multi_turn": ["t_1"]})
    );
    assert_eq!(
        read_listing(&root.join("failing_tests.json")),
        json!({"multi_turn": ["t_2"]})
    );

    // Unchanged input must reproduce the listings byte for byte.
    let before = std::fs::read(root.join("stable_tests.json")).unwrap();
    let out = run_cli(&["categorize", "--root", root.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    let after = std::fs::read(root.join("stable_tests.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn categorize_json_report_carries_counts_and_insights() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(root, "a", "live", &["l_0", "l_1"], &[]);
    write_run(root, "b", "live", &["l_0", "l_1"], &[("l_0", "checker:mismatch")]);
    write_run(root, "a", "simple", &["s_0"], &[]);
    write_run(root, "b", "simple", &["s_0"], &[]);

    let out = run_cli(&["categorize", "--root", root.to_str().unwrap(), "--json"]);
    assert_eq!(out.status.code(), Some(0));
    let v = parse_json_stdout(&out);
    assert_eq!(v["ok"], true);
    assert_eq!(v["stability"]["categories"]["live"]["total"], 2);
    assert_eq!(v["stability"]["categories"]["live"]["flaky"], 1);
    assert_eq!(v["stability"]["categories"]["simple"]["stable"], 1);
    assert_eq!(v["stability"]["totals"]["total"], 3);
    assert_eq!(v["most_flaky_category"], "live");
    assert_eq!(v["most_stable_category"], "simple");
    let runs = v["stability"]["categories"]["live"]["runs"]
        .as_array()
        .expect("runs[]");
    assert_eq!(runs.len(), 2);
}

#[test]
fn categorize_with_no_pairs_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    let out = run_cli(&["categorize", "--root", tmp.path().to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn categorize_skips_unparseable_pair_and_continues() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(root, "a", "simple", &["s_0"], &[]);
    write_run(root, "b", "simple", &["s_0"], &[]);
    // Corrupt run b's score file with a malformed line.
    let score_path = root
        .join("score-b")
        .join("gpt-test")
        .join("BFCL_v4_simple_score.json");
    std::fs::write(&score_path, "{not json\n").unwrap();

    let out = run_cli(&["categorize", "--root", root.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("skipping b/simple"), "stderr:\n{stderr}");
    assert!(stderr.contains("line 1"), "stderr:\n{stderr}");
    assert_eq!(
        read_listing(&root.join("stable_tests.json")),
        json!({"simple": ["s_0"]})
    );
}

#[test]
fn categorize_reports_incomplete_pairs() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(root, "a", "simple", &["s_0"], &[]);
    // A result file with no score counterpart.
    write_jsonl(
        &root
            .join("result-a")
            .join("gpt-test")
            .join("BFCL_v4_parallel_result.json"),
        &[json!({"id": "p_0"})],
    );

    let out = run_cli(&["categorize", "--root", root.to_str().unwrap(), "--json"]);
    assert_eq!(out.status.code(), Some(0));
    let v = parse_json_stdout(&out);
    let incomplete = v["incomplete"].as_array().expect("incomplete[]");
    assert_eq!(incomplete.len(), 1);
    assert_eq!(incomplete[0]["category"], "parallel");
    assert_eq!(incomplete[0]["missing"], "score");
    assert!(v["stability"]["categories"].get("parallel").is_none());
}

#[test]
fn compare_buckets_regressions_by_error_type() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let ids = ["X", "Y", "Z"];
    // X passes in baseline, fails in modified; Z improves.
    write_run(root, "base", "multi_turn", &ids, &[("Z", "multi_turn:wrong_call")]);
    write_run(
        root,
        "fix",
        "multi_turn",
        &ids,
        &[("X", "multi_turn:force_terminated")],
    );

    let baseline_dir = root.join("result-base");
    let modified_dir = root.join("result-fix");
    let out = run_cli(&[
        "compare",
        baseline_dir.to_str().unwrap(),
        modified_dir.to_str().unwrap(),
        "multi_turn",
        "--json",
    ]);
    assert_eq!(
        out.status.code(),
        Some(0),
        "stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
    let v = parse_json_stdout(&out);
    assert_eq!(v["regressions"], json!(["X"]));
    assert_eq!(v["improvements"], json!(["Z"]));
    assert_eq!(
        v["regressions_by_error"]["multi_turn:force_terminated"],
        json!(["X"])
    );
    assert_eq!(v["baseline"]["summary"]["correct_count"], 2);
    assert_eq!(v["modified"]["summary"]["correct_count"], 2);
}

#[test]
fn compare_restricts_to_shared_ids_and_reports_the_rest() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(root, "base", "simple", &["s_0", "s_1"], &[]);
    // Run "cut" completed fewer tests.
    write_run(root, "cut", "simple", &["s_0"], &[]);

    let out = run_cli(&[
        "compare",
        root.join("result-base").to_str().unwrap(),
        root.join("result-cut").to_str().unwrap(),
        "simple",
        "--json",
    ]);
    assert_eq!(out.status.code(), Some(0));
    let v = parse_json_stdout(&out);
    assert_eq!(v["only_in_baseline"], json!(["s_1"]));
    assert_eq!(v["only_in_modified"], json!([]));
    assert_eq!(v["regressions"], json!([]));
}

#[test]
fn compare_with_missing_category_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(root, "base", "simple", &["s_0"], &[]);
    write_run(root, "fix", "simple", &["s_0"], &[]);

    let out = run_cli(&[
        "compare",
        root.join("result-base").to_str().unwrap(),
        root.join("result-fix").to_str().unwrap(),
        "multi_turn",
    ]);
    assert_eq!(out.status.code(), Some(2));
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("multi_turn"),
        "stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
}

#[test]
fn extract_reports_passed_test_with_payload() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(
        root,
        "a",
        "multi_turn",
        &["multi_turn_base_103", "multi_turn_base_104"],
        &[],
    );

    let out = run_cli(&[
        "extract",
        root.join("result-a").to_str().unwrap(),
        "multi_turn_base_104",
        "--json",
    ]);
    assert_eq!(out.status.code(), Some(0));
    let v = parse_json_stdout(&out);
    assert_eq!(v["test"]["status"], "passed");
    assert_eq!(v["test"]["category"], "multi_turn");
    assert_eq!(v["test"]["record"]["id"], "multi_turn_base_104");
    assert!(v["found_in"]
        .as_str()
        .expect("found_in")
        .ends_with("BFCL_v4_multi_turn_result.json"));
}

#[test]
fn extract_reports_failed_test_with_error_type() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(
        root,
        "a",
        "multi_turn",
        &["multi_turn_base_104"],
        &[("multi_turn_base_104", "multi_turn:force_terminated")],
    );

    let out = run_cli(&[
        "extract",
        root.join("result-a").to_str().unwrap(),
        "multi_turn_base_104",
        "--json",
    ]);
    assert_eq!(out.status.code(), Some(0));
    let v = parse_json_stdout(&out);
    assert_eq!(v["test"]["status"], "failed");
    assert_eq!(v["test"]["error"]["error_type"], "multi_turn:force_terminated");
    // The failure record carries the expected answer for rendering.
    assert!(v["test"]["record"].get("possible_answer").is_some());

    // Human rendering shows the same sections.
    let out = run_cli(&[
        "extract",
        root.join("result-a").to_str().unwrap(),
        "multi_turn_base_104",
    ]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Status: FAILED"), "stdout:\n{stdout}");
    assert!(
        stdout.contains("Error Type: multi_turn:force_terminated"),
        "stdout:\n{stdout}"
    );
    assert!(stdout.contains("Expected Answer:"), "stdout:\n{stdout}");
}

#[test]
fn extract_unknown_id_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(root, "a", "simple", &["s_0"], &[]);

    let out = run_cli(&[
        "extract",
        root.join("result-a").to_str().unwrap(),
        "simple_999",
    ]);
    assert_eq!(out.status.code(), Some(2));
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("simple_999"),
        "stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
}

#[test]
fn model_flag_restricts_the_search() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_run(root, "a", "simple", &["s_0"], &[]);

    let out = run_cli(&[
        "extract",
        root.join("result-a").to_str().unwrap(),
        "s_0",
        "--model",
        "other-model",
    ]);
    // Only gpt-test exists; restricting to another model finds nothing.
    assert_eq!(out.status.code(), Some(2));

    let out = run_cli(&[
        "extract",
        root.join("result-a").to_str().unwrap(),
        "s_0",
        "--model",
        "gpt-test",
        "--json",
    ]);
    assert_eq!(out.status.code(), Some(0));
    let v = parse_json_stdout(&out);
    assert_eq!(v["test"]["status"], "passed");
}
