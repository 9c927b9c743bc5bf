use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn herd(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_herd"));
    command
        .env("HERD_STORE_PATH", store_path(dir))
        .env("HERD_CONFIG_PATH", dir.join("config.json"))
        .env("HERD_DISABLE_NOTIFICATIONS", "1")
        .env_remove("HERD_LOG");
    command
}

fn store_path(dir: &Path) -> PathBuf {
    dir.join("herd.json")
}

fn read_store(dir: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(store_path(dir)).unwrap()).unwrap()
}

fn write_store(dir: &Path, events: serde_json::Value) {
    let content = serde_json::json!({
        "schema_version": 1,
        "cattle": [
            {
                "id": "cow-1",
                "name": "Lakshmi",
                "breed": "Gir",
                "created_at": "2024-01-01T00:00:00Z"
            }
        ],
        "events": events
    });
    std::fs::write(
        store_path(dir),
        serde_json::to_string_pretty(&content).unwrap(),
    )
    .unwrap();
}

fn weekly_deworming(completed_through: Option<&str>) -> serde_json::Value {
    serde_json::json!([{
        "id": "evt-1",
        "cattle_id": "cow-1",
        "date": "2024-01-01",
        "kind": "injection",
        "note": "deworming",
        "schedule": {
            "type": "recurring",
            "repeat_duration": 7,
            "completed_through": completed_through
        },
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    }])
}

fn run(dir: &Path, args: &[&str]) -> Output {
    herd(dir).args(args).output().expect("failed to run herd")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[test]
fn schedule_recurring_injection_persists_schedule() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), serde_json::json!([]));

    let output = run(
        dir.path(),
        &[
            "event",
            "schedule",
            "cow-1",
            "2099-05-01",
            "first dose",
            "--every",
            "30",
            "--json",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(event["kind"], "injection");
    assert_eq!(event["schedule"]["type"], "recurring");
    assert_eq!(event["schedule"]["repeat_duration"], 30);

    let stored = read_store(dir.path());
    assert_eq!(stored["events"][0]["date"], "2099-05-01");
    assert_eq!(stored["cattle"][0]["next_injection"], "2099-05-01");
}

#[test]
fn freshly_scheduled_series_supports_done_undo_and_calendar() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(dir.path(), &["cattle", "add", "Lakshmi", "--breed", "Gir", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let cattle: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let cattle_id = cattle["id"].as_str().unwrap().to_string();

    let output = run(
        dir.path(),
        &[
            "event",
            "schedule",
            cattle_id.as_str(),
            "2024-01-01",
            "deworming",
            "--every",
            "7",
            "--json",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let event_id = event["id"].as_str().unwrap().to_string();

    let output = run(dir.path(), &["event", "list", cattle_id.as_str(), "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(dir.path(), &["done", cattle_id.as_str(), event_id.as_str()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        read_store(dir.path())["events"][0]["schedule"]["completed_through"],
        "2024-01-02"
    );

    let output = run(dir.path(), &["undo", cattle_id.as_str(), event_id.as_str()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        read_store(dir.path())["events"][0]["schedule"].get("completed_through"),
        None
    );

    let output = run(
        dir.path(),
        &[
            "calendar",
            cattle_id.as_str(),
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-15",
            "--json",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items.as_array().unwrap().len(), 3);

    let output = run(dir.path(), &["due", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn fresh_one_off_event_can_be_listed_and_completed() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), serde_json::json!([]));

    let output = run(
        dir.path(),
        &["event", "schedule", "cow-1", "2099-05-01", "booster", "--json"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let event_id = event["id"].as_str().unwrap().to_string();

    let output = run(dir.path(), &["done", "cow-1", event_id.as_str()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(dir.path(), &["event", "list", "cow-1", "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let events: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(events[0]["schedule"]["completed"], true);
}

#[test]
fn schedule_note_only_once() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), serde_json::json!([]));

    let output = run(
        dir.path(),
        &["event", "schedule", "cow-1", "2099-05-01", "weigh", "--note-only"],
    );

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(
        String::from_utf8_lossy(&output.stdout)
            .starts_with("Scheduled note: weigh (evt-")
    );
    let stored = read_store(dir.path());
    assert_eq!(stored["events"][0]["kind"], "note");
    assert_eq!(stored["events"][0]["schedule"]["type"], "once");
    assert_eq!(stored["cattle"][0]["next_injection"], serde_json::Value::Null);
}

#[test]
fn zero_interval_is_an_invalid_definition() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), serde_json::json!([]));

    let output = run(
        dir.path(),
        &["event", "schedule", "cow-1", "2099-05-01", "shot", "--every", "0"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).starts_with("ERROR: invalid_event_definition - "),
        "{}",
        stderr(&output)
    );
}

#[test]
fn malformed_date_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), serde_json::json!([]));

    let output = run(
        dir.path(),
        &["event", "schedule", "cow-1", "01/05/2099", "shot"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("ERROR: invalid_input - "));
}

#[test]
fn done_and_undo_move_the_watermark() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), weekly_deworming(None));

    let output = run(dir.path(), &["done", "cow-1", "evt-1", "2024-01-15"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        read_store(dir.path())["events"][0]["schedule"]["completed_through"],
        "2024-01-16"
    );

    let output = run(dir.path(), &["undo", "cow-1", "evt-1", "2024-01-15"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        read_store(dir.path())["events"][0]["schedule"]["completed_through"],
        "2024-01-08"
    );

    let output = run(dir.path(), &["undo", "cow-1", "evt-1", "2024-01-01"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        read_store(dir.path())["events"][0]["schedule"]["completed_through"],
        serde_json::Value::Null
    );
}

#[test]
fn completing_earlier_occurrence_keeps_later_progress() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), weekly_deworming(Some("2024-01-16")));

    let output = run(dir.path(), &["done", "cow-1", "evt-1", "2024-01-08", "--json"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(event["schedule"]["completed_through"], "2024-01-16");
}

#[test]
fn done_rejects_date_off_the_repeat_grid() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), weekly_deworming(None));

    let output = run(dir.path(), &["done", "cow-1", "evt-1", "2024-01-10"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).starts_with("ERROR: invalid_occurrence_date - "),
        "{}",
        stderr(&output)
    );
    assert_eq!(
        read_store(dir.path())["events"][0]["schedule"]["completed_through"],
        serde_json::Value::Null
    );
}

#[test]
fn one_off_done_records_completion() {
    let dir = tempfile::tempdir().unwrap();
    write_store(
        dir.path(),
        serde_json::json!([{
            "id": "evt-1",
            "cattle_id": "cow-1",
            "date": "2024-01-05",
            "kind": "injection",
            "note": "booster",
            "schedule": { "type": "once" },
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }]),
    );

    let output = run(dir.path(), &["done", "cow-1", "evt-1"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let schedule = &read_store(dir.path())["events"][0]["schedule"];
    assert_eq!(schedule["completed"], true);
    assert!(schedule["completed_at"].is_string());
}

#[test]
fn move_rejects_past_dates() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), weekly_deworming(None));

    let output = run(dir.path(), &["event", "move", "cow-1", "evt-1", "2000-01-01"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr(&output),
        "ERROR: invalid_input - cannot move events to past dates"
    );
}

#[test]
fn move_to_future_date_shifts_anchor() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), weekly_deworming(None));

    let output = run(dir.path(), &["event", "move", "cow-1", "evt-1", "2099-03-03"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(read_store(dir.path())["events"][0]["date"], "2099-03-03");
}

#[test]
fn edit_switches_recurring_event_to_once() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), weekly_deworming(None));

    let output = run(
        dir.path(),
        &["event", "edit", "cow-1", "evt-1", "--once", "--note", "booster", "--json"],
    );

    assert!(output.status.success(), "{}", stderr(&output));
    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(event["note"], "booster");
    assert_eq!(event["schedule"]["type"], "once");
    assert_eq!(event["schedule"]["completed"], false);
}

#[test]
fn edit_interval_of_completed_series_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), weekly_deworming(Some("2024-01-09")));

    let output = run(dir.path(), &["event", "edit", "cow-1", "evt-1", "--every", "10"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("ERROR: invalid_event_definition - "));
}

#[test]
fn list_and_delete_events() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), weekly_deworming(None));

    let output = run(dir.path(), &["event", "list", "cow-1"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("every 7 days"), "{stdout}");
    assert!(stdout.contains("deworming"), "{stdout}");

    let output = run(dir.path(), &["event", "delete", "cow-1", "evt-1"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(dir.path(), &["event", "list", "cow-1", "--json"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
}
