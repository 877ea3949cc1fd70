//! Integration tests for todo commands via the CLI.
//!
//! Every test runs against its own data directory and config file.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Get a Command for the twig binary, isolated to `dir`.
fn twig(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_twig"));
    cmd.arg("--data-dir")
        .arg(dir.path().join("data"))
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TWIG_CONFIG")
        .env_remove("TWIG_DATA_DIR");
    cmd
}

/// Run a command with --json and parse stdout.
fn twig_json(dir: &TempDir, args: &[&str]) -> Value {
    let output = twig(dir).args(args).arg("--json").output().unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn add(dir: &TempDir, args: &[&str]) -> String {
    let mut full = vec!["add"];
    full.extend_from_slice(args);
    twig_json(dir, &full)["id"].as_str().unwrap().to_string()
}

fn listed_ids(dir: &TempDir, args: &[&str]) -> Vec<String> {
    let mut full = vec!["list"];
    full.extend_from_slice(args);
    twig_json(dir, &full)
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect()
}

// === Add / Edit / Delete ===

#[test]
fn test_add_human_readable() {
    let temp = TempDir::new().unwrap();

    twig(&temp)
        .args(["add", "Buy milk", "--due", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added"))
        .stdout(predicate::str::contains("Buy milk"));

    assert!(temp.path().join("data/todos.json").exists());
}

#[test]
fn test_add_rejects_blank_task() {
    let temp = TempDir::new().unwrap();

    twig(&temp)
        .args(["add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task cannot be empty"));
}

#[test]
fn test_add_then_delete_first() {
    let temp = TempDir::new().unwrap();
    let milk = add(&temp, &["Buy milk", "--due", "2024-01-01"]);
    add(&temp, &["Pay bills", "--due", ""]);

    twig(&temp).args(["rm", &milk]).assert().success();

    let todos = twig_json(&temp, &["list"]);
    let todos = todos.as_array().unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["originalTask"], "Pay bills");
    assert_eq!(todos[0]["dueDate"], Value::Null);
}

#[test]
fn test_edit_unknown_id_fails() {
    let temp = TempDir::new().unwrap();

    twig(&temp)
        .args(["edit", "td-nope", "New text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Todo not found: td-nope"));
}

#[test]
fn test_edit_changes_text() {
    let temp = TempDir::new().unwrap();
    let id = add(&temp, &["Old text"]);

    let edited = twig_json(&temp, &["edit", &id, "New text"]);
    assert_eq!(edited["originalTask"], "New text");

    twig(&temp)
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("New text"))
        .stdout(predicate::str::contains("Status:   pending"));
}

#[test]
fn test_add_with_unknown_parent_fails() {
    let temp = TempDir::new().unwrap();

    twig(&temp)
        .args(["add", "Child", "--parent", "td-ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Todo not found: td-ghost"));
}

// === Subtasks ===

#[test]
fn test_done_parent_completes_subtasks() {
    let temp = TempDir::new().unwrap();
    let parent = add(&temp, &["Parent"]);
    let child = add(&temp, &["Child", "--parent", &parent]);
    let other = add(&temp, &["Other"]);

    twig(&temp).args(["done", &parent]).assert().success();

    let completed = listed_ids(&temp, &["--status", "completed"]);
    assert_eq!(completed, vec![parent.clone(), child.clone()]);
    assert_eq!(listed_ids(&temp, &["--status", "pending"]), vec![other]);

    // Reopening the child reopens the parent
    twig(&temp).args(["done", &child]).assert().success();
    assert!(listed_ids(&temp, &["--status", "completed"]).is_empty());
}

#[test]
fn test_rm_parent_cascades() {
    let temp = TempDir::new().unwrap();
    let parent = add(&temp, &["Parent"]);
    let child = add(&temp, &["Child", "--parent", &parent]);
    twig(&temp)
        .args(["order", &child, &parent])
        .assert()
        .success();

    twig(&temp)
        .args(["rm", &parent])
        .assert()
        .success()
        .stdout(predicate::str::contains("and 1 subtask(s)"));

    assert!(listed_ids(&temp, &[]).is_empty());
    let order = std::fs::read_to_string(temp.path().join("data/todoOrder.json")).unwrap();
    assert_eq!(order, "[]");
}

#[test]
fn test_expand_without_subtasks() {
    let temp = TempDir::new().unwrap();
    let id = add(&temp, &["Leaf"]);

    twig(&temp)
        .args(["expand", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("has no subtasks"));
}

#[test]
fn test_collapsed_parent_hides_subtasks() {
    let temp = TempDir::new().unwrap();
    twig(&temp)
        .args(["config", "set", "display.show_subtasks", "false"])
        .assert()
        .success();
    let parent = add(&temp, &["Parent"]);
    add(&temp, &["Hidden child", "--parent", &parent]);

    twig(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("(+1 subtask(s))"))
        .stdout(predicate::str::contains("Hidden child").not());

    twig(&temp)
        .args(["expand", &parent])
        .assert()
        .success()
        .stdout(predicate::str::contains("Expanded"));

    twig(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hidden child"));
}

// === Filtering and ordering ===

#[test]
fn test_list_search() {
    let temp = TempDir::new().unwrap();
    let milk = add(&temp, &["Buy MILK"]);
    let rent = add(&temp, &["Rent", "--due", "2024-02-01"]);
    add(&temp, &["Walk dog"]);

    assert_eq!(listed_ids(&temp, &["--search", "milk"]), vec![milk]);
    assert_eq!(listed_ids(&temp, &["-q", "2024-02"]), vec![rent]);
}

#[test]
fn test_list_rejects_bad_status() {
    let temp = TempDir::new().unwrap();

    twig(&temp)
        .args(["list", "--status", "someday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter"));
}

#[test]
fn test_move_reorders_list() {
    let temp = TempDir::new().unwrap();
    let a = add(&temp, &["A"]);
    let b = add(&temp, &["B"]);
    let c = add(&temp, &["C"]);

    twig(&temp).args(["move", &c, "1"]).assert().success();
    assert_eq!(
        listed_ids(&temp, &[]),
        vec![c.clone(), a.clone(), b.clone()]
    );

    // New todos land after the ordered ones
    let d = add(&temp, &["D"]);
    twig(&temp).args(["move", &a, "99"]).assert().success();
    assert_eq!(listed_ids(&temp, &[]), vec![c, b, d, a]);
}

// === Statistics ===

#[test]
fn test_stats_empty() {
    let temp = TempDir::new().unwrap();
    let stats = twig_json(&temp, &["stats"]);
    assert_eq!(stats["total"], 0);
    assert_eq!(stats["completion_percentage"], 0);
}

#[test]
fn test_stats_table() {
    let temp = TempDir::new().unwrap();
    let a = add(&temp, &["A"]);
    add(&temp, &["B"]);
    twig(&temp).args(["done", &a]).assert().success();

    twig(&temp)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress"))
        .stdout(predicate::str::contains("50%"));
}

// === Clear ===

#[test]
fn test_clear_with_confirmation_declined() {
    let temp = TempDir::new().unwrap();
    add(&temp, &["Keep me"]);

    twig(&temp)
        .arg("clear")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));

    assert_eq!(listed_ids(&temp, &[]).len(), 1);
}

#[test]
fn test_clear_yes() {
    let temp = TempDir::new().unwrap();
    add(&temp, &["A"]);
    add(&temp, &["B"]);

    twig(&temp)
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 todo(s)"));

    assert!(listed_ids(&temp, &[]).is_empty());
}

#[test]
fn test_rm_counts_hoisted_descendants() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("data")).unwrap();
    std::fs::write(
        temp.path().join("data/todos.json"),
        r#"[
            {"id":"p","task":"P","subtasks":["c"],"createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"},
            {"id":"c","task":"C","parentId":"p","subtasks":["g"],"createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"},
            {"id":"g","task":"G","parentId":"c","createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}
        ]"#,
    )
    .unwrap();

    twig(&temp)
        .args(["rm", "p"])
        .assert()
        .success()
        .stdout(predicate::str::contains("and 2 subtask(s)"));

    assert!(listed_ids(&temp, &[]).is_empty());
}

#[test]
fn test_list_rejects_status_aliases() {
    let temp = TempDir::new().unwrap();

    twig(&temp)
        .args(["list", "--status", "done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter"));
}

// === Persistence recovery ===

#[test]
fn test_malformed_data_is_treated_as_empty() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("data")).unwrap();
    std::fs::write(temp.path().join("data/todos.json"), "{oops").unwrap();

    twig(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No todos found"))
        .stderr(predicate::str::contains("malformed stored data"));
}
