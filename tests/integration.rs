// Integration testing drives the CLI as a subprocess; every invocation uses
// flags so no interactive prompt is reached.
use assert_cmd::Command;
use std::fs;

fn dskit() -> Command {
    Command::cargo_bin("dskit").unwrap()
}

fn init_project(root: &std::path::Path) {
    dskit()
        .arg("init")
        .arg("--project-root")
        .arg(root)
        .arg("--yes")
        .assert()
        .success();
}

#[test]
fn init_scaffolds_the_standard_layout() {
    let root = tempfile::tempdir().unwrap();

    dskit()
        .arg("init")
        .arg("--project-root")
        .arg(root.path())
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicates::str::contains("create"));

    assert!(root.path().join("data/raw").is_dir());
    assert!(root.path().join("data/processed").is_dir());
    assert!(root.path().join("artefacts").is_dir());
    assert!(root.path().join("experiments").is_dir());
    assert!(root.path().join("sources.csv").is_file());

    let env = fs::read_to_string(root.path().join(".dskit.env")).unwrap();
    assert!(env.starts_with("PROJECT_ROOT="));
    assert!(env.contains("EXPERIMENTS_DIR="));
}

#[test]
fn init_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    init_project(root.path());

    dskit()
        .arg("init")
        .arg("--project-root")
        .arg(root.path())
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicates::str::contains("already exists"));
}

#[test]
fn init_rejects_missing_root() {
    let parent = tempfile::tempdir().unwrap();
    let missing = parent.path().join("nope");

    dskit()
        .arg("init")
        .arg("--project-root")
        .arg(&missing)
        .arg("--yes")
        .assert()
        .failure()
        .code(1);

    assert!(!missing.exists());
}

#[test]
fn add_source_appends_to_the_ledger() {
    let root = tempfile::tempdir().unwrap();
    init_project(root.path());

    dskit()
        .current_dir(root.path())
        .args([
            "add-source",
            "--name",
            "mnist",
            "--description",
            "Handwritten digits",
            "--url",
            "https://example.com/mnist",
            "--citation",
            "LeCun et al. 1998",
        ])
        .assert()
        .success();

    let ledger = fs::read_to_string(root.path().join("sources.csv")).unwrap();
    assert!(ledger.contains("0;'mnist';'Handwritten digits';'https://example.com/mnist';'LeCun et al. 1998'"));
}

#[test]
fn add_source_rejects_invalid_url_non_interactively() {
    let root = tempfile::tempdir().unwrap();
    init_project(root.path());

    dskit()
        .current_dir(root.path())
        .args([
            "add-source",
            "--name",
            "mnist",
            "--description",
            "Handwritten digits",
            "--url",
            "not-a-url",
            "--citation",
            "LeCun et al. 1998",
        ])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn add_source_requires_init() {
    let root = tempfile::tempdir().unwrap();

    dskit()
        .current_dir(root.path())
        .args([
            "add-source",
            "--name",
            "mnist",
            "--description",
            "d",
            "--url",
            "https://example.com",
            "--citation",
            "c",
        ])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn experiment_creates_notebook_skeleton() {
    let root = tempfile::tempdir().unwrap();
    init_project(root.path());

    dskit()
        .current_dir(root.path())
        .args([
            "experiment",
            "--name",
            "My First Experiment",
            "--description",
            "Baseline run",
        ])
        .assert()
        .success();

    let notebook = root
        .path()
        .join("experiments/my_first_experiment/my_first_experiment.ipynb");
    assert!(notebook.is_file());

    let contents = fs::read_to_string(notebook).unwrap();
    assert!(contents.contains("# My First Experiment"));
}

#[test]
fn experiment_rejects_duplicate_names() {
    let root = tempfile::tempdir().unwrap();
    init_project(root.path());

    let run = |name: &str| {
        dskit()
            .current_dir(root.path())
            .args(["experiment", "--name", name, "--description", "run"])
            .assert()
    };

    run("baseline").success();
    run("Baseline").failure().code(1);
}
