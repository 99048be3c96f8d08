//! End-to-end sync runs over real directory trees.
//!
//! Each test builds a template and a target under tempdirs, writes the
//! target's settings file where the engine expects it, and checks the
//! target's bytes afterwards.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tsync_core::{FileOutcome, SETTINGS_PATH, Settings, SyncEngine, SyncOptions};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn sync(template: &TempDir, target: &TempDir, dry_run: bool) -> tsync_core::SyncReport {
    let settings = Settings::load(target.path()).unwrap();
    let mut engine = SyncEngine::new(&settings, SyncOptions { dry_run }).unwrap();
    engine.sync(template.path(), target.path()).unwrap()
}

#[test]
fn test_filtered_merge_keeps_protected_line() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(template.path(), "test.txt", "abc\ndef\nabc\n");
    write(target.path(), "test.txt", "abd\ndeg\nab4\n");
    write(
        target.path(),
        SETTINGS_PATH,
        "filters:\n  - filepath: test.txt\n    filter: d\n",
    );

    let report = sync(&template, &target, false);

    assert!(report.success());
    // The filter's single suppression keeps the target's second line; the
    // other two lines follow the template.
    assert_eq!(read(target.path(), "test.txt"), "abc\ndeg\nabc\n");
}

#[test]
fn test_unfiltered_merge_adopts_template() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(template.path(), "config.yml", "name: template\nkeep: yes\n");
    write(target.path(), "config.yml", "name: target\nkeep: yes\n");

    let report = sync(&template, &target, false);

    assert!(report.success());
    assert_eq!(
        read(target.path(), "config.yml"),
        "name: template\nkeep: yes\n"
    );
}

#[test]
fn test_missing_files_are_copied_verbatim() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(template.path(), "deep/dir/tool.cfg", "a = 1\nb = 2\n");

    let report = sync(&template, &target, false);

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].outcome, FileOutcome::Copied);
    assert_eq!(read(target.path(), "deep/dir/tool.cfg"), "a = 1\nb = 2\n");
}

#[test]
fn test_default_ignores_are_never_synced() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(template.path(), "README.md", "template readme\n");
    write(template.path(), "CHANGELOG.md", "template changelog\n");
    write(template.path(), "src/app.txt", "code\n");

    let report = sync(&template, &target, false);

    let paths: Vec<String> = report
        .files
        .iter()
        .map(|f| f.path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(paths, vec!["src/app.txt".to_string()]);
    assert!(!target.path().join("README.md").exists());
}

#[test]
fn test_user_ignore_list_from_settings() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(template.path(), "docs/guide.md", "guide\n");
    write(template.path(), "keep.txt", "keep\n");
    write(target.path(), SETTINGS_PATH, "ignore_list:\n  - ^docs/\n");

    sync(&template, &target, false);

    assert!(!target.path().join("docs/guide.md").exists());
    assert_eq!(read(target.path(), "keep.txt"), "keep\n");
}

#[test]
fn test_dry_run_reports_but_never_writes() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(template.path(), "a.txt", "template\n");
    write(template.path(), "b.txt", "new file\n");
    write(target.path(), "a.txt", "target\n");

    let report = sync(&template, &target, true);

    assert_eq!(report.changed(), 2);
    assert_eq!(read(target.path(), "a.txt"), "target\n");
    assert!(!target.path().join("b.txt").exists());
}

#[test]
fn test_filter_count_spans_the_whole_run() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    for name in ["one.txt", "two.txt", "three.txt"] {
        write(template.path(), name, "from template\n");
        write(target.path(), name, "local change\n");
    }
    write(
        target.path(),
        SETTINGS_PATH,
        "filters:\n  - filepath: ''\n    filter: template\n    count: 2\n",
    );

    let report = sync(&template, &target, false);

    assert!(report.success());
    // Walk order is sorted, so "one" and "three" use up the budget.
    assert_eq!(read(target.path(), "one.txt"), "local change\n");
    assert_eq!(read(target.path(), "three.txt"), "local change\n");
    assert_eq!(read(target.path(), "two.txt"), "from template\n");
}

#[test]
fn test_regex_filter_protects_version_pins() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(
        template.path(),
        "deps.txt",
        "alpha 1.0\nbravo 2.0\ncharlie 3.0\n",
    );
    write(
        target.path(),
        "deps.txt",
        "alpha 1.0\nbravo 9.9\ncharlie 3.0\n",
    );
    write(
        target.path(),
        SETTINGS_PATH,
        "filters:\n  - filepath: deps.txt\n    filter: /^bravo \\d+\\.\\d+$/\n",
    );

    let report = sync(&template, &target, false);

    // The template's bravo line matched the regex and was suppressed,
    // leaving the file byte-identical.
    assert!(report.success());
    assert_eq!(
        read(target.path(), "deps.txt"),
        "alpha 1.0\nbravo 9.9\ncharlie 3.0\n"
    );
}

#[test]
fn test_unreadable_target_file_fails_without_writing() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(template.path(), "bin.dat", "text\n");
    fs::write(target.path().join("bin.dat"), [0xff, 0xfe, 0x00]).unwrap();

    let report = sync(&template, &target, false);

    assert!(!report.success());
    assert!(matches!(
        report.files[0].outcome,
        FileOutcome::Failed { .. }
    ));
    assert_eq!(
        fs::read(target.path().join("bin.dat")).unwrap(),
        vec![0xff, 0xfe, 0x00]
    );
}

#[test]
fn test_large_tree_mixed_outcomes() {
    let template = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    write(template.path(), "same.txt", "stable\n");
    write(target.path(), "same.txt", "stable\n");
    write(template.path(), "changed.txt", "v2\n");
    write(target.path(), "changed.txt", "v1\n");
    write(template.path(), "fresh.txt", "hello\n");

    let report = sync(&template, &target, false);

    let outcomes: Vec<(String, FileOutcome)> = report
        .files
        .iter()
        .map(|f| (f.path.to_string_lossy().into_owned(), f.outcome.clone()))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("changed.txt".to_string(), FileOutcome::Patched),
            ("fresh.txt".to_string(), FileOutcome::Copied),
            ("same.txt".to_string(), FileOutcome::Unchanged),
        ]
    );
}
