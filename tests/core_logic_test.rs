use folder_compare::core::config::{
    CompareConfig, ComparisonKind, ConfigManager, ConfigProvider, RunOverrides,
};
use folder_compare::core::engine::CompareEngine;
use folder_compare::utils;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn setup_folders() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("folder_a");
    let b = dir.path().join("folder_b");
    fs::create_dir_all(&a).unwrap();
    fs::create_dir_all(&b).unwrap();
    (dir, a, b)
}

fn config(root: &Path, comparison: ComparisonKind, mode: &str) -> CompareConfig {
    CompareConfig {
        folder_a: root.join("folder_a"),
        folder_b: root.join("folder_b"),
        output_dir: root.join("out"),
        mode: mode.to_string(),
        workers: 3,
        comparison,
        ..CompareConfig::default()
    }
}

#[test]
fn test_both_directions_with_master_summary() {
    let (td, a, b) = setup_folders();
    fs::write(a.join("a1.txt"), "100000000001\n200000000002\n").unwrap();
    fs::write(a.join("a2.txt"), "300000000003 and 100000000001\n").unwrap();
    fs::write(a.join("skip.csv"), "999999999999\n").unwrap();
    fs::write(b.join("b1.txt"), "100000000001\n444444444444\n").unwrap();

    let engine = CompareEngine::new(config(td.path(), ComparisonKind::Ids, "both")).unwrap();
    let report = engine.run().unwrap();
    assert_eq!(report.passes.len(), 2);

    let forward = &report.passes[0].summary;
    assert_eq!(forward.pass_label, "A_to_B");
    assert_eq!(
        forward.per_source_counts,
        vec![("a1.txt".to_string(), 1), ("a2.txt".to_string(), 1)]
    );
    assert_eq!(forward.grand_total, 2);
    assert_eq!(forward.union_of_missing.len(), 2);

    let backward = &report.passes[1].summary;
    assert_eq!(backward.per_source_counts, vec![("b1.txt".to_string(), 1)]);
    assert!(backward.union_of_missing.contains("444444444444"));

    let out = td.path().join("out");
    assert!(out.join("ids_presence_summary.A_to_B.summary.txt").exists());
    assert!(out.join("a1.txt.folder_b.ids_presence.txt").exists());
    assert!(out.join("b1.txt.folder_a.ids_presence.txt").exists());
    assert!(!out.join("skip.csv.folder_b.ids_presence.txt").exists());

    let master = report.master_summary.expect("master summary written for BOTH");
    let first = fs::read_to_string(out.join("ids_presence_summary.A_to_B.summary.txt")).unwrap();
    let second = fs::read_to_string(out.join("ids_presence_summary.B_to_A.summary.txt")).unwrap();
    assert_eq!(fs::read_to_string(master).unwrap(), format!("{first}{second}"));
}

#[test]
fn test_summary_grand_total_matches_rows() {
    let (td, a, b) = setup_folders();
    fs::write(a.join("one.txt"), "x\ny\nz\n").unwrap();
    fs::write(a.join("two.txt"), "x\nq\n").unwrap();
    fs::write(b.join("ref.txt"), "x\n").unwrap();

    let engine = CompareEngine::new(config(td.path(), ComparisonKind::Lines, "A_to_B")).unwrap();
    let report = engine.run().unwrap();
    let summary = fs::read_to_string(&report.passes[0].summary_path).unwrap();

    let mut rows = 0;
    let mut total = None;
    for line in summary.lines() {
        if let Some(value) = line.strip_prefix("SUM_OF_PER_SOURCE_MISSING_COUNTS,") {
            total = Some(value.parse::<usize>().unwrap());
        } else if line.contains(".txt,") {
            rows += line.rsplit(',').next().unwrap().parse::<usize>().unwrap();
        }
    }
    assert_eq!(total, Some(rows));
    assert_eq!(rows, 3);
    assert!(report.master_summary.is_none());
}

#[test]
fn test_diff_does_not_realign_after_insertion() {
    let (td, a, b) = setup_folders();
    fs::write(a.join("same.txt"), "one\ntwo\nthree\n").unwrap();
    fs::write(b.join("same.txt"), "header\none\ntwo\nthree\n").unwrap();

    let engine = CompareEngine::new(config(td.path(), ComparisonKind::Diff, "A_to_B")).unwrap();
    let report = engine.run().unwrap();
    assert_eq!(report.passes[0].results[0].total_missing, 4);

    let diff_path = td.path().join("out").join("same.txt.folder_b.diff.txt");
    let diff = fs::read_to_string(diff_path).unwrap();
    assert_eq!(diff.matches("MISMATCH position").count(), 3);
    assert!(diff.contains("EXTRA target position 4 line 4: three\n"));
}

#[test]
fn test_invalid_mode_runs_nothing() {
    let (td, a, b) = setup_folders();
    fs::write(a.join("a.txt"), "100000000001\n").unwrap();
    fs::write(b.join("b.txt"), "100000000001\n").unwrap();

    let engine = CompareEngine::new(config(td.path(), ComparisonKind::Ids, "sideways")).unwrap();
    let report = engine.run().unwrap();
    assert!(report.passes.is_empty());
    assert!(report.master_summary.is_none());
}

#[test]
fn test_missing_folder_skips_pass_without_failing() {
    let (td, a, b) = setup_folders();
    fs::write(a.join("a.txt"), "100000000001\n").unwrap();
    fs::remove_dir_all(&b).unwrap();

    let engine = CompareEngine::new(config(td.path(), ComparisonKind::Ids, "BOTH")).unwrap();
    let report = engine.run().unwrap();
    assert!(report.passes.is_empty());
}

#[test]
fn test_empty_source_folder_still_writes_summary() {
    let (td, _a, b) = setup_folders();
    fs::write(b.join("b.txt"), "100000000001\n").unwrap();

    let engine = CompareEngine::new(config(td.path(), ComparisonKind::Ids, "A_to_B")).unwrap();
    let report = engine.run().unwrap();
    assert_eq!(report.passes.len(), 1);
    assert!(report.passes[0].results.is_empty());
    let summary = fs::read_to_string(&report.passes[0].summary_path).unwrap();
    assert!(summary.contains("# No results (no source or target files?)"));
}

#[test]
fn test_run_from_config_file_with_overrides() {
    let (td, a, b) = setup_folders();
    fs::write(a.join("a.txt"), "kept\ndropped\n").unwrap();
    fs::write(b.join("b.txt"), "kept\n").unwrap();

    let config_manager = ConfigManager::new_at(td.path().join("folder-compare.toml"));
    config_manager
        .save_config(&config(td.path(), ComparisonKind::Ids, "B_to_A"))
        .unwrap();

    utils::run_comparison(
        &config_manager,
        RunOverrides {
            mode: Some("A_to_B".to_string()),
            workers: Some(1),
            comparison: Some(ComparisonKind::Lines),
        },
    )
    .unwrap();

    let out = td.path().join("out");
    assert!(out.join("lines_missing_summary.A_to_B.summary.txt").exists());
    assert!(!out.join("lines_missing_summary.B_to_A.summary.txt").exists());
    assert_eq!(
        fs::read_to_string(out.join("a.txt.folder_b.lines_missing.count.txt")).unwrap(),
        "1\n"
    );
}

#[test]
fn test_both_mode_keeps_same_named_sources_apart() {
    let (td, a, b) = setup_folders();
    fs::write(a.join("data.txt"), "100000000001\n200000000002\n").unwrap();
    fs::write(b.join("data.txt"), "100000000001\n").unwrap();

    let engine = CompareEngine::new(config(td.path(), ComparisonKind::Ids, "BOTH")).unwrap();
    let report = engine.run().unwrap();
    assert_eq!(report.passes.len(), 2);

    let forward = &report.passes[0];
    let backward = &report.passes[1];
    assert_ne!(forward.results[0].artifacts, backward.results[0].artifacts);

    let out = td.path().join("out");
    for (pass, tag, expected) in [(forward, "folder_b", 1), (backward, "folder_a", 0)] {
        assert_eq!(
            pass.summary.per_source_counts,
            vec![("data.txt".to_string(), expected)]
        );
        let count = fs::read_to_string(out.join(format!("data.txt.{tag}.ids_missing.count.txt")))
            .unwrap();
        assert_eq!(count.trim().parse::<usize>().unwrap(), expected);
    }

    let forward_missing =
        fs::read_to_string(out.join("data.txt.folder_b.ids_missing.txt")).unwrap();
    assert!(forward_missing.contains("200000000002  # src_lines: 2"));
    let backward_missing =
        fs::read_to_string(out.join("data.txt.folder_a.ids_missing.txt")).unwrap();
    assert!(backward_missing.contains("# (none)"));
}

#[test]
fn test_failed_pass_does_not_stop_the_next_one() {
    let (td, a, b) = setup_folders();
    fs::write(a.join("a.txt"), "100000000001\n").unwrap();
    fs::write(b.join("b.txt"), "100000000001\n300000000003\n").unwrap();

    // A directory in place of the forward summary makes writing it fail.
    let out = td.path().join("out");
    fs::create_dir_all(out.join("ids_presence_summary.A_to_B.summary.txt")).unwrap();

    let engine = CompareEngine::new(config(td.path(), ComparisonKind::Ids, "BOTH")).unwrap();
    let report = engine.run().unwrap();

    assert_eq!(report.passes.len(), 1);
    assert_eq!(report.passes[0].summary.pass_label, "B_to_A");
    assert_eq!(report.passes[0].summary.grand_total, 1);
    assert!(out.join("ids_presence_summary.B_to_A.summary.txt").is_file());
    assert!(report.master_summary.is_none());
}
