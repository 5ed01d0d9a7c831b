//! End-to-end scans over real on-disk trees.

mod common;

use std::path::PathBuf;

use disk_survey_agent::core::config::{ScanMode, ScanRequest};
use disk_survey_agent::scanner::walker::ScanEngine;

use common::{age_file, build_file, canonical_key, engine, fixture_dir, request};

#[test]
fn small_tree_is_scanned_completely() {
    let dir = fixture_dir("small-tree-");
    build_file(&dir.path().join("one.bin"), 10);
    build_file(&dir.path().join("two.bin"), 20);
    build_file(&dir.path().join("three.bin"), 30);
    build_file(&dir.path().join("a/four.bin"), 40);
    build_file(&dir.path().join("a/five.bin"), 50);
    build_file(&dir.path().join("a/b/six.bin"), 60);

    let report = engine().run(&request(dir.path())).expect("scan");

    assert!(!report.partial, "reason: {:?}", report.reason);
    assert!(report.reason.is_none());
    assert!(report.checkpoint.is_none());
    assert_eq!(report.summary.files_scanned, 6);
    assert_eq!(report.summary.dirs_scanned, 3);
    assert_eq!(report.summary.bytes_scanned, 210);
    assert_eq!(report.summary.max_depth_reached, 2);
    assert_eq!(report.summary.permission_denied_count, 0);
    assert!(report.errors.is_empty());
    assert_eq!(report.path, canonical_key(dir.path()).to_string_lossy());
}

#[test]
fn directory_sizes_are_subtree_totals_after_rollup() {
    let dir = fixture_dir("rollup-");
    build_file(&dir.path().join("root.bin"), 10);
    build_file(&dir.path().join("a/direct.bin"), 40);
    build_file(&dir.path().join("a/b/deep.bin"), 60);

    let report = engine().run(&request(dir.path())).expect("scan");

    let dir_a = report
        .top_largest_dirs
        .iter()
        .find(|entry| entry.path.ends_with("/a"))
        .expect("aggregate for a");
    assert_eq!(dir_a.size_bytes, 100);
    assert_eq!(dir_a.file_count, 2);
    assert!(!dir_a.incomplete);

    let root = report
        .top_largest_dirs
        .iter()
        .find(|entry| entry.path == report.path)
        .expect("aggregate for root");
    assert_eq!(root.size_bytes, 110);
    assert_eq!(root.file_count, 3);
}

#[test]
fn depth_limit_clips_the_tree_and_flags_ancestors() {
    let dir = fixture_dir("depth-limit-");
    build_file(&dir.path().join("shallow.bin"), 1);
    build_file(&dir.path().join("a/mid.bin"), 2);
    build_file(&dir.path().join("a/b/deep.bin"), 4);
    build_file(&dir.path().join("a/b/c/deeper.bin"), 8);

    let report = engine()
        .run(&ScanRequest {
            max_depth: Some(1),
            ..request(dir.path())
        })
        .expect("scan");

    assert!(report.partial);
    assert!(
        report
            .reason
            .as_deref()
            .is_some_and(|reason| reason.contains("max depth")),
        "reason: {:?}",
        report.reason
    );
    // Only root (depth 0) and a (depth 1) were listed.
    assert_eq!(report.summary.files_scanned, 2);
    assert_eq!(report.summary.bytes_scanned, 3);
    assert_eq!(report.summary.max_depth_reached, 1);
    // b was discovered but clipped; c never existed for the scan.
    assert_eq!(report.summary.dirs_scanned, 3);

    for suffix in ["/a/b", "/a"] {
        let entry = report
            .top_largest_dirs
            .iter()
            .find(|entry| entry.path.ends_with(suffix))
            .expect("clipped aggregate");
        assert!(entry.incomplete, "{suffix} should be incomplete");
    }
    let root = report
        .top_largest_dirs
        .iter()
        .find(|entry| entry.path == report.path)
        .expect("root aggregate");
    assert!(root.incomplete);
}

#[test]
fn entry_ceiling_stops_the_scan_with_a_checkpoint() {
    let dir = fixture_dir("entry-ceiling-");
    for sub in 0..10 {
        for file in 0..10 {
            build_file(&dir.path().join(format!("sub{sub}/f{file}.bin")), 1);
        }
    }

    let report = engine()
        .run(&ScanRequest {
            max_entries: Some(15),
            workers: Some(1),
            ..request(dir.path())
        })
        .expect("scan");

    assert!(report.partial);
    assert!(
        report
            .reason
            .as_deref()
            .is_some_and(|reason| reason.contains("max entries")),
        "reason: {:?}",
        report.reason
    );
    // Root listing spends 10 entries on the subdirectories; the first
    // popped subdirectory gets 5 more files before the ceiling.
    assert_eq!(report.summary.files_scanned, 5);

    let checkpoint = report.checkpoint.expect("checkpoint");
    assert_eq!(checkpoint.pending_dirs.len(), 9);
    assert!(!checkpoint.truncated);

    let root = report
        .top_largest_dirs
        .iter()
        .find(|entry| entry.path == report.path)
        .expect("root aggregate");
    assert!(root.incomplete);
}

#[test]
fn top_files_are_exactly_the_largest() {
    let dir = fixture_dir("top-files-");
    for size_kib in 1..=12u64 {
        build_file(
            &dir.path().join(format!("f{size_kib}.bin")),
            size_kib * 1024,
        );
    }

    let report = engine()
        .run(&ScanRequest {
            top_files: Some(5),
            ..request(dir.path())
        })
        .expect("scan");

    let sizes: Vec<u64> = report
        .top_largest_files
        .iter()
        .map(|entry| entry.size_bytes)
        .collect();
    assert_eq!(
        sizes,
        vec![12 * 1024, 11 * 1024, 10 * 1024, 9 * 1024, 8 * 1024]
    );
}

#[test]
fn duplicate_names_with_matching_sizes_group_across_directories() {
    let dir = fixture_dir("duplicates-");
    build_file(&dir.path().join("x/report.txt"), 2048);
    build_file(&dir.path().join("y/report (copy).txt"), 2048);
    build_file(&dir.path().join("z/unique.dat"), 999);

    let report = engine().run(&request(dir.path())).expect("scan");

    assert_eq!(report.duplicate_candidates.len(), 1);
    let group = &report.duplicate_candidates[0];
    assert_eq!(group.base_name, "report.txt");
    assert_eq!(group.size_bytes, 2048);
    assert_eq!(group.count, 2);
    assert_eq!(group.paths.len(), 2);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_skipped_unless_followed() {
    let dir = fixture_dir("symlinks-");
    build_file(&dir.path().join("real/payload.bin"), 100);
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link"))
        .expect("symlink");

    let skipped = engine().run(&request(dir.path())).expect("scan");
    assert_eq!(skipped.summary.files_scanned, 1);
    assert_eq!(skipped.summary.bytes_scanned, 100);

    let followed = engine()
        .run(&ScanRequest {
            follow_symlinks: true,
            ..request(dir.path())
        })
        .expect("scan");
    // The target is reachable both directly and through the link, but its
    // contents count exactly once.
    assert_eq!(followed.summary.files_scanned, 1);
    assert_eq!(followed.summary.bytes_scanned, 100);
}

#[test]
fn concrete_cleanup_scenario_classifies_as_documented() {
    let dir = fixture_dir("scenario-");
    build_file(&dir.path().join("big.log"), 150 * 1024 * 1024);
    build_file(&dir.path().join("tmp/a.tmp"), 10 * 1024);
    build_file(&dir.path().join("archive/old.zip"), 5 * 1024 * 1024);
    age_file(&dir.path().join("archive/old.zip"), 60);

    let report = engine().run(&request(dir.path())).expect("scan");

    assert_eq!(report.unrotated_logs.len(), 1);
    assert!(report.unrotated_logs[0].path.ends_with("/big.log"));

    let temp = report
        .temp_accumulation
        .iter()
        .find(|usage| usage.category == "temp_files")
        .expect("temp category");
    assert_eq!(temp.bytes, 10 * 1024);
    assert_eq!(temp.file_count, 1);

    // Wrong path shape: old.zip is not under a user downloads directory.
    assert!(report.old_downloads.is_empty());

    assert_eq!(
        report.summary.bytes_scanned,
        150 * 1024 * 1024 + 10 * 1024 + 5 * 1024 * 1024
    );

    let candidate = report
        .cleanup_candidates
        .iter()
        .find(|candidate| candidate.path.ends_with("/tmp/a.tmp"))
        .expect("cleanup candidate");
    assert_eq!(candidate.category, "temp_files");
}

#[test]
fn stale_files_under_a_home_downloads_tree_are_reported() {
    let dir = fixture_dir("downloads-");
    let stale = dir.path().join("home/alice/downloads/dataset.tar");
    build_file(&stale, 4096);
    age_file(&stale, 45);
    let fresh = dir.path().join("home/alice/downloads/new.tar");
    build_file(&fresh, 4096);

    let report = engine().run(&request(dir.path())).expect("scan");

    assert_eq!(report.old_downloads.len(), 1);
    assert!(report.old_downloads[0].path.ends_with("/dataset.tar"));
}

#[test]
fn missing_root_is_a_fatal_precondition() {
    let dir = fixture_dir("missing-root-");
    let missing = dir.path().join("gone");
    let err = engine()
        .run(&ScanRequest::new(missing))
        .expect_err("must fail");
    assert_eq!(err.code(), "DSA-2001");
}

#[test]
fn file_root_is_rejected_as_not_a_directory() {
    let dir = fixture_dir("file-root-");
    let file = dir.path().join("plain.bin");
    build_file(&file, 1);
    let err = engine().run(&ScanRequest::new(file)).expect_err("must fail");
    assert_eq!(err.code(), "DSA-2002");
}

#[test]
fn trash_locations_feed_usage_and_cleanup_candidates() {
    let dir = fixture_dir("trash-");
    build_file(&dir.path().join("tree/keep.bin"), 1);
    let trash = dir.path().join("trash-files");
    build_file(&trash.join("old1.bin"), 300);
    build_file(&trash.join("nested/old2.bin"), 200);
    let missing_trash = dir.path().join("no-such-trash");

    let report = ScanEngine::new()
        .with_trash_paths(vec![trash.clone(), missing_trash])
        .run(&request(&dir.path().join("tree")))
        .expect("scan");

    assert_eq!(report.trash_usage.len(), 1);
    assert_eq!(report.trash_usage[0].size_bytes, 500);
    assert_eq!(report.trash_usage[0].file_count, 2);
    assert!(!report.trash_usage[0].truncated);

    let candidate = report
        .cleanup_candidates
        .iter()
        .find(|candidate| candidate.category == "trash")
        .expect("trash candidate");
    assert_eq!(candidate.size_bytes, 500);
    // The missing location is skipped silently.
    assert!(report.errors.is_empty());
}

#[cfg(unix)]
#[test]
fn unreadable_subtrees_degrade_to_recorded_errors() {
    use std::os::unix::fs::PermissionsExt;

    let dir = fixture_dir("permissions-");
    build_file(&dir.path().join("open/ok.bin"), 10);
    let locked = dir.path().join("locked");
    build_file(&locked.join("secret.bin"), 20);
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000))
        .expect("chmod");

    // Root can read through 0o000; nothing to assert in that case.
    if std::fs::read_dir(&locked).is_ok() {
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
            .expect("chmod back");
        return;
    }

    let report = engine().run(&request(dir.path())).expect("scan");

    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
        .expect("chmod back");

    assert!(report.summary.permission_denied_count >= 1);
    assert!(
        report
            .errors
            .iter()
            .any(|entry| entry.path.ends_with("/locked"))
    );
    // Unreadable subtrees do not fail the scan or make it partial.
    assert!(!report.partial);
    assert_eq!(report.summary.files_scanned, 1);

    let locked_entry = report
        .top_largest_dirs
        .iter()
        .find(|entry| entry.path.ends_with("/locked"))
        .expect("locked aggregate");
    assert!(locked_entry.incomplete);
}

#[test]
fn incremental_mode_scans_only_existing_targets() {
    let dir = fixture_dir("incremental-");
    build_file(&dir.path().join("a/inside.bin"), 10);
    build_file(&dir.path().join("b/outside.bin"), 20);

    let report = engine()
        .run(&ScanRequest {
            scan_mode: ScanMode::Incremental,
            target_directories: vec![dir.path().join("a"), dir.path().join("missing")],
            ..request(dir.path())
        })
        .expect("scan");

    assert_eq!(report.summary.files_scanned, 1);
    assert_eq!(report.summary.bytes_scanned, 10);
    // Only the target directory was ever discovered.
    assert_eq!(report.summary.dirs_scanned, 1);
    assert!(!report.partial);
}

#[test]
fn requests_survive_a_json_round_trip() {
    let request = ScanRequest {
        max_depth: Some(4),
        target_directories: vec![PathBuf::from("/data/a")],
        ..ScanRequest::new("/data")
    };
    let json = serde_json::to_string(&request).expect("serialize");
    assert!(json.contains("\"scanMode\":\"baseline\""));
    assert!(json.contains("\"targetDirectories\""));
    let back: ScanRequest = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.max_depth, Some(4));
    assert_eq!(back.path, PathBuf::from("/data"));
}
