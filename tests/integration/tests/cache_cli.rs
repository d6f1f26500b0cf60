//! Integration tests for the wncache binary
//!
//! Drives clear/list/show against a temporary cache root populated with
//! real cache files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn wncache_cmd(root: &Path) -> Command {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("Failed to find workspace root");
    let bin_path = workspace_root.join("target/debug/wncache");
    let mut cmd = Command::new(bin_path);
    cmd.arg("--root").arg(root);
    cmd
}

fn seed_cache(root: &Path, name: &str, entries: serde_json::Value) {
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(root.join(format!("{name}.json")), entries.to_string()).unwrap();
}

mod list {
    use super::*;

    #[test]
    fn lists_cache_files_with_entry_counts() {
        let root = tempdir().unwrap();
        seed_cache(
            root.path(),
            "links",
            serde_json::json!({"a.md": ["b.md"], "c.md": []}),
        );
        seed_cache(root.path(), "toc", serde_json::json!({"index.md": []}));

        wncache_cmd(root.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("links\t2 entries"))
            .stdout(predicate::str::contains("toc\t1 entries"));
    }

    #[test]
    fn reports_empty_root() {
        let root = tempdir().unwrap();

        wncache_cmd(root.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No caches found"));
    }
}

mod clear {
    use super::*;

    #[test]
    fn clear_all_removes_every_cache_file() {
        let root = tempdir().unwrap();
        seed_cache(root.path(), "links", serde_json::json!({"a.md": []}));
        seed_cache(root.path(), "toc", serde_json::json!({"index.md": []}));

        wncache_cmd(root.path())
            .arg("clear")
            .arg("--all")
            .assert()
            .success();

        assert!(!root.path().join("links.json").exists());
        assert!(!root.path().join("toc.json").exists());
    }

    #[test]
    fn clear_by_name_leaves_other_caches_alone() {
        let root = tempdir().unwrap();
        seed_cache(root.path(), "links", serde_json::json!({"a.md": []}));
        seed_cache(root.path(), "toc", serde_json::json!({"index.md": []}));

        wncache_cmd(root.path())
            .arg("clear")
            .arg("links")
            .assert()
            .success();

        assert!(!root.path().join("links.json").exists());
        assert!(root.path().join("toc.json").exists());
    }

    #[test]
    fn clear_requires_a_name_or_all() {
        let root = tempdir().unwrap();

        wncache_cmd(root.path()).arg("clear").assert().failure();
    }
}

mod show {
    use super::*;

    #[test]
    fn prints_entries_without_the_validation_stamp() {
        let root = tempdir().unwrap();
        seed_cache(
            root.path(),
            "links",
            serde_json::json!({"__validate": "v1", "a.md": ["b.md"]}),
        );

        wncache_cmd(root.path())
            .arg("show")
            .arg("links")
            .assert()
            .success()
            .stdout(predicate::str::contains("a.md"))
            .stdout(predicate::str::contains("__validate").not());
    }

    #[test]
    fn fails_for_unknown_cache() {
        let root = tempdir().unwrap();

        wncache_cmd(root.path())
            .arg("show")
            .arg("missing")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No cache named missing"));
    }
}
