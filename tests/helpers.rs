//! Shared test utilities for levipack tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use levipack::privilege::Elevator;
use levipack::rootfs::licenses::PackageResolver;
use levipack::rootfs::DistTree;

/// Test environment with a temporary staging directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Staging root for the distribution tree
    pub staging: PathBuf,
    /// Mock workspace directory (source of binaries)
    pub workspace: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let staging = base.join("staging");
        let workspace = base.join("workspace");
        fs::create_dir_all(&staging).expect("Failed to create staging dir");
        fs::create_dir_all(&workspace).expect("Failed to create workspace dir");

        Self {
            _temp_dir: temp_dir,
            staging,
            workspace,
        }
    }

    pub fn tree(&self) -> DistTree {
        DistTree::new(&self.staging)
    }
}

/// Create a mock executable binary file.
pub fn create_mock_binary(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir for binary");
    }
    fs::write(path, "#!/bin/sh\necho mock\n").expect("Failed to create mock binary");
}

/// Create a mock shared library file.
pub fn create_mock_library(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir for library");
    }
    fs::write(path, b"mock library").expect("Failed to create mock library");
}

/// Package resolver backed by a fixed file-name -> package map.
pub struct FakeResolver {
    packages: HashMap<String, String>,
}

impl FakeResolver {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        let packages = entries
            .iter()
            .map(|(lib, pkg)| (lib.to_string(), pkg.to_string()))
            .collect();
        Self { packages }
    }
}

impl PackageResolver for FakeResolver {
    fn owning_package(&self, library: &Path) -> Result<String> {
        let name = library
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("bad library path"))?;
        self.packages
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("no package owns '{}'", name))
    }
}

/// Elevator double that records every call in order. Optionally fails the
/// archive step to exercise cleanup paths. Non-archive operations are
/// no-ops on the filesystem.
pub struct RecordingElevator {
    pub calls: RefCell<Vec<String>>,
    pub fail_archive: bool,
}

impl RecordingElevator {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_archive: false,
        }
    }

    pub fn failing_archive() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_archive: true,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Elevator for RecordingElevator {
    fn chmod(&self, mode: &str, path: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("chmod {} {}", mode, path.display()));
        Ok(())
    }

    fn chown_recursive(&self, owner: &str, path: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("chown -R {} {}", owner, path.display()));
        Ok(())
    }

    fn add_set_id_bits(&self, path: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("set-id {}", path.display()));
        Ok(())
    }

    fn archive(&self, src_dir: &Path, output: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("archive {} -> {}", src_dir.display(), output.display()));
        if self.fail_archive {
            Err(anyhow!("simulated archive failure"))
        } else {
            Ok(())
        }
    }

    fn restore_owner(&self, path: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("restore {}", path.display()));
        Ok(())
    }
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "Expected file to exist: {}", path.display());
}

/// Assert that a directory exists.
pub fn assert_dir_exists(path: &Path) {
    assert!(path.is_dir(), "Expected directory to exist: {}", path.display());
}

/// Assert that a symlink exists and points to the expected target.
pub fn assert_symlink(path: &Path, expected_target: &str) {
    assert!(
        path.is_symlink(),
        "Expected symlink at {}, but it's not a symlink",
        path.display()
    );
    let target = fs::read_link(path).expect("Failed to read symlink");
    assert_eq!(
        target.to_string_lossy(),
        expected_target,
        "Symlink {} points to {:?}, expected {}",
        path.display(),
        target,
        expected_target
    );
}

/// Sorted listing of every file and symlink under a directory, with file
/// contents, for byte-identical comparisons.
pub fn snapshot_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut entries = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.expect("walk failed");
        let rel = entry
            .path()
            .strip_prefix(root)
            .expect("entry outside root")
            .to_string_lossy()
            .into_owned();
        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path()).expect("read_link failed");
            entries.push((rel, target.to_string_lossy().into_owned().into_bytes()));
        } else if entry.file_type().is_file() {
            entries.push((rel, fs::read(entry.path()).expect("read failed")));
        }
    }
    entries.sort();
    entries
}
