//! License aggregation for bundled dependencies.
//!
//! Every bundled library (and the loader) is redistributed, so its license
//! text travels with the image: one canonical copy per owning package under
//! `misc/licenses/libs/<package>/`, plus an alias symlink named after each
//! library file. A separate whole-workspace manifest covers the packer's
//! own crate dependencies.

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::process::Cmd;

use super::elf::Dependencies;
use super::{lib_licenses_dir, licenses_dir, DistTree};

/// Where the host keeps per-package license texts.
pub const DOC_ROOT: &str = "/usr/share/doc";

/// Canonical license file name inside a package's doc directory.
pub const LICENSE_FILE: &str = "copyright";

/// Suffix appended to a library file name to form its alias.
pub const ALIAS_SUFFIX: &str = ".copyright";

/// Resolves which package owns a file on the host.
///
/// Typed seam over the lookup tool so the aggregation logic only sees a
/// package name or a failure, and tests can substitute a double.
pub trait PackageResolver {
    fn owning_package(&self, library: &Path) -> Result<String>;
}

/// Real resolver backed by `dpkg -S`.
///
/// Tries the path as given first, then its fully resolved (symlink-free)
/// form; dpkg indexes whichever one the package shipped. Both failing is
/// fatal - license provenance is never silently skipped.
pub struct DpkgResolver;

impl PackageResolver for DpkgResolver {
    fn owning_package(&self, library: &Path) -> Result<String> {
        if let Ok(package) = query_dpkg(library) {
            return Ok(package);
        }
        let resolved = fs::canonicalize(library)
            .with_context(|| format!("Failed to resolve '{}'", library.display()))?;
        query_dpkg(&resolved).with_context(|| {
            format!(
                "No package owns '{}' (also tried '{}')",
                library.display(),
                resolved.display()
            )
        })
    }
}

fn query_dpkg(path: &Path) -> Result<String> {
    let result = Cmd::new("dpkg")
        .arg("-S")
        .arg_path(path)
        .error_msg(format!("Package lookup failed for '{}'", path.display()))
        .run()?;

    parse_dpkg_output(&result.stdout)
        .ok_or_else(|| anyhow!("Unparsable package lookup output for '{}'", path.display()))
}

/// Extract the package name from `dpkg -S` output.
///
/// A line looks like `libc6:amd64: /lib/x86_64-linux-gnu/libc.so.6`; the
/// name is everything before the first colon (the arch qualifier follows
/// it). The first matching line wins.
pub fn parse_dpkg_output(output: &str) -> Option<String> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    let name = line.split(':').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Collects license texts for every distinct dependency across all
/// relocated binaries. Deduplicates overlapping dependency sets and is
/// idempotent against a tree that already contains some entries.
pub struct LicenseAggregator<'a> {
    tree: &'a DistTree,
    resolver: &'a dyn PackageResolver,
    doc_root: PathBuf,
    copied_packages: HashSet<String>,
    aliased_libraries: HashSet<OsString>,
}

impl<'a> LicenseAggregator<'a> {
    pub fn new(tree: &'a DistTree, resolver: &'a dyn PackageResolver) -> Self {
        Self {
            tree,
            resolver,
            doc_root: PathBuf::from(DOC_ROOT),
            copied_packages: HashSet::new(),
            aliased_libraries: HashSet::new(),
        }
    }

    /// Use a different license database root (tests).
    pub fn with_doc_root(mut self, doc_root: impl Into<PathBuf>) -> Self {
        self.doc_root = doc_root.into();
        self
    }

    /// Aggregate the loader and every library of one dependency set.
    pub fn add_dependencies(&mut self, deps: &Dependencies) -> Result<()> {
        for path in deps.all_paths() {
            self.add_library(path)?;
        }
        Ok(())
    }

    /// Aggregate one library: canonical copy at most once per package,
    /// alias symlink at most once per library file name.
    pub fn add_library(&mut self, library: &Path) -> Result<()> {
        let package = self.resolver.owning_package(library)?;
        let library_name = library
            .file_name()
            .ok_or_else(|| anyhow!("Library path has no file name: {}", library.display()))?;

        let package_dir = self.tree.host(&lib_licenses_dir().join(&package));
        fs::create_dir_all(&package_dir)
            .with_context(|| format!("Failed to create license directory for '{}'", package))?;

        let canonical = package_dir.join(LICENSE_FILE);
        if self.copied_packages.insert(package.clone()) && !canonical.exists() {
            let source = self.doc_root.join(&package).join(LICENSE_FILE);
            fs::copy(&source, &canonical).with_context(|| {
                format!(
                    "Failed to copy the license text of package '{}' from {}",
                    package,
                    source.display()
                )
            })?;
        }

        let mut alias_name = library_name.to_os_string();
        alias_name.push(ALIAS_SUFFIX);
        let alias = package_dir.join(&alias_name);
        if self.aliased_libraries.insert(alias_name) && alias.symlink_metadata().is_err() {
            symlink(LICENSE_FILE, &alias).with_context(|| {
                format!("Failed to create license alias for '{}'", library.display())
            })?;
        }

        Ok(())
    }
}

/// Generate the whole-workspace crate license manifest.
///
/// Covers the packer's own upstream source dependencies, not the bundled
/// shared libraries. Runs the generator once per run; failure is fatal.
pub fn generate_crate_manifest(tree: &DistTree, workspace: &Path) -> Result<()> {
    println!("Generating crate license manifest...");

    let result = Cmd::new("cargo")
        .arg("about")
        .arg("generate")
        .arg("about.hbs")
        .dir(workspace)
        .error_msg("'cargo about generate' failed")
        .run()?;

    let manifest = tree.host(&licenses_dir().join("crate-license.html"));
    fs::write(&manifest, result.stdout)
        .with_context(|| format!("Failed to write '{}'", manifest.display()))?;

    Ok(())
}
