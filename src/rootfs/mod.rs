//! The levipod packaging pipeline.
//!
//! Builds the distribution tree in a temporary staging directory and
//! archives it. Stage order is dictated by filesystem data dependencies:
//! skeleton, then per-binary relocation and license aggregation, then the
//! crate license manifest and static resources, then ownership
//! normalization, then the archive.

pub mod elf;
pub mod licenses;
pub mod permissions;
pub mod relocate;
pub mod resources;
pub mod skeleton;
pub mod tarball;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::common::ContainerPath;
use crate::config::Config;
use crate::preflight;
use crate::privilege::{Elevator, SudoElevator};

use licenses::{DpkgResolver, LicenseAggregator};

/// Name of the distribution namespace under /opt.
pub const DIST_NAME: &str = "levipod";

/// Binaries that are native ELF and must be relocated.
pub const RELOCATED_BINARIES: &[&str] = &["levipod", "levipod-exec"];

/// Binaries built for a foreign platform, copied verbatim.
pub const VERBATIM_BINARIES: &[&str] = &["levipod-bridge.exe"];

/// The one binary that runs with elevated privileges inside the target
/// environment and therefore carries set-id bits.
pub const SET_ID_BINARY: &str = "levipod-exec";

/// Options for one packaging run.
pub struct PackOptions {
    pub workspace: PathBuf,
    pub output: PathBuf,
    pub opt_dir_only: bool,
}

/// One binary to pack, created from the fixed lists above.
pub struct BinaryDescriptor {
    pub name: &'static str,
    pub source: PathBuf,
    pub relocate: bool,
}

/// Build the fixed per-run binary list. Pre-built outputs live at
/// `target/release/<name>` inside the workspace.
pub fn binary_descriptors(workspace: &Path) -> Vec<BinaryDescriptor> {
    let release_dir = workspace.join("target/release");
    let mut descriptors = Vec::new();
    for name in RELOCATED_BINARIES {
        descriptors.push(BinaryDescriptor {
            name,
            source: release_dir.join(name),
            relocate: true,
        });
    }
    for name in VERBATIM_BINARIES {
        descriptors.push(BinaryDescriptor {
            name,
            source: release_dir.join(name),
            relocate: false,
        });
    }
    descriptors
}

// Container-side layout of the distribution namespace. Other tools depend
// on these locations; see the launcher/installer.

pub fn opt_dir() -> ContainerPath {
    ContainerPath::new("/opt").join(DIST_NAME)
}

pub fn bin_dir() -> ContainerPath {
    opt_dir().join("bin")
}

pub fn alias_dir() -> ContainerPath {
    opt_dir().join("alias")
}

pub fn lib_dir() -> ContainerPath {
    opt_dir().join("lib")
}

pub fn ld_dir() -> ContainerPath {
    opt_dir().join("ld")
}

pub fn licenses_dir() -> ContainerPath {
    opt_dir().join("misc/licenses")
}

pub fn lib_licenses_dir() -> ContainerPath {
    licenses_dir().join("libs")
}

/// The staging directory for one packaging run. Exclusively owns every
/// file placed in it; upstream sources and the host license database are
/// only ever read.
pub struct DistTree {
    root: PathBuf,
}

impl DistTree {
    pub fn new(staging_root: &Path) -> Self {
        Self {
            root: staging_root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host-side location of a container path inside this tree.
    pub fn host(&self, path: &ContainerPath) -> PathBuf {
        path.to_host(&self.root)
    }
}

/// Run the full packaging pipeline.
pub fn run(opts: &PackOptions, config: &Config) -> Result<()> {
    anyhow::ensure!(
        opts.output.is_absolute(),
        "The output path must be absolute, but '{}' is relative",
        opts.output.display()
    );

    preflight::run_preflight_or_fail(config)?;

    let staging = tempfile::Builder::new()
        .prefix("levipack-")
        .tempdir()
        .context("Failed to create a staging directory")?;
    let tree = DistTree::new(staging.path());
    let elevator = SudoElevator::new(&config.sudo_command);

    let built = build_tree(&tree, opts, config, &elevator);
    if built.is_err() {
        // The tree may already be root-owned; hand it back to the invoking
        // user so the TempDir can be deleted on drop.
        if let Err(err) = elevator.restore_owner(tree.root()) {
            log::warn!(
                "failed to restore staging ownership during cleanup: {:#}",
                err
            );
        }
    }
    built
}

fn build_tree(
    tree: &DistTree,
    opts: &PackOptions,
    config: &Config,
    elevator: &dyn Elevator,
) -> Result<()> {
    println!("Building {} root filesystem image...", DIST_NAME);
    println!("  Workspace: {}", opts.workspace.display());
    println!("  Staging: {}", tree.root().display());
    println!("  Output: {}", opts.output.display());

    // 1. Directory skeleton (mountpoints are skipped in opt-dir-only mode;
    //    that archive contains only the distribution namespace).
    skeleton::create_skeleton(tree, !opts.opt_dir_only)?;

    // 2. Relocate each binary and aggregate its dependency licenses.
    let resolver = DpkgResolver;
    let mut aggregator = LicenseAggregator::new(tree, &resolver);
    for descriptor in binary_descriptors(&opts.workspace) {
        let deps = relocate::install_binary(tree, &descriptor)?;
        if let Some(deps) = deps {
            aggregator.add_dependencies(&deps).with_context(|| {
                format!("Failed to aggregate licenses for '{}'", descriptor.name)
            })?;
        }
    }

    // 3. Whole-workspace crate license manifest.
    licenses::generate_crate_manifest(tree, &opts.workspace)?;

    // 4. Static resources, merged verbatim into the namespace.
    resources::merge_resources(tree, &config.resources_dir(&opts.workspace))?;

    // 5. Ownership, modes and set-id bits.
    permissions::normalize(tree, elevator)?;

    // 6. Archive and hand the staging tree back to the invoking user.
    tarball::create_archive(tree, &opts.output, opts.opt_dir_only, elevator)?;

    println!("Image created: {}", opts.output.display());
    Ok(())
}
