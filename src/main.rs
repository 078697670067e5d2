//! levipack - levipod distribution image packer.
//!
//! Assembles a self-contained, relocatable root filesystem tree for the
//! levipod bundle (binaries, their shared-library dependencies, license
//! texts, mountpoint skeleton) and compresses it into a tar.gz archive
//! consumed by the launcher/installer.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use levipack::config::Config;
use levipack::rootfs::{self, PackOptions};

#[derive(Parser)]
#[command(name = "levipack")]
#[command(about = "Build the relocatable levipod root filesystem image")]
#[command(
    after_help = "EXAMPLES:\n  levipack ./levipod /tmp/levipod_root.tar.gz\n  levipack --opt-dir-only ./levipod /tmp/levipod_opt.tar.gz"
)]
struct Cli {
    /// Archive only the /opt/levipod subtree (for in-place upgrades)
    #[arg(long)]
    opt_dir_only: bool,

    /// Workspace directory containing the pre-built levipod binaries
    workspace: PathBuf,

    /// Output archive path (must be absolute)
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();

    let cli = Cli::parse();
    if !cli.output.is_absolute() {
        bail!(
            "The output path must be absolute, but '{}' is relative",
            cli.output.display()
        );
    }

    let opts = PackOptions {
        workspace: cli.workspace,
        output: cli.output,
        opt_dir_only: cli.opt_dir_only,
    };
    rootfs::run(&opts, &config)
}
