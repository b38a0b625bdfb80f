//! # Distribution Commands
//!
//! `distributions`, `delete-dist`, `export-dist` and `symlink-dist`. The
//! last three act on the dist selected by `--dist-name` and
//! `--requirements`, which must already have been built.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use log::info;

use distforge::distribution::Distribution;
use distforge::fsutil;
use distforge::output::OutputConfig;

use super::Session;
use crate::cli::GlobalArgs;

/// Destination for an exported or linked dist
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Directory to create.
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,
}

/// Execute the `distributions` command.
pub fn execute_list(globals: &GlobalArgs) -> Result<()> {
    let session = Session::open(globals)?;
    let dists = Distribution::list(&session.ctx)?;
    if dists.is_empty() {
        println!("There are no dists currently built.");
        return Ok(());
    }
    println!("{}", session.output.heading("Distributions currently installed are:"));
    for dist in &dists {
        println!("{}", describe_dist(&session.output, dist));
    }
    Ok(())
}

/// Execute the `delete-dist` command.
pub fn execute_delete(globals: &GlobalArgs) -> Result<()> {
    let session = Session::open(globals)?;
    let dist = session.select_dist()?;
    if dist.needs_build {
        info!("No dist exists that matches your requirements, exiting without deleting");
        return Ok(());
    }
    fsutil::remove_dir_if_exists(&dist.dist_dir)
        .with_context(|| format!("Failed to delete {}", dist.dist_dir.display()))?;
    println!("Deleted {}", dist.name);
    Ok(())
}

/// Execute the `export-dist` command.
pub fn execute_export(globals: &GlobalArgs, args: OutputArgs) -> Result<()> {
    let session = Session::open(globals)?;
    let dist = session.prebuilt_dist()?;
    ensure_free(&args.output)?;
    info!("Copying {} to {}", dist.name, args.output.display());
    fsutil::copy_tree(&dist.dist_dir, &args.output)
        .with_context(|| format!("Failed to export {}", dist.name))?;
    println!("{}", args.output.display());
    Ok(())
}

/// Execute the `symlink-dist` command.
pub fn execute_symlink(globals: &GlobalArgs, args: OutputArgs) -> Result<()> {
    let session = Session::open(globals)?;
    let dist = session.prebuilt_dist()?;
    ensure_free(&args.output)?;
    info!("Linking {} at {}", dist.name, args.output.display());
    symlink_dir(&dist.dist_dir, &args.output)
        .with_context(|| format!("Failed to link {}", dist.name))?;
    println!("{}", args.output.display());
    Ok(())
}

fn ensure_free(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    Ok(())
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

fn describe_dist(output: &OutputConfig, dist: &Distribution) -> String {
    let mut line = format!(
        "\t{}: includes recipes ({})",
        output.name(&dist.name),
        dist.recipes.join(", ")
    );
    if !dist.archs.is_empty() {
        line.push_str(&format!(", built for archs ({})", dist.archs.join(", ")));
    }
    if let Some(bootstrap) = &dist.bootstrap {
        line.push_str(&format!(" {}", output.detail(format!("[{}]", bootstrap))));
    }
    line
}
