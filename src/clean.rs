//! Removing build products, and reporting what has been built.
//!
//! Each clean operation deletes one area of the storage root and returns
//! whether anything was there. Phase completion lives in the state store,
//! so removing a build directory also forgets the phases recorded for it;
//! otherwise the next run would skip unpacking into a directory that no
//! longer exists.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;

use crate::context::Context;
use crate::error::Result;
use crate::fsutil;
use crate::phases::Phase;
use crate::state::StateStore;

/// Delete every distribution.
pub fn clean_dists(ctx: &Context) -> Result<bool> {
    info!("Removing distributions in {}", ctx.dist_dir().display());
    fsutil::remove_dir_if_exists(&ctx.dist_dir())
}

/// Delete all build output: recipe builds, bootstrap builds, collected
/// libraries and pure-environment installs, plus the recorded phases.
/// Downloads and dists are kept.
pub fn clean_builds(ctx: &Context, state: &mut StateStore) -> Result<bool> {
    info!("Removing build output in {}", ctx.build_dir().display());
    let removed = fsutil::remove_dir_if_exists(&ctx.build_dir())?;
    let forgotten = state.remove_all("")?;
    Ok(removed || forgotten > 0)
}

/// Delete the download cache, and forget which recipes were downloaded.
pub fn clean_download_cache(ctx: &Context, state: &mut StateStore) -> Result<bool> {
    info!("Removing download cache in {}", ctx.packages_dir().display());
    let removed = fsutil::remove_dir_if_exists(&ctx.packages_dir())?;
    let key = format!(".{}", Phase::Download.as_str());
    let record = format!("{}.at", key);
    let forgotten = state.remove_where(|k| k.ends_with(&key) || k.ends_with(&record))?;
    Ok(removed || forgotten > 0)
}

/// Delete one recipe's build containers for every arch, and its recorded
/// phases.
pub fn clean_recipe_build(ctx: &Context, state: &mut StateStore, name: &str) -> Result<bool> {
    info!("Cleaning build for {} recipe", name);
    let removed = fsutil::remove_dir_if_exists(&ctx.other_builds_dir().join(name))?;
    let forgotten = state.remove_all(&format!("{}.", name))?;
    Ok(removed || forgotten > 0)
}

/// Dists, builds and downloads.
pub fn clean_all(ctx: &Context, state: &mut StateStore) -> Result<bool> {
    let dists = clean_dists(ctx)?;
    let builds = clean_builds(ctx, state)?;
    let downloads = clean_download_cache(ctx, state)?;
    Ok(dists || builds || downloads)
}

/// What the build directory currently holds.
#[derive(Debug, Default, PartialEq)]
pub struct BuildStatus {
    /// Prepared bootstraps.
    pub bootstraps: Vec<String>,
    /// Recipe name to the archs it has a build container for.
    pub recipes: BTreeMap<String, Vec<String>>,
}

/// Read the build status from disk. Missing directories are empty.
pub fn build_status(ctx: &Context) -> Result<BuildStatus> {
    let mut status = BuildStatus {
        bootstraps: dir_names(&ctx.bootstrap_builds_dir())?,
        ..BuildStatus::default()
    };
    for recipe in dir_names(&ctx.other_builds_dir())? {
        let archs = dir_names(&ctx.other_builds_dir().join(&recipe))?;
        status.recipes.insert(recipe, archs);
    }
    Ok(status)
}

/// Sorted names of the subdirectories of `dir`.
fn dir_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
