//! Phase 5: Biglink
//!
//! Links the relocatable object fragments every recipe left behind into a
//! single shared library per architecture, `libpymodules.so` in the libs
//! collection.
//!
//! ## Process
//!
//! 1.  **Collation**: the collation directory is rebuilt from scratch and
//!     each recipe's object-files directory is copied into it. Recipes
//!     without one, or with an empty one, are skipped with a notice.
//!
//! 2.  **Fragment discovery**: a fragment is a `<lib>.so.o` file with a
//!     `<lib>.so.libs` sibling holding the linker flags it needs.
//!
//! 3.  **Link**: the fragments and their flags are deduplicated (see
//!     [`link_arguments`]) and handed to the architecture's `CC` with
//!     `-shared`.
//!
//! No fragments at all is not an error: none of the resolved recipes
//! produces native extension code, and nothing is linked.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::Phase;
use crate::arch::Arch;
use crate::context::Context;
use crate::error::Result;
use crate::fsutil;
use crate::process::Invocation;
use crate::recipe::BuildSteps;

/// File name of the linked library.
pub const LIBRARY_NAME: &str = "libpymodules.so";

/// Execute Phase 5 on `arch`. Returns the linked library, or `None` when
/// there was nothing to link.
pub fn execute(ctx: &Context, recipes: &[&dyn BuildSteps], arch: &Arch) -> Result<Option<PathBuf>> {
    link(ctx, recipes, arch).map_err(|e| e.in_arch_phase(Phase::Biglink.as_str(), &arch.name))
}

fn link(ctx: &Context, recipes: &[&dyn BuildSteps], arch: &Arch) -> Result<Option<PathBuf>> {
    info!("Collating object files from each recipe");
    let collated = collate_objects(ctx, recipes, arch)?;
    let fragments = find_fragments(&collated)?;
    if fragments.is_empty() {
        info!("There seem to be no libraries to biglink, skipping");
        return Ok(None);
    }

    let mut raw = Vec::new();
    for fragment in &fragments {
        raw.push(fragment.display().to_string());
        let flags = fs::read_to_string(libs_file(fragment))?;
        raw.extend(flags.split_whitespace().map(str::to_string));
    }
    let extra_dirs = extra_link_dirs(ctx, arch);
    let args = link_arguments(raw, &extra_dirs);

    let mut env = arch.env(ctx);
    if let Some(ldflags) = env.get_mut("LDFLAGS") {
        for dir in &extra_dirs {
            ldflags.push_str(&format!(" -L{}", dir.display()));
        }
    }

    let target = ctx.get_libs_dir(arch)?.join(LIBRARY_NAME);
    info!("Biglinking {} fragment(s) into {}", fragments.len(), target.display());
    let cc = env.get("CC").cloned().unwrap_or_else(|| "cc".to_string());
    let mut cc = cc.split_whitespace();
    let program = cc.next().unwrap_or("cc");
    ctx.runner.run(
        &Invocation::new(program)
            .args(cc)
            .args(["-shared", "-O3", "-o"])
            .arg(target.display().to_string())
            .args(args)
            .envs(&env),
    )?;
    Ok(Some(target))
}

/// Where fragments are gathered: inside the prepared bootstrap when there
/// is one, the build directory otherwise.
pub fn collation_dir(ctx: &Context) -> PathBuf {
    ctx.bootstrap_build_dir()
        .unwrap_or_else(|_| ctx.build_dir())
        .join("collated_objects")
}

/// Rebuild the collation directory from every recipe's object files.
pub fn collate_objects(ctx: &Context, recipes: &[&dyn BuildSteps], arch: &Arch) -> Result<PathBuf> {
    let collated = collation_dir(ctx);
    fsutil::remove_dir_if_exists(&collated)?;
    fs::create_dir_all(&collated)?;
    for recipe in recipes {
        let objects = match recipe.object_files_dir(ctx, arch) {
            Some(dir) if dir.is_dir() => dir,
            _ => {
                info!("{} recipe has no biglinkable files dir, skipping", recipe.name());
                continue;
            }
        };
        if !fsutil::has_entries(&objects) {
            info!("{} recipe has no biglinkable files, skipping", recipe.name());
            continue;
        }
        info!("{} recipe has object files, copying", recipe.name());
        fsutil::copy_tree(&objects, &collated)?;
    }
    Ok(collated)
}

/// `*.so.o` files in `dir` that have a matching `*.so.libs`, sorted.
fn find_fragments(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut fragments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_fragment = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".so.o"));
        if is_fragment && libs_file(&path).is_file() {
            fragments.push(path);
        }
    }
    fragments.sort();
    Ok(fragments)
}

/// `foo.so.o` -> `foo.so.libs`
fn libs_file(fragment: &Path) -> PathBuf {
    fragment.with_extension("libs")
}

fn extra_link_dirs(ctx: &Context, arch: &Arch) -> Vec<PathBuf> {
    match ctx.bootstrap_build_dir() {
        Ok(dir) => vec![dir.join("obj").join("local").join(&arch.name)],
        Err(_) => Vec::new(),
    }
}

/// Deduplicate a raw link line.
///
/// Drains `raw` from the end, dropping bare `-L` tokens and inserting each
/// unseen token at the front, so only the last occurrence of a flag
/// survives and relative order is kept. Then appends `-L<dir>` for each
/// extra directory not already present.
pub fn link_arguments(mut raw: Vec<String>, extra_link_dirs: &[PathBuf]) -> Vec<String> {
    let mut unique: VecDeque<String> = VecDeque::with_capacity(raw.len());
    while let Some(arg) = raw.pop() {
        if arg == "-L" {
            continue;
        }
        if !unique.contains(&arg) {
            unique.push_front(arg);
        }
    }
    for dir in extra_link_dirs {
        let link = format!("-L{}", dir.display());
        if !unique.contains(&link) {
            unique.push_back(link);
        }
    }
    unique.into()
}
