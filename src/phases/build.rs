//! Phase 4: Build
//!
//! Not cached in the state store: whether a recipe needs building depends on
//! its artifacts being present, which only the recipe itself can tell.

use log::info;

use super::{BuildRun, Phase};
use crate::arch::Arch;
use crate::error::Result;
use crate::recipe::BuildSteps;

/// Execute Phase 4 for every recipe on `arch`.
pub fn execute(run: &BuildRun<'_>, recipes: &[&dyn BuildSteps], arch: &Arch) -> Result<()> {
    info!("# Building recipes for {}", arch);
    for recipe in recipes {
        if !recipe.should_build(run.ctx, arch) {
            info!("{} said it is already built for {}, skipping", recipe.name(), arch);
            continue;
        }
        info!("Building {} for {}", recipe.name(), arch);
        recipe
            .build(run.ctx, arch)
            .map_err(|e| e.in_phase(recipe.name(), Phase::Build.as_str(), &arch.name))?;
    }
    Ok(())
}
