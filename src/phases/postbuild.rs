//! Phase 6: Postbuild
//!
//! Per-recipe finalization, run once biglink has produced the shared
//! library for the architecture.

use log::info;

use super::{BuildRun, Phase};
use crate::arch::Arch;
use crate::error::Result;
use crate::recipe::BuildSteps;

/// Execute Phase 6 for every recipe on `arch`.
pub fn execute(run: &mut BuildRun<'_>, recipes: &[&dyn BuildSteps], arch: &Arch) -> Result<()> {
    info!("# Postbuilding recipes for {}", arch);
    for recipe in recipes {
        run.cached(*recipe, Phase::Postbuild, Some(&arch.name), |ctx| {
            recipe.postbuild(ctx, arch)
        })
        .map_err(|e| e.in_phase(recipe.name(), Phase::Postbuild.as_str(), &arch.name))?;
    }
    Ok(())
}
