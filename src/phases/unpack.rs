//! Phase 2: Unpack
//!
//! Creates each recipe's build container for the architecture and asks the
//! recipe to materialize a fresh build directory in it.

use std::fs;

use log::info;

use super::{BuildRun, Phase};
use crate::arch::Arch;
use crate::error::Result;
use crate::recipe::BuildSteps;

/// Execute Phase 2 for every recipe on `arch`.
pub fn execute(run: &mut BuildRun<'_>, recipes: &[&dyn BuildSteps], arch: &Arch) -> Result<()> {
    info!("# Unpacking recipes for {}", arch);
    for recipe in recipes {
        fs::create_dir_all(run.ctx.build_container(recipe.name(), arch))?;
        run.cached(*recipe, Phase::Unpack, Some(&arch.name), |ctx| {
            recipe.prepare_build_dir(ctx, arch)
        })
        .map_err(|e| e.in_phase(recipe.name(), Phase::Unpack.as_str(), &arch.name))?;
    }
    Ok(())
}
