//! Phase 1: Download
//!
//! Fetches every recipe's source into the download cache. This is the only
//! architecture-independent recipe phase, so it runs once per recipe no
//! matter how many architectures are targeted.

use log::info;

use super::{BuildRun, Phase};
use crate::error::Result;
use crate::recipe::BuildSteps;

/// Execute Phase 1 for every recipe in build order.
pub fn execute(run: &mut BuildRun<'_>, recipes: &[&dyn BuildSteps]) -> Result<()> {
    info!("# Downloading recipes");
    for recipe in recipes {
        run.cached(*recipe, Phase::Download, None, |ctx| recipe.download(ctx))
            .map_err(|e| e.in_phase(recipe.name(), Phase::Download.as_str(), "all archs"))?;
    }
    Ok(())
}
