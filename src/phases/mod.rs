//! Implementation of the build pipeline phases.
//!
//! ## Overview
//!
//! A build runs the resolved recipes through these phases:
//! 1. Download - fetch every recipe's source once (architecture independent)
//! 2. Unpack - materialize a fresh per-arch build directory
//! 3. Prebuild - per-arch preparation, then patch application
//! 4. Build - compile, unless the recipe reports it is already built
//! 5. Biglink - link every recipe's object fragments into one library
//! 6. Postbuild - per-recipe finalization
//! 7. Python install - pip-install requested names that have no recipe
//!
//! Phases 2 to 6 repeat for each architecture. Within an architecture each
//! phase completes for every recipe before the next one starts.
//!
//! Phases 1-3 and 6 are cached in the [`StateStore`] under
//! `<recipe>.<phase>[.<arch>]`; a cached phase is skipped unless the run is
//! forced. Build relies on [`BuildSteps::should_build`] instead, and biglink
//! always runs.

use std::fmt;

use log::info;

use crate::context::Context;
use crate::error::Result;
use crate::recipe::BuildSteps;
use crate::state::{phase_key, StateStore};

// Phase modules
pub mod biglink;
pub mod build;
pub mod download;
pub mod orchestrator;
pub mod postbuild;
pub mod prebuild;
pub mod pymodules;
pub mod unpack;

// Numbered aliases, in pipeline order
pub use biglink as phase5;
pub use build as phase4;
pub use download as phase1;
pub use postbuild as phase6;
pub use prebuild as phase3;
pub use pymodules as phase7;
pub use unpack as phase2;

/// A pipeline phase. The display name is the one recorded in state keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Download,
    Unpack,
    Prebuild,
    Build,
    Biglink,
    Postbuild,
    PythonInstall,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Download => "download",
            Phase::Unpack => "unpack",
            Phase::Prebuild => "prebuild",
            Phase::Build => "build",
            Phase::Biglink => "biglink",
            Phase::Postbuild => "postbuild",
            Phase::PythonInstall => "python_install",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Phase::Download => "Download",
            Phase::Unpack => "Unpack",
            Phase::Prebuild => "Prebuild",
            Phase::Build => "Build",
            Phase::Biglink => "Biglink",
            Phase::Postbuild => "Postbuild",
            Phase::PythonInstall => "Python install",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What every phase works with.
pub struct BuildRun<'a> {
    pub ctx: &'a Context,
    pub state: &'a mut StateStore,
    /// Re-run cached phases.
    pub force: bool,
}

impl<'a> BuildRun<'a> {
    pub fn new(ctx: &'a Context, state: &'a mut StateStore, force: bool) -> Self {
        Self { ctx, state, force }
    }

    /// Run `body` for `recipe` unless `phase` is already recorded for it.
    ///
    /// Returns whether the body ran. The completion record is written only
    /// after the body succeeds.
    pub fn cached<F>(
        &mut self,
        recipe: &dyn BuildSteps,
        phase: Phase,
        arg: Option<&str>,
        body: F,
    ) -> Result<bool>
    where
        F: FnOnce(&Context) -> Result<()>,
    {
        let key = phase_key(recipe.name(), phase.as_str(), arg);
        if !self.force && self.state.is_done(&key) {
            info!("# (ignored) {} {}", phase.title(), recipe.name());
            return Ok(false);
        }
        info!("{} {}", phase.title(), recipe.name());
        body(self.ctx)?;
        self.state.mark_done(&key)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Recipe;
    use crate::testing::test_context;

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Download.to_string(), "download");
        assert_eq!(Phase::PythonInstall.to_string(), "python_install");
    }

    #[test]
    fn test_cached_runs_once() {
        let (_temp, ctx) = test_context();
        let mut state = StateStore::open(ctx.state_path()).unwrap();
        let recipe = Recipe::new("jpeg");
        let mut run = BuildRun::new(&ctx, &mut state, false);

        let mut calls = 0;
        assert!(run
            .cached(&recipe, Phase::Unpack, Some("x86"), |_| {
                calls += 1;
                Ok(())
            })
            .unwrap());
        assert!(!run
            .cached(&recipe, Phase::Unpack, Some("x86"), |_| {
                calls += 1;
                Ok(())
            })
            .unwrap());
        assert_eq!(calls, 1);
        assert!(run.state.is_done("jpeg.unpack.x86"));
        assert!(run.state.contains("jpeg.unpack.x86.at"));
    }

    #[test]
    fn test_cached_forced_reruns() {
        let (_temp, ctx) = test_context();
        let mut state = StateStore::open(ctx.state_path()).unwrap();
        state.mark_done("jpeg.download").unwrap();
        let recipe = Recipe::new("jpeg");
        let mut run = BuildRun::new(&ctx, &mut state, true);

        let ran = run.cached(&recipe, Phase::Download, None, |_| Ok(())).unwrap();
        assert!(ran);
    }

    #[test]
    fn test_cached_failure_not_recorded() {
        let (_temp, ctx) = test_context();
        let mut state = StateStore::open(ctx.state_path()).unwrap();
        let recipe = Recipe::new("jpeg");
        let mut run = BuildRun::new(&ctx, &mut state, false);

        let result = run.cached(&recipe, Phase::Prebuild, Some("x86"), |_| {
            Err(crate::error::Error::Distribution {
                message: "boom".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(!run.state.contains("jpeg.prebuild.x86"));
    }
}
