//! Orchestrator for the complete build
//!
//! This module coordinates all phases to provide a clean API for building
//! resolved recipes, and for the end-to-end `create` operation that turns a
//! requirements list into a distribution.

use log::info;

use super::{phase1, phase2, phase3, phase4, phase5, phase6, phase7, BuildRun};
use crate::bootstrap::BootstrapCatalog;
use crate::catalog::RecipeCatalog;
use crate::context::Context;
use crate::distribution::Distribution;
use crate::error::Result;
use crate::recipe::BuildSteps;
use crate::resolver::{Resolution, Resolver};
use crate::state::StateStore;

/// Runs recipes through the build phases for every target architecture.
///
/// Architectures are built one after another. The first failure aborts the
/// whole run.
pub struct BuildOrchestrator<'a> {
    ctx: &'a Context,
    state: &'a mut StateStore,
    force: bool,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(ctx: &'a Context, state: &'a mut StateStore) -> Self {
        Self {
            ctx,
            state,
            force: false,
        }
    }

    /// Re-run phases even when the state store has them recorded.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Build `recipes` (in build order), then pip-install `python_modules`.
    pub fn run(&mut self, recipes: &[&dyn BuildSteps], python_modules: &[String]) -> Result<()> {
        let order: Vec<&str> = recipes.iter().map(|r| r.name()).collect();
        info!("Recipe build order is [{}]", order.join(", "));
        if !python_modules.is_empty() {
            info!(
                "The requirements ({}) were not found as recipes, they will be installed with pip",
                python_modules.join(", ")
            );
        }

        let ctx = self.ctx;
        let mut run = BuildRun::new(ctx, &mut *self.state, self.force);

        // Phase 1: Download
        phase1::execute(&mut run, recipes)?;

        for arch in &ctx.archs {
            info!("# Building all recipes for arch {}", arch);

            // Phase 2: Unpack
            phase2::execute(&mut run, recipes, arch)?;

            // Phase 3: Prebuild and patch
            phase3::execute(&mut run, recipes, arch)?;

            // Phase 4: Build
            phase4::execute(&run, recipes, arch)?;

            // Phase 5: Biglink
            info!("# Biglinking object files for {}", arch);
            phase5::execute(ctx, recipes, arch)?;

            // Phase 6: Postbuild
            phase6::execute(&mut run, recipes, arch)?;
        }

        // Phase 7: Python install
        info!("# Installing pure Python modules");
        phase7::execute(ctx, python_modules)
    }
}

/// Execute the complete `create` operation for `dist`.
///
/// 1. Resolve the dist's recipes, choosing a bootstrap unless one is named
/// 2. Prepare the bootstrap and dist directories
/// 3. Build every recipe for every architecture
/// 4. Assemble the dist and save its info
pub fn execute_create(
    ctx: &mut Context,
    state: &mut StateStore,
    recipes: &RecipeCatalog,
    bootstraps: &BootstrapCatalog,
    dist: &Distribution,
    bootstrap: Option<&str>,
    force: bool,
) -> Result<Resolution> {
    let resolution = Resolver::new(recipes, bootstraps).resolve(&dist.recipes, bootstrap)?;
    info!("# Creating dist with {} bootstrap", resolution.bootstrap.name);
    info!(
        "Dist will have name {} and recipes ({})",
        dist.name,
        dist.recipes.join(", ")
    );

    ctx.setup_dirs()?;
    ctx.prepare_bootstrap(&resolution.bootstrap)?;
    ctx.prepare_dist(&dist.name)?;

    let to_build = resolution
        .build_order
        .iter()
        .map(|name| recipes.get(name))
        .collect::<Result<Vec<_>>>()?;
    let steps: Vec<&dyn BuildSteps> = to_build.iter().map(|r| *r as &dyn BuildSteps).collect();

    BuildOrchestrator::new(ctx, state)
        .force(force)
        .run(&steps, &resolution.python_modules)?;

    dist.run_distribute(ctx, &resolution.build_order)?;
    info!(
        "Your distribution was created successfully: {}",
        dist.dist_dir.display()
    );
    Ok(resolution)
}
