//! # Create Command Implementation
//!
//! Builds a distribution for the requirements. An existing dist that already
//! satisfies them is reused unless `--force-build` is given.

use anyhow::{Context as _, Result};
use clap::Args;
use log::info;

use distforge::phases::orchestrator::execute_create;

use super::Session;
use crate::cli::GlobalArgs;

/// Build a distribution
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Only print what would be built, without building.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `create` command.
pub fn execute(globals: &GlobalArgs, args: CreateArgs) -> Result<()> {
    let mut session = Session::open(globals)?;
    if session.requirements.is_empty() {
        anyhow::bail!("No requirements given; pass --requirements or set them in the config file");
    }

    let dist = session.select_dist()?;
    if !dist.needs_build {
        info!("{} already satisfies the requirements, nothing to build", dist.name);
        println!("{}", dist.dist_dir.display());
        return Ok(());
    }
    if args.dry_run {
        println!(
            "Would build {} with recipes ({})",
            session.output.name(&dist.name),
            dist.recipes.join(", ")
        );
        return Ok(());
    }

    let mut state = session.state()?;
    let Session {
        ctx,
        recipes,
        bootstraps,
        bootstrap,
        force_build,
        ..
    } = &mut session;
    execute_create(
        ctx,
        &mut state,
        recipes,
        bootstraps,
        &dist,
        bootstrap.as_deref(),
        *force_build,
    )
    .with_context(|| format!("Failed to create distribution {}", dist.name))?;

    println!("{}", dist.dist_dir.display());
    Ok(())
}
