//! # Clean Command Implementation
//!
//! Removes build products from the storage root.
//!
//! ## Subcommands
//!
//! - **`all`**: dists, builds and downloads
//! - **`builds`**: every build directory and the recorded phases
//! - **`dists`**: finished distributions
//! - **`download-cache`**: downloaded source archives
//! - **`recipe <name>`**: one recipe's builds and recorded phases

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};

use distforge::clean;

use super::Session;
use crate::cli::GlobalArgs;

/// Remove build products
#[derive(Args, Debug)]
pub struct CleanArgs {
    #[command(subcommand)]
    pub command: CleanSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CleanSubcommand {
    /// Delete dists, builds and the download cache
    All,
    /// Delete all build output, keeping downloads and dists
    Builds,
    /// Delete every built distribution
    Dists,
    /// Delete downloaded source archives
    DownloadCache,
    /// Delete the build output of one recipe
    Recipe {
        /// The recipe name
        name: String,
    },
}

/// Execute the `clean` command.
pub fn execute(globals: &GlobalArgs, args: CleanArgs) -> Result<()> {
    let session = Session::open(globals)?;
    let ctx = &session.ctx;

    let (what, removed) = match args.command {
        CleanSubcommand::All => ("everything", clean::clean_all(ctx, &mut session.state()?)?),
        CleanSubcommand::Builds => ("builds", clean::clean_builds(ctx, &mut session.state()?)?),
        CleanSubcommand::Dists => ("dists", clean::clean_dists(ctx)?),
        CleanSubcommand::DownloadCache => (
            "download cache",
            clean::clean_download_cache(ctx, &mut session.state()?)?,
        ),
        CleanSubcommand::Recipe { name } => {
            session
                .recipes
                .get(&name)
                .with_context(|| format!("Cannot clean {}", name))?;
            let removed = clean::clean_recipe_build(ctx, &mut session.state()?, &name)?;
            return report(&format!("{} build", name), removed);
        }
    };
    report(what, removed)
}

fn report(what: &str, removed: bool) -> Result<()> {
    if removed {
        println!("Cleaned {}", what);
    } else {
        println!("Nothing to clean for {}", what);
    }
    Ok(())
}
