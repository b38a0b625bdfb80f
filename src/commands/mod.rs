//! # CLI Command Implementations
//!
//! Each subcommand lives in its own file with an `Args` struct (when it
//! takes arguments beyond the globals) and an `execute` function that calls
//! into the `distforge` library.
//!
//! Commands that touch the storage root share a [`Session`]: the config file
//! merged with the global flags, the loaded catalogs and the build context.

pub mod clean;
pub mod completions;
pub mod create;
pub mod dist;
pub mod info;
pub mod order;
pub mod recipes;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use distforge::arch::Arch;
use distforge::bootstrap::BootstrapCatalog;
use distforge::catalog::RecipeCatalog;
use distforge::config::{self, Config};
use distforge::context::Context;
use distforge::defaults::default_storage_dir;
use distforge::distribution::Distribution;
use distforge::output::OutputConfig;
use distforge::process::SystemRunner;
use distforge::state::StateStore;

use crate::cli::GlobalArgs;

/// Settings and catalogs for one command invocation.
pub struct Session {
    pub ctx: Context,
    pub recipes: RecipeCatalog,
    pub bootstraps: BootstrapCatalog,
    pub requirements: Vec<String>,
    pub dist_name: Option<String>,
    pub bootstrap: Option<String>,
    pub force_build: bool,
    pub require_perfect_match: bool,
    pub recipe_dirs: Vec<PathBuf>,
    pub bootstrap_dirs: Vec<PathBuf>,
    pub output: OutputConfig,
}

impl Session {
    /// Load the config file, apply the global flags on top and load the
    /// recipe and bootstrap catalogs.
    pub fn open(globals: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        let config = config::load(globals.config.as_deref(), &cwd)
            .context("Failed to load configuration")?;
        Self::from_config(globals, config)
    }

    fn from_config(globals: &GlobalArgs, config: Config) -> Result<Self> {
        let storage_dir = globals
            .storage_dir
            .clone()
            .or(config.storage_dir.clone())
            .unwrap_or_else(default_storage_dir);
        let recipe_dirs = prefer(&globals.recipes_dirs, &config.recipe_dirs);
        let bootstrap_dirs = prefer(&globals.bootstraps_dirs, &config.bootstrap_dirs);

        let arch_names = config::split_all(&globals.archs)?;
        let archs = if arch_names.is_empty() {
            config.archs()?
        } else {
            Arch::parse_list(&arch_names)?
        };
        let requirements = config::split_all(&globals.requirements)?;
        let requirements = if requirements.is_empty() {
            config.requirements.clone()
        } else {
            requirements
        };

        let recipes = RecipeCatalog::load(&recipe_dirs).context("Failed to load recipes")?;
        let bootstraps =
            BootstrapCatalog::load(&bootstrap_dirs).context("Failed to load bootstraps")?;

        let mut ctx = Context::new(storage_dir, Box::new(SystemRunner::new(config.tail_lines)))
            .with_archs(archs)
            .with_env(config.env.clone());
        ctx.android_api = config.android_api;
        ctx.host_python = config.host_python.clone();
        if let Some(virtualenv) = &config.virtualenv {
            ctx.virtualenv = virtualenv.clone();
        }

        Ok(Self {
            ctx,
            recipes,
            bootstraps,
            requirements,
            dist_name: globals.dist_name.clone().or(config.dist_name),
            bootstrap: globals.bootstrap.clone().or(config.bootstrap),
            force_build: globals.force_build,
            require_perfect_match: globals.require_perfect_match,
            recipe_dirs,
            bootstrap_dirs,
            output: OutputConfig::from_env_and_flag(&globals.color),
        })
    }

    pub fn state(&self) -> Result<StateStore> {
        StateStore::open(self.ctx.state_path()).context("Failed to open build state")
    }

    /// The dist matching the requested name and requirements, built or not.
    pub fn select_dist(&self) -> Result<Distribution> {
        Ok(Distribution::select(
            &self.ctx,
            self.dist_name.as_deref(),
            &self.requirements,
            self.force_build,
            self.require_perfect_match,
        )?)
    }

    /// Like [`Session::select_dist`], failing unless the dist already exists.
    pub fn prebuilt_dist(&self) -> Result<Distribution> {
        let dist = self.select_dist()?;
        if dist.needs_build {
            anyhow::bail!(
                "No dist exists that meets your requirements; run `distforge create` first"
            );
        }
        Ok(dist)
    }
}

fn prefer(flags: &[PathBuf], configured: &[PathBuf]) -> Vec<PathBuf> {
    if flags.is_empty() {
        configured.to_vec()
    } else {
        flags.to_vec()
    }
}
