//! CLI argument parsing and command dispatch

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use distforge::output::OutputConfig;

use crate::commands;

/// distforge - Build runtime distributions from dependency recipes
#[derive(Parser, Debug)]
#[command(name = "distforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    globals: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Shorthand for --log-level debug
    #[arg(long, global = true)]
    pub debug: bool,

    /// Configuration file. Defaults to .distforge.yaml in the current directory.
    #[arg(long, global = true, value_name = "FILE", env = "DISTFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory for builds, downloads and distributions.
    #[arg(long, global = true, value_name = "DIR", env = "DISTFORGE_STORAGE")]
    pub storage_dir: Option<PathBuf>,

    /// Directory of recipes. May be repeated; later directories take precedence.
    #[arg(long = "recipes-dir", global = true, value_name = "DIR")]
    pub recipes_dirs: Vec<PathBuf>,

    /// Directory of bootstraps. May be repeated.
    #[arg(long = "bootstraps-dir", global = true, value_name = "DIR")]
    pub bootstraps_dirs: Vec<PathBuf>,

    /// Target architecture. May be repeated or comma separated.
    #[arg(long = "arch", global = true, value_name = "ARCH")]
    pub archs: Vec<String>,

    /// Recipes and modules to include, comma or space separated.
    #[arg(long, global = true, value_name = "NAMES")]
    pub requirements: Vec<String>,

    /// Name of the distribution to use or create.
    #[arg(long, global = true, value_name = "NAME")]
    pub dist_name: Option<String>,

    /// Bootstrap to build with, instead of choosing one automatically.
    #[arg(long, global = true, value_name = "NAME")]
    pub bootstrap: Option<String>,

    /// Build even if a compatible dist exists, rerunning recorded phases.
    #[arg(long, global = true)]
    pub force_build: bool,

    /// Only reuse a dist whose recipes exactly match the requirements.
    #[arg(long, global = true)]
    pub require_perfect_match: bool,
}

impl GlobalArgs {
    fn log_filter(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a distribution for the requirements, reusing one if possible
    Create(commands::create::CreateArgs),

    /// List the available recipes
    Recipes(commands::recipes::RecipesArgs),

    /// List the available bootstraps
    Bootstraps,

    /// List the supported target architectures
    Archs,

    /// Show the resolved build order for the requirements
    Order(commands::order::OrderArgs),

    /// List the distributions that have been built
    Distributions,

    /// Delete the distribution matching --dist-name and --requirements
    DeleteDist,

    /// Copy a built distribution to another directory
    ExportDist(commands::dist::OutputArgs),

    /// Symlink a built distribution into another location
    SymlinkDist(commands::dist::OutputArgs),

    /// Show which bootstraps and recipes have been built
    BuildStatus,

    /// Remove build products
    Clean(commands::clean::CleanArgs),

    /// Show the storage layout and build environment
    PrintContextInfo,

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the command, printing any failure to stderr.
    pub fn run(self) -> ExitCode {
        let output = OutputConfig::from_env_and_flag(&self.globals.color);
        match self.execute() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{}", render_error(&output, &err));
                ExitCode::FAILURE
            }
        }
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.globals.log_filter());
        let globals = &self.globals;

        match self.command {
            Commands::Create(args) => commands::create::execute(globals, args),
            Commands::Recipes(args) => commands::recipes::execute(globals, args),
            Commands::Bootstraps => commands::recipes::execute_bootstraps(globals),
            Commands::Archs => commands::info::execute_archs(globals),
            Commands::Order(args) => commands::order::execute(globals, args),
            Commands::Distributions => commands::dist::execute_list(globals),
            Commands::DeleteDist => commands::dist::execute_delete(globals),
            Commands::ExportDist(args) => commands::dist::execute_export(globals, args),
            Commands::SymlinkDist(args) => commands::dist::execute_symlink(globals, args),
            Commands::BuildStatus => commands::info::execute_build_status(globals),
            Commands::Clean(args) => commands::clean::execute(globals, args),
            Commands::PrintContextInfo => commands::info::execute_context(globals),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `Error: <context>: <cause>`, one line per error chain.
fn render_error(output: &OutputConfig, err: &anyhow::Error) -> String {
    format!("{} {:#}", output.error("Error:"), err)
}

/// Logs go to stderr; `RUST_LOG` overrides the flag.
fn init_logging(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
