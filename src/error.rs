//! # Error Handling
//!
//! This module defines the centralized error type for `distforge`. It uses
//! `thiserror` to build one `Error` enum covering every failure the engine
//! can report, with enough context attached to debug a broken recipe.
//!
//! ## Key Components
//!
//! - **`Error`**: every failure mode of resolution, bootstrap selection and
//!   the build pipeline. Fatal variants carry diagnostic context: the
//!   remaining candidate graph for cycles, the full command line and captured
//!   output for process failures.
//!
//! - **`Result<T>`**: alias for `std::result::Result<T, Error>`.
//!
//! `RecipeNotFound` is the only recoverable variant. The resolver never
//! produces it for requested names (those become pure-environment installs
//! through [`crate::catalog::Lookup::NotFound`]); it surfaces only when a
//! command asks for a recipe by name, e.g. `clean recipe <name>`.

use thiserror::Error;

/// Main error type for distforge operations
#[derive(Error, Debug)]
pub enum Error {
    /// Topological sort found a non-empty graph with no leaf nodes.
    ///
    /// `remaining` is the unresolved subgraph rendered as
    /// `name -> {deps}` lines.
    #[error("Dependency cycle detected in recipe graph:\n{remaining}")]
    CycleDetected { remaining: String },

    /// Every candidate graph was eliminated by conflict pruning.
    #[error("Unresolvable conflict: {message}")]
    UnresolvableConflict { message: String },

    /// No bootstrap could be chosen automatically for the resolved recipes.
    #[error("No compatible bootstrap for recipes [{recipes}]{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    NoCompatibleBootstrap {
        recipes: String,
        /// Optional hint for how to resolve the selection
        hint: Option<String>,
    },

    /// An external command exited unsuccessfully or could not be spawned.
    #[error("Command failed (exit code {}): {command}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    ProcessFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// A build phase failed for a recipe on an architecture.
    #[error("{phase} failed for recipe '{recipe}' on {arch}: {source}")]
    Phase {
        recipe: String,
        phase: String,
        arch: String,
        #[source]
        source: Box<Error>,
    },

    /// A phase that works on every recipe at once failed on an architecture.
    #[error("{phase} failed on {arch}: {source}")]
    ArchPhase {
        phase: String,
        arch: String,
        #[source]
        source: Box<Error>,
    },

    /// No recipe with the given name exists in any recipe directory.
    #[error("Recipe not found: {name}")]
    RecipeNotFound { name: String },

    /// No bootstrap with the given name exists in any bootstrap directory.
    #[error("Bootstrap not found: {name}")]
    BootstrapNotFound { name: String },

    /// A recipe or bootstrap descriptor could not be parsed.
    #[error("Invalid descriptor {path}: {message}")]
    RecipeParse { path: String, message: String },

    /// The configuration file or command-line values are invalid.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The persisted build state could not be read or written.
    #[error("State store error ({path}): {message}")]
    StateStore { path: String, message: String },

    /// A distribution request could not be satisfied.
    #[error("Distribution error: {message}")]
    Distribution { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    /// A glob iteration error, wrapped from `glob::GlobError`.
    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// An invalid regular expression, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Attach recipe/phase/arch context to an error raised inside a phase.
    pub fn in_phase(self, recipe: &str, phase: &str, arch: &str) -> Self {
        Error::Phase {
            recipe: recipe.to_string(),
            phase: phase.to_string(),
            arch: arch.to_string(),
            source: Box::new(self),
        }
    }

    /// Attach phase/arch context to an error raised by a whole-arch phase.
    pub fn in_arch_phase(self, phase: &str, arch: &str) -> Self {
        Error::ArchPhase {
            phase: phase.to_string(),
            arch: arch.to_string(),
            source: Box::new(self),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
