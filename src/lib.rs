//! # distforge
//!
//! Recipe-driven cross-compilation of a language runtime and its native
//! extensions into mobile project distributions. The `distforge` binary is
//! a thin wrapper over this library.
//!
//! ## Quick Example
//!
//! ```
//! use distforge::bootstrap::{Bootstrap, BootstrapCatalog};
//! use distforge::catalog::RecipeCatalog;
//! use distforge::recipe::Recipe;
//! use distforge::resolver::Resolver;
//!
//! let recipes = RecipeCatalog::from_recipes(vec![
//!     Recipe::new("python2"),
//!     Recipe::new("kivy").with_depends(vec!["python2".into()]),
//! ]);
//! let bootstraps = BootstrapCatalog::from_bootstraps(vec![Bootstrap::new("sdl2", &["python2"])]);
//!
//! let resolution = Resolver::new(&recipes, &bootstraps)
//!     .resolve(&["kivy".to_string(), "requests".to_string()], None)
//!     .unwrap();
//! assert_eq!(resolution.build_order, vec!["python2", "kivy"]);
//! assert_eq!(resolution.python_modules, vec!["requests"]);
//! assert_eq!(resolution.bootstrap.name, "sdl2");
//! ```
//!
//! ## Core Concepts
//!
//! - **Recipes (`recipe`, `catalog`)**: declarative build instructions for
//!   one dependency, loaded from `recipe.yaml` files.
//! - **Graph (`graph`, `resolver`)**: every way of satisfying alternative
//!   dependencies is kept as a separate candidate graph until conflicts rule
//!   it out. The first surviving candidate gives the build order.
//! - **Bootstraps (`bootstrap`)**: project templates. One is chosen
//!   automatically unless named, and its required recipes are merged into
//!   the resolution.
//! - **Phases (`phases`)**: download, unpack, prebuild, build, biglink,
//!   postbuild and the pure-environment install. Completed phases are
//!   recorded in the state store (`state`) and skipped on the next run.
//! - **Distributions (`distribution`)**: finished builds, reused when they
//!   already contain the requested recipes.
//!
//! ## Execution Flow
//!
//! [`phases::orchestrator::execute_create`] runs the whole pipeline:
//!
//! 1.  **Resolve** the requested names into a build order, the names with
//!     no recipe, and a bootstrap.
//! 2.  **Prepare** the bootstrap template and the dist directory.
//! 3.  **Build** every recipe through each phase, one phase across all
//!     recipes before the next, for each target architecture in turn.
//! 4.  **Install** the names with no recipe with `pip`.
//! 5.  **Distribute**: assemble the dist and write its `dist_info.json`.

pub mod arch;
pub mod bootstrap;
pub mod catalog;
pub mod clean;
pub mod config;
pub mod context;
pub mod defaults;
pub mod distribution;
pub mod error;
pub mod fsutil;
pub mod graph;
pub mod output;
pub mod phases;
pub mod process;
pub mod recipe;
pub mod resolver;
pub mod state;

#[cfg(test)]
mod graph_proptest;
#[cfg(test)]
pub(crate) mod testing;
