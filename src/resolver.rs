//! Recipe resolution: requested names to a build order and a bootstrap.
//!
//! Requested names are loaded breadth-first from the [`RecipeCatalog`].
//! Names with no recipe are collected as pure-environment modules. Each
//! loaded recipe contributes its `depends` edges to the [`Graph`] and prunes
//! candidates containing anything it conflicts with. Only single-name
//! dependencies are loaded further; members of an alternative group become
//! graph nodes but their own dependencies are not followed.
//!
//! When no bootstrap is named, the first compatible one is chosen for the
//! resolved order and its required recipes are merged into the same graph,
//! so they take part in conflict and alternative pruning.

use std::collections::{BTreeSet, VecDeque};

use log::{info, warn};

use crate::bootstrap::{Bootstrap, BootstrapCatalog, BootstrapMatcher};
use crate::catalog::{Lookup, RecipeCatalog};
use crate::error::{Error, Result};
use crate::graph::{DependencyGraph, Graph};
use crate::recipe::DependencySpec;

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Recipes to build, dependencies first.
    pub build_order: Vec<String>,
    /// Requested names with no recipe, in request order.
    pub python_modules: Vec<String>,
    pub bootstrap: Bootstrap,
    /// Every surviving candidate; the build order comes from the first.
    pub candidates: Vec<DependencyGraph>,
}

pub struct Resolver<'a> {
    recipes: &'a RecipeCatalog,
    bootstraps: &'a BootstrapCatalog,
}

impl<'a> Resolver<'a> {
    pub fn new(recipes: &'a RecipeCatalog, bootstraps: &'a BootstrapCatalog) -> Self {
        Self {
            recipes,
            bootstraps,
        }
    }

    /// Resolve `names`, using the bootstrap called `bootstrap` if given and
    /// choosing one automatically otherwise.
    pub fn resolve(&self, names: &[String], bootstrap: Option<&str>) -> Result<Resolution> {
        let named = bootstrap
            .map(|name| self.bootstraps.get(name))
            .transpose()?;

        let mut to_load: Vec<String> = names.to_vec();
        if let Some(bs) = named {
            if !bs.recipe_depends.is_empty() {
                info!("Bootstrap requires recipes [{}]", bs.recipe_depends.join(", "));
                to_load.extend(bs.recipe_depends.iter().cloned());
            }
        }

        let mut loader = Loader::new(self.recipes);
        loader.load(to_load)?;
        loader.finish()?;
        let build_order = loader.graph.find_order(0)?;

        let bootstrap = match named {
            Some(bs) => bs.clone(),
            None => {
                let chosen = BootstrapMatcher::new(self.bootstraps, self.recipes)
                    .select(&build_order)
                    .ok_or_else(|| Error::NoCompatibleBootstrap {
                        recipes: build_order.join(", "),
                        hint: Some(
                            "If such a combination should exist, name a bootstrap with --bootstrap"
                                .to_string(),
                        ),
                    })?;
                info!(
                    "{} bootstrap appears compatible with the required recipes, checking this",
                    chosen.name
                );
                return self.merge_bootstrap(loader, chosen);
            }
        };

        Ok(Resolution {
            build_order,
            python_modules: loader.python_modules,
            bootstrap,
            candidates: loader.graph.candidates().to_vec(),
        })
    }

    /// Re-run resolution with the chosen bootstrap's recipes merged in.
    fn merge_bootstrap(&self, mut loader: Loader<'a>, bootstrap: &Bootstrap) -> Result<Resolution> {
        let rejected = |message: String| Error::NoCompatibleBootstrap {
            recipes: bootstrap.recipe_depends.join(", "),
            hint: Some(format!(
                "bootstrap {} was selected but its recipes cannot be merged: {}",
                bootstrap.name, message
            )),
        };
        let merged = loader
            .load(bootstrap.recipe_depends.clone())
            .and_then(|()| loader.finish());
        match merged {
            Ok(()) => {}
            Err(Error::UnresolvableConflict { message }) => return Err(rejected(message)),
            Err(other) => return Err(other),
        }
        let build_order = loader.graph.find_order(0)?;
        Ok(Resolution {
            build_order,
            python_modules: loader.python_modules,
            bootstrap: bootstrap.clone(),
            candidates: loader.graph.candidates().to_vec(),
        })
    }
}

/// Incremental graph construction shared by the initial resolution and the
/// bootstrap merge.
struct Loader<'a> {
    catalog: &'a RecipeCatalog,
    graph: Graph,
    loaded: BTreeSet<String>,
    python_modules: Vec<String>,
}

impl<'a> Loader<'a> {
    fn new(catalog: &'a RecipeCatalog) -> Self {
        Self {
            catalog,
            graph: Graph::new(),
            loaded: BTreeSet::new(),
            python_modules: Vec::new(),
        }
    }

    fn load(&mut self, names: Vec<String>) -> Result<()> {
        let mut queue: VecDeque<String> = names.into();
        while let Some(name) = queue.pop_front() {
            if self.loaded.contains(&name) || self.python_modules.contains(&name) {
                continue;
            }
            let recipe = match self.catalog.lookup(&name) {
                Lookup::Found(recipe) => recipe,
                Lookup::NotFound => {
                    info!("No recipe named {}; will install it into the python environment", name);
                    self.python_modules.push(name);
                    continue;
                }
            };

            self.graph.add(&name, &DependencySpec::Single(name.clone()));
            if recipe.conflicts.is_empty() {
                info!("Loaded recipe {} (depends on {})", name, recipe.depends_display());
            } else {
                info!(
                    "Loaded recipe {} (depends on {}, conflicts [{}])",
                    name,
                    recipe.depends_display(),
                    recipe.conflicts.join(", ")
                );
            }
            for depend in &recipe.depends {
                self.graph.add(&name, depend);
                if let DependencySpec::Single(dependency) = depend {
                    queue.push_back(dependency.clone());
                }
            }
            for conflict in &recipe.conflicts {
                if self.graph.conflicts(conflict) {
                    warn!(
                        "{} conflicts with {}, but both have been included or pulled into the requirements",
                        name, conflict
                    );
                    return Err(Error::UnresolvableConflict {
                        message: format!(
                            "{} conflicts with {}, but both are required",
                            name, conflict
                        ),
                    });
                }
            }
            self.loaded.insert(name);
        }
        Ok(())
    }

    /// Add ordering hints and run the final conflict sweep.
    fn finish(&mut self) -> Result<()> {
        for name in &self.loaded {
            if let Lookup::Found(recipe) = self.catalog.lookup(name) {
                for optional in &recipe.opt_depends {
                    self.graph.add_optional(name, optional);
                }
            }
        }
        self.graph.remove_remaining_conflicts(self.catalog);

        match self.graph.len() {
            0 => {
                warn!("Didn't find any valid dependency graphs");
                Err(Error::UnresolvableConflict {
                    message: "every candidate recipe set contains a conflicting pair".to_string(),
                })
            }
            1 => {
                info!("Found a single valid recipe set");
                Ok(())
            }
            _ => {
                info!("Found multiple valid recipe sets:");
                for candidate in self.graph.candidates() {
                    let keys: Vec<&str> = candidate.keys().map(String::as_str).collect();
                    info!("    [{}]", keys.join(", "));
                }
                Ok(())
            }
        }
    }
}
