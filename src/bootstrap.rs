//! Bootstraps: project templates a distribution is assembled into.
//!
//! A bootstrap lives in `<dir>/<name>/bootstrap.yaml`, next to an optional
//! `build/` template directory that is copied into the build tree when the
//! bootstrap is prepared. A bootstrap may require recipes of its own
//! (`recipe_depends`), which must be resolved together with the user's
//! requirements.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalog::{descriptor_dirs, RecipeCatalog};
use crate::error::{Error, Result};

/// Descriptor file name inside each bootstrap directory.
pub const BOOTSTRAP_FILE: &str = "bootstrap.yaml";

/// A loaded bootstrap descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bootstrap {
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub dir: PathBuf,
    /// Recipes this template unconditionally requires.
    pub recipe_depends: Vec<String>,
    /// Whether automatic selection may pick this bootstrap.
    pub can_be_chosen_automatically: bool,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            name: String::new(),
            dir: PathBuf::new(),
            recipe_depends: Vec::new(),
            can_be_chosen_automatically: true,
        }
    }
}

impl Bootstrap {
    pub fn new(name: &str, recipe_depends: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            recipe_depends: recipe_depends.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    /// The project template copied into the bootstrap build directory.
    pub fn template_dir(&self) -> PathBuf {
        self.dir.join("build")
    }
}

/// All known bootstraps, enumerated in name order.
#[derive(Debug, Clone, Default)]
pub struct BootstrapCatalog {
    bootstraps: BTreeMap<String, Bootstrap>,
}

impl BootstrapCatalog {
    /// Load every bootstrap under `dirs`. Later directories shadow earlier
    /// ones by name.
    pub fn load(dirs: &[PathBuf]) -> Result<Self> {
        let mut bootstraps = BTreeMap::new();
        for (name, dir) in descriptor_dirs(dirs, BOOTSTRAP_FILE)? {
            let path = dir.join(BOOTSTRAP_FILE);
            let content = fs::read_to_string(&path)?;
            let mut bootstrap: Bootstrap =
                serde_yaml::from_str(&content).map_err(|e| Error::RecipeParse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            bootstrap.name = name.clone();
            bootstrap.dir = dir;
            debug!("Loaded bootstrap {} from {}", name, path.display());
            bootstraps.insert(name, bootstrap);
        }
        Ok(Self { bootstraps })
    }

    pub fn from_bootstraps(bootstraps: impl IntoIterator<Item = Bootstrap>) -> Self {
        Self {
            bootstraps: bootstraps
                .into_iter()
                .map(|b| (b.name.clone(), b))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Bootstrap> {
        self.bootstraps
            .get(name)
            .ok_or_else(|| Error::BootstrapNotFound {
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bootstrap> {
        self.bootstraps.values()
    }

    pub fn is_empty(&self) -> bool {
        self.bootstraps.is_empty()
    }
}

/// Picks a bootstrap compatible with a resolved recipe list.
pub struct BootstrapMatcher<'a> {
    bootstraps: &'a BootstrapCatalog,
    recipes: &'a RecipeCatalog,
}

impl<'a> BootstrapMatcher<'a> {
    pub fn new(bootstraps: &'a BootstrapCatalog, recipes: &'a RecipeCatalog) -> Self {
        Self {
            bootstraps,
            recipes,
        }
    }

    /// Every bootstrap acceptable for `resolved`, in enumeration order.
    pub fn acceptable(&self, resolved: &[String]) -> Vec<&'a Bootstrap> {
        self.bootstraps
            .iter()
            .filter(|bs| self.is_compatible(bs, resolved))
            .collect()
    }

    /// The first acceptable bootstrap. Ties are not reported; name one
    /// explicitly to override.
    pub fn select(&self, resolved: &[String]) -> Option<&'a Bootstrap> {
        info!("Trying to find a bootstrap that matches the given recipes");
        let acceptable = self.acceptable(resolved);
        let names: Vec<&str> = acceptable.iter().map(|bs| bs.name.as_str()).collect();
        info!(
            "Found {} acceptable bootstraps: [{}]",
            acceptable.len(),
            names.join(", ")
        );
        let chosen = acceptable.into_iter().next();
        if let Some(bs) = chosen {
            info!("Using the first of these: {}", bs.name);
        }
        chosen
    }

    fn is_compatible(&self, bootstrap: &Bootstrap, resolved: &[String]) -> bool {
        if !bootstrap.can_be_chosen_automatically {
            return false;
        }
        let required_conflict = bootstrap.recipe_depends.iter().any(|required| {
            self.recipes
                .conflicts_of(required)
                .iter()
                .any(|c| resolved.contains(c))
        });
        if required_conflict {
            return false;
        }
        !resolved.iter().any(|name| {
            self.recipes
                .conflicts_of(name)
                .iter()
                .any(|c| bootstrap.recipe_depends.contains(c))
        })
    }
}
