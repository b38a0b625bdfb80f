//! Distributions: finished builds under `dists/<name>/`.
//!
//! A distribution is identified by its directory name and described by the
//! `dist_info.json` written after a successful build. Existing dists are
//! reused when they already contain the requested recipes, so repeated
//! `create` calls with the same requirements do not rebuild anything.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::fsutil;

/// Info file written into every finished dist.
pub const DIST_INFO_FILE: &str = "dist_info.json";

/// Contents of `dist_info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistInfo {
    pub dist_name: String,
    #[serde(default)]
    pub bootstrap: Option<String>,
    #[serde(default)]
    pub archs: Vec<String>,
    /// Build order of the recipes the dist was built with.
    pub recipes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub name: String,
    pub dist_dir: PathBuf,
    pub recipes: Vec<String>,
    pub archs: Vec<String>,
    pub bootstrap: Option<String>,
    /// False for dists found on disk.
    pub needs_build: bool,
}

impl Distribution {
    /// Every dist with an info file, sorted by name.
    pub fn list(ctx: &Context) -> Result<Vec<Self>> {
        let pattern = ctx.dist_dir().join("*").join(DIST_INFO_FILE);
        let mut dists = Vec::new();
        for entry in glob::glob(&pattern.to_string_lossy())? {
            let path = entry?;
            let Some(dist_dir) = path.parent().map(PathBuf::from) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            let info: DistInfo = serde_json::from_str(&content)?;
            let name = dist_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(info.dist_name);
            dists.push(Self {
                name,
                dist_dir,
                recipes: info.recipes,
                archs: info.archs,
                bootstrap: info.bootstrap,
                needs_build: false,
            });
        }
        dists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dists)
    }

    /// Pick an existing dist that satisfies the request, or describe a new
    /// one that needs building.
    ///
    /// An existing dist is reused when its recipes equal `recipes`, or are a
    /// superset of them and a perfect match is not required. `force_build`
    /// skips reuse. Asking for an existing name whose recipes don't fit is an
    /// error unless the build is forced.
    pub fn select(
        ctx: &Context,
        name: Option<&str>,
        recipes: &[String],
        force_build: bool,
        require_perfect_match: bool,
    ) -> Result<Self> {
        let name = name.filter(|n| !n.is_empty());
        let existing = Self::list(ctx)?;
        let named = name.and_then(|n| existing.iter().find(|d| d.name == n).cloned());

        let possible: Vec<Self> = existing
            .into_iter()
            .filter(|d| name.is_none_or(|n| d.name == n))
            .filter(|d| recipes.iter().all(|r| d.recipes.contains(r)))
            .collect();
        if possible.is_empty() {
            info!("No existing dists meet the given requirements");
        } else {
            info!("Of the existing distributions, the following meet the given requirements:");
            for dist in &possible {
                info!("\t{}", dist);
            }
        }

        if !force_build {
            let wanted: BTreeSet<&String> = recipes.iter().collect();
            let reusable = possible.into_iter().find(|dist| {
                let have: BTreeSet<&String> = dist.recipes.iter().collect();
                have == wanted || !require_perfect_match
            });
            if let Some(dist) = reusable {
                info!("{} has compatible recipes, using this one", dist.name);
                return Ok(dist);
            }
            if let Some(dist) = named {
                return Err(Error::Distribution {
                    message: format!(
                        "Asked for dist with name {} with recipes ({}), but a dist with this name already exists and has incompatible recipes ({})",
                        dist.name,
                        recipes.join(", "),
                        dist.recipes.join(", ")
                    ),
                });
            }
        }

        let name = match name {
            Some(name) => name.to_string(),
            None => unused_name(ctx),
        };
        Ok(Self {
            dist_dir: ctx.dist_dir().join(&name),
            name,
            recipes: recipes.to_vec(),
            archs: Vec::new(),
            bootstrap: None,
            needs_build: true,
        })
    }

    /// Write `dist_info.json` for a completed build.
    pub fn save_info(&self, ctx: &Context, bootstrap: &str, build_order: &[String]) -> Result<()> {
        info!("Saving distribution info");
        fs::create_dir_all(&self.dist_dir)?;
        let info = DistInfo {
            dist_name: self.name.clone(),
            bootstrap: Some(bootstrap.to_string()),
            archs: ctx.archs.iter().map(|a| a.name.clone()).collect(),
            recipes: build_order.to_vec(),
        };
        let content = serde_json::to_string_pretty(&info)?;
        fs::write(self.dist_dir.join(DIST_INFO_FILE), content)?;
        Ok(())
    }

    /// Assemble the dist directory from the prepared bootstrap, the
    /// collected libraries and the pure-python installs, then save its info.
    pub fn run_distribute(&self, ctx: &Context, build_order: &[String]) -> Result<()> {
        info!("Assembling distribution {} in {}", self.name, self.dist_dir.display());
        fs::create_dir_all(&self.dist_dir)?;

        let bootstrap_dir = ctx.bootstrap_build_dir()?;
        if bootstrap_dir.is_dir() {
            fsutil::copy_tree(&bootstrap_dir, &self.dist_dir)?;
            fsutil::remove_dir_if_exists(&self.dist_dir.join("collated_objects"))?;
        }

        for arch in &ctx.archs {
            let libs = ctx.libs_dir_path(arch);
            if libs.is_dir() {
                info!("Copying libs for {}", arch);
                fsutil::copy_tree(&libs, &self.dist_dir.join("libs").join(&arch.name))?;
            }
        }

        let site_packages = ctx.site_packages_dir();
        if fsutil::has_entries(&site_packages) {
            fsutil::copy_tree(&site_packages, &self.dist_dir.join("python-install"))?;
        }

        let bootstrap = ctx.bootstrap().map(|b| b.name.as_str()).unwrap_or_default();
        self.save_info(ctx, bootstrap, build_order)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: includes recipes ({})", self.name, self.recipes.join(", "))?;
        if !self.archs.is_empty() {
            write!(f, ", built for archs ({})", self.archs.join(", "))?;
        }
        Ok(())
    }
}

/// First `unnamed_dist_<n>` (n >= 1) without a directory.
fn unused_name(ctx: &Context) -> String {
    (1..)
        .map(|i| format!("unnamed_dist_{}", i))
        .find(|name| !ctx.dist_dir().join(name).exists())
        .unwrap_or_else(|| "unnamed_dist".to_string())
}
