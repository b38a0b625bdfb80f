//! Build context: directory layout, target architectures, environment and
//! the process runner handle shared by every phase.
//!
//! Layout under the storage root:
//!
//! ```text
//! <storage>/
//!   state.db                          persisted phase completion
//!   packages/<recipe>/                download cache
//!   build/
//!     other_builds/<recipe>/<arch>/   per-recipe build containers
//!     bootstrap_builds/<bootstrap>/   prepared project template
//!     libs_collections/<arch>/        shared libraries collected per arch
//!     python-installs/<dist>/         pure-environment installs
//!   dists/<dist>/                     finished distributions
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::arch::Arch;
use crate::bootstrap::Bootstrap;
use crate::error::{Error, Result};
use crate::fsutil;
use crate::process::ProcessRunner;

pub struct Context {
    pub storage_dir: PathBuf,
    pub archs: Vec<Arch>,
    /// Variables layered over every architecture's default environment.
    pub env: BTreeMap<String, String>,
    /// Command used to create the isolated install environment.
    pub virtualenv: String,
    /// Interpreter passed to the environment creator, if any.
    pub host_python: Option<String>,
    pub android_api: u32,
    pub runner: Box<dyn ProcessRunner>,
    bootstrap: Option<Bootstrap>,
    dist_name: Option<String>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("storage_dir", &self.storage_dir)
            .field("archs", &self.archs)
            .field("env", &self.env)
            .field("bootstrap", &self.bootstrap.as_ref().map(|b| &b.name))
            .field("dist_name", &self.dist_name)
            .finish()
    }
}

impl Context {
    pub fn new(storage_dir: impl Into<PathBuf>, runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            archs: Vec::new(),
            env: BTreeMap::new(),
            virtualenv: "virtualenv".to_string(),
            host_python: None,
            android_api: 21,
            runner,
            bootstrap: None,
            dist_name: None,
        }
    }

    pub fn with_archs(mut self, archs: Vec<Arch>) -> Self {
        self.archs = archs;
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Create the top-level directories.
    pub fn setup_dirs(&self) -> Result<()> {
        for dir in [
            self.storage_dir.clone(),
            self.build_dir(),
            self.dist_dir(),
            self.packages_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn build_dir(&self) -> PathBuf {
        self.storage_dir.join("build")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.storage_dir.join("dists")
    }

    /// Download cache.
    pub fn packages_dir(&self) -> PathBuf {
        self.storage_dir.join("packages")
    }

    pub fn state_path(&self) -> PathBuf {
        self.storage_dir.join("state.db")
    }

    pub fn other_builds_dir(&self) -> PathBuf {
        self.build_dir().join("other_builds")
    }

    pub fn bootstrap_builds_dir(&self) -> PathBuf {
        self.build_dir().join("bootstrap_builds")
    }

    pub fn libs_collections_dir(&self) -> PathBuf {
        self.build_dir().join("libs_collections")
    }

    pub fn python_installs_dir(&self) -> PathBuf {
        self.build_dir().join("python-installs")
    }

    /// Per-recipe, per-arch build container.
    pub fn build_container(&self, recipe: &str, arch: &Arch) -> PathBuf {
        self.other_builds_dir().join(recipe).join(&arch.name)
    }

    /// Shared library collection for `arch`, without creating it.
    pub fn libs_dir_path(&self, arch: &Arch) -> PathBuf {
        self.libs_collections_dir().join(&arch.name)
    }

    /// Shared library collection for `arch`, created on demand.
    pub fn get_libs_dir(&self, arch: &Arch) -> Result<PathBuf> {
        let dir = self.libs_dir_path(arch);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Target of the pure-environment install for the current dist.
    pub fn site_packages_dir(&self) -> PathBuf {
        let dist = self.dist_name.as_deref().unwrap_or("default");
        self.python_installs_dir().join(dist)
    }

    pub fn bootstrap(&self) -> Option<&Bootstrap> {
        self.bootstrap.as_ref()
    }

    pub fn dist_name(&self) -> Option<&str> {
        self.dist_name.as_deref()
    }

    /// Build directory of the prepared bootstrap.
    pub fn bootstrap_build_dir(&self) -> Result<PathBuf> {
        let bootstrap = self.bootstrap.as_ref().ok_or_else(|| Error::Distribution {
            message: "no bootstrap has been prepared for this build".to_string(),
        })?;
        Ok(self.bootstrap_builds_dir().join(&bootstrap.name))
    }

    /// Copy the bootstrap's project template into its build directory.
    pub fn prepare_bootstrap(&mut self, bootstrap: &Bootstrap) -> Result<()> {
        let build_dir = self.bootstrap_builds_dir().join(&bootstrap.name);
        info!(
            "Preparing bootstrap {} in {}",
            bootstrap.name,
            build_dir.display()
        );
        fs::create_dir_all(&build_dir)?;
        let template = bootstrap.template_dir();
        if template.is_dir() {
            fsutil::copy_tree(&template, &build_dir)?;
        }
        fs::write(
            build_dir.join("project.properties"),
            format!("target=android-{}\n", self.android_api),
        )?;
        self.bootstrap = Some(bootstrap.clone());
        Ok(())
    }

    /// Select the distribution being built and create its directory.
    pub fn prepare_dist(&mut self, name: &str) -> Result<PathBuf> {
        let dir = self.dist_dir().join(name);
        fs::create_dir_all(&dir)?;
        self.dist_name = Some(name.to_string());
        Ok(dir)
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}
