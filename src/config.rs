//! # Configuration File
//!
//! Optional `.distforge.yaml` settings, read from the working directory or
//! from an explicit `--config` path. Every field has a default, so an empty
//! or missing file is valid. Command-line flags override these values.
//!
//! ```yaml
//! storage_dir: /opt/distforge
//! recipe_dirs: [recipes, ../shared-recipes]
//! archs: [armeabi-v7a, x86]
//! requirements: [python2, kivy, requests]
//! dist_name: myapp
//! env:
//!   CFLAGS: -Os
//! ```
//!
//! Relative directories in a file are taken relative to that file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::arch::Arch;
use crate::error::{Error, Result};

/// File looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = ".distforge.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root for builds, downloads and dists. Platform default when unset.
    pub storage_dir: Option<PathBuf>,
    /// Searched in order; later directories shadow earlier ones.
    pub recipe_dirs: Vec<PathBuf>,
    pub bootstrap_dirs: Vec<PathBuf>,
    pub archs: Vec<String>,
    pub requirements: Vec<String>,
    pub bootstrap: Option<String>,
    pub dist_name: Option<String>,
    /// Extra build environment, layered over every arch's defaults.
    pub env: BTreeMap<String, String>,
    pub virtualenv: Option<String>,
    pub host_python: Option<String>,
    /// Output lines shown when a command fails.
    pub tail_lines: usize,
    pub android_api: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: None,
            recipe_dirs: vec![PathBuf::from("recipes")],
            bootstrap_dirs: vec![PathBuf::from("bootstraps")],
            archs: vec!["armeabi".to_string()],
            requirements: Vec::new(),
            bootstrap: None,
            dist_name: None,
            env: BTreeMap::new(),
            virtualenv: None,
            host_python: None,
            tail_lines: 20,
            android_api: 21,
        }
    }
}

impl Config {
    /// The configured architectures, validated.
    pub fn archs(&self) -> Result<Vec<Arch>> {
        if self.archs.is_empty() {
            return Err(Error::ConfigParse {
                message: "no target architectures configured".to_string(),
                hint: Some("pass --arch or set `archs` in the config file".to_string()),
            });
        }
        Arch::parse_list(&self.archs)
    }

    fn resolve_relative(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(dir) = self.storage_dir.as_mut() {
            join(dir);
        }
        self.recipe_dirs.iter_mut().for_each(join);
        self.bootstrap_dirs.iter_mut().for_each(join);
    }
}

/// Parse configuration from YAML. Blank input gives the defaults.
pub fn parse(yaml_content: &str) -> Result<Config> {
    if yaml_content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: Some(format!("check the field names and types in {}", CONFIG_FILE)),
    })
}

/// Parse a configuration file, resolving its relative paths.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("cannot read {}: {}", path.display(), e),
        hint: None,
    })?;
    let mut config = parse(&content)?;
    if let Some(base) = path.parent() {
        config.resolve_relative(base);
    }
    Ok(config)
}

/// Load `explicit` if given, otherwise `.distforge.yaml` in `cwd` when it
/// exists, otherwise the defaults.
pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        debug!("Loading configuration from {}", path.display());
        return from_file(path);
    }
    let local = cwd.join(CONFIG_FILE);
    if local.is_file() {
        debug!("Loading configuration from {}", local.display());
        return from_file(local);
    }
    Ok(Config::default())
}

/// Split a list argument given as `"a,b c"`: commas and spaces both
/// separate, empty items are dropped.
pub fn split_argument_list(arg: &str) -> Result<Vec<String>> {
    let separator = Regex::new(r"[ ,]+")?;
    Ok(separator
        .split(arg.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect())
}

/// [`split_argument_list`] over every value of a repeatable flag.
pub fn split_all(args: &[String]) -> Result<Vec<String>> {
    let mut items = Vec::new();
    for arg in args {
        items.extend(split_argument_list(arg)?);
    }
    Ok(items)
}
