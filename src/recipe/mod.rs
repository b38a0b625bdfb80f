//! Recipe descriptors and the build-step capability.
//!
//! A recipe is the unit of build instructions for one dependency. Recipes
//! are declared in `recipe.yaml` files (see [`crate::catalog`]) and are
//! immutable once loaded. The resolver only reads `depends`, `conflicts` and
//! `opt_depends`; the build pipeline drives a recipe through the
//! [`BuildSteps`] trait.
//!
//! ```yaml
//! version: "1.0.2"
//! url: https://example.org/openssl-1.0.2.tar.gz
//! kind: plain
//! depends: [hostpython2, [sdl2, pygame]]
//! conflicts: [python3]
//! opt_depends: [libffi]
//! build:
//!   - ./Configure android && make
//! built_libraries: [libssl.so]
//! ```

pub mod steps;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::arch::Arch;
use crate::context::Context;
use crate::error::Result;

/// One entry of a recipe's `depends` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// A single recipe name.
    Single(String),
    /// Any one of these names satisfies the dependency. The first is the
    /// preferred choice.
    Alternatives(Vec<String>),
}

impl DependencySpec {
    /// Every name mentioned by this entry.
    pub fn names(&self) -> Vec<&str> {
        match self {
            DependencySpec::Single(name) => vec![name.as_str()],
            DependencySpec::Alternatives(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for DependencySpec {
    fn from(name: &str) -> Self {
        DependencySpec::Single(name.to_string())
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencySpec::Single(name) => write!(f, "{}", name),
            DependencySpec::Alternatives(names) => write!(f, "({})", names.join("|")),
        }
    }
}

/// How a recipe is built. Selected once, when the catalog is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeKind {
    /// Runs its declared commands in its own per-arch build directory.
    #[default]
    Plain,
    /// A plain recipe that also leaves relocatable `*.so.o` fragments in
    /// `objects_<name>` for biglink.
    Compiled,
    /// Native code built with `ndk-build` inside the bootstrap build
    /// directory. Always rebuilt.
    NdkNative,
}

impl fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecipeKind::Plain => "plain",
            RecipeKind::Compiled => "compiled",
            RecipeKind::NdkNative => "ndk_native",
        };
        write!(f, "{}", name)
    }
}

/// A loaded recipe descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Recipe {
    /// Unique name, taken from the recipe's directory name.
    #[serde(skip)]
    pub name: String,
    /// Directory the descriptor was loaded from. Patches and local sources
    /// are resolved against it.
    #[serde(skip)]
    pub dir: PathBuf,
    pub version: Option<String>,
    /// Source archive location: `http(s)://`, `file://` or a plain path.
    pub url: Option<String>,
    pub kind: RecipeKind,
    pub depends: Vec<DependencySpec>,
    pub conflicts: Vec<String>,
    /// Ordering hints only; never pulls a recipe into the build.
    pub opt_depends: Vec<String>,
    /// Patch files relative to the recipe directory, applied with `-p1`.
    pub patches: Vec<PathBuf>,
    pub prebuild: Vec<String>,
    pub build: Vec<String>,
    pub postbuild: Vec<String>,
    /// Files (relative to the build directory) whose presence means the
    /// recipe is already built for an architecture.
    pub built_libraries: Vec<PathBuf>,
    /// Whether the recipe leaves biglink fragments. Defaults to true for
    /// `compiled` recipes.
    pub object_files: Option<bool>,
}

impl Recipe {
    /// An empty plain recipe, mostly useful for building catalogs in code.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_depends(mut self, depends: Vec<DependencySpec>) -> Self {
        self.depends = depends;
        self
    }

    pub fn with_conflicts(mut self, conflicts: &[&str]) -> Self {
        self.conflicts = conflicts.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_opt_depends(mut self, opt_depends: &[&str]) -> Self {
        self.opt_depends = opt_depends.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_kind(mut self, kind: RecipeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this recipe produces biglink fragments.
    pub fn produces_objects(&self) -> bool {
        self.object_files
            .unwrap_or(self.kind == RecipeKind::Compiled)
    }

    /// `depends` rendered for listings, e.g. `[hostpython2, (sdl2|pygame)]`.
    pub fn depends_display(&self) -> String {
        let parts: Vec<String> = self.depends.iter().map(|d| d.to_string()).collect();
        format!("[{}]", parts.join(", "))
    }
}

/// The per-architecture build steps every recipe kind provides.
///
/// The orchestrator drives recipes only through this trait, so phases can
/// be exercised against lightweight implementations in tests.
pub trait BuildSteps {
    fn name(&self) -> &str;

    /// Fetch the source archive into the download cache. Architecture
    /// independent.
    fn download(&self, ctx: &Context) -> Result<()>;

    /// Materialize a fresh build directory for `arch`.
    fn prepare_build_dir(&self, ctx: &Context, arch: &Arch) -> Result<()>;

    fn prebuild(&self, ctx: &Context, arch: &Arch) -> Result<()>;

    fn apply_patches(&self, ctx: &Context, arch: &Arch) -> Result<()>;

    /// False when the recipe's artifacts for `arch` already exist.
    fn should_build(&self, ctx: &Context, arch: &Arch) -> bool;

    fn build(&self, ctx: &Context, arch: &Arch) -> Result<()>;

    fn postbuild(&self, ctx: &Context, arch: &Arch) -> Result<()>;

    /// Directory of relocatable object files for biglink, if the recipe
    /// produces any.
    fn object_files_dir(&self, ctx: &Context, arch: &Arch) -> Option<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recipe_with_alternatives() {
        let yaml = r#"
version: "2.7.2"
url: https://example.org/Python-2.7.2.tgz
depends:
  - hostpython2
  - [sdl2, pygame]
conflicts: [python3]
opt_depends: [openssl]
"#;
        let recipe: Recipe = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(recipe.version.as_deref(), Some("2.7.2"));
        assert_eq!(recipe.kind, RecipeKind::Plain);
        assert_eq!(
            recipe.depends,
            vec![
                DependencySpec::Single("hostpython2".to_string()),
                DependencySpec::Alternatives(vec!["sdl2".to_string(), "pygame".to_string()]),
            ]
        );
        assert_eq!(recipe.conflicts, vec!["python3"]);
        assert_eq!(recipe.opt_depends, vec!["openssl"]);
    }

    #[test]
    fn test_parse_recipe_kind() {
        let recipe: Recipe = serde_yaml::from_str("kind: ndk_native").unwrap();
        assert_eq!(recipe.kind, RecipeKind::NdkNative);
        let recipe: Recipe = serde_yaml::from_str("kind: compiled").unwrap();
        assert!(recipe.produces_objects());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_yaml::from_str::<Recipe>("dependz: [a]");
        assert!(result.is_err());
    }

    #[test]
    fn test_object_files_override() {
        let mut recipe = Recipe::new("pyjnius").with_kind(RecipeKind::Compiled);
        recipe.object_files = Some(false);
        assert!(!recipe.produces_objects());

        let mut plain = Recipe::new("kivy");
        assert!(!plain.produces_objects());
        plain.object_files = Some(true);
        assert!(plain.produces_objects());
    }

    #[test]
    fn test_depends_display() {
        let recipe = Recipe::new("kivy").with_depends(vec![
            "python2".into(),
            DependencySpec::Alternatives(vec!["sdl2".to_string(), "pygame".to_string()]),
        ]);
        assert_eq!(recipe.depends_display(), "[python2, (sdl2|pygame)]");
    }
}
