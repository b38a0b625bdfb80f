//! Recipe catalog.
//!
//! Recipes are discovered on disk as `<dir>/<name>/recipe.yaml`. Several
//! recipe directories may be configured; a recipe in a later directory
//! shadows one with the same name in an earlier directory, so projects can
//! override bundled recipes. Listing order is by name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::recipe::Recipe;

/// Descriptor file name inside each recipe directory.
pub const RECIPE_FILE: &str = "recipe.yaml";

/// Outcome of looking a name up in the catalog.
///
/// `NotFound` is an expected answer: requested names without a recipe are
/// installed into the pure-runtime environment instead of being built.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Found(&'a Recipe),
    NotFound,
}

/// All known recipes, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: BTreeMap<String, Recipe>,
}

impl RecipeCatalog {
    /// Load every recipe under `dirs`. Missing directories are skipped.
    pub fn load(dirs: &[PathBuf]) -> Result<Self> {
        let mut recipes = BTreeMap::new();
        for (name, dir) in descriptor_dirs(dirs, RECIPE_FILE)? {
            let path = dir.join(RECIPE_FILE);
            let content = fs::read_to_string(&path)?;
            let mut recipe: Recipe =
                serde_yaml::from_str(&content).map_err(|e| Error::RecipeParse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            recipe.name = name.clone();
            recipe.dir = dir;
            debug!("Loaded recipe {} from {}", name, path.display());
            recipes.insert(name, recipe);
        }
        Ok(Self { recipes })
    }

    /// Build a catalog from in-memory recipes.
    pub fn from_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        Self {
            recipes: recipes
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        match self.recipes.get(name) {
            Some(recipe) => Lookup::Found(recipe),
            None => Lookup::NotFound,
        }
    }

    /// Fetch a recipe that must exist.
    pub fn get(&self, name: &str) -> Result<&Recipe> {
        self.recipes.get(name).ok_or_else(|| Error::RecipeNotFound {
            name: name.to_string(),
        })
    }

    /// The `conflicts` list of `name`, empty when there is no such recipe.
    pub fn conflicts_of(&self, name: &str) -> &[String] {
        self.recipes
            .get(name)
            .map(|r| r.conflicts.as_slice())
            .unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.recipes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// Find `<dir>/<name>/<file_name>` entries across `dirs`, in directory
/// order then name order. Later entries with the same name win when
/// collected into a map.
pub(crate) fn descriptor_dirs(dirs: &[PathBuf], file_name: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            debug!("Skipping missing descriptor directory {}", dir.display());
            continue;
        }
        let mut entries: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.join(file_name).is_file() {
                continue;
            }
            if let Some(name) = dir_name(&path) {
                entries.push((name, path));
            }
        }
        entries.sort();
        found.extend(entries);
    }
    Ok(found)
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_recipe(root: &Path, name: &str, body: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(RECIPE_FILE), body).unwrap();
    }

    #[test]
    fn test_load_recipes_from_dir() {
        let temp = TempDir::new().unwrap();
        write_recipe(temp.path(), "sdl2", "depends: [python2]\n");
        write_recipe(temp.path(), "python2", "{}\n");
        fs::create_dir_all(temp.path().join("not-a-recipe")).unwrap();

        let catalog = RecipeCatalog::load(&[temp.path().to_path_buf()]).unwrap();
        assert_eq!(catalog.len(), 2);
        let names: Vec<&String> = catalog.names().collect();
        assert_eq!(names, vec!["python2", "sdl2"]);
        let sdl2 = catalog.get("sdl2").unwrap();
        assert_eq!(sdl2.name, "sdl2");
        assert_eq!(sdl2.dir, temp.path().join("sdl2"));
    }

    #[test]
    fn test_later_dir_shadows_earlier() {
        let bundled = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        write_recipe(bundled.path(), "kivy", "version: \"1.8\"\n");
        write_recipe(local.path(), "kivy", "version: \"1.9\"\n");

        let catalog = RecipeCatalog::load(&[
            bundled.path().to_path_buf(),
            local.path().to_path_buf(),
        ])
        .unwrap();
        assert_eq!(catalog.get("kivy").unwrap().version.as_deref(), Some("1.9"));
    }

    #[test]
    fn test_missing_dir_is_skipped() {
        let catalog = RecipeCatalog::load(&[PathBuf::from("/nonexistent/recipes")]).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_invalid_recipe_reports_path() {
        let temp = TempDir::new().unwrap();
        write_recipe(temp.path(), "broken", "depends: {a: b}\n");
        let err = RecipeCatalog::load(&[temp.path().to_path_buf()]).unwrap_err();
        match err {
            Error::RecipeParse { path, .. } => assert!(path.ends_with("recipe.yaml")),
            other => panic!("expected RecipeParse, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_and_get() {
        let catalog = RecipeCatalog::from_recipes(vec![Recipe::new("jpeg")]);
        assert!(matches!(catalog.lookup("jpeg"), Lookup::Found(r) if r.name == "jpeg"));
        assert!(matches!(catalog.lookup("requests"), Lookup::NotFound));
        assert!(matches!(
            catalog.get("requests"),
            Err(Error::RecipeNotFound { name }) if name == "requests"
        ));
        assert!(catalog.conflicts_of("requests").is_empty());
    }
}
