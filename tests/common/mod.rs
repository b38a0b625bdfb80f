//! Shared test utilities for the CLI end-to-end tests.
//!
//! [`TestFixture::with_project`] lays out a self-contained project in a
//! temporary directory: a `.distforge.yaml`, a few recipes with local
//! sources, and a bootstrap with a template. Builds run real shell commands
//! but need no network and no cross toolchain.
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_project();
//! fixture.command().arg("order").assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::recipes;
    pub use super::TestFixture;
}

/// Recipe descriptors used by the fixtures.
#[allow(dead_code)]
pub mod recipes {
    /// Leaf recipe with a local `src/` tree; its build drops a library into
    /// the per-arch libs collection.
    pub const HELLO: &str = r#"
version: "1.0"
build:
  - mkdir -p "$DISTFORGE_LIBS_DIR" && cp hello.txt "$DISTFORGE_LIBS_DIR/libhello.so"
built_libraries: [hello.txt.built]
postbuild:
  - touch hello.txt.built
"#;

    /// Depends on `hello`.
    pub const APP: &str = r#"
version: "2.1"
depends: [hello]
build:
  - echo "built app for $ARCH" > app.log
"#;

    /// Alternative dependency on two mutually exclusive backends.
    pub const WIDGETS: &str = r#"
depends: [hello, [sdl, pygame]]
"#;

    pub const SDL: &str = "conflicts: [pygame]\n";

    pub const PYGAME: &str = "conflicts: [sdl]\n";

    /// Always fails in its build step.
    pub const BROKEN: &str = r#"
build:
  - echo "compiling broken" && exit 3
"#;
}

/// A temporary project directory for running the binary in.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `.distforge.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".distforge.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add `recipes/<name>/recipe.yaml`.
    pub fn with_recipe(self, name: &str, descriptor: &str) -> Self {
        self.with_file(&format!("recipes/{}/recipe.yaml", name), descriptor)
    }

    /// Add `bootstraps/<name>/bootstrap.yaml`.
    pub fn with_bootstrap(self, name: &str, descriptor: &str) -> Self {
        self.with_file(&format!("bootstraps/{}/bootstrap.yaml", name), descriptor)
    }

    /// The standard project: config, `hello`, `app`, `widgets`, `sdl`,
    /// `pygame`, and a `basic` bootstrap requiring `hello`.
    pub fn with_project(self) -> Self {
        self.with_config("storage_dir: store\narchs: [armeabi]\n")
            .with_recipe("hello", recipes::HELLO)
            .with_file("recipes/hello/src/hello.txt", "hello\n")
            .with_recipe("app", recipes::APP)
            .with_recipe("widgets", recipes::WIDGETS)
            .with_recipe("sdl", recipes::SDL)
            .with_recipe("pygame", recipes::PYGAME)
            .with_bootstrap("basic", "recipe_depends: [hello]\n")
            .with_file("bootstraps/basic/build/AndroidManifest.xml", "<manifest/>\n")
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The storage root configured by [`TestFixture::with_project`].
    pub fn storage(&self) -> PathBuf {
        self.path().join("store")
    }

    /// A dist directory under the storage root.
    pub fn dist(&self, name: &str) -> PathBuf {
        self.storage().join("dists").join(name)
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in this fixture's directory, isolated from the
    /// caller's distforge environment variables.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("distforge");
        cmd.current_dir(self.path())
            .env_remove("DISTFORGE_CONFIG")
            .env_remove("DISTFORGE_STORAGE")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_layout() {
        let fixture = TestFixture::new().with_project();
        assert!(fixture.path().join(".distforge.yaml").is_file());
        assert!(fixture.path().join("recipes/hello/src/hello.txt").is_file());
        assert!(fixture.path().join("bootstraps/basic/bootstrap.yaml").is_file());
    }

    #[test]
    fn test_recipe_descriptors_are_valid_yaml() {
        for descriptor in [
            recipes::HELLO,
            recipes::APP,
            recipes::WIDGETS,
            recipes::SDL,
            recipes::PYGAME,
            recipes::BROKEN,
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(descriptor)
                .expect("Descriptor should be valid YAML");
        }
    }
}
