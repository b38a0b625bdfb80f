//! Build steps for declarative recipes.
//!
//! Every phase of a `plain` or `compiled` recipe runs inside the recipe's
//! per-arch build directory, `<container>/<name>`, with the architecture
//! environment plus a few `DISTFORGE_*` variables describing where things
//! live. `ndk_native` recipes compile inside the prepared bootstrap instead.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::{BuildSteps, Recipe, RecipeKind};
use crate::arch::Arch;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fsutil;
use crate::process::Invocation;

impl Recipe {
    /// `url` with `{version}` substituted.
    pub fn versioned_url(&self) -> Option<String> {
        let url = self.url.as_ref()?;
        Some(match &self.version {
            Some(version) => url.replace("{version}", version),
            None => url.clone(),
        })
    }

    /// Where the source archive is cached: `packages/<name>/<file name>`.
    pub fn download_path(&self, ctx: &Context) -> Option<PathBuf> {
        let url = self.versioned_url()?;
        let file_name = url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .filter(|f| !f.is_empty())
            .unwrap_or("source");
        Some(ctx.packages_dir().join(&self.name).join(file_name))
    }

    /// The unpacked source tree for `arch`.
    pub fn build_dir(&self, ctx: &Context, arch: &Arch) -> PathBuf {
        ctx.build_container(&self.name, arch).join(&self.name)
    }

    /// Environment seen by this recipe's commands.
    pub fn env(&self, ctx: &Context, arch: &Arch) -> BTreeMap<String, String> {
        let mut env = arch.env(ctx);
        let mut set = |key: &str, value: String| {
            env.insert(key.to_string(), value);
        };
        set("DISTFORGE_RECIPE", self.name.clone());
        set("DISTFORGE_RECIPE_DIR", self.dir.display().to_string());
        set(
            "DISTFORGE_BUILD_DIR",
            self.build_dir(ctx, arch).display().to_string(),
        );
        set(
            "DISTFORGE_LIBS_DIR",
            ctx.libs_dir_path(arch).display().to_string(),
        );
        if let Some(version) = &self.version {
            set("DISTFORGE_VERSION", version.clone());
        }
        if let Some(objects) = self.object_files_dir(ctx, arch) {
            set("DISTFORGE_OBJECTS_DIR", objects.display().to_string());
        }
        if let Ok(bootstrap_dir) = ctx.bootstrap_build_dir() {
            set(
                "DISTFORGE_BOOTSTRAP_DIR",
                bootstrap_dir.display().to_string(),
            );
        }
        env
    }

    fn run_commands(
        &self,
        commands: &[String],
        ctx: &Context,
        arch: &Arch,
        cwd: &Path,
    ) -> Result<()> {
        if commands.is_empty() {
            return Ok(());
        }
        let env = self.env(ctx, arch);
        for line in commands {
            ctx.runner
                .run(&Invocation::shell(line).envs(&env).cwd(cwd))?;
        }
        Ok(())
    }

    /// The recipe's own directory, when it was loaded from disk.
    fn recipe_dir(&self) -> Option<&Path> {
        (!self.dir.as_os_str().is_empty()).then_some(self.dir.as_path())
    }

    fn fetch_local(&self, source: &str, target: &Path) -> Result<()> {
        let source = source.strip_prefix("file://").unwrap_or(source);
        let mut source = PathBuf::from(source);
        if let Some(dir) = self.recipe_dir().filter(|_| source.is_relative()) {
            source = dir.join(source);
        }
        if source.is_dir() {
            fsutil::copy_tree(&source, target)?;
        } else {
            fs::copy(&source, target)?;
        }
        Ok(())
    }

    fn extract(&self, ctx: &Context, archive: &Path, into: &Path) -> Result<()> {
        if archive.is_dir() {
            return fsutil::copy_tree(archive, into);
        }
        let name = archive.to_string_lossy();
        let invocation = if name.ends_with(".zip") {
            Invocation::new("unzip")
                .arg("-q")
                .arg(name.as_ref())
                .arg("-d")
                .arg(into.display().to_string())
        } else {
            Invocation::new("tar")
                .arg("-xf")
                .arg(name.as_ref())
                .arg("-C")
                .arg(into.display().to_string())
                .arg("--strip-components=1")
        };
        ctx.runner.run(&invocation)?;
        Ok(())
    }
}

/// `<target>.part`, where a download lands until it is complete.
fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Remove a file or directory tree, if present.
fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fsutil::remove_dir_if_exists(path)?;
    } else if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

impl BuildSteps for Recipe {
    fn name(&self) -> &str {
        &self.name
    }

    fn download(&self, ctx: &Context) -> Result<()> {
        let (Some(url), Some(target)) = (self.versioned_url(), self.download_path(ctx)) else {
            info!("Skipping {} download as no URL is set", self.name);
            return Ok(());
        };
        if target.exists() {
            info!("{} download already cached, skipping", self.name);
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        // Fetch next to the target so an interrupted transfer never looks cached
        let partial = partial_path(&target);
        remove_path(&partial)?;
        info!("Downloading {} from {}", self.name, url);
        let fetched = if url.starts_with("http://") || url.starts_with("https://") {
            ctx.runner
                .run(
                    &Invocation::new("curl")
                        .args(["-L", "--fail", "-o"])
                        .arg(partial.display().to_string())
                        .arg(url),
                )
                .map(|_| ())
        } else {
            self.fetch_local(&url, &partial)
        };
        if let Err(err) = fetched {
            if let Err(cleanup) = remove_path(&partial) {
                warn!("Could not remove {}: {}", partial.display(), cleanup);
            }
            return Err(err);
        }
        fs::rename(&partial, &target)?;
        Ok(())
    }

    fn prepare_build_dir(&self, ctx: &Context, arch: &Arch) -> Result<()> {
        let build_dir = self.build_dir(ctx, arch);
        fsutil::remove_dir_if_exists(&build_dir)?;
        fs::create_dir_all(&build_dir)?;
        if self.kind == RecipeKind::NdkNative {
            return Ok(());
        }
        if let Some(archive) = self.download_path(ctx) {
            if !archive.exists() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "source of {} not downloaded: {}",
                        self.name,
                        archive.display()
                    ),
                )));
            }
            info!("Unpacking {} for {}", self.name, arch);
            return self.extract(ctx, &archive, &build_dir);
        }
        let local_src = self.recipe_dir().map(|dir| dir.join("src"));
        if let Some(local_src) = local_src.filter(|src| src.is_dir()) {
            info!("Copying local source of {} for {}", self.name, arch);
            fsutil::copy_tree(&local_src, &build_dir)?;
        }
        Ok(())
    }

    fn prebuild(&self, ctx: &Context, arch: &Arch) -> Result<()> {
        self.run_commands(&self.prebuild, ctx, arch, &self.build_dir(ctx, arch))
    }

    fn apply_patches(&self, ctx: &Context, arch: &Arch) -> Result<()> {
        if self.patches.is_empty() {
            return Ok(());
        }
        info!("Applying patches for {}[{}]", self.name, arch);
        let build_dir = self.build_dir(ctx, arch);
        for patch in &self.patches {
            let patch = self.dir.join(patch);
            ctx.runner.run(
                &Invocation::new("patch")
                    .args(["-t", "-d"])
                    .arg(build_dir.display().to_string())
                    .args(["-p1", "-i"])
                    .arg(patch.display().to_string()),
            )?;
        }
        Ok(())
    }

    fn should_build(&self, ctx: &Context, arch: &Arch) -> bool {
        if self.kind == RecipeKind::NdkNative || self.built_libraries.is_empty() {
            return true;
        }
        let build_dir = self.build_dir(ctx, arch);
        self.built_libraries
            .iter()
            .any(|lib| !build_dir.join(lib).exists())
    }

    fn build(&self, ctx: &Context, arch: &Arch) -> Result<()> {
        if self.kind == RecipeKind::NdkNative {
            let bootstrap_dir = ctx.bootstrap_build_dir()?;
            let jni_dir = bootstrap_dir.join("jni");
            let cwd = if jni_dir.is_dir() { jni_dir } else { bootstrap_dir.clone() };
            ctx.runner.run(
                &Invocation::new("ndk-build")
                    .arg("V=1")
                    .arg(format!("APP_ABI={}", arch.name))
                    .envs(&self.env(ctx, arch))
                    .cwd(&cwd),
            )?;
            return self.run_commands(&self.build, ctx, arch, &bootstrap_dir);
        }
        if let Some(objects) = self.object_files_dir(ctx, arch) {
            fs::create_dir_all(objects)?;
        }
        self.run_commands(&self.build, ctx, arch, &self.build_dir(ctx, arch))
    }

    fn postbuild(&self, ctx: &Context, arch: &Arch) -> Result<()> {
        self.run_commands(&self.postbuild, ctx, arch, &self.build_dir(ctx, arch))
    }

    fn object_files_dir(&self, ctx: &Context, arch: &Arch) -> Option<PathBuf> {
        self.produces_objects().then(|| {
            ctx.build_container(&self.name, arch)
                .join(format!("objects_{}", self.name))
        })
    }
}
