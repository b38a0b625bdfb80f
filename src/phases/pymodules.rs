//! Phase 7: Python install
//!
//! Installs requested names that have no recipe with `pip`, from an
//! isolated virtual environment in the build directory, into the dist's
//! site-packages directory. `CC` and `CXX` point at `/bin/false` so any
//! package that needs native compilation fails here; such a package needs
//! a recipe instead.

use std::collections::BTreeMap;
use std::fs;

use log::info;

use super::Phase;
use crate::context::Context;
use crate::error::Result;
use crate::process::Invocation;

/// Requirements file written next to the environment.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Execute Phase 7 for `modules`.
pub fn execute(ctx: &Context, modules: &[String]) -> Result<()> {
    if modules.is_empty() {
        info!("There are no Python modules to install, skipping");
        return Ok(());
    }
    install(ctx, modules)
        .map_err(|e| e.in_phase(&modules.join(","), Phase::PythonInstall.as_str(), "all archs"))
}

fn install(ctx: &Context, modules: &[String]) -> Result<()> {
    info!(
        "The requirements ({}) don't have recipes, attempting to install them with pip",
        modules.join(", ")
    );
    info!("If this fails, it may mean that the module has compiled components and needs a recipe");

    let build_dir = ctx.build_dir();
    fs::create_dir_all(&build_dir)?;
    let mut venv = Invocation::new(ctx.virtualenv.as_str()).cwd(&build_dir);
    if let Some(python) = &ctx.host_python {
        venv = venv.arg(format!("--python={}", python));
    }
    ctx.runner.run(&venv.arg("venv"))?;

    info!("Creating a requirements.txt file for the Python modules");
    let mut requirements = modules.join("\n");
    requirements.push('\n');
    fs::write(build_dir.join(REQUIREMENTS_FILE), requirements)?;

    let site_packages = ctx.site_packages_dir();
    fs::create_dir_all(&site_packages)?;
    info!("Installing Python modules with pip");
    ctx.runner.run(
        &Invocation::new(build_dir.join("venv/bin/pip").display().to_string())
            .args(["install", "--target"])
            .arg(site_packages.display().to_string())
            .args(["-r", REQUIREMENTS_FILE])
            .envs(&sandbox_env())
            .cwd(&build_dir),
    )?;
    Ok(())
}

/// Compiler variables neutralized for the install.
fn sandbox_env() -> BTreeMap<String, String> {
    [("CC", "/bin/false"), ("CXX", "/bin/false"), ("PYTHONPATH", "")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
