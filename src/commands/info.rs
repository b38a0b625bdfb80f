//! # Info Commands
//!
//! Read-only reports: `archs`, `build-status` and `print-context-info`.
//! None of them modify the storage root.

use anyhow::Result;

use distforge::arch::{Arch, KNOWN_ARCHS};
use distforge::clean::{build_status, BuildStatus};
use distforge::output::OutputConfig;

use super::Session;
use crate::cli::GlobalArgs;

/// Execute the `archs` command.
pub fn execute_archs(globals: &GlobalArgs) -> Result<()> {
    let session = Session::open(globals)?;
    println!("{}", session.output.heading("Supported architectures:"));
    for name in KNOWN_ARCHS {
        let selected = session.ctx.archs.iter().any(|a| a.name == *name);
        let arch = Arch::from_name(name)?;
        let mut line = format!(
            "    {} {}",
            session.output.name(name),
            session.output.detail(&arch.command_prefix)
        );
        if selected {
            line.push_str(" (selected)");
        }
        println!("{}", line);
    }
    Ok(())
}

/// Execute the `build-status` command.
pub fn execute_build_status(globals: &GlobalArgs) -> Result<()> {
    let session = Session::open(globals)?;
    let status = build_status(&session.ctx)?;
    for line in describe_status(&session.output, &status) {
        println!("{}", line);
    }
    Ok(())
}

/// Execute the `print-context-info` command.
pub fn execute_context(globals: &GlobalArgs) -> Result<()> {
    let session = Session::open(globals)?;
    let ctx = &session.ctx;
    let output = &session.output;

    println!("{}", output.heading("Storage"));
    let dirs = [
        ("storage_dir", ctx.storage_dir().to_path_buf()),
        ("build_dir", ctx.build_dir()),
        ("dist_dir", ctx.dist_dir()),
        ("packages_dir", ctx.packages_dir()),
        ("state_file", ctx.state_path()),
    ];
    for (label, path) in dirs {
        println!("    {}: {}", label, output.detail(path.display()));
    }

    println!("{}", output.heading("Catalogs"));
    for dir in &session.recipe_dirs {
        println!("    recipe dir: {}", output.detail(dir.display()));
    }
    for dir in &session.bootstrap_dirs {
        println!("    bootstrap dir: {}", output.detail(dir.display()));
    }
    println!(
        "    {} recipe(s), {} bootstrap(s)",
        session.recipes.len(),
        session.bootstraps.iter().count()
    );

    for arch in &ctx.archs {
        println!("{}", output.heading(format!("Environment for {}", arch)));
        for (key, value) in arch.env(ctx) {
            println!("    {}={}", key, value);
        }
    }
    Ok(())
}

fn describe_status(output: &OutputConfig, status: &BuildStatus) -> Vec<String> {
    let mut lines = vec![output.heading("Bootstraps whose core components are probably already built:")];
    lines.extend(status.bootstraps.iter().map(|b| format!("    {}", output.name(b))));
    lines.push(output.heading("Recipes that are probably already built:"));
    for (recipe, archs) in &status.recipes {
        let mut line = format!("    {}", output.name(recipe));
        if !archs.is_empty() {
            line.push_str(&format!(" (for {})", archs.join(", ")));
        }
        lines.push(line);
    }
    lines
}
