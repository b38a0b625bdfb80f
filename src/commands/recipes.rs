//! # Recipes and Bootstraps Listing
//!
//! Read-only listings of the loaded catalogs.

use anyhow::Result;
use clap::Args;

use distforge::bootstrap::Bootstrap;
use distforge::output::OutputConfig;
use distforge::recipe::Recipe;

use super::Session;
use crate::cli::GlobalArgs;

/// List recipes
#[derive(Args, Debug)]
pub struct RecipesArgs {
    /// Print only the recipe names, on one line.
    #[arg(long)]
    pub compact: bool,
}

/// Execute the `recipes` command.
pub fn execute(globals: &GlobalArgs, args: RecipesArgs) -> Result<()> {
    let session = Session::open(globals)?;
    if session.recipes.is_empty() {
        println!("No recipes found in {}", display_dirs(&session.recipe_dirs));
        return Ok(());
    }
    if args.compact {
        let names: Vec<&str> = session.recipes.names().map(String::as_str).collect();
        println!("{}", names.join(" "));
        return Ok(());
    }
    for recipe in session.recipes.iter() {
        for line in describe_recipe(&session.output, recipe) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Execute the `bootstraps` command.
pub fn execute_bootstraps(globals: &GlobalArgs) -> Result<()> {
    let session = Session::open(globals)?;
    if session.bootstraps.is_empty() {
        println!("No bootstraps found in {}", display_dirs(&session.bootstrap_dirs));
        return Ok(());
    }
    for bootstrap in session.bootstraps.iter() {
        for line in describe_bootstrap(&session.output, bootstrap) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn describe_recipe(output: &OutputConfig, recipe: &Recipe) -> Vec<String> {
    let version = recipe.version.as_deref().unwrap_or("none");
    let mut lines = vec![format!(
        "{} {} {}",
        output.name(&recipe.name),
        output.detail(version),
        output.detail(format!("[{}]", recipe.kind))
    )];
    lines.push(format!(
        "    {} {}",
        output.relation("depends:"),
        recipe.depends_display()
    ));
    if !recipe.conflicts.is_empty() {
        lines.push(format!(
            "    {} [{}]",
            output.relation("conflicts:"),
            recipe.conflicts.join(", ")
        ));
    }
    if !recipe.opt_depends.is_empty() {
        lines.push(format!(
            "    {} [{}]",
            output.relation("optional depends:"),
            recipe.opt_depends.join(", ")
        ));
    }
    lines
}

fn describe_bootstrap(output: &OutputConfig, bootstrap: &Bootstrap) -> Vec<String> {
    let mut title = output.heading(&bootstrap.name);
    if !bootstrap.can_be_chosen_automatically {
        title.push_str(&format!(" {}", output.detail("(manual only)")));
    }
    vec![
        title,
        format!(
            "    {} [{}]",
            output.relation("depends:"),
            bootstrap.recipe_depends.join(", ")
        ),
    ]
}

fn display_dirs(dirs: &[std::path::PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
