//! # Order Command Implementation
//!
//! Resolves the requirements without building anything and prints the build
//! order, the names that will be installed with pip, and the bootstrap. With
//! `--tree` the dependency graph is drawn using `ptree`; `--all` shows every
//! candidate graph that survived conflict pruning rather than just the one
//! used for the build.

use std::borrow::Cow;
use std::collections::BTreeSet;

use anyhow::{Context as _, Result};
use clap::Args;
use ptree::{print_tree, TreeItem};

use distforge::graph::DependencyGraph;
use distforge::resolver::Resolver;

use super::Session;
use crate::cli::GlobalArgs;

/// Show the resolved build order
#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Draw the dependency graph as a tree.
    #[arg(long)]
    pub tree: bool,

    /// Show every surviving candidate graph, not only the first.
    #[arg(long)]
    pub all: bool,
}

/// Execute the `order` command.
pub fn execute(globals: &GlobalArgs, args: OrderArgs) -> Result<()> {
    let session = Session::open(globals)?;
    if session.requirements.is_empty() {
        anyhow::bail!("No requirements given; pass --requirements or set them in the config file");
    }
    let resolution = Resolver::new(&session.recipes, &session.bootstraps)
        .resolve(&session.requirements, session.bootstrap.as_deref())
        .context("Failed to resolve requirements")?;
    let output = &session.output;

    println!(
        "{} {}",
        output.heading("Build order:"),
        resolution.build_order.join(", ")
    );
    if !resolution.python_modules.is_empty() {
        println!(
            "{} {}",
            output.heading("Installed with pip:"),
            resolution.python_modules.join(", ")
        );
    }
    println!(
        "{} {}",
        output.heading("Bootstrap:"),
        output.name(&resolution.bootstrap.name)
    );

    let shown = if args.all {
        resolution.candidates.len()
    } else {
        resolution.candidates.len().min(1)
    };
    if args.all {
        println!("{} candidate graph(s)", resolution.candidates.len());
    }
    for (index, graph) in resolution.candidates.iter().take(shown).enumerate() {
        if args.tree {
            let root = dependency_tree(&format!("candidate {}", index), graph);
            print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
        } else if args.all {
            let nodes: Vec<&str> = graph.keys().map(String::as_str).collect();
            println!("  {}: {}", index, nodes.join(", "));
        }
    }
    Ok(())
}

/// Build a tree whose top level holds the recipes nothing else depends on,
/// each with its dependencies below it.
fn dependency_tree(label: &str, graph: &DependencyGraph) -> TreeNode {
    let depended_on: BTreeSet<&String> = graph.values().flatten().collect();
    let children = graph
        .keys()
        .filter(|name| !depended_on.contains(name))
        .map(|name| subtree(name, graph, &mut Vec::new()))
        .collect();
    TreeNode {
        label: label.to_string(),
        children,
    }
}

fn subtree(name: &str, graph: &DependencyGraph, path: &mut Vec<String>) -> TreeNode {
    if path.iter().any(|p| p == name) {
        return TreeNode {
            label: format!("{} (cycle)", name),
            children: Vec::new(),
        };
    }
    path.push(name.to_string());
    let children = graph
        .get(name)
        .map(|deps| deps.iter().map(|dep| subtree(dep, graph, path)).collect())
        .unwrap_or_default();
    path.pop();
    TreeNode {
        label: name.to_string(),
        children,
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `(name, "dep1 dep2")` pairs.
    fn graph(edges: &[(&str, &str)]) -> DependencyGraph {
        edges
            .iter()
            .map(|(name, deps)| {
                (
                    name.to_string(),
                    deps.split_whitespace().map(str::to_string).collect(),
                )
            })
            .collect()
    }

    fn labels(node: &TreeNode) -> Vec<&str> {
        node.children.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_tree_roots_are_undepended_recipes() {
        let g = graph(&[
            ("python2", ""),
            ("sdl2", ""),
            ("kivy", "python2 sdl2"),
            ("requests", ""),
        ]);
        let root = dependency_tree("candidate 0", &g);
        assert_eq!(root.label, "candidate 0");
        assert_eq!(labels(&root), vec!["kivy", "requests"]);
        assert_eq!(labels(&root.children[0]), vec!["python2", "sdl2"]);
    }

    #[test]
    fn test_tree_marks_cycles() {
        let g = graph(&[("a", "b"), ("b", "a"), ("c", "a")]);
        let root = dependency_tree("g", &g);
        assert_eq!(labels(&root), vec!["c"]);
        let a = &root.children[0].children[0];
        assert_eq!(a.label, "a");
        assert_eq!(a.children[0].children[0].label, "a (cycle)");
    }
}
