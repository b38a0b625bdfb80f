//! # distforge CLI
//!
//! Binary entry point for the `distforge` command-line tool. Parses
//! arguments with `clap` and dispatches to the command implementations;
//! all build logic lives in the library crate.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    cli::Cli::parse().run()
}
