#![deny(missing_docs)]

//! # Weld CLI
//!
//! Command Line Interface for incremental project edits.
//!
//! Supported Commands:
//! - `add-kind`: Wires a resource kind through every configured layer and the schema.
//! - `inject`: Adds one trait signature + factory method to a Rust file.
//! - `augment`: Declares a kind's CRUD methods in a Protocol Buffers service.

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod add_kind;
mod augment;
mod error;
mod inject;
mod logging;
mod report;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Incremental source mutation for generated projects")]
struct Cli {
    /// Log engine decisions.
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a resource kind to every configured layer and the schema service.
    AddKind(add_kind::AddKindArgs),
    /// Inject a method signature and its factory into one Rust file.
    Inject(inject::InjectArgs),
    /// Add CRUD methods for a kind to a schema service.
    Augment(augment::AugmentArgs),
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    match &cli.command {
        Commands::AddKind(args) => {
            add_kind::execute(args)?;
        }
        Commands::Inject(args) => {
            inject::execute(args)?;
        }
        Commands::Augment(args) => {
            augment::execute(args)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_kind() {
        let cli = Cli::parse_from(["weld", "-v", "add-kind", "Comment", "--layer", "service", "--dry-run"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::AddKind(args) => {
                assert_eq!(args.kind, "Comment");
                assert_eq!(args.layers, vec!["service".to_string()]);
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn alias_requires_import() {
        let res = Cli::try_parse_from([
            "weld", "inject", "--file", "a.rs", "--interface", "I", "--struct", "S",
            "--method", "m", "--returns", "T", "--constructor", "T::new()", "--alias", "X",
        ]);
        assert!(res.is_err());
    }
}
