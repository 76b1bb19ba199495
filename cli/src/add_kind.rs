#![deny(missing_docs)]

//! # Add-Kind Command
//!
//! Wires a new resource kind through an existing project.
//!
//! This command:
//! 1. Loads the layer conventions (`weld.yaml`, or the built-in defaults).
//! 2. Injects the factory method for the kind into each layer file.
//! 3. Declares the kind's CRUD methods in the schema service (backing it up first).
//!
//! Re-running it for the same kind changes nothing.

use crate::error::CliResult;
use crate::report::print_outcomes;
use std::path::PathBuf;
use weld_core::{MutationDriver, MutationOutcome, ProjectConfig, ResourceKind};

/// Arguments for the add-kind command.
#[derive(clap::Args, Debug, Clone)]
pub struct AddKindArgs {
    /// Resource kind to add (e.g. `Comment` or `blog_post`).
    pub kind: String,

    /// Project root; layer and schema paths are relative to it.
    #[clap(long, env = "WELD_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Configuration file (defaults to `<root>/weld.yaml` when present).
    #[clap(long, env = "WELD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only apply these layers (repeatable).
    #[clap(long = "layer")]
    pub layers: Vec<String>,

    /// Leave the schema untouched.
    #[clap(long)]
    pub skip_schema: bool,

    /// Report what would change without writing.
    #[clap(long)]
    pub dry_run: bool,

    /// Print outcomes as JSON.
    #[clap(long)]
    pub json: bool,
}

/// Executes the command, returning one outcome per file examined.
pub fn execute(args: &AddKindArgs) -> CliResult<Vec<MutationOutcome>> {
    let kind = ResourceKind::parse(&args.kind)?;
    let config = ProjectConfig::discover(&args.root, args.config.as_deref())?;
    let layers = config.select_layers(&args.layers)?;

    if !args.json {
        println!("Adding resource kind {} in {:?}...", kind, args.root);
    }

    let driver = MutationDriver::default().dry_run(args.dry_run);
    let mut outcomes = Vec::new();

    for layer in layers {
        let path = layer.path(&args.root, &kind);
        if !path.is_file() {
            tracing::warn!(layer = %layer.name, path = %path.display(), "layer file missing; skipping");
            if !args.json {
                println!("  -> Skipped {} (no such file)", path.display());
            }
            continue;
        }
        outcomes.push(driver.inject(&path, &layer.target(&kind))?);
    }

    if let Some(schema) = config.schema.as_ref().filter(|_| !args.skip_schema) {
        let driver = driver.backup_suffix(schema.backup_suffix.clone());
        outcomes.push(driver.augment(
            &schema.path(&args.root, &kind),
            kind.pascal(),
            &schema.service(&kind),
            &schema.options(&kind),
        )?);
    }

    print_outcomes(&outcomes, args.json)?;
    Ok(outcomes)
}
