#![deny(missing_docs)]

//! # Inject Command
//!
//! Adds one method signature to a trait and the matching factory method to the
//! struct that builds it, in a single Rust file.

use crate::error::CliResult;
use crate::report::print_outcomes;
use std::path::PathBuf;
use weld_core::{ImportSpec, MutationDriver, MutationOutcome, TargetSpec};

/// Arguments for the inject command.
#[derive(clap::Args, Debug, Clone)]
pub struct InjectArgs {
    /// Rust file to edit.
    #[clap(long)]
    pub file: PathBuf,

    /// Trait receiving the signature.
    #[clap(long)]
    pub interface: String,

    /// Struct receiving the factory method.
    #[clap(long = "struct")]
    pub struct_name: String,

    /// Method name.
    #[clap(long)]
    pub method: String,

    /// Return type (e.g. `CommentRepository`).
    #[clap(long)]
    pub returns: String,

    /// Factory body expression (e.g. `CommentRepository::new(self.pool.clone())`).
    #[clap(long)]
    pub constructor: String,

    /// Doc comment for the signature.
    #[clap(long)]
    pub doc: Option<String>,

    /// Path to bring into scope with `use`.
    #[clap(long)]
    pub import: Option<String>,

    /// Alias for `--import`.
    #[clap(long, requires = "import")]
    pub alias: Option<String>,

    /// Report what would change without writing.
    #[clap(long)]
    pub dry_run: bool,

    /// Print the outcome as JSON.
    #[clap(long)]
    pub json: bool,
}

impl InjectArgs {
    /// The injection request described by these flags.
    pub fn target(&self) -> TargetSpec {
        TargetSpec {
            interface_name: self.interface.clone(),
            struct_name: self.struct_name.clone(),
            method_name: self.method.clone(),
            return_type: self.returns.clone(),
            doc_comment: self.doc.clone(),
            constructor: self.constructor.clone(),
            import: self.import.as_ref().map(|path| {
                let spec = ImportSpec::new(path.clone());
                match &self.alias {
                    Some(alias) => spec.with_alias(alias.clone()),
                    None => spec,
                }
            }),
        }
    }
}

/// Executes the injection.
pub fn execute(args: &InjectArgs) -> CliResult<MutationOutcome> {
    if !args.json {
        println!("Injecting `{}` into {:?}...", args.method, args.file);
    }
    let driver = MutationDriver::default().dry_run(args.dry_run);
    let outcome = driver.inject(&args.file, &args.target())?;
    print_outcomes(std::slice::from_ref(&outcome), args.json)?;
    Ok(outcome)
}
