#![deny(missing_docs)]

//! # Augment Command
//!
//! Declares the Create/Update/Delete/Get/List methods of a resource kind in a
//! Protocol Buffers service.
//!
//! `--file` may name a single schema or a directory; a directory is searched
//! recursively for `.proto` files declaring the service, and each of them is
//! augmented. Every rewritten schema is backed up first.

use crate::error::{CliError, CliResult};
use crate::report::print_outcomes;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use weld_core::{AppError, MutationDriver, MutationOutcome, ResourceKind, SchemaOptions};

/// Arguments for the augment command.
#[derive(clap::Args, Debug, Clone)]
pub struct AugmentArgs {
    /// Schema file, or a directory of schema files.
    #[clap(long)]
    pub file: PathBuf,

    /// Resource kind (e.g. `Post`).
    #[clap(long)]
    pub kind: String,

    /// Service to extend.
    #[clap(long)]
    pub service: String,

    /// Schema to import (repeatable). `{kind}` expands to the snake_case kind.
    #[clap(long = "import")]
    pub imports: Vec<String>,

    /// Indentation for a service block with no lines to copy it from.
    #[clap(long, default_value = "  ")]
    pub indent: String,

    /// Suffix for backups.
    #[clap(long, default_value = ".bak")]
    pub backup_suffix: String,

    /// Report what would change without writing.
    #[clap(long)]
    pub dry_run: bool,

    /// Print outcomes as JSON.
    #[clap(long)]
    pub json: bool,
}

/// `.proto` files under `dir`, in a stable order.
pub fn discover_schemas(dir: &Path) -> CliResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "proto")
        {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Executes the augmentation.
pub fn execute(args: &AugmentArgs) -> CliResult<Vec<MutationOutcome>> {
    let kind = ResourceKind::parse(&args.kind)?;
    let options = SchemaOptions {
        default_indent: args.indent.clone(),
        imports: args.imports.iter().map(|i| kind.expand(i)).collect(),
    };
    let driver = MutationDriver::default()
        .dry_run(args.dry_run)
        .backup_suffix(args.backup_suffix.clone());

    if !args.json {
        println!(
            "Adding {} methods to service {} in {:?}...",
            kind, args.service, args.file
        );
    }

    let outcomes = if args.file.is_dir() {
        let mut outcomes = Vec::new();
        for path in discover_schemas(&args.file)? {
            match driver.augment(&path, kind.pascal(), &args.service, &options) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) if matches!(err.root(), AppError::NotFound(_)) => {
                    tracing::debug!(path = %path.display(), "service not declared here");
                }
                Err(err) => return Err(err.into()),
            }
        }
        if outcomes.is_empty() {
            return Err(CliError::Core(AppError::NotFound(format!(
                "service '{}' not found under {}",
                args.service,
                args.file.display()
            ))));
        }
        outcomes
    } else {
        vec![driver.augment(&args.file, kind.pascal(), &args.service, &options)?]
    };

    print_outcomes(&outcomes, args.json)?;
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const API: &str = "syntax = \"proto3\";\n\npackage api;\n\nservice ApiService {\n  rpc CreatePost(CreatePostRequest) returns (CreatePostResponse);\n}\n";

    fn args(file: PathBuf) -> AugmentArgs {
        AugmentArgs {
            file,
            kind: "post".into(),
            service: "ApiService".into(),
            imports: vec!["{kind}.proto".into()],
            indent: "  ".into(),
            backup_suffix: ".bak".into(),
            dry_run: false,
            json: true,
        }
    }

    #[test]
    fn test_single_file_is_augmented_and_backed_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("api.proto");
        fs::write(&path, API).unwrap();

        let outcomes = execute(&args(path.clone())).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].backup, Some(dir.path().join("api.proto.bak")));

        let doc = fs::read_to_string(&path).unwrap();
        assert!(doc.contains("package api;\n\nimport \"post.proto\";\n"));
        assert!(doc.contains("  rpc ListPost(ListPostRequest) returns (ListPostResponse);\n}"));
        assert_eq!(fs::read_to_string(dir.path().join("api.proto.bak")).unwrap(), API);
    }

    #[test]
    fn test_directory_skips_schemas_without_the_service() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("v1")).unwrap();
        fs::write(dir.path().join("v1/api.proto"), API).unwrap();
        fs::write(dir.path().join("v1/post.proto"), "message Post {}\n").unwrap();
        fs::write(dir.path().join("README.md"), "service ApiService {}\n").unwrap();

        let outcomes = execute(&args(dir.path().to_path_buf())).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].path, dir.path().join("v1/api.proto"));
        assert_eq!(
            fs::read_to_string(dir.path().join("v1/post.proto")).unwrap(),
            "message Post {}\n"
        );
    }

    #[test]
    fn test_directory_without_service_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("post.proto"), "message Post {}\n").unwrap();
        assert!(execute(&args(dir.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_acronym_kind_matches_existing_methods() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("api.proto");
        fs::write(
            &path,
            "service ApiService {\n  rpc CreateHTTPRoute(CreateHTTPRouteRequest) returns (CreateHTTPRouteResponse);\n}\n",
        )
        .unwrap();

        let mut a = args(path.clone());
        a.kind = "HTTPRoute".into();
        a.imports.clear();
        execute(&a).unwrap();

        let doc = fs::read_to_string(&path).unwrap();
        assert_eq!(doc.matches("rpc Create").count(), 1);
        assert!(doc.contains("  rpc ListHTTPRoute(ListHTTPRouteRequest) returns (ListHTTPRouteResponse);\n}"));
        assert!(!doc.contains("HttpRoute"));
    }

    #[test]
    fn test_invalid_kind_is_rejected_before_reading() {
        let mut a = args(PathBuf::from("does/not/exist.proto"));
        a.kind = "".into();
        let err = execute(&a).unwrap_err();
        assert!(matches!(err, CliError::Core(AppError::Config(_))));
    }
}
