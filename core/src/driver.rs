#![deny(missing_docs)]

//! # Mutation Driver
//!
//! Reads a file, runs one of the pure editors over it, and writes the result
//! back only when something changed. Schema files are backed up before they
//! are overwritten.

use crate::error::{AppError, AppResult};
use crate::patcher::{inject_method, Mutation, TargetSpec};
use crate::schema::{augment_service_with, SchemaOptions};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Byte-level file access used by [`MutationDriver`].
pub trait FileStore {
    /// Reads the whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replaces the file, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileStore for LocalFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, contents)
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationOutcome {
    /// The file that was examined.
    pub path: PathBuf,
    /// Whether the editor produced different text.
    pub changed: bool,
    /// Whether the new text was written (false on dry runs and no-ops).
    pub written: bool,
    /// Backup written before the file was replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

/// `api.proto` + `.bak` -> `api.proto.bak`, in the same directory.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Applies editors to files through a [`FileStore`].
#[derive(Debug, Clone)]
pub struct MutationDriver<F: FileStore = LocalFs> {
    store: F,
    dry_run: bool,
    backup_suffix: String,
}

impl Default for MutationDriver<LocalFs> {
    fn default() -> Self {
        Self::new(LocalFs)
    }
}

impl<F: FileStore> MutationDriver<F> {
    /// A driver that writes through `store` and backs schemas up to `*.bak`.
    pub fn new(store: F) -> Self {
        Self {
            store,
            dry_run: false,
            backup_suffix: ".bak".to_string(),
        }
    }

    /// When enabled, nothing is written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Suffix appended to schema file names for backups.
    pub fn backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &F {
        &self.store
    }

    /// Injects `spec` into the Rust file at `path`.
    pub fn inject(&self, path: &Path, spec: &TargetSpec) -> AppResult<MutationOutcome> {
        let source = self.read_text(path)?;
        let mutation = inject_method(&source, spec).map_err(|e| e.in_file(path))?;
        tracing::debug!(
            path = %path.display(),
            method = %spec.method_name,
            changed = mutation.changed,
            "injection planned"
        );
        self.commit(path, &source, mutation, false)
    }

    /// Adds the CRUD methods for `kind` to `service` in the schema at `path`.
    pub fn augment(
        &self,
        path: &Path,
        kind: &str,
        service: &str,
        options: &SchemaOptions,
    ) -> AppResult<MutationOutcome> {
        let doc = self.read_text(path)?;
        let mutation =
            augment_service_with(&doc, kind, service, options).map_err(|e| e.in_file(path))?;
        tracing::debug!(
            path = %path.display(),
            service,
            kind,
            changed = mutation.changed,
            "augmentation planned"
        );
        self.commit(path, &doc, mutation, true)
    }

    fn read_text(&self, path: &Path) -> AppResult<String> {
        let bytes = self
            .store
            .read(path)
            .map_err(|e| AppError::Io(e).in_file(path))?;
        String::from_utf8(bytes).map_err(|e| {
            AppError::Parse(format!("file is not valid UTF-8: {}", e.utf8_error())).in_file(path)
        })
    }

    fn commit(
        &self,
        path: &Path,
        original: &str,
        mutation: Mutation,
        backup: bool,
    ) -> AppResult<MutationOutcome> {
        let mut outcome = MutationOutcome {
            path: path.to_path_buf(),
            changed: mutation.changed,
            written: false,
            backup: None,
        };
        if !mutation.changed {
            tracing::debug!(path = %path.display(), "unchanged");
            return Ok(outcome);
        }
        if self.dry_run {
            tracing::info!(path = %path.display(), "would update (dry run)");
            return Ok(outcome);
        }

        if backup {
            let target = backup_path(path, &self.backup_suffix);
            self.store
                .write(&target, original.as_bytes())
                .map_err(|e| AppError::Io(e).in_file(&target))?;
            tracing::info!(backup = %target.display(), "backed up");
            outcome.backup = Some(target);
        }

        self.store
            .write(path, mutation.text.as_bytes())
            .map_err(|e| AppError::Io(e).in_file(path))?;
        outcome.written = true;
        tracing::info!(path = %path.display(), "updated");
        Ok(outcome)
    }
}
