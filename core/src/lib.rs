#![deny(missing_docs)]

//! # Weld Core
//!
//! Incremental, idempotent edits to the source files of a generated project:
//! wiring a new resource kind into Rust layer traits and their implementing
//! structs, and declaring its CRUD methods in a Protocol Buffers service.

/// Shared error types.
pub mod error;

/// Lexical classification of schema text (code, comment, string).
pub mod scanner;

/// Named brace-block location.
pub mod region;

/// Rust source editing (declarations, imports, method injection).
pub mod patcher;

/// Protocol Buffers service augmentation.
pub mod schema;

/// Resource kind case variants and templates.
pub mod naming;

/// `weld.yaml` project conventions.
pub mod config;

/// File-level application of edits.
pub mod driver;

pub use config::{LayerConfig, ProjectConfig, SchemaConfig};
pub use driver::{FileStore, LocalFs, MutationDriver, MutationOutcome};
pub use error::{AppError, AppResult};
pub use naming::ResourceKind;
pub use patcher::{inject_method, ImportSpec, Mutation, TargetSpec};
pub use schema::{augment_service, augment_service_with, missing_verbs, RpcVerb, SchemaOptions};
