#![deny(missing_docs)]

//! # Code Patching
//!
//! Utilities for modifying Rust source code strings based on AST analysis.
//!
//! - **tree**: The declaration model (imports, traits, structs, impls) of a file.
//! - **imports**: Import maintenance shared with the schema editor.
//! - **methods**: Trait signature + factory method injection.
//!
//! Every edit is planned as a [`Splice`] against the unedited text and applied in
//! one pass; the result is byte-compared with the input to decide whether
//! anything changed.

pub(crate) mod common;

/// Import maintenance (`use` items, schema `import` lines).
pub mod imports;

/// Method injection into traits and struct impls.
pub mod methods;

/// Structural model of a Rust source file.
pub mod tree;

pub use common::{apply_splices, Splice};
pub use imports::{ensure_import, plan_import, ImportEntry, ImportLayout, ImportSpec, ImportSyntax};
pub use methods::{inject_method, RustImports, TargetSpec};
pub use tree::StructuralTree;

/// Outcome of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// The resulting text; byte-identical to the input when `changed` is false.
    pub text: String,
    /// Whether the text differs from the input.
    pub changed: bool,
}

impl Mutation {
    /// A no-op result.
    pub fn unchanged(source: &str) -> Self {
        Self {
            text: source.to_string(),
            changed: false,
        }
    }

    /// Compares a rewrite with its input byte for byte.
    ///
    /// An identical rewrite is discarded in favour of the input.
    pub fn compare(original: &str, rewritten: String) -> Self {
        if rewritten.as_bytes() == original.as_bytes() {
            Self::unchanged(original)
        } else {
            Self {
                text: rewritten,
                changed: true,
            }
        }
    }
}
