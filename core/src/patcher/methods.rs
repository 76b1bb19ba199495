use crate::error::AppResult;
use crate::patcher::common::{
    append_to_block, indent_lines, infer_body_indent, line_ending, line_indent, Splice,
};
use crate::patcher::imports::{plan_import, ImportLayout, ImportSpec, ImportSyntax};
use crate::patcher::tree::{Block, StructuralTree};
use crate::patcher::Mutation;

/// What to inject into one layer file, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Trait receiving the method signature.
    pub interface_name: String,
    /// Struct receiving the factory method.
    pub struct_name: String,
    /// Method name, shared by signature and factory.
    pub method_name: String,
    /// Return type expression (`comment::CommentRepository`).
    pub return_type: String,
    /// Documentation for the new signature, one entry per line.
    pub doc_comment: Option<String>,
    /// Single expression forming the factory body.
    pub constructor: String,
    /// Import the factory depends on.
    pub import: Option<ImportSpec>,
}

/// Rust `use` declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustImports;

impl ImportSyntax for RustImports {
    fn layout(&self, source: &str) -> AppResult<ImportLayout> {
        Ok(StructuralTree::parse(source)?.import_layout())
    }

    fn render(&self, import: &ImportSpec) -> String {
        match &import.alias {
            Some(alias) => format!("use {} as {};", import.path, alias),
            None => format!("use {};", import.path),
        }
    }
}

/// Adds `spec.method_name` to the trait and a matching factory to the struct.
///
/// Each half is skipped when its declaration is absent or already has the
/// method, so applying the same spec twice leaves the text untouched. The
/// import is only added alongside a new declaration.
///
/// # Examples
/// ```
/// use weld_core::patcher::{inject_method, TargetSpec};
///
/// let code = "pub trait Repository {}\n\npub struct PgRepository;\n";
/// let spec = TargetSpec {
///     interface_name: "Repository".into(),
///     struct_name: "PgRepository".into(),
///     method_name: "comment".into(),
///     return_type: "CommentRepository".into(),
///     doc_comment: None,
///     constructor: "CommentRepository::new()".into(),
///     import: None,
/// };
/// let first = inject_method(code, &spec).unwrap();
/// assert!(first.changed);
/// assert!(first.text.contains("fn comment(&self) -> CommentRepository;"));
///
/// let second = inject_method(&first.text, &spec).unwrap();
/// assert!(!second.changed);
/// ```
pub fn inject_method(source: &str, spec: &TargetSpec) -> AppResult<Mutation> {
    let mut tree = StructuralTree::parse(source)?;
    let eol = line_ending(source);
    let mut inserted = false;

    if let Some(splice) = plan_interface_method(&tree, spec, eol) {
        tree.push(splice);
        inserted = true;
    }

    if let Some(splice) = plan_factory_method(&tree, spec, eol) {
        tree.push(splice);
        inserted = true;
    }

    if inserted {
        if let Some(import) = &spec.import {
            if let Some(splice) = plan_import(source, &tree.import_layout(), import, &RustImports) {
                tree.push(splice);
            }
        }
    }

    Ok(Mutation::compare(source, tree.serialize()))
}

fn plan_interface_method(tree: &StructuralTree<'_>, spec: &TargetSpec, eol: &str) -> Option<Splice> {
    let Some(decl) = tree.interface(&spec.interface_name) else {
        tracing::debug!(interface = %spec.interface_name, "trait absent; skipping signature");
        return None;
    };
    if decl.has_method(&spec.method_name) {
        tracing::debug!(interface = %spec.interface_name, method = %spec.method_name, "signature present");
        return None;
    }
    let block = decl.block?;

    let mut lines = doc_lines(spec.doc_comment.as_deref());
    lines.push(format!(
        "fn {}(&self) -> {};",
        spec.method_name, spec.return_type
    ));

    tracing::debug!(interface = %spec.interface_name, method = %spec.method_name, "adding signature");
    Some(append_in(tree.source(), block, &lines, eol))
}

fn plan_factory_method(tree: &StructuralTree<'_>, spec: &TargetSpec, eol: &str) -> Option<Splice> {
    if tree.record(&spec.struct_name).is_none() {
        tracing::debug!(struct_name = %spec.struct_name, "struct absent; skipping factory");
        return None;
    }

    let impls: Vec<_> = tree.impls_for(&spec.struct_name).collect();
    if impls.iter().any(|imp| imp.has_method(&spec.method_name)) {
        tracing::debug!(struct_name = %spec.struct_name, method = %spec.method_name, "factory present");
        return None;
    }

    // Prefer the impl of the trait that just gained the signature.
    let target = impls
        .iter()
        .find(|imp| imp.trait_name.as_deref() == Some(spec.interface_name.as_str()))
        .or_else(|| impls.iter().rev().find(|imp| imp.trait_name.is_none()))
        .and_then(|imp| imp.block.map(|block| (imp.trait_name.is_none(), block)));

    tracing::debug!(struct_name = %spec.struct_name, method = %spec.method_name, "adding factory");
    Some(match target {
        Some((inherent, block)) => {
            append_in(tree.source(), block, &factory_lines(spec, inherent), eol)
        }
        None => new_impl_block(tree.source(), spec, eol),
    })
}

fn append_in(source: &str, block: Block, lines: &[String], eol: &str) -> Splice {
    let indent = infer_body_indent(&source[block.open + 1..block.close])
        .unwrap_or_else(|| format!("{}    ", line_indent(source, block.open)));
    append_to_block(source, block.open, block.close, lines, &indent, eol)
}

fn doc_lines(doc: Option<&str>) -> Vec<String> {
    doc.map(|doc| {
        doc.lines()
            .map(|line| {
                let line = line.trim_end();
                if line.is_empty() {
                    "///".to_string()
                } else {
                    format!("/// {}", line)
                }
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Trait impls get a bare `fn`; inherent impls get `pub fn` and the doc comment.
fn factory_lines(spec: &TargetSpec, inherent: bool) -> Vec<String> {
    let mut lines = if inherent {
        doc_lines(spec.doc_comment.as_deref())
    } else {
        Vec::new()
    };
    let visibility = if inherent { "pub " } else { "" };
    lines.push(format!(
        "{}fn {}(&self) -> {} {{",
        visibility, spec.method_name, spec.return_type
    ));
    lines.extend(body_lines(&spec.constructor));
    lines.push("}".to_string());
    lines
}

/// Constructor lines indented one level, keeping their nesting relative to
/// the least-indented line.
fn body_lines(constructor: &str) -> Vec<String> {
    let lines: Vec<&str> = constructor
        .trim_matches(['\n', '\r'])
        .lines()
        .map(str::trim_end)
        .collect();
    let common = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {}", &line[common..])
            }
        })
        .collect()
}

fn new_impl_block(source: &str, spec: &TargetSpec, eol: &str) -> Splice {
    let mut text = String::new();
    if !source.is_empty() {
        if !source.ends_with('\n') {
            text.push_str(eol);
        }
        if !source.ends_with(&format!("{}{}", eol, eol)) {
            text.push_str(eol);
        }
    }
    text.push_str(&format!("impl {} {{{}", spec.struct_name, eol));
    text.push_str(&indent_lines(&factory_lines(spec, true), "    ", eol));
    text.push('}');
    text.push_str(eol);
    Splice::insert(source.len(), text)
}
