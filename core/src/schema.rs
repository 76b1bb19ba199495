#![deny(missing_docs)]

//! # Schema Augmentation
//!
//! Adds the standard CRUD `rpc` declarations for a resource kind to a `service`
//! block of a Protocol Buffers document, and keeps its `import` lines in order.
//!
//! The document is never parsed as a whole: the block is bounded with the
//! [scanner](crate::scanner) and everything outside the inserted lines is left
//! byte-for-byte as it was, apart from the file ending.

use crate::error::{AppError, AppResult};
use crate::patcher::common::{append_to_block, infer_body_indent, line_ending};
use crate::patcher::{
    apply_splices, plan_import, ImportEntry, ImportLayout, ImportSpec, ImportSyntax, Mutation,
};
use crate::region::{locate_block, BlockRegion};
use crate::scanner::{code_line_starts, LexMode, Scanner};
use regex::Regex;
use std::sync::OnceLock;

/// One of the five conventional methods every resource kind exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcVerb {
    /// `Create{Kind}`
    Create,
    /// `Update{Kind}`
    Update,
    /// `Delete{Kind}`
    Delete,
    /// `Get{Kind}`
    Get,
    /// `List{Kind}`
    List,
}

impl RpcVerb {
    /// All verbs, in insertion order.
    pub const ALL: [RpcVerb; 5] = [
        RpcVerb::Create,
        RpcVerb::Update,
        RpcVerb::Delete,
        RpcVerb::Get,
        RpcVerb::List,
    ];

    /// The verb as it prefixes method names.
    pub fn as_str(self) -> &'static str {
        match self {
            RpcVerb::Create => "Create",
            RpcVerb::Update => "Update",
            RpcVerb::Delete => "Delete",
            RpcVerb::Get => "Get",
            RpcVerb::List => "List",
        }
    }

    /// `Create` + `Post` -> `CreatePost`.
    pub fn method_name(self, kind: &str) -> String {
        format!("{}{}", self.as_str(), kind)
    }

    /// The full declaration line, without indentation.
    pub fn declaration(self, kind: &str) -> String {
        let name = self.method_name(kind);
        format!("rpc {name}({name}Request) returns ({name}Response);")
    }
}

/// Knobs for [`augment_service_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Indentation used when the service block has no lines to copy it from.
    pub default_indent: String,
    /// Schema files the service needs imported (`post.proto`).
    pub imports: Vec<String>,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            default_indent: "  ".to_string(),
            imports: Vec::new(),
        }
    }
}

/// Protocol Buffers `import "...";` statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoImports;

fn import_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*import\s+(?:(?:public|weak)\s+)?"([^"]*)"\s*;"#).expect("valid regex")
    })
}

fn package_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*package\s+[\w.]+\s*;").expect("valid regex"))
}

fn version_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(?:syntax|edition)\s*=\s*"[^"]*"\s*;"#).expect("valid regex")
    })
}

fn rpc_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\brpc\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"))
}

impl ImportSyntax for ProtoImports {
    fn layout(&self, source: &str) -> AppResult<ImportLayout> {
        let mut layout = ImportLayout::default();

        for start in code_line_starts(source) {
            let line = source[start..].lines().next().unwrap_or("");
            let span = start..start + line.trim_end().len();

            if let Some(caps) = import_line().captures(line) {
                layout.entries.push(ImportEntry {
                    span,
                    path: caps[1].to_string(),
                    alias: None,
                });
            } else if layout.package.is_none() && package_line().is_match(line) {
                layout.package = Some(span);
            } else if layout.version.is_none() && version_line().is_match(line) {
                layout.version = Some(span);
            }
        }

        Ok(layout)
    }

    fn render(&self, import: &ImportSpec) -> String {
        format!("import \"{}\";", import.path)
    }

    fn matches(&self, entry: &ImportEntry, import: &ImportSpec) -> bool {
        entry.path == import.path
    }
}

/// Names of the `rpc` declarations inside the block, ignoring comments and strings.
fn declared_rpcs(doc: &str, region: &BlockRegion) -> Vec<String> {
    let modes: Vec<LexMode> = Scanner::new(doc, region.open)
        .take(region.close - region.open + 1)
        .map(|(_, _, mode)| mode)
        .collect();

    rpc_declaration()
        .captures_iter(region.body(doc))
        .filter(|caps| {
            caps.get(0)
                .is_some_and(|m| modes.get(m.start() + 1) == Some(&LexMode::Normal))
        })
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Verbs of the method set not yet declared for `kind`, in insertion order.
pub fn missing_verbs(doc: &str, kind: &str, service: &str) -> AppResult<Vec<RpcVerb>> {
    let region = locate_block(doc, "service", service)?;
    Ok(missing_in(doc, kind, &region))
}

fn missing_in(doc: &str, kind: &str, region: &BlockRegion) -> Vec<RpcVerb> {
    let declared = declared_rpcs(doc, region);
    RpcVerb::ALL
        .into_iter()
        .filter(|verb| !declared.contains(&verb.method_name(kind)))
        .collect()
}

/// Ensures `service` declares the five conventional methods for `kind`.
///
/// # Examples
/// ```
/// use weld_core::schema::augment_service;
///
/// let doc = "service ApiService {\n  rpc CreatePost(CreatePostRequest) returns (CreatePostResponse);\n}\n";
/// let res = augment_service(doc, "Post", "ApiService").unwrap();
/// assert!(res.changed);
/// assert!(res.text.contains("  rpc ListPost(ListPostRequest) returns (ListPostResponse);\n}"));
/// ```
pub fn augment_service(doc: &str, kind: &str, service: &str) -> AppResult<Mutation> {
    augment_service_with(doc, kind, service, &SchemaOptions::default())
}

/// [`augment_service`] with explicit indentation fallback and imports.
pub fn augment_service_with(
    doc: &str,
    kind: &str,
    service: &str,
    options: &SchemaOptions,
) -> AppResult<Mutation> {
    if kind.is_empty() {
        return Err(AppError::Config("resource kind must not be empty".into()));
    }

    let region = locate_block(doc, "service", service)?;
    let eol = line_ending(doc);
    let mut splices = Vec::new();

    let missing = missing_in(doc, kind, &region);
    if missing.is_empty() {
        tracing::debug!(service, kind, "all methods declared");
    } else {
        let indent = infer_body_indent(region.body(doc))
            .unwrap_or_else(|| options.default_indent.clone());
        let lines: Vec<String> = missing.iter().map(|verb| verb.declaration(kind)).collect();
        tracing::debug!(service, kind, count = lines.len(), "adding methods");
        splices.push(append_to_block(
            doc,
            region.open,
            region.close,
            &lines,
            &indent,
            eol,
        ));
    }

    if !options.imports.is_empty() {
        let layout = ProtoImports.layout(doc)?;
        let mut planned: Vec<&str> = Vec::new();
        for path in &options.imports {
            if planned.contains(&path.as_str()) {
                continue;
            }
            planned.push(path);
            if let Some(splice) = plan_import(doc, &layout, &ImportSpec::new(path), &ProtoImports)
            {
                splices.push(splice);
            }
        }
    }

    if splices.is_empty() {
        return Ok(Mutation::unchanged(doc));
    }

    let text = normalize_ending(&apply_splices(doc, &splices), eol);
    Ok(Mutation::compare(doc, text))
}

/// Ends the text with exactly one line terminator.
///
/// Trailing blank (or whitespace-only) lines collapse; nothing else moves.
fn normalize_ending(text: &str, eol: &str) -> String {
    let mut end = text.len();
    loop {
        let head = text[..end].trim_end_matches(['\r', '\n']);
        let line_begin = head.rfind('\n').map_or(0, |pos| pos + 1);
        let last_line = &head[line_begin..];
        if !last_line.is_empty() && last_line.trim().is_empty() {
            end = line_begin;
            continue;
        }
        end = head.len();
        break;
    }
    format!("{}{}", &text[..end], eol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "syntax = \"proto3\";\n\npackage blog.v1;\n\n";

    #[test]
    fn test_adds_missing_methods_in_order() {
        let doc = format!(
            "{HEADER}service ApiService {{\n    rpc GetPost(GetPostRequest) returns (GetPostResponse);\n}}\n"
        );
        let res = augment_service(&doc, "Post", "ApiService").unwrap();
        let expected = format!(
            "{HEADER}service ApiService {{\n    rpc GetPost(GetPostRequest) returns (GetPostResponse);\n    rpc CreatePost(CreatePostRequest) returns (CreatePostResponse);\n    rpc UpdatePost(UpdatePostRequest) returns (UpdatePostResponse);\n    rpc DeletePost(DeletePostRequest) returns (DeletePostResponse);\n    rpc ListPost(ListPostRequest) returns (ListPostResponse);\n}}\n"
        );
        assert_eq!(res.text, expected);
        assert!(res.changed);
    }

    #[test]
    fn test_empty_block_uses_default_indent() {
        let doc = "service ApiService {}\n";
        let res = augment_service(doc, "Tag", "ApiService").unwrap();
        assert!(res
            .text
            .starts_with("service ApiService {\n  rpc CreateTag(CreateTagRequest)"));
        assert!(res.text.ends_with("returns (ListTagResponse);\n}\n"));
    }

    #[test]
    fn test_similar_names_do_not_count() {
        let doc = "service ApiService {\n  rpc CreatePostComment(A) returns (B);\n}\n";
        let missing = missing_verbs(doc, "Post", "ApiService").unwrap();
        assert_eq!(missing, RpcVerb::ALL.to_vec());
    }

    #[test]
    fn test_commented_declarations_do_not_count() {
        let doc = "service ApiService {\n  // rpc CreatePost(A) returns (B);\n  /* rpc GetPost(A) returns (B); */\n  rpc ListPost(A) returns (B);\n}\n";
        let missing = missing_verbs(doc, "Post", "ApiService").unwrap();
        assert_eq!(
            missing,
            vec![RpcVerb::Create, RpcVerb::Update, RpcVerb::Delete, RpcVerb::Get]
        );
    }

    #[test]
    fn test_single_line_block_is_opened() {
        let doc = "service ApiService { rpc CreatePost(A) returns (B); }";
        let res = augment_service(doc, "Post", "ApiService").unwrap();
        assert!(res.text.starts_with(
            "service ApiService { rpc CreatePost(A) returns (B);\n  rpc UpdatePost("
        ));
        assert!(res.text.ends_with("(ListPostResponse);\n}\n"));
    }

    #[test]
    fn test_trailing_blank_lines_collapse() {
        let doc = "service ApiService {\n}\n\n\n  \n";
        let res = augment_service(doc, "Post", "ApiService").unwrap();
        assert!(res.text.ends_with("(ListPostResponse);\n}\n"));
    }

    #[test]
    fn test_imports_follow_existing_imports() {
        let doc = format!("{HEADER}import \"a.proto\";\n\nservice ApiService {{\n}}\n");
        let options = SchemaOptions {
            imports: vec!["post.proto".into(), "post.proto".into(), "a.proto".into()],
            ..SchemaOptions::default()
        };
        let res = augment_service_with(&doc, "Post", "ApiService", &options).unwrap();
        assert!(res
            .text
            .contains("import \"a.proto\";\nimport \"post.proto\";\n\nservice"));
        assert_eq!(res.text.matches("post.proto").count(), 1);
    }

    #[test]
    fn test_import_only_change_is_reported() {
        let doc = "package p;\nservice S {\n  rpc CreateX(A) returns (B);\n  rpc UpdateX(A) returns (B);\n  rpc DeleteX(A) returns (B);\n  rpc GetX(A) returns (B);\n  rpc ListX(A) returns (B);\n}\n";
        let options = SchemaOptions {
            imports: vec!["x.proto".into()],
            ..SchemaOptions::default()
        };
        let res = augment_service_with(doc, "X", "S", &options).unwrap();
        assert!(res.changed);
        assert!(res.text.starts_with("package p;\n\nimport \"x.proto\";\nservice S {"));
    }

    #[test]
    fn test_proto_layout_skips_commented_imports() {
        let doc = "syntax = \"proto3\";\n/*\nimport \"old.proto\";\n*/\npackage a.b;\nimport public \"x.proto\";\n";
        let layout = ProtoImports.layout(doc).unwrap();
        assert_eq!(layout.entries.len(), 1);
        assert_eq!(layout.entries[0].path, "x.proto");
        assert!(layout.package.is_some());
        assert!(layout.version.is_some());
    }

    #[test]
    fn test_missing_service_is_not_found() {
        let err = augment_service("service Other {}\n", "Post", "ApiService").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_normalize_ending() {
        assert_eq!(normalize_ending("a\n\n\n", "\n"), "a\n");
        assert_eq!(normalize_ending("a", "\n"), "a\n");
        assert_eq!(normalize_ending("a  \n \n\t\n", "\n"), "a  \n");
        assert_eq!(normalize_ending("a\r\n\r\n", "\r\n"), "a\r\n");
    }
}
