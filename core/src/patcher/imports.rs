use crate::error::AppResult;
use crate::patcher::common::{apply_splices, line_ending, line_indent, next_line_start, Splice};
use crate::patcher::Mutation;
use std::ops::Range;

/// An import a generated declaration depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Imported path (`crate::repository::comment::CommentRepository`, `post.proto`).
    pub path: String,
    /// Local name, when the language supports renaming.
    pub alias: Option<String>,
}

impl ImportSpec {
    /// Creates an import without alias.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
        }
    }

    /// Sets the local alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// An import already present in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    /// Span of the whole import statement.
    pub span: Range<usize>,
    /// Imported path.
    pub path: String,
    /// Local alias, if any.
    pub alias: Option<String>,
}

/// Where imports live in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportLayout {
    /// Existing imports in document order. A grouped statement yields one entry
    /// per imported path, all sharing the statement span.
    pub entries: Vec<ImportEntry>,
    /// Span of the package (or module header) line new imports follow when none exist.
    pub package: Option<Range<usize>>,
    /// Span of a leading syntax/version line, the fallback anchor.
    pub version: Option<Range<usize>>,
}

/// Language-specific import handling.
pub trait ImportSyntax {
    /// Reads the import layout of `source`.
    fn layout(&self, source: &str) -> AppResult<ImportLayout>;

    /// Renders a complete import statement, without indentation or newline.
    fn render(&self, import: &ImportSpec) -> String;

    /// Whether `entry` already satisfies `import`.
    fn matches(&self, entry: &ImportEntry, import: &ImportSpec) -> bool {
        entry.path == import.path && entry.alias == import.alias
    }
}

/// Plans the insertion of `import`, or `None` when it is already present.
///
/// The statement goes after the last existing import (with its indentation),
/// else after the package line, else after the version line, else at the top.
pub fn plan_import<S: ImportSyntax + ?Sized>(
    source: &str,
    layout: &ImportLayout,
    import: &ImportSpec,
    syntax: &S,
) -> Option<Splice> {
    if layout
        .entries
        .iter()
        .any(|entry| syntax.matches(entry, import))
    {
        tracing::debug!(path = %import.path, "import already present");
        return None;
    }

    let eol = line_ending(source);
    let statement = syntax.render(import);

    if let Some(last) = layout.entries.iter().max_by_key(|e| e.span.start) {
        let indent = line_indent(source, last.span.start);
        return Some(match next_line_start(source, last.span.end) {
            Some(at) => Splice::insert(at, format!("{}{}{}", indent, statement, eol)),
            None => Splice::insert(source.len(), format!("{}{}{}", eol, indent, statement)),
        });
    }

    if let Some(anchor) = layout.package.as_ref().or(layout.version.as_ref()) {
        return Some(match next_line_start(source, anchor.end) {
            Some(at) => Splice::insert(at, format!("{}{}{}", eol, statement, eol)),
            None => Splice::insert(source.len(), format!("{}{}{}", eol, eol, statement)),
        });
    }

    let separator = if source.is_empty() { "" } else { eol };
    Some(Splice::insert(
        0,
        format!("{}{}{}", statement, eol, separator),
    ))
}

/// Adds `import` to `source` unless it is already present.
pub fn ensure_import<S: ImportSyntax + ?Sized>(
    source: &str,
    import: &ImportSpec,
    syntax: &S,
) -> AppResult<Mutation> {
    let layout = syntax.layout(source)?;
    Ok(match plan_import(source, &layout, import, syntax) {
        Some(splice) => Mutation::compare(source, apply_splices(source, &[splice])),
        None => Mutation::unchanged(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Line-oriented `import x;` syntax with `package` and `version` anchors.
    struct LineSyntax;

    impl ImportSyntax for LineSyntax {
        fn layout(&self, source: &str) -> AppResult<ImportLayout> {
            let mut layout = ImportLayout::default();
            let mut offset = 0;
            for line in source.split_inclusive('\n') {
                let trimmed = line.trim();
                let span = offset..offset + line.trim_end().len();
                if let Some(path) = trimmed.strip_prefix("import ") {
                    layout.entries.push(ImportEntry {
                        span,
                        path: path.trim_end_matches(';').to_string(),
                        alias: None,
                    });
                } else if trimmed.starts_with("package ") && layout.package.is_none() {
                    layout.package = Some(span);
                } else if trimmed.starts_with("version ") && layout.version.is_none() {
                    layout.version = Some(span);
                }
                offset += line.len();
            }
            Ok(layout)
        }

        fn render(&self, import: &ImportSpec) -> String {
            format!("import {};", import.path)
        }
    }

    fn ensure(source: &str, path: &str) -> Mutation {
        ensure_import(source, &ImportSpec::new(path), &LineSyntax).unwrap()
    }

    #[test]
    fn test_after_last_import_with_its_indent() {
        let res = ensure("  import a;\n  import b;\nbody\n", "c");
        assert!(res.changed);
        assert_eq!(res.text, "  import a;\n  import b;\n  import c;\nbody\n");
    }

    #[test]
    fn test_existing_import_is_noop() {
        let source = "import a;\nbody\n";
        let res = ensure(source, "a");
        assert!(!res.changed);
        assert_eq!(res.text, source);
    }

    #[test]
    fn test_after_package_line() {
        let res = ensure("version 1;\npackage p;\n\nbody\n", "a");
        assert_eq!(res.text, "version 1;\npackage p;\n\nimport a;\n\nbody\n");
    }

    #[test]
    fn test_after_version_line() {
        let res = ensure("version 1;\nbody\n", "a");
        assert_eq!(res.text, "version 1;\n\nimport a;\nbody\n");
    }

    #[test]
    fn test_top_of_file() {
        assert_eq!(ensure("body\n", "a").text, "import a;\n\nbody\n");
        assert_eq!(ensure("", "a").text, "import a;\n");
    }

    #[test]
    fn test_last_import_without_newline() {
        assert_eq!(ensure("import a;", "b").text, "import a;\nimport b;");
    }

    #[test]
    fn test_crlf_documents_keep_crlf() {
        let res = ensure("import a;\r\nbody\r\n", "b");
        assert_eq!(res.text, "import a;\r\nimport b;\r\nbody\r\n");
    }

    #[test]
    fn test_ensure_twice_yields_one_line() {
        let once = ensure("package p;\n", "a");
        let twice = ensure(&once.text, "a");
        assert!(!twice.changed);
        assert_eq!(twice.text.matches("import a;").count(), 1);
    }
}
