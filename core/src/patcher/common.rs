use std::ops::Range;

/// A single textual edit against the original source.
///
/// Offsets always refer to the unedited text; edits are applied together by
/// [`apply_splices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    /// Byte range replaced by `text` (empty for pure insertions).
    pub range: Range<usize>,
    /// Replacement text.
    pub text: String,
}

impl Splice {
    /// Inserts `text` at `at`.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            text: text.into(),
        }
    }

    /// Replaces `range` with `text`.
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// Applies non-overlapping splices to `source`.
///
/// Splices at the same offset keep the order they were given in.
pub fn apply_splices(source: &str, splices: &[Splice]) -> String {
    let mut ordered: Vec<&Splice> = splices.iter().collect();
    ordered.sort_by_key(|s| s.range.start);

    let extra: usize = splices.iter().map(|s| s.text.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut cursor = 0;

    for splice in ordered {
        debug_assert!(splice.range.start >= cursor, "overlapping splices");
        let start = splice.range.start.max(cursor);
        out.push_str(&source[cursor..start]);
        out.push_str(&splice.text);
        cursor = splice.range.end.max(start);
    }
    out.push_str(&source[cursor..]);
    out
}

/// The line terminator used by the document.
pub(crate) fn line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Offset of the first byte of the line containing `offset`.
pub(crate) fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |pos| pos + 1)
}

/// Leading whitespace of the line containing `offset`.
pub(crate) fn line_indent(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let rest = &source[start..];
    let len = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    &rest[..len]
}

/// Offset just past the newline that ends the line containing `offset`.
pub(crate) fn next_line_start(source: &str, offset: usize) -> Option<usize> {
    source[offset..].find('\n').map(|pos| offset + pos + 1)
}

/// Indentation of the first non-blank line of a block body.
///
/// The remainder of the line holding the opening brace is ignored.
pub(crate) fn infer_body_indent(body: &str) -> Option<String> {
    let (_, rest) = body.split_once('\n')?;
    rest.lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            let trimmed = line.trim_start_matches([' ', '\t']);
            line[..line.len() - trimmed.len()].to_string()
        })
}

/// Renders `lines` at `indent`, one per line; empty entries stay empty.
pub(crate) fn indent_lines(lines: &[String], indent: &str, eol: &str) -> String {
    let mut out = String::new();
    for line in lines {
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
        out.push_str(eol);
    }
    out
}

/// Plans the insertion of `lines` as the last entries of the block `{open..close}`.
///
/// The new lines go directly after the line of the last existing content, so any
/// blank lines before the closing brace stay where they are. Blocks written on a
/// single line are broken open, with the closing brace re-indented to the
/// indentation of the line that opened the block.
pub(crate) fn append_to_block(
    source: &str,
    open: usize,
    close: usize,
    lines: &[String],
    indent: &str,
    eol: &str,
) -> Splice {
    let body = &source[open + 1..close];
    let content_end = open + 1 + body.trim_end().len();
    let rendered = indent_lines(lines, indent, eol);

    let newline = if content_end == open + 1 {
        // empty body: the first newline after `{`, if any
        body.find('\n').map(|pos| open + 1 + pos + 1)
    } else {
        source[content_end..close]
            .find('\n')
            .map(|pos| content_end + pos + 1)
    };

    match newline {
        Some(at) => Splice::insert(at, rendered),
        None => {
            let close_indent = line_indent(source, open);
            Splice::replace(
                content_end..close,
                format!("{}{}{}", eol, rendered, close_indent),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append(source: &str, lines: &[&str], indent: &str) -> String {
        let open = source.find('{').unwrap();
        let close = source.rfind('}').unwrap();
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        let splice = append_to_block(source, open, close, &lines, indent, "\n");
        apply_splices(source, &[splice])
    }

    #[test]
    fn test_apply_splices_in_offset_order() {
        let source = "abcdef";
        let splices = vec![
            Splice::insert(4, "X"),
            Splice::replace(1..2, "Y"),
            Splice::insert(4, "Z"),
        ];
        assert_eq!(apply_splices(source, &splices), "aYcdXZef");
    }

    #[test]
    fn test_append_after_last_line_keeps_trailing_blank() {
        let source = "s {\n  a;\n\n}\n";
        assert_eq!(append(source, &["b;"], "  "), "s {\n  a;\n  b;\n\n}\n");
    }

    #[test]
    fn test_append_into_empty_inline_block() {
        assert_eq!(append("  s {}", &["b;"], "    "), "  s {\n    b;\n  }");
    }

    #[test]
    fn test_append_into_empty_multiline_block() {
        assert_eq!(append("s {\n}", &["b;"], "  "), "s {\n  b;\n}");
    }

    #[test]
    fn test_append_into_single_line_block() {
        assert_eq!(append("s { a; }", &["b;"], "  "), "s { a;\n  b;\n}");
    }

    #[test]
    fn test_append_keeps_trailing_comment_line() {
        let source = "s {\n  a; // note\n}";
        assert_eq!(append(source, &["b;"], "  "), "s {\n  a; // note\n  b;\n}");
    }

    #[test]
    fn test_infer_body_indent() {
        assert_eq!(infer_body_indent(" // x\n\n\t\tfn a();\n").as_deref(), Some("\t\t"));
        assert_eq!(infer_body_indent("\n  \n"), None);
        assert_eq!(infer_body_indent(" a "), None);
    }

    #[test]
    fn test_line_helpers() {
        let source = "a\n    b\r\nc";
        assert_eq!(line_ending(source), "\r\n");
        assert_eq!(line_indent(source, 7), "    ");
        assert_eq!(line_start(source, 7), 2);
        assert_eq!(next_line_start(source, 3), Some(9));
        assert_eq!(next_line_start(source, 9), None);
    }
}
