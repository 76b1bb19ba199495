#![deny(missing_docs)]

//! # Lexical Scanner
//!
//! A minimal state machine that classifies every byte of a C-family text
//! (Protocol Buffers schemas in practice) as code, comment, or string.
//!
//! Higher layers never look at comment or string syntax themselves: they ask the
//! scanner whether an offset is code, or where a brace closes.

use crate::error::{AppError, AppResult};

/// Lexical class of a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// Structurally meaningful text.
    Normal,
    /// Inside `// ...` up to (not including) the newline.
    LineComment,
    /// Inside `/* ... */`, delimiters included.
    BlockComment,
    /// Inside a quoted literal, quotes included.
    Str,
}

/// Byte-wise classifier over a text.
///
/// Iterating yields `(offset, byte, mode)` for every byte from the start offset.
/// Block comments do not nest. A string still open at a newline is closed there,
/// since schema strings cannot span lines.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    mode: LexMode,
    quote: u8,
    escaped: bool,
    /// Class of the next byte when it belongs to a two-byte delimiter
    /// (`*` of `/*`, `/` of `*/`).
    forced: Option<LexMode>,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner starting at `start`, which must be in normal mode.
    pub fn new(text: &'a str, start: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: start.min(text.len()),
            mode: LexMode::Normal,
            quote: b'"',
            escaped: false,
            forced: None,
        }
    }

    /// Mode the scanner is in before the next byte is consumed.
    pub fn state(&self) -> LexMode {
        self.mode
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }
}

impl Iterator for Scanner<'_> {
    type Item = (usize, u8, LexMode);

    fn next(&mut self) -> Option<Self::Item> {
        let byte = self.peek()?;
        let at = self.pos;
        self.pos += 1;

        if let Some(class) = self.forced.take() {
            return Some((at, byte, class));
        }

        let class = match self.mode {
            LexMode::Normal => match byte {
                b'/' if self.peek() == Some(b'/') => {
                    self.mode = LexMode::LineComment;
                    LexMode::LineComment
                }
                b'/' if self.peek() == Some(b'*') => {
                    self.mode = LexMode::BlockComment;
                    self.forced = Some(LexMode::BlockComment);
                    LexMode::BlockComment
                }
                b'"' | b'\'' => {
                    self.mode = LexMode::Str;
                    self.quote = byte;
                    self.escaped = false;
                    LexMode::Str
                }
                _ => LexMode::Normal,
            },
            LexMode::LineComment => {
                if byte == b'\n' {
                    self.mode = LexMode::Normal;
                    LexMode::Normal
                } else {
                    LexMode::LineComment
                }
            }
            LexMode::BlockComment => {
                if byte == b'*' && self.peek() == Some(b'/') {
                    self.mode = LexMode::Normal;
                    self.forced = Some(LexMode::BlockComment);
                }
                LexMode::BlockComment
            }
            LexMode::Str => {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == self.quote {
                    self.mode = LexMode::Normal;
                } else if byte == b'\n' {
                    self.mode = LexMode::Normal;
                    return Some((at, byte, LexMode::Normal));
                }
                LexMode::Str
            }
        };

        Some((at, byte, class))
    }
}

/// Returns the lexical mode of the byte at `offset`.
///
/// Offsets at or past the end report the mode the text ends in.
pub fn mode_at(text: &str, offset: usize) -> LexMode {
    let mut last = LexMode::Normal;
    for (at, _, mode) in Scanner::new(text, 0) {
        if at == offset {
            return mode;
        }
        last = mode;
    }
    last
}

/// Returns the start offset of every line that begins in normal mode.
///
/// Lines that start inside a block comment are excluded; lines that only
/// contain a line comment are still included (their first byte is code-state).
pub fn code_line_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut scanner = Scanner::new(text, 0);
    let mut at_line_start = true;
    loop {
        let before = scanner.state();
        let Some((at, byte, _)) = scanner.next() else {
            break;
        };
        if at_line_start && before == LexMode::Normal {
            starts.push(at);
        }
        at_line_start = byte == b'\n';
    }
    starts
}

/// Locates the brace closing the `{` at `open`.
///
/// Only braces in normal mode count, so braces inside comments and string
/// literals never affect depth.
pub fn matching_brace(text: &str, open: usize) -> AppResult<usize> {
    if text.as_bytes().get(open) != Some(&b'{') {
        return Err(AppError::Structural(format!(
            "expected '{{' at offset {}",
            open
        )));
    }

    let mut depth: usize = 0;
    for (at, byte, mode) in Scanner::new(text, open) {
        if mode != LexMode::Normal {
            continue;
        }
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(at);
                }
            }
            _ => {}
        }
    }

    Err(AppError::Structural(format!(
        "unbalanced braces: '{{' at offset {} is never closed",
        open
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modes(text: &str) -> String {
        Scanner::new(text, 0)
            .map(|(_, _, mode)| match mode {
                LexMode::Normal => 'n',
                LexMode::LineComment => 'l',
                LexMode::BlockComment => 'b',
                LexMode::Str => 's',
            })
            .collect()
    }

    #[test]
    fn test_classifies_each_mode() {
        assert_eq!(modes("a//x\nb"), "nlllnn");
        assert_eq!(modes("a/*x*/b"), "nbbbbbn");
        assert_eq!(modes(r#"a"x"b"#), "nsssn");
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        assert_eq!(modes(r#""a\"b"c"#), "ssssssn");
    }

    #[test]
    fn test_block_comment_opener_is_not_closer() {
        // `/*/` must not terminate the comment it opens
        assert_eq!(modes("/*/x*/y"), "bbbbbbn");
    }

    #[test]
    fn test_unterminated_string_ends_at_newline() {
        assert_eq!(modes("\"ab\nc"), "sssnn");
    }

    #[test]
    fn test_matching_brace_nested() {
        let text = "a { b { c } d } e";
        assert_eq!(matching_brace(text, 2).unwrap(), 14);
        assert_eq!(matching_brace(text, 6).unwrap(), 10);
    }

    #[test]
    fn test_matching_brace_ignores_comments_and_strings() {
        let text = "{ // }\n /* } { */ \"}\" '{' }";
        assert_eq!(matching_brace(text, 0).unwrap(), text.len() - 1);
    }

    #[test]
    fn test_unbalanced_is_structural_error() {
        let err = matching_brace("{ { }", 0).unwrap_err();
        assert!(matches!(err, AppError::Structural(_)));
        assert!(format!("{}", err).contains("unbalanced braces"));
    }

    #[test]
    fn test_matching_brace_requires_open_brace() {
        assert!(matching_brace("abc", 1).is_err());
    }

    #[test]
    fn test_code_line_starts_skip_block_comment_lines() {
        let text = "a\n/* x\ny */\nb\n";
        assert_eq!(code_line_starts(text), vec![0, 2, 12]);
    }

    #[test]
    fn test_mode_at() {
        let text = "x // y";
        assert_eq!(mode_at(text, 0), LexMode::Normal);
        assert_eq!(mode_at(text, 5), LexMode::LineComment);
    }
}
