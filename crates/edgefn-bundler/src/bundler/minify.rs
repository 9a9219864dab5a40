// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Whitespace and comment minification
//!
//! Removes comments (except `/*!`, `@license` and `@preserve` blocks),
//! indentation and redundant spaces. Literals are copied verbatim. A line
//! break is kept wherever dropping it could change automatic semicolon
//! insertion.

use super::lexer::{self, LexError, SegmentKind};

/// Characters after which a line break never matters
const NEWLINE_AFTER: &[char] = &[';', '{', ',', '\n', '(', '['];

/// Characters before which a line break never matters
const NEWLINE_BEFORE: &[char] = &['}', ')', ']', ',', ';'];

/// Minify JavaScript source
pub fn minify(source: &str) -> Result<String, LexError> {
    let segments = lexer::segment(source)?;
    let mut out = Output::default();

    for seg in &segments {
        let text = &source[seg.span.clone()];
        match seg.kind {
            SegmentKind::Code => {
                for c in text.chars() {
                    match c {
                        '\n' => out.pending_newline = true,
                        ' ' | '\t' | '\r' | '\u{feff}' => out.pending_space = true,
                        _ => out.push_char(c),
                    }
                }
            }
            SegmentKind::Comment if is_preserved(text) => {
                out.pending_newline = true;
                out.push_str(text);
                out.pending_newline = true;
            }
            SegmentKind::Comment => {
                if text.contains('\n') {
                    out.pending_newline = true;
                } else {
                    out.pending_space = true;
                }
            }
            SegmentKind::Str | SegmentKind::Template | SegmentKind::Regex => out.push_str(text),
        }
    }

    if !out.text.is_empty() && !out.text.ends_with('\n') {
        out.text.push('\n');
    }
    Ok(out.text)
}

fn is_preserved(comment: &str) -> bool {
    comment.starts_with("/*!") || comment.contains("@license") || comment.contains("@preserve")
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

#[derive(Default)]
struct Output {
    text: String,
    pending_newline: bool,
    pending_space: bool,
}

impl Output {
    fn push_str(&mut self, literal: &str) {
        let mut chars = literal.chars();
        if let Some(first) = chars.next() {
            self.push_char(first);
            self.text.push_str(chars.as_str());
        }
    }

    fn push_char(&mut self, c: char) {
        let prev = self.text.chars().next_back();
        if std::mem::take(&mut self.pending_newline) {
            self.pending_space = false;
            let droppable = match prev {
                None => true,
                Some(p) => NEWLINE_AFTER.contains(&p) || NEWLINE_BEFORE.contains(&c),
            };
            if !droppable {
                self.text.push('\n');
            }
        } else if std::mem::take(&mut self.pending_space) {
            if let Some(p) = prev {
                if needs_space(p, c) {
                    self.text.push(' ');
                }
            }
        }
        self.text.push(c);
    }
}

fn needs_space(prev: char, next: char) -> bool {
    (is_word(prev) && is_word(next))
        || (prev == next && matches!(prev, '+' | '-' | '/'))
        || (prev.is_ascii_digit() && next == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_comments_and_indentation() {
        let source = "// header\nfunction add(a, b) {\n    /* sum */\n    return a + b;\n}\n";
        assert_eq!(minify(source).unwrap(), "function add(a,b){return a+b;}\n");
    }

    #[test]
    fn test_keeps_literals_verbatim() {
        let source = "const s = 'a  //  b';\nconst t = `x   ${ y }   z`;\nconst r = /  +/g;\n";
        assert_eq!(
            minify(source).unwrap(),
            "const s='a  //  b';const t=`x   ${ y }   z`;const r=/  +/g;\n"
        );
    }

    #[test]
    fn test_keeps_statement_separating_newlines() {
        let source = "let a = 1\nlet b = a\n++b\nreturn\nx\n";
        assert_eq!(minify(source).unwrap(), "let a=1\nlet b=a\n++b\nreturn\nx\n");
    }

    #[test]
    fn test_keeps_ambiguous_spaces() {
        assert_eq!(minify("a + +b; c - -d; e / /re/.source").unwrap(), "a+ +b;c- -d;e/ /re/.source\n");
        assert_eq!(minify("1 .toString()").unwrap(), "1 .toString()\n");
    }

    #[test]
    fn test_preserves_license_comments() {
        let source = "/*! keep me */\nconst a = 1; /* drop */\n";
        assert_eq!(minify(source).unwrap(), "/*! keep me */\nconst a=1;\n");
    }

    #[test]
    fn test_multiline_comment_acts_as_newline() {
        assert_eq!(minify("a /*\n*/ b").unwrap(), "a\nb\n");
    }

    #[test]
    fn test_lex_error_propagates() {
        assert!(minify("const s = 'open").is_err());
    }
}
