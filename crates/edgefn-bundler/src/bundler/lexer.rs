// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical segmentation of JavaScript source.
//!
//! Splits source text into code and literal/comment segments so the import
//! scanner never matches inside strings or comments and the minifier never
//! touches literal contents. This is not a full tokenizer: code segments are
//! opaque, only the boundaries of literals and comments are tracked.

use std::ops::Range;

/// Kind of a source segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Plain code
    Code,
    /// Single- or double-quoted string literal
    Str,
    /// Template literal, including any `${}` substitutions
    Template,
    /// Regular expression literal
    Regex,
    /// Line or block comment
    Comment,
}

/// A contiguous byte range of one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment kind
    pub kind: SegmentKind,
    /// Byte range in the source
    pub span: Range<usize>,
}

/// Error produced for unterminated literals or comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset where the offending construct starts
    pub offset: usize,
    /// Description
    pub message: &'static str,
}

impl LexError {
    /// Render with a 1-based line number computed from `source`
    pub fn describe(&self, source: &str) -> String {
        let line = source[..self.offset.min(source.len())].matches('\n').count() + 1;
        format!("{} (line {})", self.message, line)
    }
}

/// Keywords after which a `/` starts a regular expression
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// Segment `source` into code, literal and comment ranges
pub fn segment(source: &str) -> Result<Vec<Segment>, LexError> {
    let mut lexer = Lexer {
        src: source.as_bytes(),
        source,
        pos: 0,
        nesting: 0,
        code_start: 0,
        regex_allowed: true,
        segments: Vec::new(),
    };

    // Hashbang
    if source.starts_with("#!") {
        lexer.skip_line();
        lexer.push(SegmentKind::Comment, 0);
    }

    lexer.run(false)?;
    lexer.flush_code(source.len());
    Ok(lexer.segments)
}

/// Source text with comments, regex and template interiors blanked out.
///
/// Byte offsets are unchanged and newlines are kept, so spans found in the
/// masked text apply to the original.
pub fn mask(source: &str, segments: &[Segment]) -> String {
    let mut bytes = source.as_bytes().to_vec();
    for seg in segments {
        let blank = match seg.kind {
            SegmentKind::Comment => seg.span.clone(),
            SegmentKind::Template | SegmentKind::Regex if seg.span.len() >= 2 => {
                seg.span.start + 1..seg.span.end - 1
            }
            _ => continue,
        };
        for b in &mut bytes[blank] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    }
    // Whole segments between ASCII delimiters were blanked, so this stays UTF-8
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Whether `offset` falls inside a code segment
pub fn is_code(segments: &[Segment], offset: usize) -> bool {
    let idx = segments.partition_point(|s| s.span.end <= offset);
    segments
        .get(idx)
        .is_some_and(|s| s.kind == SegmentKind::Code && s.span.start <= offset)
}

struct Lexer<'a> {
    src: &'a [u8],
    source: &'a str,
    pos: usize,
    nesting: usize,
    code_start: usize,
    regex_allowed: bool,
    segments: Vec<Segment>,
}

impl Lexer<'_> {
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn run(&mut self, in_substitution: bool) -> Result<(), LexError> {
        let mut depth = 0usize;

        while let Some(b) = self.peek_at(0) {
            let start = self.pos;
            match b {
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.skip_line();
                    self.push(SegmentKind::Comment, start);
                }
                b'/' if self.peek_at(1) == Some(b'*') => {
                    self.scan_block_comment()?;
                    self.push(SegmentKind::Comment, start);
                }
                b'/' if self.regex_allowed => {
                    self.scan_regex()?;
                    self.push(SegmentKind::Regex, start);
                    self.regex_allowed = false;
                }
                b'"' | b'\'' => {
                    self.scan_string(b)?;
                    self.push(SegmentKind::Str, start);
                    self.regex_allowed = false;
                }
                b'`' => {
                    self.scan_template()?;
                    self.push(SegmentKind::Template, start);
                    self.regex_allowed = false;
                }
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                    self.regex_allowed = true;
                }
                b'}' => {
                    if in_substitution && depth == 0 {
                        return Ok(());
                    }
                    depth = depth.saturating_sub(1);
                    self.pos += 1;
                    self.regex_allowed = true;
                }
                b')' | b']' => {
                    self.pos += 1;
                    self.regex_allowed = false;
                }
                b'0'..=b'9' => {
                    while self
                        .peek_at(0)
                        .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'.' || c == b'_')
                    {
                        self.pos += 1;
                    }
                    self.regex_allowed = false;
                }
                _ if is_word_byte(b) => {
                    while self.peek_at(0).is_some_and(is_word_byte) {
                        self.pos += 1;
                    }
                    let word = &self.source[start..self.pos];
                    self.regex_allowed = REGEX_PRECEDING_KEYWORDS.contains(&word);
                }
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'+' | b'-' if self.peek_at(1) == Some(b) => {
                    // postfix `x++` ends an operand, prefix `++x` does not
                    self.pos += 2;
                }
                _ => {
                    self.pos += 1;
                    self.regex_allowed = true;
                }
            }
        }

        if in_substitution {
            return Err(LexError {
                offset: self.pos,
                message: "unterminated template literal",
            });
        }
        Ok(())
    }

    fn skip_line(&mut self) {
        while self.peek_at(0).is_some_and(|c| c != b'\n') {
            self.pos += 1;
        }
    }

    fn scan_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 2;
        while let Some(b) = self.peek_at(0) {
            if b == b'*' && self.peek_at(1) == Some(b'/') {
                self.pos += 2;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(LexError {
            offset: start,
            message: "unterminated comment",
        })
    }

    fn scan_string(&mut self, quote: u8) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek_at(0) {
            match b {
                b'\\' => self.pos += 2,
                b'\n' => break,
                _ if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(LexError {
            offset: start,
            message: "unterminated string literal",
        })
    }

    fn scan_template(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek_at(0) {
            match b {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'$' if self.peek_at(1) == Some(b'{') => {
                    self.pos += 2;
                    self.nesting += 1;
                    self.regex_allowed = true;
                    self.run(true)?;
                    self.nesting -= 1;
                    // closing brace of the substitution
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        Err(LexError {
            offset: start,
            message: "unterminated template literal",
        })
    }

    fn scan_regex(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        while let Some(b) = self.peek_at(0) {
            match b {
                b'\\' => self.pos += 2,
                b'\n' => break,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while self.peek_at(0).is_some_and(|c| c.is_ascii_alphabetic()) {
                        self.pos += 1;
                    }
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(LexError {
            offset: start,
            message: "unterminated regular expression",
        })
    }

    fn push(&mut self, kind: SegmentKind, start: usize) {
        if self.nesting > 0 {
            return;
        }
        // escapes at end of input may overshoot
        let end = self.pos.min(self.src.len());
        self.pos = end;
        self.flush_code(start);
        self.segments.push(Segment {
            kind,
            span: start..end,
        });
        self.code_start = end;
    }

    fn flush_code(&mut self, end: usize) {
        if end > self.code_start {
            self.segments.push(Segment {
                kind: SegmentKind::Code,
                span: self.code_start..end,
            });
        }
        self.code_start = end;
    }
}

/// Identifier byte: ASCII word character, `$`, or any non-ASCII byte
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}
