//! Reference extraction from ladder and structured-text logic.
//!
//! The tokenizer is shallow: it classifies identifiers as instructions or
//! tag references by context and never validates syntax. Structured-text
//! comments (`//`, `(* *)`, `/* */`) and string literals are skipped.
//!
//! ```text
//! XIC(Start)[OTE(Motor.Run),TON(Delay[2],?,?)];
//! ^^^ ^^^^^  ^^^ ^^^^^^^^^   ^^^ ^^^^^^^^
//! |   |      |   |           |   tag reference (index kept)
//! |   |      |   |           instruction
//! |   |      |   tag reference (member kept)
//! |   |      instruction
//! |   tag reference
//! instruction
//! ```

use std::borrow::Cow;
use std::collections::BTreeSet;

use l5x_doc::Element;

use crate::schema;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Lexical class of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An identifier immediately followed by `(` outside an argument list.
    Instruction,
    /// An operand identifier, including `.Member` and `[index]` suffixes.
    TagReference,
    /// A numeric literal (`42`, `-1.5e3`, `16#FF00`, `8#17`, `2#1010`).
    Literal,
    /// The `?` operand placeholder.
    Placeholder,
    OpenBracket,
    CloseBracket,
    Comma,
    Semicolon,
    OpenParen,
    CloseParen,
}

/// One token, borrowing its text from the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    const fn new(kind: TokenKind, text: &'a str) -> Self {
        Self { kind, text }
    }

    /// For a tag reference, the name before the first `.` or `[`.
    #[must_use]
    pub fn base_name(&self) -> &'a str {
        let end = self
            .text
            .find(['.', '['])
            .unwrap_or(self.text.len());
        self.text[..end].trim_end()
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

const fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

const fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn ident_end(bytes: &[u8], start: usize) -> Option<usize> {
    if !bytes.get(start).copied().is_some_and(is_ident_start) {
        return None;
    }
    let mut end = start + 1;
    while bytes.get(end).copied().is_some_and(is_ident_continue) {
        end += 1;
    }
    Some(end)
}

/// Index of the `]` closing the `[` at `start`, honouring nesting.
fn matching_bracket(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// End of a tag reference starting with the identifier `start..ident_end`:
/// swallows `.Member` and balanced `[...]` suffixes.
fn tag_reference_end(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        match bytes.get(pos) {
            Some(b'.') => match ident_end(bytes, pos + 1) {
                Some(end) => pos = end,
                None => return pos,
            },
            Some(b'[') => match matching_bracket(bytes, pos) {
                Some(close) => pos = close + 1,
                None => return pos,
            },
            _ => return pos,
        }
    }
}

fn digits_end(bytes: &[u8], mut pos: usize, accept: impl Fn(u8) -> bool) -> usize {
    while bytes.get(pos).copied().is_some_and(&accept) {
        pos += 1;
    }
    pos
}

/// End of a numeric literal at `start`, if one begins there.
fn literal_end(bytes: &[u8], start: usize) -> Option<usize> {
    let radix_forms: [(&[u8], fn(u8) -> bool); 3] = [
        (b"16#", |b| b.is_ascii_hexdigit() || b == b'_'),
        (b"8#", |b| matches!(b, b'0'..=b'7' | b'_')),
        (b"2#", |b| matches!(b, b'0' | b'1' | b'_')),
    ];
    for (prefix, accept) in radix_forms {
        if bytes[start..].starts_with(prefix) {
            let end = digits_end(bytes, start + prefix.len(), accept);
            if end > start + prefix.len() {
                return Some(end);
            }
        }
    }

    let mut pos = start;
    if matches!(bytes.get(pos), Some(b'+' | b'-')) {
        pos += 1;
    }
    let int_end = digits_end(bytes, pos, |b| b.is_ascii_digit());
    if int_end == pos {
        return None;
    }
    pos = int_end;

    if bytes.get(pos) == Some(&b'.') {
        let frac_end = digits_end(bytes, pos + 1, |b| b.is_ascii_digit());
        if frac_end > pos + 1 {
            pos = frac_end;
        }
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_end(bytes, exp, |b| b.is_ascii_digit());
        if exp_end > exp {
            pos = exp_end;
        }
    }
    Some(pos)
}

/// Index just past `close`, searching from `pos`; end of input when the
/// delimiter never appears.
fn skip_past(bytes: &[u8], pos: usize, close: &[u8]) -> usize {
    bytes[pos..]
        .windows(close.len())
        .position(|w| w == close)
        .map_or(bytes.len(), |i| pos + i + close.len())
}

/// End of a quoted string opening at `start`. `$` escapes the next byte.
fn string_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut pos = start + 1;
    while let Some(&b) = bytes.get(pos) {
        match b {
            b'$' => pos += 2,
            _ if b == quote => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}

/// End of a comment or string literal starting at `pos`, if one does.
fn ignored_end(bytes: &[u8], pos: usize) -> Option<usize> {
    let rest = &bytes[pos..];
    if rest.starts_with(b"//") {
        Some(skip_past(bytes, pos + 2, b"\n"))
    } else if rest.starts_with(b"(*") {
        Some(skip_past(bytes, pos + 2, b"*)"))
    } else if rest.starts_with(b"/*") {
        Some(skip_past(bytes, pos + 2, b"*/"))
    } else if matches!(rest.first(), Some(b'\'' | b'"')) {
        Some(string_end(bytes, pos))
    } else {
        None
    }
}

/// Split logic text into tokens.
///
/// Unrecognised characters (operators in structured text, stray
/// punctuation) are skipped rather than rejected, as are comments and
/// string literals.
#[must_use]
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut paren_depth: i64 = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if let Some(end) = ignored_end(bytes, pos) {
            pos = end;
            continue;
        }

        let single = match bytes[pos] {
            b'[' => Some(TokenKind::OpenBracket),
            b']' => Some(TokenKind::CloseBracket),
            b',' => Some(TokenKind::Comma),
            b';' => Some(TokenKind::Semicolon),
            b'(' => Some(TokenKind::OpenParen),
            b')' => Some(TokenKind::CloseParen),
            b'?' => Some(TokenKind::Placeholder),
            _ => None,
        };
        if let Some(kind) = single {
            match kind {
                TokenKind::OpenParen => paren_depth += 1,
                TokenKind::CloseParen => paren_depth -= 1,
                _ => {}
            }
            tokens.push(Token::new(kind, &text[pos..=pos]));
            pos += 1;
            continue;
        }

        if let Some(end) = ident_end(bytes, pos) {
            if paren_depth <= 0 && bytes.get(end) == Some(&b'(') {
                tokens.push(Token::new(TokenKind::Instruction, &text[pos..end]));
                pos = end;
            } else {
                let end = tag_reference_end(bytes, end);
                tokens.push(Token::new(TokenKind::TagReference, &text[pos..end]));
                pos = end;
            }
            continue;
        }

        if let Some(end) = literal_end(bytes, pos) {
            tokens.push(Token::new(TokenKind::Literal, &text[pos..end]));
            pos = end;
            continue;
        }

        pos += 1;
    }

    tokens
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Every distinct base tag name referenced by `text`.
#[must_use]
pub fn extract_tag_references(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .iter()
        .filter(|t| t.kind == TokenKind::TagReference)
        .map(|t| t.base_name().to_owned())
        .collect()
}

/// Instruction tokens that are not standard instructions: candidate
/// Add-On Instruction calls.
#[must_use]
pub fn extract_call_candidates(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .iter()
        .filter(|t| t.kind == TokenKind::Instruction && !schema::is_standard_instruction(t.text))
        .map(|t| t.text.to_owned())
        .collect()
}

/// Logic text held anywhere under `element`: the `Text` of every ladder rung,
/// then one text per structured-text body with its `Line`s joined by
/// newlines so block comments may span lines.
///
/// Works on a single routine, a whole program, or an AOI definition.
#[must_use]
pub fn logic_texts(element: &Element) -> Vec<Cow<'_, str>> {
    let rungs = element
        .descendants_named(schema::RUNG)
        .filter_map(|rung| rung.child("Text"))
        .filter_map(Element::text)
        .map(|text| Cow::Borrowed(text.trim()));
    let bodies = element
        .descendants_named(schema::ST_CONTENT)
        .map(|st| {
            st.children_named("Line")
                .filter_map(Element::text)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|body| !body.trim().is_empty())
        .map(|body| Cow::Owned(body.trim().to_owned()));
    rungs.chain(bodies).collect()
}
