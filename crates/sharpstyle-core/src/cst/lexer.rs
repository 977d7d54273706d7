//! CST-aware lexer that preserves all trivia (whitespace, comments)
//!
//! Every byte of the input ends up in exactly one token, so concatenating the
//! token texts reconstructs the input. Contextual keywords are emitted as
//! `Ident`; the parser decides when they act as keywords.

use crate::cst::SyntaxKind;
use std::ops::Range;

/// Simple span representing a range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

/// Lex input preserving ALL trivia for CST construction
///
/// - Whitespace runs become `Whitespace` tokens
/// - Line breaks become `Newline` tokens (`\r\n` is a single token)
/// - `//`, `///` and `/* */` comments become comment tokens
/// - Preprocessor lines (`#region`, `#if`, ...) become `Directive` tokens
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0usize;
    let mut at_line_start = true;

    while i < len {
        let Some((current, size)) = next_char(input, i) else {
            break;
        };
        let start = i;

        let (kind, end) = match current {
            '\n' => (SyntaxKind::Newline, i + size),
            '\r' => {
                let mut end = i + size;
                if let Some(('\n', nl_size)) = next_char(input, end) {
                    end += nl_size;
                }
                (SyntaxKind::Newline, end)
            }
            c if is_inline_whitespace(c) => {
                let mut end = i + size;
                while let Some((c, s)) = next_char(input, end) {
                    if !is_inline_whitespace(c) {
                        break;
                    }
                    end += s;
                }
                (SyntaxKind::Whitespace, end)
            }
            '#' if at_line_start => (SyntaxKind::Directive, line_end(input, i)),
            '/' if input[i..].starts_with("//") => {
                let is_doc = input[i..].starts_with("///") && !input[i..].starts_with("////");
                let kind = if is_doc {
                    SyntaxKind::DocComment
                } else {
                    SyntaxKind::LineComment
                };
                (kind, line_end(input, i))
            }
            '/' if input[i..].starts_with("/*") => match input[i + 2..].find("*/") {
                Some(offset) => (SyntaxKind::BlockComment, i + 2 + offset + 2),
                None => {
                    errors.push(LexerError::new("Unterminated block comment", start..len));
                    (SyntaxKind::BlockComment, len)
                }
            },
            '"' => {
                let (end, error) = lex_regular_string(input, i + 1, '"');
                if let Some(err) = error {
                    errors.push(err.with_start(start));
                }
                (SyntaxKind::StringLiteral, end)
            }
            '\'' => {
                let (end, error) = lex_regular_string(input, i + 1, '\'');
                if let Some(err) = error {
                    errors.push(err.with_start(start));
                }
                (SyntaxKind::CharLiteral, end)
            }
            '@' | '$' if is_special_string_start(input, i) => {
                let (end, error) = lex_special_string(input, i);
                if let Some(err) = error {
                    errors.push(err);
                }
                (SyntaxKind::StringLiteral, end)
            }
            '@' if next_char(input, i + size).is_some_and(|(c, _)| is_ident_start(c)) => {
                // Verbatim identifier: never a keyword
                let end = read_ident(input, i + size);
                (SyntaxKind::Ident, end)
            }
            c if is_ident_start(c) => {
                let end = read_ident(input, i);
                let kind = SyntaxKind::reserved_keyword(&input[i..end]).unwrap_or(SyntaxKind::Ident);
                (kind, end)
            }
            c if c.is_ascii_digit() => lex_number(input, i),
            '.' if next_char(input, i + 1).is_some_and(|(c, _)| c.is_ascii_digit()) => {
                lex_number(input, i)
            }
            _ => match lex_punct(&input[i..]) {
                Some((kind, punct_len)) => (kind, i + punct_len),
                None => {
                    errors.push(LexerError::new(
                        format!("Unexpected character '{current}'"),
                        start..i + size,
                    ));
                    (SyntaxKind::Error, i + size)
                }
            },
        };

        at_line_start = match kind {
            SyntaxKind::Newline => true,
            SyntaxKind::Whitespace => at_line_start,
            _ => false,
        };

        tokens.push(CstToken::new(kind, &input[start..end], span(start, end)));
        i = end;
    }

    (tokens, errors)
}

impl LexerError {
    fn with_start(mut self, start: usize) -> Self {
        self.span.start = start;
        self
    }
}

fn is_inline_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000B}' | '\u{000C}')
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn read_ident(input: &str, start: usize) -> usize {
    let mut end = start;
    while let Some((c, s)) = next_char(input, end) {
        if !is_ident_continue(c) {
            break;
        }
        end += s;
    }
    end
}

fn line_end(input: &str, start: usize) -> usize {
    input[start..]
        .find(['\n', '\r'])
        .map_or(input.len(), |offset| start + offset)
}

/// Lex the body of a `"..."` or `'...'` literal starting after the opening quote
fn lex_regular_string(input: &str, start: usize, quote: char) -> (usize, Option<LexerError>) {
    let mut i = start;
    while let Some((c, s)) = next_char(input, i) {
        match c {
            '\\' => {
                i += s;
                if let Some((_, escaped)) = next_char(input, i) {
                    i += escaped;
                }
            }
            '\n' | '\r' => {
                return (
                    i,
                    Some(LexerError::new("Unterminated literal", start..i)),
                );
            }
            c if c == quote => return (i + s, None),
            _ => i += s,
        }
    }
    (
        input.len(),
        Some(LexerError::new("Unterminated literal", start..input.len())),
    )
}

fn is_special_string_start(input: &str, start: usize) -> bool {
    let rest = &input[start..];
    rest.starts_with("@\"")
        || rest.starts_with("$\"")
        || rest.starts_with("$@\"")
        || rest.starts_with("@$\"")
}

/// Lex verbatim (`@"..."`) and interpolated (`$"..."`, `$@"..."`) strings
fn lex_special_string(input: &str, start: usize) -> (usize, Option<LexerError>) {
    let prefix_len = input[start..].find('"').unwrap_or(0);
    let prefix = &input[start..start + prefix_len];
    let verbatim = prefix.contains('@');
    let interpolated = prefix.contains('$');

    let mut i = start + prefix_len + 1;
    let mut brace_depth = 0usize;
    while let Some((c, s)) = next_char(input, i) {
        match c {
            '"' if brace_depth > 0 => {
                // String literal nested inside an interpolation hole
                let (end, _) = lex_regular_string(input, i + 1, '"');
                i = end;
            }
            '"' if verbatim && input[i + 1..].starts_with('"') => i += 2,
            '"' => return (i + s, None),
            '\\' if !verbatim => {
                i += s;
                if let Some((_, escaped)) = next_char(input, i) {
                    i += escaped;
                }
            }
            '{' if interpolated => {
                if brace_depth == 0 && input[i + 1..].starts_with('{') {
                    i += 2;
                } else {
                    brace_depth += 1;
                    i += s;
                }
            }
            '}' if interpolated && brace_depth > 0 => {
                brace_depth -= 1;
                i += s;
            }
            '\n' | '\r' if !verbatim => {
                return (
                    i,
                    Some(LexerError::new("Unterminated string literal", start..i)),
                );
            }
            _ => i += s,
        }
    }
    (
        input.len(),
        Some(LexerError::new(
            "Unterminated string literal",
            start..input.len(),
        )),
    )
}

fn lex_number(input: &str, start: usize) -> (SyntaxKind, usize) {
    let bytes = input.as_bytes();
    let mut i = start;
    let mut kind = SyntaxKind::IntLiteral;

    let is_digit_or_sep = |b: u8, hex: bool| {
        b == b'_' || b.is_ascii_digit() || (hex && b.is_ascii_hexdigit())
    };

    if input[start..].starts_with("0x") || input[start..].starts_with("0X") {
        i += 2;
        while i < bytes.len() && is_digit_or_sep(bytes[i], true) {
            i += 1;
        }
    } else if input[start..].starts_with("0b") || input[start..].starts_with("0B") {
        i += 2;
        while i < bytes.len() && matches!(bytes[i], b'0' | b'1' | b'_') {
            i += 1;
        }
    } else {
        while i < bytes.len() && is_digit_or_sep(bytes[i], false) {
            i += 1;
        }
        // Fraction only when a digit follows the dot (`1.ToString()` stays an int)
        if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
            kind = SyntaxKind::RealLiteral;
            i += 1;
            while i < bytes.len() && is_digit_or_sep(bytes[i], false) {
                i += 1;
            }
        }
        if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
            let mut j = i + 1;
            if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
                j += 1;
            }
            if j < bytes.len() && bytes[j].is_ascii_digit() {
                kind = SyntaxKind::RealLiteral;
                i = j;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
        }
        if i < bytes.len() && matches!(bytes[i], b'f' | b'F' | b'd' | b'D' | b'm' | b'M') {
            kind = SyntaxKind::RealLiteral;
            i += 1;
            return (kind, i);
        }
    }

    while i < bytes.len() && matches!(bytes[i], b'u' | b'U' | b'l' | b'L') {
        i += 1;
    }

    (kind, i)
}

/// Longest-match punctuation table
const PUNCTUATION: &[(&str, SyntaxKind)] = &[
    ("??=", SyntaxKind::QuestionQuestionEq),
    ("<<=", SyntaxKind::ShlEq),
    ("??", SyntaxKind::QuestionQuestion),
    ("?.", SyntaxKind::QuestionDot),
    ("::", SyntaxKind::ColonColon),
    ("=>", SyntaxKind::FatArrow),
    ("==", SyntaxKind::EqEq),
    ("!=", SyntaxKind::BangEq),
    ("<=", SyntaxKind::LtEq),
    (">=", SyntaxKind::GtEq),
    ("&&", SyntaxKind::AmpAmp),
    ("||", SyntaxKind::PipePipe),
    ("++", SyntaxKind::PlusPlus),
    ("--", SyntaxKind::MinusMinus),
    ("+=", SyntaxKind::PlusEq),
    ("-=", SyntaxKind::MinusEq),
    ("*=", SyntaxKind::StarEq),
    ("/=", SyntaxKind::SlashEq),
    ("%=", SyntaxKind::PercentEq),
    ("&=", SyntaxKind::AmpEq),
    ("|=", SyntaxKind::PipeEq),
    ("^=", SyntaxKind::CaretEq),
    ("<<", SyntaxKind::Shl),
    ("->", SyntaxKind::Arrow),
    ("{", SyntaxKind::LBrace),
    ("}", SyntaxKind::RBrace),
    ("(", SyntaxKind::LParen),
    (")", SyntaxKind::RParen),
    ("[", SyntaxKind::LBracket),
    ("]", SyntaxKind::RBracket),
    (";", SyntaxKind::Semicolon),
    (",", SyntaxKind::Comma),
    (".", SyntaxKind::Dot),
    (":", SyntaxKind::Colon),
    ("?", SyntaxKind::Question),
    ("=", SyntaxKind::Eq),
    ("!", SyntaxKind::Bang),
    ("<", SyntaxKind::Lt),
    // `>` is never combined into `>>`: generic argument lists need it alone
    (">", SyntaxKind::Gt),
    ("+", SyntaxKind::Plus),
    ("-", SyntaxKind::Minus),
    ("*", SyntaxKind::Star),
    ("/", SyntaxKind::Slash),
    ("%", SyntaxKind::Percent),
    ("&", SyntaxKind::Amp),
    ("|", SyntaxKind::Pipe),
    ("^", SyntaxKind::Caret),
    ("~", SyntaxKind::Tilde),
];

fn lex_punct(rest: &str) -> Option<(SyntaxKind, usize)> {
    PUNCTUATION
        .iter()
        .find(|(text, _)| rest.starts_with(text))
        .map(|(text, kind)| (*kind, text.len()))
}

fn next_char(input: &str, pos: usize) -> Option<(char, usize)> {
    input[pos..].chars().next().map(|c| (c, c.len_utf8()))
}

fn span(start: usize, end: usize) -> CstSpan {
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        lex_with_trivia(input).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lossless_reconstruction() {
        let source = "/// <summary>x</summary>\r\nif(a >= 1.5f) { return @\"q\"\"\"; } // done\n";
        let (tokens, errors) = lex_with_trivia(source);
        assert!(errors.is_empty());
        let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_comment_flavours() {
        assert_eq!(
            kinds("/// doc\n//// plain\n/* b */"),
            vec![
                SyntaxKind::DocComment,
                SyntaxKind::Newline,
                SyntaxKind::LineComment,
                SyntaxKind::Newline,
                SyntaxKind::BlockComment,
            ]
        );
    }

    #[test]
    fn test_contextual_keywords_stay_identifiers() {
        assert_eq!(
            kinds("await from"),
            vec![SyntaxKind::Ident, SyntaxKind::Whitespace, SyntaxKind::Ident]
        );
        assert_eq!(kinds("@if"), vec![SyntaxKind::Ident]);
    }

    #[test]
    fn test_int_followed_by_member_access() {
        assert_eq!(
            kinds("1.ToString"),
            vec![SyntaxKind::IntLiteral, SyntaxKind::Dot, SyntaxKind::Ident]
        );
        assert_eq!(kinds("1.5"), vec![SyntaxKind::RealLiteral]);
        assert_eq!(kinds("0xFFul"), vec![SyntaxKind::IntLiteral]);
    }

    #[test]
    fn test_generic_close_is_single_gt() {
        assert_eq!(kinds(">>"), vec![SyntaxKind::Gt, SyntaxKind::Gt]);
        assert_eq!(kinds("??="), vec![SyntaxKind::QuestionQuestionEq]);
    }

    #[test]
    fn test_directive_only_at_line_start() {
        assert_eq!(
            kinds("  #region X\n"),
            vec![
                SyntaxKind::Whitespace,
                SyntaxKind::Directive,
                SyntaxKind::Newline
            ]
        );
    }

    #[test]
    fn test_interpolated_string_with_nested_quotes() {
        let (tokens, errors) = lex_with_trivia(r#"$"a{b("}")}c""#);
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
    }

    #[test]
    fn test_unterminated_string_reports_error() {
        let (tokens, errors) = lex_with_trivia("\"abc\nx");
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[0].text, "\"abc");
    }
}
