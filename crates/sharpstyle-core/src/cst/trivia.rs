//! Trivia views over the lossless CST
//!
//! The tree stores whitespace, comments and line breaks as ordinary sibling
//! tokens. Rules reason about trivia *attached* to a significant token, so this
//! module computes those attachments on demand:
//!
//! - **Trailing trivia** of a token: the trivia on the same line after it, up to
//!   and including the first end-of-line
//! - **Leading trivia** of a token: the remaining trivia between the previous
//!   token's trailing trivia and the token itself
//!
//! Every trivia token belongs to exactly one of these views, so together with
//! the significant tokens they reconstruct the source.
//!
//! # Example
//!
//! ```rust,ignore
//! use sharpstyle_core::cst::{parse_csharp, SyntaxTokenExt, TriviaKind};
//!
//! let (cst, _) = parse_csharp("if (x) // note\n    y();");
//! let close = cst.descendants_with_tokens()
//!     .filter_map(|e| e.into_token())
//!     .find(|t| t.text() == ")")
//!     .unwrap();
//!
//! let trailing = close.trailing_trivia();
//! assert_eq!(trailing[1].kind(), TriviaKind::SingleLineComment);
//! assert_eq!(trailing[2].kind(), TriviaKind::EndOfLine);
//! ```

use rowan::TextRange;

use super::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Classification of a trivia item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    /// Spaces and tabs
    Whitespace,
    /// `// ...` and `/// ...` comments
    SingleLineComment,
    /// `/* ... */` comments
    MultiLineComment,
    /// A line break (`\n` or `\r\n`)
    EndOfLine,
    /// Preprocessor lines and anything else non-semantic
    Other,
}

impl TriviaKind {
    /// Classify a raw token kind; `None` for significant tokens
    pub fn from_syntax(kind: SyntaxKind) -> Option<Self> {
        let trivia = match kind {
            SyntaxKind::Whitespace => Self::Whitespace,
            SyntaxKind::Newline => Self::EndOfLine,
            SyntaxKind::LineComment | SyntaxKind::DocComment => Self::SingleLineComment,
            SyntaxKind::BlockComment => Self::MultiLineComment,
            SyntaxKind::Directive => Self::Other,
            _ => return None,
        };
        Some(trivia)
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::SingleLineComment | Self::MultiLineComment)
    }
}

/// A single trivia item, backed by its token in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trivia {
    kind: TriviaKind,
    token: SyntaxToken,
}

impl Trivia {
    fn from_token(token: SyntaxToken) -> Option<Self> {
        TriviaKind::from_syntax(token.kind()).map(|kind| Self { kind, token })
    }

    pub fn kind(&self) -> TriviaKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        self.token.text()
    }

    pub fn text_range(&self) -> TextRange {
        self.token.text_range()
    }

    /// `///` or `/** */` documentation comment
    pub fn is_doc_comment(&self) -> bool {
        match self.token.kind() {
            SyntaxKind::DocComment => true,
            SyntaxKind::BlockComment => delimited_doc_body(self.text()).is_some(),
            _ => false,
        }
    }

    /// The underlying tree token
    pub fn token(&self) -> &SyntaxToken {
        &self.token
    }
}

/// Trivia and navigation accessors for significant tokens
pub trait SyntaxTokenExt {
    /// Trivia owned by this token that precedes it
    fn leading_trivia(&self) -> Vec<Trivia>;

    /// Same-line trivia after this token, up to and including the first EOL
    fn trailing_trivia(&self) -> Vec<Trivia>;

    /// Next non-trivia token in document order
    fn next_significant(&self) -> Option<SyntaxToken>;

    /// Previous non-trivia token in document order
    fn prev_significant(&self) -> Option<SyntaxToken>;

    /// Text range covering leading trivia, the token and trailing trivia
    fn full_range(&self) -> TextRange;
}

impl SyntaxTokenExt for SyntaxToken {
    fn leading_trivia(&self) -> Vec<Trivia> {
        // Collect the whole run back to the previous significant token
        let mut run = Vec::new();
        let mut has_previous = false;
        let mut cursor = self.prev_token();
        while let Some(token) = cursor {
            if !token.kind().is_trivia() {
                has_previous = true;
                break;
            }
            cursor = token.prev_token();
            run.push(token);
        }
        run.reverse();

        // The previous token keeps everything up to its first line break
        let owned_by_previous = if has_previous {
            run.iter()
                .position(|t| t.kind() == SyntaxKind::Newline)
                .map_or(run.len(), |idx| idx + 1)
        } else {
            0
        };

        run.into_iter()
            .skip(owned_by_previous)
            .filter_map(Trivia::from_token)
            .collect()
    }

    fn trailing_trivia(&self) -> Vec<Trivia> {
        let mut trivia = Vec::new();
        let mut cursor = self.next_token();
        while let Some(token) = cursor {
            let Some(item) = Trivia::from_token(token.clone()) else {
                break;
            };
            let is_eol = item.kind() == TriviaKind::EndOfLine;
            trivia.push(item);
            if is_eol {
                break;
            }
            cursor = token.next_token();
        }
        trivia
    }

    fn next_significant(&self) -> Option<SyntaxToken> {
        let mut cursor = self.next_token();
        while let Some(token) = cursor {
            if !token.kind().is_trivia() {
                return Some(token);
            }
            cursor = token.next_token();
        }
        None
    }

    fn prev_significant(&self) -> Option<SyntaxToken> {
        let mut cursor = self.prev_token();
        while let Some(token) = cursor {
            if !token.kind().is_trivia() {
                return Some(token);
            }
            cursor = token.prev_token();
        }
        None
    }

    fn full_range(&self) -> TextRange {
        let range = self.text_range();
        let start = self
            .leading_trivia()
            .first()
            .map_or(range.start(), |t| t.text_range().start());
        let end = self
            .trailing_trivia()
            .last()
            .map_or(range.end(), |t| t.text_range().end());
        TextRange::new(start, end)
    }
}

/// First significant token of a node
pub fn first_significant_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    node.descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| !t.kind().is_trivia())
}

/// Last significant token of a node
pub fn last_significant_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    let last = node.last_token()?;
    if last.kind().is_trivia() {
        last.prev_significant()
            .filter(|t| node.text_range().contains_range(t.text_range()))
    } else {
        Some(last)
    }
}

/// Text of the documentation comments in a token's leading trivia, with the
/// `///`, `/**`, `*/` and leading `*` markers stripped
///
/// Returns `None` when the token carries no documentation comment.
pub fn doc_comment_text(token: &SyntaxToken) -> Option<String> {
    let parts: Vec<String> = token
        .leading_trivia()
        .iter()
        .filter_map(|t| match t.token().kind() {
            SyntaxKind::DocComment => Some(t.text().trim_start_matches("///").to_string()),
            SyntaxKind::BlockComment => delimited_doc_body(t.text()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Body of a `/** ... */` comment; `/**/` is an ordinary comment
fn delimited_doc_body(text: &str) -> Option<String> {
    let body = text.strip_prefix("/**")?;
    if body.starts_with('/') {
        return None;
    }
    let body = body.strip_suffix("*/").unwrap_or(body);
    let lines: Vec<&str> = body
        .lines()
        .enumerate()
        .map(|(index, line)| match line.trim_start().strip_prefix('*') {
            Some(rest) if index > 0 => rest,
            _ => line,
        })
        .collect();
    Some(lines.join("\n"))
}
