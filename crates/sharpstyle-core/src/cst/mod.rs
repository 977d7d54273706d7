//! Concrete Syntax Tree (CST) for C# sources
//!
//! This module implements a lossless syntax tree using the Rowan library.
//! The CST preserves all source information including whitespace, comments,
//! and formatting, enabling:
//! - Rules that reason about spacing and comment placement
//! - Precise autofixes that preserve formatting
//! - Error-tolerant parsing of incomplete code
//!
//! ## Architecture
//!
//! The CST uses Rowan's green/red tree pattern:
//!
//! - **Green Tree**: Immutable, position-independent storage
//!   - Stores actual source text with trivia (whitespace, comments)
//!   - Deduplicates identical subtrees for memory efficiency
//!   - Cheap to clone (uses Arc internally)
//!
//! - **Red Tree**: Dynamically constructed view with parent pointers
//!   - Created on-demand for traversal
//!   - Provides typed AST-like API
//!   - Enables efficient parent/sibling navigation
//!
//! ## Trivia Handling
//!
//! Trivia tokens are stored as siblings of significant tokens. Nodes start at
//! their first significant token, and [`SyntaxTokenExt`] computes the
//! leading/trailing trivia attached to each token.
//!
//! This enables lossless representation: `parse(source).text() == source`
//!
//! ## Example
//!
//! ```rust,ignore
//! use sharpstyle_core::cst::{parse_csharp, SyntaxKind};
//!
//! let (cst, errors) = parse_csharp("if(x) { return; } // done");
//! assert!(errors.is_empty());
//! assert_eq!(cst.text().to_string(), "if(x) { return; } // done");
//!
//! for token in cst.descendants_with_tokens().filter_map(|e| e.into_token()) {
//!     if token.kind() == SyntaxKind::LineComment {
//!         println!("Found comment: {}", token.text());
//!     }
//! }
//! ```

mod builder;
mod language;
mod lexer;
mod parser;
mod syntax_kind;

pub mod ast;
pub mod trivia;

pub use builder::CstBuilder;
pub use language::{
    CSharpLanguage, GreenElement, SyntaxElement, SyntaxNode, SyntaxNodeChildren, SyntaxToken,
};
pub use lexer::{CstLexResult, CstSpan, CstToken, LexerError, lex_with_trivia};
pub use parser::{ParseError, ParseErrorKind, parse_csharp};
pub use syntax_kind::SyntaxKind;
pub use trivia::{SyntaxTokenExt, Trivia, TriviaKind};
