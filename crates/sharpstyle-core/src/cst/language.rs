//! Rowan language implementation for C#
//!
//! This module implements the `rowan::Language` trait, which connects our
//! `SyntaxKind` enum to Rowan's generic CST infrastructure.

use rowan::Language;

use super::SyntaxKind;

/// Language implementation for the C# syntax tree
///
/// This is a zero-sized type that implements `rowan::Language` to provide
/// the connection between our syntax kinds and Rowan's generic tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CSharpLanguage;

impl Language for CSharpLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        // Trees are only ever built from `SyntaxKind` values, so an unknown
        // raw kind can only come from a foreign green tree.
        SyntaxKind::from_raw(raw.0).unwrap_or(SyntaxKind::Error)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Red-tree node over the C# language
pub type SyntaxNode = rowan::SyntaxNode<CSharpLanguage>;
/// Red-tree token over the C# language
pub type SyntaxToken = rowan::SyntaxToken<CSharpLanguage>;
/// Either a node or a token
pub type SyntaxElement = rowan::SyntaxElement<CSharpLanguage>;
/// Iterator over the children of a node
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<CSharpLanguage>;
/// Owned green element used when rebuilding trees
pub type GreenElement = rowan::NodeOrToken<rowan::GreenNode, rowan::GreenToken>;
