//! Built-in style rules
//!
//! Each rule module exposes its `RULE_ID`, a `rule()` constructor for the
//! registry, its check function and, for fixable rules, its fix.

pub mod accessors;
pub mod documentation;
pub mod keyword_spacing;
pub mod naming;
pub mod parentheses;

use rowan::{NodeOrToken, TextRange};
use sharpstyle_core::{SyntaxKind, SyntaxNode};

use crate::registry::Rule;

/// Every built-in rule, in dispatch order
pub fn all_rules() -> Vec<Rule> {
    vec![
        keyword_spacing::rule(),
        parentheses::rule(),
        naming::rule(),
        accessors::rule(),
        documentation::rule(),
    ]
}

/// Innermost node of `kind` spanning exactly `range`
pub(crate) fn find_node(root: &SyntaxNode, range: TextRange, kind: SyntaxKind) -> Option<SyntaxNode> {
    if !root.text_range().contains_range(range) {
        return None;
    }
    let start = match root.covering_element(range) {
        NodeOrToken::Node(node) => node,
        NodeOrToken::Token(token) => token.parent()?,
    };
    start
        .ancestors()
        .take_while(|node| node.text_range() == range)
        .find(|node| node.kind() == kind)
}
