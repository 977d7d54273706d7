//! Redundant parentheses
//!
//! Reports parenthesized expressions whose parentheses change neither
//! precedence nor parse, and removes them.

use std::iter::successors;

use sharpstyle_core::cst::ast::{AstNode, ParenExpr};
use sharpstyle_core::{
    Edit, Finding, FixError, Result, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken,
};

use super::find_node;
use crate::registry::{CheckContext, Rule, RuleMeta, Verdict};

/// Rule ID for unnecessary parentheses
pub const RULE_ID: &str = "SA1119";

/// Rule ID of the zero-effect markers placed on the parenthesis tokens
pub const MARKER_ID: &str = "SA1119_p";

pub const META: RuleMeta = RuleMeta {
    id: RULE_ID,
    name: "StatementMustNotUseUnnecessaryParenthesis",
    message: "Statement must not use unnecessary parentheses",
};

pub fn rule() -> Rule {
    Rule::new(META, &[SyntaxKind::ParenExpr], check).with_fix(fix)
}

/// Check one parenthesized expression
///
/// A finding covers the whole expression and carries the two parenthesis
/// tokens as secondary spans; auxiliary markers on the same tokens follow it.
pub fn check(element: &SyntaxElement, _context: &CheckContext<'_>) -> Result<Verdict> {
    let Some(paren) = element.as_node().cloned().and_then(ParenExpr::cast) else {
        return Ok(Verdict::NotApplicable);
    };
    let (Some(open), Some(close), Some(inner)) = (paren.l_paren(), paren.r_paren(), paren.expr())
    else {
        return Ok(Verdict::NotApplicable);
    };
    if !inner.kind().is_expr() {
        return Ok(Verdict::NotApplicable);
    }

    if !is_unnecessary(paren.syntax(), &inner) {
        return Ok(Verdict::Clean);
    }

    let open = open.text_range();
    let close = close.text_range();
    Ok(Verdict::Violations(vec![
        Finding::new(RULE_ID, paren.syntax().text_range())
            .with_secondary_span(open)
            .with_secondary_span(close),
        Finding::auxiliary(MARKER_ID, open),
        Finding::auxiliary(MARKER_ID, close),
    ]))
}

/// Remove both parentheses and the padding just inside them
///
/// Comments stay in place. Padding that ends a line comment is kept so the
/// closing code does not move into the comment.
pub fn fix(root: &SyntaxNode, finding: &Finding) -> std::result::Result<Edit, FixError> {
    let paren = find_node(root, finding.primary_span(), SyntaxKind::ParenExpr)
        .and_then(ParenExpr::cast)
        .ok_or_else(|| FixError::not_applicable(RULE_ID, "parenthesized expression not found"))?;
    let (Some(open), Some(close)) = (paren.l_paren(), paren.r_paren()) else {
        return Err(FixError::not_applicable(RULE_ID, "unbalanced parentheses"));
    };

    let edit = inner_padding(&open, &close)
        .iter()
        .fold(Edit::new(finding.clone()), |edit, token| edit.remove_token(token));
    Ok(edit.remove_delimiter(&open).remove_delimiter(&close))
}

/// Whitespace and line breaks directly after `open` and directly before `close`
fn inner_padding(open: &SyntaxToken, close: &SyntaxToken) -> Vec<SyntaxToken> {
    let is_padding =
        |token: &SyntaxToken| matches!(token.kind(), SyntaxKind::Whitespace | SyntaxKind::Newline);
    let mut padding: Vec<_> = successors(open.next_token(), SyntaxToken::next_token)
        .take_while(is_padding)
        .collect();
    let trailing: Vec<_> = successors(close.prev_token(), SyntaxToken::prev_token)
        .take_while(is_padding)
        .collect();
    let ends_line_comment = trailing
        .last()
        .and_then(SyntaxToken::prev_token)
        .is_some_and(|token| {
            matches!(
                token.kind(),
                SyntaxKind::LineComment | SyntaxKind::DocComment | SyntaxKind::Directive
            )
        });
    if !ends_line_comment {
        padding.extend(trailing.into_iter().rev());
    }
    padding
}

fn is_unnecessary(node: &SyntaxNode, inner: &SyntaxNode) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };

    if parent.kind() == SyntaxKind::ParenExpr
        && node
            .ancestors()
            .any(|ancestor| ancestor.kind() == SyntaxKind::ConstructorInitializer)
    {
        return false;
    }

    if groups_operators(inner.kind()) {
        // Judge a run of nested parentheses by what surrounds the outermost
        let outermost = node
            .ancestors()
            .take_while(|ancestor| ancestor.kind() == SyntaxKind::ParenExpr)
            .last()
            .unwrap_or_else(|| node.clone());
        let Some(context) = outermost.parent() else {
            return false;
        };
        return match context.kind() {
            SyntaxKind::CheckedExpr => true,
            SyntaxKind::AssignmentExpr => context.last_child().as_ref() == Some(&outermost),
            kind => !kind.is_expr(),
        };
    }

    if is_receiver(node, &parent) {
        if inner.kind() == SyntaxKind::ConditionalAccessExpr {
            return false;
        }
        if parent.kind() == SyntaxKind::MemberAccessExpr && !is_standalone_receiver(inner) {
            return false;
        }
    }
    true
}

/// Expressions whose parentheses may carry precedence
fn groups_operators(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::BinaryExpr
            | SyntaxKind::AssignmentExpr
            | SyntaxKind::PrefixUnaryExpr
            | SyntaxKind::PostfixUnaryExpr
            | SyntaxKind::CastExpr
            | SyntaxKind::ConditionalExpr
            | SyntaxKind::IsExpr
            | SyntaxKind::AsExpr
            | SyntaxKind::SimpleLambdaExpr
            | SyntaxKind::ParenLambdaExpr
            | SyntaxKind::ArrayCreationExpr
            | SyntaxKind::ImplicitArrayCreationExpr
            | SyntaxKind::StackallocExpr
            | SyntaxKind::CoalesceExpr
            | SyntaxKind::QueryExpr
            | SyntaxKind::AwaitExpr
    )
}

fn is_receiver(node: &SyntaxNode, parent: &SyntaxNode) -> bool {
    matches!(
        parent.kind(),
        SyntaxKind::MemberAccessExpr
            | SyntaxKind::ConditionalAccessExpr
            | SyntaxKind::ElementAccessExpr
    ) && parent.first_child().as_ref() == Some(node)
}

/// Whether `inner` can stand in front of `.` without parentheses
fn is_standalone_receiver(inner: &SyntaxNode) -> bool {
    match inner.kind() {
        SyntaxKind::LiteralExpr => !inner
            .first_token()
            .is_some_and(|token| {
                matches!(token.kind(), SyntaxKind::IntLiteral | SyntaxKind::RealLiteral)
            }),
        SyntaxKind::DefaultLiteralExpr
        | SyntaxKind::ImplicitObjectCreationExpr
        | SyntaxKind::InitializerExpr => false,
        _ => true,
    }
}
