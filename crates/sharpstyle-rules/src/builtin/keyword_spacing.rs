//! Keyword spacing
//!
//! Most keywords must be followed by a single space. A few must not be when
//! they are used like a function (`typeof(T)`, `default(T)`, `new()`) or
//! stand alone (`return;`, `throw;`).

use rowan::TextRange;
use sharpstyle_core::{
    Edit, Finding, FixError, Result, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken,
    SyntaxTokenExt,
};

use crate::registry::{CheckContext, Rule, RuleMeta, Verdict};

/// Rule ID for keyword spacing
pub const RULE_ID: &str = "SA1000";

pub const META: RuleMeta = RuleMeta {
    id: RULE_ID,
    name: "KeywordsMustBeSpacedCorrectly",
    message: "The keyword '{0}' must{1} be {2} by a space",
};

const KEYWORDS: &[SyntaxKind] = &[
    SyntaxKind::AwaitKw,
    SyntaxKind::CaseKw,
    SyntaxKind::CatchKw,
    SyntaxKind::CheckedKw,
    SyntaxKind::DefaultKw,
    SyntaxKind::FixedKw,
    SyntaxKind::ForKw,
    SyntaxKind::ForeachKw,
    SyntaxKind::FromKw,
    SyntaxKind::GroupKw,
    SyntaxKind::IfKw,
    SyntaxKind::InKw,
    SyntaxKind::IntoKw,
    SyntaxKind::JoinKw,
    SyntaxKind::LetKw,
    SyntaxKind::LockKw,
    SyntaxKind::NameofKw,
    SyntaxKind::NewKw,
    SyntaxKind::OrderbyKw,
    SyntaxKind::ReturnKw,
    SyntaxKind::SelectKw,
    SyntaxKind::SizeofKw,
    SyntaxKind::StackallocKw,
    SyntaxKind::SwitchKw,
    SyntaxKind::ThrowKw,
    SyntaxKind::TypeofKw,
    SyntaxKind::UncheckedKw,
    SyntaxKind::UsingKw,
    SyntaxKind::WhereKw,
    SyntaxKind::WhileKw,
    SyntaxKind::YieldKw,
];

pub fn rule() -> Rule {
    Rule::new(META, KEYWORDS, check).with_fix(fix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spacing {
    Required,
    Disallowed,
}

pub fn check(element: &SyntaxElement, _context: &CheckContext<'_>) -> Result<Verdict> {
    let Some(keyword) = element.as_token() else {
        return Ok(Verdict::NotApplicable);
    };
    let Some(spacing) = expected_spacing(keyword) else {
        return Ok(Verdict::NotApplicable);
    };
    if keyword.next_token().is_none() {
        return Ok(Verdict::NotApplicable);
    }

    let spaces = spaces_in_gap(&gap(keyword));
    let finding = match (spacing, span_of(&spaces)) {
        (Spacing::Required, None) => {
            Finding::new(RULE_ID, TextRange::empty(keyword.text_range().end()))
                .with_args([keyword.text(), "", "followed"])
        }
        (Spacing::Disallowed, Some(span)) => {
            Finding::new(RULE_ID, span).with_args([keyword.text(), " not", "followed"])
        }
        _ => return Ok(Verdict::Clean),
    };
    Ok(Verdict::violation(finding.with_secondary_span(keyword.text_range())))
}

/// Insert a space right after the keyword, or drop the spacing that follows it
///
/// Comments between the keyword and the next token are kept in place.
pub fn fix(root: &SyntaxNode, finding: &Finding) -> std::result::Result<Edit, FixError> {
    let span = finding.primary_span();
    let at = root.token_at_offset(span.start());
    let keyword = if span.is_empty() {
        at.left_biased()
            .filter(|token| token.text_range().end() == span.start())
    } else {
        at.right_biased().and_then(|space| space.prev_significant())
    }
    .filter(|token| token.kind().is_keyword())
    .ok_or_else(|| FixError::not_applicable(RULE_ID, "keyword not found"))?;

    let gap = gap(&keyword);
    let spaces = spaces_in_gap(&gap);
    if span.is_empty() {
        if !spaces.is_empty() {
            return Err(FixError::not_applicable(RULE_ID, "spacing changed since the check"));
        }
        return Ok(Edit::new(finding.clone()).insert_token_after(
            &keyword,
            SyntaxKind::Whitespace,
            " ",
        ));
    }

    if span_of(&spaces) != Some(span) {
        return Err(FixError::not_applicable(RULE_ID, "spacing changed since the check"));
    }
    if gap.iter().any(|token| is_line_comment(token.kind())) {
        return Err(FixError::not_applicable(
            RULE_ID,
            "a line comment follows the keyword",
        ));
    }
    if gap.iter().any(|token| token.kind() == SyntaxKind::Directive) {
        return Err(FixError::not_applicable(
            RULE_ID,
            "a preprocessor directive must stay on its own line",
        ));
    }

    Ok(spaces
        .iter()
        .fold(Edit::new(finding.clone()), |edit, space| edit.remove_token(space)))
}

fn expected_spacing(keyword: &SyntaxToken) -> Option<Spacing> {
    let parent = keyword.parent().map(|node| node.kind());
    let next = keyword.next_significant().map(|token| token.kind());

    let spacing = match keyword.kind() {
        SyntaxKind::CheckedKw | SyntaxKind::UncheckedKw => {
            if parent == Some(SyntaxKind::CheckedStmt) {
                Spacing::Required
            } else {
                Spacing::Disallowed
            }
        }
        // `default:` labels and the `default` literal are left alone
        SyntaxKind::DefaultKw => {
            if parent != Some(SyntaxKind::DefaultExpr) {
                return None;
            }
            Spacing::Disallowed
        }
        SyntaxKind::NameofKw | SyntaxKind::SizeofKw | SyntaxKind::TypeofKw => Spacing::Disallowed,
        SyntaxKind::ReturnKw | SyntaxKind::ThrowKw => {
            if next == Some(SyntaxKind::Semicolon) {
                Spacing::Disallowed
            } else {
                Spacing::Required
            }
        }
        // `new[]` and `stackalloc[]` belong to the bracket spacing rule
        SyntaxKind::NewKw | SyntaxKind::StackallocKw if next == Some(SyntaxKind::LBracket) => {
            return None;
        }
        SyntaxKind::NewKw if next == Some(SyntaxKind::LParen) => Spacing::Disallowed,
        _ => Spacing::Required,
    };
    Some(spacing)
}

fn is_space(kind: SyntaxKind) -> bool {
    matches!(kind, SyntaxKind::Whitespace | SyntaxKind::Newline)
}

fn is_line_comment(kind: SyntaxKind) -> bool {
    matches!(kind, SyntaxKind::LineComment | SyntaxKind::DocComment)
}

/// Trivia between `keyword` and the next significant token
fn gap(keyword: &SyntaxToken) -> Vec<SyntaxToken> {
    std::iter::successors(keyword.next_token(), SyntaxToken::next_token)
        .take_while(|token| token.kind().is_trivia())
        .collect()
}

/// Whitespace and line breaks of a gap; a line break means the next token
/// is not on the keyword's line, which counts as being followed by a space
fn spaces_in_gap(gap: &[SyntaxToken]) -> Vec<SyntaxToken> {
    gap.iter()
        .filter(|token| is_space(token.kind()))
        .cloned()
        .collect()
}

fn span_of(tokens: &[SyntaxToken]) -> Option<TextRange> {
    let first = tokens.first()?.text_range();
    let last = tokens.last()?.text_range();
    Some(first.cover(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixEngine;
    use crate::builtin::test_support::{findings, fixed, registry};
    use sharpstyle_core::{SourceUnit, UnappliedReason};

    fn method(body: &str) -> String {
        format!("class C\n{{\n    object M()\n    {{\n        {body}\n    }}\n}}\n")
    }

    fn args(finding: &Finding) -> Vec<&str> {
        finding.message_args().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_missing_space_after_if() {
        let source = method("if(true) { }");
        let found = findings(RULE_ID, &source);

        assert_eq!(found.len(), 1);
        assert_eq!(args(&found[0]), ["if", "", "followed"]);
        let after_if = source.find("if(").unwrap() + 2;
        assert_eq!(usize::from(found[0].primary_span().start()), after_if);
        assert!(found[0].primary_span().is_empty());

        assert_eq!(fixed(RULE_ID, &source), method("if (true) { }"));
    }

    #[test]
    fn test_space_before_semicolon_after_return() {
        let source = method("return ;");
        let found = findings(RULE_ID, &source);

        assert_eq!(found.len(), 1);
        assert_eq!(args(&found[0]), ["return", " not", "followed"]);
        assert_eq!(fixed(RULE_ID, &source), method("return;"));
    }

    #[test]
    fn test_return_with_value_requires_space() {
        let source = method("return(x);");
        assert_eq!(args(&findings(RULE_ID, &source)[0]), ["return", "", "followed"]);
        assert_eq!(fixed(RULE_ID, &source), method("return (x);"));
        assert!(findings(RULE_ID, &method("return x;")).is_empty());
    }

    #[test]
    fn test_function_like_keywords() {
        let source = method("var t = typeof (int); var d = default (int); var n = nameof (M);");
        let found = findings(RULE_ID, &source);
        let keywords: Vec<_> = found.iter().map(|f| f.message_args()[0].as_str()).collect();
        assert_eq!(keywords, ["typeof", "default", "nameof"]);
        assert_eq!(
            fixed(RULE_ID, &source),
            method("var t = typeof(int); var d = default(int); var n = nameof(M);")
        );
    }

    #[test]
    fn test_new_forms() {
        assert!(findings(RULE_ID, &method("var a = new[] { 1 };")).is_empty());
        assert!(findings(RULE_ID, &method("Point p = new();")).is_empty());
        assert!(findings(RULE_ID, &method("var l = new List<int>();")).is_empty());

        let source = method("Point p = new ();");
        assert_eq!(args(&findings(RULE_ID, &source)[0]), ["new", " not", "followed"]);
        assert_eq!(fixed(RULE_ID, &source), method("Point p = new();"));
    }

    #[test]
    fn test_checked_statement_and_expression() {
        assert!(findings(RULE_ID, &method("checked { x++; }")).is_empty());
        assert_eq!(
            fixed(RULE_ID, &method("checked{ x++; }")),
            method("checked { x++; }")
        );
        assert_eq!(
            fixed(RULE_ID, &method("var y = unchecked (x + 1);")),
            method("var y = unchecked(x + 1);")
        );
    }

    #[test]
    fn test_switch_labels_and_goto_case() {
        let source = method("switch(x) { case 1: goto case 2; default: break; }");
        let found = findings(RULE_ID, &source);
        assert_eq!(found.len(), 1, "only the switch keyword lacks a space");
        assert_eq!(found[0].message_args()[0], "switch");
    }

    #[test]
    fn test_query_keywords() {
        let clean = method("var q = from x in xs where x > 1 let y = x select y;");
        assert!(findings(RULE_ID, &clean).is_empty());

        let source = method("foreach(var x in(xs)) { }");
        let keywords: Vec<_> = findings(RULE_ID, &source)
            .iter()
            .map(|f| f.message_args()[0].clone())
            .collect();
        assert_eq!(keywords, ["foreach", "in"]);
        assert_eq!(fixed(RULE_ID, &source), method("foreach (var x in (xs)) { }"));
    }

    #[test]
    fn test_space_goes_before_comment() {
        let source = method("if/* why */(x) { }");
        assert_eq!(fixed(RULE_ID, &source), method("if /* why */(x) { }"));
    }

    #[test]
    fn test_space_after_comment_counts() {
        let source = method("if/* why */ (x) { }");
        assert!(findings(RULE_ID, &source).is_empty());
        assert_eq!(fixed(RULE_ID, &source), source);
    }

    #[test]
    fn test_disallowed_space_after_comment() {
        let source = method("return/* done */ ;");
        let found = findings(RULE_ID, &source);
        assert_eq!(found.len(), 1);
        assert_eq!(args(&found[0]), ["return", " not", "followed"]);
        assert_eq!(fixed(RULE_ID, &source), method("return/* done */;"));

        let source = method("var t = typeof/* type */ (int);");
        assert_eq!(findings(RULE_ID, &source).len(), 1);
        assert_eq!(fixed(RULE_ID, &source), method("var t = typeof/* type */(int);"));
    }

    #[test]
    fn test_spacing_around_line_comment_is_left() {
        let source = method("var t = typeof // type\n            (int);");
        let (unit, _) = SourceUnit::parse(&source);
        let registry = registry(RULE_ID);

        let outcome = FixEngine::new(&registry).fix_all(&unit).unwrap();
        assert_eq!(outcome.unit.text(), source);
        assert_eq!(outcome.unapplied.len(), 1);
        assert_eq!(
            outcome.unapplied[0].reason,
            UnappliedReason::NotApplicable("a line comment follows the keyword".to_string())
        );
    }

    #[test]
    fn test_line_break_after_disallowed_keyword() {
        let source = method("var t = typeof\n            (int);");
        assert_eq!(findings(RULE_ID, &source).len(), 1);
        assert_eq!(fixed(RULE_ID, &source), method("var t = typeof(int);"));
    }
}
