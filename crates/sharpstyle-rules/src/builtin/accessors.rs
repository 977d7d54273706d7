//! Accessor line-style consistency
//!
//! The two accessors of a property, indexer or event must both be written
//! on a single line or both span several lines. Diagnostic only.

use sharpstyle_core::cst::ast::{Accessor, AccessorOwner, AstNode};
use sharpstyle_core::{Finding, Result, SourceMap, SyntaxElement, SyntaxKind};

use crate::registry::{CheckContext, Rule, RuleMeta, Verdict};

/// Rule ID for accessor line-style consistency
pub const RULE_ID: &str = "SA1504";

pub const META: RuleMeta = RuleMeta {
    id: RULE_ID,
    name: "AllAccessorsMustBeSingleLineOrMultiLine",
    message: "All accessors must be single-line or multi-line",
};

pub fn rule() -> Rule {
    Rule::new(
        META,
        &[
            SyntaxKind::PropertyDecl,
            SyntaxKind::IndexerDecl,
            SyntaxKind::EventDecl,
        ],
        check,
    )
}

pub fn check(element: &SyntaxElement, context: &CheckContext<'_>) -> Result<Verdict> {
    let Some(owner) = element.as_node().cloned().and_then(AccessorOwner::cast) else {
        return Ok(Verdict::NotApplicable);
    };
    let Some(list) = owner.accessor_list() else {
        return Ok(Verdict::NotApplicable);
    };
    let accessors: Vec<Accessor> = list.accessors().collect();
    let [first, second] = accessors.as_slice() else {
        return Ok(Verdict::NotApplicable);
    };

    let map = context.unit.source_map();
    if is_single_line(first, map) == is_single_line(second, map) {
        return Ok(Verdict::Clean);
    }

    let range = second.syntax().text_range();
    let at = second.keyword().map_or(range, |keyword| keyword.text_range());
    Ok(Verdict::violation(
        Finding::new(RULE_ID, at).with_secondary_span(range),
    ))
}

fn is_single_line(accessor: &Accessor, map: &SourceMap) -> bool {
    let range = accessor.syntax().text_range();
    map.same_line(range.start(), range.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::{findings, span_text};

    #[test]
    fn test_mixed_accessors_report_second() {
        let source = r#"class C
{
    int X
    {
        get { return x; }
        set
        {
            x = value;
        }
    }
}
"#;
        let found = findings(RULE_ID, source);

        assert_eq!(found.len(), 1);
        assert_eq!(span_text(source, &found[0]), "set");
        assert_eq!(
            &source[found[0].secondary_spans()[0]],
            "set\n        {\n            x = value;\n        }"
        );
    }

    #[test]
    fn test_consistent_accessors_are_clean() {
        let single = "class C\n{\n    int X\n    {\n        get { return x; }\n        set { x = value; }\n    }\n}\n";
        assert!(findings(RULE_ID, single).is_empty());

        let multi = r#"class C
{
    int X
    {
        get
        {
            return x;
        }
        set
        {
            x = value;
        }
    }
}
"#;
        assert!(findings(RULE_ID, multi).is_empty());
    }

    #[test]
    fn test_indexer_and_event_accessors() {
        let source = r#"class C
{
    int this[int i]
    {
        get
        {
            return i;
        }
        set { }
    }

    event Action Fired
    {
        add { }
        remove
        {
            handlers = null;
        }
    }
}
"#;
        let found: Vec<_> = findings(RULE_ID, source)
            .iter()
            .map(|f| span_text(source, f).to_string())
            .collect();
        assert_eq!(found, ["set", "remove"]);
    }

    #[test]
    fn test_single_accessor_is_not_applicable() {
        let source = "class C\n{\n    int X\n    {\n        get\n        {\n            return x;\n        }\n    }\n}\n";
        assert!(findings(RULE_ID, source).is_empty());
    }
}
