//! Idempotence and consistency checks for rewritten trees
//!
//! After a batch is folded the harness verifies three things: the touched
//! rules no longer report at the fixed locations, the new text differs from
//! the old one only where edits were applied, and the new text parses back to
//! a tree of the same shape.

use std::fmt;
use std::sync::Arc;

use rowan::{TextRange, WalkEvent};
use sharpstyle_core::cst::parse_csharp;
use sharpstyle_core::{
    AppliedEdit, CancellationToken, Finding, Result, RewriteResult, SharpstyleError, SourceUnit,
    SyntaxKind, SyntaxNode,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::registry::RuleRegistry;

/// Parses rewritten text back into a tree
pub type ParseHook = Arc<dyn Fn(&str) -> Result<SyntaxNode> + Send + Sync>;

/// One failed consistency check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessIssue {
    /// The rule still reports where its fix was applied
    #[error("fix for '{}' left a finding at {:?}", .fixed.rule_id(), .residual.primary_span())]
    NonIdempotent { fixed: Finding, residual: Finding },

    /// Text outside the applied edits changed
    #[error("rewritten text differs from the applied edits at byte {offset}")]
    Lossless { offset: usize },

    /// The rewritten text does not parse back to the rewritten tree
    #[error("rewritten text reparses differently: {detail}")]
    Reparse { detail: String },
}

impl HarnessIssue {
    /// Engine error for this issue, located in `unit`
    pub fn to_error(&self, unit: &SourceUnit) -> SharpstyleError {
        match self {
            HarnessIssue::NonIdempotent { fixed, residual } => SharpstyleError::fix_non_idempotent(
                fixed.rule_id(),
                unit.location(residual.primary_span()),
            ),
            HarnessIssue::Lossless { .. } | HarnessIssue::Reparse { .. } => {
                SharpstyleError::rewrite_mismatch(self.to_string())
            }
        }
    }
}

/// Outcome of checking one rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessReport {
    pub issues: Vec<HarnessIssue>,
}

impl HarnessReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Applied findings whose rule still reports at the fixed location
    pub fn non_idempotent(&self) -> impl Iterator<Item = &Finding> {
        self.issues.iter().filter_map(|issue| match issue {
            HarnessIssue::NonIdempotent { fixed, .. } => Some(fixed),
            _ => None,
        })
    }

    /// First lossless or reparse failure
    pub fn mismatch(&self) -> Option<&HarnessIssue> {
        self.issues
            .iter()
            .find(|issue| !matches!(issue, HarnessIssue::NonIdempotent { .. }))
    }
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "consistent");
        }
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Verifies batch rewrites against the registry and a parser
#[derive(Clone)]
pub struct ConsistencyHarness<'r> {
    registry: &'r RuleRegistry,
    parse: ParseHook,
    cancel: CancellationToken,
}

impl<'r> ConsistencyHarness<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            parse: default_parse_hook(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_parse_hook(mut self, parse: ParseHook) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every check on a rewrite of `original`
    pub fn check(&self, original: &SourceUnit, result: &RewriteResult) -> Result<HarnessReport> {
        let mut report = HarnessReport::default();
        if let Some(offset) = lossless_mismatch(original.text(), result) {
            report.issues.push(HarnessIssue::Lossless { offset });
        }
        if let Some(detail) = self.reparse_mismatch(&result.unit)? {
            report.issues.push(HarnessIssue::Reparse { detail });
        }
        report.issues.extend(self.residuals(result)?);

        if !report.is_clean() {
            warn!(path = ?original.path(), "Rewrite failed consistency checks: {}", report);
        }
        Ok(report)
    }

    /// Findings of the touched rules left at the fixed locations
    pub fn residuals(&self, result: &RewriteResult) -> Result<Vec<HarnessIssue>> {
        let mut touched: Vec<&'static str> =
            result.applied.iter().map(Finding::rule_id).collect();
        touched.sort_unstable();
        touched.dedup();
        if touched.is_empty() {
            return Ok(Vec::new());
        }

        let residual = Dispatcher::new(self.registry)
            .with_cancellation(self.cancel.clone())
            .restrict_to(touched)
            .collect_primary(&result.unit)?;

        let mut issues = Vec::new();
        for fixed in &result.applied {
            let mapped = result.offsets.map_range(fixed.primary_span());
            if let Some(found) = residual
                .iter()
                .find(|r| r.rule_id() == fixed.rule_id() && same_location(r.primary_span(), mapped))
            {
                debug!(rule = fixed.rule_id(), range = ?mapped, "Fix is not idempotent");
                issues.push(HarnessIssue::NonIdempotent {
                    fixed: fixed.clone(),
                    residual: found.clone(),
                });
            }
        }
        Ok(issues)
    }

    fn reparse_mismatch(&self, unit: &SourceUnit) -> Result<Option<String>> {
        let reparsed = (self.parse)(unit.text())?;
        if reparsed.text() != unit.text() {
            return Ok(Some("parser output does not reproduce the text".to_string()));
        }

        let expected = node_shape(&unit.root());
        let actual = node_shape(&reparsed);
        let detail = expected
            .iter()
            .zip(&actual)
            .position(|(a, b)| a != b)
            .map(|index| {
                format!(
                    "node #{index} is {:?}, reparsed as {:?}",
                    expected[index], actual[index]
                )
            })
            .or_else(|| {
                (expected.len() != actual.len()).then(|| {
                    format!(
                        "{} nodes rewritten, {} reparsed",
                        expected.len(),
                        actual.len()
                    )
                })
            });
        Ok(detail)
    }
}

/// The reference C# parser
pub fn default_parse_hook() -> ParseHook {
    Arc::new(|text| Ok(parse_csharp(text).0))
}

/// Whether a residual finding sits where a fix was applied
///
/// Zero-width ranges match when one contains the other; other ranges must
/// share at least one character.
pub(crate) fn same_location(a: TextRange, b: TextRange) -> bool {
    if a.is_empty() || b.is_empty() {
        a.contains_range(b) || b.contains_range(a)
    } else {
        a.intersect(b).is_some_and(|common| !common.is_empty())
    }
}

/// Node kinds in preorder; trivia may be split differently and is ignored
fn node_shape(root: &SyntaxNode) -> Vec<SyntaxKind> {
    root.preorder()
        .filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node.kind()),
            WalkEvent::Leave(_) => None,
        })
        .collect()
}

/// Offset of the first byte where the rewrite is not the original with the
/// applied edits spliced in
fn lossless_mismatch(original: &str, result: &RewriteResult) -> Option<usize> {
    let expected = splice_edits(original, &result.edits);
    let actual = result.unit.text();
    if expected == actual {
        return None;
    }
    let common = expected
        .bytes()
        .zip(actual.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    Some(common)
}

fn splice_edits(original: &str, edits: &[AppliedEdit]) -> String {
    let mut ordered: Vec<&AppliedEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| (edit.range.start(), edit.range.end()));

    let mut text = String::with_capacity(original.len());
    let mut cursor = 0usize;
    for edit in ordered {
        let start = usize::from(edit.range.start());
        if start > cursor {
            text.push_str(&original[cursor..start]);
        }
        text.push_str(&edit.replacement);
        cursor = cursor.max(usize::from(edit.range.end()));
    }
    text.push_str(&original[cursor.min(original.len())..]);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{keyword_spacing, parentheses};
    use crate::registry::{RegistryBuilder, Rule, RuleMeta, Verdict};
    use sharpstyle_core::{Edit, EngineConfiguration, FixError, apply_edits};

    const STUBBORN: RuleMeta = RuleMeta {
        id: "TEST_STUBBORN",
        name: "Stubborn",
        message: "identifier {0}",
    };

    /// Reports every `x` identifier; its fix swaps the token for another `x`
    fn stubborn_rule() -> Rule {
        fn fix(_root: &SyntaxNode, finding: &Finding) -> std::result::Result<Edit, FixError> {
            Ok(Edit::new(finding.clone()).replace_tokens(
                finding.primary_span(),
                vec![sharpstyle_core::green_token(SyntaxKind::Ident, "x")],
            ))
        }
        Rule::new(STUBBORN, &[SyntaxKind::Ident], |element, _| {
            let Some(token) = element.as_token() else {
                return Ok(Verdict::NotApplicable);
            };
            if token.text() != "x" {
                return Ok(Verdict::Clean);
            }
            Ok(Verdict::violation(Finding::new("TEST_STUBBORN", token.text_range())))
        })
        .with_fix(fix)
    }

    fn edits_for(registry: &RuleRegistry, unit: &SourceUnit) -> Vec<Edit> {
        let root = unit.root();
        Dispatcher::new(registry)
            .collect_primary(unit)
            .unwrap()
            .iter()
            .filter_map(|finding| {
                let fix = registry.fix_for(finding.rule_id())?;
                fix(&root, finding).ok()
            })
            .collect()
    }

    #[test]
    fn test_clean_rewrite() {
        let registry = RegistryBuilder::new(EngineConfiguration::default())
            .register(keyword_spacing::rule())
            .register(parentheses::rule())
            .build()
            .unwrap();
        let (unit, _) = SourceUnit::parse("class C { int M() { return(x); } }");
        let result = apply_edits(&unit, edits_for(&registry, &unit), &CancellationToken::new())
            .unwrap();
        assert_eq!(result.unit.text(), "class C { int M() { return x; } }");

        let report = ConsistencyHarness::new(&registry).check(&unit, &result).unwrap();
        assert!(report.is_clean(), "{report}");
    }

    #[test]
    fn test_residual_finding_is_non_idempotent() {
        let registry = RegistryBuilder::new(EngineConfiguration::default())
            .register(stubborn_rule())
            .build()
            .unwrap();
        let (unit, _) = SourceUnit::parse("class C { int M() { return x; } }");
        let result = apply_edits(&unit, edits_for(&registry, &unit), &CancellationToken::new())
            .unwrap();

        let report = ConsistencyHarness::new(&registry).check(&unit, &result).unwrap();
        assert_eq!(report.non_idempotent().count(), 1);
        assert!(report.mismatch().is_none());

        let err = report.issues[0].to_error(&result.unit);
        assert_eq!(err.kind(), sharpstyle_core::ErrorKind::FixNonIdempotent);
    }

    #[test]
    fn test_reparse_shape_mismatch() {
        let registry = RegistryBuilder::new(EngineConfiguration::default())
            .register(parentheses::rule())
            .build()
            .unwrap();
        let (unit, _) = SourceUnit::parse("class C { int M() { return (x); } }");
        let result = apply_edits(&unit, edits_for(&registry, &unit), &CancellationToken::new())
            .unwrap();

        // A parser that sees every file as a bare compilation unit
        let flat: ParseHook = Arc::new(|text| {
            let mut builder = rowan::GreenNodeBuilder::new();
            builder.start_node(SyntaxKind::CompilationUnit.into());
            builder.token(SyntaxKind::Error.into(), text);
            builder.finish_node();
            Ok(SyntaxNode::new_root(builder.finish()))
        });
        let report = ConsistencyHarness::new(&registry)
            .with_parse_hook(flat)
            .check(&unit, &result)
            .unwrap();

        let Some(HarnessIssue::Reparse { detail }) = report.mismatch() else {
            panic!("expected a reparse issue, got {report}");
        };
        assert!(detail.contains("reparsed"), "{detail}");
    }

    #[test]
    fn test_splice_edits_orders_insertions_first() {
        let edits = vec![
            AppliedEdit {
                rule_id: "SA1119",
                range: TextRange::new(6.into(), 7.into()),
                replacement: String::new(),
            },
            AppliedEdit {
                rule_id: "SA1000",
                range: TextRange::empty(6.into()),
                replacement: " ".to_string(),
            },
        ];
        assert_eq!(splice_edits("return(x)", &edits), "return x)");
    }

    #[test]
    fn test_same_location() {
        let range = |start: u32, end: u32| TextRange::new(start.into(), end.into());
        assert!(same_location(range(2, 5), range(4, 9)));
        assert!(!same_location(range(2, 5), range(5, 9)));
        assert!(same_location(range(5, 5), range(5, 5)));
        assert!(same_location(range(5, 5), range(2, 5)));
        assert!(!same_location(range(6, 6), range(2, 5)));
    }
}
