//! Tree edits and the batch folding pass
//!
//! Fixers describe their change as an [`Edit`]: one or more [`EditPart`]s
//! anchored to text ranges of the tree the finding was reported against.
//! [`apply_edits`] detects conflicting edits, validates every remaining part
//! against the tree and folds them right to left, so a pending part never
//! sees offsets shifted by an earlier one.

use std::cmp::Reverse;
use std::fmt;
use std::ops::Range;

use rowan::{GreenNode, GreenToken, NodeOrToken, TextRange, TextSize};
use tracing::{debug, trace};

use crate::Result;
use crate::error::SharpstyleError;
use crate::cancel::CancellationToken;
use crate::cst::{GreenElement, SyntaxKind, SyntaxNode, SyntaxToken, lex_with_trivia};
use crate::diagnostics::Finding;
use crate::source::SourceUnit;

/// What a part does to the range it is anchored at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    /// Replace the innermost node of `kind` spanning exactly the range
    ReplaceNode {
        kind: SyntaxKind,
        replacement: GreenNode,
    },
    /// Replace a run of sibling elements covering exactly the range
    ReplaceTokens { replacement: Vec<GreenElement> },
    /// Remove the token of `kind` spanning exactly the range
    ///
    /// When the removal would glue its neighbours into a different token
    /// (`return(x)` without the paren), a single space is left instead. With
    /// `unwrap_parent`, a parent left without significant tokens of its own
    /// is replaced by its remaining children.
    RemoveToken {
        kind: SyntaxKind,
        unwrap_parent: bool,
    },
    /// Insert elements right after the `anchor` token ending at the range start
    InsertAfter {
        anchor: SyntaxKind,
        elements: Vec<GreenElement>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPart {
    range: TextRange,
    kind: EditKind,
}

impl EditPart {
    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn kind(&self) -> &EditKind {
        &self.kind
    }
}

/// A fix for one finding, as a set of parts applied together or not at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    finding: Finding,
    parts: Vec<EditPart>,
}

impl Edit {
    pub fn new(finding: Finding) -> Self {
        Self {
            finding,
            parts: Vec::new(),
        }
    }

    pub fn finding(&self) -> &Finding {
        &self.finding
    }

    pub fn rule_id(&self) -> &'static str {
        self.finding.rule_id()
    }

    pub fn parts(&self) -> &[EditPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn replace_node(mut self, node: &SyntaxNode, replacement: GreenNode) -> Self {
        self.parts.push(EditPart {
            range: node.text_range(),
            kind: EditKind::ReplaceNode {
                kind: node.kind(),
                replacement,
            },
        });
        self
    }

    pub fn replace_tokens(mut self, range: TextRange, replacement: Vec<GreenElement>) -> Self {
        self.parts.push(EditPart {
            range,
            kind: EditKind::ReplaceTokens { replacement },
        });
        self
    }

    pub fn remove_token(mut self, token: &SyntaxToken) -> Self {
        self.parts.push(EditPart {
            range: token.text_range(),
            kind: EditKind::RemoveToken {
                kind: token.kind(),
                unwrap_parent: false,
            },
        });
        self
    }

    /// Remove a delimiter; once all delimiters are gone the node dissolves
    pub fn remove_delimiter(mut self, token: &SyntaxToken) -> Self {
        self.parts.push(EditPart {
            range: token.text_range(),
            kind: EditKind::RemoveToken {
                kind: token.kind(),
                unwrap_parent: true,
            },
        });
        self
    }

    pub fn insert_after(mut self, anchor: &SyntaxToken, elements: Vec<GreenElement>) -> Self {
        self.parts.push(EditPart {
            range: TextRange::empty(anchor.text_range().end()),
            kind: EditKind::InsertAfter {
                anchor: anchor.kind(),
                elements,
            },
        });
        self
    }

    /// Insert a single new token after `anchor`
    pub fn insert_token_after(self, anchor: &SyntaxToken, kind: SyntaxKind, text: &str) -> Self {
        self.insert_after(anchor, vec![green_token(kind, text)])
    }

    /// Smallest range covering every part
    pub fn covering_range(&self) -> Option<TextRange> {
        self.parts
            .iter()
            .map(|part| part.range)
            .reduce(|acc, range| acc.cover(range))
    }

    fn conflicts_with(&self, other: &Edit) -> bool {
        self.parts
            .iter()
            .any(|a| other.parts.iter().any(|b| ranges_conflict(a.range, b.range)))
    }
}

/// Whether two parts of different edits may not be folded together
///
/// Non-empty ranges conflict when they overlap. An insertion conflicts with
/// another insertion at the same offset and with a range strictly around it.
pub fn ranges_conflict(a: TextRange, b: TextRange) -> bool {
    match (a.is_empty(), b.is_empty()) {
        (false, false) => a.start() < b.end() && b.start() < a.end(),
        (true, true) => a.start() == b.start(),
        (true, false) => b.start() < a.start() && a.start() < b.end(),
        (false, true) => a.start() < b.start() && b.start() < a.end(),
    }
}

/// Build a detached token for use in replacements
pub fn green_token(kind: SyntaxKind, text: &str) -> GreenElement {
    NodeOrToken::Token(GreenToken::new(kind.into(), text))
}

fn element_text(element: &GreenElement) -> String {
    match element {
        NodeOrToken::Node(node) => node.to_string(),
        NodeOrToken::Token(token) => token.text().to_string(),
    }
}

/// Why a finding is still present after a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnappliedReason {
    /// Its edit overlaps an edit for another finding
    Conflict { with: &'static str },
    /// Its target no longer exists; a re-dispatch may produce a fresh finding
    TargetVanished,
    /// The fixer declined
    NotApplicable(String),
    /// The rule has no fix
    NoFix,
    /// A fix was applied but the violation is still reported
    NonIdempotent,
    /// Still reported after the last allowed fix pass
    PassLimit,
}

impl fmt::Display for UnappliedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnappliedReason::Conflict { with } => write!(f, "conflicts with a fix for {with}"),
            UnappliedReason::TargetVanished => write!(f, "fix target vanished"),
            UnappliedReason::NotApplicable(reason) => write!(f, "not applicable: {reason}"),
            UnappliedReason::NoFix => write!(f, "rule has no fix"),
            UnappliedReason::NonIdempotent => write!(f, "fix is not idempotent"),
            UnappliedReason::PassLimit => write!(f, "fix pass limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnappliedFix {
    pub finding: Finding,
    pub reason: UnappliedReason,
}

/// One folded part, in original-tree coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    pub rule_id: &'static str,
    pub range: TextRange,
    pub replacement: String,
}

/// Maps offsets of the original text to offsets of the rewritten text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    /// Sorted by start: original range and the length of its replacement
    deltas: Vec<(TextRange, TextSize)>,
}

impl OffsetMap {
    pub fn from_applied(applied: &[AppliedEdit]) -> Self {
        let mut deltas: Vec<_> = applied
            .iter()
            .map(|edit| (edit.range, TextSize::of(edit.replacement.as_str())))
            .collect();
        deltas.sort_by_key(|(range, _)| (range.start(), range.end()));
        Self { deltas }
    }

    pub fn is_identity(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Offsets inside a replaced range clamp to its replacement
    pub fn map(&self, offset: TextSize) -> TextSize {
        let mut shift: i64 = 0;
        for (range, new_len) in &self.deltas {
            if range.end() <= offset && !(range.is_empty() && range.start() == offset) {
                shift += i64::from(u32::from(*new_len)) - i64::from(u32::from(range.len()));
            } else if range.start() < offset {
                let start = i64::from(u32::from(range.start())) + shift;
                let inside = (offset - range.start()).min(*new_len);
                return to_size(start + i64::from(u32::from(inside)));
            } else {
                break;
            }
        }
        to_size(i64::from(u32::from(offset)) + shift)
    }

    pub fn map_range(&self, range: TextRange) -> TextRange {
        let start = self.map(range.start());
        let end = self.map(range.end()).max(start);
        TextRange::new(start, end)
    }
}

fn to_size(value: i64) -> TextSize {
    TextSize::from(u32::try_from(value.max(0)).unwrap_or(u32::MAX))
}

/// Outcome of folding one batch of edits
#[derive(Debug, Clone)]
pub struct RewriteResult {
    pub unit: SourceUnit,
    pub applied: Vec<Finding>,
    pub edits: Vec<AppliedEdit>,
    pub unapplied: Vec<UnappliedFix>,
    /// Some edit targeted a vanished element; re-dispatch and retry
    pub needs_retry: bool,
    pub offsets: OffsetMap,
}

impl RewriteResult {
    /// A result that changes nothing
    pub fn unchanged(unit: SourceUnit) -> Self {
        Self {
            unit,
            applied: Vec::new(),
            edits: Vec::new(),
            unapplied: Vec::new(),
            needs_retry: false,
            offsets: OffsetMap::default(),
        }
    }

    pub fn is_changed(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn push_unapplied(&mut self, finding: Finding, reason: UnappliedReason) {
        self.unapplied.push(UnappliedFix { finding, reason });
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &UnappliedFix> {
        self.unapplied
            .iter()
            .filter(|fix| matches!(fix.reason, UnappliedReason::Conflict { .. }))
    }
}

/// Fold a batch of edits into `unit`
///
/// Conflicting edits are both left out. Edits whose targets cannot be found
/// are left out as vanished and flag the result for retry. Nothing is folded
/// once `cancel` is set: the batch fails with `Cancelled` and the caller keeps
/// the original tree.
///
/// # Panics
///
/// Panics if the parts of a single edit overlap each other.
pub fn apply_edits(
    unit: &SourceUnit,
    edits: Vec<Edit>,
    cancel: &CancellationToken,
) -> Result<RewriteResult> {
    let mut result = RewriteResult::unchanged(unit.clone());
    if edits.is_empty() {
        return Ok(result);
    }

    let mut conflict: Vec<Option<&'static str>> = vec![None; edits.len()];
    for i in 0..edits.len() {
        for j in i + 1..edits.len() {
            if edits[i].conflicts_with(&edits[j]) {
                conflict[i].get_or_insert(edits[j].rule_id());
                conflict[j].get_or_insert(edits[i].rule_id());
            }
        }
    }

    let original = unit.root();
    let mut accepted = Vec::new();
    for (edit, conflict) in edits.into_iter().zip(conflict) {
        if let Some(with) = conflict {
            debug!(rule = edit.rule_id(), with, "Edit conflicts; leaving finding unfixed");
            result.push_unapplied(edit.finding, UnappliedReason::Conflict { with });
        } else if edit.is_empty() {
            result.push_unapplied(
                edit.finding,
                UnappliedReason::NotApplicable("edit has no parts".to_string()),
            );
        } else if let Some(reason) = edit
            .parts
            .iter()
            .find_map(|part| resolve(&original, part, TextSize::from(0)).err())
        {
            debug!(rule = edit.rule_id(), reason, "Edit target vanished");
            result.needs_retry = true;
            result.push_unapplied(edit.finding, UnappliedReason::TargetVanished);
        } else {
            accepted.push(edit);
        }
    }

    cancel.check()?;
    if accepted.is_empty() {
        return Ok(result);
    }

    let mut parts: Vec<(&'static str, &EditPart)> = accepted
        .iter()
        .flat_map(|edit| edit.parts.iter().map(move |part| (edit.rule_id(), part)))
        .collect();
    // Rightmost first; at a shared start the insertion goes first.
    parts.sort_by_key(|(_, part)| (Reverse(part.range.start()), part.range.end()));
    for pair in parts.windows(2) {
        let (later, earlier) = (pair[0].1.range, pair[1].1.range);
        assert!(
            earlier.end() <= later.start() || (later.start() == earlier.start() && later.is_empty()),
            "overlapping edit parts reached the folding pass: {earlier:?} and {later:?}"
        );
    }

    let mut root = original;
    // Text inserted at an offset moves later parts starting at that offset.
    let mut inserted_at: Option<(TextSize, TextSize)> = None;
    for (rule_id, part) in parts {
        let start = part.range.start();
        let shift = match inserted_at {
            Some((at, len)) if at == start => len,
            _ => TextSize::from(0),
        };
        let target = resolve(&root, part, shift).map_err(|reason| {
            SharpstyleError::internal_error(format!(
                "validated edit for {rule_id} failed to resolve: {reason}"
            ))
        })?;
        let (green, replacement) = fold(part, target)?;
        trace!(rule = rule_id, range = ?part.range, replacement, "Folded edit part");

        if part.range.is_empty() {
            let inserted = TextSize::of(replacement.as_str());
            inserted_at = Some((start, shift + inserted));
        }
        result.edits.push(AppliedEdit {
            rule_id,
            range: part.range,
            replacement,
        });
        root = SyntaxNode::new_root(green);
    }

    result.edits.reverse();
    result.offsets = OffsetMap::from_applied(&result.edits);
    result.applied = accepted.into_iter().map(|edit| edit.finding).collect();
    result.unit = unit.with_root(&root);
    debug!(
        applied = result.applied.len(),
        unapplied = result.unapplied.len(),
        "Folded edit batch"
    );
    Ok(result)
}

/// Where a part lands in a concrete tree
enum Target {
    Node(SyntaxNode),
    Token(SyntaxToken),
    Children(SyntaxNode, Range<usize>),
    After(SyntaxToken),
}

fn resolve(
    root: &SyntaxNode,
    part: &EditPart,
    shift: TextSize,
) -> std::result::Result<Target, &'static str> {
    let range = part.range + shift;
    if range.end() > root.text_range().end() {
        return Err("range is past the end of the tree");
    }

    match &part.kind {
        EditKind::ReplaceNode { kind, .. } => {
            let start = match root.covering_element(range) {
                NodeOrToken::Node(node) => Some(node),
                NodeOrToken::Token(token) => token.parent(),
            };
            start
                .into_iter()
                .flat_map(|node| node.ancestors())
                .take_while(|node| node.text_range() == range)
                .find(|node| node.kind() == *kind)
                .map(Target::Node)
                .ok_or("no node of the expected kind spans the range")
        }
        EditKind::ReplaceTokens { .. } => {
            if range.is_empty() {
                return Err("empty replacement range");
            }
            let parent = match root.covering_element(range) {
                NodeOrToken::Token(token) if token.text_range() == range => {
                    return Ok(Target::Token(token));
                }
                NodeOrToken::Token(_) => return Err("range splits a token"),
                NodeOrToken::Node(node) if node.text_range() == range && node.parent().is_some() => {
                    return Ok(Target::Node(node));
                }
                NodeOrToken::Node(node) => node,
            };
            let mut first = None;
            let mut last = None;
            for (index, child) in parent.children_with_tokens().enumerate() {
                let child_range = child.text_range();
                if child_range.start() == range.start() {
                    first = Some(index);
                }
                if child_range.end() == range.end() {
                    last = Some(index);
                }
            }
            match (first, last) {
                (Some(first), Some(last)) if first <= last => {
                    Ok(Target::Children(parent, first..last + 1))
                }
                _ => Err("range does not cover whole siblings"),
            }
        }
        EditKind::RemoveToken { kind, .. } => match root.covering_element(range) {
            NodeOrToken::Token(token) if token.kind() == *kind && token.text_range() == range => {
                Ok(Target::Token(token))
            }
            _ => Err("no token of the expected kind spans the range"),
        },
        EditKind::InsertAfter { anchor, .. } => root
            .token_at_offset(range.start())
            .left_biased()
            .filter(|token| token.kind() == *anchor && token.text_range().end() == range.start())
            .map(Target::After)
            .ok_or("anchor token not found"),
    }
}

/// Apply one resolved part; returns the new root and the inserted text
fn fold(part: &EditPart, target: Target) -> Result<(GreenNode, String)> {
    let folded = match (target, &part.kind) {
        (Target::Node(node), EditKind::ReplaceNode { replacement, .. }) => match node.parent() {
            Some(parent) => splice(
                &parent,
                node.index()..node.index() + 1,
                vec![NodeOrToken::Node(replacement.clone())],
            ),
            None => (replacement.clone(), replacement.to_string()),
        },
        (Target::Node(node), EditKind::ReplaceTokens { replacement }) => {
            let Some(parent) = node.parent() else {
                return Err(SharpstyleError::internal_error("cannot splice around the root"));
            };
            splice(&parent, node.index()..node.index() + 1, replacement.clone())
        }
        (Target::Token(token), EditKind::ReplaceTokens { replacement }) => {
            splice_token(&token, replacement.clone())?
        }
        (Target::Children(parent, children), EditKind::ReplaceTokens { replacement }) => {
            splice(&parent, children, replacement.clone())
        }
        (Target::Token(token), EditKind::RemoveToken { unwrap_parent, .. }) => {
            let elements = if removal_fuses(&token) {
                vec![green_token(SyntaxKind::Whitespace, " ")]
            } else {
                Vec::new()
            };
            let text = elements.iter().map(element_text).collect::<String>();
            let Some(parent) = token.parent() else {
                return Err(SharpstyleError::internal_error("detached token"));
            };
            let index = token.index();
            let remaining = parent.green().splice_children(index..index + 1, elements);
            match parent.parent() {
                Some(grandparent) if *unwrap_parent && !has_significant_token(&remaining) => {
                    let at = parent.index();
                    let children = remaining.children().map(|child| child.to_owned());
                    let green = grandparent.green().splice_children(at..at + 1, children);
                    (grandparent.replace_with(green), text)
                }
                _ => (parent.replace_with(remaining), text),
            }
        }
        (Target::After(token), EditKind::InsertAfter { elements, .. }) => {
            let Some(parent) = token.parent() else {
                return Err(SharpstyleError::internal_error("detached anchor token"));
            };
            let index = token.index() + 1;
            splice(&parent, index..index, elements.clone())
        }
        _ => {
            return Err(SharpstyleError::internal_error(
                "edit part resolved to a target of the wrong shape",
            ));
        }
    };
    Ok(folded)
}

fn splice_token(token: &SyntaxToken, elements: Vec<GreenElement>) -> Result<(GreenNode, String)> {
    let Some(parent) = token.parent() else {
        return Err(SharpstyleError::internal_error("detached token"));
    };
    Ok(splice(&parent, token.index()..token.index() + 1, elements))
}

fn splice(parent: &SyntaxNode, children: Range<usize>, elements: Vec<GreenElement>) -> (GreenNode, String) {
    let text = elements.iter().map(element_text).collect();
    let green = parent.green().splice_children(children, elements);
    (parent.replace_with(green), text)
}

fn has_significant_token(node: &GreenNode) -> bool {
    node.children().any(|child| match child {
        NodeOrToken::Token(token) => {
            !SyntaxKind::from_raw(token.kind().0).is_some_and(SyntaxKind::is_trivia)
        }
        NodeOrToken::Node(_) => false,
    })
}

/// Whether the tokens around `token` would lex differently once it is gone
fn removal_fuses(token: &SyntaxToken) -> bool {
    let (Some(left), Some(right)) = (token.prev_token(), token.next_token()) else {
        return false;
    };
    if left.kind().is_trivia() || right.kind().is_trivia() {
        return false;
    }
    let joined = format!("{}{}", left.text(), right.text());
    let (tokens, errors) = lex_with_trivia(&joined);
    !(errors.is_empty()
        && tokens.len() == 2
        && tokens[0].text == left.text()
        && tokens[1].text == right.text())
}

/// Render a plain unified diff of two texts
pub fn unified_diff(original: &str, modified: &str, label: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let mut output = String::new();
    if original == modified {
        return output;
    }
    let diff = TextDiff::from_lines(original, modified);

    output.push_str(&format!("--- {label}\n"));
    output.push_str(&format!("+++ {label} (fixed)\n"));

    for group in diff.grouped_ops(3) {
        let Some(first) = group.first() else {
            continue;
        };
        let old_len = group.iter().map(|op| op.old_range().len()).sum::<usize>();
        let new_len = group.iter().map(|op| op.new_range().len()).sum::<usize>();
        output.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            first.old_range().start + 1,
            old_len,
            first.new_range().start + 1,
            new_len
        ));

        for op in &group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                output.push(sign);
                output.push_str(change.value());
                if !change.value().ends_with('\n') {
                    output.push('\n');
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(source: &str) -> SourceUnit {
        SourceUnit::parse(source).0
    }

    fn token(unit: &SourceUnit, kind: SyntaxKind, nth: usize) -> SyntaxToken {
        unit.root()
            .descendants_with_tokens()
            .filter_map(|element| element.into_token())
            .filter(|token| token.kind() == kind)
            .nth(nth)
            .unwrap()
    }

    fn finding(rule_id: &'static str, range: TextRange) -> Finding {
        Finding::new(rule_id, range)
    }

    #[test]
    fn test_remove_parens_inserts_space_where_tokens_would_fuse() {
        let unit = unit("class C { int M(int x) { return((x)); } }");
        let open_outer = token(&unit, SyntaxKind::LParen, 1);
        let open_inner = token(&unit, SyntaxKind::LParen, 2);
        let close_inner = token(&unit, SyntaxKind::RParen, 1);
        let close_outer = token(&unit, SyntaxKind::RParen, 2);

        let outer = Edit::new(finding("SA1119", open_outer.text_range()))
            .remove_delimiter(&open_outer)
            .remove_delimiter(&close_outer);
        let inner = Edit::new(finding("SA1119", open_inner.text_range()))
            .remove_delimiter(&open_inner)
            .remove_delimiter(&close_inner);

        let result = apply_edits(&unit, vec![outer, inner], &CancellationToken::new()).unwrap();
        assert_eq!(result.unit.text(), "class C { int M(int x) { return x; } }");
        assert!(
            result
                .unit
                .root()
                .descendants()
                .all(|node| node.kind() != SyntaxKind::ParenExpr)
        );
        assert_eq!(result.applied.len(), 2);
        assert!(result.unapplied.is_empty());
        assert!(!result.needs_retry);
    }

    #[test]
    fn test_insert_and_removal_at_same_offset_fold_cleanly() {
        let unit = unit("class C { int M(int x) { return(x); } }");
        let keyword = token(&unit, SyntaxKind::ReturnKw, 0);
        let open = token(&unit, SyntaxKind::LParen, 1);
        let close = token(&unit, SyntaxKind::RParen, 1);

        let spacing = Edit::new(finding("SA1000", TextRange::empty(keyword.text_range().end())))
            .insert_token_after(&keyword, SyntaxKind::Whitespace, " ");
        let parens = Edit::new(finding("SA1119", open.text_range()))
            .remove_delimiter(&open)
            .remove_delimiter(&close);

        let result = apply_edits(&unit, vec![spacing, parens], &CancellationToken::new()).unwrap();
        assert_eq!(result.unit.text(), "class C { int M(int x) { return x; } }");
        assert!(result.unapplied.is_empty());
    }

    #[test]
    fn test_overlapping_edits_are_both_left_unfixed() {
        let unit = unit("class C { void M() { a = b; } }");
        let name = token(&unit, SyntaxKind::Ident, 2);

        let first = Edit::new(finding("SA0001", name.text_range())).replace_tokens(
            name.text_range(),
            vec![green_token(SyntaxKind::Ident, "x")],
        );
        let second = Edit::new(finding("SA0002", name.text_range())).remove_token(&name);
        let keyword = token(&unit, SyntaxKind::VoidKw, 0);
        let third = Edit::new(finding("SA0003", keyword.text_range())).replace_tokens(
            keyword.text_range(),
            vec![green_token(SyntaxKind::IntKw, "int")],
        );

        let result =
            apply_edits(&unit, vec![first, second, third], &CancellationToken::new()).unwrap();
        assert_eq!(result.unit.text(), "class C { int M() { a = b; } }");
        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.conflicts().count(), 2);
        assert_eq!(
            result.unapplied[0].reason,
            UnappliedReason::Conflict { with: "SA0002" }
        );
    }

    #[test]
    fn test_vanished_target_requests_retry() {
        let unit = unit("class C { }");
        let stale = Edit::new(finding("SA0001", TextRange::new(6.into(), 7.into())))
            .replace_tokens(TextRange::new(20.into(), 21.into()), Vec::new());

        let result = apply_edits(&unit, vec![stale], &CancellationToken::new()).unwrap();
        assert!(result.needs_retry);
        assert_eq!(result.unapplied[0].reason, UnappliedReason::TargetVanished);
        assert_eq!(result.unit.text(), "class C { }");
    }

    #[test]
    fn test_replace_node() {
        let unit = unit("class C { int M() { return (1); } }");
        let paren = unit
            .root()
            .descendants()
            .find(|node| node.kind() == SyntaxKind::ParenExpr)
            .unwrap();
        let literal = paren
            .children()
            .next()
            .unwrap()
            .green()
            .into_owned();

        let edit = Edit::new(finding("SA1119", paren.text_range())).replace_node(&paren, literal);
        let result = apply_edits(&unit, vec![edit], &CancellationToken::new()).unwrap();
        assert_eq!(result.unit.text(), "class C { int M() { return 1; } }");
        assert_eq!(result.edits[0].replacement, "1");
    }

    #[test]
    fn test_cancelled_batch_is_not_folded() {
        let unit = unit("class C { }");
        let keyword = token(&unit, SyntaxKind::ClassKw, 0);
        let edit = Edit::new(finding("SA0001", keyword.text_range()))
            .insert_token_after(&keyword, SyntaxKind::Whitespace, " ");
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(apply_edits(&unit, vec![edit], &cancel).is_err());
    }

    #[test]
    fn test_offset_map() {
        let applied = vec![
            AppliedEdit {
                rule_id: "SA1000",
                range: TextRange::empty(2.into()),
                replacement: " ".to_string(),
            },
            AppliedEdit {
                rule_id: "SA1119",
                range: TextRange::new(5.into(), 6.into()),
                replacement: String::new(),
            },
        ];
        let map = OffsetMap::from_applied(&applied);

        assert_eq!(map.map(1.into()), TextSize::from(1));
        assert_eq!(map.map(2.into()), TextSize::from(2));
        assert_eq!(map.map(3.into()), TextSize::from(4));
        assert_eq!(map.map(6.into()), TextSize::from(6));
        assert_eq!(map.map(9.into()), TextSize::from(9));
        assert_eq!(
            map.map_range(TextRange::new(4.into(), 7.into())),
            TextRange::new(5.into(), 7.into())
        );
    }

    #[test]
    fn test_ranges_conflict() {
        let range = |start: u32, end: u32| TextRange::new(start.into(), end.into());
        assert!(ranges_conflict(range(0, 5), range(4, 6)));
        assert!(!ranges_conflict(range(0, 5), range(5, 6)));
        assert!(ranges_conflict(range(3, 3), range(3, 3)));
        assert!(ranges_conflict(range(3, 3), range(1, 5)));
        assert!(!ranges_conflict(range(3, 3), range(3, 5)));
        assert!(!ranges_conflict(range(1, 3), range(3, 3)));
    }

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff("if(x)\n{\n}\n", "if (x)\n{\n}\n", "Demo.cs");
        insta::assert_snapshot!(diff, @r"
        --- Demo.cs
        +++ Demo.cs (fixed)
        @@ -1,3 +1,3 @@
        -if(x)
        +if (x)
         {
         }
        ");
        assert!(unified_diff("same", "same", "Demo.cs").is_empty());
    }
}
