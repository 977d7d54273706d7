//! Fix engine
//!
//! Turns findings into edits through the registered fixers, folds each batch
//! into a new tree and repeats dispatch and fixing until nothing changes or
//! the pass limit is reached. The input tree is never modified.

use std::panic::{AssertUnwindSafe, catch_unwind};

use rowan::TextRange;
use sharpstyle_core::{
    CancellationToken, Edit, Finding, FixError, Result, RewriteResult, SharpstyleError,
    SourceUnit, UnappliedFix, UnappliedReason, apply_edits, unified_diff,
};
use tracing::{debug, info, warn};

use crate::dispatcher::{Dispatcher, panic_message};
use crate::harness::{ConsistencyHarness, ParseHook, same_location};
use crate::registry::{FixFn, RuleRegistry};

/// Everything `fix_all` did to one unit
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// The final tree
    pub unit: SourceUnit,
    /// One result per pass that produced edits
    pub passes: Vec<RewriteResult>,
    /// Findings still present in `unit`, with the reason each was left
    pub unapplied: Vec<UnappliedFix>,
}

impl FixOutcome {
    pub fn is_changed(&self) -> bool {
        self.passes.iter().any(RewriteResult::is_changed)
    }

    /// Number of findings fixed over all passes
    pub fn fixed_count(&self) -> usize {
        self.passes.iter().map(|pass| pass.applied.len()).sum()
    }

    /// Conflicts and non-idempotent fixes as engine errors, located in the
    /// final tree
    pub fn defects(&self) -> Vec<SharpstyleError> {
        self.unapplied
            .iter()
            .filter_map(|fix| {
                let location = self.unit.location(fix.finding.primary_span());
                match &fix.reason {
                    UnappliedReason::Conflict { with } => Some(SharpstyleError::fix_conflict(
                        fix.finding.rule_id(),
                        *with,
                        location,
                    )),
                    UnappliedReason::NonIdempotent => Some(SharpstyleError::fix_non_idempotent(
                        fix.finding.rule_id(),
                        location,
                    )),
                    _ => None,
                }
            })
            .collect()
    }

    /// Unified diff from `original` to the final text
    pub fn diff(&self, original: &SourceUnit) -> String {
        let label = original
            .path()
            .map_or_else(|| "<source>".to_string(), |path| path.display().to_string());
        unified_diff(original.text(), self.unit.text(), &label)
    }
}

/// Applies rule fixes to source units
#[derive(Clone)]
pub struct FixEngine<'r> {
    registry: &'r RuleRegistry,
    harness: ConsistencyHarness<'r>,
    cancel: CancellationToken,
    max_passes: usize,
    verify: bool,
}

impl<'r> FixEngine<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        let config = registry.config();
        Self {
            registry,
            harness: ConsistencyHarness::new(registry),
            cancel: CancellationToken::new(),
            max_passes: config.max_passes().max(1),
            verify: config.verify_idempotence(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.harness = self.harness.with_cancellation(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// Parser used to verify rewritten text
    pub fn with_parse_hook(mut self, parse: ParseHook) -> Self {
        self.harness = self.harness.with_parse_hook(parse);
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Fix a single finding
    pub fn apply_fix(
        &self,
        unit: &SourceUnit,
        finding: &Finding,
    ) -> std::result::Result<SourceUnit, FixError> {
        let fix = self
            .registry
            .fix_for(finding.rule_id())
            .ok_or_else(|| FixError::not_applicable(finding.rule_id(), "rule has no fix"))?;
        if finding.is_auxiliary() {
            return Err(FixError::not_applicable(finding.rule_id(), "auxiliary finding"));
        }

        let edit = self.run_fix(fix, unit, finding)?;
        let result = self.fold(unit, vec![edit])?;
        if let Some(unapplied) = result.unapplied.first() {
            return Err(FixError::not_applicable(
                finding.rule_id(),
                unapplied.reason.to_string(),
            ));
        }
        Ok(result.unit)
    }

    /// Fix a batch of findings of one tree in a single rewrite
    ///
    /// Findings whose fix declines, conflicts or has no target are reported
    /// as unapplied. With verification on, applied findings that are still
    /// reported afterwards move to unapplied as non-idempotent, and a rewrite
    /// that fails the lossless or reparse check is an error.
    pub fn fix_batch(&self, unit: &SourceUnit, findings: &[Finding]) -> Result<RewriteResult> {
        let mut edits = Vec::new();
        let mut skipped = Vec::new();
        for finding in findings.iter().filter(|finding| !finding.is_auxiliary()) {
            let Some(fix) = self.registry.fix_for(finding.rule_id()) else {
                skipped.push((finding.clone(), UnappliedReason::NoFix));
                continue;
            };
            match self.run_fix(fix, unit, finding) {
                Ok(edit) => edits.push(edit),
                Err(FixError::NotApplicable { reason, .. }) => {
                    debug!(rule = finding.rule_id(), reason, "Fix not applicable");
                    skipped.push((finding.clone(), UnappliedReason::NotApplicable(reason)));
                }
                Err(FixError::Fault(err)) => return Err(err),
            }
        }

        let mut result = self.fold(unit, edits)?;
        for (finding, reason) in skipped {
            result.push_unapplied(finding, reason);
        }
        if !self.verify || !result.is_changed() {
            return Ok(result);
        }

        let report = self.harness.check(unit, &result)?;
        if let Some(issue) = report.mismatch() {
            return Err(issue.to_error(unit));
        }
        let stuck: Vec<Finding> = report.non_idempotent().cloned().collect();
        for finding in stuck {
            warn!(
                rule = finding.rule_id(),
                location = %unit.location(finding.primary_span()),
                "Fix is not idempotent; leaving the finding"
            );
            result.applied.retain(|applied| applied != &finding);
            result.push_unapplied(finding, UnappliedReason::NonIdempotent);
        }
        Ok(result)
    }

    /// Dispatch and fix until the tree stops changing
    ///
    /// Each pass fixes every fixable finding of the current tree in one
    /// batch. Findings that proved non-idempotent are not retried. After the
    /// last pass every finding still present is reported with its reason.
    pub fn fix_all(&self, unit: &SourceUnit) -> Result<FixOutcome> {
        let span = tracing::debug_span!("fix_all", path = ?unit.path());
        let _guard = span.enter();

        let dispatcher = Dispatcher::new(self.registry).with_cancellation(self.cancel.clone());
        let mut current = unit.clone();
        let mut passes: Vec<RewriteResult> = Vec::new();
        // Non-idempotent instances, in coordinates of `current`
        let mut blocked: Vec<(&'static str, TextRange)> = Vec::new();
        // Why findings were left by the latest pass, in coordinates of `current`
        let mut left: Vec<(&'static str, TextRange, UnappliedReason)> = Vec::new();
        let mut findings = dispatcher.collect_primary(&current)?;

        while passes.len() < self.max_passes {
            let fixable: Vec<Finding> = findings
                .iter()
                .filter(|finding| self.registry.fix_for(finding.rule_id()).is_some())
                .filter(|finding| !is_blocked(&blocked, finding))
                .cloned()
                .collect();
            if fixable.is_empty() {
                break;
            }

            let result = self.fix_batch(&current, &fixable)?;
            let offsets = &result.offsets;
            for (_, range) in &mut blocked {
                *range = offsets.map_range(*range);
            }
            left.clear();
            for unapplied in &result.unapplied {
                let rule_id = unapplied.finding.rule_id();
                let range = offsets.map_range(unapplied.finding.primary_span());
                if unapplied.reason == UnappliedReason::NonIdempotent {
                    blocked.push((rule_id, range));
                } else {
                    left.push((rule_id, range, unapplied.reason.clone()));
                }
            }

            let changed = result.is_changed();
            debug!(
                pass = passes.len() + 1,
                applied = result.applied.len(),
                unapplied = result.unapplied.len(),
                "Fix pass complete"
            );
            current = result.unit.clone();
            passes.push(result);
            if !changed {
                break;
            }
            findings = dispatcher.collect_primary(&current)?;
        }

        let unapplied = findings
            .into_iter()
            .map(|finding| {
                let reason = self.reason_left(&finding, &blocked, &left);
                UnappliedFix { finding, reason }
            })
            .collect::<Vec<_>>();

        let fixed: usize = passes.iter().map(|pass| pass.applied.len()).sum();
        if fixed > 0 {
            info!(
                path = ?unit.path(),
                "Fixed {} findings in {} passes, {} left",
                fixed,
                passes.len(),
                unapplied.len()
            );
        }
        Ok(FixOutcome {
            unit: current,
            passes,
            unapplied,
        })
    }

    fn reason_left(
        &self,
        finding: &Finding,
        blocked: &[(&'static str, TextRange)],
        left: &[(&'static str, TextRange, UnappliedReason)],
    ) -> UnappliedReason {
        if self.registry.fix_for(finding.rule_id()).is_none() {
            return UnappliedReason::NoFix;
        }
        if is_blocked(blocked, finding) {
            return UnappliedReason::NonIdempotent;
        }
        left.iter()
            .find(|(rule_id, range, _)| {
                *rule_id == finding.rule_id() && *range == finding.primary_span()
            })
            .map_or(UnappliedReason::PassLimit, |(_, _, reason)| reason.clone())
    }

    /// Fold a batch; a panic while folding is an internal error
    fn fold(&self, unit: &SourceUnit, edits: Vec<Edit>) -> Result<RewriteResult> {
        catch_unwind(AssertUnwindSafe(|| apply_edits(unit, edits, &self.cancel))).unwrap_or_else(
            |payload| {
                Err(SharpstyleError::internal_error(format!(
                    "panic while folding edits: {}",
                    panic_message(payload.as_ref())
                )))
            },
        )
    }

    /// Run one fixer, turning failures and panics into an engine fault
    fn run_fix(
        &self,
        fix: FixFn,
        unit: &SourceUnit,
        finding: &Finding,
    ) -> std::result::Result<Edit, FixError> {
        let root = unit.root();
        let outcome = catch_unwind(AssertUnwindSafe(|| fix(&root, finding)));
        let message = match outcome {
            Ok(Ok(edit)) => return Ok(edit),
            Ok(Err(err @ FixError::NotApplicable { .. })) => return Err(err),
            Ok(Err(FixError::Fault(SharpstyleError::Cancelled))) => {
                return Err(SharpstyleError::Cancelled.into());
            }
            Ok(Err(FixError::Fault(err @ SharpstyleError::EngineFault { .. }))) => {
                return Err(err.into());
            }
            Ok(Err(FixError::Fault(err))) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let location = unit.location(finding.primary_span());
        warn!(rule = finding.rule_id(), %location, "Fix failed: {}", message);
        Err(SharpstyleError::engine_fault(finding.rule_id(), location, message).into())
    }
}

fn is_blocked(blocked: &[(&'static str, TextRange)], finding: &Finding) -> bool {
    blocked.iter().any(|(rule_id, range)| {
        *rule_id == finding.rule_id() && same_location(*range, finding.primary_span())
    })
}
