//! Single-pass rule dispatch
//!
//! The dispatcher walks a tree once in pre-order, tokens included, and runs
//! every check registered for the kind of each element. Findings come out
//! lazily and in traversal order, so two runs over the same tree yield the
//! same sequence.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rowan::WalkEvent;
use sharpstyle_core::{
    CancellationToken, Finding, Result, SharpstyleError, SourceUnit, SyntaxElement,
};
use tracing::{debug, trace, warn};

use crate::registry::{CheckContext, Rule, RuleRegistry, Verdict};

/// Runs the registered checks over source units
#[derive(Clone)]
pub struct Dispatcher<'r> {
    registry: &'r RuleRegistry,
    cancel: CancellationToken,
    only: Option<Vec<&'static str>>,
    check_interval: usize,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            cancel: CancellationToken::new(),
            only: None,
            check_interval: registry.config().cancellation_check_interval().max(1),
        }
    }

    /// Poll `cancel` while walking
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run only the given rules
    pub fn restrict_to(mut self, rule_ids: impl IntoIterator<Item = &'static str>) -> Self {
        self.only = Some(rule_ids.into_iter().collect());
        self
    }

    pub fn registry(&self) -> &'r RuleRegistry {
        self.registry
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Lazily dispatch over one unit
    pub fn run<'u>(&self, unit: &'u SourceUnit) -> Findings<'r, 'u> {
        Findings {
            registry: self.registry,
            unit,
            walk: Box::new(unit.root().preorder_with_tokens()),
            pending: VecDeque::new(),
            only: self.only.clone(),
            cancel: self.cancel.clone(),
            check_interval: self.check_interval,
            visited: 0,
            done: false,
        }
    }

    /// Every finding of one unit, or the first failure
    ///
    /// Findings produced before a failure are discarded.
    pub fn collect(&self, unit: &SourceUnit) -> Result<Vec<Finding>> {
        let span = tracing::debug_span!("dispatch", path = ?unit.path());
        let _guard = span.enter();

        let findings = self.run(unit).collect::<Result<Vec<_>>>()?;
        debug!(findings = findings.len(), "Dispatch complete");
        Ok(findings)
    }

    /// User-facing findings only; auxiliary markers are dropped
    pub fn collect_primary(&self, unit: &SourceUnit) -> Result<Vec<Finding>> {
        let mut findings = self.collect(unit)?;
        findings.retain(|finding| !finding.is_auxiliary());
        Ok(findings)
    }
}

/// Lazy sequence of findings for one unit
///
/// Yields `Err` at most once: on cancellation or when a check fails. The
/// iterator is exhausted afterwards.
pub struct Findings<'r, 'u> {
    registry: &'r RuleRegistry,
    unit: &'u SourceUnit,
    walk: Box<dyn Iterator<Item = WalkEvent<SyntaxElement>>>,
    pending: VecDeque<Finding>,
    only: Option<Vec<&'static str>>,
    cancel: CancellationToken,
    check_interval: usize,
    visited: usize,
    done: bool,
}

impl Findings<'_, '_> {
    fn fail(&mut self, err: SharpstyleError) -> Option<Result<Finding>> {
        self.done = true;
        self.pending.clear();
        Some(Err(err))
    }

    fn is_selected(&self, rule: &Rule) -> bool {
        self.only
            .as_ref()
            .is_none_or(|only| only.contains(&rule.id()))
    }

    fn visit(&mut self, element: &SyntaxElement) -> Result<()> {
        let registry = self.registry;
        let context = CheckContext {
            unit: self.unit,
            exemptions: registry.exemptions(),
        };
        for rule in registry.rules_for(element.kind()) {
            if !self.is_selected(rule) {
                continue;
            }
            match run_check(rule, element, &context)? {
                Verdict::Violations(findings) => {
                    trace!(rule = rule.id(), count = findings.len(), "Check reported findings");
                    self.pending.extend(findings);
                }
                Verdict::Clean | Verdict::NotApplicable => {}
            }
        }
        Ok(())
    }
}

impl Iterator for Findings<'_, '_> {
    type Item = Result<Finding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(finding) = self.pending.pop_front() {
                return Some(Ok(finding));
            }
            if self.done {
                return None;
            }

            if self.visited % self.check_interval == 0
                && let Err(err) = self.cancel.check()
            {
                debug!(visited = self.visited, "Dispatch cancelled");
                return self.fail(err);
            }

            let Some(event) = self.walk.next() else {
                self.done = true;
                continue;
            };
            let WalkEvent::Enter(element) = event else {
                continue;
            };
            self.visited += 1;

            if let Err(err) = self.visit(&element) {
                return self.fail(err);
            }
        }
    }
}

/// Run one check, turning failures and panics into an engine fault
fn run_check(rule: &Rule, element: &SyntaxElement, context: &CheckContext<'_>) -> Result<Verdict> {
    let outcome = catch_unwind(AssertUnwindSafe(|| (rule.check)(element, context)));
    let message = match outcome {
        Ok(Ok(verdict)) => return Ok(verdict),
        Ok(Err(SharpstyleError::Cancelled)) => return Err(SharpstyleError::Cancelled),
        Ok(Err(err @ SharpstyleError::EngineFault { .. })) => return Err(err),
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    let location = context.unit.location(element.text_range());
    warn!(rule = rule.id(), %location, "Rule check failed: {}", message);
    Err(SharpstyleError::engine_fault(rule.id(), location, message))
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
