//! Rule registry
//!
//! Rules are plain function values keyed by the syntax kinds they inspect.
//! A [`RegistryBuilder`] collects them once from the engine configuration and
//! produces an immutable [`RuleRegistry`] that is shared across threads.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use sharpstyle_core::cst::ast::{AstNode, TypeDecl};
use sharpstyle_core::{
    Edit, EngineConfiguration, Finding, FixError, Result, RuleSeverity, SourceUnit, SyntaxElement,
    SyntaxKind, SyntaxNode,
};

/// Outcome of one check on one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The element is not something this rule inspects
    NotApplicable,
    /// Inspected, no violation
    Clean,
    /// Inspected, one or more findings
    Violations(Vec<Finding>),
}

impl Verdict {
    pub fn violation(finding: Finding) -> Self {
        Verdict::Violations(vec![finding])
    }

    pub fn into_findings(self) -> Vec<Finding> {
        match self {
            Verdict::Violations(findings) => findings,
            Verdict::NotApplicable | Verdict::Clean => Vec::new(),
        }
    }
}

/// Rule check: pure function of an element and its context
pub type CheckFn =
    Arc<dyn Fn(&SyntaxElement, &CheckContext<'_>) -> Result<Verdict> + Send + Sync>;

/// Fix: pure transform from a finding to the edit removing it
pub type FixFn = fn(&SyntaxNode, &Finding) -> std::result::Result<Edit, FixError>;

/// Read-only context handed to every check
pub struct CheckContext<'a> {
    pub unit: &'a SourceUnit,
    pub exemptions: &'a dyn ExemptionPolicy,
}

impl CheckContext<'_> {
    pub fn text(&self) -> &str {
        self.unit.text()
    }
}

/// Declaration a host may exempt from naming rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationContext {
    pub kind: SyntaxKind,
    pub name: String,
    /// Enclosing type names, innermost first
    pub enclosing_types: Vec<String>,
}

impl DeclarationContext {
    pub fn of(node: &SyntaxNode, name: impl Into<String>) -> Self {
        let enclosing_types = node
            .ancestors()
            .skip(1)
            .filter_map(TypeDecl::cast)
            .filter_map(|decl| decl.name())
            .map(|token| token.text().to_string())
            .collect();
        Self {
            kind: node.kind(),
            name: name.into(),
            enclosing_types,
        }
    }
}

/// Host-supplied exemption predicate
pub trait ExemptionPolicy: Send + Sync {
    fn is_exempt(&self, declaration: &DeclarationContext) -> bool;
}

impl<F> ExemptionPolicy for F
where
    F: Fn(&DeclarationContext) -> bool + Send + Sync,
{
    fn is_exempt(&self, declaration: &DeclarationContext) -> bool {
        self(declaration)
    }
}

/// Exempts nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExemptions;

impl ExemptionPolicy for NoExemptions {
    fn is_exempt(&self, _declaration: &DeclarationContext) -> bool {
        false
    }
}

/// Exempts declarations nested in types whose name matches a pattern
#[derive(Debug, Clone, Default)]
pub struct PatternExemptions {
    patterns: Vec<Regex>,
}

impl PatternExemptions {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn from_config(config: &EngineConfiguration) -> Result<Self> {
        Self::new(config.type_name_patterns())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl ExemptionPolicy for PatternExemptions {
    fn is_exempt(&self, declaration: &DeclarationContext) -> bool {
        declaration
            .enclosing_types
            .iter()
            .any(|name| self.patterns.iter().any(|pattern| pattern.is_match(name)))
    }
}

/// Static description of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMeta {
    pub id: &'static str,
    pub name: &'static str,
    /// Message with `{0}`-style placeholders for the finding's arguments
    pub message: &'static str,
}

/// A rule ready for registration
#[derive(Clone)]
pub struct Rule {
    pub meta: RuleMeta,
    pub kinds: &'static [SyntaxKind],
    pub check: CheckFn,
    pub fix: Option<FixFn>,
}

impl Rule {
    pub fn new<F>(meta: RuleMeta, kinds: &'static [SyntaxKind], check: F) -> Self
    where
        F: Fn(&SyntaxElement, &CheckContext<'_>) -> Result<Verdict> + Send + Sync + 'static,
    {
        Self {
            meta,
            kinds,
            check: Arc::new(check),
            fix: None,
        }
    }

    pub fn with_fix(mut self, fix: FixFn) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn id(&self) -> &'static str {
        self.meta.id
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("meta", &self.meta)
            .field("kinds", &self.kinds)
            .field("fixable", &self.fix.is_some())
            .finish()
    }
}

/// Collects rules and settings, then freezes them into a [`RuleRegistry`]
pub struct RegistryBuilder {
    config: EngineConfiguration,
    rules: Vec<Rule>,
    only: Option<Vec<String>>,
    exemptions: Option<Arc<dyn ExemptionPolicy>>,
}

impl RegistryBuilder {
    pub fn new(config: EngineConfiguration) -> Self {
        Self {
            config,
            rules: Vec::new(),
            only: None,
            exemptions: None,
        }
    }

    /// Register one rule; order of registration is dispatch order
    pub fn register(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Register every built-in rule
    pub fn with_builtin_rules(mut self) -> Self {
        self.rules.extend(crate::builtin::all_rules());
        self
    }

    /// Restrict the registry to the given rule ids
    pub fn only<I, S>(mut self, rule_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(rule_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the configured pattern exemptions with a host predicate
    pub fn exemptions(mut self, policy: impl ExemptionPolicy + 'static) -> Self {
        self.exemptions = Some(Arc::new(policy));
        self
    }

    pub fn build(self) -> Result<RuleRegistry> {
        let exemptions: Arc<dyn ExemptionPolicy> = match self.exemptions {
            Some(policy) => policy,
            None => Arc::new(PatternExemptions::from_config(&self.config)?),
        };

        let mut rules: IndexMap<&'static str, Rule> = IndexMap::new();
        for rule in self.rules {
            let id = rule.id();
            if !self.config.is_rule_enabled(id) {
                tracing::debug!(rule = id, "Rule disabled by configuration");
                continue;
            }
            if let Some(only) = &self.only
                && !only.iter().any(|wanted| wanted == id)
            {
                continue;
            }
            if rules.contains_key(id) {
                tracing::warn!("Rule '{}' already registered, keeping existing", id);
                continue;
            }
            rules.insert(id, rule);
        }

        let mut by_kind: Vec<Vec<usize>> = Vec::new();
        for (index, rule) in rules.values().enumerate() {
            for kind in rule.kinds {
                let slot = *kind as usize;
                if by_kind.len() <= slot {
                    by_kind.resize_with(slot + 1, Vec::new);
                }
                by_kind[slot].push(index);
            }
        }

        tracing::debug!(rules = rules.len(), "Built rule registry");
        Ok(RuleRegistry {
            rules,
            by_kind,
            exemptions,
            config: self.config,
        })
    }
}

/// Immutable set of registered rules
pub struct RuleRegistry {
    rules: IndexMap<&'static str, Rule>,
    /// Rule indices per raw syntax kind, in registration order
    by_kind: Vec<Vec<usize>>,
    exemptions: Arc<dyn ExemptionPolicy>,
    config: EngineConfiguration,
}

impl RuleRegistry {
    /// Registry with every enabled built-in rule
    pub fn with_builtin_rules(config: EngineConfiguration) -> Result<Self> {
        RegistryBuilder::new(config).with_builtin_rules().build()
    }

    pub fn get(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.get(rule_id)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn list_ids(&self) -> Vec<&'static str> {
        self.rules.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules registered for `kind`, in registration order
    pub fn rules_for(&self, kind: SyntaxKind) -> impl Iterator<Item = &Rule> {
        self.by_kind
            .get(kind as usize)
            .into_iter()
            .flatten()
            .filter_map(|index| self.rules.get_index(*index).map(|(_, rule)| rule))
    }

    pub fn fix_for(&self, rule_id: &str) -> Option<FixFn> {
        self.rules.get(rule_id)?.fix
    }

    pub fn severity(&self, rule_id: &str) -> RuleSeverity {
        self.config
            .rule_severity(rule_id)
            .unwrap_or(RuleSeverity::Warn)
    }

    pub fn exemptions(&self) -> &dyn ExemptionPolicy {
        self.exemptions.as_ref()
    }

    pub fn config(&self) -> &EngineConfiguration {
        &self.config
    }

    /// Human-readable message for a finding
    pub fn message(&self, finding: &Finding) -> Option<String> {
        let rule = self.rules.get(finding.rule_id())?;
        Some(sharpstyle_core::format_message(
            rule.meta.message,
            finding.message_args(),
        ))
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.list_ids())
            .finish()
    }
}
