//! Configuration types for the engine

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of dispatched elements between cancellation checks
pub const DEFAULT_CANCELLATION_CHECK_INTERVAL: usize = 1024;
/// Default number of dispatch/fix passes in `fix_all`
pub const DEFAULT_MAX_PASSES: usize = 3;

/// Immutable engine configuration, built once and shared by reference
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfiguration {
    /// Per-rule severity; rules set to `off` are not registered
    #[schemars(description = "Severity per rule id, e.g. { \"SA1119\": \"off\" }")]
    pub rules: Option<IndexMap<String, RuleSeverity>>,

    /// Host exemptions
    #[schemars(description = "Declarations exempt from naming rules")]
    pub exemptions: Option<ExemptionsConfiguration>,

    /// Dispatcher tuning
    #[schemars(description = "Rule dispatch settings")]
    pub dispatch: Option<DispatchConfiguration>,

    /// Fix engine settings
    #[schemars(description = "Fix engine settings")]
    pub fix: Option<FixConfiguration>,
}

/// Rule severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Disable the rule
    Off,
    /// Informational message
    Info,
    /// Warning (doesn't fail build)
    Warn,
    /// Error (fails build)
    Error,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExemptionsConfiguration {
    /// Regular expressions matched against enclosing type names
    #[schemars(description = "Type name patterns whose members are exempt, e.g. \"NativeMethods$\"")]
    pub type_name_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DispatchConfiguration {
    /// Elements visited between two cancellation checks
    #[schemars(description = "Number of syntax elements visited between cancellation checks")]
    pub cancellation_check_interval: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixConfiguration {
    /// Upper bound on dispatch/fix passes
    #[schemars(description = "Maximum number of dispatch and fix passes per file")]
    pub max_passes: Option<usize>,

    /// Re-dispatch touched rules after a batch
    #[schemars(description = "Verify that fixed findings are not reported again")]
    pub verify_idempotence: Option<bool>,
}

impl EngineConfiguration {
    /// Configured severity of a rule, if any
    pub fn rule_severity(&self, rule_id: &str) -> Option<RuleSeverity> {
        self.rules.as_ref()?.get(rule_id).copied()
    }

    /// Rules are enabled unless explicitly turned off
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rule_severity(rule_id) != Some(RuleSeverity::Off)
    }

    pub fn type_name_patterns(&self) -> &[String] {
        self.exemptions
            .as_ref()
            .and_then(|exemptions| exemptions.type_name_patterns.as_deref())
            .unwrap_or_default()
    }

    pub fn cancellation_check_interval(&self) -> usize {
        self.dispatch
            .as_ref()
            .and_then(|dispatch| dispatch.cancellation_check_interval)
            .unwrap_or(DEFAULT_CANCELLATION_CHECK_INTERVAL)
    }

    pub fn max_passes(&self) -> usize {
        self.fix
            .as_ref()
            .and_then(|fix| fix.max_passes)
            .unwrap_or(DEFAULT_MAX_PASSES)
    }

    pub fn verify_idempotence(&self) -> bool {
        self.fix
            .as_ref()
            .and_then(|fix| fix.verify_idempotence)
            .unwrap_or(true)
    }

    /// Builder-style severity override, mostly for hosts and tests
    pub fn with_rule(mut self, rule_id: impl Into<String>, severity: RuleSeverity) -> Self {
        self.rules
            .get_or_insert_with(IndexMap::new)
            .insert(rule_id.into(), severity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_severity_serialization() {
        let severity = RuleSeverity::Error;
        let json = serde_json::to_string(&severity).unwrap();
        assert_eq!(json, r#""error""#);

        let severity = RuleSeverity::Off;
        let json = serde_json::to_string(&severity).unwrap();
        assert_eq!(json, r#""off""#);
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfiguration::default();
        assert!(config.is_rule_enabled("SA1119"));
        assert_eq!(config.cancellation_check_interval(), 1024);
        assert_eq!(config.max_passes(), 3);
        assert!(config.verify_idempotence());
        assert!(config.type_name_patterns().is_empty());
    }

    #[test]
    fn test_disabled_rule() {
        let config = EngineConfiguration::default()
            .with_rule("SA1000", RuleSeverity::Off)
            .with_rule("SA1119", RuleSeverity::Warn);

        assert!(!config.is_rule_enabled("SA1000"));
        assert!(config.is_rule_enabled("SA1119"));
        assert_eq!(config.rule_severity("SA1119"), Some(RuleSeverity::Warn));
        assert_eq!(config.rule_severity("SA1300"), None);
    }
}
