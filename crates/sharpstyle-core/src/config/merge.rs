//! Configuration merging logic
//!
//! Hosts layer configurations (built-in defaults, a solution-wide file, a
//! project override). The receiver always wins; missing values are filled
//! from the other configuration.

use super::engine_config::*;

impl EngineConfiguration {
    /// Merge another config into this one (current takes precedence)
    pub fn merge_with(&mut self, other: EngineConfiguration) {
        if let Some(other_rules) = other.rules {
            match self.rules {
                Some(ref mut rules) => {
                    for (rule, severity) in other_rules {
                        rules.entry(rule).or_insert(severity);
                    }
                }
                None => self.rules = Some(other_rules),
            }
        }

        if let Some(other_exemptions) = other.exemptions {
            match self.exemptions {
                Some(ref mut exemptions) => exemptions.merge_with(other_exemptions),
                None => self.exemptions = Some(other_exemptions),
            }
        }

        if let Some(other_dispatch) = other.dispatch {
            match self.dispatch {
                Some(ref mut dispatch) => {
                    if dispatch.cancellation_check_interval.is_none() {
                        dispatch.cancellation_check_interval =
                            other_dispatch.cancellation_check_interval;
                    }
                }
                None => self.dispatch = Some(other_dispatch),
            }
        }

        if let Some(other_fix) = other.fix {
            match self.fix {
                Some(ref mut fix) => {
                    if fix.max_passes.is_none() {
                        fix.max_passes = other_fix.max_passes;
                    }
                    if fix.verify_idempotence.is_none() {
                        fix.verify_idempotence = other_fix.verify_idempotence;
                    }
                }
                None => self.fix = Some(other_fix),
            }
        }
    }
}

impl ExemptionsConfiguration {
    /// Patterns are appended rather than replaced
    pub fn merge_with(&mut self, other: ExemptionsConfiguration) {
        if let Some(other_patterns) = other.type_name_patterns {
            if let Some(ref mut patterns) = self.type_name_patterns {
                for pattern in other_patterns {
                    if !patterns.contains(&pattern) {
                        patterns.push(pattern);
                    }
                }
            } else {
                self.type_name_patterns = Some(other_patterns);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_rules_current_takes_precedence() {
        let mut base = EngineConfiguration::default().with_rule("SA1119", RuleSeverity::Error);
        let other = EngineConfiguration::default()
            .with_rule("SA1119", RuleSeverity::Off)
            .with_rule("SA1000", RuleSeverity::Warn);

        base.merge_with(other);

        assert_eq!(base.rule_severity("SA1119"), Some(RuleSeverity::Error));
        assert_eq!(base.rule_severity("SA1000"), Some(RuleSeverity::Warn));
    }

    #[test]
    fn test_merge_exemptions_appends_unique_patterns() {
        let mut base = ExemptionsConfiguration {
            type_name_patterns: Some(vec!["NativeMethods$".to_string()]),
        };
        base.merge_with(ExemptionsConfiguration {
            type_name_patterns: Some(vec!["NativeMethods$".to_string(), "^Interop".to_string()]),
        });

        assert_eq!(base.type_name_patterns.unwrap().len(), 2);
    }

    #[test]
    fn test_merge_fills_missing_sections() {
        let mut base = EngineConfiguration {
            fix: Some(FixConfiguration {
                max_passes: Some(5),
                verify_idempotence: None,
            }),
            ..Default::default()
        };
        let other = EngineConfiguration {
            dispatch: Some(DispatchConfiguration {
                cancellation_check_interval: Some(64),
            }),
            fix: Some(FixConfiguration {
                max_passes: Some(1),
                verify_idempotence: Some(false),
            }),
            ..Default::default()
        };

        base.merge_with(other);

        assert_eq!(base.max_passes(), 5);
        assert!(!base.verify_idempotence());
        assert_eq!(base.cancellation_check_interval(), 64);
    }
}
