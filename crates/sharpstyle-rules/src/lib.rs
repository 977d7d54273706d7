//! Sharpstyle Rules
//!
//! Rule registry, single-pass dispatcher, the built-in style rules and the
//! fix engine that rewrites trees to remove their findings.
//!
//! ```rust,ignore
//! use sharpstyle_core::{EngineConfiguration, SourceUnit};
//! use sharpstyle_rules::{Dispatcher, FixEngine, RuleRegistry};
//!
//! let registry = RuleRegistry::with_builtin_rules(EngineConfiguration::default())?;
//! let (unit, _) = SourceUnit::parse("class C { void M() { if(x) return (y); } }");
//!
//! let findings = Dispatcher::new(&registry).collect(&unit)?;
//! let outcome = FixEngine::new(&registry).fix_all(&unit)?;
//! assert_eq!(outcome.unit.text(), "class C { void M() { if (x) return y; } }");
//! ```

pub mod builtin;
pub mod dispatcher;
pub mod executor;
pub mod fix;
pub mod harness;
pub mod registry;

pub use dispatcher::{Dispatcher, Findings};
pub use executor::{Executor, FileFixReport, FileReport, ProgressCallback, ProgressInfo};
pub use fix::{FixEngine, FixOutcome};
pub use harness::{ConsistencyHarness, HarnessIssue, HarnessReport, ParseHook};
pub use registry::{
    CheckContext, CheckFn, DeclarationContext, ExemptionPolicy, FixFn, NoExemptions,
    PatternExemptions, RegistryBuilder, Rule, RuleMeta, RuleRegistry, Verdict,
};
