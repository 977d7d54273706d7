//! Parallel execution over many source units
//!
//! Each unit is dispatched (or fixed) independently on the rayon pool. A
//! failure or panic in one unit is recorded in that unit's report and never
//! affects the others. Reports come back in input order.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use sharpstyle_core::{
    CancellationToken, ErrorKind, FindingRecord, Result, ResultExt, SharpstyleError, SourceUnit,
};
use tracing::{Level, info, span, warn};

use crate::dispatcher::{Dispatcher, panic_message};
use crate::fix::{FixEngine, FixOutcome};
use crate::registry::RuleRegistry;

/// Progress information for parallel runs
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    pub total_files: usize,
    pub completed_files: usize,
    pub current_file: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Progress callback; called from worker threads
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// Findings of one unit
#[derive(Debug)]
pub struct FileReport {
    pub path: Option<PathBuf>,
    /// Findings in dispatch order, auxiliary markers excluded
    pub findings: Vec<FindingRecord>,
    pub execution_time: Duration,
    /// Set when the unit was aborted; `findings` is then empty
    pub error: Option<SharpstyleError>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    path: Option<String>,
    findings: &'a [FindingRecord],
    error: Option<String>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// JSON form for hosts and tooling
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let report = JsonReport {
            path: self.path.as_ref().map(|path| path.display().to_string()),
            findings: &self.findings,
            error: self.error.as_ref().map(ToString::to_string),
        };
        serde_json::to_value(report)
            .map_err(|err| SharpstyleError::internal_error(format!("Failed to serialize report: {err}")))
    }
}

/// Fix outcome of one unit
#[derive(Debug)]
pub struct FileFixReport {
    pub path: Option<PathBuf>,
    pub outcome: Result<FixOutcome>,
    pub execution_time: Duration,
}

/// Runs the registry over many units in parallel
#[derive(Clone)]
pub struct Executor {
    registry: Arc<RuleRegistry>,
    cancel: CancellationToken,
    thread_pool_size: Option<usize>,
    progress_callback: Option<ProgressCallback>,
}

impl Executor {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            cancel: CancellationToken::new(),
            thread_pool_size: None,
            progress_callback: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run on a dedicated pool of this many threads instead of the global one
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size.max(1));
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Dispatch every unit
    ///
    /// Fails only when cancelled, in which case all partial findings are
    /// discarded.
    pub fn lint_all(&self, units: &[SourceUnit]) -> Result<Vec<FileReport>> {
        let reports = self.run_parallel(units, |unit| self.lint_unit(unit))?;
        let findings: usize = reports.iter().map(|report| report.findings.len()).sum();
        let failed = reports.iter().filter(|report| !report.is_ok()).count();
        info!(findings, failed, "Linted {} files", units.len());
        Ok(reports)
    }

    /// Fix every unit
    ///
    /// Units whose fixing fails keep their original tree; the error is in
    /// their report.
    pub fn fix_all(&self, units: &[SourceUnit]) -> Result<Vec<FileFixReport>> {
        let reports = self.run_parallel(units, |unit| self.fix_unit(unit))?;
        let failed = reports.iter().filter(|report| report.outcome.is_err()).count();
        info!(failed, "Fixed {} files", units.len());
        Ok(reports)
    }

    /// Fixed units in input order
    ///
    /// A unit whose fixing failed recoverably is returned unchanged. Other
    /// failures, such as cancellation or an internal error, fail the call.
    pub fn fixed_units(&self, units: &[SourceUnit]) -> Result<Vec<SourceUnit>> {
        let reports = self.fix_all(units)?;
        units
            .iter()
            .zip(reports)
            .map(|(unit, report)| {
                Ok(report
                    .outcome
                    .recoverable()?
                    .map_or_else(|| unit.clone(), |outcome| outcome.unit))
            })
            .collect()
    }

    /// Dispatch one unit, isolating failures
    pub fn lint_unit(&self, unit: &SourceUnit) -> FileReport {
        let start_time = Instant::now();
        let span = span!(Level::DEBUG, "lint_unit", path = ?unit.path());
        let _enter = span.enter();

        let dispatcher = Dispatcher::new(&self.registry).with_cancellation(self.cancel.clone());
        let outcome = isolate(|| dispatcher.collect_primary(unit));
        let (findings, error) = match outcome {
            Ok(findings) => (findings.iter().map(|f| unit.record(f)).collect(), None),
            Err(err) => {
                if err.kind() != ErrorKind::Cancelled {
                    warn!(path = ?unit.path(), "Aborted file: {}", err);
                }
                (Vec::new(), Some(err))
            }
        };

        FileReport {
            path: unit.path().map(PathBuf::from),
            findings,
            execution_time: start_time.elapsed(),
            error,
        }
    }

    /// Fix one unit, isolating failures
    pub fn fix_unit(&self, unit: &SourceUnit) -> FileFixReport {
        let start_time = Instant::now();
        let span = span!(Level::DEBUG, "fix_unit", path = ?unit.path());
        let _enter = span.enter();

        let engine = FixEngine::new(&self.registry).with_cancellation(self.cancel.clone());
        let outcome = isolate(|| engine.fix_all(unit));
        if let Err(err) = &outcome
            && err.kind() != ErrorKind::Cancelled
        {
            warn!(path = ?unit.path(), "Fixing aborted: {}", err);
        }

        FileFixReport {
            path: unit.path().map(PathBuf::from),
            outcome,
            execution_time: start_time.elapsed(),
        }
    }

    fn run_parallel<T, F>(&self, units: &[SourceUnit], process: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&SourceUnit) -> T + Sync,
    {
        let total_files = units.len();
        let start_time = Instant::now();
        let completed_count = AtomicUsize::new(0);

        let run = || -> Result<Vec<T>> {
            let results: Result<Vec<(usize, T)>> = units
                .par_iter()
                .enumerate()
                .map(|(index, unit)| {
                    // Checked between units; a cancelled run keeps nothing
                    self.cancel.check()?;
                    let result = process(unit);

                    let completed = completed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    self.report_progress(ProgressInfo {
                        total_files,
                        completed_files: completed,
                        current_file: unit.path().map(PathBuf::from),
                        elapsed: start_time.elapsed(),
                    });
                    Ok((index, result))
                })
                .collect();
            let mut indexed_results = results?;
            self.cancel.check()?;

            // Sort by original index to keep input order
            indexed_results.sort_by_key(|(index, _)| *index);
            Ok(indexed_results
                .into_iter()
                .map(|(_, result)| result)
                .collect())
        };

        let results = match self.thread_pool_size {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|err| {
                    SharpstyleError::internal_error(format!("Failed to build thread pool: {err}"))
                })?
                .install(run)?,
            None => run()?,
        };

        info!(
            "Completed parallel execution of {} files in {:?}",
            total_files,
            start_time.elapsed()
        );
        Ok(results)
    }

    fn report_progress(&self, progress: ProgressInfo) {
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }
}

/// Run per-unit work, turning a panic into an error for that unit
fn isolate<T>(work: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => Err(SharpstyleError::internal_error(format!(
            "panic while processing unit: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RegistryBuilder, Rule, RuleMeta, Verdict};
    use sharpstyle_core::{EngineConfiguration, SyntaxKind};

    const FRAGILE: RuleMeta = RuleMeta {
        id: "TEST_FRAGILE",
        name: "Fragile",
        message: "fragile",
    };

    fn units(sources: &[(&str, &str)]) -> Vec<SourceUnit> {
        sources
            .iter()
            .map(|(path, text)| SourceUnit::parse(text).0.with_path(*path))
            .collect()
    }

    fn builtin() -> Arc<RuleRegistry> {
        Arc::new(RuleRegistry::with_builtin_rules(EngineConfiguration::default()).unwrap())
    }

    #[test]
    fn test_reports_keep_input_order() {
        let sources: Vec<(String, String)> = (0..24)
            .map(|i| {
                let body = if i % 2 == 0 { "if(x) { }" } else { "if (x) { }" };
                (format!("File{i}.cs"), format!("class C{i} {{ void M() {{ {body} }} }}"))
            })
            .collect();
        let borrowed: Vec<(&str, &str)> = sources
            .iter()
            .map(|(path, text)| (path.as_str(), text.as_str()))
            .collect();

        let reports = Executor::new(builtin())
            .with_thread_pool_size(4)
            .lint_all(&units(&borrowed))
            .unwrap();

        assert_eq!(reports.len(), 24);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.path, Some(PathBuf::from(format!("File{i}.cs"))));
            assert_eq!(report.findings.len(), usize::from(i % 2 == 0));
        }
    }

    #[test]
    fn test_failing_unit_is_isolated() {
        let registry = RegistryBuilder::new(EngineConfiguration::default())
            .with_builtin_rules()
            .register(Rule::new(FRAGILE, &[SyntaxKind::Ident], |element, _| {
                match element.as_token() {
                    Some(token) if token.text() == "Boom" => panic!("cannot handle Boom"),
                    _ => Ok(Verdict::Clean),
                }
            }))
            .build()
            .unwrap();
        let units = units(&[
            ("A.cs", "class A { void M() { if(a) { } } }"),
            ("Boom.cs", "class Boom { }"),
            ("C.cs", "class C { void M() { return (c); } }"),
        ]);

        let reports = Executor::new(Arc::new(registry)).lint_all(&units).unwrap();

        assert!(reports[0].is_ok());
        assert_eq!(reports[0].findings[0].rule_id, "SA1000");
        let err = reports[1].error.as_ref().unwrap();
        assert_eq!(err.kind(), ErrorKind::EngineFault);
        assert_eq!(err.rule_id(), Some("TEST_FRAGILE"));
        assert_eq!(reports[2].findings[0].rule_id, "SA1119");
    }

    #[test]
    fn test_cancelled_run_discards_everything() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let units = units(&[("A.cs", "class A { void M() { if(a) { } } }")]);

        let err = Executor::new(builtin())
            .with_cancellation(cancel)
            .lint_all(&units)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_fix_all_units() {
        let units = units(&[
            ("A.cs", "class A { int M() { return(a); } }"),
            ("B.cs", "class B { }"),
        ]);

        let reports = Executor::new(builtin()).fix_all(&units).unwrap();

        let fixed: Vec<_> = reports
            .iter()
            .map(|report| report.outcome.as_ref().unwrap().unit.text().to_string())
            .collect();
        assert_eq!(fixed, ["class A { int M() { return a; } }", "class B { }"]);
    }

    #[test]
    fn test_fixed_units_keep_failed_files() {
        let registry = RegistryBuilder::new(EngineConfiguration::default())
            .with_builtin_rules()
            .register(Rule::new(FRAGILE, &[SyntaxKind::Ident], |element, _| {
                match element.as_token() {
                    Some(token) if token.text() == "Boom" => panic!("cannot handle Boom"),
                    _ => Ok(Verdict::Clean),
                }
            }))
            .build()
            .unwrap();
        let units = units(&[
            ("A.cs", "class A { int M() { return(a); } }"),
            ("Boom.cs", "class Boom { int M() { return(b); } }"),
        ]);

        let fixed = Executor::new(Arc::new(registry)).fixed_units(&units).unwrap();

        let texts: Vec<_> = fixed.iter().map(|unit| unit.text().to_string()).collect();
        assert_eq!(
            texts,
            [
                "class A { int M() { return a; } }",
                "class Boom { int M() { return(b); } }"
            ]
        );
    }

    #[test]
    fn test_fixed_units_fail_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let units = units(&[("A.cs", "class A { }")]);

        let err = Executor::new(builtin())
            .with_cancellation(cancel)
            .fixed_units(&units)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_progress_is_reported_per_unit() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let units = units(&[("A.cs", "class A { }"), ("B.cs", "class B { }")]);

        Executor::new(builtin())
            .with_progress_callback(Arc::new(move |progress: ProgressInfo| {
                assert_eq!(progress.total_files, 2);
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .lint_all(&units)
            .unwrap();

        assert_eq!(seen.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_report_json() {
        let units = units(&[("A.cs", "class A { void M() { if(a) { } } }")]);
        let reports = Executor::new(builtin()).lint_all(&units).unwrap();

        let json = reports[0].to_json().unwrap();
        assert_eq!(json["path"], "A.cs");
        assert_eq!(json["findings"][0]["ruleId"], "SA1000");
        assert_eq!(json["findings"][0]["startLine"], 1);
        assert_eq!(json["findings"][0]["messageArguments"][0], "if");
        assert!(json["error"].is_null());
    }
}
