//! Engine configuration
//!
//! Configuration is a strongly typed, immutable value built once per run and
//! passed by reference. Hosts supply it as TOML or JSON text:
//!
//! ```toml
//! [rules]
//! SA1119 = "warn"
//! SA1300 = "off"
//!
//! [exemptions]
//! typeNamePatterns = ["NativeMethods$"]
//!
//! [dispatch]
//! cancellationCheckInterval = 1024
//!
//! [fix]
//! maxPasses = 3
//! verifyIdempotence = true
//! ```
//!
//! A JSON schema for the document is available through
//! [`ConfigLoader::json_schema`].

mod engine_config;
mod loader;
mod merge;

pub use engine_config::{
    DEFAULT_CANCELLATION_CHECK_INTERVAL, DEFAULT_MAX_PASSES, DispatchConfiguration,
    EngineConfiguration, ExemptionsConfiguration, FixConfiguration, RuleSeverity,
};
pub use loader::{ConfigFormat, ConfigLoader};
