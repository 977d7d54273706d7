//! Sharpstyle Core
//!
//! Syntax model and fix plumbing for a C# style-conformance engine.
//! This crate provides the lossless syntax tree the rules inspect, the
//! findings they report, the tree edits their fixes produce and the
//! configuration the engine is built from.

pub mod autofix;
pub mod cancel;
pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod diagnostics;
pub mod error;
pub mod result;
pub mod source;

// Re-export commonly used types
pub use autofix::{
    AppliedEdit, Edit, EditKind, EditPart, OffsetMap, RewriteResult, UnappliedFix,
    UnappliedReason, apply_edits, green_token, ranges_conflict, unified_diff,
};
pub use cancel::CancellationToken;
pub use config::{
    ConfigFormat, ConfigLoader, DispatchConfiguration, EngineConfiguration,
    ExemptionsConfiguration, FixConfiguration, RuleSeverity,
};
pub use cst::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTokenExt};
pub use diagnostics::{Finding, FindingRecord, Location, SourceMap, format_message};
pub use error::{ErrorKind, FixError, SharpstyleError};
pub use result::{Result, ResultExt};
pub use source::SourceUnit;

/// Initialize the tracing subscriber for logging
///
/// Does nothing when a global subscriber is already installed.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sharpstyle=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
