//! Findings and positional information
//!
//! A [`Finding`] is the engine-internal value a rule check returns; a
//! [`FindingRecord`] is its host-facing, serializable form with 1-based
//! line/column positions computed through a [`SourceMap`].

mod finding;
mod location;

pub use finding::{Finding, FindingRecord, format_message};
pub use location::{Location, SourceMap, text_range_to_span};
