//! Located style violations

use rowan::TextRange;
use serde::{Deserialize, Serialize};

use super::location::SourceMap;

/// One detected style violation
///
/// Findings are immutable once created by a rule check. Auxiliary findings
/// are zero-effect markers that accompany a primary finding; they are never
/// shown to users and never fixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Finding {
    rule_id: &'static str,
    primary_span: TextRange,
    message_args: Vec<String>,
    secondary_spans: Vec<TextRange>,
    auxiliary: bool,
}

impl Finding {
    pub fn new(rule_id: &'static str, primary_span: TextRange) -> Self {
        Self {
            rule_id,
            primary_span,
            message_args: Vec::new(),
            secondary_spans: Vec::new(),
            auxiliary: false,
        }
    }

    /// Marker finding that is carried along with a primary finding
    pub fn auxiliary(rule_id: &'static str, span: TextRange) -> Self {
        Self {
            auxiliary: true,
            ..Self::new(rule_id, span)
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.message_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_secondary_span(mut self, span: TextRange) -> Self {
        self.secondary_spans.push(span);
        self
    }

    pub fn rule_id(&self) -> &'static str {
        self.rule_id
    }

    pub fn primary_span(&self) -> TextRange {
        self.primary_span
    }

    pub fn message_args(&self) -> &[String] {
        &self.message_args
    }

    pub fn secondary_spans(&self) -> &[TextRange] {
        &self.secondary_spans
    }

    pub fn is_auxiliary(&self) -> bool {
        self.auxiliary
    }

    /// Convert to the positional record handed to hosts
    pub fn to_record(&self, source_map: &SourceMap, source: &str) -> FindingRecord {
        let (start_line, start_column, end_line, end_column) =
            source_map.range_to_location(self.primary_span, source);
        FindingRecord {
            rule_id: self.rule_id.to_string(),
            start_line,
            start_column,
            end_line,
            end_column,
            message_arguments: self.message_args.clone(),
        }
    }
}

/// Serializable finding with 1-based line/column positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingRecord {
    pub rule_id: String,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub message_arguments: Vec<String>,
}

/// Substitute `{0}`, `{1}`, ... placeholders with message arguments
///
/// Placeholders without a matching argument are left untouched.
pub fn format_message(template: &str, args: &[String]) -> String {
    let mut message = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        message.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = after.find('}').and_then(|close| {
            after[..close]
                .parse::<usize>()
                .ok()
                .and_then(|idx| args.get(idx))
                .map(|arg| (arg, close))
        });
        match placeholder {
            Some((arg, close)) => {
                message.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                message.push('{');
                rest = after;
            }
        }
    }
    message.push_str(rest);
    message
}
