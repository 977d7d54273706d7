//! Offset to line/column mapping

use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

use rowan::{TextRange, TextSize};
use serde::{Deserialize, Serialize};

/// Line index for fast offset→position conversion
///
/// Stores the byte offset at which each line starts, so positions are found
/// with a binary search instead of rescanning the source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceMap {
    /// Cumulative byte offsets for each line start (line 0, line 1, ...)
    line_starts: Vec<usize>,
}

impl SourceMap {
    /// Create a source map from source text
    ///
    /// Time complexity: O(n) where n is source length
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];

        for (idx, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(idx + 1);
            }
        }

        Self { line_starts }
    }

    /// Number of lines in the indexed source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert byte offset to (line, column) position
    ///
    /// Returns 1-based line and column numbers; columns count characters,
    /// not bytes. Offsets past the end clamp to the end of the source.
    pub fn offset_to_position(&self, offset: usize, source: &str) -> (usize, usize) {
        let offset = offset.min(source.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };

        let line_start = self.line_starts[line_idx].min(offset);
        let column = source
            .get(line_start..offset)
            .map_or(0, |text| text.chars().count())
            + 1;

        (line_idx + 1, column)
    }

    /// Convert a span (byte range) to `(start_line, start_col, end_line, end_col)`,
    /// all 1-based
    pub fn span_to_location(
        &self,
        span: &Range<usize>,
        source: &str,
    ) -> (usize, usize, usize, usize) {
        let (start_line, start_col) = self.offset_to_position(span.start, source);
        let (end_line, end_col) = self.offset_to_position(span.end, source);
        (start_line, start_col, end_line, end_col)
    }

    /// Same as [`SourceMap::span_to_location`] for a tree range
    pub fn range_to_location(
        &self,
        range: TextRange,
        source: &str,
    ) -> (usize, usize, usize, usize) {
        self.span_to_location(&text_range_to_span(range), source)
    }

    /// Build a full [`Location`] for a tree range
    pub fn location(&self, range: TextRange, source: &str, file: Option<&PathBuf>) -> Location {
        let span = text_range_to_span(range);
        let (line, column, end_line, end_column) = self.span_to_location(&span, source);
        Location {
            file: file.cloned(),
            line,
            column,
            end_line,
            end_column,
            offset: span.start,
            length: span.end - span.start,
        }
    }

    /// Whether both offsets fall on the same line
    pub fn same_line(&self, a: TextSize, b: TextSize) -> bool {
        self.line_index(a.into()) == self.line_index(b.into())
    }

    fn line_index(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        }
    }
}

/// Convert a rowan range into a byte span
pub fn text_range_to_span(range: TextRange) -> Range<usize> {
    usize::from(range.start())..usize::from(range.end())
}

/// Location information for diagnostics and engine errors
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// File path, when the host supplied one
    pub file: Option<PathBuf>,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// Byte offset in the file
    pub offset: usize,
    /// Length of the span
    pub length: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_position() {
        let source = "class C\n{\n    int x;\n}";
        let map = SourceMap::new(source);

        assert_eq!(map.line_count(), 4);
        assert_eq!(map.offset_to_position(0, source), (1, 1));
        assert_eq!(map.offset_to_position(8, source), (2, 1));
        assert_eq!(map.offset_to_position(14, source), (3, 5));
        assert_eq!(map.offset_to_position(source.len(), source), (4, 2));
    }

    #[test]
    fn test_columns_count_characters() {
        let source = "var é = 1;";
        let map = SourceMap::new(source);

        // `=` follows a two-byte character
        let eq = source.find('=').unwrap();
        assert_eq!(map.offset_to_position(eq, source), (1, 7));
    }

    #[test]
    fn test_location_display() {
        let source = "a;\nb;";
        let map = SourceMap::new(source);
        let range = TextRange::new(3.into(), 4.into());

        let location = map.location(range, source, Some(&PathBuf::from("Demo.cs")));
        assert_eq!(location.to_string(), "Demo.cs:2:1");
        assert_eq!((location.end_line, location.end_column), (2, 2));
        assert_eq!(location.length, 1);
        assert!(map.same_line(3.into(), 4.into()));
        assert!(!map.same_line(0.into(), 3.into()));
    }
}
