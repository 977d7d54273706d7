//! One parsed file as handed to the engine

use std::path::{Path, PathBuf};

use rowan::{GreenNode, TextRange};

use crate::cst::{ParseError, SyntaxNode, parse_csharp};
use crate::diagnostics::{Finding, FindingRecord, Location, SourceMap};

/// An immutable syntax tree together with its line index
///
/// The tree is stored as a green node so units can move between threads;
/// [`SourceUnit::root`] materialises a fresh red tree on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    path: Option<PathBuf>,
    green: GreenNode,
    text: String,
    source_map: SourceMap,
}

impl SourceUnit {
    /// Wrap an existing tree, indexing its text
    pub fn from_tree(root: &SyntaxNode) -> Self {
        Self::from_green(root.green().into_owned())
    }

    pub fn from_green(green: GreenNode) -> Self {
        let text = SyntaxNode::new_root(green.clone()).text().to_string();
        let source_map = SourceMap::new(&text);
        Self {
            path: None,
            green,
            text,
            source_map,
        }
    }

    /// Parse source with the reference C# parser
    pub fn parse(source: &str) -> (Self, Vec<ParseError>) {
        let (root, errors) = parse_csharp(source);
        (Self::from_tree(&root), errors)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Same file, different tree
    pub fn with_root(&self, root: &SyntaxNode) -> Self {
        let mut unit = Self::from_tree(root);
        unit.path = self.path.clone();
        unit
    }

    pub fn root(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn location(&self, range: TextRange) -> Location {
        self.source_map
            .location(range, &self.text, self.path.as_ref())
    }

    pub fn record(&self, finding: &Finding) -> FindingRecord {
        finding.to_record(&self.source_map, &self.text)
    }
}
