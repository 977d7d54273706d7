//! Documentation content emptiness
//!
//! A documented declaration whose summary says nothing is reported at its
//! identifying token. Undocumented declarations are not this rule's concern.

use quick_xml::Reader;
use quick_xml::events::Event;
use sharpstyle_core::cst::ast::identifying_token;
use sharpstyle_core::cst::trivia::{doc_comment_text, first_significant_token};
use sharpstyle_core::{Finding, Result, SyntaxElement, SyntaxKind};
use tracing::trace;

use crate::registry::{CheckContext, Rule, RuleMeta, Verdict};

/// Rule ID for empty documentation
pub const RULE_ID: &str = "SA1606";

pub const META: RuleMeta = RuleMeta {
    id: RULE_ID,
    name: "ElementDocumentationMustHaveSummaryText",
    message: "Element documentation must have summary text",
};

const DOCUMENTABLE: &[SyntaxKind] = &[
    SyntaxKind::ClassDecl,
    SyntaxKind::StructDecl,
    SyntaxKind::InterfaceDecl,
    SyntaxKind::EnumDecl,
    SyntaxKind::DelegateDecl,
    SyntaxKind::MethodDecl,
    SyntaxKind::ConstructorDecl,
    SyntaxKind::DestructorDecl,
    SyntaxKind::PropertyDecl,
    SyntaxKind::IndexerDecl,
    SyntaxKind::EventDecl,
    SyntaxKind::EventFieldDecl,
];

pub fn rule() -> Rule {
    Rule::new(META, DOCUMENTABLE, check)
}

pub fn check(element: &SyntaxElement, _context: &CheckContext<'_>) -> Result<Verdict> {
    let Some(node) = element.as_node() else {
        return Ok(Verdict::NotApplicable);
    };
    let Some(documentation) = first_significant_token(node).and_then(|token| doc_comment_text(&token))
    else {
        return Ok(Verdict::NotApplicable);
    };
    let Some(scan) = DocScan::of(&documentation) else {
        trace!("Documentation is not well-formed XML; skipping");
        return Ok(Verdict::NotApplicable);
    };
    if scan.is_satisfied() {
        return Ok(Verdict::Clean);
    }

    let Some(identifier) = identifying_token(node) else {
        return Ok(Verdict::NotApplicable);
    };
    Ok(Verdict::violation(Finding::new(
        RULE_ID,
        identifier.text_range(),
    )))
}

/// What a documentation comment says, as far as this rule cares
#[derive(Debug, Default, PartialEq, Eq)]
struct DocScan {
    inheritdoc: bool,
    /// Whether a `<summary>` or `<content>` element exists
    section: bool,
    section_content: bool,
    body_content: bool,
}

impl DocScan {
    /// Scan the comment body; `None` when it is not well-formed XML
    fn of(documentation: &str) -> Option<Self> {
        let mut scan = Self::default();
        let mut reader = Reader::from_str(documentation);
        let mut depth = 0usize;
        // Depth at which the open section element sits
        let mut open_section: Option<usize> = None;

        loop {
            match reader.read_event().ok()? {
                Event::Start(element) => {
                    let name = element.local_name();
                    if name.as_ref() == b"inheritdoc" {
                        scan.inheritdoc = true;
                    } else if !scan.section && is_section(name.as_ref()) {
                        scan.section = true;
                        open_section = Some(depth);
                    }
                    depth += 1;
                }
                Event::Empty(element) => {
                    let name = element.local_name();
                    if name.as_ref() == b"inheritdoc" {
                        scan.inheritdoc = true;
                    } else if !scan.section && is_section(name.as_ref()) {
                        scan.section = true;
                    } else {
                        scan.mark_content(open_section.is_some());
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if open_section == Some(depth) {
                        open_section = None;
                    }
                }
                Event::Text(text) if !is_blank(&text) => scan.mark_content(open_section.is_some()),
                Event::CData(data) if !is_blank(&data) => scan.mark_content(open_section.is_some()),
                Event::Eof => break,
                _ => {}
            }
        }
        Some(scan)
    }

    fn mark_content(&mut self, in_section: bool) {
        self.body_content = true;
        if in_section {
            self.section_content = true;
        }
    }

    fn is_satisfied(&self) -> bool {
        if self.inheritdoc {
            true
        } else if self.section {
            self.section_content
        } else {
            self.body_content
        }
    }
}

fn is_section(name: &[u8]) -> bool {
    name == b"summary" || name == b"content"
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::{findings, span_text};

    fn documented(doc: &str) -> String {
        format!("class C\n{{\n{doc}\n    public void Run()\n    {{\n    }}\n}}\n")
    }

    #[test]
    fn test_blank_summary_is_reported_at_identifier() {
        let source = documented("    /// <summary>\n    ///   \n    /// </summary>");
        let found = findings(RULE_ID, &source);

        assert_eq!(found.len(), 1);
        assert_eq!(span_text(&source, &found[0]), "Run");
    }

    #[test]
    fn test_inheritdoc_satisfies_rule() {
        let source = documented("    /// <inheritdoc/>");
        assert!(findings(RULE_ID, &source).is_empty());

        let source = documented("    /// <summary></summary>\n    /// <inheritdoc cref=\"Base\" />");
        assert!(findings(RULE_ID, &source).is_empty());
    }

    #[test]
    fn test_undocumented_declaration_is_not_reported() {
        assert!(findings(RULE_ID, &documented("    // plain comment")).is_empty());
        assert!(findings(RULE_ID, &documented("")).is_empty());
    }

    #[test]
    fn test_summary_with_text_or_child_element() {
        let text = documented("    /// <summary>Runs the job.</summary>");
        assert!(findings(RULE_ID, &text).is_empty());

        let reference = documented("    /// <summary><see cref=\"Job\"/></summary>");
        assert!(findings(RULE_ID, &reference).is_empty());

        let empty_para = documented("    /// <summary><para> </para></summary>");
        assert_eq!(findings(RULE_ID, &empty_para).len(), 1);

        let self_closing = documented("    /// <summary/>");
        assert_eq!(findings(RULE_ID, &self_closing).len(), 1);
    }

    #[test]
    fn test_documentation_before_attributes() {
        let source = "class C\n{\n    /// <summary> </summary>\n    [Obsolete]\n    public int Count { get; set; }\n}\n";
        let found = findings(RULE_ID, source);

        assert_eq!(found.len(), 1);
        assert_eq!(span_text(source, &found[0]), "Count");
    }

    #[test]
    fn test_identifying_tokens_of_other_members() {
        let source = r#"/// <summary>
/// </summary>
class Widget
{
    /// <summary></summary>
    public int this[int index] => index;

    /// <summary> </summary>
    public event Action Changed, Closed;

    /// <summary>Documented.</summary>
    public Widget() { }
}
"#;
        let found: Vec<_> = findings(RULE_ID, source)
            .iter()
            .map(|f| span_text(source, f).to_string())
            .collect();
        assert_eq!(found, ["Widget", "this", "Changed"]);
    }

    #[test]
    fn test_cdata_counts_as_content() {
        let cdata = documented("    /// <summary>\n    /// <![CDATA[ a < b ]]>\n    /// </summary>");
        assert!(findings(RULE_ID, &cdata).is_empty());

        let blank = documented("    /// <summary><![CDATA[  ]]></summary>");
        assert_eq!(findings(RULE_ID, &blank).len(), 1);
    }

    #[test]
    fn test_delimited_documentation_is_checked() {
        let empty = documented("    /** <summary></summary> */");
        let found = findings(RULE_ID, &empty);
        assert_eq!(found.len(), 1);
        assert_eq!(span_text(&empty, &found[0]), "Run");

        let text = documented("    /**\n     * <summary>Runs.</summary>\n     */");
        assert!(findings(RULE_ID, &text).is_empty());
    }

    #[test]
    fn test_malformed_documentation_is_skipped() {
        let source = documented("    /// <summary></para>");
        assert!(findings(RULE_ID, &source).is_empty());
    }

    #[test]
    fn test_doc_scan() {
        let scan = DocScan::of(" <summary>abc</summary> <remarks/>").unwrap();
        assert!(scan.section && scan.section_content);

        let scan = DocScan::of(" <summary />  <remarks>r</remarks>").unwrap();
        assert!(scan.section && !scan.section_content && scan.body_content);
        assert!(!scan.is_satisfied());

        let scan = DocScan::of(" <remarks>r</remarks>").unwrap();
        assert!(!scan.section && scan.is_satisfied());

        let scan = DocScan::of(" <summary>&amp;</summary>").unwrap();
        assert!(scan.is_satisfied());
    }
}
