//! Element casing
//!
//! Names of namespaces, types, members and enum values must begin with an
//! uppercase letter. Declarations the host exempts (for example members of
//! `NativeMethods` interop classes) are skipped.

use sharpstyle_core::cst::ast::{
    AccessorOwner, AstNode, DelegateDecl, EnumMember, MethodDecl, NamespaceDecl, PropertyDecl,
    TypeDecl,
};
use sharpstyle_core::{Finding, Result, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

use crate::registry::{CheckContext, DeclarationContext, Rule, RuleMeta, Verdict};

/// Rule ID for element casing
pub const RULE_ID: &str = "SA1300";

pub const META: RuleMeta = RuleMeta {
    id: RULE_ID,
    name: "ElementMustBeginWithUpperCaseLetter",
    message: "Element '{0}' must begin with an uppercase letter",
};

const NAMED: &[SyntaxKind] = &[
    SyntaxKind::NamespaceDecl,
    SyntaxKind::FileScopedNamespaceDecl,
    SyntaxKind::ClassDecl,
    SyntaxKind::StructDecl,
    SyntaxKind::InterfaceDecl,
    SyntaxKind::EnumDecl,
    SyntaxKind::EnumMember,
    SyntaxKind::DelegateDecl,
    SyntaxKind::EventDecl,
    SyntaxKind::EventFieldDecl,
    SyntaxKind::MethodDecl,
    SyntaxKind::PropertyDecl,
];

pub fn rule() -> Rule {
    Rule::new(META, NAMED, check)
}

pub fn check(element: &SyntaxElement, context: &CheckContext<'_>) -> Result<Verdict> {
    let Some(node) = element.as_node() else {
        return Ok(Verdict::NotApplicable);
    };
    // Overrides take their name from the base declaration
    if has_override_modifier(node) {
        return Ok(Verdict::NotApplicable);
    }

    let findings: Vec<Finding> = declared_names(node)
        .into_iter()
        .filter(|name| starts_lowercase(name.text()))
        .filter(|name| {
            let declaration = DeclarationContext::of(node, name.text());
            !context.exemptions.is_exempt(&declaration)
        })
        .map(|name| Finding::new(RULE_ID, name.text_range()).with_args([name.text()]))
        .collect();

    if findings.is_empty() {
        Ok(Verdict::Clean)
    } else {
        Ok(Verdict::Violations(findings))
    }
}

fn declared_names(node: &SyntaxNode) -> Vec<SyntaxToken> {
    let node = node.clone();
    let name = match node.kind() {
        SyntaxKind::NamespaceDecl | SyntaxKind::FileScopedNamespaceDecl => {
            return NamespaceDecl::cast(node).map(|ns| ns.name_tokens()).unwrap_or_default();
        }
        SyntaxKind::EventFieldDecl => {
            return node
                .children()
                .filter(|child| child.kind() == SyntaxKind::VariableDecl)
                .flat_map(|decl| decl.children())
                .filter(|child| child.kind() == SyntaxKind::VariableDeclarator)
                .filter_map(|declarator| {
                    declarator
                        .children_with_tokens()
                        .filter_map(|e| e.into_token())
                        .find(|t| t.kind() == SyntaxKind::Ident)
                })
                .collect();
        }
        SyntaxKind::ClassDecl
        | SyntaxKind::StructDecl
        | SyntaxKind::InterfaceDecl
        | SyntaxKind::EnumDecl => TypeDecl::cast(node).and_then(|decl| decl.name()),
        SyntaxKind::EnumMember => EnumMember::cast(node).and_then(|member| member.name()),
        SyntaxKind::DelegateDecl => DelegateDecl::cast(node).and_then(|decl| decl.name()),
        SyntaxKind::EventDecl => AccessorOwner::cast(node).and_then(|decl| decl.name()),
        SyntaxKind::MethodDecl => MethodDecl::cast(node)
            .filter(|method| method.operator_keyword().is_none())
            .and_then(|method| method.name()),
        SyntaxKind::PropertyDecl => PropertyDecl::cast(node).and_then(|decl| decl.name()),
        _ => None,
    };
    name.into_iter().collect()
}

fn has_override_modifier(node: &SyntaxNode) -> bool {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .any(|t| t.kind() == SyntaxKind::OverrideKw)
}

/// `@`-escaped names and names starting with `_` or a digit are left alone
fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::{findings, span_text};
    use crate::dispatcher::Dispatcher;
    use crate::registry::{PatternExemptions, RegistryBuilder};
    use sharpstyle_core::{EngineConfiguration, SourceUnit};

    fn names(source: &str) -> Vec<String> {
        findings(RULE_ID, source)
            .iter()
            .map(|f| f.message_args()[0].clone())
            .collect()
    }

    #[test]
    fn test_lowercase_declarations() {
        let source = r#"namespace acme.Tools
{
    class widget
    {
        enum mode { fast, Slow }
        delegate void handler();
        event Action changed, Closed, opened;
        void run() { }
        int count { get; set; }
        event Action added { add { } remove { } }
    }
}
"#;
        assert_eq!(
            names(source),
            [
                "acme", "widget", "mode", "fast", "handler", "changed", "opened", "run", "count",
                "added"
            ]
        );
    }

    #[test]
    fn test_finding_points_at_identifier() {
        let source = "class C\n{\n    void run() { }\n}\n";
        let found = findings(RULE_ID, source);
        assert_eq!(span_text(source, &found[0]), "run");
    }

    #[test]
    fn test_names_left_alone() {
        let source = r#"class C
{
    void @event() { }
    void _helper() { }
    public override string toString() => "";
    public static C operator +(C a, C b) => a;
    int field;
}
"#;
        assert!(names(source).is_empty());
    }

    #[test]
    fn test_exempt_interop_types() {
        let source = r#"class NativeMethods
{
    static extern int getTickCount();
}

class Other
{
    void run() { }
}
"#;
        let (unit, _) = SourceUnit::parse(source);
        let config = EngineConfiguration::default();
        let registry = RegistryBuilder::new(config)
            .with_builtin_rules()
            .only([RULE_ID])
            .exemptions(PatternExemptions::new(["NativeMethods$"]).unwrap())
            .build()
            .unwrap();

        let found = Dispatcher::new(&registry).collect(&unit).unwrap();
        let flagged: Vec<_> = found.iter().map(|f| f.message_args()[0].as_str()).collect();
        assert_eq!(flagged, ["run"]);
    }

    #[test]
    fn test_host_predicate_exemption() {
        let source = "class C\n{\n    void run() { }\n    void stop() { }\n}\n";
        let (unit, _) = SourceUnit::parse(source);
        let registry = RegistryBuilder::new(EngineConfiguration::default())
            .with_builtin_rules()
            .only([RULE_ID])
            .exemptions(|declaration: &DeclarationContext| {
                declaration.kind == SyntaxKind::MethodDecl && declaration.name == "stop"
            })
            .build()
            .unwrap();

        let found = Dispatcher::new(&registry).collect(&unit).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message_args(), ["run"]);
    }
}
