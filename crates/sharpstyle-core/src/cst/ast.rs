//! Typed AST layer over CST
//!
//! Thin, type-safe wrappers over the raw CST nodes that the rules inspect.
//! Each wrapper implements [`AstNode`] to safely convert from untyped nodes.
//!
//! # Example
//!
//! ```ignore
//! use sharpstyle_core::cst::{parse_csharp, ast::{AstNode, PropertyDecl}};
//!
//! let (cst, _) = parse_csharp("class C { int X { get; set; } }");
//! let property = cst.descendants().find_map(PropertyDecl::cast).unwrap();
//!
//! assert_eq!(property.name().unwrap().text(), "X");
//! assert_eq!(property.accessor_list().unwrap().accessors().count(), 2);
//! ```

use super::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

/// Helper function to find first child of a specific kind
fn child_of_kind(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

/// Helper function to find first token of a specific kind
fn token_of_kind(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

/// Direct identifier children, in order
fn ident_tokens(parent: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> + use<> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == SyntaxKind::Ident)
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                matches!(kind, $(SyntaxKind::$kind)|+)
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

// ============================================================================
// Declarations
// ============================================================================

ast_node!(
    /// Block or file-scoped namespace declaration
    NamespaceDecl,
    NamespaceDecl | FileScopedNamespaceDecl
);

impl NamespaceDecl {
    /// Every identifier of the (possibly qualified) namespace name
    pub fn name_tokens(&self) -> Vec<SyntaxToken> {
        self.syntax
            .children()
            .find(|n| matches!(n.kind(), SyntaxKind::NameType | SyntaxKind::QualifiedType))
            .map(|name| {
                name.descendants_with_tokens()
                    .filter_map(|e| e.into_token())
                    .filter(|t| t.kind() == SyntaxKind::Ident)
                    .collect()
            })
            .unwrap_or_default()
    }
}

ast_node!(
    /// Class, struct, interface or enum declaration
    TypeDecl,
    ClassDecl | StructDecl | InterfaceDecl | EnumDecl
);

impl TypeDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn members(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.syntax.children().filter(|n| {
            !matches!(
                n.kind(),
                SyntaxKind::AttributeList
                    | SyntaxKind::TypeParameterList
                    | SyntaxKind::BaseList
                    | SyntaxKind::ConstraintClause
            )
        })
    }
}

ast_node!(EnumMember, EnumMember);

impl EnumMember {
    pub fn name(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }
}

ast_node!(DelegateDecl, DelegateDecl);

impl DelegateDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }
}

ast_node!(
    /// Method, operator or conversion operator
    MethodDecl,
    MethodDecl
);

impl MethodDecl {
    /// Method identifier; the last segment for explicit interface members
    pub fn name(&self) -> Option<SyntaxToken> {
        ident_tokens(&self.syntax).last()
    }

    /// `operator` keyword of operator declarations
    pub fn operator_keyword(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::OperatorKw)
    }

    pub fn body(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::Block)
            .or_else(|| child_of_kind(&self.syntax, SyntaxKind::ArrowExprClause))
    }
}

ast_node!(ConstructorDecl, ConstructorDecl);

impl ConstructorDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }

    pub fn initializer(&self) -> Option<SyntaxNode> {
        child_of_kind(&self.syntax, SyntaxKind::ConstructorInitializer)
    }
}

ast_node!(DestructorDecl, DestructorDecl);

impl DestructorDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::Ident)
    }
}

ast_node!(
    /// Property, indexer or accessor-style event
    AccessorOwner,
    PropertyDecl | IndexerDecl | EventDecl
);

impl AccessorOwner {
    /// Identifier, or `this` for indexers
    pub fn name(&self) -> Option<SyntaxToken> {
        if self.syntax.kind() == SyntaxKind::IndexerDecl {
            return token_of_kind(&self.syntax, SyntaxKind::ThisKw);
        }
        ident_tokens(&self.syntax).last()
    }

    pub fn accessor_list(&self) -> Option<AccessorList> {
        self.syntax.children().find_map(AccessorList::cast)
    }
}

ast_node!(PropertyDecl, PropertyDecl);

impl PropertyDecl {
    pub fn name(&self) -> Option<SyntaxToken> {
        ident_tokens(&self.syntax).last()
    }

    pub fn accessor_list(&self) -> Option<AccessorList> {
        self.syntax.children().find_map(AccessorList::cast)
    }
}

ast_node!(EventFieldDecl, EventFieldDecl);

impl EventFieldDecl {
    /// Identifier of the first declarator
    pub fn first_declarator_name(&self) -> Option<SyntaxToken> {
        let decl = child_of_kind(&self.syntax, SyntaxKind::VariableDecl)?;
        let declarator = child_of_kind(&decl, SyntaxKind::VariableDeclarator)?;
        token_of_kind(&declarator, SyntaxKind::Ident)
    }
}

ast_node!(AccessorList, AccessorList);

impl AccessorList {
    pub fn accessors(&self) -> impl Iterator<Item = Accessor> + use<> {
        self.syntax.children().filter_map(Accessor::cast)
    }
}

ast_node!(
    /// `get`, `set`, `init`, `add` or `remove` accessor
    Accessor,
    Accessor
);

impl Accessor {
    pub fn keyword(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::GetKw
                        | SyntaxKind::SetKw
                        | SyntaxKind::InitKw
                        | SyntaxKind::AddKw
                        | SyntaxKind::RemoveKw
                )
            })
    }
}

// ============================================================================
// Expressions
// ============================================================================

ast_node!(
    /// `( expr )`
    ParenExpr,
    ParenExpr
);

impl ParenExpr {
    pub fn l_paren(&self) -> Option<SyntaxToken> {
        token_of_kind(&self.syntax, SyntaxKind::LParen)
    }

    pub fn r_paren(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::RParen)
            .last()
    }

    /// Inner expression
    pub fn expr(&self) -> Option<SyntaxNode> {
        self.syntax.first_child()
    }
}

/// Identifying token of a documentable declaration
///
/// Identifier for types, delegates, methods, constructors, destructors,
/// properties and events; `this` for indexers; the first declarator for
/// field-like events; the `operator` keyword for operators.
pub fn identifying_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    match node.kind() {
        SyntaxKind::ClassDecl
        | SyntaxKind::StructDecl
        | SyntaxKind::InterfaceDecl
        | SyntaxKind::EnumDecl => TypeDecl::cast(node.clone())?.name(),
        SyntaxKind::DelegateDecl => DelegateDecl::cast(node.clone())?.name(),
        SyntaxKind::MethodDecl => {
            let method = MethodDecl::cast(node.clone())?;
            method.name().or_else(|| method.operator_keyword())
        }
        SyntaxKind::ConstructorDecl => ConstructorDecl::cast(node.clone())?.name(),
        SyntaxKind::DestructorDecl => DestructorDecl::cast(node.clone())?.name(),
        SyntaxKind::PropertyDecl | SyntaxKind::IndexerDecl | SyntaxKind::EventDecl => {
            AccessorOwner::cast(node.clone())?.name()
        }
        SyntaxKind::EventFieldDecl => EventFieldDecl::cast(node.clone())?.first_declarator_name(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse_csharp;

    fn first<N: AstNode>(root: &SyntaxNode) -> N {
        root.descendants().find_map(N::cast).unwrap()
    }

    #[test]
    fn test_property_accessors() {
        let (cst, _) = parse_csharp("class C { int X { get; private set; } }");
        let property: PropertyDecl = first(&cst);

        assert_eq!(property.name().unwrap().text(), "X");
        let keywords: Vec<_> = property
            .accessor_list()
            .unwrap()
            .accessors()
            .filter_map(|a| a.keyword())
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(keywords, vec!["get", "set"]);
    }

    #[test]
    fn test_identifying_tokens() {
        let source = r#"class Outer
{
    int this[int i] => i;
    event Action Fired, Other;
    void IFoo.Run() { }
    public static Outer operator +(Outer a, Outer b) => a;
}"#;
        let (cst, _) = parse_csharp(source);
        let names: Vec<_> = cst
            .descendants()
            .filter_map(|n| identifying_token(&n))
            .map(|t| t.text().to_string())
            .collect();

        assert_eq!(names, vec!["Outer", "this", "Fired", "Run", "operator"]);
    }

    #[test]
    fn test_paren_expr_parts() {
        let (cst, _) = parse_csharp("x = (a + b);");
        let paren: ParenExpr = first(&cst);

        assert_eq!(paren.l_paren().unwrap().text(), "(");
        assert_eq!(paren.r_paren().unwrap().text(), ")");
        assert_eq!(paren.expr().unwrap().kind(), SyntaxKind::BinaryExpr);
    }

    #[test]
    fn test_qualified_namespace_name() {
        let (cst, _) = parse_csharp("namespace Acme.tools { }");
        let ns: NamespaceDecl = first(&cst);

        let names: Vec<_> = ns.name_tokens().iter().map(|t| t.text().to_string()).collect();
        assert_eq!(names, vec!["Acme", "tools"]);
    }
}
