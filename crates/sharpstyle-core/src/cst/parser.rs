//! Hierarchical parser for the supported C# subset
//!
//! Builds a structured, lossless CST from the trivia-preserving token stream.
//! Trivia is emitted lazily: pending whitespace and comments are flushed just
//! before the next significant token or node, so node ranges start at their
//! first significant token and a token's trailing trivia always lands after
//! the node that owns the token.
//!
//! The parser never fails. Unexpected input is wrapped in `Error` nodes and
//! reported through [`ParseError`].

use rowan::Checkpoint;

use super::lexer::{CstSpan, LexerError};
use super::{CstBuilder, CstToken, SyntaxKind, SyntaxNode};

/// Category of a parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Produced by the lexer (unterminated literal, stray character)
    Lexer,
    /// A required token was missing
    Expected,
    /// A token could not start any construct at this position
    Unexpected,
}

/// An error produced while lexing or parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: CstSpan,
}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        Self {
            kind: ParseErrorKind::Lexer,
            message: err.message,
            span: err.span,
        }
    }
}

/// Parse C# source into a hierarchical CST
///
/// # Example
///
/// ```rust,ignore
/// use sharpstyle_core::cst::parse_csharp;
///
/// let source = "class C { int X { get; set; } }";
/// let (cst, errors) = parse_csharp(source);
/// assert!(errors.is_empty());
/// assert_eq!(cst.text().to_string(), source);
/// ```
pub fn parse_csharp(source: &str) -> (SyntaxNode, Vec<ParseError>) {
    let (tokens, lexer_errors) = super::lex_with_trivia(source);
    let mut parser = Parser::new(&tokens);
    parser.parse_compilation_unit();
    let (cst, parse_errors) = parser.finish();

    let mut errors: Vec<ParseError> = lexer_errors.into_iter().map(ParseError::from).collect();
    errors.extend(parse_errors);
    (cst, errors)
}

/// Token stream parser
struct Parser<'a> {
    tokens: &'a [CstToken],
    /// Indices of significant (non-trivia) tokens
    significant: Vec<usize>,
    /// Cursor into `significant`
    pos: usize,
    /// Index of the next raw token not yet handed to the builder
    emitted: usize,
    builder: CstBuilder,
    errors: Vec<ParseError>,
    /// Nesting depth of query expressions at the cursor
    query_depth: usize,
}

/// Context a type is parsed in; expressions restrict nullable/pointer suffixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeContext {
    Declaration,
    Expression,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [CstToken]) -> Self {
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_trivia())
            .map(|(idx, _)| idx)
            .collect();
        Self {
            tokens,
            significant,
            pos: 0,
            emitted: 0,
            builder: CstBuilder::new(),
            errors: Vec::new(),
            query_depth: 0,
        }
    }

    fn finish(self) -> (SyntaxNode, Vec<ParseError>) {
        (self.builder.finish(), self.errors)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn parse_compilation_unit(&mut self) {
        // The root owns every byte, including leading trivia
        self.builder.start_node(SyntaxKind::CompilationUnit);
        while !self.at_end() {
            let before = self.pos;
            match self.current_kind() {
                SyntaxKind::UsingKw if !self.at_using_statement() => self.parse_using_directive(),
                SyntaxKind::NamespaceKw => self.parse_namespace(),
                _ if self.at_member_start() => self.parse_member(),
                _ => self.parse_statement(),
            }
            self.ensure_progress(before);
        }
        self.flush_trivia_all();
        self.builder.finish_node();
    }

    fn parse_using_directive(&mut self) {
        self.start(SyntaxKind::UsingDirective);
        self.bump(); // using
        if self.at(SyntaxKind::StaticKw) {
            self.bump();
        }
        if self.at(SyntaxKind::Ident) && self.nth(1) == SyntaxKind::Eq {
            self.bump();
            self.bump();
        }
        self.parse_type(TypeContext::Declaration);
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_namespace(&mut self) {
        let checkpoint = self.checkpoint();
        self.bump(); // namespace
        self.parse_type(TypeContext::Declaration);
        if self.at(SyntaxKind::Semicolon) {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::FileScopedNamespaceDecl);
            self.bump();
            while !self.at_end() {
                let before = self.pos;
                self.parse_namespace_member();
                self.ensure_progress(before);
            }
        } else {
            self.builder.start_node_at(checkpoint, SyntaxKind::NamespaceDecl);
            self.expect(SyntaxKind::LBrace);
            while !self.at_end() && !self.at(SyntaxKind::RBrace) {
                let before = self.pos;
                self.parse_namespace_member();
                self.ensure_progress(before);
            }
            self.expect(SyntaxKind::RBrace);
        }
        self.finish_node();
    }

    fn parse_namespace_member(&mut self) {
        match self.current_kind() {
            SyntaxKind::UsingKw => self.parse_using_directive(),
            SyntaxKind::NamespaceKw => self.parse_namespace(),
            _ => self.parse_member(),
        }
    }

    /// Parse a type member or a type declaration
    fn parse_member(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_attributes();
        self.parse_modifiers();

        match self.current_kind() {
            SyntaxKind::ClassKw => self.parse_type_decl(checkpoint, SyntaxKind::ClassDecl),
            SyntaxKind::StructKw => self.parse_type_decl(checkpoint, SyntaxKind::StructDecl),
            SyntaxKind::InterfaceKw => {
                self.parse_type_decl(checkpoint, SyntaxKind::InterfaceDecl)
            }
            SyntaxKind::EnumKw => self.parse_enum_decl(checkpoint),
            SyntaxKind::DelegateKw => self.parse_delegate_decl(checkpoint),
            SyntaxKind::EventKw => self.parse_event(checkpoint),
            SyntaxKind::Tilde => self.parse_destructor(checkpoint),
            SyntaxKind::ImplicitKw | SyntaxKind::ExplicitKw => {
                self.builder.start_node_at(checkpoint, SyntaxKind::MethodDecl);
                self.bump();
                self.expect(SyntaxKind::OperatorKw);
                self.parse_type(TypeContext::Declaration);
                self.parse_method_rest();
                self.finish_node();
            }
            SyntaxKind::Ident if self.nth(1) == SyntaxKind::LParen => {
                self.parse_constructor(checkpoint)
            }
            _ if self.at_type_start() => self.parse_typed_member(checkpoint),
            _ => {
                self.builder.start_node_at(checkpoint, SyntaxKind::Error);
                self.error_here(ParseErrorKind::Unexpected, "expected a member declaration");
                if !self.at(SyntaxKind::RBrace) {
                    self.bump();
                }
                self.finish_node();
            }
        }
    }

    fn parse_attributes(&mut self) {
        while self.at(SyntaxKind::LBracket) {
            self.start(SyntaxKind::AttributeList);
            self.bump();
            // Optional target such as `assembly:` or `return:`
            if self.nth(1) == SyntaxKind::Colon
                && matches!(self.current_kind(), SyntaxKind::Ident | SyntaxKind::ReturnKw)
            {
                self.bump();
                self.bump();
            }
            while !self.at_end() && !self.at(SyntaxKind::RBracket) {
                let before = self.pos;
                self.start(SyntaxKind::Attribute);
                self.parse_type(TypeContext::Declaration);
                if self.at(SyntaxKind::LParen) {
                    self.parse_argument_list();
                }
                self.finish_node();
                if !self.eat(SyntaxKind::Comma) {
                    self.ensure_progress(before);
                    break;
                }
            }
            self.expect(SyntaxKind::RBracket);
            self.finish_node();
        }
    }

    fn parse_modifiers(&mut self) {
        loop {
            let kind = self.current_kind();
            if kind.is_modifier() && kind != SyntaxKind::AsyncKw && kind != SyntaxKind::PartialKw {
                self.bump();
                continue;
            }
            if self.at(SyntaxKind::Ident) {
                let remapped = match self.current_text() {
                    "async" => Some(SyntaxKind::AsyncKw),
                    "partial"
                        if matches!(
                            self.nth(1),
                            SyntaxKind::ClassKw
                                | SyntaxKind::StructKw
                                | SyntaxKind::InterfaceKw
                                | SyntaxKind::VoidKw
                        ) =>
                    {
                        Some(SyntaxKind::PartialKw)
                    }
                    _ => None,
                };
                // `async` is only a modifier when a member type follows it
                if let Some(kind) = remapped
                    && (kind == SyntaxKind::PartialKw || self.nth_starts_type(1))
                {
                    self.bump_as(kind);
                    continue;
                }
            }
            break;
        }
    }

    fn parse_type_decl(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind);
        self.bump(); // class / struct / interface
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        if self.at(SyntaxKind::Colon) {
            self.parse_base_list();
        }
        self.parse_constraint_clauses();
        self.parse_member_body();
        self.eat(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_member_body(&mut self) {
        self.expect(SyntaxKind::LBrace);
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            let before = self.pos;
            self.parse_member();
            self.ensure_progress(before);
        }
        self.expect(SyntaxKind::RBrace);
    }

    fn parse_base_list(&mut self) {
        self.start(SyntaxKind::BaseList);
        self.bump(); // :
        self.parse_type(TypeContext::Declaration);
        while self.eat(SyntaxKind::Comma) {
            self.parse_type(TypeContext::Declaration);
        }
        self.finish_node();
    }

    fn parse_enum_decl(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, SyntaxKind::EnumDecl);
        self.bump(); // enum
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Colon) {
            self.parse_base_list();
        }
        self.expect(SyntaxKind::LBrace);
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            let before = self.pos;
            self.start(SyntaxKind::EnumMember);
            self.parse_attributes();
            self.expect(SyntaxKind::Ident);
            if self.at(SyntaxKind::Eq) {
                self.start(SyntaxKind::EqualsValueClause);
                self.bump();
                self.parse_expr();
                self.finish_node();
            }
            self.finish_node();
            if !self.eat(SyntaxKind::Comma) {
                self.ensure_progress(before);
                break;
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.eat(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_delegate_decl(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, SyntaxKind::DelegateDecl);
        self.bump(); // delegate
        self.parse_type(TypeContext::Declaration);
        self.expect(SyntaxKind::Ident);
        if self.at(SyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        self.parse_parameter_list();
        self.parse_constraint_clauses();
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_event(&mut self, checkpoint: Checkpoint) {
        // Decide the node kind before building: accessor-style events have a
        // brace right after the (possibly qualified) name.
        let after_type = self.scan_type(1);
        let mut name_end = after_type.unwrap_or(1);
        while self.nth(name_end) == SyntaxKind::Ident && self.nth(name_end + 1) == SyntaxKind::Dot {
            name_end += 2;
        }
        let has_accessors = self.nth(name_end + 1) == SyntaxKind::LBrace;

        if has_accessors {
            self.builder.start_node_at(checkpoint, SyntaxKind::EventDecl);
            self.bump(); // event
            self.parse_type(TypeContext::Declaration);
            self.parse_member_name();
            self.parse_accessor_list();
        } else {
            self.builder.start_node_at(checkpoint, SyntaxKind::EventFieldDecl);
            self.bump(); // event
            self.parse_variable_declaration();
            self.expect(SyntaxKind::Semicolon);
        }
        self.finish_node();
    }

    fn parse_destructor(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, SyntaxKind::DestructorDecl);
        self.bump(); // ~
        self.expect(SyntaxKind::Ident);
        self.parse_parameter_list();
        self.parse_body_or_semicolon();
        self.finish_node();
    }

    fn parse_constructor(&mut self, checkpoint: Checkpoint) {
        self.builder.start_node_at(checkpoint, SyntaxKind::ConstructorDecl);
        self.bump(); // name
        self.parse_parameter_list();
        if self.at(SyntaxKind::Colon) {
            self.start(SyntaxKind::ConstructorInitializer);
            self.bump();
            if self.at(SyntaxKind::BaseKw) || self.at(SyntaxKind::ThisKw) {
                self.bump();
            } else {
                self.error_here(ParseErrorKind::Expected, "expected 'base' or 'this'");
            }
            self.parse_argument_list();
            self.finish_node();
        }
        self.parse_body_or_semicolon();
        self.finish_node();
    }

    /// Members that start with a type: methods, properties, indexers, fields
    fn parse_typed_member(&mut self, checkpoint: Checkpoint) {
        let name_at = self.scan_type(0).unwrap_or(1);

        match self.nth(name_at) {
            SyntaxKind::ThisKw => {
                self.builder.start_node_at(checkpoint, SyntaxKind::IndexerDecl);
                self.parse_type(TypeContext::Declaration);
                self.bump(); // this
                self.parse_bracketed_parameter_list();
                self.parse_property_body();
                self.finish_node();
            }
            SyntaxKind::OperatorKw => {
                self.builder.start_node_at(checkpoint, SyntaxKind::MethodDecl);
                self.parse_type(TypeContext::Declaration);
                self.bump(); // operator
                // Operator token(s), e.g. `+`, `==`, `true`
                if !self.at(SyntaxKind::LParen) {
                    self.bump();
                }
                if self.at(SyntaxKind::Gt) && !self.at(SyntaxKind::LParen) {
                    self.bump();
                }
                self.parse_method_rest();
                self.finish_node();
            }
            SyntaxKind::Ident => {
                let mut after_name = name_at + 1;
                // Explicit interface implementation: `IFoo.Bar` / `IFoo.this[...]`
                while self.nth(after_name) == SyntaxKind::Dot
                    && matches!(self.nth(after_name + 1), SyntaxKind::Ident | SyntaxKind::ThisKw)
                {
                    after_name += 2;
                }
                match self.nth(after_name) {
                    SyntaxKind::LParen | SyntaxKind::Lt => {
                        self.builder.start_node_at(checkpoint, SyntaxKind::MethodDecl);
                        self.parse_type(TypeContext::Declaration);
                        self.parse_member_name();
                        if self.at(SyntaxKind::Lt) {
                            self.parse_type_parameter_list();
                        }
                        self.parse_method_rest();
                    }
                    SyntaxKind::LBrace | SyntaxKind::FatArrow => {
                        self.builder.start_node_at(checkpoint, SyntaxKind::PropertyDecl);
                        self.parse_type(TypeContext::Declaration);
                        self.parse_member_name();
                        self.parse_property_body();
                    }
                    SyntaxKind::LBracket if self.nth(after_name - 1) == SyntaxKind::ThisKw => {
                        self.builder.start_node_at(checkpoint, SyntaxKind::IndexerDecl);
                        self.parse_type(TypeContext::Declaration);
                        self.parse_member_name();
                        self.parse_bracketed_parameter_list();
                        self.parse_property_body();
                    }
                    _ => {
                        self.builder.start_node_at(checkpoint, SyntaxKind::FieldDecl);
                        self.parse_variable_declaration();
                        self.expect(SyntaxKind::Semicolon);
                    }
                }
                self.finish_node();
            }
            _ => {
                self.builder.start_node_at(checkpoint, SyntaxKind::FieldDecl);
                self.parse_variable_declaration();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
        }
    }

    /// Member name, possibly qualified by an explicit interface
    fn parse_member_name(&mut self) {
        if self.at(SyntaxKind::ThisKw) {
            self.bump();
            return;
        }
        self.expect(SyntaxKind::Ident);
        while self.at(SyntaxKind::Dot)
            && matches!(self.nth(1), SyntaxKind::Ident | SyntaxKind::ThisKw)
        {
            self.bump();
            self.bump();
        }
    }

    fn parse_method_rest(&mut self) {
        self.parse_parameter_list();
        self.parse_constraint_clauses();
        self.parse_body_or_semicolon();
    }

    fn parse_body_or_semicolon(&mut self) {
        match self.current_kind() {
            SyntaxKind::LBrace => self.parse_block(),
            SyntaxKind::FatArrow => {
                self.parse_arrow_clause();
                self.expect(SyntaxKind::Semicolon);
            }
            _ => {
                self.expect(SyntaxKind::Semicolon);
            }
        }
    }

    fn parse_arrow_clause(&mut self) {
        self.start(SyntaxKind::ArrowExprClause);
        self.bump(); // =>
        self.parse_expr();
        self.finish_node();
    }

    fn parse_property_body(&mut self) {
        if self.at(SyntaxKind::FatArrow) {
            self.parse_arrow_clause();
            self.expect(SyntaxKind::Semicolon);
            return;
        }
        self.parse_accessor_list();
        if self.at(SyntaxKind::Eq) {
            self.start(SyntaxKind::EqualsValueClause);
            self.bump();
            self.parse_variable_initializer();
            self.finish_node();
            self.expect(SyntaxKind::Semicolon);
        }
    }

    fn parse_accessor_list(&mut self) {
        self.start(SyntaxKind::AccessorList);
        self.expect(SyntaxKind::LBrace);
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            let before = self.pos;
            self.start(SyntaxKind::Accessor);
            self.parse_attributes();
            while matches!(
                self.current_kind(),
                SyntaxKind::PrivateKw
                    | SyntaxKind::ProtectedKw
                    | SyntaxKind::InternalKw
                    | SyntaxKind::ReadonlyKw
            ) {
                self.bump();
            }
            let keyword = match self.current_text() {
                "get" => Some(SyntaxKind::GetKw),
                "set" => Some(SyntaxKind::SetKw),
                "init" => Some(SyntaxKind::InitKw),
                "add" => Some(SyntaxKind::AddKw),
                "remove" => Some(SyntaxKind::RemoveKw),
                _ => None,
            };
            match keyword {
                Some(kind) if self.at(SyntaxKind::Ident) => {
                    self.bump_as(kind);
                    self.parse_body_or_semicolon();
                }
                _ => {
                    self.error_here(ParseErrorKind::Expected, "expected an accessor");
                    self.bump();
                }
            }
            self.finish_node();
            self.ensure_progress(before);
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn parse_parameter_list(&mut self) {
        self.start(SyntaxKind::ParameterList);
        self.expect(SyntaxKind::LParen);
        self.parse_parameters(SyntaxKind::RParen);
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    fn parse_bracketed_parameter_list(&mut self) {
        self.start(SyntaxKind::BracketedParameterList);
        self.expect(SyntaxKind::LBracket);
        self.parse_parameters(SyntaxKind::RBracket);
        self.expect(SyntaxKind::RBracket);
        self.finish_node();
    }

    fn parse_parameters(&mut self, close: SyntaxKind) {
        while !self.at_end() && !self.at(close) {
            let before = self.pos;
            self.start(SyntaxKind::Parameter);
            self.parse_attributes();
            self.parse_parameter_modifiers();
            self.parse_type(TypeContext::Declaration);
            self.expect(SyntaxKind::Ident);
            if self.at(SyntaxKind::Eq) {
                self.start(SyntaxKind::EqualsValueClause);
                self.bump();
                self.parse_expr();
                self.finish_node();
            }
            self.finish_node();
            if !self.eat(SyntaxKind::Comma) {
                self.ensure_progress(before);
                break;
            }
        }
    }

    fn parse_parameter_modifiers(&mut self) {
        while matches!(
            self.current_kind(),
            SyntaxKind::RefKw
                | SyntaxKind::OutKw
                | SyntaxKind::InKw
                | SyntaxKind::ParamsKw
                | SyntaxKind::ThisKw
                | SyntaxKind::ReadonlyKw
        ) {
            self.bump();
        }
    }

    fn parse_type_parameter_list(&mut self) {
        self.start(SyntaxKind::TypeParameterList);
        self.bump(); // <
        while !self.at_end() && !self.at(SyntaxKind::Gt) {
            let before = self.pos;
            self.start(SyntaxKind::TypeParameter);
            self.parse_attributes();
            if matches!(self.current_kind(), SyntaxKind::InKw | SyntaxKind::OutKw) {
                self.bump();
            }
            self.expect(SyntaxKind::Ident);
            self.finish_node();
            if !self.eat(SyntaxKind::Comma) {
                self.ensure_progress(before);
                break;
            }
        }
        self.expect(SyntaxKind::Gt);
        self.finish_node();
    }

    fn parse_constraint_clauses(&mut self) {
        while self.at_contextual("where") && self.nth(1) == SyntaxKind::Ident {
            self.start(SyntaxKind::ConstraintClause);
            self.bump_as(SyntaxKind::WhereKw);
            self.bump(); // type parameter
            self.expect(SyntaxKind::Colon);
            loop {
                match self.current_kind() {
                    SyntaxKind::ClassKw | SyntaxKind::StructKw => {
                        self.bump();
                        self.eat(SyntaxKind::Question);
                    }
                    SyntaxKind::NewKw => {
                        self.bump();
                        self.expect(SyntaxKind::LParen);
                        self.expect(SyntaxKind::RParen);
                    }
                    _ => self.parse_type(TypeContext::Declaration),
                }
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.finish_node();
        }
    }

    /// `Type a = 1, b` without the trailing semicolon
    fn parse_variable_declaration(&mut self) {
        self.start(SyntaxKind::VariableDecl);
        self.parse_type(TypeContext::Declaration);
        loop {
            self.start(SyntaxKind::VariableDeclarator);
            self.expect(SyntaxKind::Ident);
            if self.at(SyntaxKind::LBracket) {
                // Fixed-size buffer: `fixed int buf[16]`
                self.start(SyntaxKind::BracketedArgumentList);
                self.bump();
                self.parse_expr();
                self.expect(SyntaxKind::RBracket);
                self.finish_node();
            }
            if self.at(SyntaxKind::Eq) {
                self.start(SyntaxKind::EqualsValueClause);
                self.bump();
                self.parse_variable_initializer();
                self.finish_node();
            }
            self.finish_node();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.finish_node();
    }

    fn parse_variable_initializer(&mut self) {
        if self.at(SyntaxKind::LBrace) {
            self.parse_initializer();
        } else {
            self.parse_expr();
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_block(&mut self) {
        self.start(SyntaxKind::Block);
        self.expect(SyntaxKind::LBrace);
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            let before = self.pos;
            self.parse_statement();
            self.ensure_progress(before);
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn parse_embedded_statement(&mut self) {
        if self.at_end() {
            self.error_here(ParseErrorKind::Expected, "expected a statement");
            return;
        }
        self.parse_statement();
    }

    fn parse_statement(&mut self) {
        match self.current_kind() {
            SyntaxKind::LBrace => self.parse_block(),
            SyntaxKind::Semicolon => {
                self.start(SyntaxKind::EmptyStmt);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::IfKw => self.parse_if(),
            SyntaxKind::WhileKw => {
                self.start(SyntaxKind::WhileStmt);
                self.bump();
                self.parse_paren_condition();
                self.parse_embedded_statement();
                self.finish_node();
            }
            SyntaxKind::DoKw => {
                self.start(SyntaxKind::DoStmt);
                self.bump();
                self.parse_embedded_statement();
                self.expect(SyntaxKind::WhileKw);
                self.parse_paren_condition();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            SyntaxKind::ForKw => self.parse_for(),
            SyntaxKind::ForeachKw => self.parse_foreach(),
            SyntaxKind::ReturnKw => self.parse_jump(SyntaxKind::ReturnStmt),
            SyntaxKind::ThrowKw => self.parse_jump(SyntaxKind::ThrowStmt),
            SyntaxKind::BreakKw => self.parse_jump(SyntaxKind::BreakStmt),
            SyntaxKind::ContinueKw => self.parse_jump(SyntaxKind::ContinueStmt),
            SyntaxKind::UsingKw => self.parse_using_statement(),
            SyntaxKind::LockKw => {
                self.start(SyntaxKind::LockStmt);
                self.bump();
                self.parse_paren_condition();
                self.parse_embedded_statement();
                self.finish_node();
            }
            SyntaxKind::FixedKw => {
                self.start(SyntaxKind::FixedStmt);
                self.bump();
                self.expect(SyntaxKind::LParen);
                self.parse_variable_declaration();
                self.expect(SyntaxKind::RParen);
                self.parse_embedded_statement();
                self.finish_node();
            }
            SyntaxKind::SwitchKw => self.parse_switch(),
            SyntaxKind::GotoKw => self.parse_goto(),
            SyntaxKind::TryKw => self.parse_try(),
            SyntaxKind::CheckedKw | SyntaxKind::UncheckedKw
                if self.nth(1) == SyntaxKind::LBrace =>
            {
                self.start(SyntaxKind::CheckedStmt);
                self.bump();
                self.parse_block();
                self.finish_node();
            }
            SyntaxKind::ConstKw => {
                self.start(SyntaxKind::LocalDeclStmt);
                self.bump();
                self.parse_variable_declaration();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            SyntaxKind::Ident
                if self.current_text() == "yield"
                    && matches!(self.nth(1), SyntaxKind::ReturnKw | SyntaxKind::BreakKw) =>
            {
                self.parse_yield()
            }
            SyntaxKind::RBrace | SyntaxKind::RParen | SyntaxKind::RBracket => {
                self.start(SyntaxKind::Error);
                self.error_here(ParseErrorKind::Unexpected, "unexpected closing delimiter");
                self.bump();
                self.finish_node();
            }
            _ if self.at_local_function() => self.parse_member(),
            _ if self.at_local_declaration() => {
                self.start(SyntaxKind::LocalDeclStmt);
                self.parse_variable_declaration();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
            _ => {
                self.start(SyntaxKind::ExprStmt);
                self.parse_expr();
                self.expect(SyntaxKind::Semicolon);
                self.finish_node();
            }
        }
    }

    /// `( expr )` as used by `if`, `while`, `lock` and friends
    fn parse_paren_condition(&mut self) {
        self.expect(SyntaxKind::LParen);
        self.parse_expr();
        self.expect(SyntaxKind::RParen);
    }

    fn parse_if(&mut self) {
        self.start(SyntaxKind::IfStmt);
        self.bump();
        self.parse_paren_condition();
        self.parse_embedded_statement();
        if self.at(SyntaxKind::ElseKw) {
            self.start(SyntaxKind::ElseClause);
            self.bump();
            self.parse_embedded_statement();
            self.finish_node();
        }
        self.finish_node();
    }

    fn parse_for(&mut self) {
        self.start(SyntaxKind::ForStmt);
        self.bump();
        self.expect(SyntaxKind::LParen);
        if !self.at(SyntaxKind::Semicolon) {
            if self.at_local_declaration() {
                self.parse_variable_declaration();
            } else {
                self.parse_expr_list(SyntaxKind::Semicolon);
            }
        }
        self.expect(SyntaxKind::Semicolon);
        if !self.at(SyntaxKind::Semicolon) {
            self.parse_expr();
        }
        self.expect(SyntaxKind::Semicolon);
        if !self.at(SyntaxKind::RParen) {
            self.parse_expr_list(SyntaxKind::RParen);
        }
        self.expect(SyntaxKind::RParen);
        self.parse_embedded_statement();
        self.finish_node();
    }

    fn parse_expr_list(&mut self, close: SyntaxKind) {
        loop {
            self.parse_expr();
            if self.at(close) || !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
    }

    fn parse_foreach(&mut self) {
        self.start(SyntaxKind::ForeachStmt);
        self.bump();
        self.expect(SyntaxKind::LParen);
        self.parse_type(TypeContext::Declaration);
        self.expect(SyntaxKind::Ident);
        self.expect(SyntaxKind::InKw);
        self.parse_expr();
        self.expect(SyntaxKind::RParen);
        self.parse_embedded_statement();
        self.finish_node();
    }

    /// `return`, `throw`, `break` and `continue`
    fn parse_jump(&mut self, kind: SyntaxKind) {
        self.start(kind);
        self.bump();
        let takes_expr = matches!(kind, SyntaxKind::ReturnStmt | SyntaxKind::ThrowStmt);
        if takes_expr && !self.at(SyntaxKind::Semicolon) && !self.at_end() {
            self.parse_expr();
        }
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_yield(&mut self) {
        let kind = if self.nth(1) == SyntaxKind::ReturnKw {
            SyntaxKind::YieldReturnStmt
        } else {
            SyntaxKind::YieldBreakStmt
        };
        self.start(kind);
        self.bump_as(SyntaxKind::YieldKw);
        self.bump(); // return / break
        if kind == SyntaxKind::YieldReturnStmt {
            self.parse_expr();
        }
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_using_statement(&mut self) {
        if self.nth(1) == SyntaxKind::LParen {
            self.start(SyntaxKind::UsingStmt);
            self.bump();
            self.bump(); // (
            if self.at_local_declaration() {
                self.parse_variable_declaration();
            } else {
                self.parse_expr();
            }
            self.expect(SyntaxKind::RParen);
            self.parse_embedded_statement();
            self.finish_node();
        } else {
            // `using var x = ...;`
            self.start(SyntaxKind::LocalDeclStmt);
            self.bump();
            self.parse_variable_declaration();
            self.expect(SyntaxKind::Semicolon);
            self.finish_node();
        }
    }

    fn parse_switch(&mut self) {
        self.start(SyntaxKind::SwitchStmt);
        self.bump();
        self.parse_paren_condition();
        self.expect(SyntaxKind::LBrace);
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            let before = self.pos;
            self.start(SyntaxKind::SwitchSection);
            while self.at_switch_label() {
                if self.at(SyntaxKind::CaseKw) {
                    self.start(SyntaxKind::CaseLabel);
                    self.bump();
                    self.parse_expr();
                } else {
                    self.start(SyntaxKind::DefaultLabel);
                    self.bump();
                }
                self.expect(SyntaxKind::Colon);
                self.finish_node();
            }
            while !self.at_end() && !self.at(SyntaxKind::RBrace) && !self.at_switch_label() {
                let stmt_start = self.pos;
                self.parse_statement();
                self.ensure_progress(stmt_start);
            }
            self.finish_node();
            self.ensure_progress(before);
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn at_switch_label(&self) -> bool {
        self.at(SyntaxKind::CaseKw)
            || (self.at(SyntaxKind::DefaultKw) && self.nth(1) == SyntaxKind::Colon)
    }

    fn parse_goto(&mut self) {
        match self.nth(1) {
            SyntaxKind::CaseKw => {
                self.start(SyntaxKind::GotoCaseStmt);
                self.bump();
                self.bump();
                self.parse_expr();
            }
            SyntaxKind::DefaultKw => {
                self.start(SyntaxKind::GotoDefaultStmt);
                self.bump();
                self.bump();
            }
            _ => {
                self.start(SyntaxKind::GotoStmt);
                self.bump();
                self.expect(SyntaxKind::Ident);
            }
        }
        self.expect(SyntaxKind::Semicolon);
        self.finish_node();
    }

    fn parse_try(&mut self) {
        self.start(SyntaxKind::TryStmt);
        self.bump();
        self.parse_block();
        while self.at(SyntaxKind::CatchKw) {
            self.start(SyntaxKind::CatchClause);
            self.bump();
            if self.at(SyntaxKind::LParen) {
                self.start(SyntaxKind::CatchDecl);
                self.bump();
                self.parse_type(TypeContext::Declaration);
                self.eat(SyntaxKind::Ident);
                self.expect(SyntaxKind::RParen);
                self.finish_node();
            }
            if self.at_contextual("when") {
                self.bump();
                self.parse_paren_condition();
            }
            self.parse_block();
            self.finish_node();
        }
        if self.at(SyntaxKind::FinallyKw) {
            self.start(SyntaxKind::FinallyClause);
            self.bump();
            self.parse_block();
            self.finish_node();
        }
        self.finish_node();
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expr(&mut self) {
        if self.at_end() {
            self.error_here(ParseErrorKind::Expected, "expected an expression");
            return;
        }
        self.parse_assignment();
    }

    fn parse_assignment(&mut self) {
        if self.at_lambda() {
            self.parse_lambda();
            return;
        }
        if self.at_query() {
            self.parse_query();
            return;
        }

        let checkpoint = self.checkpoint();
        self.parse_conditional();

        // `>>=` lexes as `>` followed by an adjacent `>=`
        let shift_assign = self.at(SyntaxKind::Gt)
            && self.nth(1) == SyntaxKind::GtEq
            && self.nth_adjacent(0);
        if is_assignment_op(self.current_kind()) || shift_assign {
            self.builder.start_node_at(checkpoint, SyntaxKind::AssignmentExpr);
            self.bump();
            if shift_assign {
                self.bump();
            }
            if self.at(SyntaxKind::LBrace) {
                // Nested object/collection initializer: `Prop = { ... }`
                self.parse_initializer();
            } else {
                self.parse_assignment();
            }
            self.finish_node();
        }
    }

    fn parse_conditional(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_coalesce();
        if self.at(SyntaxKind::Question) {
            self.builder.start_node_at(checkpoint, SyntaxKind::ConditionalExpr);
            self.bump();
            self.parse_expr();
            self.expect(SyntaxKind::Colon);
            self.parse_expr();
            self.finish_node();
        }
    }

    fn parse_coalesce(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_binary(1);
        if self.at(SyntaxKind::QuestionQuestion) {
            self.builder.start_node_at(checkpoint, SyntaxKind::CoalesceExpr);
            self.bump();
            // Right associative
            self.parse_coalesce();
            self.finish_node();
        }
    }

    /// Precedence climbing over the binary operators
    fn parse_binary(&mut self, min_prec: u8) {
        let checkpoint = self.checkpoint();
        self.parse_unary();

        loop {
            let (prec, width) = match self.binary_op() {
                Some(op) => op,
                None => break,
            };
            if prec < min_prec {
                break;
            }

            match self.current_kind() {
                SyntaxKind::IsKw => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::IsExpr);
                    self.bump();
                    self.parse_is_pattern();
                }
                SyntaxKind::AsKw => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::AsExpr);
                    self.bump();
                    self.parse_type(TypeContext::Expression);
                }
                _ => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::BinaryExpr);
                    for _ in 0..width {
                        self.bump();
                    }
                    self.parse_binary(prec + 1);
                }
            }
            self.finish_node();
        }
    }

    /// Precedence and token width of the binary operator at the cursor
    fn binary_op(&self) -> Option<(u8, usize)> {
        let prec = match self.current_kind() {
            SyntaxKind::PipePipe => 1,
            SyntaxKind::AmpAmp => 2,
            SyntaxKind::Pipe => 3,
            SyntaxKind::Caret => 4,
            SyntaxKind::Amp => 5,
            SyntaxKind::EqEq | SyntaxKind::BangEq => 6,
            SyntaxKind::Gt if self.nth(1) == SyntaxKind::Gt && self.nth_adjacent(0) => {
                return Some((8, 2));
            }
            SyntaxKind::Gt if self.nth(1) == SyntaxKind::GtEq && self.nth_adjacent(0) => {
                return None;
            }
            SyntaxKind::Lt
            | SyntaxKind::Gt
            | SyntaxKind::LtEq
            | SyntaxKind::GtEq
            | SyntaxKind::IsKw
            | SyntaxKind::AsKw => 7,
            SyntaxKind::Shl => 8,
            SyntaxKind::Plus | SyntaxKind::Minus => 9,
            SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => 10,
            _ => return None,
        };
        Some((prec, 1))
    }

    fn parse_is_pattern(&mut self) {
        if self.at_contextual("not") {
            self.bump();
        }
        if self.at(SyntaxKind::LParen) {
            self.start(SyntaxKind::ParenPattern);
            self.bump();
            self.parse_is_pattern();
            self.expect(SyntaxKind::RParen);
            self.finish_node();
            return;
        }
        if self.current_kind().is_literal() || self.at(SyntaxKind::Minus) {
            self.parse_unary();
            return;
        }
        self.parse_type(TypeContext::Expression);
        // Declaration pattern: `x is Foo foo`
        if self.at(SyntaxKind::Ident) && !self.at_contextual("and") && !self.at_contextual("or") {
            self.bump();
        }
    }

    fn parse_unary(&mut self) {
        match self.current_kind() {
            SyntaxKind::Bang
            | SyntaxKind::Tilde
            | SyntaxKind::Minus
            | SyntaxKind::Plus
            | SyntaxKind::PlusPlus
            | SyntaxKind::MinusMinus
            | SyntaxKind::Amp
            | SyntaxKind::Star
            | SyntaxKind::Caret => {
                self.start(SyntaxKind::PrefixUnaryExpr);
                self.bump();
                self.parse_unary();
                self.finish_node();
            }
            SyntaxKind::Ident if self.at_await() => {
                self.start(SyntaxKind::AwaitExpr);
                self.bump_as(SyntaxKind::AwaitKw);
                self.parse_unary();
                self.finish_node();
            }
            SyntaxKind::LParen if self.at_cast() => {
                self.start(SyntaxKind::CastExpr);
                self.bump();
                self.parse_type(TypeContext::Declaration);
                self.expect(SyntaxKind::RParen);
                self.parse_unary();
                self.finish_node();
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_primary();

        loop {
            match self.current_kind() {
                SyntaxKind::Dot | SyntaxKind::ColonColon => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::MemberAccessExpr);
                    self.bump();
                    self.parse_simple_name();
                    self.finish_node();
                }
                SyntaxKind::QuestionDot => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ConditionalAccessExpr);
                    self.bump();
                    self.parse_simple_name();
                    self.finish_node();
                }
                SyntaxKind::Arrow => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::MemberAccessExpr);
                    self.bump();
                    self.parse_simple_name();
                    self.finish_node();
                }
                SyntaxKind::LParen => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::InvocationExpr);
                    self.parse_argument_list();
                    self.finish_node();
                }
                SyntaxKind::LBracket => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ElementAccessExpr);
                    self.parse_bracketed_argument_list();
                    self.finish_node();
                }
                SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::PostfixUnaryExpr);
                    self.bump();
                    self.finish_node();
                }
                // Null-forgiving `x!` before a member access or a closer
                SyntaxKind::Bang
                    if matches!(
                        self.nth(1),
                        SyntaxKind::Dot
                            | SyntaxKind::RParen
                            | SyntaxKind::Semicolon
                            | SyntaxKind::Comma
                            | SyntaxKind::LBracket
                    ) =>
                {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::PostfixUnaryExpr);
                    self.bump();
                    self.finish_node();
                }
                _ => break,
            }
        }
    }

    /// Identifier optionally followed by type arguments
    fn parse_simple_name(&mut self) {
        if self.at(SyntaxKind::Ident) && self.at_generic_name() {
            self.start(SyntaxKind::GenericNameExpr);
            self.bump();
            self.parse_type_argument_list();
            self.finish_node();
        } else {
            self.start(SyntaxKind::NameExpr);
            self.expect(SyntaxKind::Ident);
            self.finish_node();
        }
    }

    fn parse_primary(&mut self) {
        let kind = self.current_kind();
        match kind {
            _ if kind.is_literal() => {
                self.start(SyntaxKind::LiteralExpr);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::Ident if self.at_contextual("nameof") && self.nth(1) == SyntaxKind::LParen => {
                self.start(SyntaxKind::NameofExpr);
                self.bump_as(SyntaxKind::NameofKw);
                self.parse_argument_list();
                self.finish_node();
            }
            SyntaxKind::Ident => self.parse_simple_name(),
            SyntaxKind::ThisKw => {
                self.start(SyntaxKind::ThisExpr);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::BaseKw => {
                self.start(SyntaxKind::BaseExpr);
                self.bump();
                self.finish_node();
            }
            _ if kind.is_predefined_type() => {
                self.start(SyntaxKind::PredefinedTypeExpr);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::LParen => {
                self.start(SyntaxKind::ParenExpr);
                self.bump();
                self.parse_expr();
                self.expect(SyntaxKind::RParen);
                self.finish_node();
            }
            SyntaxKind::NewKw => self.parse_new(),
            SyntaxKind::TypeofKw | SyntaxKind::SizeofKw => {
                let node = if kind == SyntaxKind::TypeofKw {
                    SyntaxKind::TypeofExpr
                } else {
                    SyntaxKind::SizeofExpr
                };
                self.start(node);
                self.bump();
                self.expect(SyntaxKind::LParen);
                self.parse_type(TypeContext::Declaration);
                self.expect(SyntaxKind::RParen);
                self.finish_node();
            }
            SyntaxKind::DefaultKw => {
                if self.nth(1) == SyntaxKind::LParen {
                    self.start(SyntaxKind::DefaultExpr);
                    self.bump();
                    self.bump();
                    self.parse_type(TypeContext::Declaration);
                    self.expect(SyntaxKind::RParen);
                } else {
                    self.start(SyntaxKind::DefaultLiteralExpr);
                    self.bump();
                }
                self.finish_node();
            }
            SyntaxKind::CheckedKw | SyntaxKind::UncheckedKw => {
                self.start(SyntaxKind::CheckedExpr);
                self.bump();
                self.parse_paren_condition();
                self.finish_node();
            }
            SyntaxKind::StackallocKw => {
                self.start(SyntaxKind::StackallocExpr);
                self.bump();
                if !self.at(SyntaxKind::LBracket) {
                    self.parse_non_array_type();
                }
                self.parse_bracketed_argument_list();
                if self.at(SyntaxKind::LBrace) {
                    self.parse_initializer();
                }
                self.finish_node();
            }
            SyntaxKind::LBrace => self.parse_initializer(),
            _ => {
                self.start(SyntaxKind::Error);
                self.error_here(ParseErrorKind::Unexpected, "expected an expression");
                if !self.at_closer() && !self.at_end() {
                    self.bump();
                }
                self.finish_node();
            }
        }
    }

    fn parse_new(&mut self) {
        match self.nth(1) {
            SyntaxKind::LBracket => {
                // `new[] { ... }`
                self.start(SyntaxKind::ImplicitArrayCreationExpr);
                self.bump();
                self.bump();
                while self.eat(SyntaxKind::Comma) {}
                self.expect(SyntaxKind::RBracket);
                self.parse_initializer();
                self.finish_node();
            }
            SyntaxKind::LParen => {
                // Target-typed `new(...)`
                self.start(SyntaxKind::ImplicitObjectCreationExpr);
                self.bump();
                self.parse_argument_list();
                if self.at(SyntaxKind::LBrace) {
                    self.parse_initializer();
                }
                self.finish_node();
            }
            SyntaxKind::LBrace => {
                // Anonymous object
                self.start(SyntaxKind::ObjectCreationExpr);
                self.bump();
                self.parse_initializer();
                self.finish_node();
            }
            _ => {
                let checkpoint = self.checkpoint();
                self.bump(); // new
                self.parse_non_array_type();
                if self.at(SyntaxKind::LBracket) {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ArrayCreationExpr);
                    if self.nth(1) == SyntaxKind::RBracket || self.nth(1) == SyntaxKind::Comma {
                        self.parse_array_ranks();
                    } else {
                        self.parse_bracketed_argument_list();
                        self.parse_array_ranks();
                    }
                } else {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::ObjectCreationExpr);
                    if self.at(SyntaxKind::LParen) {
                        self.parse_argument_list();
                    }
                }
                if self.at(SyntaxKind::LBrace) {
                    self.parse_initializer();
                }
                self.finish_node();
            }
        }
    }

    fn parse_initializer(&mut self) {
        self.start(SyntaxKind::InitializerExpr);
        self.expect(SyntaxKind::LBrace);
        while !self.at_end() && !self.at(SyntaxKind::RBrace) {
            let before = self.pos;
            if self.at(SyntaxKind::LBrace) {
                self.parse_initializer();
            } else {
                self.parse_expr();
            }
            if !self.eat(SyntaxKind::Comma) {
                self.ensure_progress(before);
                break;
            }
        }
        self.expect(SyntaxKind::RBrace);
        self.finish_node();
    }

    fn parse_argument_list(&mut self) {
        self.start(SyntaxKind::ArgumentList);
        self.expect(SyntaxKind::LParen);
        self.parse_arguments(SyntaxKind::RParen);
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    fn parse_bracketed_argument_list(&mut self) {
        self.start(SyntaxKind::BracketedArgumentList);
        self.expect(SyntaxKind::LBracket);
        self.parse_arguments(SyntaxKind::RBracket);
        self.expect(SyntaxKind::RBracket);
        self.finish_node();
    }

    fn parse_arguments(&mut self, close: SyntaxKind) {
        while !self.at_end() && !self.at(close) {
            let before = self.pos;
            self.start(SyntaxKind::Argument);
            // Named argument: `name: value`
            if self.at(SyntaxKind::Ident) && self.nth(1) == SyntaxKind::Colon {
                self.bump();
                self.bump();
            }
            if matches!(
                self.current_kind(),
                SyntaxKind::RefKw | SyntaxKind::OutKw | SyntaxKind::InKw
            ) {
                self.bump();
                // Declaration expression: `out var x`
                if let Some(end) = self.scan_type(0)
                    && self.nth(end) == SyntaxKind::Ident
                    && matches!(self.nth(end + 1), SyntaxKind::Comma | SyntaxKind::RParen)
                {
                    self.parse_type(TypeContext::Declaration);
                    self.bump();
                } else {
                    self.parse_expr();
                }
            } else {
                self.parse_expr();
            }
            self.finish_node();
            if !self.eat(SyntaxKind::Comma) {
                self.ensure_progress(before);
                break;
            }
        }
    }

    fn parse_lambda(&mut self) {
        let checkpoint = self.checkpoint();
        if self.at_async_lambda_modifier() {
            self.bump_as(SyntaxKind::AsyncKw);
        }
        if self.at(SyntaxKind::LParen) {
            self.builder.start_node_at(checkpoint, SyntaxKind::ParenLambdaExpr);
            self.parse_lambda_parameter_list();
        } else {
            self.builder.start_node_at(checkpoint, SyntaxKind::SimpleLambdaExpr);
            self.start(SyntaxKind::Parameter);
            self.expect(SyntaxKind::Ident);
            self.finish_node();
        }
        self.expect(SyntaxKind::FatArrow);
        if self.at(SyntaxKind::LBrace) {
            self.parse_block();
        } else {
            self.parse_expr();
        }
        self.finish_node();
    }

    /// Lambda parameters may omit their types
    fn parse_lambda_parameter_list(&mut self) {
        self.start(SyntaxKind::ParameterList);
        self.bump(); // (
        while !self.at_end() && !self.at(SyntaxKind::RParen) {
            let before = self.pos;
            self.start(SyntaxKind::Parameter);
            self.parse_parameter_modifiers();
            let typed = self
                .scan_type(0)
                .is_some_and(|end| self.nth(end) == SyntaxKind::Ident);
            if typed {
                self.parse_type(TypeContext::Declaration);
            }
            self.expect(SyntaxKind::Ident);
            self.finish_node();
            if !self.eat(SyntaxKind::Comma) {
                self.ensure_progress(before);
                break;
            }
        }
        self.expect(SyntaxKind::RParen);
        self.finish_node();
    }

    // ========================================================================
    // Query expressions
    // ========================================================================

    fn parse_query(&mut self) {
        self.start(SyntaxKind::QueryExpr);
        self.query_depth += 1;
        self.parse_from_clause();
        self.parse_query_body();
        self.query_depth -= 1;
        self.finish_node();
    }

    fn parse_from_clause(&mut self) {
        self.start(SyntaxKind::FromClause);
        self.bump_as(SyntaxKind::FromKw);
        if self.nth(1) != SyntaxKind::InKw {
            self.parse_type(TypeContext::Declaration);
        }
        self.expect(SyntaxKind::Ident);
        self.expect(SyntaxKind::InKw);
        self.parse_expr();
        self.finish_node();
    }

    fn parse_query_body(&mut self) {
        loop {
            match self.current_text() {
                "from" if self.at(SyntaxKind::Ident) => self.parse_from_clause(),
                "where" if self.at(SyntaxKind::Ident) => {
                    self.start(SyntaxKind::WhereClause);
                    self.bump_as(SyntaxKind::WhereKw);
                    self.parse_expr();
                    self.finish_node();
                }
                "let" if self.at(SyntaxKind::Ident) => {
                    self.start(SyntaxKind::LetClause);
                    self.bump_as(SyntaxKind::LetKw);
                    self.expect(SyntaxKind::Ident);
                    self.expect(SyntaxKind::Eq);
                    self.parse_expr();
                    self.finish_node();
                }
                "join" if self.at(SyntaxKind::Ident) => self.parse_join_clause(),
                "orderby" if self.at(SyntaxKind::Ident) => self.parse_orderby_clause(),
                _ => break,
            }
        }

        match self.current_text() {
            "select" if self.at(SyntaxKind::Ident) => {
                self.start(SyntaxKind::SelectClause);
                self.bump_as(SyntaxKind::SelectKw);
                self.parse_expr();
                self.finish_node();
            }
            "group" if self.at(SyntaxKind::Ident) => {
                self.start(SyntaxKind::GroupClause);
                self.bump_as(SyntaxKind::GroupKw);
                self.parse_expr();
                if self.at_contextual("by") {
                    self.bump_as(SyntaxKind::ByKw);
                } else {
                    self.error_here(ParseErrorKind::Expected, "expected 'by'");
                }
                self.parse_expr();
                self.finish_node();
            }
            _ => {
                self.error_here(ParseErrorKind::Expected, "expected 'select' or 'group'");
                return;
            }
        }

        if self.at_contextual("into") {
            self.start(SyntaxKind::QueryContinuation);
            self.bump_as(SyntaxKind::IntoKw);
            self.expect(SyntaxKind::Ident);
            self.parse_query_body();
            self.finish_node();
        }
    }

    fn parse_join_clause(&mut self) {
        self.start(SyntaxKind::JoinClause);
        self.bump_as(SyntaxKind::JoinKw);
        if self.nth(1) != SyntaxKind::InKw {
            self.parse_type(TypeContext::Declaration);
        }
        self.expect(SyntaxKind::Ident);
        self.expect(SyntaxKind::InKw);
        self.parse_expr();
        self.expect_contextual("on", SyntaxKind::OnKw);
        self.parse_expr();
        self.expect_contextual("equals", SyntaxKind::EqualsKw);
        self.parse_expr();
        if self.at_contextual("into") {
            self.bump_as(SyntaxKind::IntoKw);
            self.expect(SyntaxKind::Ident);
        }
        self.finish_node();
    }

    fn parse_orderby_clause(&mut self) {
        self.start(SyntaxKind::OrderByClause);
        self.bump_as(SyntaxKind::OrderbyKw);
        loop {
            self.start(SyntaxKind::Ordering);
            self.parse_expr();
            if self.at_contextual("ascending") {
                self.bump_as(SyntaxKind::AscendingKw);
            } else if self.at_contextual("descending") {
                self.bump_as(SyntaxKind::DescendingKw);
            }
            self.finish_node();
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.finish_node();
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn parse_type(&mut self, ctx: TypeContext) {
        let checkpoint = self.checkpoint();
        if !self.parse_non_array_type() {
            return;
        }
        loop {
            match self.current_kind() {
                SyntaxKind::Question
                    if ctx == TypeContext::Declaration
                        || matches!(
                            self.nth(1),
                            SyntaxKind::RParen
                                | SyntaxKind::Semicolon
                                | SyntaxKind::Comma
                                | SyntaxKind::RBracket
                                | SyntaxKind::RBrace
                                | SyntaxKind::Eof
                        ) =>
                {
                    self.builder.start_node_at(checkpoint, SyntaxKind::NullableType);
                    self.bump();
                    self.finish_node();
                }
                SyntaxKind::Star if ctx == TypeContext::Declaration => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::PointerType);
                    self.bump();
                    self.finish_node();
                }
                SyntaxKind::LBracket
                    if matches!(self.nth(1), SyntaxKind::RBracket | SyntaxKind::Comma) =>
                {
                    self.builder.start_node_at(checkpoint, SyntaxKind::ArrayType);
                    self.parse_array_ranks();
                    self.finish_node();
                }
                _ => break,
            }
        }
    }

    /// Predefined, simple, generic or qualified type; returns false when no
    /// type could be parsed
    fn parse_non_array_type(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        let kind = self.current_kind();
        if kind.is_predefined_type() {
            self.start(SyntaxKind::PredefinedType);
            self.bump();
            self.finish_node();
            return true;
        }
        if kind != SyntaxKind::Ident {
            self.error_here(ParseErrorKind::Expected, "expected a type");
            return false;
        }

        self.parse_type_name_segment();
        while matches!(self.current_kind(), SyntaxKind::Dot | SyntaxKind::ColonColon)
            && self.nth(1) == SyntaxKind::Ident
        {
            self.builder.start_node_at(checkpoint, SyntaxKind::QualifiedType);
            self.bump();
            self.parse_type_name_segment();
            self.finish_node();
        }
        true
    }

    fn parse_type_name_segment(&mut self) {
        if self.nth(1) == SyntaxKind::Lt && self.scan_type_args(1).is_some() {
            self.start(SyntaxKind::GenericType);
            self.bump();
            self.parse_type_argument_list();
        } else {
            self.start(SyntaxKind::NameType);
            self.bump();
        }
        self.finish_node();
    }

    fn parse_type_argument_list(&mut self) {
        self.start(SyntaxKind::TypeArgumentList);
        self.expect(SyntaxKind::Lt);
        while !self.at_end() && !self.at(SyntaxKind::Gt) {
            // Unbound generic: `Dictionary<,>`
            if !self.at(SyntaxKind::Comma) {
                self.parse_type(TypeContext::Declaration);
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::Gt);
        self.finish_node();
    }

    fn parse_array_ranks(&mut self) {
        while self.at(SyntaxKind::LBracket)
            && matches!(self.nth(1), SyntaxKind::RBracket | SyntaxKind::Comma)
        {
            self.start(SyntaxKind::ArrayRank);
            self.bump();
            while self.eat(SyntaxKind::Comma) {}
            self.expect(SyntaxKind::RBracket);
            self.finish_node();
        }
    }

    // ========================================================================
    // Lookahead
    // ========================================================================

    /// Scan a type starting at lookahead `start` without consuming anything;
    /// returns the lookahead index just past it
    fn scan_type(&self, start: usize) -> Option<usize> {
        let mut i = start;
        let kind = self.nth(i);
        if kind.is_predefined_type() {
            i += 1;
        } else if kind == SyntaxKind::Ident {
            i = self.scan_name(i)?;
        } else {
            return None;
        }

        loop {
            match self.nth(i) {
                SyntaxKind::Question | SyntaxKind::Star => i += 1,
                SyntaxKind::LBracket => {
                    let mut j = i + 1;
                    while self.nth(j) == SyntaxKind::Comma {
                        j += 1;
                    }
                    if self.nth(j) != SyntaxKind::RBracket {
                        break;
                    }
                    i = j + 1;
                }
                _ => break,
            }
        }
        Some(i)
    }

    fn scan_name(&self, mut i: usize) -> Option<usize> {
        loop {
            if self.nth(i) != SyntaxKind::Ident {
                return None;
            }
            i += 1;
            if self.nth(i) == SyntaxKind::Lt {
                match self.scan_type_args(i) {
                    Some(end) => i = end,
                    None => return Some(i),
                }
            }
            if matches!(self.nth(i), SyntaxKind::Dot | SyntaxKind::ColonColon)
                && self.nth(i + 1) == SyntaxKind::Ident
            {
                i += 1;
                continue;
            }
            return Some(i);
        }
    }

    /// `i` points at `<`; returns the index just past the matching `>`
    fn scan_type_args(&self, mut i: usize) -> Option<usize> {
        i += 1;
        loop {
            match self.nth(i) {
                SyntaxKind::Comma => i += 1,
                SyntaxKind::Gt => return Some(i + 1),
                _ => {
                    i = self.scan_type(i)?;
                    match self.nth(i) {
                        SyntaxKind::Comma => i += 1,
                        SyntaxKind::Gt => return Some(i + 1),
                        _ => return None,
                    }
                }
            }
        }
    }

    /// Index of the `)` matching the `(` at lookahead `open`
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = open;
        loop {
            match self.nth(i) {
                SyntaxKind::LParen => depth += 1,
                SyntaxKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                SyntaxKind::Semicolon | SyntaxKind::LBrace | SyntaxKind::RBrace | SyntaxKind::Eof => {
                    return None;
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn at_type_start(&self) -> bool {
        self.nth_starts_type(0)
    }

    fn nth_starts_type(&self, n: usize) -> bool {
        let kind = self.nth(n);
        kind == SyntaxKind::Ident || kind.is_predefined_type()
    }

    fn nth_starts_operand(&self, n: usize) -> bool {
        let kind = self.nth(n);
        kind.is_literal()
            || kind.is_predefined_type()
            || matches!(
                kind,
                SyntaxKind::Ident
                    | SyntaxKind::LParen
                    | SyntaxKind::ThisKw
                    | SyntaxKind::BaseKw
                    | SyntaxKind::NewKw
                    | SyntaxKind::TypeofKw
                    | SyntaxKind::SizeofKw
                    | SyntaxKind::DefaultKw
                    | SyntaxKind::CheckedKw
                    | SyntaxKind::UncheckedKw
                    | SyntaxKind::StackallocKw
            )
    }

    /// Top-level: does a type member (rather than a statement) start here?
    fn at_member_start(&self) -> bool {
        if self.at(SyntaxKind::LBracket) {
            return true;
        }
        let mut i = 0;
        loop {
            let kind = self.nth(i);
            if kind.is_modifier() && kind != SyntaxKind::NewKw {
                i += 1;
                continue;
            }
            if kind == SyntaxKind::Ident
                && self.nth_text(i) == "partial"
                && matches!(
                    self.nth(i + 1),
                    SyntaxKind::ClassKw | SyntaxKind::StructKw | SyntaxKind::InterfaceKw
                )
            {
                return true;
            }
            break;
        }
        match self.nth(i) {
            SyntaxKind::ClassKw
            | SyntaxKind::StructKw
            | SyntaxKind::InterfaceKw
            | SyntaxKind::EnumKw
            | SyntaxKind::DelegateKw => true,
            SyntaxKind::LBrace => false,
            _ => i > 0,
        }
    }

    /// `using (...)` or `using var x = ...;` as opposed to a using directive
    fn at_using_statement(&self) -> bool {
        self.nth(1) == SyntaxKind::LParen
            || self
                .scan_type(1)
                .is_some_and(|end| self.nth(end) == SyntaxKind::Ident)
    }

    fn at_local_declaration(&self) -> bool {
        if self.at_await() && self.nth(2) != SyntaxKind::Eq {
            return false;
        }
        self.scan_type(0).is_some_and(|end| {
            self.nth(end) == SyntaxKind::Ident
                && matches!(
                    self.nth(end + 1),
                    SyntaxKind::Eq | SyntaxKind::Semicolon | SyntaxKind::Comma
                )
        })
    }

    fn at_local_function(&self) -> bool {
        if self.at_await() {
            return false;
        }
        let mut start = 0;
        while matches!(self.nth(start), SyntaxKind::StaticKw | SyntaxKind::UnsafeKw)
            || (self.nth(start) == SyntaxKind::Ident
                && self.nth_text(start) == "async"
                && self.nth_starts_type(start + 1))
        {
            start += 1;
        }
        self.scan_type(start).is_some_and(|end| {
            self.nth(end) == SyntaxKind::Ident
                && matches!(self.nth(end + 1), SyntaxKind::LParen | SyntaxKind::Lt)
        })
    }

    fn at_await(&self) -> bool {
        self.at_contextual("await") && self.nth_starts_operand(1)
    }

    fn at_cast(&self) -> bool {
        let Some(end) = self.scan_type(1) else {
            return false;
        };
        if self.nth(end) != SyntaxKind::RParen {
            return false;
        }
        let next = end + 1;
        // `in (xs) select x` closes the source expression, not a cast
        if self.query_depth > 0 && self.nth_is_query_keyword(next) {
            return false;
        }
        if self.nth(1).is_predefined_type() {
            return self.nth_starts_operand(next)
                || matches!(
                    self.nth(next),
                    SyntaxKind::Minus
                        | SyntaxKind::Plus
                        | SyntaxKind::Bang
                        | SyntaxKind::Tilde
                        | SyntaxKind::PlusPlus
                        | SyntaxKind::MinusMinus
                        | SyntaxKind::Star
                        | SyntaxKind::Amp
                );
        }
        self.nth_starts_operand(next)
            || matches!(self.nth(next), SyntaxKind::Bang | SyntaxKind::Tilde)
    }

    fn nth_is_query_keyword(&self, n: usize) -> bool {
        self.nth(n) == SyntaxKind::Ident
            && matches!(
                self.nth_text(n),
                "from"
                    | "where"
                    | "let"
                    | "join"
                    | "on"
                    | "equals"
                    | "into"
                    | "orderby"
                    | "ascending"
                    | "descending"
                    | "select"
                    | "group"
                    | "by"
            )
    }

    fn at_lambda(&self) -> bool {
        let mut i = 0;
        if self.at_async_lambda_modifier() {
            i = 1;
        }
        match self.nth(i) {
            SyntaxKind::Ident => self.nth(i + 1) == SyntaxKind::FatArrow,
            SyntaxKind::LParen => self
                .matching_paren(i)
                .is_some_and(|close| self.nth(close + 1) == SyntaxKind::FatArrow),
            _ => false,
        }
    }

    fn at_async_lambda_modifier(&self) -> bool {
        self.at_contextual("async")
            && matches!(self.nth(1), SyntaxKind::Ident | SyntaxKind::LParen)
    }

    fn at_query(&self) -> bool {
        if !self.at_contextual("from") {
            return false;
        }
        (self.nth(1) == SyntaxKind::Ident && self.nth(2) == SyntaxKind::InKw)
            || self.scan_type(1).is_some_and(|end| {
                self.nth(end) == SyntaxKind::Ident && self.nth(end + 1) == SyntaxKind::InKw
            })
    }

    /// Expression-position `Name<...>` as opposed to a comparison
    fn at_generic_name(&self) -> bool {
        if self.nth(1) != SyntaxKind::Lt {
            return false;
        }
        self.scan_type_args(1).is_some_and(|end| {
            matches!(
                self.nth(end),
                SyntaxKind::LParen
                    | SyntaxKind::RParen
                    | SyntaxKind::RBracket
                    | SyntaxKind::RBrace
                    | SyntaxKind::Colon
                    | SyntaxKind::Semicolon
                    | SyntaxKind::Comma
                    | SyntaxKind::Dot
                    | SyntaxKind::QuestionDot
                    | SyntaxKind::EqEq
                    | SyntaxKind::BangEq
                    | SyntaxKind::Eof
            )
        })
    }

    fn at_closer(&self) -> bool {
        matches!(
            self.current_kind(),
            SyntaxKind::RParen
                | SyntaxKind::RBracket
                | SyntaxKind::RBrace
                | SyntaxKind::Semicolon
                | SyntaxKind::Comma
                | SyntaxKind::Colon
        )
    }

    // ========================================================================
    // Token plumbing
    // ========================================================================

    fn nth(&self, n: usize) -> SyntaxKind {
        self.significant
            .get(self.pos + n)
            .map_or(SyntaxKind::Eof, |&idx| self.tokens[idx].kind)
    }

    fn nth_text(&self, n: usize) -> &'a str {
        let tokens = self.tokens;
        self.significant
            .get(self.pos + n)
            .map_or("", |&idx| tokens[idx].text.as_str())
    }

    /// Whether lookahead `n` and `n + 1` touch with no trivia in between
    fn nth_adjacent(&self, n: usize) -> bool {
        match (
            self.significant.get(self.pos + n),
            self.significant.get(self.pos + n + 1),
        ) {
            (Some(&a), Some(&b)) => self.tokens[a].span.end == self.tokens[b].span.start,
            _ => false,
        }
    }

    fn current_kind(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn current_text(&self) -> &'a str {
        self.nth_text(0)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current_kind() == kind
    }

    fn at_contextual(&self, text: &str) -> bool {
        self.at(SyntaxKind::Ident) && self.current_text() == text
    }

    fn at_end(&self) -> bool {
        self.pos >= self.significant.len()
    }

    fn bump(&mut self) {
        if let Some(&idx) = self.significant.get(self.pos) {
            self.flush_trivia();
            self.builder.add_token(&self.tokens[idx]);
            self.emitted = idx + 1;
            self.pos += 1;
        }
    }

    /// Bump the current token under a different kind (contextual keywords)
    fn bump_as(&mut self, kind: SyntaxKind) {
        if let Some(&idx) = self.significant.get(self.pos) {
            self.flush_trivia();
            self.builder.token(kind, &self.tokens[idx].text);
            self.emitted = idx + 1;
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        let message = match kind.static_text() {
            Some(text) => format!("expected '{text}'"),
            None => format!("expected {kind}"),
        };
        self.error_here(ParseErrorKind::Expected, message);
        false
    }

    fn expect_contextual(&mut self, text: &str, kind: SyntaxKind) {
        if self.at_contextual(text) {
            self.bump_as(kind);
        } else {
            self.error_here(ParseErrorKind::Expected, format!("expected '{text}'"));
        }
    }

    /// Emit trivia that precedes the next significant token
    fn flush_trivia(&mut self) {
        let Some(&next) = self.significant.get(self.pos) else {
            return;
        };
        let tokens = self.tokens;
        while self.emitted < next {
            self.builder.add_token(&tokens[self.emitted]);
            self.emitted += 1;
        }
    }

    fn flush_trivia_all(&mut self) {
        let tokens = self.tokens;
        while self.emitted < tokens.len() {
            self.builder.add_token(&tokens[self.emitted]);
            self.emitted += 1;
        }
    }

    fn start(&mut self, kind: SyntaxKind) {
        self.flush_trivia();
        self.builder.start_node(kind);
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        self.builder.checkpoint()
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn error_here(&mut self, kind: ParseErrorKind, message: impl Into<String>) {
        let span = match self.significant.get(self.pos) {
            Some(&idx) => self.tokens[idx].span.clone(),
            None => {
                let end = self.tokens.last().map_or(0, |t| t.span.end);
                end..end
            }
        };
        self.errors.push(ParseError {
            kind,
            message: message.into(),
            span,
        });
    }

    /// Wrap the current token in an error node when a loop made no progress
    fn ensure_progress(&mut self, before: usize) {
        if self.pos == before && !self.at_end() {
            let kind = self.current_kind();
            self.start(SyntaxKind::Error);
            self.error_here(ParseErrorKind::Unexpected, format!("unexpected {kind}"));
            self.bump();
            self.finish_node();
        }
    }
}

fn is_assignment_op(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Eq
            | SyntaxKind::PlusEq
            | SyntaxKind::MinusEq
            | SyntaxKind::StarEq
            | SyntaxKind::SlashEq
            | SyntaxKind::PercentEq
            | SyntaxKind::AmpEq
            | SyntaxKind::PipeEq
            | SyntaxKind::CaretEq
            | SyntaxKind::ShlEq
            | SyntaxKind::QuestionQuestionEq
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(cst: &SyntaxNode, kind: SyntaxKind) -> usize {
        cst.descendants().filter(|n| n.kind() == kind).count()
    }

    fn parse_ok(source: &str) -> SyntaxNode {
        let (cst, errors) = parse_csharp(source);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(cst.text().to_string(), source);
        cst
    }

    #[test]
    fn test_parse_simple_class() {
        let source = "namespace Demo\n{\n    public class Widget : IWidget\n    {\n    }\n}\n";
        let cst = parse_ok(source);

        let class = cst
            .descendants()
            .find(|n| n.kind() == SyntaxKind::ClassDecl)
            .unwrap();
        assert!(class.children().any(|n| n.kind() == SyntaxKind::BaseList));
        // Node ranges start at the first significant token
        assert!(class.text().to_string().starts_with("public class"));
        assert!(class.text().to_string().ends_with('}'));
    }

    #[test]
    fn test_doc_comment_stays_outside_declaration() {
        let source = "/// <summary>Doc</summary>\nclass C { }";
        let cst = parse_ok(source);

        let class = cst.children().find(|n| n.kind() == SyntaxKind::ClassDecl).unwrap();
        assert_eq!(class.text().to_string(), "class C { }");
        let first = class.first_token().unwrap();
        let doc = first.prev_token().and_then(|t| t.prev_token()).unwrap();
        assert_eq!(doc.kind(), SyntaxKind::DocComment);
    }

    #[test]
    fn test_parse_members() {
        let source = r#"class C
{
    private int count = 0;
    public event EventHandler Changed;
    public C(int x) : base(x) { }
    ~C() { }
    public int Count { get { return count; } private set { count = value; } }
    public string Name => "c";
    public int this[int i] => i;
    public static T Make<T>(T value) where T : class, new() => value;
    public static implicit operator int(C c) => 0;
    public static C operator +(C a, C b) => a;
}

enum Color { Red, Green = 2, Blue }
delegate void Handler(object sender);
interface IShape { double Area { get; } }
"#;
        let cst = parse_ok(source);

        assert_eq!(count(&cst, SyntaxKind::FieldDecl), 1);
        assert_eq!(count(&cst, SyntaxKind::EventFieldDecl), 1);
        assert_eq!(count(&cst, SyntaxKind::ConstructorDecl), 1);
        assert_eq!(count(&cst, SyntaxKind::ConstructorInitializer), 1);
        assert_eq!(count(&cst, SyntaxKind::DestructorDecl), 1);
        assert_eq!(count(&cst, SyntaxKind::PropertyDecl), 3);
        assert_eq!(count(&cst, SyntaxKind::IndexerDecl), 1);
        assert_eq!(count(&cst, SyntaxKind::MethodDecl), 3);
        assert_eq!(count(&cst, SyntaxKind::EnumMember), 3);
        assert_eq!(count(&cst, SyntaxKind::DelegateDecl), 1);
        assert_eq!(count(&cst, SyntaxKind::InterfaceDecl), 1);
        assert_eq!(count(&cst, SyntaxKind::ConstraintClause), 1);
    }

    #[test]
    fn test_accessor_keywords_are_remapped() {
        let cst = parse_ok("class C { int X { get; set; } }");

        assert_eq!(count(&cst, SyntaxKind::Accessor), 2);
        let kinds: Vec<_> = cst
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .map(|t| t.kind())
            .collect();
        assert!(kinds.contains(&SyntaxKind::GetKw));
        assert!(kinds.contains(&SyntaxKind::SetKw));
    }

    #[test]
    fn test_parse_statements() {
        let source = r#"class C
{
    void M(int[] items)
    {
        int total = 0;
        foreach (var item in items) { total += item; }
        for (int i = 0; i < items.Length; i++) total--;
        while (total > 0) { total = total - 1; }
        do { } while (false);
        if (total == 0) return; else throw new InvalidOperationException();
        switch (total) { case 1: break; default: goto case 1; }
        try { M(null); } catch (Exception ex) when (ex != null) { } finally { }
        using (var stream = Open()) { }
        lock (this) { }
        checked { total++; }
        yield return total;
    }
}
"#;
        let cst = parse_ok(source);

        assert_eq!(count(&cst, SyntaxKind::LocalDeclStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::ForeachStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::ForStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::WhileStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::DoStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::ElseClause), 1);
        assert_eq!(count(&cst, SyntaxKind::SwitchSection), 2);
        assert_eq!(count(&cst, SyntaxKind::GotoCaseStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::CatchClause), 1);
        assert_eq!(count(&cst, SyntaxKind::FinallyClause), 1);
        assert_eq!(count(&cst, SyntaxKind::UsingStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::LockStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::CheckedStmt), 1);
        assert_eq!(count(&cst, SyntaxKind::YieldReturnStmt), 1);
    }

    #[test]
    fn test_parenthesized_versus_cast() {
        let cst = parse_ok("var a = (b) + 1; var c = (int)d; var e = (Foo)g; var h = (x).Y;");

        assert_eq!(count(&cst, SyntaxKind::CastExpr), 2);
        assert_eq!(count(&cst, SyntaxKind::ParenExpr), 2);
    }

    #[test]
    fn test_parentheses_before_query_keywords_and_in_patterns() {
        let cst = parse_ok(
            "var q = from x in(xs) select(x); var r = from x in (xs) where (x) select x; \
             var b = y is(int); var c = y is not (string s);",
        );

        assert_eq!(count(&cst, SyntaxKind::CastExpr), 0);
        assert_eq!(count(&cst, SyntaxKind::QueryExpr), 2);
        assert_eq!(count(&cst, SyntaxKind::ParenExpr), 4);
        assert_eq!(count(&cst, SyntaxKind::ParenPattern), 2);
    }

    #[test]
    fn test_generic_name_versus_comparison() {
        let cst = parse_ok("if (a < b && c > d) { } var list = Make<int>(1);");

        assert_eq!(count(&cst, SyntaxKind::GenericNameExpr), 1);
        assert_eq!(count(&cst, SyntaxKind::BinaryExpr), 3);
    }

    #[test]
    fn test_nested_generic_types_and_shift() {
        let cst = parse_ok("Dictionary<string, List<int>> map = null; x = a >> 2; y >>= 1;");

        assert_eq!(count(&cst, SyntaxKind::GenericType), 2);
        let shift = cst
            .descendants()
            .find(|n| n.kind() == SyntaxKind::BinaryExpr)
            .unwrap();
        assert_eq!(shift.text().to_string(), "a >> 2");
        assert_eq!(count(&cst, SyntaxKind::AssignmentExpr), 2);
    }

    #[test]
    fn test_lambdas_and_queries() {
        let source = "var f = x => x + 1; var g = (int a, b) => { return a; }; \
                      var q = from c in customers where c.Age > 1 orderby c.Name descending select c;";
        let cst = parse_ok(source);

        assert_eq!(count(&cst, SyntaxKind::SimpleLambdaExpr), 1);
        assert_eq!(count(&cst, SyntaxKind::ParenLambdaExpr), 1);
        assert_eq!(count(&cst, SyntaxKind::QueryExpr), 1);
        assert_eq!(count(&cst, SyntaxKind::WhereClause), 1);
        assert_eq!(count(&cst, SyntaxKind::Ordering), 1);
        assert_eq!(count(&cst, SyntaxKind::SelectClause), 1);
    }

    #[test]
    fn test_keyword_expressions() {
        let source = "var a = new int[3]; var b = new[] { 1 }; var c = new Foo(1) { X = 2 }; \
                      var d = typeof(int); var e = sizeof(int); var f = default(int); \
                      var g = nameof(a); var h = checked(a + 1); var i = await Load();";
        let cst = parse_ok(source);

        for kind in [
            SyntaxKind::ArrayCreationExpr,
            SyntaxKind::ImplicitArrayCreationExpr,
            SyntaxKind::ObjectCreationExpr,
            SyntaxKind::TypeofExpr,
            SyntaxKind::SizeofExpr,
            SyntaxKind::DefaultExpr,
            SyntaxKind::NameofExpr,
            SyntaxKind::CheckedExpr,
            SyntaxKind::AwaitExpr,
        ] {
            assert_eq!(count(&cst, kind), 1, "{kind}");
        }
    }

    #[test]
    fn test_error_recovery_is_lossless() {
        let source = "class C { int X { get; set; }\n void M() { var = ; } ";
        let (cst, errors) = parse_csharp(source);

        assert!(!errors.is_empty());
        assert_eq!(cst.text().to_string(), source);
    }

    #[test]
    fn test_lexer_errors_are_reported() {
        let (cst, errors) = parse_csharp("var s = \"open;");

        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Lexer));
        assert_eq!(cst.text().to_string(), "var s = \"open;");
    }
}
