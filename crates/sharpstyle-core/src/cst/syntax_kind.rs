//! Syntax kind enumeration for the C# CST
//!
//! This module defines all possible node and token types in the syntax tree.
//! Discriminants are grouped in ranges so classification stays cheap:
//! trivia (0-9), reserved keywords (10-119), contextual keywords (120-199),
//! punctuation (200-299), literals and identifiers (300-349) and structural
//! nodes (400+).

use std::fmt;

macro_rules! syntax_kinds {
    ($( $(#[$meta:meta])* $name:ident = $value:literal, )*) => {
        /// Syntax kind for C# language elements
        ///
        /// This enum represents all possible types of nodes and tokens in the CST.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum SyntaxKind {
            $( $(#[$meta])* $name = $value, )*
        }

        impl SyntaxKind {
            /// Convert a raw rowan kind back into a `SyntaxKind`
            pub const fn from_raw(raw: u16) -> Option<Self> {
                match raw {
                    $( $value => Some(Self::$name), )*
                    _ => None,
                }
            }
        }
    };
}

syntax_kinds! {
    // ==================
    // Trivia (0-9)
    // ==================
    /// Spaces and tabs
    Whitespace = 0,
    /// `\n`, `\r\n` or `\r`
    Newline = 1,
    /// `// ...`
    LineComment = 2,
    /// `/* ... */`
    BlockComment = 3,
    /// `/// ...` documentation line
    DocComment = 4,
    /// `#region`, `#if` and other preprocessor lines
    Directive = 5,

    // ==================
    // Reserved keywords (10-119)
    // ==================
    /// `abstract`
    AbstractKw = 10,
    /// `as`
    AsKw = 11,
    /// `base`
    BaseKw = 12,
    /// `bool`
    BoolKw = 13,
    /// `break`
    BreakKw = 14,
    /// `byte`
    ByteKw = 15,
    /// `case`
    CaseKw = 16,
    /// `catch`
    CatchKw = 17,
    /// `char`
    CharKw = 18,
    /// `checked`
    CheckedKw = 19,
    /// `class`
    ClassKw = 20,
    /// `const`
    ConstKw = 21,
    /// `continue`
    ContinueKw = 22,
    /// `decimal`
    DecimalKw = 23,
    /// `default`
    DefaultKw = 24,
    /// `delegate`
    DelegateKw = 25,
    /// `do`
    DoKw = 26,
    /// `double`
    DoubleKw = 27,
    /// `else`
    ElseKw = 28,
    /// `enum`
    EnumKw = 29,
    /// `event`
    EventKw = 30,
    /// `explicit`
    ExplicitKw = 31,
    /// `extern`
    ExternKw = 32,
    /// `false`
    FalseKw = 33,
    /// `finally`
    FinallyKw = 34,
    /// `fixed`
    FixedKw = 35,
    /// `float`
    FloatKw = 36,
    /// `for`
    ForKw = 37,
    /// `foreach`
    ForeachKw = 38,
    /// `goto`
    GotoKw = 39,
    /// `if`
    IfKw = 40,
    /// `implicit`
    ImplicitKw = 41,
    /// `in`
    InKw = 42,
    /// `int`
    IntKw = 43,
    /// `interface`
    InterfaceKw = 44,
    /// `internal`
    InternalKw = 45,
    /// `is`
    IsKw = 46,
    /// `lock`
    LockKw = 47,
    /// `long`
    LongKw = 48,
    /// `namespace`
    NamespaceKw = 49,
    /// `new`
    NewKw = 50,
    /// `null`
    NullKw = 51,
    /// `object`
    ObjectKw = 52,
    /// `operator`
    OperatorKw = 53,
    /// `out`
    OutKw = 54,
    /// `override`
    OverrideKw = 55,
    /// `params`
    ParamsKw = 56,
    /// `private`
    PrivateKw = 57,
    /// `protected`
    ProtectedKw = 58,
    /// `public`
    PublicKw = 59,
    /// `readonly`
    ReadonlyKw = 60,
    /// `ref`
    RefKw = 61,
    /// `return`
    ReturnKw = 62,
    /// `sbyte`
    SbyteKw = 63,
    /// `sealed`
    SealedKw = 64,
    /// `short`
    ShortKw = 65,
    /// `sizeof`
    SizeofKw = 66,
    /// `stackalloc`
    StackallocKw = 67,
    /// `static`
    StaticKw = 68,
    /// `string`
    StringKw = 69,
    /// `struct`
    StructKw = 70,
    /// `switch`
    SwitchKw = 71,
    /// `this`
    ThisKw = 72,
    /// `throw`
    ThrowKw = 73,
    /// `true`
    TrueKw = 74,
    /// `try`
    TryKw = 75,
    /// `typeof`
    TypeofKw = 76,
    /// `uint`
    UintKw = 77,
    /// `ulong`
    UlongKw = 78,
    /// `unchecked`
    UncheckedKw = 79,
    /// `unsafe`
    UnsafeKw = 80,
    /// `ushort`
    UshortKw = 81,
    /// `using`
    UsingKw = 82,
    /// `virtual`
    VirtualKw = 83,
    /// `void`
    VoidKw = 84,
    /// `volatile`
    VolatileKw = 85,
    /// `while`
    WhileKw = 86,

    // ==================
    // Contextual keywords (120-199)
    // ==================
    /// `add` (contextual)
    AddKw = 120,
    /// `ascending` (contextual)
    AscendingKw = 121,
    /// `async` (contextual)
    AsyncKw = 122,
    /// `await` (contextual)
    AwaitKw = 123,
    /// `by` (contextual)
    ByKw = 124,
    /// `descending` (contextual)
    DescendingKw = 125,
    /// `equals` (contextual)
    EqualsKw = 126,
    /// `from` (contextual)
    FromKw = 127,
    /// `get` (contextual)
    GetKw = 128,
    /// `group` (contextual)
    GroupKw = 129,
    /// `init` (contextual)
    InitKw = 130,
    /// `into` (contextual)
    IntoKw = 131,
    /// `join` (contextual)
    JoinKw = 132,
    /// `let` (contextual)
    LetKw = 133,
    /// `nameof` (contextual)
    NameofKw = 134,
    /// `on` (contextual)
    OnKw = 135,
    /// `orderby` (contextual)
    OrderbyKw = 136,
    /// `partial` (contextual)
    PartialKw = 137,
    /// `remove` (contextual)
    RemoveKw = 138,
    /// `select` (contextual)
    SelectKw = 139,
    /// `set` (contextual)
    SetKw = 140,
    /// `where` (contextual)
    WhereKw = 141,
    /// `yield` (contextual)
    YieldKw = 142,

    // ==================
    // Punctuation (200-299)
    // ==================
    LBrace = 200,
    RBrace = 201,
    LParen = 202,
    RParen = 203,
    LBracket = 204,
    RBracket = 205,
    Semicolon = 206,
    Comma = 207,
    Dot = 208,
    Colon = 209,
    ColonColon = 210,
    Question = 211,
    QuestionDot = 212,
    QuestionQuestion = 213,
    QuestionQuestionEq = 214,
    FatArrow = 215,
    Eq = 216,
    EqEq = 217,
    Bang = 218,
    BangEq = 219,
    Lt = 220,
    Gt = 221,
    LtEq = 222,
    GtEq = 223,
    Plus = 224,
    Minus = 225,
    Star = 226,
    Slash = 227,
    Percent = 228,
    Amp = 229,
    AmpAmp = 230,
    Pipe = 231,
    PipePipe = 232,
    Caret = 233,
    Tilde = 234,
    PlusPlus = 235,
    MinusMinus = 236,
    PlusEq = 237,
    MinusEq = 238,
    StarEq = 239,
    SlashEq = 240,
    PercentEq = 241,
    AmpEq = 242,
    PipeEq = 243,
    CaretEq = 244,
    Shl = 245,
    ShlEq = 246,
    Arrow = 247,

    // ==================
    // Literals & identifiers (300-349)
    // ==================
    Ident = 300,
    IntLiteral = 301,
    RealLiteral = 302,
    StringLiteral = 303,
    CharLiteral = 304,
    /// End of input marker used by the parser; never stored in a tree
    Eof = 348,
    /// Unrecognised input (error recovery)
    Error = 349,

    // ==================
    // Declarations (400-469)
    // ==================
    CompilationUnit = 400,
    UsingDirective = 401,
    NamespaceDecl = 402,
    FileScopedNamespaceDecl = 403,
    ClassDecl = 404,
    StructDecl = 405,
    InterfaceDecl = 406,
    EnumDecl = 407,
    EnumMember = 408,
    DelegateDecl = 409,
    FieldDecl = 410,
    EventFieldDecl = 411,
    MethodDecl = 412,
    ConstructorDecl = 413,
    ConstructorInitializer = 414,
    DestructorDecl = 415,
    PropertyDecl = 416,
    IndexerDecl = 417,
    EventDecl = 418,
    AccessorList = 419,
    Accessor = 420,
    ArrowExprClause = 421,
    ParameterList = 422,
    BracketedParameterList = 423,
    Parameter = 424,
    TypeParameterList = 425,
    TypeParameter = 426,
    ConstraintClause = 427,
    BaseList = 428,
    AttributeList = 429,
    Attribute = 430,

    // ==================
    // Types (470-489)
    // ==================
    PredefinedType = 470,
    NameType = 471,
    QualifiedType = 472,
    GenericType = 473,
    TypeArgumentList = 474,
    ArrayType = 475,
    ArrayRank = 476,
    NullableType = 477,
    PointerType = 478,

    // ==================
    // Statements (500-549)
    // ==================
    Block = 500,
    LocalDeclStmt = 501,
    VariableDecl = 502,
    VariableDeclarator = 503,
    EqualsValueClause = 504,
    ExprStmt = 505,
    IfStmt = 506,
    ElseClause = 507,
    WhileStmt = 508,
    DoStmt = 509,
    ForStmt = 510,
    ForeachStmt = 511,
    ReturnStmt = 512,
    ThrowStmt = 513,
    BreakStmt = 514,
    ContinueStmt = 515,
    UsingStmt = 516,
    LockStmt = 517,
    FixedStmt = 518,
    SwitchStmt = 519,
    SwitchSection = 520,
    CaseLabel = 521,
    DefaultLabel = 522,
    GotoStmt = 523,
    GotoCaseStmt = 524,
    GotoDefaultStmt = 525,
    TryStmt = 526,
    CatchClause = 527,
    CatchDecl = 528,
    FinallyClause = 529,
    CheckedStmt = 530,
    YieldReturnStmt = 531,
    YieldBreakStmt = 532,
    EmptyStmt = 533,

    // ==================
    // Expressions (550-629)
    // ==================
    ParenExpr = 550,
    BinaryExpr = 551,
    AssignmentExpr = 552,
    PrefixUnaryExpr = 553,
    PostfixUnaryExpr = 554,
    CastExpr = 555,
    ConditionalExpr = 556,
    IsExpr = 557,
    AsExpr = 558,
    CoalesceExpr = 559,
    SimpleLambdaExpr = 560,
    ParenLambdaExpr = 561,
    ArrayCreationExpr = 562,
    ImplicitArrayCreationExpr = 563,
    StackallocExpr = 564,
    ObjectCreationExpr = 565,
    ImplicitObjectCreationExpr = 566,
    InitializerExpr = 567,
    QueryExpr = 568,
    FromClause = 569,
    WhereClause = 570,
    LetClause = 571,
    JoinClause = 572,
    OrderByClause = 573,
    Ordering = 574,
    SelectClause = 575,
    GroupClause = 576,
    QueryContinuation = 577,
    AwaitExpr = 578,
    NameExpr = 579,
    GenericNameExpr = 580,
    MemberAccessExpr = 581,
    ConditionalAccessExpr = 582,
    InvocationExpr = 583,
    ArgumentList = 584,
    Argument = 585,
    ElementAccessExpr = 586,
    BracketedArgumentList = 587,
    LiteralExpr = 588,
    ThisExpr = 589,
    BaseExpr = 590,
    TypeofExpr = 591,
    SizeofExpr = 592,
    NameofExpr = 593,
    DefaultExpr = 594,
    DefaultLiteralExpr = 595,
    CheckedExpr = 596,
    PredefinedTypeExpr = 597,
    /// `(pattern)` after `is`
    ParenPattern = 598,
}

impl SyntaxKind {
    /// Check if this is a trivia kind (whitespace, comments, newlines)
    pub const fn is_trivia(self) -> bool {
        (self as u16) < 10
    }

    /// Check if this is a comment of any flavour
    pub const fn is_comment(self) -> bool {
        matches!(
            self,
            Self::LineComment | Self::BlockComment | Self::DocComment
        )
    }

    /// Check if this is a keyword (reserved or contextual)
    pub const fn is_keyword(self) -> bool {
        (self as u16) >= 10 && (self as u16) < 200
    }

    /// Check if this is a reserved keyword
    pub const fn is_reserved_keyword(self) -> bool {
        (self as u16) >= 10 && (self as u16) < 120
    }

    /// Check if this is punctuation
    pub const fn is_punct(self) -> bool {
        (self as u16) >= 200 && (self as u16) < 300
    }

    /// Check if this is a literal
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::IntLiteral
                | Self::RealLiteral
                | Self::StringLiteral
                | Self::CharLiteral
                | Self::TrueKw
                | Self::FalseKw
                | Self::NullKw
        )
    }

    /// Check if this is a structural node
    pub const fn is_node(self) -> bool {
        (self as u16) >= 400
    }

    /// Check if this is an expression node
    ///
    /// Query clauses, orderings and argument lists live in the expression
    /// range but are not expressions themselves.
    pub const fn is_expr(self) -> bool {
        (self as u16) >= 550
            && (self as u16) < 630
            && !matches!(
                self,
                Self::FromClause
                    | Self::WhereClause
                    | Self::LetClause
                    | Self::JoinClause
                    | Self::OrderByClause
                    | Self::Ordering
                    | Self::SelectClause
                    | Self::GroupClause
                    | Self::QueryContinuation
                    | Self::ArgumentList
                    | Self::Argument
                    | Self::BracketedArgumentList
                    | Self::ParenPattern
            )
    }

    /// Tokens made of identifier characters; two of them may not touch
    pub const fn is_word(self) -> bool {
        self.is_keyword()
            || matches!(
                self,
                Self::Ident | Self::IntLiteral | Self::RealLiteral | Self::CharLiteral
            )
    }

    /// Check if this is a built-in type keyword
    pub const fn is_predefined_type(self) -> bool {
        matches!(
            self,
            Self::BoolKw
                | Self::ByteKw
                | Self::CharKw
                | Self::DecimalKw
                | Self::DoubleKw
                | Self::FloatKw
                | Self::IntKw
                | Self::LongKw
                | Self::ObjectKw
                | Self::SbyteKw
                | Self::ShortKw
                | Self::StringKw
                | Self::UintKw
                | Self::UlongKw
                | Self::UshortKw
                | Self::VoidKw
        )
    }

    /// Check if this is a declaration modifier
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::AbstractKw
                | Self::AsyncKw
                | Self::ConstKw
                | Self::ExternKw
                | Self::InternalKw
                | Self::NewKw
                | Self::OverrideKw
                | Self::PartialKw
                | Self::PrivateKw
                | Self::ProtectedKw
                | Self::PublicKw
                | Self::ReadonlyKw
                | Self::SealedKw
                | Self::StaticKw
                | Self::UnsafeKw
                | Self::VirtualKw
                | Self::VolatileKw
        )
    }

    /// Resolve a reserved keyword from its source text
    pub fn reserved_keyword(text: &str) -> Option<Self> {
        RESERVED_KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == text)
            .map(|(_, kind)| *kind)
    }

    /// Resolve a contextual keyword from its source text
    ///
    /// The lexer always emits contextual keywords as `Ident`; the parser
    /// remaps them when the surrounding syntax gives them keyword meaning.
    pub fn contextual_keyword(text: &str) -> Option<Self> {
        CONTEXTUAL_KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == text)
            .map(|(_, kind)| *kind)
    }

    /// Get the fixed source text of keyword and punctuation tokens
    pub fn static_text(self) -> Option<&'static str> {
        if self.is_keyword() {
            return RESERVED_KEYWORDS
                .iter()
                .chain(CONTEXTUAL_KEYWORDS)
                .find(|(_, kind)| *kind == self)
                .map(|(text, _)| *text);
        }

        let text = match self {
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Colon => ":",
            Self::ColonColon => "::",
            Self::Question => "?",
            Self::QuestionDot => "?.",
            Self::QuestionQuestion => "??",
            Self::QuestionQuestionEq => "??=",
            Self::FatArrow => "=>",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::Bang => "!",
            Self::BangEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Amp => "&",
            Self::AmpAmp => "&&",
            Self::Pipe => "|",
            Self::PipePipe => "||",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::PlusEq => "+=",
            Self::MinusEq => "-=",
            Self::StarEq => "*=",
            Self::SlashEq => "/=",
            Self::PercentEq => "%=",
            Self::AmpEq => "&=",
            Self::PipeEq => "|=",
            Self::CaretEq => "^=",
            Self::Shl => "<<",
            Self::ShlEq => "<<=",
            Self::Arrow => "->",
            _ => return None,
        };
        Some(text)
    }
}

const RESERVED_KEYWORDS: &[(&str, SyntaxKind)] = &[
    ("abstract", SyntaxKind::AbstractKw),
    ("as", SyntaxKind::AsKw),
    ("base", SyntaxKind::BaseKw),
    ("bool", SyntaxKind::BoolKw),
    ("break", SyntaxKind::BreakKw),
    ("byte", SyntaxKind::ByteKw),
    ("case", SyntaxKind::CaseKw),
    ("catch", SyntaxKind::CatchKw),
    ("char", SyntaxKind::CharKw),
    ("checked", SyntaxKind::CheckedKw),
    ("class", SyntaxKind::ClassKw),
    ("const", SyntaxKind::ConstKw),
    ("continue", SyntaxKind::ContinueKw),
    ("decimal", SyntaxKind::DecimalKw),
    ("default", SyntaxKind::DefaultKw),
    ("delegate", SyntaxKind::DelegateKw),
    ("do", SyntaxKind::DoKw),
    ("double", SyntaxKind::DoubleKw),
    ("else", SyntaxKind::ElseKw),
    ("enum", SyntaxKind::EnumKw),
    ("event", SyntaxKind::EventKw),
    ("explicit", SyntaxKind::ExplicitKw),
    ("extern", SyntaxKind::ExternKw),
    ("false", SyntaxKind::FalseKw),
    ("finally", SyntaxKind::FinallyKw),
    ("fixed", SyntaxKind::FixedKw),
    ("float", SyntaxKind::FloatKw),
    ("for", SyntaxKind::ForKw),
    ("foreach", SyntaxKind::ForeachKw),
    ("goto", SyntaxKind::GotoKw),
    ("if", SyntaxKind::IfKw),
    ("implicit", SyntaxKind::ImplicitKw),
    ("in", SyntaxKind::InKw),
    ("int", SyntaxKind::IntKw),
    ("interface", SyntaxKind::InterfaceKw),
    ("internal", SyntaxKind::InternalKw),
    ("is", SyntaxKind::IsKw),
    ("lock", SyntaxKind::LockKw),
    ("long", SyntaxKind::LongKw),
    ("namespace", SyntaxKind::NamespaceKw),
    ("new", SyntaxKind::NewKw),
    ("null", SyntaxKind::NullKw),
    ("object", SyntaxKind::ObjectKw),
    ("operator", SyntaxKind::OperatorKw),
    ("out", SyntaxKind::OutKw),
    ("override", SyntaxKind::OverrideKw),
    ("params", SyntaxKind::ParamsKw),
    ("private", SyntaxKind::PrivateKw),
    ("protected", SyntaxKind::ProtectedKw),
    ("public", SyntaxKind::PublicKw),
    ("readonly", SyntaxKind::ReadonlyKw),
    ("ref", SyntaxKind::RefKw),
    ("return", SyntaxKind::ReturnKw),
    ("sbyte", SyntaxKind::SbyteKw),
    ("sealed", SyntaxKind::SealedKw),
    ("short", SyntaxKind::ShortKw),
    ("sizeof", SyntaxKind::SizeofKw),
    ("stackalloc", SyntaxKind::StackallocKw),
    ("static", SyntaxKind::StaticKw),
    ("string", SyntaxKind::StringKw),
    ("struct", SyntaxKind::StructKw),
    ("switch", SyntaxKind::SwitchKw),
    ("this", SyntaxKind::ThisKw),
    ("throw", SyntaxKind::ThrowKw),
    ("true", SyntaxKind::TrueKw),
    ("try", SyntaxKind::TryKw),
    ("typeof", SyntaxKind::TypeofKw),
    ("uint", SyntaxKind::UintKw),
    ("ulong", SyntaxKind::UlongKw),
    ("unchecked", SyntaxKind::UncheckedKw),
    ("unsafe", SyntaxKind::UnsafeKw),
    ("ushort", SyntaxKind::UshortKw),
    ("using", SyntaxKind::UsingKw),
    ("virtual", SyntaxKind::VirtualKw),
    ("void", SyntaxKind::VoidKw),
    ("volatile", SyntaxKind::VolatileKw),
    ("while", SyntaxKind::WhileKw),
];

const CONTEXTUAL_KEYWORDS: &[(&str, SyntaxKind)] = &[
    ("add", SyntaxKind::AddKw),
    ("ascending", SyntaxKind::AscendingKw),
    ("async", SyntaxKind::AsyncKw),
    ("await", SyntaxKind::AwaitKw),
    ("by", SyntaxKind::ByKw),
    ("descending", SyntaxKind::DescendingKw),
    ("equals", SyntaxKind::EqualsKw),
    ("from", SyntaxKind::FromKw),
    ("get", SyntaxKind::GetKw),
    ("group", SyntaxKind::GroupKw),
    ("init", SyntaxKind::InitKw),
    ("into", SyntaxKind::IntoKw),
    ("join", SyntaxKind::JoinKw),
    ("let", SyntaxKind::LetKw),
    ("nameof", SyntaxKind::NameofKw),
    ("on", SyntaxKind::OnKw),
    ("orderby", SyntaxKind::OrderbyKw),
    ("partial", SyntaxKind::PartialKw),
    ("remove", SyntaxKind::RemoveKw),
    ("select", SyntaxKind::SelectKw),
    ("set", SyntaxKind::SetKw),
    ("where", SyntaxKind::WhereKw),
    ("yield", SyntaxKind::YieldKw),
];

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}
