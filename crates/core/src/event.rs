//! The event protocol between a grammar and the structure builders.
//!
//! A [`Grammar`] recognises Java source and reports what it finds, in source
//! order, to an [`EventSink`]. Comments and syntax errors travel out of band:
//! they may arrive at any point before the first event positioned after them.
//!
//! Declarations report their pieces in a fixed order:
//!
//! * types: `BeginElement`, `Modifier`*, `TypeDef`, `ModifiersConsumed`,
//!   `TypeDefName`, `TypeParameters`?, extends/implements clauses, the body,
//!   `End(TypeDef)`;
//! * methods: `BeginElement`, `Modifier`*, `ModifiersConsumed`,
//!   `TypeParameters`?, `TypeSpec` (return type), `MethodDeclaration`,
//!   (`TypeSpec`, `MethodParameter`)*, `AllMethodParameters`, the body,
//!   `End(Method)`;
//! * fields: `BeginElement`, `Modifier`*, `ModifiersConsumed`, `TypeSpec`,
//!   `Field`, initialisers, `End(Field)`.

use crate::error::StructureError;
use crate::token::LocatableToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    For,
    While,
    DoWhile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDefKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// Constructs opened by `Begin` and closed by `End`.
///
/// Type definitions, fields, methods, init blocks and anonymous class bodies
/// are opened by their own declaration events but closed through `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    TypeDef,
    TypeBody,
    Field,
    Method,
    MethodBody,
    Loop(LoopKind),
    /// Opened at the first token of the body. A body starting with `{` opens
    /// no wrapper node of its own.
    LoopBody(LoopKind),
    If,
    IfBranch,
    Try,
    /// Opened at the `{` of the guarded block.
    TryBlock,
    /// A statement block, opened at its `{`.
    Block,
    InitBlock,
    AnonClassBody,
    Expression,
}

impl Construct {
    pub fn name(self) -> &'static str {
        match self {
            Construct::TypeDef => "type definition",
            Construct::TypeBody => "type body",
            Construct::Field => "field",
            Construct::Method => "method",
            Construct::MethodBody => "method body",
            Construct::Loop(_) => "loop",
            Construct::LoopBody(_) => "loop body",
            Construct::If => "if statement",
            Construct::IfBranch => "if branch",
            Construct::Try => "try statement",
            Construct::TryBlock => "try block",
            Construct::Block => "block",
            Construct::InitBlock => "initializer block",
            Construct::AnonClassBody => "anonymous class body",
            Construct::Expression => "expression",
        }
    }
}

/// A type parameter with the tokens of its first bound, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: LocatableToken,
    pub bound: Vec<LocatableToken>,
}

impl TypeParam {
    pub fn new(name: LocatableToken) -> Self {
        Self {
            name,
            bound: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    Begin {
        construct: Construct,
        token: LocatableToken,
    },
    /// Closes the innermost open construct. With `included` the node extends
    /// to the end of `token`, otherwise it stops at its start.
    End {
        construct: Construct,
        token: LocatableToken,
        included: bool,
    },
    BeginPackage {
        keyword: LocatableToken,
    },
    Package {
        name: Vec<LocatableToken>,
    },
    PackageSemi {
        semi: LocatableToken,
    },
    /// First token of a declaration or import, annotations and modifiers included.
    BeginElement {
        first: LocatableToken,
    },
    Import {
        name: Vec<LocatableToken>,
        is_static: bool,
        on_demand: bool,
    },
    ImportSemi {
        semi: LocatableToken,
    },
    Modifier {
        token: LocatableToken,
    },
    ModifiersConsumed,
    TypeDef {
        kind: TypeDefKind,
    },
    /// `hidden` is a block comment directly preceding the declaration.
    TypeDefName {
        name: LocatableToken,
        hidden: Option<LocatableToken>,
    },
    /// Type parameters of the type or method being declared.
    TypeParameters {
        params: Vec<TypeParam>,
        close: LocatableToken,
    },
    /// `lookahead` is the first token after the keyword.
    TypeDefExtends {
        keyword: LocatableToken,
        lookahead: Option<LocatableToken>,
    },
    TypeDefImplements {
        keyword: LocatableToken,
    },
    /// A complete type reference. `lookahead` is the token following it when
    /// that matters to the reader, such as the comma between interfaces.
    TypeSpec {
        tokens: Vec<LocatableToken>,
        lookahead: Option<LocatableToken>,
    },
    Field {
        names: Vec<LocatableToken>,
    },
    MethodDeclaration {
        name: LocatableToken,
        hidden: Option<LocatableToken>,
    },
    ConstructorDeclaration {
        name: LocatableToken,
        hidden: Option<LocatableToken>,
    },
    MethodParameter {
        name: LocatableToken,
    },
    AllMethodParameters,
    BeginInitBlock {
        first: LocatableToken,
        lbrace: LocatableToken,
    },
    /// `first` is the first token of the instantiated type (or the enum
    /// constant) owning the body.
    BeginAnonClassBody {
        first: LocatableToken,
        lbrace: LocatableToken,
    },
    Comment {
        token: LocatableToken,
    },
    Error {
        message: String,
    },
}

impl ParseEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ParseEvent::Begin { .. } => "begin",
            ParseEvent::End { .. } => "end",
            ParseEvent::BeginPackage { .. } => "begin package",
            ParseEvent::Package { .. } => "package",
            ParseEvent::PackageSemi { .. } => "package semicolon",
            ParseEvent::BeginElement { .. } => "begin element",
            ParseEvent::Import { .. } => "import",
            ParseEvent::ImportSemi { .. } => "import semicolon",
            ParseEvent::Modifier { .. } => "modifier",
            ParseEvent::ModifiersConsumed => "modifiers consumed",
            ParseEvent::TypeDef { .. } => "type definition",
            ParseEvent::TypeDefName { .. } => "type name",
            ParseEvent::TypeParameters { .. } => "type parameters",
            ParseEvent::TypeDefExtends { .. } => "extends",
            ParseEvent::TypeDefImplements { .. } => "implements",
            ParseEvent::TypeSpec { .. } => "type spec",
            ParseEvent::Field { .. } => "field",
            ParseEvent::MethodDeclaration { .. } => "method declaration",
            ParseEvent::ConstructorDeclaration { .. } => "constructor declaration",
            ParseEvent::MethodParameter { .. } => "method parameter",
            ParseEvent::AllMethodParameters => "end of parameters",
            ParseEvent::BeginInitBlock { .. } => "initializer block",
            ParseEvent::BeginAnonClassBody { .. } => "anonymous class body",
            ParseEvent::Comment { .. } => "comment",
            ParseEvent::Error { .. } => "error",
        }
    }

    /// Start of the token this event is anchored at, if it carries one.
    pub fn position(&self) -> Option<(u32, u32)> {
        let token = match self {
            ParseEvent::Begin { token, .. } | ParseEvent::End { token, .. } => token,
            ParseEvent::BeginPackage { keyword }
            | ParseEvent::TypeDefExtends { keyword, .. }
            | ParseEvent::TypeDefImplements { keyword } => keyword,
            ParseEvent::Package { name } | ParseEvent::Import { name, .. } => name.first()?,
            ParseEvent::PackageSemi { semi } | ParseEvent::ImportSemi { semi } => semi,
            ParseEvent::BeginElement { first }
            | ParseEvent::BeginInitBlock { first, .. }
            | ParseEvent::BeginAnonClassBody { first, .. } => first,
            ParseEvent::Modifier { token } | ParseEvent::Comment { token } => token,
            ParseEvent::TypeDefName { name, .. }
            | ParseEvent::MethodDeclaration { name, .. }
            | ParseEvent::ConstructorDeclaration { name, .. }
            | ParseEvent::MethodParameter { name } => name,
            ParseEvent::TypeParameters { close, .. } => close,
            ParseEvent::TypeSpec { tokens, .. } => tokens.first()?,
            ParseEvent::Field { names } => names.first()?,
            ParseEvent::ModifiersConsumed
            | ParseEvent::TypeDef { .. }
            | ParseEvent::AllMethodParameters
            | ParseEvent::Error { .. } => return None,
        };
        Some(token.start())
    }
}

pub trait EventSink {
    fn accept(&mut self, event: &ParseEvent) -> Result<(), StructureError>;
}

/// Records the stream, mostly useful for inspecting a grammar.
impl EventSink for Vec<ParseEvent> {
    fn accept(&mut self, event: &ParseEvent) -> Result<(), StructureError> {
        self.push(event.clone());
        Ok(())
    }
}

pub trait Grammar {
    /// Parses one compilation unit, reporting to `sink`. Syntax errors are
    /// reported as [`ParseEvent::Error`]; an `Err` means the sink rejected
    /// the stream or the grammar itself could not run.
    fn parse(&self, text: &str, sink: &mut dyn EventSink) -> crate::Result<()>;
}
