//! Tokens as delivered by a grammar.
//!
//! Lines and columns are 1-based. Columns count bytes, and the end position is
//! exclusive: a token `foo` at column 5 ends at column 8.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    pub fn from_keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "char" => Self::Char,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "void" => Self::Void,
            _ => return None,
        };
        Some(kind)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Void => "void",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

const KEYWORDS: &[&str] = &[
    "abstract",
    "assert",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "else",
    "enum",
    "final",
    "finally",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "interface",
    "native",
    "new",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "strictfp",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "try",
    "volatile",
    "while",
    "true",
    "false",
    "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Primitive(PrimitiveKind),
    Extends,
    Super,
    Keyword,
    Dot,
    Comma,
    Lt,
    Gt,
    /// `>>`, closing two type argument lists at once.
    ShiftRight,
    /// `>>>`, closing three type argument lists at once.
    UnsignedShiftRight,
    Question,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semicolon,
    Ellipsis,
    Ampersand,
    At,
    BlockComment,
    LineComment,
    Other,
}

impl TokenKind {
    /// Classifies raw token text. Contextual keywords (`var`, `record`, `yield`)
    /// are identifiers.
    pub fn classify(text: &str) -> Self {
        match text {
            "." => return Self::Dot,
            "," => return Self::Comma,
            "<" => return Self::Lt,
            ">" => return Self::Gt,
            ">>" => return Self::ShiftRight,
            ">>>" => return Self::UnsignedShiftRight,
            "?" => return Self::Question,
            "[" => return Self::LBracket,
            "]" => return Self::RBracket,
            "{" => return Self::LBrace,
            "}" => return Self::RBrace,
            "(" => return Self::LParen,
            ")" => return Self::RParen,
            ";" => return Self::Semicolon,
            "..." => return Self::Ellipsis,
            "&" => return Self::Ampersand,
            "@" => return Self::At,
            "extends" => return Self::Extends,
            "super" => return Self::Super,
            _ => {}
        }
        if text.starts_with("/*") {
            return Self::BlockComment;
        }
        if text.starts_with("//") {
            return Self::LineComment;
        }
        if let Some(kind) = PrimitiveKind::from_keyword(text) {
            return Self::Primitive(kind);
        }
        if KEYWORDS.contains(&text) {
            return Self::Keyword;
        }
        let mut chars = text.chars();
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
                if chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
                    Self::Identifier
                } else {
                    Self::Other
                }
            }
            _ => Self::Other,
        }
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::BlockComment | Self::LineComment)
    }

    /// Number of type argument lists a closing token terminates.
    pub fn closing_depth(self) -> Option<i32> {
        match self {
            Self::Gt => Some(1),
            Self::ShiftRight => Some(2),
            Self::UnsignedShiftRight => Some(3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocatableToken {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl LocatableToken {
    /// Builds a token starting at `line:column`, deriving its end from the text.
    pub fn new(text: impl Into<String>, line: u32, column: u32) -> Self {
        let text = text.into();
        let kind = TokenKind::classify(&text);
        Self::with_kind(kind, text, line, column)
    }

    pub fn with_kind(kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Self {
        let text = text.into();
        let (end_line, end_column) = match text.rfind('\n') {
            Some(last_newline) => {
                let newlines = text.matches('\n').count() as u32;
                (line + newlines, (text.len() - last_newline) as u32)
            }
            None => (line, column + text.len() as u32),
        };
        Self {
            kind,
            text,
            line,
            column,
            end_line,
            end_column,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn start(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    pub fn end(&self) -> (u32, u32) {
        (self.end_line, self.end_column)
    }
}

impl fmt::Display for LocatableToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` at {}:{}", self.text, self.line, self.column)
    }
}

/// Joins token texts without separators, as they would be written in source.
pub fn join_tokens(tokens: &[LocatableToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        if matches!(token.kind, TokenKind::Extends | TokenKind::Super) {
            out.push(' ');
            out.push_str(&token.text);
            out.push(' ');
        } else if token.kind == TokenKind::Comma {
            out.push_str(", ");
        } else {
            out.push_str(&token.text);
        }
    }
    out
}
