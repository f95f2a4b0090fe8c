//! Token model shared by the scanner and the parser.

use serde::Serialize;
use strum::{Display, IntoStaticStr};

/// Closed enumeration of every lexeme class the scanner can emit.
///
/// Keyword kinds are produced when an identifier matches the keyword table
/// (see [`keyword_kind`]). Compound operators are disambiguated by the
/// scanner with a single character of lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
pub enum TokenKind {
    Eof,
    /// A character the scanner does not understand. The parser rejects it.
    Illegal,

    Number,
    String,
    Ident,
    /// The `$` sigil introducing a variable name.
    Var,

    // keywords
    If,
    Else,
    For,
    Foreach,
    While,
    Function,
    Class,
    Return,
    Use,
    Namespace,
    New,
    As,
    InstanceOf,
    Const,
    Public,
    Protected,
    Private,
    Final,
    Abstract,
    Extends,
    Implements,
    Throw,
    Try,
    Catch,
    Include,
    Require,

    // punctuation
    Semicolon,
    Colon,
    Comma,
    Backslash,
    ParenOpen,
    ParenClose,
    CurlyOpen,
    CurlyClose,
    BracketOpen,
    BracketClose,

    // operators
    Equal,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    PlusEqual,
    MinusEqual,
    MulEqual,
    DivEqual,
    ModEqual,
    Increment,
    Decrement,
    Not,
    IsEqual,
    IsIdentical,
    IsNotEqual,
    IsNotIdentical,
    IsSmaller,
    IsGreater,
    IsSmallerOrEqual,
    IsGreaterOrEqual,
    Ampersand,
    Pipe,
    BooleanAnd,
    BooleanOr,
    Coalesce,
    DoubleArrow,
    /// `->`
    ObjectOperator,
    /// `::`
    StaticFetch,
    /// `..`
    Range,
    /// `...`
    Ellipsis,
}

impl TokenKind {
    /// Whether a token of this kind can end an expression.
    ///
    /// Drives automatic terminator insertion: a newline that follows one of
    /// these kinds is turned into a virtual `;`. The same context decides
    /// whether a `-` in front of a digit starts a negative number literal or
    /// is the binary minus operator.
    #[must_use]
    pub fn ends_expression(self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::String
                | Self::Ident
                | Self::Return
                | Self::ParenClose
                | Self::BracketClose
                | Self::CurlyClose
                | Self::Increment
                | Self::Decrement
        )
    }
}

/// A single lexeme: its kind, the literal source text, and the byte-less
/// character offset of its first character in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub offset: usize,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, literal: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            offset,
        }
    }

    /// A human-readable description for "expected X, got Y" diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of file".to_owned(),
            _ => format!("'{}'", self.literal),
        }
    }
}

/// Maps an identifier to its keyword kind, if it is one.
#[must_use]
pub fn keyword_kind(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "foreach" => TokenKind::Foreach,
        "while" => TokenKind::While,
        "function" => TokenKind::Function,
        "class" => TokenKind::Class,
        "return" => TokenKind::Return,
        "use" => TokenKind::Use,
        "namespace" => TokenKind::Namespace,
        "new" => TokenKind::New,
        "as" => TokenKind::As,
        "instanceof" => TokenKind::InstanceOf,
        "const" => TokenKind::Const,
        "public" => TokenKind::Public,
        "protected" => TokenKind::Protected,
        "private" => TokenKind::Private,
        "final" => TokenKind::Final,
        "abstract" => TokenKind::Abstract,
        "extends" => TokenKind::Extends,
        "implements" => TokenKind::Implements,
        "throw" => TokenKind::Throw,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "include" => TokenKind::Include,
        "require" => TokenKind::Require,
        _ => return None,
    };
    Some(kind)
}
