//! Token definitions for the Bang language.

use std::fmt;

use bang_util::{Span, Symbol};

/// The closed set of token kinds.
///
/// `Uplus` and `Uminus` are never produced by the lexer; the expression
/// parser rewrites `Plus`/`Minus` to them when they appear in operand
/// position, so the shunting-yard core never has to disambiguate unary
/// from binary itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character operators
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Assign,   // =
    Negate,   // !

    // Synthesized unary kinds (parser only)
    Uplus,
    Uminus,

    // Grouping and punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Semicolon, // ;
    Dot,       // .

    // Two-character operators
    PlusAssign,  // +=
    MinusAssign, // -=
    StarAssign,  // *=
    SlashAssign, // /=
    EqEq,        // ==
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    SlashSlash,  // //
    StarStar,    // **
    AndAnd,      // &&
    OrOr,        // ||

    // Literals
    None,
    Int,
    Float,
    Bool,
    Str,
    Ident,

    // Keywords
    If,
    Elif,
    Else,
    For,
    While,
    Break,
    Continue,
    Return,
    End,
    Fn,
    In,
    Data,
}

impl TokenKind {
    /// True for the keywords that open (or close) a statement form and
    /// must therefore appear first on their logical line. `in`, `true`,
    /// `false` and `none` live inside expressions and are excluded.
    pub fn is_line_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
                | TokenKind::End
                | TokenKind::Fn
                | TokenKind::Data
        )
    }

    /// True for `=`, `+=`, `-=`, `*=`, `/=`.
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Assign => "=",
            TokenKind::Negate => "!",
            TokenKind::Uplus => "unary +",
            TokenKind::Uminus => "unary -",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::SlashSlash => "//",
            TokenKind::StarStar => "**",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::None => "none",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Bool => "boolean literal",
            TokenKind::Str => "string literal",
            TokenKind::Ident => "identifier",
            TokenKind::If => "if",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Return => "return",
            TokenKind::End => "end",
            TokenKind::Fn => "fn",
            TokenKind::In => "in",
            TokenKind::Data => "data",
        };
        f.write_str(text)
    }
}

/// One lexed token: kind, original text slice (interned) and location.
///
/// For string literals `text` is the content between the quotes; for
/// everything else it is the exact source slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Symbol,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: Symbol, span: Span) -> Self {
        Self { kind, text, span }
    }
}

/// Promote an identifier to its keyword kind, if it is one.
///
/// `true`/`false` become `Bool`, `none` becomes `None`, `in` becomes the
/// `In` operator; the rest use the keyword table.
pub fn keyword_from_ident(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "true" | "false" => TokenKind::Bool,
        "none" => TokenKind::None,
        "in" => TokenKind::In,
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "return" => TokenKind::Return,
        "end" => TokenKind::End,
        "fn" => TokenKind::Fn,
        "data" => TokenKind::Data,
        _ => return Option::None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_promotion() {
        assert_eq!(keyword_from_ident("if"), Some(TokenKind::If));
        assert_eq!(keyword_from_ident("data"), Some(TokenKind::Data));
        assert_eq!(keyword_from_ident("true"), Some(TokenKind::Bool));
        assert_eq!(keyword_from_ident("false"), Some(TokenKind::Bool));
        assert_eq!(keyword_from_ident("none"), Some(TokenKind::None));
        assert_eq!(keyword_from_ident("in"), Some(TokenKind::In));
        assert_eq!(keyword_from_ident("print"), Option::None);
        assert_eq!(keyword_from_ident("iff"), Option::None);
    }

    #[test]
    fn test_line_keywords_exclude_expression_words() {
        assert!(TokenKind::If.is_line_keyword());
        assert!(TokenKind::Data.is_line_keyword());
        assert!(!TokenKind::In.is_line_keyword());
        assert!(!TokenKind::Bool.is_line_keyword());
        assert!(!TokenKind::None.is_line_keyword());
    }

    #[test]
    fn test_assignment_kinds() {
        assert!(TokenKind::Assign.is_assignment());
        assert!(TokenKind::SlashAssign.is_assignment());
        assert!(!TokenKind::EqEq.is_assignment());
    }
}
