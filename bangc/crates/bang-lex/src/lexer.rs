//! Main lexer implementation for the Bang language.
//!
//! A single forward scan over the source. Every branch of the dispatch
//! loop either produces exactly one token, consumes trivia (whitespace,
//! comments), or fails with a located error. Operators are matched
//! longest-first: two-character combinations are tried before single
//! characters.

use bang_util::{Span, Symbol};
use thiserror::Error;

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token, TokenKind};

/// A fatal lexical error.
///
/// Raised for unterminated strings, a second decimal point inside a
/// numeric literal, and characters outside the language's alphabet.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LexerError {
    pub message: String,
    pub span: Span,
}

/// The Bang lexer.
///
/// # Example
///
/// ```
/// use bang_lex::{Lexer, TokenKind};
///
/// let tokens = Lexer::new("print{\"hi\"}").tokenize().unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Ident);
/// assert_eq!(tokens[1].kind, TokenKind::LBrace);
/// assert_eq!(tokens[2].kind, TokenKind::Str);
/// assert_eq!(tokens[2].text.as_str(), "hi");
/// ```
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token>,

    /// Line of the token currently being scanned.
    token_line: u32,

    /// Column of the token currently being scanned.
    token_col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            token_line: 1,
            token_col: 1,
        }
    }

    /// Run the scan to completion.
    ///
    /// Returns the token sequence (no EOF marker) or the first error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        loop {
            let c = self.cursor.current_char();

            if self.cursor.is_at_end() {
                break;
            }

            // Trivia: whitespace and comments never become tokens.
            if c == '\n' || c == ' ' || c == '\t' || c == '\r' {
                self.cursor.advance();
                continue;
            }
            if c == '#' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
                continue;
            }

            self.token_line = self.cursor.line();
            self.token_col = self.cursor.column();

            if c == '"' {
                self.lex_string()?;
            } else if c.is_alphabetic() || c == '_' {
                self.lex_identifier();
            } else if c.is_ascii_digit() || c == '.' {
                self.lex_number()?;
            } else {
                self.lex_operator()?;
            }
        }
        Ok(self.tokens)
    }

    /// Span from the recorded token start to the cursor's current column.
    fn span_here(&self) -> Span {
        Span::new(self.token_line, self.token_col, self.cursor.column())
    }

    fn push(&mut self, kind: TokenKind, text: &str) {
        let span = self.span_here();
        self.tokens.push(Token::new(kind, Symbol::intern(text), span));
    }

    fn error_at(&self, message: impl Into<String>, line: u32, col: u32) -> LexerError {
        LexerError {
            message: message.into(),
            span: Span::point(line, col),
        }
    }

    /// Identifier or keyword. Starts with a letter or `_`, continues with
    /// alphanumerics and `_`; a lookup table promotes keywords afterward.
    fn lex_identifier(&mut self) {
        let start = self.cursor.position();
        loop {
            let c = self.cursor.current_char();
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let kind = keyword_from_ident(text).unwrap_or(TokenKind::Ident);
        self.push(kind, text);
    }

    /// Numeric literal: digits with at most one `.`, which may lead,
    /// trail, or sit inside. A lone `.` is the member-access token.
    fn lex_number(&mut self) -> Result<(), LexerError> {
        let start = self.cursor.position();
        let mut dot_seen = false;

        loop {
            let c = self.cursor.current_char();
            if c == '.' {
                if dot_seen {
                    return Err(self.error_at(
                        "too many decimals in float",
                        self.cursor.line(),
                        self.cursor.column(),
                    ));
                }
                dot_seen = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(start);
        if dot_seen {
            if text == "." {
                self.push(TokenKind::Dot, text);
            } else {
                self.push(TokenKind::Float, text);
            }
        } else {
            self.push(TokenKind::Int, text);
        }
        Ok(())
    }

    /// String literal. No escape processing: everything between the
    /// quotes, newlines included, is the value. An unclosed quote is an
    /// error located at the opening quote.
    fn lex_string(&mut self) -> Result<(), LexerError> {
        let open_line = self.token_line;
        let open_col = self.token_col;

        self.cursor.advance(); // opening quote
        let start = self.cursor.position();
        while !self.cursor.is_at_end() && self.cursor.current_char() != '"' {
            self.cursor.advance();
        }
        if self.cursor.is_at_end() {
            return Err(self.error_at("unterminated string literal", open_line, open_col));
        }
        let content = self.cursor.slice_from(start).to_owned();
        self.cursor.advance(); // closing quote

        // A string that spans lines cannot be described by one column
        // range; its span degrades to the opening quote.
        let col_end = if self.cursor.line() == open_line {
            self.cursor.column()
        } else {
            open_col + 1
        };
        let span = Span::new(open_line, open_col, col_end);
        self.tokens
            .push(Token::new(TokenKind::Str, Symbol::intern(&content), span));
        Ok(())
    }

    /// Operator or punctuation, two-character combinations first.
    fn lex_operator(&mut self) -> Result<(), LexerError> {
        let a = self.cursor.current_char();
        let b = self.cursor.peek_char();

        if let Some(kind) = two_char_kind(a, b) {
            self.cursor.advance();
            self.cursor.advance();
            let mut text = String::with_capacity(2);
            text.push(a);
            text.push(b);
            self.push(kind, &text);
            return Ok(());
        }

        if let Some(kind) = one_char_kind(a) {
            self.cursor.advance();
            self.push(kind, a.encode_utf8(&mut [0u8; 4]));
            return Ok(());
        }

        Err(self.error_at("token not recognized", self.token_line, self.token_col))
    }
}

fn two_char_kind(a: char, b: char) -> Option<TokenKind> {
    let kind = match (a, b) {
        ('+', '=') => TokenKind::PlusAssign,
        ('-', '=') => TokenKind::MinusAssign,
        ('*', '=') => TokenKind::StarAssign,
        ('/', '=') => TokenKind::SlashAssign,
        ('=', '=') => TokenKind::EqEq,
        ('!', '=') => TokenKind::NotEq,
        ('<', '=') => TokenKind::LtEq,
        ('>', '=') => TokenKind::GtEq,
        ('/', '/') => TokenKind::SlashSlash,
        ('*', '*') => TokenKind::StarStar,
        ('&', '&') => TokenKind::AndAnd,
        ('|', '|') => TokenKind::OrOr,
        _ => return None,
    };
    Some(kind)
}

fn one_char_kind(c: char) -> Option<TokenKind> {
    let kind = match c {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '=' => TokenKind::Assign,
        '!' => TokenKind::Negate,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        ',' => TokenKind::Comma,
        ';' => TokenKind::Semicolon,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source_yields_no_tokens() {
        assert!(Lexer::new("").tokenize().unwrap().is_empty());
        assert!(Lexer::new("   \n\t\n").tokenize().unwrap().is_empty());
    }

    #[test]
    fn test_simple_assignment() {
        assert_eq!(
            kinds("x = 1"),
            vec![TokenKind::Ident, TokenKind::Assign, TokenKind::Int]
        );
    }

    #[test]
    fn test_keywords_promoted() {
        assert_eq!(
            kinds("if while data fn end"),
            vec![
                TokenKind::If,
                TokenKind::While,
                TokenKind::Data,
                TokenKind::Fn,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_stays_identifier() {
        assert_eq!(kinds("iffy fnord ending"), vec![TokenKind::Ident; 3]);
    }

    #[test]
    fn test_literal_words() {
        assert_eq!(
            kinds("true false none"),
            vec![TokenKind::Bool, TokenKind::Bool, TokenKind::None]
        );
    }

    #[test]
    fn test_two_char_operators_win_over_singles() {
        assert_eq!(
            kinds("== != <= >= // ** && || += -= *= /="),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::SlashSlash,
                TokenKind::StarStar,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::PlusAssign,
                TokenKind::MinusAssign,
                TokenKind::StarAssign,
                TokenKind::SlashAssign,
            ]
        );
    }

    #[test]
    fn test_adjacent_operators_split_greedily() {
        // `===` lexes as `==` then `=`
        assert_eq!(kinds("==="), vec![TokenKind::EqEq, TokenKind::Assign]);
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(kinds("42"), vec![TokenKind::Int]);
        assert_eq!(kinds("3.25"), vec![TokenKind::Float]);
        assert_eq!(kinds(".5"), vec![TokenKind::Float]);
        assert_eq!(kinds("7."), vec![TokenKind::Float]);
    }

    #[test]
    fn test_lone_dot_is_member_access() {
        assert_eq!(
            kinds("p.x"),
            vec![TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]
        );
    }

    #[test]
    fn test_double_decimal_is_error() {
        let err = Lexer::new("1.2.3").tokenize().unwrap_err();
        assert!(err.message.contains("too many decimals"));
        assert_eq!(err.span.col_start, 4);
    }

    #[test]
    fn test_string_content_excludes_quotes() {
        let tokens = Lexer::new("\"hello world\"").tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text.as_str(), "hello world");
    }

    #[test]
    fn test_string_keeps_hash_and_keywords_raw() {
        let tokens = Lexer::new("\"# not a comment, if anything\"").tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text.as_str(), "# not a comment, if anything");
    }

    #[test]
    fn test_multiline_string_counts_lines() {
        let tokens = Lexer::new("\"a\nb\"\nx").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text.as_str(), "a\nb");
        // the identifier after the string sits on line 3
        assert_eq!(tokens[1].span.line, 3);
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = Lexer::new("x = \"oops").tokenize().unwrap_err();
        assert!(err.message.contains("unterminated string"));
        assert_eq!(err.span.col_start, 5);
    }

    #[test]
    fn test_comment_runs_to_newline() {
        assert_eq!(
            kinds("x # the rest is gone = = =\ny"),
            vec![TokenKind::Ident, TokenKind::Ident]
        );
    }

    #[test]
    fn test_unknown_character_is_error() {
        let err = Lexer::new("x = 1 @ 2").tokenize().unwrap_err();
        assert!(err.message.contains("not recognized"));
        assert_eq!(err.span.line, 1);
        assert_eq!(err.span.col_start, 7);
    }

    #[test]
    fn test_unknown_multibyte_character_is_error() {
        let err = Lexer::new("x = €").tokenize().unwrap_err();
        assert!(err.message.contains("not recognized"));
    }

    #[test]
    fn test_unicode_letters_make_identifiers() {
        let tokens = Lexer::new("café = 1").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text.as_str(), "café");
    }

    #[test]
    fn test_columns_are_one_based_and_end_exclusive() {
        let tokens = Lexer::new("ab + cd").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1, 3));
        assert_eq!(tokens[1].span, Span::new(1, 4, 5));
        assert_eq!(tokens[2].span, Span::new(1, 6, 8));
    }

    #[test]
    fn test_lines_advance() {
        let tokens = Lexer::new("a\nb\n\nc").tokenize().unwrap();
        let lines: Vec<u32> = tokens.iter().map(|t| t.span.line).collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }

    #[test]
    fn test_semicolon_is_a_token() {
        assert_eq!(
            kinds("a; b"),
            vec![TokenKind::Ident, TokenKind::Semicolon, TokenKind::Ident]
        );
    }

    #[test]
    fn test_program_snippet() {
        let src = "fn add args\nreturn args[0] + args[1]\nend";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Fn,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Return,
                TokenKind::Ident,
                TokenKind::LBracket,
                TokenKind::Int,
                TokenKind::RBracket,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::LBracket,
                TokenKind::Int,
                TokenKind::RBracket,
                TokenKind::End,
            ]
        );
    }
}
