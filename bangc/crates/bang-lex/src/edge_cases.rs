//! Edge case tests for bang-lex

#[cfg(test)]
mod tests {
    use crate::{Lexer, Token, TokenKind};

    fn lex_all(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().expect("lex failure")
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex_all(source).iter().map(|t| t.kind).collect()
    }

    // ==================== EDGE CASES ====================

    #[test]
    fn test_edge_single_char_ident() {
        let tokens = lex_all("x");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text.as_str(), "x");
    }

    #[test]
    fn test_edge_long_identifier() {
        let name = "a".repeat(10_000);
        let tokens = lex_all(&format!("{} = 1", name));
        assert_eq!(tokens[0].text.as_str(), name);
        assert_eq!(tokens[0].span.col_end, 10_001);
    }

    #[test]
    fn test_edge_underscore_identifiers() {
        assert_eq!(kinds("_ _x x_ _1"), vec![TokenKind::Ident; 4]);
    }

    #[test]
    fn test_edge_identifier_with_digits() {
        let tokens = lex_all("v2x = 1");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text.as_str(), "v2x");
    }

    #[test]
    fn test_edge_number_then_identifier_split() {
        // `1x` lexes as the number 1 followed by the identifier x
        assert_eq!(kinds("1x"), vec![TokenKind::Int, TokenKind::Ident]);
    }

    #[test]
    fn test_edge_zero_forms() {
        assert_eq!(kinds("0 0. .0 0.0"), vec![
            TokenKind::Int,
            TokenKind::Float,
            TokenKind::Float,
            TokenKind::Float,
        ]);
    }

    #[test]
    fn test_edge_dot_between_digit_groups() {
        // `1.2.3` dies on the second dot, not later
        let err = Lexer::new("x = 1.2.3").tokenize().unwrap_err();
        assert_eq!(err.span.col_start, 8);
    }

    #[test]
    fn test_edge_dot_chain_after_identifier() {
        // `a.b` keeps the dot its own token
        assert_eq!(
            kinds("a.b.c"),
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_edge_number_dot_fuses_as_float() {
        // after a number, `.` is consumed by the numeric scan: `1.x` is
        // the float `1.` then the identifier `x`
        assert_eq!(kinds("1.x"), vec![TokenKind::Float, TokenKind::Ident]);
    }

    #[test]
    fn test_edge_empty_string_literal() {
        let tokens = lex_all("\"\"");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text.as_str(), "");
    }

    #[test]
    fn test_edge_adjacent_string_literals() {
        let tokens = lex_all("\"a\"\"b\"");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text.as_str(), "a");
        assert_eq!(tokens[1].text.as_str(), "b");
    }

    #[test]
    fn test_edge_no_escape_processing() {
        // backslashes are content, not escapes
        let tokens = lex_all(r#""a\nb""#);
        assert_eq!(tokens[0].text.as_str(), "a\\nb");
    }

    #[test]
    fn test_edge_comment_at_end_of_file_without_newline() {
        assert_eq!(kinds("x # trailing"), vec![TokenKind::Ident]);
    }

    #[test]
    fn test_edge_comment_full_line_of_symbols() {
        assert!(lex_all("# @ $ % ^ ~ ?").is_empty());
    }

    #[test]
    fn test_edge_crlf_treated_as_whitespace() {
        let tokens = lex_all("x = 1\r\ny = 2");
        assert_eq!(tokens[3].span.line, 2);
    }

    #[test]
    fn test_edge_operator_soup() {
        assert_eq!(
            kinds("<=>=!=="),
            vec![
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::NotEq,
                TokenKind::Assign,
            ]
        );
    }

    #[test]
    fn test_edge_triple_star() {
        // `***` is `**` then `*`
        assert_eq!(kinds("***"), vec![TokenKind::StarStar, TokenKind::Star]);
    }

    #[test]
    fn test_edge_single_ampersand_is_error() {
        assert!(Lexer::new("a & b").tokenize().is_err());
    }

    #[test]
    fn test_edge_single_pipe_is_error() {
        assert!(Lexer::new("a | b").tokenize().is_err());
    }

    #[test]
    fn test_edge_error_column_on_later_line() {
        let err = Lexer::new("x = 1\ny = $\n").tokenize().unwrap_err();
        assert_eq!(err.span.line, 2);
        assert_eq!(err.span.col_start, 5);
    }

    #[test]
    fn test_edge_unterminated_string_at_eof() {
        let err = Lexer::new("\"").tokenize().unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.span.col_start, 1);
    }

    #[test]
    fn test_edge_string_containing_quote_like_text() {
        // the second quote closes; the rest lexes normally
        let tokens = lex_all("\"ab\" cd");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn test_edge_every_keyword_round_trips() {
        let source = "if elif else for while break continue return end fn in data";
        let expected = vec![
            TokenKind::If,
            TokenKind::Elif,
            TokenKind::Else,
            TokenKind::For,
            TokenKind::While,
            TokenKind::Break,
            TokenKind::Continue,
            TokenKind::Return,
            TokenKind::End,
            TokenKind::Fn,
            TokenKind::In,
            TokenKind::Data,
        ];
        assert_eq!(kinds(source), expected);
    }

    #[test]
    fn test_edge_dense_program_no_spaces() {
        assert_eq!(
            kinds("x=[1,2];y=x[0]"),
            vec![
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::LBracket,
                TokenKind::Int,
                TokenKind::Comma,
                TokenKind::Int,
                TokenKind::RBracket,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Ident,
                TokenKind::LBracket,
                TokenKind::Int,
                TokenKind::RBracket,
            ]
        );
    }
}
