use cursor::{Cursor, Line};
use errors::{At, Diagnostic, Diagnostics, Reporter};

pub mod token;
pub use token::{format_number, Literal, Token, TokenType};

use TokenType::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanErrorType {
    #[error("Unexpected character.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
    #[error("Invalid number.")]
    InvalidNumber,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}] Error: {error}")]
pub struct ScanError {
    pub error: ScanErrorType,
    pub line: Line,
}

impl From<ScanError> for Diagnostic {
    fn from(e: ScanError) -> Self {
        Diagnostic::Static { line: e.line, at: At::Nowhere, message: e.error.to_string() }
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

/// Single pass, left-to-right scanner with one character of lookahead beyond `peek`.
pub struct Scanner<'a> {
    start: Cursor<'a>,
    current: Cursor<'a>,
    tokens: Vec<Token<'a>>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let cursor = Cursor::new(source);
        Self { start: cursor.clone(), current: cursor, tokens: Vec::new() }
    }

    /// Scans the whole source. Lexical errors go to `diagnostics` and scanning carries on
    /// after them, so the result always ends with exactly one `EOF` token.
    pub fn scan_tokens<R: Reporter>(mut self, diagnostics: &mut Diagnostics<R>) -> Vec<Token<'a>> {
        loop {
            self.start = self.current.clone();
            let Some(c) = self.current.next() else { break };
            if let Err(e) = self.scan_token(c) {
                diagnostics.report(e);
            }
        }

        self.tokens.push(Token::eof(self.current.line()));
        self.tokens
    }

    fn scan_token(&mut self, c: char) -> Result<(), ScanError> {
        match c {
            '(' => self.add_token(LeftParen),
            ')' => self.add_token(RightParen),
            '{' => self.add_token(LeftBrace),
            '}' => self.add_token(RightBrace),
            ',' => self.add_token(Comma),
            '.' => self.add_token(Dot),
            '-' => self.add_token(Minus),
            '+' => self.add_token(Plus),
            ';' => self.add_token(Semicolon),
            '*' => self.add_token(Star),

            '!' => self.add_token_if_followed_by('=', BangEqual, Bang),
            '=' => self.add_token_if_followed_by('=', EqualEqual, Equal),
            '<' => self.add_token_if_followed_by('=', LessEqual, Less),
            '>' => self.add_token_if_followed_by('=', GreaterEqual, Greater),

            '/' => {
                if self.current.next_if_eq('/') {
                    // Comment, the newline itself is left for the next round
                    self.current.advance_while(|c| c != '\n');
                } else {
                    self.add_token(Slash)
                }
            }

            ' ' | '\r' | '\t' | '\n' => (),

            '"' => return self.string(),

            d if d.is_ascii_digit() => return self.number(),

            a if is_alpha(a) => self.identifier(),

            c => return Err(self.error(ScanErrorType::UnexpectedCharacter(c))),
        }
        Ok(())
    }

    fn lexeme(&self) -> &'a str {
        self.start.slice_until(&self.current)
    }

    fn error(&self, error: ScanErrorType) -> ScanError {
        ScanError { error, line: self.current.line() }
    }

    fn add_token(&mut self, ty: TokenType) {
        self.push_token(ty, None)
    }

    fn add_token_if_followed_by(&mut self, expected: char, matched: TokenType, single: TokenType) {
        if self.current.next_if_eq(expected) {
            self.add_token(matched)
        } else {
            self.add_token(single)
        }
    }

    fn push_token(&mut self, ty: TokenType, literal: Option<Literal<'a>>) {
        let token = Token::new(ty, self.lexeme(), literal, self.current.line());
        log::trace!("Scanned {token}");
        self.tokens.push(token);
    }

    fn string(&mut self) -> Result<(), ScanError> {
        self.current.advance_while(|c| c != '"');

        if !self.current.next_if_eq('"') {
            return Err(self.error(ScanErrorType::UnterminatedString));
        }

        let lexeme = self.lexeme();
        self.push_token(Str, Some(Literal::Str(&lexeme[1..lexeme.len() - 1])));
        Ok(())
    }

    fn number(&mut self) -> Result<(), ScanError> {
        self.current.advance_while(|c| c.is_ascii_digit());

        // A trailing '.' without digits after it is not part of the number
        if self.current.peek() == Some('.')
            && self.current.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.current.next();
            self.current.advance_while(|c| c.is_ascii_digit());
        }

        let value = self
            .lexeme()
            .parse::<f64>()
            .map_err(|_| self.error(ScanErrorType::InvalidNumber))?;
        self.push_token(Number, Some(Literal::Number(value)));
        Ok(())
    }

    fn identifier(&mut self) {
        self.current.advance_while(is_alphanumeric);
        self.add_token(TokenType::keyword(self.lexeme()).unwrap_or(Identifier));
    }
}

/// Scans `source` in one go, see [`Scanner::scan_tokens`].
pub fn scan<'a, R: Reporter>(source: &'a str, diagnostics: &mut Diagnostics<R>) -> Vec<Token<'a>> {
    Scanner::new(source).scan_tokens(diagnostics)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use pretty_assertions::assert_eq;

    use super::*;

    fn scan_source(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut diagnostics = Diagnostics::collecting();
        let tokens = scan(source, &mut diagnostics);
        (tokens, diagnostics.into_reporter())
    }

    fn scan_ok(source: &str) -> Vec<Token> {
        let (tokens, errors) = scan_source(source);
        assert_eq!(errors, vec![], "unexpected scan errors for {source:?}");
        tokens
    }

    fn types(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(Token::ty).collect_vec()
    }

    fn token(ty: TokenType, lexeme: &str, line: usize) -> Token {
        Token::new(ty, lexeme, None, Line(line))
    }

    fn error(line: usize, message: &str) -> Diagnostic {
        Diagnostic::Static { line: Line(line), at: At::Nowhere, message: message.to_string() }
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            scan_ok("\"hello world\""),
            vec![
                Token::new(
                    Str,
                    "\"hello world\"",
                    Some(Literal::Str("hello world")),
                    Line(1)
                ),
                Token::eof(Line(1)),
            ]
        );

        // No escape sequences, the backslash is kept as is
        let tokens = scan_ok(r#""a\n""#);
        assert_eq!(tokens[0].literal(), Some(Literal::Str(r"a\n")));

        let tokens = scan_ok("\"multi\nline\" 1");
        assert_eq!(tokens[0].literal(), Some(Literal::Str("multi\nline")));
        assert_eq!(tokens[0].line(), Line(2));
        assert_eq!(tokens[1].line(), Line(2));
    }

    #[test]
    fn unterminated_string() {
        let (tokens, errors) = scan_source("\"abc");
        assert_eq!(tokens, vec![Token::eof(Line(1))]);
        assert_eq!(errors, vec![error(1, "Unterminated string.")]);

        let (tokens, errors) = scan_source("1 + \"abc\ndef");
        assert_eq!(types(&tokens), vec![Number, Plus, Eof]);
        assert_eq!(tokens[2].line(), Line(2));
        assert_eq!(errors, vec![error(2, "Unterminated string.")]);
    }

    #[test]
    fn two_char_tokens() {
        assert_eq!(
            scan_ok("! != = == < <= > >="),
            vec![
                token(Bang, "!", 1),
                token(BangEqual, "!=", 1),
                token(Equal, "=", 1),
                token(EqualEqual, "==", 1),
                token(Less, "<", 1),
                token(LessEqual, "<=", 1),
                token(Greater, ">", 1),
                token(GreaterEqual, ">=", 1),
                Token::eof(Line(1)),
            ]
        );

        assert_eq!(types(&scan_ok("!==")), vec![BangEqual, Equal, Eof]);
        assert_eq!(types(&scan_ok("<>")), vec![Less, Greater, Eof]);
    }

    #[test]
    fn single_char_tokens() {
        assert_eq!(
            types(&scan_ok("=(){},.-+;*/!<>")),
            vec![
                Equal, LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot, Minus, Plus,
                Semicolon, Star, Slash, Bang, Less, Greater, Eof
            ]
        );
    }

    #[test]
    fn comments() {
        assert_eq!(
            scan_ok("a // comment\nb"),
            vec![token(Identifier, "a", 1), token(Identifier, "b", 2), Token::eof(Line(2))]
        );

        assert_eq!(scan_ok("// only a comment"), vec![Token::eof(Line(1))]);
        assert_eq!(types(&scan_ok("4 / 2")), vec![Number, Slash, Number, Eof]);
    }

    #[test]
    fn line_attribution() {
        let tokens = scan_ok("1\n+\n2");
        assert_eq!(types(&tokens), vec![Number, Plus, Number, Eof]);
        assert_eq!(
            tokens.iter().map(Token::line).collect_vec(),
            vec![Line(1), Line(2), Line(3), Line(3)]
        );

        let tokens = scan_ok("\r\n\t 1 \n\n");
        assert_eq!(tokens[0].line(), Line(2));
        assert_eq!(tokens[1], Token::eof(Line(4)));
    }

    #[test]
    fn numbers() {
        let tokens = scan_ok("123 45.67 0");
        assert_eq!(
            tokens.iter().filter_map(Token::literal).collect_vec(),
            vec![Literal::Number(123.0), Literal::Number(45.67), Literal::Number(0.0)]
        );

        // A trailing dot is scanned on its own
        let tokens = scan_ok("1.");
        assert_eq!(types(&tokens), vec![Number, Dot, Eof]);
        assert_eq!(tokens[0].lexeme(), "1");

        let tokens = scan_ok("1.5.2");
        assert_eq!(types(&tokens), vec![Number, Dot, Number, Eof]);
        assert_eq!(tokens[0].literal(), Some(Literal::Number(1.5)));

        assert_eq!(types(&scan_ok(".5")), vec![Dot, Number, Eof]);
    }

    #[test]
    fn identifiers_and_keywords() {
        let keywords =
            "and class else false for fun if nil or print return super this true var while";
        assert_eq!(
            types(&scan_ok(keywords)),
            vec![
                And, Class, Else, False, For, Fun, If, Nil, Or, Print, Return, Super, This, True,
                Var, While, Eof
            ]
        );

        assert_eq!(
            scan_ok("nil_ish _x9 orchid"),
            vec![
                token(Identifier, "nil_ish", 1),
                token(Identifier, "_x9", 1),
                token(Identifier, "orchid", 1),
                Token::eof(Line(1)),
            ]
        );

        // '=' never continues an identifier
        assert_eq!(types(&scan_ok("a==b")), vec![Identifier, EqualEqual, Identifier, Eof]);
    }

    #[test]
    fn unexpected_characters_do_not_stop_scanning() {
        let (tokens, errors) = scan_source("1 @ 2\n#");
        assert_eq!(types(&tokens), vec![Number, Number, Eof]);
        assert_eq!(
            errors,
            vec![error(1, "Unexpected character."), error(2, "Unexpected character.")]
        );
    }

    #[test]
    fn scan_errors_set_the_error_flag() {
        let mut diagnostics = Diagnostics::collecting();
        scan("1 + 2", &mut diagnostics);
        assert!(!diagnostics.had_error());

        scan("$", &mut diagnostics);
        assert!(diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
    }

    #[test]
    fn expression_tokens() {
        let tokens = scan_ok("-123 * (45.67)");
        assert_eq!(types(&tokens), vec![Minus, Number, Star, LeftParen, Number, RightParen, Eof]);
        assert_eq!(tokens[1].literal(), Some(Literal::Number(123.0)));
        assert_eq!(tokens[4].literal(), Some(Literal::Number(45.67)));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-5617.41), "-5617.41");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn number_formatting_switches_to_exponent_form() {
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1e22), "1e+22");
        assert_eq!(format_number(1.5e300), "1.5e+300");
        assert_eq!(format_number(-2.5e25), "-2.5e+25");

        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(0.0000012), "0.0000012");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.25e-10), "1.25e-10");
        assert_eq!(format_number(f64::MIN_POSITIVE), "2.2250738585072014e-308");

        assert_eq!(format_number(123.456), "123.456");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(120.0), "120");
    }

    #[test]
    fn token_dump() {
        let tokens = scan_ok("(\"hi\" 4.5)");
        assert_eq!(
            tokens.iter().map(Token::to_string).collect_vec(),
            vec![
                "LEFT_PAREN ( null",
                "STRING \"hi\" hi",
                "NUMBER 4.5 4.5",
                "RIGHT_PAREN ) null",
                "EOF  null"
            ]
        );
    }
}
