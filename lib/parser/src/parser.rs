mod expr;
pub use expr::{Expr, LiteralValue};

use cursor::Line;
use errors::{At, Diagnostic, Diagnostics, Reporter};
use scanner::{Token, TokenType};

use TokenType::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParserErrorType {
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expect ')' after expression.")]
    ExpectedRightParen,
    #[error("Expect end of expression.")]
    ExpectedEnd,
}

impl ParserErrorType {
    fn at(self, token: &Token) -> ParserError {
        ParserError {
            error: self,
            line: token.line(),
            at: if token.is_eof() { At::End } else { At::Lexeme(token.lexeme().to_string()) },
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}] Error{at}: {error}")]
pub struct ParserError {
    pub error: ParserErrorType,
    pub line: Line,
    pub at: At,
}

impl From<ParserError> for Diagnostic {
    fn from(e: ParserError) -> Self {
        Diagnostic::Static { line: e.line, at: e.at, message: e.error.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, ParserError>;

/// Recursive descent parser for a single expression:
///
/// ```text
/// expression → equality
/// equality   → comparison ( ( "!=" | "==" ) comparison )*
/// comparison → term ( ( ">" | ">=" | "<" | "<=" ) term )*
/// term       → factor ( ( "-" | "+" ) factor )*
/// factor     → unary ( ( "/" | "*" ) unary )*
/// unary      → ( "!" | "-" ) unary | primary
/// primary    → NUMBER | STRING | "true" | "false" | "nil" | "(" expression ")"
/// ```
#[derive(Debug)]
pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    current: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    /// `tokens` should end with the `EOF` token, as produced by the scanner. A sequence that
    /// doesn't is rejected by [`Parser::parse`].
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses the whole token sequence into one expression. A syntax error is reported to
    /// `diagnostics` and no tree is returned.
    pub fn parse<R: Reporter>(&mut self, diagnostics: &mut Diagnostics<R>) -> Result<Expr<'a>> {
        let result = self.ends_with_eof().and_then(|()| self.expression()).and_then(|expr| {
            if self.is_at_end() {
                Ok(expr)
            } else {
                Err(ParserErrorType::ExpectedEnd.at(self.peek()))
            }
        });

        if let Err(e) = &result {
            log::debug!("Hit error: {:?}, aborting parse", e);
            diagnostics.report(e.clone());
        }
        result
    }

    fn expression(&mut self) -> Result<Expr<'a>> {
        self.equality()
    }

    fn equality(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.comparison()?;

        while let Some(operator) = self.consume_any(&[BangEqual, EqualEqual]) {
            let right = Box::new(self.comparison()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.term()?;

        while let Some(operator) = self.consume_any(&[Greater, GreaterEqual, Less, LessEqual]) {
            let right = Box::new(self.term()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.factor()?;

        while let Some(operator) = self.consume_any(&[Minus, Plus]) {
            let right = Box::new(self.factor()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.unary()?;

        while let Some(operator) = self.consume_any(&[Slash, Star]) {
            let right = Box::new(self.unary()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>> {
        if let Some(operator) = self.consume_any(&[Bang, Minus]) {
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { operator, right });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        let token = self.peek();
        let literal = match (token.ty(), token.literal()) {
            (False, _) => LiteralValue::Boolean(false),
            (True, _) => LiteralValue::Boolean(true),
            (Nil, _) => LiteralValue::Nil,
            (Number | Str, Some(literal)) => literal.into(),
            (LeftParen, _) => {
                self.advance();
                let expr = self.expression()?;

                self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen)?;

                return Ok(Expr::Grouping(Box::new(expr)));
            }

            _ => return Err(ParserErrorType::ExpectedExpression.at(token)),
        };

        self.advance();
        Ok(Expr::Literal(literal))
    }

    /// Skips tokens until the start of the next statement.
    // Recovery point for statement-level parsing, plain expressions never need it.
    #[allow(dead_code)]
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().is_some_and(|t| t.ty() == Semicolon) {
                return;
            }

            match self.peek().ty() {
                Class | Fun | Var | For | If | While | Print | Return => return,
                _ => {}
            }

            self.advance();
        }
    }
}

// Helpers
impl<'t, 'a> Parser<'t, 'a> {
    fn ends_with_eof(&self) -> Result<()> {
        match self.tokens.last() {
            Some(token) if token.is_eof() => Ok(()),
            last => Err(ParserError {
                error: ParserErrorType::ExpectedExpression,
                line: last.map_or(Line::default(), Token::line),
                at: At::End,
            }),
        }
    }

    fn consume_any(&mut self, types: &[TokenType]) -> Option<Token<'a>> {
        types.iter().any(|ty| self.check(*ty)).then(|| self.advance())
    }

    fn consume_or_error(&mut self, ty: TokenType, error_type: ParserErrorType) -> Result<Token<'a>> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            Err(error_type.at(self.peek()))
        }
    }

    fn check(&self, ty: TokenType) -> bool {
        !self.is_at_end() && self.peek().ty() == ty
    }

    /// Moves past the current token and returns it. Never moves past `EOF`.
    fn advance(&mut self) -> Token<'a> {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> &'t Token<'a> {
        &self.tokens[self.current]
    }

    fn previous(&self) -> Option<&'t Token<'a>> {
        self.current.checked_sub(1).map(|i| &self.tokens[i])
    }

    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }
}

/// Parses an already scanned token sequence, see [`Parser::parse`].
pub fn parse<'a, R: Reporter>(
    tokens: &[Token<'a>],
    diagnostics: &mut Diagnostics<R>,
) -> Result<Expr<'a>> {
    Parser::new(tokens).parse(diagnostics)
}
