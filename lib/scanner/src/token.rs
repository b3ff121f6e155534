use std::fmt::Display;

use cursor::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier,
    #[strum(serialize = "STRING")]
    Str,
    Number,

    // Keywords.
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Eof,
}

impl TokenType {
    pub fn keyword(text: &str) -> Option<Self> {
        use TokenType::*;
        Some(match text {
            "and" => And,
            "class" => Class,
            "else" => Else,
            "false" => False,
            "for" => For,
            "fun" => Fun,
            "if" => If,
            "nil" => Nil,
            "or" => Or,
            "print" => Print,
            "return" => Return,
            "super" => Super,
            "this" => This,
            "true" => True,
            "var" => Var,
            "while" => While,
            _ => return None,
        })
    }
}

/// Value carried by `NUMBER` and `STRING` tokens. String literals borrow the source without
/// their quotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'a> {
    Number(f64),
    Str(&'a str),
}

/// Canonical text of a number: the shortest digits that round-trip, written out positionally
/// for magnitudes in `[1e-6, 1e21)` and in exponent form (`1e+21`, `1.5e-7`) outside of it.
pub fn format_number(n: f64) -> String {
    match n {
        n if n.is_nan() => "NaN".to_string(),
        n if n == f64::INFINITY => "Infinity".to_string(),
        n if n == f64::NEG_INFINITY => "-Infinity".to_string(),
        // Also catches -0
        n if n == 0.0 => "0".to_string(),
        n if n < 0.0 => format!("-{}", format_number(-n)),
        n => {
            // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e4`
            let scientific = format!("{n:e}");
            let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
            let digits = mantissa.replace('.', "");
            let len = digits.len() as i32;
            // Position of the decimal point relative to the start of `digits`
            let point = exponent.parse::<i32>().unwrap_or(0) + 1;

            match point {
                p if len <= p && p <= 21 => digits + &"0".repeat((p - len) as usize),
                p if 0 < p && p <= 21 => {
                    let (int, frac) = digits.split_at(p as usize);
                    format!("{int}.{frac}")
                }
                p if -6 < p && p <= 0 => format!("0.{}{digits}", "0".repeat(-p as usize)),
                p => {
                    let (first, rest) = digits.split_at(1);
                    let mantissa =
                        if rest.is_empty() { first.to_string() } else { format!("{first}.{rest}") };
                    format!("{mantissa}e{:+}", p - 1)
                }
            }
        }
    }
}

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", format_number(*n)),
            Literal::Str(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    ty: TokenType,
    lexeme: &'a str,
    literal: Option<Literal<'a>>,
    line: Line,
}

impl<'a> Token<'a> {
    pub fn new(ty: TokenType, lexeme: &'a str, literal: Option<Literal<'a>>, line: Line) -> Self {
        Self { ty, lexeme, literal, line }
    }

    pub fn eof(line: Line) -> Self {
        Self::new(TokenType::Eof, "", None, line)
    }

    pub fn ty(&self) -> TokenType {
        self.ty
    }

    pub fn lexeme(&self) -> &'a str {
        self.lexeme
    }

    pub fn literal(&self) -> Option<Literal<'a>> {
        self.literal
    }

    pub fn line(&self) -> Line {
        self.line
    }

    pub fn is_eof(&self) -> bool {
        self.ty == TokenType::Eof
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ", self.ty, self.lexeme)?;
        match &self.literal {
            Some(literal) => write!(f, "{literal}"),
            None => write!(f, "null"),
        }
    }
}
