//! Arithmetic expressions typed into the query box.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '%') unary)*
//! unary  := ('+' | '-') unary | power
//! power  := atom ('^' unary)?
//! atom   := number | ident | ident '(' expr ')' | '(' expr ')'
//! ```

use crate::cancel::CancelToken;
use crate::error::{CalcError, ProviderError};
use crate::model::{Entry, EntryList};
use crate::sources::{Query, Source};
use std::f64::consts;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => tokens.push(Token::Number(number(&mut chars)?)),
            c if c.is_alphabetic() => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_alphanumeric() { break; }
                    ident.push(c);
                    chars.next();
                }
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

fn number(chars: &mut Peekable<Chars<'_>>) -> Result<f64, CalcError> {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_digit() || c == '.') { break; }
        text.push(c);
        chars.next();
    }
    text.parse().map_err(|_| CalcError::InvalidNumber(text))
}

/// Nesting limit for parentheses, signs and exponents.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    /// Set once an operator or function is applied.
    computed: bool,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                self.computed = true;
                Some(op)
            }
            _ => None,
        }
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    /// Every recursive path of the grammar passes through here, so this is
    /// where nesting is bounded.
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, CalcError> {
        match self.eat_op(&['+', '-']) {
            Some('-') => Ok(-self.unary()?),
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.atom()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.expr()?;
                self.expect_close()?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::Open) {
                    self.pos += 1;
                    let arg = self.expr()?;
                    self.expect_close()?;
                    self.computed = true;
                    apply(&name, arg)
                } else {
                    constant(&name)
                }
            }
            Some(Token::Close) => Err(CalcError::UnexpectedChar(')')),
            Some(Token::Op(op)) => Err(CalcError::UnexpectedChar(op)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }

    fn expect_close(&mut self) -> Result<(), CalcError> {
        match self.advance() {
            Some(Token::Close) => Ok(()),
            Some(_) => Err(CalcError::TrailingInput),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

fn constant(name: &str) -> Result<f64, CalcError> {
    match name {
        "pi" => Ok(consts::PI),
        "e" => Ok(consts::E),
        _ => Err(CalcError::UnknownIdent(name.to_string())),
    }
}

fn apply(function: &str, arg: f64) -> Result<f64, CalcError> {
    Ok(match function {
        "sqrt" => arg.sqrt(),
        "abs" => arg.abs(),
        "ln" => arg.ln(),
        "log" => arg.log10(),
        "sin" => arg.sin(),
        "cos" => arg.cos(),
        "tan" => arg.tan(),
        "floor" => arg.floor(),
        "ceil" => arg.ceil(),
        "round" => arg.round(),
        _ => return Err(CalcError::UnknownIdent(function.to_string())),
    })
}

/// Evaluates `input`. `Ok(None)` means the input parsed but is a bare number
/// or constant, which is not worth showing as a result.
pub fn evaluate(input: &str) -> Result<Option<f64>, CalcError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
        depth: 0,
        computed: false,
    };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(CalcError::TrailingInput);
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(parser.computed.then_some(value))
}

/// Shortest decimal form of `value`, with `-0` shown as `0`.
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

pub struct CalcSource;

impl Source for CalcSource {
    fn name(&self) -> &'static str {
        "calculation"
    }

    fn search(&self, query: &Query, _cancel: &CancelToken) -> Result<EntryList, ProviderError> {
        Ok(match evaluate(&query.text)? {
            Some(value) => EntryList::single(Entry::calculation(&format_value(value))),
            None => EntryList::new(),
        })
    }
}
