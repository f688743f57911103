//! Arithmetic calculator over a restricted character set
//!
//! Expressions are evaluated by a small recursive-descent parser:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | '+' unary | atom
//! atom   := number | '(' expr ')'
//! ```
//!
//! Nothing outside digits, `+ - * / . ( )` and spaces is ever accepted, so
//! the input cannot reach anything but arithmetic. Nesting of parentheses
//! and signs is capped at [`MAX_NESTING`] levels to bound recursion.

use crate::{Capability, Result, Tool, ToolError};
use async_trait::async_trait;
use tracing::debug;

const ALLOWED: &str = "0123456789+-*/.() ";

/// Deepest run of nested parentheses and unary signs accepted
pub const MAX_NESTING: usize = 256;

/// Largest magnitude that is printed without a fractional part
const INTEGER_DISPLAY_LIMIT: f64 = 1e15;

/// Evaluates arithmetic expressions such as `(500-400)/400*100`
#[derive(Debug, Default, Clone, Copy)]
pub struct Calculator;

impl Calculator {
    pub const NAME: &'static str = "Financial Calculator";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for Calculator {
    fn capability(&self) -> Capability {
        Capability::Calculator
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Performs financial calculations including percentages, ratios and basic math. \
         Input is an arithmetic expression, e.g. \"100 * 0.15\" or \"(500-400)/400*100\"."
    }

    async fn invoke(&self, input: &str) -> Result<String> {
        let value = evaluate(input)?;
        debug!(expression = input, value, "Evaluated expression");
        Ok(format!("Calculation: {input} = {}", format_number(value)))
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<f64> {
    if !expression.chars().all(|c| ALLOWED.contains(c)) {
        return Err(ToolError::InvalidCharacters);
    }

    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ToolError::Syntax("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;

    if let Some(token) = parser.peek() {
        return Err(ToolError::Syntax(format!("unexpected '{token}'")));
    }

    Ok(value)
}

/// Format a result, dropping the fraction for whole numbers
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < INTEGER_DISPLAY_LIMIT {
        // Whole and in range, so the cast is exact.
        #[allow(clippy::cast_possible_truncation)]
        let whole = value as i64;
        whole.to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let token = match c {
            ' ' => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &expression[start..end];
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| ToolError::Syntax(format!("invalid number '{literal}'")))?;
                tokens.push(Token::Number(number));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => return Err(ToolError::InvalidCharacters),
        };
        tokens.push(token);
        chars.next();
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.advance();
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.advance();
            let rhs = self.unary()?;
            if op == Token::Star {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(ToolError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ToolError::Syntax("expression nested too deeply".to_string()));
        }
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<f64> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(ToolError::Syntax("missing ')'".to_string())),
                }
            }
            Some(token) => Err(ToolError::Syntax(format!("unexpected '{token}'"))),
            None => Err(ToolError::Syntax("unexpected end of expression".to_string())),
        }
    }
}
