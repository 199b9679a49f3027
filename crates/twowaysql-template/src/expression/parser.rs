//! Lexer and recursive-descent parser for `IF` conditions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or      := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := "(" or ")" | operand ( cmp operand )?
//! operand := literal | path ( "(" ")" )?
//! ```

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::ast::{CompareOp, Expr, Literal, LogicalOp, Method, Operand, PropertyPath};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while parsing or evaluating a condition or variable path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// An unexpected token was encountered.
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },
    /// The expression ended prematurely.
    #[error("Unexpected end of expression")]
    UnexpectedEof,
    /// A path does not resolve against the parameter object.
    #[error("Property not found: {path} on {type_name}")]
    PropertyNotFound {
        /// The full path as written.
        path: String,
        /// Type name of the root parameter object.
        type_name: String,
    },
    /// Unknown pseudo method.
    #[error("Unknown method {name}() (expected size, isEmpty or isNotEmpty)")]
    UnknownMethod {
        /// Method name as written.
        name: String,
    },
    /// Operand types cannot be compared or a method does not apply.
    #[error("Type mismatch: {message}")]
    TypeMismatch {
        /// Explanation.
        message: String,
    },
    /// A bare operand used as a condition is not a boolean.
    #[error("Condition operand {expression} is not a boolean")]
    NotBoolean {
        /// The operand as written.
        expression: String,
    },
}

// ---------------------------------------------------------------------------
// Token type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Path segment; `#current` keeps its leading `#`.
    Identifier(String),
    Str(String),
    Number(String),
    True,
    False,
    Null,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Dot,
    LParen,
    RParen,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s) => write!(f, "identifier '{s}'"),
            Self::Str(s) => write!(f, "string '{s}'"),
            Self::Number(n) => write!(f, "number {n}"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Null => write!(f, "null"),
            Self::EqEq => write!(f, "'=='"),
            Self::Ne => write!(f, "'!='"),
            Self::Lt => write!(f, "'<'"),
            Self::Le => write!(f, "'<='"),
            Self::Gt => write!(f, "'>'"),
            Self::Ge => write!(f, "'>='"),
            Self::AndAnd => write!(f, "'&&'"),
            Self::OrOr => write!(f, "'||'"),
            Self::Bang => write!(f, "'!'"),
            Self::Dot => write!(f, "'.'"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Eof => write!(f, "EOF"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            if tok == Token::Eof {
                tokens.push(Token::Eof);
                break;
            }
            tokens.push(tok);
        }
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn next_token(&mut self) -> Result<Token, ExpressionError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        match ch {
            '\'' => self.read_string(),
            '=' => self.read_pair('=', Token::EqEq),
            '&' => self.read_pair('&', Token::AndAnd),
            '|' => self.read_pair('|', Token::OrOr),
            '!' => {
                self.chars.next();
                if self.chars.next_if_eq(&'=').is_some() {
                    Ok(Token::Ne)
                } else {
                    Ok(Token::Bang)
                }
            }
            '<' => {
                self.chars.next();
                if self.chars.next_if_eq(&'=').is_some() {
                    Ok(Token::Le)
                } else if self.chars.next_if_eq(&'>').is_some() {
                    Ok(Token::Ne)
                } else {
                    Ok(Token::Lt)
                }
            }
            '>' => {
                self.chars.next();
                if self.chars.next_if_eq(&'=').is_some() {
                    Ok(Token::Ge)
                } else {
                    Ok(Token::Gt)
                }
            }
            '.' => {
                self.chars.next();
                Ok(Token::Dot)
            }
            '(' => {
                self.chars.next();
                Ok(Token::LParen)
            }
            ')' => {
                self.chars.next();
                Ok(Token::RParen)
            }
            '-' => {
                self.chars.next();
                let digits = self.read_number_chars();
                if digits.is_empty() {
                    return Err(ExpressionError::UnexpectedToken {
                        expected: "number after '-'".to_owned(),
                        found: "'-'".to_owned(),
                    });
                }
                Ok(Token::Number(format!("-{digits}")))
            }
            c if c.is_ascii_digit() => Ok(Token::Number(self.read_number_chars())),
            c if c.is_alphabetic() || c == '_' || c == '#' => Ok(self.read_identifier_or_keyword()),
            _ => Err(ExpressionError::UnexpectedToken {
                expected: "valid token".to_owned(),
                found: format!("'{ch}'"),
            }),
        }
    }

    /// Two-character operators written as a doubled character (`==`, `&&`, `||`).
    fn read_pair(&mut self, second: char, token: Token) -> Result<Token, ExpressionError> {
        self.chars.next();
        if self.chars.next_if_eq(&second).is_some() {
            Ok(token)
        } else {
            Err(ExpressionError::UnexpectedToken {
                expected: token.to_string(),
                found: format!("'{second}'"),
            })
        }
    }

    fn read_string(&mut self) -> Result<Token, ExpressionError> {
        self.chars.next(); // consume opening quote
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some('\'') => {
                    if self.chars.next_if_eq(&'\'').is_some() {
                        s.push('\'');
                    } else {
                        return Ok(Token::Str(s));
                    }
                }
                Some(c) => s.push(c),
                None => return Err(ExpressionError::UnexpectedEof),
            }
        }
    }

    fn read_number_chars(&mut self) -> String {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        s
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || (c == '#' && ident.is_empty()) {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match ident.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ => Token::Identifier(ident),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<Token, ExpressionError> {
        let tok = self.advance();
        if std::mem::discriminant(&tok) == std::mem::discriminant(expected) {
            Ok(tok)
        } else if tok == Token::Eof {
            Err(ExpressionError::UnexpectedEof)
        } else {
            Err(ExpressionError::UnexpectedToken {
                expected: expected.to_string(),
                found: tok.to_string(),
            })
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn parse_or_expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_and_expr()?;
        while matches!(self.peek(), Token::OrOr) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary_expr()?;
        while matches!(self.peek(), Token::AndAnd) {
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, ExpressionError> {
        if matches!(self.peek(), Token::Bang) {
            self.advance();
            let expr = self.parse_unary_expr()?;
            return Ok(Expr::Not(Box::new(expr)));
        }
        self.parse_primary_expr()
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ExpressionError> {
        if matches!(self.peek(), Token::LParen) {
            self.advance();
            let expr = self.parse_or_expr()?;
            self.expect(&Token::RParen)?;
            return Ok(expr);
        }

        let left = self.parse_operand()?;
        let op = match self.peek() {
            Token::EqEq => CompareOp::Eq,
            Token::Ne => CompareOp::Ne,
            Token::Lt => CompareOp::Lt,
            Token::Le => CompareOp::Le,
            Token::Gt => CompareOp::Gt,
            Token::Ge => CompareOp::Ge,
            _ => return Ok(Expr::Operand(left)),
        };
        self.advance();
        let right = self.parse_operand()?;
        Ok(Expr::Compare { left, op, right })
    }

    fn parse_operand(&mut self) -> Result<Operand, ExpressionError> {
        match self.advance() {
            Token::Null => Ok(Operand::Literal(Literal::Null)),
            Token::True => Ok(Operand::Literal(Literal::Bool(true))),
            Token::False => Ok(Operand::Literal(Literal::Bool(false))),
            Token::Number(n) => Ok(Operand::Literal(Literal::Number(n))),
            Token::Str(s) => Ok(Operand::Literal(Literal::String(s))),
            Token::Identifier(first) => self.parse_path_tail(first),
            Token::Eof => Err(ExpressionError::UnexpectedEof),
            other => Err(ExpressionError::UnexpectedToken {
                expected: "operand".to_owned(),
                found: other.to_string(),
            }),
        }
    }

    /// Continue a path after its first segment; a trailing `()` turns the
    /// last segment into a method call.
    fn parse_path_tail(&mut self, first: String) -> Result<Operand, ExpressionError> {
        let mut segments = vec![first];
        while matches!(self.peek(), Token::Dot) {
            self.advance();
            match self.advance() {
                Token::Identifier(seg) => segments.push(seg),
                Token::Eof => return Err(ExpressionError::UnexpectedEof),
                other => {
                    return Err(ExpressionError::UnexpectedToken {
                        expected: "property name".to_owned(),
                        found: other.to_string(),
                    });
                }
            }
        }

        if matches!(self.peek(), Token::LParen) {
            self.advance();
            self.expect(&Token::RParen)?;
            let name = segments.pop().unwrap_or_default();
            let method =
                Method::from_name(&name).ok_or(ExpressionError::UnknownMethod { name })?;
            if segments.is_empty() {
                return Err(ExpressionError::UnexpectedToken {
                    expected: "receiver before method call".to_owned(),
                    found: format!("{method}()"),
                });
            }
            return Ok(Operand::Method {
                path: PropertyPath { segments },
                method,
            });
        }

        Ok(Operand::Path(PropertyPath { segments }))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse an `IF` condition.
///
/// # Errors
///
/// Returns `ExpressionError` if the condition is syntactically invalid.
pub fn parse_condition(input: &str) -> Result<Expr, ExpressionError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_or_expr()?;
    if !parser.at_end() {
        return Err(ExpressionError::UnexpectedToken {
            expected: "end of expression".to_owned(),
            found: parser.peek().to_string(),
        });
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
