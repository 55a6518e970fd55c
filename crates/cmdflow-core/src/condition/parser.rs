//! Recursive-descent parser producing the condition AST
//!
//! Precedence, loosest first: `||`, `&&`, equality, relational, unary,
//! member access.
//!
//! Two limits keep both parsing and the recursive evaluator off the end of
//! the stack: `MAX_DEPTH` bounds grouping (parens, brackets, unary prefixes)
//! and `MAX_NODES` bounds the operator and member nodes of the whole tree,
//! which also bounds its height.

use crate::condition::lexer::{tokenize, Spanned, Token};
use crate::value::Value;

const MAX_DEPTH: usize = 64;
pub const MAX_NODES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Undefined,
    Ident(String),
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub pos: usize,
    pub message: String,
}

pub fn parse(src: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(src).map_err(|e| ParseError {
        pos: e.pos,
        message: e.message,
    })?;
    let mut parser = Parser {
        tokens,
        idx: 0,
        depth: 0,
        nodes: 0,
    };
    if parser.peek() == &Token::Eof {
        return Err(parser.error("empty expression"));
    }
    let expr = parser.logical_or()?;
    if parser.peek() != &Token::Eof {
        return Err(parser.error(format!("unexpected token {:?}", parser.peek())));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    idx: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.idx)
            .map_or(&Token::Eof, |s| &s.token)
    }

    fn pos(&self) -> usize {
        self.tokens
            .get(self.idx)
            .or_else(|| self.tokens.last())
            .map_or(0, |s| s.pos)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.idx < self.tokens.len() {
            self.idx += 1;
        }
        tok
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            pos: self.pos(),
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}, found {:?}", expected, self.peek())))
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    /// Charge one composite node against the tree budget
    fn node(&mut self) -> Result<(), ParseError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(self.error(format!(
                "expression too large (more than {MAX_NODES} operators)"
            )));
        }
        Ok(())
    }

    fn logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.logical_and()?;
        while self.peek() == &Token::OrOr {
            self.node()?;
            self.advance();
            let right = self.logical_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.equality()?;
        while self.peek() == &Token::AndAnd {
            self.node()?;
            self.advance();
            let right = self.equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.relational()?;
        loop {
            let op = match self.peek() {
                Token::StrictEq => BinaryOp::StrictEq,
                Token::StrictNe => BinaryOp::StrictNe,
                Token::LooseEq => BinaryOp::LooseEq,
                Token::LooseNe => BinaryOp::LooseNe,
                _ => return Ok(left),
            };
            self.node()?;
            self.advance();
            let right = self.relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.node()?;
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.member(),
        };
        self.node()?;
        self.advance();
        self.enter()?;
        let expr = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn member(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.node()?;
                    self.advance();
                    let name = match self.advance() {
                        Token::Ident(name) => name,
                        // keywords are valid property names (`x.null` is odd but legal)
                        Token::True => "true".to_string(),
                        Token::False => "false".to_string(),
                        Token::Null => "null".to_string(),
                        Token::Undefined => "undefined".to_string(),
                        other => {
                            return Err(self.error(format!(
                                "expected property name after '.', found {other:?}"
                            )))
                        }
                    };
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(Expr::Literal(Value::String(name))),
                    };
                }
                Token::LBracket => {
                    self.node()?;
                    self.advance();
                    self.enter()?;
                    let property = self.logical_or()?;
                    self.depth -= 1;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(property),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Undefined => Ok(Expr::Undefined),
            Token::Ident(name) => Ok(Expr::Ident(name)),
            Token::LParen => {
                self.enter()?;
                let expr = self.logical_or()?;
                self.depth -= 1;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            other => {
                // point at the offending token, not the one after it
                self.idx = self.idx.saturating_sub(1);
                Err(self.error(format!("unexpected token {other:?}")))
            }
        }
    }
}
