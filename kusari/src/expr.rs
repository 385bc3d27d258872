//! Statement expression trees.
//!
//! Each statement parses into one [`Expr`] before it runs. The parser is a
//! small precedence climber over the classified token stream:
//!
//!   * `var` and `return` are recognized at the statement head only,
//!   * assignment binds lowest and associates to the right,
//!   * comparison, then additive, then multiplicative operators climb in
//!     that order (see [`priority`]),
//!   * a name followed by `(` is a call; nested calls and parenthesized
//!     groups recurse through the same entry point.
//!
//! A statement must reduce to exactly one tree; trailing tokens are an
//! illegal-symbol fatal.

use crate::message::{FatalKind, Message};
use crate::token::{literal_text, Token, TokenKind};
use crate::value::Payload;

/// Parsed form of one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Self-evaluating literal.
    Literal(Payload),
    /// Name resolved at run time against scopes, then operations.
    Ident(String),
    /// Binary operator application.
    Infix {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Named invocation; a dotted name is a method call on its prefix.
    Call { name: String, args: Vec<Expr> },
    /// Parenthesized comma list; evaluates in order and yields the last
    /// value. Single-expression groups collapse to their inner tree.
    Group(Vec<Expr>),
    /// Store into an existing binding.
    Assign { target: String, value: Box<Expr> },
    /// `var` declaration list; a missing initializer binds null.
    Declare(Vec<(String, Option<Expr>)>),
    /// `return` with an optional result.
    Return(Option<Box<Expr>>),
}

/// Binding strength of an infix symbol. Lower binds looser. Assignment sits
/// below everything, comparisons below arithmetic, and `*`, `/` and `\`
/// bind tightest of the operators; any other symbol is off the table.
pub fn priority(sym: &str) -> u8 {
    match sym {
        "=" => 0,
        "==" | "!=" | "<=" | ">=" | "<" | ">" => 1,
        "+" | "-" => 2,
        "*" | "/" | "\\" => 3,
        _ => 4,
    }
}

/// Parse one statement's tokens into a tree.
pub fn parse_statement(tokens: &[Token]) -> Result<Expr, Message> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = match tokens.first() {
        Some(t) if t.kind == TokenKind::Operation && t.text == "var" => {
            parser.pos += 1;
            parser.declarations()?
        }
        Some(t) if t.kind == TokenKind::Operation && t.text == "return" => {
            parser.pos += 1;
            if parser.at_end() {
                Expr::Return(None)
            } else {
                Expr::Return(Some(Box::new(parser.assignment()?)))
            }
        }
        _ => parser.assignment()?,
    };
    if let Some(extra) = parser.peek() {
        return Err(Message::fatal(
            FatalKind::IllegalSymbol,
            format!("unexpected token '{}' after expression", extra.text),
        ));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek_symbol(&self) -> Option<&'a str> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Symbol => Some(t.text.as_str()),
            _ => None,
        }
    }

    fn eat_symbol(&mut self, sym: &str) -> bool {
        if self.peek_symbol() == Some(sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, sym: &str) -> Result<(), Message> {
        if self.eat_symbol(sym) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{sym}'")))
        }
    }

    fn unexpected(&self, context: &str) -> Message {
        match self.peek() {
            Some(t) => Message::fatal(
                FatalKind::IllegalSymbol,
                format!("{context}, found '{}'", t.text),
            ),
            None => Message::fatal(
                FatalKind::IllegalSymbol,
                format!("{context}, found end of statement"),
            ),
        }
    }

    /// `var` tail: `name [= expr] (, name [= expr])*`.
    fn declarations(&mut self) -> Result<Expr, Message> {
        let mut names = Vec::new();
        loop {
            let name = self.identifier("expected variable name")?;
            let init = if self.eat_symbol("=") {
                Some(self.assignment()?)
            } else {
                None
            };
            names.push((name, init));
            if !self.eat_symbol(",") {
                break;
            }
        }
        Ok(Expr::Declare(names))
    }

    fn identifier(&mut self, context: &str) -> Result<String, Message> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Operation => {
                self.pos += 1;
                Ok(t.text.clone())
            }
            _ => Err(self.unexpected(context)),
        }
    }

    /// Right-associative `=`; the left side must be a plain name.
    fn assignment(&mut self) -> Result<Expr, Message> {
        let lhs = self.comparison()?;
        if self.peek_symbol() == Some("=") {
            self.pos += 1;
            let target = match lhs {
                Expr::Ident(name) if !name.contains('.') => name,
                other => {
                    return Err(Message::fatal(
                        FatalKind::IllegalCall,
                        format!("invalid assignment target: {}", describe(&other)),
                    ))
                }
            };
            let value = self.assignment()?;
            return Ok(Expr::Assign {
                target,
                value: Box::new(value),
            });
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, Message> {
        let mut lhs = self.additive()?;
        while let Some(sym) = self.peek_symbol() {
            if priority(sym) != 1 {
                break;
            }
            let op = sym.to_string();
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = Expr::Infix {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, Message> {
        let mut lhs = self.multiplicative()?;
        while let Some(sym) = self.peek_symbol() {
            if priority(sym) != 2 {
                break;
            }
            let op = sym.to_string();
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Infix {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, Message> {
        let mut lhs = self.primary()?;
        while let Some(sym) = self.peek_symbol() {
            if priority(sym) != 3 {
                break;
            }
            let op = sym.to_string();
            self.pos += 1;
            let rhs = self.primary()?;
            lhs = Expr::Infix {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn primary(&mut self) -> Result<Expr, Message> {
        let token = match self.next() {
            Some(t) => t,
            None => return Err(self.unexpected("expected expression")),
        };
        match token.kind {
            TokenKind::Int => {
                let n: i64 = token.text.parse().map_err(|_| {
                    Message::fatal(
                        FatalKind::IllegalSymbol,
                        format!("integer literal out of range: {}", token.text),
                    )
                })?;
                Ok(Expr::Literal(Payload::Int(n)))
            }
            TokenKind::Float => {
                let f: f64 = token.text.parse().map_err(|_| {
                    Message::fatal(
                        FatalKind::IllegalSymbol,
                        format!("float literal out of range: {}", token.text),
                    )
                })?;
                Ok(Expr::Literal(Payload::Float(f)))
            }
            TokenKind::Bool => Ok(Expr::Literal(Payload::Bool(token.text == "true"))),
            TokenKind::Str => Ok(Expr::Literal(Payload::Str(literal_text(&token.text)))),
            // A token no category accepted evaluates as null, same as the
            // `null` keyword itself.
            TokenKind::Null => Ok(Expr::Literal(Payload::Null)),
            TokenKind::Operation => {
                let name = token.text.clone();
                if self.eat_symbol("(") {
                    let args = self.arguments()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            TokenKind::Symbol if token.text == "(" => {
                let inner = self.assignment()?;
                if !self.eat_symbol(",") {
                    self.expect_symbol(")")?;
                    return Ok(inner);
                }
                let mut items = vec![inner];
                loop {
                    items.push(self.assignment()?);
                    if !self.eat_symbol(",") {
                        break;
                    }
                }
                self.expect_symbol(")")?;
                Ok(Expr::Group(items))
            }
            TokenKind::Symbol | TokenKind::Blank => Err(Message::fatal(
                FatalKind::IllegalSymbol,
                format!("unexpected token '{}'", token.text),
            )),
        }
    }

    /// Comma-separated argument list; the opening `(` is already consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>, Message> {
        let mut args = Vec::new();
        if self.eat_symbol(")") {
            return Ok(args);
        }
        loop {
            args.push(self.assignment()?);
            if self.eat_symbol(",") {
                continue;
            }
            self.expect_symbol(")")?;
            return Ok(args);
        }
    }
}

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Literal(_) => "literal",
        Expr::Ident(_) => "name",
        Expr::Infix { .. } => "operator expression",
        Expr::Call { .. } => "call",
        Expr::Group(_) => "group",
        Expr::Assign { .. } => "assignment",
        Expr::Declare(_) => "declaration",
        Expr::Return(_) => "return",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
