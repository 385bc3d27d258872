//! Statements, structural roles, and callable blocks.
//!
//! A [`Statement`] is one tokenized source line plus its parsed tree. The
//! [`Role`] is read off the first token and drives region sequencing:
//! openers start a region, continuations chain arms onto one, closers end
//! one, and definitions capture their body instead of running it.
//!
//! A [`Block`] is a parameter list plus captured body statements; user
//! definitions and batch sources both run as blocks.

use std::rc::Rc;

use crate::expr::{parse_statement, Expr};
use crate::message::{FatalKind, Message};
use crate::token::{tokenize, Patterns, Token, TokenKind};

/// Structural role of a statement, read off its first token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Ordinary statement.
    Plain,
    /// `if`, `while`, `for`: starts a region.
    Opener,
    /// `elif`, `else`: next arm of an open region.
    Continuation,
    /// `end`: closes the innermost region or definition.
    Closer,
    /// `def`: opens a definition whose body is captured, not run.
    Definition,
}

fn role_of(tokens: &[Token]) -> Role {
    let head = match tokens.first() {
        Some(t) if t.kind == TokenKind::Operation => t.text.as_str(),
        _ => return Role::Plain,
    };
    match head {
        "if" | "while" | "for" => Role::Opener,
        "elif" | "else" => Role::Continuation,
        "end" => Role::Closer,
        "def" => Role::Definition,
        _ => Role::Plain,
    }
}

/// One source statement, tokenized and parsed.
///
/// Parsing is eager: a malformed statement fails here, before anything
/// runs. Definition statements carry no tree; their tokens are read
/// structurally when the body is captured.
#[derive(Debug, Clone)]
pub struct Statement {
    text: String,
    tokens: Vec<Token>,
    role: Role,
    program: Option<Expr>,
}

impl Statement {
    pub fn new(text: &str, patterns: &Patterns) -> Result<Statement, Message> {
        let tokens = tokenize(text, patterns)?;
        let role = role_of(&tokens);
        let program = match role {
            Role::Definition => None,
            _ => Some(parse_statement(&tokens)?),
        };
        Ok(Statement {
            text: text.to_string(),
            tokens,
            role,
            program,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn program(&self) -> Option<&Expr> {
        self.program.as_ref()
    }

    /// First token's text, if any.
    pub fn head_name(&self) -> Option<&str> {
        self.tokens.first().map(|t| t.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Callable body: parameters plus captured statements.
#[derive(Debug)]
pub struct Block {
    params: Vec<String>,
    body: Vec<Statement>,
}

impl Block {
    pub fn new(params: Vec<String>, body: Vec<Statement>) -> Rc<Block> {
        Rc::new(Block { params, body })
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn body(&self) -> &[Statement] {
        &self.body
    }
}

/// Read a definition's name and parameter names from its tokens:
/// `def name(a, b)`. The parentheses are required even for zero
/// parameters.
pub fn parse_signature(tokens: &[Token]) -> Result<(String, Vec<String>), Message> {
    let malformed = |detail: &str| {
        Message::fatal(FatalKind::IllegalSymbol, format!("malformed definition: {detail}"))
    };

    let mut it = tokens.iter();
    match it.next() {
        Some(t) if t.text == "def" => {}
        _ => return Err(malformed("expected 'def'")),
    }
    let name = match it.next() {
        Some(t) if t.kind == TokenKind::Operation && !t.text.contains('.') => t.text.clone(),
        _ => return Err(malformed("expected a name")),
    };
    match it.next() {
        Some(t) if t.text == "(" => {}
        _ => return Err(malformed("expected '('")),
    }

    let mut params = Vec::new();
    loop {
        match it.next() {
            Some(t) if t.text == ")" && params.is_empty() => break,
            Some(t) if t.kind == TokenKind::Operation && !t.text.contains('.') => {
                params.push(t.text.clone());
                match it.next() {
                    Some(t) if t.text == "," => {}
                    Some(t) if t.text == ")" => break,
                    _ => return Err(malformed("expected ',' or ')'")),
                }
            }
            _ => return Err(malformed("expected a parameter name")),
        }
    }
    if it.next().is_some() {
        return Err(malformed("trailing tokens after ')'"));
    }
    Ok((name, params))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(line: &str) -> Statement {
        let patterns = Patterns::new();
        Statement::new(line, &patterns).unwrap()
    }

    #[test]
    fn roles_follow_first_token() {
        assert_eq!(stmt("x = 1").role(), Role::Plain);
        assert_eq!(stmt("if(x)").role(), Role::Opener);
        assert_eq!(stmt("while(x < 3)").role(), Role::Opener);
        assert_eq!(stmt("for(i, 1, 5)").role(), Role::Opener);
        assert_eq!(stmt("elif(y)").role(), Role::Continuation);
        assert_eq!(stmt("else").role(), Role::Continuation);
        assert_eq!(stmt("end").role(), Role::Closer);
        assert_eq!(stmt("def f(a)").role(), Role::Definition);
        assert_eq!(stmt("").role(), Role::Plain);
    }

    #[test]
    fn plain_statements_parse_eagerly() {
        assert!(stmt("x = 1 + 2").program().is_some());
        let patterns = Patterns::new();
        let err = Statement::new("x = ", &patterns).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::IllegalSymbol));
    }

    #[test]
    fn definitions_skip_expression_parsing() {
        assert!(stmt("def f(a, b)").program().is_none());
    }

    #[test]
    fn signature_with_params() {
        let s = stmt("def add(a, b)");
        let (name, params) = parse_signature(s.tokens()).unwrap();
        assert_eq!(name, "add");
        assert_eq!(params, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn signature_without_params() {
        let s = stmt("def ping()");
        let (name, params) = parse_signature(s.tokens()).unwrap();
        assert_eq!(name, "ping");
        assert!(params.is_empty());
    }

    #[test]
    fn malformed_signatures() {
        let patterns = Patterns::new();
        for line in ["def f", "def f(", "def f(a,)", "def f(1)", "def f(a) x"] {
            let s = Statement::new(line, &patterns).unwrap();
            assert!(
                parse_signature(s.tokens()).is_err(),
                "accepted: {line}"
            );
        }
    }

    #[test]
    fn head_name_reads_first_token() {
        assert_eq!(stmt("while(x)").head_name(), Some("while"));
        assert_eq!(stmt("").head_name(), None);
    }
}
