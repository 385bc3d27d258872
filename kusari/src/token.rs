//! Statement tokenizer and token classifier.
//!
//! One source line holds one statement. [`tokenize`] splits it into
//! [`Token`]s: identifiers and literals accumulate, bracket/comma/operator
//! characters stand alone, `==`/`!=`/`<=`/`>=` are rebuilt by one-character
//! lookahead, and double quotes open a literal mode in which blanks and
//! delimiters lose their meaning (`\"` escapes a quote). [`classify`]
//! assigns each token its category by testing a fixed pattern order.

use regex::Regex;

use crate::message::{FatalKind, Message};

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Operation or identifier name (possibly a dotted method path).
    Operation,
    Int,
    Float,
    Bool,
    /// Quoted string literal, quotes included.
    Str,
    Blank,
    /// Operator / bracket / comma.
    Symbol,
    /// `null`, or anything no other category accepts.
    Null,
}

/// One classified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Token {
        Token {
            text: text.into(),
            kind,
        }
    }
}

/// Compiled classification patterns. Built once per interpreter; no global
/// state.
pub struct Patterns {
    ident: Regex,
    integer: Regex,
    float: Regex,
    symbol: Regex,
}

impl Patterns {
    pub fn new() -> Patterns {
        Patterns {
            ident: compile(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$"),
            integer: compile(r"^-?[0-9]+$"),
            float: compile(r"^-?[0-9]+\.[0-9]+$"),
            symbol: compile(r"^(==|!=|<=|>=|[+\-*/\\=<>(),\[\]])$"),
        }
    }
}

impl Default for Patterns {
    fn default() -> Self {
        Patterns::new()
    }
}

fn compile(src: &str) -> Regex {
    // Fixed built-in patterns; failing to compile one is a bug, not a
    // runtime condition.
    match Regex::new(src) {
        Ok(re) => re,
        Err(err) => panic!("built-in pattern {src:?}: {err}"),
    }
}

/// Classify one token. The tests run in a fixed priority order because the
/// patterns overlap: `null`, `true` and `false` all match the identifier
/// pattern, so the literal checks carve them out of that arm.
pub fn classify(text: &str, patterns: &Patterns) -> TokenKind {
    if text == "null" {
        return TokenKind::Null;
    }
    if patterns.ident.is_match(text) {
        if text == "true" || text == "false" {
            return TokenKind::Bool;
        }
        return TokenKind::Operation;
    }
    if patterns.integer.is_match(text) {
        return TokenKind::Int;
    }
    if patterns.float.is_match(text) {
        return TokenKind::Float;
    }
    if patterns.symbol.is_match(text) {
        return TokenKind::Symbol;
    }
    if !text.is_empty() && text.chars().all(|c| c == ' ' || c == '\t') {
        return TokenKind::Blank;
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return TokenKind::Str;
    }
    TokenKind::Null
}

/// Split one statement line into classified tokens.
///
/// Fails with an illegal-symbol fatal on an unterminated string literal or
/// a `!` that does not combine into `!=` (there is no unary `!`).
pub fn tokenize(line: &str, patterns: &Patterns) -> Result<Vec<Token>, Message> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut current = String::new();
    let mut in_string = false;

    let mut i = 0;
    while i < chars.len() && is_blank(chars[i]) {
        i += 1;
    }

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            current.push(c);
            if c == '"' && chars[i - 1] != '\\' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                current.push(c);
                in_string = true;
                i += 1;
            }
            ' ' | '\t' => {
                flush(&mut current, &mut tokens, patterns);
                i += 1;
            }
            '(' | ')' | '[' | ']' | ',' | '+' | '-' | '*' | '/' => {
                flush(&mut current, &mut tokens, patterns);
                tokens.push(Token::new(c.to_string(), TokenKind::Symbol));
                i += 1;
            }
            '=' | '<' | '>' | '!' => {
                flush(&mut current, &mut tokens, patterns);
                if i + 1 < chars.len() && chars[i + 1] == '=' {
                    let mut op = c.to_string();
                    op.push('=');
                    tokens.push(Token::new(op, TokenKind::Symbol));
                    i += 2;
                } else if c == '!' {
                    return Err(Message::fatal(
                        FatalKind::IllegalSymbol,
                        "malformed operator '!'",
                    ));
                } else {
                    tokens.push(Token::new(c.to_string(), TokenKind::Symbol));
                    i += 1;
                }
            }
            _ => {
                current.push(c);
                i += 1;
            }
        }
    }

    if in_string {
        return Err(Message::fatal(
            FatalKind::IllegalSymbol,
            "unterminated string literal",
        ));
    }
    flush(&mut current, &mut tokens, patterns);
    Ok(tokens)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn flush(current: &mut String, tokens: &mut Vec<Token>, patterns: &Patterns) {
    if !current.is_empty() {
        let text = std::mem::take(current);
        let kind = classify(&text, patterns);
        tokens.push(Token::new(text, kind));
    }
}

/// Text of a string-literal token: quotes stripped, `\"` and `\\` unescaped
/// (any other backslash pair is kept as written).
pub fn literal_text(token: &str) -> String {
    let inner = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        let patterns = Patterns::new();
        tokenize(line, &patterns)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn splits_infix_expression() {
        assert_eq!(texts("a+b*c"), vec!["a", "+", "b", "*", "c"]);
    }

    #[test]
    fn blanks_separate_and_leading_blanks_vanish() {
        assert_eq!(texts("   a  +\tb"), vec!["a", "+", "b"]);
        assert_eq!(texts(""), Vec::<String>::new());
        assert_eq!(texts("    "), Vec::<String>::new());
    }

    #[test]
    fn keywords_survive_as_tokens() {
        assert_eq!(texts("var x = 1"), vec!["var", "x", "=", "1"]);
        assert_eq!(texts("return x + 1"), vec!["return", "x", "+", "1"]);
        assert_eq!(texts("def f(a, b)"), vec!["def", "f", "(", "a", ",", "b", ")"]);
    }

    #[test]
    fn two_char_operators_rebuilt() {
        assert_eq!(texts("a==b"), vec!["a", "==", "b"]);
        assert_eq!(texts("a <= b"), vec!["a", "<=", "b"]);
        assert_eq!(texts("a>=b"), vec!["a", ">=", "b"]);
        assert_eq!(texts("a != b"), vec!["a", "!=", "b"]);
        assert_eq!(texts("a<b"), vec!["a", "<", "b"]);
        assert_eq!(texts("a > b"), vec!["a", ">", "b"]);
    }

    #[test]
    fn trailing_single_operators_are_emitted() {
        assert_eq!(texts("x ="), vec!["x", "="]);
        assert_eq!(texts("x <"), vec!["x", "<"]);
    }

    #[test]
    fn lone_bang_is_malformed() {
        let patterns = Patterns::new();
        let err = tokenize("a ! b", &patterns).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::IllegalSymbol));
        let err = tokenize("a !", &patterns).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::IllegalSymbol));
    }

    #[test]
    fn string_literals_swallow_delimiters() {
        assert_eq!(
            texts(r#"print("a, (b) +c")"#),
            vec!["print", "(", "\"a, (b) +c\"", ")"]
        );
    }

    #[test]
    fn escaped_quote_stays_inside() {
        assert_eq!(texts(r#""a\"b""#), vec![r#""a\"b""#]);
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let patterns = Patterns::new();
        let err = tokenize(r#"print("oops"#, &patterns).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::IllegalSymbol));
    }

    #[test]
    fn classify_priority_order() {
        let p = Patterns::new();
        assert_eq!(classify("null", &p), TokenKind::Null);
        assert_eq!(classify("true", &p), TokenKind::Bool);
        assert_eq!(classify("false", &p), TokenKind::Bool);
        assert_eq!(classify("print", &p), TokenKind::Operation);
        assert_eq!(classify("x.size", &p), TokenKind::Operation);
        assert_eq!(classify("_a1", &p), TokenKind::Operation);
        assert_eq!(classify("42", &p), TokenKind::Int);
        assert_eq!(classify("-2", &p), TokenKind::Int);
        assert_eq!(classify("3.14", &p), TokenKind::Float);
        assert_eq!(classify("-0.5", &p), TokenKind::Float);
        assert_eq!(classify("==", &p), TokenKind::Symbol);
        assert_eq!(classify("(", &p), TokenKind::Symbol);
        assert_eq!(classify("  ", &p), TokenKind::Blank);
        assert_eq!(classify("\"hi\"", &p), TokenKind::Str);
        assert_eq!(classify("1abc", &p), TokenKind::Null);
        assert_eq!(classify("", &p), TokenKind::Null);
    }

    #[test]
    fn token_kinds_from_tokenize() {
        let patterns = Patterns::new();
        let toks = tokenize(r#"x = f(1, "s")"#, &patterns).unwrap();
        let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Operation,
                TokenKind::Symbol,
                TokenKind::Operation,
                TokenKind::Symbol,
                TokenKind::Int,
                TokenKind::Symbol,
                TokenKind::Str,
                TokenKind::Symbol,
            ]
        );
    }

    #[test]
    fn literal_text_unescapes() {
        assert_eq!(literal_text(r#""hello""#), "hello");
        assert_eq!(literal_text(r#""a\"b""#), "a\"b");
        assert_eq!(literal_text(r#""a\\b""#), "a\\b");
        assert_eq!(literal_text(r#""a\nb""#), "a\\nb");
        assert_eq!(literal_text(r#""""#), "");
    }
}
