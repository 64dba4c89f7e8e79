//! SQL tokenizer.
//!
//! Splits a statement into keywords, identifiers, literals, operators, and
//! punctuation. Whitespace and comments (`-- …` and `/* … */`) are discarded.
//! Vector literals (`[1.0, 2.0]`) are kept verbatim as a single token and
//! parsed into floats later by the executor.

use crate::error::{Result, VectorDbError};

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    String,
    Number,
    Vector,
    Punct,
    Operator,
}

/// One lexical token with its byte offset in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: usize,
}

/// Recognized keywords, matched case-insensitively.
const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "CREATE", "COLLECTION", "DROP",
    "DELETE", "UPDATE", "SET", "AND", "OR", "NOT", "NULL", "TRUE", "FALSE", "COUNT", "NEAREST",
    "TO", "LIMIT", "USING", "METRIC", "JOIN", "ON", "AS", "ORDER", "BY", "ASC", "DESC", "GROUP",
    "HAVING", "DISTINCT", "UNION", "ALL", "IN", "EXISTS", "INT", "LIKE",
];

fn is_keyword(word: &str) -> bool {
    let upper = word.to_ascii_uppercase();
    KEYWORDS.contains(&upper.as_str())
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
}

impl Tokenizer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                _ if c.is_whitespace() => {
                    self.next();
                }
                '-' if self.peek_at(1) == Some('-') => self.line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.block_comment()?,
                '\'' => tokens.push(self.string_literal(start)?),
                '"' => tokens.push(self.quoted_identifier(start)?),
                '[' => tokens.push(self.vector_literal(start)?),
                _ if is_ident_start(c) => tokens.push(self.identifier(start)),
                _ if c.is_ascii_digit() => tokens.push(self.number(start)?),
                ',' | '(' | ')' | ';' | '{' | '}' => {
                    self.next();
                    tokens.push(Token {
                        kind: TokenKind::Punct,
                        value: c.to_string(),
                        pos: start,
                    });
                }
                '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' | '%' => {
                    tokens.push(self.operator(start))
                }
                other => {
                    return Err(VectorDbError::parse(format!(
                        "unexpected character '{other}' at position {start}"
                    )))
                }
            }
        }

        Ok(tokens)
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.next() {
            if c == '\n' {
                break;
            }
        }
    }

    fn block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.next();
        self.next();
        loop {
            match self.next() {
                Some('*') if self.peek() == Some('/') => {
                    self.next();
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    return Err(VectorDbError::parse(format!(
                        "unclosed comment at position {start}"
                    )))
                }
            }
        }
    }

    /// String literal in single quotes; `\'` escapes a quote. The surrounding
    /// quotes stay in the token value and are stripped by the executor.
    fn string_literal(&mut self, start: usize) -> Result<Token> {
        let mut value = String::new();
        value.push(self.next().expect("opening quote"));
        loop {
            match self.next() {
                None => {
                    return Err(VectorDbError::parse(format!(
                        "unclosed string literal at position {start}"
                    )))
                }
                Some('\\') if self.peek() == Some('\'') => {
                    value.push('\\');
                    value.push(self.next().expect("escaped quote"));
                }
                Some('\'') => {
                    value.push('\'');
                    break;
                }
                Some(c) => value.push(c),
            }
        }
        Ok(Token {
            kind: TokenKind::String,
            value,
            pos: start,
        })
    }

    /// Double-quoted identifier; `\"` escapes a quote. Quotes are stripped.
    fn quoted_identifier(&mut self, start: usize) -> Result<Token> {
        self.next();
        let mut value = String::new();
        loop {
            match self.next() {
                None => {
                    return Err(VectorDbError::parse(format!(
                        "unclosed quoted identifier at position {start}"
                    )))
                }
                Some('\\') if self.peek() == Some('"') => {
                    value.push(self.next().expect("escaped quote"));
                }
                Some('"') => break,
                Some(c) => value.push(c),
            }
        }
        Ok(Token {
            kind: TokenKind::Identifier,
            value,
            pos: start,
        })
    }

    /// Balanced `[ … ]`, retained verbatim. Contents are validated later.
    fn vector_literal(&mut self, start: usize) -> Result<Token> {
        let mut value = String::new();
        let mut depth = 0usize;
        loop {
            match self.next() {
                None => {
                    return Err(VectorDbError::parse(format!(
                        "unclosed vector literal at position {start}"
                    )))
                }
                Some(c) => {
                    value.push(c);
                    if c == '[' {
                        depth += 1;
                    } else if c == ']' {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
            }
        }
        Ok(Token {
            kind: TokenKind::Vector,
            value,
            pos: start,
        })
    }

    /// Bare identifier or keyword. A `.` joining identifier segments is kept,
    /// so `metadata.category` arrives as one compound identifier.
    fn identifier(&mut self, start: usize) -> Token {
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                value.push(c);
                self.next();
            } else if c == '.' && self.peek_at(1).map_or(false, is_ident_start) {
                value.push(c);
                self.next();
            } else {
                break;
            }
        }
        let kind = if !value.contains('.') && is_keyword(&value) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token {
            kind,
            value,
            pos: start,
        }
    }

    fn number(&mut self, start: usize) -> Result<Token> {
        let mut value = String::new();
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            value.push(self.next().expect("digit"));
        }

        if self.peek() == Some('.') {
            value.push(self.next().expect("decimal point"));
            let mut any = false;
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                value.push(self.next().expect("digit"));
                any = true;
            }
            if !any {
                return Err(VectorDbError::parse(format!(
                    "expected digit after decimal point at position {start}"
                )));
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            value.push(self.next().expect("exponent marker"));
            if matches!(self.peek(), Some('+') | Some('-')) {
                value.push(self.next().expect("exponent sign"));
            }
            let mut any = false;
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                value.push(self.next().expect("digit"));
                any = true;
            }
            if !any {
                return Err(VectorDbError::parse(format!(
                    "expected digit in exponent at position {start}"
                )));
            }
        }

        Ok(Token {
            kind: TokenKind::Number,
            value,
            pos: start,
        })
    }

    /// Single-character operators; `=`, `!`, `<`, `>` greedily extend with
    /// `=`, and `<` also pairs with `>` to form `<>`.
    fn operator(&mut self, start: usize) -> Token {
        let first = self.next().expect("operator char");
        let mut value = first.to_string();
        match first {
            '=' | '!' | '>' if self.peek() == Some('=') => {
                value.push(self.next().expect("operator char"));
            }
            '<' if matches!(self.peek(), Some('=') | Some('>')) => {
                value.push(self.next().expect("operator char"));
            }
            _ => {}
        }
        Token {
            kind: TokenKind::Operator,
            value,
            pos: start,
        }
    }
}

/// Tokenizes a SQL statement.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Tokenizer::new(input).tokenize()
}
