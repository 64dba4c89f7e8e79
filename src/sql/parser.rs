//! Recursive-descent parser producing the [`crate::sql::ast`] tree.
//!
//! Statements: SELECT (with NEAREST TO / WHERE / LIMIT), INSERT, DELETE,
//! CREATE COLLECTION, DROP COLLECTION, UPDATE. Expression precedence, loosest
//! first: OR, AND, equality (`=` `!=` `<>` `LIKE`), comparison, additive,
//! multiplicative, unary, primary.

use crate::error::{Result, VectorDbError};
use crate::sql::ast::{Node, NodeKind};
use crate::sql::token::{tokenize, Token, TokenKind};

/// Parses a SQL string into an AST.
pub fn parse(sql: &str) -> Result<Node> {
    let tokens = tokenize(sql)?;
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn describe_next(&self) -> String {
        self.peek()
            .map(|t| t.value.clone())
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().map_or(false, |t| t.kind == kind)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.peek().map_or(false, |t| {
            t.kind == TokenKind::Keyword && t.value.eq_ignore_ascii_case(keyword)
        })
    }

    fn check_punct(&self, punct: &str) -> bool {
        self.peek()
            .map_or(false, |t| t.kind == TokenKind::Punct && t.value == punct)
    }

    fn check_operator(&self, op: &str) -> bool {
        self.peek()
            .map_or(false, |t| t.kind == TokenKind::Operator && t.value == op)
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance().expect("checked token"))
        } else {
            Err(VectorDbError::parse(format!(
                "{expected}, got {}",
                self.describe_next()
            )))
        }
    }

    fn consume_keyword(&mut self, keyword: &str, expected: &str) -> Result<Token> {
        if self.check_keyword(keyword) {
            Ok(self.advance().expect("checked token"))
        } else {
            Err(VectorDbError::parse(format!(
                "{expected}, got {}",
                self.describe_next()
            )))
        }
    }

    fn consume_punct(&mut self, punct: &str, expected: &str) -> Result<Token> {
        if self.check_punct(punct) {
            Ok(self.advance().expect("checked token"))
        } else {
            Err(VectorDbError::parse(format!(
                "{expected}, got {}",
                self.describe_next()
            )))
        }
    }

    fn skip_semicolon(&mut self) {
        if self.check_punct(";") {
            self.advance();
        }
    }

    fn parse(&mut self) -> Result<Node> {
        let Some(first) = self.peek() else {
            return Err(VectorDbError::parse("no tokens to parse"));
        };
        if first.kind != TokenKind::Keyword {
            return Err(VectorDbError::parse(format!(
                "unexpected token: {}",
                first.value
            )));
        }

        match first.value.to_ascii_uppercase().as_str() {
            "SELECT" => self.parse_select(),
            "INSERT" => self.parse_insert(),
            "DELETE" => self.parse_delete(),
            "CREATE" => self.parse_create(),
            "DROP" => self.parse_drop(),
            "UPDATE" => self.parse_update(),
            other => Err(VectorDbError::parse(format!("unexpected keyword: {other}"))),
        }
    }

    fn parse_select(&mut self) -> Result<Node> {
        self.consume_keyword("SELECT", "expected SELECT")?;
        let mut children = Vec::new();

        loop {
            if self.check_keyword("COUNT") {
                self.advance();
                self.consume_punct("(", "expected ( after COUNT")?;
                if !self.check_operator("*") {
                    return Err(VectorDbError::parse(format!(
                        "expected *, got {}",
                        self.describe_next()
                    )));
                }
                self.advance();
                self.consume_punct(")", "expected )")?;
                children.push(Node::new(NodeKind::Column, "COUNT(*)"));
            } else {
                let column = self.parse_expression()?;
                if self.check_keyword("AS") {
                    self.advance();
                    let alias =
                        self.consume(TokenKind::Identifier, "expected identifier for alias")?;
                    children.push(Node::with_children(
                        NodeKind::Alias,
                        alias.value,
                        vec![column],
                    ));
                } else {
                    children.push(column);
                }
            }

            if self.check_punct(",") {
                self.advance();
            } else {
                break;
            }
        }

        if self.check_keyword("FROM") {
            self.advance();
            let table = self.consume(TokenKind::Identifier, "expected table name")?;
            children.push(Node::with_children(
                NodeKind::From,
                "",
                vec![Node::new(NodeKind::Table, table.value)],
            ));
        }

        if self.check_keyword("NEAREST") {
            self.advance();
            self.consume_keyword("TO", "expected TO after NEAREST")?;

            let vector_expr = if self.check_punct("(") {
                // Parenthesized SELECT: the query vector comes from a subquery.
                self.advance();
                let subquery = self.parse_select()?;
                self.consume_punct(")", "expected )")?;
                subquery
            } else {
                self.parse_expression()?
            };

            let mut nearest = Node::with_children(NodeKind::NearestTo, "", vec![vector_expr]);
            if self.check_keyword("USING") {
                self.advance();
                let metric = if self.check(TokenKind::String) {
                    self.advance().expect("checked token")
                } else {
                    self.consume(TokenKind::Identifier, "expected metric name")?
                };
                nearest
                    .children
                    .push(Node::new(NodeKind::Metric, metric.value));
            }
            children.push(nearest);
        }

        if self.check_keyword("WHERE") {
            self.advance();
            let condition = self.parse_expression()?;
            children.push(Node::with_children(NodeKind::Where, "", vec![condition]));
        }

        if self.check_keyword("LIMIT") {
            self.advance();
            let limit = self.consume(TokenKind::Number, "expected number for LIMIT")?;
            children.push(Node::new(NodeKind::Limit, limit.value));
        }

        self.skip_semicolon();
        Ok(Node::with_children(NodeKind::Select, "", children))
    }

    fn parse_insert(&mut self) -> Result<Node> {
        self.consume_keyword("INSERT", "expected INSERT")?;
        self.consume_keyword("INTO", "expected INTO")?;
        let table = self.consume(TokenKind::Identifier, "expected table name")?;

        let mut children = vec![Node::new(NodeKind::Table, table.value)];

        if self.check_punct("(") {
            self.advance();
            let mut columns = Vec::new();
            loop {
                let column = self.consume(TokenKind::Identifier, "expected column name")?;
                columns.push(Node::new(NodeKind::Column, column.value));
                if self.check_punct(",") {
                    self.advance();
                } else {
                    break;
                }
            }
            self.consume_punct(")", "expected )")?;
            children.push(Node::with_children(NodeKind::Identifier, "columns", columns));
        }

        self.consume_keyword("VALUES", "expected VALUES")?;
        self.consume_punct("(", "expected (")?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_expression()?);
            if self.check_punct(",") {
                self.advance();
            } else {
                break;
            }
        }
        self.consume_punct(")", "expected )")?;
        children.push(Node::with_children(NodeKind::Identifier, "values", values));

        self.skip_semicolon();
        Ok(Node::with_children(NodeKind::Insert, "", children))
    }

    fn parse_delete(&mut self) -> Result<Node> {
        self.consume_keyword("DELETE", "expected DELETE")?;
        self.consume_keyword("FROM", "expected FROM")?;
        let table = self.consume(TokenKind::Identifier, "expected table name")?;

        let mut children = vec![Node::new(NodeKind::Table, table.value)];
        if self.check_keyword("WHERE") {
            self.advance();
            let condition = self.parse_expression()?;
            children.push(Node::with_children(NodeKind::Where, "", vec![condition]));
        }

        self.skip_semicolon();
        Ok(Node::with_children(NodeKind::Delete, "", children))
    }

    fn parse_create(&mut self) -> Result<Node> {
        self.consume_keyword("CREATE", "expected CREATE")?;
        self.consume_keyword("COLLECTION", "expected COLLECTION")?;
        let name = self.consume(TokenKind::Identifier, "expected collection name")?;

        let mut children = vec![Node::new(NodeKind::Table, name.value)];

        if self.check_punct("(") {
            self.advance();
            let dimension = self.consume(TokenKind::Identifier, "expected dimension")?;
            if !dimension.value.eq_ignore_ascii_case("DIMENSION") {
                return Err(VectorDbError::parse(format!(
                    "expected DIMENSION, got {}",
                    dimension.value
                )));
            }
            let int_type = self.consume_keyword("INT", "expected INT")?;
            children.push(Node::with_children(
                NodeKind::Identifier,
                "dimension",
                vec![Node::new(NodeKind::Literal, int_type.value)],
            ));
            self.consume_punct(")", "expected )")?;
        }

        self.skip_semicolon();
        Ok(Node::with_children(NodeKind::Create, "", children))
    }

    fn parse_drop(&mut self) -> Result<Node> {
        self.consume_keyword("DROP", "expected DROP")?;
        self.consume_keyword("COLLECTION", "expected COLLECTION")?;
        let name = self.consume(TokenKind::Identifier, "expected collection name")?;
        self.skip_semicolon();
        Ok(Node::with_children(
            NodeKind::Drop,
            "",
            vec![Node::new(NodeKind::Table, name.value)],
        ))
    }

    fn parse_update(&mut self) -> Result<Node> {
        self.consume_keyword("UPDATE", "expected UPDATE")?;
        let table = self.consume(TokenKind::Identifier, "expected table name")?;
        self.consume_keyword("SET", "expected SET")?;

        let mut assignments = Vec::new();
        loop {
            let column = self.parse_identifier()?;
            if !self.check_operator("=") {
                return Err(VectorDbError::parse(format!(
                    "expected =, got {}",
                    self.describe_next()
                )));
            }
            self.advance();
            let value = self.parse_expression()?;
            assignments.push(Node::with_children(
                NodeKind::BinaryOp,
                "=",
                vec![column, value],
            ));

            if self.check_punct(",") {
                self.advance();
            } else {
                break;
            }
        }

        let mut children = vec![
            Node::new(NodeKind::Table, table.value),
            Node::with_children(NodeKind::Identifier, "assignments", assignments),
        ];

        if self.check_keyword("WHERE") {
            self.advance();
            let condition = self.parse_expression()?;
            children.push(Node::with_children(NodeKind::Where, "", vec![condition]));
        }

        self.skip_semicolon();
        Ok(Node::with_children(NodeKind::Update, "", children))
    }

    fn parse_expression(&mut self) -> Result<Node> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Node> {
        let mut left = self.parse_and()?;
        while self.check_keyword("OR") {
            self.advance();
            let right = self.parse_and()?;
            left = Node::with_children(NodeKind::BinaryOp, "OR", vec![left, right]);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node> {
        let mut left = self.parse_equality()?;
        while self.check_keyword("AND") {
            self.advance();
            let right = self.parse_equality()?;
            left = Node::with_children(NodeKind::BinaryOp, "AND", vec![left, right]);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Node> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = if self.check_operator("=") || self.check_operator("!=")
                || self.check_operator("<>")
            {
                self.advance().expect("checked token").value
            } else if self.check_keyword("LIKE") {
                self.advance();
                "LIKE".to_string()
            } else {
                break;
            };
            let right = self.parse_comparison()?;
            left = Node::with_children(NodeKind::BinaryOp, op, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Node> {
        let mut left = self.parse_term()?;
        while self.check_operator("<")
            || self.check_operator("<=")
            || self.check_operator(">")
            || self.check_operator(">=")
        {
            let op = self.advance().expect("checked token").value;
            let right = self.parse_term()?;
            left = Node::with_children(NodeKind::BinaryOp, op, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Node> {
        let mut left = self.parse_factor()?;
        while self.check_operator("+") || self.check_operator("-") {
            let op = self.advance().expect("checked token").value;
            let right = self.parse_factor()?;
            left = Node::with_children(NodeKind::BinaryOp, op, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Node> {
        let mut left = self.parse_unary()?;
        while self.check_operator("*") || self.check_operator("/") || self.check_operator("%") {
            let op = self.advance().expect("checked token").value;
            let right = self.parse_unary()?;
            left = Node::with_children(NodeKind::BinaryOp, op, vec![left, right]);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node> {
        if self.check_operator("-") || self.check_operator("+") || self.check_operator("!") {
            let op = self.advance().expect("checked token").value;
            let operand = self.parse_unary()?;
            return Ok(Node::with_children(NodeKind::BinaryOp, op, vec![operand]));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node> {
        if self.check_punct("(") {
            self.advance();
            let expr = self.parse_expression()?;
            self.consume_punct(")", "expected )")?;
            return Ok(expr);
        }

        if self.check(TokenKind::Number) {
            let token = self.advance().expect("checked token");
            if token.value.parse::<i64>().is_err() && token.value.parse::<f64>().is_err() {
                return Err(VectorDbError::parse(format!(
                    "invalid number: {}",
                    token.value
                )));
            }
            return Ok(Node::new(NodeKind::Literal, token.value));
        }

        if self.check(TokenKind::String) {
            let token = self.advance().expect("checked token");
            return Ok(Node::new(NodeKind::Literal, token.value));
        }

        if self.check(TokenKind::Vector) {
            let token = self.advance().expect("checked token");
            return Ok(Node::new(NodeKind::Vector, token.value));
        }

        self.parse_identifier()
    }

    fn parse_identifier(&mut self) -> Result<Node> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance().expect("checked token");
            return Ok(Node::new(NodeKind::Identifier, token.value));
        }
        // `*` projection
        if self.check_operator("*") {
            let token = self.advance().expect("checked token");
            return Ok(Node::new(NodeKind::Identifier, token.value));
        }
        Err(VectorDbError::parse(format!(
            "expected identifier, got {}",
            self.describe_next()
        )))
    }
}
