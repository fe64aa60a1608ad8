//! Recursive descent parser for the Pact DSL
//!
//! Consumes the token stream produced by the lexer and builds a [`Program`].
//! Single token of lookahead, no backtracking; parsing stops at the first
//! error.

use super::ast::{Header, NamedArg, Predicate, Program, Statement, ValueExpr};
use super::lexer::{Keyword, Token, TokenType};
use crate::error::{PactError, Result};

/// Parser for the Pact DSL
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Create a parser over a token stream
    ///
    /// Newline tokens carry no grammatical weight and are dropped up front;
    /// statements are delimited by semicolons alone.
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.token_type != TokenType::Newline)
            .collect();
        Self { tokens, current: 0 }
    }

    /// Parse a complete program
    pub fn parse(&mut self) -> Result<Program> {
        let headers = self.parse_headers()?;

        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            headers,
            statements,
        })
    }

    /// Parse leading `# key "value"` headers
    fn parse_headers(&mut self) -> Result<Vec<Header>> {
        let mut headers = Vec::new();

        while self.match_token(&TokenType::Hash) {
            let key = self.expect_identifier("Expected header key after '#'")?;
            let value = self.expect_string("Expected string value in header")?;
            headers.push(Header { key, value });
        }

        Ok(headers)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let token = self.peek().clone();

        match &token.token_type {
            TokenType::Keyword(Keyword::Intent) => self.parse_intent(),
            TokenType::Keyword(Keyword::Fact) => self.parse_fact(),
            TokenType::Keyword(Keyword::Query) => self.parse_query(),
            TokenType::Keyword(Keyword::Offer) => self.parse_offer(),
            TokenType::Keyword(Keyword::Accept) => self.parse_accept(),
            TokenType::Keyword(Keyword::Reject) => self.parse_reject(),
            TokenType::Keyword(Keyword::Commit) => self.parse_commit(),
            TokenType::Keyword(Keyword::Act) => self.parse_act(),
            _ => Err(self.error_at(&token, format!("Unexpected token {:?}", token.token_type))),
        }
    }

    /// `INTENT predicate ;`
    fn parse_intent(&mut self) -> Result<Statement> {
        self.advance(); // INTENT
        let predicate = self.parse_predicate()?;
        self.expect_token(&TokenType::Semicolon, "Expected ';' after INTENT")?;
        Ok(Statement::Intent { predicate })
    }

    /// `FACT predicate ;`
    fn parse_fact(&mut self) -> Result<Statement> {
        self.advance(); // FACT
        let predicate = self.parse_predicate()?;
        self.expect_token(&TokenType::Semicolon, "Expected ';' after FACT")?;
        Ok(Statement::Fact { predicate })
    }

    /// `QUERY predicate FROM STRING ;`
    fn parse_query(&mut self) -> Result<Statement> {
        self.advance(); // QUERY
        let predicate = self.parse_predicate()?;
        self.expect_keyword(Keyword::From, "Expected 'FROM' in QUERY")?;
        let from_agent = self.expect_string("Expected agent name after FROM")?;
        self.expect_token(&TokenType::Semicolon, "Expected ';' after QUERY")?;
        Ok(Statement::Query {
            predicate,
            from_agent,
        })
    }

    /// `OFFER id = STRING TO STRING { field : value , ... } ;`
    fn parse_offer(&mut self) -> Result<Statement> {
        self.advance(); // OFFER
        self.expect_keyword(Keyword::Id, "Expected 'id' in OFFER")?;
        self.expect_token(&TokenType::Equals, "Expected '=' after 'id'")?;
        let offer_id = self.expect_string("Expected offer id string")?;
        self.expect_keyword(Keyword::To, "Expected 'TO' in OFFER")?;
        let to_agent = self.expect_string("Expected agent name after TO")?;
        self.expect_token(&TokenType::LeftBrace, "Expected '{' to open OFFER body")?;

        let mut fields = Vec::new();
        while !self.check_token(&TokenType::RightBrace) {
            let name = self.expect_identifier("Expected field name in OFFER body")?;
            self.expect_token(&TokenType::Colon, "Expected ':' after field name")?;
            let value = self.parse_value()?;
            fields.push((name, value));

            // Comma between fields is optional, as is one before '}'
            self.match_token(&TokenType::Comma);
        }

        self.expect_token(&TokenType::RightBrace, "Expected '}' to close OFFER body")?;
        self.expect_token(&TokenType::Semicolon, "Expected ';' after OFFER")?;

        Ok(Statement::Offer {
            offer_id,
            to_agent,
            fields,
        })
    }

    /// `ACCEPT STRING ;`
    fn parse_accept(&mut self) -> Result<Statement> {
        self.advance(); // ACCEPT
        let offer_id = self.expect_string("Expected offer id string")?;
        self.expect_token(&TokenType::Semicolon, "Expected ';' after ACCEPT")?;
        Ok(Statement::Accept { offer_id })
    }

    /// `REJECT STRING [REASON STRING] ;`
    fn parse_reject(&mut self) -> Result<Statement> {
        self.advance(); // REJECT
        let offer_id = self.expect_string("Expected offer id string")?;

        let reason = if self.match_keyword(Keyword::Reason) {
            Some(self.expect_string("Expected reason string after REASON")?)
        } else {
            None
        };

        self.expect_token(&TokenType::Semicolon, "Expected ';' after REJECT")?;
        Ok(Statement::Reject { offer_id, reason })
    }

    /// `COMMIT predicate [BY STRING] ;`
    fn parse_commit(&mut self) -> Result<Statement> {
        self.advance(); // COMMIT
        let predicate = self.parse_predicate()?;

        let deadline = if self.match_keyword(Keyword::By) {
            Some(self.expect_string("Expected deadline string after BY")?)
        } else {
            None
        };

        self.expect_token(&TokenType::Semicolon, "Expected ';' after COMMIT")?;
        Ok(Statement::Commit {
            predicate,
            deadline,
        })
    }

    /// `ACT predicate ;`
    fn parse_act(&mut self) -> Result<Statement> {
        self.advance(); // ACT
        let predicate = self.parse_predicate()?;
        self.expect_token(&TokenType::Semicolon, "Expected ';' after ACT")?;
        Ok(Statement::Act { predicate })
    }

    /// `identifier ( name = value , ... )`
    fn parse_predicate(&mut self) -> Result<Predicate> {
        let name = self.expect_identifier("Expected predicate name")?;
        self.expect_token(&TokenType::LeftParen, "Expected '(' after predicate name")?;

        let mut args = Vec::new();
        while !self.check_token(&TokenType::RightParen) {
            let arg_name = self.expect_identifier("Expected argument name")?;
            self.expect_token(&TokenType::Equals, "Expected '=' after argument name")?;
            let value = self.parse_value()?;
            args.push(NamedArg {
                name: arg_name,
                value,
            });

            // Comma between args is optional, as is one before ')'
            self.match_token(&TokenType::Comma);
        }

        self.expect_token(&TokenType::RightParen, "Expected ')' after arguments")?;
        Ok(Predicate { name, args })
    }

    /// Parse a literal value
    fn parse_value(&mut self) -> Result<ValueExpr> {
        let token = self.peek().clone();

        match &token.token_type {
            TokenType::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(ValueExpr::Str(s))
            }
            TokenType::Number(n) => {
                let n = *n;
                self.advance();
                Ok(ValueExpr::Number(n))
            }
            TokenType::Keyword(Keyword::True) => {
                self.advance();
                Ok(ValueExpr::Bool(true))
            }
            TokenType::Keyword(Keyword::False) => {
                self.advance();
                Ok(ValueExpr::Bool(false))
            }
            TokenType::Keyword(Keyword::Null) => {
                self.advance();
                Ok(ValueExpr::Null)
            }
            TokenType::LeftBrace => self.parse_map(),
            TokenType::LeftBracket => self.parse_list(),
            _ => Err(self.error_at(
                &token,
                format!("Expected value, found {:?}", token.token_type),
            )),
        }
    }

    /// `{ key : value , ... }` with string or identifier keys
    fn parse_map(&mut self) -> Result<ValueExpr> {
        self.advance(); // {
        let mut entries = Vec::new();

        while !self.check_token(&TokenType::RightBrace) {
            let key = self.expect_map_key()?;
            self.expect_token(&TokenType::Colon, "Expected ':' after map key")?;
            let value = self.parse_value()?;
            entries.push((key, value));

            self.match_token(&TokenType::Comma);
        }

        self.expect_token(&TokenType::RightBrace, "Expected '}' to close map")?;
        Ok(ValueExpr::Map(entries))
    }

    /// `[ value , ... ]`
    fn parse_list(&mut self) -> Result<ValueExpr> {
        self.advance(); // [
        let mut elements = Vec::new();

        while !self.check_token(&TokenType::RightBracket) {
            elements.push(self.parse_value()?);

            self.match_token(&TokenType::Comma);
        }

        self.expect_token(&TokenType::RightBracket, "Expected ']' to close list")?;
        Ok(ValueExpr::List(elements))
    }

    fn expect_map_key(&mut self) -> Result<String> {
        let token = self.peek().clone();
        match &token.token_type {
            TokenType::Identifier(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            TokenType::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error_at(&token, "Expected map key")),
        }
    }

    // Token stream helpers

    fn peek(&self) -> &Token {
        // new() guarantees a trailing Eof token
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn check_token(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check_token(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek().token_type == TokenType::Keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_token(&mut self, token_type: &TokenType, message: &str) -> Result<()> {
        if self.check_token(token_type) {
            self.advance();
            Ok(())
        } else {
            let token = self.peek().clone();
            Err(self.error_at(&token, message))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, message: &str) -> Result<()> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            let token = self.peek().clone();
            Err(self.error_at(&token, message))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String> {
        let token = self.peek().clone();
        if let TokenType::Identifier(name) = &token.token_type {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_at(&token, message))
        }
    }

    fn expect_string(&mut self, message: &str) -> Result<String> {
        let token = self.peek().clone();
        if let TokenType::Str(value) = &token.token_type {
            let value = value.clone();
            self.advance();
            Ok(value)
        } else {
            Err(self.error_at(&token, message))
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> PactError {
        PactError::parsing(message, token.line, token.column)
    }
}
