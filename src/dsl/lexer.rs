//! Lexer for the Pact DSL
//!
//! Converts raw UTF-8 source text into a stream of tokens for parsing.

use crate::error::{PactError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token types recognized by the lexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenType {
    // Literals
    Str(String),
    Number(f64),

    // Identifiers and keywords
    Identifier(String),
    Keyword(Keyword),

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Semicolon,
    Equals,
    Hash,

    // Special
    Newline,
    Eof,
}

/// Keywords in the DSL
///
/// The eight statement keywords are upper-case; the secondary keywords
/// `FROM`, `TO`, `BY`, `REASON` likewise. `id`, `true`, `false` and `null`
/// are lower-case. Lookup is case-sensitive, so `intent` stays an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Intent,
    Fact,
    Query,
    Offer,
    Accept,
    Reject,
    Commit,
    Act,
    From,
    To,
    By,
    Reason,
    Id,
    True,
    False,
    Null,
}

/// Token with location information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

/// Lexer for the Pact DSL
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    keywords: HashMap<String, Keyword>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let mut keywords = HashMap::new();

        keywords.insert("INTENT".to_string(), Keyword::Intent);
        keywords.insert("FACT".to_string(), Keyword::Fact);
        keywords.insert("QUERY".to_string(), Keyword::Query);
        keywords.insert("OFFER".to_string(), Keyword::Offer);
        keywords.insert("ACCEPT".to_string(), Keyword::Accept);
        keywords.insert("REJECT".to_string(), Keyword::Reject);
        keywords.insert("COMMIT".to_string(), Keyword::Commit);
        keywords.insert("ACT".to_string(), Keyword::Act);
        keywords.insert("FROM".to_string(), Keyword::From);
        keywords.insert("TO".to_string(), Keyword::To);
        keywords.insert("BY".to_string(), Keyword::By);
        keywords.insert("REASON".to_string(), Keyword::Reason);
        keywords.insert("id".to_string(), Keyword::Id);
        keywords.insert("true".to_string(), Keyword::True);
        keywords.insert("false".to_string(), Keyword::False);
        keywords.insert("null".to_string(), Keyword::Null);

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords,
        }
    }

    /// Tokenize the entire input
    ///
    /// The returned sequence always ends with exactly one `Eof` token carrying
    /// the final source position.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            self.skip_whitespace();

            // Line comments run to end of line
            if self.current_char() == Some('/') && self.peek_char() == Some('/') {
                while let Some(ch) = self.current_char() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }

        let start_line = self.line;
        let start_column = self.column;

        let Some(ch) = self.current_char() else {
            return Ok(Token {
                token_type: TokenType::Eof,
                line: start_line,
                column: start_column,
            });
        };

        let token_type = match ch {
            '\n' => {
                self.advance();
                TokenType::Newline
            }

            // String literals
            '"' => TokenType::Str(self.read_string(start_line, start_column)?),

            // Numbers, including a leading minus sign. A bare '-' not followed
            // by a digit falls through to the unexpected-character error.
            c if c.is_ascii_digit() => self.read_number(start_line, start_column)?,
            '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start_line, start_column)?
            }

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => {
                let identifier = self.read_identifier();
                if let Some(keyword) = self.keywords.get(&identifier) {
                    TokenType::Keyword(*keyword)
                } else {
                    TokenType::Identifier(identifier)
                }
            }

            // Punctuation
            '(' => {
                self.advance();
                TokenType::LeftParen
            }
            ')' => {
                self.advance();
                TokenType::RightParen
            }
            '{' => {
                self.advance();
                TokenType::LeftBrace
            }
            '}' => {
                self.advance();
                TokenType::RightBrace
            }
            '[' => {
                self.advance();
                TokenType::LeftBracket
            }
            ']' => {
                self.advance();
                TokenType::RightBracket
            }
            ',' => {
                self.advance();
                TokenType::Comma
            }
            ':' => {
                self.advance();
                TokenType::Colon
            }
            ';' => {
                self.advance();
                TokenType::Semicolon
            }
            '=' => {
                self.advance();
                TokenType::Equals
            }
            '#' => {
                self.advance();
                TokenType::Hash
            }

            // Unexpected character
            _ => {
                return Err(PactError::lexing(
                    format!("Unexpected character '{}'", ch),
                    start_line,
                    start_column,
                ));
            }
        };

        Ok(Token {
            token_type,
            line: start_line,
            column: start_column,
        })
    }

    /// Skip whitespace characters other than newline
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a string literal
    ///
    /// Supported escapes: `\n`, `\t`, `\\`, `\"`; any other escaped character
    /// is passed through literally. An unterminated string is an error
    /// anchored at the opening quote.
    fn read_string(&mut self, start_line: usize, start_column: usize) -> Result<String> {
        self.advance(); // Skip opening quote
        let mut string = String::new();

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance(); // Skip closing quote
                    return Ok(string);
                }
                '\\' => {
                    self.advance(); // Skip backslash
                    match self.advance() {
                        Some('n') => string.push('\n'),
                        Some('t') => string.push('\t'),
                        Some('\\') => string.push('\\'),
                        Some('"') => string.push('"'),
                        Some(other) => string.push(other),
                        None => break,
                    }
                }
                _ => {
                    string.push(ch);
                    self.advance();
                }
            }
        }

        Err(PactError::lexing(
            "Unterminated string",
            start_line,
            start_column,
        ))
    }

    /// Read a number: optional leading '-', digit run, optional '.' + digit run
    fn read_number(&mut self, start_line: usize, start_column: usize) -> Result<TokenType> {
        let mut number_str = String::new();

        if self.current_char() == Some('-') {
            number_str.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.current_char() == Some('.') {
            number_str.push('.');
            self.advance();
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_digit() {
                    number_str.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let value = number_str.parse::<f64>().map_err(|_| {
            PactError::lexing(
                format!("Invalid number: {}", number_str),
                start_line,
                start_column,
            )
        })?;

        Ok(TokenType::Number(value))
    }

    /// Read an identifier
    fn read_identifier(&mut self) -> String {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        identifier
    }

    /// Get the current character
    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek at the next character
    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Advance to the next character, tracking line and column
    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokens() {
        let mut lexer = Lexer::new(r#"FACT ready(ok=true);"#);
        let tokens = lexer.tokenize().unwrap();

        // FACT, ready, (, ok, =, true, ), ;, EOF
        assert_eq!(tokens.len(), 9);
        assert_eq!(tokens[0].token_type, TokenType::Keyword(Keyword::Fact));
        assert!(matches!(tokens[1].token_type, TokenType::Identifier(ref s) if s == "ready"));
        assert_eq!(tokens[2].token_type, TokenType::LeftParen);
        assert_eq!(tokens[5].token_type, TokenType::Keyword(Keyword::True));
        assert_eq!(tokens[8].token_type, TokenType::Eof);
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        let mut lexer = Lexer::new("intent INTENT Id id");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0].token_type, TokenType::Identifier(ref s) if s == "intent"));
        assert_eq!(tokens[1].token_type, TokenType::Keyword(Keyword::Intent));
        assert!(matches!(tokens[2].token_type, TokenType::Identifier(ref s) if s == "Id"));
        assert_eq!(tokens[3].token_type, TokenType::Keyword(Keyword::Id));
    }

    #[test]
    fn test_string_escapes() {
        let mut lexer = Lexer::new(r#""a\nb\t\"c\\d\qe""#);
        let tokens = lexer.tokenize().unwrap();

        // Unknown escapes pass through the escaped character unchanged.
        assert!(
            matches!(tokens[0].token_type, TokenType::Str(ref s) if s == "a\nb\t\"c\\dqe")
        );
    }

    #[test]
    fn test_unterminated_string_position() {
        let mut lexer = Lexer::new("FACT a(x=\"oops);");
        let err = lexer.tokenize().unwrap_err();

        match err {
            crate::error::PactError::Lexing { line, column, ref message } => {
                assert_eq!(line, 1);
                assert_eq!(column, 10);
                assert!(message.contains("Unterminated string"));
            }
            other => panic!("expected lexing error, got {:?}", other),
        }
    }

    #[test]
    fn test_numbers() {
        let mut lexer = Lexer::new("42 -3.5 0.25 -7");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[0].token_type, TokenType::Number(42.0));
        assert_eq!(tokens[1].token_type, TokenType::Number(-3.5));
        assert_eq!(tokens[2].token_type, TokenType::Number(0.25));
        assert_eq!(tokens[3].token_type, TokenType::Number(-7.0));
    }

    #[test]
    fn test_bare_minus_is_rejected() {
        let mut lexer = Lexer::new("FACT a(x= - 1);");
        let err = lexer.tokenize().unwrap_err();
        assert!(err.to_string().contains("Unexpected character '-'"));
    }

    #[test]
    fn test_comments_and_newlines() {
        let mut lexer = Lexer::new("// header comment\nFACT a(); // trailing\n");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[0].token_type, TokenType::Newline);
        assert_eq!(tokens[1].token_type, TokenType::Keyword(Keyword::Fact));
        // trailing comment is skipped, leaving the final newline
        let newlines = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::Newline)
            .count();
        assert_eq!(newlines, 2);
    }

    #[test]
    fn test_positions_are_one_based() {
        let mut lexer = Lexer::new("FACT\n  QUERY");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("FACT @");
        let err = lexer.tokenize().unwrap_err();
        assert!(err.to_string().contains("Unexpected character '@'"));
    }
}
