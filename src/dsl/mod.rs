//! Pact DSL front end: lexer, AST, parser, and interpreter

pub mod ast;
pub mod evaluator;
pub mod lexer;
pub mod parser;

#[cfg(test)]
mod tests;

pub use ast::{Header, NamedArg, Predicate, Program, Statement, ValueExpr};
pub use evaluator::{format_args, Interpreter, Value};
pub use lexer::{Keyword, Lexer, Token, TokenType};
pub use parser::Parser;

use crate::error::Result;

/// Tokenize Pact source text
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

/// Lex and parse Pact source text into a program
pub fn parse_source(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse()
}
