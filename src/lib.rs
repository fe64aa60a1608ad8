//! Pact is a small declarative language for inter-agent contracts.
//!
//! Agents exchange intents, facts, queries, offers, and commitments as
//! Pact scripts. This crate provides the full pipeline: a lexer and
//! recursive descent parser, an interpreter that applies a script to an
//! agent's state, transaction boundaries with rollback, and a sandbox for
//! running untrusted scripts under resource and capability limits.
//!
//! ```
//! use pact_dsl::{Agent, Interpreter, parse_source};
//!
//! let program = parse_source(r#"FACT available(item="TV", price=500);"#).unwrap();
//! let mut agent = Agent::new("seller");
//! let responses = Interpreter::new().execute(&program, &mut agent).unwrap();
//! assert_eq!(responses, vec!["[FACT] available(item=TV, price=500)"]);
//! ```

pub mod agent;
pub mod dsl;
pub mod error;
pub mod sandbox;
pub mod transaction;

pub use agent::{Action, Agent, Belief, Commitment, Goal, LogEntry, Offer, OfferStatus};
pub use dsl::{
    parse_source, tokenize, Header, Interpreter, Keyword, Lexer, NamedArg, Parser, Predicate,
    Program, Statement, Token, TokenType, Value, ValueExpr,
};
pub use error::{PactError, Result};
pub use sandbox::{
    AuditEntry, AuditEvent, Sandbox, SandboxLimits, SandboxOutcome, SandboxStats,
};
pub use transaction::{execute_atomic, Transaction};
