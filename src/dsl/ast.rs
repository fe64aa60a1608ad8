//! AST node definitions for the Pact DSL

use serde::{Deserialize, Serialize};

/// Literal value expression as written in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueExpr {
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    /// Entries keep source order; duplicate keys are resolved at evaluation
    /// time, last value winning.
    Map(Vec<(String, ValueExpr)>),
    List(Vec<ValueExpr>),
}

/// A `name=value` pair inside a predicate argument list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: String,
    pub value: ValueExpr,
}

/// Predicate: an identifier with named arguments, e.g. `deliver(item="TV")`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub args: Vec<NamedArg>,
}

/// A `# key "value"` metadata header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

/// One statement of a Pact program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Intent {
        predicate: Predicate,
    },
    Fact {
        predicate: Predicate,
    },
    Query {
        predicate: Predicate,
        from_agent: String,
    },
    Offer {
        offer_id: String,
        to_agent: String,
        fields: Vec<(String, ValueExpr)>,
    },
    Accept {
        offer_id: String,
    },
    Reject {
        offer_id: String,
        reason: Option<String>,
    },
    Commit {
        predicate: Predicate,
        deadline: Option<String>,
    },
    Act {
        predicate: Predicate,
    },
}

impl Statement {
    /// The statement keyword as written in source
    pub fn keyword(&self) -> &'static str {
        match self {
            Statement::Intent { .. } => "INTENT",
            Statement::Fact { .. } => "FACT",
            Statement::Query { .. } => "QUERY",
            Statement::Offer { .. } => "OFFER",
            Statement::Accept { .. } => "ACCEPT",
            Statement::Reject { .. } => "REJECT",
            Statement::Commit { .. } => "COMMIT",
            Statement::Act { .. } => "ACT",
        }
    }
}

/// A parsed program: leading metadata headers followed by statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub headers: Vec<Header>,
    pub statements: Vec<Statement>,
}

impl Program {
    /// Look up a header value by key
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key == key)
            .map(|h| h.value.as_str())
    }
}
