//! Interpreter for the Pact DSL
//!
//! Walks a parsed [`Program`] statement by statement, mutating the target
//! [`Agent`] and collecting one or more response lines per statement.

use super::ast::{NamedArg, Predicate, Program, Statement, ValueExpr};
use crate::agent::Agent;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Runtime value stored in agent state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    /// Entries keep insertion order. Duplicate keys are collapsed at
    /// construction time, last value winning.
    Map(Vec<(String, Value)>),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Map(_) => "map",
            Value::List(_) => "list",
        }
    }

    /// Convert to a serde_json value for serialization and reporting
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Number(n) => {
                // Whole numbers print without a trailing .0
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 9e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Format an argument list as `k=v, k=v`
pub fn format_args(args: &[(String, Value)]) -> String {
    args.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insert an entry, replacing in place if the key already exists
fn insert_entry(entries: &mut Vec<(String, Value)>, key: String, value: Value) {
    if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
        existing.1 = value;
    } else {
        entries.push((key, value));
    }
}

/// Resolve a literal expression to a runtime value
fn resolve_value(expr: &ValueExpr) -> Value {
    match expr {
        ValueExpr::Str(s) => Value::Str(s.clone()),
        ValueExpr::Number(n) => Value::Number(*n),
        ValueExpr::Bool(b) => Value::Bool(*b),
        ValueExpr::Null => Value::Null,
        ValueExpr::Map(entries) => {
            let mut resolved = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                insert_entry(&mut resolved, k.clone(), resolve_value(v));
            }
            Value::Map(resolved)
        }
        ValueExpr::List(items) => Value::List(items.iter().map(resolve_value).collect()),
    }
}

/// Resolve predicate arguments, duplicates collapsing last-wins
fn resolve_args(args: &[NamedArg]) -> Vec<(String, Value)> {
    let mut resolved = Vec::with_capacity(args.len());
    for arg in args {
        insert_entry(&mut resolved, arg.name.clone(), resolve_value(&arg.value));
    }
    resolved
}

/// Executes Pact programs against an agent's state
#[derive(Debug, Default)]
pub struct Interpreter {
    responses: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a program against the given agent. Returns the response lines,
    /// one or more per statement, in statement order.
    pub fn execute(&mut self, program: &Program, agent: &mut Agent) -> Result<Vec<String>> {
        self.responses = Vec::new();

        for stmt in &program.statements {
            debug!(statement = stmt.keyword(), agent = %agent.agent_id, "executing statement");
            self.exec_statement(stmt, program, agent);
        }

        Ok(std::mem::take(&mut self.responses))
    }

    fn exec_statement(&mut self, stmt: &Statement, program: &Program, agent: &mut Agent) {
        match stmt {
            Statement::Intent { predicate } => self.exec_intent(predicate, agent),
            Statement::Fact { predicate } => self.exec_fact(predicate, agent),
            Statement::Query {
                predicate,
                from_agent,
            } => self.exec_query(predicate, from_agent, agent),
            Statement::Offer {
                offer_id,
                to_agent,
                fields,
            } => self.exec_offer(offer_id, to_agent, fields, program, agent),
            Statement::Accept { offer_id } => self.exec_accept(offer_id, agent),
            Statement::Reject { offer_id, reason } => {
                self.exec_reject(offer_id, reason.as_deref(), agent)
            }
            Statement::Commit {
                predicate,
                deadline,
            } => self.exec_commit(predicate, deadline.as_deref(), agent),
            Statement::Act { predicate } => self.exec_act(predicate, agent),
        }
    }

    fn exec_intent(&mut self, predicate: &Predicate, agent: &mut Agent) {
        let args = resolve_args(&predicate.args);
        let line = format!("[INTENT] {}({})", predicate.name, format_args(&args));
        agent.add_intent(&predicate.name, args);
        self.responses.push(line);
    }

    fn exec_fact(&mut self, predicate: &Predicate, agent: &mut Agent) {
        let args = resolve_args(&predicate.args);
        let line = format!("[FACT] {}({})", predicate.name, format_args(&args));
        agent.add_fact(&predicate.name, args);
        self.responses.push(line);
    }

    fn exec_query(&mut self, predicate: &Predicate, _from_agent: &str, agent: &mut Agent) {
        let args = resolve_args(&predicate.args);
        let results = agent.query_facts(&predicate.name, &args);
        if results.is_empty() {
            self.responses.push(format!(
                "[QUERY] No matching facts for {}({})",
                predicate.name,
                format_args(&args)
            ));
        } else {
            let lines: Vec<String> = results
                .iter()
                .map(|fact| format!("[QUERY RESULT] {}", fact))
                .collect();
            self.responses.extend(lines);
        }
    }

    fn exec_offer(
        &mut self,
        offer_id: &str,
        to_agent: &str,
        fields: &[(String, ValueExpr)],
        program: &Program,
        agent: &mut Agent,
    ) {
        let mut resolved = Vec::with_capacity(fields.len());
        for (k, v) in fields {
            insert_entry(&mut resolved, k.clone(), resolve_value(v));
        }
        // The `from` header names the sender; the executing agent is the
        // fallback.
        let from_agent = program
            .header("from")
            .unwrap_or(&agent.agent_id)
            .to_string();
        agent.add_offer(offer_id, &from_agent, to_agent, resolved);
        self.responses
            .push(format!("[OFFER] id=\"{}\" -> {}", offer_id, to_agent));
    }

    fn exec_accept(&mut self, offer_id: &str, agent: &mut Agent) {
        if agent.accept_offer(offer_id) {
            self.responses
                .push(format!("[ACCEPT] Offer \"{}\" accepted", offer_id));
        } else {
            self.responses.push(format!(
                "[ACCEPT FAILED] Offer \"{}\" not found or not open",
                offer_id
            ));
        }
    }

    fn exec_reject(&mut self, offer_id: &str, reason: Option<&str>, agent: &mut Agent) {
        if agent.reject_offer(offer_id, reason) {
            let reason_part = reason.map(|r| format!(": {}", r)).unwrap_or_default();
            self.responses.push(format!(
                "[REJECT] Offer \"{}\" rejected{}",
                offer_id, reason_part
            ));
        } else {
            self.responses.push(format!(
                "[REJECT FAILED] Offer \"{}\" not found or not open",
                offer_id
            ));
        }
    }

    fn exec_commit(&mut self, predicate: &Predicate, deadline: Option<&str>, agent: &mut Agent) {
        let args = resolve_args(&predicate.args);
        let dl = deadline.map(|d| format!(" BY {}", d)).unwrap_or_default();
        let line = format!("[COMMIT] {}({}){}", predicate.name, format_args(&args), dl);
        agent.add_commit(&predicate.name, args, deadline);
        self.responses.push(line);
    }

    fn exec_act(&mut self, predicate: &Predicate, agent: &mut Agent) {
        let args = resolve_args(&predicate.args);
        let line = format!("[ACT] {}({})", predicate.name, format_args(&args));
        agent.add_action(&predicate.name, args);
        self.responses.push(line);
    }
}
