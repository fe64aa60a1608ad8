//! Transaction boundaries over agent state
//!
//! Wraps an [`Agent`] in snapshot/rollback semantics so a script either
//! applies in full or leaves the state untouched. Nested `begin` calls act
//! as savepoints.

use crate::agent::Agent;
use crate::dsl::ast::Program;
use crate::dsl::evaluator::Interpreter;
use crate::error::{PactError, Result};
use tracing::debug;

/// Transaction wrapper around an agent's state
///
/// ```
/// use pact_dsl::{Agent, Transaction};
///
/// let mut agent = Agent::new("seller");
/// let mut tx = Transaction::new(&mut agent);
/// tx.begin().unwrap();
/// // ... mutate the agent ...
/// tx.rollback().unwrap(); // state restored
/// ```
pub struct Transaction<'a> {
    agent: &'a mut Agent,
    snapshots: Vec<Agent>,
}

impl<'a> Transaction<'a> {
    pub fn new(agent: &'a mut Agent) -> Self {
        Self {
            agent,
            snapshots: Vec::new(),
        }
    }

    /// Nesting depth; 0 means no active transaction
    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_active(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// Start a transaction, or create a savepoint if one is already active
    pub fn begin(&mut self) -> Result<()> {
        self.snapshots.push(self.agent.clone());
        debug!(depth = self.snapshots.len(), "transaction begin");
        Ok(())
    }

    /// Discard the latest snapshot, keeping the changes made since it
    pub fn commit(&mut self) -> Result<()> {
        if self.snapshots.pop().is_none() {
            return Err(PactError::Transaction(
                "No active transaction to commit".to_string(),
            ));
        }
        debug!(depth = self.snapshots.len(), "transaction commit");
        Ok(())
    }

    /// Restore the agent to the latest snapshot
    pub fn rollback(&mut self) -> Result<()> {
        let snapshot = self.snapshots.pop().ok_or_else(|| {
            PactError::Transaction("No active transaction to rollback".to_string())
        })?;
        *self.agent = snapshot;
        debug!(depth = self.snapshots.len(), "transaction rollback");
        Ok(())
    }

    /// Restore the agent to the very first snapshot, ending all nesting
    pub fn rollback_all(&mut self) -> Result<()> {
        if self.snapshots.is_empty() {
            return Ok(());
        }
        let first = self.snapshots.swap_remove(0);
        self.snapshots.clear();
        *self.agent = first;
        debug!("transaction rollback (all savepoints)");
        Ok(())
    }

    /// Shared access to the wrapped agent
    pub fn agent(&self) -> &Agent {
        self.agent
    }

    /// Mutable access to the wrapped agent
    pub fn agent_mut(&mut self) -> &mut Agent {
        self.agent
    }
}

/// Execute a program all-or-nothing: the agent is only updated if the whole
/// program ran without error.
pub fn execute_atomic(program: &Program, agent: &mut Agent) -> Result<Vec<String>> {
    let mut scratch = agent.clone();
    let responses = Interpreter::new().execute(program, &mut scratch)?;
    *agent = scratch;
    Ok(responses)
}
