//! Agent state model
//!
//! Each agent maintains:
//!   - belief_base    (known facts, append only)
//!   - goal_set       (active intentions, append only)
//!   - offer_ledger   (offers keyed by id, with lifecycle status)
//!   - commit_ledger  (binding obligations, append only)
//!   - action_queue   (pending actions, append only)
//!   - message_log    (audit trail of every mutation)

use crate::dsl::evaluator::{format_args, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A known fact in the belief base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    pub predicate: String,
    pub args: Vec<(String, Value)>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Belief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FACT {}({})", self.predicate, format_args(&self.args))
    }
}

/// An active intention in the goal set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub predicate: String,
    pub args: Vec<(String, Value)>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INTENT {}({})", self.predicate, format_args(&self.args))
    }
}

/// Lifecycle status of an offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    Open,
    Accepted,
    Rejected,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferStatus::Open => write!(f, "open"),
            OfferStatus::Accepted => write!(f, "accepted"),
            OfferStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// An offer in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub offer_id: String,
    pub from_agent: String,
    pub to_agent: String,
    pub fields: Vec<(String, Value)>,
    pub status: OfferStatus,
    /// Rejection reason, if any was given
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OFFER id=\"{}\" [{}] -> {}",
            self.offer_id, self.status, self.to_agent
        )
    }
}

/// A binding obligation in the commit ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    pub predicate: String,
    pub args: Vec<(String, Value)>,
    pub deadline: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "COMMIT {}({})", self.predicate, format_args(&self.args))?;
        if let Some(deadline) = &self.deadline {
            write!(f, " BY {}", deadline)?;
        }
        Ok(())
    }
}

/// A pending action in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub predicate: String,
    pub args: Vec<(String, Value)>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ACT {}({})", self.predicate, format_args(&self.args))
    }
}

/// One audit trail entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub event: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Mutable runtime state of a single agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub belief_base: Vec<Belief>,
    pub goal_set: Vec<Goal>,
    /// Keyed by offer id; BTreeMap keeps iteration deterministic
    pub offer_ledger: BTreeMap<String, Offer>,
    pub commit_ledger: Vec<Commitment>,
    pub action_queue: Vec<Action>,
    pub message_log: Vec<LogEntry>,
}

impl Agent {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            belief_base: Vec::new(),
            goal_set: Vec::new(),
            offer_ledger: BTreeMap::new(),
            commit_ledger: Vec::new(),
            action_queue: Vec::new(),
            message_log: Vec::new(),
        }
    }

    fn log(&mut self, event: &str, detail: String) {
        self.message_log.push(LogEntry {
            event: event.to_string(),
            detail,
            timestamp: Utc::now(),
        });
    }

    pub fn add_fact(&mut self, predicate: &str, args: Vec<(String, Value)>) {
        let belief = Belief {
            predicate: predicate.to_string(),
            args,
            timestamp: Utc::now(),
        };
        let detail = belief.to_string();
        self.belief_base.push(belief);
        self.log("FACT", detail);
    }

    pub fn add_intent(&mut self, predicate: &str, args: Vec<(String, Value)>) {
        let goal = Goal {
            predicate: predicate.to_string(),
            args,
            timestamp: Utc::now(),
        };
        let detail = goal.to_string();
        self.goal_set.push(goal);
        self.log("INTENT", detail);
    }

    /// Record an offer. Re-using an existing id overwrites the previous
    /// entry, last write winning.
    pub fn add_offer(
        &mut self,
        offer_id: &str,
        from_agent: &str,
        to_agent: &str,
        fields: Vec<(String, Value)>,
    ) {
        let offer = Offer {
            offer_id: offer_id.to_string(),
            from_agent: from_agent.to_string(),
            to_agent: to_agent.to_string(),
            fields,
            status: OfferStatus::Open,
            reason: None,
            timestamp: Utc::now(),
        };
        let detail = offer.to_string();
        self.offer_ledger.insert(offer_id.to_string(), offer);
        self.log("OFFER", detail);
    }

    /// Move an open offer to accepted. Returns false if the offer is
    /// missing or already resolved.
    pub fn accept_offer(&mut self, offer_id: &str) -> bool {
        match self.offer_ledger.get_mut(offer_id) {
            Some(offer) if offer.status == OfferStatus::Open => {
                offer.status = OfferStatus::Accepted;
                self.log("ACCEPT", format!("Offer \"{}\" accepted", offer_id));
                true
            }
            _ => {
                self.log(
                    "ACCEPT_FAIL",
                    format!("Offer \"{}\" not found or not open", offer_id),
                );
                false
            }
        }
    }

    /// Move an open offer to rejected. Returns false if the offer is
    /// missing or already resolved.
    pub fn reject_offer(&mut self, offer_id: &str, reason: Option<&str>) -> bool {
        match self.offer_ledger.get_mut(offer_id) {
            Some(offer) if offer.status == OfferStatus::Open => {
                offer.status = OfferStatus::Rejected;
                offer.reason = reason.map(str::to_string);
                let reason_part = reason.map(|r| format!(": {}", r)).unwrap_or_default();
                self.log(
                    "REJECT",
                    format!("Offer \"{}\" rejected{}", offer_id, reason_part),
                );
                true
            }
            _ => {
                self.log(
                    "REJECT_FAIL",
                    format!("Offer \"{}\" not found or not open", offer_id),
                );
                false
            }
        }
    }

    pub fn add_commit(
        &mut self,
        predicate: &str,
        args: Vec<(String, Value)>,
        deadline: Option<&str>,
    ) {
        let commit = Commitment {
            predicate: predicate.to_string(),
            args,
            deadline: deadline.map(str::to_string),
            timestamp: Utc::now(),
        };
        let detail = commit.to_string();
        self.commit_ledger.push(commit);
        self.log("COMMIT", detail);
    }

    pub fn add_action(&mut self, predicate: &str, args: Vec<(String, Value)>) {
        let action = Action {
            predicate: predicate.to_string(),
            args,
            timestamp: Utc::now(),
        };
        let detail = action.to_string();
        self.action_queue.push(action);
        self.log("ACT", detail);
    }

    /// Query the belief base with a subset match: the predicate name must be
    /// equal, and every queried key that is also present in a fact must carry
    /// an equal value. Keys absent from the fact do not disqualify it.
    pub fn query_facts(&self, predicate: &str, args: &[(String, Value)]) -> Vec<&Belief> {
        self.belief_base
            .iter()
            .filter(|fact| {
                if fact.predicate != predicate {
                    return false;
                }
                args.iter().all(|(k, v)| {
                    match fact.args.iter().find(|(fk, _)| fk == k) {
                        Some((_, fv)) => fv == v,
                        None => true,
                    }
                })
            })
            .collect()
    }

    /// Human readable summary of the full agent state
    pub fn state_summary(&self) -> String {
        let mut lines = vec![
            format!("=== Agent: {} ===", self.agent_id),
            format!("Beliefs ({}):", self.belief_base.len()),
        ];
        for belief in &self.belief_base {
            lines.push(format!("  - {}", belief));
        }
        lines.push(format!("Goals ({}):", self.goal_set.len()));
        for goal in &self.goal_set {
            lines.push(format!("  - {}", goal));
        }
        lines.push(format!("Offers ({}):", self.offer_ledger.len()));
        for offer in self.offer_ledger.values() {
            lines.push(format!("  - {}", offer));
        }
        lines.push(format!("Commitments ({}):", self.commit_ledger.len()));
        for commit in &self.commit_ledger {
            lines.push(format!("  - {}", commit));
        }
        lines.push(format!("Actions ({}):", self.action_queue.len()));
        for action in &self.action_queue {
            lines.push(format!("  - {}", action));
        }
        lines.push(format!("Log ({} entries)", self.message_log.len()));
        lines.join("\n")
    }
}
