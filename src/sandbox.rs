//! Sandboxed execution of untrusted Pact source
//!
//! Wraps the full pipeline with resource limits, a capability model over
//! statement keywords, isolated per-run agent state, and an audit trail.
//! The sandbox never propagates an error to the caller; every failure mode
//! is reported through the outcome's violation list.

use crate::agent::Agent;
use crate::dsl::ast::Program;
use crate::dsl::evaluator::Interpreter;
use crate::dsl::parse_source;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// The eight statement keywords subject to capability checks
pub const ALL_KEYWORDS: [&str; 8] = [
    "INTENT", "FACT", "QUERY", "OFFER", "ACCEPT", "REJECT", "COMMIT", "ACT",
];

/// Resource limits for sandboxed execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxLimits {
    /// Max source size in bytes
    pub max_source_bytes: usize,
    /// Max statements in a single program
    pub max_statements: usize,
    /// Max wall-clock execution time in milliseconds
    pub max_time_ms: f64,
    /// Max facts in the belief base after execution
    pub max_beliefs: usize,
    /// Max intents in the goal set after execution
    pub max_goals: usize,
    /// Max offers in the ledger after execution
    pub max_offers: usize,
    /// Max commitments after execution
    pub max_commits: usize,
    /// Max queued actions after execution
    pub max_actions: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 65536,
            max_statements: 100,
            max_time_ms: 5000.0,
            max_beliefs: 500,
            max_goals: 100,
            max_offers: 50,
            max_commits: 50,
            max_actions: 100,
        }
    }
}

/// Classification of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    Info,
    Allowed,
    Blocked,
    Error,
}

impl AuditEvent {
    fn label(&self) -> &'static str {
        match self {
            AuditEvent::Info => "INFO",
            AuditEvent::Allowed => "ALLOWED",
            AuditEvent::Blocked => "BLOCKED",
            AuditEvent::Error => "ERROR",
        }
    }
}

/// One entry in the sandbox audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub event: AuditEvent,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    fn new(event: AuditEvent, detail: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            detail,
            timestamp: Utc::now(),
        }
    }
}

/// Execution counters collected during a sandbox run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SandboxStats {
    pub statements_total: usize,
    pub statements_executed: usize,
    pub statements_blocked: usize,
    pub beliefs: usize,
    pub goals: usize,
    pub offers: usize,
    pub commitments: usize,
    pub actions: usize,
}

/// Result of a sandboxed execution
#[derive(Debug, Clone)]
pub struct SandboxOutcome {
    /// True when execution completed with no violations
    pub success: bool,
    pub responses: Vec<String>,
    pub violations: Vec<String>,
    pub audit: Vec<AuditEntry>,
    pub stats: SandboxStats,
    pub elapsed_ms: f64,
    /// Final state of the per-run agent
    pub agent: Agent,
}

impl SandboxOutcome {
    pub fn is_clean(&self) -> bool {
        self.success && self.violations.is_empty()
    }
}

/// Sandboxed interpreter for untrusted Pact source
///
/// Each `execute` call runs against a fresh agent; no state leaks between
/// runs.
#[derive(Debug, Clone)]
pub struct Sandbox {
    agent_id: String,
    allowed: HashSet<String>,
    limits: SandboxLimits,
}

impl Sandbox {
    /// Sandbox with default limits and every keyword allowed
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            allowed: ALL_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            limits: SandboxLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SandboxLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Restrict the capability set to exactly the given keywords
    pub fn allow_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed = keywords
            .into_iter()
            .map(|k| k.as_ref().to_uppercase())
            .collect();
        self
    }

    /// Remove the given keywords from the capability set
    pub fn deny_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            self.allowed.remove(&keyword.as_ref().to_uppercase());
        }
        self
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Execute source inside the sandbox. Never returns an error; parse
    /// failures and limit breaches land in the outcome's violations.
    pub fn execute(&self, source: &str) -> SandboxOutcome {
        let start = Instant::now();
        let mut audit = Vec::new();

        audit.push(AuditEntry::new(
            AuditEvent::Info,
            format!("Sandbox started for '{}'", self.agent_id),
        ));
        info!(agent = %self.agent_id, "sandbox run started");

        // Source size check, before touching the lexer
        let source_bytes = source.len();
        if source_bytes > self.limits.max_source_bytes {
            audit.push(AuditEntry::new(
                AuditEvent::Blocked,
                format!(
                    "Source too large: {} bytes (max {})",
                    source_bytes, self.limits.max_source_bytes
                ),
            ));
            return self.fail(audit, SandboxStats::default(), start);
        }

        // Lex and parse
        let program = match parse_source(source) {
            Ok(program) => program,
            Err(e) => {
                audit.push(AuditEntry::new(
                    AuditEvent::Error,
                    format!("Parse error: {}", e),
                ));
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                warn!(agent = %self.agent_id, error = %e, "sandbox parse failed");
                return SandboxOutcome {
                    success: false,
                    responses: Vec::new(),
                    violations: vec![format!("Parse error: {}", e)],
                    audit,
                    stats: SandboxStats::default(),
                    elapsed_ms,
                    agent: Agent::new(&self.agent_id),
                };
            }
        };

        // Statement count check
        let statements_total = program.statements.len();
        if statements_total > self.limits.max_statements {
            audit.push(AuditEntry::new(
                AuditEvent::Blocked,
                format!(
                    "Too many statements: {} (max {})",
                    statements_total, self.limits.max_statements
                ),
            ));
            let stats = SandboxStats {
                statements_total,
                ..Default::default()
            };
            return self.fail(audit, stats, start);
        }

        // Capability filter. Blocked statements are dropped, allowed ones
        // still run; every block is recorded as its own violation.
        let mut allowed_stmts = Vec::new();
        let mut statements_blocked = 0;
        for stmt in &program.statements {
            let keyword = stmt.keyword();
            if self.allowed.contains(keyword) {
                audit.push(AuditEntry::new(
                    AuditEvent::Allowed,
                    format!("{} statement passed capability check", keyword),
                ));
                allowed_stmts.push(stmt.clone());
            } else {
                audit.push(AuditEntry::new(
                    AuditEvent::Blocked,
                    format!("Keyword '{}' not allowed in this sandbox", keyword),
                ));
                statements_blocked += 1;
            }
        }

        let filtered = Program {
            headers: program.headers.clone(),
            statements: allowed_stmts,
        };

        // Execute against a fresh agent
        let mut agent = Agent::new(&self.agent_id);
        let responses = match Interpreter::new().execute(&filtered, &mut agent) {
            Ok(responses) => responses,
            Err(e) => {
                audit.push(AuditEntry::new(
                    AuditEvent::Error,
                    format!("Runtime error: {}", e),
                ));
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                return SandboxOutcome {
                    success: false,
                    responses: Vec::new(),
                    violations: vec![format!("Runtime error: {}", e)],
                    audit,
                    stats: SandboxStats {
                        statements_total,
                        statements_blocked,
                        ..Default::default()
                    },
                    elapsed_ms,
                    agent,
                };
            }
        };

        // Wall-clock check
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        if elapsed_ms > self.limits.max_time_ms {
            audit.push(AuditEntry::new(
                AuditEvent::Blocked,
                format!(
                    "Execution too slow: {:.1}ms (max {}ms)",
                    elapsed_ms, self.limits.max_time_ms
                ),
            ));
        }

        // Post-execution state size checks
        let state_checks = [
            (agent.belief_base.len(), self.limits.max_beliefs, "beliefs"),
            (agent.goal_set.len(), self.limits.max_goals, "goals"),
            (agent.offer_ledger.len(), self.limits.max_offers, "offers"),
            (
                agent.commit_ledger.len(),
                self.limits.max_commits,
                "commitments",
            ),
            (agent.action_queue.len(), self.limits.max_actions, "actions"),
        ];
        for (actual, limit, name) in state_checks {
            if actual > limit {
                audit.push(AuditEntry::new(
                    AuditEvent::Blocked,
                    format!("Too many {}: {} (max {})", name, actual, limit),
                ));
            }
        }

        let violations: Vec<String> = audit
            .iter()
            .filter(|e| e.event == AuditEvent::Blocked)
            .map(|e| e.detail.clone())
            .collect();

        audit.push(AuditEntry::new(
            AuditEvent::Info,
            format!(
                "Sandbox finished: {} responses, {} violations, {:.1}ms",
                responses.len(),
                violations.len(),
                elapsed_ms
            ),
        ));
        info!(
            agent = %self.agent_id,
            responses = responses.len(),
            violations = violations.len(),
            "sandbox run finished"
        );

        let stats = SandboxStats {
            statements_total,
            statements_executed: statements_total - statements_blocked,
            statements_blocked,
            beliefs: agent.belief_base.len(),
            goals: agent.goal_set.len(),
            offers: agent.offer_ledger.len(),
            commitments: agent.commit_ledger.len(),
            actions: agent.action_queue.len(),
        };

        SandboxOutcome {
            success: violations.is_empty(),
            responses,
            violations,
            audit,
            stats,
            elapsed_ms,
            agent,
        }
    }

    /// Quick check: can this source run without violations?
    pub fn is_safe(&self, source: &str) -> bool {
        self.execute(source).is_clean()
    }

    /// Run and return a human-readable audit report
    pub fn explain(&self, source: &str) -> String {
        let outcome = self.execute(source);
        let mut lines = vec![
            format!("Sandbox Report for '{}'", self.agent_id),
            "-".repeat(50),
            format!(
                "  Status:     {}",
                if outcome.is_clean() { "CLEAN" } else { "VIOLATIONS" }
            ),
            format!("  Elapsed:    {:.1}ms", outcome.elapsed_ms),
            format!(
                "  Statements: {}/{} executed",
                outcome.stats.statements_executed, outcome.stats.statements_total
            ),
        ];
        if outcome.stats.statements_blocked > 0 {
            lines.push(format!(
                "  Blocked:    {} statements",
                outcome.stats.statements_blocked
            ));
        }
        if !outcome.violations.is_empty() {
            lines.push(format!("\n  Violations ({}):", outcome.violations.len()));
            for violation in &outcome.violations {
                lines.push(format!("    x {}", violation));
            }
        }
        if !outcome.responses.is_empty() {
            lines.push(format!("\n  Output ({}):", outcome.responses.len()));
            for response in &outcome.responses {
                lines.push(format!("    {}", response));
            }
        }
        lines.push(format!("\n  Audit Trail ({}):", outcome.audit.len()));
        for entry in &outcome.audit {
            lines.push(format!("    [{:>8}] {}", entry.event.label(), entry.detail));
        }
        lines.join("\n")
    }

    /// Outcome for a run that never reached execution
    fn fail(&self, audit: Vec<AuditEntry>, stats: SandboxStats, start: Instant) -> SandboxOutcome {
        let violations: Vec<String> = audit
            .iter()
            .filter(|e| e.event == AuditEvent::Blocked)
            .map(|e| e.detail.clone())
            .collect();
        for violation in &violations {
            warn!(agent = %self.agent_id, violation = %violation, "sandbox violation");
        }
        SandboxOutcome {
            success: false,
            responses: Vec::new(),
            violations,
            audit,
            stats,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            agent: Agent::new(&self.agent_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_run() {
        let sandbox = Sandbox::new("worker");
        let outcome = sandbox.execute("FACT known(item=\"TV\", price=500);");

        assert!(outcome.is_clean());
        assert_eq!(outcome.responses, vec!["[FACT] known(item=TV, price=500)"]);
        assert_eq!(outcome.stats.statements_executed, 1);
        assert_eq!(outcome.agent.belief_base.len(), 1);
    }

    #[test]
    fn test_source_too_large() {
        let sandbox = Sandbox::new("worker");
        let source = " ".repeat(70000);
        let outcome = sandbox.execute(&source);

        assert!(!outcome.success);
        assert_eq!(outcome.violations.len(), 1);
        assert!(outcome.violations[0].starts_with("Source too large: 70000 bytes"));
        assert!(outcome.responses.is_empty());
        assert_eq!(outcome.stats.statements_total, 0);
    }

    #[test]
    fn test_parse_error_is_contained() {
        let sandbox = Sandbox::new("worker");
        let outcome = sandbox.execute("FACT broken(");

        assert!(!outcome.success);
        assert_eq!(outcome.violations.len(), 1);
        assert!(outcome.violations[0].starts_with("Parse error:"));
        assert!(outcome.agent.belief_base.is_empty());
    }

    #[test]
    fn test_statement_limit() {
        let limits = SandboxLimits {
            max_statements: 2,
            ..Default::default()
        };
        let sandbox = Sandbox::new("worker").with_limits(limits);
        let outcome = sandbox.execute("FACT a();\nFACT b();\nFACT c();");

        assert!(!outcome.success);
        assert_eq!(
            outcome.violations,
            vec!["Too many statements: 3 (max 2)".to_string()]
        );
        // Nothing ran
        assert!(outcome.responses.is_empty());
    }

    #[test]
    fn test_capability_filter_runs_allowed_statements() {
        let sandbox = Sandbox::new("worker").allow_keywords(["FACT", "QUERY"]);
        let outcome = sandbox.execute(
            "FACT known(x=1);\nCOMMIT deliver();\nQUERY known(x=1) FROM \"peer\";\nACT ship();",
        );

        assert!(!outcome.success);
        assert_eq!(
            outcome.violations,
            vec![
                "Keyword 'COMMIT' not allowed in this sandbox".to_string(),
                "Keyword 'ACT' not allowed in this sandbox".to_string(),
            ]
        );
        // Allowed statements still executed
        assert_eq!(
            outcome.responses,
            vec!["[FACT] known(x=1)", "[QUERY RESULT] FACT known(x=1)"]
        );
        assert_eq!(outcome.stats.statements_blocked, 2);
        assert_eq!(outcome.stats.statements_executed, 2);
        assert!(outcome.agent.commit_ledger.is_empty());
        assert!(outcome.agent.action_queue.is_empty());
    }

    #[test]
    fn test_deny_keywords() {
        let sandbox = Sandbox::new("worker").deny_keywords(["act"]);
        let outcome = sandbox.execute("ACT ship();");

        assert!(!outcome.success);
        assert_eq!(
            outcome.violations,
            vec!["Keyword 'ACT' not allowed in this sandbox".to_string()]
        );
    }

    #[test]
    fn test_state_size_limit() {
        let limits = SandboxLimits {
            max_beliefs: 2,
            ..Default::default()
        };
        let sandbox = Sandbox::new("worker").with_limits(limits);
        let outcome = sandbox.execute("FACT a();\nFACT b();\nFACT c();");

        assert!(!outcome.success);
        assert_eq!(
            outcome.violations,
            vec!["Too many beliefs: 3 (max 2)".to_string()]
        );
        // Statements already ran; only the post-hoc check flags the breach
        assert_eq!(outcome.responses.len(), 3);
    }

    #[test]
    fn test_runs_are_isolated() {
        let sandbox = Sandbox::new("worker");
        sandbox.execute("FACT a();");
        let outcome = sandbox.execute("QUERY a() FROM \"peer\";");

        assert_eq!(
            outcome.responses,
            vec!["[QUERY] No matching facts for a()"]
        );
    }

    #[test]
    fn test_is_safe_and_explain() {
        let sandbox = Sandbox::new("worker").allow_keywords(["FACT"]);
        assert!(sandbox.is_safe("FACT a();"));
        assert!(!sandbox.is_safe("ACT b();"));

        let report = sandbox.explain("ACT b();");
        assert!(report.contains("Sandbox Report for 'worker'"));
        assert!(report.contains("VIOLATIONS"));
        assert!(report.contains("Keyword 'ACT' not allowed in this sandbox"));
    }
}
