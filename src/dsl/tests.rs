//! End-to-end tests of the lex, parse, evaluate pipeline

use super::evaluator::Interpreter;
use super::parse_source;
use crate::agent::{Agent, OfferStatus};
use pretty_assertions::assert_eq;

fn run(source: &str) -> (Vec<String>, Agent) {
    let program = parse_source(source).unwrap();
    let mut agent = Agent::new("test-agent");
    let responses = Interpreter::new().execute(&program, &mut agent).unwrap();
    (responses, agent)
}

#[test]
fn test_fact_then_query() {
    let (responses, agent) = run(
        "FACT available(item=\"TV\", price=500);\nQUERY available(item=\"TV\") FROM \"seller\";",
    );

    assert_eq!(
        responses,
        vec![
            "[FACT] available(item=TV, price=500)",
            "[QUERY RESULT] FACT available(item=TV, price=500)",
        ]
    );
    assert_eq!(agent.belief_base.len(), 1);
}

#[test]
fn test_query_no_match() {
    let (responses, _) = run("QUERY available(item=\"TV\") FROM \"seller\";");
    assert_eq!(
        responses,
        vec!["[QUERY] No matching facts for available(item=TV)"]
    );
}

#[test]
fn test_query_multiple_matches_in_insertion_order() {
    let (responses, _) = run(
        "FACT stock(item=\"TV\", loc=\"NYC\");\nFACT stock(item=\"TV\", loc=\"LA\");\nQUERY stock(item=\"TV\") FROM \"peer\";",
    );

    assert_eq!(responses.len(), 4);
    assert_eq!(responses[2], "[QUERY RESULT] FACT stock(item=TV, loc=NYC)");
    assert_eq!(responses[3], "[QUERY RESULT] FACT stock(item=TV, loc=LA)");
}

#[test]
fn test_offer_accept_lifecycle() {
    let (responses, agent) = run(
        "OFFER id=\"deal-7\" TO \"buyer\" { item: \"TV\", price: 450 };\nACCEPT \"deal-7\";\nACCEPT \"deal-7\";",
    );

    assert_eq!(
        responses,
        vec![
            "[OFFER] id=\"deal-7\" -> buyer",
            "[ACCEPT] Offer \"deal-7\" accepted",
            "[ACCEPT FAILED] Offer \"deal-7\" not found or not open",
        ]
    );
    assert_eq!(agent.offer_ledger["deal-7"].status, OfferStatus::Accepted);
}

#[test]
fn test_second_resolution_fails_and_status_sticks() {
    let (responses, agent) =
        run("OFFER id=\"d1\" TO \"b\" { money: 10 };\nACCEPT \"d1\";\nACCEPT \"d1\";");

    assert_eq!(responses[1], "[ACCEPT] Offer \"d1\" accepted");
    assert_eq!(
        responses[2],
        "[ACCEPT FAILED] Offer \"d1\" not found or not open"
    );
    assert_eq!(agent.offer_ledger["d1"].status, OfferStatus::Accepted);
}

#[test]
fn test_reject_with_reason() {
    let (responses, agent) =
        run("OFFER id=\"d\" TO \"buyer\" { price: 900 };\nREJECT \"d\" REASON \"too expensive\";");

    assert_eq!(responses[1], "[REJECT] Offer \"d\" rejected: too expensive");
    assert_eq!(agent.offer_ledger["d"].status, OfferStatus::Rejected);
}

#[test]
fn test_accept_unknown_offer() {
    let (responses, _) = run("ACCEPT \"nope\";");
    assert_eq!(
        responses,
        vec!["[ACCEPT FAILED] Offer \"nope\" not found or not open"]
    );
}

#[test]
fn test_commit_with_deadline() {
    let (responses, agent) = run("COMMIT deliver(item=\"TV\") BY \"2026-01-01\";");
    assert_eq!(responses, vec!["[COMMIT] deliver(item=TV) BY 2026-01-01"]);
    assert_eq!(agent.commit_ledger.len(), 1);
    assert_eq!(
        agent.commit_ledger[0].deadline,
        Some("2026-01-01".to_string())
    );
}

#[test]
fn test_intent_and_act() {
    let (responses, agent) = run("INTENT negotiate(topic=\"price\");\nACT ship(item=\"TV\");");
    assert_eq!(
        responses,
        vec!["[INTENT] negotiate(topic=price)", "[ACT] ship(item=TV)"]
    );
    assert_eq!(agent.goal_set.len(), 1);
    assert_eq!(agent.action_queue.len(), 1);
}

#[test]
fn test_offer_from_header() {
    let program = parse_source(
        "# from \"seller\"\nOFFER id=\"d\" TO \"buyer\" { price: 1 };",
    )
    .unwrap();
    let mut agent = Agent::new("runner");
    Interpreter::new().execute(&program, &mut agent).unwrap();
    assert_eq!(agent.offer_ledger["d"].from_agent, "seller");

    // Without the header, the executing agent is the sender
    let program = parse_source("OFFER id=\"d\" TO \"buyer\" { price: 1 };").unwrap();
    let mut agent = Agent::new("runner");
    Interpreter::new().execute(&program, &mut agent).unwrap();
    assert_eq!(agent.offer_ledger["d"].from_agent, "runner");
}

#[test]
fn test_execution_is_deterministic() {
    let source = "# from \"seller\"\nFACT a(x=1, y=[1, {k: \"v\"}]);\nINTENT b();\nOFFER id=\"o\" TO \"buyer\" { p: 2 };\nQUERY a(x=1) FROM \"peer\";";

    let (first, _) = run(source);
    let (second, _) = run(source);
    assert_eq!(first, second);
}

#[test]
fn test_rerun_appends() {
    let source = "COMMIT deliver(item=\"TV\") BY \"2026-01-01\";";
    let program = parse_source(source).unwrap();
    let mut agent = Agent::new("seller");

    Interpreter::new().execute(&program, &mut agent).unwrap();
    Interpreter::new().execute(&program, &mut agent).unwrap();

    // Ledgers are append only; running twice doubles the entries
    assert_eq!(agent.commit_ledger.len(), 2);
    assert_eq!(agent.message_log.len(), 2);
}

#[test]
fn test_nested_values_round_trip_through_display() {
    let (responses, _) = run(
        "FACT inventory(data={warehouses: [{city: \"NYC\", stock: 12}], open: true}, note=null);",
    );
    assert_eq!(
        responses,
        vec!["[FACT] inventory(data={warehouses: [{city: NYC, stock: 12}], open: true}, note=null)"]
    );
}

#[test]
fn test_statement_responses_in_order() {
    let (responses, _) = run("FACT a();\nFACT b();\nFACT c();");
    assert_eq!(responses, vec!["[FACT] a()", "[FACT] b()", "[FACT] c()"]);
}
