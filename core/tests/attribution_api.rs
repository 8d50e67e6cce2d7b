//! Tests for scoring-service response classification and request shape.
//!
//! The classification table is a design contract: every documented status
//! arm plus a logged catch-all. Classification is pure, so these tests need
//! no network.

use attribution_core::{
    attribution::{AttributionClient, AttributionResult},
    config::RedistributionParameter,
    journeys::JourneyRecord,
    PipelineError,
};

fn sample_journey() -> JourneyRecord {
    JourneyRecord {
        conversion_id: "c-1".into(),
        session_id: "s-1".into(),
        timestamp: "2024-01-01 09:00:00".into(),
        channel_label: "Direct Traffic".into(),
        holder_engagement: 1,
        closer_engagement: 0,
        conversion: 0,
        impression_interaction: 0,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Full success
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn full_success_returns_the_parsed_payload() {
    let body = r#"{"value": [
        {"conversion_id": "c-1", "session_id": "s-1", "ihc": 0.4},
        {"conversion_id": "c-1", "session_id": "s-2", "ihc": 0.6}
    ]}"#;
    let outcome = AttributionClient::classify_response(200, body).unwrap();
    assert_eq!(
        outcome,
        Some(vec![
            AttributionResult {
                conversion_id: "c-1".into(),
                session_id: "s-1".into(),
                ihc: 0.4,
            },
            AttributionResult {
                conversion_id: "c-1".into(),
                session_id: "s-2".into(),
                ihc: 0.6,
            },
        ])
    );
}

#[test]
fn unknown_credit_fields_are_ignored() {
    let body = r#"{"value": [
        {"conversion_id": "c-1", "session_id": "s-1", "ihc": 1.0,
         "initializer": 0.2, "holder": 0.5, "closer": 0.3}
    ]}"#;
    let outcome = AttributionClient::classify_response(200, body).unwrap();
    assert_eq!(outcome.unwrap().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Classified failures: logged, chunk lost, no exception
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn partial_success_is_classified_as_lost() {
    let body = r#"{"partialFailureErrors": [{"conversion_id": "c-9"}]}"#;
    let outcome = AttributionClient::classify_response(206, body).unwrap();
    assert!(outcome.is_none());
}

#[test]
fn client_and_server_errors_are_classified_as_lost() {
    for status in [400, 406, 500] {
        let outcome = AttributionClient::classify_response(status, "{}").unwrap();
        assert!(outcome.is_none(), "status {status} must classify as a lost chunk");
    }
}

#[test]
fn unclassified_statuses_are_logged_and_lost() {
    let outcome = AttributionClient::classify_response(418, "teapot").unwrap();
    assert!(outcome.is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Malformed 200 bodies propagate
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn garbled_success_body_propagates() {
    let result = AttributionClient::classify_response(200, "not json at all");
    assert!(
        matches!(result, Err(PipelineError::MalformedPayload(_))),
        "a garbled 200 body is fatal, got {result:?}"
    );

    let result = AttributionClient::classify_response(200, r#"{"wrong_key": []}"#);
    assert!(matches!(result, Err(PipelineError::MalformedPayload(_))));
}

// ─────────────────────────────────────────────────────────────────────────────
// Request shape
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn journey_flags_serialize_as_integers() {
    let body = serde_json::to_value(sample_journey()).unwrap();
    assert_eq!(body["holder_engagement"], serde_json::json!(1));
    assert_eq!(body["closer_engagement"], serde_json::json!(0));
    assert_eq!(body["conversion"], serde_json::json!(0));
    assert_eq!(body["impression_interaction"], serde_json::json!(0));
}

#[test]
fn default_redistribution_carries_every_role() {
    let params = serde_json::to_value(RedistributionParameter::default()).unwrap();
    for role in ["initializer", "holder", "closer"] {
        assert!(
            params[role].is_object(),
            "role '{role}' must be present in a well-formed request"
        );
        assert!(params[role]["direction"].is_string());
        assert!(params[role]["redistribution_channel_labels"].is_array());
    }
    assert_eq!(params["initializer"]["direction"], "earlier_sessions_only");
    assert_eq!(params["holder"]["direction"], "any_session");
    assert_eq!(params["closer"]["direction"], "later_sessions_only");
    assert_eq!(params["closer"]["receive_threshold"], serde_json::json!(0.1));
}
