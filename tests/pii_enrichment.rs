// SPDX-License-Identifier: MIT OR Apache-2.0

use eventflux_pii::core::config::PiiEnrichmentConfig;
use eventflux_pii::core::event::EnrichedEvent;
use eventflux_pii::core::pii::{
    AuditRecord, HashFunction, ModifiedField, MutatorRegistry, PiiPseudonymizer, PiiStrategy,
    PII_TRANSFORMATION_SCHEMA,
};
use eventflux_pii::PiiError;
use serde_json::{json, Value as JsonValue};
use std::io::Write;

const EXAMPLE_SCHEMA: &str = "iglu:com.acme/example/jsonschema/1-0-0";
const CONTEXTS_SCHEMA: &str = "iglu:com.snowplowanalytics.snowplow/contexts/jsonschema/1-0-0";

fn registry() -> MutatorRegistry<EnrichedEvent> {
    MutatorRegistry::enriched_event()
}

fn config(enabled: bool, pii: JsonValue) -> JsonValue {
    json!({
        "schema": "iglu:com.snowplowanalytics.snowplow.enrichments/pii_enrichment_config/jsonschema/2-0-0",
        "data": {
            "enabled": enabled,
            "emitIdentificationEvent": true,
            "parameters": {
                "pii": pii,
                "strategy": {"pseudonymize": {"hashFunction": "SHA-256"}}
            }
        }
    })
}

fn enrichment(pii: JsonValue) -> PiiPseudonymizer<EnrichedEvent> {
    PiiPseudonymizer::from_json_value(&config(true, pii), &registry()).unwrap()
}

fn sha256(s: &str) -> String {
    PiiStrategy::pseudonymize(HashFunction::Sha256).scramble(s)
}

fn example_entry(path: &str) -> JsonValue {
    json!({"json": {"field": "contexts", "schemaCriterion": "com.acme/example/jsonschema/1-0-0", "jsonPath": path}})
}

fn audit(event: &EnrichedEvent) -> AuditRecord {
    AuditRecord::from_json(event.pii.as_deref().unwrap()).unwrap()
}

#[test]
fn scramble_is_deterministic_with_fixed_width() {
    for hash_function in HashFunction::ALL {
        let strategy = PiiStrategy::pseudonymize(hash_function);
        let long = "x".repeat(1000);
        for input in ["", "a", "1.2.3.4", "ünïcödé", long.as_str()] {
            let first = strategy.scramble(input);
            assert_eq!(first, strategy.scramble(input));
            assert_eq!(first.len(), hash_function.digest_len() * 2, "{hash_function}");
            assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}

#[test]
fn disabled_configuration_resolves_no_fields() {
    let pii = json!([
        {"pojo": {"field": "user_id"}},
        {"pojo": {"field": "user_ipaddress"}},
        example_entry("$.userId")
    ]);
    let resolved = PiiEnrichmentConfig::from_json_value(&config(false, pii), &registry()).unwrap();
    assert!(resolved.fields.is_empty());
    assert_eq!(resolved.strategy, PiiStrategy::pseudonymize(HashFunction::Sha256));

    let enrichment = PiiPseudonymizer::new(resolved);
    let mut event = EnrichedEvent {
        user_id: Some("alice".to_string()),
        ..EnrichedEvent::default()
    };
    enrichment.transform(&mut event).unwrap();
    assert_eq!(event.user_id.as_deref(), Some("alice"));
    assert_eq!(event.pii, None);
}

#[test]
fn null_scalar_is_left_alone() {
    let enrichment = enrichment(json!([{"pojo": {"field": "user_fingerprint"}}]));
    let mut event: EnrichedEvent =
        serde_json::from_str(r#"{"user_fingerprint": null, "app_id": "shop"}"#).unwrap();
    let before = event.clone();
    enrichment.transform(&mut event).unwrap();
    assert_eq!(event, before);
    assert_eq!(event.pii, None);
}

#[test]
fn scalar_ip_address_is_scrambled_and_audited() {
    let enrichment = enrichment(json!([{"pojo": {"field": "user_ipaddress"}}]));
    let mut event = EnrichedEvent {
        user_ipaddress: Some("1.2.3.4".to_string()),
        ..EnrichedEvent::default()
    };
    enrichment.transform(&mut event).unwrap();

    let expected = sha256("1.2.3.4");
    assert_eq!(event.user_ipaddress.as_deref(), Some(expected.as_str()));

    let record = audit(&event);
    assert_eq!(record.fields.len(), 1);
    match &record.fields[0] {
        ModifiedField::Scalar(f) => {
            assert_eq!(f.field_name, "user_ipaddress");
            assert_eq!(f.original_value, "1.2.3.4");
            assert_eq!(f.modified_value, expected);
        }
        other => panic!("expected a scalar entry, got {:?}", other),
    }
}

#[test]
fn matching_context_value_is_scrambled() {
    let enrichment = enrichment(json!([example_entry("$.userId")]));
    let contexts = json!({
        "schema": CONTEXTS_SCHEMA,
        "data": [{"schema": EXAMPLE_SCHEMA, "data": {"userId": "abc", "plan": "pro"}}]
    });
    let mut event = EnrichedEvent {
        contexts: Some(contexts.to_string()),
        ..EnrichedEvent::default()
    };
    enrichment.transform(&mut event).unwrap();

    let out: JsonValue = serde_json::from_str(event.contexts.as_deref().unwrap()).unwrap();
    assert_eq!(out["data"][0]["data"]["userId"], sha256("abc"));
    assert_eq!(out["data"][0]["data"]["plan"], "pro");

    let record = audit(&event);
    assert_eq!(record.fields.len(), 1);
    match &record.fields[0] {
        ModifiedField::Json(f) => {
            assert_eq!(f.field_name, "contexts");
            assert_eq!(f.original_value, "abc");
            assert_eq!(f.modified_value, sha256("abc"));
            assert_eq!(f.json_path, "$.userId");
            assert_eq!(f.schema, EXAMPLE_SCHEMA);
        }
        other => panic!("expected a JSON entry, got {:?}", other),
    }
}

#[test]
fn non_matching_context_is_byte_for_byte_unchanged() {
    let enrichment = enrichment(json!([example_entry("$.userId")]));
    // Spacing that a re-serialization would not reproduce.
    let raw = r#"{ "schema" : "iglu:com.snowplowanalytics.snowplow/contexts/jsonschema/1-0-0", "data" : [ { "schema" : "iglu:com.acme/example/jsonschema/2-0-0", "data" : { "userId" : "abc" } } ] }"#;
    let mut event = EnrichedEvent {
        contexts: Some(raw.to_string()),
        ..EnrichedEvent::default()
    };
    enrichment.transform(&mut event).unwrap();
    assert_eq!(event.contexts.as_deref(), Some(raw));
    assert_eq!(event.pii, None);
}

#[test]
fn every_array_element_is_scrambled_in_order() {
    let enrichment = enrichment(json!([
        {"json": {"field": "unstruct_event", "schemaCriterion": "com.acme/example/jsonschema/1-*-*", "jsonPath": "$.emails"}}
    ]));
    let emails = ["a@acme.com", "b@acme.com", "c@acme.com"];
    let unstruct = json!({
        "schema": "iglu:com.snowplowanalytics.snowplow/unstruct_event/jsonschema/1-0-0",
        "data": {"schema": EXAMPLE_SCHEMA, "data": {"emails": emails}}
    });

    let mut event = EnrichedEvent {
        unstruct_event: Some(unstruct.to_string()),
        ..EnrichedEvent::default()
    };
    enrichment.transform(&mut event).unwrap();

    let out: JsonValue = serde_json::from_str(event.unstruct_event.as_deref().unwrap()).unwrap();
    let expected: Vec<String> = emails.iter().map(|e| sha256(e)).collect();
    assert_eq!(out["data"]["data"]["emails"], json!(expected));

    let record = audit(&event);
    let originals: Vec<&str> = record.fields.iter().map(|f| f.original_value()).collect();
    assert_eq!(originals, emails);
    let modified: Vec<&str> = record.fields.iter().map(|f| f.modified_value()).collect();
    assert_eq!(modified, expected);
}

#[test]
fn audit_record_round_trips() {
    let enrichment = enrichment(json!([
        example_entry("$.userId"),
        {"pojo": {"field": "user_id"}},
        example_entry("$.tags[*]"),
        {"pojo": {"field": "network_userid"}}
    ]));
    let contexts = json!({
        "schema": CONTEXTS_SCHEMA,
        "data": [{"schema": EXAMPLE_SCHEMA, "data": {"userId": "abc", "tags": ["t1", "t2"]}}]
    });
    let mut event = EnrichedEvent {
        user_id: Some("alice".to_string()),
        network_userid: Some("nu-1".to_string()),
        contexts: Some(contexts.to_string()),
        ..EnrichedEvent::default()
    };
    enrichment.transform(&mut event).unwrap();

    let raw = event.pii.clone().unwrap();
    let document: JsonValue = serde_json::from_str(&raw).unwrap();
    assert_eq!(document["schema"], PII_TRANSFORMATION_SCHEMA);
    assert_eq!(
        document["data"]["strategy"],
        json!({"pseudonymize": {"hashFunction": "SHA-256"}})
    );

    let parsed = AuditRecord::from_json(&raw).unwrap();
    assert_eq!(parsed.strategy, *enrichment.strategy());
    assert_eq!(parsed.to_json(), raw);
    let (pojo, json) = parsed.grouped();
    assert_eq!(pojo.len(), 2);
    assert_eq!(json.len(), 3);
    assert_eq!(json[2].json_path, "$.tags[*]");
}

#[test]
fn malformed_context_fails_without_mutating_the_event() {
    let enrichment = enrichment(json!([
        {"pojo": {"field": "user_id"}},
        {"json": {"field": "derived_contexts", "schemaCriterion": "com.acme/example/jsonschema/1-0-0", "jsonPath": "$.userId"}},
        {"pojo": {"field": "domain_userid"}}
    ]));
    let mut event = EnrichedEvent {
        user_id: Some("alice".to_string()),
        domain_userid: Some("d-1".to_string()),
        derived_contexts: Some("{\"schema\": \"iglu:".to_string()),
        ..EnrichedEvent::default()
    };
    let before = event.clone();

    let err = enrichment.transform(&mut event).unwrap_err();
    assert_eq!(err.event_field(), Some("derived_contexts"));
    assert!(matches!(err, PiiError::MalformedEventField { .. }));
    assert_eq!(event, before);
}

#[test]
fn configuration_problems_are_reported_together() {
    let raw = json!({
        "enabled": true,
        "parameters": {
            "pii": [
                {"pojo": {"field": "favourite_colour"}},
                {"json": {"field": "contexts", "schemaCriterion": "com.acme/example", "jsonPath": "$.userId"}},
                {"json": {"field": "contexts", "schemaCriterion": "com.acme/example/jsonschema/1-0-0"}}
            ],
            "strategy": {"pseudonymize": {"hashFunction": "WHIRLPOOL"}}
        }
    });
    let err = PiiPseudonymizer::from_json_value(&raw, &registry()).unwrap_err();
    assert_eq!(err.problems().len(), 4);
    let message = err.to_string();
    assert!(message.contains("WHIRLPOOL"));
    assert!(message.contains("favourite_colour"));
    assert!(message.contains("com.acme/example"));
    assert!(message.contains("jsonPath"));
}

#[test]
fn yaml_configuration_drives_the_enrichment() {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    write!(
        file,
        r#"
enabled: true
emitIdentificationEvent: true
parameters:
  pii:
    - pojo:
        field: user_id
  strategy:
    pseudonymize:
      hashFunction: MD5
"#
    )
    .unwrap();

    let enrichment = PiiPseudonymizer::from_file(file.path(), &registry()).unwrap();
    let mut event = EnrichedEvent {
        user_id: Some("alice".to_string()),
        ..EnrichedEvent::default()
    };
    enrichment.transform(&mut event).unwrap();
    assert_eq!(event.user_id.as_deref().map(str::len), Some(32));

    let identification = enrichment.identification_event(&event).unwrap();
    assert_eq!(
        identification["data"]["strategy"]["pseudonymize"]["hashFunction"],
        "MD5"
    );
}

#[test]
fn shared_enrichment_transforms_in_parallel() {
    use rayon::prelude::*;

    let enrichment = enrichment(json!([{"pojo": {"field": "user_id"}}]));
    let mut events: Vec<EnrichedEvent> = (0..64)
        .map(|i| EnrichedEvent {
            user_id: Some(format!("user-{i}")),
            ..EnrichedEvent::default()
        })
        .collect();

    events
        .par_iter_mut()
        .try_for_each(|event| enrichment.transform(event))
        .unwrap();

    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.user_id, Some(sha256(&format!("user-{i}"))));
        assert_eq!(audit(event).fields.len(), 1);
    }
}

#[test]
fn sibling_numbers_survive_a_context_rewrite() {
    let enrichment = enrichment(json!([example_entry("$.userId")]));
    let raw = format!(
        r#"{{"schema":"{}","data":[{{"schema":"{}","data":{{"userId":"abc","orderTotal":123456789012345678901234567890,"price":0.12345678901234567890123}}}}]}}"#,
        CONTEXTS_SCHEMA, EXAMPLE_SCHEMA
    );
    let mut event = EnrichedEvent {
        contexts: Some(raw),
        ..EnrichedEvent::default()
    };
    enrichment.transform(&mut event).unwrap();

    let contexts = event.contexts.as_deref().unwrap();
    assert!(contexts.contains(&sha256("abc")));
    assert!(contexts.contains(r#""orderTotal":123456789012345678901234567890"#), "{contexts}");
    assert!(contexts.contains(r#""price":0.12345678901234567890123"#), "{contexts}");
}
