// SPDX-License-Identifier: MIT OR Apache-2.0

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use eventflux_pii::core::event::EnrichedEvent;
use eventflux_pii::core::pii::{MutatorRegistry, PiiPseudonymizer};
use serde_json::json;

fn enrichment() -> PiiPseudonymizer<EnrichedEvent> {
    let config = json!({
        "enabled": true,
        "parameters": {
            "pii": [
                {"pojo": {"field": "user_id"}},
                {"pojo": {"field": "user_ipaddress"}},
                {"json": {"field": "contexts", "schemaCriterion": "com.acme/user/jsonschema/1-*-*", "jsonPath": "$..email"}}
            ],
            "strategy": {"pseudonymize": {"hashFunction": "SHA-256"}}
        }
    });
    match PiiPseudonymizer::from_json_value(&config, &MutatorRegistry::enriched_event()) {
        Ok(enrichment) => enrichment,
        Err(e) => panic!("bench configuration rejected: {e}"),
    }
}

fn event(contexts: usize) -> EnrichedEvent {
    let data: Vec<_> = (0..contexts)
        .map(|i| {
            json!({
                "schema": "iglu:com.acme/user/jsonschema/1-0-2",
                "data": {"email": format!("user{i}@acme.com"), "profile": {"email": format!("alt{i}@acme.com")}}
            })
        })
        .collect();
    EnrichedEvent {
        user_id: Some("user-42".to_string()),
        user_ipaddress: Some("203.0.113.7".to_string()),
        contexts: Some(
            json!({
                "schema": "iglu:com.snowplowanalytics.snowplow/contexts/jsonschema/1-0-0",
                "data": data
            })
            .to_string(),
        ),
        ..EnrichedEvent::default()
    }
}

/// Scalar fields plus recursive-descent matches across a growing context array
fn bench_transform(c: &mut Criterion) {
    let enrichment = enrichment();
    for contexts in [1usize, 8, 64] {
        let input = event(contexts);
        c.bench_function(&format!("pii_transform_{contexts}_contexts"), |b| {
            b.iter_batched(
                || input.clone(),
                |mut event| {
                    let _ = enrichment.transform(&mut event);
                    black_box(event)
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(transform_benches, bench_transform);
criterion_main!(transform_benches);
