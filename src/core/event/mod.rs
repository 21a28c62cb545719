// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Enriched Event Model
//!
//! A host-side event record carrying the common enriched pipeline attributes, and
//! the mutator registry exposing them to the PII enrichment.
//!
//! Every attribute is an optional string. JSON attributes (`contexts`,
//! `derived_contexts`, `unstruct_event`) hold serialized self-describing documents.
//! Attributes this model does not name are kept in `other` so that reading and
//! writing an event preserves them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::core::pii::field::{FieldMutator, MutatorRegistry};

macro_rules! enriched_event {
    (
        scalar: [$($scalar:ident),* $(,)?],
        json: [$($json:ident),* $(,)?],
        audit: $audit:ident $(,)?
    ) => {
        /// Enriched event attributes, as read from and written to JSON lines
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct EnrichedEvent {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $scalar: Option<String>,
            )*
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $json: Option<String>,
            )*
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub $audit: Option<String>,
            #[serde(flatten)]
            pub other: Map<String, JsonValue>,
        }

        /// Scalar attributes a `pojo` entry may name
        pub const SCALAR_FIELDS: &[&str] = &[$(stringify!($scalar)),*];

        /// JSON attributes a `json` entry may name
        pub const JSON_FIELDS: &[&str] = &[$(stringify!($json)),*];

        /// Attribute receiving the audit record
        pub const AUDIT_FIELD: &str = stringify!($audit);

        impl MutatorRegistry<EnrichedEvent> {
            /// Registry exposing every [`EnrichedEvent`] attribute
            pub fn enriched_event() -> Self {
                let mut registry = MutatorRegistry::new(FieldMutator::<EnrichedEvent>::new(
                    |e| e.$audit.as_deref(),
                    |e, v| e.$audit = v,
                ));
                $(
                    registry.register_scalar(
                        stringify!($scalar),
                        FieldMutator::<EnrichedEvent>::new(|e| e.$scalar.as_deref(), |e, v| e.$scalar = v),
                    );
                )*
                $(
                    registry.register_json(
                        stringify!($json),
                        FieldMutator::<EnrichedEvent>::new(|e| e.$json.as_deref(), |e, v| e.$json = v),
                    );
                )*
                registry
            }
        }
    };
}

enriched_event! {
    scalar: [
        user_id,
        user_ipaddress,
        user_fingerprint,
        domain_userid,
        domain_sessionid,
        network_userid,
        ip_organization,
        ip_domain,
        tr_orderid,
        ti_orderid,
        mkt_term,
        mkt_content,
        mkt_clickid,
        se_category,
        se_action,
        se_label,
        se_property,
        refr_domain_userid,
    ],
    json: [contexts, derived_contexts, unstruct_event],
    audit: pii,
}
