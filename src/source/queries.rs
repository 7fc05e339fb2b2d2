//! Aggregation pipelines per collection

use serde_json::{json, Value};

/// Collection whose cards nest their payload under `anchorChange` and `metadata`
pub const KENGRAMS: &str = "kengrams";

/// Pipeline that lifts each `anchorChange` entry, then each `metadata`
/// entry, to the top level of the document
pub fn kengrams() -> Vec<Value> {
    vec![
        json!({ "$match": { "anchorChange": { "$exists": true, "$ne": [] } } }),
        json!({ "$unwind": "$anchorChange" }),
        json!({ "$replaceRoot": { "newRoot": { "$mergeObjects": ["$$ROOT", "$anchorChange"] } } }),
        json!({ "$unwind": "$metadata" }),
        json!({ "$replaceRoot": { "newRoot": { "$mergeObjects": ["$$ROOT", "$metadata"] } } }),
    ]
}

/// The pipeline to run against a collection; empty returns every document
pub fn pipeline_for(collection: &str) -> Vec<Value> {
    if collection == KENGRAMS {
        kengrams()
    } else {
        Vec::new()
    }
}
