//! Card collections on disk, shaped like exported kengrams documents

use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

/// A temporary export directory; removed when dropped
pub struct CardCorpus {
    pub dir: TempDir,
}

/// Write `documents` to `<root>/<database>/<collection>.json`
pub fn write_collection(dir: &TempDir, database: &str, collection: &str, documents: &[Value]) {
    let db_dir = dir.path().join(database);
    fs::create_dir_all(&db_dir).expect("Failed to create database directory");
    let content = serde_json::to_string_pretty(documents).expect("Failed to serialize documents");
    fs::write(db_dir.join(format!("{}.json", collection)), content)
        .expect("Failed to write collection");
}

/// Two collections in extended JSON: travel concepts in ragDB, politics in nerDB
pub fn card_corpus() -> CardCorpus {
    let dir = TempDir::new().expect("Failed to create temp dir");

    write_collection(
        &dir,
        "ragDB",
        "kengrams",
        &[
            json!({
                "_id": { "$oid": "65a000000000000000000001" },
                "name": "travel",
                "colors": ["Blue", "Red"],
                "retrievalCount": { "$numberInt": "4" },
                "createdAt": { "$date": { "$numberLong": "1704067200000" } },
                "metadata": { "source": "chat", "flavorText": "Roads call" }
            }),
            json!({
                "_id": { "$oid": "65a000000000000000000002" },
                "name": "journey",
                "colors": ["Izzet"],
                "retrievalCount": 2,
                "createdAt": { "$date": "2024-01-01T12:00:00Z" },
                "metadata": { "source": "chat" }
            }),
            json!({
                "_id": { "$oid": "65a000000000000000000003" },
                "name": "voyage",
                "colors": ["blue"],
                "retrievalCount": 1,
                "createdAt": { "$date": "2024-01-02T08:00:00Z" }
            }),
        ],
    );

    write_collection(
        &dir,
        "nerDB",
        "kengrams",
        &[
            json!({
                "_id": { "$oid": "65a000000000000000000004" },
                "name": "democracy",
                "colors": ["White", "Mystery"],
                "retrievalCount": { "$numberLong": "3" },
                "createdAt": { "$date": "2024-01-02T09:00:00Z" }
            }),
            json!({
                "_id": { "$oid": "65a000000000000000000005" },
                "name": "travel",
                "colors": [],
                "createdAt": { "$date": "2024-01-03T10:00:00Z" }
            }),
        ],
    );

    CardCorpus { dir }
}
