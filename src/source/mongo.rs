//! MongoDB-backed record source (sync driver)

use super::queries::pipeline_for;
use super::{to_record, RecordSource, SourceError, SourceResult};
use crate::aggregate::Table;
use mongodb::bson::{self, Bson, Document};
use mongodb::sync::Client;
use tracing::info;

/// An open connection, created once at startup and passed to whoever fetches.
///
/// `close` shuts the client down; dropping it only releases the handle.
pub struct MongoSource {
    client: Client,
}

impl MongoSource {
    pub fn connect(uri: &str) -> SourceResult<Self> {
        let client = Client::with_uri_str(uri).map_err(|e| SourceError::Database(e.to_string()))?;
        info!("MongoDB client created");
        Ok(Self { client })
    }

    /// Shut the client down, waiting for its pooled connections to close
    pub fn close(self) {
        self.client.shutdown();
        info!("MongoDB connection closed");
    }
}

impl RecordSource for MongoSource {
    fn fetch(&self, database: &str, collection: &str) -> SourceResult<Table> {
        info!(database, collection, "fetching from MongoDB");

        let pipeline = pipeline_for(collection)
            .iter()
            .map(bson::to_document)
            .collect::<Result<Vec<Document>, _>>()
            .map_err(|e| SourceError::Database(e.to_string()))?;

        let cursor = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .aggregate(pipeline, None)
            .map_err(|e| SourceError::Database(e.to_string()))?;

        let mut rows = Vec::new();
        for document in cursor {
            let document = document.map_err(|e| SourceError::Database(e.to_string()))?;
            let json = Bson::Document(document).into_relaxed_extjson();
            rows.push(to_record(collection, json)?);
        }

        info!(collection, rows = rows.len(), "retrieved records");
        Ok(Table::new(rows))
    }
}
