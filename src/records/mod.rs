//! Record persistence
//!
//! A [`BlogRecord`] is written once per run and never updated afterwards.
//! Backends report throttling and unavailability as transient
//! [`Error::Write`](crate::Error::Write) failures so the pipeline can retry
//! them; everything else is permanent.
//!
//! ## Backends
//!
//! - [`DynamoRecordStore`]: one `PutItem` per record
//! - [`SqliteRecordStore`]: local `blog_records` table with versioned migrations

use crate::types::BlogRecord;
use async_trait::async_trait;

mod dynamo;
mod sqlite;

pub use dynamo::DynamoRecordStore;
pub use sqlite::SqliteRecordStore;

/// Trait for durable record stores
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Write `record` and return the id it was stored under
    async fn write(&self, record: &BlogRecord) -> crate::Result<String>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests;
