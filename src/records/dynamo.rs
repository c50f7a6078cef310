//! DynamoDB record store

use super::RecordStore;
use crate::config::DynamoConfig;
use crate::error::{Error, Result};
use crate::types::BlogRecord;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

/// Error codes DynamoDB uses for throttling and temporary unavailability
const TRANSIENT_CODES: &[&str] = &[
    "ThrottlingException",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "InternalServerError",
    "ServiceUnavailable",
    "ServiceUnavailableException",
];

/// Record store backed by a DynamoDB table keyed on `id`
///
/// Records are written with an unconditional `PutItem`, so repeating a write
/// after an ambiguous failure stores the same item again.
#[derive(Clone, Debug)]
pub struct DynamoRecordStore {
    client: Client,
    table_name: String,
}

impl DynamoRecordStore {
    /// Create a store from configuration, loading AWS settings from the environment
    pub async fn new(config: &DynamoConfig) -> Self {
        let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;
        Self::with_client(Client::new(&aws_config), config.table_name.clone())
    }

    /// Create a store around an existing client
    pub fn with_client(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn write(&self, record: &BlogRecord) -> Result<String> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_item(record)))
            .send()
            .await
            .map_err(|e| Error::Write {
                id: record.id.clone(),
                transient: is_transient(&e),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(table = %self.table_name, id = %record.id, "record stored");
        Ok(record.id.clone())
    }

    fn name(&self) -> &'static str {
        "dynamodb"
    }
}

/// Whether a `PutItem` failure is worth retrying
pub(crate) fn is_transient<R>(err: &SdkError<PutItemError, R>) -> bool {
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(ctx) => {
            let e = ctx.err();
            matches!(
                e,
                PutItemError::ProvisionedThroughputExceededException(_)
                    | PutItemError::RequestLimitExceeded(_)
                    | PutItemError::InternalServerError(_)
            ) || e.code().is_some_and(|code| TRANSIENT_CODES.contains(&code))
        }
        _ => false,
    }
}

/// Attribute map for a record
pub(crate) fn record_item(record: &BlogRecord) -> HashMap<String, AttributeValue> {
    let s = |v: &str| AttributeValue::S(v.to_string());
    let list = |items: &[String]| AttributeValue::L(items.iter().map(|i| s(i)).collect());

    HashMap::from([
        ("id".to_string(), s(&record.id)),
        ("slug".to_string(), s(&record.slug)),
        ("title".to_string(), s(&record.title)),
        ("content".to_string(), s(&record.body)),
        ("description".to_string(), s(&record.description)),
        ("keywords".to_string(), list(&record.keywords)),
        ("keyword".to_string(), s(&record.keyword)),
        ("tags".to_string(), list(&record.tags)),
        ("image_urls".to_string(), list(&record.image_urls)),
        ("author".to_string(), s(&record.author)),
        ("avatar".to_string(), s(&record.avatar)),
        ("color".to_string(), s(&record.color)),
        ("org".to_string(), s(&record.org)),
        ("card".to_string(), s(&record.card)),
        ("cover".to_string(), s(&record.cover)),
        ("status".to_string(), s(record.status.as_str())),
        ("published".to_string(), AttributeValue::Bool(record.published)),
        ("created_at".to_string(), s(&record.created_at.to_rfc3339())),
        ("updated_at".to_string(), s(&record.updated_at.to_rfc3339())),
    ])
}
