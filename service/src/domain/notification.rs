use crate::domain::error::PipelineError;
use crate::domain::error::PipelineError::NotificationError;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tracing::warn;

/// Storage change event as delivered by the bucket notification.
#[derive(Debug, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StorageRecord {
    pub s3: StorageEntity,
}

#[derive(Debug, Deserialize)]
pub struct StorageEntity {
    pub bucket: StorageBucket,
    pub object: StorageObject,
}

#[derive(Debug, Deserialize)]
pub struct StorageBucket {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageObject {
    pub key: String,
}

/// One written object, with its key already URL-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub bucket: String,
    pub key: String,
}

impl ChangeNotification {
    pub fn new(bucket: &str, key: &str) -> ChangeNotification {
        ChangeNotification {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<StorageRecord> for ChangeNotification {
    fn from(record: StorageRecord) -> Self {
        ChangeNotification::new(&record.s3.bucket.name, &decode_key(&record.s3.object.key))
    }
}

/// Parses a notification payload into the batch of records it carries.
pub fn parse_batch(body: &[u8]) -> Result<Vec<ChangeNotification>, PipelineError> {
    let event: StorageEvent = serde_json::from_slice(body).map_err(|e| NotificationError {
        reason: e.to_string(),
    })?;
    Ok(event
        .records
        .into_iter()
        .map(ChangeNotification::from)
        .collect())
}

/// Keys arrive form-encoded: `+` is a space and everything else is percent-escaped.
pub fn decode_key(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match percent_decode_str(&plus_decoded).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!(key = raw, error = %e, "Key is not valid UTF-8 once decoded, using it as is");
            raw.to_string()
        }
    }
}
