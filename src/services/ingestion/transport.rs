use crate::error::Result;
use crate::events::Event;
use serde::Serialize;
use std::time::Duration;

/// Описание создаваемого потока (bucket-а) в формате aw-server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSpec {
    #[serde(skip)]
    pub id: String,
    pub client: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub hostname: String,
}

/// Wire-level side of the ingestion client: one request per call, no queueing,
/// no local merging.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Must succeed when the bucket already exists with the same kind.
    async fn create_bucket(&self, bucket: &BucketSpec) -> Result<()>;

    /// The server merges the heartbeat with its last stored event using `pulsetime`.
    async fn post_heartbeat(&self, stream_id: &str, event: &Event, pulsetime: Duration) -> Result<()>;
}
