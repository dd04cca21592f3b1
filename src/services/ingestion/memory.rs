use crate::error::Result;
use crate::events::Event;
use crate::watcher_error;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use super::merge::heartbeat_merge;
use super::transport::{BucketSpec, Transport};

struct StoredBucket {
    kind: String,
    events: Vec<Event>,
}

/// Хранилище в памяти с той же семантикой слияния, что и у aw-server.
/// Используется в dry-run режиме.
#[derive(Default)]
pub struct MemoryTransport {
    buckets: Mutex<HashMap<String, StoredBucket>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Копия событий потока в порядке поступления
    pub fn events(&self, stream_id: &str) -> Vec<Event> {
        self.buckets
            .lock()
            .get(stream_id)
            .map(|bucket| bucket.events.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn create_bucket(&self, bucket: &BucketSpec) -> Result<()> {
        let mut buckets = self.buckets.lock();
        match buckets.get(&bucket.id) {
            Some(existing) if existing.kind != bucket.kind => Err(watcher_error!(
                startup,
                "bucket {} уже существует с типом {}",
                bucket.id,
                existing.kind
            )),
            Some(_) => Ok(()),
            None => {
                info!("[DRY RUN] Создан bucket {} ({})", bucket.id, bucket.kind);
                buckets.insert(
                    bucket.id.clone(),
                    StoredBucket {
                        kind: bucket.kind.clone(),
                        events: Vec::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn post_heartbeat(&self, stream_id: &str, event: &Event, pulsetime: Duration) -> Result<()> {
        let mut buckets = self.buckets.lock();
        let bucket = buckets
            .get_mut(stream_id)
            .ok_or_else(|| watcher_error!(internal, "bucket {} не найден", stream_id))?;

        let merged = bucket
            .events
            .last()
            .and_then(|last| heartbeat_merge(last, event, pulsetime));

        match merged {
            Some(merged) => {
                if let Some(last) = bucket.events.last_mut() {
                    *last = merged;
                }
            }
            None => {
                info!("[DRY RUN] Новое событие в {}: {}", stream_id, event);
                bucket.events.push(event.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPayload;
    use chrono::{TimeZone, Utc};

    fn spec(kind: &str) -> BucketSpec {
        BucketSpec {
            id: "aw-watcher-window_test".to_string(),
            client: "test".to_string(),
            kind: kind.to_string(),
            hostname: "test".to_string(),
        }
    }

    fn event_at(secs: i64, app: &str) -> Event {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs);
        Event::new(ts, EventPayload::new(app, "title"))
    }

    #[tokio::test]
    async fn test_create_bucket_is_idempotent() {
        let transport = MemoryTransport::new();
        transport.create_bucket(&spec("window")).await.unwrap();
        transport.create_bucket(&spec("window")).await.unwrap();
        assert!(transport.create_bucket(&spec("afkstatus")).await.is_err());
    }

    #[tokio::test]
    async fn test_heartbeats_merge_or_insert() {
        let transport = MemoryTransport::new();
        transport.create_bucket(&spec("window")).await.unwrap();
        let pulsetime = Duration::from_secs(5);
        let id = "aw-watcher-window_test";

        transport.post_heartbeat(id, &event_at(0, "foo"), pulsetime).await.unwrap();
        transport.post_heartbeat(id, &event_at(2, "foo"), pulsetime).await.unwrap();
        transport.post_heartbeat(id, &event_at(3, "bar"), pulsetime).await.unwrap();
        transport.post_heartbeat(id, &event_at(20, "bar"), pulsetime).await.unwrap();

        let events = transport.events(id);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].data.app, "foo");
        assert_eq!(events[0].duration, 2.0);
        assert_eq!(events[1].data.app, "bar");
        assert_eq!(events[2].timestamp, event_at(20, "bar").timestamp);
    }

    #[tokio::test]
    async fn test_heartbeat_to_missing_bucket_fails() {
        let transport = MemoryTransport::new();
        let result = transport
            .post_heartbeat("missing", &event_at(0, "foo"), Duration::from_secs(5))
            .await;
        assert!(result.is_err());
    }
}
