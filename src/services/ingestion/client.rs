use crate::error::Result;
use crate::events::Event;
use crate::debug_if_enabled;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::merge::heartbeat_merge;
use super::queue::RequestQueue;
use super::r#trait::{IngestionClient, CLIENT_NAME};
use super::transport::{BucketSpec, Transport};

/// Клиент ActivityWatch: локальное предслияние heartbeat-ов и очередь коммитов
pub struct ActivityWatchClient {
    transport: Arc<dyn Transport>,
    queue: RequestQueue,
    queue_handle: Mutex<Option<JoinHandle<()>>>,
    // Последний ещё не отправленный heartbeat каждого потока
    pending: DashMap<String, Event>,
    hostname: String,
}

impl ActivityWatchClient {
    /// Должен вызываться внутри tokio runtime: запускает рабочий таск очереди
    pub fn new(transport: Arc<dyn Transport>, hostname: String, cancel: CancellationToken) -> Self {
        let (queue, queue_handle) = RequestQueue::spawn(Arc::clone(&transport), cancel);
        Self {
            transport,
            queue,
            queue_handle: Mutex::new(Some(queue_handle)),
            pending: DashMap::new(),
            hostname,
        }
    }

    /// Дождаться остановки очереди после отмены токена
    pub async fn shutdown(&self) {
        let dropped = self.pending.len();
        if dropped > 0 {
            info!("Неотправленных heartbeat-ов при остановке: {}", dropped);
        }
        let handle = self.queue_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn queue_heartbeat(
        &self,
        stream_id: &str,
        event: Event,
        pulsetime: Duration,
        commit_interval: Duration,
    ) -> Result<()> {
        match self.pending.entry(stream_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(event);
            }
            Entry::Occupied(mut slot) => {
                let held_for = slot.get().duration;
                match heartbeat_merge(slot.get(), &event, pulsetime) {
                    Some(merged) if held_for >= commit_interval.as_secs_f64() => {
                        // Событие копилось дольше commit_interval: фиксируем его и начинаем новое
                        debug_if_enabled!("Коммит по commit_interval: {}", merged);
                        self.queue.push(stream_id, merged, pulsetime)?;
                        slot.insert(event);
                    }
                    Some(merged) => {
                        slot.insert(merged);
                    }
                    None => {
                        let previous = slot.insert(event);
                        debug_if_enabled!("Коммит при смене данных: {}", previous);
                        self.queue.push(stream_id, previous, pulsetime)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl IngestionClient for ActivityWatchClient {
    async fn create_stream(&self, stream_id: &str, event_kind: &str) -> Result<()> {
        let bucket = BucketSpec {
            id: stream_id.to_string(),
            client: CLIENT_NAME.to_string(),
            kind: event_kind.to_string(),
            hostname: self.hostname.clone(),
        };
        self.transport.create_bucket(&bucket).await?;
        info!("Поток {} ({}) готов", stream_id, event_kind);
        Ok(())
    }

    async fn heartbeat(
        &self,
        stream_id: &str,
        event: Event,
        merge_window: Duration,
        queued: bool,
        commit_interval: Duration,
    ) -> Result<()> {
        if queued {
            self.queue_heartbeat(stream_id, event, merge_window, commit_interval)
        } else {
            self.transport.post_heartbeat(stream_id, &event, merge_window).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPayload;
    use crate::services::ingestion::memory::MemoryTransport;
    use crate::services::ingestion::r#trait::EVENT_KIND;
    use chrono::{TimeZone, Utc};

    const STREAM: &str = "aw-watcher-window_test";
    const PULSETIME: Duration = Duration::from_secs(5);
    const COMMIT: Duration = Duration::from_secs(60);

    fn event_at(secs: i64, app: &str) -> Event {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs);
        Event::new(ts, EventPayload::new(app, "title"))
    }

    async fn client() -> (ActivityWatchClient, Arc<MemoryTransport>, CancellationToken) {
        let transport = Arc::new(MemoryTransport::new());
        let cancel = CancellationToken::new();
        let client = ActivityWatchClient::new(transport.clone(), "test".to_string(), cancel.clone());
        client.create_stream(STREAM, EVENT_KIND).await.unwrap();
        (client, transport, cancel)
    }

    /// Дать рабочему таску очереди разобрать канал
    async fn drain() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_identical_heartbeats_stay_local() {
        let (client, transport, cancel) = client().await;

        for secs in 0..10 {
            client
                .heartbeat(STREAM, event_at(secs, "foo"), PULSETIME, true, COMMIT)
                .await
                .unwrap();
        }
        drain().await;

        assert!(transport.events(STREAM).is_empty());
        assert_eq!(client.pending.get(STREAM).unwrap().duration, 9.0);

        cancel.cancel();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_payload_change_commits_previous() {
        let (client, transport, cancel) = client().await;

        client.heartbeat(STREAM, event_at(0, "foo"), PULSETIME, true, COMMIT).await.unwrap();
        client.heartbeat(STREAM, event_at(1, "foo"), PULSETIME, true, COMMIT).await.unwrap();
        client.heartbeat(STREAM, event_at(2, "bar"), PULSETIME, true, COMMIT).await.unwrap();
        drain().await;

        let events = transport.events(STREAM);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data.app, "foo");
        assert_eq!(events[0].duration, 1.0);
        assert_eq!(client.pending.get(STREAM).unwrap().data.app, "bar");

        cancel.cancel();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_long_event_committed_every_commit_interval() {
        let (client, transport, cancel) = client().await;
        let commit = Duration::from_secs(3);

        for secs in 0..=4 {
            client.heartbeat(STREAM, event_at(secs, "foo"), PULSETIME, true, commit).await.unwrap();
        }
        drain().await;

        // На 4-й секунде отложенное событие уже длилось 3 с и было зафиксировано
        let events = transport.events(STREAM);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration, 4.0);
        assert_eq!(client.pending.get(STREAM).unwrap().timestamp, event_at(4, "foo").timestamp);

        cancel.cancel();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_unqueued_heartbeat_is_sent_immediately() {
        let (client, transport, cancel) = client().await;

        client.heartbeat(STREAM, event_at(0, "foo"), PULSETIME, false, COMMIT).await.unwrap();
        client.heartbeat(STREAM, event_at(1, "foo"), PULSETIME, false, COMMIT).await.unwrap();

        let events = transport.events(STREAM);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration, 1.0);

        cancel.cancel();
        client.shutdown().await;
    }
}
