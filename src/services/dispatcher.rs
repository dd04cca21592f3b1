use crate::error::Result;
use crate::events::Event;
use std::sync::Arc;
use std::time::Duration;

use super::ingestion::IngestionClient;

/// Тонкая обёртка над клиентом приёма: всегда queued heartbeat в один поток
pub struct Dispatcher {
    client: Arc<dyn IngestionClient>,
    stream_id: String,
    merge_window: Duration,
    commit_interval: Duration,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn IngestionClient>,
        stream_id: String,
        merge_window: Duration,
        commit_interval: Duration,
    ) -> Self {
        Self {
            client,
            stream_id,
            merge_window,
            commit_interval,
        }
    }

    /// Без собственных повторов: за retry/backoff отвечает клиент
    pub async fn dispatch(&self, event: Event) -> Result<()> {
        self.dispatch_with(event, self.merge_window, self.commit_interval)
            .await
    }

    pub async fn dispatch_with(
        &self,
        event: Event,
        merge_window: Duration,
        commit_interval: Duration,
    ) -> Result<()> {
        self.client
            .heartbeat(&self.stream_id, event, merge_window, true, commit_interval)
            .await
    }
}
