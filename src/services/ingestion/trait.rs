use crate::error::Result;
use crate::events::Event;
use std::time::Duration;
use sysinfo::System;

/// Prefix of the stream (bucket) id; the host name is appended to it
pub const STREAM_PREFIX: &str = "aw-watcher-window";

/// Event kind the stream is created with
pub const EVENT_KIND: &str = "window";

/// Client name reported to the server when a stream is created
pub const CLIENT_NAME: &str = "aw-watcher-windowpath";

/// Deterministic stream id, so that restarts keep writing into the same stream
pub fn stream_id(hostname: &str) -> String {
    format!("{}_{}", STREAM_PREFIX, hostname)
}

pub fn local_hostname() -> String {
    System::host_name().unwrap_or_else(|| "unknown".to_string())
}

/// Contract of the telemetry ingestion service driven by the sampling loop.
#[async_trait::async_trait]
pub trait IngestionClient: Send + Sync {
    /// Create the stream if it does not exist yet. Idempotent.
    async fn create_stream(&self, stream_id: &str, event_kind: &str) -> Result<()>;

    /// Send a heartbeat.
    ///
    /// Identical payloads arriving within `merge_window` of the end of the last
    /// stored event extend that event instead of creating a new record. With
    /// `queued` the client pre-merges locally and commits to the server at most
    /// once per `commit_interval`, keeping arrival order; without it the
    /// heartbeat is sent synchronously.
    async fn heartbeat(
        &self,
        stream_id: &str,
        event: Event,
        merge_window: Duration,
        queued: bool,
        commit_interval: Duration,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_is_deterministic() {
        assert_eq!(stream_id("workstation"), "aw-watcher-window_workstation");
        assert_eq!(stream_id("workstation"), stream_id("workstation"));
    }

    #[test]
    fn test_local_hostname_is_not_empty() {
        assert!(!local_hostname().is_empty());
    }
}
