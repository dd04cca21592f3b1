use crate::config::ServerConfig;
use crate::error::{Result, WatcherError};
use crate::events::Event;
use crate::watcher_error;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info};

use super::transport::{BucketSpec, Transport};

/// REST-клиент aw-server (`/api/0`)
pub struct AwServerTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl AwServerTransport {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url())
            .map_err(|e| watcher_error!(internal, "неверный адрес сервера {}: {}", config.base_url(), e))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(5)))
            .pool_max_idle_per_host(2)
            .build()?;

        info!("aw-server: {}", base_url);
        Ok(Self { client, base_url })
    }

    fn bucket_url(&self, stream_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| watcher_error!(internal, "адрес сервера не поддерживает пути"))?
            .pop_if_empty()
            .push("buckets")
            .push(stream_id);
        Ok(url)
    }

    fn heartbeat_url(&self, stream_id: &str, pulsetime: Duration) -> Result<Url> {
        let mut url = self.bucket_url(stream_id)?;
        url.path_segments_mut()
            .map_err(|_| watcher_error!(internal, "адрес сервера не поддерживает пути"))?
            .push("heartbeat");
        url.query_pairs_mut()
            .append_pair("pulsetime", &pulsetime.as_secs_f64().to_string());
        Ok(url)
    }
}

async fn status_error(response: reqwest::Response) -> WatcherError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    WatcherError::ServerStatus { status, body }
}

#[async_trait::async_trait]
impl Transport for AwServerTransport {
    async fn create_bucket(&self, bucket: &BucketSpec) -> Result<()> {
        let url = self.bucket_url(&bucket.id)?;
        let response = self.client.post(url).json(bucket).send().await?;

        // 304 означает, что bucket уже существует
        if response.status().is_success() || response.status() == StatusCode::NOT_MODIFIED {
            debug!("Bucket {} готов (статус {})", bucket.id, response.status());
            return Ok(());
        }

        Err(status_error(response).await)
    }

    async fn post_heartbeat(&self, stream_id: &str, event: &Event, pulsetime: Duration) -> Result<()> {
        let url = self.heartbeat_url(stream_id, pulsetime)?;
        let response = self.client.post(url).json(event).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(status_error(response).await)
    }
}
