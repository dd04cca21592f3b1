use crate::error::Result;
use crate::events::Event;
use crate::watcher_error;
use crate::{debug_if_enabled, trace_if_enabled};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::transport::Transport;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct QueuedHeartbeat {
    stream_id: String,
    event: Event,
    pulsetime: Duration,
}

/// Упорядоченная очередь коммитов на сервер.
///
/// Один рабочий таск отправляет heartbeat-ы строго по одному в порядке
/// поступления. Ошибки соединения повторяются с экспоненциальной задержкой,
/// пока запрос не пройдёт, так что следующий элемент никогда не обгоняет
/// предыдущий. При отмене очередь останавливается без досылки хвоста.
pub struct RequestQueue {
    sender: mpsc::UnboundedSender<QueuedHeartbeat>,
}

impl RequestQueue {
    pub fn spawn(transport: Arc<dyn Transport>, cancel: CancellationToken) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(worker(receiver, transport, cancel));
        (Self { sender }, handle)
    }

    pub fn push(&self, stream_id: &str, event: Event, pulsetime: Duration) -> Result<()> {
        self.sender
            .send(QueuedHeartbeat {
                stream_id: stream_id.to_string(),
                event,
                pulsetime,
            })
            .map_err(|_| watcher_error!(service_unavailable, "очередь отправки остановлена"))
    }
}

async fn worker(
    mut receiver: mpsc::UnboundedReceiver<QueuedHeartbeat>,
    transport: Arc<dyn Transport>,
    cancel: CancellationToken,
) {
    info!("Очередь отправки heartbeat-ов запущена");

    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            item = receiver.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };

        if !deliver(&item, transport.as_ref(), &cancel).await {
            break;
        }
    }

    info!("Очередь отправки heartbeat-ов остановлена");
}

/// `false`, если доставку прервала отмена
async fn deliver(item: &QueuedHeartbeat, transport: &dyn Transport, cancel: &CancellationToken) -> bool {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match transport
            .post_heartbeat(&item.stream_id, &item.event, item.pulsetime)
            .await
        {
            Ok(()) => {
                debug_if_enabled!("Heartbeat отправлен в {}: {}", item.stream_id, item.event);
                return true;
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    "Не удалось отправить heartbeat ({}), повтор через {:?}",
                    e, backoff
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return false,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
                trace_if_enabled!("Следующая задержка повтора: {:?}", backoff);
            }
            Err(e) => {
                error!("Heartbeat отброшен, сервер отклонил запрос: {}", e);
                return true;
            }
        }
    }
}
