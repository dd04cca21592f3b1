use crate::debug_if_enabled;
use crate::events::{Event, EventPayload};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::change_detector::should_dispatch;
use super::dispatcher::Dispatcher;
use super::normalizer::normalize;
use super::window_inspector::WindowInspector;

/// Единственное долгоживущее изменяемое состояние цикла
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopState {
    pub last_dispatched_payload: Option<EventPayload>,
}

/// Итог одного тика
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Инспектор ничего не вернул, нормализация и отправка не выполнялись
    Skipped,
    /// Инспектор вернул ошибку
    InspectorFailed,
    /// Heartbeat передан клиенту; `new` — вердикт детектора изменений
    Dispatched { new: bool },
    /// Клиент вернул ошибку; состояние всё равно обновлено по вердикту
    DispatchFailed { new: bool },
}

/// Цикл опроса активного окна.
///
/// Однопоточный: инспектор и отправка выполняются последовательно внутри тика,
/// так что медленная отправка задерживает следующий опрос. Опрос инспектора
/// блокирующий и уходит в пул `spawn_blocking`, воркеры runtime остаются
/// свободны для очереди отправки и обработчика сигналов. Ошибки тика только
/// логируются; завершить цикл может лишь отмена токена.
pub struct SamplingLoop {
    inspector: Arc<dyn WindowInspector>,
    dispatcher: Dispatcher,
    interval: Duration,
    state: LoopState,
    last_capture: Option<DateTime<Utc>>,
}

impl SamplingLoop {
    pub fn new(inspector: Arc<dyn WindowInspector>, dispatcher: Dispatcher, interval: Duration) -> Self {
        Self {
            inspector,
            dispatcher,
            interval,
            state: LoopState::default(),
            last_capture: None,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Цикл опроса запущен (инспектор: {}, интервал: {:?})",
            self.inspector.name(),
            self.interval
        );

        let mut ticks: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let outcome = self.tick().await;
            ticks += 1;
            debug_if_enabled!("Тик #{}: {:?}", ticks, outcome);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Цикл опроса остановлен после {} тиков", ticks);
    }

    pub async fn tick(&mut self) -> TickOutcome {
        let inspector = Arc::clone(&self.inspector);
        let observation = match tokio::task::spawn_blocking(move || inspector.poll()).await {
            Ok(Ok(Some(observation))) => observation,
            Ok(Ok(None)) => return TickOutcome::Skipped,
            Ok(Err(e)) => {
                warn!("Не удалось получить активное окно: {}", e);
                return TickOutcome::InspectorFailed;
            }
            Err(e) => {
                warn!("Опрос инспектора завершился аварийно: {}", e);
                return TickOutcome::InspectorFailed;
            }
        };

        let payload = normalize(&observation);
        let new = should_dispatch(&payload, self.state.last_dispatched_payload.as_ref());
        if new {
            info!("Активное окно: {}", payload);
        }

        // Отправляем каждый тик: продлением событий по pulsetime управляет клиент
        let event = Event::new(self.capture_time(), payload.clone());
        let result = self.dispatcher.dispatch(event).await;

        if new {
            self.state.last_dispatched_payload = Some(payload);
        }

        match result {
            Ok(()) => TickOutcome::Dispatched { new },
            Err(e) => {
                warn!("Не удалось отправить heartbeat: {}", e);
                TickOutcome::DispatchFailed { new }
            }
        }
    }

    /// Время захвата, не убывающее между тиками даже при переводе системных часов назад
    fn capture_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_capture {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_capture = Some(timestamp);
        timestamp
    }
}
