use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Данные события окна в формате ActivityWatch (`data` в JSON)
///
/// Сравнение строго структурное: без нормализации регистра и пробелов.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventPayload {
    pub app: String,
    pub title: String,
}

impl EventPayload {
    pub fn new(app: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{app: \"{}\", title: \"{}\"}}", self.app, self.title)
    }
}

/// Событие, отправляемое в поток: время захвата + длительность в секундах + данные
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub duration: f64,
    pub data: EventPayload,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>, data: EventPayload) -> Self {
        Self {
            timestamp,
            duration: 0.0,
            data,
        }
    }

    #[allow(dead_code)]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Момент окончания события
    pub fn end(&self) -> DateTime<Utc> {
        self.timestamp + chrono::Duration::microseconds((self.duration * 1_000_000.0) as i64)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} (+{:.1}s)",
            self.data,
            self.timestamp.to_rfc3339(),
            self.duration
        )
    }
}
