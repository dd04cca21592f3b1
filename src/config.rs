use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Порт aw-server по умолчанию и в режиме `testing`
pub const DEFAULT_PORT: u16 = 5600;
pub const TESTING_PORT: u16 = 5666;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub inspector: InspectorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Тайминги цикла опроса, все значения в секундах
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatcherConfig {
    /// Окно слияния одинаковых heartbeat-ов
    pub pulsetime: f64,
    /// Период опроса активного окна
    pub interval: f64,
    /// Как часто очередь отправляет накопленные heartbeat-ы
    pub commit_interval: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub testing: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InspectorConfig {
    pub mode: String,
}

/// Значения из командной строки, перекрывающие файл и окружение
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub pulsetime: Option<f64>,
    pub interval: Option<f64>,
    pub commit_interval: Option<f64>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub testing: bool,
    pub inspector: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            pulsetime: 5.0,
            interval: 0.5,
            commit_interval: 60.0,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            testing: false,
            timeout_secs: 10,
        }
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            mode: "auto".to_string(),
        }
    }
}

impl WatcherConfig {
    pub fn pulsetime(&self) -> Duration {
        Duration::from_secs_f64(self.pulsetime)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    pub fn commit_interval(&self) -> Duration {
        Duration::from_secs_f64(self.commit_interval)
    }
}

impl ServerConfig {
    pub fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if self.testing => TESTING_PORT,
            None => DEFAULT_PORT,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}/api/0", self.host, self.effective_port())
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P, overrides: &ConfigOverrides) -> Result<Self> {
        let config_path = config_path.as_ref();

        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("AW_WATCHER_").split("__"));

        // Флаги командной строки имеют наивысший приоритет
        if let Some(level) = &overrides.log_level {
            figment = figment.merge(Serialized::default("logging.level", level));
        }
        if let Some(pulsetime) = overrides.pulsetime {
            figment = figment.merge(Serialized::default("watcher.pulsetime", pulsetime));
        }
        if let Some(interval) = overrides.interval {
            figment = figment.merge(Serialized::default("watcher.interval", interval));
        }
        if let Some(commit_interval) = overrides.commit_interval {
            figment = figment.merge(Serialized::default("watcher.commit_interval", commit_interval));
        }
        if let Some(host) = &overrides.host {
            figment = figment.merge(Serialized::default("server.host", host));
        }
        if let Some(port) = overrides.port {
            figment = figment.merge(Serialized::default("server.port", port));
        }
        if overrides.testing {
            figment = figment.merge(Serialized::default("server.testing", true));
        }
        if let Some(mode) = &overrides.inspector {
            figment = figment.merge(Serialized::default("inspector.mode", mode));
        }

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация таймингов
        let watcher = &self.watcher;
        for (name, value) in [
            ("pulsetime", watcher.pulsetime),
            ("interval", watcher.interval),
            ("commit_interval", watcher.commit_interval),
        ] {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("{} должно быть положительным числом, получено {}", name, value);
            }
            if Duration::try_from_secs_f64(value).is_err() {
                anyhow::bail!("{} слишком велико: {}", name, value);
            }
        }

        if watcher.interval >= watcher.pulsetime {
            anyhow::bail!(
                "interval ({}) должен быть меньше pulsetime ({}), иначе события не будут сливаться",
                watcher.interval,
                watcher.pulsetime
            );
        }

        // Валидация сервера
        if self.server.host.trim().is_empty() {
            anyhow::bail!("Пустой адрес сервера");
        }

        if self.server.timeout_secs == 0 {
            anyhow::bail!("timeout_secs должно быть больше 0");
        }

        match self.inspector.mode.as_str() {
            "auto" | "x11" | "xdotool" | "windows" | "unsupported" => {}
            _ => anyhow::bail!("Неверный режим инспектора окон: {}", self.inspector.mode),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.watcher.pulsetime, 5.0);
        assert_eq!(config.watcher.interval, 0.5);
        assert_eq!(config.watcher.commit_interval, 60.0);
    }

    #[test]
    fn test_invalid_timings_rejected() {
        let mut config = Config::default();
        config.watcher.interval = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.watcher.interval = 6.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.watcher.commit_interval = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_timings_rejected() {
        let overrides = ConfigOverrides {
            pulsetime: Some(1e20),
            ..Default::default()
        };
        let err = Config::load("/nonexistent/aw-watcher-windowpath.toml", &overrides).unwrap_err();
        assert!(err.to_string().contains("pulsetime"));

        let mut config = Config::default();
        config.watcher.pulsetime = 1e20;
        config.watcher.commit_interval = 1e20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_inspector_mode_rejected() {
        let mut config = Config::default();
        config.inspector.mode = "wayland".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_port_selection() {
        let mut server = ServerConfig::default();
        assert_eq!(server.effective_port(), DEFAULT_PORT);

        server.testing = true;
        assert_eq!(server.effective_port(), TESTING_PORT);
        assert_eq!(server.base_url(), "http://127.0.0.1:5666/api/0");

        server.port = Some(7000);
        assert_eq!(server.effective_port(), 7000);
    }

    #[test]
    fn test_missing_file_uses_defaults_and_overrides_win() {
        let overrides = ConfigOverrides {
            pulsetime: Some(10.0),
            testing: true,
            inspector: Some("unsupported".to_string()),
            ..Default::default()
        };

        let config = Config::load("/nonexistent/aw-watcher-windowpath.toml", &overrides).unwrap();
        assert_eq!(config.watcher.pulsetime, 10.0);
        assert_eq!(config.watcher.interval, 0.5);
        assert!(config.server.testing);
        assert_eq!(config.inspector.mode, "unsupported");
    }

    #[test]
    fn test_durations() {
        let watcher = WatcherConfig::default();
        assert_eq!(watcher.interval(), Duration::from_millis(500));
        assert_eq!(watcher.pulsetime(), Duration::from_secs(5));
        assert_eq!(watcher.commit_interval(), Duration::from_secs(60));
    }
}
