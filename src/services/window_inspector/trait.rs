use crate::config::Config;
use crate::error::Result;
use crate::events::Observation;
use std::sync::Arc;
use tracing::{info, warn};

/// One-shot query of the window that currently holds input focus.
///
/// `Ok(None)` means nothing is focused or the platform cannot tell; that is a
/// normal outcome and must never be reported as an error. Partial failures to
/// resolve the owning executable are carried inside the observation as
/// `ExecutablePath::Degraded` / `ExecutablePath::Absent`.
///
/// `poll` is a blocking OS query (subprocess, X protocol round trips, process
/// table reads). Callers on the async runtime must run it through
/// `tokio::task::spawn_blocking`.
pub trait WindowInspector: Send + Sync {
    /// Short name of the inspector for logs
    fn name(&self) -> &'static str;

    /// Query the focused window once
    fn poll(&self) -> Result<Option<Observation>>;
}

/// Factory selecting the inspector once at startup: dry-run, explicit mode
/// from the config, or the platform default with fallbacks.
pub fn create_window_inspector(
    config: &Config,
    dry_run: bool,
) -> Result<Arc<dyn WindowInspector>> {
    if dry_run {
        return Ok(Arc::new(super::dry_run::DryRunInspector::new()));
    }

    let inspector: Arc<dyn WindowInspector> = match config.inspector.mode.as_str() {
        "unsupported" => Arc::new(super::unsupported::UnsupportedInspector::new()),
        "xdotool" => Arc::new(super::xdotool::XdotoolInspector::new()),
        #[cfg(target_os = "linux")]
        "x11" => Arc::new(super::x11::X11Inspector::connect()?),
        #[cfg(windows)]
        "windows" => Arc::new(super::win32::WindowsInspector::new()),
        "auto" => platform_default(),
        other => {
            warn!("Режим инспектора '{}' недоступен на этой платформе", other);
            Arc::new(super::unsupported::UnsupportedInspector::new())
        }
    };

    info!("Инспектор окон: {}", inspector.name());
    Ok(inspector)
}

#[cfg(windows)]
fn platform_default() -> Arc<dyn WindowInspector> {
    Arc::new(super::win32::WindowsInspector::new())
}

#[cfg(target_os = "linux")]
fn platform_default() -> Arc<dyn WindowInspector> {
    use super::x11::X11Inspector;
    use super::xdotool::XdotoolInspector;

    if std::env::var("XDG_SESSION_TYPE").as_deref() == Ok("wayland") {
        warn!("Wayland-сессия: видны только окна XWayland");
    }

    match X11Inspector::connect() {
        Ok(inspector) => return Arc::new(inspector),
        Err(e) => warn!("Прямое подключение к X11 не удалось: {}", e),
    }

    let xdotool = XdotoolInspector::new();
    if xdotool.test().is_ok() {
        return Arc::new(xdotool);
    }

    warn!("Ни один метод определения активного окна не работает");
    Arc::new(super::unsupported::UnsupportedInspector::new())
}

#[cfg(not(any(windows, target_os = "linux")))]
fn platform_default() -> Arc<dyn WindowInspector> {
    Arc::new(super::unsupported::UnsupportedInspector::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_takes_precedence() {
        let inspector = create_window_inspector(&Config::default(), true).unwrap();
        assert_eq!(inspector.name(), "dry-run");
    }

    #[test]
    fn test_explicit_unsupported_mode() {
        let mut config = Config::default();
        config.inspector.mode = "unsupported".to_string();

        let inspector = create_window_inspector(&config, false).unwrap();
        assert_eq!(inspector.name(), "unsupported");
    }
}
