use crate::error::{Result, WatcherError};
use crate::events::Observation;
use std::process::Command;
use tracing::debug;

use super::process::ProcessResolver;
use super::r#trait::WindowInspector;

/// Запасной вариант для X11 через утилиту xdotool
pub struct XdotoolInspector {
    resolver: ProcessResolver,
}

impl Default for XdotoolInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl XdotoolInspector {
    pub fn new() -> Self {
        Self {
            resolver: ProcessResolver::new(),
        }
    }

    pub fn test(&self) -> Result<()> {
        let output = Command::new("xdotool").arg("version").output()?;
        if output.status.success() {
            Ok(())
        } else {
            WatcherError::inspector("xdotool failed")
        }
    }

    /// Заголовок и pid за один вызов, чтобы смена фокуса между запросами
    /// не смешала данные двух окон. `None`, если активного окна нет
    fn query(&self) -> Result<Option<String>> {
        let output = Command::new("xdotool")
            .args(["getactivewindow", "getwindowname", "getwindowpid"])
            .output()
            .map_err(|e| {
                debug!("xdotool не найден или не работает: {}", e);
                WatcherError::Inspector(format!("xdotool не найден: {}", e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            debug!(
                "xdotool вернул ошибку: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            // Заголовок получен, не удалось только прочитать pid
            if stdout.is_empty() {
                return Ok(None);
            }
        }

        Ok(Some(stdout))
    }
}

fn parse_pid(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// Первая строка вывода: заголовок, вторая: pid.
///
/// Если у окна нет _NET_WM_PID, xdotool печатает только заголовок и
/// завершается с ошибкой; тогда сюда попадает вывод без второй строки.
fn parse_output(stdout: &str) -> (String, Option<u32>) {
    let mut lines = stdout.lines();
    let title = lines.next().unwrap_or_default().trim().to_string();
    let pid = lines.next().and_then(parse_pid);
    (title, pid)
}

impl WindowInspector for XdotoolInspector {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    fn poll(&self) -> Result<Option<Observation>> {
        let Some(stdout) = self.query()? else {
            return Ok(None);
        };
        let (title, pid) = parse_output(&stdout);
        debug!("xdotool: заголовок '{}', pid {:?}", title, pid);

        let mut observation = Observation::new(title);
        if let Some(pid) = pid {
            observation = observation.with_pid(pid);
        }
        let executable = self.resolver.resolve(observation.pid);

        Ok(Some(observation.with_executable(executable)))
    }
}
