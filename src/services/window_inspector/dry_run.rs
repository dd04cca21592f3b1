use crate::error::Result;
use crate::events::{ExecutablePath, Observation};
use parking_lot::Mutex;
use tracing::info;

use super::r#trait::WindowInspector;

/// Сколько опросов подряд эмулируется одно и то же окно
const POLLS_PER_WINDOW: usize = 20;

const FAKE_WINDOWS: &[(&str, &str)] = &[
    ("/usr/bin/alacritty", "Terminal - dry_run"),
    ("/usr/lib/firefox/firefox", "Browser - dry_run"),
    ("/usr/bin/nvim", "Editor - dry_run"),
    ("", "Untitled - dry_run"),
];

/// Эмуляция смены окон без обращения к оконной системе
pub struct DryRunInspector {
    polls: Mutex<usize>,
}

impl Default for DryRunInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunInspector {
    pub fn new() -> Self {
        info!("Dry-run режим - инспектор окон работает в режиме эмуляции");
        Self {
            polls: Mutex::new(0),
        }
    }
}

impl WindowInspector for DryRunInspector {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn poll(&self) -> Result<Option<Observation>> {
        let mut polls = self.polls.lock();
        let index = (*polls / POLLS_PER_WINDOW) % FAKE_WINDOWS.len();
        *polls += 1;

        let (path, title) = FAKE_WINDOWS[index];
        Ok(Some(
            Observation::new(title.to_string())
                .with_pid(1000 + index as u32)
                .with_executable(ExecutablePath::from_path(path)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switches_window_after_a_batch_of_polls() {
        let inspector = DryRunInspector::new();

        let first = inspector.poll().unwrap().unwrap();
        for _ in 1..POLLS_PER_WINDOW {
            assert_eq!(inspector.poll().unwrap().unwrap(), first);
        }

        let next = inspector.poll().unwrap().unwrap();
        assert_ne!(next, first);
        assert_eq!(next.title, "Browser - dry_run");
    }
}
