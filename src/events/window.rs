use serde::{Deserialize, Serialize};
use std::fmt;

/// Результат разрешения исполняемого файла процесса-владельца окна
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutablePath {
    /// Полный путь получен
    Resolved(String),
    /// Полный путь недоступен (процесс завершился, нет прав), но имя исполняемого файла известно
    Degraded { base_name: String },
    /// Ничего узнать не удалось
    Absent,
}

impl ExecutablePath {
    /// Строит вариант из полного пути, пустой путь считается отсутствующим
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.is_empty() {
            Self::Absent
        } else {
            Self::Resolved(path)
        }
    }

    /// Строит вариант из частично восстановленного имени
    pub fn degraded(base_name: impl AsRef<str>) -> Self {
        match base_name_of(base_name.as_ref()) {
            Some(name) => Self::Degraded { base_name: name },
            None => Self::Absent,
        }
    }

    #[allow(dead_code)]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl fmt::Display for ExecutablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(path) => write!(f, "{}", path),
            Self::Degraded { base_name } => write!(f, "{} (degraded)", base_name),
            Self::Absent => write!(f, "<unknown>"),
        }
    }
}

/// Последний сегмент пути, понимает разделители Unix и Windows
pub fn base_name_of(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Снимок окна в фокусе, живёт один тик
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    pub pid: Option<u32>,
    pub title: String,
    pub executable: ExecutablePath,
}

impl Observation {
    pub fn new(title: String) -> Self {
        Self {
            pid: None,
            title,
            executable: ExecutablePath::Absent,
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        // pid 0 на всех платформах означает "нет процесса"
        self.pid = (pid != 0).then_some(pid);
        self
    }

    pub fn with_executable(mut self, executable: ExecutablePath) -> Self {
        self.executable = executable;
        self
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "\"{}\" [{} pid={}]", self.title, self.executable, pid),
            None => write!(f, "\"{}\" [{}]", self.title, self.executable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_creation() {
        let observation = Observation::new("Doc1".to_string())
            .with_pid(1234)
            .with_executable(ExecutablePath::from_path("/usr/bin/foo"));

        assert_eq!(observation.title, "Doc1");
        assert_eq!(observation.pid, Some(1234));
        assert!(observation.executable.is_resolved());
    }

    #[test]
    fn test_invalid_pid_is_dropped() {
        let observation = Observation::new(String::new()).with_pid(0);
        assert_eq!(observation.pid, None);
    }

    #[test]
    fn test_empty_path_is_absent() {
        assert_eq!(ExecutablePath::from_path(""), ExecutablePath::Absent);
        assert_eq!(ExecutablePath::degraded(""), ExecutablePath::Absent);
    }

    #[test]
    fn test_base_name_of() {
        assert_eq!(base_name_of("/usr/bin/foo").as_deref(), Some("foo"));
        assert_eq!(
            base_name_of(r"C:\Program Files\App\app.exe").as_deref(),
            Some("app.exe")
        );
        assert_eq!(base_name_of("firefox").as_deref(), Some("firefox"));
        assert_eq!(base_name_of("/opt/tool/").as_deref(), Some("tool"));
        assert_eq!(base_name_of("/"), None);
    }
}
