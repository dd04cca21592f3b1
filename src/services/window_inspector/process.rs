use crate::events::ExecutablePath;
use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::debug;

/// Разрешает pid владельца окна в путь к исполняемому файлу.
///
/// Никогда не возвращает ошибку: процесс мог завершиться между чтением фокуса
/// и чтением пути, или путь может быть закрыт правами доступа. Такие случаи
/// выражаются вариантами `Degraded` и `Absent`.
pub struct ProcessResolver {
    system: Mutex<System>,
}

impl Default for ProcessResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessResolver {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    pub fn resolve(&self, pid: Option<u32>) -> ExecutablePath {
        let Some(raw_pid) = pid else {
            return ExecutablePath::Absent;
        };

        let pid = Pid::from_u32(raw_pid);
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            ProcessRefreshKind::new().with_exe(UpdateKind::OnlyIfNotSet),
        );

        let Some(process) = system.process(pid) else {
            debug!("Процесс {} уже завершился", raw_pid);
            return ExecutablePath::Absent;
        };

        match process.exe() {
            Some(exe) if !exe.as_os_str().is_empty() => {
                ExecutablePath::Resolved(exe.to_string_lossy().into_owned())
            }
            _ => {
                debug!("Путь к исполняемому файлу pid={} недоступен, используем имя процесса", raw_pid);
                ExecutablePath::degraded(process.name().to_string_lossy())
            }
        }
    }
}
