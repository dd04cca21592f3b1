use crate::error::Result;
use crate::events::{ExecutablePath, Observation};
use tracing::debug;
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, FALSE, HWND};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
};

use super::process::ProcessResolver;
use super::r#trait::WindowInspector;

/// Окно переднего плана через Win32 API
pub struct WindowsInspector {
    resolver: ProcessResolver,
}

impl WindowsInspector {
    pub fn new() -> Self {
        Self {
            resolver: ProcessResolver::new(),
        }
    }

    fn window_title(hwnd: HWND) -> String {
        unsafe {
            let len = GetWindowTextLengthW(hwnd);
            if len <= 0 {
                return String::new();
            }
            let mut buf = vec![0u16; len as usize + 1];
            let copied = GetWindowTextW(hwnd, &mut buf);
            String::from_utf16_lossy(&buf[..copied.max(0) as usize])
        }
    }

    /// Полный путь через QueryFullProcessImageNameW; при отказе в доступе
    /// откатываемся к имени процесса из sysinfo
    fn executable(&self, pid: u32) -> ExecutablePath {
        let full_path = unsafe {
            match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid) {
                Ok(handle) => {
                    let mut buf = [0u16; 1024];
                    let mut len = buf.len() as u32;
                    let ok = QueryFullProcessImageNameW(
                        handle,
                        PROCESS_NAME_WIN32,
                        PWSTR(buf.as_mut_ptr()),
                        &mut len,
                    );
                    let _ = CloseHandle(handle);
                    ok.ok().map(|_| String::from_utf16_lossy(&buf[..len as usize]))
                }
                Err(e) => {
                    debug!("OpenProcess({}) не удался: {}", pid, e);
                    None
                }
            }
        };

        match full_path {
            Some(path) => ExecutablePath::from_path(path),
            None => self.resolver.resolve(Some(pid)),
        }
    }
}

impl WindowInspector for WindowsInspector {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn poll(&self) -> Result<Option<Observation>> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            return Ok(None);
        }

        let title = Self::window_title(hwnd);
        let mut pid = 0u32;
        unsafe {
            GetWindowThreadProcessId(hwnd, Some(&mut pid));
        }

        let observation = Observation::new(title).with_pid(pid);
        let executable = match observation.pid {
            Some(pid) => self.executable(pid),
            None => ExecutablePath::Absent,
        };

        Ok(Some(observation.with_executable(executable)))
    }
}
