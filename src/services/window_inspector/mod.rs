//! WindowInspector: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for reporting which window
//! currently has input focus (title, owning pid, executable path). They MUST NOT
//! build event payloads or decide whether anything gets dispatched; that belongs
//! to the normalizer and the sampling loop.

mod dry_run;
mod process;
mod unsupported;
mod xdotool;
#[cfg(target_os = "linux")]
mod x11;
#[cfg(windows)]
mod win32;
mod r#trait;

pub use self::r#trait::{create_window_inspector, WindowInspector};
