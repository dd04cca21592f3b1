use crate::error::Result;
use crate::events::Observation;
use crate::watcher_error;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, GetPropertyReply, Window};
use x11rb::rust_connection::RustConnection;

use super::process::ProcessResolver;
use super::r#trait::WindowInspector;

struct Atoms {
    net_active_window: Atom,
    net_wm_name: Atom,
    net_wm_pid: Atom,
    utf8_string: Atom,
}

/// Прямой опрос X-сервера через EWMH-свойства корневого окна
pub struct X11Inspector {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    resolver: ProcessResolver,
}

impl X11Inspector {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)
            .map_err(|e| watcher_error!(inspector, "не удалось подключиться к X-серверу: {}", e))?;

        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| watcher_error!(inspector, "неверный номер экрана {}", screen_num))?;

        let atoms = Atoms {
            net_active_window: intern(&conn, "_NET_ACTIVE_WINDOW")?,
            net_wm_name: intern(&conn, "_NET_WM_NAME")?,
            net_wm_pid: intern(&conn, "_NET_WM_PID")?,
            utf8_string: intern(&conn, "UTF8_STRING")?,
        };

        Ok(Self {
            conn,
            root,
            atoms,
            resolver: ProcessResolver::new(),
        })
    }

    fn get_property(&self, window: Window, property: Atom, kind: Atom) -> Result<GetPropertyReply> {
        self.conn
            .get_property(false, window, property, kind, 0, 1024)
            .map_err(|e| watcher_error!(inspector, "X11 get_property: {}", e))?
            .reply()
            .map_err(|e| watcher_error!(inspector, "X11 get_property reply: {}", e))
    }

    fn property(&self, window: Window, property: Atom, kind: Atom) -> Result<Vec<u8>> {
        Ok(self.get_property(window, property, kind)?.value)
    }

    fn property_u32(&self, window: Window, property: Atom, kind: Atom) -> Result<Option<u32>> {
        Ok(first_u32(&self.get_property(window, property, kind)?))
    }

    fn active_window(&self) -> Result<Option<Window>> {
        let window = self.property_u32(
            self.root,
            self.atoms.net_active_window,
            AtomEnum::WINDOW.into(),
        )?;
        // 0 = фокуса нет
        Ok(window.filter(|&w| w != 0))
    }

    fn title(&self, window: Window) -> Result<String> {
        let utf8 = self.property(window, self.atoms.net_wm_name, self.atoms.utf8_string)?;
        if !utf8.is_empty() {
            return Ok(String::from_utf8_lossy(&utf8).into_owned());
        }

        let legacy = self.property(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())?;
        Ok(String::from_utf8_lossy(&legacy).into_owned())
    }
}

/// Первое 32-битное значение свойства; `None` для пустого свойства или другого формата
fn first_u32(reply: &GetPropertyReply) -> Option<u32> {
    reply.value32().and_then(|mut values| values.next())
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .map_err(|e| watcher_error!(inspector, "X11 intern_atom {}: {}", name, e))?
        .reply()
        .map_err(|e| watcher_error!(inspector, "X11 intern_atom {}: {}", name, e))?
        .atom)
}

impl WindowInspector for X11Inspector {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn poll(&self) -> Result<Option<Observation>> {
        let Some(window) = self.active_window()? else {
            return Ok(None);
        };

        // Окно могло закрыться между запросами: такие ошибки дают пустой заголовок, а не пропуск тика
        let title = self.title(window).unwrap_or_default();
        let pid = self
            .property_u32(window, self.atoms.net_wm_pid, AtomEnum::CARDINAL.into())
            .ok()
            .flatten();

        let mut observation = Observation::new(title);
        if let Some(pid) = pid {
            observation = observation.with_pid(pid);
        }
        let executable = self.resolver.resolve(observation.pid);

        Ok(Some(observation.with_executable(executable)))
    }
}
