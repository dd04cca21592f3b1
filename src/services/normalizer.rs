use crate::events::{EventPayload, ExecutablePath, Observation};

/// Канонические данные события из снимка окна.
///
/// `app`: полный путь к исполняемому файлу, иначе его имя, иначе пустая строка.
/// Полный путь нужен категоризатору ActivityWatch для регулярных выражений.
pub fn normalize(observation: &Observation) -> EventPayload {
    let app = match &observation.executable {
        ExecutablePath::Resolved(path) => path.clone(),
        ExecutablePath::Degraded { base_name } => base_name.clone(),
        ExecutablePath::Absent => String::new(),
    };

    EventPayload::new(app, observation.title.clone())
}
