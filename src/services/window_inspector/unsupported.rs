use crate::error::Result;
use crate::events::Observation;
use tracing::warn;

use super::r#trait::WindowInspector;

/// Заглушка для платформ без поддержки: каждый тик пропускается
pub struct UnsupportedInspector;

impl Default for UnsupportedInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl UnsupportedInspector {
    pub fn new() -> Self {
        warn!("Определение активного окна не поддерживается, события отправляться не будут");
        Self
    }
}

impl WindowInspector for UnsupportedInspector {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn poll(&self) -> Result<Option<Observation>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_observes() {
        let inspector = UnsupportedInspector::new();
        for _ in 0..3 {
            assert!(inspector.poll().unwrap().is_none());
        }
    }
}
