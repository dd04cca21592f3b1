use crate::events::EventPayload;

/// `true`, если данные отличаются от последних отправленных (или отправок ещё не было)
pub fn should_dispatch(new_payload: &EventPayload, last_payload: Option<&EventPayload>) -> bool {
    last_payload != Some(new_payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_payload_is_new() {
        assert!(should_dispatch(&EventPayload::new("/usr/bin/foo", "Doc"), None));
        assert!(should_dispatch(&EventPayload::default(), None));
    }

    #[test]
    fn test_identical_payload_is_noop() {
        let last = EventPayload::new("/usr/bin/foo", "Doc");
        assert!(!should_dispatch(&last.clone(), Some(&last)));
    }

    #[test]
    fn test_any_field_change_is_new() {
        let last = EventPayload::new("/usr/bin/foo", "Doc");
        assert!(should_dispatch(&EventPayload::new("/usr/bin/bar", "Doc"), Some(&last)));
        assert!(should_dispatch(&EventPayload::new("/usr/bin/foo", "doc"), Some(&last)));
    }
}
