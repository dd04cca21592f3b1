use crate::events::Event;
use std::time::Duration;

/// Слияние heartbeat-а с последним событием потока.
///
/// Сливаются только события с одинаковыми данными, если новый heartbeat
/// попадает в `[last.timestamp, last.end() + pulsetime]`. Длительность
/// результата покрывает оба события.
pub fn heartbeat_merge(last: &Event, heartbeat: &Event, pulsetime: Duration) -> Option<Event> {
    if last.data != heartbeat.data {
        return None;
    }

    let pulse_end = last.end() + chrono::Duration::from_std(pulsetime).ok()?;
    if heartbeat.timestamp < last.timestamp || heartbeat.timestamp > pulse_end {
        return None;
    }

    let offset = (heartbeat.timestamp - last.timestamp)
        .to_std()
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    let mut merged = last.clone();
    merged.duration = last.duration.max(offset + heartbeat.duration);
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPayload;
    use chrono::{TimeZone, Utc};

    fn event_at(secs: i64, app: &str) -> Event {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs);
        Event::new(ts, EventPayload::new(app, "title"))
    }

    #[test]
    fn test_identical_within_pulsetime_extends_duration() {
        let last = event_at(0, "/usr/bin/foo");
        let next = event_at(3, "/usr/bin/foo");

        let merged = heartbeat_merge(&last, &next, Duration::from_secs(5)).unwrap();
        assert_eq!(merged.timestamp, last.timestamp);
        assert_eq!(merged.duration, 3.0);
    }

    #[test]
    fn test_pulsetime_counts_from_event_end() {
        let last = event_at(0, "/usr/bin/foo").with_duration(10.0);
        let next = event_at(14, "/usr/bin/foo");

        let merged = heartbeat_merge(&last, &next, Duration::from_secs(5)).unwrap();
        assert_eq!(merged.duration, 14.0);

        let late = event_at(16, "/usr/bin/foo");
        assert!(heartbeat_merge(&last, &late, Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_heartbeat_inside_existing_duration_keeps_it() {
        let last = event_at(0, "/usr/bin/foo").with_duration(10.0);
        let next = event_at(2, "/usr/bin/foo");

        let merged = heartbeat_merge(&last, &next, Duration::from_secs(5)).unwrap();
        assert_eq!(merged.duration, 10.0);
    }

    #[test]
    fn test_different_payload_never_merges() {
        let last = event_at(0, "/usr/bin/foo");
        let next = event_at(1, "/usr/bin/bar");
        assert!(heartbeat_merge(&last, &next, Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_heartbeat_before_last_event_does_not_merge() {
        let last = event_at(10, "/usr/bin/foo");
        let earlier = event_at(9, "/usr/bin/foo");
        assert!(heartbeat_merge(&last, &earlier, Duration::from_secs(5)).is_none());
    }
}
