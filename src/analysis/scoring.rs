use crate::models::{AhiSeverity, AhiSummary, Event, EventsPerHour};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Usable recording length in hours, bounded by the shorter channel.
pub fn recording_duration_hours(
    flow_len: usize,
    flow_rate: f64,
    spo2_len: usize,
    spo2_rate: f64,
) -> f64 {
    let flow_secs = flow_len as f64 / flow_rate;
    let spo2_secs = spo2_len as f64 / spo2_rate;
    flow_secs.min(spo2_secs) / SECONDS_PER_HOUR
}

/// Events per hour; zero for a recording without duration.
pub fn ahi_score(apnea_count: usize, hypopnea_count: usize, recording_hours: f64) -> f64 {
    per_hour(apnea_count + hypopnea_count, recording_hours)
}

/// Score, severity band, and duration statistics for a final event set.
pub fn summarize(apneas: &[Event], hypopneas: &[Event], recording_hours: f64) -> AhiSummary {
    let total_events = apneas.len() + hypopneas.len();
    let ahi = ahi_score(apneas.len(), hypopneas.len(), recording_hours);
    let severity = AhiSeverity::from_score(ahi);

    let apnea_secs = total_duration(apneas);
    let hypopnea_secs = total_duration(hypopneas);
    let event_secs = apnea_secs + hypopnea_secs;

    let event_percentage = if recording_hours > 0.0 {
        event_secs / (recording_hours * SECONDS_PER_HOUR) * 100.0
    } else {
        0.0
    };

    AhiSummary {
        ahi_score: round_to(ahi, 1),
        severity,
        severity_color: severity.color().to_string(),
        total_events,
        apnea_count: apneas.len(),
        hypopnea_count: hypopneas.len(),
        recording_duration_hours: round_to(recording_hours, 2),
        total_event_duration_minutes: round_to(event_secs / 60.0, 1),
        event_percentage: round_to(event_percentage, 1),
        avg_apnea_duration: round_to(mean_duration(apnea_secs, apneas.len()), 1),
        avg_hypopnea_duration: round_to(mean_duration(hypopnea_secs, hypopneas.len()), 1),
        events_per_hour_breakdown: EventsPerHour {
            apnea_per_hour: round_to(per_hour(apneas.len(), recording_hours), 1),
            hypopnea_per_hour: round_to(per_hour(hypopneas.len(), recording_hours), 1),
        },
    }
}

fn per_hour(count: usize, recording_hours: f64) -> f64 {
    if recording_hours > 0.0 {
        count as f64 / recording_hours
    } else {
        0.0
    }
}

fn total_duration(events: &[Event]) -> f64 {
    events.iter().map(|e| e.duration_s).sum()
}

fn mean_duration(total_secs: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total_secs / count as f64
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
