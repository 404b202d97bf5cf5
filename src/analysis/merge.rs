use crate::models::Event;

/// Collapse events that overlapping chunks reported more than once.
///
/// Events are visited in start order and compared against those already
/// accepted. The first accepted event overlapping the candidate by at least
/// `min_overlap_fraction` of the longer of the two is treated as the same
/// event: the longer one survives and comparison stops there. Anything else
/// is accepted as distinct. Callers run this per event type.
pub fn remove_duplicates(events: Vec<Event>, min_overlap_fraction: f64) -> Vec<Event> {
    let mut sorted = events;
    sort_by_start(&mut sorted);

    let mut accepted: Vec<Event> = Vec::with_capacity(sorted.len());
    for event in sorted {
        let duplicate_of = accepted
            .iter()
            .position(|existing| overlap_fraction(&event, existing) >= min_overlap_fraction);

        match duplicate_of {
            Some(index) => {
                if event.span_secs() > accepted[index].span_secs() {
                    accepted.remove(index);
                    accepted.push(event);
                }
            }
            None => accepted.push(event),
        }
    }

    sort_by_start(&mut accepted);
    accepted
}

/// Shared time as a fraction of the longer event; zero when both are empty.
pub fn overlap_fraction(a: &Event, b: &Event) -> f64 {
    let longest = a.span_secs().max(b.span_secs());
    if longest > 0.0 {
        a.overlap_secs(b) / longest
    } else {
        0.0
    }
}

pub(crate) fn sort_by_start(events: &mut [Event]) {
    events.sort_by(|a, b| a.start_time_s.total_cmp(&b.start_time_s));
}
