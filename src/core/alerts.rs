use crate::models::{AlertRange, Observation};
use chrono::Duration;

/// Collapses consecutive alert days into maximal inclusive ranges.
///
/// `points` must be ascending by date. Two alert days belong to the same
/// range only if they are exactly one calendar day apart, so a weekend or
/// holiday inside an alert window splits it in two.
pub fn detect_alert_ranges(points: &[Observation]) -> Vec<AlertRange> {
    let mut ranges = Vec::new();
    let mut open: Option<AlertRange> = None;

    for point in points {
        let date = point.date;
        if point.is_alert() {
            open = match open {
                None => Some(AlertRange { start: date, end: date }),
                Some(mut range) if date - range.end == Duration::days(1) => {
                    range.end = date;
                    Some(range)
                }
                Some(range) => {
                    ranges.push(range);
                    Some(AlertRange { start: date, end: date })
                }
            };
        } else if let Some(range) = open.take() {
            ranges.push(range);
        }
    }

    if let Some(range) = open {
        ranges.push(range);
    }

    ranges
}
