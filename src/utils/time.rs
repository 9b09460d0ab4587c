use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Stored session times have minute precision, so every incoming instant goes through this first.
pub fn truncate_to_minute(moment: NaiveDateTime) -> NaiveDateTime {
    moment
        .with_second(0)
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(moment)
}

/// Returns start of the next day.
pub fn next_day_start(moment: NaiveDateTime) -> NaiveDateTime {
    (moment + Duration::days(1)).date().and_time(NaiveTime::MIN)
}

/// Fractional hours, the unit everything is reported in.
pub fn hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.
}
