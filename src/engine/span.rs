use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::{
    ledger::entities::{SessionRecord, SessionStop},
    utils::time::next_day_start,
};

/// A session resolved into instants. Records only store a time of day for the stop, a stop
/// earlier than the start means the session went past midnight.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct SessionSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SessionSpan {
    /// Resolves `record` into a span. Running sessions are considered to last until `now`, or to
    /// be empty if `now` is before their start.
    pub fn of_record(record: &SessionRecord, now: NaiveDateTime) -> Self {
        let start = record.date.and_time(record.start);
        let end = match record.stop {
            SessionStop::Recorded(stop) if stop >= record.start => record.date.and_time(stop),
            SessionStop::Recorded(stop) => record.date.and_time(stop) + Duration::days(1),
            SessionStop::InProgress => now.max(start),
        };
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Splits a span into 2 halves, 1 before split, 1 after.
    pub fn split_by(self, split: NaiveDateTime) -> (Option<SessionSpan>, Option<SessionSpan>) {
        if split <= self.start {
            (None, Some(self))
        } else if split >= self.end {
            (Some(self), None)
        } else {
            (
                Some(SessionSpan {
                    start: self.start,
                    end: split,
                }),
                Some(SessionSpan {
                    start: split,
                    end: self.end,
                }),
            )
        }
    }

    /// Time spent on each calendar day the span touches.
    pub fn per_day(self) -> Vec<(NaiveDate, Duration)> {
        let mut days = vec![];
        let mut rest = Some(self);
        while let Some(span) = rest {
            let (today, tomorrow) = span.split_by(next_day_start(span.start));
            if let Some(today) = today {
                days.push((today.start.date(), today.duration()));
            }
            rest = tomorrow;
        }
        days
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use crate::ledger::entities::SessionRecord;

    use super::SessionSpan;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        date(d).and_time(time(h, m))
    }

    #[test]
    fn test_closed_same_day() {
        let span = SessionSpan::of_record(
            &SessionRecord::closed(date(4), time(9, 0), time(17, 30)),
            at(20, 0, 0),
        );
        assert_eq!(span.duration(), Duration::minutes(510));
        assert_eq!(span.per_day(), vec![(date(4), Duration::minutes(510))]);
    }

    #[test]
    fn test_closed_past_midnight() {
        let span = SessionSpan::of_record(
            &SessionRecord::closed(date(4), time(22, 0), time(1, 30)),
            at(20, 0, 0),
        );
        assert_eq!(span.end, at(5, 1, 30));
        assert_eq!(
            span.per_day(),
            vec![
                (date(4), Duration::hours(2)),
                (date(5), Duration::minutes(90))
            ]
        );
    }

    #[test]
    fn test_open_runs_until_now() {
        let record = SessionRecord::open(date(4), time(23, 0));
        let span = SessionSpan::of_record(&record, at(6, 2, 0));
        assert_eq!(
            span.per_day(),
            vec![
                (date(4), Duration::hours(1)),
                (date(5), Duration::hours(24)),
                (date(6), Duration::hours(2)),
            ]
        );
    }

    #[test]
    fn test_open_in_the_future_is_empty() {
        let record = SessionRecord::open(date(4), time(9, 0));
        let span = SessionSpan::of_record(&record, at(4, 8, 0));
        assert_eq!(span.duration(), Duration::zero());
        assert_eq!(span.per_day(), vec![(date(4), Duration::zero())]);
    }

    #[test]
    fn test_split_by_outside() {
        let span = SessionSpan {
            start: at(4, 9, 0),
            end: at(4, 10, 0),
        };
        assert_eq!(span.split_by(at(4, 8, 0)), (None, Some(span)));
        assert_eq!(span.split_by(at(4, 10, 0)), (Some(span), None));
    }
}
