use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::{instrument, warn};

use crate::ledger::entities::{Ledger, LedgerMonth};

use super::span::SessionSpan;

/// Length of the trailing window used for weekly sums.
const WEEK_DAYS: i64 = 7;
/// How far back the weekly average looks.
const AVERAGE_DAYS: i64 = 90;

/// Aggregated view of a ledger at some moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    /// Tracked time per calendar day. Days without sessions are absent.
    pub daily_totals: BTreeMap<NaiveDate, Duration>,
    /// `None` if nothing was tracked today.
    pub today_total: Option<Duration>,
    /// Since the last Sunday, today included.
    pub week_so_far: Duration,
    /// The last 7 days, today included.
    pub week_total: Duration,
    pub month_total: Duration,
    /// Mean of the trailing 7 day sums over the last 90 days. `None` until there is a week of
    /// history.
    pub avg_weekly_last_90_days: Option<Duration>,
    /// Set when a running session was counted up to the report moment. Holds the time it
    /// contributed.
    pub in_progress: Option<Duration>,
}

/// Summarizes `ledger` as of `now`. A running session counts as if it was stopped at `now`, the
/// ledger itself isn't changed.
#[instrument(skip(ledger), fields(records = ledger.len()))]
pub fn report(ledger: &Ledger, now: NaiveDateTime) -> ReportSummary {
    let mut daily_totals = BTreeMap::<NaiveDate, Duration>::new();
    let mut in_progress: Option<Duration> = None;

    for record in ledger.records() {
        let span = SessionSpan::of_record(record, now);
        if record.stop.is_in_progress() {
            warn!(
                "Session started {} at {} is still running, counting it up to {now}",
                record.date, record.start
            );
            *in_progress.get_or_insert_with(Duration::zero) += span.duration();
        }
        for (day, duration) in span.per_day() {
            *daily_totals.entry(day).or_insert_with(Duration::zero) += duration;
        }
    }

    let today = now.date();
    let month = LedgerMonth::of(today);
    let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);

    ReportSummary {
        today_total: daily_totals.get(&today).copied(),
        week_so_far: sum_between(&daily_totals, week_start, today),
        week_total: sum_between(&daily_totals, trailing_week_start(today), today),
        month_total: daily_totals
            .iter()
            .filter(|(day, _)| month.contains(**day))
            .map(|(_, duration)| *duration)
            .sum(),
        avg_weekly_last_90_days: average_weekly(&daily_totals, today),
        daily_totals,
        in_progress,
    }
}

fn trailing_week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(WEEK_DAYS - 1)
}

/// Sum of days between `from` and `to`, both inclusive.
fn sum_between(
    daily_totals: &BTreeMap<NaiveDate, Duration>,
    from: NaiveDate,
    to: NaiveDate,
) -> Duration {
    if from > to {
        return Duration::zero();
    }
    daily_totals
        .range(from..=to)
        .map(|(_, duration)| *duration)
        .sum()
}

/// Days without sessions count as zero, but a day only gets a trailing sum once a full week of
/// history precedes it.
fn average_weekly(
    daily_totals: &BTreeMap<NaiveDate, Duration>,
    today: NaiveDate,
) -> Option<Duration> {
    let first_day = *daily_totals.keys().next()?;
    let first_complete_week = first_day + Duration::days(WEEK_DAYS - 1);
    let window_start = today - Duration::days(AVERAGE_DAYS - 1);

    let sums = window_start
        .iter_days()
        .take_while(|day| *day <= today)
        .filter(|day| *day >= first_complete_week)
        .map(|day| sum_between(daily_totals, trailing_week_start(day), day))
        .collect::<Vec<_>>();

    if sums.is_empty() {
        return None;
    }
    let total = sums.iter().copied().sum::<Duration>();
    Some(total / sums.len() as i32)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use crate::{
        engine::{report::report, session::start_session},
        ledger::entities::{Ledger, SessionRecord},
    };

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(m, d).and_time(time(h, min))
    }

    fn hours_on(m: u32, d: u32, hours: u32) -> SessionRecord {
        SessionRecord::closed(date(m, d), time(8, 0), time(8 + hours, 0))
    }

    #[test]
    fn test_empty_ledger() {
        let summary = report(&Ledger::new(), at(3, 15, 12, 0));

        assert!(summary.daily_totals.is_empty());
        assert_eq!(summary.today_total, None);
        assert_eq!(summary.month_total, Duration::zero());
        assert_eq!(summary.week_total, Duration::zero());
        assert_eq!(summary.week_so_far, Duration::zero());
        assert_eq!(summary.avg_weekly_last_90_days, None);
        assert_eq!(summary.in_progress, None);
    }

    #[test]
    fn test_only_today() {
        let ledger = Ledger::from(vec![
            SessionRecord::closed(date(3, 15), time(9, 0), time(12, 0)),
            SessionRecord::closed(date(3, 15), time(13, 0), time(15, 0)),
        ]);

        let summary = report(&ledger, at(3, 15, 18, 0));

        assert_eq!(summary.month_total, Duration::hours(5));
        assert_eq!(summary.today_total, Some(Duration::hours(5)));
        assert_eq!(summary.in_progress, None);
    }

    #[test]
    fn test_month_total_ignores_other_months() {
        let ledger = Ledger::from(vec![
            hours_on(2, 29, 4),
            hours_on(3, 1, 2),
            hours_on(3, 10, 3),
            // Same month of another year.
            SessionRecord::closed(
                NaiveDate::from_ymd_opt(2023, 3, 10).unwrap(),
                time(8, 0),
                time(9, 0),
            ),
        ]);

        let summary = report(&ledger, at(3, 15, 18, 0));

        assert_eq!(summary.month_total, Duration::hours(5));
        assert_eq!(summary.today_total, None);
    }

    #[test]
    fn test_week_windows() {
        // 2024-03-13 is a Wednesday, the week started on Sunday 2024-03-10.
        let ledger = Ledger::from(vec![
            hours_on(3, 6, 7),
            hours_on(3, 7, 1),
            hours_on(3, 9, 2),
            hours_on(3, 10, 3),
            hours_on(3, 13, 4),
            hours_on(3, 14, 5),
        ]);

        let summary = report(&ledger, at(3, 13, 20, 0));

        assert_eq!(summary.week_total, Duration::hours(1 + 2 + 3 + 4));
        assert_eq!(summary.week_so_far, Duration::hours(3 + 4));
    }

    #[test]
    fn test_week_so_far_on_sunday_is_today() {
        let ledger = Ledger::from(vec![hours_on(3, 9, 2), hours_on(3, 10, 3)]);

        let summary = report(&ledger, at(3, 10, 20, 0));

        assert_eq!(summary.week_so_far, Duration::hours(3));
        assert_eq!(summary.week_total, Duration::hours(5));
    }

    #[test]
    fn test_average_needs_a_week_of_history() {
        let ledger = Ledger::from(vec![hours_on(3, 10, 2), hours_on(3, 12, 4)]);

        assert_eq!(report(&ledger, at(3, 15, 20, 0)).avg_weekly_last_90_days, None);

        // Only 2024-03-16 has a full trailing week: 10th..16th.
        assert_eq!(
            report(&ledger, at(3, 16, 20, 0)).avg_weekly_last_90_days,
            Some(Duration::hours(6))
        );

        // 16th: 6h, 17th (11..17): 4h.
        assert_eq!(
            report(&ledger, at(3, 17, 20, 0)).avg_weekly_last_90_days,
            Some(Duration::hours(5))
        );
    }

    #[test]
    fn test_average_only_looks_back_90_days() {
        let mut records = vec![hours_on(1, 1, 10)];
        // Steady 7 hours every week from March on.
        records.extend((1..=31).map(|d| hours_on(3, d, 1)));
        records.extend((1..=30).map(|d| hours_on(4, d, 1)));
        records.extend((1..=31).map(|d| hours_on(5, d, 1)));
        records.extend((1..=30).map(|d| hours_on(6, d, 1)));
        let ledger = Ledger::from(records);

        let summary = report(&ledger, at(6, 30, 20, 0));

        // The 90 day window starts on April 2nd and never reaches the January outlier.
        assert_eq!(summary.avg_weekly_last_90_days, Some(Duration::hours(7)));
    }

    #[test]
    fn test_open_session_counts_until_now() {
        let ledger = start_session(&Ledger::new(), at(3, 15, 9, 0)).unwrap();
        let copy = ledger.clone();

        let summary = report(&ledger, at(3, 15, 11, 0));

        assert_eq!(summary.today_total, Some(Duration::hours(2)));
        assert_eq!(summary.in_progress, Some(Duration::hours(2)));
        assert_eq!(ledger, copy);
        assert!(ledger.has_open_session());
    }

    #[test]
    fn test_overnight_session_is_split() {
        let ledger = Ledger::from(vec![SessionRecord::closed(
            date(3, 14),
            time(22, 0),
            time(1, 0),
        )]);

        let summary = report(&ledger, at(3, 15, 12, 0));

        assert_eq!(summary.daily_totals.get(&date(3, 14)), Some(&Duration::hours(2)));
        assert_eq!(summary.today_total, Some(Duration::hours(1)));
        assert_eq!(summary.week_total, Duration::hours(3));
    }

    #[test]
    fn test_report_is_repeatable() {
        let ledger = Ledger::from(vec![
            hours_on(3, 1, 2),
            SessionRecord::open(date(3, 15), time(10, 0)),
        ]);

        let first = report(&ledger, at(3, 15, 12, 0));
        let second = report(&ledger, at(3, 15, 12, 0));

        assert_eq!(first, second);
        assert_eq!(first.month_total, Duration::hours(4));
    }
}
