use std::fmt::Display;

use ansi_term::{Colour, Style};

use crate::{engine::report::ReportSummary, utils::time::hours};

pub fn print_header(msg: impl Display) {
    println!("{}", Style::new().bold().paint(msg.to_string()));
}

pub fn print_okay(msg: impl Display) {
    println!("{}", Colour::Green.paint(msg.to_string()));
}

pub fn print_warning(msg: impl Display) {
    println!("{}", Colour::Yellow.paint(msg.to_string()));
}

pub fn print_error(msg: impl Display) {
    eprintln!("{}", Colour::Red.paint(msg.to_string()));
}

/// Plain text lines of a report, in the order they are printed.
pub fn report_lines(summary: &ReportSummary) -> Vec<String> {
    let mut lines = vec![
        format!("{:.2} hours so far this month.", hours(summary.month_total)),
        format!("{:.2} hours in the past 7 days.", hours(summary.week_total)),
        format!("{:.2} hours so far this week.", hours(summary.week_so_far)),
    ];
    lines.push(match summary.avg_weekly_last_90_days {
        Some(average) => format!(
            "You averaged {:.2} hours/week in the past 90 days.",
            hours(average)
        ),
        None => "Not enough history yet for a weekly average.".to_string(),
    });
    if let Some(today) = summary.today_total {
        lines.push(format!("{:.2} hours so far today.", hours(today)));
    }
    lines
}

pub fn in_progress_warning(summary: &ReportSummary) -> Option<String> {
    summary.in_progress.map(|duration| {
        format!(
            "A session is still in progress, its {:.2} hours up to now are included.",
            hours(duration)
        )
    })
}

pub fn print_report(summary: &ReportSummary) {
    if let Some(warning) = in_progress_warning(summary) {
        print_warning(warning);
    }
    for line in report_lines(summary) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;

    use crate::engine::report::ReportSummary;

    use super::{in_progress_warning, report_lines};

    fn summary() -> ReportSummary {
        ReportSummary {
            daily_totals: BTreeMap::new(),
            today_total: Some(Duration::minutes(90)),
            week_so_far: Duration::hours(3),
            week_total: Duration::minutes(615),
            month_total: Duration::hours(20),
            avg_weekly_last_90_days: Some(Duration::minutes(1230)),
            in_progress: None,
        }
    }

    #[test]
    fn test_report_lines() {
        assert_eq!(
            report_lines(&summary()),
            vec![
                "20.00 hours so far this month.",
                "10.25 hours in the past 7 days.",
                "3.00 hours so far this week.",
                "You averaged 20.50 hours/week in the past 90 days.",
                "1.50 hours so far today.",
            ]
        );
        assert_eq!(in_progress_warning(&summary()), None);
    }

    #[test]
    fn test_report_lines_without_history() {
        let summary = ReportSummary {
            today_total: None,
            avg_weekly_last_90_days: None,
            in_progress: Some(Duration::hours(2)),
            ..summary()
        };

        let lines = report_lines(&summary);

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "Not enough history yet for a weekly average.");
        assert_eq!(
            in_progress_warning(&summary).unwrap(),
            "A session is still in progress, its 2.00 hours up to now are included."
        );
    }
}
