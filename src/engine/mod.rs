//! Session bookkeeping and reporting on top of [Ledger](crate::ledger::entities::Ledger) values.
//! Nothing in here touches the disk or asks for the current time, callers pass both in and
//! decide what to persist.

pub mod report;
pub mod session;
pub mod span;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(
        "There is an unfinished session started {date} at {}. Run stop to end the session now or edit the timesheet to fix a missed session stop",
        .start.format("%H:%M")
    )]
    SessionAlreadyOpen { date: NaiveDate, start: NaiveTime },

    #[error("There is no session in progress")]
    NoSessionInProgress,

    #[error("Timesheet has {0} sessions in progress, edit the timesheet to leave at most one")]
    MultipleSessionsOpen(usize),

    #[error("Session can't stop at {stop} before it started at {start}")]
    StopBeforeStart {
        start: NaiveDateTime,
        stop: NaiveDateTime,
    },

    #[error(
        "Session started at {start} would stop at {stop}, a day or more later. Timesheets only keep the stop time of day, edit the timesheet to split the session"
    )]
    SessionTooLong {
        start: NaiveDateTime,
        stop: NaiveDateTime,
    },
}
