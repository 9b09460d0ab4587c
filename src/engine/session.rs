use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::{
    ledger::entities::{Ledger, SessionRecord, SessionStop},
    utils::time::truncate_to_minute,
};

use super::SessionError;

/// Opens a new session at `start`. Fails if the ledger already has a running session. The passed
/// ledger is left as is, the opened session only exists in the returned one.
pub fn start_session(ledger: &Ledger, start: NaiveDateTime) -> Result<Ledger, SessionError> {
    if let Some((_, open)) = ledger.open_sessions().next() {
        return Err(SessionError::SessionAlreadyOpen {
            date: open.date,
            start: open.start,
        });
    }

    let start = truncate_to_minute(start);
    debug!("Starting session at {start}");
    Ok(ledger.with_record(SessionRecord::open(start.date(), start.time())))
}

/// Closes the running session at `stop` and returns the updated ledger together with the length of
/// the session.
///
/// Durations are measured between full instants. Only the time of day of `stop` ends up in the
/// ledger, so a session that ran past midnight is read back as ending on the following day and
/// sessions of a day or longer are rejected.
pub fn end_session(
    ledger: &Ledger,
    stop: NaiveDateTime,
) -> Result<(Ledger, Duration), SessionError> {
    let mut open = ledger.open_sessions();
    let Some((index, record)) = open.next() else {
        return Err(SessionError::NoSessionInProgress);
    };
    let others = open.count();
    if others > 0 {
        return Err(SessionError::MultipleSessionsOpen(others + 1));
    }

    let start = record.date.and_time(record.start);
    let stop = truncate_to_minute(stop);
    if stop < start {
        return Err(SessionError::StopBeforeStart { start, stop });
    }
    if stop - start >= Duration::days(1) {
        return Err(SessionError::SessionTooLong { start, stop });
    }

    let closed = record
        .clone()
        .with_stop(SessionStop::Recorded(stop.time()));
    debug!("Stopping session started at {start} at {stop}");
    let ledger = ledger
        .with_replaced(index, closed)
        .ok_or(SessionError::NoSessionInProgress)?;
    Ok((ledger, stop - start))
}
