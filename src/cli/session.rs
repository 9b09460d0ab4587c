use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use tracing::{info, instrument};

use crate::{
    engine::{
        report::{report, ReportSummary},
        session::{end_session, start_session},
        SessionError,
    },
    ledger::{
        entities::{LedgerMonth, ProjectName, SessionRecord},
        ledger_storage::LedgerStorage,
    },
};

/// Opens a session in the ledger of the month `start` falls into.
///
/// Sessions still running in any other month of the project block the start as well, otherwise
/// they would stay open forever once the month changes.
#[instrument(skip(storage))]
pub async fn start_tracking(
    storage: &impl LedgerStorage,
    project: &ProjectName,
    start: NaiveDateTime,
) -> Result<SessionRecord> {
    let month = LedgerMonth::of(start.date());

    let everything = storage.load_all(project).await?;
    if let Some((_, open)) = everything.open_sessions().next() {
        return Err(SessionError::SessionAlreadyOpen {
            date: open.date,
            start: open.start,
        }
        .into());
    }

    let ledger = storage.load(project, month).await?;
    let ledger = start_session(&ledger, start)?;
    storage.save(&ledger, project, month).await?;

    let started = ledger
        .records()
        .last()
        .cloned()
        .context("Started session is missing from the ledger")?;
    info!("Started {project} at {} {}", started.date, started.start);
    Ok(started)
}

/// Closes the running session of `project`, whichever month it was started in. A session is kept
/// in the ledger of the month of its start date.
#[instrument(skip(storage))]
pub async fn stop_tracking(
    storage: &impl LedgerStorage,
    project: &ProjectName,
    stop: NaiveDateTime,
) -> Result<Duration> {
    let everything = storage.load_all(project).await?;
    let open = everything
        .open_sessions()
        .map(|(_, record)| record.date)
        .collect::<Vec<_>>();
    let month = match open.as_slice() {
        [] => return Err(SessionError::NoSessionInProgress.into()),
        [date] => LedgerMonth::of(*date),
        _ => return Err(SessionError::MultipleSessionsOpen(open.len()).into()),
    };

    let ledger = storage.load(project, month).await?;
    let (ledger, duration) = end_session(&ledger, stop)?;
    storage.save(&ledger, project, month).await?;
    info!("Stopped {project} in {month}, session took {duration}");
    Ok(duration)
}

/// Report over every ledger of `project`. Nothing is saved, a running session stays open.
#[instrument(skip(storage))]
pub async fn report_project(
    storage: &impl LedgerStorage,
    project: &ProjectName,
    now: NaiveDateTime,
) -> Result<ReportSummary> {
    let ledger = storage.load_all(project).await?;
    Ok(report(&ledger, now))
}
