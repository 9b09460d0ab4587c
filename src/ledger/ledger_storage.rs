use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use futures::{stream, StreamExt, TryStreamExt};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::{self, AsyncReadExt},
};
use tracing::{debug, info, instrument};

use crate::fs::operations::write_atomically;

use super::entities::{Ledger, LedgerMonth, ProjectName, SessionRecord};

pub const LEDGER_EXTENSION: &str = "csv";
pub const LEDGER_HEADER: [&str; 3] = ["date", "start", "stop"];

/// How many monthly ledgers are read at the same time by [LedgerStorage::load_all].
const LOAD_ALL_BUFFER: usize = 4;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Timesheet storage at {path:?} is unavailable: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Malformed record in {path:?} (line {}): {reason}",
        .line.map_or_else(|| "unknown".to_string(), |v| v.to_string())
    )]
    MalformedRecord {
        path: PathBuf,
        line: Option<u64>,
        reason: String,
    },
}

/// Interface for abstracting storage of ledgers.
pub trait LedgerStorage {
    /// Retrieves the ledger of a project for a month. Ledgers that were never saved are empty.
    fn load(
        &self,
        project: &ProjectName,
        month: LedgerMonth,
    ) -> impl Future<Output = Result<Ledger, LedgerError>>;

    /// Retrieves every record of a project regardless of month. The order of records from
    /// different months isn't specified.
    fn load_all(&self, project: &ProjectName) -> impl Future<Output = Result<Ledger, LedgerError>>;

    /// Replaces the stored ledger with `ledger`.
    fn save(
        &self,
        ledger: &Ledger,
        project: &ProjectName,
        month: LedgerMonth,
    ) -> impl Future<Output = Result<(), LedgerError>>;

    fn ledger_path(&self, project: &ProjectName, month: LedgerMonth) -> PathBuf;
}

impl<T: Deref> LedgerStorage for T
where
    T::Target: LedgerStorage,
{
    fn load(
        &self,
        project: &ProjectName,
        month: LedgerMonth,
    ) -> impl Future<Output = Result<Ledger, LedgerError>> {
        self.deref().load(project, month)
    }

    fn load_all(&self, project: &ProjectName) -> impl Future<Output = Result<Ledger, LedgerError>> {
        self.deref().load_all(project)
    }

    fn save(
        &self,
        ledger: &Ledger,
        project: &ProjectName,
        month: LedgerMonth,
    ) -> impl Future<Output = Result<(), LedgerError>> {
        self.deref().save(ledger, project, month)
    }

    fn ledger_path(&self, project: &ProjectName, month: LedgerMonth) -> PathBuf {
        self.deref().ledger_path(project, month)
    }
}

/// The main realization of [LedgerStorage]. Ledgers are kept as
/// `<timesheet_dir>/<project>/<yy-mm>.csv`.
pub struct LedgerStorageImpl {
    timesheet_dir: PathBuf,
}

impl LedgerStorageImpl {
    pub fn new(timesheet_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&timesheet_dir)?;

        Ok(Self { timesheet_dir })
    }

    pub fn project_dir(&self, project: &ProjectName) -> PathBuf {
        self.timesheet_dir.join(project.as_str())
    }

    /// Makes sure the directory of `project` exists. Useful before handing a ledger path to
    /// something other than [LedgerStorage::save].
    pub async fn ensure_project_dir(&self, project: &ProjectName) -> Result<PathBuf, LedgerError> {
        let dir = self.project_dir(project);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| LedgerError::StorageUnavailable {
                path: dir.clone(),
                source,
            })?;
        Ok(dir)
    }
}

impl LedgerStorage for LedgerStorageImpl {
    #[instrument(skip(self))]
    async fn load(&self, project: &ProjectName, month: LedgerMonth) -> Result<Ledger, LedgerError> {
        read_ledger(&self.ledger_path(project, month)).await
    }

    #[instrument(skip(self))]
    async fn load_all(&self, project: &ProjectName) -> Result<Ledger, LedgerError> {
        let dir = self.project_dir(project);
        let paths = match list_ledger_files(&dir).await {
            Ok(paths) => paths,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No timesheets for {project} in {dir:?}");
                return Ok(Ledger::new());
            }
            Err(source) => return Err(LedgerError::StorageUnavailable { path: dir, source }),
        };

        let ledgers = stream::iter(paths)
            .map(|path| async move { read_ledger(&path).await })
            .buffered(LOAD_ALL_BUFFER)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(ledgers.into_iter().flatten().collect())
    }

    #[instrument(skip(self, ledger), fields(records = ledger.len()))]
    async fn save(
        &self,
        ledger: &Ledger,
        project: &ProjectName,
        month: LedgerMonth,
    ) -> Result<(), LedgerError> {
        self.ensure_project_dir(project).await?;
        let path = self.ledger_path(project, month);
        let unavailable = |source| LedgerError::StorageUnavailable {
            path: path.clone(),
            source,
        };

        let data = serialize_ledger(ledger).map_err(unavailable)?;
        write_atomically(&path, &data).await.map_err(unavailable)?;

        info!("Saved {} records into {path:?}", ledger.len());
        Ok(())
    }

    fn ledger_path(&self, project: &ProjectName, month: LedgerMonth) -> PathBuf {
        self.project_dir(project)
            .join(format!("{}.{LEDGER_EXTENSION}", month.file_stem()))
    }
}

/// Reads a ledger file. Absence of the file means the ledger is empty.
async fn read_ledger(path: &Path) -> Result<Ledger, LedgerError> {
    async fn read_locked(path: &Path) -> Result<Vec<u8>, io::Error> {
        debug!("Reading {path:?}");
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut data = vec![];
        let result = file.read_to_end(&mut data).await;
        file.unlock_async().await?;
        result?;
        Ok(data)
    }

    match read_locked(path).await {
        Ok(data) => parse_ledger(path, &data),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{path:?} doesn't exist yet, using an empty ledger");
            Ok(Ledger::new())
        }
        Err(source) => Err(LedgerError::StorageUnavailable {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Every `*.csv` file of a project directory, sorted by name.
async fn list_ledger_files(dir: &Path) -> Result<Vec<PathBuf>, io::Error> {
    let mut entries = fs::read_dir(dir).await?;
    let mut paths = vec![];
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_ledger = path
            .extension()
            .is_some_and(|extension| extension == LEDGER_EXTENSION);
        if is_ledger && entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Rows that don't parse fail the whole ledger. Skipping them would silently lose tracked time
/// the next time the ledger is saved.
pub fn parse_ledger(path: &Path, data: &[u8]) -> Result<Ledger, LedgerError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    reader
        .deserialize::<SessionRecord>()
        .map(|record| record.map_err(|e| malformed(path, e)))
        .collect()
}

fn malformed(path: &Path, error: csv::Error) -> LedgerError {
    let line = error.position().map(|position| position.line());
    let reason = match error.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => error.to_string(),
    };
    LedgerError::MalformedRecord {
        path: path.to_owned(),
        line,
        reason,
    }
}

pub fn serialize_ledger(ledger: &Ledger) -> Result<Vec<u8>, io::Error> {
    // The header is written by hand so that empty ledgers still get one.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    writer.write_record(LEDGER_HEADER)?;
    for record in ledger.records() {
        writer.serialize(record)?;
    }
    writer.into_inner().map_err(|e| e.into_error())
}
