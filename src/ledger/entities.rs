use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
/// Written into the `stop` column while a session is still running.
pub const IN_PROGRESS_FLAG: &str = "IN PROGRESS";

/// End of a session. A session that hasn't been stopped yet is [SessionStop::InProgress].
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum SessionStop {
    Recorded(NaiveTime),
    InProgress,
}

impl SessionStop {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, SessionStop::InProgress)
    }
}

impl Display for SessionStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStop::Recorded(time) => write!(f, "{}", time.format(TIME_FORMAT)),
            SessionStop::InProgress => write!(f, "{IN_PROGRESS_FLAG}"),
        }
    }
}

/// One row of a timesheet. Stored as `date,start,stop`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone)]
pub struct SessionRecord {
    #[serde(with = "date_ser")]
    pub date: NaiveDate,
    #[serde(with = "time_ser")]
    pub start: NaiveTime,
    #[serde(with = "stop_ser")]
    pub stop: SessionStop,
}

impl SessionRecord {
    pub fn open(date: NaiveDate, start: NaiveTime) -> Self {
        Self {
            date,
            start,
            stop: SessionStop::InProgress,
        }
    }

    #[cfg(test)]
    pub fn closed(date: NaiveDate, start: NaiveTime, stop: NaiveTime) -> Self {
        Self {
            date,
            start,
            stop: SessionStop::Recorded(stop),
        }
    }

    pub fn with_stop(self, stop: SessionStop) -> Self {
        Self { stop, ..self }
    }
}

mod date_ser {
    use chrono::NaiveDate;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map_err(|e| D::Error::custom(format!("invalid date {s:?}: {e}")))
    }
}

mod time_ser {
    use chrono::NaiveTime;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, TIME_FORMAT)
            .map_err(|e| D::Error::custom(format!("invalid time {s:?}: {e}")))
    }
}

mod stop_ser {
    use chrono::NaiveTime;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    use super::{SessionStop, IN_PROGRESS_FLAG, TIME_FORMAT};

    pub fn serialize<S>(stop: &SessionStop, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(stop)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SessionStop, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == IN_PROGRESS_FLAG {
            return Ok(SessionStop::InProgress);
        }
        NaiveTime::parse_from_str(&s, TIME_FORMAT)
            .map(SessionStop::Recorded)
            .map_err(|e| {
                D::Error::custom(format!(
                    "invalid stop {s:?}, expected {IN_PROGRESS_FLAG:?} or a time: {e}"
                ))
            })
    }
}

/// Sequence of sessions of a single project for a single month. Ledgers are treated as values:
/// operations on them produce a new ledger instead of changing the old one.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<SessionRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index and value of every record that is still running.
    pub fn open_sessions(&self) -> impl Iterator<Item = (usize, &SessionRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.stop.is_in_progress())
    }

    pub fn has_open_session(&self) -> bool {
        self.open_sessions().next().is_some()
    }

    pub fn with_record(&self, record: SessionRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// Returns a copy where the record at `index` is replaced. `None` if `index` is out of bounds.
    pub fn with_replaced(&self, index: usize, record: SessionRecord) -> Option<Self> {
        let mut records = self.records.clone();
        *records.get_mut(index)? = record;
        Some(Self { records })
    }
}

#[cfg(test)]
impl From<Vec<SessionRecord>> for Ledger {
    fn from(records: Vec<SessionRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<SessionRecord> for Ledger {
    fn from_iter<T: IntoIterator<Item = SessionRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Ledger {
    type Item = SessionRecord;
    type IntoIter = std::vec::IntoIter<SessionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Calendar month a ledger covers. Ledger files are named `yy-mm.csv`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash)]
pub struct LedgerMonth {
    year: i32,
    month: u32,
}

impl LedgerMonth {
    #[cfg(test)]
    pub fn new_opt(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn file_stem(&self) -> String {
        format!("{:02}-{:02}", self.year.rem_euclid(100), self.month)
    }
}

impl Display for LedgerMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// Name of a tracked project. Every project gets a directory of the same name, so names that
/// could escape the timesheet directory are rejected.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Hash)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Project name can't be empty"));
        }
        if s == "." || s == ".." || s.contains(['/', '\\']) || s.contains('\0') {
            return Err(anyhow!("{s:?} can't be used as a project name"));
        }
        Ok(ProjectName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{Ledger, LedgerMonth, ProjectName, SessionRecord, SessionStop};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_ledger_month_file_stem() {
        let month = LedgerMonth::of(NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());
        assert_eq!(month.file_stem(), "24-03");
        assert_eq!(LedgerMonth::new_opt(2009, 11).unwrap().to_string(), "09-11");
        assert!(LedgerMonth::new_opt(2009, 13).is_none());
    }

    #[test]
    fn test_ledger_month_contains() {
        let month = LedgerMonth::new_opt(2024, 3).unwrap();
        assert!(month.contains(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
    }

    #[test]
    fn test_project_name_validation() {
        assert_eq!("  thesis ".parse::<ProjectName>().unwrap().as_str(), "thesis");
        assert!("".parse::<ProjectName>().is_err());
        assert!("..".parse::<ProjectName>().is_err());
        assert!("a/b".parse::<ProjectName>().is_err());
        assert!("a\\b".parse::<ProjectName>().is_err());
    }

    #[test]
    fn test_ledger_values_are_not_shared() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let ledger = Ledger::new();
        let opened = ledger.with_record(SessionRecord::open(date, time(9, 0)));

        assert!(ledger.is_empty());
        assert!(opened.has_open_session());

        let closed = opened
            .with_replaced(0, SessionRecord::closed(date, time(9, 0), time(10, 0)))
            .unwrap();
        assert!(opened.has_open_session());
        assert!(!closed.has_open_session());
        assert!(opened.with_replaced(3, closed.records()[0].clone()).is_none());
    }

    #[test]
    fn test_stop_display() {
        assert_eq!(SessionStop::InProgress.to_string(), "IN PROGRESS");
        assert_eq!(SessionStop::Recorded(time(7, 5)).to_string(), "07:05");
    }
}
