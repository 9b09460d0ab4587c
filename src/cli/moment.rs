use std::fmt::Display;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use chrono_english::parse_date_string;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct MomentArgs {
    #[arg(
        long,
        help = "Use another moment instead of now. Examples are \"10 minutes ago\", \"9:30\", \"15/03/2025 12:00\""
    )]
    at: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

impl MomentArgs {
    #[cfg(test)]
    pub fn now() -> Self {
        Self {
            at: None,
            date_style: DateStyle::Uk,
        }
    }

    #[cfg(test)]
    pub fn at(at: impl Into<String>, date_style: DateStyle) -> Self {
        Self {
            at: Some(at.into()),
            date_style,
        }
    }

    /// Local wall clock moment the command should act at. Without `--at` this is `now`.
    pub fn resolve(&self, now: DateTime<Local>) -> Result<NaiveDateTime> {
        let Some(at) = &self.at else {
            return Ok(now.naive_local());
        };
        let moment = parse_date_string(at, now, self.date_style.into())
            .map_err(|e| anyhow!("Failed to understand {at:?} as a moment: {e}"))?;
        Ok(moment.with_timezone(&Local).naive_local())
    }
}
