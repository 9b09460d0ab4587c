use chrono::{DateTime, Local};

/// Represents an entity responsible for providing the current time across the application. The
/// engine never asks for it directly, the cli resolves it once and passes it down.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn time(&self) -> DateTime<Local>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }
}
