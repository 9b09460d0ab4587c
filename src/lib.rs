//! Simple time management from the terminal.
//! Sessions of work are recorded per project into monthly CSV timesheets, which can then be
//! summarized into daily, weekly and monthly totals.
//!

pub mod cli;
pub mod engine;
pub mod fs;
pub mod ledger;
pub mod utils;
