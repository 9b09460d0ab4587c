//! Ledgers are the persistent side of claz.
//!  - There is a directory with a subdirectory per project.
//!  - Each project keeps one CSV ledger per calendar month, named `yy-mm.csv`.
//!  - Ledgers are always read and written whole, writes replace the file atomically.

pub mod entities;
pub mod ledger_storage;
