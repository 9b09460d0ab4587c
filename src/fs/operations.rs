use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::{
    fs::{self, File},
    io::{self, AsyncWriteExt},
};
use tracing::debug;

/// Sibling file that receives the data before it replaces `path`.
pub fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("ledger"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replaces the contents of `path` with `data` so that a reader sees either the old or the new
/// file, never a partially written one.
/// The data is written to a temporary sibling, synced to disk and then renamed over the target.
pub async fn write_atomically(path: &Path, data: &[u8]) -> Result<(), io::Error> {
    let temporary = temporary_path(path);
    debug!("Writing {} bytes to {temporary:?}", data.len());

    let result = async {
        let mut file = File::create(&temporary).await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temporary, path).await
    }
    .await;

    if result.is_err() {
        // Leftover temporary files are harmless but confusing when browsing the timesheets.
        let _ = fs::remove_file(&temporary).await;
    }
    result
}
