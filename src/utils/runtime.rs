use anyhow::Result;

/// Claz is strictly sequential, a single thread drives all of the file operations.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
