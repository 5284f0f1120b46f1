use std::{
    fs::File,
    path::Path,
    time::{Duration, Instant},
};

use fs4::fs_std::FileExt;
use log::debug;
use thiserror::Error;

const LOCK_TIMEOUT: Duration = Duration::from_secs(300);
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Exclusive advisory lock held for as long as the value is alive.
pub struct FileLock {
    _file: File,
}

#[derive(Error, Debug)]
#[error("Could not lock {path}: {source}")]
pub struct Error {
    path: String,
    #[source]
    source: std::io::Error,
}

impl FileLock {
    pub fn acquire(path: &Path) -> Result<Self, Error> {
        Self::acquire_with_timeout(path, LOCK_TIMEOUT)
    }

    pub fn acquire_with_timeout(path: &Path, timeout: Duration) -> Result<Self, Error> {
        let error = |source| Error {
            path: path.display().to_string(),
            source,
        };
        let file = File::create(path).map_err(error)?;
        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(_) => return Ok(Self { _file: file }),
                Err(e)
                    if e.raw_os_error() == fs4::lock_contended_error().raw_os_error()
                        && start.elapsed() < timeout =>
                {
                    debug!("{} is locked by another process, retrying", path.display());
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(error(e)),
            }
        }
    }
}
