use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// Name of the lock file inside a data directory
const LOCK_FILE: &str = ".lock";

/// How long writers wait for each other by default
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_START: Duration = Duration::from_millis(5);
const RETRY_MAX: Duration = Duration::from_millis(100);

/// Exclusive hold on a data directory for one load-mutate-save cycle.
///
/// Two `tl` processes writing the same directory would otherwise each
/// save their own copy of the list and the later one would win. The
/// lock is an flock on `<data_dir>/.lock`, released when this value is
/// dropped. The file itself stays behind.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    CreateError { path: PathBuf, source: io::Error },
    #[error("{path} is held by another tl process (gave up after {waited:?})")]
    Timeout { path: PathBuf, waited: Duration },
}

impl FileLock {
    /// Lock `data_dir`, creating the directory if it does not exist yet.
    /// Retries with growing pauses until `timeout` has passed.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = open_lock_file(data_dir, &path)
            .map_err(|source| LockError::CreateError { path: path.clone(), source })?;

        let start = Instant::now();
        let mut pause = RETRY_START;
        while !try_flock(&file)? {
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout { path, waited });
            }
            trace!(lock = %path.display(), ?waited, "lock busy, retrying");
            std::thread::sleep(pause.min(timeout - waited));
            pause = (pause * 2).min(RETRY_MAX);
        }

        debug!(lock = %path.display(), "data directory locked");
        Ok(FileLock { _file: file, path })
    }

    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(data_dir: &Path, path: &Path) -> io::Result<File> {
    fs::create_dir_all(data_dir)?;
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
}

/// Non-blocking exclusive flock. `Ok(false)` means someone else holds it.
#[cfg(unix)]
fn try_flock(file: &File) -> Result<bool, LockError> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: the fd is owned by `file`, which outlives the call
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(LockError::CreateError {
            path: PathBuf::from(LOCK_FILE),
            source: err,
        })
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> Result<bool, LockError> {
    Ok(true)
}
