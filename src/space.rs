//! Usable-space queries for the filesystem behind each node path.
//!
//! Two implementations of [`UsableSpace`]:
//!
//! - [`StatvfsSpace`] — live readings via `libc::statvfs`.
//! - [`FixedSpace`] — a settable figure, for simulations and tests.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Reports the bytes an unprivileged writer can still use on a volume.
///
/// Every call is a fresh reading; implementations must not cache.
pub trait UsableSpace: Send + Sync + fmt::Debug {
    fn usable_space(&self) -> io::Result<u64>;
}

/// Usable space of the filesystem containing `path`.
#[derive(Debug, Clone)]
pub struct StatvfsSpace {
    path: PathBuf,
}

impl StatvfsSpace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsableSpace for StatvfsSpace {
    fn usable_space(&self) -> io::Result<u64> {
        statvfs_available(&self.path)
    }
}

#[cfg(unix)]
fn statvfs_available(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: `c_path` is a valid NUL-terminated string and `stat` is a
    // zeroed out-parameter; statvfs only writes to `stat` during the call.
    let stat = unsafe {
        let mut stat: libc::statvfs = std::mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(io::Error::last_os_error());
        }
        stat
    };

    // f_bavail excludes blocks reserved for root.
    Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
}

#[cfg(not(unix))]
fn statvfs_available(_path: &Path) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "usable space queries require a unix platform",
    ))
}

/// A volume whose usable space is whatever was last set.
#[derive(Debug, Default)]
pub struct FixedSpace {
    bytes: AtomicU64,
}

impl FixedSpace {
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes: AtomicU64::new(bytes),
        }
    }

    pub fn set(&self, bytes: u64) {
        self.bytes.store(bytes, Ordering::Relaxed);
    }
}

impl UsableSpace for FixedSpace {
    fn usable_space(&self) -> io::Result<u64> {
        Ok(self.bytes.load(Ordering::Relaxed))
    }
}
