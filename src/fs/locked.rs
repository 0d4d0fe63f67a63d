//! Global file-system lock
//!
//! Gives an unsynchronized [`FileSystemMut`] the [`FileSystem`] capability by
//! serializing every name-level operation behind one spinlock.

use spin::Mutex;

use super::{FileSystem, FileSystemMut, FsError};

/// A file system guarded by a single global lock.
pub struct LockedFileSystem<F: FileSystemMut> {
    inner: Mutex<F>,
}

impl<F: FileSystemMut> LockedFileSystem<F> {
    /// Wrap an unsynchronized file system.
    pub const fn new(fs: F) -> Self {
        Self {
            inner: Mutex::new(fs),
        }
    }

    /// Take the lock and get direct access, e.g. for mounting or formatting.
    pub fn lock(&self) -> spin::MutexGuard<'_, F> {
        self.inner.lock()
    }
}

impl<F: FileSystemMut> FileSystem for LockedFileSystem<F> {
    type File = F::File;

    fn create(&self, name: &[u8], initial_size: u32) -> Result<(), FsError> {
        self.inner.lock().create(name, initial_size)
    }

    fn open(&self, name: &[u8]) -> Result<Self::File, FsError> {
        self.inner.lock().open(name)
    }

    fn remove(&self, name: &[u8]) -> Result<(), FsError> {
        self.inner.lock().remove(name)
    }
}
