//! File-System Contract
//!
//! The file system itself lives outside this crate. The system-call layer
//! consumes it through [`FileSystem`] (name-level operations) and [`File`]
//! (operations on an open file object).
//!
//! # Synchronization
//! `FileSystem: Sync` is the promise that the collaborator serializes its own
//! internal state. The call handlers take no lock around it. A file system
//! without internal locking implements [`FileSystemMut`] instead and is
//! wrapped in a [`LockedFileSystem`].

mod locked;

pub use locked::LockedFileSystem;

use core::fmt;

/// Failure reported by the file-system collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// No file with that name.
    NotFound,
    /// A file with that name already exists.
    Exists,
    /// Out of disk blocks or directory entries.
    NoSpace,
    /// Device or metadata error.
    Io,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no such file"),
            Self::Exists => write!(f, "file exists"),
            Self::NoSpace => write!(f, "no space left"),
            Self::Io => write!(f, "i/o error"),
        }
    }
}

/// An open file object.
pub trait File {
    /// Read from the current position, advancing it. Returns bytes read;
    /// `Ok(0)` at end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Write at the current position, advancing it. Returns bytes written,
    /// which may be short if the file cannot grow.
    fn write(&mut self, buf: &[u8]) -> Result<usize, FsError>;

    /// Move the current position.
    fn seek(&mut self, pos: u32);

    /// Current position in bytes from the start of the file.
    fn tell(&self) -> u32;

    /// File length in bytes.
    fn length(&self) -> u32;

    /// Close the file, releasing the collaborator's resources.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// An internally synchronized file system.
pub trait FileSystem: Sync {
    /// Open file object type.
    type File: File;

    /// Create a file of `initial_size` zero bytes.
    fn create(&self, name: &[u8], initial_size: u32) -> Result<(), FsError>;

    /// Open an existing file.
    fn open(&self, name: &[u8]) -> Result<Self::File, FsError>;

    /// Remove a file by name. Open handles stay usable.
    fn remove(&self, name: &[u8]) -> Result<(), FsError>;
}

/// A file system that needs an external lock.
pub trait FileSystemMut: Send {
    /// Open file object type.
    type File: File;

    fn create(&mut self, name: &[u8], initial_size: u32) -> Result<(), FsError>;
    fn open(&mut self, name: &[u8]) -> Result<Self::File, FsError>;
    fn remove(&mut self, name: &[u8]) -> Result<(), FsError>;
}
