//! Recoverable system-call errors
//!
//! Unlike a [`Fault`], a [`SyscallError`] is the caller's ordinary bad luck:
//! a closed handle, a full table, a missing file. It becomes -1 (or false)
//! in the return slot and the process keeps running.

use core::fmt;

use crate::fs::FsError;
use crate::process::Pid;

use super::fault::Fault;

/// Logical or resource failure reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    /// Handle is reserved, out of range, or not open.
    BadDescriptor(i32),
    /// Every descriptor slot is in use.
    TableFull,
    /// The file system refused the operation.
    FileSystem(FsError),
    /// Not an unwaited child of the caller.
    NoSuchChild(Pid),
    /// The new process could not be created or loaded.
    ExecFailed,
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadDescriptor(fd) => write!(f, "bad file descriptor {}", fd),
            Self::TableFull => write!(f, "descriptor table full"),
            Self::FileSystem(err) => write!(f, "file system: {}", err),
            Self::NoSuchChild(pid) => write!(f, "no child with pid {}", pid),
            Self::ExecFailed => write!(f, "exec failed"),
        }
    }
}

impl From<FsError> for SyscallError {
    fn from(err: FsError) -> Self {
        Self::FileSystem(err)
    }
}

/// Either error class, so handlers can use `?` on both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallError {
    Fault(Fault),
    Call(SyscallError),
}

impl From<Fault> for CallError {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

impl From<SyscallError> for CallError {
    fn from(err: SyscallError) -> Self {
        Self::Call(err)
    }
}

impl From<FsError> for CallError {
    fn from(err: FsError) -> Self {
        Self::Call(err.into())
    }
}
