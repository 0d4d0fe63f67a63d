//! System Call Interface
//!
//! Kernel side of the user/kernel boundary.
//!
//! # Security Model
//! - Whitelist approach: only the calls in [`SyscallNumber`] exist
//! - Every user pointer is validated before use; a bad pointer kills the
//!   caller with exit status -1 instead of faulting the kernel
//! - Bad handles and failed file operations are ordinary -1 / false returns
//!
//! # Calls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmd_line) -> pid
//! - 3: wait(pid) -> status
//! - 4: create(name, initial_size) -> bool
//! - 5: remove(name) -> bool
//! - 6: open(name) -> fd
//! - 7: filesize(fd) -> length
//! - 8: read(fd, buf, size) -> count
//! - 9: write(fd, buf, size) -> count
//! - 10: seek(fd, position)
//! - 11: tell(fd) -> position
//! - 12: close(fd)

mod error;
mod fault;
mod file;
mod frame;
mod handler;
mod proc;
mod validate;

pub use error::SyscallError;
pub use fault::Fault;
pub use frame::TrapFrame;
pub use handler::{dispatch, numbers, Outcome, SyscallNumber};
pub use validate::{Access, UserBuffer, UserMemory};
