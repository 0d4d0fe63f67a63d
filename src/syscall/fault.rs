//! Fault and Termination Path
//!
//! A [`Fault`] means the caller handed the kernel memory it may not touch,
//! or a call number that does not exist. Faults are never reported back to
//! user space: the process is terminated with exit status -1.
//!
//! # Ordering
//! Handlers fetch and validate every argument before their first mutating
//! step, so a fault never leaves a half-applied operation behind.

use core::fmt;

use crate::config::KILLED_STATUS;
use crate::kernel::{FileOf, Kernel};
use crate::mm::address::VirtAddr;
use crate::process::{Process, ProcessManager};

use super::handler::Outcome;

/// Memory-safety violation by the calling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Address 0.
    NullPointer,
    /// Address at or above the kernel/user split.
    KernelAddress(VirtAddr),
    /// No user-accessible mapping for the page.
    Unmapped(VirtAddr),
    /// Kernel would store into a read-only page.
    NotWritable(VirtAddr),
    /// Range wraps around the end of the address space.
    AddressOverflow(VirtAddr),
    /// No terminator within `limit` bytes.
    Unterminated { addr: VirtAddr, limit: usize },
    /// Call number outside the table.
    UnknownCall(u32),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullPointer => write!(f, "null pointer"),
            Self::KernelAddress(addr) => write!(f, "kernel address {}", addr),
            Self::Unmapped(addr) => write!(f, "unmapped address {}", addr),
            Self::NotWritable(addr) => write!(f, "read-only address {}", addr),
            Self::AddressOverflow(addr) => write!(f, "range at {} wraps around", addr),
            Self::Unterminated { addr, limit } => {
                write!(f, "string at {} unterminated within {} bytes", addr, limit)
            }
            Self::UnknownCall(number) => write!(f, "unknown system call {}", number),
        }
    }
}

/// Record `status` for the parent and tear the current process down.
///
/// Shared by voluntary `exit` and by fault termination.
pub(crate) fn exit_process<K: Kernel>(
    kernel: &K,
    process: &mut Process<FileOf<K>>,
    status: i32,
) {
    let processes = kernel.processes();
    processes.record_exit_status(status);
    log::info!("{}: exit({})", process.name(), status);

    let closed = process.mark_terminated();
    if closed > 0 {
        log::debug!("[SYSCALL] pid={} closed {} open files", process.pid(), closed);
    }
    processes.terminate_current();
}

/// RUNNING -> TERMINATED for a process that faulted.
pub(crate) fn terminate<K: Kernel>(
    kernel: &K,
    process: &mut Process<FileOf<K>>,
    fault: Fault,
) -> Outcome {
    log::warn!(
        "[FAULT] pid={} ({}): {}, terminating",
        process.pid(),
        process.name(),
        fault
    );
    exit_process(kernel, process, KILLED_STATUS);
    Outcome::Terminated(fault)
}
