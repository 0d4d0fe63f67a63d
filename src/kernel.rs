//! Collaborator bundle
//!
//! Everything a system call may touch outside the caller's own control block.
//! The embedding kernel implements [`Kernel`] once; [`dispatch`](crate::dispatch)
//! borrows it for the duration of one call.

use crate::drivers::console::{Console, ConsoleInput, ConsoleOutput};
use crate::fs::FileSystem;
use crate::mm::paging::AddressSpace;
use crate::process::ProcessManager;

/// Services reachable from a system call.
pub trait Kernel {
    /// Page tables of the process that trapped.
    type Space: AddressSpace;
    /// Internally synchronized file system.
    type Fs: FileSystem;
    /// Console keyboard.
    type ConsoleIn: ConsoleInput;
    /// Console display.
    type ConsoleOut: ConsoleOutput;
    /// Process-lifecycle manager.
    type Processes: ProcessManager;

    /// Active address space of the current process.
    fn address_space(&self) -> &Self::Space;

    fn file_system(&self) -> &Self::Fs;

    fn console(&self) -> &Console<Self::ConsoleIn, Self::ConsoleOut>;

    fn processes(&self) -> &Self::Processes;

    /// Power the machine off. A kernel implementation does not return.
    fn power_off(&self);
}

/// Open-file type of a kernel's file system.
pub type FileOf<K> = <<K as Kernel>::Fs as FileSystem>::File;
