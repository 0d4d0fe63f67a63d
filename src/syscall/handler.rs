//! System Call Dispatcher
//!
//! Decodes the call number from the user stack and routes to one handler.
//!
//! # Security Considerations
//! - The stack pointer is validated before the call number is read
//! - Unknown call numbers are faults: the caller is terminated with -1
//! - Each handler validates and fetches its own arguments, all of them
//!   before its first side effect
//!
//! # Stack layout at the trap
//! ```text
//!   esp + 12  argument 3
//!   esp +  8  argument 2
//!   esp +  4  argument 1
//!   esp       call number
//! ```

use core::fmt;

use crate::config::WORD_SIZE;
use crate::kernel::{FileOf, Kernel};
use crate::mm::address::VirtAddr;
use crate::process::Process;

use super::error::CallError;
use super::fault::{self, Fault};
use super::frame::TrapFrame;
use super::validate::UserMemory;

/// System call numbers
pub mod numbers {
    pub const SYS_HALT: u32 = 0;
    pub const SYS_EXIT: u32 = 1;
    pub const SYS_EXEC: u32 = 2;
    pub const SYS_WAIT: u32 = 3;
    pub const SYS_CREATE: u32 = 4;
    pub const SYS_REMOVE: u32 = 5;
    pub const SYS_OPEN: u32 = 6;
    pub const SYS_FILESIZE: u32 = 7;
    pub const SYS_READ: u32 = 8;
    pub const SYS_WRITE: u32 = 9;
    pub const SYS_SEEK: u32 = 10;
    pub const SYS_TELL: u32 = 11;
    pub const SYS_CLOSE: u32 = 12;
}

/// Decoded call number.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallNumber {
    Halt = numbers::SYS_HALT,
    Exit = numbers::SYS_EXIT,
    Exec = numbers::SYS_EXEC,
    Wait = numbers::SYS_WAIT,
    Create = numbers::SYS_CREATE,
    Remove = numbers::SYS_REMOVE,
    Open = numbers::SYS_OPEN,
    Filesize = numbers::SYS_FILESIZE,
    Read = numbers::SYS_READ,
    Write = numbers::SYS_WRITE,
    Seek = numbers::SYS_SEEK,
    Tell = numbers::SYS_TELL,
    Close = numbers::SYS_CLOSE,
}

impl SyscallNumber {
    /// Name used in trace output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Halt => "halt",
            Self::Exit => "exit",
            Self::Exec => "exec",
            Self::Wait => "wait",
            Self::Create => "create",
            Self::Remove => "remove",
            Self::Open => "open",
            Self::Filesize => "filesize",
            Self::Read => "read",
            Self::Write => "write",
            Self::Seek => "seek",
            Self::Tell => "tell",
            Self::Close => "close",
        }
    }

    /// Number of argument words above the call number.
    pub const fn arg_count(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit | Self::Exec | Self::Wait | Self::Remove | Self::Open => 1,
            Self::Filesize | Self::Tell | Self::Close => 1,
            Self::Create | Self::Seek => 2,
            Self::Read | Self::Write => 3,
        }
    }

    /// What a logical failure looks like in the return slot.
    const fn failure(self) -> Reply {
        match self {
            Self::Create | Self::Remove => Reply::Bool(false),
            Self::Close | Self::Seek => Reply::Void,
            _ => Reply::Value(-1),
        }
    }
}

impl TryFrom<u32> for SyscallNumber {
    type Error = Fault;

    fn try_from(number: u32) -> Result<Self, Fault> {
        Ok(match number {
            numbers::SYS_HALT => Self::Halt,
            numbers::SYS_EXIT => Self::Exit,
            numbers::SYS_EXEC => Self::Exec,
            numbers::SYS_WAIT => Self::Wait,
            numbers::SYS_CREATE => Self::Create,
            numbers::SYS_REMOVE => Self::Remove,
            numbers::SYS_OPEN => Self::Open,
            numbers::SYS_FILESIZE => Self::Filesize,
            numbers::SYS_READ => Self::Read,
            numbers::SYS_WRITE => Self::Write,
            numbers::SYS_SEEK => Self::Seek,
            numbers::SYS_TELL => Self::Tell,
            numbers::SYS_CLOSE => Self::Close,
            _ => return Err(Fault::UnknownCall(number)),
        })
    }
}

impl fmt::Display for SyscallNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the trap-entry code should do after a system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Return to user mode; the frame's return slot is up to date.
    Resume,
    /// The process called `exit` with this status.
    Exited(i32),
    /// The process was killed for a validation fault.
    Terminated(Fault),
    /// The machine is powering off.
    Halted,
    /// The control block had already terminated; nothing was done.
    NotRunning,
}

/// Result of a handler that returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Reply {
    Value(i32),
    Bool(bool),
    Void,
    Exit(i32),
    Halt,
}

/// State of one in-flight system call.
pub(super) struct Call<'a, K: Kernel> {
    pub(super) kernel: &'a K,
    pub(super) mem: UserMemory<'a, K::Space>,
    pub(super) process: &'a mut Process<FileOf<K>>,
    esp: VirtAddr,
}

impl<'a, K: Kernel> Call<'a, K> {
    /// Argument word `n` (1-based; word 0 is the call number).
    pub(super) fn arg(&self, n: usize) -> Result<u32, Fault> {
        let addr = self
            .esp
            .checked_add(n * WORD_SIZE)
            .ok_or(Fault::AddressOverflow(self.esp))?;
        self.mem.read_u32(addr)
    }

    pub(super) fn arg_i32(&self, n: usize) -> Result<i32, Fault> {
        self.arg(n).map(|word| word as i32)
    }

    pub(super) fn arg_ptr(&self, n: usize) -> Result<VirtAddr, Fault> {
        self.arg(n).map(VirtAddr::from)
    }

    fn run(&mut self) -> Result<Reply, Fault> {
        let raw = self.mem.read_u32(self.esp)?;
        let number = SyscallNumber::try_from(raw).map_err(|fault| {
            log::warn!(
                "[SYSCALL] pid={}: unknown syscall {} (0x{:x})",
                self.process.pid(),
                raw,
                raw
            );
            fault
        })?;

        log::trace!(
            "[SYSCALL] pid={} {}/{} esp={}",
            self.process.pid(),
            number,
            number.arg_count(),
            self.esp
        );

        let result = match number {
            SyscallNumber::Halt => Ok(Reply::Halt),
            SyscallNumber::Exit => self.sys_exit().map(Reply::Exit),
            SyscallNumber::Exec => self.sys_exec().map(Reply::Value),
            SyscallNumber::Wait => self.sys_wait().map(Reply::Value),
            SyscallNumber::Create => self.sys_create().map(Reply::Bool),
            SyscallNumber::Remove => self.sys_remove().map(Reply::Bool),
            SyscallNumber::Open => self.sys_open().map(Reply::Value),
            SyscallNumber::Filesize => self.sys_filesize().map(Reply::Value),
            SyscallNumber::Read => self.sys_read().map(Reply::Value),
            SyscallNumber::Write => self.sys_write().map(Reply::Value),
            SyscallNumber::Seek => self.sys_seek().map(|()| Reply::Void),
            SyscallNumber::Tell => self.sys_tell().map(Reply::Value),
            SyscallNumber::Close => self.sys_close().map(|()| Reply::Void),
        };

        match result {
            Ok(reply) => Ok(reply),
            Err(CallError::Call(err)) => {
                log::debug!(
                    "[SYSCALL] pid={} {} failed: {}",
                    self.process.pid(),
                    number,
                    err
                );
                Ok(number.failure())
            }
            Err(CallError::Fault(fault)) => Err(fault),
        }
    }
}

/// Handle one system call raised by `process`.
///
/// Writes the result into `frame` when the call returns a value. On a
/// validation fault the process is terminated with status -1 and the frame
/// is left untouched.
pub fn dispatch<K: Kernel>(
    kernel: &K,
    process: &mut Process<FileOf<K>>,
    frame: &mut TrapFrame,
) -> Outcome {
    if !process.is_running() {
        log::warn!(
            "[SYSCALL] pid={}: system call from terminated process",
            process.pid()
        );
        return Outcome::NotRunning;
    }

    let result = Call {
        kernel,
        mem: UserMemory::new(kernel.address_space()),
        process: &mut *process,
        esp: VirtAddr::from(frame.stack_pointer()),
    }
    .run();

    match result {
        Ok(Reply::Value(value)) => {
            frame.set_return(value);
            Outcome::Resume
        }
        Ok(Reply::Bool(ok)) => {
            frame.set_return(i32::from(ok));
            Outcome::Resume
        }
        Ok(Reply::Void) => Outcome::Resume,
        Ok(Reply::Exit(status)) => {
            fault::exit_process(kernel, process, status);
            Outcome::Exited(status)
        }
        Ok(Reply::Halt) => {
            log::info!("[SYSCALL] pid={} halt: powering off", process.pid());
            kernel.power_off();
            Outcome::Halted
        }
        Err(fault) => fault::terminate(kernel, process, fault),
    }
}
