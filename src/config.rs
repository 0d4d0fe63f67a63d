//! Build-time kernel configuration
//!
//! Limits and ABI constants shared by the validator, the descriptor table and
//! the call handlers. A kernel is configured when it is built; nothing here is
//! adjustable at run time.

/// Interrupt vector user programs raise to enter the kernel.
pub const SYSCALL_VECTOR: u8 = 0x30;

/// Privilege level allowed to raise [`SYSCALL_VECTOR`].
pub const SYSCALL_DPL: u8 = 3;

/// Size of one argument word on the user stack.
pub const WORD_SIZE: usize = 4;

/// Number of file slots in each process's descriptor table.
pub const MAX_OPEN_FILES: usize = 128;

/// Handle reserved for the console input stream.
pub const STDIN_FILENO: i32 = 0;

/// Handle reserved for the console output stream.
pub const STDOUT_FILENO: i32 = 1;

/// First handle number backed by the descriptor table.
pub const FIRST_FILE_HANDLE: i32 = 2;

/// Longest file name the file system accepts, not counting the terminator.
pub const NAME_MAX: usize = 14;

/// Longest command line accepted by `exec`, including the terminator.
pub const CMDLINE_MAX: usize = 2048;

/// Exit status recorded for processes killed by the kernel.
pub const KILLED_STATUS: i32 = -1;
