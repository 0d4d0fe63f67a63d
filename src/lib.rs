//! trapgate - System-Call Boundary for a Teaching Kernel
//!
//! Receives untrusted trap frames from user processes, validates every user
//! pointer and string before touching it, decodes the call number and its
//! arguments, and dispatches to file-system and process-control operations.
//!
//! # Trust Boundary
//! - User registers and stack contents are attacker-controlled
//! - Every user address is translated and checked before it is dereferenced
//! - Invalid memory access terminates the caller; invalid handle use does not
//!
//! # Collaborators
//! The virtual-memory layer, the file system, the process manager and the
//! console device live outside this crate. They are reached through the
//! traits in [`mm::paging`], [`fs`], [`process`] and [`drivers::console`],
//! bundled for one call by [`kernel::Kernel`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod drivers;
pub mod fs;
pub mod kernel;
pub mod mm;
pub mod process;
pub mod syscall;

pub use kernel::Kernel;
pub use syscall::{dispatch, Fault, Outcome, TrapFrame};
