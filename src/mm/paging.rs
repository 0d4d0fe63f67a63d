//! Address Translation Contract
//!
//! The page-table layer is owned by the virtual-memory subsystem. This crate
//! only asks one question of it: "what does this user page map to, and with
//! which permissions?"
//!
//! # Security Properties
//! - A page is usable by the kernel on a process's behalf only if it is
//!   PRESENT and USER
//! - Pages the kernel stores into must also be WRITABLE

use core::ptr::NonNull;

use bitflags::bitflags;

use super::address::VirtAddr;

bitflags! {
    /// Page table entry permission bits (x86 PTE layout).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u32 {
        /// Entry maps a frame.
        const PRESENT = 1 << 0;
        /// Frame may be written.
        const WRITABLE = 1 << 1;
        /// Frame is accessible from user mode.
        const USER = 1 << 2;

        /// Ordinary user data page.
        const USER_DATA = Self::PRESENT.bits() | Self::WRITABLE.bits() | Self::USER.bits();
        /// Read-only user page (code, rodata).
        const USER_RODATA = Self::PRESENT.bits() | Self::USER.bits();
    }
}

/// Result of a successful page lookup.
#[derive(Debug, Clone, Copy)]
pub struct Translation {
    /// Kernel-accessible address of the first byte of the mapped frame.
    pub frame: NonNull<u8>,
    /// Permissions of the mapping.
    pub flags: PageFlags,
}

impl Translation {
    /// Check whether user code may access the page at all.
    #[inline]
    pub fn is_user_accessible(&self) -> bool {
        self.flags.contains(PageFlags::PRESENT | PageFlags::USER)
    }
}

/// The current process's active address-translation structure.
///
/// # Safety
/// Implementors promise that every `Translation` they return points at a
/// frame of [`PAGE_SIZE`](super::address::PAGE_SIZE) bytes that stays mapped
/// and valid for reads and writes until the current system call returns.
pub unsafe trait AddressSpace {
    /// Look up the page containing `addr`.
    ///
    /// Returns `None` for unmapped pages. Must not fault for any input.
    fn translate(&self, addr: VirtAddr) -> Option<Translation>;
}

unsafe impl<S: AddressSpace + ?Sized> AddressSpace for &S {
    fn translate(&self, addr: VirtAddr) -> Option<Translation> {
        (**self).translate(addr)
    }
}
