//! User Pointer Validation
//!
//! Decides whether user-supplied addresses are safe to touch, and copies
//! bytes across the boundary only through checked translations.
//!
//! # Security Principles
//! - Validate ALL inputs before use
//! - Fail-secure: anything not provably mapped is a fault
//! - Never read past the first invalid byte:
//!   - strings are scanned one byte at a time, translating at every page
//!     crossing before the first byte of the new page is read
//!   - buffers are validated page by page before any byte moves
//! - Null, kernel and unmapped addresses are rejected explicitly

use alloc::vec::Vec;
use core::ptr;

use crate::config::WORD_SIZE;
use crate::mm::address::{VirtAddr, PAGE_SIZE};
use crate::mm::paging::{AddressSpace, PageFlags, Translation};

use super::fault::Fault;

/// Direction of a user buffer, from the kernel's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The kernel reads the buffer (`write`, strings, arguments).
    Read,
    /// The kernel stores into the buffer (`read`).
    Write,
}

/// A user buffer whose every page has been validated for `access`.
///
/// Only [`UserMemory::validate_buffer`] constructs one.
#[derive(Debug, Clone, Copy)]
pub struct UserBuffer {
    addr: VirtAddr,
    len: usize,
    access: Access,
}

impl UserBuffer {
    pub fn addr(&self) -> VirtAddr {
        self.addr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn access(&self) -> Access {
        self.access
    }
}

/// Checked view of the current process's user memory.
pub struct UserMemory<'a, S: AddressSpace> {
    space: &'a S,
}

impl<'a, S: AddressSpace> UserMemory<'a, S> {
    pub fn new(space: &'a S) -> Self {
        Self { space }
    }

    /// Translate one address, enforcing null, split and permission checks.
    fn check(&self, addr: VirtAddr, access: Access) -> Result<Translation, Fault> {
        if addr.is_null() {
            return Err(Fault::NullPointer);
        }
        if !addr.is_user() {
            return Err(Fault::KernelAddress(addr));
        }
        let translation = self
            .space
            .translate(addr)
            .filter(Translation::is_user_accessible)
            .ok_or(Fault::Unmapped(addr))?;
        if access == Access::Write && !translation.flags.contains(PageFlags::WRITABLE) {
            return Err(Fault::NotWritable(addr));
        }
        Ok(translation)
    }

    /// Kernel pointer to the byte at `addr`.
    fn byte_ptr(&self, addr: VirtAddr, access: Access) -> Result<*mut u8, Fault> {
        let translation = self.check(addr, access)?;
        // SAFETY: the frame is PAGE_SIZE bytes (AddressSpace contract) and
        // page_offset() < PAGE_SIZE.
        Ok(unsafe { translation.frame.as_ptr().add(addr.page_offset()) })
    }

    /// True iff `addr` is non-null, below the split and mapped for user access.
    pub fn validate_scalar(&self, addr: VirtAddr) -> bool {
        self.check(addr, Access::Read).is_ok()
    }

    /// True iff both the first and the last byte of `[addr, addr + len)` pass
    /// [`validate_scalar`](Self::validate_scalar).
    ///
    /// Interior pages are not examined; use [`validate_buffer`](Self::validate_buffer)
    /// for anything longer than a word.
    pub fn validate_range(&self, addr: VirtAddr, len: usize) -> bool {
        if len == 0 {
            return self.validate_scalar(addr);
        }
        match addr.checked_add(len - 1) {
            Some(last) => self.validate_scalar(addr) && self.validate_scalar(last),
            None => false,
        }
    }

    /// Validate every page touched by `[addr, addr + len)`.
    ///
    /// A zero-length buffer still needs a valid start address.
    pub fn validate_buffer(
        &self,
        addr: VirtAddr,
        len: usize,
        access: Access,
    ) -> Result<UserBuffer, Fault> {
        self.check(addr, access)?;
        if len > 1 {
            let last = addr
                .checked_add(len - 1)
                .ok_or(Fault::AddressOverflow(addr))?;
            let mut page = addr.align_down();
            while let Some(next) = page.checked_add(PAGE_SIZE) {
                if next > last {
                    break;
                }
                self.check(next, access)?;
                page = next;
            }
        }
        Ok(UserBuffer { addr, len, access })
    }

    /// Scan a NUL-terminated string of at most `max_len` bytes including the
    /// terminator. Returns its length without the terminator.
    pub fn validate_cstring(&self, addr: VirtAddr, max_len: usize) -> Result<usize, Fault> {
        self.scan_cstring(addr, max_len, |_| {})
    }

    /// Validate a NUL-terminated string and copy it into the kernel,
    /// without the terminator.
    pub fn read_cstring(&self, addr: VirtAddr, max_len: usize) -> Result<Vec<u8>, Fault> {
        let mut bytes = Vec::new();
        self.scan_cstring(addr, max_len, |b| bytes.push(b))?;
        Ok(bytes)
    }

    fn scan_cstring(
        &self,
        addr: VirtAddr,
        max_len: usize,
        mut sink: impl FnMut(u8),
    ) -> Result<usize, Fault> {
        let mut page: Option<(usize, Translation)> = None;

        for i in 0..max_len {
            let va = addr.checked_add(i).ok_or(Fault::AddressOverflow(addr))?;
            let translation = match page {
                Some((number, translation)) if number == va.page_number() => translation,
                _ => {
                    let translation = self.check(va, Access::Read)?;
                    page = Some((va.page_number(), translation));
                    translation
                }
            };

            // SAFETY: translation was checked for this page just above, the
            // frame is PAGE_SIZE bytes and page_offset() < PAGE_SIZE.
            let byte = unsafe { ptr::read(translation.frame.as_ptr().add(va.page_offset())) };
            if byte == 0 {
                return Ok(i);
            }
            sink(byte);
        }

        Err(Fault::Unterminated {
            addr,
            limit: max_len,
        })
    }

    /// Read one little-endian argument word after checking both its ends.
    pub fn read_u32(&self, addr: VirtAddr) -> Result<u32, Fault> {
        let last = addr
            .checked_add(WORD_SIZE - 1)
            .ok_or(Fault::AddressOverflow(addr))?;
        self.check(addr, Access::Read)?;
        self.check(last, Access::Read)?;

        let mut word = [0u8; WORD_SIZE];
        for (i, byte) in word.iter_mut().enumerate() {
            let va = addr.checked_add(i).ok_or(Fault::AddressOverflow(addr))?;
            let src = self.byte_ptr(va, Access::Read)?;
            // SAFETY: byte_ptr only returns pointers into checked frames.
            *byte = unsafe { ptr::read(src) };
        }
        Ok(u32::from_le_bytes(word))
    }

    /// Walk `[start, start + len)` one page-contained chunk at a time.
    fn for_each_chunk(
        &self,
        start: VirtAddr,
        len: usize,
        access: Access,
        mut f: impl FnMut(*mut u8, usize, usize),
    ) -> Result<(), Fault> {
        let mut done = 0;
        while done < len {
            let va = start.checked_add(done).ok_or(Fault::AddressOverflow(start))?;
            let chunk = (PAGE_SIZE - va.page_offset()).min(len - done);
            let ptr = self.byte_ptr(va, access)?;
            f(ptr, done, chunk);
            done += chunk;
        }
        Ok(())
    }

    /// Copy `dst.len()` bytes starting `offset` bytes into `buf`.
    pub fn copy_in(&self, buf: &UserBuffer, offset: usize, dst: &mut [u8]) -> Result<(), Fault> {
        debug_assert!(offset + dst.len() <= buf.len());
        let start = buf
            .addr
            .checked_add(offset)
            .ok_or(Fault::AddressOverflow(buf.addr))?;
        let dst_ptr = dst.as_mut_ptr();
        self.for_each_chunk(start, dst.len(), Access::Read, |src, done, n| {
            // SAFETY: src covers n bytes inside one checked frame; dst has
            // room for done + n bytes; kernel and user frames never overlap.
            unsafe { ptr::copy_nonoverlapping(src, dst_ptr.add(done), n) };
        })
    }

    /// Copy `src` into `buf` starting `offset` bytes in.
    pub fn copy_out(&self, buf: &UserBuffer, offset: usize, src: &[u8]) -> Result<(), Fault> {
        debug_assert!(offset + src.len() <= buf.len());
        let start = buf
            .addr
            .checked_add(offset)
            .ok_or(Fault::AddressOverflow(buf.addr))?;
        let src_ptr = src.as_ptr();
        self.for_each_chunk(start, src.len(), Access::Write, |dst, done, n| {
            // SAFETY: dst covers n writable bytes inside one checked frame;
            // src holds done + n bytes; the regions do not overlap.
            unsafe { ptr::copy_nonoverlapping(src_ptr.add(done), dst, n) };
        })
    }
}
