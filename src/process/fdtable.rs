//! Per-Process Descriptor Table
//!
//! Maps small integer handles to open file objects.
//!
//! # Design
//! - Fixed array of `MAX_OPEN_FILES` optional file slots
//! - Occupancy bitmap: bit = 1 iff the slot holds a file
//! - User handle = slot index + 2; handles 0 and 1 are the console streams
//!   and never live in this table
//!
//! # Invariants
//! - `occupied(i)` iff `files[i].is_some()`
//! - A handle is handed out again only after it has been released

use crate::config::{FIRST_FILE_HANDLE, MAX_OPEN_FILES};
use crate::fs::File;

/// Size of the occupancy bitmap in bytes.
const BITMAP_SIZE: usize = MAX_OPEN_FILES.div_ceil(8);

/// A free slot returned by [`DescriptorTable::allocate`].
///
/// Only the table can construct one, so it is always in range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Slot(usize);

impl Slot {
    /// The slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// The user-visible handle number for this slot.
    #[inline]
    pub const fn handle(self) -> i32 {
        self.0 as i32 + FIRST_FILE_HANDLE
    }

    /// Convert a user handle into a slot, rejecting reserved and
    /// out-of-range values.
    #[inline]
    pub const fn from_handle(handle: i32) -> Option<Self> {
        if handle < FIRST_FILE_HANDLE {
            return None;
        }
        let index = (handle - FIRST_FILE_HANDLE) as usize;
        if index >= MAX_OPEN_FILES {
            return None;
        }
        Some(Self(index))
    }
}

/// Open files of one process.
pub struct DescriptorTable<F: File> {
    files: [Option<F>; MAX_OPEN_FILES],
    bitmap: [u8; BITMAP_SIZE],
}

impl<F: File> DescriptorTable<F> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            files: core::array::from_fn(|_| None),
            bitmap: [0; BITMAP_SIZE],
        }
    }

    #[inline]
    fn set_bit(&mut self, index: usize, occupied: bool) {
        let byte_idx = index / 8;
        let bit_idx = index % 8;

        if occupied {
            self.bitmap[byte_idx] |= 1 << bit_idx;
        } else {
            self.bitmap[byte_idx] &= !(1 << bit_idx);
        }
    }

    #[inline]
    fn is_occupied(&self, index: usize) -> bool {
        (self.bitmap[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Find the first free slot. Does not reserve it.
    pub fn allocate(&self) -> Option<Slot> {
        for byte_idx in 0..BITMAP_SIZE {
            if self.bitmap[byte_idx] == 0xFF {
                continue;
            }
            for bit_idx in 0..8 {
                let index = byte_idx * 8 + bit_idx;
                if index >= MAX_OPEN_FILES {
                    break;
                }
                if !self.is_occupied(index) {
                    return Some(Slot(index));
                }
            }
        }
        None
    }

    /// Store an open file in a slot obtained from [`allocate`](Self::allocate).
    ///
    /// Returns the user handle, or hands the file back if the slot was
    /// filled in the meantime.
    pub fn install(&mut self, slot: Slot, file: F) -> Result<i32, F> {
        if self.is_occupied(slot.index()) {
            return Err(file);
        }
        self.files[slot.index()] = Some(file);
        self.set_bit(slot.index(), true);
        Ok(slot.handle())
    }

    /// Look up the file behind a user handle.
    pub fn lookup(&mut self, handle: i32) -> Option<&mut F> {
        let slot = Slot::from_handle(handle)?;
        if !self.is_occupied(slot.index()) {
            return None;
        }
        self.files[slot.index()].as_mut()
    }

    /// Close the file behind a user handle and free its slot.
    ///
    /// Reserved, out-of-range and already-closed handles are ignored.
    /// Returns whether a file was closed.
    pub fn release(&mut self, handle: i32) -> bool {
        let Some(slot) = Slot::from_handle(handle) else {
            return false;
        };
        if !self.is_occupied(slot.index()) {
            return false;
        }
        self.set_bit(slot.index(), false);
        match self.files[slot.index()].take() {
            Some(file) => {
                file.close();
                true
            }
            None => false,
        }
    }

    /// Close every open file. Returns how many were closed.
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for index in 0..MAX_OPEN_FILES {
            if self.release(Slot(index).handle()) {
                closed += 1;
            }
        }
        closed
    }

    /// Number of open files.
    pub fn open_count(&self) -> usize {
        self.bitmap.iter().map(|b| b.count_ones() as usize).sum()
    }
}

impl<F: File> Default for DescriptorTable<F> {
    fn default() -> Self {
        Self::new()
    }
}
