//! Memory management interface for trapgate
//!
//! Provides:
//! - User virtual address type and the user/kernel split
//! - The address-translation contract implemented by the VM subsystem
//!
//! # Security Principles
//! - User addresses are plain numbers until translated
//! - Translation never faults; an unmapped page is an ordinary answer

pub mod address;
pub mod paging;

pub use address::{VirtAddr, PAGE_SIZE, USER_SPACE_LIMIT};
pub use paging::{AddressSpace, PageFlags, Translation};
