//! Device drivers used by the system-call layer
//!
//! All drivers follow these principles:
//! - Hardware access stays behind a small trait
//! - Shared devices are protected by a spinlock
//! - No panics on invalid input

pub mod console;

pub use console::{Console, ConsoleInput, ConsoleOutput};
