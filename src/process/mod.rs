//! Process Control Interface
//!
//! The process manager (creation, scheduling, reaping) lives outside this
//! crate. It owns one [`Process`] control block per process and lends the
//! current one to the system-call layer for the duration of a single call.
//!
//! # Lifecycle seen from a system call
//! ```text
//!   RUNNING ──(exit / validation fault)──▶ TERMINATED
//! ```

pub mod fdtable;

pub use fdtable::{DescriptorTable, Slot};

use alloc::string::String;

use crate::fs::File;

/// Process identifier.
pub type Pid = i32;

/// Process-lifecycle collaborator.
///
/// Methods act on the process currently executing the system call.
pub trait ProcessManager {
    /// Create a new process running `cmd_line`. Returns its pid once the
    /// child has loaded, or `None` if creation or loading failed.
    fn spawn(&self, cmd_line: &[u8]) -> Option<Pid>;

    /// Block until child `pid` exits and return its exit status.
    /// Returns `None` if `pid` is not an unwaited child of the caller.
    fn wait(&self, pid: Pid) -> Option<i32>;

    /// Store the current process's exit status in its parent's bookkeeping.
    fn record_exit_status(&self, status: i32);

    /// Tear down the current process.
    ///
    /// A kernel implementation switches away and never returns here.
    fn terminate_current(&self);
}

/// Run state of a process as seen by the system-call layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Terminated,
}

/// Per-process state the system-call layer reads and mutates.
pub struct Process<F: File> {
    pid: Pid,
    name: String,
    descriptors: DescriptorTable<F>,
    state: RunState,
}

impl<F: File> Process<F> {
    /// Create a running process with an empty descriptor table.
    pub fn new(pid: Pid, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            descriptors: DescriptorTable::new(),
            state: RunState::Running,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Program name, as printed in the exit line.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn descriptors(&self) -> &DescriptorTable<F> {
        &self.descriptors
    }

    pub fn descriptors_mut(&mut self) -> &mut DescriptorTable<F> {
        &mut self.descriptors
    }

    /// Move to TERMINATED, closing every open file.
    ///
    /// Returns the number of files closed. Idempotent.
    pub fn mark_terminated(&mut self) -> usize {
        if self.state == RunState::Terminated {
            return 0;
        }
        self.state = RunState::Terminated;
        self.descriptors.close_all()
    }
}
