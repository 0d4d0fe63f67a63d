//! Process Control Calls
//!
//! `exit`, `exec` and `wait`. `halt` needs no arguments and is handled by
//! the dispatcher directly.

use crate::config::CMDLINE_MAX;
use crate::kernel::Kernel;
use crate::process::ProcessManager;

use super::error::{CallError, SyscallError};
use super::handler::Call;

impl<K: Kernel> Call<'_, K> {
    /// Fetch the exit status. Teardown happens in the dispatcher.
    pub(super) fn sys_exit(&mut self) -> Result<i32, CallError> {
        Ok(self.arg_i32(1)?)
    }

    pub(super) fn sys_exec(&mut self) -> Result<i32, CallError> {
        let cmd_ptr = self.arg_ptr(1)?;
        let cmd_line = self.mem.read_cstring(cmd_ptr, CMDLINE_MAX)?;

        let pid = self
            .kernel
            .processes()
            .spawn(&cmd_line)
            .ok_or(SyscallError::ExecFailed)?;
        log::debug!(
            "[SYSCALL] pid={} exec: started pid {}",
            self.process.pid(),
            pid
        );
        Ok(pid)
    }

    pub(super) fn sys_wait(&mut self) -> Result<i32, CallError> {
        let pid = self.arg_i32(1)?;

        Ok(self
            .kernel
            .processes()
            .wait(pid)
            .ok_or(SyscallError::NoSuchChild(pid))?)
    }
}
