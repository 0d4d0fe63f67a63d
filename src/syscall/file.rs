//! File System Calls
//!
//! `create`, `remove`, `open`, `close`, `read`, `write`, `seek`, `tell`,
//! `filesize`.
//!
//! # Handle rules
//! - 0 is console input, 1 is console output; neither lives in the table
//! - Any other handle that is not open yields -1 (or false), never a fault
//!
//! # Buffers
//! `read` and `write` validate every page of the user buffer before the
//! first byte moves. All data crosses the boundary through a page-sized
//! kernel bounce buffer, so no allocation grows with the user's size
//! argument. Console output holds the output lock across every chunk of one
//! `write`.

use alloc::vec;
use alloc::vec::Vec;

use crate::config::{NAME_MAX, STDIN_FILENO, STDOUT_FILENO};
use crate::drivers::console::ConsoleOutput;
use crate::fs::{File, FileSystem};
use crate::kernel::Kernel;
use crate::mm::address::PAGE_SIZE;

use super::error::{CallError, SyscallError};
use super::handler::Call;
use super::validate::{Access, UserBuffer};

/// Largest chunk moved between user memory and a file per file-system call.
const BOUNCE_SIZE: usize = PAGE_SIZE;

/// Clamp a byte count into the `i32` return slot.
fn byte_count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl<K: Kernel> Call<'_, K> {
    /// Fetch a file-name argument (at most `NAME_MAX` characters).
    fn arg_name(&self, n: usize) -> Result<Vec<u8>, CallError> {
        let ptr = self.arg_ptr(n)?;
        Ok(self.mem.read_cstring(ptr, NAME_MAX + 1)?)
    }

    /// Resolve a table handle of the current process.
    fn file(&mut self, fd: i32) -> Result<&mut <K::Fs as FileSystem>::File, SyscallError> {
        self.process
            .descriptors_mut()
            .lookup(fd)
            .ok_or(SyscallError::BadDescriptor(fd))
    }

    pub(super) fn sys_create(&mut self) -> Result<bool, CallError> {
        let name = self.arg_name(1)?;
        let initial_size = self.arg(2)?;

        self.kernel.file_system().create(&name, initial_size)?;
        Ok(true)
    }

    pub(super) fn sys_remove(&mut self) -> Result<bool, CallError> {
        let name = self.arg_name(1)?;

        self.kernel.file_system().remove(&name)?;
        Ok(true)
    }

    pub(super) fn sys_open(&mut self) -> Result<i32, CallError> {
        let name = self.arg_name(1)?;

        // Reserve nothing yet: a failed open must leave the slot free.
        let table = self.process.descriptors_mut();
        let slot = table.allocate().ok_or(SyscallError::TableFull)?;
        let file = self.kernel.file_system().open(&name)?;

        match table.install(slot, file) {
            Ok(handle) => Ok(handle),
            Err(file) => {
                file.close();
                Err(SyscallError::TableFull.into())
            }
        }
    }

    pub(super) fn sys_close(&mut self) -> Result<(), CallError> {
        let fd = self.arg_i32(1)?;

        if !self.process.descriptors_mut().release(fd) {
            log::debug!(
                "[SYSCALL] pid={} close({}): not open",
                self.process.pid(),
                fd
            );
        }
        Ok(())
    }

    pub(super) fn sys_read(&mut self) -> Result<i32, CallError> {
        let fd = self.arg_i32(1)?;
        let buffer = self.arg_ptr(2)?;
        let size = self.arg(3)? as usize;
        let buf = self.mem.validate_buffer(buffer, size, Access::Write)?;

        if fd == STDIN_FILENO {
            return self.read_console(&buf);
        }

        let file = self
            .process
            .descriptors_mut()
            .lookup(fd)
            .ok_or(SyscallError::BadDescriptor(fd))?;

        let mut bounce = vec![0u8; buf.len().min(BOUNCE_SIZE)];
        let mut done = 0;
        while done < buf.len() {
            let want = (buf.len() - done).min(BOUNCE_SIZE);
            let got = match file.read(&mut bounce[..want]) {
                Ok(got) => got.min(want),
                Err(err) if done == 0 => return Err(err.into()),
                Err(_) => break,
            };
            self.mem.copy_out(&buf, done, &bounce[..got])?;
            done += got;
            if got < want {
                break;
            }
        }
        Ok(byte_count(done))
    }

    /// Fill `buf` from the console, one character at a time.
    fn read_console(&mut self, buf: &UserBuffer) -> Result<i32, CallError> {
        let console = self.kernel.console();
        for offset in 0..buf.len() {
            let c = console.getc();
            self.mem.copy_out(buf, offset, &[c])?;
        }
        Ok(byte_count(buf.len()))
    }

    pub(super) fn sys_write(&mut self) -> Result<i32, CallError> {
        let fd = self.arg_i32(1)?;
        let buffer = self.arg_ptr(2)?;
        let size = self.arg(3)? as usize;
        let buf = self.mem.validate_buffer(buffer, size, Access::Read)?;

        if fd == STDOUT_FILENO {
            return self.write_console(&buf);
        }

        let file = self
            .process
            .descriptors_mut()
            .lookup(fd)
            .ok_or(SyscallError::BadDescriptor(fd))?;

        let mut bounce = vec![0u8; buf.len().min(BOUNCE_SIZE)];
        let mut done = 0;
        while done < buf.len() {
            let want = (buf.len() - done).min(BOUNCE_SIZE);
            self.mem.copy_in(&buf, done, &mut bounce[..want])?;
            let put = match file.write(&bounce[..want]) {
                Ok(put) => put.min(want),
                Err(err) if done == 0 => return Err(err.into()),
                Err(_) => break,
            };
            done += put;
            if put < want {
                break;
            }
        }
        Ok(byte_count(done))
    }

    /// Copy `buf` to the console one page at a time without releasing the
    /// output lock in between.
    fn write_console(&self, buf: &UserBuffer) -> Result<i32, CallError> {
        let mem = &self.mem;
        let mut bounce = vec![0u8; buf.len().min(BOUNCE_SIZE)];

        self.kernel
            .console()
            .with_output(|out| -> Result<i32, CallError> {
                let mut done = 0;
                while done < buf.len() {
                    let n = (buf.len() - done).min(BOUNCE_SIZE);
                    mem.copy_in(buf, done, &mut bounce[..n])?;
                    out.put_bytes(&bounce[..n]);
                    done += n;
                }
                Ok(byte_count(done))
            })
    }

    pub(super) fn sys_seek(&mut self) -> Result<(), CallError> {
        let fd = self.arg_i32(1)?;
        let position = self.arg_i32(2)?;

        let file = self.file(fd)?;
        // Past-the-end requests land exactly at end of file.
        let target = u32::try_from(position).unwrap_or(0).min(file.length());
        file.seek(target);
        Ok(())
    }

    pub(super) fn sys_tell(&mut self) -> Result<i32, CallError> {
        let fd = self.arg_i32(1)?;

        let position = self.file(fd)?.tell();
        Ok(byte_count(position as usize))
    }

    pub(super) fn sys_filesize(&mut self) -> Result<i32, CallError> {
        let fd = self.arg_i32(1)?;

        let length = self.file(fd)?.length();
        Ok(byte_count(length as usize))
    }
}
