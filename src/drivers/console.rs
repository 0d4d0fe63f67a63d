//! Console Wrapper
//!
//! Serializes access to the kernel console. Standard input reads and
//! standard output writes from the system-call layer both go through here.
//!
//! # Guarantees
//! - Input and output sit behind separate locks; a process blocked in
//!   `getc` never holds up output
//! - `put_buf` and `with_output` hold the output lock for a whole buffer, so
//!   one `write(1, ...)` is never interleaved with output from another thread
//! - `getc` blocks inside the input device; the input lock is released
//!   between characters

use core::fmt::{self, Write};

use spin::Mutex;

/// Keyboard side of the console (serial receive, PS/2 buffer, ...).
pub trait ConsoleInput: Send {
    /// Block until one input character is available and return it.
    fn getc(&mut self) -> u8;
}

/// Display side of the console (serial transmit, VGA text buffer, ...).
pub trait ConsoleOutput: Send {
    /// Emit bytes to the output device.
    fn put_bytes(&mut self, bytes: &[u8]);
}

/// Spin-locked console shared by the whole kernel.
pub struct Console<I: ConsoleInput, O: ConsoleOutput> {
    input: Mutex<I>,
    output: Mutex<O>,
}

impl<I: ConsoleInput, O: ConsoleOutput> Console<I, O> {
    /// Pair an input device with an output device.
    pub const fn new(input: I, output: O) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    /// Write a whole buffer as one atomic chunk.
    pub fn put_buf(&self, bytes: &[u8]) {
        self.output.lock().put_bytes(bytes);
    }

    /// Read one character of input, blocking until it arrives.
    pub fn getc(&self) -> u8 {
        self.input.lock().getc()
    }

    /// Run `f` with the output lock held, for output built up in pieces.
    ///
    /// `f` must not log: the logger takes this same lock and would spin
    /// forever.
    pub fn with_output<R>(&self, f: impl FnOnce(&mut O) -> R) -> R {
        f(&mut *self.output.lock())
    }

    /// Run `f` with exclusive access to the input device.
    pub fn with_input<R>(&self, f: impl FnOnce(&mut I) -> R) -> R {
        f(&mut *self.input.lock())
    }
}

impl<I: ConsoleInput + 'static, O: ConsoleOutput + 'static> Console<I, O> {
    /// Route the `log` facade to this console.
    ///
    /// Fails if a logger has already been installed.
    pub fn install_logger(
        &'static self,
        level: log::LevelFilter,
    ) -> Result<(), log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(level);
        Ok(())
    }
}

/// Adapter so `write!` can target a locked output device.
struct OutputWriter<'a, O: ConsoleOutput>(&'a mut O);

impl<O: ConsoleOutput> Write for OutputWriter<'_, O> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.put_bytes(s.as_bytes());
        Ok(())
    }
}

impl<I: ConsoleInput, O: ConsoleOutput> log::Log for Console<I, O> {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut output = self.output.lock();
        let _ = writeln!(
            OutputWriter(&mut *output),
            "[{}] {}",
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}
