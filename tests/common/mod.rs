//! Host-side mock kernel for driving `dispatch` end to end.

#![allow(dead_code)]

use std::cell::{Cell, RefCell, UnsafeCell};
use std::collections::{BTreeMap, VecDeque};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use trapgate::drivers::{Console, ConsoleInput, ConsoleOutput};
use trapgate::fs::{File, FileSystem, FsError};
use trapgate::mm::{AddressSpace, PageFlags, Translation, VirtAddr, PAGE_SIZE};
use trapgate::process::{Pid, Process, ProcessManager};
use trapgate::syscall::numbers::*;
use trapgate::{dispatch, Kernel, Outcome, TrapFrame};

/// Read-only user page (program text).
pub const CODE_PAGE: usize = 0x0804_8000;
/// Two consecutive writable pages.
pub const DATA_PAGE: usize = 0x0805_0000;
/// Page after the data pages; never mapped.
pub const HOLE_PAGE: usize = DATA_PAGE + 2 * PAGE_SIZE;
/// Top user stack page.
pub const STACK_PAGE: usize = 0xBFFF_F000;
/// Default user stack pointer.
pub const ESP: u32 = 0xBFFF_FF00;

/// Scratch addresses inside the data pages.
pub const NAME_ADDR: usize = DATA_PAGE + 0x100;
pub const OUT_ADDR: usize = DATA_PAGE + 0x400;
pub const IN_ADDR: usize = DATA_PAGE + 0x800;

/// Value parked in `eax` to detect untouched frames.
pub const EAX_SENTINEL: u32 = 0x5A5A_5A5A;

// ---------------------------------------------------------------------------
// Address space
// ---------------------------------------------------------------------------

pub struct SimSpace {
    pages: BTreeMap<usize, (Box<UnsafeCell<[u8; PAGE_SIZE]>>, PageFlags)>,
}

impl SimSpace {
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    pub fn map(&mut self, addr: usize, flags: PageFlags) {
        self.pages.insert(
            VirtAddr::new(addr).page_number(),
            (Box::new(UnsafeCell::new([0; PAGE_SIZE])), flags),
        );
    }

    pub fn poke(&mut self, addr: usize, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            let va = VirtAddr::new(addr + i);
            let (frame, _) = self
                .pages
                .get_mut(&va.page_number())
                .expect("poke into unmapped page");
            frame.get_mut()[va.page_offset()] = b;
        }
    }

    pub fn peek(&self, addr: usize, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| {
                let va = VirtAddr::new(addr + i);
                let (frame, _) = self
                    .pages
                    .get(&va.page_number())
                    .expect("peek into unmapped page");
                // SAFETY: no mutable reference into the frame is live.
                unsafe { (*frame.get())[va.page_offset()] }
            })
            .collect()
    }
}

unsafe impl AddressSpace for SimSpace {
    fn translate(&self, addr: VirtAddr) -> Option<Translation> {
        self.pages
            .get(&addr.page_number())
            .map(|(frame, flags)| Translation {
                frame: NonNull::new(frame.get() as *mut u8).expect("boxed frame"),
                flags: *flags,
            })
    }
}

// ---------------------------------------------------------------------------
// File system
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RamFsInner {
    files: BTreeMap<Vec<u8>, Arc<Mutex<Vec<u8>>>>,
    open_calls: usize,
    create_calls: usize,
}

#[derive(Default)]
pub struct RamFs {
    inner: Mutex<RamFsInner>,
    closes: Arc<AtomicUsize>,
}

impl RamFs {
    pub fn open_calls(&self) -> usize {
        self.inner.lock().unwrap().open_calls
    }

    pub fn create_calls(&self) -> usize {
        self.inner.lock().unwrap().create_calls
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(name.as_bytes())
            .map(|data| data.lock().unwrap().clone())
    }
}

impl FileSystem for RamFs {
    type File = RamFile;

    fn create(&self, name: &[u8], initial_size: u32) -> Result<(), FsError> {
        let mut inner = self.inner.lock().unwrap();
        inner.create_calls += 1;
        if name.is_empty() {
            return Err(FsError::NotFound);
        }
        if inner.files.contains_key(name) {
            return Err(FsError::Exists);
        }
        inner.files.insert(
            name.to_vec(),
            Arc::new(Mutex::new(vec![0; initial_size as usize])),
        );
        Ok(())
    }

    fn open(&self, name: &[u8]) -> Result<RamFile, FsError> {
        let mut inner = self.inner.lock().unwrap();
        inner.open_calls += 1;
        let data = inner.files.get(name).ok_or(FsError::NotFound)?;
        Ok(RamFile {
            data: Arc::clone(data),
            pos: 0,
            closes: Arc::clone(&self.closes),
        })
    }

    fn remove(&self, name: &[u8]) -> Result<(), FsError> {
        let mut inner = self.inner.lock().unwrap();
        inner.files.remove(name).map(|_| ()).ok_or(FsError::NotFound)
    }
}

pub struct RamFile {
    data: Arc<Mutex<Vec<u8>>>,
    pos: u32,
    closes: Arc<AtomicUsize>,
}

impl File for RamFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        let data = self.data.lock().unwrap();
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.pos += n as u32;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, FsError> {
        let mut data = self.data.lock().unwrap();
        let start = self.pos as usize;
        if data.len() < start + buf.len() {
            data.resize(start + buf.len(), 0);
        }
        data[start..start + buf.len()].copy_from_slice(buf);
        self.pos += buf.len() as u32;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: u32) {
        self.pos = pos;
    }

    fn tell(&self) -> u32 {
        self.pos
    }

    fn length(&self) -> u32 {
        self.data.lock().unwrap().len() as u32
    }

    fn close(self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Process manager
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Procs {
    pub recorded_status: Cell<Option<i32>>,
    pub terminations: Cell<u32>,
    pub spawned: RefCell<Vec<Vec<u8>>>,
    pub children: RefCell<BTreeMap<Pid, i32>>,
    pub fail_spawn: Cell<bool>,
}

impl ProcessManager for Procs {
    fn spawn(&self, cmd_line: &[u8]) -> Option<Pid> {
        if self.fail_spawn.get() {
            return None;
        }
        let mut spawned = self.spawned.borrow_mut();
        spawned.push(cmd_line.to_vec());
        Some(100 + spawned.len() as Pid)
    }

    fn wait(&self, pid: Pid) -> Option<i32> {
        self.children.borrow_mut().remove(&pid)
    }

    fn record_exit_status(&self, status: i32) {
        self.recorded_status.set(Some(status));
    }

    fn terminate_current(&self) {
        self.terminations.set(self.terminations.get() + 1);
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Keyboard {
    pub pending: VecDeque<u8>,
}

impl ConsoleInput for Keyboard {
    fn getc(&mut self) -> u8 {
        self.pending.pop_front().unwrap_or(b'\n')
    }
}

#[derive(Default)]
pub struct Recorder {
    pub output: Vec<u8>,
    pub writes: usize,
}

impl ConsoleOutput for Recorder {
    fn put_bytes(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
        self.writes += 1;
    }
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

pub struct MockKernel {
    pub space: SimSpace,
    pub fs: RamFs,
    pub console: Console<Keyboard, Recorder>,
    pub procs: Procs,
    pub powered_off: Cell<bool>,
}

impl Kernel for MockKernel {
    type Space = SimSpace;
    type Fs = RamFs;
    type ConsoleIn = Keyboard;
    type ConsoleOut = Recorder;
    type Processes = Procs;

    fn address_space(&self) -> &SimSpace {
        &self.space
    }

    fn file_system(&self) -> &RamFs {
        &self.fs
    }

    fn console(&self) -> &Console<Keyboard, Recorder> {
        &self.console
    }

    fn processes(&self) -> &Procs {
        &self.procs
    }

    fn power_off(&self) {
        self.powered_off.set(true);
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub kernel: MockKernel,
    pub process: Process<RamFile>,
}

impl Harness {
    pub fn new() -> Self {
        let mut space = SimSpace::new();
        space.map(CODE_PAGE, PageFlags::USER_RODATA);
        space.map(DATA_PAGE, PageFlags::USER_DATA);
        space.map(DATA_PAGE + PAGE_SIZE, PageFlags::USER_DATA);
        space.map(STACK_PAGE, PageFlags::USER_DATA);

        Self {
            kernel: MockKernel {
                space,
                fs: RamFs::default(),
                console: Console::new(Keyboard::default(), Recorder::default()),
                procs: Procs::default(),
                powered_off: Cell::new(false),
            },
            process: Process::new(7, "child"),
        }
    }

    pub fn poke(&mut self, addr: usize, bytes: &[u8]) {
        self.kernel.space.poke(addr, bytes);
    }

    pub fn peek(&self, addr: usize, len: usize) -> Vec<u8> {
        self.kernel.space.peek(addr, len)
    }

    /// Store a NUL-terminated string and return its user address.
    pub fn put_cstr(&mut self, addr: usize, s: &str) -> u32 {
        self.poke(addr, s.as_bytes());
        self.poke(addr + s.len(), &[0]);
        addr as u32
    }

    /// Dispatch with the given stack pointer without touching the stack.
    pub fn trap(&mut self, esp: u32) -> (Outcome, TrapFrame) {
        let mut frame = TrapFrame::with_stack(esp);
        frame.eax = EAX_SENTINEL;
        let outcome = dispatch(&self.kernel, &mut self.process, &mut frame);
        (outcome, frame)
    }

    /// Lay out `words` at `esp` and dispatch.
    pub fn raw_call(&mut self, esp: u32, words: &[u32]) -> (Outcome, TrapFrame) {
        for (i, word) in words.iter().enumerate() {
            self.poke(esp as usize + 4 * i, &word.to_le_bytes());
        }
        self.trap(esp)
    }

    /// Issue call `number` with `args` on the default stack.
    pub fn call(&mut self, number: u32, args: &[u32]) -> (Outcome, i32) {
        let mut words = vec![number];
        words.extend_from_slice(args);
        let (outcome, frame) = self.raw_call(ESP, &words);
        (outcome, frame.return_value())
    }

    /// Issue a call that must return to user mode; yields the return slot.
    pub fn ok_call(&mut self, number: u32, args: &[u32]) -> i32 {
        let (outcome, ret) = self.call(number, args);
        assert_eq!(outcome, Outcome::Resume, "call {} did not resume", number);
        ret
    }

    pub fn create(&mut self, name: &str, size: u32) -> i32 {
        let ptr = self.put_cstr(NAME_ADDR, name);
        self.ok_call(SYS_CREATE, &[ptr, size])
    }

    pub fn remove(&mut self, name: &str) -> i32 {
        let ptr = self.put_cstr(NAME_ADDR, name);
        self.ok_call(SYS_REMOVE, &[ptr])
    }

    pub fn open(&mut self, name: &str) -> i32 {
        let ptr = self.put_cstr(NAME_ADDR, name);
        self.ok_call(SYS_OPEN, &[ptr])
    }

    pub fn close(&mut self, fd: i32) {
        self.ok_call(SYS_CLOSE, &[fd as u32]);
    }

    pub fn write(&mut self, fd: i32, bytes: &[u8]) -> i32 {
        self.poke(OUT_ADDR, bytes);
        self.ok_call(SYS_WRITE, &[fd as u32, OUT_ADDR as u32, bytes.len() as u32])
    }

    pub fn read(&mut self, fd: i32, size: usize) -> (i32, Vec<u8>) {
        self.poke(IN_ADDR, &vec![0; size]);
        let ret = self.ok_call(SYS_READ, &[fd as u32, IN_ADDR as u32, size as u32]);
        (ret, self.peek(IN_ADDR, size))
    }

    pub fn seek(&mut self, fd: i32, position: i32) {
        self.ok_call(SYS_SEEK, &[fd as u32, position as u32]);
    }

    pub fn tell(&mut self, fd: i32) -> i32 {
        self.ok_call(SYS_TELL, &[fd as u32])
    }

    pub fn filesize(&mut self, fd: i32) -> i32 {
        self.ok_call(SYS_FILESIZE, &[fd as u32])
    }

    pub fn console_output(&self) -> (Vec<u8>, usize) {
        self.kernel
            .console
            .with_output(|dev| (dev.output.clone(), dev.writes))
    }

    pub fn feed_console(&self, input: &[u8]) {
        self.kernel
            .console
            .with_input(|keys| keys.pending.extend(input.iter().copied()));
    }

    /// Assert the process was killed with status -1.
    pub fn assert_killed(&self) {
        assert!(!self.process.is_running(), "process still running");
        assert_eq!(self.kernel.procs.recorded_status.get(), Some(-1));
        assert_eq!(self.kernel.procs.terminations.get(), 1);
    }
}
