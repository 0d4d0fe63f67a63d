//! Trap Frame
//!
//! Register snapshot pushed by the interrupt entry stub when a user process
//! raises the system-call vector. The layout matches the i386 entry code:
//! general registers saved by `pushal`, segment selectors, the vector and
//! error code, then the hardware-pushed frame.
//!
//! The system-call layer only reads `esp` and writes `eax`.

/// Saved CPU state of the trapping process.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    /// Kernel `esp` saved by `pushal`; not the user stack.
    pub esp_dummy: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    /// Return-value slot.
    pub eax: u32,
    /// Segment selectors (low 16 bits significant).
    pub gs: u32,
    pub fs: u32,
    pub es: u32,
    pub ds: u32,
    /// Interrupt vector number.
    pub vec_no: u32,
    pub error_code: u32,
    pub frame_pointer: u32,
    /// Interrupted user instruction.
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
    /// User stack pointer: the call number sits here, arguments above it.
    pub esp: u32,
    pub ss: u32,
}

impl TrapFrame {
    /// A frame for a user thread whose stack pointer is `esp`.
    pub fn with_stack(esp: u32) -> Self {
        Self {
            esp,
            vec_no: u32::from(crate::config::SYSCALL_VECTOR),
            ..Self::default()
        }
    }

    /// User stack pointer at the time of the trap.
    #[inline]
    pub fn stack_pointer(&self) -> u32 {
        self.esp
    }

    /// Store the value the user sees as the call's result.
    #[inline]
    pub fn set_return(&mut self, value: i32) {
        self.eax = value as u32;
    }

    /// The result slot, read back as a signed value.
    #[inline]
    pub fn return_value(&self) -> i32 {
        self.eax as i32
    }
}
