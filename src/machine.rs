use std::fmt::Write;

use crate::error::VmError;

/// Bytes of addressable memory. Addresses are a single byte, so the
/// program counter, stack pointer, and every explicit access must stay in
/// [0, 255]; anything else is a fatal bounds fault, never a wrap.
pub const MEMORY_SIZE: usize = 256;

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Initial stack pointer. The stack grows downward from here into memory
/// shared with the program; `sp == STACK_BASE` means the stack is empty.
pub const STACK_BASE: usize = 244;

/// Outcome of the most recent CMP, consumed by the conditional jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Equal,
    Less,
    Greater,
    /// No comparison has run yet.
    None,
}

/// The complete machine state: memory, register file, program counter,
/// stack pointer, and comparison flag.
///
/// Registers and memory cells are `u8`; all arithmetic wraps at 8 bits, so
/// no value can silently grow past what the architecture can address.
pub struct Machine {
    pub memory: [u8; MEMORY_SIZE],
    pub registers: [u8; NUM_REGISTERS],
    pub pc: usize,
    pub sp: usize,
    pub flag: Flag,
}

impl Machine {
    pub fn new() -> Machine {
        Machine {
            memory: [0; MEMORY_SIZE],
            registers: [0; NUM_REGISTERS],
            pc: 0,
            sp: STACK_BASE,
            flag: Flag::None,
        }
    }

    /// Copy a parsed program image into memory starting at address 0.
    ///
    /// Leaves pc, sp, registers, and the flag at their initial values, so
    /// a freshly constructed machine is ready to run after loading.
    pub fn load(&mut self, image: &[u8]) -> Result<(), VmError> {
        if image.len() > MEMORY_SIZE {
            return Err(VmError::ProgramTooLarge { len: image.len() });
        }
        self.memory[..image.len()].copy_from_slice(image);
        tracing::debug!(bytes = image.len(), "program image loaded");
        Ok(())
    }

    pub fn read(&self, addr: usize) -> Result<u8, VmError> {
        self.memory
            .get(addr)
            .copied()
            .ok_or(VmError::OutOfBounds { addr })
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), VmError> {
        match self.memory.get_mut(addr) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(VmError::OutOfBounds { addr }),
        }
    }

    pub fn reg(&self, index: u8) -> Result<u8, VmError> {
        self.registers
            .get(index as usize)
            .copied()
            .ok_or(VmError::BadRegister { index })
    }

    pub fn set_reg(&mut self, index: u8, value: u8) -> Result<(), VmError> {
        match self.registers.get_mut(index as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(VmError::BadRegister { index }),
        }
    }

    /// Push one byte: decrement sp, then write. Register values (PUSH) and
    /// return addresses (CALL) go through this same primitive and share
    /// the one stack region.
    pub fn push(&mut self, value: u8) -> Result<(), VmError> {
        // sp == 0 means the next cell would sit below address 0.
        let new_sp = self
            .sp
            .checked_sub(1)
            .ok_or(VmError::OutOfBounds { addr: 0 })?;
        self.write(new_sp, value)?;
        self.sp = new_sp;
        Ok(())
    }

    /// Pop one byte: read at sp, then increment. No empty-stack sentinel
    /// check here; POP's diagnostic is the dispatch loop's concern.
    pub fn pop(&mut self) -> Result<u8, VmError> {
        let value = self.read(self.sp)?;
        self.sp += 1;
        Ok(value)
    }

    /// Render one trace line: pc, the three bytes at pc, and all eight
    /// registers, in hex. Reads past the end of memory show as 00 so a
    /// trace of a machine about to fault still prints.
    pub fn trace(&self) -> String {
        let at = |offset: usize| -> u8 {
            self.memory.get(self.pc + offset).copied().unwrap_or(0)
        };
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            at(0),
            at(1),
            at(2),
        );
        for value in self.registers {
            let _ = write!(line, " {value:02X}");
        }
        line
    }
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new()
    }
}
