use crate::alu::{AluOp, AluOutcome, alu};
use crate::error::VmError;
use crate::machine::{Flag, Machine, STACK_BASE};

/// The instruction set: a closed enumeration of every opcode the machine
/// understands. Decoding is a single `match` over the fetched byte with
/// the default arm as the unknown-opcode fault, so there is no runtime
/// table to fall out of sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 1: halt cleanly.
    Hlt,
    /// 17: pop the return address into pc.
    Ret,
    /// 69: push reg[a] onto the stack.
    Push,
    /// 70: pop into reg[a]; on an empty stack, diagnostic and skip.
    Pop,
    /// 71: emit a print event with reg[a].
    Prn,
    /// 80: push pc+2, then jump to reg[a].
    Call,
    /// 84: jump to reg[a].
    Jmp,
    /// 85: jump to reg[a] if the flag is Equal.
    Jeq,
    /// 86: jump to reg[a] unless the flag is Equal.
    Jne,
    /// 130: load immediate b into reg[a].
    Ldi,
    /// 160: reg[a] += reg[b].
    Add,
    /// 162: reg[a] *= reg[b].
    Mul,
    /// 167: compare reg[a] with reg[b] and set the flag.
    Cmp,
}

impl Opcode {
    pub fn decode(byte: u8) -> Option<Opcode> {
        match byte {
            1 => Some(Opcode::Hlt),
            17 => Some(Opcode::Ret),
            69 => Some(Opcode::Push),
            70 => Some(Opcode::Pop),
            71 => Some(Opcode::Prn),
            80 => Some(Opcode::Call),
            84 => Some(Opcode::Jmp),
            85 => Some(Opcode::Jeq),
            86 => Some(Opcode::Jne),
            130 => Some(Opcode::Ldi),
            160 => Some(Opcode::Add),
            162 => Some(Opcode::Mul),
            167 => Some(Opcode::Cmp),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Hlt => "HLT",
            Opcode::Ret => "RET",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Prn => "PRN",
            Opcode::Call => "CALL",
            Opcode::Jmp => "JMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
            Opcode::Ldi => "LDI",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Cmp => "CMP",
        }
    }

    /// Instruction width in bytes, counting the opcode itself.
    pub fn width(self) -> usize {
        match self {
            Opcode::Hlt | Opcode::Ret => 1,
            Opcode::Push
            | Opcode::Pop
            | Opcode::Prn
            | Opcode::Call
            | Opcode::Jmp
            | Opcode::Jeq
            | Opcode::Jne => 2,
            Opcode::Ldi | Opcode::Add | Opcode::Mul | Opcode::Cmp => 3,
        }
    }
}

/// Pretty-print a disassembly of a program image for human inspection.
/// Bytes that decode to nothing are shown raw and skipped one at a time,
/// since they may be data or padding rather than code.
pub fn disassemble(image: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let mut addr = 0;
    while addr < image.len() {
        let byte = image[addr];
        let Some(opcode) = Opcode::decode(byte) else {
            let _ = writeln!(out, "{addr:02X}: {byte:02X}        ???");
            addr += 1;
            continue;
        };
        let mut hex = format!("{byte:02X}");
        let mut operands = String::new();
        for i in 1..opcode.width() {
            let operand = image.get(addr + i).copied().unwrap_or(0);
            let _ = write!(hex, " {operand:02X}");
            let _ = write!(operands, " {operand}");
        }
        let _ = writeln!(out, "{addr:02X}: {hex:<8}  {}{operands}", opcode.mnemonic());
        addr += opcode.width();
    }
    out
}

/// Observable side effects of execution. The machine never prints; it
/// hands events to a sink and the caller decides what to do with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// PRN: the decimal value of a register.
    Print(u8),
    /// POP with nothing on the stack: the operation was skipped.
    StackEmpty { reg: u8 },
}

/// Whether the machine can execute another cycle. A fault is the third,
/// terminal possibility and travels as the `Err` arm of `step`/`run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

impl Machine {
    /// One fetch-decode-execute cycle.
    ///
    /// Fetches the opcode and both operand bytes at pc (operands are
    /// always fetched, even for 1- and 2-byte instructions), decodes, and
    /// executes. Each instruction advances pc by its own width; the
    /// control transfers (CALL, RET, JMP, taken JEQ/JNE) set it directly.
    pub fn step(&mut self, emit: &mut impl FnMut(Event)) -> Result<State, VmError> {
        let byte = self.read(self.pc)?;
        let a = self.read(self.pc + 1)?;
        let b = self.read(self.pc + 2)?;
        let opcode = Opcode::decode(byte).ok_or(VmError::UnknownOpcode {
            opcode: byte,
            pc: self.pc,
        })?;

        match opcode {
            Opcode::Hlt => return Ok(State::Halted),
            Opcode::Ret => {
                self.pc = usize::from(self.pop()?);
            }
            Opcode::Push => {
                let value = self.reg(a)?;
                self.push(value)?;
                self.pc += 2;
            }
            Opcode::Pop => {
                if self.sp == STACK_BASE {
                    emit(Event::StackEmpty { reg: a });
                } else {
                    let value = self.pop()?;
                    self.set_reg(a, value)?;
                }
                self.pc += 2;
            }
            Opcode::Prn => {
                emit(Event::Print(self.reg(a)?));
                self.pc += 2;
            }
            Opcode::Call => {
                // The return address is pc+2, the byte after this 2-byte
                // instruction. pc never exceeds 253 here (the operand
                // fetch above would have faulted), so it fits in a cell.
                let ret = (self.pc + 2) as u8;
                self.push(ret)?;
                self.pc = usize::from(self.reg(a)?);
            }
            Opcode::Jmp => {
                self.pc = usize::from(self.reg(a)?);
            }
            Opcode::Jeq => {
                if self.flag == Flag::Equal {
                    self.pc = usize::from(self.reg(a)?);
                } else {
                    self.pc += 2;
                }
            }
            Opcode::Jne => {
                if self.flag != Flag::Equal {
                    self.pc = usize::from(self.reg(a)?);
                } else {
                    self.pc += 2;
                }
            }
            Opcode::Ldi => {
                self.set_reg(a, b)?;
                self.pc += 3;
            }
            Opcode::Add | Opcode::Mul | Opcode::Cmp => {
                let op = match opcode {
                    Opcode::Add => AluOp::Add,
                    Opcode::Mul => AluOp::Mul,
                    _ => AluOp::Cmp,
                };
                match alu(&mut self.registers, op, a, b)? {
                    AluOutcome::Wrote => {}
                    AluOutcome::Compared(ordering) => {
                        self.flag = match ordering {
                            std::cmp::Ordering::Equal => Flag::Equal,
                            std::cmp::Ordering::Less => Flag::Less,
                            std::cmp::Ordering::Greater => Flag::Greater,
                        };
                    }
                }
                self.pc += 3;
            }
        }

        Ok(State::Running)
    }

    /// Run until HLT or a fault. Iterative on purpose: stack use is
    /// constant no matter how many instructions the program executes.
    pub fn run(&mut self, emit: &mut impl FnMut(Event)) -> Result<(), VmError> {
        while self.step(emit)? == State::Running {}
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::machine::MEMORY_SIZE;
    use proptest::prelude::*;

    proptest! {
        /// Random images either halt, fault, or are still running when the
        /// step bound runs out; none of those is a panic.
        #[test]
        fn random_images_never_panic(
            image in prop::collection::vec(any::<u8>(), 1..=MEMORY_SIZE)
        ) {
            let mut machine = Machine::new();
            machine.load(&image).unwrap();
            let mut sink = |_: Event| {};
            for _ in 0..4096 {
                match machine.step(&mut sink) {
                    Ok(State::Running) => {}
                    Ok(State::Halted) | Err(_) => break,
                }
            }
        }

        /// Whatever happens, pc and sp stay inside or one past memory.
        #[test]
        fn pc_and_sp_stay_bounded(
            image in prop::collection::vec(any::<u8>(), 1..=MEMORY_SIZE)
        ) {
            let mut machine = Machine::new();
            machine.load(&image).unwrap();
            let mut sink = |_: Event| {};
            for _ in 0..1024 {
                match machine.step(&mut sink) {
                    Ok(State::Running) => {
                        prop_assert!(machine.pc <= MEMORY_SIZE + 2);
                        prop_assert!(machine.sp <= MEMORY_SIZE);
                    }
                    Ok(State::Halted) | Err(_) => break,
                }
            }
        }
    }
}
