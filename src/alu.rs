use std::cmp::Ordering;

use crate::error::VmError;
use crate::machine::NUM_REGISTERS;

/// The full set of ALU operations. This is a closed enum, so an operation
/// kind the ALU cannot execute is unrepresentable; the dispatch loop maps
/// each arithmetic opcode to its variant statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Cmp,
}

impl AluOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::Mul => "MUL",
            AluOp::Div => "DIV",
            AluOp::Mod => "MOD",
            AluOp::And => "AND",
            AluOp::Or => "OR",
            AluOp::Xor => "XOR",
            AluOp::Not => "NOT",
            AluOp::Shl => "SHL",
            AluOp::Shr => "SHR",
            AluOp::Cmp => "CMP",
        }
    }
}

/// What an ALU operation produced.
///
/// Most operations write their result back into `regs[a]`; CMP instead
/// derives an ordering and mutates nothing. The tagged result keeps the
/// two modes apart so a caller cannot silently drop a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOutcome {
    /// The result was written into the destination register.
    Wrote,
    /// CMP: the ordering of `regs[a]` relative to `regs[b]`.
    Compared(Ordering),
}

/// Execute one ALU operation over the register file.
///
/// Binary operations combine `regs[b]` into `regs[a]`; NOT complements
/// `regs[a]` alone and ignores `b`. All arithmetic wraps at 8 bits.
/// Shifting by 8 or more bit positions drains the register to 0 (the
/// shift amount is not masked). DIV and MOD are integer operations with
/// an explicit divide-by-zero fault.
pub fn alu(
    regs: &mut [u8; NUM_REGISTERS],
    op: AluOp,
    a: u8,
    b: u8,
) -> Result<AluOutcome, VmError> {
    let ai = usize::from(a);
    let bi = usize::from(b);
    if ai >= NUM_REGISTERS {
        return Err(VmError::BadRegister { index: a });
    }
    if bi >= NUM_REGISTERS {
        return Err(VmError::BadRegister { index: b });
    }
    let (x, y) = (regs[ai], regs[bi]);

    let result = match op {
        AluOp::Add => x.wrapping_add(y),
        AluOp::Sub => x.wrapping_sub(y),
        AluOp::Mul => x.wrapping_mul(y),
        AluOp::Div => {
            if y == 0 {
                return Err(VmError::DivideByZero { op: op.mnemonic() });
            }
            x / y
        }
        AluOp::Mod => {
            if y == 0 {
                return Err(VmError::DivideByZero { op: op.mnemonic() });
            }
            x % y
        }
        AluOp::And => x & y,
        AluOp::Or => x | y,
        AluOp::Xor => x ^ y,
        AluOp::Not => !x,
        AluOp::Shl => x.checked_shl(u32::from(y)).unwrap_or(0),
        AluOp::Shr => x.checked_shr(u32::from(y)).unwrap_or(0),
        AluOp::Cmp => return Ok(AluOutcome::Compared(x.cmp(&y))),
    };

    regs[ai] = result;
    Ok(AluOutcome::Wrote)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_op() -> impl Strategy<Value = AluOp> {
        prop_oneof![
            Just(AluOp::Add),
            Just(AluOp::Sub),
            Just(AluOp::Mul),
            Just(AluOp::Div),
            Just(AluOp::Mod),
            Just(AluOp::And),
            Just(AluOp::Or),
            Just(AluOp::Xor),
            Just(AluOp::Not),
            Just(AluOp::Shl),
            Just(AluOp::Shr),
            Just(AluOp::Cmp),
        ]
    }

    proptest! {
        #[test]
        fn never_panics(
            mut r in any::<[u8; NUM_REGISTERS]>(),
            op in any_op(),
            a in any::<u8>(),
            b in any::<u8>(),
        ) {
            let _ = alu(&mut r, op, a, b);
        }

        #[test]
        fn cmp_never_mutates(
            mut r in any::<[u8; NUM_REGISTERS]>(),
            a in 0u8..8,
            b in 0u8..8,
        ) {
            let before = r;
            alu(&mut r, AluOp::Cmp, a, b).unwrap();
            prop_assert_eq!(r, before);
        }
    }
}
