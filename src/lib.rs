//! An 8-bit byte-code virtual machine: 256 bytes of memory, 8 registers,
//! a downward-growing stack, and a 13-opcode instruction set with
//! call/return, conditional branches, and a small ALU.

pub mod alu;
pub mod error;
pub mod exec;
pub mod machine;
pub mod program;
