//! Bytecode instruction definitions for the stack machine.
//!
//! Every instruction pops its operands from the value stack and pushes exactly
//! one result. Operands are popped right-to-left: for `Sub` the top of the stack
//! is the subtrahend.

/// A single bytecode instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Instruction {
    /// Push `constants[idx]`
    LoadConst(u32),
    /// Push `params[idx]`
    LoadParam(u32),

    Add,
    Sub,
    Mul,
    Div,
    Pow,

    /// `-a`
    Neg,
    /// `a * a`, emitted for `u^2`
    Square,

    /// Call an elementary function on the top `argc` stack values
    Call {
        eval: fn(&[f64]) -> f64,
        argc: usize,
    },
}

impl Instruction {
    /// Net change in stack height after executing this instruction
    pub(crate) fn stack_effect(&self) -> isize {
        match self {
            Instruction::LoadConst(_) | Instruction::LoadParam(_) => 1,
            Instruction::Add
            | Instruction::Sub
            | Instruction::Mul
            | Instruction::Div
            | Instruction::Pow => -1,
            Instruction::Neg | Instruction::Square => 0,
            Instruction::Call { argc, .. } => 1 - *argc as isize,
        }
    }
}
