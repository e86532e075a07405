//! One-pass parser: program text in, [`Program`] with resolved jumps out.

use std::fmt;

use crate::program::{Instruction, Op, Program};

/// Errors that can occur while parsing Brainfuck source text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Loops were not balanced; a matching `[` or `]` was not found.
    #[error("Unmatched bracket {kind} at position {position}")]
    UnmatchedBracket {
        /// Character index of the offending bracket in the source text.
        position: usize,
        kind: UnmatchedBracketKind,
    },

    /// The program needs more instruction slots than the configured capacity.
    #[error("Program exceeds instruction capacity ({capacity})")]
    CapacityExceeded { capacity: usize },
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Parse Brainfuck `source` into a [`Program`].
///
/// Only the eight command characters `><+-,.[]` are significant; everything
/// else is a comment and produces no instruction. The instruction capacity is
/// sized to the source length, which every input fits by construction.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    parse_with_capacity(source, source.chars().count())
}

/// Parse with an explicit instruction capacity.
///
/// Fails with [`ParseError::CapacityExceeded`] if the source contains more
/// command characters than `capacity`. No partial program is returned.
pub fn parse_with_capacity(source: &str, capacity: usize) -> Result<Program, ParseError> {
    let mut program = Program::with_capacity(capacity);
    // Indices of the `[` instructions whose `]` has not been seen yet,
    // innermost loop on top. Alongside each, the bracket's source position
    // for error reporting.
    let mut open_loops: Vec<(usize, usize)> = Vec::new();

    for (position, ch) in source.chars().enumerate() {
        let instruction = match ch {
            '>' => Instruction::IncrementPtr,
            '<' => Instruction::DecrementPtr,
            '+' => Instruction::IncrementData,
            '-' => Instruction::DecrementData,
            ',' => Instruction::Read,
            '.' => Instruction::Write,
            '[' => Instruction::JumpIfZero,
            ']' => Instruction::Jump,
            // Comment character.
            _ => continue,
        };

        if program.len() >= capacity {
            return Err(ParseError::CapacityExceeded { capacity });
        }

        match instruction {
            Instruction::JumpIfZero => {
                open_loops.push((program.len(), position));
                // Target is patched when the matching `]` arrives.
                program.push(Op {
                    instruction,
                    jump_target: 0,
                });
            }
            Instruction::Jump => {
                let Some((open, _)) = open_loops.pop() else {
                    return Err(ParseError::UnmatchedBracket {
                        position,
                        kind: UnmatchedBracketKind::Close,
                    });
                };
                let close = program.len();
                // `]` loops back to re-test at the `[`; the `[` skips to just
                // past the `]` when the cell is already zero.
                program.push(Op {
                    instruction,
                    jump_target: open,
                });
                program.ops_mut()[open].jump_target = close + 1;
            }
            _ => {
                program.push(Op {
                    instruction,
                    jump_target: 0,
                });
            }
        }
    }

    if let Some(&(_, position)) = open_loops.last() {
        return Err(ParseError::UnmatchedBracket {
            position,
            kind: UnmatchedBracketKind::Open,
        });
    }

    Ok(program)
}
