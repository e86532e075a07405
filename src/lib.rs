//! A tiny Brainfuck interpreter built around a parsed program.
//!
//! Unlike a scan-as-you-go interpreter, this crate splits the work into two
//! stages: [`parse`] turns source text into a flat [`Program`] with every
//! loop's jump target already resolved, and an [`Executor`] drives that
//! program against a caller-allocated memory tape.
//!
//! Features and behaviors:
//! - Only `><+-,.[]` are commands; every other character is a comment.
//! - The tape is caller-allocated and fixed-size; a parsed `Program` can be
//!   re-run against any number of fresh tapes.
//! - Strict cursor bounds: moving left from cell 0 or right past the end
//!   returns an error instead of corrupting memory.
//! - Cell arithmetic wraps modulo 256.
//! - Input `,` reads a single byte from stdin; on end of input the current
//!   cell is set to 0. Output `.` writes the raw byte to stdout. Both can be
//!   redirected through executor hooks.
//! - Unbalanced brackets are reported at parse time, before anything runs.
//! - Optional cooperative controls: a step limit and a shared cancel flag,
//!   checked once per instruction dispatch.
//!
//! Quick start:
//!
//! ```no_run
//! use bfvm::{execute, parse};
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let program = parse(code).expect("program should parse");
//! let mut tape = [0u8; 1024];
//! execute(&program, &mut tape).expect("program should run");
//! println!(); // ensure a trailing newline for readability
//! ```

pub mod cli_util;
mod exec;
mod parser;
mod program;

pub use exec::{Executor, RuntimeError, StepControl, execute};
pub use parser::{ParseError, UnmatchedBracketKind, parse, parse_with_capacity};
pub use program::{Instruction, Op, Program};
