//! stderr rendering for the CLI binaries.

use std::io::{self, Write};

use crate::exec::RuntimeError;
use crate::parser::ParseError;

/// Pretty-print a structured [`ParseError`] with caret positioning.
/// If `program` is `Some("bfvm")`, messages are prefixed with "bfvm: ...".
pub fn print_parse_error(program: Option<&str>, code: &str, err: &ParseError) {
    match err {
        ParseError::UnmatchedBracket { position, kind } => {
            let msg = prefix_program(program, &format!("Parse error: unmatched bracket {kind}"));
            print_error_with_context(&msg, code, *position);
        }
        ParseError::CapacityExceeded { .. } => {
            eprintln!("{}", prefix_program(program, &format!("Parse error: {err}")));
            let _ = io::stderr().flush();
        }
    }
}

/// Print a concise one-line [`RuntimeError`].
///
/// No caret context here: runtime errors carry instruction indices, which do
/// not line up with source columns once comment characters are stripped.
pub fn print_runtime_error(program: Option<&str>, err: &RuntimeError) {
    let msg = match err {
        RuntimeError::TapeOutOfBounds { .. } | RuntimeError::EmptyTape => {
            format!("Runtime error: {err}")
        }
        RuntimeError::Io { source, .. } => format!("I/O error: {source}"),
        RuntimeError::StepLimitExceeded { .. } | RuntimeError::Canceled => err.to_string(),
    };
    eprintln!("{}", prefix_program(program, &msg));
    let _ = io::stderr().flush();
}

fn prefix_program(program: Option<&str>, msg: &str) -> String {
    if let Some(p) = program {
        format!("{p}: {msg}")
    } else {
        msg.to_string()
    }
}

/// Print a concise error with the source position and a caret context window,
/// working with UTF-8 by slicing using char indices.
fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{prefix} at position {pos}");

    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(code, start_char);
    let end_byte = char_to_byte_index(code, end_char);
    let slice = &code[start_byte..end_byte];

    eprintln!("  {}", slice);

    // Caret under the exact position
    let caret_offset_chars = pos.saturating_sub(start_char);
    let mut underline = String::new();
    for _ in 0..caret_offset_chars {
        underline.push(' ');
    }
    underline.push('^');
    eprintln!("  {}", underline);
    let _ = io::stderr().flush();
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }

    let mut count = 0usize;
    let mut byte_idx = 0usize;

    for ch in s.chars() {
        if count == char_idx {
            break;
        }
        byte_idx += ch.len_utf8();
        count += 1;
    }

    byte_idx
}
