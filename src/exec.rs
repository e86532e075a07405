//! The dispatch loop: drives a parsed [`Program`] against a memory tape.

use std::io::{self, Read as _, Write as _};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::program::{Instruction, Program};

/// Errors that can occur while executing a parsed program.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The tape cursor attempted to move left of cell 0 or beyond the last cell.
    #[error("Tape cursor out of bounds at instruction {ip} (ptr={ptr}, op='{op}')")]
    TapeOutOfBounds { ip: usize, ptr: usize, op: char },

    /// The tape has no cells, so the initial cursor position does not exist.
    #[error("Tape is empty; a non-empty program needs at least one cell")]
    EmptyTape,

    /// An underlying I/O error occurred on the stdin/stdout fallback.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout).
    #[error("Execution aborted: cancelled")]
    Canceled,
}

/// Controls for cooperative cancellation and step limiting.
///
/// Both are checked once per instruction dispatch, so a looping program
/// unwinds promptly when the flag trips or the step limit is reached.
#[derive(Clone)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self {
            max_steps,
            cancel_flag,
        }
    }
}

type InputProvider = Box<dyn FnMut() -> Option<u8> + Send>;
type OutputSink = Box<dyn FnMut(u8) + Send>;

/// Executes parsed programs against caller-supplied tapes.
///
/// The executor owns the I/O wiring and the optional step controls; the
/// program and the tape are borrowed per run, so one `Program` can be run
/// any number of times against different tapes.
///
/// By default `,` reads one byte from stdin (end of input reads as 0) and
/// `.` writes the byte to stdout. Both ends can be redirected with
/// [`set_input_provider`](Executor::set_input_provider) and
/// [`set_output_sink`](Executor::set_output_sink).
#[derive(Default)]
pub struct Executor {
    input_provider: Option<InputProvider>,
    output_sink: Option<OutputSink>,
    control: Option<StepControl>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide an input source. When set, `,` takes bytes from this provider
    /// instead of stdin. Returning `None` indicates end of input (the cell
    /// is set to 0).
    pub fn set_input_provider<F>(&mut self, provider: F)
    where
        F: FnMut() -> Option<u8> + Send + 'static,
    {
        self.input_provider = Some(Box::new(provider));
    }

    /// Provide an output sink. When set, `.` sends bytes to this sink
    /// instead of stdout.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: FnMut(u8) + Send + 'static,
    {
        self.output_sink = Some(Box::new(sink));
    }

    /// Enable cooperative cancellation and/or a step limit.
    pub fn set_control(&mut self, control: StepControl) {
        self.control = Some(control);
    }

    /// Run `program` against `tape` until the instruction pointer runs off
    /// the end of the instruction sequence.
    ///
    /// The cursor starts at cell 0. Cell arithmetic wraps modulo 256. A
    /// cursor move that would leave the tape fails with
    /// [`RuntimeError::TapeOutOfBounds`] naming the offending instruction.
    pub fn run(&mut self, program: &Program, tape: &mut [u8]) -> Result<(), RuntimeError> {
        if program.is_empty() {
            return Ok(());
        }
        if tape.is_empty() {
            return Err(RuntimeError::EmptyTape);
        }

        let ops = program.ops();
        let mut ip: usize = 0;
        let mut cursor: usize = 0;
        let mut steps: usize = 0;

        while ip < ops.len() {
            if let Some(ctrl) = self.control.as_ref() {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(RuntimeError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if steps >= max {
                        return Err(RuntimeError::StepLimitExceeded { limit: max });
                    }
                }
            }
            steps += 1;

            let op = ops[ip];
            match op.instruction {
                Instruction::IncrementPtr => {
                    if cursor + 1 >= tape.len() {
                        return Err(RuntimeError::TapeOutOfBounds {
                            ip,
                            ptr: cursor,
                            op: op.instruction.symbol(),
                        });
                    }
                    cursor += 1;
                }
                Instruction::DecrementPtr => {
                    if cursor == 0 {
                        return Err(RuntimeError::TapeOutOfBounds {
                            ip,
                            ptr: cursor,
                            op: op.instruction.symbol(),
                        });
                    }
                    cursor -= 1;
                }
                Instruction::IncrementData => {
                    tape[cursor] = tape[cursor].wrapping_add(1);
                }
                Instruction::DecrementData => {
                    tape[cursor] = tape[cursor].wrapping_sub(1);
                }
                Instruction::Read => {
                    tape[cursor] = self.read_byte(ip)?;
                }
                Instruction::Write => {
                    let byte = tape[cursor];
                    self.write_byte(ip, byte)?;
                }
                Instruction::JumpIfZero => {
                    // Zero cell skips the loop body entirely; the target is
                    // just past the matching `]`.
                    ip = if tape[cursor] == 0 {
                        op.jump_target
                    } else {
                        ip + 1
                    };
                    continue;
                }
                Instruction::Jump => {
                    // Unconditionally back to the `[`, which re-tests.
                    ip = op.jump_target;
                    continue;
                }
            }
            ip += 1;
        }

        Ok(())
    }

    fn read_byte(&mut self, ip: usize) -> Result<u8, RuntimeError> {
        if let Some(provider) = self.input_provider.as_mut() {
            // None means end of input; the cell reads as 0.
            return Ok((provider)().unwrap_or(0));
        }

        // Read exactly one byte from stdin; on EOF the cell is set to 0.
        let mut buf = [0u8; 1];
        match io::stdin().read(&mut buf) {
            Ok(0) => Ok(0),
            Ok(_) => Ok(buf[0]),
            Err(e) => Err(RuntimeError::Io { ip, source: e }),
        }
    }

    fn write_byte(&mut self, ip: usize, byte: u8) -> Result<(), RuntimeError> {
        if let Some(sink) = self.output_sink.as_mut() {
            (sink)(byte);
            return Ok(());
        }

        let mut stdout = io::stdout().lock();
        stdout
            .write_all(&[byte])
            .and_then(|_| stdout.flush())
            .map_err(|e| RuntimeError::Io { ip, source: e })
    }
}

/// Run `program` against `tape` with the default stdin/stdout wiring.
pub fn execute(program: &Program, tape: &mut [u8]) -> Result<(), RuntimeError> {
    Executor::new().run(program, tape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::sync::Mutex;

    /// Run `source` with the given input bytes, returning the executor result
    /// and the collected output.
    fn run_with_io(
        source: &str,
        input: &[u8],
        tape: &mut [u8],
    ) -> (Result<(), RuntimeError>, Vec<u8>) {
        let program = parse(source).expect("test program should parse");
        let mut exec = Executor::new();

        let mut input = input.to_vec().into_iter();
        exec.set_input_provider(move || input.next());

        let output = Arc::new(Mutex::new(Vec::new()));
        let sink_output = Arc::clone(&output);
        exec.set_output_sink(move |byte| sink_output.lock().unwrap().push(byte));

        let result = exec.run(&program, tape);
        let output = output.lock().unwrap().clone();
        (result, output)
    }

    #[test]
    fn copies_one_input_byte_to_output() {
        let mut tape = [0u8; 4];
        let (result, output) = run_with_io(",.", b"Z", &mut tape);
        assert!(result.is_ok());
        assert_eq!(output, b"Z");
    }

    #[test]
    fn adds_two_to_input_byte() {
        // Reads a byte, adds 2 via a transfer loop, writes the sum.
        let mut tape = [0u8; 2];
        let (result, output) = run_with_io(",>++<[->+<]>.", &[3], &mut tape);
        assert!(result.is_ok());
        assert_eq!(output, &[5]);
    }

    #[test]
    fn zero_cell_skips_loop_body() {
        // The body would emit a byte; a zero condition cell must skip it.
        let mut tape = [0u8; 1];
        let (result, output) = run_with_io("[.]", &[], &mut tape);
        assert!(result.is_ok());
        assert!(output.is_empty());
    }

    #[test]
    fn nonzero_cell_enters_and_drains_loop() {
        let mut tape = [0u8; 1];
        let (result, _) = run_with_io("+++[-]", &[], &mut tape);
        assert!(result.is_ok());
        assert_eq!(tape[0], 0);
    }

    #[test]
    fn increment_wraps_255_to_0() {
        let mut tape = [255u8];
        let (result, _) = run_with_io("+", &[], &mut tape);
        assert!(result.is_ok());
        assert_eq!(tape[0], 0);
    }

    #[test]
    fn decrement_wraps_0_to_255() {
        let mut tape = [0u8];
        let (result, _) = run_with_io("-", &[], &mut tape);
        assert!(result.is_ok());
        assert_eq!(tape[0], 255);
    }

    #[test]
    fn end_of_input_reads_as_zero() {
        let mut tape = [7u8];
        let (result, _) = run_with_io(",", &[], &mut tape);
        assert!(result.is_ok());
        assert_eq!(tape[0], 0);
    }

    #[test]
    fn moving_left_of_cell_zero_errors() {
        let mut tape = [0u8; 4];
        let (result, _) = run_with_io("<", &[], &mut tape);
        assert!(matches!(
            result,
            Err(RuntimeError::TapeOutOfBounds {
                ip: 0,
                ptr: 0,
                op: '<',
            })
        ));
    }

    #[test]
    fn moving_past_last_cell_errors() {
        // With 3 cells (0..=2), the 3rd '>' attempts to move beyond index 2.
        let mut tape = [0u8; 3];
        let (result, _) = run_with_io(">>>", &[], &mut tape);
        assert!(matches!(
            result,
            Err(RuntimeError::TapeOutOfBounds {
                ip: 2,
                ptr: 2,
                op: '>',
            })
        ));
    }

    #[test]
    fn empty_tape_errors_for_nonempty_program() {
        let mut tape: [u8; 0] = [];
        let (result, _) = run_with_io("+", &[], &mut tape);
        assert!(matches!(result, Err(RuntimeError::EmptyTape)));
    }

    #[test]
    fn empty_program_is_a_no_op_on_any_tape() {
        let mut tape: [u8; 0] = [];
        let (result, output) = run_with_io("", &[], &mut tape);
        assert!(result.is_ok());
        assert!(output.is_empty());
    }

    #[test]
    fn step_limit_aborts_infinite_loop() {
        let program = parse("+[]").unwrap();
        let mut exec = Executor::new();
        exec.set_control(StepControl::new(Some(50), Arc::new(AtomicBool::new(false))));
        let mut tape = [0u8; 4];
        let result = exec.run(&program, &mut tape);
        assert!(matches!(
            result,
            Err(RuntimeError::StepLimitExceeded { limit: 50 })
        ));
    }

    #[test]
    fn preset_cancel_flag_aborts_before_side_effects() {
        let program = parse("+").unwrap();
        let mut exec = Executor::new();
        exec.set_control(StepControl::new(None, Arc::new(AtomicBool::new(true))));
        let mut tape = [0u8; 1];
        let result = exec.run(&program, &mut tape);
        assert!(matches!(result, Err(RuntimeError::Canceled)));
        assert_eq!(tape[0], 0);
    }

    #[test]
    fn program_is_reexecutable_against_fresh_tapes() {
        let program = parse("++.").unwrap();
        let mut first = Vec::new();
        let mut second = Vec::new();

        for output in [&mut first, &mut second] {
            let collected = Arc::new(Mutex::new(Vec::new()));
            let sink_output = Arc::clone(&collected);
            let mut exec = Executor::new();
            exec.set_output_sink(move |byte| sink_output.lock().unwrap().push(byte));
            let mut tape = [0u8; 2];
            exec.run(&program, &mut tape).unwrap();
            *output = collected.lock().unwrap().clone();
        }

        assert_eq!(first, &[2]);
        assert_eq!(first, second);
    }
}
