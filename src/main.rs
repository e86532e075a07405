use bfvm::cli_util::{print_parse_error, print_runtime_error};
use bfvm::{Executor, RuntimeError, StepControl, parse};
use clap::Parser;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

fn print_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} [OPTIONS] "<code>"        # Run Brainfuck code (args are concatenated)
  {0} [OPTIONS] --file <PATH>   # Run Brainfuck code loaded from file

Options:
  --file,      -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --tape-size <N>         Number of tape cells to allocate (default 1024)
  --max-steps <N>         Abort execution after N instruction dispatches
  --timeout <MS>          Abort execution after MS milliseconds
  --help,      -h         Show this help

Notes:
- Input (`,`) reads a single byte from stdin; on end of input the current cell is set to 0.
- Characters outside of Brainfuck's ><+-.,[] are treated as comments.
- A program that never leaves a loop runs forever unless --max-steps or --timeout is set.

Examples:
- Load Brainfuck code from a file:
    {0} --file ./program.bf
- Read bytes from a file as stdin (`,` will consume file input):
    {0} ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bfvm", disable_help_flag = true)]
struct Cli {
    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Number of tape cells to allocate
    #[arg(long = "tape-size", default_value_t = 1024)]
    tape_size: usize,

    /// Abort execution after N instruction dispatches
    #[arg(long = "max-steps")]
    max_steps: Option<usize>,

    /// Abort execution after MS milliseconds
    #[arg(long = "timeout")]
    timeout: Option<u64>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,
}

fn run_with_args(program_name: &str, args: Cli) -> i32 {
    if args.help {
        print_usage_and_exit(program_name, 0);
    }

    let Cli {
        file,
        tape_size,
        max_steps,
        timeout,
        code,
        ..
    } = args;

    if file.is_none() && code.is_empty() {
        print_usage_and_exit(program_name, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program_name}: cannot use positional code together with --file");
        print_usage_and_exit(program_name, 2);
    }

    let code_str = if let Some(path) = file {
        match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{program_name}: failed to read code file as UTF-8: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
    } else {
        code.join("")
    };

    let program = match parse(&code_str) {
        Ok(p) => p,
        Err(err) => {
            print_parse_error(Some(program_name), &code_str, &err);
            return 1;
        }
    };

    // One shared flag: SIGINT and the timeout watchdog both trip it, and the
    // executor checks it once per instruction dispatch.
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let timed_out = Arc::new(AtomicBool::new(false));

    {
        let cancel_flag = Arc::clone(&cancel_flag);
        if let Err(e) = ctrlc::set_handler(move || {
            cancel_flag.store(true, Ordering::Relaxed);
        }) {
            eprintln!("{program_name}: failed to set ctrl+c handler: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    }

    if let Some(ms) = timeout {
        let cancel_flag = Arc::clone(&cancel_flag);
        let timed_out = Arc::clone(&timed_out);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(ms));
            timed_out.store(true, Ordering::Relaxed);
            cancel_flag.store(true, Ordering::Relaxed);
        });
    }

    let mut exec = Executor::new();
    exec.set_control(StepControl::new(max_steps, Arc::clone(&cancel_flag)));

    let mut tape = vec![0u8; tape_size];

    if let Err(err) = exec.run(&program, &mut tape) {
        match err {
            RuntimeError::Canceled if timed_out.load(Ordering::Relaxed) => {
                let ms = timeout.unwrap_or_default();
                eprintln!("{program_name}: Execution aborted: timeout after {ms}ms");
                let _ = io::stderr().flush();
            }
            _ => print_runtime_error(Some(program_name), &err),
        }
        return 1;
    }

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    0
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bfvm"));

    let cli = Cli::parse();

    std::process::exit(run_with_args(&program, cli));
}
