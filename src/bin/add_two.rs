use bfvm::{execute, parse};

fn main() {
    // Reads one byte from stdin, adds 2 via a transfer loop, writes one byte.
    // The answer is a single byte, so inputs near 255 wrap and multi-digit
    // numbers will not render as text.
    let code = ",>++<[->+<]>.";

    let program = match parse(code) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("Brainfuck parse error: {err}");
            std::process::exit(1);
        }
    };

    let mut tape = [0u8; 512];
    if let Err(err) = execute(&program, &mut tape) {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }

    // Print a newline after the program output for readability
    println!();
}
