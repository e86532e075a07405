use bfvm::{execute, parse};

fn main() {
    // Classic Brainfuck "Hello World!" program
    let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

    let program = match parse(code) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("Brainfuck parse error: {err}");
            std::process::exit(1);
        }
    };

    let mut tape = [0u8; 1024];
    if let Err(err) = execute(&program, &mut tape) {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }

    // Print a newline after the program output for readability
    println!();
}
