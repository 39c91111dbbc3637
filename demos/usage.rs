use nest_bf::{run_to_string, Config, Interpreter};

fn main() {
    // Classic Brainfuck "Hello World!" program
    let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

    let mut bf = match Interpreter::new(code, Config::default()) {
        Ok(bf) => bf,
        Err(err) => {
            eprintln!("Brainfuck interpreter error: {:?}", err);
            std::process::exit(1);
        }
    };

    match bf.run() {
        Ok(stats) => eprintln!(
            "{} steps, {} loop iterations, deepest loop {}",
            stats.steps, stats.loop_iterations, stats.max_depth
        ),
        Err(err) => {
            eprintln!("Brainfuck interpreter error: {:?}", err);
            std::process::exit(1);
        }
    }

    // The legacy preset keeps unbounded cells and tests the cell a loop was entered on.
    match run_to_string("-[+]+.", &Config::legacy(), "") {
        Ok((tape, out)) => println!("legacy output {:?}, cell 0 = {}", out, tape.cell(0)),
        Err(err) => eprintln!("legacy run failed: {err}"),
    }

    // Tip: to inspect execution without performing I/O:
    // let _ = bf.run_debug(&mut std::io::stdout(), None); // prints a step-by-step table
}
