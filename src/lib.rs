//! A Brainfuck interpreter that runs loops by nesting level.
//!
//! Programs are tokenized into a flat list where every instruction carries the
//! number of loops around it; brackets themselves vanish. The executor rebuilds
//! loop structure from those levels on the fly, replaying each loop body by
//! recursing over its slice of the token list, so no syntax tree is built and
//! recursion depth is bounded by how deeply loops are nested.
//!
//! Features and behaviors:
//! - Memory tape of 30,000 zeroed cells by default.
//! - Anything outside `<>+-.,[]` is a comment.
//! - Cell width, edge handling, loop test cell, bracket checking, and end-of-input
//!   handling are all chosen through [`Config`]; [`Config::legacy`] reproduces the
//!   historical lenient behavior.
//! - Cooperative cancellation and step limits through [`StepControl`].
//!
//! Quick start:
//!
//! ```
//! use nest_bf::{run_to_string, Config};
//!
//! let code = "++++++++[>+++++++++<-]>.";
//! let (tape, output) = run_to_string(code, &Config::default(), "").expect("program should run");
//! assert_eq!(output, "H");
//! assert_eq!(tape.pointer(), 1);
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod io;
pub mod repl;
pub mod tape;
pub mod theme;
pub mod token;

pub use config::{Config, EofPolicy, LoopTest};
pub use error::{BracketKind, Error};
pub use interpreter::{stack_size_for, Interpreter, Stats, StepControl};
pub use io::{ByteInput, FnInput, InputSource, OutputSink, StrInput, WriteSink};
pub use tape::{CellMode, EdgePolicy, Tape};
pub use token::{tokenize, BracketPolicy, Program, Symbol, Token};

/// Final state of a completed run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub tape: Tape,
    pub stats: Stats,
}

/// Tokenize and run `program` on a fresh tape until it halts.
pub fn run(
    program: &str,
    config: &Config,
    output: &mut dyn OutputSink,
    input: &mut dyn InputSource,
) -> Result<Outcome, Error> {
    let mut interp = Interpreter::new(program, config.clone())?;
    let stats = interp.run_with(output, input)?;
    Ok(Outcome { tape: interp.into_tape(), stats })
}

/// Run `program` with `input` as its whole input and collect its output.
pub fn run_to_string(program: &str, config: &Config, input: &str) -> Result<(Tape, String), Error> {
    let mut output = String::new();
    let outcome = run(program, config, &mut output, &mut StrInput::new(input))?;
    Ok((outcome.tape, output))
}
