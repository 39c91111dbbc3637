use clap::Args;
use std::{env, fs, thread};
use std::io::{self, Write};
use std::sync::{mpsc, Arc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cli_util::print_error;
use crate::config::{self, Config, EofPolicy, LoopTest};
use crate::interpreter::{stack_size_for, Interpreter, Stats, StepControl};
use crate::io::{ByteInput, WriteSink};
use crate::tape::{CellMode, EdgePolicy, Tape};
use crate::token::BracketPolicy;
use crate::Error;

/// Wall-clock limit when neither `--timeout` nor `NBF_TIMEOUT_MS` is given.
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Print a step-by-step table of operations instead of executing
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true)]
    pub code: Vec<String>,

    /// Start from the legacy preset instead of the config file
    #[arg(long = "legacy")]
    pub legacy: bool,

    /// Number of tape cells
    #[arg(long = "capacity", value_name = "N")]
    pub capacity: Option<usize>,

    /// Cell width: byte or unbounded
    #[arg(long = "cells", value_name = "MODE", value_parser = parse_with(config::parse_cells))]
    pub cells: Option<CellMode>,

    /// Loop test cell: pointer or entry
    #[arg(long = "loop-test", value_name = "MODE", value_parser = parse_with(config::parse_loop_test))]
    pub loop_test: Option<LoopTest>,

    /// Tape edge policy: clamp, error or overhang
    #[arg(long = "edge", value_name = "POLICY", value_parser = parse_with(config::parse_edge))]
    pub edge: Option<EdgePolicy>,

    /// Ignore unbalanced brackets instead of reporting them
    #[arg(long = "lenient")]
    pub lenient: bool,

    /// End-of-input policy for ',': error, zero or unchanged
    #[arg(long = "on-eof", value_name = "POLICY", value_parser = parse_with(config::parse_eof))]
    pub on_eof: Option<EofPolicy>,

    /// Wall-clock timeout in milliseconds, 0 for none (fallback NBF_TIMEOUT_MS; default 2_000)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback NBF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl RunArgs {
    /// Layer flags over the legacy preset or the loaded config file.
    pub fn config(&self) -> Config {
        let mut cfg = if self.legacy { Config::legacy() } else { Config::load() };
        if let Some(capacity) = self.capacity { cfg.capacity = capacity; }
        if let Some(cells) = self.cells { cfg.cells = cells; }
        if let Some(loop_test) = self.loop_test { cfg.loop_test = loop_test; }
        if let Some(edge) = self.edge { cfg.edge = edge; }
        if self.lenient { cfg.brackets = BracketPolicy::Lenient; }
        if let Some(on_eof) = self.on_eof { cfg.on_eof = on_eof; }
        cfg
    }
}

fn parse_with<T>(parse: fn(&str) -> Option<T>) -> impl Fn(&str) -> Result<T, String> + Clone + Send + Sync + 'static
where
    T: 'static,
{
    move |s: &str| parse(s).ok_or_else(|| format!("unrecognized value '{s}'"))
}

/// Wall-clock and step limits for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// `None` waits forever.
    pub timeout_ms: Option<u64>,
    pub max_steps: Option<u64>,
}

impl Limits {
    /// Resolve limits: flags -> env -> defaults
    pub fn resolve(timeout_ms: Option<u64>, max_steps: Option<u64>) -> Self {
        let timeout_ms = timeout_ms
            .or_else(|| env::var("NBF_TIMEOUT_MS").ok().and_then(|s| s.parse::<u64>().ok()))
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let max_steps = max_steps
            .or_else(|| env::var("NBF_MAX_STEPS").ok().and_then(|s| s.parse::<u64>().ok()));
        Self {
            timeout_ms: (timeout_ms > 0).then_some(timeout_ms),
            max_steps,
        }
    }
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    if args.file.is_none() && args.code.is_empty() {
        usage_and_exit(program, 2);
    }

    if args.file.is_some() && !args.code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let code_str = if let Some(path) = &args.file {
        match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{program}: failed to read code file as UTF-8: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
    } else {
        args.code.join("")
    };

    let config = args.config();
    let limits = Limits::resolve(args.timeout_ms, args.max_steps);
    let (exit_code, _) = execute_guarded(Some(program), &code_str, config, args.debug, limits);

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    exit_code
}

/// Tokenize `code` and run it on a worker thread under `limits`.
///
/// Program output goes to stdout and `,` reads bytes from stdin. Errors and
/// abort messages go to stderr. Returns the exit code and, unless the worker
/// had to be abandoned on timeout, the final tape.
pub fn execute_guarded(
    program: Option<&str>,
    code: &str,
    config: Config,
    debug: bool,
    limits: Limits,
) -> (i32, Option<Tape>) {
    let mut interp = match Interpreter::new(code, config) {
        Ok(interp) => interp,
        Err(err) => {
            print_error(program, code, &err);
            return (1, None);
        }
    };

    // Execute on a worker thread with cooperative cancellation
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<(Result<Stats, Error>, Tape)>();
    let ctrl = StepControl::new(limits.max_steps, cancel.clone());

    let stack = stack_size_for(interp.program().max_depth());
    let spawned = thread::Builder::new().name("nbf-run".into()).stack_size(stack).spawn(move || {
        // Unlocked handles: the main thread still prints after a timeout.
        let res = if debug {
            interp.run_debug(&mut io::stdout(), Some(&ctrl))
        } else {
            let mut output = WriteSink::new(io::stdout());
            let mut input = ByteInput::new(io::stdin());
            interp.run_with_control(&mut output, &mut input, &ctrl)
        };
        let _ = tx.send((res, interp.into_tape()));
    });
    if let Err(e) = spawned {
        let prefix = program.map(|p| format!("{p}: ")).unwrap_or_default();
        eprintln!("{prefix}failed to start interpreter thread ({stack} byte stack): {e}");
        let _ = io::stderr().flush();
        return (1, None);
    }

    let received = match limits.timeout_ms {
        Some(ms) => rx.recv_timeout(Duration::from_millis(ms)),
        None => rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
    };

    let timeout_ms = limits.timeout_ms.unwrap_or_default();
    match received {
        Ok((Ok(_), tape)) => (0, Some(tape)),
        Ok((Err(Error::StepLimitExceeded { limit }), tape)) => {
            eprintln!("Execution aborted: step limit exceeded ({limit})");
            let _ = io::stderr().flush();
            (1, Some(tape))
        }
        Ok((Err(Error::Canceled), tape)) => {
            eprintln!("Execution aborted: wall-clock timeout exceeded ({timeout_ms} ms)");
            let _ = io::stderr().flush();
            (1, Some(tape))
        }
        Ok((Err(other), tape)) => {
            print_error(program, code, &other);
            (1, Some(tape))
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            eprintln!("Execution aborted: wall-clock timeout exceeded ({timeout_ms} ms)");
            let _ = io::stderr().flush();
            (1, None)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => (1, None),
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [OPTIONS] "<code>"
  {0} run [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>    Read Brainfuck code from PATH instead of positional "<code>"
  --debug, -d           Print a step-by-step table of operations instead of executing
  --legacy              Start from the legacy preset (unbounded cells, entry-cell loop
                        test, pointer may pass the last cell, lenient brackets)
  --capacity <N>        Number of tape cells (default 30000)
  --cells <MODE>        byte | unbounded
  --loop-test <MODE>    pointer | entry
  --edge <POLICY>       clamp | error | overhang
  --lenient             Ignore unbalanced brackets
  --on-eof <POLICY>     error | zero | unchanged
  --timeout <MS>        Wall-clock limit, 0 for none (env NBF_TIMEOUT_MS; default 2000)
  --max-steps <N>       Step limit (env NBF_MAX_STEPS; default unlimited)
  --help,  -h           Show this help

Notes:
- Input (`,`) reads a single byte from stdin.
- Characters outside of Brainfuck's ><+-.,[] are comments.
- Settings not given as flags come from [interpreter] in $NBF_CONFIG or ~/.config/nbf.toml.

Examples:
- Load Brainfuck code from a file:
    {0} run --file ./program.bf
- Read bytes from a file as stdin (`,` will consume file input):
    {0} run --on-eof zero ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
