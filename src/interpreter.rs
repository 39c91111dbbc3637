//! The nesting-level executor.
//!
//! Loops are never turned into a tree. The executor walks the flat token list
//! for one nesting level at a time: tokens at that level run immediately,
//! deeper tokens are a loop body. When the level drops back, the body is
//! replayed by recursing one level down over the body's sub-slice, once per
//! iteration, until the loop's test cell reads 0. Stack depth therefore follows
//! the lexical nesting of the program, never its iteration count.

use std::io::{self, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::config::{Config, EofPolicy, LoopTest};
use crate::error::Error;
use crate::instruction::{self, cell_char};
use crate::io::{ByteInput, InputSource, OutputSink, WriteSink};
use crate::tape::Tape;
use crate::token::{tokenize, Program, Symbol, Token};

/// Stack reserved regardless of nesting.
const BASE_STACK: usize = 1 << 20;
/// Stack per nesting level, with room for unoptimized builds.
const STACK_PER_LEVEL: usize = 8 << 10;

/// Stack a thread needs to run a program whose loops nest `depth` deep.
///
/// Each level of nesting costs a `run_level` and a `drain` frame. A default
/// 2 MiB thread stack is not enough for [`DEFAULT_MAX_NESTING`](crate::config::DEFAULT_MAX_NESTING)
/// in debug builds, so deep programs should run on a thread built with this size.
pub fn stack_size_for(depth: usize) -> usize {
    BASE_STACK.saturating_add(depth.saturating_mul(STACK_PER_LEVEL))
}

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone)]
pub struct StepControl {
    pub max_steps: Option<u64>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<u64>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// Counters collected during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Instructions dispatched plus loop tests evaluated.
    pub steps: u64,
    /// Loop bodies run to completion or interruption.
    pub loop_iterations: u64,
    /// Deepest recursion reached; equals the deepest loop actually entered.
    pub max_depth: usize,
}

/// A tokenized program bound to its tape.
///
/// Every run continues on the tape as the previous run left it; call
/// [`Interpreter::reset`] for a fresh one.
pub struct Interpreter {
    program: Program,
    tape: Tape,
    config: Config,
}

impl Interpreter {
    /// Tokenize `code` and allocate a zeroed tape.
    ///
    /// Fails on unbalanced brackets under [`BracketPolicy::Strict`](crate::BracketPolicy::Strict)
    /// and on programs nested deeper than `config.max_nesting`.
    pub fn new(code: &str, config: Config) -> Result<Self, Error> {
        let program = tokenize(code, config.brackets)?;
        if program.max_depth() > config.max_nesting {
            return Err(Error::NestingTooDeep {
                depth: program.max_depth(),
                limit: config.max_nesting,
            });
        }
        let tape = Tape::with_policies(config.capacity, config.cells, config.edge);
        Ok(Self { program, tape, config })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn into_tape(self) -> Tape {
        self.tape
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reset(&mut self) {
        self.tape = Tape::with_policies(self.config.capacity, self.config.cells, self.config.edge);
    }

    /// Run against stdout and stdin.
    pub fn run(&mut self) -> Result<Stats, Error> {
        let mut output = WriteSink::new(io::stdout().lock());
        let mut input = ByteInput::new(io::stdin().lock());
        self.run_with(&mut output, &mut input)
    }

    pub fn run_with(
        &mut self,
        output: &mut dyn OutputSink,
        input: &mut dyn InputSource,
    ) -> Result<Stats, Error> {
        self.execute(output, input, None, None)
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control(
        &mut self,
        output: &mut dyn OutputSink,
        input: &mut dyn InputSource,
        control: &StepControl,
    ) -> Result<Stats, Error> {
        self.execute(output, input, None, Some(control))
    }

    /// Debug-run the program, writing a step-by-step table to `table` instead
    /// of producing I/O. The tape advances exactly as in a real run, but:
    /// - '.' does not print the character; the action is logged instead
    /// - ',' does not read input; end of input is simulated and the cell set to 0
    pub fn run_debug(
        &mut self,
        table: &mut dyn Write,
        control: Option<&StepControl>,
    ) -> Result<Stats, Error> {
        writeln!(table, "STEP | IP  | PTR | CELL | INSTR | ACTION")
            .and_then(|_| writeln!(table, "-----+-----+-----+------+-------+------------------------------------------------"))
            .map_err(|source| Error::Io { ip: 0, source })?;
        let mut output = String::new();
        let mut input = crate::io::StrInput::new("");
        self.execute(&mut output, &mut input, Some(table), control)
    }

    fn execute(
        &mut self,
        output: &mut dyn OutputSink,
        input: &mut dyn InputSource,
        table: Option<&mut dyn Write>,
        control: Option<&StepControl>,
    ) -> Result<Stats, Error> {
        log::debug!(
            "running {} instructions, nesting depth {}, tape of {} cells",
            self.program.instructions().len(),
            self.program.max_depth(),
            self.tape.capacity()
        );

        let mut executor = Executor {
            tape: &mut self.tape,
            output,
            input,
            config: &self.config,
            control,
            table: table.map(|t| t as &mut dyn Write),
            stats: Stats::default(),
        };
        let result = executor.run_level(self.program.tokens(), 0);
        let stats = executor.stats;

        match &result {
            Ok(()) => log::debug!(
                "finished: {} steps, {} loop iterations, max depth {}",
                stats.steps,
                stats.loop_iterations,
                stats.max_depth
            ),
            Err(e) => log::debug!("stopped after {} steps: {e}", stats.steps),
        }
        result.map(|()| stats)
    }
}

struct Executor<'a> {
    tape: &'a mut Tape,
    output: &'a mut dyn OutputSink,
    input: &'a mut dyn InputSource,
    config: &'a Config,
    control: Option<&'a StepControl>,
    table: Option<&'a mut dyn Write>,
    stats: Stats,
}

impl Executor<'_> {
    /// Run `tokens` as nesting level `level`.
    ///
    /// A body is pending from its first deeper token until the level drops
    /// back to `level` (or, for sibling loops, until a token opens a new loop
    /// one level down). The pointer at the body's first token is kept as the
    /// loop's entry cell.
    fn run_level(&mut self, tokens: &[Token], level: usize) -> Result<(), Error> {
        // (start of the pending body, pointer when it was entered)
        let mut pending: Option<(usize, usize)> = None;

        for (i, token) in tokens.iter().enumerate() {
            if token.level > level {
                match pending {
                    Some((start, entry))
                        if !self.config.merge_adjacent_loops && token.opens_loop_at(level + 1) =>
                    {
                        self.drain(&tokens[start..i], level + 1, entry)?;
                        pending = Some((i, self.tape.pointer()));
                    }
                    Some(_) => {}
                    None => pending = Some((i, self.tape.pointer())),
                }
                continue;
            }

            if let Some((start, entry)) = pending.take() {
                self.drain(&tokens[start..i], level + 1, entry)?;
            }
            self.dispatch(token)?;
        }

        // Bodies replayed by recursion carry no sentinel; close them here.
        if let Some((start, entry)) = pending {
            self.drain(&tokens[start..], level + 1, entry)?;
        }
        Ok(())
    }

    /// Repeat `body` while the loop's test cell is non-zero.
    fn drain(&mut self, body: &[Token], body_level: usize, entry: usize) -> Result<(), Error> {
        self.stats.max_depth = self.stats.max_depth.max(body_level);
        log::trace!(
            "loop at depth {body_level}: {} tokens, entered at cell {entry}",
            body.len()
        );

        loop {
            self.tick()?;
            let index = match self.config.loop_test {
                LoopTest::Pointer => self.tape.pointer(),
                LoopTest::EntryCell => entry,
            };
            let value = self.tape.cell(index);
            if let Some(table) = self.table.as_mut() {
                let action = if value == 0 {
                    format!("Test cell[{index}] is 0; exit loop at depth {body_level}")
                } else {
                    format!("Test cell[{index}] = {value}; repeat body at depth {body_level}")
                };
                let ip = body.first().map_or(0, |t| t.pos);
                write_row(&mut **table, self.stats.steps - 1, ip, self.tape.pointer(), self.tape.read(), '[', &action)?;
            }
            if value == 0 {
                return Ok(());
            }
            self.stats.loop_iterations += 1;
            self.run_level(body, body_level)?;
        }
    }

    fn dispatch(&mut self, token: &Token) -> Result<(), Error> {
        if token.symbol == Symbol::End {
            return Ok(());
        }
        self.tick()?;

        if self.table.is_none() {
            return instruction::execute(token, self.tape, self.output, self.input, self.config.on_eof);
        }

        let (ptr_before, cell_before) = (self.tape.pointer(), self.tape.read());
        let action = match token.symbol {
            Symbol::Output => {
                let shown = cell_char(cell_before, self.tape.mode())
                    .map_or_else(|| format!("value {cell_before}"), |c| format!("{:?}", c));
                format!("Output {shown} (suppressed in debug)")
            }
            Symbol::Input => {
                instruction::execute(token, self.tape, self.output, self.input, EofPolicy::Zero)?;
                "Read input -> simulated end of input (set cell to 0)".to_string()
            }
            _ => {
                instruction::execute(token, self.tape, self.output, self.input, self.config.on_eof)?;
                match token.symbol {
                    Symbol::Left | Symbol::Right => {
                        format!("Moved pointer head to index {}", self.tape.pointer())
                    }
                    Symbol::Increment => {
                        format!("Increment cell[{ptr_before}] from {cell_before} to {}", self.tape.read())
                    }
                    _ => format!("Decrement cell[{ptr_before}] from {cell_before} to {}", self.tape.read()),
                }
            }
        };

        if let Some(table) = self.table.as_mut() {
            write_row(&mut **table, self.stats.steps - 1, token.pos, ptr_before, cell_before, token.symbol.as_char(), &action)?;
        }
        Ok(())
    }

    /// Count one step, honoring the step limit and the cancel flag.
    fn tick(&mut self) -> Result<(), Error> {
        if let Some(ctrl) = self.control {
            if ctrl.cancel_flag.load(Ordering::Relaxed) {
                return Err(Error::Canceled);
            }
            if let Some(max) = ctrl.max_steps {
                if self.stats.steps >= max {
                    return Err(Error::StepLimitExceeded { limit: max });
                }
            }
        }
        self.stats.steps += 1;
        Ok(())
    }
}

fn write_row(
    table: &mut dyn Write,
    step: u64,
    ip: usize,
    ptr: usize,
    cell: i64,
    instr: char,
    action: &str,
) -> Result<(), Error> {
    writeln!(table, "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}", step, ip, ptr, cell, instr, action)
        .map_err(|source| Error::Io { ip, source })
}
