use std::env;
use std::io::{self, IsTerminal, Write};
use reedline::{Signal, DefaultPrompt, DefaultPromptSegment, HistoryItem, Highlighter, StyledText};
use nu_ansi_term::Style;

use crate::commands::run::{execute_guarded, Limits};
use crate::config::Config;
use crate::tape::Tape;

/// Cells shown by `:tape`.
const TAPE_WINDOW: usize = 16;

/// What the editor loop should do after a meta command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meta {
    Exit,
    Continue,
}

pub fn repl_loop(config: &Config, limits: Limits) -> io::Result<()> {
    let mut editor = init_line_editor()?;
    let mut last_tape: Option<Tape> = None;

    loop {
        let Some(submission) = read_submission_interactive(&mut editor)? else {
            // Ctrl+C, Ctrl+D on an empty line, or a dead terminal.
            println!();
            io::stdout().flush()?;
            return Ok(());
        };

        let trimmed = submission.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(command) = trimmed.strip_prefix(':') {
            if handle_meta(command, config, last_tape.as_ref()) == Meta::Exit {
                return Ok(());
            }
            continue;
        }

        if !has_instructions(trimmed) {
            continue;
        }

        // Each submission starts with a fresh tape
        last_tape = execute_buffer(trimmed, config, limits);

        // Test hook: if NBF_REPL_ONCE=1, exit after one execution
        if env::var("NBF_REPL_ONCE").ok().as_deref() == Some("1") {
            return Ok(());
        }
    }
}

fn handle_meta(command: &str, config: &Config, last_tape: Option<&Tape>) -> Meta {
    match command.trim() {
        "exit" | "quit" => return Meta::Exit,
        "help" => eprintln!(":exit  leave the REPL\n:config  show interpreter settings\n:tape  show cells around the pointer after the last run"),
        "config" => eprintln!("{config:#?}"),
        "tape" => match last_tape {
            Some(tape) => eprintln!("{}", render_tape(tape)),
            None => eprintln!("no program has run yet"),
        },
        other => eprintln!("unknown meta command ':{other}' (try :help)"),
    }
    let _ = io::stderr().flush();
    Meta::Continue
}

/// Cells around the pointer, with the pointer's cell bracketed.
fn render_tape(tape: &Tape) -> String {
    let (base, window) = tape.window(TAPE_WINDOW);
    let cells: Vec<String> = window
        .iter()
        .enumerate()
        .map(|(i, v)| if base + i == tape.pointer() { format!("[{v}]") } else { v.to_string() })
        .collect();
    format!("ptr={} cells {}..: {}", tape.pointer(), base, cells.join(" "))
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{
        default_emacs_keybindings, EditCommand, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent,
    };

    // Programs span lines: Enter breaks the line, Ctrl+D (Ctrl+Z on Windows) runs the buffer.
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Edit(vec![EditCommand::InsertNewline]));
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Alt+Up/Alt+Down navigate history items; plain Up/Down stay inside the buffer.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(NestingHighlighter::new_catppuccin_mocha()))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

/// Everything on `stdin` up to EOF, or `None` when it is empty or unreadable.
pub fn read_submission<R: io::BufRead>(stdin: &mut R) -> Option<String> {
    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer).ok()?;
    (!buffer.is_empty()).then_some(buffer)
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("nbf".to_string()), DefaultPromptSegment::Empty);

    // Enter inserts a newline; Ctrl+D or Ctrl+Z submits the whole buffer
    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            // Whole programs go into history, not single lines.
            if !buffer.trim().is_empty() {
                let _ = editor.history_mut().save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC | Signal::CtrlD) => Ok(None),
        Err(e) => {
            log::error!("line editor failed: {e}");
            Ok(None)
        }
    }
}

/// Whether `s` contains anything the interpreter would act on.
fn has_instructions(s: &str) -> bool {
    s.chars().any(|c| matches!(c, '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']'))
}

/// Run one submission on a fresh tape under `limits`, then end the line so the
/// next prompt starts at column 0. Returns the tape unless the run was abandoned.
fn execute_buffer(buffer: &str, config: &Config, limits: Limits) -> Option<Tape> {
    let (_, tape) = execute_guarded(None, buffer, config.clone(), false, limits);
    println!();
    let _ = io::stdout().flush();
    tape
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !io::stdin().is_terminal() {
                return Err("cannot start editor: stdin is not a TTY (use --bare or NBF_REPL_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    if let Ok(val) = env::var("NBF_REPL_MODE") {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !io::stdin().is_terminal() {
                    return Err("cannot start editor: stdin is not a TTY (use NBF_REPL_MODE=bare)".to_string());
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid NBF_REPL_MODE value: {val}, must be 'bare' or 'editor'")),
        }
    }

    // Neither flag nor env: follow the terminal.
    if io::stdin().is_terminal() {
        Ok(ReplMode::Editor)
    } else {
        Ok(ReplMode::Bare)
    }
}

/// Bare mode: read stdin to EOF, run it once. The program's own `,` then
/// sees end of input.
pub fn execute_bare_once(config: &Config, limits: Limits) -> io::Result<()> {
    // The lock must be gone before the program's own `,` reads stdin.
    let submission = read_submission(&mut io::stdin().lock());
    if let Some(s) = submission {
        let trimmed = s.trim();
        if has_instructions(trimmed) {
            execute_buffer(trimmed, config, limits);
        }
    }
    Ok(())
}

/// Colors instructions by kind and brackets by the nesting level they open
/// or close, so the loop structure the executor will see is visible while typing.
#[derive(Default)]
struct NestingHighlighter {
    map_move: Style,
    map_left: Style,
    map_plus: Style,
    map_minus: Style,
    map_dot: Style,
    map_comma: Style,
    bracket_levels: Vec<Style>,
    map_unmatched: Style,
    map_other: Style,
}

impl NestingHighlighter {
    fn new_catppuccin_mocha() -> Self {
        use crate::theme::catppuccin::Mocha as P;

        let mut s = Self::default();
        s.map_move = Style::new().fg(P::SKY).bold();
        s.map_left = Style::new().fg(P::TEAL).bold();
        s.map_plus = Style::new().fg(P::GREEN).bold();
        s.map_minus = Style::new().fg(P::RED).bold();
        s.map_dot = Style::new().fg(P::YELLOW).bold();
        s.map_comma = Style::new().fg(P::PEACH).bold();
        s.bracket_levels = P::NESTING.iter().map(|&c| Style::new().fg(c).bold()).collect();
        s.map_unmatched = Style::new().fg(P::RED).bold().underline();
        s.map_other = Style::new().fg(P::SURFACE2);
        s
    }

    fn bracket_style(&self, level: usize) -> Style {
        self.bracket_levels[level % self.bracket_levels.len()]
    }

    /// Style for `ch`, tracking bracket depth across the buffer.
    fn style_for(&self, ch: char, depth: &mut usize) -> Style {
        match ch {
            '>' => self.map_move,
            '<' => self.map_left,
            '+' => self.map_plus,
            '-' => self.map_minus,
            '.' => self.map_dot,
            ',' => self.map_comma,
            '[' => {
                *depth += 1;
                self.bracket_style(*depth - 1)
            }
            ']' => match depth.checked_sub(1) {
                Some(d) => {
                    *depth = d;
                    self.bracket_style(d)
                }
                None => self.map_unmatched,
            },
            _ => self.map_other,
        }
    }
}

impl Highlighter for NestingHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut text = StyledText::new();
        let mut depth = 0;
        for ch in line.chars() {
            let style = self.style_for(ch, &mut depth);
            // Runs of one style share a segment.
            match text.buffer.last_mut() {
                Some((last, run)) if *last == style => run.push(ch),
                _ => text.push((style, ch.to_string())),
            }
        }
        text
    }
}
