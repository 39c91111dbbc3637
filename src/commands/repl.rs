use std::io::{self, IsTerminal, Write};
use clap::Args;

use crate::commands::run::Limits;
use crate::config::Config;
use crate::repl::{execute_bare_once, repl_loop, select_mode, ModeFlagOverride, ReplMode};

#[derive(Args, Debug, Default)]
#[command(disable_help_flag = true)]
pub struct ReplArgs {
    /// Run stdin once without the line editor
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Use the line editor; stdin must be a TTY
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Start from the legacy preset instead of the config file
    #[arg(long = "legacy")]
    pub legacy: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl ReplArgs {
    fn mode_flag(&self) -> ModeFlagOverride {
        if self.bare {
            ModeFlagOverride::Bare
        } else if self.editor {
            ModeFlagOverride::Editor
        } else {
            ModeFlagOverride::None
        }
    }
}

/// `nbf repl`, also what `nbf` runs with no subcommand.
pub fn run(program: &str, args: ReplArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let mode = match select_mode(args.mode_flag()) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let config = if args.legacy { Config::legacy() } else { Config::load() };
    let limits = Limits::resolve(None, None);

    // Ctrl+C leaves with whatever output was produced.
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    match mode {
        ReplMode::Editor => {
            if io::stderr().is_terminal() {
                eprintln!("Nesting Brainfuck REPL (interactive editor mode)");
                eprintln!("Ctrl+D runs the buffer, :help lists meta commands, Ctrl+C quits.");
                let _ = io::stderr().flush();
            }

            if let Err(e) = repl_loop(&config, limits) {
                eprintln!("{program}: REPL error: {e}");
                let _ = io::stderr().flush();
                return 1;
            }

            0
        }
        ReplMode::Bare => {
            match execute_bare_once(&config, limits) {
                Ok(_) => 0,
                Err(e) => {
                    eprintln!("{program}: REPL error: {e}");
                    let _ = io::stderr().flush();
                    1
                }
            }
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} repl [--bare|--editor] [--legacy]

Type or pipe programs and run them one submission at a time.

Options:
  --bare              Read stdin to EOF, run it once, exit
  --editor            Line editor with nesting-colored brackets; stdin must be a TTY
  --legacy            Use the legacy interpreter preset
  --help,   -h        Show this help

In the editor:
  Enter               New line
  Ctrl+D              Run the buffer (Ctrl+Z then Enter on Windows)
  Alt+Up / Alt+Down   Previous / next submitted program
  Ctrl+C              Quit

Meta commands, typed alone as a submission:
  :exit, :quit     Leave with code 0
  :help            List the meta commands
  :config          Print the interpreter settings in use
  :tape            Show cells around the pointer after the last run

Every submission gets a fresh tape and is followed by a newline on stdout.
Runs are bounded by NBF_TIMEOUT_MS (default 2000) and NBF_MAX_STEPS.
NBF_REPL_ONCE=1 leaves the editor after the first run.

Mode: --bare/--editor win over NBF_REPL_MODE=bare|editor, which wins over
auto-detection (editor on a TTY, bare otherwise). Banners only go to a TTY.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
