use std::io::{self, Write};
use crate::Error;

/// Pretty-print an [`Error`] with caret positioning when it has a position.
/// If `program` is `Some("nbf")`, prefix messages with "nbf: ..." for CLI run mode
pub fn print_error(program: Option<&str>, code: &str, err: &Error) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        Error::UnbalancedLoop { ip, kind } => {
            let msg = prefix_program(&format!("Parse error: unmatched bracket {kind}"));
            print_error_with_context(&msg, code, *ip);
        }
        Error::PointerOutOfRange { ip, ptr, op } => {
            let msg = prefix_program(&format!(
                "Runtime error: pointer out of range (ptr={ptr}, op={op})"
            ));
            print_error_with_context(&msg, code, *ip);
        }
        Error::EmptyInput { ip } => {
            let msg = prefix_program("Runtime error: no input available for ','");
            print_error_with_context(&msg, code, *ip);
        }
        Error::InvalidCodePoint { ip, value } => {
            let msg = prefix_program(&format!(
                "Runtime error: cell value {value} is not a printable code point"
            ));
            print_error_with_context(&msg, code, *ip);
        }
        Error::Io { ip, source } => {
            let msg = prefix_program(&format!("I/O error: {source}"));
            print_error_with_context(&msg, code, *ip);
        }
        Error::NestingTooDeep { .. } | Error::StepLimitExceeded { .. } | Error::Canceled => {
            eprintln!("{}", prefix_program(&err.to_string()));
            let _ = io::stderr().flush();
        }
    }
}

/// Print a concise error with instruction index and a caret context window,
/// working with UTF-8 by slicing using char indices.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{prefix} at instruction {pos}");
    let (slice, caret) = context_window(code, pos);
    eprintln!("  {}", slice);
    eprintln!("  {}", caret);
    let _ = io::stderr().flush();
}

/// The source around `pos` on one line, and a caret line pointing at `pos`.
fn context_window(code: &str, pos: usize) -> (String, String) {
    const WINDOW_CHARS: usize = 32;

    let start_char = pos.saturating_sub(WINDOW_CHARS);
    // Newlines would break the caret alignment.
    let slice: String = code
        .chars()
        .skip(start_char)
        .take(pos - start_char + WINDOW_CHARS + 1)
        .map(|c| if c == '\n' || c == '\t' || c == '\r' { ' ' } else { c })
        .collect();

    let mut underline = " ".repeat(pos - start_char);
    underline.push('^');
    (slice, underline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_sits_under_position() {
        let (slice, caret) = context_window("++\n[>", 3);
        assert_eq!(slice, "++ [>");
        assert_eq!(caret, "   ^");
    }

    #[test]
    fn long_sources_are_windowed() {
        let code = "+".repeat(100);
        let (slice, caret) = context_window(&code, 50);
        assert_eq!(slice.chars().count(), 65);
        assert_eq!(caret.len(), 33);
    }
}
