//! Turns program text into a flat list of depth-annotated tokens.
//!
//! Brackets never become tokens. They only move the nesting counter, and every
//! instruction after them carries the counter's value as its level. Anything
//! that is not one of `<>+-.,[]` is a comment and is dropped.

use crate::error::{BracketKind, Error};

/// The six data/IO instructions, plus the end-of-program sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Left,
    Right,
    Increment,
    Decrement,
    Output,
    Input,
    /// Sentinel appended after the last instruction; does nothing when run.
    End,
}

impl Symbol {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '<' => Some(Symbol::Left),
            '>' => Some(Symbol::Right),
            '+' => Some(Symbol::Increment),
            '-' => Some(Symbol::Decrement),
            '.' => Some(Symbol::Output),
            ',' => Some(Symbol::Input),
            _ => None,
        }
    }

    /// Source character; the sentinel shows as a space.
    pub fn as_char(self) -> char {
        match self {
            Symbol::Left => '<',
            Symbol::Right => '>',
            Symbol::Increment => '+',
            Symbol::Decrement => '-',
            Symbol::Output => '.',
            Symbol::Input => ',',
            Symbol::End => ' ',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    /// Number of loops still open when this instruction appears.
    pub level: usize,
    /// Number of `[` seen since the previous instruction. A non-zero value
    /// marks the first instruction of one or more freshly opened loops.
    pub opens: usize,
    /// Char index of the instruction in the source.
    pub pos: usize,
}

impl Token {
    pub fn sentinel(pos: usize) -> Self {
        Self {
            symbol: Symbol::End,
            level: 0,
            opens: 0,
            pos,
        }
    }

    /// Whether this token begins a new loop whose body sits at `body_level`.
    pub fn opens_loop_at(&self, body_level: usize) -> bool {
        self.opens > 0 && self.level - self.opens < body_level && self.level >= body_level
    }
}

/// What the tokenizer does with brackets that do not pair up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BracketPolicy {
    /// Report the first unmatched bracket as [`Error::UnbalancedLoop`].
    #[default]
    Strict,
    /// Ignore stray `]`; a `[` that is never closed extends to the end of the program.
    Lenient,
}

/// A tokenized program, ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    tokens: Vec<Token>,
    max_depth: usize,
}

impl Program {
    /// All tokens, ending with the sentinel.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Instruction tokens without the sentinel.
    pub fn instructions(&self) -> &[Token] {
        &self.tokens[..self.tokens.len() - 1]
    }

    /// Deepest loop nesting of any instruction.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

pub fn tokenize(code: &str, policy: BracketPolicy) -> Result<Program, Error> {
    let mut tokens = Vec::new();
    // Positions of the `[` still open, innermost last.
    let mut open: Vec<usize> = Vec::new();
    let mut pending_opens: usize = 0;
    let mut max_depth: usize = 0;
    let mut len = 0;

    for (pos, ch) in code.chars().enumerate() {
        len = pos + 1;
        match ch {
            '[' => {
                open.push(pos);
                pending_opens += 1;
            }
            ']' => {
                if open.pop().is_none() {
                    match policy {
                        BracketPolicy::Strict => {
                            return Err(Error::UnbalancedLoop { ip: pos, kind: BracketKind::Close });
                        }
                        BracketPolicy::Lenient => {
                            log::warn!("ignoring unmatched ']' at instruction {pos}");
                            continue;
                        }
                    }
                }
                // A loop closed before any instruction of its own ran: it was empty.
                pending_opens = pending_opens.saturating_sub(1);
            }
            _ => {
                let Some(symbol) = Symbol::from_char(ch) else {
                    continue;
                };
                let level = open.len();
                max_depth = max_depth.max(level);
                tokens.push(Token {
                    symbol,
                    level,
                    opens: pending_opens,
                    pos,
                });
                pending_opens = 0;
            }
        }
    }

    if let Some(&unclosed) = open.last() {
        match policy {
            BracketPolicy::Strict => {
                return Err(Error::UnbalancedLoop { ip: unclosed, kind: BracketKind::Open });
            }
            BracketPolicy::Lenient => {
                log::warn!("{} unclosed '[' (innermost at instruction {unclosed}) run to end of program", open.len());
            }
        }
    }

    tokens.push(Token::sentinel(len));
    Ok(Program { tokens, max_depth })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(program: &Program) -> Vec<(char, usize)> {
        program.instructions().iter().map(|t| (t.symbol.as_char(), t.level)).collect()
    }

    #[test]
    fn comments_only_yield_just_the_sentinel() {
        let program = tokenize("hello world\n 123 ?!", BracketPolicy::Strict).unwrap();
        assert_eq!(program.tokens().len(), 1);
        assert_eq!(program.tokens()[0].symbol, Symbol::End);
        assert_eq!(program.tokens()[0].level, 0);
        assert!(program.instructions().is_empty());
    }

    #[test]
    fn brackets_set_level_of_following_instructions() {
        let program = tokenize("+[>[-]<]+", BracketPolicy::Strict).unwrap();
        assert_eq!(
            levels(&program),
            vec![('+', 0), ('>', 1), ('-', 2), ('<', 1), ('+', 0)]
        );
        assert_eq!(program.max_depth(), 2);
    }

    #[test]
    fn positions_count_chars_not_bytes() {
        let program = tokenize("é+", BracketPolicy::Strict).unwrap();
        assert_eq!(program.instructions()[0].pos, 1);
        assert_eq!(program.tokens().last().unwrap().pos, 2);
    }

    #[test]
    fn opens_marks_first_instruction_of_each_loop() {
        let program = tokenize("[[-]>][+]", BracketPolicy::Strict).unwrap();
        let opens: Vec<usize> = program.instructions().iter().map(|t| t.opens).collect();
        assert_eq!(opens, vec![2, 0, 1]);
        let plus = program.instructions()[2];
        assert!(plus.opens_loop_at(1));
        assert!(!program.instructions()[1].opens_loop_at(1));
    }

    #[test]
    fn empty_loop_does_not_leak_an_open_marker() {
        let program = tokenize("[]+", BracketPolicy::Strict).unwrap();
        assert_eq!(program.instructions()[0].opens, 0);
        assert_eq!(program.instructions()[0].level, 0);
    }

    #[test]
    fn nested_empty_loops_close_their_own_markers() {
        let program = tokenize("[[]]+[+]", BracketPolicy::Strict).unwrap();
        let marks: Vec<(usize, usize)> = program.instructions().iter().map(|t| (t.level, t.opens)).collect();
        assert_eq!(marks, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn strict_rejects_stray_close() {
        let err = tokenize("+]", BracketPolicy::Strict).unwrap_err();
        assert!(matches!(err, Error::UnbalancedLoop { ip: 1, kind: BracketKind::Close }));
    }

    #[test]
    fn strict_rejects_unclosed_open() {
        let err = tokenize("[[+]", BracketPolicy::Strict).unwrap_err();
        assert!(matches!(err, Error::UnbalancedLoop { ip: 0, kind: BracketKind::Open }));
    }

    #[test]
    fn lenient_ignores_stray_close_and_keeps_levels_non_negative() {
        let program = tokenize("]+[-", BracketPolicy::Lenient).unwrap();
        assert_eq!(levels(&program), vec![('+', 0), ('-', 1)]);
    }
}
