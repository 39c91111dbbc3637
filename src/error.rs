use std::fmt;

/// Errors that can occur while tokenizing or executing a program.
///
/// Positions (`ip`) are char indices into the original source text, so they
/// can be shown with a caret under the offending instruction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Brackets did not balance: a `]` closed nothing, or a `[` was never closed.
    #[error("Unbalanced loop: unmatched {kind} at instruction {ip}")]
    UnbalancedLoop { ip: usize, kind: BracketKind },

    /// The pointer tried to leave the tape under [`EdgePolicy::Error`](crate::EdgePolicy::Error).
    #[error("Pointer out of range at instruction {ip} (ptr={ptr}, op='{op}')")]
    PointerOutOfRange { ip: usize, ptr: usize, op: char },

    /// `,` asked for a character and the input source had none.
    #[error("No input available for ',' at instruction {ip}")]
    EmptyInput { ip: usize },

    /// `.` found a cell value that is not a Unicode scalar value.
    #[error("Cell value {value} is not a valid code point at instruction {ip}")]
    InvalidCodePoint { ip: usize, value: i64 },

    /// Reading input or writing output failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: std::io::Error,
    },

    /// Loops are nested deeper than the executor is allowed to recurse.
    #[error("Loops nested {depth} deep exceed the limit of {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: u64 },

    /// Execution aborted due to cooperative cancellation (e.g., timeout)
    #[error("Execution aborted: cancelled")]
    Canceled,
}

impl Error {
    /// Source position the error points at, if it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::UnbalancedLoop { ip, .. }
            | Error::PointerOutOfRange { ip, .. }
            | Error::EmptyInput { ip }
            | Error::InvalidCodePoint { ip, .. }
            | Error::Io { ip, .. } => Some(*ip),
            Error::NestingTooDeep { .. } | Error::StepLimitExceeded { .. } | Error::Canceled => None,
        }
    }
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Open,
    Close,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Open => write!(f, "'['"),
            BracketKind::Close => write!(f, "']'"),
        }
    }
}
