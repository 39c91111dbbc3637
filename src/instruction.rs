//! What each of the six data/IO instructions does to the tape.

use crate::config::EofPolicy;
use crate::error::Error;
use crate::io::{InputSource, OutputSink};
use crate::tape::{CellMode, Tape};
use crate::token::{Symbol, Token};

/// Apply one instruction. The sentinel does nothing.
pub fn execute(
    token: &Token,
    tape: &mut Tape,
    output: &mut dyn OutputSink,
    input: &mut dyn InputSource,
    on_eof: EofPolicy,
) -> Result<(), Error> {
    let ip = token.pos;
    match token.symbol {
        Symbol::Left => tape.move_left().map_err(|e| Error::PointerOutOfRange {
            ip,
            ptr: e.ptr,
            op: '<',
        }),
        Symbol::Right => tape.move_right().map_err(|e| Error::PointerOutOfRange {
            ip,
            ptr: e.ptr,
            op: '>',
        }),
        Symbol::Increment => {
            tape.increment();
            Ok(())
        }
        Symbol::Decrement => {
            tape.decrement();
            Ok(())
        }
        Symbol::Output => {
            let value = tape.read();
            let ch = cell_char(value, tape.mode()).ok_or(Error::InvalidCodePoint { ip, value })?;
            output.write_char(ch).map_err(|source| Error::Io { ip, source })
        }
        Symbol::Input => {
            match input.read_char().map_err(|source| Error::Io { ip, source })? {
                Some(ch) => tape.write(i64::from(u32::from(ch))),
                None => match on_eof {
                    EofPolicy::Error => return Err(Error::EmptyInput { ip }),
                    EofPolicy::Zero => tape.write(0),
                    EofPolicy::Unchanged => {}
                },
            }
            Ok(())
        }
        Symbol::End => Ok(()),
    }
}

/// The character a cell value prints as, if it has one.
pub fn cell_char(value: i64, mode: CellMode) -> Option<char> {
    match mode {
        // Byte cells are always 0..=255 and map onto Latin-1.
        CellMode::Byte => u8::try_from(value).ok().map(char::from),
        CellMode::Unbounded => u32::try_from(value).ok().and_then(char::from_u32),
    }
}
