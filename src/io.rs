//! Where `.` writes to and where `,` reads from.

use std::io::{self, Read, Write};

/// Append-only destination for characters produced by `.`.
pub trait OutputSink {
    fn write_char(&mut self, ch: char) -> io::Result<()>;
}

impl OutputSink for String {
    fn write_char(&mut self, ch: char) -> io::Result<()> {
        self.push(ch);
        Ok(())
    }
}

/// Encodes characters as UTF-8 into any [`Write`].
///
/// Code points below 256 are written as the single raw byte, so byte-oriented
/// programs round-trip through pipes unchanged.
pub struct WriteSink<W: Write> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> OutputSink for WriteSink<W> {
    fn write_char(&mut self, ch: char) -> io::Result<()> {
        let code = u32::from(ch);
        if code < 256 {
            self.inner.write_all(&[code as u8])?;
        } else {
            let mut buf = [0u8; 4];
            self.inner.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
        }
        // Programs often prompt before reading; keep output visible.
        self.inner.flush()
    }
}

/// On-demand provider of one character per `,`.
///
/// `Ok(None)` means no character is available; what happens next is up to
/// the configured [`EofPolicy`](crate::EofPolicy).
pub trait InputSource {
    fn read_char(&mut self) -> io::Result<Option<char>>;
}

/// Serves the characters of a string, one per request.
pub struct StrInput {
    chars: std::vec::IntoIter<char>,
}

impl StrInput {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl InputSource for StrInput {
    fn read_char(&mut self) -> io::Result<Option<char>> {
        Ok(self.chars.next())
    }
}

/// Reads one byte per request from any [`Read`]; each byte is taken as a
/// Latin-1 code point.
pub struct ByteInput<R: Read> {
    inner: R,
}

impl<R: Read> ByteInput<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> InputSource for ByteInput<R> {
    fn read_char(&mut self) -> io::Result<Option<char>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(char::from(buf[0]))),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Adapts a closure into an [`InputSource`].
pub struct FnInput<F>(pub F);

impl<F: FnMut() -> Option<char>> InputSource for FnInput<F> {
    fn read_char(&mut self) -> io::Result<Option<char>> {
        Ok((self.0)())
    }
}
