//! Line sources consumed by READ.

use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Supplies one input line per READ.
///
/// `Ok(None)` means the input is exhausted; READ then stores nil.
pub trait InputSource {
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }
}

/// Pre-supplied lines, consumed front to back.
#[derive(Debug, Clone, Default)]
pub struct LineQueue {
    lines: VecDeque<String>,
}

impl LineQueue {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split `text` into lines (`\n` or `\r\n` separated).
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputSource for LineQueue {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Reads lines on demand from a buffered reader, e.g. locked stdin.
#[derive(Debug)]
pub struct Interactive<R> {
    reader: R,
}

impl<R: BufRead> Interactive<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> InputSource for Interactive<R> {
    /// Bytes that are not valid UTF-8 become U+FFFD instead of failing.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        let line = match String::from_utf8(buf) {
            Ok(line) => line,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(Some(line))
    }
}
