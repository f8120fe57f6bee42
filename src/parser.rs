//! Line tokenizer and typed token scanner for engine output.
//!
//! Engine output arrives as raw byte chunks with no alignment to command
//! boundaries. [`LineBuffer`] reassembles the chunks into newline-terminated
//! lines; [`TokenParser`] then scans one line at a time. The scanner carries
//! no state between lines.

use std::str::FromStr;

/// Accumulates raw receive chunks and yields complete lines.
///
/// A trailing partial line is held back until the terminating newline
/// arrives in a later chunk. Carriage returns before the newline are
/// stripped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        LineBuffer::default()
    }

    /// Append a received chunk to the buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete line, without its line terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Number of buffered bytes still waiting for a newline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Whitespace-delimited token scanner over a single command line.
pub struct TokenParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> TokenParser<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        TokenParser { text, pos: 0 }
    }

    fn token_bounds(&self, from: usize) -> Option<(usize, usize)> {
        let bytes = self.text.as_bytes();
        let mut start = from;
        while start < bytes.len() && bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        if start >= bytes.len() {
            return None;
        }
        let mut end = start;
        while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
            end += 1;
        }
        Some((start, end))
    }

    /// Read the next whitespace-delimited token.
    pub fn next_token(&mut self) -> Option<&'a str> {
        let (start, end) = self.token_bounds(self.pos)?;
        self.pos = end;
        Some(&self.text[start..end])
    }

    /// Read the next token and parse it; `None` on parse failure or end of
    /// line.
    pub fn next_typed<T: FromStr>(&mut self) -> Option<T> {
        self.next_token()?.parse().ok()
    }

    /// Read everything before the next token equal to `keyword`, trimmed,
    /// consuming the keyword itself.
    ///
    /// Returns `None` (without advancing) if the keyword does not occur in
    /// the remainder of the line.
    pub fn next_until(&mut self, keyword: &str) -> Option<&'a str> {
        let mut cursor = self.pos;
        let mut first: Option<usize> = None;
        loop {
            let (start, end) = self.token_bounds(cursor)?;
            if &self.text[start..end] == keyword {
                let text_start = first.unwrap_or(start);
                self.pos = end;
                return Some(self.text[text_start..start].trim_end());
            }
            if first.is_none() {
                first = Some(start);
            }
            cursor = end;
        }
    }

    /// Skip tokens until and including `keyword`.
    ///
    /// Returns `false` (without advancing) if the keyword does not occur.
    pub fn jump_past(&mut self, keyword: &str) -> bool {
        let saved = self.pos;
        while let Some(token) = self.next_token() {
            if token == keyword {
                return true;
            }
        }
        self.pos = saved;
        false
    }

    /// Consume and return the remainder of the line, trimmed.
    pub fn rest_of_line(&mut self) -> &'a str {
        let out = self.text[self.pos..].trim();
        self.pos = self.text.len();
        out
    }
}
