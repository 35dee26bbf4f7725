//! Forward-only character source with one character of lookahead.

/// Reads characters strictly in order, tracking the 1-based line number.
///
/// `\r` is dropped so CRLF input reads like LF input. [`peek`](Self::peek)
/// buffers at most one character; nothing already consumed is revisited.
#[derive(Debug, Clone)]
pub struct CharSource<I: Iterator<Item = char>> {
    chars: I,
    peeked: Option<Option<char>>,
    line: usize,
}

impl<I: Iterator<Item = char>> CharSource<I> {
    pub fn new(chars: I) -> Self {
        Self {
            chars,
            peeked: None,
            line: 1,
        }
    }

    /// Line of the next character to be read.
    pub fn line(&self) -> usize {
        self.line
    }

    fn pull(&mut self) -> Option<char> {
        self.chars.by_ref().find(|&c| c != '\r')
    }

    /// Returns the next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        match self.peeked {
            Some(c) => c,
            None => {
                let c = self.pull();
                self.peeked = Some(c);
                c
            }
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for CharSource<I> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let c = match self.peeked.take() {
            Some(c) => c,
            None => self.pull(),
        }?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }
}
