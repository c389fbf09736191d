use crate::ast::SourcePos;

/// Cursor over a source slice that keeps line/column bookkeeping.
///
/// Offsets reported by [`offset`](Self::offset) are absolute: a reader over
/// a slice of a larger file is created with the slice's base offset.
#[derive(Debug, Clone)]
pub struct SourceReader<'a> {
    source: &'a str,
    base: usize,
    index: usize,
    pos: SourcePos,
}

impl<'a> SourceReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_origin(source, 0, SourcePos::START)
    }

    pub fn with_origin(source: &'a str, base: usize, pos: SourcePos) -> Self {
        Self {
            source,
            base,
            index: 0,
            pos,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn rest(&self) -> &'a str {
        &self.source[self.index..]
    }

    /// Index into this reader's own slice.
    pub fn local_offset(&self) -> usize {
        self.index
    }

    /// Offset within the whole file.
    pub fn offset(&self) -> usize {
        self.base + self.index
    }

    pub fn position(&self) -> SourcePos {
        self.pos
    }

    pub fn is_end(&self) -> bool {
        self.index >= self.source.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += ch.len_utf8();
        if ch == '\n' {
            self.pos.row += 1;
            self.pos.col = 1;
        } else {
            self.pos.col += 1;
        }
        Some(ch)
    }

    pub fn advance_chars(&mut self, count: usize) {
        for _ in 0..count {
            if self.advance().is_none() {
                break;
            }
        }
    }

    /// Moves to `local` (an index into this slice), which must not be behind
    /// the cursor.
    fn advance_to(&mut self, local: usize) {
        while self.index < local {
            if self.advance().is_none() {
                break;
            }
        }
    }

    pub fn read_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.index;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.advance();
        }
        &self.source[start..self.index]
    }

    /// Reads the rest of the current line. The line break is consumed but
    /// not returned.
    pub fn read_line(&mut self) -> &'a str {
        let line = self.read_while(|ch| ch != '\r' && ch != '\n');
        if self.peek() == Some('\r') {
            self.advance();
        }
        if self.peek() == Some('\n') {
            self.advance();
        }
        line
    }

    /// Reads up to and including `guard`. Returns `None` and stays put when
    /// the guard never appears.
    pub fn read_until(&mut self, guard: &str) -> Option<&'a str> {
        let found = self.rest().find(guard)?;
        let start = self.index;
        self.advance_to(start + found + guard.len());
        Some(&self.source[start..self.index])
    }

    pub fn slice(&self, from: usize, to: usize) -> &'a str {
        &self.source[from..to]
    }
}
