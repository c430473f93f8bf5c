/// Bundles the program text with a current position inside it,
/// tracking the line and column of that position as it advances.
pub struct Cursor {
    chars: Vec<char>,
    idx: usize,
    line: usize,
    col: usize,
}

impl Cursor {
    pub fn new(source: &str) -> Self {
        Cursor {
            chars: source.chars().collect(),
            idx: 0,
            line: 1,
            col: 1,
        }
    }

    /// Whether the whole stream has been consumed.
    pub fn done(&self) -> bool {
        self.idx >= self.chars.len()
    }

    /// The character under the cursor. `None` past the end of the
    /// stream, so out-of-range reads never match a real character.
    pub fn cur(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    /// The character directly after the current one.
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.idx + 1).copied()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// Step over the current character. Consuming a `\n` starts the
    /// next line, so `\r\n` counts as a single line break when the
    /// `\n` goes by.
    pub fn advance(&mut self) {
        match self.cur() {
            None => {}
            Some('\n') => {
                self.idx += 1;
                self.line += 1;
                self.col = 1;
            }
            Some(_) => {
                self.idx += 1;
                self.col += 1;
            }
        }
    }

    /// The current character, stepping over it.
    pub fn next(&mut self) -> Option<char> {
        let c = self.cur();
        self.advance();
        c
    }

    /// Skip spaces, tabs and line breaks. A bare `\r` is only
    /// whitespace as part of `\r\n`; otherwise it is left in place for
    /// the lexer to report.
    pub fn skip_whitespace(&mut self) {
        loop {
            match self.cur() {
                Some(' ' | '\t' | '\n') => self.advance(),
                Some('\r') if self.peek() == Some('\n') => self.advance(),
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        assert_eq!((cursor.line(), cursor.col()), (1, 1));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.col()), (1, 2));
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.col()), (2, 1));
        assert_eq!(cursor.cur(), Some('c'));
    }

    #[test]
    fn crlf_is_one_line_break() {
        let mut cursor = Cursor::new("a\r\nb");
        cursor.advance();
        cursor.skip_whitespace();
        assert_eq!(cursor.cur(), Some('b'));
        assert_eq!((cursor.line(), cursor.col()), (2, 1));
    }

    #[test]
    fn bare_carriage_return_is_not_whitespace() {
        let mut cursor = Cursor::new("\rx");
        cursor.skip_whitespace();
        assert_eq!(cursor.cur(), Some('\r'));
    }

    #[test]
    fn reads_past_the_end_yield_the_sentinel() {
        let mut cursor = Cursor::new("x");
        assert_eq!(cursor.next(), Some('x'));
        assert!(cursor.done());
        assert_eq!(cursor.cur(), None);
        assert_eq!(cursor.peek(), None);
        cursor.advance();
        assert_eq!(cursor.next(), None);
    }
}
