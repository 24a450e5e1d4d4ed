/// A byte cursor over one line of markup.
///
/// Every delimiter in the grammar is ASCII, so any position where a
/// delimiter matches is also a char boundary and safe to slice at.
#[derive(Clone)]
pub struct Cursor<'a> {
    pub s: &'a str,
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// The character just before the cursor, if any.
    pub fn prev_char(&self) -> Option<char> {
        self.s.get(..self.i)?.chars().next_back()
    }

    /// The character just after a delimiter of `len` bytes at the cursor.
    pub fn char_after(&self, len: usize) -> Option<char> {
        self.s.get(self.i + len..)?.chars().next()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s
            .as_bytes()
            .get(self.i..)
            .is_some_and(|rest| rest.starts_with(pat))
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// The text between `start` and the cursor.
    pub fn since(&self, start: usize) -> &'a str {
        &self.s[start..self.i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("**x");
        assert!(cur.starts_with(b"**"));
        assert_eq!(cur.bump(), Some(b'*'));
        assert_eq!(cur.prev_char(), Some('*'));
        assert_eq!(cur.char_after(1), Some('x'));
        cur.bump_n(2);
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.since(1), "*x");
    }

    #[test]
    fn starts_with_past_the_end() {
        let mut cur = Cursor::new("a");
        cur.bump_n(5);
        assert!(!cur.starts_with(b""));
        assert!(!cur.starts_with(b"a"));
    }

    #[test]
    fn neighbours_of_multibyte_text() {
        let mut cur = Cursor::new("é_ü");
        cur.bump_n("é".len());
        assert_eq!(cur.peek(), Some(b'_'));
        assert_eq!(cur.prev_char(), Some('é'));
        assert_eq!(cur.char_after(1), Some('ü'));
    }
}
