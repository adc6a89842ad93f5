/// A cursor for byte-by-byte scanning of HTML source.
///
/// Operates over a string slice; positions are byte offsets into it. Callers
/// only stop on ASCII bytes, so slices taken between stops are valid UTF-8.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The string being scanned.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of `s`.
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Returns true if at end of string.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Checks if the remaining input starts with the given byte pattern.
    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i.min(self.s.len())..].starts_with(pat)
    }

    /// Like `starts_with`, ignoring ASCII case.
    pub fn starts_with_ignore_case(&self, pat: &[u8]) -> bool {
        let rest = &self.s.as_bytes()[self.i.min(self.s.len())..];
        rest.len() >= pat.len() && rest[..pat.len()].eq_ignore_ascii_case(pat)
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.s.as_bytes().get(self.i).copied()?;
        self.i += 1;
        Some(b)
    }

    /// Advances by `n` bytes.
    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Consumes bytes while `pred` holds and returns them.
    pub fn bump_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.i.min(self.s.len());
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.i += 1;
        }
        &self.s[start..self.i.min(self.s.len())]
    }

    /// Consumes everything up to (not including) `pat`, or to the end.
    pub fn bump_until(&mut self, pat: &[u8]) -> &'a str {
        let start = self.i.min(self.s.len());
        while !self.eof() && !self.starts_with(pat) {
            self.i += 1;
        }
        &self.s[start..self.i.min(self.s.len())]
    }

    pub fn skip_whitespace(&mut self) {
        self.bump_while(|b| b.is_ascii_whitespace());
    }
}
