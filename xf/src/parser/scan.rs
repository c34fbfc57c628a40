//! Byte-level helpers shared by the scanner, the statement grammar and mod substitution.
//!
//! All positions are byte offsets. String literals open with `"`, honour backslash
//! escapes, and (for scanning purposes) end at the closing quote or the end of the line.

/// `[A-Za-z0-9_]`
pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Offset just past the literal whose opening quote is at `open`.
/// An unterminated literal ends at the next newline (not consumed) or end of input.
pub(crate) fn literal_end(bytes: &[u8], open: usize) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Like [`literal_end`] but an unterminated literal runs to end of input.
pub(crate) fn literal_end_unbounded(bytes: &[u8], open: usize) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Iterates the positions in `start..end` that are outside string literals and `//` comments.
pub(crate) struct CodeBytes<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> CodeBytes<'a> {
    pub(crate) fn new(bytes: &'a [u8], start: usize, end: usize) -> Self {
        CodeBytes {
            bytes,
            pos: start,
            end: end.min(bytes.len()),
        }
    }
}

impl Iterator for CodeBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<(usize, u8)> {
        while self.pos < self.end {
            let i = self.pos;
            match self.bytes[i] {
                b'"' => self.pos = literal_end(self.bytes, i),
                b'/' if self.bytes.get(i + 1) == Some(&b'/') => {
                    self.pos = self.bytes[i..self.end]
                        .iter()
                        .position(|&b| b == b'\n')
                        .map_or(self.end, |n| i + n);
                }
                b => {
                    self.pos = i + 1;
                    return Some((i, b));
                }
            }
        }
        None
    }
}

/// Position of the `}` matching the `{` at `open`, searching no further than `end`.
pub(crate) fn matching_brace(bytes: &[u8], open: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, b) in CodeBytes::new(bytes, open, end) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// First occurrence of `needle` in `text` outside literals and comments.
pub(crate) fn find_code_byte(text: &str, needle: u8) -> Option<usize> {
    CodeBytes::new(text.as_bytes(), 0, text.len())
        .find(|&(_, b)| b == needle)
        .map(|(pos, _)| pos)
}

/// `line` without a trailing `//` comment. A `//` inside a literal is kept.
pub(crate) fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => i = literal_end(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => i += 1,
        }
    }
    line
}
