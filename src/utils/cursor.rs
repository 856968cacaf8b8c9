// Cursor walks one source line during block parsing. It tracks the byte offset
// and the visual column, so tabs can be consumed partially when a container
// prefix ends in the middle of a tab stop.
pub(crate) struct Cursor<'cursor> {
    s: &'cursor str,
    offset: usize,
    column: usize,
    partial_tab: bool,
    next_nonspace: usize,
    next_nonspace_column: usize,
    indent: usize,
    blank: bool,
}

// A saved cursor position.
#[derive(Clone, Copy)]
pub(crate) struct Mark {
    offset: usize,
    column: usize,
    partial_tab: bool,
}

pub(crate) const TAB_STOP: usize = 4;

impl<'cursor> Cursor<'cursor> {
    // Create a cursor instance
    pub(crate) fn new(s: &'cursor str) -> Self {
        let mut c = Cursor {
            s,
            offset: 0,
            column: 0,
            partial_tab: false,
            next_nonspace: 0,
            next_nonspace_column: 0,
            indent: 0,
            blank: false,
        };
        c.find_next_nonspace();
        c
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn column(&self) -> usize {
        self.column
    }

    pub(crate) fn indent(&self) -> usize {
        self.indent
    }

    pub(crate) fn is_indented(&self) -> bool {
        self.indent >= TAB_STOP
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.blank
    }

    pub(crate) fn partial_tab(&self) -> bool {
        self.partial_tab
    }

    // The byte at the cursor.
    pub(crate) fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.offset).copied()
    }

    // The first non-space byte at or after the cursor.
    pub(crate) fn peek_nonspace(&self) -> Option<u8> {
        self.s.as_bytes().get(self.next_nonspace).copied()
    }

    // The rest of the line after the cursor.
    pub(crate) fn rest(&self) -> &'cursor str {
        &self.s[self.offset..]
    }

    // The rest of the line from the first non-space character.
    pub(crate) fn rest_nonspace(&self) -> &'cursor str {
        &self.s[self.next_nonspace..]
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            column: self.column,
            partial_tab: self.partial_tab,
        }
    }

    pub(crate) fn reset(&mut self, m: Mark) {
        self.offset = m.offset;
        self.column = m.column;
        self.partial_tab = m.partial_tab;
    }

    // Locate the next non-space character and measure the indentation before it.
    pub(crate) fn find_next_nonspace(&mut self) {
        let bytes = self.s.as_bytes();
        let mut i = self.offset;
        let mut cols = self.column;
        while let Some(&b) = bytes.get(i) {
            match b {
                b' ' => cols += 1,
                b'\t' => cols += TAB_STOP - cols % TAB_STOP,
                _ => break,
            }
            i += 1;
        }
        self.blank = i >= bytes.len();
        self.next_nonspace = i;
        self.next_nonspace_column = cols;
        self.indent = cols - self.column;
    }

    pub(crate) fn advance_next_nonspace(&mut self) {
        self.offset = self.next_nonspace;
        self.column = self.next_nonspace_column;
        self.partial_tab = false;
    }

    // Advance by `count` characters, or by `count` columns when `columns` is set.
    // A tab that is only partly consumed leaves `partial_tab` set.
    pub(crate) fn advance(&mut self, mut count: usize, columns: bool) {
        let bytes = self.s.as_bytes();
        while count > 0 && self.offset < bytes.len() {
            if bytes[self.offset] == b'\t' {
                let to_tab = TAB_STOP - self.column % TAB_STOP;
                if columns {
                    self.partial_tab = to_tab > count;
                    let step = to_tab.min(count);
                    self.column += step;
                    if !self.partial_tab {
                        self.offset += 1;
                    }
                    count -= step;
                } else {
                    self.partial_tab = false;
                    self.column += to_tab;
                    self.offset += 1;
                    count -= 1;
                }
            } else {
                let width = self.s[self.offset..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.partial_tab = false;
                self.offset += width;
                self.column += 1;
                count -= 1;
            }
        }
    }

    // Consume the whole remaining line.
    pub(crate) fn advance_to_end(&mut self) {
        let n = self.rest().chars().count();
        self.advance(n, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent() {
        let c = Cursor::new("   foo");
        assert_eq!(c.indent(), 3);
        assert!(!c.is_indented());
        assert_eq!(c.rest_nonspace(), "foo");

        let c = Cursor::new("\tfoo");
        assert_eq!(c.indent(), 4);
        assert!(c.is_indented());

        let c = Cursor::new("  \t foo");
        assert_eq!(c.indent(), 5);

        let c = Cursor::new("   ");
        assert!(c.is_blank());
    }

    #[test]
    fn test_partial_tab() {
        // "-\tfoo": after the marker the tab spans columns 1..4
        let mut c = Cursor::new(">\tfoo");
        c.advance(1, false);
        assert_eq!(c.column(), 1);
        c.advance(1, true);
        assert!(c.partial_tab());
        assert_eq!(c.column(), 2);
        assert_eq!(c.offset(), 1);
        c.advance(2, true);
        assert!(!c.partial_tab());
        assert_eq!(c.offset(), 2);
        assert_eq!(c.rest(), "foo");
    }

    #[test]
    fn test_mark_reset() {
        let mut c = Cursor::new("1.   x");
        c.advance(2, false);
        let m = c.mark();
        c.advance(3, true);
        assert_eq!(c.rest(), "x");
        c.reset(m);
        assert_eq!(c.rest(), "   x");
        assert_eq!(c.column(), 2);
    }

    #[test]
    fn test_advance_multibyte() {
        let mut c = Cursor::new("äb");
        c.advance(1, false);
        assert_eq!(c.rest(), "b");
        c.advance_to_end();
        assert_eq!(c.rest(), "");
        assert_eq!(c.peek(), None);
    }
}
