//! Editable input line and command history.
//!
//! Positions are measured in characters, not bytes, so multi-byte input
//! (accents, CJK, emoji typed on a phone) edits cleanly.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    buffer: String,
    cursor: usize,                 // char index, 0..=len
    history: Vec<String>,          // oldest first
    history_cursor: Option<usize>, // None = not browsing
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn history_cursor(&self) -> Option<usize> {
        self.history_cursor
    }

    pub fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Text on either side of the cursor.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.buffer.split_at(self.byte_offset(self.cursor))
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
        self.history_cursor = None;
    }

    /// Delete the character before the cursor. Returns false at the start.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.buffer.remove(at);
        self.cursor -= 1;
        true
    }

    /// Delete the character under the cursor. Returns false at the end.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.buffer.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.len();
    }

    /// Replace the whole buffer and park the cursor at the end.
    pub fn replace(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.len();
        self.history_cursor = None;
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_cursor = None;
    }

    /// Record a submitted command unless it is empty or repeats the last one.
    pub fn push_history(&mut self, command: &str) {
        if command.is_empty() {
            return;
        }
        if self.history.last().map(String::as_str) == Some(command) {
            return;
        }
        self.history.push(command.to_string());
    }

    /// Step back to an older entry. Stops at the oldest.
    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_cursor {
            None => self.history.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.load_history(idx);
    }

    /// Step forward to a newer entry. Moving past the newest clears the line.
    pub fn history_down(&mut self) {
        let Some(i) = self.history_cursor else {
            return;
        };
        if i + 1 < self.history.len() {
            self.load_history(i + 1);
        } else {
            self.reset();
        }
    }

    fn load_history(&mut self, idx: usize) {
        self.history_cursor = Some(idx);
        self.buffer = self.history[idx].clone();
        self.cursor = self.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputLine {
        let mut line = InputLine::new();
        for c in text.chars() {
            line.insert(c);
        }
        line
    }

    #[test]
    fn test_insert_and_full_backspace() {
        let mut line = typed("hello wörld");
        assert_eq!(line.cursor(), 11);
        while line.backspace() {}
        assert_eq!(line.buffer(), "");
        assert_eq!(line.cursor(), 0);
        assert!(!line.backspace());
    }

    #[test]
    fn test_insert_mid_buffer() {
        let mut line = typed("hlp");
        line.home();
        line.move_right();
        line.insert('e');
        assert_eq!(line.buffer(), "help");
        assert_eq!(line.cursor(), 2);
        assert_eq!(line.split_at_cursor(), ("he", "lp"));
    }

    #[test]
    fn test_delete_at_cursor_and_boundary() {
        let mut line = typed("abc");
        assert!(!line.delete());
        line.home();
        assert!(line.delete());
        assert_eq!(line.buffer(), "bc");
        assert_eq!(line.cursor(), 0);
    }

    #[test]
    fn test_cursor_clamped() {
        let mut line = typed("ab");
        line.move_right();
        assert_eq!(line.cursor(), 2);
        line.move_left();
        line.move_left();
        line.move_left();
        assert_eq!(line.cursor(), 0);
        line.end();
        assert_eq!(line.cursor(), 2);
    }

    #[test]
    fn test_history_skips_adjacent_duplicates() {
        let mut line = InputLine::new();
        line.push_history("help");
        line.push_history("help");
        line.push_history("");
        line.push_history("about");
        line.push_history("help");
        assert_eq!(line.history(), ["help", "about", "help"]);
    }

    #[test]
    fn test_history_up_stops_at_oldest() {
        let mut line = InputLine::new();
        line.push_history("one");
        line.push_history("two");
        for _ in 0..5 {
            line.history_up();
        }
        assert_eq!(line.history_cursor(), Some(0));
        assert_eq!(line.buffer(), "one");
        assert_eq!(line.cursor(), 3);
    }

    #[test]
    fn test_history_down_past_newest_clears() {
        let mut line = InputLine::new();
        line.push_history("one");
        line.push_history("two");
        line.history_up();
        line.history_up();
        line.history_down();
        assert_eq!(line.buffer(), "two");
        line.history_down();
        assert_eq!(line.buffer(), "");
        assert_eq!(line.history_cursor(), None);
        // Not browsing: down does nothing
        line.insert('x');
        line.history_down();
        assert_eq!(line.buffer(), "x");
    }

    #[test]
    fn test_history_up_on_empty_history_is_noop() {
        let mut line = typed("draft");
        line.history_up();
        assert_eq!(line.buffer(), "draft");
        assert_eq!(line.history_cursor(), None);
    }

    #[test]
    fn test_typing_exits_history_browse() {
        let mut line = InputLine::new();
        line.push_history("date");
        line.history_up();
        line.insert('!');
        assert_eq!(line.history_cursor(), None);
        assert_eq!(line.buffer(), "date!");
    }
}
