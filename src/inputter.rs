use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line text input, e.g. the search box of the table view.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize,
    finished: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    /// The text differs from before the key was read.
    pub changed: bool,
    pub finished: bool,
    /// Cursor position in characters.
    pub cursor_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        let before = self.current_input.clone();
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.cursor_pos = self.cursor_pos.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor_pos = (self.cursor_pos + 1).min(self.len()),
            (KeyCode::Home, _) => self.cursor_pos = 0,
            (KeyCode::End, _) => self.cursor_pos = self.len(),
            (kc, km) => self.key(kc, km),
        }
        let mut result = self.get();
        result.changed = result.input != before;
        trace!("Input {:?} -> {:?}", key.code, result);
        result
    }

    /// Start editing `s` with the cursor at its end.
    pub fn set(&mut self, s: &str) {
        self.clear();
        self.current_input = s.to_string();
        self.cursor_pos = self.len();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            changed: false,
            finished: self.finished,
            cursor_pos: self.cursor_pos,
        }
    }

    pub fn clear(&mut self) {
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn len(&self) -> usize {
        self.current_input.chars().count()
    }

    /// Drop the text and stop editing.
    fn escape(&mut self) {
        self.clear();
        self.finished = true;
    }

    fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let idx = self.byte_pos();
            self.current_input.remove(idx);
        }
    }

    fn delete(&mut self) {
        if self.cursor_pos < self.len() {
            let idx = self.byte_pos();
            self.current_input.remove(idx);
        }
    }

    fn key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return;
        }
        if let Some(chr) = code.as_char() {
            let idx = self.byte_pos();
            self.current_input.insert(idx, chr);
            self.cursor_pos += 1;
        }
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn type_text(input: &mut Inputter, text: &str) -> InputResult {
        let mut last = InputResult::default();
        for c in text.chars() {
            last = input.read(KeyEvent::from(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn typing_reports_each_change() {
        let mut input = Inputter::default();
        let result = type_text(&mut input, "Ja");
        assert_eq!(result.input, "Ja");
        assert!(result.changed);
        assert!(!result.finished);

        let moved = input.read(KeyEvent::from(KeyCode::Left));
        assert!(!moved.changed);
        assert_eq!(moved.cursor_pos, 1);
    }

    #[test]
    fn edits_at_the_cursor() {
        let mut input = Inputter::default();
        type_text(&mut input, "Jne");
        input.read(KeyEvent::from(KeyCode::Left));
        input.read(KeyEvent::from(KeyCode::Left));
        let result = type_text(&mut input, "a");
        assert_eq!(result.input, "Jane");
        let result = input.read(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(result.input, "Jne");
        let result = input.read(KeyEvent::from(KeyCode::Delete));
        assert_eq!(result.input, "Je");
    }

    #[test]
    fn enter_finishes_and_escape_clears() {
        let mut input = Inputter::default();
        input.set("Jane");
        let done = input.read(KeyEvent::from(KeyCode::Enter));
        assert!(done.finished && !done.changed);
        assert_eq!(done.input, "Jane");
        assert_eq!(done.cursor_pos, 4);

        input.set("Jane");
        let cleared = input.read(KeyEvent::from(KeyCode::Esc));
        assert!(cleared.finished && cleared.changed);
        assert_eq!(cleared.input, "");
        assert_eq!(cleared.cursor_pos, 0);
    }

    #[test]
    fn control_chords_are_ignored() {
        let mut input = Inputter::default();
        let result = input.read(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!result.changed);
        assert_eq!(result.input, "");
    }
}
