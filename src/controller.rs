use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};
use tracing::trace;

use crate::domain::{DataAppError, Message, Tab, ViewerConfig};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &ViewerConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Wait up to the poll time for a key press and map it to a message.
    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DataAppError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(key, model.raw_keyevents()));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent, raw: bool) -> Option<Message> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Message::Quit);
        }
        if raw {
            return Some(Message::RawKey(key));
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Tab => Some(Message::NextTab),
            KeyCode::BackTab => Some(Message::PreviousTab),
            KeyCode::Char('1') => Some(Message::SelectTab(Tab::Home)),
            KeyCode::Char('2') => Some(Message::SelectTab(Tab::Plotting)),
            KeyCode::Char('3') => Some(Message::SelectTab(Tab::DataFrame)),
            KeyCode::Left => Some(Message::SelectColumnLeft),
            KeyCode::Right => Some(Message::SelectColumnRight),
            KeyCode::Char('s') | KeyCode::Enter => Some(Message::Sort),
            KeyCode::Char('/') => Some(Message::Search),
            KeyCode::Char('d') => Some(Message::CycleDepartment),
            KeyCode::Char('z') => Some(Message::CyclePageSize),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::FirstPage),
            KeyCode::Char('b') | KeyCode::PageUp => Some(Message::PreviousPage),
            KeyCode::Char('n') | KeyCode::PageDown => Some(Message::NextPage),
            KeyCode::Char('G') | KeyCode::End => Some(Message::LastPage),
            KeyCode::Char('c') => Some(Message::CycleCompany),
            KeyCode::Char('t') => Some(Message::CycleDays),
            KeyCode::Char('r') => Some(Message::CycleRegion),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
