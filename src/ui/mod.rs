//! # UI Module
//!
//! Display and input abstraction plus the screens built on top of it.
//!
//! The core never touches a terminal: everything renders through the
//! [`Display`] trait, with a crossterm backend for real play and a scripted
//! buffer backend for tests.

pub mod encounter;
pub mod frame;
pub mod menus;
pub mod terminal;

pub use terminal::TerminalDisplay;

use crate::DuskholdResult;
use std::collections::VecDeque;
use std::time::Duration;

/// A decoded key press. Named keys are distinguished from printable
/// characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Backspace,
    Tab,
    Char(char),
}

/// Semantic text styles; each backend maps them to whatever it can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Plain,
    Title,
    Good,
    Bad,
    Warning,
    Info,
    Accent,
}

/// Abstract display + input capability.
pub trait Display {
    fn clear_and_home(&mut self) -> DuskholdResult<()>;

    fn write_styled_line(&mut self, text: &str, style: StyleTag) -> DuskholdResult<()>;

    /// Reads one key, waiting at most `timeout`. `None` means the timeout
    /// elapsed quietly.
    fn read_key(&mut self, timeout: Duration) -> DuskholdResult<Option<Key>>;
}

/// Blocks until a key arrives.
pub fn read_key_blocking(display: &mut impl Display) -> DuskholdResult<Key> {
    loop {
        if let Some(key) = display.read_key(Duration::from_millis(250))? {
            return Ok(key);
        }
    }
}

/// Scripted in-memory display for tests: records every line written and
/// replays a queue of prepared key presses.
#[derive(Debug, Default)]
pub struct BufferDisplay {
    pub lines: Vec<String>,
    keys: VecDeque<Key>,
}

impl BufferDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues key presses to be replayed in order.
    pub fn script_keys(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.keys.extend(keys);
    }

    /// True if any recorded line contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl Display for BufferDisplay {
    fn clear_and_home(&mut self) -> DuskholdResult<()> {
        Ok(())
    }

    fn write_styled_line(&mut self, text: &str, _style: StyleTag) -> DuskholdResult<()> {
        self.lines.push(text.to_string());
        Ok(())
    }

    fn read_key(&mut self, _timeout: Duration) -> DuskholdResult<Option<Key>> {
        Ok(self.keys.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_display_records_and_replays() {
        let mut display = BufferDisplay::new();
        display.script_keys([Key::Char('1'), Key::Enter]);

        display
            .write_styled_line("hello", StyleTag::Plain)
            .unwrap();
        assert!(display.saw("hello"));
        assert_eq!(
            display.read_key(Duration::from_millis(1)).unwrap(),
            Some(Key::Char('1'))
        );
        assert_eq!(
            read_key_blocking(&mut display).unwrap(),
            Key::Enter
        );
        assert_eq!(display.read_key(Duration::from_millis(1)).unwrap(), None);
    }
}
