//! Crossterm-backed terminal display.

use super::{Display, Key, StyleTag};
use crate::DuskholdResult;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::io::{Stdout, Write};
use std::time::Duration;

/// Terminal display: raw mode + alternate screen for the lifetime of the
/// value.
pub struct TerminalDisplay {
    out: Stdout,
}

impl TerminalDisplay {
    pub fn new() -> DuskholdResult<Self> {
        let mut out = std::io::stdout();
        enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self { out })
    }

    fn color_for(style: StyleTag) -> Option<Color> {
        match style {
            StyleTag::Plain => None,
            StyleTag::Title => Some(Color::Cyan),
            StyleTag::Good => Some(Color::Green),
            StyleTag::Bad => Some(Color::Red),
            StyleTag::Warning => Some(Color::Yellow),
            StyleTag::Info => Some(Color::Blue),
            StyleTag::Accent => Some(Color::Magenta),
        }
    }
}

impl Display for TerminalDisplay {
    fn clear_and_home(&mut self) -> DuskholdResult<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()?;
        Ok(())
    }

    fn write_styled_line(&mut self, text: &str, style: StyleTag) -> DuskholdResult<()> {
        match Self::color_for(style) {
            Some(color) => queue!(
                self.out,
                SetForegroundColor(color),
                Print(text),
                ResetColor,
                Print("\r\n")
            )?,
            None => queue!(self.out, Print(text), Print("\r\n"))?,
        }
        self.out.flush()?;
        Ok(())
    }

    fn read_key(&mut self, timeout: Duration) -> DuskholdResult<Option<Key>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => Ok(map_key(key.code)),
            _ => Ok(None),
        }
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = execute!(self.out, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}
