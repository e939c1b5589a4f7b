use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;

use crate::game::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Steer(Direction),
    Quit,
}

/// Maps a key press to a command; releases and unbound keys map to nothing.
pub fn command_for(key: KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Command::Steer(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(Command::Steer(Direction::Down))
        }
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(Command::Steer(Direction::Left))
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(Command::Steer(Direction::Right))
        }
        _ => None,
    }
}

/// Holds the latest direction asked for since the last tick.
#[derive(Debug, Default)]
pub struct PendingInput {
    direction: Option<Direction>,
}

impl PendingInput {
    pub fn push(&mut self, direction: Direction) {
        if let Some(dropped) = self.direction.replace(direction) {
            debug!("Input {:?} superseded by {:?}", dropped, direction);
        }
    }

    pub fn take(&mut self) -> Option<Direction> {
        self.direction.take()
    }
}
