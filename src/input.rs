//! Keyboard and mouse mapping for the play screen.

use crate::game::{GameInput, PowerUpKind};
use crate::session::Session;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Game(GameInput),
    CycleTheme,
    Quit,
}

/// Result of handling an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Quit,
}

pub fn map_key(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    let command = match key.code {
        KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => Command::Game(GameInput::Jump),
        KeyCode::Char('s') | KeyCode::Char('S') => {
            Command::Game(GameInput::Activate(PowerUpKind::SpeedBoost))
        }
        KeyCode::Char('h') | KeyCode::Char('H') => {
            Command::Game(GameInput::Activate(PowerUpKind::Shield))
        }
        KeyCode::Char('m') | KeyCode::Char('M') => {
            Command::Game(GameInput::Activate(PowerUpKind::CoinMagnet))
        }
        KeyCode::Char('r') | KeyCode::Char('R') => Command::Game(GameInput::Restart),
        KeyCode::Char('t') | KeyCode::Char('T') => Command::CycleTheme,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// Left click anywhere flaps.
pub fn map_mouse(mouse: MouseEvent) -> Option<Command> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Command::Game(GameInput::Jump)),
        _ => None,
    }
}

pub fn map_event(event: &Event) -> Option<Command> {
    match event {
        Event::Key(key) => map_key(*key),
        Event::Mouse(mouse) => map_mouse(*mouse),
        _ => None,
    }
}

pub fn handle_command(session: &mut Session, command: Command) -> InputResult {
    match command {
        Command::Game(input) => {
            session.handle_input(input);
        }
        Command::CycleTheme => {
            session.cycle_theme();
        }
        Command::Quit => return InputResult::Quit,
    }
    InputResult::Continue
}
