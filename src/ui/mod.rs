//! Terminal front end. Nothing here mutates game state.

pub mod game_common;
pub mod game_scene;

use crate::session::Session;
use ratatui::{
    layout::Alignment,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

/// Smallest terminal the play screen lays out in.
pub const MIN_WIDTH: u16 = 50;
pub const MIN_HEIGHT: u16 = 16;

/// Draw one frame of the play screen.
pub fn draw_ui(frame: &mut Frame, session: &Session) {
    let size = frame.size();
    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        let message = Paragraph::new(format!(
            "Terminal too small ({}x{}), need {}x{}",
            size.width, size.height, MIN_WIDTH, MIN_HEIGHT
        ))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
        frame.render_widget(message, size);
        return;
    }
    game_scene::render_game(frame, size, session);
}
