//! Play screen: the field, the status bar and the info panel.

use crate::constants::TICKS_PER_SECOND;
use crate::game::{DeathCause, GamePhase, PowerUpKind};
use crate::render::{build_scene, rasterize, PixelCanvas};
use crate::session::Session;
use crate::themes::Rgb;
use crate::ui::game_common::{
    create_game_layout, format_number_short, render_game_over_banner, render_info_panel_frame,
    render_status_bar, GameResultType,
};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

const INFO_PANEL_WIDTH: u16 = 26;

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Copies a rasterized field into terminal cells, centered in its area.
pub struct FieldWidget<'a> {
    canvas: &'a PixelCanvas,
}

impl<'a> FieldWidget<'a> {
    pub fn new(canvas: &'a PixelCanvas) -> Self {
        Self { canvas }
    }
}

impl Widget for FieldWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = self.canvas.cols().min(area.width);
        let rows = self.canvas.rows().min(area.height);
        let x0 = area.x + (area.width - cols) / 2;
        let y0 = area.y + (area.height - rows) / 2;

        for row in 0..rows {
            for col in 0..cols {
                let (top, bottom) = self.canvas.cell(col, row);
                buf.get_mut(x0 + col, y0 + row)
                    .set_symbol("▀")
                    .set_fg(to_color(top))
                    .set_bg(to_color(bottom));
            }
        }

        for label in &self.canvas.labels {
            if label.row >= rows || label.col >= cols {
                continue;
            }
            let mut style = Style::default().fg(to_color(label.color));
            if label.bold {
                style = style.add_modifier(Modifier::BOLD);
            }
            buf.set_stringn(
                x0 + label.col,
                y0 + label.row,
                &label.text,
                (cols - label.col) as usize,
                style,
            );
        }
    }
}

pub fn render_game(frame: &mut Frame, area: Rect, session: &Session) {
    let layout = create_game_layout(frame, area, " Flappy ", Color::Cyan, 10, INFO_PANEL_WIDTH);

    render_field(frame, layout.content, session);
    render_status_bar_content(frame, layout.status_bar, session);
    render_info_panel(frame, layout.info_panel, session);

    if session.game.is_over() {
        render_game_over(frame, layout.content, session);
    }
}

fn render_field(frame: &mut Frame, area: Rect, session: &Session) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let commands = build_scene(
        &session.game,
        session.theme(),
        &session.profile.purchased_items,
        session.toast.as_ref(),
    );
    let canvas = rasterize(&commands, area.width, area.height);
    frame.render_widget(FieldWidget::new(&canvas), area);
}

fn render_status_bar_content(frame: &mut Frame, area: Rect, session: &Session) {
    let game = &session.game;
    match game.phase {
        GamePhase::Idle => render_status_bar(
            frame,
            area,
            "Press Space to start!",
            Color::Yellow,
            &[("[Space/Click]", "Start"), ("[T]", "Theme"), ("[Q]", "Quit")],
        ),
        GamePhase::Countdown { .. } => render_status_bar(
            frame,
            area,
            "Get Ready!",
            Color::Yellow,
            &[("[S/H/M]", "Power-ups"), ("[Q]", "Quit")],
        ),
        GamePhase::Running => render_status_bar(
            frame,
            area,
            &format!("Score: {}", game.score),
            Color::Green,
            &[
                ("[Space/Up/Enter]", "Flap"),
                ("[S/H/M]", "Power-ups"),
                ("[Q]", "Quit"),
            ],
        ),
        GamePhase::Over => render_status_bar(
            frame,
            area,
            &format!("Final score: {}", game.score),
            Color::Red,
            &[("[R]", "Restart"), ("[T]", "Theme"), ("[Q]", "Quit")],
        ),
    }
}

fn label_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {}: ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ])
}

fn power_up_line(session: &Session, kind: PowerUpKind) -> Line<'static> {
    let owned = session.profile.purchased_items.owns_power_up(kind);
    let power_ups = &session.game.power_ups;
    let (status, color) = if power_ups.is_active(kind) {
        let secs = power_ups.remaining_ticks(kind).div_ceil(TICKS_PER_SECOND);
        (format!("{}s", secs), Color::Green)
    } else if owned {
        ("ready".to_string(), Color::White)
    } else {
        ("locked".to_string(), Color::DarkGray)
    };
    Line::from(vec![
        Span::styled(format!(" [{}] ", kind.key()), Style::default().fg(Color::White)),
        Span::styled(
            format!("{:<12}", kind.name()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(status, Style::default().fg(color)),
    ])
}

fn render_info_panel(frame: &mut Frame, area: Rect, session: &Session) {
    let inner = render_info_panel_frame(frame, area);
    if inner.height < 2 || inner.width < 4 {
        return;
    }

    let game = &session.game;
    let profile = &session.profile;
    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {} ", session.account.display_name()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        label_line("Score", game.score.to_string(), Color::White),
        label_line("Best", profile.best_score.to_string(), Color::Yellow),
        label_line("Coins", format_number_short(profile.coins), Color::Yellow),
        label_line("This run", format!("+{}", game.coins_collected), Color::Green),
        Line::from(""),
        label_line("Theme", session.theme().name.to_string(), Color::Magenta),
        Line::from(""),
        Line::from(Span::styled(
            " Power-ups:",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    lines.extend(PowerUpKind::ALL.into_iter().map(|k| power_up_line(session, k)));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_game_over(frame: &mut Frame, area: Rect, session: &Session) {
    let game = &session.game;
    let (result_type, title) = if session.new_best {
        (GameResultType::NewBest, "NEW BEST!")
    } else {
        (GameResultType::Crashed, "GAME OVER")
    };
    let message = match game.death_cause {
        Some(DeathCause::Ground) => format!("Hit the ground with {} points", game.score),
        Some(DeathCause::Pipe) | None => format!("Hit a pipe with {} points", game.score),
    };
    let detail = if game.coins_collected > 0 {
        format!("+{} coins this run", game.coins_collected)
    } else {
        String::new()
    };
    render_game_over_banner(frame, area, result_type, title, &message, &detail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawCommand;
    use crate::themes::WHITE;

    #[test]
    fn test_field_widget_centers_canvas() {
        let commands = [DrawCommand::rect(0.0, 0.0, 400.0, 600.0, WHITE)];
        let canvas = rasterize(&commands, 20, 30);
        // scale = min(20/400, 60/600) = 0.05 -> 20 x 15 cells.
        assert_eq!(canvas.cols(), 20);
        assert_eq!(canvas.rows(), 15);

        let area = Rect::new(0, 0, 20, 30);
        let mut buf = Buffer::empty(area);
        FieldWidget::new(&canvas).render(area, &mut buf);

        let cell = buf.get(0, 7);
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
        // Rows above the centered canvas stay untouched.
        assert_eq!(buf.get(0, 0).symbol(), " ");
    }
}
