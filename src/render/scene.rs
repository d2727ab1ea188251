//! Scene builder: game state in, ordered draw commands out.

use super::{Align, DrawCommand};
use crate::constants::*;
use crate::game::{FlappyGame, GamePhase, PowerUpKind};
use crate::store::PurchasedItems;
use crate::themes::{hsl_to_rgb, Rgb, Theme, BLACK, DIAMOND, GOLD, ORANGE, WHITE};

const CLOUD_COUNT: usize = 3;
/// Field units per tick (0.01 per millisecond at 60 ticks/s).
const CLOUD_DRIFT_PER_TICK: f64 = 0.01 * 1000.0 / TICKS_PER_SECOND as f64;
/// Degrees per tick (0.005 per millisecond).
const RAINBOW_HUE_PER_TICK: f64 = 0.005 * 1000.0 / TICKS_PER_SECOND as f64;

const INDICATOR_X: f64 = 10.0;
const INDICATOR_HEIGHT: f64 = 25.0;
const INDICATOR_SPACING: f64 = 5.0;

const TOAST_BACKGROUND: Rgb = Rgb::hex(0x27AE60);

/// Short message shown over the field after a power-up changes state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub remaining_ticks: u32,
}

impl Toast {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            remaining_ticks: TOAST_TICKS,
        }
    }

    pub fn activated(kind: PowerUpKind) -> Self {
        Self::new(format!("{} Activated!", kind.name()))
    }

    pub fn shield_deactivated() -> Self {
        Self::new("Shield Deactivated!")
    }

    /// Returns false once the toast should disappear.
    pub fn tick(&mut self) -> bool {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        self.remaining_ticks > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirdColors {
    pub body: Rgb,
    pub wing: Rgb,
    pub glow: Option<Rgb>,
}

/// Skin colors for the bird. Diamond wins over rainbow; golden wings stack
/// with either.
pub fn bird_colors(theme: &Theme, purchased: &PurchasedItems, frame: u64) -> BirdColors {
    let mut colors = BirdColors {
        body: theme.bird,
        wing: ORANGE,
        glow: None,
    };

    if purchased.contains("diamond-bird") {
        colors.body = DIAMOND;
        colors.glow = Some(DIAMOND);
    } else if purchased.contains("rainbow-bird") {
        let hue = (frame as f64 * RAINBOW_HUE_PER_TICK) % 360.0;
        colors.body = hsl_to_rgb(hue, 0.7, 0.6);
    }

    if purchased.contains("golden-wings") {
        colors.wing = GOLD;
        colors.glow = Some(GOLD);
    }

    colors
}

/// Left edge and baseline of each drifting cloud.
pub fn cloud_positions(frame: u64) -> [(f64, f64); CLOUD_COUNT] {
    let drift = frame as f64 * CLOUD_DRIFT_PER_TICK;
    let mut positions = [(0.0, 0.0); CLOUD_COUNT];
    for (i, pos) in positions.iter_mut().enumerate() {
        let x = (drift + i as f64 * 200.0) % (FIELD_WIDTH + 100.0) - 50.0;
        let y = 50.0 + i as f64 * 30.0;
        *pos = (x, y);
    }
    positions
}

pub fn build_scene(
    game: &FlappyGame,
    theme: &Theme,
    purchased: &PurchasedItems,
    toast: Option<&Toast>,
) -> Vec<DrawCommand> {
    let mut out = Vec::new();

    push_background(&mut out, game, theme);

    if let GamePhase::Countdown { .. } = game.phase {
        // Only sky and ground behind the countdown.
        push_ground(&mut out, theme);
        push_countdown(&mut out, game);
        push_toast(&mut out, toast);
        return out;
    }

    push_pipes(&mut out, game, theme);
    push_coins(&mut out, game);
    push_ground(&mut out, theme);
    push_bird(&mut out, game, theme, purchased);

    match game.phase {
        GamePhase::Idle => push_instructions(&mut out, purchased),
        GamePhase::Running => push_indicators(&mut out, game, theme),
        _ => {}
    }

    push_toast(&mut out, toast);
    out
}

fn push_background(out: &mut Vec<DrawCommand>, game: &FlappyGame, theme: &Theme) {
    out.push(DrawCommand::rect(
        0.0,
        0.0,
        FIELD_WIDTH,
        FIELD_HEIGHT,
        theme.background,
    ));

    let cloud = theme.cloud();
    for (x, y) in cloud_positions(game.frame) {
        out.push(DrawCommand::circle(x, y, 20.0, cloud));
        out.push(DrawCommand::circle(x + 25.0, y, 25.0, cloud));
        out.push(DrawCommand::circle(x + 50.0, y, 20.0, cloud));
        out.push(DrawCommand::circle(x + 25.0, y - 15.0, 20.0, cloud));
    }
}

fn push_pipes(out: &mut Vec<DrawCommand>, game: &FlappyGame, theme: &Theme) {
    for pipe in &game.pipes {
        let top = pipe.top_rect();
        let bottom = pipe.bottom_rect();
        out.push(DrawCommand::FillRect {
            rect: top,
            color: theme.pipe,
        });
        out.push(DrawCommand::FillRect {
            rect: bottom,
            color: theme.pipe,
        });

        // Caps overhang the pipe by 5 on each side.
        out.push(DrawCommand::rect(
            pipe.x - 5.0,
            pipe.gap_y - 20.0,
            PIPE_WIDTH + 10.0,
            20.0,
            theme.pipe_cap,
        ));
        out.push(DrawCommand::rect(
            pipe.x - 5.0,
            pipe.gap_bottom(),
            PIPE_WIDTH + 10.0,
            20.0,
            theme.pipe_cap,
        ));
    }
}

fn push_coins(out: &mut Vec<DrawCommand>, game: &FlappyGame) {
    let radius = COIN_SIZE / 2.0;
    for coin in &game.coins {
        // Magnet pickups stay visible while they fly to the bird.
        if coin.collected && !coin.attracting {
            continue;
        }
        let (cx, cy) = coin.center();
        out.push(DrawCommand::circle(cx, cy, radius, ORANGE));
        out.push(DrawCommand::circle(cx, cy, radius - 1.0, GOLD));
        out.push(DrawCommand::circle(
            coin.x + COIN_SIZE / 3.0,
            coin.y + COIN_SIZE / 3.0,
            COIN_SIZE / 6.0,
            WHITE,
        ));
    }
}

fn push_ground(out: &mut Vec<DrawCommand>, theme: &Theme) {
    out.push(DrawCommand::rect(
        0.0,
        FlappyGame::floor(),
        FIELD_WIDTH,
        GROUND_HEIGHT,
        theme.ground,
    ));
}

fn push_bird(
    out: &mut Vec<DrawCommand>,
    game: &FlappyGame,
    theme: &Theme,
    purchased: &PurchasedItems,
) {
    let bird = &game.bird;
    let colors = bird_colors(theme, purchased, game.frame);
    let (cx, cy) = bird.bounds().center();

    if let Some(glow) = colors.glow {
        out.push(DrawCommand::circle(
            cx,
            cy,
            bird.width * 0.75,
            theme.background.blend(glow, 0.35),
        ));
    }

    out.push(DrawCommand::FillRect {
        rect: bird.bounds(),
        color: colors.body,
    });
    out.push(DrawCommand::rect(
        cx + bird.width / 4.0,
        cy - bird.height / 4.0,
        4.0,
        4.0,
        BLACK,
    ));
    out.push(DrawCommand::rect(
        cx - bird.width / 3.0,
        cy - bird.height / 3.0,
        8.0,
        6.0,
        colors.wing,
    ));
}

fn push_instructions(out: &mut Vec<DrawCommand>, purchased: &PurchasedItems) {
    out.push(DrawCommand::Shade {
        color: BLACK,
        alpha: 0.7,
    });
    let cx = FIELD_WIDTH / 2.0;
    let cy = FIELD_HEIGHT / 2.0;
    out.push(DrawCommand::text(
        cx,
        cy,
        "Click or press SPACE to start!",
        WHITE,
        Align::Center,
    ));
    if !purchased.is_empty() {
        out.push(DrawCommand::text(
            cx,
            cy + 30.0,
            "Power-ups: S = Speed, H = Shield, M = Magnet",
            WHITE,
            Align::Center,
        ));
    }
}

fn push_countdown(out: &mut Vec<DrawCommand>, game: &FlappyGame) {
    let Some(number) = game.phase.countdown_number() else {
        return;
    };
    out.push(DrawCommand::Shade {
        color: BLACK,
        alpha: 0.3,
    });
    let cx = FIELD_WIDTH / 2.0;
    let cy = FIELD_HEIGHT / 2.0;
    out.push(DrawCommand::text(cx, cy, number.to_string(), WHITE, Align::Center).bold());
    out.push(
        DrawCommand::text(
            cx,
            cy + 60.0,
            "Get Ready!",
            BLACK.blend(WHITE, 0.8),
            Align::Center,
        )
        .bold(),
    );
}

fn indicator_style(kind: PowerUpKind) -> (Rgb, f64) {
    match kind {
        PowerUpKind::SpeedBoost => (Rgb::new(255, 107, 53), 120.0),
        PowerUpKind::Shield => (Rgb::new(52, 152, 219), 100.0),
        PowerUpKind::CoinMagnet => (Rgb::new(255, 215, 0), 110.0),
    }
}

fn push_indicators(out: &mut Vec<DrawCommand>, game: &FlappyGame, theme: &Theme) {
    let mut y = 10.0;
    for kind in game.power_ups.active_kinds() {
        let (color, width) = indicator_style(kind);
        out.push(DrawCommand::rect(
            INDICATOR_X,
            y,
            width,
            INDICATOR_HEIGHT,
            theme.background.blend(color, 0.8),
        ));
        out.push(DrawCommand::text(
            INDICATOR_X + 5.0,
            y + INDICATOR_HEIGHT / 2.0,
            kind.name(),
            WHITE,
            Align::Left,
        ));
        y += INDICATOR_HEIGHT + INDICATOR_SPACING;
    }
}

fn push_toast(out: &mut Vec<DrawCommand>, toast: Option<&Toast>) {
    let Some(toast) = toast else {
        return;
    };
    let width = 240.0;
    let height = 40.0;
    let x = (FIELD_WIDTH - width) / 2.0;
    let y = FIELD_HEIGHT / 2.0 - 100.0;
    out.push(DrawCommand::rect(x, y, width, height, TOAST_BACKGROUND));
    out.push(
        DrawCommand::text(
            FIELD_WIDTH / 2.0,
            y + height / 2.0,
            toast.text.clone(),
            WHITE,
            Align::Center,
        )
        .bold(),
    );
}
