//! Flappy data structures: bird, pipes, coins and the lifecycle phase.

use super::power_ups::PowerUps;
use crate::constants::*;

/// Axis-aligned rectangle in field coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict overlap test; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// The player's bird. Only the vertical axis moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Vertical velocity in units/tick (positive = downward).
    pub velocity: f64,
    pub gravity: f64,
    pub jump_velocity: f64,
    /// Visual tilt in radians, derived from velocity.
    pub rotation: f64,
}

impl Bird {
    pub fn new() -> Self {
        Self {
            x: BIRD_X,
            y: FIELD_HEIGHT / 2.0,
            width: BIRD_SIZE,
            height: BIRD_SIZE,
            velocity: 0.0,
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            rotation: 0.0,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Tilt for a given velocity: nose up while rising, diving while falling.
    pub fn rotation_for(velocity: f64) -> f64 {
        (velocity * ROTATION_FACTOR).clamp(MIN_ROTATION, MAX_ROTATION)
    }
}

impl Default for Bird {
    fn default() -> Self {
        Self::new()
    }
}

/// A top/bottom pipe pair with a single gap.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    /// Left edge.
    pub x: f64,
    /// Top of the gap; the bottom pipe starts at `gap_y + PIPE_GAP`.
    pub gap_y: f64,
    /// Set once the bird has cleared this pipe.
    pub passed: bool,
}

impl Pipe {
    pub fn new(x: f64, gap_y: f64) -> Self {
        Self {
            x,
            gap_y,
            passed: false,
        }
    }

    pub fn gap_bottom(&self) -> f64 {
        self.gap_y + PIPE_GAP
    }

    pub fn trailing_edge(&self) -> f64 {
        self.x + PIPE_WIDTH
    }

    pub fn top_rect(&self) -> Rect {
        Rect::new(self.x, 0.0, PIPE_WIDTH, self.gap_y)
    }

    pub fn bottom_rect(&self) -> Rect {
        let top = self.gap_bottom();
        Rect::new(self.x, top, PIPE_WIDTH, FIELD_HEIGHT - top)
    }
}

/// A collectible coin.
#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub x: f64,
    pub y: f64,
    pub collected: bool,
    /// Picked up by the magnet and still flying toward the bird.
    pub attracting: bool,
    /// Ticks spent flying toward the bird.
    pub attract_ticks: u32,
}

impl Coin {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            collected: false,
            attracting: false,
            attract_ticks: 0,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, COIN_SIZE, COIN_SIZE)
    }

    pub fn center(&self) -> (f64, f64) {
        self.bounds().center()
    }

    pub fn distance_to(&self, px: f64, py: f64) -> f64 {
        let (cx, cy) = self.center();
        ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
    }

    /// Move a fraction of the remaining distance toward a point.
    pub fn pull_toward(&mut self, px: f64, py: f64, fraction: f64) {
        let (cx, cy) = self.center();
        self.x += (px - cx) * fraction;
        self.y += (py - cy) * fraction;
    }
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the first jump.
    Idle,
    /// 3-2-1 before the run; the world is frozen.
    Countdown { remaining_ticks: u32 },
    Running,
    Over,
}

impl GamePhase {
    pub fn countdown() -> Self {
        GamePhase::Countdown {
            remaining_ticks: COUNTDOWN_SECONDS * TICKS_PER_SECOND,
        }
    }

    /// Number shown on the countdown overlay (3, 2, 1).
    pub fn countdown_number(&self) -> Option<u32> {
        match self {
            GamePhase::Countdown { remaining_ticks } => {
                Some(remaining_ticks.div_ceil(TICKS_PER_SECOND).max(1))
            }
            _ => None,
        }
    }
}

/// What ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Ground,
    Pipe,
}

/// Main game state: everything one run needs, owned in one place.
#[derive(Debug, Clone)]
pub struct FlappyGame {
    pub phase: GamePhase,
    pub bird: Bird,
    pub pipes: Vec<Pipe>,
    pub coins: Vec<Coin>,
    pub power_ups: PowerUps,

    // Scoring
    pub score: u32,
    /// Coins picked up during this run.
    pub coins_collected: u32,
    pub power_ups_used: u32,
    pub death_cause: Option<DeathCause>,

    // Spawn timers (ticks since the last spawn)
    pub pipe_timer: u32,
    pub coin_timer: u32,

    /// Ticks spent in the running phase.
    pub tick_count: u64,
    /// Every tick, in any phase; drives idle animations.
    pub frame: u64,
}

impl FlappyGame {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Idle,
            bird: Bird::new(),
            pipes: Vec::new(),
            coins: Vec::new(),
            power_ups: PowerUps::default(),
            score: 0,
            coins_collected: 0,
            power_ups_used: 0,
            death_cause: None,
            pipe_timer: 0,
            coin_timer: 0,
            tick_count: 0,
            frame: 0,
        }
    }

    /// Back to idle with a fresh field. Animation frame keeps counting.
    pub fn reset(&mut self) {
        let frame = self.frame;
        *self = Self::new();
        self.frame = frame;
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::Over
    }

    /// Seconds of running time, assuming the nominal tick rate.
    pub fn duration_seconds(&self) -> u64 {
        self.tick_count / TICKS_PER_SECOND as u64
    }

    /// y coordinate of the top of the ground strip.
    pub fn floor() -> f64 {
        FIELD_HEIGHT - GROUND_HEIGHT
    }
}

impl Default for FlappyGame {
    fn default() -> Self {
        Self::new()
    }
}
