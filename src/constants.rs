// Play field (logical units)
pub const FIELD_WIDTH: f64 = 400.0;
pub const FIELD_HEIGHT: f64 = 600.0;
pub const GROUND_HEIGHT: f64 = 20.0;

// Bird
pub const BIRD_X: f64 = 80.0;
pub const BIRD_SIZE: f64 = 30.0;
pub const GRAVITY: f64 = 0.5;
pub const JUMP_VELOCITY: f64 = -8.0;
/// Radians of tilt per unit of vertical velocity.
pub const ROTATION_FACTOR: f64 = 0.1;
pub const MIN_ROTATION: f64 = -std::f64::consts::FRAC_PI_4;
pub const MAX_ROTATION: f64 = std::f64::consts::FRAC_PI_2;

// Pipes
pub const PIPE_WIDTH: f64 = 60.0;
pub const PIPE_GAP: f64 = 150.0;
pub const PIPE_INTERVAL_TICKS: f64 = 150.0;
/// Gap offsets keep at least this much pipe above and below the gap.
pub const PIPE_MARGIN: f64 = 50.0;
pub const PIPE_SPEED: f64 = 2.0;
pub const BOOSTED_PIPE_SPEED: f64 = 3.0;
pub const SPEED_BOOST_INTERVAL_FACTOR: f64 = 0.7;

// Coins
pub const COIN_SIZE: f64 = 15.0;
pub const COIN_INTERVAL_TICKS: u32 = 300;
/// Coins spawn this far behind the trailing edge of their pipe.
pub const COIN_PIPE_OFFSET: f64 = 30.0;
/// Clearance between a coin and the gap edges.
pub const COIN_GAP_MARGIN: f64 = 10.0;
/// Pipes with `x` inside this window (relative to the right edge) can host a coin.
pub const COIN_WINDOW_BEHIND: f64 = 200.0;
pub const COIN_WINDOW_AHEAD: f64 = 100.0;
pub const MAGNET_RADIUS: f64 = 80.0;
pub const MAGNET_PULL: f64 = 0.1;

// Power-ups
pub const POWER_UP_DURATION_TICKS: u32 = 300; // 5 seconds at 60 ticks/s

// Lifecycle
pub const TICKS_PER_SECOND: u32 = 60;
pub const COUNTDOWN_SECONDS: u32 = 3;
pub const TOAST_TICKS: u32 = 120;

// Timing
pub const TICK_INTERVAL_MS: u64 = 16;
pub const INPUT_POLL_MS: u64 = 4;

// Profiles
pub const GUEST_STARTING_COINS: u64 = 50;
pub const DEFAULT_THEME: &str = "classic";
pub const LEADERBOARD_DEFAULT_LIMIT: usize = 10;
