//! Per-tick game logic: physics, spawning, scrolling, pickups and collisions.

use super::power_ups::PowerUpKind;
use super::types::{Bird, Coin, DeathCause, FlappyGame, GamePhase, Pipe};
use crate::constants::*;
use crate::store::PurchasedItems;
use rand::Rng;

/// Player input as the simulation sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameInput {
    /// Space, Up, Enter or a click.
    Jump,
    /// Power-up hotkey.
    Activate(PowerUpKind),
    /// Start over with a fresh field.
    Restart,
}

/// Things that happened, for the session and UI to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    CountdownStarted,
    /// The overlay number changed (3, 2, 1).
    CountdownStep(u32),
    Started,
    PowerUpActivated(PowerUpKind),
    PowerUpExpired(PowerUpKind),
    ShieldDeactivated,
    PipePassed { score: u32 },
    CoinCollected,
    GameOver { score: u32, cause: DeathCause },
}

/// Apply one input. Power-ups only activate if purchased.
pub fn process_input(
    game: &mut FlappyGame,
    input: GameInput,
    purchased: &PurchasedItems,
) -> Option<GameEvent> {
    match input {
        GameInput::Jump => match game.phase {
            GamePhase::Idle => {
                game.phase = GamePhase::countdown();
                Some(GameEvent::CountdownStarted)
            }
            GamePhase::Running => {
                game.bird.velocity = game.bird.jump_velocity;
                None
            }
            GamePhase::Countdown { .. } | GamePhase::Over => None,
        },
        GameInput::Activate(kind) => {
            if game.is_over() || !purchased.owns_power_up(kind) {
                return None;
            }
            game.power_ups.activate(kind);
            game.power_ups_used += 1;
            Some(GameEvent::PowerUpActivated(kind))
        }
        GameInput::Restart => {
            game.reset();
            game.phase = GamePhase::countdown();
            Some(GameEvent::CountdownStarted)
        }
    }
}

/// Advance the game by one tick.
///
/// Order while running: bird, pipe spawn, coin spawn, pipe scroll, coin
/// scroll, power-up timers, obstacle collision.
pub fn process_tick<R: Rng>(game: &mut FlappyGame, rng: &mut R) -> Vec<GameEvent> {
    game.frame += 1;
    let mut events = Vec::new();

    match game.phase {
        GamePhase::Idle | GamePhase::Over => return events,
        GamePhase::Countdown { remaining_ticks } => {
            advance_countdown(game, remaining_ticks, &mut events);
            return events;
        }
        GamePhase::Running => {}
    }

    game.tick_count += 1;

    if update_bird(game) {
        events.push(game_over(game, DeathCause::Ground));
        return events;
    }

    generate_pipes(game, rng);
    generate_coins(game, rng);

    let passed = update_pipes(game);
    let base = game.score - passed;
    events.extend((1..=passed).map(|i| GameEvent::PipePassed { score: base + i }));

    let collected = update_coins(game);
    events.extend((0..collected).map(|_| GameEvent::CoinCollected));

    for kind in game.power_ups.tick() {
        events.push(GameEvent::PowerUpExpired(kind));
        if kind == PowerUpKind::Shield {
            events.push(GameEvent::ShieldDeactivated);
        }
    }

    if check_collision(game) {
        events.push(game_over(game, DeathCause::Pipe));
    }

    events
}

fn advance_countdown(game: &mut FlappyGame, remaining_ticks: u32, events: &mut Vec<GameEvent>) {
    let before = game.phase.countdown_number();
    let remaining = remaining_ticks.saturating_sub(1);
    if remaining == 0 {
        game.phase = GamePhase::Running;
        events.push(GameEvent::Started);
        return;
    }
    game.phase = GamePhase::Countdown {
        remaining_ticks: remaining,
    };
    let after = game.phase.countdown_number();
    if after != before {
        if let Some(n) = after {
            events.push(GameEvent::CountdownStep(n));
        }
    }
}

fn game_over(game: &mut FlappyGame, cause: DeathCause) -> GameEvent {
    game.phase = GamePhase::Over;
    game.death_cause = Some(cause);
    GameEvent::GameOver {
        score: game.score,
        cause,
    }
}

/// Gravity, ceiling clamp and ground check. Returns true if the bird hit the ground.
///
/// The ground is deadly even with a shield.
pub fn update_bird(game: &mut FlappyGame) -> bool {
    let bird = &mut game.bird;
    bird.velocity += bird.gravity;
    bird.y += bird.velocity;
    bird.rotation = Bird::rotation_for(bird.velocity);

    if bird.y + bird.height >= FlappyGame::floor() {
        return true;
    }

    if bird.y <= 0.0 {
        bird.y = 0.0;
        bird.velocity = 0.0;
    }
    false
}

/// Ticks between pipes, shortened while the speed boost is active.
pub fn pipe_interval(game: &FlappyGame) -> f64 {
    if game.power_ups.is_active(PowerUpKind::SpeedBoost) {
        PIPE_INTERVAL_TICKS * SPEED_BOOST_INTERVAL_FACTOR
    } else {
        PIPE_INTERVAL_TICKS
    }
}

/// Scroll speed shared by pipes and coins.
pub fn scroll_speed(game: &FlappyGame) -> f64 {
    if game.power_ups.is_active(PowerUpKind::SpeedBoost) {
        BOOSTED_PIPE_SPEED
    } else {
        PIPE_SPEED
    }
}

/// Random gap offset leaving at least `PIPE_MARGIN` of pipe above and below.
pub fn random_gap_y<R: Rng>(rng: &mut R) -> f64 {
    let range = FIELD_HEIGHT - PIPE_GAP - 2.0 * PIPE_MARGIN;
    rng.gen::<f64>() * range + PIPE_MARGIN
}

pub fn generate_pipes<R: Rng>(game: &mut FlappyGame, rng: &mut R) {
    game.pipe_timer += 1;
    if game.pipe_timer as f64 >= pipe_interval(game) {
        game.pipes.push(Pipe::new(FIELD_WIDTH, random_gap_y(rng)));
        game.pipe_timer = 0;
    }
}

/// Pipes near the right edge that can host a new coin.
pub fn coin_candidates(game: &FlappyGame) -> Vec<&Pipe> {
    game.pipes
        .iter()
        .filter(|p| p.x > FIELD_WIDTH - COIN_WINDOW_BEHIND && p.x < FIELD_WIDTH + COIN_WINDOW_AHEAD)
        .collect()
}

/// Coin placed just behind `pipe`, jittered around the gap center but kept
/// fully inside the gap.
pub fn coin_for_pipe<R: Rng>(pipe: &Pipe, rng: &mut R) -> Coin {
    let gap_center = pipe.gap_y + PIPE_GAP / 2.0;
    let jitter = (rng.gen::<f64>() - 0.5) * (PIPE_GAP - COIN_SIZE - 2.0 * COIN_GAP_MARGIN);
    let min_y = pipe.gap_y + COIN_GAP_MARGIN;
    let max_y = pipe.gap_bottom() - COIN_SIZE - COIN_GAP_MARGIN;
    let y = (gap_center + jitter).clamp(min_y, max_y);
    Coin::new(pipe.trailing_edge() + COIN_PIPE_OFFSET, y)
}

pub fn generate_coins<R: Rng>(game: &mut FlappyGame, rng: &mut R) {
    game.coin_timer += 1;
    if game.coin_timer < COIN_INTERVAL_TICKS {
        return;
    }
    game.coin_timer = 0;

    let candidates = coin_candidates(game);
    if candidates.is_empty() {
        return;
    }
    let pipe = candidates[rng.gen_range(0..candidates.len())];
    let coin = coin_for_pipe(pipe, rng);
    game.coins.push(coin);
}

/// Scroll pipes, drop the ones that left the field and score newly passed
/// ones. Returns how many pipes were passed this tick.
pub fn update_pipes(game: &mut FlappyGame) -> u32 {
    let speed = scroll_speed(game);
    let bird_x = game.bird.x;
    let mut passed = 0;

    game.pipes.retain_mut(|pipe| {
        pipe.x -= speed;
        if pipe.trailing_edge() < 0.0 {
            return false;
        }
        if !pipe.passed && pipe.trailing_edge() < bird_x {
            pipe.passed = true;
            passed += 1;
        }
        true
    });

    game.score += passed;
    passed
}

/// Ticks a magnet pickup may fly before it is dropped.
const MAGNET_FLIGHT_TICKS: u32 = 30;

/// Scroll coins and collect the ones the bird reaches. Returns the number
/// collected this tick.
///
/// With the magnet active, a coin within `MAGNET_RADIUS` of the bird's center
/// counts as collected on first entry, then flies toward the bird
/// (`MAGNET_PULL` of the remaining distance per tick) until it arrives.
pub fn update_coins(game: &mut FlappyGame) -> u32 {
    let speed = scroll_speed(game);
    let magnet = game.power_ups.is_active(PowerUpKind::CoinMagnet);
    let bird = game.bird.bounds();
    let (bird_cx, bird_cy) = bird.center();
    let mut collected = 0;

    game.coins.retain_mut(|coin| {
        if coin.attracting {
            coin.pull_toward(bird_cx, bird_cy, MAGNET_PULL);
            coin.attract_ticks += 1;
            return coin.distance_to(bird_cx, bird_cy) >= COIN_SIZE
                && coin.attract_ticks < MAGNET_FLIGHT_TICKS;
        }

        coin.x -= speed;
        if coin.x + COIN_SIZE < 0.0 {
            return false;
        }

        if magnet {
            if coin.distance_to(bird_cx, bird_cy) < MAGNET_RADIUS {
                coin.collected = true;
                coin.attracting = true;
                collected += 1;
                coin.pull_toward(bird_cx, bird_cy, MAGNET_PULL);
            }
            true
        } else if bird.intersects(&coin.bounds()) {
            coin.collected = true;
            collected += 1;
            false
        } else {
            true
        }
    });

    game.coins_collected += collected;
    collected
}

/// Bird against every pipe. Always false while the shield is up.
pub fn check_collision(game: &FlappyGame) -> bool {
    if game.power_ups.is_active(PowerUpKind::Shield) {
        return false;
    }

    let bird = game.bird.bounds();
    game.pipes
        .iter()
        .any(|pipe| bird.intersects(&pipe.top_rect()) || bird.intersects(&pipe.bottom_rect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(12345)
    }

    fn running_game() -> FlappyGame {
        let mut game = FlappyGame::new();
        game.phase = GamePhase::Running;
        game
    }

    fn owning(kinds: &[PowerUpKind]) -> PurchasedItems {
        kinds.iter().map(|k| k.item_id()).collect()
    }

    #[test]
    fn test_single_gravity_tick() {
        let mut game = running_game();
        let start_y = game.bird.y;
        let mut rng = create_test_rng();
        process_tick(&mut game, &mut rng);
        assert!((game.bird.velocity - 0.5).abs() < 1e-12);
        assert!((game.bird.y - (start_y + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_jump_overrides_velocity_while_running() {
        let mut game = running_game();
        game.bird.velocity = 5.0;
        let event = process_input(&mut game, GameInput::Jump, &PurchasedItems::new());
        assert!(event.is_none());
        assert!((game.bird.velocity - JUMP_VELOCITY).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jump_while_idle_starts_countdown_without_impulse() {
        let mut game = FlappyGame::new();
        let event = process_input(&mut game, GameInput::Jump, &PurchasedItems::new());
        assert_eq!(event, Some(GameEvent::CountdownStarted));
        assert!(matches!(game.phase, GamePhase::Countdown { .. }));
        assert!(game.bird.velocity.abs() < f64::EPSILON);

        // Jumping during the countdown does nothing either.
        process_input(&mut game, GameInput::Jump, &PurchasedItems::new());
        assert!(game.bird.velocity.abs() < f64::EPSILON);
    }

    #[test]
    fn test_countdown_freezes_world_then_runs() {
        let mut game = FlappyGame::new();
        process_input(&mut game, GameInput::Jump, &PurchasedItems::new());
        let start_y = game.bird.y;
        let mut rng = create_test_rng();
        let mut steps = Vec::new();
        let total = COUNTDOWN_SECONDS * TICKS_PER_SECOND;

        for _ in 0..total - 1 {
            for event in process_tick(&mut game, &mut rng) {
                if let GameEvent::CountdownStep(n) = event {
                    steps.push(n);
                }
            }
        }
        assert_eq!(steps, vec![2, 1]);
        assert!(matches!(game.phase, GamePhase::Countdown { .. }));
        assert!((game.bird.y - start_y).abs() < f64::EPSILON);
        assert_eq!(game.tick_count, 0);

        let events = process_tick(&mut game, &mut rng);
        assert_eq!(events, vec![GameEvent::Started]);
        assert!(game.is_running());
    }

    #[test]
    fn test_ceiling_clamps_without_ending_game() {
        let mut game = running_game();
        game.bird.y = 2.0;
        game.bird.velocity = -10.0;
        assert!(!update_bird(&mut game));
        assert!(game.bird.y.abs() < f64::EPSILON);
        assert!(game.bird.velocity.abs() < f64::EPSILON);
    }

    #[test]
    fn test_ground_ends_game_even_with_shield() {
        let mut game = running_game();
        game.power_ups.activate(PowerUpKind::Shield);
        game.bird.y = FlappyGame::floor() - BIRD_SIZE - 0.1;
        game.bird.velocity = 1.0;
        let mut rng = create_test_rng();
        let events = process_tick(&mut game, &mut rng);
        assert_eq!(
            events,
            vec![GameEvent::GameOver {
                score: 0,
                cause: DeathCause::Ground
            }]
        );
        assert!(game.is_over());
    }

    #[test]
    fn test_pipe_collision_detected() {
        let mut game = running_game();
        // Gap well below the bird.
        game.pipes.push(Pipe::new(game.bird.x, 400.0));
        assert!(check_collision(&game));
    }

    #[test]
    fn test_no_collision_inside_gap() {
        let mut game = running_game();
        game.bird.y = 250.0;
        game.pipes.push(Pipe::new(game.bird.x, 200.0));
        assert!(!check_collision(&game));
    }

    #[test]
    fn test_shield_suppresses_collision_regardless_of_geometry() {
        let mut game = running_game();
        game.pipes.push(Pipe::new(game.bird.x, 400.0));
        game.power_ups.activate(PowerUpKind::Shield);
        assert!(!check_collision(&game));
    }

    #[test]
    fn test_pipe_spawns_on_interval() {
        let mut game = running_game();
        let mut rng = create_test_rng();
        for _ in 0..PIPE_INTERVAL_TICKS as u32 - 1 {
            generate_pipes(&mut game, &mut rng);
        }
        assert!(game.pipes.is_empty());
        generate_pipes(&mut game, &mut rng);
        assert_eq!(game.pipes.len(), 1);
        assert_eq!(game.pipe_timer, 0);
        assert!((game.pipes[0].x - FIELD_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_speed_boost_shortens_pipe_interval() {
        let mut game = running_game();
        game.power_ups.activate(PowerUpKind::SpeedBoost);
        let mut rng = create_test_rng();
        for _ in 0..105 {
            generate_pipes(&mut game, &mut rng);
        }
        assert_eq!(game.pipes.len(), 1);
        assert!((scroll_speed(&game) - BOOSTED_PIPE_SPEED).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gap_keeps_margins() {
        let mut rng = create_test_rng();
        for _ in 0..5000 {
            let gap_y = random_gap_y(&mut rng);
            assert!(gap_y >= PIPE_MARGIN);
            assert!(FIELD_HEIGHT - (gap_y + PIPE_GAP) >= PIPE_MARGIN);
        }
    }

    #[test]
    fn test_pipe_scored_exactly_once() {
        let mut game = running_game();
        game.pipes.push(Pipe::new(game.bird.x - PIPE_WIDTH + 1.0, 200.0));
        assert_eq!(update_pipes(&mut game), 1);
        assert_eq!(game.score, 1);
        for _ in 0..20 {
            assert_eq!(update_pipes(&mut game), 0);
        }
        assert_eq!(game.score, 1);
    }

    #[test]
    fn test_offscreen_pipes_removed_in_order() {
        let mut game = running_game();
        game.pipes.push(Pipe::new(-PIPE_WIDTH + 1.0, 100.0));
        game.pipes.push(Pipe::new(150.0, 200.0));
        game.pipes.push(Pipe::new(300.0, 300.0));
        update_pipes(&mut game);
        let gaps: Vec<f64> = game.pipes.iter().map(|p| p.gap_y).collect();
        assert_eq!(gaps, vec![200.0, 300.0]);
    }

    #[test]
    fn test_coin_spawn_without_candidates_resets_timer() {
        let mut game = running_game();
        game.coin_timer = COIN_INTERVAL_TICKS - 1;
        game.pipes.push(Pipe::new(50.0, 200.0));
        let mut rng = create_test_rng();
        generate_coins(&mut game, &mut rng);
        assert!(game.coins.is_empty());
        assert_eq!(game.coin_timer, 0);
    }

    #[test]
    fn test_coin_spawns_inside_gap() {
        let mut rng = create_test_rng();
        let pipe = Pipe::new(FIELD_WIDTH, 120.0);
        for _ in 0..1000 {
            let coin = coin_for_pipe(&pipe, &mut rng);
            assert!(coin.y >= pipe.gap_y + COIN_GAP_MARGIN);
            assert!(coin.y + COIN_SIZE <= pipe.gap_bottom() - COIN_GAP_MARGIN + 1e-9);
            assert!((coin.x - (FIELD_WIDTH + PIPE_WIDTH + COIN_PIPE_OFFSET)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_coin_overlap_collects_and_removes() {
        let mut game = running_game();
        game.coins.push(Coin::new(game.bird.x + 10.0, game.bird.y + 5.0));
        assert_eq!(update_coins(&mut game), 1);
        assert!(game.coins.is_empty());
        assert_eq!(game.coins_collected, 1);
    }

    #[test]
    fn test_magnet_pulls_and_collects_once() {
        let mut game = running_game();
        game.power_ups.activate(PowerUpKind::CoinMagnet);
        let (bx, by) = game.bird.bounds().center();
        // 60 units to the right of the bird center after scrolling.
        let start_x = bx + 60.0 - COIN_SIZE / 2.0 + PIPE_SPEED;
        let start_y = by - COIN_SIZE / 2.0;
        game.coins.push(Coin::new(start_x, start_y));

        assert_eq!(update_coins(&mut game), 1);
        let coin = &game.coins[0];
        assert!(coin.collected);
        let expected_x = (start_x - PIPE_SPEED) + (-60.0) * MAGNET_PULL;
        assert!((coin.x - expected_x).abs() < 1e-9);

        // Later ticks keep pulling but never count the coin again.
        let before = game.coins[0].distance_to(bx, by);
        assert_eq!(update_coins(&mut game), 0);
        let after = game.coins[0].distance_to(bx, by);
        assert!((after - before * (1.0 - MAGNET_PULL)).abs() < 1e-9);
        assert_eq!(game.coins_collected, 1);
    }

    #[test]
    fn test_magnet_ignores_far_coins() {
        let mut game = running_game();
        game.power_ups.activate(PowerUpKind::CoinMagnet);
        game.coins.push(Coin::new(350.0, game.bird.y));
        assert_eq!(update_coins(&mut game), 0);
        assert!(!game.coins[0].collected);
    }

    #[test]
    fn test_power_up_requires_purchase() {
        let mut game = running_game();
        let event = process_input(
            &mut game,
            GameInput::Activate(PowerUpKind::Shield),
            &PurchasedItems::new(),
        );
        assert!(event.is_none());
        assert!(!game.power_ups.is_active(PowerUpKind::Shield));

        let event = process_input(
            &mut game,
            GameInput::Activate(PowerUpKind::Shield),
            &owning(&[PowerUpKind::Shield]),
        );
        assert_eq!(event, Some(GameEvent::PowerUpActivated(PowerUpKind::Shield)));
        assert_eq!(game.power_ups_used, 1);
    }

    #[test]
    fn test_shield_expiry_notifies() {
        let mut game = running_game();
        game.bird.y = 100.0;
        game.power_ups.activate(PowerUpKind::Shield);
        let mut rng = create_test_rng();
        let mut saw_notice = false;
        for _ in 0..POWER_UP_DURATION_TICKS {
            game.bird.velocity = -1.0;
            game.pipes.clear();
            let events = process_tick(&mut game, &mut rng);
            saw_notice |= events.contains(&GameEvent::ShieldDeactivated);
        }
        assert!(saw_notice);
        assert!(!game.power_ups.is_active(PowerUpKind::Shield));
    }

    #[test]
    fn test_restart_resets_and_counts_down() {
        let mut game = running_game();
        game.score = 9;
        game.power_ups.activate(PowerUpKind::Shield);
        game.pipes.push(Pipe::new(200.0, 200.0));
        let event = process_input(&mut game, GameInput::Restart, &PurchasedItems::new());
        assert_eq!(event, Some(GameEvent::CountdownStarted));
        assert_eq!(game.score, 0);
        assert!(game.pipes.is_empty());
        assert!(!game.power_ups.is_active(PowerUpKind::Shield));
        assert!(matches!(game.phase, GamePhase::Countdown { .. }));
    }

    #[test]
    fn test_no_tick_when_over() {
        let mut game = running_game();
        game.phase = GamePhase::Over;
        let y = game.bird.y;
        let mut rng = create_test_rng();
        assert!(process_tick(&mut game, &mut rng).is_empty());
        assert!((game.bird.y - y).abs() < f64::EPSILON);
    }
}
