//! One player's session: the running game, the profile it feeds, and the
//! store the profile is persisted to.
//!
//! Persistence never blocks the game loop. Calls are queued to a single
//! worker thread that applies them in order, so a slow save can never be
//! overtaken by a newer one. Failures are only logged; [`Session::flush`]
//! waits for the queue to drain.

use crate::achievements::{advanced_milestones, Milestone};
use crate::game::{
    process_input, process_tick, FlappyGame, GameEvent, GameInput, PowerUpKind,
};
use crate::persistence::{GameSessionRecord, ProfileStore, UserData};
use crate::render::Toast;
use crate::themes::{find_theme, next_theme, Theme};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Who is playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    /// Nothing is persisted.
    Guest { id: String },
    Local { username: String },
    Remote { id: String, username: String },
}

impl Account {
    pub fn guest() -> Self {
        Account::Guest {
            id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Key used by the profile store; guests have none.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Account::Guest { .. } => None,
            Account::Local { username } => Some(username),
            Account::Remote { id, .. } => Some(id),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Account::Guest { .. } => "Guest",
            Account::Local { username } | Account::Remote { username, .. } => username,
        }
    }
}

enum PersistJob {
    Profile(UserData),
    Theme(String),
    Run(GameSessionRecord),
    PowerUp(PowerUpKind),
    Milestone(&'static Milestone, u32),
    /// Answered once every job queued before it has been applied.
    Flush(Sender<()>),
}

/// Owns the persistence thread. Dropping it closes the queue and waits for
/// the remaining jobs.
struct PersistWorker {
    jobs: Option<Sender<PersistJob>>,
    handle: Option<JoinHandle<()>>,
    queued: Arc<AtomicUsize>,
}

impl PersistWorker {
    fn spawn(store: Arc<dyn ProfileStore>, user_id: String) -> Option<Self> {
        let (jobs, receiver) = mpsc::channel();
        let queued = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&queued);
        let spawned = thread::Builder::new()
            .name("flappy-persist".to_string())
            .spawn(move || run_jobs(store.as_ref(), &user_id, receiver, &counter));

        match spawned {
            Ok(handle) => Some(Self {
                jobs: Some(jobs),
                handle: Some(handle),
                queued,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "could not start persistence thread, saving disabled");
                None
            }
        }
    }

    fn send(&self, job: PersistJob) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        self.queued.fetch_add(1, Ordering::SeqCst);
        if jobs.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!("persistence thread is gone, dropping save");
        }
    }

    fn pending(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    fn flush(&self) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        let (ack, done) = mpsc::channel();
        if jobs.send(PersistJob::Flush(ack)).is_err() || done.recv().is_err() {
            tracing::warn!("persistence thread stopped before flushing");
        }
    }
}

impl Drop for PersistWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("persistence thread panicked");
            }
        }
    }
}

fn run_jobs(
    store: &dyn ProfileStore,
    user_id: &str,
    jobs: Receiver<PersistJob>,
    queued: &AtomicUsize,
) {
    let backend = store.backend_name();
    for job in jobs {
        match job {
            PersistJob::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
            PersistJob::Profile(data) => match store.save_user_data(user_id, &data) {
                Ok(()) => tracing::debug!(backend, coins = data.coins, "profile saved"),
                Err(e) => tracing::warn!(backend, error = %e, "failed to save profile"),
            },
            PersistJob::Theme(theme) => match store.save_theme(user_id, &theme) {
                Ok(()) => tracing::debug!(backend, theme = %theme, "theme saved"),
                Err(e) => tracing::warn!(backend, error = %e, "failed to save theme"),
            },
            PersistJob::Run(record) => match store.save_game_session(user_id, &record) {
                Ok(()) => tracing::info!(backend, score = record.score, "game session recorded"),
                Err(e) => tracing::warn!(backend, error = %e, "failed to record game session"),
            },
            PersistJob::PowerUp(kind) => {
                if let Err(e) = store.record_power_up(user_id, kind) {
                    tracing::warn!(
                        backend,
                        power_up = kind.item_id(),
                        error = %e,
                        "failed to log power-up"
                    );
                }
            }
            PersistJob::Milestone(milestone, progress) => {
                let name = milestone.name;
                match store.record_milestone(user_id, milestone, progress) {
                    Ok(()) => tracing::debug!(backend, milestone = name, progress, "milestone saved"),
                    Err(e) => tracing::warn!(backend, milestone = name, error = %e, "failed to save milestone"),
                }
            }
        }
        queued.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Session {
    pub game: FlappyGame,
    pub profile: UserData,
    pub account: Account,
    pub toast: Option<Toast>,
    /// Whether the last finished run raised the best score.
    pub new_best: bool,
    worker: Option<PersistWorker>,
}

impl Session {
    pub fn new(account: Account, profile: UserData, store: Option<Arc<dyn ProfileStore>>) -> Self {
        let worker = match (store, account.user_id()) {
            (Some(store), Some(user_id)) => PersistWorker::spawn(store, user_id.to_string()),
            _ => None,
        };
        Self {
            game: FlappyGame::new(),
            profile,
            account,
            toast: None,
            new_best: false,
            worker,
        }
    }

    pub fn guest() -> Self {
        Self::new(Account::guest(), UserData::default(), None)
    }

    pub fn theme(&self) -> &'static Theme {
        find_theme(&self.profile.current_theme)
    }

    pub fn handle_input(&mut self, input: GameInput) -> Option<GameEvent> {
        let event = process_input(&mut self.game, input, &self.profile.purchased_items)?;
        self.apply_event(event);
        Some(event)
    }

    /// Advance one tick and apply the resulting events to the profile.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> Vec<GameEvent> {
        if let Some(toast) = &mut self.toast {
            if !toast.tick() {
                self.toast = None;
            }
        }

        let events = process_tick(&mut self.game, rng);
        for event in &events {
            self.apply_event(*event);
        }
        events
    }

    /// Switch to the next theme and persist the choice.
    pub fn cycle_theme(&mut self) -> &'static Theme {
        let theme = next_theme(&self.profile.current_theme);
        self.profile.current_theme = theme.id.to_string();
        tracing::info!(theme = theme.id, "theme changed");
        self.persist(PersistJob::Theme(theme.id.to_string()));
        theme
    }

    fn apply_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::CountdownStarted => {
                tracing::debug!("countdown started");
                self.new_best = false;
            }
            GameEvent::Started => tracing::info!(player = self.account.display_name(), "run started"),
            GameEvent::PowerUpActivated(kind) => {
                tracing::info!(power_up = kind.item_id(), "power-up activated");
                self.toast = Some(Toast::activated(kind));
                self.persist(PersistJob::PowerUp(kind));
            }
            GameEvent::ShieldDeactivated => {
                self.toast = Some(Toast::shield_deactivated());
            }
            GameEvent::PowerUpExpired(kind) => {
                tracing::debug!(power_up = kind.item_id(), "power-up expired");
            }
            GameEvent::CoinCollected => {
                self.profile.coins += 1;
                self.persist(PersistJob::Profile(self.profile.clone()));
            }
            GameEvent::GameOver { score, cause } => {
                tracing::info!(score, ?cause, "game over");
                let previous_best = self.profile.best_score;
                self.new_best = score > previous_best;
                if self.new_best {
                    self.profile.best_score = score;
                }
                self.persist(PersistJob::Profile(self.profile.clone()));
                self.persist(PersistJob::Run(self.run_record()));
                for (milestone, progress) in advanced_milestones(previous_best, score) {
                    self.persist(PersistJob::Milestone(milestone, progress));
                }
            }
            GameEvent::CountdownStep(_) | GameEvent::PipePassed { .. } => {}
        }
    }

    fn run_record(&self) -> GameSessionRecord {
        GameSessionRecord {
            score: self.game.score,
            coins_collected: self.game.coins_collected,
            duration_seconds: self.game.duration_seconds(),
            pipes_passed: self.game.score,
            power_ups_used: self.game.power_ups_used,
        }
    }

    fn persist(&self, job: PersistJob) {
        if let Some(worker) = &self.worker {
            worker.send(job);
        }
    }

    /// Number of persistence calls queued or in flight.
    pub fn pending_saves(&self) -> usize {
        self.worker.as_ref().map_or(0, PersistWorker::pending)
    }

    /// Wait until every queued persistence call has been applied.
    pub fn flush(&mut self) {
        if let Some(worker) = &self.worker {
            worker.flush();
        }
    }

    /// Power-up kinds the player could activate right now.
    pub fn available_power_ups(&self) -> Vec<PowerUpKind> {
        PowerUpKind::ALL
            .into_iter()
            .filter(|k| self.profile.purchased_items.owns_power_up(*k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::game::{Coin, GamePhase};
    use crate::persistence::UserStats;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        saves: Mutex<Vec<(String, UserData)>>,
        themes: Mutex<Vec<String>>,
        sessions: Mutex<Vec<GameSessionRecord>>,
        power_ups: Mutex<Vec<PowerUpKind>>,
        milestones: Mutex<Vec<(&'static str, u32)>>,
    }

    impl ProfileStore for RecordingStore {
        fn save_user_data(&self, user_id: &str, data: &UserData) -> StoreResult<()> {
            self.saves
                .lock()
                .unwrap()
                .push((user_id.to_string(), data.clone()));
            Ok(())
        }

        fn save_theme(&self, _user_id: &str, theme: &str) -> StoreResult<()> {
            self.themes.lock().unwrap().push(theme.to_string());
            Ok(())
        }

        fn get_user_stats(&self, _user_id: &str) -> StoreResult<UserStats> {
            Ok(UserStats::default())
        }

        fn save_game_session(&self, _user_id: &str, session: &GameSessionRecord) -> StoreResult<()> {
            self.sessions.lock().unwrap().push(session.clone());
            Ok(())
        }

        fn record_power_up(&self, _user_id: &str, kind: PowerUpKind) -> StoreResult<()> {
            self.power_ups.lock().unwrap().push(kind);
            Ok(())
        }

        fn record_milestone(
            &self,
            _user_id: &str,
            milestone: &Milestone,
            progress: u32,
        ) -> StoreResult<()> {
            self.milestones
                .lock()
                .unwrap()
                .push((milestone.name, progress));
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "recording"
        }
    }

    fn local_session(store: &Arc<RecordingStore>) -> Session {
        let store: Arc<dyn ProfileStore> = store.clone();
        Session::new(
            Account::Local {
                username: "ana".to_string(),
            },
            UserData::default(),
            Some(store),
        )
    }

    #[test]
    fn test_coin_pickup_adds_to_balance_and_saves() {
        let store = Arc::new(RecordingStore::default());
        let mut session = local_session(&store);
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        session.game.phase = GamePhase::Running;
        let bird = session.game.bird.bounds();
        session.game.coins.push(Coin::new(bird.x + 5.0, bird.y + 5.0));

        let events = session.tick(&mut rng);
        assert!(events.contains(&GameEvent::CoinCollected));
        assert_eq!(session.profile.coins, 1);

        session.flush();
        let saves = store.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, "ana");
        assert_eq!(saves[0].1.coins, 1);
    }

    #[test]
    fn test_game_over_updates_best_and_records_run() {
        let store = Arc::new(RecordingStore::default());
        let mut session = local_session(&store);
        session.profile.best_score = 2;
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        session.game.phase = GamePhase::Running;
        session.game.score = 5;
        session.game.bird.y = 600.0;

        let events = session.tick(&mut rng);
        assert!(session.game.is_over());
        assert!(matches!(events.last(), Some(GameEvent::GameOver { score: 5, .. })));
        assert_eq!(session.profile.best_score, 5);

        assert!(session.new_best);

        session.flush();
        assert_eq!(session.pending_saves(), 0);
        assert_eq!(store.saves.lock().unwrap().last().unwrap().1.best_score, 5);
        let runs = store.sessions.lock().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].score, 5);
        assert_eq!(runs[0].pipes_passed, 5);
        assert_eq!(
            *store.milestones.lock().unwrap(),
            [("sky_rider", 5), ("high_flyer", 5), ("legend", 5)]
        );
    }

    #[test]
    fn test_tying_best_is_not_a_new_best() {
        let store = Arc::new(RecordingStore::default());
        let mut session = local_session(&store);
        session.profile.best_score = 5;
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        session.game.phase = GamePhase::Running;
        session.game.score = 5;
        session.game.bird.y = 600.0;

        session.tick(&mut rng);
        assert!(session.game.is_over());
        assert!(!session.new_best);
        assert_eq!(session.profile.best_score, 5);

        session.flush();
        assert!(store.milestones.lock().unwrap().is_empty());
    }

    #[test]
    fn test_restart_clears_new_best() {
        let mut session = Session::guest();
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        session.game.phase = GamePhase::Running;
        session.game.score = 2;
        session.game.bird.y = 600.0;
        session.tick(&mut rng);
        assert!(session.new_best);

        session.handle_input(GameInput::Restart);
        assert!(!session.new_best);
    }

    #[test]
    fn test_saves_apply_in_order() {
        let store = Arc::new(RecordingStore::default());
        let mut session = local_session(&store);
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        session.game.phase = GamePhase::Running;
        for _ in 0..5 {
            session.game.bird.y = 300.0;
            session.game.bird.velocity = 0.0;
            let bird = session.game.bird.bounds();
            session.game.coins.push(Coin::new(bird.x + 5.0, bird.y + 5.0));
            session.tick(&mut rng);
        }
        session.flush();

        let coins: Vec<u64> = store.saves.lock().unwrap().iter().map(|(_, d)| d.coins).collect();
        assert_eq!(coins, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_power_up_activation_is_logged() {
        let store = Arc::new(RecordingStore::default());
        let mut session = local_session(&store);
        session.profile.purchased_items.insert("coin-magnet");
        session.handle_input(GameInput::Activate(PowerUpKind::CoinMagnet));
        session.flush();
        assert_eq!(*store.power_ups.lock().unwrap(), [PowerUpKind::CoinMagnet]);
    }

    #[test]
    fn test_dropping_session_drains_queue() {
        let store = Arc::new(RecordingStore::default());
        let mut session = local_session(&store);
        session.cycle_theme();
        session.cycle_theme();
        drop(session);
        assert_eq!(*store.themes.lock().unwrap(), ["sunset", "night"]);
    }

    #[test]
    fn test_lower_score_keeps_best() {
        let mut session = Session::guest();
        session.profile.best_score = 9;
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        session.game.phase = GamePhase::Running;
        session.game.score = 3;
        session.game.bird.y = 600.0;
        session.tick(&mut rng);
        assert_eq!(session.profile.best_score, 9);
    }

    #[test]
    fn test_guest_never_persists() {
        let mut session = Session::guest();
        session.cycle_theme();
        assert_eq!(session.pending_saves(), 0);
        assert!(session.account.user_id().is_none());
    }

    #[test]
    fn test_cycle_theme_persists_choice() {
        let store = Arc::new(RecordingStore::default());
        let mut session = local_session(&store);
        assert_eq!(session.cycle_theme().id, "sunset");
        assert_eq!(session.theme().name, "Sunset");
        session.flush();
        assert_eq!(*store.themes.lock().unwrap(), ["sunset"]);
        assert!(store.saves.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unowned_power_up_ignored_owned_shows_toast() {
        let mut session = Session::guest();
        assert_eq!(
            session.handle_input(GameInput::Activate(PowerUpKind::Shield)),
            None
        );
        assert!(session.toast.is_none());

        session.profile.purchased_items.insert("shield");
        assert_eq!(
            session.handle_input(GameInput::Activate(PowerUpKind::Shield)),
            Some(GameEvent::PowerUpActivated(PowerUpKind::Shield))
        );
        assert_eq!(
            session.toast.as_ref().map(|t| t.text.as_str()),
            Some("Shield Activated!")
        );
        assert_eq!(session.available_power_ups(), vec![PowerUpKind::Shield]);
    }

    #[test]
    fn test_toast_clears_after_its_lifetime() {
        let mut session = Session::guest();
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        session.toast = Some(Toast::new("hello"));
        for _ in 0..crate::constants::TOAST_TICKS {
            session.tick(&mut rng);
        }
        assert!(session.toast.is_none());
    }

    #[test]
    fn test_account_names() {
        let remote = Account::Remote {
            id: "42".to_string(),
            username: "bo".to_string(),
        };
        assert_eq!(remote.user_id(), Some("42"));
        assert_eq!(remote.display_name(), "bo");
        assert_eq!(Account::guest().display_name(), "Guest");
    }
}
