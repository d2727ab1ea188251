use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use flappy::accounts;
use flappy::build_info::version_line;
use flappy::config::AppConfig;
use flappy::constants::{INPUT_POLL_MS, LEADERBOARD_DEFAULT_LIMIT};
use flappy::error::StoreError;
use flappy::game::TickClock;
use flappy::input::{handle_command, map_event, InputResult};
use flappy::logging;
use flappy::persistence::{LeaderboardEntry, LocalStore, RemoteClient, UserStats};
use flappy::session::Session;
use flappy::setup::{DatabaseSetup, TEST_EMAIL, TEST_PASSWORD};
use flappy::store::CATALOG;
use flappy::ui;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "flappy")]
#[command(about = "Terminal Flappy Bird with coins, power-ups and a store")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Show version information
    #[arg(short = 'V', long)]
    version: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Default)]
struct Credentials {
    /// Local profile name
    #[arg(long)]
    user: Option<String>,
    /// Email of a hosted account (with --remote)
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// Use the hosted store instead of local profiles
    #[arg(long)]
    remote: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play (as a guest unless credentials are given)
    Play {
        #[command(flatten)]
        credentials: Credentials,
        /// Play without a profile; with --remote, creates a hosted guest
        #[arg(long)]
        guest: bool,
    },
    /// Create a profile
    Register {
        #[arg(long)]
        user: String,
        #[arg(long)]
        password: String,
        /// Create the account on the hosted store
        #[arg(long)]
        remote: bool,
        #[arg(long)]
        email: Option<String>,
    },
    /// Browse or buy store items
    Store {
        #[command(subcommand)]
        action: StoreCommand,
    },
    /// Show stats, achievements and daily challenges
    Profile {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Delete a local profile
    Delete {
        #[arg(long)]
        user: String,
        #[arg(long)]
        password: String,
    },
    /// Show the best scores
    Leaderboard {
        #[arg(long, default_value_t = LEADERBOARD_DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Hosted database setup and diagnostics
    Setup {
        #[command(subcommand)]
        step: SetupCommand,
    },
}

#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// List items and prices
    List {
        /// List the hosted store's items instead of the built-in catalog
        #[arg(long)]
        remote: bool,
    },
    /// Buy an item by id (e.g. coin-magnet)
    Buy {
        item: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show the items an account owns
    Inventory {
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Subcommand, Debug)]
enum SetupCommand {
    /// Check the connection
    Test,
    /// Seed the store with the built-in items
    Init,
    /// Create the test user
    CreateTestUser,
    /// Log in as the test user
    TestAuth,
    /// List store items
    TestStore,
    /// Run every step in order
    Full,
    /// Show what the hosted store contains
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", version_line());
        return Ok(());
    }

    let config = AppConfig::from_env().context("could not prepare the data directory")?;
    let command = cli.command.unwrap_or(Commands::Play {
        credentials: Credentials::default(),
        guest: true,
    });

    // The play screen owns the terminal, so logs go to a file there.
    if matches!(command, Commands::Play { .. }) {
        logging::init_file(&config.log_path())?;
    } else {
        logging::init_stderr();
    }
    config.log_overrides();

    match command {
        Commands::Play { credentials, guest } => {
            let session = open_session(&config, &credentials, guest)?;
            run_play(&config, session)
        }
        Commands::Register {
            user,
            password,
            remote,
            email,
        } => register(&config, &user, &password, remote, email.as_deref()),
        Commands::Store { action } => run_store(&config, action),
        Commands::Profile { credentials } => show_profile(&config, &credentials),
        Commands::Delete { user, password } => {
            LocalStore::open(&config.data_dir)?.delete_user(&user, &password)?;
            println!("Deleted local profile {}", user.trim());
            Ok(())
        }
        Commands::Leaderboard { limit } => show_leaderboard(&config, limit),
        Commands::Setup { step } => run_setup(&config, step),
    }
}

fn remote_client(config: &AppConfig) -> Result<RemoteClient> {
    let remote = config.remote.clone().ok_or(StoreError::NotConfigured)?;
    Ok(RemoteClient::new(remote))
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) => Ok(v),
        None => bail!("{} is required", flag),
    }
}

fn open_session(config: &AppConfig, credentials: &Credentials, guest: bool) -> Result<Session> {
    if credentials.remote {
        let client = Arc::new(remote_client(config)?);
        if guest {
            return Ok(accounts::remote_guest_session(client)?);
        }
        let email = required(&credentials.email, "--email")?;
        let password = required(&credentials.password, "--password")?;
        return Ok(accounts::remote_session(client, email, password)?);
    }

    match &credentials.user {
        Some(user) if !guest => {
            let password = required(&credentials.password, "--password")?;
            let store = Arc::new(LocalStore::open(&config.data_dir)?);
            Ok(accounts::local_session(store, user, password)?)
        }
        _ => Ok(Session::guest()),
    }
}

fn run_play(config: &AppConfig, mut session: Session) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);

    let result = match Terminal::new(backend) {
        Ok(mut terminal) => {
            let result = game_loop(&mut terminal, &mut session, config.tick_ms);
            let _ = terminal.show_cursor();
            result
        }
        Err(e) => Err(e.into()),
    };

    // Cleanup terminal
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = stdout.execute(DisableMouseCapture);
    let _ = stdout.execute(LeaveAlternateScreen);

    session.flush();
    result?;

    println!(
        "Best score: {}  Coins: {}",
        session.profile.best_score, session.profile.coins
    );
    Ok(())
}

fn game_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    tick_ms: u64,
) -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut clock = TickClock::new(tick_ms);
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| ui::draw_ui(frame, session))?;

        while event::poll(Duration::from_millis(INPUT_POLL_MS))? {
            let event = event::read()?;
            if let Some(command) = map_event(&event) {
                if handle_command(session, command) == InputResult::Quit {
                    return Ok(());
                }
            }
        }

        let now = Instant::now();
        let elapsed_ms = now.duration_since(last_frame).as_millis() as u64;
        last_frame = now;
        for _ in 0..clock.advance(elapsed_ms) {
            session.tick(&mut rng);
        }
    }
}

fn register(
    config: &AppConfig,
    user: &str,
    password: &str,
    remote: bool,
    email: Option<&str>,
) -> Result<()> {
    if remote {
        let client = remote_client(config)?;
        let created = client.create_user(user, password, email)?;
        println!("Created hosted account {} (id {})", created.username, created.id);
    } else {
        let store = LocalStore::open(&config.data_dir)?;
        store.register(user, password)?;
        println!("Created local profile {}", user.trim());
    }
    Ok(())
}

fn run_store(config: &AppConfig, action: StoreCommand) -> Result<()> {
    match action {
        StoreCommand::List { remote: false } => {
            for item in CATALOG.iter() {
                println!(
                    "{:<14} {:>4} coins  {:<7} {}",
                    item.id,
                    item.price,
                    item.rarity.name(),
                    item.description
                );
            }
        }
        StoreCommand::List { remote: true } => {
            let client = remote_client(config)?;
            for item in client.get_store_items()? {
                println!(
                    "{:<14} {:>4} coins  {:<7} {}",
                    item.slug(),
                    item.price,
                    item.rarity,
                    item.description
                );
            }
        }
        StoreCommand::Buy { item, credentials } => {
            if credentials.remote {
                let client = remote_client(config)?;
                let email = required(&credentials.email, "--email")?;
                let password = required(&credentials.password, "--password")?;
                let bought = accounts::buy_remote(&client, email, password, &item)?;
                println!("Bought {} for {} coins", bought.name, bought.price);
            } else {
                let user = required(&credentials.user, "--user")?;
                let password = required(&credentials.password, "--password")?;
                let store = LocalStore::open(&config.data_dir)?;
                let (bought, profile) = accounts::buy_local(&store, user, password, &item)?;
                println!(
                    "Bought {} for {} coins, {} left",
                    bought.name, bought.price, profile.coins
                );
            }
        }
        StoreCommand::Inventory { credentials } => {
            if credentials.remote {
                let client = remote_client(config)?;
                let email = required(&credentials.email, "--email")?;
                let password = required(&credentials.password, "--password")?;
                let inventory = accounts::remote_inventory(&client, email, password)?;
                if inventory.is_empty() {
                    println!("No items yet.");
                }
                for entry in inventory {
                    let name = entry
                        .store_items
                        .as_ref()
                        .map_or_else(|| format!("item {}", entry.item_id), |item| item.slug());
                    println!("{:<14} x{}", name, entry.quantity);
                }
            } else {
                let user = required(&credentials.user, "--user")?;
                let password = required(&credentials.password, "--password")?;
                let store = LocalStore::open(&config.data_dir)?;
                let items = accounts::local_inventory(&store, user, password)?;
                if items.is_empty() {
                    println!("No items yet.");
                }
                for item in items {
                    println!("{:<14} {}", item.id, item.description);
                }
            }
        }
    }
    Ok(())
}

fn print_stats(name: &str, stats: &UserStats) {
    println!(
        "{}: best {}, {} coins, {} games, {} coins earned, theme {}",
        name,
        stats.best_score,
        stats.coins,
        stats.total_games,
        stats.total_coins_earned,
        stats.current_theme.as_deref().unwrap_or("classic")
    );
}

fn show_profile(config: &AppConfig, credentials: &Credentials) -> Result<()> {
    let password = required(&credentials.password, "--password")?;
    if !credentials.remote {
        let user = required(&credentials.user, "--user")?;
        let store = LocalStore::open(&config.data_dir)?;
        print_stats(user.trim(), &accounts::local_stats(&store, user, password)?);
        return Ok(());
    }

    let client = remote_client(config)?;
    let email = required(&credentials.email, "--email")?;
    let profile = accounts::remote_profile(&client, email, password)?;
    print_stats(&profile.user.username, &profile.stats);

    println!("Achievements:");
    if profile.achievements.is_empty() {
        println!("  none yet");
    }
    for achievement in &profile.achievements {
        let mark = if achievement.is_completed { "x" } else { " " };
        println!(
            "  [{}] {:<14} {}/{}  {}",
            mark,
            achievement.achievement_name,
            achievement.progress,
            achievement.max_progress,
            achievement.description
        );
    }

    println!("Daily challenges:");
    if profile.challenges.is_empty() {
        println!("  none today");
    }
    for challenge in &profile.challenges {
        println!(
            "  {:<20} progress {}  {}",
            challenge.title,
            profile.progress_on(&challenge.id),
            challenge.description
        );
    }
    Ok(())
}

fn show_leaderboard(config: &AppConfig, limit: usize) -> Result<()> {
    let entries: Vec<LeaderboardEntry> = match &config.remote {
        Some(_) => remote_client(config)?.get_leaderboard(limit)?,
        None => LocalStore::open(&config.data_dir)?.leaderboard(limit)?,
    };

    if entries.is_empty() {
        println!("No scores yet.");
        return Ok(());
    }
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}. {:<16} {:>6}",
            rank + 1,
            entry.username,
            entry.best_score
        );
    }
    Ok(())
}

fn run_setup(config: &AppConfig, step: SetupCommand) -> Result<()> {
    let setup = DatabaseSetup::new(remote_client(config)?);

    match step {
        SetupCommand::Test => {
            let count = setup.test_connection()?;
            println!("Connection OK, {} store items", count);
        }
        SetupCommand::Init => {
            let report = setup.initialize_sample_data()?;
            if report.skipped {
                println!("Store already has items, nothing to do");
            }
            for name in &report.created {
                println!("Created {}", name);
            }
            for (name, error) in &report.failed {
                println!("Failed to create {}: {}", name, error);
            }
        }
        SetupCommand::CreateTestUser => {
            let user = setup.create_test_user()?;
            println!(
                "Created {} (login: {} / {})",
                user.username, TEST_EMAIL, TEST_PASSWORD
            );
        }
        SetupCommand::TestAuth => {
            let user = setup.test_authentication()?;
            println!("Logged in as {} with {} coins", user.username, user.coins);
        }
        SetupCommand::TestStore => {
            let current = setup.backend().get_current_user()?;
            let check = setup.test_store_operations(current.as_ref())?;
            println!("{} store items", check.item_count);
            match check.purchase {
                Some((name, accepted)) => println!("Test purchase of {}: {}", name, accepted),
                None => println!("No user logged in, purchase skipped"),
            }
        }
        SetupCommand::Full => {
            let report = setup.run_full_setup()?;
            println!("Connection OK, {} store items", report.item_count);
            match &report.seed {
                Some(seed) if seed.skipped => println!("Sample data: already present"),
                Some(seed) => println!(
                    "Sample data: {} created, {} failed",
                    seed.created.len(),
                    seed.failed.len()
                ),
                None => println!("Sample data: failed"),
            }
            match &report.test_user {
                Some(user) => println!("Test user: {}", user.username),
                None => println!("Test user: not created"),
            }
            println!("Authentication: {}", if report.authenticated { "ok" } else { "skipped" });
            match &report.store {
                Some(store) => println!("Store: {} items", store.item_count),
                None => println!("Store: check failed"),
            }
        }
        SetupCommand::Status => {
            let status = setup.show_status();
            match status.store_items {
                Ok(n) => println!("Store items: {}", n),
                Err(e) => println!("Store items: error ({})", e),
            }
            match status.themes {
                Ok(n) => println!("Themes: {}", n),
                Err(e) => println!("Themes: error ({})", e),
            }
            match (&status.current_user, &status.stats) {
                (Some(name), Some(stats)) => println!(
                    "Signed in as {}: best {}, {} coins, {} games",
                    name, stats.best_score, stats.coins, stats.total_games
                ),
                (Some(name), None) => println!("Signed in as {}", name),
                _ => println!("Not signed in"),
            }
        }
    }
    Ok(())
}
