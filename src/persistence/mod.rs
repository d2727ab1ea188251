//! Profile persistence: a local JSON store and a hosted PostgREST store
//! behind one small contract.

pub mod local;
pub mod records;
pub mod remote;

pub use local::LocalStore;
pub use records::*;
pub use remote::RemoteClient;

use crate::achievements::Milestone;
use crate::constants::DEFAULT_THEME;
use crate::error::StoreResult;
use crate::game::PowerUpKind;
use crate::store::PurchasedItems;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What the game keeps per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub best_score: u32,
    #[serde(default)]
    pub coins: u64,
    #[serde(default = "default_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub purchased_items: PurchasedItems,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for UserData {
    fn default() -> Self {
        Self {
            best_score: 0,
            coins: 0,
            current_theme: default_theme(),
            purchased_items: PurchasedItems::new(),
        }
    }
}

/// Hex SHA-256 of a password, the form stored in `password_hash` columns.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Contract the game session relies on. Calls arrive from the session's
/// persistence thread, one at a time and in the order they were made.
pub trait ProfileStore: Send + Sync {
    /// Persist best score, coin balance and theme for a user.
    fn save_user_data(&self, user_id: &str, data: &UserData) -> StoreResult<()>;

    /// Persist only the selected theme.
    fn save_theme(&self, user_id: &str, theme: &str) -> StoreResult<()>;

    fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats>;

    /// Record a finished run.
    fn save_game_session(&self, user_id: &str, session: &GameSessionRecord) -> StoreResult<()>;

    /// Log a power-up activation. Stores without a usage log ignore it.
    fn record_power_up(&self, _user_id: &str, _kind: PowerUpKind) -> StoreResult<()> {
        Ok(())
    }

    /// Store progress towards a milestone. Stores without achievements ignore it.
    fn record_milestone(
        &self,
        _user_id: &str,
        _milestone: &Milestone,
        _progress: u32,
    ) -> StoreResult<()> {
        Ok(())
    }

    /// Name used in log lines.
    fn backend_name(&self) -> &'static str;
}
