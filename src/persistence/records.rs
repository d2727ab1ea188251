//! Row types exchanged with the hosted store.
//!
//! Column names follow the hosted schema; everything optional on the server
//! side is `#[serde(default)]` here so older rows still decode.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accept ids stored either as uuid strings or as integers.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUser {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub best_score: u32,
    #[serde(default)]
    pub current_theme: Option<String>,
    #[serde(default)]
    pub is_guest: bool,
}

/// Aggregates kept on the `users` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub best_score: u32,
    #[serde(default)]
    pub total_games: u32,
    #[serde(default)]
    pub total_coins_earned: u64,
    #[serde(default)]
    pub current_theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStoreItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub item_type: String,
    pub price: u64,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub effects: Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl RemoteStoreItem {
    /// Local item id (`"Coin Magnet"` -> `"coin-magnet"`).
    pub fn slug(&self) -> String {
        self.name.trim().to_lowercase().replace(' ', "-")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub item_id: String,
    #[serde(default)]
    pub purchase_status: String,
    #[serde(default)]
    pub store_items: Option<RemoteStoreItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub item_id: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub store_items: Option<RemoteStoreItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTheme {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub colors: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub achievement_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default = "default_one")]
    pub max_progress: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub earned_at: Option<String>,
}

fn default_one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChallenge {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    #[serde(deserialize_with = "deserialize_id")]
    pub challenge_id: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub daily_challenges: Option<DailyChallenge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(default)]
    pub best_score: u32,
    #[serde(default)]
    pub total_coins_earned: u64,
}

/// Summary of one finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSessionRecord {
    pub score: u32,
    pub coins_collected: u32,
    pub duration_seconds: u64,
    pub pipes_passed: u32,
    pub power_ups_used: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpUsage {
    pub user_id: String,
    pub item_id: String,
    pub game_session_id: Option<String>,
    pub effect_duration: u32,
    pub effect_value: Value,
}
