//! Local profiles: one pretty-printed JSON file per user under
//! `<data dir>/profiles/`.

use super::{
    hash_password, GameSessionRecord, LeaderboardEntry, ProfileStore, UserData, UserStats,
};
use crate::error::{StoreError, StoreResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const PROFILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalProfileFile {
    version: u32,
    username: String,
    #[serde(default)]
    password_hash: String,
    #[serde(default)]
    created_at: i64,
    #[serde(default)]
    last_save_time: i64,
    #[serde(default)]
    total_games: u32,
    #[serde(default)]
    total_coins_earned: u64,
    #[serde(flatten)]
    data: UserData,
}

/// Summary row for `list_users`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUserInfo {
    pub username: String,
    pub filename: String,
    pub best_score: u32,
    pub coins: u64,
    pub last_save_time: i64,
    pub is_corrupted: bool,
}

pub struct LocalStore {
    profiles_dir: PathBuf,
    // Saves arrive from background threads; keep read-modify-write atomic.
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn open(data_dir: &Path) -> io::Result<Self> {
        let profiles_dir = data_dir.join("profiles");
        fs::create_dir_all(&profiles_dir)?;
        Ok(Self {
            profiles_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    fn path_for(&self, username: &str) -> PathBuf {
        self.profiles_dir
            .join(format!("{}.json", sanitize_name(username)))
    }

    pub fn exists(&self, username: &str) -> bool {
        self.path_for(username).exists()
    }

    fn read_file(&self, path: &Path) -> StoreResult<LocalProfileFile> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn read_profile(&self, username: &str) -> StoreResult<LocalProfileFile> {
        let path = self.path_for(username);
        if !path.exists() {
            return Err(StoreError::NotFound(format!("user {}", username.trim())));
        }
        self.read_file(&path)
    }

    fn write_profile(&self, profile: &LocalProfileFile) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(profile)?;
        fs::write(self.path_for(&profile.username), json)?;
        Ok(())
    }

    /// Read, mutate and write back a profile while holding the write lock.
    fn update_profile(
        &self,
        username: &str,
        apply: impl FnOnce(&mut LocalProfileFile),
    ) -> StoreResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut profile = self.read_profile(username)?;
        apply(&mut profile);
        profile.last_save_time = Utc::now().timestamp();
        self.write_profile(&profile)
    }

    /// Create a new profile.
    pub fn register(&self, username: &str, password: &str) -> StoreResult<UserData> {
        validate_name(username).map_err(StoreError::InvalidName)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.exists(username) {
            return Err(StoreError::UserExists(username.trim().to_string()));
        }

        let now = Utc::now().timestamp();
        let profile = LocalProfileFile {
            version: PROFILE_VERSION,
            username: username.trim().to_string(),
            password_hash: hash_password(password),
            created_at: now,
            last_save_time: now,
            total_games: 0,
            total_coins_earned: 0,
            data: UserData::default(),
        };
        self.write_profile(&profile)?;
        tracing::info!(username = %profile.username, "registered local profile");
        Ok(profile.data)
    }

    /// Check the password and return the stored profile.
    pub fn login(&self, username: &str, password: &str) -> StoreResult<UserData> {
        let profile = match self.read_profile(username) {
            Ok(p) => p,
            Err(StoreError::NotFound(_)) => return Err(StoreError::InvalidCredentials),
            Err(e) => return Err(e),
        };
        if profile.password_hash != hash_password(password) {
            return Err(StoreError::InvalidCredentials);
        }
        Ok(profile.data)
    }

    pub fn load(&self, username: &str) -> StoreResult<UserData> {
        Ok(self.read_profile(username)?.data)
    }

    /// Overwrite the game data of an existing profile.
    pub fn save(&self, username: &str, data: &UserData) -> StoreResult<()> {
        self.update_profile(username, |profile| profile.data = data.clone())
    }

    /// Remove a profile after checking its password.
    pub fn delete_user(&self, username: &str, password: &str) -> StoreResult<()> {
        self.login(username, password)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        fs::remove_file(self.path_for(username))?;
        tracing::info!(username = username.trim(), "deleted local profile");
        Ok(())
    }

    /// All profiles, most recently saved first. Unreadable files are listed
    /// as corrupted instead of failing the whole listing.
    pub fn list_users(&self) -> StoreResult<Vec<LocalUserInfo>> {
        let mut users = Vec::new();

        for entry in fs::read_dir(&self.profiles_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let filename = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_string();

            users.push(match self.read_file(&path) {
                Ok(profile) => LocalUserInfo {
                    username: profile.username,
                    filename,
                    best_score: profile.data.best_score,
                    coins: profile.data.coins,
                    last_save_time: profile.last_save_time,
                    is_corrupted: false,
                },
                Err(_) => LocalUserInfo {
                    username: "[CORRUPTED]".to_string(),
                    filename,
                    best_score: 0,
                    coins: 0,
                    last_save_time: 0,
                    is_corrupted: true,
                },
            });
        }

        users.sort_by(|a, b| b.last_save_time.cmp(&a.last_save_time));
        Ok(users)
    }

    /// Best scores across local profiles, highest first. Corrupted files
    /// are skipped.
    pub fn leaderboard(&self, limit: usize) -> StoreResult<Vec<LeaderboardEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.profiles_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Ok(profile) = self.read_file(&path) {
                entries.push(LeaderboardEntry {
                    username: profile.username,
                    best_score: profile.data.best_score,
                    total_coins_earned: profile.total_coins_earned,
                });
            }
        }

        entries.sort_by(|a, b| {
            b.best_score
                .cmp(&a.best_score)
                .then_with(|| a.username.cmp(&b.username))
        });
        entries.truncate(limit);
        Ok(entries)
    }
}

impl ProfileStore for LocalStore {
    fn save_user_data(&self, user_id: &str, data: &UserData) -> StoreResult<()> {
        self.save(user_id, data)
    }

    fn save_theme(&self, user_id: &str, theme: &str) -> StoreResult<()> {
        self.update_profile(user_id, |profile| {
            profile.data.current_theme = theme.to_string()
        })
    }

    fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats> {
        let profile = self.read_profile(user_id)?;
        Ok(UserStats {
            coins: profile.data.coins,
            best_score: profile.data.best_score,
            total_games: profile.total_games,
            total_coins_earned: profile.total_coins_earned,
            current_theme: Some(profile.data.current_theme),
        })
    }

    fn save_game_session(&self, user_id: &str, session: &GameSessionRecord) -> StoreResult<()> {
        self.update_profile(user_id, |profile| {
            profile.total_games += 1;
            profile.total_coins_earned += session.coins_collected as u64;
        })
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if trimmed.len() > 16 {
        return Err("Name must be 16 characters or less".to_string());
    }

    let valid_chars = trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_');

    if !valid_chars {
        return Err(
            "Name can only contain letters, numbers, spaces, hyphens, and underscores".to_string(),
        );
    }

    Ok(())
}

/// File stem for a username.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
