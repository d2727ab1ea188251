//! Client for the hosted store (PostgREST tables plus two RPC functions).
//!
//! Every call is a single blocking request/response round trip. Nothing is
//! retried; failures come back as [`StoreError`] for the caller to log.

use super::records::*;
use super::{hash_password, ProfileStore, UserData};
use crate::achievements::Milestone;
use crate::config::RemoteConfig;
use crate::constants::{
    DEFAULT_THEME, GUEST_STARTING_COINS, POWER_UP_DURATION_TICKS, TICKS_PER_SECOND,
};
use crate::error::{StoreError, StoreResult};
use crate::game::PowerUpKind;
use crate::store::find_item;
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// PostgREST query-string builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn gte(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.to_string(), format!("gte.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params
            .push(("on_conflict".to_string(), columns.to_string()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.params
    }

    fn is_upsert(&self) -> bool {
        self.params.iter().any(|(k, _)| k == "on_conflict")
    }
}

pub struct RemoteClient {
    config: RemoteConfig,
    agent: ureq::Agent,
    // Catalog id -> hosted store item id.
    item_ids: Mutex<HashMap<String, String>>,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("flappy/", env!("CARGO_PKG_VERSION")))
                .build(),
            item_ids: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_env() -> StoreResult<Self> {
        RemoteConfig::from_env()
            .map(Self::new)
            .ok_or(StoreError::NotConfigured)
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.config.url, function)
    }

    fn request(&self, method: &str, url: &str, query: &Query) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, url)
            .set("apikey", &self.config.api_key)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .set("Content-Type", "application/json");
        for (key, value) in query.pairs() {
            request = request.query(key, value);
        }
        request
    }

    fn decode<T: DeserializeOwned>(response: ureq::Response) -> StoreResult<T> {
        response
            .into_json()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn select<T: DeserializeOwned>(&self, table: &str, query: Query) -> StoreResult<Vec<T>> {
        tracing::debug!(table, "select");
        let response = self.request("GET", &self.table_url(table), &query).call()?;
        Self::decode(response)
    }

    fn select_single<T: DeserializeOwned>(&self, table: &str, query: Query) -> StoreResult<T> {
        tracing::debug!(table, "select single");
        let response = self
            .request("GET", &self.table_url(table), &query)
            .set("Accept", SINGLE_OBJECT)
            .call()?;
        Self::decode(response)
    }

    fn insert<T: DeserializeOwned>(&self, table: &str, query: Query, row: Value) -> StoreResult<T> {
        tracing::debug!(table, upsert = query.is_upsert(), "insert");
        let response = self
            .request("POST", &self.table_url(table), &query)
            .set("Prefer", prefer_header(&query))
            .set("Accept", SINGLE_OBJECT)
            .send_json(row)?;
        Self::decode(response)
    }

    fn update(&self, table: &str, query: Query, changes: Value) -> StoreResult<()> {
        tracing::debug!(table, "update");
        self.request("PATCH", &self.table_url(table), &query)
            .set("Prefer", "return=minimal")
            .send_json(changes)?;
        Ok(())
    }

    fn rpc<T: DeserializeOwned>(&self, function: &str, args: Value) -> StoreResult<T> {
        tracing::debug!(function, "rpc");
        let response = self
            .request("POST", &self.rpc_url(function), &Query::new())
            .send_json(args)?;
        Self::decode(response)
    }

    // ── Users ────────────────────────────────────────────────────────────

    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> StoreResult<RemoteUser> {
        let row = new_user_row(username, password, email);
        self.insert("users", Query::new().select("*"), row)
    }

    /// Look the user up by email and password hash.
    pub fn login_user(&self, email: &str, password: &str) -> StoreResult<RemoteUser> {
        let query = Query::new()
            .select("*")
            .eq("email", email)
            .eq("password_hash", hash_password(password));
        match self.select_single("users", query) {
            // PostgREST answers 406 when the single-object request matched no row.
            Err(StoreError::Http { status: 406, .. }) => Err(StoreError::InvalidCredentials),
            other => other,
        }
    }

    /// There is no server-side session; always `None`.
    pub fn get_current_user(&self) -> StoreResult<Option<RemoteUser>> {
        Ok(None)
    }

    pub fn logout_user(&self) -> StoreResult<()> {
        Ok(())
    }

    pub fn create_guest_user(&self) -> StoreResult<RemoteUser> {
        let username = format!("Guest_{}", Utc::now().timestamp_millis());
        self.insert("users", Query::new().select("*"), guest_user_row(&username))
    }

    // ── Game data ────────────────────────────────────────────────────────

    /// Insert the run and fold it into the user's aggregates. Returns the
    /// new session id.
    pub fn save_game_session(
        &self,
        user_id: &str,
        session: &GameSessionRecord,
    ) -> StoreResult<String> {
        let row = json!({
            "user_id": user_id,
            "score": session.score,
            "coins_collected": session.coins_collected,
            "duration_seconds": session.duration_seconds,
            "pipes_passed": session.pipes_passed,
            "power_ups_used": session.power_ups_used,
        });
        let inserted: Value = self.insert("game_sessions", Query::new().select("id"), row)?;
        let id = match &inserted["id"] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => return Err(StoreError::Decode(format!("session id {}", other))),
        };

        self.update_user_stats(user_id, session.score, session.coins_collected as u64)?;
        Ok(id)
    }

    /// The function returns void, so the (empty) body is not decoded.
    pub fn update_user_stats(&self, user_id: &str, score: u32, coins: u64) -> StoreResult<()> {
        tracing::debug!(function = "update_user_stats", "rpc");
        self.request("POST", &self.rpc_url("update_user_stats"), &Query::new())
            .send_json(json!({ "p_user_id": user_id, "p_score": score, "p_coins": coins }))?;
        Ok(())
    }

    pub fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats> {
        self.select_single(
            "users",
            Query::new()
                .select("coins,best_score,total_games,total_coins_earned,current_theme")
                .eq("id", user_id),
        )
    }

    pub fn save_user_data(&self, user_id: &str, data: &UserData) -> StoreResult<()> {
        self.update(
            "users",
            user_query(user_id),
            json!({
                "best_score": data.best_score,
                "coins": data.coins,
                "current_theme": data.current_theme,
            }),
        )
    }

    // ── Store and purchases ──────────────────────────────────────────────

    /// Active items, cheapest first.
    pub fn get_store_items(&self) -> StoreResult<Vec<RemoteStoreItem>> {
        self.select(
            "store_items",
            Query::new()
                .select("*")
                .eq("is_active", true)
                .order("price", true),
        )
    }

    pub fn insert_store_item(&self, row: Value) -> StoreResult<RemoteStoreItem> {
        self.insert("store_items", Query::new().select("*"), row)
    }

    /// Server-side purchase; `Ok(false)` when the store refused it.
    pub fn purchase_item(&self, user_id: &str, item_id: &str) -> StoreResult<bool> {
        self.rpc(
            "purchase_item",
            json!({ "p_user_id": user_id, "p_item_id": item_id }),
        )
    }

    pub fn get_user_purchases(&self, user_id: &str) -> StoreResult<Vec<Purchase>> {
        self.select(
            "user_purchases",
            Query::new()
                .select("*,store_items(*)")
                .eq("user_id", user_id)
                .eq("purchase_status", "active"),
        )
    }

    pub fn get_user_inventory(&self, user_id: &str) -> StoreResult<Vec<InventoryEntry>> {
        self.select("user_inventory", inventory_query(user_id))
    }

    /// Hosted id of a catalog item. The item list is fetched once and kept.
    pub fn store_item_id(&self, catalog_id: &str) -> StoreResult<String> {
        if let Some(id) = self.item_ids().get(catalog_id) {
            return Ok(id.clone());
        }
        let items = self.get_store_items()?;
        let mut ids = self.item_ids();
        for item in items {
            ids.insert(item.slug(), item.id);
        }
        let id = ids.get(catalog_id).cloned();
        id.ok_or_else(|| StoreError::NotFound(format!("store item {}", catalog_id)))
    }

    fn item_ids(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.item_ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Themes ───────────────────────────────────────────────────────────

    /// All themes, default first.
    pub fn get_game_themes(&self) -> StoreResult<Vec<GameTheme>> {
        self.select(
            "game_themes",
            Query::new().select("*").order("is_default", false),
        )
    }

    pub fn update_user_theme(&self, user_id: &str, theme: &str) -> StoreResult<()> {
        self.update("users", user_query(user_id), json!({ "current_theme": theme }))
    }

    // ── Achievements and challenges ──────────────────────────────────────

    /// Newest first.
    pub fn get_user_achievements(&self, user_id: &str) -> StoreResult<Vec<Achievement>> {
        self.select("user_achievements", achievements_query(user_id))
    }

    /// Upsert progress for one achievement; completed once progress reaches the max.
    pub fn unlock_achievement(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        progress: u32,
        max_progress: u32,
    ) -> StoreResult<Achievement> {
        let (query, row) = achievement_upsert(user_id, name, description, progress, max_progress);
        self.insert("user_achievements", query, row)
    }

    /// Active challenges that have not ended yet.
    pub fn get_daily_challenges(&self) -> StoreResult<Vec<DailyChallenge>> {
        self.get_daily_challenges_on(Utc::now().date_naive())
    }

    pub fn get_daily_challenges_on(&self, today: NaiveDate) -> StoreResult<Vec<DailyChallenge>> {
        self.select("daily_challenges", daily_challenges_query(today))
    }

    pub fn get_user_challenge_progress(&self, user_id: &str) -> StoreResult<Vec<ChallengeProgress>> {
        self.select("user_challenge_progress", challenge_progress_query(user_id))
    }

    pub fn track_power_up_usage(&self, usage: &PowerUpUsage) -> StoreResult<Value> {
        let row = serde_json::to_value(usage)?;
        self.insert("power_up_usage", Query::new().select("*"), row)
    }

    // ── Leaderboard ──────────────────────────────────────────────────────

    pub fn get_leaderboard(&self, limit: usize) -> StoreResult<Vec<LeaderboardEntry>> {
        self.select(
            "users",
            Query::new()
                .select("username,best_score,total_coins_earned")
                .order("best_score", false)
                .limit(limit),
        )
    }
}

impl ProfileStore for RemoteClient {
    fn save_user_data(&self, user_id: &str, data: &UserData) -> StoreResult<()> {
        RemoteClient::save_user_data(self, user_id, data)
    }

    fn save_theme(&self, user_id: &str, theme: &str) -> StoreResult<()> {
        self.update_user_theme(user_id, theme)
    }

    fn get_user_stats(&self, user_id: &str) -> StoreResult<UserStats> {
        RemoteClient::get_user_stats(self, user_id)
    }

    fn save_game_session(&self, user_id: &str, session: &GameSessionRecord) -> StoreResult<()> {
        RemoteClient::save_game_session(self, user_id, session).map(|_| ())
    }

    fn record_power_up(&self, user_id: &str, kind: PowerUpKind) -> StoreResult<()> {
        let item_id = self.store_item_id(kind.item_id())?;
        self.track_power_up_usage(&power_up_usage(user_id, &item_id, kind))?;
        Ok(())
    }

    fn record_milestone(
        &self,
        user_id: &str,
        milestone: &Milestone,
        progress: u32,
    ) -> StoreResult<()> {
        self.unlock_achievement(
            user_id,
            milestone.name,
            milestone.description,
            progress,
            milestone.target,
        )?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}

fn new_user_row(username: &str, password: &str, email: Option<&str>) -> Value {
    let email = email
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}@flappybird.local", username));
    json!({
        "username": username,
        "email": email,
        "password_hash": hash_password(password),
    })
}

fn guest_user_row(username: &str) -> Value {
    json!({
        "username": username,
        "password_hash": "guest",
        "is_guest": true,
        "coins": GUEST_STARTING_COINS,
        "best_score": 0,
        "current_theme": DEFAULT_THEME,
    })
}

fn prefer_header(query: &Query) -> &'static str {
    if query.is_upsert() {
        "return=representation,resolution=merge-duplicates"
    } else {
        "return=representation"
    }
}

fn user_query(user_id: &str) -> Query {
    Query::new().eq("id", user_id)
}

fn inventory_query(user_id: &str) -> Query {
    Query::new()
        .select("*,store_items(*)")
        .eq("user_id", user_id)
}

fn achievements_query(user_id: &str) -> Query {
    Query::new()
        .select("*")
        .eq("user_id", user_id)
        .order("earned_at", false)
}

fn achievement_upsert(
    user_id: &str,
    name: &str,
    description: &str,
    progress: u32,
    max_progress: u32,
) -> (Query, Value) {
    let query = Query::new()
        .select("*")
        .on_conflict("user_id,achievement_name");
    let row = json!({
        "user_id": user_id,
        "achievement_name": name,
        "description": description,
        "progress": progress,
        "max_progress": max_progress,
        "is_completed": progress >= max_progress,
    });
    (query, row)
}

fn daily_challenges_query(today: NaiveDate) -> Query {
    Query::new()
        .select("*")
        .eq("is_active", true)
        .gte("end_date", today.format("%Y-%m-%d"))
}

fn challenge_progress_query(user_id: &str) -> Query {
    Query::new()
        .select("*,daily_challenges(*)")
        .eq("user_id", user_id)
}

/// Usage row for one activation; the run has no session id yet.
fn power_up_usage(user_id: &str, item_id: &str, kind: PowerUpKind) -> PowerUpUsage {
    let effect_value = find_item(kind.item_id())
        .and_then(|item| serde_json::from_str(item.effects).ok())
        .unwrap_or(Value::Null);
    PowerUpUsage {
        user_id: user_id.to_string(),
        item_id: item_id.to_string(),
        game_session_id: None,
        effect_duration: POWER_UP_DURATION_TICKS * 1000 / TICKS_PER_SECOND,
        effect_value,
    }
}
