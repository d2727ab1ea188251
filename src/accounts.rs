//! Turning credentials into a ready [`Session`], and buying items for an
//! account outside of play.

use crate::error::{StoreError, StoreResult};
use crate::persistence::{
    Achievement, ChallengeProgress, DailyChallenge, InventoryEntry, LocalStore, ProfileStore,
    Purchase, RemoteClient, RemoteUser, UserData, UserStats,
};
use crate::session::{Account, Session};
use crate::store::{self, find_item, PurchasedItems, StoreItem, CATALOG};
use std::sync::Arc;

/// Profile as the hosted store reports it, with owned items keyed by the
/// local catalog id.
pub fn profile_from_remote(user: &RemoteUser, purchases: &[Purchase]) -> UserData {
    let purchased_items: PurchasedItems = purchases
        .iter()
        .filter_map(|p| p.store_items.as_ref())
        .map(|item| item.slug())
        .filter(|slug| find_item(slug).is_some())
        .collect();

    UserData {
        best_score: user.best_score,
        coins: user.coins,
        current_theme: user
            .current_theme
            .clone()
            .unwrap_or_else(|| UserData::default().current_theme),
        purchased_items,
    }
}

pub fn local_session(store: Arc<LocalStore>, username: &str, password: &str) -> StoreResult<Session> {
    let profile = store.login(username, password)?;
    tracing::info!(username, "signed in with local profile");
    let store: Arc<dyn ProfileStore> = store;
    Ok(Session::new(
        Account::Local {
            username: username.trim().to_string(),
        },
        profile,
        Some(store),
    ))
}

pub fn remote_session(client: Arc<RemoteClient>, email: &str, password: &str) -> StoreResult<Session> {
    let user = client.login_user(email, password)?;
    let purchases = client.get_user_purchases(&user.id).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load purchases");
        Vec::new()
    });
    tracing::info!(username = %user.username, "signed in with hosted profile");
    Ok(remote_user_session(client, user, &purchases))
}

/// A throwaway guest row on the hosted store, so the run still counts.
pub fn remote_guest_session(client: Arc<RemoteClient>) -> StoreResult<Session> {
    let user = client.create_guest_user()?;
    tracing::info!(username = %user.username, "created hosted guest");
    Ok(remote_user_session(client, user, &[]))
}

fn remote_user_session(client: Arc<RemoteClient>, user: RemoteUser, purchases: &[Purchase]) -> Session {
    let profile = profile_from_remote(&user, purchases);
    let store: Arc<dyn ProfileStore> = client;
    Session::new(
        Account::Remote {
            id: user.id,
            username: user.username,
        },
        profile,
        Some(store),
    )
}

/// Buy with a local profile: coins are deducted and the profile saved.
pub fn buy_local(
    store: &LocalStore,
    username: &str,
    password: &str,
    item_id: &str,
) -> StoreResult<(&'static StoreItem, UserData)> {
    let mut profile = store.login(username, password)?;
    let item = store::purchase_item(&mut profile, item_id)?;
    store.save(username, &profile)?;
    tracing::info!(username, item = item.id, coins_left = profile.coins, "item purchased");
    Ok((item, profile))
}

/// Buy through the hosted store's purchase function.
pub fn buy_remote(
    client: &RemoteClient,
    email: &str,
    password: &str,
    item_id: &str,
) -> StoreResult<&'static StoreItem> {
    let item = find_item(item_id).ok_or_else(|| StoreError::UnknownItem(item_id.to_string()))?;
    let user = client.login_user(email, password)?;
    let remote_id = client.store_item_id(item.id)?;

    if !client.purchase_item(&user.id, &remote_id)? {
        return Err(StoreError::PurchaseRejected);
    }
    tracing::info!(username = %user.username, item = item.id, "item purchased");
    Ok(item)
}

/// Catalog items a local profile owns, in catalog order.
pub fn local_inventory(
    store: &LocalStore,
    username: &str,
    password: &str,
) -> StoreResult<Vec<&'static StoreItem>> {
    let profile = store.login(username, password)?;
    Ok(owned_items(&profile.purchased_items))
}

fn owned_items(owned: &PurchasedItems) -> Vec<&'static StoreItem> {
    CATALOG.iter().filter(|item| owned.contains(item.id)).collect()
}

pub fn remote_inventory(
    client: &RemoteClient,
    email: &str,
    password: &str,
) -> StoreResult<Vec<InventoryEntry>> {
    let user = client.login_user(email, password)?;
    client.get_user_inventory(&user.id)
}

/// Stats plus achievements and challenges of a hosted account.
#[derive(Debug, Clone)]
pub struct RemoteProfile {
    pub user: RemoteUser,
    pub stats: UserStats,
    pub achievements: Vec<Achievement>,
    pub challenges: Vec<DailyChallenge>,
    pub progress: Vec<ChallengeProgress>,
}

impl RemoteProfile {
    /// Progress on a challenge, zero when the user has not started it.
    pub fn progress_on(&self, challenge_id: &str) -> u32 {
        self.progress
            .iter()
            .find(|p| p.challenge_id == challenge_id)
            .map_or(0, |p| p.progress)
    }
}

pub fn remote_profile(client: &RemoteClient, email: &str, password: &str) -> StoreResult<RemoteProfile> {
    let user = client.login_user(email, password)?;
    Ok(RemoteProfile {
        stats: client.get_user_stats(&user.id)?,
        achievements: client.get_user_achievements(&user.id)?,
        challenges: client.get_daily_challenges()?,
        progress: client.get_user_challenge_progress(&user.id)?,
        user,
    })
}

pub fn local_stats(store: &LocalStore, username: &str, password: &str) -> StoreResult<UserStats> {
    store.login(username, password)?;
    store.get_user_stats(username)
}
