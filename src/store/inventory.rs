//! Purchased items and the local purchase rules.

use super::items::{find_item, StoreItem};
use crate::error::StoreError;
use crate::game::PowerUpKind;
use crate::persistence::UserData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Item ids the player owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchasedItems(BTreeSet<String>);

impl PurchasedItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.0.contains(item_id)
    }

    pub fn owns_power_up(&self, kind: PowerUpKind) -> bool {
        self.contains(kind.item_id())
    }

    /// Returns false if the item was already owned.
    pub fn insert(&mut self, item_id: impl Into<String>) -> bool {
        self.0.insert(item_id.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn has_power_ups(&self) -> bool {
        PowerUpKind::ALL.iter().any(|k| self.owns_power_up(*k))
    }
}

impl<S: Into<String>> FromIterator<S> for PurchasedItems {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Buy a catalog item with the profile's coins.
pub fn purchase_item(
    profile: &mut UserData,
    item_id: &str,
) -> Result<&'static StoreItem, StoreError> {
    let item = find_item(item_id).ok_or_else(|| StoreError::UnknownItem(item_id.to_string()))?;
    if profile.purchased_items.contains(item.id) {
        return Err(StoreError::AlreadyOwned(item.id.to_string()));
    }
    if profile.coins < item.price {
        return Err(StoreError::InsufficientCoins {
            needed: item.price,
            available: profile.coins,
        });
    }
    profile.coins -= item.price;
    profile.purchased_items.insert(item.id);
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_deducts_coins() {
        let mut profile = UserData {
            coins: 100,
            ..UserData::default()
        };
        let item = purchase_item(&mut profile, "shield").unwrap();
        assert_eq!(item.price, 75);
        assert_eq!(profile.coins, 25);
        assert!(profile.purchased_items.owns_power_up(PowerUpKind::Shield));
    }

    #[test]
    fn test_purchase_rejects_duplicates() {
        let mut profile = UserData {
            coins: 500,
            ..UserData::default()
        };
        purchase_item(&mut profile, "rainbow-bird").unwrap();
        let err = purchase_item(&mut profile, "rainbow-bird").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyOwned(_)));
        assert_eq!(profile.coins, 475);
    }

    #[test]
    fn test_purchase_requires_coins() {
        let mut profile = UserData {
            coins: 10,
            ..UserData::default()
        };
        let err = purchase_item(&mut profile, "diamond-bird").unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientCoins {
                needed: 100,
                available: 10
            }
        ));
        assert!(profile.purchased_items.is_empty());
    }

    #[test]
    fn test_unknown_item() {
        let mut profile = UserData::default();
        assert!(matches!(
            purchase_item(&mut profile, "jetpack"),
            Err(StoreError::UnknownItem(_))
        ));
    }

    #[test]
    fn test_purchased_items_serialize_as_list() {
        let items: PurchasedItems = ["shield", "coin-magnet"].into_iter().collect();
        let json = serde_json::to_string(&items).unwrap();
        assert_eq!(json, r#"["coin-magnet","shield"]"#);
        assert!(items.has_power_ups());
    }
}
