//! Items sold in the store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Skin,
    Effect,
    Powerup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

impl Rarity {
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
        }
    }
}

/// A catalog entry. `id` is the key stored in the purchased-items set.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub item_type: ItemType,
    pub price: u64,
    pub icon: &'static str,
    pub rarity: Rarity,
    /// Effect payload as stored in the hosted `store_items.effects` column.
    pub effects: &'static str,
}

/// The built-in catalog, cheapest first.
pub static CATALOG: [StoreItem; 6] = [
    StoreItem {
        id: "rainbow-bird",
        name: "Rainbow Bird",
        description: "A colorful rainbow bird skin",
        item_type: ItemType::Skin,
        price: 25,
        icon: "\u{1F3A8}",
        rarity: Rarity::Common,
        effects: r#"{"color":"rainbow","animation":"rainbow"}"#,
    },
    StoreItem {
        id: "speed-boost",
        name: "Speed Boost",
        description: "Temporary speed boost power-up",
        item_type: ItemType::Powerup,
        price: 35,
        icon: "\u{1F680}",
        rarity: Rarity::Common,
        effects: r#"{"speed_multiplier":1.5,"duration":10}"#,
    },
    StoreItem {
        id: "golden-wings",
        name: "Golden Wings",
        description: "Shiny golden wing effects",
        item_type: ItemType::Effect,
        price: 50,
        icon: "\u{2B50}",
        rarity: Rarity::Rare,
        effects: r#"{"wings":"golden","sparkle":true}"#,
    },
    StoreItem {
        id: "coin-magnet",
        name: "Coin Magnet",
        description: "Attracts coins from a distance",
        item_type: ItemType::Powerup,
        price: 60,
        icon: "\u{1F3AF}",
        rarity: Rarity::Rare,
        effects: r#"{"magnet_radius":100,"duration":15}"#,
    },
    StoreItem {
        id: "shield",
        name: "Shield",
        description: "Protection from one collision",
        item_type: ItemType::Powerup,
        price: 75,
        icon: "\u{1F6E1}",
        rarity: Rarity::Rare,
        effects: r#"{"protection":1,"duration":30}"#,
    },
    StoreItem {
        id: "diamond-bird",
        name: "Diamond Bird",
        description: "A sparkling diamond bird",
        item_type: ItemType::Skin,
        price: 100,
        icon: "\u{1F48E}",
        rarity: Rarity::Epic,
        effects: r#"{"color":"diamond","sparkle":true}"#,
    },
];

pub fn find_item(id: &str) -> Option<&'static StoreItem> {
    CATALOG.iter().find(|item| item.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::PowerUpKind;

    #[test]
    fn test_catalog_sorted_by_price() {
        for pair in CATALOG.windows(2) {
            assert!(pair[0].price <= pair[1].price);
        }
    }

    #[test]
    fn test_every_power_up_is_sold() {
        for kind in PowerUpKind::ALL {
            let item = find_item(kind.item_id()).expect("power-up missing from catalog");
            assert_eq!(item.item_type, ItemType::Powerup);
        }
    }

    #[test]
    fn test_effects_are_valid_json() {
        for item in &CATALOG {
            let parsed: serde_json::Value =
                serde_json::from_str(item.effects).expect("effects must be JSON");
            assert!(parsed.is_object());
        }
    }
}
