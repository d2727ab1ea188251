//! Store catalog and the player's purchases.

pub mod inventory;
pub mod items;

pub use inventory::*;
pub use items::*;
