//! Time-limited power-ups unlocked in the store.

use crate::constants::POWER_UP_DURATION_TICKS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerUpKind {
    SpeedBoost,
    Shield,
    CoinMagnet,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::Shield,
        PowerUpKind::CoinMagnet,
    ];

    /// Store item id that unlocks this power-up.
    pub fn item_id(&self) -> &'static str {
        match self {
            Self::SpeedBoost => "speed-boost",
            Self::Shield => "shield",
            Self::CoinMagnet => "coin-magnet",
        }
    }

    pub fn from_item_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.item_id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SpeedBoost => "Speed Boost",
            Self::Shield => "Shield",
            Self::CoinMagnet => "Coin Magnet",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::SpeedBoost => "\u{1F680}",
            Self::Shield => "\u{1F6E1}",
            Self::CoinMagnet => "\u{1F3AF}",
        }
    }

    /// Activation key shown in hints.
    pub fn key(&self) -> char {
        match self {
            Self::SpeedBoost => 'S',
            Self::Shield => 'H',
            Self::CoinMagnet => 'M',
        }
    }
}

/// Countdown for one power-up kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerUpTimer {
    pub active: bool,
    pub remaining_ticks: u32,
}

impl PowerUpTimer {
    /// Start (or restart) at full duration. Never stacks.
    fn activate(&mut self) {
        self.active = true;
        self.remaining_ticks = POWER_UP_DURATION_TICKS;
    }

    /// Returns true on the tick the timer runs out.
    fn tick(&mut self) -> bool {
        if self.remaining_ticks == 0 {
            return false;
        }
        self.remaining_ticks -= 1;
        if self.remaining_ticks == 0 {
            self.active = false;
            return true;
        }
        false
    }
}

/// State of all three power-ups. Kinds are fully independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerUps {
    pub speed_boost: PowerUpTimer,
    pub shield: PowerUpTimer,
    pub coin_magnet: PowerUpTimer,
}

impl PowerUps {
    fn timer(&self, kind: PowerUpKind) -> &PowerUpTimer {
        match kind {
            PowerUpKind::SpeedBoost => &self.speed_boost,
            PowerUpKind::Shield => &self.shield,
            PowerUpKind::CoinMagnet => &self.coin_magnet,
        }
    }

    fn timer_mut(&mut self, kind: PowerUpKind) -> &mut PowerUpTimer {
        match kind {
            PowerUpKind::SpeedBoost => &mut self.speed_boost,
            PowerUpKind::Shield => &mut self.shield,
            PowerUpKind::CoinMagnet => &mut self.coin_magnet,
        }
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.timer(kind).active
    }

    pub fn remaining_ticks(&self, kind: PowerUpKind) -> u32 {
        self.timer(kind).remaining_ticks
    }

    pub fn activate(&mut self, kind: PowerUpKind) {
        self.timer_mut(kind).activate();
    }

    /// Advance every countdown by one tick; returns the kinds that just expired.
    pub fn tick(&mut self) -> Vec<PowerUpKind> {
        PowerUpKind::ALL
            .into_iter()
            .filter(|&kind| self.timer_mut(kind).tick())
            .collect()
    }

    pub fn active_kinds(&self) -> Vec<PowerUpKind> {
        PowerUpKind::ALL
            .into_iter()
            .filter(|&kind| self.is_active(kind))
            .collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_roundtrip() {
        for kind in PowerUpKind::ALL {
            assert_eq!(PowerUpKind::from_item_id(kind.item_id()), Some(kind));
        }
        assert_eq!(PowerUpKind::from_item_id("rainbow-bird"), None);
    }

    #[test]
    fn test_expires_after_exact_duration() {
        let mut power_ups = PowerUps::default();
        power_ups.activate(PowerUpKind::Shield);

        for _ in 0..POWER_UP_DURATION_TICKS - 1 {
            assert!(power_ups.tick().is_empty());
            assert!(power_ups.is_active(PowerUpKind::Shield));
        }
        assert_eq!(power_ups.tick(), vec![PowerUpKind::Shield]);
        assert!(!power_ups.is_active(PowerUpKind::Shield));
        assert!(power_ups.tick().is_empty());
    }

    #[test]
    fn test_retrigger_resets_instead_of_stacking() {
        let mut power_ups = PowerUps::default();
        power_ups.activate(PowerUpKind::SpeedBoost);
        for _ in 0..100 {
            power_ups.tick();
        }
        power_ups.activate(PowerUpKind::SpeedBoost);
        assert_eq!(
            power_ups.remaining_ticks(PowerUpKind::SpeedBoost),
            POWER_UP_DURATION_TICKS
        );
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut power_ups = PowerUps::default();
        power_ups.activate(PowerUpKind::CoinMagnet);
        for _ in 0..10 {
            power_ups.tick();
        }
        power_ups.activate(PowerUpKind::Shield);
        assert_eq!(
            power_ups.remaining_ticks(PowerUpKind::CoinMagnet),
            POWER_UP_DURATION_TICKS - 10
        );
        assert_eq!(
            power_ups.active_kinds(),
            vec![PowerUpKind::Shield, PowerUpKind::CoinMagnet]
        );
        assert!(!power_ups.is_active(PowerUpKind::SpeedBoost));
    }
}
