//! Persisted combatant rows.

use super::PlayerId;

/// Persisted state of a player combatant.
///
/// Health is always kept within `[0, max_health]`; a combatant at zero health
/// is dead and takes no further part in an exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantState {
    pub id: PlayerId,
    pub health: u32,
    pub max_health: u32,
    /// Set while the player is engaged in a duel.
    pub in_combat: bool,
    pub kills: u32,
    pub boss_kills: u32,
    pub deaths: u32,
    pub xp: u64,
}

impl CombatantState {
    pub fn new(id: PlayerId, max_health: u32) -> Self {
        Self {
            id,
            health: max_health,
            max_health,
            in_combat: false,
            kills: 0,
            boss_kills: 0,
            deaths: 0,
            xp: 0,
        }
    }

    pub fn with_health(mut self, health: u32) -> Self {
        self.health = health.min(self.max_health);
        self
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Health still missing from the maximum.
    pub fn missing_health(&self) -> u32 {
        self.max_health.saturating_sub(self.health)
    }

    /// Applies a signed health change, clamped to `[0, max_health]`.
    ///
    /// Returns the new health value.
    pub fn apply_health_delta(&mut self, delta: i64) -> u32 {
        self.health = clamp_health(self.health, delta, self.max_health);
        self.health
    }
}

/// Clamps `health + delta` into `[0, max]`.
pub fn clamp_health(health: u32, delta: i64, max: u32) -> u32 {
    (i64::from(health) + delta).clamp(0, i64::from(max)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_delta_is_clamped() {
        let mut row = CombatantState::new(PlayerId(1), 100).with_health(30);
        assert_eq!(row.apply_health_delta(-45), 0);
        assert!(row.is_dead());
        assert_eq!(row.apply_health_delta(500), 100);
        assert_eq!(row.missing_health(), 0);
    }
}
