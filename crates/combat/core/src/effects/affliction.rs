use strum::{Display, EnumIter, IntoStaticStr};

/// Timed debuffs a combatant can carry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AfflictionKind {
    #[strum(to_string = "Bitten")]
    Bitten,
    #[strum(to_string = "Broken Arm")]
    BrokenArm,
    #[strum(to_string = "Burning")]
    Burning,
}

impl AfflictionKind {
    pub const ALL: [Self; 3] = [Self::Bitten, Self::BrokenArm, Self::Burning];

    /// Cooldown key under which the affliction's expiry is stored.
    pub const fn cooldown_key(&self) -> &'static str {
        match self {
            Self::Bitten => "affliction:bitten",
            Self::BrokenArm => "affliction:broken-arm",
            Self::Burning => "affliction:burning",
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn cooldown_keys_are_distinct() {
        let keys: std::collections::HashSet<_> =
            AfflictionKind::iter().map(|a| a.cooldown_key()).collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(AfflictionKind::BrokenArm.to_string(), "Broken Arm");
    }
}
