//! Turn ordering.
//!
//! Every entry draws one tiebreak value, in input order, before sorting. The
//! resulting order is fixed for the whole turn.

use rand::Rng;

/// One combatant's slot in the turn list.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnEntry<T> {
    pub actor: T,
    pub speed: u32,
    pub tiebreak: f64,
}

/// Order `entries` by speed (descending), ties broken by a fresh random draw.
///
/// # Arguments
///
/// * `entries` - `(actor, speed)` pairs; the NPC first, then players
/// * `rng` - Random source for the tiebreak draws
///
/// # Returns
///
/// The entries in resolution order, tiebreaks included for logging.
pub fn order_turn<T, R: Rng + ?Sized>(entries: Vec<(T, u32)>, rng: &mut R) -> Vec<TurnEntry<T>> {
    let mut ordered: Vec<TurnEntry<T>> = entries
        .into_iter()
        .map(|(actor, speed)| TurnEntry {
            actor,
            speed,
            tiebreak: rng.r#gen::<f64>(),
        })
        .collect();

    ordered.sort_by(|a, b| {
        b.speed
            .cmp(&a.speed)
            .then_with(|| b.tiebreak.total_cmp(&a.tiebreak))
    });
    ordered
}
