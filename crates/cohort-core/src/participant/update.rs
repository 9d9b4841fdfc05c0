//! Deterministic state initialization and update rules.

use cohort_storage::ParticipantId;

/// How a participant's data vector is initialized and advanced.
///
/// Both functions must be pure: the same identity, position and prior
/// value always produce the same result.
pub trait UpdateRule: Send + Sync {
    /// Initial value at `position` for a fresh start.
    ///
    /// Defaults to `rank * 10 + position`.
    fn initial_value(&self, participant: ParticipantId, position: usize) -> i64 {
        let position = i64::try_from(position).unwrap_or(i64::MAX);
        i64::from(participant.0)
            .wrapping_mul(10)
            .wrapping_add(position)
    }

    /// Value at `position` after one more iteration.
    fn advance(&self, participant: ParticipantId, position: usize, value: i64) -> i64;
}

/// Adds `rank + 1` to every element each iteration.
#[derive(Debug, Default, Clone, Copy)]
pub struct RankIncrement;

impl UpdateRule for RankIncrement {
    fn advance(&self, participant: ParticipantId, _position: usize, value: i64) -> i64 {
        value.wrapping_add(i64::from(participant.0) + 1)
    }
}

/// Fresh-start data vector of length `len` for `participant`.
pub fn initial_data(rule: &dyn UpdateRule, participant: ParticipantId, len: usize) -> Vec<i64> {
    (0..len)
        .map(|position| rule.initial_value(participant, position))
        .collect()
}
