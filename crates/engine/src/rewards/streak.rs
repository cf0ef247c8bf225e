//! Streak normalization and the activity gate
//!
//! Pure functions over [`PlayerRewardState`]; the service supplies the
//! calendar date and the live balance.

use chrono::{Duration, NaiveDate};
use loyalty_core::PlayerRewardState;

/// State as it should be read on `today`.
///
/// A claim older than yesterday breaks the streak, and a completed cycle
/// starts over. `last_claimed` is kept so same-day checks still work.
pub fn effective_state(
    stored: &PlayerRewardState,
    today: NaiveDate,
    cycle_len: usize,
) -> PlayerRewardState {
    let mut state = stored.clone();

    if let Some(last) = state.last_claimed {
        let day = last.date_naive();
        let yesterday = today - Duration::days(1);
        if day != today && day != yesterday {
            state.streak = 0;
            state.last_balance = None;
        }
    }

    if state.streak as usize >= cycle_len {
        state.streak = 0;
        state.last_balance = None;
    }

    state
}

/// Whether the last claim fell on `day`
pub fn claimed_on(state: &PlayerRewardState, day: NaiveDate) -> bool {
    state
        .last_claimed
        .map_or(false, |last| last.date_naive() == day)
}

/// What the activity gate needs to decide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityGate {
    /// First claim of a cycle, or nothing tracked yet
    Open,
    /// Claim allowed only if the balance moved away from this value
    BalanceMustDiffer(i64),
}

impl ActivityGate {
    pub fn for_state(effective: &PlayerRewardState) -> Self {
        match effective.last_balance {
            Some(last) if effective.streak > 0 => ActivityGate::BalanceMustDiffer(last),
            _ => ActivityGate::Open,
        }
    }

    pub fn permits(&self, current_balance: i64) -> bool {
        match self {
            ActivityGate::Open => true,
            ActivityGate::BalanceMustDiffer(last) => current_balance != *last,
        }
    }
}
