use crate::error::{ErrorCode, Result};
use crate::{SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use serde::Serialize;
use std::fmt;

//
// ──────────────────────────────────────────────────────────────────────────────
// Stake lock
// ──────────────────────────────────────────────────────────────────────────────
//

/// Derived lock state of a user's stake.
///
/// Nothing drives the `Locked -> Unlocked` transition except time: the state
/// is recomputed from `unlockTime(user)` and the wall clock on every tick and
/// discarded afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    /// No unlock timestamp recorded (zero).
    NoStake,
    /// `now < unlock_timestamp`.
    Locked { seconds_remaining: u64 },
    /// `now >= unlock_timestamp`.
    Unlocked,
}

impl LockState {
    pub fn at(unlock_timestamp: u64, now: u64) -> Self {
        if unlock_timestamp == 0 {
            LockState::NoStake
        } else if now < unlock_timestamp {
            LockState::Locked {
                seconds_remaining: unlock_timestamp - now,
            }
        } else {
            LockState::Unlocked
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked { .. })
    }

    pub fn can_unstake(&self) -> bool {
        matches!(self, LockState::Unlocked)
    }

    /// Client-side gate run before an unstake is submitted.
    pub fn ensure_unlocked(&self) -> Result<()> {
        match *self {
            LockState::Unlocked => Ok(()),
            LockState::Locked { seconds_remaining } => {
                Err(ErrorCode::StillLocked { seconds_remaining })
            }
            LockState::NoStake => Err(ErrorCode::NoActiveStake),
        }
    }

    pub fn countdown(&self) -> Option<Countdown> {
        match *self {
            LockState::Locked { seconds_remaining } => Some(Countdown::from_seconds(seconds_remaining)),
            _ => None,
        }
    }

    pub fn status_label(&self) -> String {
        match self {
            LockState::NoStake => "NO ACTIVE STAKE".to_string(),
            LockState::Unlocked => "UNLOCKED & READY".to_string(),
            LockState::Locked { .. } => match self.countdown() {
                Some(countdown) => format!("LOCKED {}", countdown),
                None => "LOCKED".to_string(),
            },
        }
    }
}

/// Remaining lock time split into whole days, hours and minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

impl Countdown {
    pub fn from_seconds(seconds: u64) -> Self {
        Countdown {
            days: seconds / SECONDS_PER_DAY,
            hours: (seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            minutes: (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D:{}H:{}M", self.days, self.hours, self.minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_760_000_000;

    #[test]
    fn zero_timestamp_means_no_stake() {
        assert_eq!(LockState::at(0, NOW), LockState::NoStake);
        assert_eq!(LockState::NoStake.status_label(), "NO ACTIVE STAKE");
        assert_eq!(LockState::NoStake.ensure_unlocked(), Err(ErrorCode::NoActiveStake));
    }

    #[test]
    fn past_timestamp_is_unlocked() {
        let state = LockState::at(NOW - 10, NOW);
        assert_eq!(state, LockState::Unlocked);
        assert!(state.can_unstake());
        assert_eq!(state.status_label(), "UNLOCKED & READY");
        assert_eq!(LockState::at(NOW, NOW), LockState::Unlocked);
    }

    #[test]
    fn future_timestamp_counts_down() {
        let state = LockState::at(NOW + 172_800, NOW);
        assert_eq!(
            state,
            LockState::Locked {
                seconds_remaining: 172_800
            }
        );
        assert!(!state.can_unstake());
        assert_eq!(state.status_label(), "LOCKED 2D:0H:0M");
        assert_eq!(
            state.ensure_unlocked(),
            Err(ErrorCode::StillLocked {
                seconds_remaining: 172_800
            })
        );
    }

    #[test]
    fn countdown_splits_units() {
        let seconds = 3 * SECONDS_PER_DAY + 4 * SECONDS_PER_HOUR + 5 * SECONDS_PER_MINUTE + 59;
        assert_eq!(
            Countdown::from_seconds(seconds),
            Countdown {
                days: 3,
                hours: 4,
                minutes: 5
            }
        );
        assert_eq!(Countdown::from_seconds(59).to_string(), "0D:0H:0M");
    }
}
