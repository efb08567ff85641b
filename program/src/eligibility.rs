use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;

use crate::state::{RaffleConfig, RoundState};

/// Why a round can or cannot be drawn, in evaluation order.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EligibilityReason {
    Eligible,
    NotOpen,
    IntervalNotElapsed,
    NoParticipants,
    EmptyPool,
}

/// Answer to an upkeep check, published as return data by `CheckUpkeep`.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: EligibilityReason,
}

impl Eligibility {
    fn rejected(reason: EligibilityReason) -> Self {
        Self {
            eligible: false,
            reason,
        }
    }
}

impl RoundState {
    /// Reports whether a draw may start at `now`.
    ///
    /// Checks run in a fixed order (phase, elapsed time, participants, pool)
    /// and the first failing one is reported.
    pub fn check_eligibility(&self, config: &RaffleConfig, now: UnixTimestamp) -> Eligibility {
        if !self.is_open() {
            return Eligibility::rejected(EligibilityReason::NotOpen);
        }

        // A clock reading behind the last draw counts as not elapsed.
        let elapsed = now.saturating_sub(self.last_draw_timestamp);
        let interval = i64::try_from(config.interval).unwrap_or(i64::MAX);
        if elapsed < interval {
            return Eligibility::rejected(EligibilityReason::IntervalNotElapsed);
        }

        if self.participants.is_empty() {
            return Eligibility::rejected(EligibilityReason::NoParticipants);
        }

        if self.pool == 0 {
            return Eligibility::rejected(EligibilityReason::EmptyPool);
        }

        Eligibility {
            eligible: true,
            reason: EligibilityReason::Eligible,
        }
    }
}
