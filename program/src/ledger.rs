use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    state::{RaffleConfig, RoundState},
};

impl RoundState {
    /// Admits one entry worth `value` lamports for `participant`.
    ///
    /// The payment is checked before the round phase, so an underpaid entry
    /// reports `InsufficientPayment` even while a draw is in flight.
    pub fn admit_entry(
        &mut self,
        config: &RaffleConfig,
        participant: Pubkey,
        value: u64,
    ) -> Result<RaffleEvent, RaffleError> {
        if value < config.entrance_fee {
            msg!(
                "Entry of {} lamports is below the entrance fee of {}",
                value,
                config.entrance_fee
            );
            return Err(RaffleError::InsufficientPayment);
        }

        if !self.is_open() {
            msg!("Round is drawing, entry rejected");
            return Err(RaffleError::RoundNotOpen);
        }

        if self.participants.len() >= config.max_participants as usize {
            msg!(
                "Round already holds {} entries, its capacity",
                self.participants.len()
            );
            return Err(RaffleError::RoundFull);
        }

        let pool = self
            .pool
            .checked_add(value)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        self.participants.push(participant);
        self.pool = pool;

        Ok(RaffleEvent::EntryAdmitted { participant, value })
    }
}
