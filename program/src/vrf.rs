// Randomness oracle client for the raffle program
use solana_program::{msg, program_error::ProgramError};

use crate::{error::RaffleError, events::RaffleEvent, state::OracleConfig};

/// Request side of an external verifiable random function service.
///
/// The answer arrives later, out of band, as a fulfillment carrying the
/// identifier returned here.
pub trait RandomnessOracle {
    fn request_random_words(&mut self, num_words: u32) -> Result<u64, ProgramError>;
}

/// Oracle client backed by the program's oracle account.
///
/// Requests are published as `RandomWordsRequested` events; identifiers are
/// handed out sequentially starting at 1.
pub struct OracleClient<'a> {
    config: &'a mut OracleConfig,
}

impl<'a> OracleClient<'a> {
    pub fn new(config: &'a mut OracleConfig) -> Self {
        Self { config }
    }
}

impl RandomnessOracle for OracleClient<'_> {
    fn request_random_words(&mut self, num_words: u32) -> Result<u64, ProgramError> {
        if num_words == 0 {
            msg!("At least one random word must be requested");
            return Err(ProgramError::InvalidArgument);
        }

        let request_id = self.config.next_request_id;
        self.config.next_request_id = request_id
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        RaffleEvent::RandomWordsRequested {
            request_id,
            key_hash: self.config.key_hash,
            subscription_id: self.config.subscription_id,
            request_confirmations: self.config.request_confirmations,
            callback_compute_limit: self.config.callback_compute_limit,
            num_words,
        }
        .emit();

        Ok(request_id)
    }
}

/// Maps a random word onto a participant index.
pub fn winner_index(random_word: u64, participant_count: usize) -> Option<usize> {
    if participant_count == 0 {
        return None;
    }
    // The remainder is below `participant_count`, so it fits in usize.
    Some((random_word % participant_count as u64) as usize)
}
