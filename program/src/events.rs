use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// Notifications published by the raffle.
///
/// Each event is logged in readable form and as a Borsh-encoded
/// `Program data:` entry for indexers.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    EntryAdmitted {
        participant: Pubkey,
        value: u64,
    },
    /// Emitted by the oracle client for the off-chain VRF operator
    RandomWordsRequested {
        request_id: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_compute_limit: u32,
        num_words: u32,
    },
    DrawRequested {
        request_id: u64,
    },
    WinnerSelected {
        winner: Pubkey,
        prize: u64,
    },
}

impl RaffleEvent {
    pub fn emit(&self) {
        match self {
            RaffleEvent::EntryAdmitted { participant, value } => {
                msg!("EntryAdmitted: participant={}, value={}", participant, value)
            }
            RaffleEvent::RandomWordsRequested {
                request_id,
                num_words,
                ..
            } => msg!(
                "RandomWordsRequested: request_id={}, num_words={}",
                request_id,
                num_words
            ),
            RaffleEvent::DrawRequested { request_id } => {
                msg!("DrawRequested: request_id={}", request_id)
            }
            RaffleEvent::WinnerSelected { winner, prize } => {
                msg!("WinnerSelected: winner={}, prize={}", winner, prize)
            }
        }

        if let Ok(data) = self.try_to_vec() {
            sol_log_data(&[&data]);
        }
    }
}
