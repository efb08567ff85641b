use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    borsh::try_from_slice_unchecked,
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::error::RaffleError;

/// Default number of block confirmations the oracle waits before answering.
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;

/// Largest account a program can allocate through a cross-program invocation.
pub const MAX_ROUND_ACCOUNT_LEN: usize = 10_240;

/// Deployment configuration of the raffle, fixed at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Account that paid for and initialized the raffle; recorded for
    /// clients, no instruction is gated on it
    pub admin: Pubkey,
    /// Minimum value in lamports accepted for one entry
    pub entrance_fee: u64,
    /// Minimum number of seconds between two draws
    pub interval: u64,
    /// Number of random words requested per draw
    pub num_words: u32,
    /// Entries a single round accepts; the round account is sized for it
    pub max_participants: u32,
}

impl RaffleConfig {
    pub fn new(
        admin: Pubkey,
        entrance_fee: u64,
        interval: u64,
        num_words: u32,
        max_participants: u32,
    ) -> Self {
        Self {
            is_initialized: true,
            admin,
            entrance_fee,
            interval,
            num_words,
            max_participants,
        }
    }
}

impl Sealed for RaffleConfig {}

impl IsInitialized for RaffleConfig {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for RaffleConfig {
    const LEN: usize = 1 + 32 + 8 + 8 + 4 + 4;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RaffleConfig::LEN];
        let (is_initialized, admin, entrance_fee, interval, num_words, max_participants) =
            array_refs![src, 1, 32, 8, 8, 4, 4];

        let is_initialized = match is_initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(RaffleConfig {
            is_initialized,
            admin: Pubkey::new_from_array(*admin),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: u64::from_le_bytes(*interval),
            num_words: u32::from_le_bytes(*num_words),
            max_participants: u32::from_le_bytes(*max_participants),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RaffleConfig::LEN];
        let (
            is_initialized_dst,
            admin_dst,
            entrance_fee_dst,
            interval_dst,
            num_words_dst,
            max_participants_dst,
        ) = mut_array_refs![dst, 1, 32, 8, 8, 4, 4];

        is_initialized_dst[0] = self.is_initialized as u8;
        admin_dst.copy_from_slice(self.admin.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *num_words_dst = self.num_words.to_le_bytes();
        *max_participants_dst = self.max_participants.to_le_bytes();
    }
}

/// Parameters and request counter of the randomness oracle client.
///
/// The off-chain VRF operator watches for `RandomWordsRequested` events and
/// answers them with a `FulfillRandomWords` instruction signed by `authority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleConfig {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Only signer allowed to deliver random words
    pub authority: Pubkey,
    /// Key hash selecting the oracle's proving key and price lane
    pub key_hash: [u8; 32],
    /// Oracle subscription billed for requests
    pub subscription_id: u64,
    /// Confirmations the oracle waits before answering
    pub request_confirmations: u16,
    /// Compute budget granted to the fulfillment callback
    pub callback_compute_limit: u32,
    /// Identifier handed out to the next request, never zero
    pub next_request_id: u64,
}

impl OracleConfig {
    pub fn new(
        authority: Pubkey,
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_compute_limit: u32,
    ) -> Self {
        Self {
            is_initialized: true,
            authority,
            key_hash,
            subscription_id,
            request_confirmations,
            callback_compute_limit,
            next_request_id: 1,
        }
    }
}

impl Sealed for OracleConfig {}

impl IsInitialized for OracleConfig {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for OracleConfig {
    const LEN: usize = 1 + 32 + 32 + 8 + 2 + 4 + 8;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, OracleConfig::LEN];
        let (
            is_initialized,
            authority,
            key_hash,
            subscription_id,
            request_confirmations,
            callback_compute_limit,
            next_request_id,
        ) = array_refs![src, 1, 32, 32, 8, 2, 4, 8];

        let is_initialized = match is_initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(OracleConfig {
            is_initialized,
            authority: Pubkey::new_from_array(*authority),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            request_confirmations: u16::from_le_bytes(*request_confirmations),
            callback_compute_limit: u32::from_le_bytes(*callback_compute_limit),
            next_request_id: u64::from_le_bytes(*next_request_id),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, OracleConfig::LEN];
        let (
            is_initialized_dst,
            authority_dst,
            key_hash_dst,
            subscription_id_dst,
            request_confirmations_dst,
            callback_compute_limit_dst,
            next_request_id_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 2, 4, 8];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        key_hash_dst.copy_from_slice(&self.key_hash);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *request_confirmations_dst = self.request_confirmations.to_le_bytes();
        *callback_compute_limit_dst = self.callback_compute_limit.to_le_bytes();
        *next_request_id_dst = self.next_request_id.to_le_bytes();
    }
}

/// Phase of the current round.
///
/// A draw in flight carries the identifier of the randomness request that
/// will complete it, so an open round can never hold a pending request.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Waiting for the oracle to answer `request_id`
    Drawing { request_id: u64 },
}

/// Round state, reused across rounds for the lifetime of the raffle.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RoundState {
    pub(crate) is_initialized: bool,
    pub(crate) state: RaffleState,
    /// Entries in admission order; an address appears once per entry
    pub(crate) participants: Vec<Pubkey>,
    /// Lamports received since the last payout
    pub(crate) pool: u64,
    pub(crate) last_draw_timestamp: UnixTimestamp,
    pub(crate) last_winner: Option<Pubkey>,
}

impl RoundState {
    /// Serialized size of the fixed fields
    pub const BASE_LEN: usize = 1 + (1 + 8) + 4 + 8 + 8 + (1 + 32);

    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            state: RaffleState::Open,
            participants: Vec::new(),
            pool: 0,
            last_draw_timestamp: now,
            last_winner: None,
        }
    }

    /// Account size able to hold `capacity` entries in a single round.
    pub fn space(capacity: u32) -> usize {
        Self::BASE_LEN + capacity as usize * 32
    }

    pub fn load(src: &[u8]) -> Result<Self, ProgramError> {
        let round: RoundState =
            try_from_slice_unchecked(src).map_err(|_| ProgramError::InvalidAccountData)?;
        if !round.is_initialized {
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(round)
    }

    pub fn save(&self, dst: &mut [u8]) -> ProgramResult {
        let bytes = self
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        if bytes.len() > dst.len() {
            msg!(
                "Round account holds {} bytes, state needs {}",
                dst.len(),
                bytes.len()
            );
            return Err(ProgramError::AccountDataTooSmall);
        }
        dst[..bytes.len()].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn state(&self) -> RaffleState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, RaffleState::Open)
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        match self.state {
            RaffleState::Open => None,
            RaffleState::Drawing { request_id } => Some(request_id),
        }
    }

    pub fn participants(&self) -> &[Pubkey] {
        &self.participants
    }

    pub fn participant(&self, index: usize) -> Option<&Pubkey> {
        self.participants.get(index)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn pool(&self) -> u64 {
        self.pool
    }

    pub fn last_draw_timestamp(&self) -> UnixTimestamp {
        self.last_draw_timestamp
    }

    pub fn last_winner(&self) -> Option<Pubkey> {
        self.last_winner
    }
}

impl IsInitialized for RoundState {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}
