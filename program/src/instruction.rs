use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{error::RaffleError, utils};

/// Upper bound on random words carried by one fulfillment.
pub const MAX_RANDOM_WORDS: usize = u8::MAX as usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaffleInstruction {
    /// Create the config, oracle and round accounts
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The admin account paying for the accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The oracle account (PDA)
    /// 3. `[writable]` The round account (PDA), also the prize vault
    /// 4. `[]` The oracle authority allowed to deliver random words
    /// 5. `[]` The system program
    InitializeRaffle {
        /// Minimum entry value in lamports
        entrance_fee: u64,
        /// Minimum seconds between draws
        interval: u64,
        /// Random words requested per draw
        num_words: u32,
        /// Compute budget granted to the fulfillment
        callback_compute_limit: u32,
        /// Confirmations the oracle waits before answering
        request_confirmations: u16,
        /// Oracle key hash ("gas lane")
        key_hash: [u8; 32],
        /// Oracle subscription billed for requests
        subscription_id: u64,
        /// Entries a single round accepts; sizes the round account
        max_participants: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The participant paying the entry
    /// 1. `[]` The config account
    /// 2. `[writable]` The round account
    /// 3. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        value: u64,
    },

    /// Report whether a draw may start; read-only
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The round account
    CheckUpkeep,

    /// Start a draw by requesting randomness
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller (automation trigger)
    /// 1. `[]` The config account
    /// 2. `[writable]` The oracle account
    /// 3. `[writable]` The round account
    PerformUpkeep,

    /// Deliver random words for the pending request
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle authority
    /// 1. `[]` The oracle account
    /// 2. `[writable]` The round account
    /// 3.. `[writable]` Winner candidate accounts
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u64>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstruction)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (num_words, rest) = Self::unpack_u32(rest)?;
                let (callback_compute_limit, rest) = Self::unpack_u32(rest)?;
                let (request_confirmations, rest) = Self::unpack_u16(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (max_participants, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    interval,
                    num_words,
                    callback_compute_limit,
                    request_confirmations,
                    key_hash,
                    subscription_id,
                    max_participants,
                }
            }
            1 => {
                let (value, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { value }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (&count, mut rest) = rest
                    .split_first()
                    .ok_or(RaffleError::InvalidInstruction)?;
                let mut random_words = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let (word, remaining) = Self::unpack_u64(rest)?;
                    random_words.push(word);
                    rest = remaining;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(RaffleError::InvalidInstruction.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeRaffle {
                entrance_fee,
                interval,
                num_words,
                callback_compute_limit,
                request_confirmations,
                key_hash,
                subscription_id,
                max_participants,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(&num_words.to_le_bytes());
                buf.extend_from_slice(&callback_compute_limit.to_le_bytes());
                buf.extend_from_slice(&request_confirmations.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&max_participants.to_le_bytes());
            }
            Self::EnterRaffle { value } => {
                buf.push(1);
                buf.extend_from_slice(&value.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                let count: u8 = random_words
                    .len()
                    .try_into()
                    .map_err(|_| RaffleError::InvalidInstruction)?;
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.push(count);
                for word in random_words {
                    buf.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
        Ok(buf)
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_u16(input: &[u8]) -> Result<(u16, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<2>(input)?;
        Ok((u16::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstruction.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes = bytes
            .try_into()
            .map_err(|_| ProgramError::from(RaffleError::InvalidInstruction))?;
        Ok((bytes, rest))
    }
}

/// Create initialize_raffle instruction
#[allow(clippy::too_many_arguments)]
pub fn initialize_raffle(
    program_id: &Pubkey,
    admin: &Pubkey,
    oracle_authority: &Pubkey,
    entrance_fee: u64,
    interval: u64,
    num_words: u32,
    callback_compute_limit: u32,
    request_confirmations: u16,
    key_hash: [u8; 32],
    subscription_id: u64,
    max_participants: u32,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee,
        interval,
        num_words,
        callback_compute_limit,
        request_confirmations,
        key_hash,
        subscription_id,
        max_participants,
    }
    .pack()?;

    let accounts = vec![
        AccountMeta::new(*admin, true),
        AccountMeta::new(utils::find_config_address(program_id).0, false),
        AccountMeta::new(utils::find_oracle_address(program_id).0, false),
        AccountMeta::new(utils::find_round_address(program_id).0, false),
        AccountMeta::new_readonly(*oracle_authority, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    participant: &Pubkey,
    value: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::EnterRaffle { value }.pack()?;

    let accounts = vec![
        AccountMeta::new(*participant, true),
        AccountMeta::new_readonly(utils::find_config_address(program_id).0, false),
        AccountMeta::new(utils::find_round_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::CheckUpkeep.pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(utils::find_config_address(program_id).0, false),
        AccountMeta::new_readonly(utils::find_round_address(program_id).0, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, caller: &Pubkey) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::PerformUpkeep.pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new_readonly(utils::find_config_address(program_id).0, false),
        AccountMeta::new(utils::find_oracle_address(program_id).0, false),
        AccountMeta::new(utils::find_round_address(program_id).0, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction
///
/// `candidates` must include the account the random words select; the
/// oracle operator derives it from the round account before submitting.
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    request_id: u64,
    random_words: Vec<u64>,
    candidates: &[Pubkey],
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack()?;

    let mut accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new_readonly(utils::find_oracle_address(program_id).0, false),
        AccountMeta::new(utils::find_round_address(program_id).0, false),
    ];
    accounts.extend(
        candidates
            .iter()
            .map(|candidate| AccountMeta::new(*candidate, false)),
    );

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_initialize_raffle() {
        let instruction = RaffleInstruction::InitializeRaffle {
            entrance_fee: 10_000_000,
            interval: 30,
            num_words: 1,
            callback_compute_limit: 500_000,
            request_confirmations: 3,
            key_hash: [9; 32],
            subscription_id: 1234,
            max_participants: 64,
        };
        let packed = instruction.pack().unwrap();

        assert_eq!(packed[0], 0);
        assert_eq!(packed.len(), 1 + 8 + 8 + 4 + 4 + 2 + 32 + 8 + 4);
        assert_eq!(RaffleInstruction::unpack(&packed).unwrap(), instruction);
    }

    #[test]
    fn unpack_fulfill_random_words() {
        let mut data = vec![4];
        data.extend_from_slice(&7u64.to_le_bytes());
        data.push(2);
        data.extend_from_slice(&11u64.to_le_bytes());
        data.extend_from_slice(&13u64.to_le_bytes());

        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::FulfillRandomWords {
                request_id: 7,
                random_words: vec![11, 13],
            }
        );
    }

    #[test]
    fn truncated_words_are_rejected() {
        let mut data = vec![4];
        data.extend_from_slice(&7u64.to_le_bytes());
        data.push(2);
        data.extend_from_slice(&11u64.to_le_bytes());

        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap_err(),
            ProgramError::from(RaffleError::InvalidInstruction)
        );
    }

    #[test]
    fn unknown_tag_and_empty_input_are_rejected() {
        let expected = ProgramError::from(RaffleError::InvalidInstruction);
        assert_eq!(RaffleInstruction::unpack(&[]).unwrap_err(), expected);
        assert_eq!(RaffleInstruction::unpack(&[5]).unwrap_err(), expected);
        assert_eq!(RaffleInstruction::unpack(&[1, 0, 0]).unwrap_err(), expected);
    }

    #[test]
    fn too_many_words_cannot_be_packed() {
        let instruction = RaffleInstruction::FulfillRandomWords {
            request_id: 1,
            random_words: vec![0; MAX_RANDOM_WORDS + 1],
        };
        assert!(instruction.pack().is_err());
    }

    #[test]
    fn fulfill_builder_appends_candidates() {
        let program_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let winner = Pubkey::new_unique();

        let ix = fulfill_random_words(&program_id, &authority, 1, vec![3], &[winner]).unwrap();

        assert_eq!(ix.accounts.len(), 4);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[3].pubkey, winner);
        assert!(ix.accounts[3].is_writable);
    }
}
