use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    draw::PrizeTransfer,
    error::RaffleError,
    instruction::RaffleInstruction,
    state::{OracleConfig, RaffleConfig, RoundState, MAX_ROUND_ACCOUNT_LEN},
    utils::{CONFIG_SEED, ORACLE_SEED, ROUND_SEED},
    vrf::OracleClient,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
                num_words,
                callback_compute_limit,
                request_confirmations,
                key_hash,
                subscription_id,
                max_participants,
            } => {
                msg!("Instruction: Initialize Raffle");
                let config = RaffleConfig::new(
                    Pubkey::default(),
                    entrance_fee,
                    interval,
                    num_words,
                    max_participants,
                );
                let oracle = OracleConfig::new(
                    Pubkey::default(),
                    key_hash,
                    subscription_id,
                    request_confirmations,
                    callback_compute_limit,
                );
                Self::process_initialize_raffle(program_id, accounts, config, oracle)
            }
            RaffleInstruction::EnterRaffle { value } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(program_id, accounts, value)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(program_id, accounts)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(program_id, accounts)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(program_id, accounts, request_id, &random_words)
            }
        }
    }

    /// Creates the config, oracle and round accounts.
    ///
    /// `config` and `oracle` arrive with placeholder keys; the admin and the
    /// oracle authority are taken from the accounts.
    fn process_initialize_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        mut config: RaffleConfig,
        mut oracle: OracleConfig,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        if config.num_words == 0 {
            msg!("At least one random word must be requested per draw");
            return Err(ProgramError::InvalidArgument);
        }

        if config.max_participants == 0 {
            msg!("Round account must hold at least one entry");
            return Err(ProgramError::InvalidArgument);
        }

        let round_len = RoundState::space(config.max_participants);
        if round_len > MAX_ROUND_ACCOUNT_LEN {
            msg!(
                "Round account of {} bytes exceeds the {} byte limit",
                round_len,
                MAX_ROUND_ACCOUNT_LEN
            );
            return Err(ProgramError::InvalidArgument);
        }

        let rent = Rent::get()?;
        let clock = Clock::get()?;

        let pdas = [
            (config_info, CONFIG_SEED, RaffleConfig::LEN),
            (oracle_info, ORACLE_SEED, OracleConfig::LEN),
            (round_info, ROUND_SEED, round_len),
        ];
        for (account_info, seed, space) in pdas {
            Self::create_pda_account(
                program_id,
                admin_info,
                account_info,
                system_program_info,
                seed,
                space,
                &rent,
            )?;
        }

        config.admin = *admin_info.key;
        oracle.authority = *oracle_authority_info.key;

        RaffleConfig::pack(config, &mut config_info.data.borrow_mut())?;
        OracleConfig::pack(oracle, &mut oracle_info.data.borrow_mut())?;
        RoundState::new(clock.unix_timestamp).save(&mut round_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={}, Interval={}s, Words={}, Capacity={}, Oracle={}",
            config.entrance_fee,
            config.interval,
            config.num_words,
            config.max_participants,
            oracle.authority
        );
        Ok(())
    }

    fn process_enter_raffle(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        value: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let participant_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !participant_info.is_signer {
            msg!("Participant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        let config = Self::load_config(program_id, config_info)?;
        let mut round = Self::load_round(program_id, round_info)?;

        let event = round.admit_entry(&config, *participant_info.key, value)?;

        invoke(
            &system_instruction::transfer(participant_info.key, round_info.key, value),
            &[
                participant_info.clone(),
                round_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        round.save(&mut round_info.data.borrow_mut())?;
        event.emit();

        msg!(
            "Pool now holds {} lamports from {} entries",
            round.pool(),
            round.participant_count()
        );
        Ok(())
    }

    /// Publishes the eligibility of the round as return data.
    fn process_check_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(program_id, config_info)?;
        let round = Self::load_round(program_id, round_info)?;
        let clock = Clock::get()?;

        let eligibility = round.check_eligibility(&config, clock.unix_timestamp);
        msg!(
            "Upkeep needed: {}, reason: {:?}",
            eligibility.eligible,
            eligibility.reason
        );

        let data = eligibility
            .try_to_vec()
            .map_err(|err| ProgramError::BorshIoError(err.to_string()))?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(program_id, config_info)?;
        let mut oracle = Self::load_oracle(program_id, oracle_info)?;
        let mut round = Self::load_round(program_id, round_info)?;
        let clock = Clock::get()?;

        let event = round.initiate_draw(
            &config,
            clock.unix_timestamp,
            &mut OracleClient::new(&mut oracle),
        )?;

        OracleConfig::pack(oracle, &mut oracle_info.data.borrow_mut())?;
        round.save(&mut round_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn process_fulfill_random_words(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u64],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let round_info = next_account_info(account_info_iter)?;
        let candidates = account_info_iter.as_slice();

        if !authority_info.is_signer {
            msg!("Oracle authority must sign the fulfillment");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let oracle = Self::load_oracle(program_id, oracle_info)?;
        if oracle.authority != *authority_info.key {
            msg!(
                "Fulfillment signed by {}, expected oracle authority {}",
                authority_info.key,
                oracle.authority
            );
            return Err(RaffleError::UnauthorizedOracle.into());
        }

        let mut round = Self::load_round(program_id, round_info)?;
        let mut payout = VaultPayout {
            vault: round_info,
            candidates,
        };

        let event = round.fulfill_randomness(request_id, random_words, &mut payout)?;

        round.save(&mut round_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn create_pda_account<'a>(
        program_id: &Pubkey,
        payer_info: &AccountInfo<'a>,
        account_info: &AccountInfo<'a>,
        system_program_info: &AccountInfo<'a>,
        seed: &[u8],
        space: usize,
        rent: &Rent,
    ) -> ProgramResult {
        let (expected_pubkey, bump_seed) = Pubkey::find_program_address(&[seed], program_id);
        if *account_info.key != expected_pubkey {
            msg!("Invalid {} account address", String::from_utf8_lossy(seed));
            return Err(ProgramError::InvalidSeeds);
        }

        if account_info.owner == program_id {
            msg!("Raffle {} account already exists", String::from_utf8_lossy(seed));
            return Err(RaffleError::AlreadyInitialized.into());
        }

        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                account_info.key,
                rent.minimum_balance(space),
                space as u64,
                program_id,
            ),
            &[
                payer_info.clone(),
                account_info.clone(),
                system_program_info.clone(),
            ],
            &[&[seed, &[bump_seed]]],
        )
    }

    fn check_program_account(
        program_id: &Pubkey,
        account_info: &AccountInfo,
        seed: &[u8],
    ) -> ProgramResult {
        if account_info.owner != program_id {
            msg!(
                "{} account must be owned by this program",
                String::from_utf8_lossy(seed)
            );
            return Err(ProgramError::IncorrectProgramId);
        }

        let (expected_pubkey, _) = Pubkey::find_program_address(&[seed], program_id);
        if *account_info.key != expected_pubkey {
            msg!("Invalid {} account address", String::from_utf8_lossy(seed));
            return Err(ProgramError::InvalidSeeds);
        }
        Ok(())
    }

    fn load_config(
        program_id: &Pubkey,
        config_info: &AccountInfo,
    ) -> Result<RaffleConfig, ProgramError> {
        Self::check_program_account(program_id, config_info, CONFIG_SEED)?;
        let config = RaffleConfig::unpack_unchecked(&config_info.data.borrow())?;
        if !config.is_initialized {
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(config)
    }

    fn load_oracle(
        program_id: &Pubkey,
        oracle_info: &AccountInfo,
    ) -> Result<OracleConfig, ProgramError> {
        Self::check_program_account(program_id, oracle_info, ORACLE_SEED)?;
        let oracle = OracleConfig::unpack_unchecked(&oracle_info.data.borrow())?;
        if !oracle.is_initialized {
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(oracle)
    }

    fn load_round(
        program_id: &Pubkey,
        round_info: &AccountInfo,
    ) -> Result<RoundState, ProgramError> {
        Self::check_program_account(program_id, round_info, ROUND_SEED)?;
        let round = RoundState::load(&round_info.data.borrow())?;
        Ok(round)
    }
}

/// Pays the prize out of the round account, which doubles as the vault.
///
/// The winner must be among the trailing accounts of the fulfillment.
struct VaultPayout<'a, 'info> {
    vault: &'a AccountInfo<'info>,
    candidates: &'a [AccountInfo<'info>],
}

impl PrizeTransfer for VaultPayout<'_, '_> {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        let winner_info = self
            .candidates
            .iter()
            .find(|candidate| candidate.key == winner)
            .ok_or_else(|| {
                msg!("Winner account {} was not supplied", winner);
                ProgramError::NotEnoughAccountKeys
            })?;

        if !winner_info.is_writable {
            msg!("Winner account {} must be writable", winner);
            return Err(ProgramError::InvalidArgument);
        }

        let vault_lamports = self
            .vault
            .lamports()
            .checked_sub(amount)
            .ok_or(ProgramError::InsufficientFunds)?;
        let winner_lamports = winner_info
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        **self.vault.try_borrow_mut_lamports()? = vault_lamports;
        **winner_info.try_borrow_mut_lamports()? = winner_lamports;

        msg!("Transferred {} lamports to winner {}", amount, winner);
        Ok(())
    }
}
