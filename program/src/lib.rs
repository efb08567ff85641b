// Interval Raffle
// A lottery that draws a winner on a fixed interval using an external
// verifiable randomness oracle

// Round core
pub mod draw;
pub mod eligibility;
pub mod ledger;
pub mod state;

// Program plumbing
pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod utils;

// Randomness oracle client
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
