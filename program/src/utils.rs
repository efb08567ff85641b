// Program derived addresses of the raffle accounts
use solana_program::pubkey::Pubkey;

pub const CONFIG_SEED: &[u8] = b"config";
pub const ORACLE_SEED: &[u8] = b"oracle";
pub const ROUND_SEED: &[u8] = b"round";

/// Find the program derived address of the raffle config
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the oracle client account
pub fn find_oracle_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ORACLE_SEED], program_id)
}

/// Find the program derived address of the round account (prize vault)
pub fn find_round_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ROUND_SEED], program_id)
}
