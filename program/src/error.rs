use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the raffle program.
///
/// Discriminants are stable: they are surfaced to clients as
/// `ProgramError::Custom(code)`.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstruction,

    /// Raffle accounts already exist
    #[error("Raffle is already initialized")]
    AlreadyInitialized,

    /// Raffle account data has not been initialized
    #[error("Raffle is not initialized")]
    NotInitialized,

    /// Entry value is below the entrance fee
    #[error("Entry value is below the entrance fee")]
    InsufficientPayment,

    /// Entries are only accepted while the round is open
    #[error("Round is not open for entries")]
    RoundNotOpen,

    /// A draw was initiated while the round was not eligible
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment does not match the in-flight randomness request
    #[error("Unknown randomness request")]
    UnknownRequest,

    /// Winner selection over an empty participant list
    #[error("No participants in the round")]
    NoParticipants,

    /// The prize could not be transferred to the winner
    #[error("Payout to winner failed")]
    PayoutFailed,

    /// Fulfillment carried no random words
    #[error("Fulfillment carried no random words")]
    MissingRandomWords,

    /// The randomness oracle client could not issue a request
    #[error("Randomness request failed")]
    OracleRequestFailed,

    /// Fulfillment was not signed by the oracle authority
    #[error("Fulfillment not signed by the oracle authority")]
    UnauthorizedOracle,

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// The round already holds as many entries as its account was sized for
    #[error("Round is full")]
    RoundFull,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_codes_are_stable() {
        assert_eq!(
            ProgramError::from(RaffleError::InsufficientPayment),
            ProgramError::Custom(3)
        );
        assert_eq!(
            ProgramError::from(RaffleError::UnknownRequest),
            ProgramError::Custom(6)
        );
        assert_eq!(
            ProgramError::from(RaffleError::ArithmeticOverflow),
            ProgramError::Custom(12)
        );
        assert_eq!(
            ProgramError::from(RaffleError::RoundFull),
            ProgramError::Custom(13)
        );
    }
}
