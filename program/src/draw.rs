use solana_program::{clock::UnixTimestamp, msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    state::{RaffleConfig, RaffleState, RoundState},
    vrf::{winner_index, RandomnessOracle},
};

/// Moves the prize out of the raffle's custody.
pub trait PrizeTransfer {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError>;
}

impl RoundState {
    /// Closes the round to entries and asks the oracle for randomness.
    ///
    /// Fails with `UpkeepNotNeeded` unless the round is eligible at `now`;
    /// the round is left untouched on any failure.
    pub fn initiate_draw<O: RandomnessOracle>(
        &mut self,
        config: &RaffleConfig,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        let eligibility = self.check_eligibility(config, now);
        if !eligibility.eligible {
            msg!(
                "Upkeep not needed: pool={}, participants={}, state={:?}, reason={:?}",
                self.pool,
                self.participants.len(),
                self.state,
                eligibility.reason
            );
            return Err(RaffleError::UpkeepNotNeeded);
        }

        let request_id = oracle
            .request_random_words(config.num_words)
            .map_err(|err| {
                msg!("Randomness request failed: {}", err);
                RaffleError::OracleRequestFailed
            })?;

        self.state = RaffleState::Drawing { request_id };
        self.last_draw_timestamp = now;

        Ok(RaffleEvent::DrawRequested { request_id })
    }

    /// Completes the draw identified by `request_id`.
    ///
    /// The winner is `participants[random_words[0] % participants.len()]`.
    /// Payout and reset are all-or-nothing: if the transfer fails the round
    /// stays drawing with its pool, entries and pending request intact, so
    /// the same fulfillment can be delivered again.
    pub fn fulfill_randomness<P: PrizeTransfer>(
        &mut self,
        request_id: u64,
        random_words: &[u64],
        payout: &mut P,
    ) -> Result<RaffleEvent, RaffleError> {
        match self.state {
            RaffleState::Drawing {
                request_id: pending,
            } if pending == request_id => {}
            RaffleState::Drawing {
                request_id: pending,
            } => {
                msg!(
                    "Rejected fulfillment for request {}, pending request is {}",
                    request_id,
                    pending
                );
                return Err(RaffleError::UnknownRequest);
            }
            RaffleState::Open => {
                msg!(
                    "Rejected fulfillment for request {}, no draw in flight",
                    request_id
                );
                return Err(RaffleError::UnknownRequest);
            }
        }

        let random_word = *random_words
            .first()
            .ok_or(RaffleError::MissingRandomWords)?;
        let index = winner_index(random_word, self.participants.len())
            .ok_or(RaffleError::NoParticipants)?;
        let winner = self.participants[index];
        let prize = self.pool;

        msg!(
            "Random word {} selects entry {} of {}",
            random_word,
            index,
            self.participants.len()
        );

        payout.transfer(&winner, prize).map_err(|err| {
            msg!("Payout of {} lamports to {} failed: {}", prize, winner, err);
            RaffleError::PayoutFailed
        })?;

        self.last_winner = Some(winner);
        self.participants.clear();
        self.pool = 0;
        self.state = RaffleState::Open;

        Ok(RaffleEvent::WinnerSelected { winner, prize })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubOracle {
        next_id: u64,
        requested_words: Vec<u32>,
        fail: bool,
    }

    impl StubOracle {
        fn new() -> Self {
            Self {
                next_id: 1,
                requested_words: Vec::new(),
                fail: false,
            }
        }
    }

    impl RandomnessOracle for StubOracle {
        fn request_random_words(&mut self, num_words: u32) -> Result<u64, ProgramError> {
            if self.fail {
                return Err(ProgramError::InvalidArgument);
            }
            self.requested_words.push(num_words);
            let id = self.next_id;
            self.next_id += 1;
            Ok(id)
        }
    }

    #[derive(Default)]
    struct RecordingPayout {
        transfers: Vec<(Pubkey, u64)>,
        fail: bool,
    }

    impl PrizeTransfer for RecordingPayout {
        fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
            if self.fail {
                return Err(ProgramError::InsufficientFunds);
            }
            self.transfers.push((*winner, amount));
            Ok(())
        }
    }

    fn config() -> RaffleConfig {
        RaffleConfig::new(Pubkey::new_unique(), 100, 60, 1, 8)
    }

    fn drawing_round(config: &RaffleConfig, participants: &[Pubkey]) -> (RoundState, u64) {
        let mut round = RoundState::new(0);
        for participant in participants {
            round.admit_entry(config, *participant, 100).unwrap();
        }
        let mut oracle = StubOracle::new();
        let event = round.initiate_draw(config, 60, &mut oracle).unwrap();
        match event {
            RaffleEvent::DrawRequested { request_id } => (round, request_id),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn initiation_moves_to_drawing_and_stamps_time() {
        let config = config();
        let mut round = RoundState::new(0);
        round.admit_entry(&config, Pubkey::new_unique(), 100).unwrap();
        let mut oracle = StubOracle::new();

        let event = round.initiate_draw(&config, 75, &mut oracle).unwrap();

        assert_eq!(event, RaffleEvent::DrawRequested { request_id: 1 });
        assert_eq!(round.state(), RaffleState::Drawing { request_id: 1 });
        assert_eq!(round.pending_request_id(), Some(1));
        assert_eq!(round.last_draw_timestamp(), 75);
        assert_eq!(oracle.requested_words, vec![1]);
    }

    #[test]
    fn second_initiation_fails_without_new_request() {
        let config = config();
        let mut round = RoundState::new(0);
        round.admit_entry(&config, Pubkey::new_unique(), 100).unwrap();
        let mut oracle = StubOracle::new();
        round.initiate_draw(&config, 60, &mut oracle).unwrap();
        let before = round.clone();

        assert_eq!(
            round.initiate_draw(&config, 60, &mut oracle),
            Err(RaffleError::UpkeepNotNeeded)
        );
        assert_eq!(round, before);
        assert_eq!(oracle.requested_words.len(), 1);
    }

    #[test]
    fn ineligible_initiation_leaves_round_open() {
        let config = config();
        let mut round = RoundState::new(0);
        round.admit_entry(&config, Pubkey::new_unique(), 100).unwrap();
        let before = round.clone();
        let mut oracle = StubOracle::new();

        assert_eq!(
            round.initiate_draw(&config, 59, &mut oracle),
            Err(RaffleError::UpkeepNotNeeded)
        );
        assert_eq!(round, before);
        assert!(oracle.requested_words.is_empty());
    }

    #[test]
    fn oracle_failure_leaves_round_open() {
        let config = config();
        let mut round = RoundState::new(0);
        round.admit_entry(&config, Pubkey::new_unique(), 100).unwrap();
        let before = round.clone();
        let mut oracle = StubOracle::new();
        oracle.fail = true;

        assert_eq!(
            round.initiate_draw(&config, 60, &mut oracle),
            Err(RaffleError::OracleRequestFailed)
        );
        assert_eq!(round, before);
    }

    #[test]
    fn random_word_indexes_participants_in_entry_order() {
        let config = config();
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        let (mut round, request_id) = drawing_round(&config, &[a, b, c]);
        let mut payout = RecordingPayout::default();
        round.fulfill_randomness(request_id, &[7], &mut payout).unwrap();
        assert_eq!(round.last_winner(), Some(b));

        let (mut round, request_id) = drawing_round(&config, &[a, b, c]);
        let mut payout = RecordingPayout::default();
        round.fulfill_randomness(request_id, &[3], &mut payout).unwrap();
        assert_eq!(round.last_winner(), Some(a));
    }

    #[test]
    fn fulfillment_pays_pool_and_resets_round() {
        let config = config();
        let players = [Pubkey::new_unique(), Pubkey::new_unique()];
        let (mut round, request_id) = drawing_round(&config, &players);
        let mut payout = RecordingPayout::default();

        let event = round
            .fulfill_randomness(request_id, &[1, 99], &mut payout)
            .unwrap();

        assert_eq!(
            event,
            RaffleEvent::WinnerSelected {
                winner: players[1],
                prize: 200
            }
        );
        assert_eq!(payout.transfers, vec![(players[1], 200)]);
        assert_eq!(round.pool(), 0);
        assert_eq!(round.participant_count(), 0);
        assert_eq!(round.state(), RaffleState::Open);
        assert_eq!(round.pending_request_id(), None);
        assert_eq!(round.last_winner(), Some(players[1]));
    }

    #[test]
    fn mismatched_request_is_rejected_without_mutation() {
        let config = config();
        let (mut round, request_id) = drawing_round(&config, &[Pubkey::new_unique()]);
        let before = round.clone();
        let mut payout = RecordingPayout::default();

        assert_eq!(
            round.fulfill_randomness(request_id + 1, &[5], &mut payout),
            Err(RaffleError::UnknownRequest)
        );
        assert_eq!(round, before);
        assert!(payout.transfers.is_empty());
    }

    #[test]
    fn replayed_fulfillment_is_unknown() {
        let config = config();
        let (mut round, request_id) = drawing_round(&config, &[Pubkey::new_unique()]);
        let mut payout = RecordingPayout::default();
        round.fulfill_randomness(request_id, &[5], &mut payout).unwrap();
        let after_first = round.clone();

        assert_eq!(
            round.fulfill_randomness(request_id, &[5], &mut payout),
            Err(RaffleError::UnknownRequest)
        );
        assert_eq!(round, after_first);
        assert_eq!(payout.transfers.len(), 1);
    }

    #[test]
    fn empty_random_words_are_rejected() {
        let config = config();
        let (mut round, request_id) = drawing_round(&config, &[Pubkey::new_unique()]);
        let before = round.clone();
        let mut payout = RecordingPayout::default();

        assert_eq!(
            round.fulfill_randomness(request_id, &[], &mut payout),
            Err(RaffleError::MissingRandomWords)
        );
        assert_eq!(round, before);
    }

    #[test]
    fn empty_participant_list_is_defended() {
        let mut round = RoundState::new(0);
        round.state = RaffleState::Drawing { request_id: 4 };
        let mut payout = RecordingPayout::default();

        assert_eq!(
            round.fulfill_randomness(4, &[5], &mut payout),
            Err(RaffleError::NoParticipants)
        );
        assert_eq!(round.state(), RaffleState::Drawing { request_id: 4 });
    }

    #[test]
    fn failed_payout_keeps_draw_pending_for_retry() {
        let config = config();
        let players = [Pubkey::new_unique(), Pubkey::new_unique()];
        let (mut round, request_id) = drawing_round(&config, &players);
        let before = round.clone();
        let mut payout = RecordingPayout {
            fail: true,
            ..RecordingPayout::default()
        };

        assert_eq!(
            round.fulfill_randomness(request_id, &[0], &mut payout),
            Err(RaffleError::PayoutFailed)
        );
        assert_eq!(round, before);
        assert_eq!(round.last_winner(), None);

        payout.fail = false;
        round.fulfill_randomness(request_id, &[0], &mut payout).unwrap();
        assert_eq!(payout.transfers, vec![(players[0], 200)]);
        assert!(round.is_open());
    }

    #[test]
    fn single_entrant_round_end_to_end() {
        let config = config();
        let x = Pubkey::new_unique();
        let mut round = RoundState::new(0);
        let mut oracle = StubOracle::new();
        let mut payout = RecordingPayout::default();

        round.admit_entry(&config, x, 100).unwrap();
        assert_eq!(round.pool(), 100);

        assert!(!round.check_eligibility(&config, 30).eligible);
        assert!(round.check_eligibility(&config, 61).eligible);

        round.initiate_draw(&config, 61, &mut oracle).unwrap();
        assert_eq!(round.pending_request_id(), Some(1));

        let event = round.fulfill_randomness(1, &[5], &mut payout).unwrap();
        assert_eq!(event, RaffleEvent::WinnerSelected { winner: x, prize: 100 });
        assert_eq!(payout.transfers, vec![(x, 100)]);
        assert_eq!(round.pool(), 0);
        assert!(round.is_open());

        // The next round measures its interval from the previous draw.
        round.admit_entry(&config, x, 100).unwrap();
        assert!(!round.check_eligibility(&config, 120).eligible);
        assert!(round.check_eligibility(&config, 121).eligible);
    }
}
