//! Voting rounds and the tally counter each round feeds.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Round of a voting event.
///
/// On the wire the round is an integer: `1` for the first round and `2` for
/// the finals. Any other value is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Round {
    /// Opening round, tallied in `voteCount`.
    #[default]
    First,
    /// Finals, tallied in `finalsVoteCount`.
    Finals,
}

/// Candidate counter incremented by an accepted ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TallyField {
    /// First-round tally.
    VoteCount,
    /// Finals tally.
    FinalsVoteCount,
}

/// Raised when a round number is neither 1 nor 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("round must be 1 or 2, got {value}")]
pub struct RoundValidationError {
    /// Rejected wire value.
    pub value: i64,
}

impl Round {
    /// Wire number of the round.
    pub const fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Finals => 2,
        }
    }

    /// Candidate counter fed by ballots in this round.
    pub const fn tally_field(self) -> TallyField {
        match self {
            Self::First => TallyField::VoteCount,
            Self::Finals => TallyField::FinalsVoteCount,
        }
    }
}

impl TallyField {
    /// Document field name of the counter.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VoteCount => "voteCount",
            Self::FinalsVoteCount => "finalsVoteCount",
        }
    }
}

impl TryFrom<i64> for Round {
    type Error = RoundValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Finals),
            other => Err(RoundValidationError { value: other }),
        }
    }
}

impl From<Round> for u8 {
    fn from(round: Round) -> Self {
        round.number()
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, Round::First, TallyField::VoteCount)]
    #[case(2, Round::Finals, TallyField::FinalsVoteCount)]
    fn maps_wire_numbers_to_tally_fields(
        #[case] wire: i64,
        #[case] round: Round,
        #[case] field: TallyField,
    ) {
        let parsed = Round::try_from(wire).expect("supported round");
        assert_eq!(parsed, round);
        assert_eq!(parsed.tally_field(), field);
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(-1)]
    fn rejects_unknown_rounds(#[case] wire: i64) {
        let err = Round::try_from(wire).expect_err("unsupported round");
        assert_eq!(err.value, wire);
    }

    #[test]
    fn defaults_to_first_round() {
        assert_eq!(Round::default(), Round::First);
        assert_eq!(serde_json::to_string(&Round::Finals).expect("json"), "2");
    }
}
