//! # Match Advancement
//!
//! Reporting and retracting winners. Both operations validate completely before writing, a
//! failed call never leaves a partially updated [`Bracket`].
use crate::rounds::{self, NextMatch};
use crate::{Bracket, CompetitorId, Error, MatchId, MatchStatus, Result, Slot};

use std::fmt::{self, Display, Formatter};
use std::result;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decides what happens when a winner is reported for a match that is already decided.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AdvancePolicy {
    /// Reject the report with an [`Error::AlreadyDecided`].
    #[default]
    Reject,
    /// Overwrite the previous winner, as long as the next match is not decided yet.
    Replace,
}

impl AdvancePolicy {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Replace => "replace",
        }
    }
}

impl Display for AdvancePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvancePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> result::Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "replace" => Ok(Self::Replace),
            _ => Err(ParsePolicyError(s.to_owned())),
        }
    }
}

/// An error returned when parsing an [`AdvancePolicy`] fails.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid advance policy: {0}")]
pub struct ParsePolicyError(String);

impl Bracket {
    /// Reports `winner` as the winner of the match `id` using the default [`AdvancePolicy`].
    ///
    /// The winner is written into the slot of the next match fed by `id`. When `id` is the
    /// championship match the winner becomes the [`champion`].
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if the match does not exist or has no competitors, `winner` is
    /// not part of the match, the match is a bye or already decided, or the opponent is still
    /// waiting for the result of an earlier match.
    ///
    /// [`champion`]: Self::champion
    #[inline]
    pub fn advance(&mut self, id: MatchId, winner: CompetitorId) -> Result<()> {
        self.advance_with_policy(id, winner, AdvancePolicy::default())
    }

    /// Reports `winner` as the winner of the match `id` using the given `policy`.
    ///
    /// # Errors
    ///
    /// See [`advance`]. Additionally returns [`Error::SuccessorDecided`] if the next match is
    /// already decided, regardless of `policy`.
    ///
    /// [`advance`]: Self::advance
    pub fn advance_with_policy(
        &mut self,
        id: MatchId,
        winner: CompetitorId,
        policy: AdvancePolicy,
    ) -> Result<()> {
        log::debug!("Advancing competitor {} in match {}", winner, id);

        let next = self.check_advance(id, winner, policy)?;

        match next {
            Some(next) => {
                log::debug!("Next match is {} ({:?})", next.index, next.slot);
                self.matches[next.index][next.slot] = Some(winner);
            }
            None => {
                log::debug!("Competitor {} won the championship", winner);
                self.champion = Some(winner);
            }
        }

        self.matches[id].status = MatchStatus::Decided;

        Ok(())
    }

    /// Retracts the winner of the match `id`. The slot of the next match fed by `id` is emptied
    /// and the match becomes pending again. Clearing a pending match is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if the match does not exist, is a first round or championship
    /// match, or the next match is already decided.
    pub fn clear(&mut self, id: MatchId) -> Result<()> {
        log::debug!("Clearing match {}", id);

        let next = self.check_clear(id)?;

        self.matches[next.index][next.slot] = None;
        self.matches[id].status = MatchStatus::Pending;

        Ok(())
    }

    /// Returns `true` if [`advance_with_policy`] would accept reporting `winner` for the match
    /// `id`.
    ///
    /// [`advance_with_policy`]: Self::advance_with_policy
    #[inline]
    pub fn can_advance(&self, id: MatchId, winner: CompetitorId, policy: AdvancePolicy) -> bool {
        self.check_advance(id, winner, policy).is_ok()
    }

    /// Returns `true` if [`clear`] would accept clearing the match `id`.
    ///
    /// [`clear`]: Self::clear
    #[inline]
    pub fn can_clear(&self, id: MatchId) -> bool {
        self.check_clear(id).is_ok()
    }

    /// Validates an advance without changing anything. Returns the next match, `None` for the
    /// championship match.
    fn check_advance(
        &self,
        id: MatchId,
        winner: CompetitorId,
        policy: AdvancePolicy,
    ) -> Result<Option<NextMatch>> {
        let r#match = self.get(id).ok_or(Error::MatchNotFound(id))?;

        if r#match.is_empty() {
            return Err(Error::EmptyMatch(id));
        }

        if !r#match.contains(winner) {
            return Err(Error::NotInMatch {
                match_id: id,
                competitor: winner,
            });
        }

        match r#match.status {
            MatchStatus::Pending => (),
            MatchStatus::Bye => return Err(Error::Bye(id)),
            MatchStatus::Decided => {
                if policy == AdvancePolicy::Reject {
                    return Err(Error::AlreadyDecided(id));
                }
            }
        }

        // Later round matches are only playable once both feeders produced a competitor.
        if let Some(feeders) = rounds::feeders(self.competitors.len(), id) {
            for slot in [Slot::One, Slot::Two] {
                let feeder = feeders.get(slot);

                if r#match[slot].is_none() && !self.matches[feeder].is_bye() {
                    return Err(Error::OpponentPending {
                        match_id: id,
                        feeder,
                    });
                }
            }
        }

        let next = self.next_match(id);

        if let Some(next) = next {
            if self.matches[next.index].is_decided() {
                return Err(Error::SuccessorDecided {
                    match_id: id,
                    next: next.index,
                });
            }
        }

        Ok(next)
    }

    /// Validates a clear without changing anything. Returns the next match.
    fn check_clear(&self, id: MatchId) -> Result<NextMatch> {
        if self.get(id).is_none() {
            return Err(Error::MatchNotFound(id));
        }

        if self.is_first_round(id) {
            return Err(Error::FirstRound(id));
        }

        let next = self.next_match(id).ok_or(Error::Championship(id))?;

        if self.matches[next.index].is_decided() {
            return Err(Error::SuccessorDecided {
                match_id: id,
                next: next.index,
            });
        }

        Ok(next)
    }
}
