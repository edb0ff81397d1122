//! # Match List
//!
//! A linear view of all matches, one [`MatchListEntry`] per match in match order. The outcome of
//! every match is described by a [`Narration`], the text is up to the presentation layer.
use crate::render::RenderCompetitor;
use crate::rounds;
use crate::{Bracket, CompetitorId, MatchId};

use std::fmt::{self, Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchListEntry {
    /// The 1-based index of the round.
    pub round: usize,
    /// The 1-based number of the match.
    pub number: usize,
    pub match_id: MatchId,
    pub narration: Narration,
}

/// The state of a match as seen from its next match.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Narration {
    /// The competitor in slot one won.
    Defeated {
        winner: RenderCompetitor,
        loser: RenderCompetitor,
    },
    /// The competitor in slot two won.
    LostTo {
        loser: RenderCompetitor,
        winner: RenderCompetitor,
    },
    /// A competitor advanced without an opponent.
    Advanced { competitor: RenderCompetitor },
    /// Both competitors are known, no winner was reported yet.
    Versus {
        one: RenderCompetitor,
        two: RenderCompetitor,
    },
    AwaitingOpponent { competitor: RenderCompetitor },
    /// No competitor is known yet.
    Undecided,
}

impl Display for Narration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defeated { winner, loser } => write!(f, "{} defeated {}", winner.name, loser.name),
            Self::LostTo { loser, winner } => write!(f, "{} lost to {}", loser.name, winner.name),
            Self::Advanced { competitor } => write!(f, "{} advanced", competitor.name),
            Self::Versus { one, two } => write!(f, "{} vs {}", one.name, two.name),
            Self::AwaitingOpponent { competitor } => {
                write!(f, "{} opponent not yet decided", competitor.name)
            }
            Self::Undecided => f.write_str("Match competitors not yet decided"),
        }
    }
}

/// Builds the match list of `bracket`, ordered by match number. The outcome of the championship
/// match is read from the [`champion`].
///
/// [`champion`]: Bracket::champion
pub fn match_list(bracket: &Bracket) -> Vec<MatchListEntry> {
    let competitor_count = bracket.competitors().len();

    let competitor = |id: CompetitorId| RenderCompetitor {
        id,
        name: bracket
            .competitor(id)
            .map(|competitor| competitor.name.clone())
            .unwrap_or_default(),
    };

    let mut entries: Vec<MatchListEntry> = rounds::rounds(competitor_count)
        .flat_map(|round| {
            let index = round.index;
            round.matches.map(move |id| (index, id))
        })
        .filter_map(|(round, id)| {
            let r#match = bracket.get(id)?;

            let advanced = match bracket.next_match(id) {
                Some(next) => bracket.get(next.index)?.get(next.slot),
                None => bracket.champion(),
            };

            let narration = match (advanced, r#match.one_id, r#match.two_id) {
                (Some(winner), Some(one), Some(two)) if winner == one => Narration::Defeated {
                    winner: competitor(one),
                    loser: competitor(two),
                },
                (Some(winner), Some(one), Some(two)) if winner == two => Narration::LostTo {
                    loser: competitor(one),
                    winner: competitor(two),
                },
                (Some(winner), _, _) => Narration::Advanced {
                    competitor: competitor(winner),
                },
                (None, Some(one), Some(two)) => Narration::Versus {
                    one: competitor(one),
                    two: competitor(two),
                },
                (None, Some(id), None) | (None, None, Some(id)) => Narration::AwaitingOpponent {
                    competitor: competitor(id),
                },
                (None, None, None) => Narration::Undecided,
            };

            Some(MatchListEntry {
                round,
                number: id + 1,
                match_id: id,
                narration,
            })
        })
        .collect();

    entries.sort_by_key(|entry| entry.number);
    entries
}
