//! # Bracket Builder
//!
//! Creates the initial match tree of a [`Bracket`] from competitors in seeding order.
use crate::rounds::{self, total_matches, total_rounds};
use crate::validate;
use crate::{Bracket, BracketParts, Competitor, Competitors, Error, Match, MatchStatus};
use crate::{Matches, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The smallest number of competitors accepted when byes are enabled.
pub const MIN_COMPETITORS: usize = 2;

/// The largest number of competitors accepted by the builder.
pub const MAX_COMPETITORS: usize = 256;

/// Options used by [`Bracket::new_with_options`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildOptions {
    /// Accept any number of competitors between [`MIN_COMPETITORS`] and [`MAX_COMPETITORS`],
    /// filling the missing first round spots with byes. When `false` the number of competitors
    /// must be a power of two between 4 and 256.
    pub byes: bool,
}

impl BuildOptions {
    /// Returns a new `BuildOptions` with byes enabled.
    #[inline]
    pub fn with_byes() -> Self {
        Self { byes: true }
    }

    /// Checks whether `count` competitors are accepted using these options.
    pub fn check_count(&self, count: usize) -> Result<()> {
        if self.byes {
            if (MIN_COMPETITORS..=MAX_COMPETITORS).contains(&count) {
                Ok(())
            } else {
                Err(Error::InvalidCompetitorCount { found: count })
            }
        } else {
            validate::competitor_count(count)
        }
    }
}

impl Bracket {
    /// Creates a new `Bracket` with the given `competitors` using the default
    /// [`BuildOptions`].
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if the number of competitors is not a power of two between 4
    /// and 256 or a competitor id appears more than once.
    #[inline]
    pub fn new<I>(competitors: I) -> Result<Self>
    where
        I: IntoIterator<Item = Competitor>,
    {
        Self::new_with_options(competitors, BuildOptions::default())
    }

    /// Creates a new `Bracket` with the given `competitors` using the given `options`.
    ///
    /// Round 1 match `k` is played between the competitors at position `2k` and `2k + 1`. With
    /// byes enabled the trailing first round matches hold a single competitor instead, which is
    /// forwarded into the next round right away.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if the number of competitors is not accepted by `options` or a
    /// competitor id appears more than once.
    pub fn new_with_options<I>(competitors: I, options: BuildOptions) -> Result<Self>
    where
        I: IntoIterator<Item = Competitor>,
    {
        let competitors: Competitors = competitors.into_iter().collect();

        log::debug!(
            "Creating new Bracket with {} competitors (byes: {})",
            competitors.len(),
            options.byes
        );

        options.check_count(competitors.len())?;

        if let Some(id) = competitors.first_duplicate() {
            return Err(Error::DuplicateCompetitor(id));
        }

        let rounds = total_rounds(competitors.len());
        let num_matches = total_matches(competitors.len());

        let initial_matches = 1 << (rounds - 1);
        let byes = (1 << rounds) - competitors.len();
        let pairs = initial_matches - byes;

        let mut matches = Matches::with_capacity(num_matches);
        let mut ids = competitors.iter().map(|competitor| competitor.id);

        for index in 0..pairs {
            matches.push(Match::with_competitors(index, ids.next(), ids.next()));
        }

        for index in pairs..initial_matches {
            matches.push(Match::bye(index, ids.next()));
        }

        // Fill `matches` with empty matches.
        while matches.len() < num_matches {
            let index = matches.len();
            matches.push(Match::new(index));
        }

        // Forward all byes into their next match.
        for index in pairs..initial_matches {
            let competitor = matches[index].one_id;

            if let Some(next) = rounds::next_match(competitors.len(), index) {
                log::debug!("Forwarding bye {} into match {}", index, next.index);
                matches[next.index][next.slot] = competitor;
            }
        }

        log::debug!(
            "Created new Bracket with {} rounds, {} matches and {} byes",
            rounds,
            matches.len(),
            byes
        );

        Ok(Self {
            competitors,
            matches,
            rounds,
            champion: None,
        })
    }

    /// Resumes a `Bracket` from existing parts, usually a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if `parts` do not describe a valid bracket: the number of
    /// rounds or matches does not fit the competitors, a match is stored at the wrong position,
    /// a match or the champion refer to an unknown competitor or a bye is misplaced.
    pub fn resume(parts: BracketParts) -> Result<Self> {
        let BracketParts {
            competitors,
            matches,
            rounds,
            champion,
        } = parts;

        log::debug!(
            "Trying to resume Bracket with {} competitors and {} matches",
            competitors.len(),
            matches.len()
        );

        if !(MIN_COMPETITORS..=MAX_COMPETITORS).contains(&competitors.len()) {
            return Err(Error::InvalidCompetitorCount {
                found: competitors.len(),
            });
        }

        if let Some(id) = competitors.first_duplicate() {
            return Err(Error::DuplicateCompetitor(id));
        }

        let expected = total_rounds(competitors.len());
        if rounds != expected {
            return Err(Error::InvalidNumberOfRounds {
                expected,
                found: rounds,
            });
        }

        let expected = total_matches(competitors.len());
        if matches.len() != expected {
            return Err(Error::InvalidNumberOfMatches {
                expected,
                found: matches.len(),
            });
        }

        for (index, r#match) in matches.iter().enumerate() {
            if r#match.id != index {
                return Err(Error::InvalidMatchId {
                    index,
                    found: r#match.id,
                });
            }

            for competitor in r#match.competitors() {
                if competitors.find(competitor).is_none() {
                    return Err(Error::UnknownCompetitor {
                        match_id: index,
                        competitor,
                    });
                }
            }

            if r#match.status == MatchStatus::Bye
                && (!rounds::is_first_round(competitors.len(), index)
                    || r#match.one_id.is_none()
                    || r#match.two_id.is_some())
            {
                return Err(Error::InvalidBye(index));
            }
        }

        if let Some(competitor) = champion {
            if competitors.find(competitor).is_none() {
                return Err(Error::UnknownCompetitor {
                    match_id: expected - 1,
                    competitor,
                });
            }
        }

        log::debug!("Resuming Bracket with {} rounds", rounds);

        Ok(Self {
            competitors,
            matches,
            rounds,
            champion,
        })
    }
}
