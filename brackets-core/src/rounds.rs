//! # Round Arithmetic
//!
//! Pure functions mapping a competitor count to the shape of its bracket. Every other module
//! addresses matches through these functions, so match ids, successors and feeders always agree
//! with the order in which [`Bracket::new`] assigns ids.
//!
//! [`Bracket::new`]: crate::Bracket::new
use crate::{MatchId, Slot};

use std::collections::BTreeMap;
use std::iter::FusedIterator;
use std::ops::Range;

/// Returns the number of rounds required for `competitor_count` competitors. This is the base 2
/// logarithm of the count, rounded up to the next integer.
#[inline]
pub fn total_rounds(competitor_count: usize) -> usize {
    // `0.next_power_of_two()` is 1, so this is 0 for both 0 and 1.
    competitor_count.next_power_of_two().trailing_zeros() as usize
}

/// Returns the number of matches in a bracket for `competitor_count` competitors, including the
/// championship match.
#[inline]
pub fn total_matches(competitor_count: usize) -> usize {
    (1 << total_rounds(competitor_count)) - 1
}

/// Returns the id of the championship match, the only match without a successor.
#[inline]
pub fn championship(competitor_count: usize) -> Option<MatchId> {
    total_matches(competitor_count).checked_sub(1)
}

/// A single round of a bracket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    /// The 1-based index of the round.
    pub index: usize,
    /// The ids of all matches in this round.
    pub matches: Range<MatchId>,
}

impl Round {
    /// Returns the number of matches in this round.
    #[inline]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Returns the position of `id` relative to the start of the round.
    #[inline]
    pub fn position(&self, id: MatchId) -> Option<usize> {
        if self.matches.contains(&id) {
            Some(id - self.matches.start)
        } else {
            None
        }
    }
}

/// Returns an iterator over all rounds for `competitor_count` competitors, first round first.
pub fn rounds(competitor_count: usize) -> Rounds {
    let total = total_rounds(competitor_count);

    Rounds {
        next: 1,
        total,
        offset: 0,
        size: match total {
            0 => 0,
            n => 1 << (n - 1),
        },
    }
}

/// An `Iterator` over the [`Round`]s of a bracket. Returned by [`rounds`].
#[derive(Clone, Debug)]
pub struct Rounds {
    next: usize,
    total: usize,
    offset: usize,
    size: usize,
}

impl Iterator for Rounds {
    type Item = Round;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.total {
            return None;
        }

        let round = Round {
            index: self.next,
            matches: self.offset..self.offset + self.size,
        };

        self.next += 1;
        self.offset += self.size;
        self.size /= 2;

        Some(round)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.total + 1).saturating_sub(self.next);
        (len, Some(len))
    }
}

impl ExactSizeIterator for Rounds {}

impl FusedIterator for Rounds {}

/// Returns the [`Round`] containing the match `id`.
pub fn round_of(competitor_count: usize, id: MatchId) -> Option<Round> {
    rounds(competitor_count).find(|round| round.matches.contains(&id))
}

/// Returns `true` if `id` is a match in the first round.
#[inline]
pub fn is_first_round(competitor_count: usize, id: MatchId) -> bool {
    rounds(competitor_count)
        .next()
        .map_or(false, |round| round.matches.contains(&id))
}

/// The match receiving the winner of another match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NextMatch {
    /// The id of the next match.
    pub index: MatchId,
    /// The slot within the next match that receives the winner.
    pub slot: Slot,
}

/// Returns the [`NextMatch`] of the match `id`. Returns `None` if `id` is the championship match
/// or out-of-bounds.
pub fn next_match(competitor_count: usize, id: MatchId) -> Option<NextMatch> {
    let round = round_of(competitor_count, id)?;

    if round.index == total_rounds(competitor_count) {
        return None;
    }

    let position = id - round.matches.start;

    Some(NextMatch {
        index: round.matches.end + position / 2,
        slot: Slot::from_position(position),
    })
}

/// Computes the id of the match receiving the winner for every match except the championship
/// match.
///
/// Within a round of `n` matches starting at `offset`, the match at position `spot` feeds the
/// match `offset + n + spot / 2`. The map therefore has `2^rounds - 2` entries.
pub fn next_match_map(competitor_count: usize) -> BTreeMap<MatchId, MatchId> {
    let total = total_rounds(competitor_count);
    let mut next_matches = BTreeMap::new();

    for round in rounds(competitor_count) {
        if round.index == total {
            break;
        }

        let current_round_matches = round.len();
        let match_count = round.matches.start;

        for spot in 0..current_round_matches {
            next_matches.insert(
                match_count + spot,
                match_count + current_round_matches + spot / 2,
            );
        }
    }

    next_matches
}

/// The two matches whose winners meet in a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Feeders {
    /// The lower indexed feeder, it fills [`Slot::One`].
    pub upper: MatchId,
    /// The higher indexed feeder, it fills [`Slot::Two`].
    pub lower: MatchId,
}

impl Feeders {
    /// Returns the feeder for `slot`.
    #[inline]
    pub fn get(&self, slot: Slot) -> MatchId {
        match slot {
            Slot::One => self.upper,
            Slot::Two => self.lower,
        }
    }
}

/// Inverts the [`next_match_map`], returning the [`Feeders`] of every match after the first
/// round.
pub fn feeder_map(competitor_count: usize) -> BTreeMap<MatchId, Feeders> {
    let mut feeders = BTreeMap::new();

    // The map is iterated in ascending order, so the upper feeder is always inserted first.
    for (source, next) in next_match_map(competitor_count) {
        feeders
            .entry(next)
            .or_insert(Feeders {
                upper: source,
                lower: source,
            })
            .lower = source;
    }

    feeders
}

/// Returns the [`Feeders`] of the match `id`. Returns `None` for first round matches and
/// out-of-bounds ids.
pub fn feeders(competitor_count: usize, id: MatchId) -> Option<Feeders> {
    let round = round_of(competitor_count, id)?;
    if round.index == 1 {
        return None;
    }

    // The previous round has exactly twice as many matches and ends where this round starts.
    let position = id - round.matches.start;
    let upper = round.matches.start - 2 * round.len() + 2 * position;

    Some(Feeders {
        upper,
        lower: upper + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    const VALID_COUNTS: [usize; 7] = [4, 8, 16, 32, 64, 128, 256];

    #[test]
    fn test_total_rounds() {
        assert_eq!(total_rounds(1), 0);
        assert_eq!(total_rounds(2), 1);
        assert_eq!(total_rounds(3), 2);
        assert_eq!(total_rounds(4), 2);
        assert_eq!(total_rounds(5), 3);
        assert_eq!(total_rounds(8), 3);
        assert_eq!(total_rounds(9), 4);
        assert_eq!(total_rounds(16), 4);
        assert_eq!(total_rounds(17), 5);
        assert_eq!(total_rounds(256), 8);

        for n in VALID_COUNTS {
            assert_eq!(total_rounds(n), n.trailing_zeros() as usize);
        }
    }

    #[test]
    fn test_total_matches() {
        assert_eq!(total_matches(4), 3);
        assert_eq!(total_matches(5), 7);
        assert_eq!(total_matches(256), 255);

        assert_eq!(championship(4), Some(2));
        assert_eq!(championship(8), Some(6));
        assert_eq!(championship(1), None);
    }

    #[test]
    fn test_rounds() {
        let rounds: Vec<Round> = rounds(8).collect();

        assert_eq!(
            rounds,
            vec![
                Round {
                    index: 1,
                    matches: 0..4
                },
                Round {
                    index: 2,
                    matches: 4..6
                },
                Round {
                    index: 3,
                    matches: 6..7
                },
            ]
        );

        assert_eq!(super::rounds(16).len(), 4);
        assert_eq!(super::rounds(1).count(), 0);

        assert_eq!(round_of(8, 5).map(|round| round.index), Some(2));
        assert_eq!(round_of(8, 5).and_then(|round| round.position(5)), Some(1));
        assert!(round_of(8, 7).is_none());

        assert!(is_first_round(8, 3));
        assert!(!is_first_round(8, 4));
    }

    #[test]
    fn test_next_match_map_four() {
        let map = next_match_map(4);

        assert_eq!(map, BTreeMap::from([(0, 2), (1, 2)]));
        assert!(next_match(4, 2).is_none());
    }

    #[test]
    fn test_next_match_map_eight() {
        let map = next_match_map(8);

        assert_eq!(
            map,
            BTreeMap::from([(0, 4), (1, 4), (2, 5), (3, 5), (4, 6), (5, 6)])
        );
    }

    #[test]
    fn test_next_match_map_valid_counts() {
        for n in VALID_COUNTS {
            let map = next_match_map(n);
            let championship = championship(n).unwrap();

            assert_eq!(map.len(), n - 2);
            assert!(!map.contains_key(&championship));

            for (source, next) in &map {
                assert_ne!(source, next);
                assert!(next > source);

                // The single lookup agrees with the map.
                assert_eq!(next_match(n, *source).map(|next| next.index), Some(*next));
            }

            // Every match after the first round is fed by exactly two matches.
            let feeders = feeder_map(n);
            assert_eq!(feeders.len(), n / 2 - 1);
            for (next, feeders) in feeders {
                assert_eq!(map[&feeders.upper], next);
                assert_eq!(map[&feeders.lower], next);
                assert_eq!(feeders.upper + 1, feeders.lower);
            }
        }
    }

    #[test]
    fn test_next_match_slot() {
        assert_eq!(
            next_match(8, 2),
            Some(NextMatch {
                index: 5,
                slot: Slot::One
            })
        );
        assert_eq!(
            next_match(8, 3),
            Some(NextMatch {
                index: 5,
                slot: Slot::Two
            })
        );
        assert_eq!(
            next_match(8, 5),
            Some(NextMatch {
                index: 6,
                slot: Slot::Two
            })
        );
        assert_eq!(next_match(8, 6), None);
        assert_eq!(next_match(8, 7), None);
    }

    #[test]
    fn test_feeder_map() {
        let feeders = feeder_map(8);

        assert_eq!(feeders[&4], Feeders { upper: 0, lower: 1 });
        assert_eq!(feeders[&5], Feeders { upper: 2, lower: 3 });
        assert_eq!(feeders[&6].get(Slot::Two), 5);
        assert!(!feeders.contains_key(&0));

        for n in VALID_COUNTS {
            let map = feeder_map(n);
            for id in 0..total_matches(n) {
                assert_eq!(super::feeders(n, id), map.get(&id).copied());
            }
        }
    }
}
