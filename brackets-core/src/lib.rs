//! # brackets-core
//!
//! This crate contains the bracket engine for single elimination tournaments. It builds the
//! match tree from a flat list of competitors, propagates reported winners through the tree and
//! projects the tree into views for presentation.
//!
//! Important types:
//! - [`Bracket`]: The complete match tree of one tournament.
//! - [`Competitors`]: A wrapper around `Vec<Competitor>` in seeding order.
//! - [`Matches`]: A `Vec` of matches, indexed by [`MatchId`].
//! - [`Match`]: A *match* of two [`Slot`]s, each of which may hold a competitor.
//! - [`RenderModel`]: The positional layout produced by [`render_layout`].
//! - [`MatchListEntry`]: An entry of the linear view produced by [`match_list`].
//!
//! ## Feature Flags
//!
//! `serde`: Adds `Serialize` and `Deserialize` impls to almost all types. Deserializing a
//! [`Bracket`] validates the snapshot the same way [`Bracket::resume`] does.
//!
pub mod advance;
pub mod builder;
pub mod match_list;
pub mod render;
pub mod rounds;
pub mod validate;

pub use advance::AdvancePolicy;
pub use builder::BuildOptions;
pub use match_list::{match_list, MatchListEntry, Narration};
pub use render::{render_layout, RenderModel, RenderOptions};

use rounds::NextMatch;

use thiserror::Error;

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::result;
use std::vec::IntoIter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The index of a [`Match`] within a [`Bracket`].
///
/// Match ids are dense and assigned round by round, first round first, in slot order.
pub type MatchId = usize;

/// The unique and stable identifier of a [`Competitor`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CompetitorId(pub u64);

impl Display for CompetitorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for CompetitorId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
}

impl Competitor {
    #[inline]
    pub fn new<T>(id: CompetitorId, name: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A wrapper around a `Vec<Competitor>` in seeding order.
///
/// This is a wrapper around a `Vec<Competitor>` and has the same layout as a `Vec<Competitor>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Competitors {
    competitors: Vec<Competitor>,
}

impl Competitors {
    /// Creates a new empty `Competitors` list.
    #[inline]
    pub fn new() -> Self {
        Self {
            competitors: Vec::new(),
        }
    }

    /// Creates a `Competitors` list from `names`, assigning ids in input order starting at 0.
    pub fn from_names<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Competitor::new(CompetitorId(index as u64), name))
            .collect()
    }

    /// Returns the competitor with the given `id`.
    pub fn find(&self, id: CompetitorId) -> Option<&Competitor> {
        self.competitors.iter().find(|competitor| competitor.id == id)
    }

    /// Returns the first id that appears more than once.
    pub(crate) fn first_duplicate(&self) -> Option<CompetitorId> {
        let mut seen = HashSet::with_capacity(self.competitors.len());

        self.competitors
            .iter()
            .map(|competitor| competitor.id)
            .find(|id| !seen.insert(*id))
    }
}

impl FromIterator<Competitor> for Competitors {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Competitor>,
    {
        Self {
            competitors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Competitors {
    type Item = Competitor;
    type IntoIter = IntoIter<Competitor>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.competitors.into_iter()
    }
}

impl Deref for Competitors {
    type Target = Vec<Competitor>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.competitors
    }
}

impl From<Vec<Competitor>> for Competitors {
    #[inline]
    fn from(competitors: Vec<Competitor>) -> Self {
        Self { competitors }
    }
}

/// A wrapper around a `Vec<Match>` where the position of each [`Match`] equals its [`MatchId`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Matches {
    matches: Vec<Match>,
}

impl Matches {
    #[inline]
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            matches: Vec::with_capacity(capacity),
        }
    }
}

impl Deref for Matches {
    type Target = Vec<Match>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.matches
    }
}

impl DerefMut for Matches {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.matches
    }
}

impl<U> PartialEq<U> for Matches
where
    U: AsRef<[Match]>,
{
    #[inline]
    fn eq(&self, other: &U) -> bool {
        self.matches == other.as_ref()
    }
}

impl From<Vec<Match>> for Matches {
    #[inline]
    fn from(matches: Vec<Match>) -> Self {
        Self { matches }
    }
}

/// One of the two positions in a [`Match`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    /// Returns the slot fed by the match at the round-relative `position`. Of two sibling
    /// matches the lower indexed one feeds [`One`], the higher indexed one feeds [`Two`].
    ///
    /// [`One`]: Self::One
    /// [`Two`]: Self::Two
    #[inline]
    pub fn from_position(position: usize) -> Self {
        if position % 2 == 0 {
            Self::One
        } else {
            Self::Two
        }
    }

    /// Returns the opposing slot.
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MatchStatus {
    /// No winner has been reported yet.
    #[default]
    Pending,
    /// Exactly one slot was populated at creation, the other one is permanently absent.
    Bye,
    /// The winner has been propagated into the next match.
    Decided,
}

/// A match between the competitors in slot one and slot two.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub id: MatchId,
    pub one_id: Option<CompetitorId>,
    pub two_id: Option<CompetitorId>,
    pub status: MatchStatus,
}

impl Match {
    /// Creates a new pending `Match` without any competitors.
    #[inline]
    pub fn new(id: MatchId) -> Self {
        Self {
            id,
            one_id: None,
            two_id: None,
            status: MatchStatus::Pending,
        }
    }

    /// Creates a new pending `Match` between `one_id` and `two_id`.
    #[inline]
    pub fn with_competitors(
        id: MatchId,
        one_id: Option<CompetitorId>,
        two_id: Option<CompetitorId>,
    ) -> Self {
        Self {
            id,
            one_id,
            two_id,
            status: MatchStatus::Pending,
        }
    }

    /// Creates a new bye `Match` where `one_id` has no opponent.
    #[inline]
    pub fn bye(id: MatchId, one_id: Option<CompetitorId>) -> Self {
        Self {
            id,
            one_id,
            two_id: None,
            status: MatchStatus::Bye,
        }
    }

    /// Returns the competitor in `slot`.
    #[inline]
    pub fn get(&self, slot: Slot) -> Option<CompetitorId> {
        self[slot]
    }

    /// Returns the slot holding `competitor`.
    pub fn slot_of(&self, competitor: CompetitorId) -> Option<Slot> {
        if self.one_id == Some(competitor) {
            Some(Slot::One)
        } else if self.two_id == Some(competitor) {
            Some(Slot::Two)
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, competitor: CompetitorId) -> bool {
        self.slot_of(competitor).is_some()
    }

    /// Returns `true` if neither slot holds a competitor.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.one_id.is_none() && self.two_id.is_none()
    }

    #[inline]
    pub fn is_bye(&self) -> bool {
        matches!(self.status, MatchStatus::Bye)
    }

    #[inline]
    pub fn is_decided(&self) -> bool {
        matches!(self.status, MatchStatus::Decided)
    }

    /// Returns an iterator over the competitors of this match, slot one first.
    pub fn competitors(&self) -> impl Iterator<Item = CompetitorId> {
        self.one_id.into_iter().chain(self.two_id)
    }
}

impl Index<Slot> for Match {
    type Output = Option<CompetitorId>;

    #[inline]
    fn index(&self, slot: Slot) -> &Self::Output {
        match slot {
            Slot::One => &self.one_id,
            Slot::Two => &self.two_id,
        }
    }
}

impl IndexMut<Slot> for Match {
    #[inline]
    fn index_mut(&mut self, slot: Slot) -> &mut Self::Output {
        match slot {
            Slot::One => &mut self.one_id,
            Slot::Two => &mut self.two_id,
        }
    }
}

/// The complete single elimination match tree of one tournament.
///
/// A `Bracket` is created once by [`Bracket::new`] and afterwards only changed through
/// [`Bracket::advance`] and [`Bracket::clear`]. The last match is the championship match, it has
/// no successor and its winner is stored as the [`champion`].
///
/// [`champion`]: Self::champion
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "BracketParts"))]
pub struct Bracket {
    competitors: Competitors,
    matches: Matches,
    rounds: usize,
    champion: Option<CompetitorId>,
}

impl Bracket {
    /// Returns a reference to the competitors in seeding order.
    #[inline]
    pub fn competitors(&self) -> &Competitors {
        &self.competitors
    }

    /// Returns a reference to all matches, ordered by [`MatchId`].
    #[inline]
    pub fn matches(&self) -> &Matches {
        &self.matches
    }

    /// Returns the number of rounds in the bracket.
    #[inline]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Returns the winner of the championship match, if it was reported.
    #[inline]
    pub fn champion(&self) -> Option<CompetitorId> {
        self.champion
    }

    /// Returns the match with the given `id`.
    #[inline]
    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.matches.get(id)
    }

    /// Returns the competitor with the given `id`.
    #[inline]
    pub fn competitor(&self, id: CompetitorId) -> Option<&Competitor> {
        self.competitors.find(id)
    }

    /// Returns the id of the championship match.
    #[inline]
    pub fn championship(&self) -> Option<MatchId> {
        rounds::championship(self.competitors.len())
    }

    /// Returns the match receiving the winner of `id`, `None` for the championship match.
    #[inline]
    pub fn next_match(&self, id: MatchId) -> Option<NextMatch> {
        rounds::next_match(self.competitors.len(), id)
    }

    /// Returns `true` if `id` is a match in the first round.
    #[inline]
    pub fn is_first_round(&self, id: MatchId) -> bool {
        rounds::is_first_round(self.competitors.len(), id)
    }

    /// Consumes the `Bracket`, returning its parts.
    pub fn into_parts(self) -> BracketParts {
        BracketParts {
            competitors: self.competitors,
            matches: self.matches,
            rounds: self.rounds,
            champion: self.champion,
        }
    }
}

/// The raw parts of a [`Bracket`], usually a snapshot that was persisted by a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BracketParts {
    pub competitors: Competitors,
    pub matches: Matches,
    pub rounds: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub champion: Option<CompetitorId>,
}

impl TryFrom<BracketParts> for Bracket {
    type Error = Error;

    fn try_from(parts: BracketParts) -> Result<Self> {
        Self::resume(parts)
    }
}

/// An `Result<T>` using [`enum@Error`] as an error type.
pub type Result<T> = result::Result<T, Error>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid number of competitors: {found}")]
    InvalidCompetitorCount { found: usize },
    #[error("competitor {0} appears more than once")]
    DuplicateCompetitor(CompetitorId),
    #[error("competitor names must be unique, repeated: {}", .0.join(", "))]
    DuplicateNames(Vec<String>),
    #[error("invalid number of rounds: expected {expected}, found {found}")]
    InvalidNumberOfRounds { expected: usize, found: usize },
    #[error("invalid number of matches: expected {expected}, found {found}")]
    InvalidNumberOfMatches { expected: usize, found: usize },
    #[error("invalid match id: match at position {index} has id {found}")]
    InvalidMatchId { index: usize, found: MatchId },
    #[error("invalid bye: match {0} cannot be a bye")]
    InvalidBye(MatchId),
    #[error("match {match_id} refers to unknown competitor {competitor}")]
    UnknownCompetitor {
        match_id: MatchId,
        competitor: CompetitorId,
    },
    #[error("competitor {competitor} is not part of match {match_id}")]
    NotInMatch {
        match_id: MatchId,
        competitor: CompetitorId,
    },
    #[error("match {0} does not exist")]
    MatchNotFound(MatchId),
    #[error("match {0} has no competitors yet")]
    EmptyMatch(MatchId),
    #[error("match {0} is already decided")]
    AlreadyDecided(MatchId),
    #[error("match {0} is a bye")]
    Bye(MatchId),
    #[error("match {0} is a first round match")]
    FirstRound(MatchId),
    #[error("match {0} is the championship match")]
    Championship(MatchId),
    #[error("match {next} following match {match_id} is already decided")]
    SuccessorDecided { match_id: MatchId, next: MatchId },
    #[error("match {match_id} is waiting for the winner of match {feeder}")]
    OpponentPending { match_id: MatchId, feeder: MatchId },
}

impl Error {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCompetitorCount { .. }
            | Self::DuplicateCompetitor(_)
            | Self::DuplicateNames(_)
            | Self::InvalidNumberOfRounds { .. }
            | Self::InvalidNumberOfMatches { .. }
            | Self::InvalidMatchId { .. }
            | Self::InvalidBye(_)
            | Self::UnknownCompetitor { .. }
            | Self::NotInMatch { .. } => ErrorKind::InvalidArgument,
            Self::MatchNotFound(_) | Self::EmptyMatch(_) => ErrorKind::NotFound,
            Self::AlreadyDecided(_)
            | Self::Bye(_)
            | Self::FirstRound(_)
            | Self::Championship(_)
            | Self::SuccessorDecided { .. }
            | Self::OpponentPending { .. } => ErrorKind::InvalidState,
        }
    }
}

/// The category of an [`enum@Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input has a malformed shape.
    InvalidArgument,
    /// A referenced match or competitor is absent.
    NotFound,
    /// The operation is not permitted in the current state of the bracket.
    InvalidState,
}
