//! # Bracket Rendering
//!
//! The `render` module projects a [`Bracket`] into a positional layout. The layout is plain
//! data: every round becomes a column of [`RenderSlot`]s, labels are [`RoundLabel`] values and
//! never text. Turning a [`RenderModel`] into markup or text is left to the presentation layer.
//!
//! Rendering is pure, rendering the same bracket twice yields the same [`RenderModel`].
use crate::rounds::{self, Feeders};
use crate::{AdvancePolicy, Bracket, CompetitorId, Match, MatchId, MatchStatus};

use std::fmt::{self, Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options used by [`render_layout`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderOptions {
    /// Include the [`MatchActions`] available for every match.
    pub can_edit: bool,
    /// Flag byes in the layout. When `false` byes are rendered like any other match.
    pub show_byes: bool,
    /// The policy used to compute which competitors may be advanced.
    pub policy: AdvancePolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            can_edit: false,
            show_byes: true,
            policy: AdvancePolicy::default(),
        }
    }
}

/// The complete layout of a [`Bracket`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderModel {
    /// The header of every column, one per round followed by [`RoundLabel::Winner`].
    pub labels: Vec<RoundLabel>,
    pub rounds: Vec<RenderRound>,
    pub winner: WinnerSlot,
    /// The completion of the bracket between `0.0` and `1.0`.
    pub progress: f64,
}

/// A single column of the layout.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderRound {
    /// The 1-based index of the round.
    pub round: usize,
    pub label: RoundLabel,
    /// The number of half match spacers before and after every slot in this round.
    pub padding: usize,
    pub slots: Vec<RenderSlot>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderSlot {
    pub match_id: MatchId,
    pub one: Option<RenderCompetitor>,
    pub two: Option<RenderCompetitor>,
    pub status: MatchStatus,
    /// The shape of the line leading into this match.
    pub connector: Connector,
    pub bye: bool,
    /// The side of the line leaving this match, `None` for the championship match.
    pub half: Option<Half>,
    pub actions: Option<MatchActions>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderCompetitor {
    pub id: CompetitorId,
    pub name: String,
}

impl RenderCompetitor {
    fn new(bracket: &Bracket, id: Option<CompetitorId>) -> Option<Self> {
        let id = id?;

        // Snapshots are validated, a missing competitor is shown without a name.
        let name = bracket
            .competitor(id)
            .map(|competitor| competitor.name.clone())
            .unwrap_or_default();

        Some(Self { id, name })
    }
}

/// The line leading from the previous round into a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Connector {
    /// No line, used in the first round and when both feeders are byes.
    NoMatch,
    /// Only the lower feeder is drawn, the upper one is a bye.
    UpperBye,
    /// Only the upper feeder is drawn, the lower one is a bye.
    LowerBye,
    /// Both feeders are drawn.
    NoBye,
}

impl Connector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMatch => "no-match",
            Self::UpperBye => "upper-bye",
            Self::LowerBye => "lower-bye",
            Self::NoBye => "no-bye",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Half {
    Top,
    Bottom,
}

/// The operations an editor may perform on a match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchActions {
    /// The competitors that may be reported as winner.
    pub advance: Vec<CompetitorId>,
    /// Whether the reported winner may be cleared.
    pub clear: bool,
}

/// The column after the championship match.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WinnerSlot {
    pub label: RoundLabel,
    pub champion: Option<RenderCompetitor>,
}

/// The header of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RoundLabel {
    Round1,
    Round2,
    Round3,
    Round4,
    Round5,
    QuarterFinals,
    SemiFinals,
    Finals,
    Winner,
}

impl RoundLabel {
    /// All labels in display order.
    pub const ALL: [Self; 9] = [
        Self::Round1,
        Self::Round2,
        Self::Round3,
        Self::Round4,
        Self::Round5,
        Self::QuarterFinals,
        Self::SemiFinals,
        Self::Finals,
        Self::Winner,
    ];

    /// Returns the labels for a bracket with `rounds` rounds, one per round and
    /// [`RoundLabel::Winner`] last.
    ///
    /// Named rounds are dropped when the bracket is too small to reach them. `Round 1` and
    /// `Winner` are always kept.
    pub fn filtered(rounds: usize) -> Vec<Self> {
        // Each label is dropped when the bracket has at most this many rounds.
        const DROP: [(RoundLabel, usize); 6] = [
            (RoundLabel::Round5, 7),
            (RoundLabel::Round4, 6),
            (RoundLabel::QuarterFinals, 5),
            (RoundLabel::Round3, 4),
            (RoundLabel::SemiFinals, 3),
            (RoundLabel::Round2, 2),
        ];

        let mut labels: Vec<Self> = Self::ALL
            .into_iter()
            .filter(|label| {
                !DROP
                    .iter()
                    .any(|(dropped, max)| dropped == label && rounds <= *max)
            })
            .collect();

        // A single round bracket has no room for `Finals`.
        while labels.len() > rounds + 1 && labels.len() >= 2 {
            labels.remove(labels.len() - 2);
        }

        labels
    }

    /// Returns the default english text of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Round1 => "Round 1",
            Self::Round2 => "Round 2",
            Self::Round3 => "Round 3",
            Self::Round4 => "Round 4",
            Self::Round5 => "Round 5",
            Self::QuarterFinals => "Quarter-Finals",
            Self::SemiFinals => "Semi-Finals",
            Self::Finals => "Finals",
            Self::Winner => "Winner",
        }
    }
}

impl Display for RoundLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the completion of `bracket` between `0.0` and `1.0`.
///
/// Every populated slot after the first round counts as one finished slot, as does a recorded
/// champion. The result is the number of finished slots divided by `2^rounds - 1`.
pub fn progress(bracket: &Bracket) -> f64 {
    let total = rounds::total_matches(bracket.competitors().len());
    if total == 0 {
        return 0.0;
    }

    let first_later = (total + 1) / 2;

    let mut finished = bracket
        .matches()
        .iter()
        .skip(first_later)
        .map(|r#match| r#match.competitors().count())
        .sum::<usize>();

    if bracket.champion().is_some() {
        finished += 1;
    }

    finished as f64 / total as f64
}

/// Projects `bracket` into a [`RenderModel`] using the given `options`.
pub fn render_layout(bracket: &Bracket, options: &RenderOptions) -> RenderModel {
    let competitor_count = bracket.competitors().len();
    let labels = RoundLabel::filtered(bracket.rounds());
    let championship = bracket.championship();
    let feeders = rounds::feeder_map(competitor_count);

    let is_bye = |id: MatchId| {
        options.show_byes && bracket.get(id).map_or(false, Match::is_bye)
    };

    let rounds = rounds::rounds(competitor_count)
        .map(|round| {
            let slots = round
                .matches
                .clone()
                .filter_map(|id| bracket.get(id))
                .map(|r#match| {
                    let connector = match feeders.get(&r#match.id) {
                        None => Connector::NoMatch,
                        Some(Feeders { upper, lower }) => {
                            match (is_bye(*upper), is_bye(*lower)) {
                                (true, true) => Connector::NoMatch,
                                (true, false) => Connector::UpperBye,
                                (false, true) => Connector::LowerBye,
                                (false, false) => Connector::NoBye,
                            }
                        }
                    };

                    let half = if Some(r#match.id) == championship {
                        None
                    } else if r#match.id % 2 == 0 {
                        Some(Half::Top)
                    } else {
                        Some(Half::Bottom)
                    };

                    let bye = is_bye(r#match.id);

                    let actions = if options.can_edit && !bye && !r#match.is_empty() {
                        Some(MatchActions {
                            advance: r#match
                                .competitors()
                                .filter(|competitor| {
                                    bracket.can_advance(r#match.id, *competitor, options.policy)
                                })
                                .collect(),
                            clear: r#match.is_decided() && bracket.can_clear(r#match.id),
                        })
                    } else {
                        None
                    };

                    RenderSlot {
                        match_id: r#match.id,
                        one: RenderCompetitor::new(bracket, r#match.one_id),
                        two: RenderCompetitor::new(bracket, r#match.two_id),
                        status: r#match.status,
                        connector,
                        bye,
                        half,
                        actions,
                    }
                })
                .collect();

            RenderRound {
                round: round.index,
                label: labels
                    .get(round.index - 1)
                    .copied()
                    .unwrap_or(RoundLabel::Round1),
                padding: (1 << round.index) - 1,
                slots,
            }
        })
        .collect();

    RenderModel {
        winner: WinnerSlot {
            label: RoundLabel::Winner,
            champion: RenderCompetitor::new(bracket, bracket.champion()),
        },
        labels,
        rounds,
        progress: progress(bracket),
    }
}
