//! The text shown to the user. Narration templates contain placeholders in braces, e.g.
//! `{winner}`, which are replaced by the names of the competitors.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use brackets_core::render::{RoundLabel, RenderCompetitor};
use brackets_core::Narration;
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Column headers. Missing labels fall back to the english name.
    pub rounds: HashMap<RoundLabel, String>,
    /// Shown in place of an unknown competitor.
    pub tbd: String,
    pub bye: String,
    pub advance: String,
    pub clear: String,
    pub progress: String,
    pub match_number: String,
    pub defeated: String,
    pub lost_to: String,
    pub advanced: String,
    pub versus: String,
    pub awaiting_opponent: String,
    pub undecided: String,
}

impl Labels {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let buf = fs::read(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;

        serde_json::from_slice(&buf).map_err(|source| Error::Json {
            path: path.to_owned(),
            source,
        })
    }

    pub fn round(&self, label: RoundLabel) -> &str {
        self.rounds
            .get(&label)
            .map(String::as_str)
            .unwrap_or_else(|| label.as_str())
    }

    pub fn competitor<'a>(&'a self, competitor: Option<&'a RenderCompetitor>) -> &'a str {
        match competitor {
            Some(competitor) => &competitor.name,
            None => &self.tbd,
        }
    }

    pub fn narrate(&self, narration: &Narration) -> String {
        match narration {
            Narration::Defeated { winner, loser } => {
                fill(&self.defeated, &[("winner", winner), ("loser", loser)])
            }
            Narration::LostTo { loser, winner } => {
                fill(&self.lost_to, &[("loser", loser), ("winner", winner)])
            }
            Narration::Advanced { competitor } => {
                fill(&self.advanced, &[("competitor", competitor)])
            }
            Narration::Versus { one, two } => fill(&self.versus, &[("one", one), ("two", two)]),
            Narration::AwaitingOpponent { competitor } => {
                fill(&self.awaiting_opponent, &[("competitor", competitor)])
            }
            Narration::Undecided => self.undecided.clone(),
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            rounds: RoundLabel::ALL
                .into_iter()
                .map(|label| (label, label.as_str().to_owned()))
                .collect(),
            tbd: String::from("TBD"),
            bye: String::from("Bye"),
            advance: String::from("Advance"),
            clear: String::from("Clear"),
            progress: String::from("Progress"),
            match_number: String::from("Match {number}"),
            defeated: String::from("{winner} defeated {loser}"),
            lost_to: String::from("{loser} lost to {winner}"),
            advanced: String::from("{competitor} advanced"),
            versus: String::from("{one} vs {two}"),
            awaiting_opponent: String::from("{competitor} opponent not yet decided"),
            undecided: String::from("Match competitors not yet decided"),
        }
    }
}

fn fill(template: &str, names: &[(&str, &RenderCompetitor)]) -> String {
    names
        .iter()
        .fold(template.to_owned(), |text, (key, competitor)| {
            text.replace(&format!("{{{}}}", key), &competitor.name)
        })
}
