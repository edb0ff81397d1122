use brackets_core::render::{MatchActions, RenderCompetitor, RenderModel, RenderSlot};
use brackets_core::MatchListEntry;

use crate::labels::Labels;

/// Formats the layout of a bracket, one block per round.
pub fn bracket(model: &RenderModel, labels: &Labels) -> String {
    let mut buf = String::new();

    for round in &model.rounds {
        buf.push_str(&format!("== {} ==\n", labels.round(round.label)));

        for slot in &round.slots {
            buf.push_str(&self::slot(slot, labels));
            buf.push('\n');

            if let Some(actions) = &slot.actions {
                if let Some(line) = self::actions(slot, actions, labels) {
                    buf.push_str(&format!("      {}\n", line));
                }
            }
        }

        buf.push('\n');
    }

    buf.push_str(&format!("== {} ==\n", labels.round(model.winner.label)));
    buf.push_str(labels.competitor(model.winner.champion.as_ref()));
    buf.push_str("\n\n");

    buf.push_str(&format!(
        "{}: {:.0}%\n",
        labels.progress,
        model.progress * 100.0
    ));

    buf
}

fn slot(slot: &RenderSlot, labels: &Labels) -> String {
    let number = slot.match_id + 1;

    if slot.bye {
        let competitor = slot.one.as_ref().or(slot.two.as_ref());
        return format!(
            "{:>4}  {} ({})",
            number,
            labels.competitor(competitor),
            labels.bye
        );
    }

    format!(
        "{:>4}  {} vs {}",
        number,
        labels.competitor(slot.one.as_ref()),
        labels.competitor(slot.two.as_ref())
    )
}

fn actions(slot: &RenderSlot, actions: &MatchActions, labels: &Labels) -> Option<String> {
    let mut parts = Vec::new();

    let names: Vec<&str> = [&slot.one, &slot.two]
        .into_iter()
        .flatten()
        .filter(|competitor: &&RenderCompetitor| actions.advance.contains(&competitor.id))
        .map(|competitor| competitor.name.as_str())
        .collect();

    if !names.is_empty() {
        parts.push(format!("{}: {}", labels.advance, names.join(", ")));
    }

    if actions.clear {
        parts.push(labels.clear.clone());
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("[{}]", parts.join(" | ")))
    }
}

/// Formats the match list, one line per match.
pub fn matches(entries: &[MatchListEntry], labels: &Labels) -> String {
    let mut buf = String::new();

    for entry in entries {
        let number = labels
            .match_number
            .replace("{number}", &entry.number.to_string());

        buf.push_str(&format!("{}: {}\n", number, labels.narrate(&entry.narration)));
    }

    buf
}
