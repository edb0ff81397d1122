use snowflaked::sync::Generator;

use super::TournamentId;

const INSTANCE: u16 = 0;

static TOURNAMENT: Generator = Generator::new_unchecked(INSTANCE);

impl TournamentId {
    /// Generates a new, unique `TournamentId`. Ids are ordered by creation time.
    pub fn generate() -> Self {
        Self(TOURNAMENT.generate())
    }
}
