//! In-memory storage of brackets.
//!
//! Every tournament holds a single [`Snapshot`]. All writes to a tournament run under one write
//! lock and bump its revision, concurrent writers can use [`Store::compare_and_swap`] to detect
//! that their snapshot went stale.
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

use brackets_core::Bracket;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod id;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TournamentId(pub u64);

impl Display for TournamentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TournamentId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A bracket together with the revision it was stored at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub revision: u64,
    pub bracket: Bracket,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tournament {0} does not exist")]
    NotFound(TournamentId),
    #[error("tournament {id} was modified: expected revision {expected}, found {found}")]
    Conflict {
        id: TournamentId,
        expected: u64,
        found: u64,
    },
    #[error(transparent)]
    Bracket(#[from] brackets_core::Error),
}

#[derive(Debug, Default)]
pub struct Store {
    tournaments: RwLock<HashMap<TournamentId, Snapshot>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new `bracket`, returning the id of the new tournament.
    pub fn insert(&self, bracket: Bracket) -> TournamentId {
        let id = TournamentId::generate();

        self.tournaments.write().insert(
            id,
            Snapshot {
                revision: 0,
                bracket,
            },
        );

        log::debug!("Inserted tournament {}", id);

        id
    }

    pub fn get(&self, id: TournamentId) -> Option<Snapshot> {
        self.tournaments.read().get(&id).cloned()
    }

    /// Returns the ids of all tournaments in ascending order.
    pub fn list(&self) -> Vec<TournamentId> {
        let mut ids: Vec<TournamentId> = self.tournaments.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn remove(&self, id: TournamentId) -> Option<Snapshot> {
        let snapshot = self.tournaments.write().remove(&id);

        if snapshot.is_some() {
            log::debug!("Removed tournament {}", id);
        }

        snapshot
    }

    /// Runs `f` on the bracket of the tournament `id` and stores the result. Other writers are
    /// blocked until `f` returns. The bracket is left untouched if `f` fails.
    ///
    /// When `revision` is given the update is only applied if the stored snapshot still has that
    /// revision.
    pub fn update<F>(
        &self,
        id: TournamentId,
        revision: Option<u64>,
        f: F,
    ) -> Result<Snapshot, StoreError>
    where
        F: FnOnce(&mut Bracket) -> brackets_core::Result<()>,
    {
        let mut tournaments = self.tournaments.write();

        let snapshot = tournaments.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(expected) = revision {
            if snapshot.revision != expected {
                return Err(StoreError::Conflict {
                    id,
                    expected,
                    found: snapshot.revision,
                });
            }
        }

        let mut bracket = snapshot.bracket.clone();
        f(&mut bracket)?;

        snapshot.bracket = bracket;
        snapshot.revision += 1;

        log::debug!("Updated tournament {} to revision {}", id, snapshot.revision);

        Ok(snapshot.clone())
    }

    /// Replaces the bracket of the tournament `id` if it is still at `revision`.
    pub fn compare_and_swap(
        &self,
        id: TournamentId,
        revision: u64,
        bracket: Bracket,
    ) -> Result<Snapshot, StoreError> {
        self.update(id, Some(revision), move |current| {
            *current = bracket;
            Ok(())
        })
    }
}
