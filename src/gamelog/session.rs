//! Working totals for the match currently being read

use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use super::classifier::{KillEvent, WORLD_ACTOR};
use super::schema::Match;

/// Mutable accumulator for one open match.
///
/// Owned by the parser while the match is open and consumed by
/// [`Session::finish`] when it closes.
#[derive(Debug, Default)]
pub struct Session {
    total_kills: u32,
    players: BTreeSet<String>,
    kills: BTreeMap<String, i32>,
    kills_by_means: BTreeMap<String, u32>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_kills(&self) -> u32 {
        self.total_kills
    }

    /// Apply one kill to the running totals
    pub fn register_kill(&mut self, kill: &KillEvent<'_>) {
        self.total_kills += 1;

        for player in [kill.killer, kill.victim] {
            if player == WORLD_ACTOR {
                continue;
            }

            // players with zero net kills still get an entry
            if !self.players.contains(player) {
                self.players.insert(player.to_string());
                self.kills.insert(player.to_string(), 0);
            }
        }

        if kill.is_world_kill() {
            if let Some(tally) = self.kills.get_mut(kill.victim) {
                *tally -= 1;
            }
        } else if kill.killer != kill.victim {
            if let Some(tally) = self.kills.get_mut(kill.killer) {
                *tally += 1;
            }
        }
        // TODO: suicides (killer == victim) leave the tally untouched until
        // scoring rules decide whether they should cost a point

        *self.kills_by_means.entry(kill.cause.to_string()).or_insert(0) += 1;

        trace!(
            killer = kill.killer,
            victim = kill.victim,
            cause = kill.cause,
            total = self.total_kills,
            "Registered kill"
        );
    }

    /// Freeze the totals into a finished match
    pub fn finish(self) -> Match {
        Match {
            total_kills: self.total_kills,
            players: self.players.into_iter().collect(),
            kills: self.kills,
            kills_by_means: self.kills_by_means,
        }
    }
}
