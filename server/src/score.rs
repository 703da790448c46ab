//! Per-player star ledger with a configured win threshold.

use log::{debug, info};
use shared::{ClientId, ListEvent, ReplicatedList};

/// A player's score row. Stars are monotonically non-decreasing for the
/// lifetime of the connection; rounds never reset them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub stars: u32,
}

/// Authority-owned score table. Entries live exactly as long as the
/// connection they belong to.
pub struct ScoreLedger {
    scores: ReplicatedList<ScoreEntry>,
    finish_score: u32,
}

impl ScoreLedger {
    pub fn new(finish_score: u32) -> Self {
        Self {
            scores: ReplicatedList::new(),
            finish_score,
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ListEvent<ScoreEntry>) + Send + 'static) {
        self.scores.subscribe(observer);
    }

    /// Creates a zero-star entry for a newly connected client. Existing
    /// entries are left alone so a duplicate connect never wipes a score.
    pub fn track(&mut self, client_id: ClientId) {
        if !self.scores.contains(client_id) {
            self.scores.upsert(client_id, ScoreEntry { stars: 0 });
        }
    }

    pub fn forget(&mut self, client_id: ClientId) {
        self.scores.remove(client_id);
    }

    /// Awards stars to a client. Unknown clients (already disconnected) are
    /// a no-op. Returns the new total when the award applied.
    pub fn award_star(&mut self, client_id: ClientId, count: u32) -> Option<u32> {
        let current = self.scores.get(client_id)?.stars;
        let total = current + count;
        self.scores.upsert(client_id, ScoreEntry { stars: total });
        info!("Client {} now has {} stars", client_id, total);
        if total >= self.finish_score {
            debug!("Client {} reached finish score {}", client_id, self.finish_score);
        }
        Some(total)
    }

    pub fn stars(&self, client_id: ClientId) -> Option<u32> {
        self.scores.get(client_id).map(|entry| entry.stars)
    }

    pub fn reached_finish(&self, client_id: ClientId) -> bool {
        self.stars(client_id)
            .map(|stars| stars >= self.finish_score)
            .unwrap_or(false)
    }

    pub fn finish_score(&self) -> u32 {
        self.finish_score
    }

    pub fn standings(&self) -> Vec<(ClientId, u32)> {
        self.scores
            .iter()
            .map(|(id, entry)| (*id, entry.stars))
            .collect()
    }
}
