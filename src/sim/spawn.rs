//! Spawn position allocation
//!
//! Drops released close together in time should not stack on top of each
//! other. The ledger remembers where recent drops appeared and rejection-
//! samples new positions away from them.

use rand::Rng;

use crate::consts::*;

/// A recent spawn position
#[derive(Debug, Clone, Copy, PartialEq)]
struct SpawnRecord {
    x: f32,
    time_ms: u64,
}

/// Result of a position pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPick {
    pub x: f32,
    /// True if every attempt violated spacing and the last candidate was taken
    pub relaxed: bool,
}

/// Recently used spawn positions
#[derive(Debug, Clone, Default)]
pub struct SpawnLedger {
    records: Vec<SpawnRecord>,
}

impl SpawnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions currently blocking new spawns
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Forget positions older than the spacing window
    pub fn prune(&mut self, now_ms: u64) {
        self.records
            .retain(|r| now_ms.saturating_sub(r.time_ms) < SPACING_WINDOW_MS);
    }

    fn is_clear(&self, candidate: f32, min_spacing: f32) -> bool {
        self.records
            .iter()
            .all(|r| (r.x - candidate).abs() >= min_spacing)
    }

    /// Pick a spawn x for a drop zone of `zone_width` and record it
    ///
    /// Never fails: after `SPAWN_ATTEMPTS` rejected candidates the last one
    /// is accepted even though it sits too close to a neighbour.
    pub fn allocate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        zone_width: f32,
        min_spacing: f32,
        now_ms: u64,
    ) -> SpawnPick {
        self.prune(now_ms);

        let center = zone_width / 2.0;
        let range = spawn_range(zone_width);

        let mut pick = SpawnPick {
            x: center,
            relaxed: true,
        };
        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = center + (rng.random::<f32>() - 0.5) * range;
            pick.x = candidate;
            if self.is_clear(candidate, min_spacing) {
                pick.relaxed = false;
                break;
            }
        }

        self.records.push(SpawnRecord {
            x: pick.x,
            time_ms: now_ms,
        });
        pick
    }
}

/// Width of the band spawn positions are drawn from
pub fn spawn_range(zone_width: f32) -> f32 {
    (zone_width - SPAWN_EDGE_MARGIN).min(MAX_SPAWN_RANGE).max(0.0)
}
