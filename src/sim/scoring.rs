//! Purity accumulation and milestone tracking

use std::collections::BTreeSet;

use crate::consts::{MAX_PURITY, MIN_PURITY};
use crate::tuning::{Milestone, Tuning};

/// Purity after catching one drop, clamped per update
pub fn apply_catch(purity: f32, is_dirty: bool, tuning: &Tuning) -> f32 {
    let delta = if is_dirty {
        -tuning.dirty_catch_penalty
    } else {
        tuning.clean_catch_bonus
    };
    (purity + delta).clamp(MIN_PURITY, MAX_PURITY)
}

/// Records which milestones have fired this session
#[derive(Debug, Clone, Default)]
pub struct MilestoneTracker {
    /// Indices into the milestone table
    achieved: BTreeSet<usize>,
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every milestone at or below `purity` that has not fired yet
    ///
    /// Returns the newly fired milestones in table order.
    pub fn evaluate<'a>(&mut self, purity: f32, table: &'a [Milestone]) -> Vec<&'a Milestone> {
        table
            .iter()
            .enumerate()
            .filter(|(_, m)| m.threshold <= purity)
            .filter(|(i, _)| self.achieved.insert(*i))
            .map(|(_, m)| m)
            .collect()
    }

    pub fn is_achieved(&self, index: usize) -> bool {
        self.achieved.contains(&index)
    }

    pub fn achieved_count(&self) -> usize {
        self.achieved.len()
    }

    pub fn clear(&mut self) {
        self.achieved.clear();
    }
}
