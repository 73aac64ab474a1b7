//! Game balance
//!
//! Difficulty profiles are a static table. Everything else that shapes a
//! session's scoring lives in [`Tuning`], which defaults to the shipped values.

use serde::{Deserialize, Serialize};

/// Difficulty tier, picked on the start screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Timing and spacing constants for this tier
    pub fn profile(&self) -> &'static DifficultyProfile {
        match self {
            Difficulty::Easy => &EASY,
            Difficulty::Normal => &NORMAL,
            Difficulty::Hard => &HARD,
        }
    }
}

/// Drop generation constants for one difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyProfile {
    /// Time for a drop to travel from the spout to the floor
    pub fall_duration_ms: u64,
    /// Inclusive range of drops released per squeeze
    pub drops_per_squeeze_min: u32,
    pub drops_per_squeeze_max: u32,
    /// Delay between consecutive drops of one squeeze
    pub inter_drop_ms: u64,
    /// Minimum horizontal distance between recently spawned drops
    pub min_spacing: f32,
    /// Squeeze button lock after a press
    pub button_cooldown_ms: u64,
}

static EASY: DifficultyProfile = DifficultyProfile {
    fall_duration_ms: 1800,
    drops_per_squeeze_min: 2,
    drops_per_squeeze_max: 4,
    inter_drop_ms: 200,
    min_spacing: 34.0,
    button_cooldown_ms: 1600,
};

static NORMAL: DifficultyProfile = DifficultyProfile {
    fall_duration_ms: 1500,
    drops_per_squeeze_min: 3,
    drops_per_squeeze_max: 5,
    inter_drop_ms: 150,
    min_spacing: 28.0,
    button_cooldown_ms: 2000,
};

static HARD: DifficultyProfile = DifficultyProfile {
    fall_duration_ms: 1100,
    drops_per_squeeze_min: 4,
    drops_per_squeeze_max: 6,
    inter_drop_ms: 110,
    min_spacing: 24.0,
    button_cooldown_ms: 2200,
};

/// A one-time congratulation fired when purity first reaches `threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub threshold: f32,
    pub message: String,
}

/// Milestone table, ascending by threshold
const MILESTONES: [(f32, &str); 4] = [
    (25.0, "Getting cleaner!"),
    (50.0, "Halfway there! The water is clearing up."),
    (75.0, "Almost drinkable!"),
    (100.0, "Mission accomplished! Crystal clear water!"),
];

/// Session-wide balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Squeezes per filter phase
    pub max_squeezes: u32,
    /// Probability that a spawned drop is dirty
    pub dirty_chance: f64,
    /// Purity gained for catching a clean drop
    pub clean_catch_bonus: f32,
    /// Purity lost for catching a dirty drop
    pub dirty_catch_penalty: f32,
    /// Ordered milestone table
    pub milestones: Vec<Milestone>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_squeezes: 15,
            dirty_chance: 0.25,
            clean_catch_bonus: 12.0,
            dirty_catch_penalty: 8.0,
            milestones: MILESTONES
                .iter()
                .map(|&(threshold, message)| Milestone {
                    threshold,
                    message: message.to_string(),
                })
                .collect(),
        }
    }
}

impl Tuning {
    /// Water drained from the tube by each squeeze
    pub fn water_per_squeeze(&self) -> f32 {
        crate::consts::FULL_WATER_LEVEL / self.max_squeezes.max(1) as f32
    }
}
