//! Tube Clean: Water Rescue - scoop, pour, squeeze, catch
//!
//! Core modules:
//! - `sim`: Deterministic drop simulation (phases, spawning, collisions, scoring)
//! - `tuning`: Difficulty profiles and game balance
//! - `audio`: Procedural Web Audio feedback

pub mod audio;
pub mod sim;
pub mod tuning;

pub use sim::{GameEvent, GamePhase, GameSession, Presenter, TickInput, tick};
pub use tuning::{Difficulty, DifficultyProfile, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds
    pub const SIM_DT_MS: u64 = 10;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 10;

    /// Drop sprite size (drop-zone pixels)
    pub const DROP_WIDTH: f32 = 22.0;
    pub const DROP_HEIGHT: f32 = 30.0;
    /// Drop top edge at spawn (tube spout)
    pub const DROP_SPAWN_Y: f32 = 20.0;
    /// Drop top edge when the fall animation completes
    pub const DROP_TARGET_Y: f32 = 200.0;

    /// Vertical extent of the bucket opening
    pub const CATCH_TOP: f32 = 120.0;
    pub const CATCH_BOTTOM: f32 = 170.0;

    /// Default bucket width and drop-zone width before the DOM reports real sizes
    pub const BUCKET_WIDTH: f32 = 60.0;
    pub const DEFAULT_DROP_ZONE_WIDTH: f32 = 300.0;
    /// Drag limits for the bucket's left edge
    pub const BUCKET_MIN_LEFT: f32 = 10.0;
    pub const BUCKET_RIGHT_MARGIN: f32 = 70.0;

    /// Horizontal spawn range: `min(width - margin, max)`
    pub const SPAWN_EDGE_MARGIN: f32 = 40.0;
    pub const MAX_SPAWN_RANGE: f32 = 200.0;
    /// Rejection-sampling attempts before spacing is relaxed
    pub const SPAWN_ATTEMPTS: u32 = 20;
    /// How long a spawn position blocks its neighbours
    pub const SPACING_WINDOW_MS: u64 = 1000;

    /// Interval between bucket collision checks for a falling drop
    pub const COLLISION_POLL_MS: u64 = 100;
    /// Extra time past the fall duration before a drop is force-missed
    pub const FALL_TIMEOUT_GRACE_MS: u64 = 400;

    /// Phase animation delays
    pub const SCOOP_ANIMATION_MS: u64 = 1000;
    pub const POUR_ANIMATION_MS: u64 = 1200;
    /// Delay after the final squeeze before results, lets last drops land
    pub const RESULTS_DELAY_MS: u64 = 3000;

    /// Purity bounds
    pub const MIN_PURITY: f32 = 0.0;
    pub const MAX_PURITY: f32 = 100.0;
    /// Full filter tube
    pub const FULL_WATER_LEVEL: f32 = 100.0;
    /// Final purity needed for confetti
    pub const CELEBRATION_THRESHOLD: f32 = 80.0;

    /// Player name limits
    pub const MAX_NAME_LEN: usize = 20;
    pub const DEFAULT_PLAYER_NAME: &str = "Player";
}

/// Trim a player name, cap its length and fall back to the default
pub fn sanitize_player_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(consts::MAX_NAME_LEN).collect();
    let name = name.trim();
    if name.is_empty() {
        consts::DEFAULT_PLAYER_NAME.to_string()
    } else {
        name.to_string()
    }
}
