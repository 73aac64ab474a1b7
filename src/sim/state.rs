//! Session state and core simulation types
//!
//! A [`GameSession`] owns everything one play-through mutates. Fields are
//! crate-private; the front-end mutates the session only through the phase
//! actions and [`super::tick`].

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, drop_rect};
use super::events::{GameEvent, Presenter};
use super::schedule::Timeline;
use super::scoring::MilestoneTracker;
use super::spawn::SpawnLedger;
use crate::consts::*;
use crate::tuning::{Difficulty, DifficultyProfile, Tuning};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, waiting for name and difficulty
    Start,
    /// Click the dirty tub
    Scoop,
    /// Click the filled cup
    Pour,
    /// Squeeze the filter and catch drops
    Filter,
    /// Final score shown
    Results,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Start => "start",
            GamePhase::Scoop => "scoop",
            GamePhase::Pour => "pour",
            GamePhase::Filter => "filter",
            GamePhase::Results => "results",
        }
    }

    /// The phase a forward transition leads to
    pub fn next(&self) -> Option<GamePhase> {
        match self {
            GamePhase::Start => Some(GamePhase::Scoop),
            GamePhase::Scoop => Some(GamePhase::Pour),
            GamePhase::Pour => Some(GamePhase::Filter),
            GamePhase::Filter => Some(GamePhase::Results),
            GamePhase::Results => None,
        }
    }
}

/// Lifecycle of a drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropState {
    Falling,
    Caught,
    Missed,
}

/// A falling water drop
#[derive(Debug, Clone)]
pub struct Droplet {
    pub id: u32,
    pub is_dirty: bool,
    /// Left edge in drop-zone coordinates
    pub x: f32,
    pub spawn_ms: u64,
    pub fall_duration_ms: u64,
    pub state: DropState,
    /// Collision polls already performed
    pub(crate) polls: u64,
}

impl Droplet {
    pub fn new(id: u32, is_dirty: bool, x: f32, spawn_ms: u64, fall_duration_ms: u64) -> Self {
        Self {
            id,
            is_dirty,
            x,
            spawn_ms,
            fall_duration_ms: fall_duration_ms.max(1),
            state: DropState::Falling,
            polls: 0,
        }
    }

    /// Fall progress in [0, 1] at `now_ms`
    pub fn progress_at(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.spawn_ms) as f32;
        (elapsed / self.fall_duration_ms as f32).min(1.0)
    }

    /// Top edge at `now_ms` (ease-in fall from the spout)
    pub fn top_at(&self, now_ms: u64) -> f32 {
        let t = self.progress_at(now_ms);
        DROP_SPAWN_Y + (DROP_TARGET_Y - DROP_SPAWN_Y) * t * t
    }

    pub fn rect_at(&self, now_ms: u64) -> Rect {
        drop_rect(self.x, self.top_at(now_ms))
    }

    /// Instant after which the drop is force-missed
    pub fn deadline_ms(&self) -> u64 {
        self.spawn_ms + self.fall_duration_ms + FALL_TIMEOUT_GRACE_MS
    }

    /// Next instant this drop needs attention
    pub fn next_poll_ms(&self) -> u64 {
        let poll = self.spawn_ms + (self.polls + 1) * COLLISION_POLL_MS;
        poll.min(self.deadline_ms())
    }

    pub fn is_resolved(&self) -> bool {
        self.state != DropState::Falling
    }
}

/// Render-facing view of a drop
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DropView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub is_dirty: bool,
}

/// Serializable picture of the session for HUDs and debugging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub purity: f32,
    pub squeeze_count: u32,
    pub max_squeezes: u32,
    pub water_level: f32,
    pub is_squeezing: bool,
    pub difficulty: Difficulty,
    pub player_name: String,
    pub now_ms: u64,
    pub drops: Vec<DropView>,
}

/// One play-through
#[derive(Debug, Clone)]
pub struct GameSession {
    pub(crate) seed: u64,
    pub(crate) rng: Pcg32,
    pub(crate) tuning: Tuning,
    pub(crate) phase: GamePhase,
    pub(crate) purity: f32,
    pub(crate) squeeze_count: u32,
    pub(crate) water_level: f32,
    pub(crate) is_squeezing: bool,
    pub(crate) difficulty: Difficulty,
    pub(crate) player_name: String,
    pub(crate) milestones: MilestoneTracker,
    /// Falling drops, in spawn order
    pub(crate) drops: Vec<Droplet>,
    pub(crate) ledger: SpawnLedger,
    pub(crate) timeline: Timeline,
    /// Bumped by every reset, stale tasks compare against it
    pub(crate) generation: u32,
    /// Simulation clock
    pub(crate) now_ms: u64,
    /// Scoop or pour animation in flight
    pub(crate) transition_pending: bool,
    /// Drop-zone width seen by the latest tick
    pub(crate) zone_width: f32,
    pub(crate) events: Vec<GameEvent>,
    next_id: u32,
}

impl GameSession {
    /// Create a session at the start screen with the default balance
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            phase: GamePhase::Start,
            purity: MIN_PURITY,
            squeeze_count: 0,
            water_level: FULL_WATER_LEVEL,
            is_squeezing: false,
            difficulty: Difficulty::default(),
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            milestones: MilestoneTracker::new(),
            drops: Vec::new(),
            ledger: SpawnLedger::new(),
            timeline: Timeline::new(),
            generation: 0,
            now_ms: 0,
            transition_pending: false,
            zone_width: DEFAULT_DROP_ZONE_WIDTH,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new drop ID
    pub(crate) fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn purity(&self) -> f32 {
        self.purity
    }

    pub fn squeeze_count(&self) -> u32 {
        self.squeeze_count
    }

    pub fn max_squeezes(&self) -> u32 {
        self.tuning.max_squeezes
    }

    pub fn water_level(&self) -> f32 {
        self.water_level
    }

    pub fn is_squeezing(&self) -> bool {
        self.is_squeezing
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> &'static DifficultyProfile {
        self.difficulty.profile()
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn drops(&self) -> &[Droplet] {
        &self.drops
    }

    pub fn milestones(&self) -> &MilestoneTracker {
        &self.milestones
    }

    /// Scoop or pour animation still running
    pub fn is_transitioning(&self) -> bool {
        self.transition_pending
    }

    /// Spawn positions still blocking new drops
    pub fn active_spawn_positions(&self) -> usize {
        self.ledger.len()
    }

    /// Delayed tasks that will still run
    pub fn pending_tasks(&self) -> usize {
        self.timeline.pending(self.generation)
    }

    /// Take all queued notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deliver all queued notifications to `presenter`
    pub fn flush_events<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        for event in self.drain_events() {
            event.dispatch(presenter);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            purity: self.purity,
            squeeze_count: self.squeeze_count,
            max_squeezes: self.tuning.max_squeezes,
            water_level: self.water_level,
            is_squeezing: self.is_squeezing,
            difficulty: self.difficulty,
            player_name: self.player_name.clone(),
            now_ms: self.now_ms,
            drops: self
                .drops
                .iter()
                .map(|d| DropView {
                    id: d.id,
                    x: d.x,
                    y: d.top_at(self.now_ms),
                    is_dirty: d.is_dirty,
                })
                .collect(),
        }
    }

    /// Snapshot as JSON for the browser console
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}
