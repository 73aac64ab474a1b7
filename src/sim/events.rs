//! Notifications pushed from the simulation to the presentation layer

use serde::Serialize;

use super::state::GamePhase;

/// How a drop left play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropOutcome {
    CaughtClean,
    CaughtDirty,
    Missed,
}

impl DropOutcome {
    pub fn is_caught(&self) -> bool {
        !matches!(self, DropOutcome::Missed)
    }
}

/// One-way notification queued by the session, drained by the front-end
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    PhaseChanged(GamePhase),
    PurityChanged(f32),
    WaterLevelChanged(f32),
    Milestone(String),
    DropSpawned { id: u32, x: f32, is_dirty: bool },
    DropResolved { id: u32, outcome: DropOutcome },
    GameEnded {
        final_purity: u32,
        message: &'static str,
        show_celebration: bool,
    },
    /// Scoop accepted, transition to Pour is pending
    ScoopStarted,
    /// Pour accepted, transition to Filter is pending
    PourStarted,
    /// Squeeze button locked (true) or released (false)
    SqueezeLockChanged(bool),
}

/// Receiver for session notifications
///
/// Every hook defaults to a no-op so frontends implement only what they show.
pub trait Presenter {
    fn on_phase_changed(&mut self, _phase: GamePhase) {}
    fn on_purity_changed(&mut self, _purity: f32) {}
    fn on_water_level_changed(&mut self, _level: f32) {}
    fn on_milestone(&mut self, _message: &str) {}
    fn on_drop_spawned(&mut self, _id: u32, _x: f32, _is_dirty: bool) {}
    fn on_drop_resolved(&mut self, _id: u32, _outcome: DropOutcome) {}
    fn on_game_ended(&mut self, _final_purity: u32, _message: &str, _show_celebration: bool) {}
    fn on_scoop_started(&mut self) {}
    fn on_pour_started(&mut self) {}
    fn on_squeeze_lock_changed(&mut self, _locked: bool) {}
}

impl GameEvent {
    /// Route this event to the matching presenter hook
    pub fn dispatch<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        match self {
            GameEvent::PhaseChanged(phase) => presenter.on_phase_changed(*phase),
            GameEvent::PurityChanged(purity) => presenter.on_purity_changed(*purity),
            GameEvent::WaterLevelChanged(level) => presenter.on_water_level_changed(*level),
            GameEvent::Milestone(message) => presenter.on_milestone(message),
            GameEvent::DropSpawned { id, x, is_dirty } => {
                presenter.on_drop_spawned(*id, *x, *is_dirty)
            }
            GameEvent::DropResolved { id, outcome } => presenter.on_drop_resolved(*id, *outcome),
            GameEvent::GameEnded {
                final_purity,
                message,
                show_celebration,
            } => presenter.on_game_ended(*final_purity, message, *show_celebration),
            GameEvent::ScoopStarted => presenter.on_scoop_started(),
            GameEvent::PourStarted => presenter.on_pour_started(),
            GameEvent::SqueezeLockChanged(locked) => presenter.on_squeeze_lock_changed(*locked),
        }
    }
}
