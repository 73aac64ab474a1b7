//! Player actions and the phase state machine
//!
//! Every action is gated on the current phase. Out-of-phase or locked calls
//! are no-ops that return `false`; rapid double clicks are expected input,
//! not errors.

use rand::Rng;

use super::events::GameEvent;
use super::results::{GameReport, share_text};
use super::schedule::TaskKind;
use super::state::{GamePhase, GameSession};
use crate::consts::*;
use crate::sanitize_player_name;
use crate::tuning::Difficulty;

impl GameSession {
    /// Leave the start screen: Start -> Scoop
    pub fn start(&mut self, player_name: &str, difficulty: Difficulty) -> bool {
        if self.phase != GamePhase::Start {
            log::debug!("start ignored in {} phase", self.phase.as_str());
            return false;
        }

        self.player_name = sanitize_player_name(player_name);
        self.difficulty = difficulty;
        self.purity = MIN_PURITY;
        self.squeeze_count = 0;
        self.water_level = FULL_WATER_LEVEL;
        self.is_squeezing = false;
        self.milestones.clear();
        self.phase = GamePhase::Scoop;

        log::info!(
            "Welcome, {}! Starting on {} difficulty",
            self.player_name,
            difficulty.as_str()
        );
        self.emit(GameEvent::PhaseChanged(GamePhase::Scoop));
        self.emit(GameEvent::PurityChanged(self.purity));
        true
    }

    /// Click the dirty tub: Scoop -> Pour once the scoop animation ends
    pub fn scoop(&mut self) -> bool {
        if self.phase != GamePhase::Scoop || self.transition_pending {
            log::debug!("scoop ignored in {} phase", self.phase.as_str());
            return false;
        }

        self.begin_transition(SCOOP_ANIMATION_MS, TaskKind::EnterPour);
        self.emit(GameEvent::ScoopStarted);
        true
    }

    /// Click the filled cup: Pour -> Filter once the pour animation ends
    pub fn pour(&mut self) -> bool {
        if self.phase != GamePhase::Pour || self.transition_pending {
            log::debug!("pour ignored in {} phase", self.phase.as_str());
            return false;
        }

        self.begin_transition(POUR_ANIMATION_MS, TaskKind::EnterFilter);
        self.emit(GameEvent::PourStarted);
        true
    }

    fn begin_transition(&mut self, delay_ms: u64, kind: TaskKind) {
        self.transition_pending = true;
        self.timeline
            .schedule(self.now_ms + delay_ms, self.generation, kind);
    }

    /// Squeeze the filter, releasing a burst of drops
    pub fn squeeze(&mut self) -> bool {
        if self.phase != GamePhase::Filter
            || self.squeeze_count >= self.tuning.max_squeezes
            || self.is_squeezing
        {
            log::debug!(
                "squeeze ignored (phase {}, count {}, locked {})",
                self.phase.as_str(),
                self.squeeze_count,
                self.is_squeezing
            );
            return false;
        }

        let profile = self.profile();
        let now = self.now_ms;
        let generation = self.generation;

        self.is_squeezing = true;
        self.squeeze_count += 1;
        self.water_level = (self.water_level - self.tuning.water_per_squeeze()).max(0.0);

        let num_drops = self
            .rng
            .random_range(profile.drops_per_squeeze_min..=profile.drops_per_squeeze_max);
        for i in 0..num_drops as u64 {
            self.timeline
                .schedule(now + i * profile.inter_drop_ms, generation, TaskKind::SpawnDrop);
        }
        self.timeline.schedule(
            now + profile.button_cooldown_ms,
            generation,
            TaskKind::ReleaseSqueezeLock,
        );

        if self.squeeze_count >= self.tuning.max_squeezes {
            self.timeline
                .schedule(now + RESULTS_DELAY_MS, generation, TaskKind::EnterResults);
        }

        log::debug!(
            "Squeeze {}/{}: {} drops",
            self.squeeze_count,
            self.tuning.max_squeezes,
            num_drops
        );
        self.emit(GameEvent::SqueezeLockChanged(true));
        self.emit(GameEvent::WaterLevelChanged(self.water_level));
        true
    }

    /// Back to the start screen from anywhere
    ///
    /// Falling drops vanish without resolving and every pending task is
    /// orphaned by the generation bump, so nothing queued before the reset
    /// can touch the new session.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.phase = GamePhase::Start;
        self.purity = MIN_PURITY;
        self.squeeze_count = 0;
        self.water_level = FULL_WATER_LEVEL;
        self.is_squeezing = false;
        self.transition_pending = false;
        self.milestones.clear();
        self.drops.clear();
        self.ledger.clear();
        self.events.clear();

        log::info!("Session reset (generation {})", self.generation);
        self.emit(GameEvent::PhaseChanged(GamePhase::Start));
    }

    /// Final report, available once results are shown
    pub fn report(&self) -> Option<GameReport> {
        (self.phase == GamePhase::Results).then(|| GameReport::from_purity(self.purity))
    }

    /// Shareable summary of the current purity
    pub fn share_text(&self) -> String {
        share_text(self.purity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_captures_name_and_difficulty() {
        let mut session = GameSession::new(1);
        assert!(session.start("  Robin ", Difficulty::Hard));
        assert_eq!(session.phase(), GamePhase::Scoop);
        assert_eq!(session.player_name(), "Robin");
        assert_eq!(session.difficulty(), Difficulty::Hard);

        // Difficulty is fixed for the session
        assert!(!session.start("Other", Difficulty::Easy));
        assert_eq!(session.difficulty(), Difficulty::Hard);
        assert_eq!(session.player_name(), "Robin");
    }

    #[test]
    fn test_out_of_phase_actions_are_ignored() {
        let mut session = GameSession::new(1);
        assert!(!session.scoop());
        assert!(!session.pour());
        assert!(!session.squeeze());
        assert_eq!(session.phase(), GamePhase::Start);
        assert!(session.drain_events().is_empty());

        session.start("", Difficulty::Normal);
        assert!(!session.pour());
        assert!(!session.squeeze());
        assert_eq!(session.phase(), GamePhase::Scoop);
    }

    #[test]
    fn test_double_scoop_schedules_once() {
        let mut session = GameSession::new(1);
        session.start("", Difficulty::Normal);
        assert!(session.scoop());
        assert!(!session.scoop());
        assert_eq!(session.pending_tasks(), 1);
        assert!(session.is_transitioning());
        // Still in Scoop until the animation completes
        assert_eq!(session.phase(), GamePhase::Scoop);
    }

    #[test]
    fn test_reset_from_any_phase() {
        let mut session = GameSession::new(1);
        session.start("Kim", Difficulty::Easy);
        session.scoop();
        session.reset();
        assert_eq!(session.phase(), GamePhase::Start);
        assert_eq!(session.pending_tasks(), 0);
        assert!(!session.is_transitioning());
        assert_eq!(session.drain_events(), vec![GameEvent::PhaseChanged(GamePhase::Start)]);

        // A fresh start is legal again
        assert!(session.start("Kim", Difficulty::Normal));
        assert_eq!(session.difficulty(), Difficulty::Normal);
    }

    #[test]
    fn test_report_only_in_results() {
        let session = GameSession::new(1);
        assert!(session.report().is_none());
        assert!(session.share_text().contains("0% purity"));
    }
}
