//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Synthesis failures are swallowed: a missing AudioContext or a rejected
//! node never reaches game state.

use crate::sim::{DropOutcome, GameEvent};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Cup dips into the tub
    Scoop,
    /// Water poured into the filter tube
    Pour,
    /// Filter squeezed
    Squeeze,
    /// Clean drop landed in the bucket
    CleanCatch,
    /// Dirty drop landed in the bucket
    DirtyCatch,
    /// Drop fell past the bucket
    Miss,
    /// Purity milestone reached
    Milestone,
    /// Results with celebration
    Celebration,
    /// Results without celebration
    GameEnd,
}

impl SoundEffect {
    /// Sound cue for a session notification, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::ScoopStarted => Some(SoundEffect::Scoop),
            GameEvent::PourStarted => Some(SoundEffect::Pour),
            GameEvent::SqueezeLockChanged(true) => Some(SoundEffect::Squeeze),
            GameEvent::DropResolved { outcome, .. } => Some(match outcome {
                DropOutcome::CaughtClean => SoundEffect::CleanCatch,
                DropOutcome::CaughtDirty => SoundEffect::DirtyCatch,
                DropOutcome::Missed => SoundEffect::Miss,
            }),
            GameEvent::Milestone(_) => Some(SoundEffect::Milestone),
            GameEvent::GameEnded {
                show_celebration, ..
            } => Some(if *show_celebration {
                SoundEffect::Celebration
            } else {
                SoundEffect::GameEnd
            }),
            GameEvent::PhaseChanged(_)
            | GameEvent::PurityChanged(_)
            | GameEvent::WaterLevelChanged(_)
            | GameEvent::DropSpawned { .. }
            | GameEvent::SqueezeLockChanged(false) => None,
        }
    }
}

/// Volume change per key press
pub const VOLUME_STEP: f32 = 0.1;

/// Master volume after `steps` key presses, clamped to [0, 1]
pub fn stepped_volume(current: f32, steps: i32) -> f32 {
    let volume = current + steps as f32 * VOLUME_STEP;
    // Snap to the step grid so repeated presses land on 0 and 1 exactly
    ((volume / VOLUME_STEP).round() * VOLUME_STEP).clamp(0.0, 1.0)
}

#[cfg(target_arch = "wasm32")]
pub use manager::AudioManager;

#[cfg(target_arch = "wasm32")]
mod manager {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundEffect;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                muted: false,
            }
        }

        /// Set master volume (0.0 - 1.0)
        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        /// Mute/unmute all audio
        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        pub fn master_volume(&self) -> f32 {
            self.master_volume
        }

        pub fn is_muted(&self) -> bool {
            self.muted
        }

        fn effective_volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.master_volume }
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Scoop => self.play_slosh(ctx, vol, 300.0, 180.0),
                SoundEffect::Pour => self.play_slosh(ctx, vol, 500.0, 220.0),
                SoundEffect::Squeeze => self.play_squeeze(ctx, vol),
                SoundEffect::CleanCatch => self.play_clean_catch(ctx, vol),
                SoundEffect::DirtyCatch => self.play_dirty_catch(ctx, vol),
                SoundEffect::Miss => self.play_miss(ctx, vol),
                SoundEffect::Milestone => {
                    self.play_arpeggio(ctx, vol, &[523.0, 659.0, 784.0], 0.08, OscillatorType::Triangle)
                }
                SoundEffect::Celebration => self.play_arpeggio(
                    ctx,
                    vol,
                    &[523.0, 659.0, 784.0, 1047.0, 1319.0],
                    0.1,
                    OscillatorType::Triangle,
                ),
                SoundEffect::GameEnd => {
                    self.play_arpeggio(ctx, vol, &[440.0, 392.0, 330.0], 0.15, OscillatorType::Sine)
                }
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Scoop/pour - watery downward glide
        fn play_slosh(&self, ctx: &AudioContext, vol: f32, from: f32, to: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, from, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(0.01, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(vol * 0.3, t + 0.08)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + 0.4)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.45).ok();
        }

        /// Squeeze - soft squish
        fn play_squeeze(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.35, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                .ok();
            osc.frequency().set_value_at_time(180.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(90.0, t + 0.15)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.2).ok();
        }

        /// Clean catch - bright rising blip
        fn play_clean_catch(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 880.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.18)
                .ok();
            osc.frequency().set_value_at_time(880.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(1320.0, t + 0.1)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.2).ok();
        }

        /// Dirty catch - low buzzy thud
        fn play_dirty_catch(&self, ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, 160.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.frequency().set_value_at_time(160.0, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(70.0, t + 0.25)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.3).ok();
            }

            // Bass thump
            if let Some((osc, gain)) = self.create_osc(ctx, 60.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.12).ok();
            }
        }

        /// Miss - quiet tap
        fn play_miss(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.12, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.05)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.08).ok();
        }

        /// Staggered notes (milestones, results)
        fn play_arpeggio(
            &self,
            ctx: &AudioContext,
            vol: f32,
            notes: &[f32],
            step: f64,
            osc_type: OscillatorType,
        ) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * step;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.35).ok();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_sounds() {
        let resolved = |outcome| GameEvent::DropResolved { id: 1, outcome };
        assert_eq!(
            SoundEffect::for_event(&resolved(DropOutcome::CaughtClean)),
            Some(SoundEffect::CleanCatch)
        );
        assert_eq!(
            SoundEffect::for_event(&resolved(DropOutcome::CaughtDirty)),
            Some(SoundEffect::DirtyCatch)
        );
        assert_eq!(
            SoundEffect::for_event(&resolved(DropOutcome::Missed)),
            Some(SoundEffect::Miss)
        );
    }

    #[test]
    fn test_silent_events() {
        assert_eq!(SoundEffect::for_event(&GameEvent::PurityChanged(12.0)), None);
        assert_eq!(SoundEffect::for_event(&GameEvent::SqueezeLockChanged(false)), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::SqueezeLockChanged(true)),
            Some(SoundEffect::Squeeze)
        );
    }

    #[test]
    fn test_stepped_volume() {
        assert!((stepped_volume(0.8, 1) - 0.9).abs() < 1e-6);
        assert!((stepped_volume(0.8, -3) - 0.5).abs() < 1e-6);
        assert_eq!(stepped_volume(0.95, 1), 1.0);
        assert_eq!(stepped_volume(1.0, 5), 1.0);
        assert_eq!(stepped_volume(0.1, -4), 0.0);
    }

    #[test]
    fn test_game_end_sound_follows_celebration() {
        let ended = |show_celebration| GameEvent::GameEnded {
            final_purity: 50,
            message: "",
            show_celebration,
        };
        assert_eq!(SoundEffect::for_event(&ended(true)), Some(SoundEffect::Celebration));
        assert_eq!(SoundEffect::for_event(&ended(false)), Some(SoundEffect::GameEnd));
    }
}
