//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Simulation clock advanced only by `tick`
//! - Seeded RNG only
//! - Stable iteration order (drops in spawn order, tasks by due time)
//! - No rendering or platform dependencies

pub mod actions;
pub mod autopilot;
pub mod collision;
pub mod events;
pub mod results;
pub mod schedule;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod tick;

pub use autopilot::steer_bucket;
pub use collision::{BucketBounds, Rect, clamp_bucket_left};
pub use events::{DropOutcome, GameEvent, Presenter};
pub use results::{GameReport, ResultBand, share_text};
pub use spawn::{SpawnLedger, SpawnPick};
pub use state::{DropState, DropView, Droplet, GamePhase, GameSession, SessionSnapshot};
pub use tick::{TickInput, tick};
