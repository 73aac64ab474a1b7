//! Demo autopilot
//!
//! Steers the bucket under the next clean drop. Drives the attract mode and
//! the headless native run.

use super::collision::{BucketBounds, clamp_bucket_left};
use super::state::GameSession;
use crate::consts::*;

/// Bucket speed in drop-zone pixels per millisecond
pub const AUTOPILOT_SPEED: f32 = 0.5;

/// Center x of the clean drop that reaches the bucket soonest
pub fn target_x(session: &GameSession) -> Option<f32> {
    let now = session.now_ms();
    session
        .drops()
        .iter()
        .filter(|d| !d.is_dirty && !d.is_resolved() && d.top_at(now) <= CATCH_BOTTOM)
        // Same fall duration for every drop of a session: oldest lands first
        .min_by_key(|d| (d.spawn_ms, d.id))
        .map(|d| d.x + DROP_WIDTH / 2.0)
}

/// Move the bucket toward the next clean drop for `dt_ms`
pub fn steer_bucket(
    session: &GameSession,
    bucket: BucketBounds,
    zone_width: f32,
    dt_ms: u64,
) -> BucketBounds {
    let Some(target) = target_x(session) else {
        return bucket;
    };

    let max_step = AUTOPILOT_SPEED * dt_ms as f32;
    let delta = (target - bucket.center()).clamp(-max_step, max_step);
    let left = clamp_bucket_left(bucket.left + delta, zone_width);
    BucketBounds::new(left, left + bucket.width())
}
