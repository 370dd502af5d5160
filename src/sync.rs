//! Reconciliation contract between an authoritative engine and remote
//! replicas. Nothing here touches a socket: the crate defines the
//! cadence, the divergence metrics and the snap-vs-blend policy, and a
//! transport layer applies them.

use std::collections::{
    HashSet,
    VecDeque
};

use serde::{
    Deserialize,
    Serialize
};

use crate::{
    game::math::{
        self,
        Vector2
    },
    snapshot::GameSnapshot
};

/// Parameters a multiplayer layer runs the engine under. Shared with
/// peers, so serializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Authoritative simulation ticks per second.
    pub tick_rate_hz: u32,
    /// Intentional render lag for remote entities, so positions are
    /// smoothed between two known samples instead of extrapolated.
    pub interpolation_delay_ms: f32,
    /// Per-tick player position divergence past which a peer must snap.
    pub max_position_delta: f32,
    /// Full-state divergence past which a peer must snap.
    pub max_state_delta: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            interpolation_delay_ms: 100.0,
            max_position_delta: 50.0,
            max_state_delta: 120.0,
        }
    }
}

impl SyncConfig {
    pub fn tick_interval_ms(&self) -> f32 {
        1000.0 / self.tick_rate_hz as f32
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis((1000 / self.tick_rate_hz.max(1)) as u64)
    }
}

/// How a peer must apply an authoritative update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Divergence is small, smooth toward the authoritative state.
    Blend,
    /// Divergence exceeds a threshold, discard smoothing and jump.
    Snap,
}

/// Weight of an obstacle present on one side only, folded into the
/// full-state metric.
const OBSTACLE_MISMATCH_WEIGHT: f32 = 25.0;

/// Weight of each tick two snapshots are apart. Peers far out of step
/// must snap even when positions happen to coincide.
const FRAME_GAP_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDelta {
    pub position_delta: f32,
    pub velocity_delta: f32,
    pub score_delta: i64,
    pub frame_gap: u64,
    /// Scalar divergence of the whole state, compared against
    /// `SyncConfig::max_state_delta`.
    pub state_delta: f32,
}

impl SnapshotDelta {
    pub fn between(previous: &GameSnapshot, next: &GameSnapshot) -> Self {
        let position_delta = previous.player.position.distance(next.player.position);
        let velocity_delta = (next.player.velocity - previous.player.velocity).magnitude();
        let score_delta = next.score as i64 - previous.score as i64;
        let frame_gap = next.frame_count.abs_diff(previous.frame_count);

        let previous_ids: HashSet<_> = previous.obstacles.iter().map(|o| o.id).collect();
        let next_ids: HashSet<_> = next.obstacles.iter().map(|o| o.id).collect();
        let mismatched = previous_ids.symmetric_difference(&next_ids).count();

        let state_delta = position_delta
            + velocity_delta
            + mismatched as f32 * OBSTACLE_MISMATCH_WEIGHT
            + frame_gap as f32 * FRAME_GAP_WEIGHT;

        Self {
            position_delta,
            velocity_delta,
            score_delta,
            frame_gap,
            state_delta,
        }
    }

    /// Snap once either divergence threshold is exceeded, blend below.
    pub fn classify(&self, config: &SyncConfig) -> Correction {
        if self.position_delta > config.max_position_delta
            || self.state_delta > config.max_state_delta
        {
            Correction::Snap
        } else {
            Correction::Blend
        }
    }
}

/// Ring of timestamped authoritative snapshots. A renderer samples the
/// player position `interpolation_delay_ms` in the past, lerped between
/// the two bracketing samples.
#[derive(Debug)]
pub struct SnapshotBuffer {
    interpolation_delay_ms: f32,
    samples: VecDeque<(f64, GameSnapshot)>,
    capacity: usize,
}

impl SnapshotBuffer {
    const DEFAULT_CAPACITY: usize = 64;

    pub fn new(interpolation_delay_ms: f32) -> Self {
        Self {
            interpolation_delay_ms,
            samples: VecDeque::new(),
            capacity: Self::DEFAULT_CAPACITY,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.interpolation_delay_ms)
    }

    /// Record an authoritative sample. Timestamps must be monotonic;
    /// they are host time in milliseconds, not wall clock.
    pub fn push(&mut self, timestamp_ms: f64, snapshot: GameSnapshot) {
        if let Some((last, _)) = self.samples.back() {
            if timestamp_ms < *last {
                log::warn!("Dropping out-of-order snapshot at {timestamp_ms}ms");
                return;
            }
        }
        self.samples.push_back((timestamp_ms, snapshot));
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Player position at `now - interpolation_delay`. Saturates at the
    /// oldest and newest samples rather than extrapolating.
    pub fn sample_player_position(&self, now_ms: f64) -> Option<Vector2> {
        let target = now_ms - self.interpolation_delay_ms as f64;

        let (first_ts, first) = self.samples.front()?;
        if target <= *first_ts {
            return Some(first.player.position);
        }

        for pair in 0..self.samples.len().saturating_sub(1) {
            let (t0, s0) = &self.samples[pair];
            let (t1, s1) = &self.samples[pair + 1];
            if target >= *t0 && target <= *t1 {
                let span = t1 - t0;
                let t = if span == 0.0 {
                    1.0
                } else {
                    ((target - t0) / span) as f32
                };
                return Some(Vector2::new(
                    math::lerp(s0.player.position.x, s1.player.position.x, t),
                    math::lerp(s0.player.position.y, s1.player.position.y, t),
                ));
            }
        }

        self.samples.back().map(|(_, s)| s.player.position)
    }
}
