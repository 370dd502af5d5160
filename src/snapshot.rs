use serde::{
    Deserialize,
    Serialize
};

use crate::game::{
    entities::{
        ActiveEffect,
        EntityId,
        Obstacle,
        Player,
        PowerUp,
        PowerUpKind
    },
    math::Vector2
};

/// Value copy of the player for external consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub position: Vector2,
    pub velocity: Vector2,
    pub width: f32,
    pub height: f32,
    pub health: u32,
    pub energy: u32,
    pub score: u64,
    pub is_jumping: bool,
    pub is_grounded: bool,
    pub is_alive: bool,
    pub effects: Vec<ActiveEffect>,
    pub color: [u8; 3],
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            position: player.position,
            velocity: player.velocity,
            width: player.width,
            height: player.height,
            health: player.health,
            energy: player.energy,
            score: player.score,
            is_jumping: player.is_jumping,
            is_grounded: player.is_grounded,
            is_alive: player.is_alive,
            effects: player.effects.clone(),
            color: player.color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub id: EntityId,
    pub position: Vector2,
    pub width: f32,
    pub height: f32,
    pub scored: bool,
}

impl ObstacleSnapshot {
    pub fn vec_from_iter<'a, I: Iterator<Item = &'a Obstacle>>(iter: I) -> Vec<Self> {
        iter.map(|o| ObstacleSnapshot {
            id: o.id,
            position: o.position,
            width: o.width,
            height: o.height,
            scored: o.scored,
        })
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpSnapshot {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub position: Vector2,
    pub width: f32,
    pub height: f32,
    pub duration_ms: f32,
}

impl PowerUpSnapshot {
    pub fn vec_from_iter<'a, I: Iterator<Item = &'a PowerUp>>(iter: I) -> Vec<Self> {
        iter.map(|p| PowerUpSnapshot {
            id: p.id,
            kind: p.kind,
            position: p.position,
            width: p.width,
            height: p.height,
            duration_ms: p.duration_ms,
        })
        .collect()
    }
}

/// Point-in-time copy of the whole simulation. Cheap to diff, carries
/// everything a peer needs to decide snap-vs-interpolate, and owns all
/// of its data so later engine ticks cannot tear it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub player: PlayerSnapshot,
    pub obstacles: Vec<ObstacleSnapshot>,
    pub power_ups: Vec<PowerUpSnapshot>,
    pub score: u64,
    pub difficulty: u32,
    pub game_speed: f32,
    pub elapsed_ms: f64,
    pub is_paused: bool,
    pub is_game_over: bool,
    pub frame_count: u64,
}

/// Final payload handed to the (external) score-submission collaborator
/// when a run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    pub is_alive: bool,
    pub elapsed_ms: f64,
    pub obstacles_cleared: u64,
    pub frames: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::GameConfig;
    use crate::game::entities::PLAYER_COLORS;

    #[test]
    fn test_player_snapshot_copies_fields() {
        let config = GameConfig::default();
        let player = Player::new(7, PLAYER_COLORS[1], &config);
        let snapshot = PlayerSnapshot::from(&player);
        assert_eq!(snapshot.id, 7);
        assert_eq!(snapshot.position, player.position);
        assert_eq!(snapshot.health, config.max_health);
        assert!(snapshot.is_alive);
    }

    #[test]
    fn test_obstacle_snapshots_from_iter() {
        let obstacles = vec![
            Obstacle::new(1, Vector2::new(500.0, 310.0), 20.0, 40.0),
            Obstacle::new(2, Vector2::new(700.0, 330.0), 20.0, 20.0),
        ];
        let snapshots = ObstacleSnapshot::vec_from_iter(obstacles.iter());
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].id, 1);
        assert_eq!(snapshots[1].position.x, 700.0);
    }

    #[test]
    fn test_snapshot_roundtrips_through_json() {
        let config = GameConfig::default();
        let player = Player::new(0, PLAYER_COLORS[0], &config);
        let snapshot = GameSnapshot {
            player: PlayerSnapshot::from(&player),
            obstacles: Vec::new(),
            power_ups: Vec::new(),
            score: 120,
            difficulty: 2,
            game_speed: 6.0,
            elapsed_ms: 20_000.0,
            is_paused: false,
            is_game_over: false,
            frame_count: 1200,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.score, 120);
        assert_eq!(back.frame_count, 1200);
        assert_eq!(back.player.position, player.position);
    }

    #[test]
    fn test_run_summary_serializes() {
        let summary = RunSummary {
            score: 450,
            is_alive: false,
            elapsed_ms: 63_500.0,
            obstacles_cleared: 17,
            frames: 3810,
        };
        let json = serde_json::to_string(&summary).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
