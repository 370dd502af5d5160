use serde::{
    Deserialize,
    Serialize
};

use super::{
    collision::Aabb,
    config::GameConfig,
    math::Vector2
};

pub type EntityId = u32;

/// Palette the engine draws player colors from.
pub const PLAYER_COLORS: [[u8; 3]; 6] = [
    [255, 71, 87],
    [46, 213, 115],
    [30, 144, 255],
    [255, 165, 2],
    [165, 94, 234],
    [255, 221, 89],
];

/// The runner. Owned and mutated exclusively by the engine; everything
/// outside sees snapshot copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
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
    /// Collected power-ups still counting down, in pickup order.
    pub effects: Vec<ActiveEffect>,
    /// Ticks of invulnerability left after the last obstacle hit.
    pub hit_cooldown: u32,
    pub color: [u8; 3],
}

impl Player {
    /// New player standing on the ground at the configured start column.
    pub fn new(id: EntityId, color: [u8; 3], config: &GameConfig) -> Self {
        Self {
            id,
            position: Vector2::new(
                config.player_start_x,
                config.ground_y - config.player_height,
            ),
            velocity: Vector2::zero(),
            width: config.player_width,
            height: config.player_height,
            health: config.max_health,
            energy: config.max_energy,
            score: 0,
            is_jumping: false,
            is_grounded: true,
            is_alive: true,
            effects: Vec::new(),
            hit_cooldown: 0,
            color,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb {
            x: self.position.x,
            y: self.position.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn has_effect(&self, kind: PowerUpKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub position: Vector2,
    pub width: f32,
    pub height: f32,
    /// Set once when the obstacle passes the player, so clearing can
    /// never pay out twice.
    pub scored: bool,
}

impl Obstacle {
    pub fn new(id: EntityId, position: Vector2, width: f32, height: f32) -> Self {
        Self {
            id,
            position,
            width,
            height,
            scored: false,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb {
            x: self.position.x,
            y: self.position.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn right_edge(&self) -> f32 {
        self.position.x + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Slows the world down while active.
    Speed,
    /// Absorbs obstacle hits while active.
    Shield,
    /// Doubles all scoring while active.
    DoublePoints,
}

/// A power-up sitting on the field, waiting to be collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub position: Vector2,
    pub width: f32,
    pub height: f32,
    pub duration_ms: f32,
}

impl PowerUp {
    pub fn new(id: EntityId, kind: PowerUpKind, position: Vector2, config: &GameConfig) -> Self {
        Self {
            id,
            kind,
            position,
            width: config.powerup_size,
            height: config.powerup_size,
            duration_ms: config.powerup_duration_ms,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb {
            x: self.position.x,
            y: self.position.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// A collected power-up counting down in simulated time. Pausing the
/// engine pauses the countdown with it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub remaining_ms: f32,
}

#[test]
fn test_player_starts_on_ground() {
    let config = GameConfig::default();
    let player = Player::new(0, PLAYER_COLORS[0], &config);
    assert!(player.is_grounded);
    assert!(!player.is_jumping);
    assert_eq!(player.velocity, Vector2::zero());
    assert_eq!(player.position.y + player.height, config.ground_y);
    assert_eq!(player.health, config.max_health);
}

#[test]
fn test_player_aabb_projection() {
    let config = GameConfig::default();
    let player = Player::new(0, PLAYER_COLORS[0], &config);
    let aabb = player.aabb();
    assert_eq!(aabb.x, player.position.x);
    assert_eq!(aabb.width, config.player_width);
    assert_eq!(aabb.height, config.player_height);
}

#[test]
fn test_obstacle_right_edge() {
    let obstacle = Obstacle::new(1, Vector2::new(100.0, 300.0), 20.0, 50.0);
    assert_eq!(obstacle.right_edge(), 120.0);
    assert!(!obstacle.scored);
}

#[test]
fn test_effect_lookup() {
    let config = GameConfig::default();
    let mut player = Player::new(0, PLAYER_COLORS[0], &config);
    assert!(!player.has_effect(PowerUpKind::Shield));
    player.effects.push(ActiveEffect {
        kind: PowerUpKind::Shield,
        remaining_ms: 1000.0,
    });
    assert!(player.has_effect(PowerUpKind::Shield));
    assert!(!player.has_effect(PowerUpKind::Speed));
}
