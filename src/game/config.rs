use serde::{
    Deserialize,
    Serialize
};

/// Every gameplay tunable in one place. The engine never reads a balance
/// constant from anywhere else, which keeps simulations reproducible and
/// lets tests pin exact values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // Field geometry
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Y coordinate of the ground line. Entities rest with their bottom
    /// edge on it.
    pub ground_y: f32,

    // Physics
    /// Downward acceleration per reference frame, positive is down.
    pub gravity: f32,
    /// Vertical velocity applied on jump, negative is up.
    pub jump_force: f32,
    pub max_fall_speed: f32,
    /// Velocities are expressed in pixels per reference frame; `update`
    /// scales them by `dt / reference_frame_ms`.
    pub reference_frame_ms: f32,

    // Player
    pub player_start_x: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub max_health: u32,
    pub max_energy: u32,
    pub jump_energy_cost: u32,
    pub energy_regen_per_sec: f32,
    /// Damage taken per obstacle hit. Four hits end a run on default
    /// health.
    pub collision_damage: u32,
    /// Ticks of invulnerability after a hit, so one overlap does not
    /// drain health every tick.
    pub hit_cooldown_ticks: u32,

    // Obstacles
    pub obstacle_width: f32,
    pub obstacle_min_height: f32,
    pub obstacle_max_height: f32,
    /// Distance the world must scroll between spawns at difficulty 0.
    pub obstacle_spawn_distance: f32,
    /// Spawn spacing never shrinks below this, regardless of difficulty.
    pub min_spawn_distance: f32,
    pub obstacle_points: u64,

    // Speed and difficulty
    pub initial_game_speed: f32,
    pub speed_increase_rate: f32,
    pub max_game_speed: f32,
    pub difficulty_interval_ms: f32,
    pub max_difficulty: u32,
    pub base_points_per_sec: f32,
    pub difficulty_multiplier: f32,

    // Power-ups
    /// Chance in [0,1] that an obstacle spawn also drops a power-up.
    pub powerup_spawn_chance: f32,
    pub powerup_size: f32,
    pub powerup_duration_ms: f32,
    /// Game speed factor while a Speed power-up is active.
    pub speed_effect_factor: f32,

    /// Seed for the spawn RNG. Two engines with equal config produce
    /// identical obstacle streams.
    pub rng_seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 400.0,
            ground_y: 350.0,

            gravity: 0.8,
            jump_force: -15.0,
            max_fall_speed: 18.0,
            reference_frame_ms: 1000.0 / 60.0,

            player_start_x: 100.0,
            player_width: 30.0,
            player_height: 40.0,
            max_health: 100,
            max_energy: 100,
            jump_energy_cost: 10,
            energy_regen_per_sec: 5.0,
            collision_damage: 25,
            hit_cooldown_ticks: 30,

            obstacle_width: 20.0,
            obstacle_min_height: 20.0,
            obstacle_max_height: 60.0,
            obstacle_spawn_distance: 300.0,
            min_spawn_distance: 120.0,
            obstacle_points: 10,

            initial_game_speed: 5.0,
            speed_increase_rate: 0.5,
            max_game_speed: 15.0,
            difficulty_interval_ms: 10_000.0,
            max_difficulty: 10,
            base_points_per_sec: 10.0,
            difficulty_multiplier: 1.1,

            powerup_spawn_chance: 0.15,
            powerup_size: 16.0,
            powerup_duration_ms: 5_000.0,
            speed_effect_factor: 0.75,

            rng_seed: 0,
        }
    }
}

impl GameConfig {
    /// Spawn spacing for a difficulty tier. Spacing tightens as
    /// difficulty climbs but never collapses below the floor.
    pub fn spawn_distance_for(&self, difficulty: u32) -> f32 {
        let scaled = self.obstacle_spawn_distance / (1.0 + difficulty as f32 * 0.1);
        scaled.max(self.min_spawn_distance)
    }

    /// Game speed for a difficulty tier, capped at the maximum.
    pub fn game_speed_for(&self, difficulty: u32) -> f32 {
        (self.initial_game_speed + difficulty as f32 * self.speed_increase_rate)
            .min(self.max_game_speed)
    }
}
