use rand::{
    rngs::StdRng,
    seq::IndexedRandom,
    Rng,
    SeedableRng
};

use super::{
    config::GameConfig,
    entities::{
        EntityId,
        Obstacle,
        Player,
        PowerUp,
        PowerUpKind
    },
    math::Vector2
};

const POWERUP_KINDS: [PowerUpKind; 3] = [
    PowerUpKind::Speed,
    PowerUpKind::Shield,
    PowerUpKind::DoublePoints,
];

/// One integration step for the player: gravity, position, ground clamp.
/// Velocities are pixels per reference frame, so `dt_ms` scales them.
pub fn step_player(player: &mut Player, dt_ms: f32, config: &GameConfig) {
    let frame_scale = dt_ms / config.reference_frame_ms;

    player.velocity.y = (player.velocity.y + config.gravity * frame_scale)
        .min(config.max_fall_speed);
    player.position += player.velocity * frame_scale;

    if player.position.y + player.height >= config.ground_y {
        // Snap to ground, kill vertical motion
        player.position.y = config.ground_y - player.height;
        player.velocity.y = 0.0;
        player.is_grounded = true;
        player.is_jumping = false;
    } else {
        player.is_grounded = false;
    }
}

/// Jump input edge. Honored only while grounded with enough energy.
/// Returns whether the jump started.
pub fn try_jump(player: &mut Player, config: &GameConfig) -> bool {
    if !player.is_grounded {
        return false;
    }
    if player.energy < config.jump_energy_cost {
        log::debug!("Jump refused, energy {} < {}", player.energy, config.jump_energy_cost);
        return false;
    }
    player.energy -= config.jump_energy_cost;
    player.velocity.y = config.jump_force;
    player.is_jumping = true;
    player.is_grounded = false;
    true
}

/// What a single spawner advance produced.
#[derive(Debug, Default)]
pub struct SpawnBatch {
    pub obstacle: Option<Obstacle>,
    pub power_up: Option<PowerUp>,
}

/// Spawn cadence driven by scrolled distance, not wall time. All
/// randomness comes from one seeded stream so equal seeds replay equal
/// obstacle courses.
#[derive(Debug)]
pub struct Spawner {
    rng: StdRng,
    distance_since_spawn: f32,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            distance_since_spawn: 0.0,
        }
    }

    pub fn reset(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.distance_since_spawn = 0.0;
    }

    /// Advance by the distance the world scrolled this tick. Spawns an
    /// obstacle once the difficulty-scaled spacing is exceeded, sometimes
    /// with a power-up floating above the course.
    pub fn advance<F: FnMut() -> EntityId>(
        &mut self,
        scrolled: f32,
        difficulty: u32,
        config: &GameConfig,
        mut next_id: F,
    ) -> SpawnBatch {
        self.distance_since_spawn += scrolled;

        let spacing = config.spawn_distance_for(difficulty);
        if self.distance_since_spawn < spacing {
            return SpawnBatch::default();
        }
        self.distance_since_spawn = 0.0;

        let height = self
            .rng
            .random_range(config.obstacle_min_height..=config.obstacle_max_height);
        let obstacle = Obstacle::new(
            next_id(),
            Vector2::new(config.canvas_width, config.ground_y - height),
            config.obstacle_width,
            height,
        );
        log::trace!("Spawned obstacle {} height {height}", obstacle.id);

        let power_up = if self.rng.random_range(0.0..1.0) < config.powerup_spawn_chance {
            let kind = *POWERUP_KINDS
                .choose(&mut self.rng)
                .unwrap_or(&PowerUpKind::Speed);
            let altitude = self.rng.random_range(40.0..90.0);
            let position = Vector2::new(
                config.canvas_width + config.obstacle_width * 2.0,
                config.ground_y - config.powerup_size - altitude,
            );
            let power_up = PowerUp::new(next_id(), kind, position, config);
            log::trace!("Spawned power-up {} {:?}", power_up.id, power_up.kind);
            Some(power_up)
        } else {
            None
        };

        SpawnBatch {
            obstacle: Some(obstacle),
            power_up,
        }
    }
}
