use serde::{
    Deserialize,
    Serialize
};

use crate::snapshot::{
    GameSnapshot,
    ObstacleSnapshot,
    PlayerSnapshot,
    PowerUpSnapshot,
    RunSummary
};

use super::{
    config::GameConfig,
    entities::{
        ActiveEffect,
        EntityId,
        Obstacle,
        Player,
        PowerUp,
        PowerUpKind,
        PLAYER_COLORS
    },
    physics::{
        self,
        Spawner
    },
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GameError {
    #[error("Operation '{operation}' is not allowed in state {state:?}")]
    InvalidStateTransition {
        operation: &'static str,
        state: EngineState,
    },

    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        reason: String,
    },
}

/// Engine lifecycle. `Idle` is initial, `GameOver` is terminal until
/// `start()` resets.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    Paused,
    GameOver,
}

/// The authoritative simulation. Owns every entity; single-threaded by
/// contract: a host calls `update` synchronously, one tick runs to
/// completion before any state is observable.
#[derive(Debug)]
pub struct GameEngine {
    config: GameConfig,
    state: EngineState,
    player: Player,
    obstacles: Vec<Obstacle>,
    power_ups: Vec<PowerUp>,
    spawner: Spawner,
    next_entity_id: EntityId,
    difficulty: u32,
    game_speed: f32,
    elapsed_ms: f64,
    frame_count: u64,
    obstacles_cleared: u64,
    // Fractional carry so per-tick accrual loses nothing to integer score
    score_accumulator: f64,
    energy_accumulator: f32,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        let color = PLAYER_COLORS[config.rng_seed as usize % PLAYER_COLORS.len()];
        let player = Player::new(0, color, &config);
        let spawner = Spawner::new(config.rng_seed);
        let game_speed = config.initial_game_speed;
        log::info!("Engine created, seed {}", config.rng_seed);
        Self {
            config,
            state: EngineState::Idle,
            player,
            obstacles: Vec::new(),
            power_ups: Vec::new(),
            spawner,
            next_entity_id: 1,
            difficulty: 0,
            game_speed,
            elapsed_ms: 0.0,
            frame_count: 0,
            obstacles_cleared: 0,
            score_accumulator: 0.0,
            energy_accumulator: 0.0,
        }
    }

    /// Begin a fresh run. Legal from `Idle` and `GameOver` only; a
    /// running or paused engine refuses rather than silently restarting.
    pub fn start(&mut self) -> Result<(), GameError> {
        match self.state {
            EngineState::Idle | EngineState::GameOver => {
                self.reset();
                self.state = EngineState::Running;
                log::info!("Run started");
                Ok(())
            }
            state => Err(GameError::InvalidStateTransition {
                operation: "start",
                state,
            }),
        }
    }

    fn reset(&mut self) {
        let color = PLAYER_COLORS[self.config.rng_seed as usize % PLAYER_COLORS.len()];
        self.player = Player::new(0, color, &self.config);
        self.obstacles.clear();
        self.power_ups.clear();
        self.spawner.reset(self.config.rng_seed);
        self.next_entity_id = 1;
        self.difficulty = 0;
        self.game_speed = self.config.initial_game_speed;
        self.elapsed_ms = 0.0;
        self.frame_count = 0;
        self.obstacles_cleared = 0;
        self.score_accumulator = 0.0;
        self.energy_accumulator = 0.0;
    }

    /// Advance one tick of `dt_ms`. Only a running engine simulates;
    /// every other state is a silent no-op so render loops can call this
    /// unconditionally.
    pub fn update(&mut self, dt_ms: f32) {
        if self.state != EngineState::Running {
            log::trace!("Update skipped in state {:?}", self.state);
            return;
        }
        let dt_ms = dt_ms.max(0.0);

        self.frame_count += 1;
        self.elapsed_ms += dt_ms as f64;
        log::trace!("Tick {} dt={dt_ms}ms", self.frame_count);

        self.update_difficulty();
        self.accrue_passive_score(dt_ms);
        self.regenerate_energy(dt_ms);

        physics::step_player(&mut self.player, dt_ms, &self.config);

        let scrolled = self.game_speed * dt_ms / self.config.reference_frame_ms;
        self.spawn_entities(scrolled);
        self.scroll_world(scrolled);
        self.score_cleared_obstacles();
        self.expire_effects(dt_ms);
        self.resolve_collisions();
    }

    fn update_difficulty(&mut self) {
        let tier = ((self.elapsed_ms / self.config.difficulty_interval_ms as f64) as u32)
            .min(self.config.max_difficulty);
        if tier != self.difficulty {
            self.difficulty = tier;
            log::debug!("Difficulty raised to {tier}");
        }

        let base_speed = self.config.game_speed_for(self.difficulty);
        self.game_speed = if self.player.has_effect(PowerUpKind::Speed) {
            base_speed * self.config.speed_effect_factor
        } else {
            base_speed
        };
    }

    fn score_multiplier(&self) -> u64 {
        if self.player.has_effect(PowerUpKind::DoublePoints) {
            2
        } else {
            1
        }
    }

    fn accrue_passive_score(&mut self, dt_ms: f32) {
        let rate = self.config.base_points_per_sec as f64
            * (self.config.difficulty_multiplier as f64).powi(self.difficulty as i32);
        self.score_accumulator += rate * dt_ms as f64 / 1000.0 * self.score_multiplier() as f64;

        let whole = self.score_accumulator.floor();
        if whole > 0.0 {
            self.player.score += whole as u64;
            self.score_accumulator -= whole;
        }
    }

    fn regenerate_energy(&mut self, dt_ms: f32) {
        self.energy_accumulator += self.config.energy_regen_per_sec * dt_ms / 1000.0;
        let whole = self.energy_accumulator.floor();
        if whole > 0.0 {
            self.player.energy = (self.player.energy + whole as u32).min(self.config.max_energy);
            self.energy_accumulator -= whole;
        }
    }

    fn spawn_entities(&mut self, scrolled: f32) {
        let next_id = &mut self.next_entity_id;
        let batch = self.spawner.advance(scrolled, self.difficulty, &self.config, || {
            let id = *next_id;
            *next_id += 1;
            id
        });
        if let Some(obstacle) = batch.obstacle {
            self.obstacles.push(obstacle);
        }
        if let Some(power_up) = batch.power_up {
            self.power_ups.push(power_up);
        }
    }

    fn scroll_world(&mut self, scrolled: f32) {
        for obstacle in self.obstacles.iter_mut() {
            obstacle.position.x -= scrolled;
        }
        for power_up in self.power_ups.iter_mut() {
            power_up.position.x -= scrolled;
        }
        self.power_ups.retain(|p| p.position.x + p.width >= 0.0);
    }

    /// Awards each obstacle exactly once when its trailing edge passes
    /// the player, then despawns it off-screen. The `scored` flag is the
    /// single source of truth, never re-derived from position.
    fn score_cleared_obstacles(&mut self) {
        let player_x = self.player.position.x;
        let clear_points = self.config.obstacle_points * self.score_multiplier();
        let mut cleared = 0;

        for obstacle in self.obstacles.iter_mut() {
            if !obstacle.scored && obstacle.right_edge() < player_x {
                obstacle.scored = true;
                cleared += 1;
                log::trace!("Obstacle {} cleared", obstacle.id);
            }
        }

        if cleared > 0 {
            self.obstacles_cleared += cleared;
            self.player.score += clear_points * cleared;
        }

        self.obstacles.retain(|o| o.right_edge() >= 0.0);
    }

    fn expire_effects(&mut self, dt_ms: f32) {
        for effect in self.player.effects.iter_mut() {
            effect.remaining_ms -= dt_ms;
        }
        self.player.effects.retain(|effect| {
            let keep = effect.remaining_ms > 0.0;
            if !keep {
                log::debug!("Effect {:?} expired", effect.kind);
            }
            keep
        });

        self.player.hit_cooldown = self.player.hit_cooldown.saturating_sub(1);
    }

    fn resolve_collisions(&mut self) {
        let player_box = self.player.aabb();

        // Power-ups first: a pickup this tick may shield the hit below
        let mut collected = Vec::new();
        self.power_ups.retain(|power_up| {
            if power_up.aabb().intersects(&player_box) {
                collected.push((power_up.kind, power_up.duration_ms));
                false
            } else {
                true
            }
        });
        for (kind, duration_ms) in collected {
            log::info!("Power-up {kind:?} collected");
            self.player.effects.push(ActiveEffect {
                kind,
                remaining_ms: duration_ms,
            });
        }

        let hit = self
            .obstacles
            .iter()
            .find(|o| o.aabb().intersects(&player_box))
            .map(|o| o.id);

        if let Some(obstacle_id) = hit {
            if self.player.has_effect(PowerUpKind::Shield) {
                log::debug!("Shield absorbed hit from obstacle {obstacle_id}");
            } else if self.player.hit_cooldown == 0 {
                self.player.health = self
                    .player
                    .health
                    .saturating_sub(self.config.collision_damage);
                self.player.hit_cooldown = self.config.hit_cooldown_ticks;
                log::debug!(
                    "Hit by obstacle {obstacle_id}, health {}",
                    self.player.health
                );

                if self.player.health == 0 {
                    self.finish_run();
                }
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), GameError> {
        match self.state {
            EngineState::Running => {
                self.state = EngineState::Paused;
                log::debug!("Paused at tick {}", self.frame_count);
                Ok(())
            }
            state => Err(GameError::InvalidStateTransition {
                operation: "pause",
                state,
            }),
        }
    }

    pub fn resume(&mut self) -> Result<(), GameError> {
        match self.state {
            EngineState::Paused => {
                self.state = EngineState::Running;
                log::debug!("Resumed at tick {}", self.frame_count);
                Ok(())
            }
            state => Err(GameError::InvalidStateTransition {
                operation: "resume",
                state,
            }),
        }
    }

    /// Jump input edge. Returns whether a jump actually started; never
    /// an error, ignored input is normal gameplay.
    pub fn jump(&mut self) -> bool {
        if self.state != EngineState::Running {
            return false;
        }
        physics::try_jump(&mut self.player, &self.config)
    }

    /// External score grant. Negative deltas are a caller bug.
    pub fn add_score(&mut self, delta: i64) -> Result<(), GameError> {
        if delta < 0 {
            return Err(GameError::InvalidArgument {
                reason: format!("score delta must be non-negative, got {delta}"),
            });
        }
        self.player.score += delta as u64;
        Ok(())
    }

    /// Force the run to end. Legal from any state but `Idle`.
    pub fn game_over(&mut self) -> Result<(), GameError> {
        if self.state == EngineState::Idle {
            return Err(GameError::InvalidStateTransition {
                operation: "game_over",
                state: self.state,
            });
        }
        self.finish_run();
        Ok(())
    }

    fn finish_run(&mut self) {
        self.state = EngineState::GameOver;
        self.player.is_alive = false;
        log::info!(
            "Game over: score {} after {} frames, {} obstacles cleared",
            self.player.score,
            self.frame_count,
            self.obstacles_cleared
        );
    }

    /// Deep-copied view of the whole simulation. Mutating the engine
    /// afterwards never changes an already-taken snapshot.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            player: PlayerSnapshot::from(&self.player),
            obstacles: ObstacleSnapshot::vec_from_iter(self.obstacles.iter()),
            power_ups: PowerUpSnapshot::vec_from_iter(self.power_ups.iter()),
            score: self.player.score,
            difficulty: self.difficulty,
            game_speed: self.game_speed,
            elapsed_ms: self.elapsed_ms,
            is_paused: self.state == EngineState::Paused,
            is_game_over: self.state == EngineState::GameOver,
            frame_count: self.frame_count,
        }
    }

    /// Final handoff for the score-submission collaborator. Present only
    /// once the run has ended.
    pub fn run_summary(&self) -> Option<RunSummary> {
        if self.state != EngineState::GameOver {
            return None;
        }
        Some(RunSummary {
            score: self.player.score,
            is_alive: self.player.is_alive,
            elapsed_ms: self.elapsed_ms,
            obstacles_cleared: self.obstacles_cleared,
            frames: self.frame_count,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.player.score
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn game_speed(&self) -> f32 {
        self.game_speed
    }

    pub fn obstacles_cleared(&self) -> u64 {
        self.obstacles_cleared
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::math::Vector2;

    const DT: f32 = 1000.0 / 60.0;

    fn running_engine() -> GameEngine {
        let mut engine = GameEngine::new(GameConfig::default());
        engine.start().unwrap();
        engine
    }

    impl GameEngine {
        fn push_obstacle_at(&mut self, x: f32, height: f32) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            self.obstacles.push(Obstacle::new(
                id,
                Vector2::new(x, self.config.ground_y - height),
                self.config.obstacle_width,
                height,
            ));
            id
        }

        fn push_power_up_on_player(&mut self, kind: PowerUpKind) {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            let position = self.player.position;
            let power_up = PowerUp::new(id, kind, position, &self.config);
            self.power_ups.push(power_up);
        }
    }

    #[test]
    fn test_lifecycle_round_trip() {
        let mut engine = GameEngine::new(GameConfig::default());
        assert_eq!(engine.state(), EngineState::Idle);

        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.frame_count(), 0);

        engine.update(16.0);
        assert_eq!(engine.frame_count(), 1);

        engine.pause().unwrap();
        assert!(engine.snapshot().is_paused);
        engine.update(16.0);
        assert_eq!(engine.frame_count(), 1, "paused engine must not tick");

        engine.resume().unwrap();
        engine.game_over().unwrap();
        assert_eq!(engine.state(), EngineState::GameOver);
        assert!(!engine.snapshot().player.is_alive);

        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.frame_count(), 0);
    }

    #[test]
    fn test_start_refused_while_running() {
        let mut engine = running_engine();
        let err = engine.start().unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidStateTransition {
                operation: "start",
                state: EngineState::Running
            }
        );
    }

    #[test]
    fn test_pause_refused_from_idle() {
        let mut engine = GameEngine::new(GameConfig::default());
        assert!(engine.pause().is_err());
        assert!(engine.resume().is_err());
        assert!(engine.game_over().is_err());
    }

    #[test]
    fn test_update_noop_outside_running() {
        let mut engine = GameEngine::new(GameConfig::default());
        engine.update(16.0);
        assert_eq!(engine.frame_count(), 0);

        engine.start().unwrap();
        engine.game_over().unwrap();
        engine.update(16.0);
        assert_eq!(engine.frame_count(), 0);
    }

    #[test]
    fn test_add_score() {
        let mut engine = running_engine();
        engine.add_score(100).unwrap();
        engine.add_score(50).unwrap();
        assert_eq!(engine.score(), 150);

        let err = engine.add_score(-1).unwrap_err();
        assert!(matches!(err, GameError::InvalidArgument { .. }));
        assert_eq!(engine.score(), 150, "failed add must leave score unchanged");
    }

    #[test]
    fn test_jump_ignored_when_not_running() {
        let mut engine = GameEngine::new(GameConfig::default());
        assert!(!engine.jump());

        engine.start().unwrap();
        engine.pause().unwrap();
        assert!(!engine.jump());

        engine.resume().unwrap();
        assert!(engine.jump());
    }

    #[test]
    fn test_collision_damages_then_ends_run() {
        let mut engine = running_engine();
        // Park an obstacle on the player and tick through the cooldowns
        engine.push_obstacle_at(engine.player.position.x, 40.0);

        let mut ticks = 0;
        while engine.state() == EngineState::Running {
            engine.update(DT);
            // Keep the obstacle pinned under the player
            if let Some(obstacle) = engine.obstacles.first_mut() {
                obstacle.position.x = engine.player.position.x;
            }
            ticks += 1;
            assert!(ticks < 10_000, "collisions never ended the run");
        }

        assert_eq!(engine.state(), EngineState::GameOver);
        assert_eq!(engine.snapshot().player.health, 0);
        assert!(!engine.snapshot().player.is_alive);

        let hits = engine.config.max_health / engine.config.collision_damage;
        let cooldown_span = (hits - 1) * engine.config.hit_cooldown_ticks;
        assert!(ticks as u32 > cooldown_span, "hit cooldown was not honored");
    }

    #[test]
    fn test_health_never_underflows() {
        let mut config = GameConfig::default();
        config.collision_damage = 70;
        config.hit_cooldown_ticks = 1;
        let mut engine = GameEngine::new(config);
        engine.start().unwrap();
        engine.push_obstacle_at(engine.player.position.x, 40.0);

        while engine.state() == EngineState::Running {
            engine.update(DT);
            if let Some(obstacle) = engine.obstacles.first_mut() {
                obstacle.position.x = engine.player.position.x;
            }
        }
        // 100 - 70 - 70 saturates at zero
        assert_eq!(engine.snapshot().player.health, 0);
    }

    #[test]
    fn test_obstacle_cleared_exactly_once() {
        let mut engine = running_engine();
        let player_x = engine.player.position.x;
        // Obstacle fully behind the player, unscored
        let id = engine.push_obstacle_at(player_x - 50.0, 40.0);
        let base_score = engine.score();

        engine.update(DT);
        let after_clear = engine.score();
        assert!(
            after_clear >= base_score + engine.config.obstacle_points,
            "clearing must award obstacle points"
        );
        assert_eq!(engine.obstacles_cleared(), 1);

        // Still behind the player for several more ticks: no further award
        for _ in 0..5 {
            engine.update(DT);
        }
        let passive_ceiling = 5.0 * DT as f64 / 1000.0
            * engine.config.base_points_per_sec as f64
            * 2.0;
        assert!(
            engine.score() as f64 - after_clear as f64 <= passive_ceiling.ceil(),
            "obstacle {id} must not score twice"
        );
        assert_eq!(engine.obstacles_cleared(), 1);
    }

    #[test]
    fn test_power_up_collected_once_and_expires() {
        let mut engine = running_engine();
        engine.push_power_up_on_player(PowerUpKind::Shield);

        engine.update(DT);
        assert!(engine.player.has_effect(PowerUpKind::Shield));
        assert!(engine.power_ups.is_empty(), "collected power-up must leave the field");

        // Pause freezes the countdown entirely
        let remaining_before = engine.player.effects[0].remaining_ms;
        engine.pause().unwrap();
        for _ in 0..100 {
            engine.update(DT);
        }
        assert_eq!(engine.player.effects[0].remaining_ms, remaining_before);
        engine.resume().unwrap();

        let ticks_to_expiry =
            (engine.config.powerup_duration_ms / DT).ceil() as usize + 2;
        for _ in 0..ticks_to_expiry {
            engine.update(DT);
        }
        assert!(!engine.player.has_effect(PowerUpKind::Shield));
    }

    #[test]
    fn test_shield_absorbs_hits() {
        let mut engine = running_engine();
        engine.push_power_up_on_player(PowerUpKind::Shield);
        engine.update(DT);
        assert!(engine.player.has_effect(PowerUpKind::Shield));

        engine.push_obstacle_at(engine.player.position.x, 40.0);
        for _ in 0..10 {
            engine.update(DT);
            if let Some(obstacle) = engine.obstacles.first_mut() {
                obstacle.position.x = engine.player.position.x;
            }
        }
        assert_eq!(engine.snapshot().player.health, engine.config.max_health);
    }

    #[test]
    fn test_speed_effect_slows_world() {
        let mut engine = running_engine();
        engine.update(DT);
        let normal_speed = engine.game_speed();

        engine.push_power_up_on_player(PowerUpKind::Speed);
        engine.update(DT);
        engine.update(DT);
        assert!(engine.game_speed() < normal_speed);
    }

    #[test]
    fn test_energy_regenerates_to_cap() {
        let mut engine = running_engine();
        assert!(engine.jump());
        let spent = engine.player.energy;
        assert!(spent < engine.config.max_energy);

        // Three simulated seconds of regen more than covers one jump
        for _ in 0..180 {
            engine.update(DT);
        }
        assert_eq!(engine.player.energy, engine.config.max_energy);
    }

    #[test]
    fn test_passive_score_accrues() {
        let mut engine = running_engine();
        // Two simulated seconds at 60 ticks per second
        for _ in 0..120 {
            engine.update(DT);
        }
        let expected = 2.0 * engine.config.base_points_per_sec as f64;
        assert!(engine.score() as f64 >= expected * 0.9);
    }

    #[test]
    fn test_difficulty_and_speed_progression() {
        let mut config = GameConfig::default();
        config.difficulty_interval_ms = 100.0;
        config.max_difficulty = 3;
        let mut engine = GameEngine::new(config);
        engine.start().unwrap();

        assert_eq!(engine.difficulty(), 0);
        for _ in 0..120 {
            engine.update(DT);
        }
        assert_eq!(engine.difficulty(), 3, "difficulty must cap at the maximum");
        assert!(engine.game_speed() > engine.config.initial_game_speed);
        assert!(engine.game_speed() <= engine.config.max_game_speed);
    }

    #[test]
    fn test_run_summary_only_after_game_over() {
        let mut engine = running_engine();
        assert!(engine.run_summary().is_none());

        engine.update(DT);
        engine.add_score(30).unwrap();
        engine.game_over().unwrap();

        let summary = engine.run_summary().expect("summary after game over");
        assert!(!summary.is_alive);
        assert_eq!(summary.frames, 1);
        assert!(summary.score >= 30);
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let mut engine = running_engine();
        engine.update(DT);
        let snapshot = engine.snapshot();
        let frame = snapshot.frame_count;

        for _ in 0..10 {
            engine.update(DT);
        }
        assert_eq!(snapshot.frame_count, frame);
        assert_ne!(engine.snapshot().frame_count, frame);
    }

    #[test]
    fn test_deterministic_runs_per_seed() {
        let mut first = GameEngine::new(GameConfig::default());
        let mut second = GameEngine::new(GameConfig::default());
        first.start().unwrap();
        second.start().unwrap();

        for tick in 0..600 {
            if tick % 40 == 0 {
                first.jump();
                second.jump();
            }
            first.update(DT);
            second.update(DT);
        }

        let a = serde_json::to_string(&first.snapshot()).unwrap();
        let b = serde_json::to_string(&second.snapshot()).unwrap();
        assert_eq!(a, b);
    }
}
