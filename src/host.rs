//! Reference host: drives the engine at the synchronization cadence on
//! a tokio task. The engine itself stays single-threaded; the mutex
//! guarantees each tick runs to completion before anyone observes state.

use std::sync::{
    Arc,
    Mutex
};

use crate::{
    game::engine::{
        EngineState,
        GameEngine,
        GameError
    },
    game::config::GameConfig,
    snapshot::{
        GameSnapshot,
        RunSummary
    },
    sync::SyncConfig,
};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Engine lock was poisoned")]
    LockPoisoned,

    #[error("Could not join task, reason='{0}'")]
    TaskJoinError(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Run did not produce a summary")]
    MissingSummary,
}

pub struct SimulationHost {
    game_config: GameConfig,
    sync_config: SyncConfig,
}

pub struct SimulationHostHandle {
    pub engine: Arc<Mutex<GameEngine>>,
    loop_task_handler: tokio::task::JoinHandle<()>,
    shutdown_sender: tokio::sync::oneshot::Sender<()>,
    notify_game_over: Arc<tokio::sync::Notify>,
}

impl SimulationHost {
    pub fn new(game_config: GameConfig, sync_config: SyncConfig) -> Self {
        Self {
            game_config,
            sync_config,
        }
    }

    /// Start the run and the tick loop. The loop stops on shutdown or
    /// as soon as the engine reports game over.
    pub fn run(self) -> Result<SimulationHostHandle, HostError> {
        let mut engine = GameEngine::new(self.game_config);
        engine.start()?;

        let engine = Arc::new(Mutex::new(engine));
        let engine_shared = engine.clone();

        let (shutdown_sender, mut shutdown_receiver) = tokio::sync::oneshot::channel();

        let notify_game_over = Arc::new(tokio::sync::Notify::new());
        let notify_game_over_shared = notify_game_over.clone();

        let tick_interval = self.sync_config.tick_interval();
        let dt_ms = self.sync_config.tick_interval_ms();

        let loop_task_handler = tokio::spawn(async move {
            log::info!("Host loop at {}Hz", 1000.0 / dt_ms);
            loop {
                tokio::select! {
                    _ = &mut shutdown_receiver => {
                        log::debug!("Received shut down signal...");
                        break;
                    },
                    _ = tokio::time::sleep(tick_interval) => {
                        // Execute every tick
                        let finished = match engine_shared.lock() {
                            Ok(mut engine_guard) => {
                                engine_guard.update(dt_ms);
                                engine_guard.state() == EngineState::GameOver
                            },
                            Err(_) => {
                                log::error!("Engine lock poisoned, stopping loop");
                                break;
                            }
                        };

                        if finished {
                            log::info!("Engine reported game over, stopping loop");
                            notify_game_over_shared.notify_waiters();
                            break;
                        }
                    },
                }
            }
        });

        Ok(SimulationHostHandle {
            engine,
            loop_task_handler,
            shutdown_sender,
            notify_game_over,
        })
    }
}

impl SimulationHostHandle {
    /// Resolves once the engine transitions to game over on its own.
    pub async fn await_game_over(&self) {
        self.notify_game_over.notified().await
    }

    pub fn snapshot(&self) -> Result<GameSnapshot, HostError> {
        let engine_guard = self.engine.lock().map_err(|_| HostError::LockPoisoned)?;
        Ok(engine_guard.snapshot())
    }

    /// Relay a jump input edge. Returns whether the jump started.
    pub fn jump(&self) -> Result<bool, HostError> {
        let mut engine_guard = self.engine.lock().map_err(|_| HostError::LockPoisoned)?;
        Ok(engine_guard.jump())
    }

    /// Pause toggle input edge. Returns the state after toggling; a
    /// finished or idle engine is left untouched.
    pub fn toggle_pause(&self) -> Result<EngineState, HostError> {
        let mut engine_guard = self.engine.lock().map_err(|_| HostError::LockPoisoned)?;
        match engine_guard.state() {
            EngineState::Running => engine_guard.pause()?,
            EngineState::Paused => engine_guard.resume()?,
            _ => {}
        }
        Ok(engine_guard.state())
    }

    /// Stop the loop and hand back the final summary, ending the run
    /// first if it is still alive.
    pub async fn shutdown(self) -> Result<RunSummary, HostError> {
        log::debug!("Gracefully shutting down host...");
        // The loop may already have stopped itself on game over
        let _ = self.shutdown_sender.send(());
        self.loop_task_handler.await?;

        let summary = {
            let mut engine_guard = self.engine.lock().map_err(|_| HostError::LockPoisoned)?;
            if engine_guard.state() != EngineState::GameOver {
                engine_guard.game_over()?;
            }
            engine_guard.run_summary()
        };

        log::debug!("Host shut down successfully!");
        summary.ok_or(HostError::MissingSummary)
    }
}
