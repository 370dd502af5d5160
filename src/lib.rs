pub mod game;
pub mod host;
pub mod snapshot;
pub mod sync;

pub use game::{
    config::GameConfig,
    engine::{
        EngineState,
        GameEngine,
        GameError
    },
};
pub use snapshot::{
    GameSnapshot,
    RunSummary
};
pub use sync::{
    Correction,
    SnapshotBuffer,
    SnapshotDelta,
    SyncConfig
};
