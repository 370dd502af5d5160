use clap::{Parser, Subcommand, Args};

/// # Global Arguments
#[derive(Debug, Parser)]
#[command(version, about = "Endless runner simulation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run real-time session with autopilot
    Run(RunArgs),

    /// Fast-forward deterministic simulation
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Spawn RNG seed
    #[arg(short = 's', long = "seed", value_name = "SEED", default_value_t = 0)]
    seed: u64,

    /// Simulation ticks per second
    #[arg(short = 't', long = "tick-rate", value_name = "TICKS_PER_SECOND", default_value_t = 30)]
    tick_rate: u32,

    /// JSON file with gameplay tunables
    #[arg(short = 'c', long = "config", value_name = "CONFIG_PATH")]
    config: Option<std::path::PathBuf>,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Spawn RNG seed
    #[arg(short = 's', long = "seed", value_name = "SEED", default_value_t = 0)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(short = 'n', long = "ticks", value_name = "TICKS", default_value_t = 10_000)]
    ticks: u64,

    /// JSON file with gameplay tunables
    #[arg(short = 'c', long = "config", value_name = "CONFIG_PATH")]
    config: Option<std::path::PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .format_file(false)
        .format_line_number(true)
        .init();

    let cli_args = Cli::parse();
    log::info!("Got args: '{:?}'.", cli_args);

    match cli_args.mode {
        Mode::Run(run_args) => {
            cli_run::run(&run_args);
        },
        Mode::Simulate(simulate_args) => {
            cli_simulate::run(&simulate_args);
        },
    }
}

fn load_game_config(path: Option<&std::path::PathBuf>, seed: u64) -> rust_runner::GameConfig {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).expect("Could not read config file");
            serde_json::from_str(&raw).expect("Could not parse config file")
        },
        None => rust_runner::GameConfig::default(),
    };
    config.rng_seed = seed;
    config
}

fn print_summary(summary: &rust_runner::RunSummary) {
    let report = serde_json::json!({
        "finished_at": chrono::Utc::now().to_rfc3339(),
        "summary": summary,
    });
    println!("{}", serde_json::to_string_pretty(&report).expect("Could not serialize summary"));
}

/// Jump when the nearest obstacle gets inside the reaction window.
fn autopilot_wants_jump(snapshot: &rust_runner::GameSnapshot) -> bool {
    let player_front = snapshot.player.position.x + snapshot.player.width;
    let nearest_gap = snapshot
        .obstacles
        .iter()
        .filter(|o| o.position.x + o.width >= snapshot.player.position.x)
        .map(|o| o.position.x - player_front)
        .fold(f32::INFINITY, f32::min);

    nearest_gap.is_finite() && nearest_gap < snapshot.game_speed * 18.0
}

mod cli_run {
    use std::time::Duration;

    use rust_runner::{
        host::SimulationHost,
        SnapshotBuffer,
        SyncConfig
    };

    pub fn run(args: &super::RunArgs) {
        let game_config = super::load_game_config(args.config.as_ref(), args.seed);
        let sync_config = SyncConfig {
            tick_rate_hz: args.tick_rate,
            ..SyncConfig::default()
        };

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let mut buffer = SnapshotBuffer::from_config(&sync_config);
            let handle = SimulationHost::new(game_config, sync_config).run().unwrap();
            log::info!("Session started, ctrl-C to stop");

            let (ctrlc_sender, mut ctrlc_receiver) = tokio::sync::oneshot::channel();
            let mut ctrlc_sender = Some(ctrlc_sender);

            ctrlc::set_handler(move || {
                log::info!("Captured ctrl-C, stopping the session...");
                if let Some(sndr) = ctrlc_sender.take() {
                    let _ = sndr.send(());
                }
            }).expect("Error setting Ctrl-C handler");

            loop {
                tokio::select! {
                    _ = &mut ctrlc_receiver => {
                        break;
                    },
                    _ = handle.await_game_over() => {
                        log::info!("Run ended on its own");
                        break;
                    },
                    _ = tokio::time::sleep(Duration::from_millis(48)) => {
                        let snapshot = handle.snapshot().unwrap();
                        if snapshot.is_game_over {
                            break;
                        }
                        if super::autopilot_wants_jump(&snapshot) {
                            handle.jump().unwrap();
                        }

                        // What a remote renderer would draw, one
                        // interpolation delay behind the authority
                        let now_ms = snapshot.elapsed_ms;
                        buffer.push(now_ms, snapshot);
                        if let Some(position) = buffer.sample_player_position(now_ms) {
                            log::trace!("Delayed render position {position}");
                        }
                    },
                }
            }

            let summary = handle.shutdown().await.unwrap();
            super::print_summary(&summary);
        })
    }
}

mod cli_simulate {
    use rust_runner::{
        EngineState,
        GameEngine
    };

    pub fn run(args: &super::SimulateArgs) {
        let game_config = super::load_game_config(args.config.as_ref(), args.seed);
        let dt_ms = game_config.reference_frame_ms;

        let mut engine = GameEngine::new(game_config);
        engine.start().unwrap();

        for _ in 0..args.ticks {
            if super::autopilot_wants_jump(&engine.snapshot()) {
                engine.jump();
            }
            engine.update(dt_ms);

            if engine.state() == EngineState::GameOver {
                log::info!("Run ended after {} ticks", engine.frame_count());
                break;
            }
        }

        if engine.state() != EngineState::GameOver {
            engine.game_over().unwrap();
        }

        let summary = engine.run_summary().expect("finished run must have a summary");
        super::print_summary(&summary);
    }
}
