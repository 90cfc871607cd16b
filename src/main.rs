//! Charon Run entry point
//!
//! Native builds run a headless autopilot crossing and log the result. A
//! browser/host shell drives `Game::frame` from its own animation callback.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;

use charon_run::persistence::FileStore;
use charon_run::platform::NullPlatform;
use charon_run::sim::{RunState, TickInput};
use charon_run::{Game, GameConfig, RunPhase};

const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up after this many simulated seconds
const MAX_DEMO_SECONDS: f32 = 600.0;
const SAVE_PATH: &str = "charon-run.save.json";

/// Steer toward the nearest pickup ahead, bribe anything about to hit the boat
fn autopilot(run: &RunState) -> TickInput {
    let boat = &run.boat;
    let target = run
        .pickups
        .iter()
        .filter(|p| p.pos.y < boat.pos.y)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|p| p.pos.x);

    let threat = run.obstacles.iter().any(|o| {
        let dy = boat.pos.y - o.pos.y;
        dy > 0.0 && dy < 160.0 && (o.pos.x - boat.pos.x).abs() < o.radius + boat.half_width
    });

    TickInput {
        steer: 0.0,
        target_x: target,
        bribe: threat,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Charon Run (native) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            GameConfig::load(&path).with_context(|| format!("loading config from {}", path))?
        }
        None => GameConfig::bundled().context("loading bundled config")?,
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut game = Game::new(config, NullPlatform, FileStore::new(SAVE_PATH), seed);
    log::info!(
        "Best score {}, wallet {} coins",
        game.progress().best_score,
        game.progress().wallet_coins
    );

    game.start_run();
    let mut now = 0.0_f64;
    while game.phase() != RunPhase::GameOver && (now as f32) < MAX_DEMO_SECONDS {
        let input = game.run().map(autopilot).unwrap_or_default();
        now += f64::from(FRAME_DT);
        game.frame(FRAME_DT, now, &input);
        for notice in game.take_notices() {
            log::info!("{}", notice);
        }
    }

    let snapshot = game.snapshot();
    match &snapshot.settlement {
        Some(settlement) => println!(
            "Crossing over: {} m, +{} coins (best {}, wallet {})",
            settlement.score, settlement.earnings, snapshot.best_score, snapshot.wallet_coins
        ),
        None => println!("Demo stopped after {:.0}s at {} m", now, snapshot.distance),
    }
    Ok(())
}
