#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter that drives a Lane Defence session.
//!
//! Loads a session configuration, wires the world to the ramp, spawning,
//! and combat systems, runs the tick loop, and narrates the emitted events
//! through `tracing`. Useful for balancing sessions without a renderer.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use lane_defence_core::{
    Command, DefenderKindId, Event, LaneId, SessionConfig, TileIndex, TilePosition,
};
use lane_defence_system_combat::CombatTrigger;
use lane_defence_system_ramp::{self as ramp, RampController};
use lane_defence_system_spawning::{self as spawning, SpawnScheduler};
use lane_defence_world::{self as world, query, World};

/// Command-line arguments for the headless runner.
#[derive(Debug, Parser)]
#[command(name = "lane-defence", about = "Headless Lane Defence simulation runner")]
struct Args {
    /// Path to a JSON session configuration; defaults to the built-in session.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed feeding the per-lane spawn streams.
    #[arg(long, default_value_t = 0x4d59_5df4_d0f3_3173)]
    seed: u64,
    /// Number of simulation steps to run after the level starts.
    #[arg(long, default_value_t = 1_200)]
    steps: u32,
    /// Simulated milliseconds per step.
    #[arg(long, default_value_t = 100)]
    step_millis: u64,
    /// Defender placement applied before the level starts, as `lane,tile,kind`.
    #[arg(long = "place", value_parser = parse_placement)]
    placements: Vec<Placement>,
}

#[derive(Clone, Copy, Debug)]
struct Placement {
    lane: u32,
    tile: u32,
    kind: u32,
}

fn parse_placement(raw: &str) -> Result<Placement, String> {
    let parts: Vec<&str> = raw.split(',').collect();
    let &[lane, tile, kind] = parts.as_slice() else {
        return Err(format!("expected lane,tile,kind but got `{raw}`"));
    };
    let parse = |field: &str, value: &str| {
        value
            .trim()
            .parse::<u32>()
            .map_err(|error| format!("invalid {field} `{value}`: {error}"))
    };
    Ok(Placement {
        lane: parse("lane", lane)?,
        tile: parse("tile", tile)?,
        kind: parse("kind", kind)?,
    })
}

/// Entry point for the Lane Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let mut session = Session::new(config, args.seed)?;
    for placement in &args.placements {
        session.drive(Command::PlaceDefender {
            position: TilePosition::new(
                LaneId::new(placement.lane),
                TileIndex::new(placement.tile),
            ),
            kind: DefenderKindId::new(placement.kind),
        });
    }

    session.drive(Command::StartLevel);
    let dt = Duration::from_millis(args.step_millis);
    for _ in 0..args.steps {
        session.drive(Command::Tick { dt });
    }

    session.print_summary();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse configuration {}", path.display()))
}

struct Session {
    config: SessionConfig,
    world: World,
    controller: RampController,
    scheduler: SpawnScheduler,
    trigger: CombatTrigger,
    spawn_counts: Vec<u64>,
}

impl Session {
    fn new(config: SessionConfig, seed: u64) -> Result<Self> {
        let world = World::new(config.clone()).context("session configuration rejected")?;
        let controller = RampController::new(ramp::Config::from_session(&config));
        let scheduler =
            SpawnScheduler::new(spawning::Config::from_session(&config, seed), config.lanes);
        let trigger = CombatTrigger::new(config.lanes);
        let spawn_counts = vec![0; config.enemy_kinds.len()];
        Ok(Self {
            config,
            world,
            controller,
            scheduler,
            trigger,
            spawn_counts,
        })
    }

    /// Applies one inbound command and pumps every system reaction for the
    /// step, resolving combat only after occupancy mutations have settled.
    fn drive(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        let mut commands = Vec::new();
        self.controller.handle(&events, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        let mut commands = Vec::new();
        self.scheduler
            .handle(&events, query::ramp_index(&self.world), &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        let occupancy = query::occupancy_view(&self.world);
        let mut commands = Vec::new();
        self.trigger.handle(&occupancy, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        self.narrate(&events);
    }

    fn narrate(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemySpawned { lane, enemy, kind } => {
                    if let Some(count) = self.spawn_counts.get_mut(kind.get() as usize) {
                        *count += 1;
                    }
                    tracing::info!(
                        lane = lane.get(),
                        enemy = enemy.get(),
                        kind = self.kind_name(kind.get()),
                        "enemy spawned"
                    );
                }
                Event::RampAdvanced { index } => {
                    tracing::info!(index = index.get(), "difficulty ramp advanced");
                }
                Event::LevelPhaseChanged { phase } => {
                    tracing::info!(?phase, "level phase changed");
                }
                Event::DefenderPlaced {
                    position, defender, ..
                } => {
                    tracing::info!(
                        lane = position.lane().get(),
                        tile = position.tile().get(),
                        defender = defender.get(),
                        "defender placed"
                    );
                }
                Event::DefenderPlacementRejected {
                    position, reason, ..
                } => {
                    tracing::warn!(
                        lane = position.lane().get(),
                        tile = position.tile().get(),
                        ?reason,
                        "defender placement rejected"
                    );
                }
                Event::DefenderStartShooting { lane } => {
                    tracing::info!(lane = lane.get(), "defender side opened fire");
                }
                Event::DefenderStopShooting { lane } => {
                    tracing::info!(lane = lane.get(), "defender side ceased fire");
                }
                Event::EnemyStartShooting { lane } => {
                    tracing::info!(lane = lane.get(), "enemy side opened fire");
                }
                Event::EnemyStopShooting { lane } => {
                    tracing::info!(lane = lane.get(), "enemy side ceased fire");
                }
                Event::EnergySpent { amount, remaining } => {
                    tracing::debug!(amount, remaining, "energy spent");
                }
                _ => {}
            }
        }
    }

    fn kind_name(&self, kind: u32) -> &str {
        self.config
            .enemy_kinds
            .get(kind as usize)
            .map_or("unknown", |config| config.name.as_str())
    }

    fn print_summary(&self) {
        println!(
            "session summary: {:?} elapsed, ramp {}, {} energy left",
            query::elapsed(&self.world),
            query::ramp_index(&self.world).get(),
            query::energy(&self.world),
        );
        for (index, count) in self.spawn_counts.iter().enumerate() {
            println!("  {:<14} {count}", self.kind_name(index as u32));
        }
        println!(
            "  {} enemies alive across {} lanes",
            query::enemy_view(&self.world).into_vec().len(),
            query::lane_count(&self.world),
        );
    }
}
