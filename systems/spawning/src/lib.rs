#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-lane spawn scheduling with weighted, ramp-aware enemy selection.
//!
//! Each lane runs a cooperative timer: while the level is active the lane
//! waits a randomized interval scaled by the current ramp tier, then asks
//! the weighted spawn table for an enemy kind and emits a spawn command.
//! A cycle snapshots the ramp index once, so the wait's rate multiplier and
//! the eventual weight-row lookup always agree, and a ramp advance that
//! lands mid-wait only affects the next cycle.

use std::time::Duration;

use lane_defence_core::{
    Command, EnemyKindId, Event, LaneId, LevelPhase, RampIndex, RampTierConfig, SessionConfig,
    SpawnChanceRow, SpawnIntervalConfig,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

const RNG_STREAM_LANE_PREFIX: &str = "lane-spawner";

/// Configuration parameters required to construct the spawn scheduler.
#[derive(Clone, Debug)]
pub struct Config {
    interval: SpawnIntervalConfig,
    tiers: Vec<RampTierConfig>,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from explicit spawn parameters.
    #[must_use]
    pub fn new(interval: SpawnIntervalConfig, tiers: Vec<RampTierConfig>, rng_seed: u64) -> Self {
        Self {
            interval,
            tiers,
            rng_seed,
        }
    }

    /// Extracts the spawn parameters from a session configuration.
    #[must_use]
    pub fn from_session(session: &SessionConfig, rng_seed: u64) -> Self {
        Self::new(
            session.spawn_interval,
            session.ramp.tiers.clone(),
            rng_seed,
        )
    }
}

/// Weighted enemy-selection table indexed by ramp tier.
#[derive(Debug)]
pub struct RampedSpawnTable {
    tiers: Vec<RampTierConfig>,
}

impl RampedSpawnTable {
    /// Creates a new table from per-tier spawn parameters.
    #[must_use]
    pub fn new(tiers: Vec<RampTierConfig>) -> Self {
        Self { tiers }
    }

    /// Spawn-rate multiplier for the provided ramp index.
    ///
    /// Indices beyond the last configured tier clamp to the final tier. An
    /// empty table reports a neutral multiplier of 1.
    #[must_use]
    pub fn rate(&self, ramp: RampIndex) -> f64 {
        self.tier(ramp).map_or(1.0, |tier| tier.spawn_rate)
    }

    /// Weight row governing the provided ramp index, if the table has one.
    #[must_use]
    pub fn row(&self, ramp: RampIndex) -> Option<&SpawnChanceRow> {
        self.tier(ramp).map(|tier| &tier.spawn_chances)
    }

    /// Resolves a uniform draw in `[0, 100)` against the tier's weight row.
    ///
    /// Entries are evaluated in table order and the first matching
    /// cumulative bucket wins; `None` deterministically signals that the
    /// draw landed above the row's final bound.
    #[must_use]
    pub fn pick(&self, ramp: RampIndex, draw: u32) -> Option<EnemyKindId> {
        self.row(ramp).and_then(|row| row.pick(draw))
    }

    fn tier(&self, ramp: RampIndex) -> Option<&RampTierConfig> {
        if self.tiers.is_empty() {
            return None;
        }
        let index = (ramp.get() as usize).min(self.tiers.len() - 1);
        self.tiers.get(index)
    }
}

/// Pure system that runs one cooperative spawn timer per lane.
#[derive(Debug)]
pub struct SpawnScheduler {
    table: RampedSpawnTable,
    interval: SpawnIntervalConfig,
    phase: LevelPhase,
    lanes: Vec<LaneScheduler>,
}

impl SpawnScheduler {
    /// Creates a new scheduler covering `lane_count` lanes.
    ///
    /// Every lane receives its own random stream derived from the session
    /// seed, so lanes stay independent and a session replays identically.
    #[must_use]
    pub fn new(config: Config, lane_count: u32) -> Self {
        let lanes = (0..lane_count)
            .map(|row| {
                let id = LaneId::new(row);
                LaneScheduler {
                    id,
                    rng: ChaCha8Rng::seed_from_u64(derive_lane_seed(config.rng_seed, id)),
                    state: LaneState::Idle,
                }
            })
            .collect();

        Self {
            table: RampedSpawnTable::new(config.tiers),
            interval: config.interval,
            phase: LevelPhase::Preparation,
            lanes,
        }
    }

    /// Consumes events plus the queried ramp index and emits spawn commands.
    ///
    /// Control events are processed before time accumulates, so a halt that
    /// arrives in the same batch as a tick cancels the lane at the wait
    /// boundary and the lane emits nothing further.
    pub fn handle(&mut self, events: &[Event], ramp: RampIndex, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::LevelPhaseChanged { phase } => {
                    self.phase = *phase;
                    match phase {
                        LevelPhase::Active => self.start_idle_lanes(ramp),
                        LevelPhase::Ending => self.halt_all(),
                        LevelPhase::Preparation => {}
                    }
                }
                Event::SpawnerHalted { lane } => self.halt_lane(*lane),
                _ => {}
            }
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if self.phase != LevelPhase::Active || accumulated.is_zero() {
            return;
        }

        if self.interval.max.is_zero() {
            return;
        }

        for lane in self.lanes.iter_mut() {
            let LaneState::Waiting {
                mut remaining,
                ramp: mut cycle_ramp,
            } = lane.state
            else {
                continue;
            };

            let mut pending = accumulated;
            loop {
                if pending < remaining {
                    lane.state = LaneState::Waiting {
                        remaining: remaining - pending,
                        ramp: cycle_ramp,
                    };
                    break;
                }
                pending -= remaining;

                let draw = lane.rng.gen_range(0..100);
                if let Some(kind) = select_kind(&self.table, lane.id, cycle_ramp, draw) {
                    out.push(Command::SpawnEnemy {
                        lane: lane.id,
                        kind,
                    });
                }

                // The next cycle snapshots the ramp index in force right now.
                cycle_ramp = ramp;
                remaining = draw_wait(&mut lane.rng, self.interval, self.table.rate(cycle_ramp));
            }
        }
    }

    fn start_idle_lanes(&mut self, ramp: RampIndex) {
        for lane in self.lanes.iter_mut() {
            if matches!(lane.state, LaneState::Idle) {
                let wait = draw_wait(&mut lane.rng, self.interval, self.table.rate(ramp));
                lane.state = LaneState::Waiting {
                    remaining: wait,
                    ramp,
                };
            }
        }
    }

    fn halt_all(&mut self) {
        for lane in self.lanes.iter_mut() {
            lane.state = LaneState::Halted;
        }
    }

    fn halt_lane(&mut self, lane: LaneId) {
        if let Some(scheduler) = self.lanes.get_mut(lane.get() as usize) {
            scheduler.state = LaneState::Halted;
        }
    }
}

#[derive(Debug)]
struct LaneScheduler {
    id: LaneId,
    rng: ChaCha8Rng,
    state: LaneState,
}

#[derive(Clone, Copy, Debug)]
enum LaneState {
    Idle,
    Waiting {
        remaining: Duration,
        ramp: RampIndex,
    },
    Halted,
}

fn select_kind(
    table: &RampedSpawnTable,
    lane: LaneId,
    ramp: RampIndex,
    draw: u32,
) -> Option<EnemyKindId> {
    if let Some(kind) = table.pick(ramp, draw) {
        return Some(kind);
    }

    let fallback = table.row(ramp)?.weights().len().checked_sub(1)?;
    tracing::warn!(
        lane = lane.get(),
        draw,
        "spawn draw missed every weight bucket, falling back to the last kind"
    );
    Some(EnemyKindId::new(fallback as u32))
}

// A drawn wait never collapses below one millisecond, whatever the rate.
const MIN_WAIT: Duration = Duration::from_millis(1);

fn draw_wait(rng: &mut ChaCha8Rng, interval: SpawnIntervalConfig, rate: f64) -> Duration {
    let min = interval.min.as_secs_f64();
    let max = interval.max.as_secs_f64();
    let base = rng.gen_range(min..=max);
    Duration::from_secs_f64(base / rate).max(MIN_WAIT)
}

fn derive_lane_seed(session_seed: u64, lane: LaneId) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(session_seed.to_le_bytes());
    hasher.update(RNG_STREAM_LANE_PREFIX.as_bytes());
    hasher.update(lane.get().to_le_bytes());
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}
