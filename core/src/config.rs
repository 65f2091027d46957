//! Session configuration surface and its load-time validation.
//!
//! All values are supplied once at session setup and stay immutable for the
//! lifetime of the world that consumed them. Validation runs before a
//! session starts; a malformed configuration is fatal and never silently
//! tolerated.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DefenderKindId, EnemyKindId};

/// Ordered spawn percentages, one entry per enemy kind, for a single ramp
/// tier.
///
/// Entries are integer percentages evaluated in table order; a valid row
/// sums to exactly 100.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnChanceRow(Vec<u32>);

impl SpawnChanceRow {
    /// Creates a new spawn-chance row from raw percentage weights.
    #[must_use]
    pub fn new(weights: Vec<u32>) -> Self {
        Self(weights)
    }

    /// Percentage weights in enemy-kind order.
    #[must_use]
    pub fn weights(&self) -> &[u32] {
        &self.0
    }

    /// Sum of all percentage weights in the row.
    #[must_use]
    pub fn sum(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Resolves a uniform draw in `[0, 100)` to an enemy kind.
    ///
    /// Performs a cumulative-sum scan over the row: each entry `i` owns the
    /// half-open bucket `[lower, lower + weight[i])` and the first bucket
    /// containing the draw wins. Returns `None` when the row's weights sum
    /// below 100 and the draw lands above the final bound.
    #[must_use]
    pub fn pick(&self, draw: u32) -> Option<EnemyKindId> {
        let mut lower = 0;
        for (index, weight) in self.0.iter().enumerate() {
            let higher = lower + weight;
            if draw >= lower && draw < higher {
                return Some(EnemyKindId::new(index as u32));
            }
            lower = higher;
        }
        None
    }
}

/// Immutable template describing one defender kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenderKindConfig {
    /// Display name used by adapters when narrating events.
    pub name: String,
    /// Energy debited from the session ledger when the defender is placed.
    pub cost: u32,
}

/// Immutable template describing one enemy kind.
///
/// Combat stats live with the presentation layer; the simulation only needs
/// the kind's position in the weight table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyKindConfig {
    /// Display name used by adapters when narrating events.
    pub name: String,
}

/// Bounds of the randomized wait between consecutive spawns on a lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnIntervalConfig {
    /// Shortest base wait drawn between spawns, before ramp scaling.
    pub min: Duration,
    /// Longest base wait drawn between spawns, before ramp scaling.
    pub max: Duration,
}

/// Spawn-rate multiplier and weight row governing one difficulty tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RampTierConfig {
    /// Rate multiplier applied to spawn waits; a value of 2 halves the wait.
    pub spawn_rate: f64,
    /// Weighted enemy selection row active while this tier governs.
    pub spawn_chances: SpawnChanceRow,
}

/// Difficulty ramp: ordered tiers plus the match times at which they begin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RampConfig {
    /// Match times at which tiers 1.. begin; tier 0 governs from the start.
    pub thresholds: Vec<Duration>,
    /// Per-tier spawn parameters, indexed by ramp index.
    pub tiers: Vec<RampTierConfig>,
}

/// Complete configuration for one level session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of lanes laid out on the battlefield.
    pub lanes: u32,
    /// Number of placement tiles contained in each lane.
    pub tiles_per_lane: u32,
    /// Energy available in the ledger when the session opens.
    pub starting_energy: u32,
    /// Defender kind table, indexed by [`DefenderKindId`].
    pub defender_kinds: Vec<DefenderKindConfig>,
    /// Enemy kind table, indexed by [`EnemyKindId`].
    pub enemy_kinds: Vec<EnemyKindConfig>,
    /// Bounds of the randomized wait between spawns.
    pub spawn_interval: SpawnIntervalConfig,
    /// Difficulty ramp tiers and their activation thresholds.
    pub ramp: RampConfig,
}

impl SessionConfig {
    /// Checks every structural invariant the simulation relies on.
    ///
    /// Called before session start; any error is fatal to the session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes == 0 {
            return Err(ConfigError::NoLanes);
        }
        if self.tiles_per_lane == 0 {
            return Err(ConfigError::NoTiles);
        }
        if self.defender_kinds.is_empty() {
            return Err(ConfigError::NoDefenderKinds);
        }
        if self.enemy_kinds.is_empty() {
            return Err(ConfigError::NoEnemyKinds);
        }
        if self.spawn_interval.min > self.spawn_interval.max {
            return Err(ConfigError::InvalidSpawnInterval);
        }
        if self.ramp.tiers.is_empty() {
            return Err(ConfigError::NoRampTiers);
        }

        let expected_thresholds = self.ramp.tiers.len() - 1;
        if self.ramp.thresholds.len() != expected_thresholds {
            return Err(ConfigError::ThresholdCountMismatch {
                expected: expected_thresholds,
                found: self.ramp.thresholds.len(),
            });
        }
        if self
            .ramp
            .thresholds
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(ConfigError::ThresholdsNotIncreasing);
        }

        for (tier, config) in self.ramp.tiers.iter().enumerate() {
            if !(config.spawn_rate.is_finite() && config.spawn_rate > 0.0) {
                return Err(ConfigError::InvalidSpawnRate { tier });
            }
            let row = &config.spawn_chances;
            if row.weights().len() != self.enemy_kinds.len() {
                return Err(ConfigError::RowLengthMismatch {
                    tier,
                    expected: self.enemy_kinds.len(),
                    found: row.weights().len(),
                });
            }
            if row.sum() != 100 {
                return Err(ConfigError::WeightSumMismatch {
                    tier,
                    sum: row.sum(),
                });
            }
        }

        Ok(())
    }

    /// Spawn cost of the provided defender kind, if the kind exists.
    #[must_use]
    pub fn defender_cost(&self, kind: DefenderKindId) -> Option<u32> {
        self.defender_kinds
            .get(kind.get() as usize)
            .map(|config| config.cost)
    }

    /// Number of enemy kinds configured for the session.
    #[must_use]
    pub fn enemy_kind_count(&self) -> usize {
        self.enemy_kinds.len()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lanes: 5,
            tiles_per_lane: 9,
            starting_energy: 100,
            defender_kinds: vec![
                DefenderKindConfig {
                    name: "trooper".to_owned(),
                    cost: 50,
                },
                DefenderKindConfig {
                    name: "sharpshooter".to_owned(),
                    cost: 100,
                },
            ],
            enemy_kinds: vec![
                EnemyKindConfig {
                    name: "walker".to_owned(),
                },
                EnemyKindConfig {
                    name: "brute".to_owned(),
                },
                EnemyKindConfig {
                    name: "sprinter".to_owned(),
                },
            ],
            spawn_interval: SpawnIntervalConfig {
                min: Duration::from_secs(2),
                max: Duration::from_secs(4),
            },
            ramp: RampConfig {
                thresholds: vec![Duration::from_secs(45), Duration::from_secs(90)],
                tiers: vec![
                    RampTierConfig {
                        spawn_rate: 1.0,
                        spawn_chances: SpawnChanceRow::new(vec![60, 30, 10]),
                    },
                    RampTierConfig {
                        spawn_rate: 1.5,
                        spawn_chances: SpawnChanceRow::new(vec![40, 35, 25]),
                    },
                    RampTierConfig {
                        spawn_rate: 2.0,
                        spawn_chances: SpawnChanceRow::new(vec![20, 30, 50]),
                    },
                ],
            },
        }
    }
}

/// Structural configuration faults detected before session start.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The battlefield has no lanes.
    #[error("battlefield has no lanes")]
    NoLanes,
    /// Lanes have no placement tiles.
    #[error("lanes have no placement tiles")]
    NoTiles,
    /// The defender kind table is empty.
    #[error("no defender kinds configured")]
    NoDefenderKinds,
    /// The enemy kind table is empty.
    #[error("no enemy kinds configured")]
    NoEnemyKinds,
    /// The ramp carries no tiers at all.
    #[error("no ramp tiers configured")]
    NoRampTiers,
    /// A spawn-chance row disagrees with the enemy kind table length.
    #[error("ramp tier {tier} spawn-chance row has {found} entries, expected {expected}")]
    RowLengthMismatch {
        /// Ramp tier whose row is malformed.
        tier: usize,
        /// Number of entries the enemy kind table requires.
        expected: usize,
        /// Number of entries the row actually carries.
        found: usize,
    },
    /// A spawn-chance row's weights do not sum to 100.
    #[error("ramp tier {tier} spawn chances sum to {sum}, expected 100")]
    WeightSumMismatch {
        /// Ramp tier whose row is malformed.
        tier: usize,
        /// Actual sum of the row's weights.
        sum: u32,
    },
    /// The threshold list disagrees with the tier count.
    #[error("expected {expected} ramp thresholds, found {found}")]
    ThresholdCountMismatch {
        /// Number of thresholds required (one fewer than the tier count).
        expected: usize,
        /// Number of thresholds actually configured.
        found: usize,
    },
    /// Ramp thresholds must be strictly increasing.
    #[error("ramp thresholds must be strictly increasing")]
    ThresholdsNotIncreasing,
    /// A tier's spawn-rate multiplier is zero, negative, or non-finite.
    #[error("ramp tier {tier} has a non-positive spawn rate")]
    InvalidSpawnRate {
        /// Ramp tier whose rate is malformed.
        tier: usize,
    },
    /// The minimum spawn interval exceeds the maximum.
    #[error("minimum spawn interval exceeds maximum")]
    InvalidSpawnInterval,
}
