#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation collaborators to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with
//! new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod config;

pub use config::{
    ConfigError, DefenderKindConfig, EnemyKindConfig, RampConfig, RampTierConfig, SessionConfig,
    SpawnChanceRow, SpawnIntervalConfig,
};

/// Describes the active phase of a level session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelPhase {
    /// Setup phase before the match starts; defenders may be placed and moved.
    Preparation,
    /// The match is running: spawners emit enemies and combat resolves.
    Active,
    /// The match is winding down; placement is closed and spawners halt.
    Ending,
}

/// Identifies which side of a lane a combat transition applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatSide {
    /// The player-placed defender side of the lane.
    Defender,
    /// The spawned enemy side of the lane.
    Enemy,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests the transition from preparation into the active match phase.
    StartLevel,
    /// Requests the transition into the ending phase, closing the battlefield.
    EndLevel,
    /// Requests that the session ramp index advance to the provided value.
    AdvanceRamp {
        /// Difficulty tier the ramp controller computed from elapsed time.
        index: RampIndex,
    },
    /// Requests that a lane's spawner emit a new enemy of the chosen kind.
    SpawnEnemy {
        /// Lane whose spawner produced the enemy.
        lane: LaneId,
        /// Kind of enemy selected by the weighted spawn table.
        kind: EnemyKindId,
    },
    /// Requests removal of an enemy unit from the battlefield.
    DespawnEnemy {
        /// Identifier of the enemy to remove.
        enemy: EnemyId,
    },
    /// Requests placement of a defender on the provided tile.
    PlaceDefender {
        /// Tile targeted for placement.
        position: TilePosition,
        /// Kind of defender to construct.
        kind: DefenderKindId,
    },
    /// Requests removal of the defender occupying the provided tile.
    RemoveDefender {
        /// Tile whose defender should be removed.
        position: TilePosition,
    },
    /// Requests relocation of an existing defender to an empty tile.
    MoveDefender {
        /// Tile currently holding the defender.
        from: TilePosition,
        /// Destination tile for the defender.
        to: TilePosition,
    },
    /// Requests that a single lane's spawner stop emitting enemies.
    HaltSpawning {
        /// Lane whose spawner should halt.
        lane: LaneId,
    },
    /// Requests that one side of a lane begin shooting.
    StartShooting {
        /// Lane whose units should start shooting.
        lane: LaneId,
        /// Side of the lane the transition applies to.
        side: CombatSide,
    },
    /// Requests that one side of a lane cease shooting.
    StopShooting {
        /// Lane whose units should stop shooting.
        lane: LaneId,
        /// Side of the lane the transition applies to.
        side: CombatSide,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the session entered a new level phase.
    LevelPhaseChanged {
        /// Phase that became active after processing commands.
        phase: LevelPhase,
    },
    /// Confirms that the session difficulty ramp advanced.
    RampAdvanced {
        /// Ramp index now governing spawn rates and weight rows.
        index: RampIndex,
    },
    /// Confirms that an enemy was created by a lane spawner.
    EnemySpawned {
        /// Lane the enemy occupies after spawning.
        lane: LaneId,
        /// Identifier assigned to the newly spawned enemy.
        enemy: EnemyId,
        /// Kind selected by the weighted spawn table.
        kind: EnemyKindId,
    },
    /// Confirms that an enemy was removed from the battlefield.
    EnemyDespawned {
        /// Lane the enemy occupied before removal.
        lane: LaneId,
        /// Identifier of the removed enemy.
        enemy: EnemyId,
    },
    /// Confirms that a defender was placed on a tile.
    DefenderPlaced {
        /// Tile the defender occupies.
        position: TilePosition,
        /// Identifier assigned to the defender by the world.
        defender: DefenderId,
        /// Kind of defender that was constructed.
        kind: DefenderKindId,
    },
    /// Confirms that a defender was removed from its tile.
    DefenderRemoved {
        /// Tile the defender occupied before removal.
        position: TilePosition,
        /// Identifier of the removed defender.
        defender: DefenderId,
    },
    /// Confirms that a defender relocated to a new tile.
    DefenderMoved {
        /// Tile the defender occupied before the move.
        from: TilePosition,
        /// Tile the defender occupies after the move.
        to: TilePosition,
        /// Identifier of the relocated defender.
        defender: DefenderId,
    },
    /// Reports that a defender placement request was rejected.
    DefenderPlacementRejected {
        /// Tile provided in the placement request.
        position: TilePosition,
        /// Kind of defender requested for placement.
        kind: DefenderKindId,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a defender move request was rejected.
    DefenderMoveRejected {
        /// Source tile provided in the move request.
        from: TilePosition,
        /// Destination tile provided in the move request.
        to: TilePosition,
        /// Specific reason the move failed.
        reason: MoveError,
    },
    /// Confirms that placement spent energy from the session ledger.
    EnergySpent {
        /// Amount of energy debited by the placement.
        amount: u32,
        /// Energy remaining in the ledger after the debit.
        remaining: u32,
    },
    /// Confirms that a lane's spawner halted and will emit no further enemies.
    SpawnerHalted {
        /// Lane whose spawner halted.
        lane: LaneId,
    },
    /// Announces that the defender side of a lane started shooting.
    DefenderStartShooting {
        /// Lane whose defender side opened fire.
        lane: LaneId,
    },
    /// Announces that the defender side of a lane stopped shooting.
    DefenderStopShooting {
        /// Lane whose defender side ceased fire.
        lane: LaneId,
    },
    /// Announces that the enemy side of a lane started shooting.
    EnemyStartShooting {
        /// Lane whose enemy side opened fire.
        lane: LaneId,
    },
    /// Announces that the enemy side of a lane stopped shooting.
    EnemyStopShooting {
        /// Lane whose enemy side ceased fire.
        lane: LaneId,
    },
}

/// Unique identifier assigned to a lane, equal to its row number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneId(u32);

impl LaneId {
    /// Creates a new lane identifier with the provided row number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric row number of the lane.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position of a placement tile within its lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex(u32);

impl TileIndex {
    /// Creates a new tile index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based position of the tile within its lane.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single placement tile expressed as lane and tile indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePosition {
    lane: LaneId,
    tile: TileIndex,
}

impl TilePosition {
    /// Creates a new tile position from lane and tile indices.
    #[must_use]
    pub const fn new(lane: LaneId, tile: TileIndex) -> Self {
        Self { lane, tile }
    }

    /// Lane that contains the tile.
    #[must_use]
    pub const fn lane(&self) -> LaneId {
        self.lane
    }

    /// Position of the tile within its lane.
    #[must_use]
    pub const fn tile(&self) -> TileIndex {
        self.tile
    }
}

/// Unique identifier assigned to a defender unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefenderId(u32);

impl DefenderId {
    /// Creates a new defender identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a defender kind within the session's defender table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefenderKindId(u32);

impl DefenderKindId {
    /// Creates a new defender kind index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based index into the defender kind table.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of an enemy kind within the session's weight table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyKindId(u32);

impl EnemyKindId {
    /// Creates a new enemy kind index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the zero-based index into the enemy kind table.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Difficulty tier derived from elapsed match time.
///
/// The index selects both the spawn-rate multiplier and the weight row used
/// by lane spawners, and never decreases within a session.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RampIndex(u32);

impl RampIndex {
    /// Creates a new ramp index with the provided tier value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric tier of the ramp index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Reasons a defender placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The session is in the ending phase, so placement is disabled.
    LevelEnding,
    /// The requested lane does not exist on the battlefield.
    UnknownLane,
    /// The requested tile index lies beyond the lane's tile row.
    TileOutOfBounds,
    /// The requested defender kind is not present in the session table.
    UnknownKind,
    /// The requested tile already holds a defender.
    TileOccupied,
    /// The energy ledger cannot cover the defender's spawn cost.
    InsufficientEnergy,
}

/// Reasons a defender move request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveError {
    /// Moves are only permitted during the preparation phase.
    LevelStarted,
    /// The source or destination lane does not exist on the battlefield.
    UnknownLane,
    /// The source or destination tile index lies beyond the lane's tile row.
    TileOutOfBounds,
    /// The source tile holds no defender to relocate.
    SourceTileEmpty,
    /// The destination tile already holds a defender.
    DestinationOccupied,
}

/// Per-lane presence flags derived from live lane membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaneOccupancySnapshot {
    /// Lane the flags describe.
    pub lane: LaneId,
    /// Indicates whether at least one enemy currently occupies the lane.
    pub enemy_present: bool,
    /// Indicates whether at least one defender currently occupies the lane.
    pub defender_present: bool,
}

/// Read-only occupancy capture covering every lane on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct OccupancyView {
    snapshots: Vec<LaneOccupancySnapshot>,
}

impl OccupancyView {
    /// Creates a new occupancy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<LaneOccupancySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.lane);
        Self { snapshots }
    }

    /// Iterator over the captured lane snapshots in lane order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &LaneOccupancySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<LaneOccupancySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Lane the enemy currently occupies.
    pub lane: LaneId,
    /// Kind selected for the enemy at spawn time.
    pub kind: EnemyKindId,
}

/// Read-only snapshot describing all enemies on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single defender's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefenderSnapshot {
    /// Unique identifier assigned to the defender.
    pub id: DefenderId,
    /// Tile the defender currently occupies.
    pub position: TilePosition,
    /// Kind selected for the defender at placement time.
    pub kind: DefenderKindId,
}

/// Read-only snapshot describing all defenders on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct DefenderView {
    snapshots: Vec<DefenderSnapshot>,
}

impl DefenderView {
    /// Creates a new defender view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DefenderSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured defender snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &DefenderSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<DefenderSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CombatSide, DefenderId, EnemyId, EnemyKindId, LaneId, MoveError, PlacementError, RampIndex,
        TileIndex, TilePosition,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn lane_id_round_trips_through_bincode() {
        assert_round_trip(&LaneId::new(3));
    }

    #[test]
    fn tile_position_round_trips_through_bincode() {
        let position = TilePosition::new(LaneId::new(2), TileIndex::new(7));
        assert_round_trip(&position);
    }

    #[test]
    fn unit_ids_round_trip_through_bincode() {
        assert_round_trip(&DefenderId::new(11));
        assert_round_trip(&EnemyId::new(42));
        assert_round_trip(&EnemyKindId::new(1));
    }

    #[test]
    fn ramp_index_round_trips_through_bincode() {
        assert_round_trip(&RampIndex::new(4));
    }

    #[test]
    fn rejection_reasons_round_trip_through_bincode() {
        assert_round_trip(&PlacementError::InsufficientEnergy);
        assert_round_trip(&MoveError::DestinationOccupied);
        assert_round_trip(&CombatSide::Enemy);
    }

    #[test]
    fn ramp_index_default_is_zero() {
        assert_eq!(RampIndex::default().get(), 0);
    }

    #[test]
    fn tile_position_exposes_lane_and_tile() {
        let position = TilePosition::new(LaneId::new(1), TileIndex::new(4));
        assert_eq!(position.lane(), LaneId::new(1));
        assert_eq!(position.tile(), TileIndex::new(4));
    }
}
