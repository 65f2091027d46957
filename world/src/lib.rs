#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Lane Defence.
//!
//! The world owns lanes, tiles, units, the energy ledger, the level phase,
//! and the difficulty ramp. All mutations flow through [`apply`]; read
//! access goes through the [`query`] module. Occupancy is always derived
//! from live lane membership and never cached.

use lane_defence_core::{
    CombatSide, Command, ConfigError, DefenderId, DefenderKindId, EnemyId, EnemyKindId, Event,
    LaneId, LevelPhase, MoveError, PlacementError, RampIndex, SessionConfig, TilePosition,
};
use std::time::Duration;

/// Represents the authoritative Lane Defence session state.
#[derive(Debug)]
pub struct World {
    config: SessionConfig,
    phase: LevelPhase,
    clock: Duration,
    ramp: RampIndex,
    energy: u32,
    lanes: Vec<Lane>,
    next_defender: u32,
    next_enemy: u32,
}

impl World {
    /// Creates a new session from the provided configuration.
    ///
    /// The configuration is validated first; a malformed configuration is
    /// fatal to session start and never silently tolerated.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let lanes = (0..config.lanes)
            .map(|row| Lane {
                id: LaneId::new(row),
                tiles: vec![None; config.tiles_per_lane as usize],
                enemies: Vec::new(),
            })
            .collect();

        Ok(Self {
            phase: LevelPhase::Preparation,
            clock: Duration::ZERO,
            ramp: RampIndex::default(),
            energy: config.starting_energy,
            lanes,
            next_defender: 0,
            next_enemy: 0,
            config,
        })
    }

    fn lane(&self, lane: LaneId) -> Option<&Lane> {
        self.lanes.get(lane.get() as usize)
    }

    fn lane_mut(&mut self, lane: LaneId) -> Option<&mut Lane> {
        self.lanes.get_mut(lane.get() as usize)
    }

    fn allocate_defender(&mut self) -> DefenderId {
        let id = DefenderId::new(self.next_defender);
        self.next_defender = self.next_defender.saturating_add(1);
        id
    }

    fn allocate_enemy(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.saturating_add(1);
        id
    }

    fn check_placement(
        &self,
        position: TilePosition,
        kind: DefenderKindId,
    ) -> Result<u32, PlacementError> {
        if self.phase == LevelPhase::Ending {
            return Err(PlacementError::LevelEnding);
        }
        let lane = self
            .lane(position.lane())
            .ok_or(PlacementError::UnknownLane)?;
        let slot = lane
            .tiles
            .get(position.tile().get() as usize)
            .ok_or(PlacementError::TileOutOfBounds)?;
        let cost = self
            .config
            .defender_cost(kind)
            .ok_or(PlacementError::UnknownKind)?;
        if slot.is_some() {
            return Err(PlacementError::TileOccupied);
        }
        if self.energy < cost {
            return Err(PlacementError::InsufficientEnergy);
        }
        Ok(cost)
    }

    fn check_move(&self, from: TilePosition, to: TilePosition) -> Result<(), MoveError> {
        if self.phase != LevelPhase::Preparation {
            return Err(MoveError::LevelStarted);
        }
        let source_lane = self.lane(from.lane()).ok_or(MoveError::UnknownLane)?;
        let source = source_lane
            .tiles
            .get(from.tile().get() as usize)
            .ok_or(MoveError::TileOutOfBounds)?;
        if source.is_none() {
            return Err(MoveError::SourceTileEmpty);
        }
        let destination_lane = self.lane(to.lane()).ok_or(MoveError::UnknownLane)?;
        let destination = destination_lane
            .tiles
            .get(to.tile().get() as usize)
            .ok_or(MoveError::TileOutOfBounds)?;
        if destination.is_some() {
            return Err(MoveError::DestinationOccupied);
        }
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that reference lanes or units which no longer exist are silent
/// no-ops; player-facing placement and move failures are reported through
/// rejection events instead.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::StartLevel => {
            if world.phase == LevelPhase::Preparation {
                world.phase = LevelPhase::Active;
                out_events.push(Event::LevelPhaseChanged {
                    phase: LevelPhase::Active,
                });
            }
        }
        Command::EndLevel => {
            if world.phase != LevelPhase::Ending {
                world.phase = LevelPhase::Ending;
                out_events.push(Event::LevelPhaseChanged {
                    phase: LevelPhase::Ending,
                });
            }
        }
        Command::AdvanceRamp { index } => {
            let cap = (world.config.ramp.tiers.len() - 1) as u32;
            let capped = RampIndex::new(index.get().min(cap));
            if capped > world.ramp {
                world.ramp = capped;
                out_events.push(Event::RampAdvanced { index: capped });
            }
        }
        Command::SpawnEnemy { lane, kind } => {
            if kind.get() as usize >= world.config.enemy_kind_count() {
                return;
            }
            if world.lane(lane).is_none() {
                return;
            }
            let enemy = world.allocate_enemy();
            if let Some(row) = world.lane_mut(lane) {
                row.enemies.push(EnemyUnit { id: enemy, kind });
                out_events.push(Event::EnemySpawned { lane, enemy, kind });
            }
        }
        Command::DespawnEnemy { enemy } => {
            for row in world.lanes.iter_mut() {
                if let Some(index) = row.enemies.iter().position(|unit| unit.id == enemy) {
                    let _ = row.enemies.remove(index);
                    out_events.push(Event::EnemyDespawned {
                        lane: row.id,
                        enemy,
                    });
                    return;
                }
            }
        }
        Command::PlaceDefender { position, kind } => match world.check_placement(position, kind) {
            Ok(cost) => {
                world.energy -= cost;
                let defender = world.allocate_defender();
                if let Some(row) = world.lane_mut(position.lane()) {
                    row.tiles[position.tile().get() as usize] =
                        Some(DefenderUnit { id: defender, kind });
                }
                out_events.push(Event::DefenderPlaced {
                    position,
                    defender,
                    kind,
                });
                out_events.push(Event::EnergySpent {
                    amount: cost,
                    remaining: world.energy,
                });
            }
            Err(reason) => {
                out_events.push(Event::DefenderPlacementRejected {
                    position,
                    kind,
                    reason,
                });
            }
        },
        Command::RemoveDefender { position } => {
            let Some(row) = world.lane_mut(position.lane()) else {
                return;
            };
            let Some(slot) = row.tiles.get_mut(position.tile().get() as usize) else {
                return;
            };
            if let Some(unit) = slot.take() {
                out_events.push(Event::DefenderRemoved {
                    position,
                    defender: unit.id,
                });
            }
        }
        Command::MoveDefender { from, to } => match world.check_move(from, to) {
            Ok(()) => {
                let unit = world
                    .lane_mut(from.lane())
                    .and_then(|row| row.tiles[from.tile().get() as usize].take());
                if let Some(unit) = unit {
                    let defender = unit.id;
                    if let Some(row) = world.lane_mut(to.lane()) {
                        row.tiles[to.tile().get() as usize] = Some(unit);
                    }
                    out_events.push(Event::DefenderMoved {
                        from,
                        to,
                        defender,
                    });
                }
            }
            Err(reason) => {
                out_events.push(Event::DefenderMoveRejected { from, to, reason });
            }
        },
        Command::HaltSpawning { lane } => {
            if world.lane(lane).is_some() {
                out_events.push(Event::SpawnerHalted { lane });
            }
        }
        Command::StartShooting { lane, side } => {
            if world.lane(lane).is_some() {
                out_events.push(match side {
                    CombatSide::Defender => Event::DefenderStartShooting { lane },
                    CombatSide::Enemy => Event::EnemyStartShooting { lane },
                });
            }
        }
        Command::StopShooting { lane, side } => {
            if world.lane(lane).is_some() {
                out_events.push(match side {
                    CombatSide::Defender => Event::DefenderStopShooting { lane },
                    CombatSide::Enemy => Event::EnemyStopShooting { lane },
                });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use lane_defence_core::{
        DefenderSnapshot, DefenderView, EnemySnapshot, EnemyView, LaneId, LaneOccupancySnapshot,
        LevelPhase, OccupancyView, RampIndex, SessionConfig, TileIndex, TilePosition,
    };
    use std::time::Duration;

    /// Level phase the session currently occupies.
    #[must_use]
    pub fn phase(world: &World) -> LevelPhase {
        world.phase
    }

    /// Simulated match time accumulated since the session opened.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.clock
    }

    /// Difficulty ramp index currently governing spawners.
    #[must_use]
    pub fn ramp_index(world: &World) -> RampIndex {
        world.ramp
    }

    /// Energy remaining in the session ledger.
    #[must_use]
    pub fn energy(world: &World) -> u32 {
        world.energy
    }

    /// Number of lanes laid out on the battlefield.
    #[must_use]
    pub fn lane_count(world: &World) -> u32 {
        world.lanes.len() as u32
    }

    /// Immutable view of the configuration the session was built from.
    #[must_use]
    pub fn config(world: &World) -> &SessionConfig {
        &world.config
    }

    /// Reports whether at least one enemy occupies the lane.
    ///
    /// Derived by scanning live lane membership on every call; unknown
    /// lanes report `false`.
    #[must_use]
    pub fn enemy_present(world: &World, lane: LaneId) -> bool {
        world.lane(lane).is_some_and(|row| !row.enemies.is_empty())
    }

    /// Reports whether at least one defender occupies the lane.
    ///
    /// Derived by scanning live tile membership on every call; unknown
    /// lanes report `false`.
    #[must_use]
    pub fn defender_present(world: &World, lane: LaneId) -> bool {
        world
            .lane(lane)
            .is_some_and(|row| row.tiles.iter().any(|slot| slot.is_some()))
    }

    /// Captures fresh occupancy flags for every lane, in lane order.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView {
        let snapshots = world
            .lanes
            .iter()
            .map(|row| LaneOccupancySnapshot {
                lane: row.id,
                enemy_present: !row.enemies.is_empty(),
                defender_present: row.tiles.iter().any(|slot| slot.is_some()),
            })
            .collect();
        OccupancyView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of all enemies on the battlefield.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .lanes
            .iter()
            .flat_map(|row| {
                row.enemies.iter().map(|unit| EnemySnapshot {
                    id: unit.id,
                    lane: row.id,
                    kind: unit.kind,
                })
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of all defenders on the battlefield.
    #[must_use]
    pub fn defender_view(world: &World) -> DefenderView {
        let snapshots = world
            .lanes
            .iter()
            .flat_map(|row| {
                row.tiles.iter().enumerate().filter_map(|(index, slot)| {
                    slot.as_ref().map(|unit| DefenderSnapshot {
                        id: unit.id,
                        position: TilePosition::new(row.id, TileIndex::new(index as u32)),
                        kind: unit.kind,
                    })
                })
            })
            .collect();
        DefenderView::from_snapshots(snapshots)
    }
}

#[derive(Debug)]
struct Lane {
    id: LaneId,
    tiles: Vec<Option<DefenderUnit>>,
    enemies: Vec<EnemyUnit>,
}

#[derive(Clone, Copy, Debug)]
struct DefenderUnit {
    id: DefenderId,
    kind: DefenderKindId,
}

#[derive(Clone, Copy, Debug)]
struct EnemyUnit {
    id: EnemyId,
    kind: EnemyKindId,
}

#[cfg(test)]
mod tests {
    use super::{apply, query, World};
    use lane_defence_core::{
        CombatSide, Command, DefenderKindId, EnemyId, EnemyKindId, Event, LaneId, LevelPhase,
        MoveError, PlacementError, RampIndex, SessionConfig, TileIndex, TilePosition,
    };
    use std::time::Duration;

    fn session() -> World {
        World::new(SessionConfig::default()).expect("default config is valid")
    }

    fn position(lane: u32, tile: u32) -> TilePosition {
        TilePosition::new(LaneId::new(lane), TileIndex::new(tile))
    }

    fn drive(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn start_level_is_idempotent() {
        let mut world = session();
        let first = drive(&mut world, Command::StartLevel);
        assert_eq!(
            first,
            vec![Event::LevelPhaseChanged {
                phase: LevelPhase::Active,
            }],
        );
        let second = drive(&mut world, Command::StartLevel);
        assert!(second.is_empty(), "repeated start must emit nothing");
    }

    #[test]
    fn placement_debits_energy_exactly_once() {
        let mut world = session();
        let events = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(0, 0),
                kind: DefenderKindId::new(0),
            },
        );
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::DefenderPlaced { .. }));
        assert_eq!(
            events[1],
            Event::EnergySpent {
                amount: 50,
                remaining: 50,
            },
        );
        assert_eq!(query::energy(&world), 50);
        assert!(query::defender_present(&world, LaneId::new(0)));
    }

    #[test]
    fn placement_rejections_mutate_nothing() {
        let mut world = session();
        let cases = [
            (position(9, 0), DefenderKindId::new(0), PlacementError::UnknownLane),
            (
                position(0, 99),
                DefenderKindId::new(0),
                PlacementError::TileOutOfBounds,
            ),
            (position(0, 0), DefenderKindId::new(9), PlacementError::UnknownKind),
        ];
        for (target, kind, reason) in cases {
            let events = drive(
                &mut world,
                Command::PlaceDefender {
                    position: target,
                    kind,
                },
            );
            assert_eq!(
                events,
                vec![Event::DefenderPlacementRejected {
                    position: target,
                    kind,
                    reason,
                }],
            );
        }
        assert_eq!(query::energy(&world), 100);
        assert!(query::defender_view(&world).into_vec().is_empty());
    }

    #[test]
    fn occupied_tile_and_empty_ledger_reject_placement() {
        let mut world = session();
        let _ = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(1, 1),
                kind: DefenderKindId::new(0),
            },
        );
        let events = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(1, 1),
                kind: DefenderKindId::new(0),
            },
        );
        assert_eq!(
            events,
            vec![Event::DefenderPlacementRejected {
                position: position(1, 1),
                kind: DefenderKindId::new(0),
                reason: PlacementError::TileOccupied,
            }],
        );

        let _ = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(1, 2),
                kind: DefenderKindId::new(0),
            },
        );
        let events = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(1, 3),
                kind: DefenderKindId::new(1),
            },
        );
        assert_eq!(
            events,
            vec![Event::DefenderPlacementRejected {
                position: position(1, 3),
                kind: DefenderKindId::new(1),
                reason: PlacementError::InsufficientEnergy,
            }],
        );
    }

    #[test]
    fn ending_phase_closes_placement() {
        let mut world = session();
        let _ = drive(&mut world, Command::EndLevel);
        let events = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(0, 0),
                kind: DefenderKindId::new(0),
            },
        );
        assert_eq!(
            events,
            vec![Event::DefenderPlacementRejected {
                position: position(0, 0),
                kind: DefenderKindId::new(0),
                reason: PlacementError::LevelEnding,
            }],
        );
    }

    #[test]
    fn moves_are_free_and_preparation_only() {
        let mut world = session();
        let _ = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(0, 0),
                kind: DefenderKindId::new(0),
            },
        );
        let events = drive(
            &mut world,
            Command::MoveDefender {
                from: position(0, 0),
                to: position(2, 4),
            },
        );
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::DefenderMoved { .. }));
        assert_eq!(query::energy(&world), 50, "moves never debit energy");
        assert!(query::defender_present(&world, LaneId::new(2)));
        assert!(!query::defender_present(&world, LaneId::new(0)));

        let _ = drive(&mut world, Command::StartLevel);
        let events = drive(
            &mut world,
            Command::MoveDefender {
                from: position(2, 4),
                to: position(3, 0),
            },
        );
        assert_eq!(
            events,
            vec![Event::DefenderMoveRejected {
                from: position(2, 4),
                to: position(3, 0),
                reason: MoveError::LevelStarted,
            }],
        );
    }

    #[test]
    fn move_rejects_empty_source_and_occupied_destination() {
        let mut world = session();
        let events = drive(
            &mut world,
            Command::MoveDefender {
                from: position(0, 0),
                to: position(0, 1),
            },
        );
        assert_eq!(
            events,
            vec![Event::DefenderMoveRejected {
                from: position(0, 0),
                to: position(0, 1),
                reason: MoveError::SourceTileEmpty,
            }],
        );

        let _ = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(0, 0),
                kind: DefenderKindId::new(0),
            },
        );
        let _ = drive(
            &mut world,
            Command::PlaceDefender {
                position: position(0, 1),
                kind: DefenderKindId::new(0),
            },
        );
        let events = drive(
            &mut world,
            Command::MoveDefender {
                from: position(0, 0),
                to: position(0, 1),
            },
        );
        assert_eq!(
            events,
            vec![Event::DefenderMoveRejected {
                from: position(0, 0),
                to: position(0, 1),
                reason: MoveError::DestinationOccupied,
            }],
        );
    }

    #[test]
    fn spawn_and_despawn_track_lane_membership() {
        let mut world = session();
        let events = drive(
            &mut world,
            Command::SpawnEnemy {
                lane: LaneId::new(3),
                kind: EnemyKindId::new(1),
            },
        );
        let enemy = match events.as_slice() {
            [Event::EnemySpawned { lane, enemy, kind }] => {
                assert_eq!(*lane, LaneId::new(3));
                assert_eq!(*kind, EnemyKindId::new(1));
                *enemy
            }
            other => panic!("unexpected events: {other:?}"),
        };
        assert!(query::enemy_present(&world, LaneId::new(3)));

        let events = drive(&mut world, Command::DespawnEnemy { enemy });
        assert_eq!(
            events,
            vec![Event::EnemyDespawned {
                lane: LaneId::new(3),
                enemy,
            }],
        );
        assert!(!query::enemy_present(&world, LaneId::new(3)));
    }

    #[test]
    fn stale_references_are_silent_no_ops() {
        let mut world = session();
        assert!(drive(&mut world, Command::DespawnEnemy { enemy: EnemyId::new(7) }).is_empty());
        assert!(drive(
            &mut world,
            Command::RemoveDefender {
                position: position(0, 0),
            },
        )
        .is_empty());
        assert!(drive(
            &mut world,
            Command::SpawnEnemy {
                lane: LaneId::new(42),
                kind: EnemyKindId::new(0),
            },
        )
        .is_empty());
        assert!(drive(
            &mut world,
            Command::StartShooting {
                lane: LaneId::new(42),
                side: CombatSide::Defender,
            },
        )
        .is_empty());
    }

    #[test]
    fn ramp_is_monotonic_and_capped() {
        let mut world = session();
        let events = drive(
            &mut world,
            Command::AdvanceRamp {
                index: RampIndex::new(1),
            },
        );
        assert_eq!(
            events,
            vec![Event::RampAdvanced {
                index: RampIndex::new(1),
            }],
        );

        assert!(drive(
            &mut world,
            Command::AdvanceRamp {
                index: RampIndex::new(0),
            },
        )
        .is_empty());
        assert_eq!(query::ramp_index(&world), RampIndex::new(1));

        let events = drive(
            &mut world,
            Command::AdvanceRamp {
                index: RampIndex::new(9),
            },
        );
        assert_eq!(
            events,
            vec![Event::RampAdvanced {
                index: RampIndex::new(2),
            }],
            "ramp index must clamp to the last configured tier",
        );
    }

    #[test]
    fn shooting_commands_relay_per_lane_events() {
        let mut world = session();
        let events = drive(
            &mut world,
            Command::StartShooting {
                lane: LaneId::new(1),
                side: CombatSide::Enemy,
            },
        );
        assert_eq!(
            events,
            vec![Event::EnemyStartShooting {
                lane: LaneId::new(1),
            }],
        );
        let events = drive(
            &mut world,
            Command::StopShooting {
                lane: LaneId::new(1),
                side: CombatSide::Defender,
            },
        );
        assert_eq!(
            events,
            vec![Event::DefenderStopShooting {
                lane: LaneId::new(1),
            }],
        );
    }

    #[test]
    fn clock_accumulates_tick_time() {
        let mut world = session();
        let _ = drive(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(400),
            },
        );
        let _ = drive(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(600),
            },
        );
        assert_eq!(query::elapsed(&world), Duration::from_secs(1));
    }
}
