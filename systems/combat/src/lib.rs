#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-lane combat trigger deciding start/stop shooting transitions.
//!
//! The trigger owns one shooting flag per side per lane and re-derives both
//! from the occupancy view once per simulation step. A lane is only
//! re-evaluated while an enemy exists in it; when the last enemy leaves, the
//! flags keep their value until an enemy shows up again.

use lane_defence_core::{CombatSide, Command, OccupancyView};

/// Pure system that derives shooting transitions from lane occupancy.
#[derive(Debug)]
pub struct CombatTrigger {
    lanes: Vec<LaneShooting>,
}

impl CombatTrigger {
    /// Creates a new trigger covering `lane_count` lanes, all silent.
    #[must_use]
    pub fn new(lane_count: u32) -> Self {
        Self {
            lanes: vec![LaneShooting::default(); lane_count as usize],
        }
    }

    /// Re-derives shooting flags from the provided occupancy capture.
    ///
    /// Runs once per simulation step, after all occupancy mutations for the
    /// step have settled. Unchanged occupancy emits nothing; every flag flip
    /// emits exactly one start or stop command for its side.
    pub fn handle(&mut self, occupancy: &OccupancyView, out: &mut Vec<Command>) {
        for snapshot in occupancy.iter() {
            let Some(flags) = self.lanes.get_mut(snapshot.lane.get() as usize) else {
                continue;
            };

            // Shooting is only re-evaluated while an enemy exists in the row.
            if !snapshot.enemy_present {
                continue;
            }

            if snapshot.defender_present {
                if !flags.defender {
                    flags.defender = true;
                    out.push(Command::StartShooting {
                        lane: snapshot.lane,
                        side: CombatSide::Defender,
                    });
                }
                if !flags.enemy {
                    flags.enemy = true;
                    out.push(Command::StartShooting {
                        lane: snapshot.lane,
                        side: CombatSide::Enemy,
                    });
                }
            } else {
                if flags.defender {
                    flags.defender = false;
                    out.push(Command::StopShooting {
                        lane: snapshot.lane,
                        side: CombatSide::Defender,
                    });
                }
                if flags.enemy {
                    flags.enemy = false;
                    out.push(Command::StopShooting {
                        lane: snapshot.lane,
                        side: CombatSide::Enemy,
                    });
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct LaneShooting {
    defender: bool,
    enemy: bool,
}
