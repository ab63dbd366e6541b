//! Stable snapshot hashing for deterministic verification.
//! This module exists to keep hashing concerns separate from decision code.

use std::hash::Hasher;

use xxhash_rust::xxh3::Xxh3;

use super::*;

impl<S> Bot<S> {
    /// Hash of the state that drives future decisions: turn counter, agents
    /// in cell order with their tasks, sector occupancy and known water.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.turn);
        for agent in self.tracker.iter() {
            hasher.write_u32(agent.location.index() as u32);
            match agent.task {
                Task::Idle => hasher.write_u8(0),
                Task::Explore { target } => {
                    hasher.write_u8(1);
                    write_cell(&mut hasher, target);
                }
                Task::HuntFood { food } => {
                    hasher.write_u8(2);
                    write_cell(&mut hasher, Some(food));
                }
            }
        }
        for count in self.tracker.sectors().counts() {
            hasher.write_u32(*count);
        }
        hasher.write_u64(self.knowledge.known_water().len() as u64);
        hasher.finish()
    }
}

fn write_cell(hasher: &mut Xxh3, cell: Option<Cell>) {
    match cell {
        Some(cell) => {
            hasher.write_u8(1);
            hasher.write_u32(cell.index() as u32);
        }
        None => hasher.write_u8(0),
    }
}
