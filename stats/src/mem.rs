use serde::{Deserialize, Serialize};

/// Main memory access statistics.
///
/// Only counts accesses that reached main memory, i.e. misses served
/// from memory and write-backs of modified lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Memory {
    pub reads: u64,
    pub writes: u64,
}

impl std::ops::AddAssign for Memory {
    fn add_assign(&mut self, other: Self) {
        self.reads += other.reads;
        self.writes += other.writes;
    }
}
