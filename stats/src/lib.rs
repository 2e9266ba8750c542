pub mod cache;
pub mod mem;

pub use cache::{Cache, PerCache};
pub use mem::Memory;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub memory: Memory,
    pub caches: PerCache,
}

impl Stats {
    #[must_use]
    pub fn new(processor_ids: impl IntoIterator<Item = usize>) -> Self {
        Self {
            memory: Memory::default(),
            caches: PerCache(
                processor_ids
                    .into_iter()
                    .map(|id| (id, Cache::default()))
                    .collect(),
            ),
        }
    }
}

impl std::ops::AddAssign for Stats {
    fn add_assign(&mut self, other: Self) {
        self.memory += other.memory;
        self.caches += other.caches;
    }
}
