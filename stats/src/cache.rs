use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use strum::IntoEnumIterator;

#[derive(
    Debug,
    strum::EnumIter,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum Transaction {
    ReadHit,
    ReadMiss,
    WriteHit,
    WriteMiss,
}

impl Transaction {
    #[must_use]
    pub fn is_hit(self) -> bool {
        matches!(self, Transaction::ReadHit | Transaction::WriteHit)
    }

    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Transaction::WriteHit | Transaction::WriteMiss)
    }
}

/// Per cache statistics.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    pub transactions: HashMap<Transaction, u64>,
    /// Lines evicted by the replacement policy.
    pub evictions: u64,
    /// Modified lines written back to main memory, on eviction or on a
    /// remote read.
    pub writebacks: u64,
    /// Lines invalidated by a remote write.
    pub invalidations: u64,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            transactions: Transaction::iter().map(|kind| (kind, 0)).collect(),
            evictions: 0,
            writebacks: 0,
            invalidations: 0,
        }
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut transactions: Vec<_> = self
            .transactions
            .iter()
            .filter(|(_, &count)| count > 0)
            .collect();
        transactions.sort_by_key(|(kind, _)| **kind);

        let mut out = f.debug_struct("CacheStats");
        for (kind, count) in transactions {
            out.field(&format!("{kind:?}"), count);
        }
        out.field("evictions", &self.evictions)
            .field("writebacks", &self.writebacks)
            .field("invalidations", &self.invalidations)
            .finish()
    }
}

impl std::ops::AddAssign for Cache {
    fn add_assign(&mut self, other: Self) {
        for (k, v) in other.transactions {
            *self.transactions.entry(k).or_insert(0) += v;
        }
        self.evictions += other.evictions;
        self.writebacks += other.writebacks;
        self.invalidations += other.invalidations;
    }
}

impl Cache {
    #[inline]
    pub fn inc(&mut self, kind: impl Into<Transaction>, count: u64) {
        *self.transactions.entry(kind.into()).or_insert(0) += count;
    }

    #[must_use]
    pub fn get(&self, kind: Transaction) -> u64 {
        self.transactions.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.transactions.values().sum()
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.transactions
            .iter()
            .filter(|(kind, _)| kind.is_hit())
            .map(|(_, count)| count)
            .sum()
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.total_accesses() - self.hits()
    }

    /// Fraction of transactions that hit, `None` before the first access.
    #[must_use]
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.total_accesses();
        if total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.hits() as f64 / total as f64)
    }
}

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCache(pub BTreeMap<usize, Cache>);

impl PerCache {
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<usize, Cache> {
        self.0
    }

    /// Merge the statistics of all caches.
    #[must_use]
    pub fn reduce(&self) -> Cache {
        let mut out = Cache::default();
        for per_cache in self.0.values() {
            out += per_cache.clone();
        }
        out
    }
}

impl std::ops::AddAssign for PerCache {
    fn add_assign(&mut self, other: Self) {
        for (id, stats) in other.0 {
            *self.0.entry(id).or_default() += stats;
        }
    }
}

impl std::ops::Deref for PerCache {
    type Target = BTreeMap<usize, Cache>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for PerCache {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
