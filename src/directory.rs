//! Coherence directory.
//!
//! The directory knows every processor's cache and runs the MESI protocol
//! on their behalf: it snoops sibling caches, enforces a single writer or
//! many readers per address and relays write-backs to main memory.
//!
//! A transaction is a single call to [`Directory::handle_read`] or
//! [`Directory::handle_write`]. Callers serialize transactions by holding
//! the directory lock for their whole duration, which models a bus that
//! carries one transaction at a time.

use crate::{
    address,
    cache::{self, Cache, State},
    error::Error,
    memory::Memory,
    sync::{Arc, Mutex, Weak},
    value, ProcessorId,
};
use std::collections::BTreeMap;

/// Answers whether an address is held by caches other than the requester.
pub trait Snoop {
    /// True if any cache other than `excluding` holds a valid copy of `addr`.
    #[must_use]
    fn is_shared(&self, addr: address, excluding: ProcessorId) -> bool;
}

/// Kind of a completed coherence transaction.
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
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Transaction {
    ReadHit,
    ReadMiss,
    WriteHit,
    WriteMiss,
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let short = match self {
            Transaction::ReadHit => "RH",
            Transaction::ReadMiss => "RM",
            Transaction::WriteHit => "WH",
            Transaction::WriteMiss => "WM",
        };
        write!(f, "{short}")
    }
}

impl From<Transaction> for stats::cache::Transaction {
    fn from(kind: Transaction) -> Self {
        match kind {
            Transaction::ReadHit => Self::ReadHit,
            Transaction::ReadMiss => Self::ReadMiss,
            Transaction::WriteHit => Self::WriteHit,
            Transaction::WriteMiss => Self::WriteMiss,
        }
    }
}

impl From<cache::HitKind> for Transaction {
    fn from(kind: cache::HitKind) -> Self {
        match kind {
            cache::HitKind::Hit => Self::ReadHit,
            cache::HitKind::Miss => Self::ReadMiss,
        }
    }
}

#[derive(Debug)]
pub struct Directory {
    /// Registered caches, owned by their processors.
    caches: BTreeMap<ProcessorId, Weak<Mutex<Cache>>>,
    memory: Arc<Mutex<Memory>>,
}

impl Snoop for Directory {
    fn is_shared(&self, addr: address, excluding: ProcessorId) -> bool {
        self.others(excluding)
            .any(|(_, cache)| cache.lock().lookup(addr).is_some())
    }
}

impl Directory {
    #[must_use]
    pub fn new(memory: Arc<Mutex<Memory>>) -> Self {
        Self {
            caches: BTreeMap::new(),
            memory,
        }
    }

    /// Main memory backing this directory.
    #[must_use]
    pub fn memory(&self) -> &Arc<Mutex<Memory>> {
        &self.memory
    }

    /// Registers the cache of `processor_id`.
    ///
    /// Registering an id again replaces the previous cache.
    pub fn register_cache(&mut self, processor_id: ProcessorId, cache: &Arc<Mutex<Cache>>) {
        self.caches.insert(processor_id, Arc::downgrade(cache));
    }

    /// Ids of all processors whose cache is still alive, in ascending order.
    #[must_use]
    pub fn processor_ids(&self) -> Vec<ProcessorId> {
        self.caches()
            .map(|(processor_id, _)| processor_id)
            .collect()
    }

    pub fn cache(&self, processor_id: ProcessorId) -> Result<Arc<Mutex<Cache>>, Error> {
        self.caches
            .get(&processor_id)
            .and_then(Weak::upgrade)
            .ok_or(Error::UnknownProcessor(processor_id))
    }

    fn caches(&self) -> impl Iterator<Item = (ProcessorId, Arc<Mutex<Cache>>)> + '_ {
        self.caches
            .iter()
            .filter_map(|(processor_id, cache)| cache.upgrade().map(|cache| (*processor_id, cache)))
    }

    fn others(
        &self,
        excluding: ProcessorId,
    ) -> impl Iterator<Item = (ProcessorId, Arc<Mutex<Cache>>)> + '_ {
        self.caches()
            .filter(move |(processor_id, _)| *processor_id != excluding)
    }

    /// Valid copies of `addr` across all caches.
    #[must_use]
    pub fn holders(&self, addr: address) -> Vec<(ProcessorId, State)> {
        self.caches()
            .filter_map(|(processor_id, cache)| {
                cache
                    .lock()
                    .lookup(addr)
                    .map(|(state, _)| (processor_id, state))
            })
            .collect()
    }

    /// Invalidates `addr` in every cache except the one of `excluding`.
    pub fn invalidate_other_caches(&self, addr: address, excluding: ProcessorId) {
        for (_, cache) in self.others(excluding) {
            cache.lock().update_state(addr, State::Invalid);
        }
    }

    /// Processes a read of `addr` by `processor_id`.
    ///
    /// A valid copy owned by another cache is shared with the requester
    /// and counts as a hit, with a modified owner writing back first.
    /// Otherwise the requester's own cache serves the read, falling back
    /// to main memory on a miss.
    pub fn handle_read(
        &mut self,
        processor_id: ProcessorId,
        addr: address,
        memory: &mut Memory,
    ) -> Result<(value, Transaction), Error> {
        let requester = self.cache(processor_id)?;
        memory.check(addr)?;
        let mut cache = requester.lock();

        if let Some((_, value)) = cache.lookup(addr) {
            return Ok((value, Transaction::ReadHit));
        }

        for (_, other) in self.others(processor_id) {
            let mut other = other.lock();
            let Some((state, value)) = other.lookup(addr) else {
                continue;
            };
            match state {
                State::Modified | State::Exclusive => {
                    if let Some(writeback) = other.share(addr) {
                        memory.write(writeback.addr, writeback.value)?;
                    }
                    drop(other);
                    install(&mut cache, memory, addr, value, State::Shared)?;
                    return Ok((value, Transaction::ReadHit));
                }
                // shared copies are clean, memory serves the read below
                State::Shared | State::Invalid => break,
            }
        }

        let (value, hit) = cache.read(addr, memory, &*self, processor_id)?;
        Ok((value, hit.into()))
    }

    /// Processes a write of `value` to `addr` by `processor_id`.
    ///
    /// All other copies are invalidated before the requester's line
    /// becomes `Modified`.
    pub fn handle_write(
        &mut self,
        processor_id: ProcessorId,
        addr: address,
        value: value,
        memory: &mut Memory,
    ) -> Result<Transaction, Error> {
        let requester = self.cache(processor_id)?;
        memory.check(addr)?;

        self.invalidate_other_caches(addr, processor_id);

        let outcome = requester.lock().write(addr, value, State::Modified);
        match outcome {
            cache::Outcome::Hit => Ok(Transaction::WriteHit),
            cache::Outcome::Miss { writeback } => {
                if let Some(writeback) = writeback {
                    memory.write(writeback.addr, writeback.value)?;
                }
                Ok(Transaction::WriteMiss)
            }
        }
    }
}

/// Installs a line in `cache`, writing back whatever modified line it evicts.
fn install(
    cache: &mut Cache,
    memory: &mut Memory,
    addr: address,
    value: value,
    state: State,
) -> Result<(), Error> {
    if let cache::Outcome::Miss {
        writeback: Some(writeback),
    } = cache.write(addr, value, state)
    {
        memory.write(writeback.addr, writeback.value)?;
    }
    Ok(())
}
