//! Coherence invariants that hold between transactions.

use crate::{address, cache::State, directory::Directory, value, ProcessorId};
use itertools::Itertools;
use std::collections::BTreeMap;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("address {addr} is modified in several caches: {holders:?}")]
    MultipleModified {
        addr: address,
        holders: Vec<(ProcessorId, State)>,
    },

    #[error("address {addr} is exclusive or modified in one cache but also valid elsewhere: {holders:?}")]
    NotExclusive {
        addr: address,
        holders: Vec<(ProcessorId, State)>,
    },

    #[error("processor {processor} holds a clean copy of address {addr} with value {cached}, but memory holds {memory}")]
    StaleCleanCopy {
        processor: ProcessorId,
        addr: address,
        cached: value,
        memory: value,
    },

    #[error("processor {processor} holds address {addr} in more than one line")]
    DuplicateTag {
        processor: ProcessorId,
        addr: address,
    },
}

/// Checks the coherence invariants for every cached address.
///
/// - at most one cache holds an address `Modified`
/// - an `Exclusive` or `Modified` copy is the only valid copy
/// - several valid copies are all `Shared`
/// - clean (`Shared`, `Exclusive`) copies match main memory
/// - a cache holds an address in at most one line
///
/// Locks the memory and every cache in turn, so it must not be called
/// while any of them is locked.
pub fn check(directory: &Directory) -> Result<(), Violation> {
    let memory = directory.memory().lock();
    let mut holders: BTreeMap<address, Vec<(ProcessorId, State)>> = BTreeMap::new();

    for processor in directory.processor_ids() {
        let Ok(cache) = directory.cache(processor) else {
            continue;
        };
        let cache = cache.lock();

        let tags = cache.lines().iter().filter_map(|line| line.addr);
        if let Some(addr) = tags.duplicates().next() {
            return Err(Violation::DuplicateTag { processor, addr });
        }

        for line in cache.lines() {
            let (Some(addr), Some(cached)) = (line.addr, line.value) else {
                continue;
            };
            match line.state {
                State::Invalid => continue,
                State::Shared | State::Exclusive => {
                    let in_memory = memory.peek(addr).ok();
                    if in_memory != Some(cached) {
                        return Err(Violation::StaleCleanCopy {
                            processor,
                            addr,
                            cached,
                            memory: in_memory.unwrap_or_default(),
                        });
                    }
                }
                State::Modified => {}
            }
            holders.entry(addr).or_default().push((processor, line.state));
        }
    }

    for (addr, holders) in holders {
        let modified = holders
            .iter()
            .filter(|(_, state)| *state == State::Modified)
            .count();
        if modified > 1 {
            return Err(Violation::MultipleModified { addr, holders });
        }
        if holders.len() > 1 && holders.iter().any(|(_, state)| *state != State::Shared) {
            return Err(Violation::NotExclusive { addr, holders });
        }
    }
    Ok(())
}
