use crate::{address, cache, value, ProcessorId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshot of a single cache line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Line {
    pub addr: Option<address>,
    pub value: Option<value>,
    pub state: cache::State,
}

impl std::fmt::Debug for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match (self.addr, self.value) {
            (Some(addr), Some(value)) => write!(f, "{addr}={value}:{}", self.state),
            _ => write!(f, "_"),
        }
    }
}

impl From<&cache::Line> for Line {
    fn from(line: &cache::Line) -> Self {
        Self {
            addr: line.addr,
            value: line.value,
            state: line.state,
        }
    }
}

/// Shorthand for an occupied line in expected snapshots.
#[must_use]
pub fn line(addr: address, value: value, state: cache::State) -> Line {
    Line {
        addr: Some(addr),
        value: Some(value),
        state,
    }
}

/// Shorthand for an empty line in expected snapshots.
#[must_use]
pub fn empty() -> Line {
    Line::from(&cache::Line::default())
}

/// Snapshot of all caches and main memory of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Simulation {
    pub caches: BTreeMap<ProcessorId, Vec<Line>>,
    pub memory: Vec<value>,
}

impl From<&crate::Simulation> for Simulation {
    fn from(sim: &crate::Simulation) -> Self {
        let caches = sim
            .processors()
            .iter()
            .map(|processor| {
                let cache = processor.cache().lock();
                let lines: Vec<Line> = cache.lines().iter().map(Line::from).collect();
                (processor.id(), lines)
            })
            .collect();
        let memory: Vec<value> = sim.memory().lock().iter().copied().collect();
        Self { caches, memory }
    }
}
