pub mod block;

pub use block::{Line, State};

use crate::{
    address, directory::Snoop, error::Error, fifo::Fifo, memory::Memory, value, ProcessorId,
};

/// Whether a local cache access was served by a valid line.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum HitKind {
    Hit,
    Miss,
}

/// A modified line that must be written back to main memory.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Writeback {
    pub addr: address,
    pub value: value,
}

/// Result of [`Cache::write`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Outcome {
    /// A valid line was overwritten and is now `Modified`.
    Hit,
    /// The line was installed.
    ///
    /// If installing it evicted a `Modified` line, that line is returned
    /// and must be written back.
    Miss { writeback: Option<Writeback> },
}

/// Fully associative cache of a single processor with FIFO replacement.
#[derive(Debug, Clone)]
pub struct Cache {
    lines: Vec<Line>,
    /// Slot indices in installation order.
    ///
    /// Every non-empty slot is queued exactly once.
    fifo: Fifo<usize>,
    stats: stats::Cache,
}

impl std::fmt::Display for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cache({} lines) {}", self.lines.len(), self.fifo)?;
        for (idx, line) in self.lines.iter().enumerate() {
            writeln!(f, "  line[{idx:>2}] {line}")?;
        }
        Ok(())
    }
}

impl Cache {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "cache capacity must be positive".to_string(),
            ));
        }
        Ok(Self {
            lines: vec![Line::default(); capacity],
            fifo: Fifo::new(Some(capacity)),
            stats: stats::Cache::default(),
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Slot indices from oldest to newest installation.
    #[must_use]
    pub fn replacement_order(&self) -> Vec<usize> {
        self.fifo.iter().copied().collect()
    }

    #[must_use]
    pub fn stats(&self) -> &stats::Cache {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut stats::Cache {
        &mut self.stats
    }

    fn position(&self, addr: address) -> Option<usize> {
        self.lines.iter().position(|line| line.addr == Some(addr))
    }

    /// Finds the line tagged with `addr`, regardless of its state.
    #[must_use]
    pub fn search(&self, addr: address) -> Option<&Line> {
        self.position(addr).map(|idx| &self.lines[idx])
    }

    /// State and value of `addr` if this cache holds a valid copy.
    #[must_use]
    pub fn lookup(&self, addr: address) -> Option<(State, value)> {
        self.search(addr)
            .filter(|line| line.state.is_valid())
            .and_then(|line| line.value.map(|value| (line.state, value)))
    }

    /// All slots carry an address tag, whatever their state.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.lines.iter().all(|line| !line.is_empty())
    }

    /// Writes `value` to `addr`.
    ///
    /// A write to a valid line always leaves it `Modified`, ignoring
    /// `state`. Otherwise the line is installed with `state`, preferring
    /// an empty slot and evicting the oldest installed line when full.
    pub fn write(&mut self, addr: address, value: value, state: State) -> Outcome {
        if let Some(idx) = self.position(addr) {
            let line = &mut self.lines[idx];
            if line.state.is_valid() {
                line.fill(addr, value, State::Modified);
                return Outcome::Hit;
            }
            // stale copy: reuse the slot so tags stay unique
            line.fill(addr, value, state);
            self.fifo.remove_where(|&queued| queued == idx);
            self.fifo.push_back(idx);
            return Outcome::Miss { writeback: None };
        }

        let mut writeback = None;
        let idx = match self.lines.iter().position(Line::is_empty) {
            Some(idx) => idx,
            None => {
                let idx = self
                    .fifo
                    .pop_front()
                    .expect("full cache has installed lines");
                let victim = &mut self.lines[idx];
                if let (State::Modified, Some(addr), Some(value)) =
                    (victim.state, victim.addr, victim.value)
                {
                    writeback = Some(Writeback { addr, value });
                    self.stats.writebacks += 1;
                }
                victim.reset();
                self.stats.evictions += 1;
                idx
            }
        };

        self.lines[idx].fill(addr, value, state);
        self.fifo.push_back(idx);
        Outcome::Miss { writeback }
    }

    /// Reads `addr`.
    ///
    /// On a miss the value is fetched from `memory` and installed
    /// `Shared` if another cache holds a valid copy, `Exclusive` otherwise.
    /// A modified line evicted by the installation is written back.
    pub fn read(
        &mut self,
        addr: address,
        memory: &mut Memory,
        snoop: &dyn Snoop,
        processor_id: ProcessorId,
    ) -> Result<(value, HitKind), Error> {
        if let Some((_, value)) = self.lookup(addr) {
            return Ok((value, HitKind::Hit));
        }

        let value = memory.read(addr)?;
        let state = if snoop.is_shared(addr, processor_id) {
            State::Shared
        } else {
            State::Exclusive
        };
        if let Outcome::Miss {
            writeback: Some(writeback),
        } = self.write(addr, value, state)
        {
            memory.write(writeback.addr, writeback.value)?;
        }
        Ok((value, HitKind::Miss))
    }

    /// Sets the state of the line tagged `addr`.
    ///
    /// Returns `false` if no line carries that tag.
    pub fn update_state(&mut self, addr: address, new_state: State) -> bool {
        let Some(idx) = self.position(addr) else {
            return false;
        };
        let line = &mut self.lines[idx];
        if line.state.is_valid() && new_state == State::Invalid {
            self.stats.invalidations += 1;
        }
        line.state = new_state;
        true
    }

    /// Downgrades a valid `Modified` or `Exclusive` line to `Shared`.
    ///
    /// Returns the write-back owed to memory if the line was `Modified`.
    pub fn share(&mut self, addr: address) -> Option<Writeback> {
        let idx = self.position(addr)?;
        let line = &mut self.lines[idx];
        match (line.state, line.value) {
            (State::Modified, Some(value)) => {
                line.state = State::Shared;
                self.stats.writebacks += 1;
                Some(Writeback { addr, value })
            }
            (State::Exclusive, _) => {
                line.state = State::Shared;
                None
            }
            (State::Modified | State::Shared | State::Invalid, _) => None,
        }
    }
}
