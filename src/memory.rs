use crate::{address, error::Error, value};

/// Main memory.
///
/// A flat, fixed-size array of words. Memory knows nothing about
/// coherence: it is only read on a miss and written on write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    data: Vec<value>,
    stats: stats::Memory,
}

impl std::fmt::Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Memory({} words)", self.data.len())?;
        for (addr, value) in self.data.iter().enumerate() {
            writeln!(f, "  [{addr:>4}] = {value}")?;
        }
        Ok(())
    }
}

impl Memory {
    /// Creates a zero-initialized memory of `size` words.
    pub fn new(size: usize) -> Result<Self, Error> {
        Self::from_values(vec![0; size])
    }

    /// Creates a memory holding `values`.
    pub fn from_values(values: Vec<value>) -> Result<Self, Error> {
        if values.is_empty() {
            return Err(Error::InvalidConfig(
                "memory size must be positive".to_string(),
            ));
        }
        Ok(Self {
            data: values,
            stats: stats::Memory::default(),
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Checks that `addr` lies within `[0, size)`.
    pub fn check(&self, addr: address) -> Result<usize, Error> {
        usize::try_from(addr)
            .ok()
            .filter(|&idx| idx < self.data.len())
            .ok_or(Error::OutOfRange {
                addr,
                size: self.data.len(),
            })
    }

    pub fn read(&mut self, addr: address) -> Result<value, Error> {
        let idx = self.check(addr)?;
        self.stats.reads += 1;
        Ok(self.data[idx])
    }

    pub fn write(&mut self, addr: address, value: value) -> Result<(), Error> {
        let idx = self.check(addr)?;
        self.stats.writes += 1;
        self.data[idx] = value;
        Ok(())
    }

    /// Reads a word without counting it as a memory access.
    pub fn peek(&self, addr: address) -> Result<value, Error> {
        let idx = self.check(addr)?;
        Ok(self.data[idx])
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, value> {
        self.data.iter()
    }

    #[must_use]
    pub fn stats(&self) -> &stats::Memory {
        &self.stats
    }
}
