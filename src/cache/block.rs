use crate::{address, value, Optional};

/// MESI coherence state of a cache line.
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
pub enum State {
    /// Only copy in the system and dirty: main memory is stale.
    Modified,
    /// Only copy in the system and clean.
    Exclusive,
    /// Clean copy that other caches may hold too.
    Shared,
    /// Must not service a hit, even if the tag is still set.
    Invalid,
}

impl State {
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        match self {
            State::Modified | State::Exclusive | State::Shared => true,
            State::Invalid => false,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let short = match self {
            State::Modified => "M",
            State::Exclusive => "E",
            State::Shared => "S",
            State::Invalid => "I",
        };
        write!(f, "{short}")
    }
}

/// One slot of a cache.
///
/// A slot without an address has never been used (or was reset by
/// eviction). An `Invalid` slot may still carry a stale tag and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Line {
    pub addr: Option<address>,
    pub value: Option<value>,
    pub state: State,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            addr: None,
            value: None,
            state: State::Invalid,
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "addr={} value={} state={}",
            Optional::from(self.addr),
            Optional::from(self.value),
            self.state
        )
    }
}

impl Line {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addr.is_none()
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.addr.is_some() && self.state.is_valid()
    }

    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.state == State::Modified
    }

    /// Valid line holding `addr`.
    #[inline]
    #[must_use]
    pub fn holds(&self, addr: address) -> bool {
        self.addr == Some(addr) && self.state.is_valid()
    }

    #[inline]
    pub fn fill(&mut self, addr: address, value: value, state: State) {
        self.addr = Some(addr);
        self.value = Some(value);
        self.state = state;
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
