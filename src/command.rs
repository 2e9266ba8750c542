use crate::{address, directory::Transaction, error::Error, value, ProcessorId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A memory access issued by one processor.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Command {
    Read {
        processor: ProcessorId,
        addr: address,
    },
    Write {
        processor: ProcessorId,
        addr: address,
        value: value,
    },
}

impl Command {
    #[must_use]
    pub fn processor(&self) -> ProcessorId {
        match self {
            Command::Read { processor, .. } | Command::Write { processor, .. } => *processor,
        }
    }

    #[must_use]
    pub fn addr(&self) -> address {
        match self {
            Command::Read { addr, .. } | Command::Write { addr, .. } => *addr,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Read { processor, addr } => write!(f, "P{processor} read [{addr}]"),
            Command::Write {
                processor,
                addr,
                value,
            } => write!(f, "P{processor} write [{addr}] = {value}"),
        }
    }
}

/// Result of executing a [`Command`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub command: Command,
    /// Value read, or written.
    pub value: value,
    pub kind: Transaction,
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} ({})", self.command, self.value, self.kind)
    }
}

/// Parses a list of commands from a YAML or JSON file.
///
/// The format is chosen by file extension, YAML being the default.
pub fn parse_commands(path: impl AsRef<Path>) -> Result<Vec<Command>, Error> {
    let path = path.as_ref();
    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let commands = match path.extension().and_then(std::ffi::OsStr::to_str) {
        Some("json") => serde_json::from_reader(reader)?,
        _ => serde_yaml::from_reader(reader)?,
    };
    Ok(commands)
}

/// A short access sequence touching every transaction kind.
#[must_use]
pub fn demo() -> Vec<Command> {
    let write = |processor, addr, value| Command::Write {
        processor,
        addr,
        value,
    };
    let read = |processor, addr| Command::Read { processor, addr };
    vec![
        write(1, 0, 1111),
        write(1, 1, 2222),
        write(1, 3, 4444),
        write(1, 2, 3333),
        read(2, 0),
        read(3, 0),
        write(2, 0, 5555),
        read(1, 0),
        write(1, 6, 6666),
        write(1, 7, 7777),
        read(3, 1),
    ]
}
