use crate::{
    address,
    command::{Command, Response},
    config::Config,
    directory::{Directory, Transaction},
    error::Error,
    invariants,
    memory::Memory,
    processor::Processor,
    sync::{Arc, Mutex},
    value, ProcessorId,
};
use console::style;

/// A simulation session.
///
/// Owns main memory, the coherence directory and one processor per
/// configured id. Processors are numbered from 1.
#[derive(Debug)]
pub struct Simulation {
    memory: Arc<Mutex<Memory>>,
    directory: Arc<Mutex<Directory>>,
    processors: Vec<Processor>,
}

impl Simulation {
    pub fn new(config: &Config) -> Result<Self, Error> {
        config.validate()?;
        let memory = Arc::new(Mutex::new(Memory::new(config.memory_size)?));
        Self::with_memory(config, memory)
    }

    /// Creates a session on top of an existing memory.
    pub fn with_memory(config: &Config, memory: Arc<Mutex<Memory>>) -> Result<Self, Error> {
        config.validate()?;
        let directory = Arc::new(Mutex::new(Directory::new(Arc::clone(&memory))));
        let processors = (1..=config.num_processors)
            .map(|id| {
                Processor::new(
                    id,
                    config.cache_size,
                    Arc::clone(&memory),
                    Arc::clone(&directory),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "simulating {} processors with {} cache lines each and {} words of memory",
            config.num_processors,
            config.cache_size,
            memory.lock().size(),
        );
        Ok(Self {
            memory,
            directory,
            processors,
        })
    }

    #[must_use]
    pub fn memory(&self) -> &Arc<Mutex<Memory>> {
        &self.memory
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<Mutex<Directory>> {
        &self.directory
    }

    #[must_use]
    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    pub fn processor(&self, id: ProcessorId) -> Result<&Processor, Error> {
        self.processors
            .iter()
            .find(|processor| processor.id() == id)
            .ok_or(Error::UnknownProcessor(id))
    }

    pub fn read(&self, id: ProcessorId, addr: address) -> Result<(value, Transaction), Error> {
        self.processor(id)?.load(addr)
    }

    pub fn write(
        &self,
        id: ProcessorId,
        addr: address,
        value: value,
    ) -> Result<Transaction, Error> {
        self.processor(id)?.store(addr, value)
    }

    pub fn execute(&self, command: &Command) -> Result<Response, Error> {
        let (value, kind) = match *command {
            Command::Read { processor, addr } => self.read(processor, addr)?,
            Command::Write {
                processor,
                addr,
                value,
            } => (value, self.write(processor, addr, value)?),
        };
        Ok(Response {
            command: *command,
            value,
            kind,
        })
    }

    pub fn check_invariants(&self) -> Result<(), invariants::Violation> {
        invariants::check(&self.directory.lock())
    }

    /// Collects the statistics of memory and every cache.
    #[must_use]
    pub fn stats(&self) -> stats::Stats {
        let mut stats = stats::Stats::new(self.processors.iter().map(Processor::id));
        stats.memory = *self.memory.lock().stats();
        for processor in &self.processors {
            stats
                .caches
                .insert(processor.id(), processor.cache().lock().stats().clone());
        }
        stats
    }

    /// Renders every cache and main memory.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for processor in &self.processors {
            out += &format!(
                "{} {}",
                style(format!("processor {}", processor.id())).bold(),
                processor.cache().lock()
            );
        }
        out += &self.memory.lock().to_string();
        out
    }
}
