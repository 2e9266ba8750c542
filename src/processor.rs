use crate::{
    address,
    cache::Cache,
    directory::{Directory, Transaction},
    error::Error,
    memory::Memory,
    sync::{Arc, Mutex},
    value, ProcessorId,
};

/// A processor with a private cache.
///
/// Every access is a transaction on the shared directory. The directory
/// lock is held for the whole transaction, so processors may be driven
/// from different threads.
#[derive(Debug, Clone)]
pub struct Processor {
    id: ProcessorId,
    cache: Arc<Mutex<Cache>>,
    memory: Arc<Mutex<Memory>>,
    directory: Arc<Mutex<Directory>>,
}

impl Processor {
    /// Creates a processor and registers its cache with `directory`.
    pub fn new(
        id: ProcessorId,
        capacity: usize,
        memory: Arc<Mutex<Memory>>,
        directory: Arc<Mutex<Directory>>,
    ) -> Result<Self, Error> {
        let cache = Arc::new(Mutex::new(Cache::new(capacity)?));
        directory.lock().register_cache(id, &cache);
        Ok(Self {
            id,
            cache,
            memory,
            directory,
        })
    }

    #[must_use]
    pub fn id(&self) -> ProcessorId {
        self.id
    }

    /// The private cache of this processor.
    ///
    /// Do not hold its lock across a call to [`Processor::read`] or
    /// [`Processor::write`].
    #[must_use]
    pub fn cache(&self) -> &Arc<Mutex<Cache>> {
        &self.cache
    }

    pub fn read(&self, addr: address) -> Result<value, Error> {
        self.load(addr).map(|(value, _)| value)
    }

    pub fn write(&self, addr: address, value: value) -> Result<(), Error> {
        self.store(addr, value).map(|_| ())
    }

    /// Reads `addr` and reports the kind of transaction it caused.
    pub fn load(&self, addr: address) -> Result<(value, Transaction), Error> {
        let mut directory = self.directory.lock();
        let (value, kind) = {
            let mut memory = self.memory.lock();
            directory.handle_read(self.id, addr, &mut memory)?
        };
        self.cache.lock().stats_mut().inc(kind, 1);
        log::debug!(
            "processor {} reads address {} with value {} ({})",
            self.id,
            addr,
            value,
            kind
        );
        Ok((value, kind))
    }

    /// Writes `value` to `addr` and reports the kind of transaction it caused.
    pub fn store(&self, addr: address, value: value) -> Result<Transaction, Error> {
        let mut directory = self.directory.lock();
        let kind = {
            let mut memory = self.memory.lock();
            directory.handle_write(self.id, addr, value, &mut memory)?
        };
        self.cache.lock().stats_mut().inc(kind, 1);
        log::debug!(
            "processor {} writes value {} to address {} ({})",
            self.id,
            value,
            addr,
            kind
        );
        Ok(kind)
    }
}
