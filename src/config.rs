use crate::error::Error;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulation session configuration.
#[derive(Parser, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[clap()]
#[serde(default)]
pub struct Config {
    #[clap(
        long = "processors",
        help = "number of processors, each with a private cache",
        default_value = "3"
    )]
    pub num_processors: usize,
    #[clap(
        long = "cache-size",
        help = "number of lines per cache",
        default_value = "5"
    )]
    pub cache_size: usize,
    #[clap(
        long = "memory-size",
        help = "number of words in main memory",
        default_value = "50"
    )]
    pub memory_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_processors: 3,
            cache_size: 5,
            memory_size: 50,
        }
    }
}

impl Config {
    /// Loads a configuration from a YAML or JSON file.
    ///
    /// The format is chosen by file extension, YAML being the default.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let config: Self = match path.extension().and_then(std::ffi::OsStr::to_str) {
            Some("json") => serde_json::from_reader(reader)?,
            _ => serde_yaml::from_reader(reader)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let sizes = [
            ("number of processors", self.num_processors),
            ("cache size", self.cache_size),
            ("memory size", self.memory_size),
        ];
        for (name, size) in sizes {
            if size == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}
