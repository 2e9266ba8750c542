use crate::{address, ProcessorId};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("address {addr} out of range for size {size}")]
    OutOfRange { addr: address, size: usize },

    #[error("processor {0} is not registered")]
    UnknownProcessor(ProcessorId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
