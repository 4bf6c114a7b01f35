use crate::InterfaceType;
use std::io;
use thiserror::Error as ThisError;

#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum Error {
    /// A master of the wrong type was handed to a selection query.
    #[error("interface {name:?} is not of type {expected}")]
    InvalidArgument {
        name: String,
        expected: InterfaceType,
    },
    #[error("interface {0:?} is neither a bond nor a bridge")]
    NotAMaster(String),
    /// A configuration attribute was requested on an interface without ifcfg.
    #[error("interface {0:?} has no configuration")]
    NotConfigured(String),
    #[error("interface {0:?} not found")]
    InterfaceNotFound(String),
    #[error("invalid interface name")]
    InvalidName,
    #[error("interface {0:?} is neither present nor configured")]
    Orphan(String),
    #[error("interface {0:?} already exists")]
    DuplicateInterface(String),
    #[error("invalid value for {key}: {value:?}")]
    InvalidAttribute { key: String, value: String },
    #[error("snapshot error: {0}")]
    Snapshot(serde_json::Error),
    #[error("I/O error: {0}")]
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
