//! Mesh, selection and simulation helpers over a finite element simulation document
use env_logger::Env;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod document;
pub mod memory;
pub mod mesh;
pub mod selection;
pub mod simulator;

pub use document::{MeshDocument, SelectionDocument, SimulationDocument};
pub use memory::MemoryDocument;
pub use mesh::{ArrayParams, Centroid, MeshAccessor, MeshArrays};
pub use selection::Selections;
pub use simulator::{RunParams, Simulator, TimeLogEntry, TimeStep};

/// Result
pub type Result<T> = std::result::Result<T, Error>;

/// Error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Value outside of the supported domain (node counts, names, ...)
    #[error("{0}")]
    Value(String),
    /// Operation not available for the requested kind of item
    #[error("{0}")]
    NotImplemented(String),
    /// Failure while querying or driving the model
    #[error("{0}")]
    Runtime(String),
    /// Error raised by the document itself
    #[error("document error: {0}")]
    Document(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Value error with the given message
    #[must_use]
    pub fn value(msg: &str) -> Self {
        Self::Value(msg.into())
    }

    /// Not implemented error with the given message
    #[must_use]
    pub fn not_implemented(msg: &str) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Runtime error with the given message
    #[must_use]
    pub fn runtime(msg: &str) -> Self {
        Self::Runtime(msg.into())
    }

    /// Error raised by a document implementation
    #[must_use]
    pub fn document(msg: &str) -> Self {
        Self::Document(msg.into())
    }
}

/// Model dimension (2 or 3)
pub type Dim = u8;

/// Kind of items a selection is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionType {
    Nodal,
    Elemental,
    Edges,
    Faces,
    Fracs,
    Invalid,
}

impl SelectionType {
    /// Types searched when no selection type is given. Face selections are not
    /// reliably reported by the engine and are left out.
    pub const SEARCH_ORDER: [Self; 4] = [Self::Nodal, Self::Elemental, Self::Edges, Self::Fracs];
}

impl fmt::Display for SelectionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Nodal => "SEL_NODAL",
            Self::Elemental => "SEL_ELEMENTAL",
            Self::Edges => "SEL_EDGES",
            Self::Faces => "SEL_FACES",
            Self::Fracs => "SEL_FRACS",
            Self::Invalid => "SEL_INVALID",
        };
        write!(f, "{name}")
    }
}

/// Nodal parameters that can be read as a whole array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    MeshX,
    MeshY,
    MeshZ,
}

/// Initialize `env_logger` with a default filter level
pub fn init_log(level: &str) {
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Assert that two floating point values are closer than a tolerance
#[macro_export]
macro_rules! assert_delta {
    ($x:expr, $y:expr, $d:expr) => {
        assert!(
            ($x - $y).abs() < $d,
            "({:.3e} - {:.3e}).abs() = {:.3e}",
            $x,
            $y,
            ($x - $y).abs()
        )
    };
}
