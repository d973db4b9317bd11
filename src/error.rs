//! Error types shared by the container, attribute and IO APIs.

use std::path::PathBuf;

use thiserror::Error;

/// The error type for all fallible operations in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Positional access beyond the current number of blocks.
    #[error("block index {index} is out of range for a container with {len} blocks")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Name based access with no block carrying the given name.
    #[error("block name '{0}' not found")]
    KeyNotFound(String),

    /// The file extension does not identify a supported multi-block format.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A file that was expected to exist is missing.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An underlying read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File content does not describe a valid multi-block structure.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// The dataset kind has no persistent representation.
    #[error("dataset of type '{0}' cannot be written to disk")]
    UnsupportedDataSet(&'static str),

    /// An attribute with this name already exists at the requested location.
    #[error("attribute '{0}' already exists")]
    AttribExists(String),

    /// No attribute with this name exists at the requested location.
    #[error("attribute '{0}' not found")]
    AttribNotFound(String),

    /// Attribute data does not match the number of elements at its location.
    #[error("attribute has {given} elements, expected {expected}")]
    AttribSize { expected: usize, given: usize },

    /// Attribute exists but stores a different element type.
    #[error("type mismatch: expected {expected}, found {actual}")]
    AttribTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The number of attribute values is not a multiple of the component count.
    #[error("{len} attribute values cannot be split into {num_comp} components")]
    AttribComponents { len: usize, num_comp: usize },

    /// The dataset does not store attributes at the requested location.
    #[error("attributes are not supported at this location")]
    UnsupportedLocation,

    /// An error reported by the VTK reader or writer.
    #[cfg(feature = "io")]
    #[error("VTK error: {0}")]
    Vtk(#[from] vtkio::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
