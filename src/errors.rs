//! Error types
//!
//! Line-level problems ([`ParseError`]) and unresolved material names are
//! recovered from inside the loader. Everything else propagates to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a whole `load_model` call
#[derive(Error, Debug)]
pub enum LoadError {
    /// The mesh file could not be opened or read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file parsed but produced no vertex or no triangle
    #[error("{path} contains no renderable geometry ({vertices} vertices, {triangles} triangles)")]
    NoGeometry {
        path: PathBuf,
        vertices: usize,
        triangles: usize,
    },
}

/// A single malformed mesh or material line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("`{directive}` needs at least {expected} tokens, found {found}")]
    MissingTokens {
        directive: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("face vertex `{0}` has no position index")]
    MissingVertexIndex(String),

    #[error("invalid index `{0}` (indices are 1-based and positive)")]
    InvalidIndex(String),

    #[error("texture `{name}` could not be decoded: {reason}")]
    Texture { name: String, reason: String },

    #[error("material library `{name}` could not be opened: {reason}")]
    MaterialLibrary { name: String, reason: String },
}

/// Dereferencing a handle that has no entry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// `index` is `None` for the invalid handle
    #[error("{kind} {} not found (store holds {len})", describe_index(.index))]
    NotFound {
        kind: &'static str,
        index: Option<usize>,
        len: usize,
    },
}

fn describe_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!("#{}", i),
        None => "handle (invalid)".to_string(),
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("division by zero in {0} division")]
    DivisionByZero(&'static str),
}

/// Image decode collaborator failure
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to decode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path} is empty ({width}x{height})")]
    Empty {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
}
