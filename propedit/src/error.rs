//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `propedit`
#[derive(Error, Debug)]
pub enum Error {
    /// Point refers to an island that is not in the arena
    #[error("island index {0} is out of range for an arena of {1} islands")]
    BadIslandIndex(usize, usize),

    /// Topology refers to a vertex that is not in the point slice
    #[error("vertex index {0} is out of range for {1} points")]
    BadVertexIndex(usize, usize),

    /// Edge has the same vertex at both ends
    #[error("edge {0} is degenerate (both ends are vertex {1})")]
    DegenerateEdge(usize, usize),

    /// Face has fewer than three vertices
    #[error("face {0} has {1} vertices; at least 3 are required")]
    BadFace(usize, usize),

    /// Hidden-vertex mask length does not match the point count
    #[error("hidden-vertex mask length ({0}) does not match point count ({1})")]
    BadHiddenMask(usize, usize),

    /// Projection axis is zero-length or not finite
    #[error("projection axis {0:?} cannot be normalized")]
    BadProjectionAxis([f32; 3]),

    /// Proportional size must be finite and positive
    #[error("proportional size {0} must be finite and positive")]
    BadPropSize(f32),

    /// Selection fraction is outside `[0, 1]` or not a number
    #[error("selection fraction {0} must be between 0 and 1")]
    BadSelectionFraction(f64),

    /// A line in a point file could not be parsed
    #[error("parse error on line {line}: {msg}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// Description of the problem
        msg: String,
    },

    /// Failed to build a thread pool
    #[error("could not build thread pool: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    /// IO error; see inner code for details
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Shorthand for a result carrying the crate's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
