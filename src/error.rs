use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only configuration mistakes and explicit misuse surface through this type. Data conditions
/// that are expected while analyzing real-world module sets, such as a file that is not a valid
/// module or a reference into a module that was never loaded, are recovered locally by the
/// loader and the resolver and never reach the caller.
///
/// # Error Categories
///
/// ## Loading Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Malformed`] - A module image is structurally invalid
/// - [`Error::ImageError`] - A module image could not be deserialized
///
/// ## Configuration Errors
/// - [`Error::Pattern`] - Malformed type name pattern
/// - [`Error::GlobPattern`] - Malformed file name mask
///
/// ## Graph Errors
/// - [`Error::VertexNotFound`] - A vertex named by the caller is not part of the graph
/// - [`Error::GraphError`] - Invalid input to a graph operation
///
/// # Examples
///
/// ```rust
/// use dotmetrics::{Error, graph::DependencyGraph};
///
/// let mut graph: DependencyGraph<()> = DependencyGraph::new();
/// match graph.remove_vertex("App.Missing") {
///     Err(Error::VertexNotFound(name)) => assert_eq!(name, "App.Missing"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while scanning directories or
    /// mapping candidate module files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The module image is damaged and could not be turned into a module.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A JSON module image failed to deserialize.
    #[error("Invalid module image - {0}")]
    ImageError(#[from] serde_json::Error),

    /// A type name pattern could not be compiled.
    ///
    /// Patterns are supplied by callers for entry point discovery and type filters,
    /// a failure here is a usage mistake and is never swallowed.
    #[error("Invalid pattern - {0}")]
    Pattern(#[from] regex::Error),

    /// A file name mask could not be compiled.
    #[error("Invalid file mask - {0}")]
    GlobPattern(#[from] glob::PatternError),

    /// The vertex named by the caller does not exist in the graph.
    #[error("Vertex not found in graph - {0}")]
    VertexNotFound(String),

    /// `DependencyGraph` error.
    ///
    /// Raised for invalid inputs to graph queries, such as negative edge weights
    /// handed to a shortest path computation.
    #[error("{0}")]
    GraphError(String),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
