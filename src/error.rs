use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
///
/// The storage variants mirror the return codes of the on-disk engine:
/// `NodeFull` is recovered internally by splitting, the others surface to
/// the caller. I/O errors are propagated unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A node codec insert cannot fit without a split.
    #[error("node is full")]
    NodeFull,

    /// An exact-key lookup missed, or a scan ran past the last leaf.
    #[error("no such record")]
    NoSuchRecord,

    /// Entry or record index out of range.
    #[error("invalid cursor")]
    InvalidCursor,

    /// Negative page id where a valid one is required.
    #[error("invalid page id")]
    InvalidPid,

    /// Structural precondition violated, e.g. split with a non-empty sibling.
    #[error("invalid attribute")]
    InvalidAttribute,

    /// Malformed on-disk or load-file data.
    #[error("invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("table {0} does not exist")]
    TableNotFound(String),
}
