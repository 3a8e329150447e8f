//! Error taxonomy for catalog data access.
//!
//! Every fallible operation in the crate resolves to one of these kinds so the
//! presentation layer can match on categories (retryable network failures vs.
//! local persistence failures) without string inspection.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes surfaced by the data-access layer.
#[derive(Debug, Error)]
pub enum Error {
  /// The remote call exceeded its connect or response deadline.
  #[error("request timed out")]
  Timeout,

  /// The remote host could not be reached.
  #[error("connection failed: {0}")]
  Connection(String),

  /// The remote reported that the requested resource does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// The remote reported a server-side failure (5xx).
  #[error("server failure (status {0})")]
  Server(u16),

  /// The local store failed while reading or writing rows.
  #[error("store I/O failure: {0}")]
  StoreIo(String),

  /// The local store could not be opened or migrated.
  #[error("failed to open store: {0}")]
  StoreOpen(String),

  /// Transport failure that fits no other category.
  #[error("transport failure: {0}")]
  UnknownTransport(String),
}

/// The category of an [`Error`], without its payload.
///
/// This is what state containers carry: it is `Copy`, cheap to compare, and
/// sufficient for presentation to pick a recovery affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Timeout,
  Connection,
  NotFound,
  Server,
  StoreIo,
  StoreOpen,
  UnknownTransport,
}

impl Error {
  /// The taxonomy category of this error.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Timeout => ErrorKind::Timeout,
      Error::Connection(_) => ErrorKind::Connection,
      Error::NotFound(_) => ErrorKind::NotFound,
      Error::Server(_) => ErrorKind::Server,
      Error::StoreIo(_) => ErrorKind::StoreIo,
      Error::StoreOpen(_) => ErrorKind::StoreOpen,
      Error::UnknownTransport(_) => ErrorKind::UnknownTransport,
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    Error::StoreIo(err.to_string())
  }
}

/// A cloneable snapshot of an [`Error`] for observable state.
///
/// `Error` itself is not `Clone` (it can wrap non-cloneable sources), so state
/// containers that are broadcast to watchers carry this instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
  pub kind: ErrorKind,
  pub message: String,
}

impl From<&Error> for LoadError {
  fn from(err: &Error) -> Self {
    LoadError {
      kind: err.kind(),
      message: err.to_string(),
    }
  }
}

impl std::fmt::Display for LoadError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.message)
  }
}
