//! Errors raised by the imperative side of the API.
//!
//! Stream failures never show up here: they travel downstream as
//! [`Completion::Failed`](crate::subscriber::Completion::Failed).

use thiserror::Error;

/// Errors returned by the strict `try_send*` family on subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubjectError {
  /// The subject already delivered its terminal completion.
  #[error("subject already completed")]
  Completed,
}

pub type Result<T, E = SubjectError> = std::result::Result<T, E>;
