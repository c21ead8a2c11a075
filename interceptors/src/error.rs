use thiserror::Error;
use weave_ioc::{BoxError, ContainerError};

/// Errors raised while locating or invoking the target of a pipeline.
///
/// The pipeline never produces these on its own account; they come from
/// interceptors and terminal handlers and travel up the chain unchanged.
#[derive(Debug, Error)]
pub enum InterceptorError {
  #[error("Target `{target}` not found")]
  TargetNotFound { target: String },

  #[error("Access to `{target}` is forbidden: {reason}")]
  Forbidden { target: String, reason: String },

  #[error("Bad argument for `{target}`: {reason}")]
  BadArgument { target: String, reason: String },

  #[error("Error while calling `{target}`: {source}")]
  TargetCall {
    target: String,
    #[source]
    source: BoxError,
  },

  #[error("Deadline exceeded before `{target}` was reached")]
  DeadlineExceeded { target: String },

  #[error(transparent)]
  Container(#[from] ContainerError),

  #[error(transparent)]
  Other(#[from] BoxError),
}

/// A specialized `Result` type for pipeline handlers.
pub type Result<T, E = InterceptorError> = std::result::Result<T, E>;
