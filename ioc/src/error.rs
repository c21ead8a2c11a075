use thiserror::Error;

use crate::core::Key;

/// Boxed error produced by user code (constructors, factories, finalizers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for `weave_ioc`.
///
/// Every variant is returned synchronously to the caller of `get`, `make`,
/// `invoke` or `run_scope`. The container never logs, retries or swallows
/// these errors itself.
#[derive(Debug, Error)]
pub enum ContainerError {
  #[error("Unable to resolve parameter `{parameter}` of `{owner}`: {reason}")]
  Dependency {
    parameter: String,
    owner: String,
    reason: String,
  },

  #[error("Undefined binding or class `{id}`")]
  NotFound { id: Key },

  #[error(transparent)]
  Scope(#[from] ScopeError),

  #[error("Circular dependency detected: {}", render_chain(.chain))]
  CircularDependency { chain: Vec<Key> },

  #[error("Can't overload singleton `{id}`: an instance has already been constructed")]
  SingletonOverload { id: Key },

  #[error("Binding `{id}` already exists in the current scope")]
  DuplicateBinding { id: Key },

  #[error("Injector for `{id}` failed: {reason}")]
  Injection { id: Key, reason: String },

  #[error("Invalid injection response for `{id}`: expected `{expected}`, got `{actual}`")]
  InjectionTypeMismatch {
    id: Key,
    expected: &'static str,
    actual: &'static str,
  },

  #[error("`{id}` resolved to `{actual}`, which is not `{expected}`")]
  TypeMismatch {
    id: Key,
    expected: &'static str,
    actual: &'static str,
  },

  #[error("Argument `{parameter}` of `{owner}` has the wrong type: expected `{expected}`, got `{actual}`")]
  Argument {
    parameter: String,
    owner: String,
    expected: &'static str,
    actual: &'static str,
  },

  /// A scope proxy was used where the only visible binding is the proxy
  /// itself, typically outside the scope that provides the real service.
  #[error("Proxy for `{id}` resolved to itself in scope `{scope}`")]
  RecursiveProxy { id: Key, scope: String },

  #[error("The container behind the scoped handle for `{id}` has been dropped")]
  ContainerDropped { id: Key },

  #[error("Failed to construct `{id}`: {source}")]
  Construction {
    id: Key,
    #[source]
    source: BoxError,
  },

  #[error(
    "{} error(s) thrown during finalization of scope `{}`",
    .errors.len(),
    .scope.as_deref().unwrap_or("<anonymous>")
  )]
  Finalizers {
    scope: Option<String>,
    errors: Vec<BoxError>,
  },
}

impl ContainerError {
  /// Wraps a failure raised by user construction code.
  pub fn construction(id: impl Into<Key>, source: impl Into<BoxError>) -> Self {
    ContainerError::Construction {
      id: id.into(),
      source: source.into(),
    }
  }
}

/// Errors about the scope stack.
#[derive(Debug, Error)]
pub enum ScopeError {
  /// The id (or type) is only available inside a named scope that is not part
  /// of the current chain.
  #[error(
    "`{id}` requires scope `{required}`, which is not active (current chain: {})",
    .available.join(" -> ")
  )]
  BadScope {
    id: Key,
    required: String,
    available: Vec<String>,
  },

  #[error("Scope `{name}` is already open in the current scope chain")]
  NamedScopeDuplication { name: String },

  /// A scope-bound accessor was used outside of the scope it needs.
  #[error(
    "No active scope named `{required}` (current chain: {})",
    .available.join(" -> ")
  )]
  NoActiveScope {
    required: String,
    available: Vec<String>,
  },
}

fn render_chain(chain: &[Key]) -> String {
  chain
    .iter()
    .map(Key::as_str)
    .collect::<Vec<_>>()
    .join(" -> ")
}

/// A specialized `Result` type for `weave_ioc` operations.
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;
