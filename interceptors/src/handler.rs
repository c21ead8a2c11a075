//! Terminal handlers that perform the actual call through the container.

use std::fmt;

use dashmap::DashMap;
use weave_ioc::{Callable, Container, ContainerError, Params, Value};

use crate::context::CallContext;
use crate::error::{InterceptorError, Result};
use crate::interceptor::Handler;

fn dispatch(container: &Container, target: String, callable: &Callable, arguments: &Params) -> Result<Value> {
  tracing::trace!(path = %target, callable = callable.name(), "dispatching");
  let args = match container.resolve_arguments(callable.name(), callable.parameters(), arguments) {
    Ok(args) => args,
    Err(err) => return Err(classify(target, callable, err)),
  };
  callable
    .call(container, args)
    .map_err(|err| classify(target, callable, err))
}

/// Failures about the target's own arguments are argument errors; anything
/// raised deeper in the graph or by the target itself is a call failure.
fn classify(target: String, callable: &Callable, err: ContainerError) -> InterceptorError {
  let own_argument = match &err {
    ContainerError::Dependency { owner, .. } | ContainerError::Argument { owner, .. } => owner == callable.name(),
    _ => false,
  };
  if own_argument {
    InterceptorError::BadArgument {
      target,
      reason: err.to_string(),
    }
  } else {
    InterceptorError::TargetCall {
      target,
      source: Box::new(err),
    }
  }
}

/// Invokes the callable attached to the context's target, resolving its
/// parameters from the context's arguments and the container.
#[derive(Clone, Debug)]
pub struct InvokerHandler {
  container: Container,
}

impl InvokerHandler {
  pub fn new(container: Container) -> Self {
    Self { container }
  }
}

impl Handler for InvokerHandler {
  fn handle(&self, context: CallContext) -> Result<Value> {
    let target = context.target();
    let callable = target.callable().ok_or_else(|| InterceptorError::TargetNotFound {
      target: target.to_string(),
    })?;
    dispatch(&self.container, target.to_string(), callable, context.arguments())
  }
}

/// Locates callables by target path, e.g. `users.show` or `Users->show`.
///
/// Paths are matched against the displayed form of the target. A target with
/// no registered path falls back to its own callable, if it has one.
pub struct TargetRegistry {
  container: Container,
  targets: DashMap<String, Callable>,
}

impl TargetRegistry {
  pub fn new(container: Container) -> Self {
    Self {
      container,
      targets: DashMap::new(),
    }
  }

  pub fn register(&self, path: impl Into<String>, callable: Callable) -> &Self {
    let path = path.into();
    tracing::debug!(path = %path, callable = callable.name(), "target registered");
    self.targets.insert(path, callable);
    self
  }

  pub fn contains(&self, path: &str) -> bool {
    self.targets.contains_key(path)
  }

  pub fn remove(&self, path: &str) -> bool {
    self.targets.remove(path).is_some()
  }
}

impl Handler for TargetRegistry {
  fn handle(&self, context: CallContext) -> Result<Value> {
    let path = context.target().to_string();
    // Clone out so no shard lock is held during the call.
    let registered = self.targets.get(&path).map(|entry| entry.value().clone());
    let callable = registered
      .or_else(|| context.target().callable().cloned())
      .ok_or_else(|| InterceptorError::TargetNotFound { target: path.clone() })?;
    dispatch(&self.container, path, &callable, context.arguments())
  }
}

impl fmt::Debug for TargetRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TargetRegistry")
      .field("targets", &self.targets.len())
      .finish()
  }
}
