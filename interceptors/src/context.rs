//! Immutable descriptions of a call travelling through a pipeline.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use weave_ioc::{Callable, Params, Value};

/// Attribute under which [`CallContext::with_deadline`] stores the deadline.
pub const DEADLINE_ATTRIBUTE: &str = "weave.deadline";

/// The logical target of a call: a path such as `["users", "show"]` and,
/// optionally, the callable that implements it.
///
/// Displaying a target joins its path with its delimiter.
#[derive(Clone)]
pub struct Target {
  path: Arc<[String]>,
  delimiter: Arc<str>,
  callable: Option<Callable>,
}

impl Target {
  /// Splits `path` on `.`.
  pub fn from_path_string(path: &str) -> Self {
    Self::from_path_string_with(path, ".")
  }

  /// Splits `path` on `delimiter`. Empty chunks are kept.
  pub fn from_path_string_with(path: &str, delimiter: &str) -> Self {
    Self::from_path_array(path.split(delimiter), delimiter)
  }

  pub fn from_path_array<I, S>(path: I, delimiter: &str) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      path: path.into_iter().map(Into::<String>::into).collect(),
      delimiter: Arc::from(delimiter),
      callable: None,
    }
  }

  /// A `controller->action` style target.
  pub fn from_pair(controller: impl Into<String>, action: impl Into<String>) -> Self {
    let pair: [String; 2] = [controller.into(), action.into()];
    Self::from_path_array(pair, "->")
  }

  /// A target backed by `callable`. Without a path, the callable's name is
  /// used.
  pub fn from_callable(callable: Callable, path: Option<Vec<String>>) -> Self {
    let path = path.unwrap_or_else(|| vec![callable.name().to_owned()]);
    Self::from_path_array(path, ".").with_callable(callable)
  }

  /// A copy of this target with a different path.
  pub fn with_path<I, S>(&self, path: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      path: path.into_iter().map(Into::<String>::into).collect(),
      delimiter: self.delimiter.clone(),
      callable: self.callable.clone(),
    }
  }

  pub fn with_callable(&self, callable: Callable) -> Self {
    Self {
      path: self.path.clone(),
      delimiter: self.delimiter.clone(),
      callable: Some(callable),
    }
  }

  pub fn path(&self) -> &[String] {
    &self.path
  }

  pub fn delimiter(&self) -> &str {
    &self.delimiter
  }

  pub fn callable(&self) -> Option<&Callable> {
    self.callable.as_ref()
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.path.join(&*self.delimiter))
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("path", &self.path)
      .field("delimiter", &self.delimiter)
      .field("callable", &self.callable.as_ref().map(Callable::name))
      .finish()
  }
}

/// Everything an interceptor knows about a call.
///
/// Contexts are values: each `with_*` method returns a new context and leaves
/// the receiver untouched, so an interceptor can hand a modified context to
/// `next` without affecting what outer interceptors see.
#[derive(Clone)]
pub struct CallContext {
  target: Target,
  arguments: Arc<Params>,
  attributes: Arc<HashMap<String, Value>>,
}

impl CallContext {
  pub fn new(target: Target) -> Self {
    Self {
      target,
      arguments: Arc::new(Params::new()),
      attributes: Arc::new(HashMap::new()),
    }
  }

  pub fn target(&self) -> &Target {
    &self.target
  }

  pub fn arguments(&self) -> &Params {
    &self.arguments
  }

  pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.attributes.iter().map(|(name, value)| (name.as_str(), value))
  }

  pub fn with_target(&self, target: Target) -> Self {
    Self {
      target,
      ..self.clone()
    }
  }

  pub fn with_arguments(&self, arguments: Params) -> Self {
    Self {
      arguments: Arc::new(arguments),
      ..self.clone()
    }
  }

  pub fn with_argument<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) -> Self {
    let mut next = self.clone();
    Arc::make_mut(&mut next.arguments).insert(name, value);
    next
  }

  pub fn with_attribute<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) -> Self {
    self.with_attribute_value(name, Value::new(value))
  }

  pub fn with_attribute_value(&self, name: impl Into<String>, value: Value) -> Self {
    let mut next = self.clone();
    Arc::make_mut(&mut next.attributes).insert(name.into(), value);
    next
  }

  pub fn without_attribute(&self, name: &str) -> Self {
    if !self.attributes.contains_key(name) {
      return self.clone();
    }
    let mut next = self.clone();
    Arc::make_mut(&mut next.attributes).remove(name);
    next
  }

  pub fn attribute_value(&self, name: &str) -> Option<&Value> {
    self.attributes.get(name)
  }

  /// Typed attribute access; `None` if absent or of another type.
  pub fn attribute<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
    self.attributes.get(name).and_then(Value::downcast::<T>)
  }

  /// Sets the point in time after which interceptors consulting it may
  /// refuse to continue the call.
  pub fn with_deadline(&self, deadline: Instant) -> Self {
    self.with_attribute(DEADLINE_ATTRIBUTE, deadline)
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.attribute::<Instant>(DEADLINE_ATTRIBUTE).map(|deadline| *deadline)
  }
}

impl fmt::Debug for CallContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CallContext")
      .field("target", &self.target)
      .field("arguments", &self.arguments)
      .field("attributes", &self.attributes)
      .finish()
  }
}
