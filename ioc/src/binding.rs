use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::core::{Key, Value};
use crate::error::Result;
use crate::proxy::Proxy;
use crate::signature::{Autowire, Callable, Class};

/// How a binding produces its value.
#[derive(Clone)]
pub enum Definition {
  /// Build a constructible type, resolving its constructor parameters.
  Class(Class),
  /// Invoke a callable, resolving its parameters.
  Factory(Callable),
  /// Hand out a fixed, already constructed value.
  Instance(Value),
  /// Resolve another id instead.
  Alias(Key),
  /// Hand out a [`Scoped`](crate::Scoped) handle that resolves this id from
  /// the caller's current scope on each use.
  Proxy(Proxy),
}

impl Definition {
  pub fn class<T: Autowire>() -> Self {
    Definition::Class(Class::of::<T>())
  }

  pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
    Definition::Instance(Value::new(value))
  }

  /// A fixed instance shared through an existing `Arc`, e.g. `Arc<dyn Trait>`.
  pub fn shared<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Definition::Instance(Value::from_arc(value))
  }

  pub fn alias(target: impl Into<Key>) -> Self {
    Definition::Alias(target.into())
  }

  /// A proxy for `T`; resolving the id yields a `Scoped<T>`.
  pub fn proxy<T: ?Sized + Any + Send + Sync>() -> Self {
    Definition::Proxy(Proxy::of::<T>())
  }

  /// A parameterless factory receiving the container.
  pub fn factory<T, F>(name: impl Into<Cow<'static, str>>, factory: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    Definition::Factory(Callable::from_fn(name, factory))
  }

  fn kind(&self) -> &'static str {
    match self {
      Definition::Class(_) => "class",
      Definition::Factory(_) => "factory",
      Definition::Instance(_) => "instance",
      Definition::Alias(_) => "alias",
      Definition::Proxy(_) => "proxy",
    }
  }
}

impl From<Class> for Definition {
  fn from(class: Class) -> Self {
    Definition::Class(class)
  }
}

impl From<Callable> for Definition {
  fn from(callable: Callable) -> Self {
    Definition::Factory(callable)
  }
}

impl From<Proxy> for Definition {
  fn from(proxy: Proxy) -> Self {
    Definition::Proxy(proxy)
  }
}

impl From<Value> for Definition {
  fn from(value: Value) -> Self {
    Definition::Instance(value)
  }
}

impl fmt::Debug for Definition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Definition::Class(class) => f.debug_tuple("Class").field(class).finish(),
      Definition::Factory(callable) => f.debug_tuple("Factory").field(&callable.name()).finish(),
      Definition::Instance(value) => f.debug_tuple("Instance").field(value).finish(),
      Definition::Alias(key) => f.debug_tuple("Alias").field(key).finish(),
      Definition::Proxy(proxy) => proxy.fmt(f),
    }
  }
}

/// A registered rule for one id, owned by the scope it was declared in.
#[derive(Clone)]
pub(crate) struct Binding {
  pub(crate) definition: Definition,
  pub(crate) singleton: bool,
}

impl Binding {
  pub(crate) fn new(definition: Definition, singleton: bool) -> Self {
    Self {
      definition,
      singleton,
    }
  }

  pub(crate) fn kind(&self) -> &'static str {
    self.definition.kind()
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Binding")
      .field("definition", &self.definition)
      .field("singleton", &self.singleton)
      .finish()
  }
}
