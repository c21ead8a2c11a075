//! Custom construction strategies for types the resolver cannot build from
//! constructor parameters alone.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::container::Container;
use crate::core::{Key, Value};
use crate::error::{ContainerError, Result};

/// What an injector is asked to produce.
#[derive(Clone, Copy, Debug)]
pub struct InjectionRequest<'a> {
  key: &'a Key,
  context: Option<&'a str>,
}

impl<'a> InjectionRequest<'a> {
  pub(crate) fn new(key: &'a Key, context: Option<&'a str>) -> Self {
    Self { key, context }
  }

  /// The id of the requested type.
  pub fn key(&self) -> &Key {
    self.key
  }

  /// Contextual hint from the requesting site: the parameter's hint, the
  /// parameter name, or the context passed to `Container::get_with_context`.
  pub fn context(&self) -> Option<&str> {
    self.context
  }
}

/// A custom construction strategy bound to one type.
///
/// The produced value is checked against the type the injector was bound for;
/// anything else is rejected with `ContainerError::InjectionTypeMismatch`.
pub trait Injector: Send + Sync {
  fn create_injection(&self, container: &Container, request: &InjectionRequest<'_>) -> Result<Value>;
}

impl<I: Injector + ?Sized> Injector for Arc<I> {
  fn create_injection(&self, container: &Container, request: &InjectionRequest<'_>) -> Result<Value> {
    (**self).create_injection(container, request)
  }
}

/// Adapts a closure producing `T` into an [`Injector`].
pub struct FnInjector<T: ?Sized, F> {
  body: F,
  _marker: std::marker::PhantomData<fn() -> Arc<T>>,
}

impl<T, F> FnInjector<T, F>
where
  T: ?Sized + Any + Send + Sync,
  F: Fn(&Container, Option<&str>) -> Result<Arc<T>> + Send + Sync,
{
  pub fn new(body: F) -> Self {
    Self {
      body,
      _marker: std::marker::PhantomData,
    }
  }
}

impl<T, F> Injector for FnInjector<T, F>
where
  T: ?Sized + Any + Send + Sync,
  F: Fn(&Container, Option<&str>) -> Result<Arc<T>> + Send + Sync,
{
  fn create_injection(&self, container: &Container, request: &InjectionRequest<'_>) -> Result<Value> {
    (self.body)(container, request.context()).map(Value::from_arc)
  }
}

#[derive(Clone)]
struct InjectorEntry {
  injector: Arc<dyn Injector>,
  expected: &'static str,
  accepts: fn(&Value) -> bool,
}

fn accepts<T: ?Sized + Any + Send + Sync>(value: &Value) -> bool {
  value.is::<T>()
}

/// Root-level table of injectors, keyed by the id of the injected type.
#[derive(Default)]
pub(crate) struct InjectorRegistry {
  entries: DashMap<Key, InjectorEntry>,
}

impl InjectorRegistry {
  pub(crate) fn bind<T: ?Sized + Any + Send + Sync>(&self, injector: Arc<dyn Injector>) {
    let key = Key::of::<T>();
    tracing::debug!(id = %key, "injector registered");
    self.entries.insert(
      key,
      InjectorEntry {
        injector,
        expected: type_name::<T>(),
        accepts: accepts::<T>,
      },
    );
  }

  pub(crate) fn remove(&self, key: &Key) -> bool {
    self.entries.remove(key).is_some()
  }

  pub(crate) fn contains(&self, key: &Key) -> bool {
    self.entries.contains_key(key)
  }

  /// Runs the injector for `key`, if one is registered.
  pub(crate) fn create(&self, container: &Container, key: &Key, context: Option<&str>) -> Option<Result<Value>> {
    // Clone out so the map guard is not held while user code runs.
    let entry = self.entries.get(key)?.value().clone();
    let request = InjectionRequest::new(key, context);
    Some(entry.injector.create_injection(container, &request).and_then(|value| {
      if (entry.accepts)(&value) {
        Ok(value)
      } else {
        Err(ContainerError::InjectionTypeMismatch {
          id: key.clone(),
          expected: entry.expected,
          actual: value.type_name(),
        })
      }
    }))
  }
}

impl fmt::Debug for InjectorRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list()
      .entries(self.entries.iter().map(|entry| entry.key().clone()))
      .finish()
  }
}
