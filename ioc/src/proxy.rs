//! Scope proxies: handles that resolve their service from the caller's
//! current scope on every access.
//!
//! A long-lived singleton must not capture a value from a shorter-lived scope.
//! It can hold a [`Scoped`] handle instead and call [`Scoped::get`] whenever it
//! needs the service; each call sees whatever the active scope binds.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::container::{Container, Shared};
use crate::core::{Key, Value};
use crate::error::{ContainerError, Result};

/// A lazily resolved reference to `id`.
///
/// The handle holds the container weakly, so a singleton owning it does not
/// keep the container alive.
pub struct Scoped<T: ?Sized> {
  shared: Weak<Shared>,
  id: Key,
  _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Any + Send + Sync> Scoped<T> {
  pub(crate) fn new(shared: Weak<Shared>, id: Key) -> Self {
    Self {
      shared,
      id,
      _marker: PhantomData,
    }
  }

  pub fn id(&self) -> &Key {
    &self.id
  }

  /// Resolves the service from the current scope of the calling thread or
  /// task.
  ///
  /// Fails with `RecursiveProxy` when the only binding visible from the
  /// current scope is the proxy itself.
  pub fn get(&self) -> Result<Arc<T>> {
    let shared = self
      .shared
      .upgrade()
      .ok_or_else(|| ContainerError::ContainerDropped { id: self.id.clone() })?;
    Container::from_shared(shared).resolve_proxied::<T>(&self.id)
  }
}

impl<T: ?Sized> Clone for Scoped<T> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
      id: self.id.clone(),
      _marker: PhantomData,
    }
  }
}

impl<T: ?Sized> fmt::Debug for Scoped<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Scoped")
      .field("id", &self.id)
      .field("type", &type_name::<T>())
      .finish()
  }
}

/// Binding that hands out [`Scoped`] handles instead of the service itself.
#[derive(Clone)]
pub struct Proxy {
  type_name: &'static str,
  make: fn(Weak<Shared>, Key) -> Value,
}

impl Proxy {
  pub fn of<T: ?Sized + Any + Send + Sync>() -> Self {
    Self {
      type_name: type_name::<T>(),
      make: |shared, id| Value::new(Scoped::<T>::new(shared, id)),
    }
  }

  /// The proxied type.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub(crate) fn handle(&self, container: &Container, id: &Key) -> Value {
    (self.make)(container.downgrade(), id.clone())
  }
}

impl fmt::Debug for Proxy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Proxy").field(&self.type_name).finish()
  }
}
