//! Core data structures shared by the binder, the resolver and the scope stack.

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, Result};

thread_local! {
  // Keys currently being resolved on this thread, outermost first, tagged with
  // the id of the container doing the work. This is what turns `A -> B -> A`
  // into an error instead of a stack overflow.
  static RESOLVING_STACK: RefCell<Vec<(u64, Key)>> = const { RefCell::new(Vec::new()) };
}

/// An RAII guard marking a key as "being resolved" on the current thread.
///
/// Entering a key that is already on the stack yields
/// [`ContainerError::CircularDependency`] carrying the full chain. Dropping the
/// guard removes the key again, on both the success and the error path.
pub(crate) struct ResolutionGuard {
  container: u64,
}

impl ResolutionGuard {
  pub(crate) fn enter(container: u64, key: &Key) -> Result<Self> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      let position = stack
        .iter()
        .position(|(owner, pending)| *owner == container && pending == key);

      if let Some(start) = position {
        let mut chain: Vec<Key> = stack[start..]
          .iter()
          .filter(|(owner, _)| *owner == container)
          .map(|(_, pending)| pending.clone())
          .collect();
        chain.push(key.clone());
        return Err(ContainerError::CircularDependency { chain });
      }

      stack.push((container, key.clone()));
      Ok(Self { container })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    // The thread-local may already be gone during thread teardown.
    let _ = RESOLVING_STACK.try_with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(last) = stack.iter().rposition(|(owner, _)| *owner == self.container) {
        stack.remove(last);
      }
    });
  }
}

/// Identifier of a binding.
///
/// Keys are plain strings so that aliases, named variants and ad-hoc ids all
/// share one namespace. [`Key::of`] derives the key of a type from its type
/// name, which is what typed lookups such as `Container::resolve` use.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);

impl Key {
  pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
    Self(id.into())
  }

  /// The key of type `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self(Cow::Borrowed(type_name::<T>()))
  }

  /// A named variant of type `T`, e.g. two differently configured pools.
  pub fn named<T: ?Sized + Any>(name: &str) -> Self {
    Self(Cow::Owned(format!("{}#{}", type_name::<T>(), name)))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for Key {
  fn from(id: &str) -> Self {
    Self(Cow::Owned(id.to_owned()))
  }
}

impl From<String> for Key {
  fn from(id: String) -> Self {
    Self(Cow::Owned(id))
  }
}

impl From<&Key> for Key {
  fn from(key: &Key) -> Self {
    key.clone()
  }
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.0)
  }
}

/// A type-erased, shareable value produced by the container.
///
/// Internally this is an `Arc<T>` boxed behind `dyn Any`, so `T` may be a
/// trait object (`Arc<dyn Greeter>`) as well as a concrete type. Cloning a
/// `Value` never clones the underlying object.
#[derive(Clone)]
pub struct Value {
  inner: Arc<dyn Any + Send + Sync>,
  type_name: &'static str,
}

impl Value {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  pub fn from_arc<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      inner: Arc::new(value),
      type_name: type_name::<T>(),
    }
  }

  /// Returns the shared object if this value holds an `Arc<T>`.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.inner.downcast_ref::<Arc<T>>().cloned()
  }

  pub fn is<T: ?Sized + Any + Send + Sync>(&self) -> bool {
    self.inner.is::<Arc<T>>()
  }

  /// Name of the type this value was created from.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// `true` when both values come from the same construction.
  pub fn ptr_eq(&self, other: &Value) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Value({})", self.type_name)
  }
}
