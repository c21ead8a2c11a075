//! Post-construction hooks applied to every autowired instance of a type.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::container::Container;
use crate::core::{Key, Value};
use crate::error::{ContainerError, Result};

type InflectFn = dyn Fn(&Container, Value) -> Result<Value> + Send + Sync;

/// Inflectors keyed by the type a built value is exposed as. A class cast to
/// `dyn Trait` is matched by inflectors registered for `dyn Trait`.
#[derive(Default)]
pub(crate) struct InflectorRegistry {
  entries: DashMap<Key, Vec<Arc<InflectFn>>>,
}

impl InflectorRegistry {
  pub(crate) fn add<T, F>(&self, inflector: F)
  where
    T: ?Sized + Any + Send + Sync,
    F: Fn(&Container, Arc<T>) -> Result<Arc<T>> + Send + Sync + 'static,
  {
    let key = Key::of::<T>();
    let wrapped = move |container: &Container, value: Value| -> Result<Value> {
      let instance = value.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
        id: Key::of::<T>(),
        expected: type_name::<T>(),
        actual: value.type_name(),
      })?;
      inflector(container, instance).map(Value::from_arc)
    };
    tracing::debug!(id = %key, "inflector registered");
    self
      .entries
      .entry(key)
      .or_default()
      .push(Arc::new(wrapped));
  }

  /// Runs the inflectors matching `value`'s type, in registration order.
  pub(crate) fn apply(&self, container: &Container, value: Value) -> Result<Value> {
    // Clone out so no shard lock is held while user code runs.
    let inflectors = match self.entries.get(&Key::new(value.type_name())) {
      Some(entry) => entry.value().clone(),
      None => return Ok(value),
    };
    inflectors
      .iter()
      .try_fold(value, |value, inflect| inflect(container, value))
  }

  pub(crate) fn len(&self) -> usize {
    self.entries.iter().map(|entry| entry.value().len()).sum()
  }
}

impl fmt::Debug for InflectorRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map()
      .entries(self.entries.iter().map(|entry| (entry.key().clone(), entry.value().len())))
      .finish()
  }
}
