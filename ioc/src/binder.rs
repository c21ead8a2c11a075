//! Binding registration.
//!
//! `Container::bind` and friends always write into the *current* scope frame.
//! Named-scope defaults registered through [`ScopeBinder`] are kept apart and
//! consulted by every frame carrying that name.

use dashmap::DashMap;

use crate::binding::{Binding, Definition};
use crate::container::Container;
use crate::core::Key;
use crate::error::{ContainerError, Result};
use crate::options::ContainerOptions;
use crate::scope::ScopeFrame;

/// How a registration treats an existing binding for the same id.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BindMode {
  /// Rebinding is intended; never a `DuplicateBinding`.
  pub(crate) replace: bool,
  /// Discard an already constructed singleton instead of failing.
  pub(crate) force: bool,
}

impl BindMode {
  pub(crate) fn from_options(options: &ContainerOptions) -> Self {
    Self {
      replace: false,
      force: !options.strict_singletons,
    }
  }
}

pub(crate) fn bind_in(
  frame: &ScopeFrame,
  options: &ContainerOptions,
  id: Key,
  binding: Binding,
  mode: BindMode,
) -> Result<()> {
  if options.forbid_rebinding && !mode.replace && frame.bindings.contains_key(&id) {
    return Err(ContainerError::DuplicateBinding { id });
  }

  if frame.has_constructed(&id) {
    if !mode.force {
      return Err(ContainerError::SingletonOverload { id });
    }
    tracing::debug!(id = %id, scope = frame.display_name(), "discarding constructed singleton");
  }
  frame.forget(&id);

  tracing::debug!(
    id = %id,
    kind = binding.kind(),
    singleton = binding.singleton,
    scope = frame.display_name(),
    "binding registered"
  );

  if binding.singleton {
    if let Definition::Instance(value) = &binding.definition {
      frame.seed(id.clone(), value.clone());
    }
  }
  frame.bindings.insert(id, binding);
  Ok(())
}

pub(crate) fn remove_in(frame: &ScopeFrame, id: &Key) -> bool {
  let removed = frame.bindings.remove(id).is_some();
  let had_instance = frame.has_constructed(id);
  frame.forget(id);
  if removed || had_instance {
    tracing::debug!(id = %id, scope = frame.display_name(), "binding removed");
  }
  removed || had_instance
}

/// Bindings registered for a scope name rather than a live scope.
///
/// Every scope opened with that name sees them as if they had been bound
/// locally, and singletons built from them are cached per scope instance.
/// Outside such a scope the ids are unavailable and resolving them fails with
/// a `BadScope` error naming the scope.
pub struct ScopeBinder<'a> {
  container: &'a Container,
  scope: String,
}

impl<'a> ScopeBinder<'a> {
  pub(crate) fn new(container: &'a Container, scope: String) -> Self {
    Self { container, scope }
  }

  pub fn scope(&self) -> &str {
    &self.scope
  }

  pub fn bind(&self, id: impl Into<Key>, definition: impl Into<Definition>) -> Result<&Self> {
    self.register(id.into(), Binding::new(definition.into(), false))
  }

  pub fn bind_singleton(&self, id: impl Into<Key>, definition: impl Into<Definition>) -> Result<&Self> {
    self.register(id.into(), Binding::new(definition.into(), true))
  }

  pub fn has_binding(&self, id: impl Into<Key>) -> bool {
    let id = id.into();
    self
      .table()
      .map(|table| table.contains_key(&id))
      .unwrap_or(false)
  }

  pub fn remove_binding(&self, id: impl Into<Key>) -> bool {
    let id = id.into();
    self
      .table()
      .map(|table| table.remove(&id).is_some())
      .unwrap_or(false)
  }

  fn table(&self) -> Option<dashmap::mapref::one::Ref<'_, String, DashMap<Key, Binding>>> {
    self.container.scoped_bindings().get(&self.scope)
  }

  fn register(&self, id: Key, binding: Binding) -> Result<&Self> {
    let scoped = self.container.scoped_bindings();
    let table = scoped.entry(self.scope.clone()).or_default();
    if self.container.options().forbid_rebinding && table.contains_key(&id) {
      return Err(ContainerError::DuplicateBinding { id });
    }
    tracing::debug!(
      id = %id,
      kind = binding.kind(),
      singleton = binding.singleton,
      scope = %self.scope,
      "scoped binding registered"
    );
    table.insert(id, binding);
    Ok(self)
  }
}
