//! The resolver: turns ids and parameter lists into values.
//!
//! Binding lookup climbs the scope chain from the frame it is given. Each
//! frame is searched for local bindings first and then for the defaults
//! registered under its scope name; the first hit wins and the frame it was
//! found in owns the singleton slot.
//!
//! Singletons resolve their own dependencies from the owning frame, so a
//! long-lived instance never captures something from a shorter-lived scope.
//! Transient bindings resolve from the requesting frame.

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::binding::{Binding, Definition};
use crate::container::Container;
use crate::core::{Key, ResolutionGuard, Value};
use crate::error::{ContainerError, Result, ScopeError};
use crate::scope::ScopeFrame;
use crate::signature::{Arguments, Class, ParamType, Parameter, Params};

impl Container {
  /// Finds the binding for `key` visible from `frame`, with the frame owning it.
  pub(crate) fn locate<'f>(&self, frame: &'f ScopeFrame, key: &Key) -> Option<(&'f ScopeFrame, Binding)> {
    for candidate in frame.ancestors() {
      if let Some(binding) = candidate.bindings.get(key) {
        return Some((candidate, binding.value().clone()));
      }
      if let Some(binding) = candidate.name.as_deref().and_then(|name| self.scoped_default(name, key)) {
        return Some((candidate, binding));
      }
    }
    None
  }

  fn scoped_default(&self, scope: &str, key: &Key) -> Option<Binding> {
    let table = self.scoped_bindings().get(scope)?;
    let binding = table.get(key)?.value().clone();
    Some(binding)
  }

  /// The named scope an otherwise unreachable `key` is registered for.
  fn required_scope(&self, key: &Key) -> Option<String> {
    self
      .scoped_bindings()
      .iter()
      .find(|table| table.value().contains_key(key))
      .map(|table| table.key().clone())
  }

  fn unresolvable(&self, frame: &ScopeFrame, key: &Key) -> ContainerError {
    match self.required_scope(key) {
      Some(required) => ScopeError::BadScope {
        id: key.clone(),
        required,
        available: frame.chain_names(),
      }
      .into(),
      None => ContainerError::NotFound { id: key.clone() },
    }
  }

  pub(crate) fn make_in(
    &self,
    frame: &ScopeFrame,
    key: &Key,
    params: &Params,
    context: Option<&str>,
  ) -> Result<Value> {
    let _guard = ResolutionGuard::enter(self.id(), key)?;

    if let Some(injected) = self.injectors().create(self, key, context) {
      return injected;
    }

    let (owner, binding) = self
      .locate(frame, key)
      .ok_or_else(|| self.unresolvable(frame, key))?;

    if !params.is_empty() {
      return self.produce(frame, key, &binding.definition, params, context);
    }

    if !binding.singleton {
      return match &binding.definition {
        Definition::Class(class) if class.is_singleton() => self.declared_singleton(frame, owner, key, class),
        definition => self.produce(frame, key, definition, params, context),
      };
    }

    if let Definition::Instance(value) = &binding.definition {
      return Ok(value.clone());
    }

    let slot = owner.slot(key);
    slot
      .get_or_try_init(|| {
        tracing::debug!(id = %key, scope = owner.display_name(), "constructing singleton");
        self.produce(owner, key, &binding.definition, params, context)
      })
      .cloned()
  }

  fn produce(
    &self,
    frame: &ScopeFrame,
    key: &Key,
    definition: &Definition,
    params: &Params,
    context: Option<&str>,
  ) -> Result<Value> {
    match definition {
      Definition::Instance(value) => Ok(value.clone()),
      Definition::Alias(target) => self.make_in(frame, target, params, context),
      Definition::Proxy(proxy) => Ok(proxy.handle(self, key)),
      Definition::Class(class) => self.build_class(frame, class, params),
      Definition::Factory(callable) => {
        tracing::trace!(id = %key, factory = callable.name(), "invoking factory");
        let args = self.resolve_in(frame, callable.name(), callable.parameters(), params)?;
        callable.call(self, args)
      }
    }
  }

  fn check_class_scope(&self, frame: &ScopeFrame, class: &Class) -> Result<()> {
    match class.scope() {
      Some(required) if self.options().check_scope && frame.find_named(required).is_none() => {
        Err(
          ScopeError::BadScope {
            id: class.key().clone(),
            required: required.to_owned(),
            available: frame.chain_names(),
          }
          .into(),
        )
      }
      _ => Ok(()),
    }
  }

  fn build_class(&self, frame: &ScopeFrame, class: &Class, params: &Params) -> Result<Value> {
    self.check_class_scope(frame, class)?;

    let parameters = class.parameters();
    let args = self.resolve_in(frame, class.type_name(), &parameters, params)?;
    let built = class.build(args)?;
    tracing::trace!(class = class.type_name(), scope = frame.display_name(), "constructed");

    if let Some(finalizer) = built.finalizer {
      frame.push_finalizer(finalizer);
    }
    self.inflectors().apply(self, built.value)
  }

  /// Resolves `key` on behalf of a [`Scoped`](crate::Scoped) handle.
  pub(crate) fn resolve_proxied<T: ?Sized + Any + Send + Sync>(&self, key: &Key) -> Result<Arc<T>> {
    let frame = self.current_frame();
    if !self.injectors().contains(key) {
      if let Some((owner, Binding { definition: Definition::Proxy(_), .. })) = self.locate(&frame, key) {
        return Err(ContainerError::RecursiveProxy {
          id: key.clone(),
          scope: owner.display_name().to_owned(),
        });
      }
    }
    let value = self.make_in(&frame, key, &Params::new(), None)?;
    value.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
      id: key.clone(),
      expected: type_name::<T>(),
      actual: value.type_name(),
    })
  }

  /// Builds `class`, preferring a binding registered for its id.
  pub(crate) fn autowire_in(&self, frame: &ScopeFrame, class: &Class, params: &Params) -> Result<Value> {
    let key = class.key();
    if self.locate(frame, key).is_some() {
      return self.make_in(frame, key, params, None);
    }

    let _guard = ResolutionGuard::enter(self.id(), key)?;
    if !class.is_singleton() || !params.is_empty() {
      return self.build_class(frame, class, params);
    }

    self.declared_singleton(frame, frame, key, class)
  }

  /// Memoizes a class that declares itself a singleton. The instance lives in
  /// the frame of its declared scope if that scope is active, otherwise in
  /// `fallback`.
  fn declared_singleton(&self, frame: &ScopeFrame, fallback: &ScopeFrame, key: &Key, class: &Class) -> Result<Value> {
    self.check_class_scope(frame, class)?;
    let home = class
      .scope()
      .and_then(|name| frame.find_named(name))
      .unwrap_or(fallback);
    let slot = home.slot(key);
    slot
      .get_or_try_init(|| {
        tracing::debug!(id = %key, scope = home.display_name(), "constructing declarative singleton");
        self.build_class(home, class, &Params::new())
      })
      .cloned()
  }

  /// Produces the ordered argument list for `parameters`.
  pub(crate) fn resolve_in(
    &self,
    frame: &ScopeFrame,
    owner: &str,
    parameters: &[Parameter],
    explicit: &Params,
  ) -> Result<Arguments> {
    let mut args = Arguments::new(owner);
    for parameter in parameters {
      let value = self.resolve_parameter(frame, owner, parameter, explicit)?;
      args.push(parameter.name(), value);
    }
    Ok(args)
  }

  fn resolve_parameter(
    &self,
    frame: &ScopeFrame,
    owner: &str,
    parameter: &Parameter,
    explicit: &Params,
  ) -> Result<Option<Value>> {
    if let Some(value) = explicit.get(parameter.name()) {
      return Ok(Some(value.clone()));
    }

    if let Some(key) = parameter.key() {
      let context = parameter.hint().unwrap_or(parameter.name());

      if let Some(injected) = self.injectors().create(self, key, Some(context)) {
        return injected.map(Some);
      }

      if self.locate(frame, key).is_some() {
        return self
          .make_in(frame, key, &Params::new(), Some(context))
          .map(Some);
      }
    }

    if let Some(default) = parameter.default_value() {
      return Ok(Some(default.clone()));
    }

    if let ParamType::Class(class) = parameter.kind() {
      return self.autowire_in(frame, class, &Params::new()).map(Some);
    }

    if parameter.is_nullable() {
      return Ok(None);
    }

    if let Some(key) = parameter.key() {
      if let Some(required) = self.required_scope(key) {
        return Err(
          ScopeError::BadScope {
            id: key.clone(),
            required,
            available: frame.chain_names(),
          }
          .into(),
        );
      }
    }

    Err(ContainerError::Dependency {
      parameter: parameter.name().to_owned(),
      owner: owner.to_owned(),
      reason: match parameter.key() {
        Some(key) => format!("no binding, injector or default for `{key}`"),
        None => "no explicit value or default".to_owned(),
      },
    })
  }

  /// An already available value for `key`: a fixed instance or a constructed
  /// singleton, following aliases. Never constructs anything.
  pub(crate) fn peek_in(&self, frame: &ScopeFrame, key: &Key) -> Option<Value> {
    let mut visited: Vec<Key> = Vec::new();
    let mut current = key.clone();
    loop {
      let (owner, binding) = self.locate(frame, &current)?;
      if let Some(value) = owner.cached(&current) {
        return Some(value);
      }
      match binding.definition {
        Definition::Instance(value) => return Some(value),
        Definition::Alias(target) => {
          if visited.contains(&target) {
            return None;
          }
          visited.push(current);
          current = target;
        }
        Definition::Class(_) | Definition::Factory(_) | Definition::Proxy(_) => return None,
      }
    }
  }
}
