//! The main `Container` struct and its associated methods.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::binder::{bind_in, remove_in, BindMode, ScopeBinder};
use crate::binding::{Binding, Definition};
use crate::core::{Key, Value};
use crate::error::{ContainerError, Result, ScopeError};
use crate::inflector::InflectorRegistry;
use crate::injector::{FnInjector, Injector, InjectorRegistry};
use crate::options::{ContainerBuilder, ContainerOptions};
use crate::proxy::Scoped;
use crate::scope::{current_frame, Scope, ScopeFrame, ScopeGuard, ScopeInfo};
use crate::signature::{Autowire, Class, Params};
use crate::tags::TagRegistry;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct Shared {
  id: u64,
  root: Arc<ScopeFrame>,
  injectors: InjectorRegistry,
  inflectors: InflectorRegistry,
  tags: TagRegistry,
  scoped: DashMap<String, DashMap<Key, Binding>>,
  options: ContainerOptions,
}

impl Drop for Shared {
  fn drop(&mut self) {
    let errors = self.root.finalize();
    if !errors.is_empty() {
      tracing::debug!(count = errors.len(), "root scope finalizers failed during container drop");
    }
  }
}

/// The dependency-resolution container.
///
/// Cloning a `Container` is cheap and yields a handle to the same registry.
/// Bindings, injectors and tags are shared by every thread; which scope is
/// current is tracked per thread (and per task with the `tokio` feature).
#[derive(Clone)]
pub struct Container {
  shared: Arc<Shared>,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// Creates a new, empty `Container` with default options.
  pub fn new() -> Self {
    Self::with_options(ContainerOptions::default())
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::new()
  }

  pub fn with_options(options: ContainerOptions) -> Self {
    let id = NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed);
    Self {
      shared: Arc::new(Shared {
        id,
        root: ScopeFrame::root(id),
        injectors: InjectorRegistry::default(),
        inflectors: InflectorRegistry::default(),
        tags: TagRegistry::default(),
        scoped: DashMap::new(),
        options,
      }),
    }
  }

  pub fn options(&self) -> &ContainerOptions {
    &self.shared.options
  }

  pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
    Self { shared }
  }

  pub(crate) fn downgrade(&self) -> Weak<Shared> {
    Arc::downgrade(&self.shared)
  }

  pub(crate) fn id(&self) -> u64 {
    self.shared.id
  }

  pub(crate) fn injectors(&self) -> &InjectorRegistry {
    &self.shared.injectors
  }

  pub(crate) fn inflectors(&self) -> &InflectorRegistry {
    &self.shared.inflectors
  }

  pub(crate) fn scoped_bindings(&self) -> &DashMap<String, DashMap<Key, Binding>> {
    &self.shared.scoped
  }

  pub(crate) fn current_frame(&self) -> Arc<ScopeFrame> {
    current_frame(&self.shared.root)
  }

  // --- Binding ---

  /// Binds `id` in the current scope, replacing a previous local binding.
  pub fn bind(&self, id: impl Into<Key>, definition: impl Into<Definition>) -> Result<()> {
    self.register(id.into(), definition.into(), false, BindMode::from_options(self.options()))
  }

  /// Binds `id` as a singleton in the current scope.
  ///
  /// If an instance was already constructed for `id` in this scope it is
  /// discarded, unless the container was built with `strict_singletons`, in
  /// which case this fails with `SingletonOverload`.
  pub fn bind_singleton(&self, id: impl Into<Key>, definition: impl Into<Definition>) -> Result<()> {
    self.register(id.into(), definition.into(), true, BindMode::from_options(self.options()))
  }

  /// Like [`Container::bind_singleton`] with an explicit overload policy.
  pub fn bind_singleton_with(
    &self,
    id: impl Into<Key>,
    definition: impl Into<Definition>,
    force: bool,
  ) -> Result<()> {
    let mode = BindMode {
      force,
      ..BindMode::from_options(self.options())
    };
    self.register(id.into(), definition.into(), true, mode)
  }

  /// Rebinds `id` with explicit intent: never a `DuplicateBinding`, and a
  /// constructed singleton is always discarded.
  pub fn replace(&self, id: impl Into<Key>, definition: impl Into<Definition>, singleton: bool) -> Result<()> {
    let mode = BindMode {
      replace: true,
      force: true,
    };
    self.register(id.into(), definition.into(), singleton, mode)
  }

  fn register(&self, id: Key, definition: Definition, singleton: bool, mode: BindMode) -> Result<()> {
    let frame = self.current_frame();
    bind_in(&frame, self.options(), id, Binding::new(definition, singleton), mode)
  }

  /// Removes the binding and any cached instance of `id` from the current scope.
  pub fn remove_binding(&self, id: impl Into<Key>) -> bool {
    remove_in(&self.current_frame(), &id.into())
  }

  /// `true` if `id` is bound locally in the current scope.
  pub fn has_binding(&self, id: impl Into<Key>) -> bool {
    self.current_frame().bindings.contains_key(&id.into())
  }

  /// `true` if `id` can be resolved from the current scope chain.
  pub fn has(&self, id: impl Into<Key>) -> bool {
    let id = id.into();
    self.injectors().contains(&id) || self.locate(&self.current_frame(), &id).is_some()
  }

  /// `true` if a value for `id` exists without constructing anything,
  /// following aliases.
  pub fn has_instance(&self, id: impl Into<Key>) -> bool {
    self.peek_in(&self.current_frame(), &id.into()).is_some()
  }

  /// Named-scope defaults for every future scope called `scope`.
  pub fn scope_binder(&self, scope: impl Into<String>) -> ScopeBinder<'_> {
    ScopeBinder::new(self, scope.into())
  }

  // --- Injectors ---

  /// Registers a custom construction strategy for `T`.
  pub fn bind_injector<T: ?Sized + Any + Send + Sync>(&self, injector: impl Injector + 'static) {
    self.shared.injectors.bind::<T>(Arc::new(injector));
  }

  /// Registers a closure as the injector for `T`.
  ///
  /// The closure receives the requesting site's context hint, if any.
  pub fn bind_injector_fn<T, F>(&self, injector: F)
  where
    T: ?Sized + Any + Send + Sync,
    F: Fn(&Container, Option<&str>) -> Result<Arc<T>> + Send + Sync + 'static,
  {
    self.bind_injector::<T>(FnInjector::<T, F>::new(injector));
  }

  pub fn remove_injector<T: ?Sized + Any>(&self) -> bool {
    self.shared.injectors.remove(&Key::of::<T>())
  }

  pub fn has_injector<T: ?Sized + Any>(&self) -> bool {
    self.shared.injectors.contains(&Key::of::<T>())
  }

  // --- Inflectors ---

  /// Registers a hook run on every instance of `T` the container builds from
  /// a class, right after construction. The hook may return a replacement.
  ///
  /// Inflectors for the same type run in registration order.
  pub fn inflect<T, F>(&self, inflector: F)
  where
    T: ?Sized + Any + Send + Sync,
    F: Fn(&Container, Arc<T>) -> Result<Arc<T>> + Send + Sync + 'static,
  {
    self.shared.inflectors.add::<T, F>(inflector);
  }

  // --- Tags ---

  pub fn tag<I, K>(&self, tag: &str, ids: I)
  where
    I: IntoIterator<Item = K>,
    K: Into<Key>,
  {
    self.shared.tags.tag(tag, ids.into_iter().map(Into::into));
  }

  pub fn untag(&self, tag: &str, id: impl Into<Key>) -> bool {
    self.shared.tags.untag(tag, &id.into())
  }

  /// Resolves every id tagged with `tag`, in registration order.
  pub fn get_tagged(&self, tag: &str) -> Result<Vec<Value>> {
    let frame = self.current_frame();
    self
      .shared
      .tags
      .ids(tag)
      .iter()
      .map(|id| self.make_in(&frame, id, &Params::new(), None))
      .collect()
  }

  /// Like [`Container::get_tagged`], but only returns values that already
  /// exist; nothing is constructed.
  pub fn peek_tagged(&self, tag: &str) -> Vec<Value> {
    let frame = self.current_frame();
    self
      .shared
      .tags
      .ids(tag)
      .iter()
      .filter_map(|id| self.peek_in(&frame, id))
      .collect()
  }

  // --- Resolution ---

  /// Resolves `id` from the current scope and downcasts it to `T`.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self, id: impl Into<Key>) -> Result<Arc<T>> {
    let id = id.into();
    let value = self.get_value(&id)?;
    downcast(&id, value)
  }

  pub fn get_value(&self, id: impl Into<Key>) -> Result<Value> {
    self.make_in(&self.current_frame(), &id.into(), &Params::new(), None)
  }

  /// Resolves `id`, handing `context` to an injector registered for it.
  pub fn get_with_context<T: ?Sized + Any + Send + Sync>(
    &self,
    id: impl Into<Key>,
    context: &str,
  ) -> Result<Arc<T>> {
    let id = id.into();
    let value = self.make_in(&self.current_frame(), &id, &Params::new(), Some(context))?;
    downcast(&id, value)
  }

  /// Resolves the binding registered under the type's own key.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.get::<T>(Key::of::<T>())
  }

  /// Resolves `id` with explicit arguments.
  ///
  /// Non-empty `params` always produce a fresh value: singleton caches are
  /// neither read nor written.
  pub fn make<T: ?Sized + Any + Send + Sync>(&self, id: impl Into<Key>, params: Params) -> Result<Arc<T>> {
    let id = id.into();
    let value = self.make_value(&id, params)?;
    downcast(&id, value)
  }

  pub fn make_value(&self, id: impl Into<Key>, params: Params) -> Result<Value> {
    self.make_in(&self.current_frame(), &id.into(), &params, None)
  }

  /// Builds `T` from its constructor parameters, or resolves the binding
  /// registered for it.
  pub fn autowire<T: Autowire>(&self) -> Result<Arc<T>> {
    self.autowire_with::<T>(Params::new())
  }

  pub fn autowire_with<T: Autowire>(&self, params: Params) -> Result<Arc<T>> {
    let class = Class::of::<T>();
    let value = self.autowire_in(&self.current_frame(), &class, &params)?;
    downcast(class.key(), value)
  }

  /// A handle resolving `id` from whichever scope is current when it is used.
  pub fn scoped<T: ?Sized + Any + Send + Sync>(&self, id: impl Into<Key>) -> Scoped<T> {
    Scoped::new(self.downgrade(), id.into())
  }

  // --- Scopes ---

  fn open_frame(&self, scope: Scope) -> Result<Arc<ScopeFrame>> {
    let parent = self.current_frame();
    let (name, bindings) = scope.into_parts();
    if let Some(name) = &name {
      if parent.find_named(name).is_some() {
        return Err(ScopeError::NamedScopeDuplication { name: name.clone() }.into());
      }
    }

    let frame = ScopeFrame::child(&parent, name);
    let mode = BindMode {
      replace: true,
      force: true,
    };
    for (id, binding) in bindings {
      bind_in(&frame, self.options(), id, binding, mode)?;
    }
    Ok(frame)
  }

  /// Runs `body` inside a new scope nested in the current one.
  ///
  /// The scope is popped on every exit path, including a panic in `body`.
  /// Finalizers registered in the scope run when it closes; their failures
  /// are reported as `ContainerError::Finalizers`.
  pub fn run_scope<R>(&self, scope: Scope, body: impl FnOnce(&Container) -> R) -> Result<R> {
    let frame = self.open_frame(scope)?;
    let name = frame.name.clone();
    let guard = ScopeGuard::push(frame);
    let output = body(self);
    finish(name, guard.close(), output)
  }

  /// Async counterpart of [`Container::run_scope`].
  ///
  /// The scope is current for the task polling the returned future, even as
  /// it moves between worker threads.
  #[cfg(feature = "tokio")]
  pub async fn run_scope_async<F, Fut>(&self, scope: Scope, body: F) -> Result<Fut::Output>
  where
    F: FnOnce(Container) -> Fut,
    Fut: std::future::Future,
  {
    let frame = self.open_frame(scope)?;
    let output = crate::scope::with_task_frame(frame.clone(), body(self.clone())).await;
    finish(frame.name.clone(), frame.finalize(), output)
  }

  /// Where resolution currently starts.
  pub fn current_scope(&self) -> ScopeInfo {
    ScopeInfo::of(&self.current_frame())
  }

  /// Fails with `NoActiveScope` unless a scope named `name` is active.
  pub fn ensure_scope(&self, name: &str) -> Result<ScopeInfo> {
    let frame = self.current_frame();
    if frame.find_named(name).is_none() {
      return Err(
        ScopeError::NoActiveScope {
          required: name.to_owned(),
          available: frame.chain_names(),
        }
        .into(),
      );
    }
    Ok(ScopeInfo::of(&frame))
  }
}

fn finish<R>(scope: Option<String>, errors: Vec<crate::error::BoxError>, output: R) -> Result<R> {
  if errors.is_empty() {
    Ok(output)
  } else {
    Err(ContainerError::Finalizers { scope, errors })
  }
}

fn downcast<T: ?Sized + Any + Send + Sync>(id: &Key, value: Value) -> Result<Arc<T>> {
  value.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
    id: id.clone(),
    expected: type_name::<T>(),
    actual: value.type_name(),
  })
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.shared.id)
      .field("root_bindings", &self.shared.root.bindings.len())
      .field("injectors", &self.shared.injectors)
      .field("inflectors", &self.shared.inflectors.len())
      .field("options", &self.shared.options)
      .finish_non_exhaustive()
  }
}
