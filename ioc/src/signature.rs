//! Parameter metadata, explicit and resolved argument lists, and the two kinds
//! of targets the resolver can call: constructible classes and callables.
//!
//! There is no runtime reflection here. A type describes its own constructor
//! by implementing [`Autowire`]; a free function or closure is described by a
//! [`Callable`]. Both hand the resolver an ordered list of [`Parameter`]s.

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::core::{Key, Value};
use crate::error::{BoxError, ContainerError, Result};

/// Cleanup hook captured when an autowired instance is created.
pub(crate) type Finalizer = Box<dyn FnOnce() -> std::result::Result<(), BoxError> + Send>;

/// A type the container can build by resolving its constructor parameters.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use weave_ioc::{Arguments, Autowire, Container, Definition, Key, Parameter, Result};
///
/// struct Config {
///   url: String,
/// }
///
/// struct Database {
///   config: Arc<Config>,
///   pool_size: u32,
/// }
///
/// impl Autowire for Database {
///   fn parameters() -> Vec<Parameter> {
///     vec![
///       Parameter::service::<Config>("config"),
///       Parameter::untyped("pool_size").with_default(4u32),
///     ]
///   }
///
///   fn construct(args: Arguments) -> Result<Self> {
///     Ok(Database {
///       config: args.get("config")?,
///       pool_size: args.cloned("pool_size")?,
///     })
///   }
/// }
///
/// let container = Container::new();
/// let config = Config { url: "postgres://localhost".into() };
/// container.bind_singleton(Key::of::<Config>(), Definition::instance(config)).unwrap();
///
/// let db = container.autowire::<Database>().unwrap();
/// assert_eq!(db.config.url, "postgres://localhost");
/// assert_eq!(db.pool_size, 4);
/// ```
pub trait Autowire: Any + Send + Sync + Sized {
  /// Constructor parameters in declaration order.
  fn parameters() -> Vec<Parameter>;

  /// Builds the value from resolved arguments.
  fn construct(args: Arguments) -> Result<Self>;

  /// Name of the scope this type may only be built in.
  fn scope() -> Option<&'static str> {
    None
  }

  /// Declarative singleton: autowired instances are cached in the scope that
  /// built them.
  fn singleton() -> bool {
    false
  }

  /// Hook run when the scope that built the instance is closed.
  fn finalizer() -> Option<fn(&Self) -> std::result::Result<(), BoxError>> {
    None
  }
}

/// Declared type of a parameter.
#[derive(Clone)]
pub enum ParamType {
  /// No declared type; only explicit arguments or defaults can satisfy it.
  Untyped,
  /// Resolved through injectors and bindings by key.
  Service(Key),
  /// Like `Service`, but the resolver may also build it from scratch.
  Class(Class),
}

/// Descriptor of one parameter of a constructor or callable.
#[derive(Clone)]
pub struct Parameter {
  name: Cow<'static, str>,
  kind: ParamType,
  default: Option<Value>,
  nullable: bool,
  hint: Option<String>,
}

impl Parameter {
  fn with_kind(name: impl Into<Cow<'static, str>>, kind: ParamType) -> Self {
    Self {
      name: name.into(),
      kind,
      default: None,
      nullable: false,
      hint: None,
    }
  }

  pub fn untyped(name: impl Into<Cow<'static, str>>) -> Self {
    Self::with_kind(name, ParamType::Untyped)
  }

  /// A parameter whose declared type is `T` (concrete or `dyn Trait`).
  pub fn service<T: ?Sized + Any>(name: impl Into<Cow<'static, str>>) -> Self {
    Self::with_kind(name, ParamType::Service(Key::of::<T>()))
  }

  /// A parameter resolved by an arbitrary binding id.
  pub fn keyed(name: impl Into<Cow<'static, str>>, key: impl Into<Key>) -> Self {
    Self::with_kind(name, ParamType::Service(key.into()))
  }

  /// A parameter of a concrete, constructible type.
  pub fn class<T: Autowire>(name: impl Into<Cow<'static, str>>) -> Self {
    Self::with_kind(name, ParamType::Class(Class::of::<T>()))
  }

  pub fn with_default<T: Any + Send + Sync>(self, value: T) -> Self {
    self.with_default_value(Value::new(value))
  }

  pub fn with_default_value(mut self, value: Value) -> Self {
    self.default = Some(value);
    self
  }

  /// Allows the parameter to resolve to nothing when no strategy applies.
  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  /// Contextual hint passed to injectors, e.g. a cache channel name.
  pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
    self.hint = Some(hint.into());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> &ParamType {
    &self.kind
  }

  /// The binding id of the declared type, if there is one.
  pub fn key(&self) -> Option<&Key> {
    match &self.kind {
      ParamType::Untyped => None,
      ParamType::Service(key) => Some(key),
      ParamType::Class(class) => Some(class.key()),
    }
  }

  pub fn default_value(&self) -> Option<&Value> {
    self.default.as_ref()
  }

  pub fn is_nullable(&self) -> bool {
    self.nullable
  }

  pub fn hint(&self) -> Option<&str> {
    self.hint.as_deref()
  }
}

impl fmt::Debug for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Parameter")
      .field("name", &self.name)
      .field("key", &self.key())
      .field("has_default", &self.default.is_some())
      .field("nullable", &self.nullable)
      .field("hint", &self.hint)
      .finish()
  }
}

/// Explicit arguments, keyed by parameter name.
///
/// Explicit values are passed through verbatim; they are never coerced.
#[derive(Clone, Default)]
pub struct Params {
  values: HashMap<String, Value>,
}

impl Params {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
    self.insert(name, value);
    self
  }

  pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
    self.insert_value(name, value);
    self
  }

  pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
    self.insert_value(name, Value::new(value));
  }

  pub fn insert_value(&mut self, name: impl Into<String>, value: Value) {
    self.values.insert(name.into(), value);
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.values.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(name, value)| (name.as_str(), value))
  }
}

impl fmt::Debug for Params {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.values.iter()).finish()
  }
}

impl FromIterator<(String, Value)> for Params {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Self {
      values: iter.into_iter().collect(),
    }
  }
}

/// The fully-resolved, ordered argument list of one call.
pub struct Arguments {
  owner: String,
  entries: Vec<(String, Option<Value>)>,
}

impl Arguments {
  pub(crate) fn new(owner: impl Into<String>) -> Self {
    Self {
      owner: owner.into(),
      entries: Vec::new(),
    }
  }

  pub(crate) fn push(&mut self, name: &str, value: Option<Value>) {
    self.entries.push((name.to_owned(), value));
  }

  /// Name of the constructor or callable these arguments belong to.
  pub fn owner(&self) -> &str {
    &self.owner
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Raw value of a parameter; `None` when absent or resolved to nothing.
  pub fn value(&self, name: &str) -> Option<&Value> {
    self
      .entries
      .iter()
      .find(|(entry, _)| entry == name)
      .and_then(|(_, value)| value.as_ref())
  }

  /// Typed access to a required argument.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self
      .optional::<T>(name)?
      .ok_or_else(|| self.dependency(name, "resolved to nothing"))
  }

  /// Typed access to a nullable argument.
  pub fn optional<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
    let (_, slot) = self
      .entries
      .iter()
      .find(|(entry, _)| entry == name)
      .ok_or_else(|| self.dependency(name, "not declared"))?;

    match slot {
      None => Ok(None),
      Some(value) => value.downcast::<T>().map(Some).ok_or_else(|| ContainerError::Argument {
        parameter: name.to_owned(),
        owner: self.owner.clone(),
        expected: type_name::<T>(),
        actual: value.type_name(),
      }),
    }
  }

  /// Typed access to a required argument by position.
  pub fn at<T: ?Sized + Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    let name = self
      .entries
      .get(index)
      .map(|(name, _)| name.clone())
      .ok_or_else(|| self.dependency(&format!("#{index}"), "not declared"))?;
    self.get(&name)
  }

  /// Clones a required argument out of its `Arc`; handy for scalars.
  pub fn cloned<T: Any + Send + Sync + Clone>(&self, name: &str) -> Result<T> {
    self.get::<T>(name).map(|value| (*value).clone())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
    self
      .entries
      .iter()
      .map(|(name, value)| (name.as_str(), value.as_ref()))
  }

  pub fn into_values(self) -> Vec<Option<Value>> {
    self.entries.into_iter().map(|(_, value)| value).collect()
  }

  fn dependency(&self, name: &str, reason: &str) -> ContainerError {
    ContainerError::Dependency {
      parameter: name.to_owned(),
      owner: self.owner.clone(),
      reason: reason.to_owned(),
    }
  }
}

impl fmt::Debug for Arguments {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Arguments")
      .field("owner", &self.owner)
      .field("entries", &self.entries)
      .finish()
  }
}

pub(crate) struct Built {
  pub(crate) value: Value,
  pub(crate) finalizer: Option<Finalizer>,
}

type BuildFn = dyn Fn(Arguments) -> Result<Built> + Send + Sync;

struct ClassInner {
  key: Key,
  type_name: &'static str,
  value_type: &'static str,
  parameters: fn() -> Vec<Parameter>,
  build: Box<BuildFn>,
  scope: Option<&'static str>,
  singleton: bool,
}

/// A constructible type, captured from its [`Autowire`] implementation.
#[derive(Clone)]
pub struct Class {
  inner: Arc<ClassInner>,
}

impl Class {
  pub fn of<T: Autowire>() -> Self {
    Self::as_trait::<T, T>(|instance| instance)
  }

  /// Builds `T` but hands it out as `I`, typically `dyn Trait`.
  pub fn as_trait<T, I>(cast: fn(Arc<T>) -> Arc<I>) -> Self
  where
    T: Autowire,
    I: ?Sized + Any + Send + Sync,
  {
    let build = move |args: Arguments| -> Result<Built> {
      let instance = Arc::new(T::construct(args)?);
      let finalizer = T::finalizer().map(|finalize| {
        let held = instance.clone();
        Box::new(move || finalize(&held)) as Finalizer
      });
      Ok(Built {
        value: Value::from_arc(cast(instance)),
        finalizer,
      })
    };

    Self {
      inner: Arc::new(ClassInner {
        key: Key::of::<T>(),
        type_name: type_name::<T>(),
        value_type: type_name::<I>(),
        parameters: T::parameters,
        build: Box::new(build),
        scope: T::scope(),
        singleton: T::singleton(),
      }),
    }
  }

  pub fn key(&self) -> &Key {
    &self.inner.key
  }

  pub fn type_name(&self) -> &'static str {
    self.inner.type_name
  }

  /// The type the built value is exposed as.
  pub fn value_type(&self) -> &'static str {
    self.inner.value_type
  }

  pub fn parameters(&self) -> Vec<Parameter> {
    (self.inner.parameters)()
  }

  pub fn scope(&self) -> Option<&'static str> {
    self.inner.scope
  }

  pub fn is_singleton(&self) -> bool {
    self.inner.singleton
  }

  pub(crate) fn build(&self, args: Arguments) -> Result<Built> {
    (self.inner.build)(args)
  }
}

impl fmt::Debug for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Class")
      .field("type", &self.inner.type_name)
      .field("as", &self.inner.value_type)
      .field("scope", &self.inner.scope)
      .field("singleton", &self.inner.singleton)
      .finish()
  }
}

type CallFn = dyn Fn(&Container, Arguments) -> Result<Value> + Send + Sync;

struct CallableInner {
  name: Cow<'static, str>,
  parameters: Vec<Parameter>,
  body: Box<CallFn>,
}

/// A function with a declared signature that the container can invoke.
///
/// The body receives the container explicitly together with the resolved
/// arguments.
#[derive(Clone)]
pub struct Callable {
  inner: Arc<CallableInner>,
}

impl Callable {
  pub fn new<T, F>(name: impl Into<Cow<'static, str>>, parameters: Vec<Parameter>, body: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Container, Arguments) -> Result<T> + Send + Sync + 'static,
  {
    Self::raw(name, parameters, move |container, args| {
      body(container, args).map(Value::new)
    })
  }

  /// Like [`Callable::new`], but the body produces the [`Value`] itself,
  /// which allows returning trait objects or already-shared instances.
  pub fn raw<F>(name: impl Into<Cow<'static, str>>, parameters: Vec<Parameter>, body: F) -> Self
  where
    F: Fn(&Container, Arguments) -> Result<Value> + Send + Sync + 'static,
  {
    Self {
      inner: Arc::new(CallableInner {
        name: name.into(),
        parameters,
        body: Box::new(body),
      }),
    }
  }

  /// A callable without parameters.
  pub fn from_fn<T, F>(name: impl Into<Cow<'static, str>>, body: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    Self::new(name, Vec::new(), move |container, _| body(container))
  }

  pub fn name(&self) -> &str {
    &self.inner.name
  }

  pub fn parameters(&self) -> &[Parameter] {
    &self.inner.parameters
  }

  /// Runs the body with already resolved arguments, see
  /// [`Container::resolve_arguments`].
  pub fn call(&self, container: &Container, args: Arguments) -> Result<Value> {
    (self.inner.body)(container, args)
  }
}

impl fmt::Debug for Callable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Callable")
      .field("name", &self.inner.name)
      .field("parameters", &self.inner.parameters)
      .finish()
  }
}
