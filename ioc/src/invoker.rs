use crate::container::Container;
use crate::core::Value;
use crate::error::Result;
use crate::signature::{Arguments, Callable, Parameter, Params};

impl Container {
  /// Resolves the full parameter list of `callable` and calls it.
  ///
  /// Argument resolution is the same as for constructors: explicit values
  /// first, then injectors, bindings, defaults and autowiring.
  ///
  /// ```
  /// use weave_ioc::{params, Callable, Container, Definition, Key, Parameter};
  ///
  /// let container = Container::new();
  /// container
  ///   .bind(Key::of::<String>(), Definition::instance(String::from("world")))
  ///   .unwrap();
  ///
  /// let greet = Callable::new(
  ///   "greet",
  ///   vec![Parameter::service::<String>("name"), Parameter::untyped("punctuation")],
  ///   |_, args| Ok(format!("hello {}{}", args.get::<String>("name")?, args.get::<char>("punctuation")?)),
  /// );
  ///
  /// let value = container.invoke(&greet, params! { "punctuation" => '!' }).unwrap();
  /// assert_eq!(*value.downcast::<String>().unwrap(), "hello world!");
  /// ```
  pub fn invoke(&self, callable: &Callable, params: Params) -> Result<Value> {
    let frame = self.current_frame();
    tracing::trace!(callable = callable.name(), scope = frame.display_name(), "invoking");
    let args = self.resolve_in(&frame, callable.name(), callable.parameters(), &params)?;
    callable.call(self, args)
  }

  /// Produces the ordered argument list for a signature without calling
  /// anything.
  pub fn resolve_arguments(&self, owner: &str, parameters: &[Parameter], params: &Params) -> Result<Arguments> {
    self.resolve_in(&self.current_frame(), owner, parameters, params)
  }
}
