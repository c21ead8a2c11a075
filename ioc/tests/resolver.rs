use std::sync::Arc;

use pretty_assertions::assert_eq;
use weave_ioc::{
  params, Arguments, Autowire, Callable, Container, ContainerError, Definition, Key, Parameter, Params, Result,
};

// --- Fixtures ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Level(u32);

struct Engine;

impl Autowire for Engine {
  fn parameters() -> Vec<Parameter> {
    Vec::new()
  }

  fn construct(_: Arguments) -> Result<Self> {
    Ok(Engine)
  }
}

fn level_probe(parameter: Parameter) -> Callable {
  Callable::new("probe", vec![parameter], |_, args| {
    Ok(args.optional::<Level>("level")?.map(|level| level.0))
  })
}

fn run(container: &Container, callable: &Callable, params: Params) -> Result<Option<u32>> {
  let value = container.invoke(callable, params)?;
  Ok(*value.downcast::<Option<u32>>().unwrap())
}

fn bind_level(container: &Container, level: u32) {
  container
    .bind(Key::of::<Level>(), Definition::instance(Level(level)))
    .unwrap();
}

// --- Precedence ---

#[test]
fn test_explicit_argument_wins_over_everything() {
  // Arrange
  let container = Container::new();
  container.bind_injector_fn::<Level, _>(|_, _| Ok(Arc::new(Level(5))));
  bind_level(&container, 3);
  let probe = level_probe(Parameter::service::<Level>("level").with_default(Level(1)));

  // Act
  let level = run(&container, &probe, params! { "level" => Level(9) }).unwrap();

  // Assert
  assert_eq!(level, Some(9));
}

#[test]
fn test_injector_wins_over_binding() {
  // Arrange
  let container = Container::new();
  container.bind_injector_fn::<Level, _>(|_, _| Ok(Arc::new(Level(5))));
  bind_level(&container, 3);
  let probe = level_probe(Parameter::service::<Level>("level"));

  // Act & Assert
  assert_eq!(run(&container, &probe, Params::new()).unwrap(), Some(5));
}

#[test]
fn test_binding_wins_over_default() {
  // Arrange
  let container = Container::new();
  bind_level(&container, 3);
  let probe = level_probe(Parameter::service::<Level>("level").with_default(Level(1)));

  // Act & Assert
  assert_eq!(run(&container, &probe, Params::new()).unwrap(), Some(3));
}

#[test]
fn test_default_used_without_binding() {
  // Arrange
  let container = Container::new();
  let probe = level_probe(Parameter::service::<Level>("level").with_default(Level(1)));

  // Act & Assert
  assert_eq!(run(&container, &probe, Params::new()).unwrap(), Some(1));
}

#[test]
fn test_nullable_resolves_to_nothing() {
  // Arrange
  let container = Container::new();
  let probe = level_probe(Parameter::service::<Level>("level").nullable());

  // Act & Assert
  assert_eq!(run(&container, &probe, Params::new()).unwrap(), None);
}

#[test]
fn test_constructible_parameter_is_autowired() {
  // Arrange
  let container = Container::new();
  let callable = Callable::new("uses_engine", vec![Parameter::class::<Engine>("engine")], |_, args| {
    args.get::<Engine>("engine").map(|_| true)
  });

  // Act
  let value = container.invoke(&callable, Params::new()).unwrap();

  // Assert
  assert!(*value.downcast::<bool>().unwrap());
}

#[test]
fn test_unresolvable_parameter_names_parameter_and_owner() {
  // Arrange
  let container = Container::new();
  let probe = level_probe(Parameter::service::<Level>("level"));

  // Act
  let err = run(&container, &probe, Params::new()).unwrap_err();

  // Assert
  match err {
    ContainerError::Dependency { parameter, owner, .. } => {
      assert_eq!(parameter, "level");
      assert_eq!(owner, "probe");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_untyped_parameter_needs_explicit_value() {
  // Arrange
  let container = Container::new();
  let callable = Callable::new("echo", vec![Parameter::untyped("text")], |_, args| {
    args.cloned::<String>("text")
  });

  // Act
  let missing = container.invoke(&callable, Params::new()).unwrap_err();
  let echoed = container
    .invoke(&callable, params! { "text" => String::from("hi") })
    .unwrap();

  // Assert
  assert!(matches!(missing, ContainerError::Dependency { .. }));
  assert_eq!(*echoed.downcast::<String>().unwrap(), "hi");
}

#[test]
fn test_explicit_values_are_not_coerced() {
  // Arrange
  let container = Container::new();
  let probe = level_probe(Parameter::service::<Level>("level"));

  // Act
  let err = run(&container, &probe, params! { "level" => 9u32 }).unwrap_err();

  // Assert
  match err {
    ContainerError::Argument { parameter, expected, actual, .. } => {
      assert_eq!(parameter, "level");
      assert_eq!(expected, std::any::type_name::<Level>());
      assert_eq!(actual, "u32");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_resolve_arguments_keeps_declaration_order() {
  // Arrange
  let container = Container::new();
  bind_level(&container, 3);
  let parameters = vec![
    Parameter::untyped("first"),
    Parameter::service::<Level>("level"),
    Parameter::untyped("last").with_default(0u8),
  ];

  // Act
  let args = container
    .resolve_arguments("ordered", &parameters, &params! { "first" => 'a' })
    .unwrap();

  // Assert
  let names: Vec<&str> = args.iter().map(|(name, _)| name).collect();
  assert_eq!(names, vec!["first", "level", "last"]);
  assert_eq!(args.owner(), "ordered");
  assert_eq!(*args.at::<char>(0).unwrap(), 'a');
  assert_eq!(*args.get::<Level>("level").unwrap(), Level(3));
  assert_eq!(*args.get::<u8>("last").unwrap(), 0);
}

#[test]
fn test_factory_parameters_are_resolved() {
  // Arrange
  let container = Container::new();
  bind_level(&container, 4);
  container
    .bind(
      "doubled",
      Callable::new("doubled", vec![Parameter::service::<Level>("level")], |_, args| {
        Ok(args.get::<Level>("level")?.0 * 2)
      }),
    )
    .unwrap();

  // Act & Assert
  assert_eq!(*container.get::<u32>("doubled").unwrap(), 8);
  assert_eq!(
    *container
      .make::<u32>("doubled", params! { "level" => Level(10) })
      .unwrap(),
    20
  );
}
