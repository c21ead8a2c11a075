use pretty_assertions::assert_eq;
use weave_ioc::{Container, ContainerError, Definition, Scope, Value};

fn strings(values: Vec<Value>) -> Vec<String> {
  values
    .into_iter()
    .map(|value| (*value.downcast::<String>().unwrap()).clone())
    .collect()
}

fn named(value: &'static str) -> Definition {
  Definition::factory(value, move |_| Ok(value.to_string()))
}

#[test]
fn test_get_tagged_resolves_in_registration_order() {
  // Arrange
  let container = Container::new();
  container.bind("b", named("b")).unwrap();
  container.bind("a", named("a")).unwrap();
  container.bind("c", named("c")).unwrap();
  container.tag("handlers", ["b", "a"]);
  container.tag("handlers", ["c", "a"]);

  // Act
  let resolved = container.get_tagged("handlers").unwrap();

  // Assert
  assert_eq!(strings(resolved), vec!["b", "a", "c"]);
  assert!(container.get_tagged("unknown").unwrap().is_empty());
}

#[test]
fn test_peek_tagged_never_constructs() {
  // Arrange
  let container = Container::new();
  container.bind_singleton("lazy", named("lazy")).unwrap();
  container.bind_singleton("eager", named("eager")).unwrap();
  container.bind("fixed", Definition::instance(String::from("fixed"))).unwrap();
  container.tag("all", ["lazy", "eager", "fixed"]);
  container.get::<String>("eager").unwrap();

  // Act
  let peeked = container.peek_tagged("all");

  // Assert
  assert_eq!(strings(peeked), vec!["eager", "fixed"]);
  assert!(!container.has_instance("lazy"));
}

#[test]
fn test_tagged_missing_binding_fails() {
  // Arrange
  let container = Container::new();
  container.tag("broken", ["nowhere"]);

  // Act & Assert
  assert!(matches!(
    container.get_tagged("broken"),
    Err(ContainerError::NotFound { .. })
  ));
  assert!(container.peek_tagged("broken").is_empty());
}

#[test]
fn test_tagged_resolution_uses_current_scope() {
  // Arrange
  let container = Container::new();
  container.bind("greeting", named("hello")).unwrap();
  container.tag("text", ["greeting"]);

  // Act
  let scoped = container
    .run_scope(Scope::new().bind("greeting", named("hi")), |c| c.get_tagged("text"))
    .unwrap()
    .unwrap();

  // Assert
  assert_eq!(strings(scoped), vec!["hi"]);
}

#[test]
fn test_untag_removes_id() {
  // Arrange
  let container = Container::new();
  container.bind("a", named("a")).unwrap();
  container.bind("b", named("b")).unwrap();
  container.tag("t", ["a", "b"]);

  // Act
  assert!(container.untag("t", "a"));

  // Assert
  assert_eq!(strings(container.get_tagged("t").unwrap()), vec!["b"]);
}
