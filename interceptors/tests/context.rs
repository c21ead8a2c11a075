use pretty_assertions::assert_eq;
use weave_interceptors::{CallContext, Target};
use weave_ioc::{Callable, Params};

#[test]
fn test_with_path_leaves_original_untouched() {
  // Arrange
  let target = Target::from_path_string("foo.bar.baz");

  // Act
  let changed = target.with_path(["bar", "baz"]);

  // Assert
  assert_eq!(changed.path(), ["bar", "baz"]);
  assert_eq!(changed.to_string(), "bar.baz");
  assert_eq!(target.path(), ["foo", "bar", "baz"]);
  assert_eq!(target.to_string(), "foo.bar.baz");
}

#[test]
fn test_path_array_and_string_agree() {
  let cases: [(&[&str], &str); 4] = [
    (&["Foo", "Bar", "baz"], "."),
    (&["Foo", "Bar", "baz", "fiz.baz"], "/"),
    (&["Foo"], " "),
    (&["Foo", "", ""], "-"),
  ];

  for (chunks, delimiter) in cases {
    let joined = chunks.join(delimiter);
    let from_string = Target::from_path_string_with(&joined, delimiter);
    let from_array = Target::from_path_array(chunks.iter().copied(), delimiter);

    assert_eq!(from_string.path(), chunks);
    assert_eq!(from_array.path(), chunks);
    assert_eq!(from_string.to_string(), joined);
    assert_eq!(from_array.to_string(), joined);
  }
}

#[test]
fn test_pair_uses_arrow_delimiter() {
  let target = Target::from_pair("UserController", "show");

  assert_eq!(target.path(), ["UserController", "show"]);
  assert_eq!(target.to_string(), "UserController->show");
  assert!(target.callable().is_none());
}

#[test]
fn test_callable_target_defaults_to_callable_name() {
  let callable = Callable::from_fn("reports.daily", |_| Ok(()));

  let target = Target::from_callable(callable, None);

  assert_eq!(target.to_string(), "reports.daily");
  assert_eq!(target.callable().map(Callable::name), Some("reports.daily"));
}

#[test]
fn test_context_mutators_return_new_values() {
  // Arrange
  let original = CallContext::new(Target::from_path_string("a.b"));

  // Act
  let with_attr = original.with_attribute("user", String::from("admin"));
  let with_arg = with_attr.with_argument("id", 5u32);
  let retargeted = with_arg.with_target(Target::from_pair("C", "d"));
  let stripped = retargeted.without_attribute("user");

  // Assert
  assert!(original.attribute_value("user").is_none());
  assert!(original.arguments().is_empty());
  assert_eq!(*with_attr.attribute::<String>("user").unwrap(), "admin");
  assert!(with_attr.arguments().is_empty());
  assert!(with_arg.arguments().contains("id"));
  assert_eq!(with_arg.target().to_string(), "a.b");
  assert_eq!(retargeted.target().to_string(), "C->d");
  assert!(retargeted.attribute_value("user").is_some());
  assert!(stripped.attribute_value("user").is_none());
}

#[test]
fn test_typed_attribute_access_checks_type() {
  let context = CallContext::new(Target::from_path_string("x")).with_attribute("count", 3u64);

  assert_eq!(context.attribute::<u64>("count").map(|v| *v), Some(3));
  assert!(context.attribute::<u32>("count").is_none());
  assert!(context.attribute::<u64>("missing").is_none());
  assert!(context.deadline().is_none());
}

#[test]
fn test_with_arguments_replaces_all() {
  let context = CallContext::new(Target::from_path_string("x"))
    .with_argument("a", 1u8)
    .with_arguments(Params::new().with("b", 2u8));

  assert!(!context.arguments().contains("a"));
  assert!(context.arguments().contains("b"));
}
