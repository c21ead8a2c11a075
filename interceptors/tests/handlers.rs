use std::sync::Arc;

use weave_interceptors::{
  CallContext, Handler, InterceptorError, InvokerHandler, PipelineBuilder, Target, TargetRegistry, TracingInterceptor,
};
use weave_ioc::{Callable, Container, ContainerError, Definition, Key, Parameter};

// --- Fixtures ---

struct UserRepository {
  prefix: &'static str,
}

fn container() -> Container {
  let container = Container::new();
  container
    .bind_singleton(
      Key::of::<UserRepository>(),
      Definition::instance(UserRepository { prefix: "user" }),
    )
    .unwrap();
  container
}

fn show_user() -> Callable {
  Callable::new(
    "show_user",
    vec![
      Parameter::service::<UserRepository>("users"),
      Parameter::untyped("id"),
    ],
    |_, args| {
      let users = args.get::<UserRepository>("users")?;
      let id = args.cloned::<u32>("id")?;
      Ok(format!("{}#{}", users.prefix, id))
    },
  )
}

fn text(value: weave_ioc::Value) -> String {
  (*value.downcast::<String>().unwrap()).clone()
}

// --- InvokerHandler ---

#[test]
fn test_invoker_resolves_target_parameters() {
  // Arrange
  let handler = InvokerHandler::new(container());
  let context = CallContext::new(Target::from_callable(show_user(), None)).with_argument("id", 7u32);

  // Act
  let value = handler.handle(context).unwrap();

  // Assert
  assert_eq!(text(value), "user#7");
}

#[test]
fn test_invoker_without_callable_is_not_found() {
  // Arrange
  let handler = InvokerHandler::new(container());

  // Act
  let err = handler
    .handle(CallContext::new(Target::from_pair("Users", "show")))
    .unwrap_err();

  // Assert
  assert!(matches!(err, InterceptorError::TargetNotFound { ref target } if target == "Users->show"));
}

#[test]
fn test_invoker_reports_bad_arguments() {
  // Arrange
  let handler = InvokerHandler::new(container());
  let target = Target::from_callable(show_user(), Some(vec!["users".into(), "show".into()]));

  // Act
  let missing = handler.handle(CallContext::new(target.clone())).unwrap_err();
  let mistyped = handler
    .handle(CallContext::new(target).with_argument("id", "seven"))
    .unwrap_err();

  // Assert
  assert!(matches!(missing, InterceptorError::BadArgument { ref target, .. } if target == "users.show"));
  assert!(matches!(mistyped, InterceptorError::BadArgument { .. }));
}

#[test]
fn test_invoker_wraps_other_failures() {
  // Arrange
  let handler = InvokerHandler::new(Container::new());
  let failing = Callable::new("explode", Vec::new(), |_, _| -> weave_ioc::Result<()> {
    Err(ContainerError::construction("explode", "boom"))
  });

  // Act
  let err = handler
    .handle(CallContext::new(Target::from_callable(failing, None)))
    .unwrap_err();

  // Assert
  match err {
    InterceptorError::TargetCall { target, source } => {
      assert_eq!(target, "explode");
      assert!(source.to_string().contains("boom"));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_invoker_nested_dependency_failure_is_target_call() {
  // Arrange
  let container = container();
  container
    .bind(
      "report",
      Callable::new("render_report", vec![Parameter::untyped("title")], |_, args| {
        args.cloned::<String>("title")
      }),
    )
    .unwrap();
  let handler = InvokerHandler::new(container);
  let export = Callable::new("export", vec![Parameter::untyped("format")], |c, _| {
    c.get::<String>("report")
  });
  let context = CallContext::new(Target::from_callable(export, None)).with_argument("format", "csv");

  // Act
  let err = handler.handle(context).unwrap_err();

  // Assert
  match err {
    InterceptorError::TargetCall { target, source } => {
      assert_eq!(target, "export");
      assert!(source.to_string().contains("render_report"));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_invoker_missing_own_parameter_is_bad_argument() {
  // Arrange
  let handler = InvokerHandler::new(container());
  let export = Callable::new("export", vec![Parameter::untyped("format")], |_, args| {
    args.cloned::<String>("format")
  });

  // Act
  let err = handler
    .handle(CallContext::new(Target::from_callable(export, None)))
    .unwrap_err();

  // Assert
  assert!(matches!(err, InterceptorError::BadArgument { ref target, .. } if target == "export"));
}

// --- TargetRegistry ---

#[test]
fn test_registry_locates_targets_by_path() {
  // Arrange
  let registry = TargetRegistry::new(container());
  registry.register("users.show", show_user());

  // Act
  let value = registry
    .handle(CallContext::new(Target::from_path_string("users.show")).with_argument("id", 3u32))
    .unwrap();

  // Assert
  assert!(registry.contains("users.show"));
  assert_eq!(text(value), "user#3");
}

#[test]
fn test_registry_unknown_target_is_not_found() {
  // Arrange
  let registry = TargetRegistry::new(container());

  // Act
  let err = registry
    .handle(CallContext::new(Target::from_path_string("users.delete")))
    .unwrap_err();

  // Assert
  assert_eq!(err.to_string(), "Target `users.delete` not found");
}

#[test]
fn test_registry_falls_back_to_attached_callable() {
  // Arrange
  let registry = TargetRegistry::new(container());
  let target = Target::from_callable(show_user(), None);

  // Act
  let value = registry
    .handle(CallContext::new(target).with_argument("id", 1u32))
    .unwrap();

  // Assert
  assert_eq!(text(value), "user#1");
}

#[test]
fn test_pipeline_over_registry() {
  // Arrange
  let registry = Arc::new(TargetRegistry::new(container()));
  registry.register("Users->show", show_user());
  let pipeline = PipelineBuilder::new()
    .with_interceptor(TracingInterceptor)
    .build(registry.clone());

  // Act
  let value = pipeline
    .handle(CallContext::new(Target::from_pair("Users", "show")).with_argument("id", 42u32))
    .unwrap();

  // Assert
  assert_eq!(text(value), "user#42");
  assert!(registry.remove("Users->show"));
}
