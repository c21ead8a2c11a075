use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use weave_interceptors::{
  handler_fn, interceptor_fn, CallContext, DeadlineInterceptor, Handler, Interceptor, InterceptorError,
  PipelineBuilder, Result, Target, TracingInterceptor,
};
use weave_ioc::Value;

// --- Fixtures ---

type Journal = Arc<Mutex<Vec<String>>>;

/// Records entry and exit around the rest of the chain.
struct Recorder {
  name: &'static str,
  journal: Journal,
}

impl Interceptor for Recorder {
  fn intercept(&self, context: CallContext, next: &dyn Handler) -> Result<Value> {
    self.journal.lock().push(format!("{}-enter", self.name));
    let outcome = next.handle(context);
    self.journal.lock().push(format!("{}-exit", self.name));
    outcome
  }
}

/// Rejects calls without a `user` attribute.
struct Auth {
  journal: Journal,
}

impl Interceptor for Auth {
  fn intercept(&self, context: CallContext, next: &dyn Handler) -> Result<Value> {
    if context.attribute::<String>("user").is_none() {
      self.journal.lock().push("Auth-denied".into());
      return Err(InterceptorError::Forbidden {
        target: context.target().to_string(),
        reason: "anonymous".into(),
      });
    }
    self.journal.lock().push("Auth-enter".into());
    let outcome = next.handle(context);
    self.journal.lock().push("Auth-exit".into());
    outcome
  }
}

fn terminal(journal: &Journal) -> impl Handler + 'static {
  let journal = journal.clone();
  handler_fn(move |context: CallContext| {
    journal.lock().push("H".into());
    Ok(Value::new(context.target().to_string()))
  })
}

fn call(target: &str) -> CallContext {
  CallContext::new(Target::from_path_string(target))
}

fn logger(journal: &Journal) -> Recorder {
  Recorder {
    name: "Logger",
    journal: journal.clone(),
  }
}

// --- Tests ---

#[test]
fn test_first_interceptor_is_outermost() {
  // Arrange
  let journal = Journal::default();
  let pipeline = PipelineBuilder::new()
    .with_interceptor(logger(&journal))
    .with_interceptor(Auth {
      journal: journal.clone(),
    })
    .build(terminal(&journal));

  // Act
  let value = pipeline
    .handle(call("users.show").with_attribute("user", String::from("admin")))
    .unwrap();

  // Assert
  assert_eq!(*value.downcast::<String>().unwrap(), "users.show");
  assert_eq!(
    *journal.lock(),
    vec!["Logger-enter", "Auth-enter", "H", "Auth-exit", "Logger-exit"]
  );
}

#[test]
fn test_with_interceptors_returns_new_builder() {
  // Arrange
  let journal = Journal::default();
  let base = PipelineBuilder::new().with_interceptor(logger(&journal));
  let extended = base.with_interceptors([Arc::new(Recorder {
    name: "Extra",
    journal: journal.clone(),
  }) as Arc<dyn Interceptor>]);

  // Act
  base.build(terminal(&journal)).handle(call("a")).unwrap();

  // Assert
  assert_eq!((base.len(), extended.len()), (1, 2));
  assert_eq!(*journal.lock(), vec!["Logger-enter", "H", "Logger-exit"]);
}

#[test]
fn test_build_runs_nothing() {
  // Arrange
  let touched = Arc::new(AtomicUsize::new(0));
  let counter = touched.clone();
  let builder = PipelineBuilder::new().with_interceptor(interceptor_fn(
    move |context: CallContext, next: &dyn Handler| {
      counter.fetch_add(1, Ordering::SeqCst);
      next.handle(context)
    },
  ));

  // Act
  let pipeline = builder.build(handler_fn(|_: CallContext| Ok(Value::new(()))));

  // Assert
  assert_eq!(touched.load(Ordering::SeqCst), 0);
  assert_eq!(pipeline.depth(), 1);
  pipeline.handle(call("x")).unwrap();
  assert_eq!(touched.load(Ordering::SeqCst), 1);
}

#[test]
fn test_interceptor_can_short_circuit() {
  // Arrange
  let journal = Journal::default();
  let pipeline = PipelineBuilder::new()
    .with_interceptor(logger(&journal))
    .with_interceptor(Auth {
      journal: journal.clone(),
    })
    .build(terminal(&journal));

  // Act
  let err = pipeline.handle(call("admin.panel")).unwrap_err();

  // Assert
  assert!(matches!(err, InterceptorError::Forbidden { ref target, .. } if target == "admin.panel"));
  assert_eq!(
    *journal.lock(),
    vec!["Logger-enter", "Auth-denied", "Logger-exit"]
  );
}

#[test]
fn test_errors_propagate_unmodified() {
  // Arrange
  let journal = Journal::default();
  let pipeline = PipelineBuilder::new()
    .with_interceptor(logger(&journal))
    .with_interceptor(TracingInterceptor)
    .build(handler_fn(|context: CallContext| {
      Err(InterceptorError::BadArgument {
        target: context.target().to_string(),
        reason: "id must be numeric".into(),
      })
    }));

  // Act
  let err = pipeline.handle(call("users.show")).unwrap_err();

  // Assert
  assert_eq!(err.to_string(), "Bad argument for `users.show`: id must be numeric");
  assert_eq!(*journal.lock(), vec!["Logger-enter", "Logger-exit"]);
}

#[test]
fn test_modified_context_only_reaches_inner_handlers() {
  // Arrange
  let seen_outside = Arc::new(Mutex::new(None::<bool>));
  let outer_seen = seen_outside.clone();
  let pipeline = PipelineBuilder::new()
    .with_interceptor(interceptor_fn(move |context: CallContext, next: &dyn Handler| {
      let outcome = next.handle(context.clone());
      *outer_seen.lock() = Some(context.attribute_value("traced").is_some());
      outcome
    }))
    .with_interceptor(interceptor_fn(|context: CallContext, next: &dyn Handler| {
      next.handle(context.with_attribute("traced", true))
    }))
    .build(handler_fn(|context: CallContext| {
      Ok(Value::new(context.attribute::<bool>("traced").map(|flag| *flag)))
    }));

  // Act
  let inner = pipeline.handle(call("x")).unwrap();

  // Assert
  assert_eq!(*inner.downcast::<Option<bool>>().unwrap(), Some(true));
  assert_eq!(*seen_outside.lock(), Some(false));
}

#[test]
fn test_deadline_interceptor_short_circuits_expired_calls() {
  // Arrange
  let journal = Journal::default();
  let pipeline = PipelineBuilder::new()
    .with_interceptor(DeadlineInterceptor)
    .build(terminal(&journal));
  let expired = Instant::now()
    .checked_sub(Duration::from_millis(1))
    .unwrap_or_else(Instant::now);

  // Act
  let late = pipeline.handle(call("slow.job").with_deadline(expired));
  let on_time = pipeline.handle(call("fast.job").with_deadline(Instant::now() + Duration::from_secs(60)));
  let unbounded = pipeline.handle(call("any.job"));

  // Assert
  assert!(matches!(late, Err(InterceptorError::DeadlineExceeded { ref target }) if target == "slow.job"));
  assert!(on_time.is_ok());
  assert!(unbounded.is_ok());
  assert_eq!(*journal.lock(), vec!["H", "H"]);
}

#[test]
fn test_empty_pipeline_is_the_terminal() {
  // Arrange
  let journal = Journal::default();
  let builder = PipelineBuilder::new();

  // Act
  let pipeline = builder.build(terminal(&journal));
  let value = pipeline.handle(call("plain")).unwrap();

  // Assert
  assert!(builder.is_empty());
  assert_eq!(pipeline.depth(), 0);
  assert_eq!(*value.downcast::<String>().unwrap(), "plain");
}

#[test]
fn test_pipeline_is_shareable_across_threads() {
  // Arrange
  let journal = Journal::default();
  let pipeline = PipelineBuilder::new()
    .with_interceptor(TracingInterceptor)
    .build(terminal(&journal));

  // Act
  std::thread::scope(|s| {
    for i in 0..4 {
      let pipeline = pipeline.clone();
      s.spawn(move || pipeline.handle(call(&format!("job.{i}"))).unwrap());
    }
  });

  // Assert
  assert_eq!(journal.lock().len(), 4);
}
