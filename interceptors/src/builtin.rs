//! Interceptors for common cross-cutting concerns.

use std::time::Instant;

use weave_ioc::Value;

use crate::context::CallContext;
use crate::error::{InterceptorError, Result};
use crate::interceptor::{Handler, Interceptor};

/// Opens a `tracing` span around every call and records how it ended.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
  fn intercept(&self, context: CallContext, next: &dyn Handler) -> Result<Value> {
    let span = tracing::debug_span!("call", path = %context.target());
    let _entered = span.enter();
    let started = Instant::now();

    let outcome = next.handle(context);
    match &outcome {
      Ok(value) => tracing::debug!(
        elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        returned = value.type_name(),
        "call completed"
      ),
      Err(err) => tracing::debug!(
        elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        error = %err,
        "call failed"
      ),
    }
    outcome
  }
}

/// Refuses to continue a call whose context deadline has already passed.
///
/// Calls without a deadline pass through. The check happens once, before
/// `next` runs; a call already in progress is never interrupted.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeadlineInterceptor;

impl Interceptor for DeadlineInterceptor {
  fn intercept(&self, context: CallContext, next: &dyn Handler) -> Result<Value> {
    match context.deadline() {
      Some(deadline) if Instant::now() >= deadline => Err(InterceptorError::DeadlineExceeded {
        target: context.target().to_string(),
      }),
      _ => next.handle(context),
    }
  }
}
