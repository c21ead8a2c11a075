use std::sync::Arc;

use weave_ioc::Value;

use crate::context::CallContext;
use crate::error::Result;

/// Performs, or continues, a call.
pub trait Handler: Send + Sync {
  fn handle(&self, context: CallContext) -> Result<Value>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
  fn handle(&self, context: CallContext) -> Result<Value> {
    (**self).handle(context)
  }
}

impl<H: Handler + ?Sized> Handler for &H {
  fn handle(&self, context: CallContext) -> Result<Value> {
    (**self).handle(context)
  }
}

/// Wraps a call.
///
/// An interceptor continues the chain by calling `next.handle` with the
/// original or a derived context. Returning without calling `next`
/// short-circuits everything further in.
pub trait Interceptor: Send + Sync {
  fn intercept(&self, context: CallContext, next: &dyn Handler) -> Result<Value>;
}

impl<I: Interceptor + ?Sized> Interceptor for Arc<I> {
  fn intercept(&self, context: CallContext, next: &dyn Handler) -> Result<Value> {
    (**self).intercept(context, next)
  }
}

/// A [`Handler`] backed by a closure.
pub struct HandlerFn<F>(F);

pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
  F: Fn(CallContext) -> Result<Value> + Send + Sync,
{
  HandlerFn(f)
}

impl<F> Handler for HandlerFn<F>
where
  F: Fn(CallContext) -> Result<Value> + Send + Sync,
{
  fn handle(&self, context: CallContext) -> Result<Value> {
    (self.0)(context)
  }
}

/// An [`Interceptor`] backed by a closure.
pub struct InterceptorFn<F>(F);

pub fn interceptor_fn<F>(f: F) -> InterceptorFn<F>
where
  F: Fn(CallContext, &dyn Handler) -> Result<Value> + Send + Sync,
{
  InterceptorFn(f)
}

impl<F> Interceptor for InterceptorFn<F>
where
  F: Fn(CallContext, &dyn Handler) -> Result<Value> + Send + Sync,
{
  fn intercept(&self, context: CallContext, next: &dyn Handler) -> Result<Value> {
    (self.0)(context, next)
  }
}
