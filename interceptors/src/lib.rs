//! # Weave Interceptors
//!
//! Ordered, composable wrappers around a target call.
//!
//! A [`PipelineBuilder`] holds an immutable list of [`Interceptor`]s and
//! composes them around a terminal [`Handler`]. The first interceptor added is
//! the outermost: effects are observed in declaration order on the way in and
//! in reverse on the way out. Every call is described by an immutable
//! [`CallContext`]; interceptors derive new contexts instead of mutating them.
//!
//! Terminal handlers such as [`InvokerHandler`] and [`TargetRegistry`]
//! perform the call through a [`weave_ioc::Container`], so the target's
//! parameters are resolved like any other dependency.
//!
//! ## Quick Start
//!
//! ```
//! use weave_interceptors::{handler_fn, interceptor_fn, CallContext, Handler, PipelineBuilder, Target};
//! use weave_ioc::Value;
//!
//! let pipeline = PipelineBuilder::new()
//!   .with_interceptor(interceptor_fn(|ctx: CallContext, next: &dyn Handler| {
//!     next.handle(ctx.with_attribute("user", String::from("admin")))
//!   }))
//!   .build(handler_fn(|ctx: CallContext| {
//!     let user = ctx.attribute::<String>("user").map(|u| (*u).clone()).unwrap_or_default();
//!     Ok(Value::new(format!("{} as {}", ctx.target(), user)))
//!   }));
//!
//! let value = pipeline.handle(CallContext::new(Target::from_pair("Users", "show"))).unwrap();
//! assert_eq!(*value.downcast::<String>().unwrap(), "Users->show as admin");
//! ```

mod builtin;
mod context;
mod error;
mod handler;
mod interceptor;
mod pipeline;

pub use builtin::{DeadlineInterceptor, TracingInterceptor};
pub use context::{CallContext, Target, DEADLINE_ATTRIBUTE};
pub use error::{InterceptorError, Result};
pub use handler::{InvokerHandler, TargetRegistry};
pub use interceptor::{handler_fn, interceptor_fn, Handler, HandlerFn, Interceptor, InterceptorFn};
pub use pipeline::{Pipeline, PipelineBuilder};
